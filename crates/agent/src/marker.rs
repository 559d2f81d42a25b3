//! Incremental matcher for the data-request marker.
//!
//! The model signals that it needs the listings table by emitting a reserved
//! literal. Streamed text arrives in arbitrary fragments, so the marker may be
//! split anywhere; [`MarkerMatcher`] is a KMP automaton whose state is the
//! length of the longest marker prefix that ends the text consumed so far.
//! That state is exactly the number of trailing characters that must be held
//! back before they can be shown.

/// The literal the model emits when it wants the listings data.
pub const NEED_DATA_MARKER: &str = "NEED_DATA";

#[derive(Debug, Clone)]
pub struct MarkerMatcher {
    literal: String,
    pattern: Vec<char>,
    /// `failure[i]`: length of the longest proper prefix of `pattern[..=i]`
    /// that is also its suffix.
    failure: Vec<usize>,
}

impl MarkerMatcher {
    pub fn new(marker: &str) -> Self {
        let pattern: Vec<char> = marker.chars().collect();
        let mut failure = vec![0; pattern.len()];
        let mut k = 0;
        for i in 1..pattern.len() {
            while k > 0 && pattern[i] != pattern[k] {
                k = failure[k - 1];
            }
            if pattern[i] == pattern[k] {
                k += 1;
            }
            failure[i] = k;
        }

        Self {
            literal: marker.to_string(),
            pattern,
            failure,
        }
    }

    /// The marker text.
    pub fn literal(&self) -> &str {
        &self.literal
    }

    /// Marker length in characters.
    pub fn len(&self) -> usize {
        self.pattern.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pattern.is_empty()
    }

    /// Advance the automaton by one character.
    pub fn step(&self, state: usize, ch: char) -> usize {
        if self.pattern.is_empty() {
            return 0;
        }

        // After a full match keep scanning as if the last char was a mismatch
        // candidate, so overlapping occurrences are still found.
        let mut state = if state >= self.pattern.len() {
            self.failure[self.pattern.len() - 1]
        } else {
            state
        };

        while state > 0 && self.pattern[state] != ch {
            state = self.failure[state - 1];
        }
        if self.pattern[state] == ch {
            state + 1
        } else {
            0
        }
    }

    pub fn is_match(&self, state: usize) -> bool {
        !self.pattern.is_empty() && state == self.pattern.len()
    }

    pub fn contains(&self, text: &str) -> bool {
        let mut state = 0;
        for ch in text.chars() {
            state = self.step(state, ch);
            if self.is_match(state) {
                return true;
            }
        }
        false
    }

    /// Remove every non-overlapping occurrence, scanning left to right.
    pub fn strip(&self, text: &str) -> String {
        if self.pattern.is_empty() {
            return text.to_string();
        }

        let mut out = String::with_capacity(text.len());
        let mut held = String::new();
        let mut state = 0;
        for ch in text.chars() {
            held.push(ch);
            state = self.step(state, ch);
            if self.is_match(state) {
                held.clear();
                state = 0;
                continue;
            }
            release_excess(&mut held, state, &mut out);
        }
        out.push_str(&held);
        out
    }
}

/// Move all but the last `keep` characters of `held` onto `out`.
pub(crate) fn release_excess(held: &mut String, keep: usize, out: &mut String) {
    let total = held.chars().count();
    if total <= keep {
        return;
    }
    let split = held
        .char_indices()
        .nth(total - keep)
        .map(|(i, _)| i)
        .unwrap_or(held.len());
    out.push_str(&held[..split]);
    held.drain(..split);
}
