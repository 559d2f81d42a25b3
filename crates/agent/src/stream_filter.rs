//! Sentinel-aware filtering of streamed model output.
//!
//! [`SentinelFilter`] sits between the provider stream and whatever shows
//! text to the user. It passes text through as soon as it is known not to be
//! part of the marker, and holds back only the trailing characters that could
//! still grow into it.
//!
//! In [`FilterMode::Detect`] a completed marker stops the stream: the caller
//! must go and fetch data, and nothing from the fragment that completed the
//! marker is released. In [`FilterMode::Suppress`] the marker is cut out of
//! the output and streaming continues.

use crate::marker::{MarkerMatcher, release_excess};
use corretor_core::error::ProviderError;
use corretor_core::provider::{ChunkReceiver, Usage};
use tracing::{debug, trace};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterMode {
    /// A marker means the model wants data.
    Detect,
    /// Markers are removed from the output and never trigger anything.
    Suppress,
}

/// Result of pushing one fragment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilterStep {
    /// Text that is safe to show. May be empty while a possible marker
    /// prefix is held back.
    Emit(String),
    /// The marker appeared; the stream should be abandoned.
    MarkerDetected,
}

#[derive(Debug, Clone)]
pub struct SentinelFilter {
    matcher: MarkerMatcher,
    mode: FilterMode,
    state: usize,
    raw: String,
    held: String,
    emitted: String,
    detected: bool,
    suppressed: usize,
}

impl SentinelFilter {
    pub fn new(matcher: MarkerMatcher, mode: FilterMode) -> Self {
        Self {
            matcher,
            mode,
            state: 0,
            raw: String::new(),
            held: String::new(),
            emitted: String::new(),
            detected: false,
            suppressed: 0,
        }
    }

    pub fn mode(&self) -> FilterMode {
        self.mode
    }

    pub fn push(&mut self, fragment: &str) -> FilterStep {
        if self.detected {
            return FilterStep::MarkerDetected;
        }
        if fragment.is_empty() {
            return FilterStep::Emit(String::new());
        }

        self.raw.push_str(fragment);

        let mut released = String::new();
        for ch in fragment.chars() {
            self.held.push(ch);
            self.state = self.matcher.step(self.state, ch);

            if self.matcher.is_match(self.state) {
                match self.mode {
                    FilterMode::Detect => {
                        self.detected = true;
                        self.held.clear();
                        self.state = 0;
                        return FilterStep::MarkerDetected;
                    }
                    FilterMode::Suppress => {
                        self.suppressed += 1;
                        self.held.clear();
                        self.state = 0;
                        continue;
                    }
                }
            }

            release_excess(&mut self.held, self.state, &mut released);
        }

        self.emitted.push_str(&released);
        FilterStep::Emit(released)
    }

    /// Release whatever is still held back. Call once the stream has ended.
    ///
    /// Returns nothing after a detection: withheld text from a stream that
    /// asked for data is never shown.
    pub fn finish(&mut self) -> String {
        if self.detected {
            return String::new();
        }
        self.state = 0;
        let tail = std::mem::take(&mut self.held);
        self.emitted.push_str(&tail);
        tail
    }

    /// Everything released so far.
    pub fn emitted(&self) -> &str {
        &self.emitted
    }

    /// Every fragment pushed so far, unfiltered.
    pub fn raw(&self) -> &str {
        &self.raw
    }

    /// Number of markers cut out in suppress mode.
    pub fn suppressed(&self) -> usize {
        self.suppressed
    }

    /// The final answer: emitted text with any marker stripped, trimmed.
    pub fn answer(&self) -> String {
        self.matcher.strip(&self.emitted).trim().to_string()
    }

    pub fn into_answer(mut self) -> String {
        self.finish();
        self.answer()
    }
}

/// How a filtered stream ended.
#[derive(Debug, Clone, PartialEq)]
pub enum StreamOutcome {
    /// The stream ran to completion.
    Completed {
        text: String,
        usage: Option<Usage>,
    },
    /// The marker was seen; `partial` is the raw text received up to it.
    DataNeeded { partial: String },
}

/// Consume a provider stream through `filter`, handing released text to
/// `on_text` as it becomes available.
///
/// On detection the function returns immediately; dropping the receiver
/// afterwards stops the producer.
pub async fn drive<F>(
    receiver: &mut ChunkReceiver,
    filter: &mut SentinelFilter,
    mut on_text: F,
) -> Result<StreamOutcome, ProviderError>
where
    F: FnMut(&str),
{
    let mut usage = None;
    let mut fragments = 0usize;

    while let Some(item) = receiver.recv().await {
        let chunk = item?;

        if let Some(fragment) = chunk.content.as_deref() {
            fragments += 1;
            trace!(len = fragment.len(), "Stream fragment");
            match filter.push(fragment) {
                FilterStep::Emit(text) => {
                    if !text.is_empty() {
                        on_text(&text);
                    }
                }
                FilterStep::MarkerDetected => {
                    debug!(fragments, "Marker detected in stream");
                    return Ok(StreamOutcome::DataNeeded {
                        partial: filter.raw().to_string(),
                    });
                }
            }
        }

        if chunk.usage.is_some() {
            usage = chunk.usage;
        }
        if chunk.done {
            break;
        }
    }

    let tail = filter.finish();
    if !tail.is_empty() {
        on_text(&tail);
    }

    debug!(
        fragments,
        suppressed = filter.suppressed(),
        "Stream completed"
    );

    Ok(StreamOutcome::Completed {
        text: filter.answer(),
        usage,
    })
}
