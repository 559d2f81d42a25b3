//! Listings data retrieval for a turn.
//!
//! Fetch failures never abort a turn. They are rendered as text and passed to
//! the model in place of the data, so it can tell the user what went wrong.

use corretor_core::tool::DataFetchTool;
use std::sync::Arc;
use std::time::Instant;
use tokio::task::JoinHandle;
use tracing::{info, warn};

/// Run the tool once, turning an error into text for the model.
pub async fn fetch_data(tool: &dyn DataFetchTool) -> String {
    let started = Instant::now();
    match tool.fetch().await {
        Ok(data) => {
            info!(
                tool = tool.name(),
                bytes = data.len(),
                elapsed_ms = started.elapsed().as_millis() as u64,
                "Fetched listings data"
            );
            data
        }
        Err(e) => {
            warn!(tool = tool.name(), error = %e, "Data fetch failed");
            format!("Error executing data fetch tool: {e}")
        }
    }
}

/// A data fetch started before it is known to be needed.
///
/// The task is aborted if the handle is dropped without [`Prefetch::take`].
pub struct Prefetch {
    handle: Option<JoinHandle<String>>,
}

impl Prefetch {
    pub fn spawn(tool: Arc<dyn DataFetchTool>) -> Self {
        let handle = tokio::spawn(async move { fetch_data(tool.as_ref()).await });
        Self {
            handle: Some(handle),
        }
    }

    /// Wait for the prefetched data.
    pub async fn take(mut self) -> String {
        let Some(handle) = self.handle.take() else {
            return String::new();
        };
        match handle.await {
            Ok(data) => data,
            Err(e) => {
                warn!(error = %e, "Prefetch task failed");
                format!("Error executing data fetch tool: {e}")
            }
        }
    }
}

impl Drop for Prefetch {
    fn drop(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }
}
