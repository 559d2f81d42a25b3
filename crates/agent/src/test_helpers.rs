//! Scripted stand-ins for the provider and data tool.

use async_trait::async_trait;
use corretor_core::error::{ProviderError, ToolError};
use corretor_core::provider::{
    ChunkReceiver, Provider, ProviderRequest, ProviderResponse, StreamChunk,
};
use corretor_core::tool::DataFetchTool;
use std::collections::VecDeque;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tokio::sync::mpsc;

/// One scripted reply to a `stream` call.
pub enum Script {
    /// Chunks delivered in order, then the channel closes.
    Chunks(Vec<Result<StreamChunk, ProviderError>>),
    /// The request itself fails.
    Reject(ProviderError),
}

/// Fragments followed by a terminal chunk.
pub fn fragments(parts: &[&str]) -> Script {
    let mut chunks: Vec<_> = parts.iter().map(|p| Ok(StreamChunk::text(*p))).collect();
    chunks.push(Ok(StreamChunk::finished(None)));
    Script::Chunks(chunks)
}

/// A provider that replays scripted streams and records every request.
///
/// Panics if more calls are made than scripts provided.
pub struct ScriptedProvider {
    scripts: Mutex<VecDeque<Script>>,
    requests: Mutex<Vec<ProviderRequest>>,
}

impl ScriptedProvider {
    pub fn new(scripts: Vec<Script>) -> Self {
        Self {
            scripts: Mutex::new(scripts.into()),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn requests(&self) -> Vec<ProviderRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

#[async_trait]
impl Provider for ScriptedProvider {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn complete(&self, _request: ProviderRequest) -> Result<ProviderResponse, ProviderError> {
        Err(ProviderError::NotConfigured("scripted provider only streams".into()))
    }

    async fn stream(&self, request: ProviderRequest) -> Result<ChunkReceiver, ProviderError> {
        let call = {
            let mut requests = self.requests.lock().unwrap();
            requests.push(request);
            requests.len()
        };
        let script = self
            .scripts
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| panic!("ScriptedProvider: no script for call #{call}"));

        match script {
            Script::Reject(e) => Err(e),
            Script::Chunks(chunks) => {
                let (tx, rx) = mpsc::channel(chunks.len().max(1));
                for chunk in chunks {
                    let _ = tx.send(chunk).await;
                }
                Ok(rx)
            }
        }
    }
}

enum Behaviour {
    Return(Result<String, ToolError>),
    Panic,
}

/// A data tool that counts its invocations.
pub struct CountingTool {
    behaviour: Behaviour,
    delay: Option<Duration>,
    calls: AtomicUsize,
    completed: AtomicUsize,
}

impl CountingTool {
    fn with_behaviour(behaviour: Behaviour) -> Self {
        Self {
            behaviour,
            delay: None,
            calls: AtomicUsize::new(0),
            completed: AtomicUsize::new(0),
        }
    }

    pub fn ok(data: &str) -> Self {
        Self::with_behaviour(Behaviour::Return(Ok(data.to_string())))
    }

    pub fn failing(reason: &str) -> Self {
        Self::with_behaviour(Behaviour::Return(Err(ToolError::ExecutionFailed {
            tool_name: "counting".into(),
            reason: reason.into(),
        })))
    }

    pub fn panicking() -> Self {
        Self::with_behaviour(Behaviour::Panic)
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn completed(&self) -> usize {
        self.completed.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl DataFetchTool for CountingTool {
    fn name(&self) -> &str {
        "counting"
    }

    async fn fetch(&self) -> Result<String, ToolError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        let result = match &self.behaviour {
            Behaviour::Return(result) => result.clone(),
            Behaviour::Panic => panic!("sheet client crashed"),
        };
        self.completed.fetch_add(1, Ordering::SeqCst);
        result
    }
}
