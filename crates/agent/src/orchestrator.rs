//! The two-phase turn pipeline.
//!
//! A turn starts with a single streaming request. If the model opens its
//! answer with the data-request marker, the stream is abandoned, the listings
//! data is fetched once, and a second request is made with the last message
//! replaced by the original question plus the data. The second answer is
//! filtered with the marker suppressed, so it can never trigger another
//! fetch.

use crate::fetch::{Prefetch, fetch_data};
use crate::marker::{MarkerMatcher, NEED_DATA_MARKER};
use crate::prompt::augment_messages;
use crate::stream_event::TurnEvent;
use crate::stream_filter::{FilterMode, SentinelFilter, StreamOutcome, drive};
use corretor_core::error::Result;
use corretor_core::message::Message;
use corretor_core::provider::{Provider, ProviderRequest, Usage};
use corretor_core::tool::DataFetchTool;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info};

/// What one turn produced.
#[derive(Debug, Clone, PartialEq)]
pub struct TurnReport {
    /// Final answer, marker-free and trimmed.
    pub answer: String,

    /// Whether the data tool was consulted.
    pub data_fetched: bool,

    /// LLM requests made: 1 or 2.
    pub requests: usize,

    /// Usage reported by the last request, if any.
    pub usage: Option<Usage>,
}

pub struct TurnOrchestrator {
    /// The LLM provider to use
    provider: Arc<dyn Provider>,

    /// Source of the listings table
    tool: Arc<dyn DataFetchTool>,

    /// The model to use
    model: String,

    /// Temperature setting
    temperature: f32,

    /// Max tokens per response
    max_tokens: Option<u32>,

    matcher: MarkerMatcher,

    /// Start the data fetch alongside the first request
    prefetch: bool,
}

impl TurnOrchestrator {
    pub fn new(
        provider: Arc<dyn Provider>,
        tool: Arc<dyn DataFetchTool>,
        model: impl Into<String>,
    ) -> Self {
        Self {
            provider,
            tool,
            model: model.into(),
            temperature: 0.7,
            max_tokens: None,
            matcher: MarkerMatcher::new(NEED_DATA_MARKER),
            prefetch: false,
        }
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    /// Set the max tokens per LLM response.
    pub fn with_max_tokens(mut self, max: Option<u32>) -> Self {
        self.max_tokens = max;
        self
    }

    /// Speculatively fetch data while the first request streams.
    pub fn with_prefetch(mut self, enabled: bool) -> Self {
        self.prefetch = enabled;
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn provider_name(&self) -> &str {
        self.provider.name()
    }

    fn request(&self, messages: Vec<Message>) -> ProviderRequest {
        let mut request = ProviderRequest::streaming(self.model.clone(), messages);
        request.temperature = self.temperature;
        request.max_tokens = self.max_tokens;
        request
    }

    /// Run one turn, collecting the answer without streaming it anywhere.
    pub async fn answer(&self, messages: Vec<Message>) -> Result<TurnReport> {
        self.run_turn(messages, |_| {}).await
    }

    /// Run one turn over `messages` (system prompt, history, new query).
    ///
    /// `on_event` receives display-safe text as it streams in. After a
    /// `Restart` event, earlier text is superseded.
    pub async fn run_turn<F>(&self, messages: Vec<Message>, mut on_event: F) -> Result<TurnReport>
    where
        F: FnMut(TurnEvent) + Send,
    {
        let started = Instant::now();
        let prefetch = self.prefetch.then(|| Prefetch::spawn(self.tool.clone()));

        debug!(
            provider = self.provider.name(),
            model = %self.model,
            messages = messages.len(),
            "Starting turn"
        );

        let mut receiver = self.provider.stream(self.request(messages.clone())).await?;
        let mut filter = SentinelFilter::new(self.matcher.clone(), FilterMode::Detect);
        let outcome = drive(&mut receiver, &mut filter, |text| {
            on_event(TurnEvent::text(text))
        })
        .await?;
        drop(receiver);

        let partial = match outcome {
            StreamOutcome::Completed { text, usage } => {
                info!(
                    requests = 1,
                    data_fetched = false,
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "Turn completed"
                );
                return Ok(TurnReport {
                    answer: text,
                    data_fetched: false,
                    requests: 1,
                    usage,
                });
            }
            StreamOutcome::DataNeeded { partial } => partial,
        };

        debug!(partial_len = partial.len(), "Model requested listings data");
        on_event(TurnEvent::FetchingData);

        let data = match prefetch {
            Some(prefetch) => prefetch.take().await,
            None => fetch_data(self.tool.as_ref()).await,
        };

        let augmented = augment_messages(messages, &data, self.matcher.literal());
        on_event(TurnEvent::Restart);

        let mut receiver = self.provider.stream(self.request(augmented)).await?;
        let mut filter = SentinelFilter::new(self.matcher.clone(), FilterMode::Suppress);
        let outcome = drive(&mut receiver, &mut filter, |text| {
            on_event(TurnEvent::text(text))
        })
        .await?;

        let (answer, usage) = match outcome {
            StreamOutcome::Completed { text, usage } => (text, usage),
            // Unreachable: a Suppress filter never reports a marker. Release
            // builds fall back to the raw text minus markers, without usage.
            StreamOutcome::DataNeeded { partial } => {
                debug_assert_ne!(
                    filter.mode(),
                    FilterMode::Suppress,
                    "suppress filter reported a marker"
                );
                (self.matcher.strip(&partial).trim().to_string(), None)
            }
        };

        info!(
            requests = 2,
            data_fetched = true,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Turn completed"
        );

        Ok(TurnReport {
            answer,
            data_fetched: true,
            requests: 2,
            usage,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::history::build_messages;
    use crate::test_helpers::{CountingTool, ScriptedProvider, Script, fragments};
    use corretor_core::error::{Error, ProviderError};
    use corretor_core::message::Role;
    use corretor_core::provider::StreamChunk;

    fn orchestrator(
        provider: &Arc<ScriptedProvider>,
        tool: &Arc<CountingTool>,
    ) -> TurnOrchestrator {
        TurnOrchestrator::new(provider.clone(), tool.clone(), "test-model")
    }

    fn turn_messages(query: &str) -> Vec<Message> {
        build_messages("sys", &[], query, 3)
    }

    #[tokio::test]
    async fn plain_answer_uses_one_request() {
        let provider = Arc::new(ScriptedProvider::new(vec![fragments(&[
            "Olá! ",
            "Como posso ajudar? ",
        ])]));
        let tool = Arc::new(CountingTool::ok("unused"));

        let mut events = Vec::new();
        let report = orchestrator(&provider, &tool)
            .run_turn(turn_messages("Hello"), |e| events.push(e))
            .await
            .unwrap();

        assert_eq!(report.answer, "Olá! Como posso ajudar?");
        assert!(!report.data_fetched);
        assert_eq!(report.requests, 1);
        assert_eq!(tool.calls(), 0);
        assert_eq!(provider.call_count(), 1);
        assert_eq!(
            events,
            vec![TurnEvent::text("Olá! "), TurnEvent::text("Como posso ajudar? ")]
        );
    }

    #[tokio::test]
    async fn marker_triggers_single_fetch_and_second_request() {
        let provider = Arc::new(ScriptedProvider::new(vec![
            fragments(&["NEED_DATA Let me check...", " mais texto"]),
            fragments(&["Na Rua X temos a Casa Azul."]),
        ]));
        let tool = Arc::new(CountingTool::ok("IMOVEL\tENDEREÇO\nCasa Azul\tRua X, 10"));

        let report = orchestrator(&provider, &tool)
            .answer(turn_messages("What properties are on Rua X?"))
            .await
            .unwrap();

        assert_eq!(tool.calls(), 1);
        assert_eq!(provider.call_count(), 2);
        assert!(report.data_fetched);
        assert_eq!(report.requests, 2);
        assert_eq!(report.answer, "Na Rua X temos a Casa Azul.");
        assert!(!report.answer.contains(NEED_DATA_MARKER));

        let requests = provider.requests();
        let second = &requests[1].messages;
        assert_eq!(second.len(), 2);
        assert_eq!(second[0].role, Role::System);
        assert!(second[1].content.starts_with("Original question: What properties are on Rua X?"));
        assert!(second[1].content.contains("Casa Azul\tRua X, 10"));
        assert!(requests.iter().all(|r| r.stream && r.model == "test-model"));
    }

    #[tokio::test]
    async fn marker_split_across_fragments_is_never_shown() {
        let provider = Arc::new(ScriptedProvider::new(vec![
            fragments(&["NEE", "D_DA", "TA rest"]),
            fragments(&["Resposta final"]),
        ]));
        let tool = Arc::new(CountingTool::ok("dados"));

        let mut events = Vec::new();
        let report = orchestrator(&provider, &tool)
            .run_turn(turn_messages("Quais imóveis?"), |e| events.push(e))
            .await
            .unwrap();

        assert_eq!(
            events,
            vec![
                TurnEvent::FetchingData,
                TurnEvent::Restart,
                TurnEvent::text("Resposta final"),
            ]
        );
        assert_eq!(report.answer, "Resposta final");
        assert_eq!(tool.calls(), 1);
    }

    #[tokio::test]
    async fn fetch_failure_is_passed_to_second_request() {
        let provider = Arc::new(ScriptedProvider::new(vec![
            fragments(&["NEED_DATA"]),
            fragments(&["Desculpe, não consegui acessar a planilha."]),
        ]));
        let tool = Arc::new(CountingTool::failing("spreadsheet unavailable"));

        let report = orchestrator(&provider, &tool)
            .answer(turn_messages("Tem casa livre?"))
            .await
            .unwrap();

        assert_eq!(report.answer, "Desculpe, não consegui acessar a planilha.");
        let second = &provider.requests()[1].messages;
        let last = &second[second.len() - 1].content;
        assert!(last.contains("Error executing data fetch tool:"));
        assert!(last.contains("spreadsheet unavailable"));
    }

    #[tokio::test]
    async fn marker_in_second_answer_is_suppressed_without_refetch() {
        let provider = Arc::new(ScriptedProvider::new(vec![
            fragments(&["NEED_DATA"]),
            fragments(&["NEED_", "DATA Temos ", "2 imóveis NEED_DATA livres."]),
        ]));
        let tool = Arc::new(CountingTool::ok("dados"));

        let mut shown = String::new();
        let report = orchestrator(&provider, &tool)
            .run_turn(turn_messages("Quantos imóveis?"), |e| {
                if let TurnEvent::Text { content } = e {
                    shown.push_str(&content);
                }
            })
            .await
            .unwrap();

        assert_eq!(tool.calls(), 1);
        assert_eq!(provider.call_count(), 2);
        assert!(!shown.contains(NEED_DATA_MARKER));
        assert_eq!(report.answer, "Temos 2 imóveis  livres.");
    }

    #[tokio::test]
    async fn suppressed_second_answer_keeps_usage() {
        let usage = Usage {
            prompt_tokens: 40,
            completion_tokens: 6,
            total_tokens: 46,
        };
        let provider = Arc::new(ScriptedProvider::new(vec![
            fragments(&["NEED_DATA"]),
            Script::Chunks(vec![
                Ok(StreamChunk::text("NEED_DATA A Casa Azul ")),
                Ok(StreamChunk {
                    content: Some("está livre.".into()),
                    done: false,
                    usage: Some(usage),
                }),
                Ok(StreamChunk::finished(None)),
            ]),
        ]));
        let tool = Arc::new(CountingTool::ok("dados"));

        let report = orchestrator(&provider, &tool)
            .answer(turn_messages("A Casa Azul está livre?"))
            .await
            .unwrap();

        assert_eq!(report.answer, "A Casa Azul está livre.");
        assert_eq!(report.requests, 2);
        assert_eq!(report.usage, Some(usage));
    }

    #[tokio::test]
    async fn history_is_kept_in_second_request() {
        let provider = Arc::new(ScriptedProvider::new(vec![
            fragments(&["NEED_DATA"]),
            fragments(&["ok"]),
        ]));
        let tool = Arc::new(CountingTool::ok("dados"));
        let history = vec![Message::user("Oi"), Message::assistant("Olá!")];
        let messages = build_messages("sys", &history, "E na Rua Y?", 3);

        orchestrator(&provider, &tool).answer(messages).await.unwrap();

        let second = &provider.requests()[1].messages;
        assert_eq!(second.len(), 4);
        assert_eq!(second[1].content, "Oi");
        assert_eq!(second[2].content, "Olá!");
        assert!(second[3].content.starts_with("Original question: E na Rua Y?"));
    }

    #[tokio::test]
    async fn provider_failure_propagates() {
        let provider = Arc::new(ScriptedProvider::new(vec![Script::Reject(
            ProviderError::AuthenticationFailed("invalid key".into()),
        )]));
        let tool = Arc::new(CountingTool::ok("dados"));

        let err = orchestrator(&provider, &tool)
            .answer(turn_messages("Oi"))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            Error::Provider(ProviderError::AuthenticationFailed(_))
        ));
        assert_eq!(tool.calls(), 0);
    }

    #[tokio::test]
    async fn second_request_failure_propagates() {
        let provider = Arc::new(ScriptedProvider::new(vec![
            fragments(&["NEED_DATA"]),
            Script::Chunks(vec![
                Ok(StreamChunk::text("Temos")),
                Err(ProviderError::StreamInterrupted("reset".into())),
            ]),
        ]));
        let tool = Arc::new(CountingTool::ok("dados"));

        let err = orchestrator(&provider, &tool)
            .answer(turn_messages("Oi"))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            Error::Provider(ProviderError::StreamInterrupted(_))
        ));
        assert_eq!(tool.calls(), 1);
    }

    #[tokio::test]
    async fn prefetched_data_substitutes_fetch() {
        let provider = Arc::new(ScriptedProvider::new(vec![
            fragments(&["NEED_DATA"]),
            fragments(&["ok"]),
        ]));
        let tool = Arc::new(CountingTool::ok("pré-carregado"));

        orchestrator(&provider, &tool)
            .with_prefetch(true)
            .answer(turn_messages("Quais imóveis?"))
            .await
            .unwrap();

        assert_eq!(tool.calls(), 1);
        let second = &provider.requests()[1].messages;
        assert!(second[1].content.contains("pré-carregado"));
    }

    #[tokio::test]
    async fn sampling_settings_reach_the_request() {
        let provider = Arc::new(ScriptedProvider::new(vec![fragments(&["oi"])]));
        let tool = Arc::new(CountingTool::ok("dados"));

        orchestrator(&provider, &tool)
            .with_temperature(0.2)
            .with_max_tokens(Some(256))
            .answer(turn_messages("Oi"))
            .await
            .unwrap();

        let request = &provider.requests()[0];
        assert!((request.temperature - 0.2).abs() < f32::EPSILON);
        assert_eq!(request.max_tokens, Some(256));
    }
}
