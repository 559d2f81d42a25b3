//! Data-fetch tool trait: the abstraction over the listings data source.
//!
//! The model asks for data by emitting the `NEED_DATA` marker; the turn
//! orchestrator then calls [`DataFetchTool::fetch`] exactly once and splices
//! the returned text into a second request. The output has no schema: it is
//! opaque context text appended verbatim into a prompt.

use crate::error::ToolError;
use async_trait::async_trait;

/// A fixed, argument-free query against an external data source.
#[async_trait]
pub trait DataFetchTool: Send + Sync {
    /// The unique name of this tool (e.g., "composio_sheets").
    fn name(&self) -> &str;

    /// Run the query and return its result as text.
    async fn fetch(&self) -> std::result::Result<String, ToolError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    struct StaticTool(&'static str);

    #[async_trait]
    impl DataFetchTool for StaticTool {
        fn name(&self) -> &str {
            "static"
        }

        async fn fetch(&self) -> std::result::Result<String, ToolError> {
            Ok(self.0.to_string())
        }
    }

    #[tokio::test]
    async fn tool_is_usable_as_trait_object() {
        let tool: Arc<dyn DataFetchTool> = Arc::new(StaticTool("IMOVEL\tSTATUS"));
        assert_eq!(tool.name(), "static");
        assert_eq!(tool.fetch().await.unwrap(), "IMOVEL\tSTATUS");
    }
}
