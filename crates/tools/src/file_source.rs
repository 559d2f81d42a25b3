//! File data tool: serve the listings table from a local export.

use async_trait::async_trait;
use corretor_core::error::ToolError;
use corretor_core::tool::DataFetchTool;
use std::path::PathBuf;

pub struct FileDataTool {
    path: PathBuf,
}

impl FileDataTool {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl DataFetchTool for FileDataTool {
    fn name(&self) -> &str {
        "file_data"
    }

    async fn fetch(&self) -> Result<String, ToolError> {
        tokio::fs::read_to_string(&self.path)
            .await
            .map_err(|e| ToolError::ExecutionFailed {
                tool_name: "file_data".into(),
                reason: format!("failed to read {}: {e}", self.path.display()),
            })
    }
}
