//! Listings data-fetch tools for Corretor.
//!
//! Each tool implements `corretor_core::DataFetchTool`: a fixed query with no
//! arguments that returns the property table as text.
//!
//! - [`ComposioSheetsTool`] reads the live Google Sheet through Composio
//! - [`FileDataTool`] reads a local export, for offline use

pub mod composio_sheets;
pub mod file_source;

pub use composio_sheets::ComposioSheetsTool;
pub use file_source::FileDataTool;

use async_trait::async_trait;
use corretor_config::{DataSourceConfig, DataSourceKind};
use corretor_core::error::ToolError;
use corretor_core::tool::DataFetchTool;
use std::sync::Arc;

/// Build the data-fetch tool selected by `data_source.kind`.
pub fn build_from_config(config: &DataSourceConfig) -> Result<Arc<dyn DataFetchTool>, ToolError> {
    match config.kind {
        DataSourceKind::Composio => Ok(Arc::new(ComposioSheetsTool::from_config(
            &config.composio,
        )?)),
        DataSourceKind::File => {
            let path = config.file_path.clone().ok_or_else(|| {
                ToolError::NotConfigured("data_source.file_path is not set".into())
            })?;
            Ok(Arc::new(FileDataTool::new(path)))
        }
    }
}

/// Stand-in used when the configured source cannot be built.
///
/// Every fetch fails with the construction error, which the turn pipeline
/// hands to the model as data, so conversations that never need the table
/// still work.
pub struct UnavailableTool {
    reason: ToolError,
}

impl UnavailableTool {
    pub fn new(reason: ToolError) -> Self {
        Self { reason }
    }
}

#[async_trait]
impl DataFetchTool for UnavailableTool {
    fn name(&self) -> &str {
        "unavailable"
    }

    async fn fetch(&self) -> Result<String, ToolError> {
        Err(self.reason.clone())
    }
}
