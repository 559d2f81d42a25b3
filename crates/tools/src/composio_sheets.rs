//! Google Sheets tool backed by the Composio action API.
//!
//! Executes the `GOOGLESHEETS_BATCH_GET` action for one fixed spreadsheet
//! and renders the returned value ranges as plain text the model can read:
//! one line per row, cells separated by tabs, each range headed by its name.

use async_trait::async_trait;
use corretor_config::ComposioConfig;
use corretor_core::error::ToolError;
use corretor_core::tool::DataFetchTool;
use tracing::{debug, warn};

const TOOL_NAME: &str = "composio_sheets";

pub struct ComposioSheetsTool {
    base_url: String,
    api_key: String,
    action: String,
    entity_id: String,
    spreadsheet_id: String,
    ranges: Vec<String>,
    client: reqwest::Client,
}

impl ComposioSheetsTool {
    /// Build the tool from configuration.
    ///
    /// Fails when no Composio API key is configured.
    pub fn from_config(config: &ComposioConfig) -> Result<Self, ToolError> {
        let api_key = config
            .api_key
            .clone()
            .filter(|k| !k.is_empty())
            .ok_or_else(|| {
                ToolError::NotConfigured("COMPOSIO_API_KEY is not set".into())
            })?;

        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Ok(Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key,
            action: config.action.clone(),
            entity_id: config.entity_id.clone(),
            spreadsheet_id: config.spreadsheet_id.clone(),
            ranges: config.ranges.clone(),
            client,
        })
    }

    fn execute_url(&self) -> String {
        format!("{}/actions/{}/execute", self.base_url, self.action)
    }

    fn request_body(&self) -> serde_json::Value {
        serde_json::json!({
            "entityId": self.entity_id,
            "appName": "googlesheets",
            "input": {
                "spreadsheet_id": self.spreadsheet_id,
                "ranges": self.ranges,
            },
        })
    }
}

#[async_trait]
impl DataFetchTool for ComposioSheetsTool {
    fn name(&self) -> &str {
        TOOL_NAME
    }

    async fn fetch(&self) -> Result<String, ToolError> {
        debug!(
            action = %self.action,
            spreadsheet = %self.spreadsheet_id,
            ranges = ?self.ranges,
            "Executing Composio action"
        );

        let response = self
            .client
            .post(self.execute_url())
            .header("x-api-key", &self.api_key)
            .json(&self.request_body())
            .send()
            .await
            .map_err(|e| ToolError::ExecutionFailed {
                tool_name: TOOL_NAME.into(),
                reason: e.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(status = status.as_u16(), body = %body, "Composio returned error");
            return Err(ToolError::ExecutionFailed {
                tool_name: TOOL_NAME.into(),
                reason: format!("HTTP {}: {body}", status.as_u16()),
            });
        }

        let payload: serde_json::Value =
            response.json().await.map_err(|e| ToolError::InvalidResponse {
                tool_name: TOOL_NAME.into(),
                reason: e.to_string(),
            })?;

        render_action_result(&payload)
    }
}

/// Turn a Composio execute payload into prompt text.
fn render_action_result(payload: &serde_json::Value) -> Result<String, ToolError> {
    // The API has shipped both spellings of this flag.
    let successful = payload
        .get("successful")
        .or_else(|| payload.get("successfull"))
        .and_then(|v| v.as_bool())
        .unwrap_or(true);

    if !successful {
        let reason = match payload.get("error") {
            Some(serde_json::Value::String(s)) => s.clone(),
            Some(other) if !other.is_null() => other.to_string(),
            _ => "action reported failure".to_string(),
        };
        return Err(ToolError::ExecutionFailed {
            tool_name: TOOL_NAME.into(),
            reason,
        });
    }

    let data = payload.get("data").unwrap_or(payload);

    match find_value_ranges(data) {
        Some(ranges) => Ok(render_value_ranges(ranges)),
        None => serde_json::to_string_pretty(data).map_err(|e| ToolError::InvalidResponse {
            tool_name: TOOL_NAME.into(),
            reason: e.to_string(),
        }),
    }
}

/// Depth-first search for the Sheets API `valueRanges` array.
fn find_value_ranges(value: &serde_json::Value) -> Option<&Vec<serde_json::Value>> {
    match value {
        serde_json::Value::Object(map) => {
            if let Some(serde_json::Value::Array(ranges)) = map.get("valueRanges") {
                return Some(ranges);
            }
            map.values().find_map(find_value_ranges)
        }
        serde_json::Value::Array(items) => items.iter().find_map(find_value_ranges),
        _ => None,
    }
}

fn render_value_ranges(ranges: &[serde_json::Value]) -> String {
    let mut out = String::new();
    for range in ranges {
        if let Some(name) = range.get("range").and_then(|r| r.as_str()) {
            out.push_str(name);
            out.push('\n');
        }
        let rows = range.get("values").and_then(|v| v.as_array());
        for row in rows.into_iter().flatten() {
            let cells: Vec<String> = row
                .as_array()
                .map(|cells| cells.iter().map(cell_text).collect())
                .unwrap_or_default();
            out.push_str(&cells.join("\t"));
            out.push('\n');
        }
    }
    out
}

fn cell_text(cell: &serde_json::Value) -> String {
    match cell {
        serde_json::Value::String(s) => s.clone(),
        serde_json::Value::Null => String::new(),
        other => other.to_string(),
    }
}
