// Read-only MCP resources

use crate::protocol::{ReadResourceResult, ResourceContents, ResourceSchema};
use hotsearch_core::{ContentFetcher, HotSearchError, HotSearchResult};
use std::sync::Arc;

/// URI of the full current list.
pub const CURRENT_LIST_URI: &str = "baidu://hot-search/current";

const JSON_MIME: &str = "application/json";

/// The complete normalized list as pretty-printed JSON.
pub struct CurrentListResource {
    fetcher: Arc<ContentFetcher>,
}

impl CurrentListResource {
    pub fn new(fetcher: Arc<ContentFetcher>) -> Self {
        Self { fetcher }
    }

    pub fn schema(&self) -> ResourceSchema {
        ResourceSchema {
            uri: CURRENT_LIST_URI.to_string(),
            name: "Current hot-search list".to_string(),
            description: "Live hot-search ranking as normalized JSON records".to_string(),
            mime_type: JSON_MIME.to_string(),
        }
    }

    pub async fn read(&self) -> HotSearchResult<ReadResourceResult> {
        let items = self.fetcher.fetch(true).await?;
        let text = serde_json::to_string_pretty(&items)
            .map_err(|e| HotSearchError::invalid_payload(format!("failed to serialize items: {}", e)))?;

        Ok(ReadResourceResult {
            contents: vec![ResourceContents {
                uri: CURRENT_LIST_URI.to_string(),
                mime_type: JSON_MIME.to_string(),
                text,
            }],
        })
    }
}
