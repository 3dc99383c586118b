// Hot-search tools backed by the shared content fetcher

use crate::format::format_items;
use crate::protocol::{CallToolResult, ToolSchema};
use crate::tools::args::Arguments;
use crate::tools::{json_schema_boolean, json_schema_integer, json_schema_object, json_schema_string, Tool};
use hotsearch_core::{ContentFetcher, HotSearchResult};
use std::sync::Arc;

pub const DEFAULT_COUNT: i64 = 10;
pub const MAX_COUNT: i64 = 50;

/// Tool returning the top N entries of the list
pub struct GetHotSearchTool {
    fetcher: Arc<ContentFetcher>,
}

impl GetHotSearchTool {
    pub fn new(fetcher: Arc<ContentFetcher>) -> Self {
        Self { fetcher }
    }
}

#[async_trait::async_trait]
impl Tool for GetHotSearchTool {
    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: "get_hot_search".to_string(),
            description: "Get the current hot-search ranking".to_string(),
            input_schema: json_schema_object(
                serde_json::json!({
                    "count": json_schema_integer(
                        "Number of entries to return (default 10, max 50)",
                        1,
                        MAX_COUNT,
                        DEFAULT_COUNT,
                    ),
                    "use_cache": json_schema_boolean("Serve cached data when fresh (default: true)")
                }),
                vec![],
            ),
        }
    }

    async fn execute(&self, arguments: &serde_json::Value) -> HotSearchResult<CallToolResult> {
        let args = Arguments::parse(arguments)?;
        args.deny_unknown(&["count", "use_cache"])?;
        let count = args.integer_in_range("count", 1, MAX_COUNT, DEFAULT_COUNT)?;
        let use_cache = args.boolean("use_cache", true)?;

        // The range check above guarantees a small positive value
        let items = self.fetcher.top(count as usize, use_cache).await?;

        Ok(CallToolResult::text(format_items(
            &items,
            &format!("Hot Search TOP {}", count),
        )))
    }
}

/// Tool filtering the list by a title keyword
pub struct SearchHotSearchTool {
    fetcher: Arc<ContentFetcher>,
}

impl SearchHotSearchTool {
    pub fn new(fetcher: Arc<ContentFetcher>) -> Self {
        Self { fetcher }
    }
}

#[async_trait::async_trait]
impl Tool for SearchHotSearchTool {
    fn schema(&self) -> ToolSchema {
        let mut keyword = json_schema_string("Keyword to look for in entry titles");
        keyword["minLength"] = serde_json::json!(1);

        ToolSchema {
            name: "search_hot_search".to_string(),
            description: "Search hot-search entries whose title contains a keyword".to_string(),
            input_schema: json_schema_object(serde_json::json!({ "keyword": keyword }), vec!["keyword"]),
        }
    }

    async fn execute(&self, arguments: &serde_json::Value) -> HotSearchResult<CallToolResult> {
        let args = Arguments::parse(arguments)?;
        args.deny_unknown(&["keyword"])?;
        let keyword = args.non_empty_string("keyword")?;

        let items = self.fetcher.search(keyword).await?;
        tracing::debug!("Search for {:?} matched {} entries", keyword, items.len());

        if items.is_empty() {
            return Ok(CallToolResult::text(format!(
                "No hot-search entries found matching \"{}\".",
                keyword
            )));
        }

        Ok(CallToolResult::text(format_items(
            &items,
            &format!("Results for \"{}\"", keyword),
        )))
    }
}

/// Tool dropping the cached list
pub struct ClearCacheTool {
    fetcher: Arc<ContentFetcher>,
}

impl ClearCacheTool {
    pub fn new(fetcher: Arc<ContentFetcher>) -> Self {
        Self { fetcher }
    }
}

#[async_trait::async_trait]
impl Tool for ClearCacheTool {
    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: "clear_cache".to_string(),
            description: "Clear the cached hot-search data".to_string(),
            input_schema: json_schema_object(serde_json::json!({}), vec![]),
        }
    }

    async fn execute(&self, arguments: &serde_json::Value) -> HotSearchResult<CallToolResult> {
        Arguments::parse(arguments)?.deny_unknown(&[])?;
        self.fetcher.clear_cache().await;

        Ok(CallToolResult::text(
            "✅ Cache cleared, the next request will fetch fresh data.",
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{fetcher_for, mount_items};
    use hotsearch_core::HotSearchError;
    use serde_json::json;
    use wiremock::MockServer;

    #[tokio::test]
    async fn test_get_returns_requested_count() {
        let server = MockServer::start().await;
        mount_items(&server, 10, 1).await;
        let tool = GetHotSearchTool::new(fetcher_for(&server));

        // Warm the cache, then read five from it
        tool.execute(&json!({})).await.unwrap();
        let result = tool.execute(&json!({"count": 5})).await.unwrap();
        let text = result.text_content();

        assert!(text.starts_with("## Hot Search TOP 5"));
        for rank in 1..=5 {
            assert!(text.contains(&format!("### {}. ", rank)));
        }
        assert!(!text.contains("### 6. "));
    }

    #[tokio::test]
    async fn test_get_rejects_out_of_range_count_without_fetching() {
        let server = MockServer::start().await;
        mount_items(&server, 10, 0).await;
        let tool = GetHotSearchTool::new(fetcher_for(&server));

        let err = tool.execute(&json!({"count": 51})).await.unwrap_err();
        assert!(matches!(err, HotSearchError::ToolArgumentInvalid { ref field, .. } if field == "count"));
    }

    #[tokio::test]
    async fn test_search_without_matches() {
        let server = MockServer::start().await;
        mount_items(&server, 3, 1).await;
        let tool = SearchHotSearchTool::new(fetcher_for(&server));

        let result = tool.execute(&json!({"keyword": "nothing-like-this"})).await.unwrap();
        assert!(!result.is_error());
        assert_eq!(
            result.text_content(),
            "No hot-search entries found matching \"nothing-like-this\"."
        );
    }

    #[tokio::test]
    async fn test_search_requires_keyword() {
        let server = MockServer::start().await;
        mount_items(&server, 3, 0).await;
        let tool = SearchHotSearchTool::new(fetcher_for(&server));

        let err = tool.execute(&json!({"keyword": ""})).await.unwrap_err();
        assert!(matches!(err, HotSearchError::ToolArgumentInvalid { ref field, .. } if field == "keyword"));
    }

    #[tokio::test]
    async fn test_clear_cache_then_get_refetches() {
        let server = MockServer::start().await;
        mount_items(&server, 3, 2).await;
        let fetcher = fetcher_for(&server);
        let get = GetHotSearchTool::new(fetcher.clone());
        let clear = ClearCacheTool::new(fetcher);

        get.execute(&json!({})).await.unwrap();
        let cleared = clear.execute(&serde_json::Value::Null).await.unwrap();
        assert!(cleared.text_content().contains("Cache cleared"));
        get.execute(&json!({"use_cache": true})).await.unwrap();
    }
}
