//! Transport-agnostic request routing.
//!
//! Both transports hand their decoded requests to one [`Dispatcher`]; they
//! only differ in how requests and replies are framed on the wire.

use crate::protocol::{
    CallToolParams, CallToolResult, InitializeResult, JsonRpcError, JsonRpcRequest,
    JsonRpcResponse, ListChangedCapability, ListResourcesResult, ListToolsResult,
    ReadResourceParams, ReadResourceResult, ServerCapabilities, ServerInfo, PROTOCOL_VERSION,
};
use crate::resources::{CurrentListResource, CURRENT_LIST_URI};
use crate::tools::{ClearCacheTool, GetHotSearchTool, SearchHotSearchTool, ToolRegistry};
use hotsearch_core::{ContentFetcher, HotSearchError, HotSearchResult};
use serde::Serialize;
use std::sync::Arc;

/// Name announced to clients.
pub const SERVER_NAME: &str = "baidu-hot-search-mcp";

/// A tool call as decoded by a transport.
pub type Invocation = CallToolParams;

pub struct Dispatcher {
    tools: ToolRegistry,
    current_list: CurrentListResource,
    server_info: ServerInfo,
}

impl Dispatcher {
    /// Build the dispatcher with the fixed tool and resource set.
    pub fn new(fetcher: Arc<ContentFetcher>) -> Self {
        let mut tools = ToolRegistry::new();
        tools.register(Arc::new(GetHotSearchTool::new(fetcher.clone())));
        tools.register(Arc::new(SearchHotSearchTool::new(fetcher.clone())));
        tools.register(Arc::new(ClearCacheTool::new(fetcher.clone())));

        Self {
            tools,
            current_list: CurrentListResource::new(fetcher),
            server_info: ServerInfo {
                name: SERVER_NAME.to_string(),
                version: env!("CARGO_PKG_VERSION").to_string(),
            },
        }
    }

    pub fn server_info(&self) -> &ServerInfo {
        &self.server_info
    }

    pub fn tool_names(&self) -> Vec<String> {
        self.tools.names()
    }

    pub fn resource_uris(&self) -> Vec<String> {
        vec![CURRENT_LIST_URI.to_string()]
    }

    pub fn list_tools(&self) -> ListToolsResult {
        ListToolsResult {
            tools: self.tools.list_schemas(),
        }
    }

    pub fn list_resources(&self) -> ListResourcesResult {
        ListResourcesResult {
            resources: vec![self.current_list.schema()],
        }
    }

    /// Run a tool. Every failure becomes an error-flagged reply.
    pub async fn invoke(&self, invocation: &Invocation) -> CallToolResult {
        let result = match self.tools.get(&invocation.name) {
            Some(tool) => tool.execute(&invocation.arguments).await,
            None => Err(HotSearchError::UnknownOperation(invocation.name.clone())),
        };

        match result {
            Ok(reply) => reply,
            Err(e) => {
                tracing::warn!("Tool {} failed: {}", invocation.name, e);
                CallToolResult::error(format!("Tool execution failed: {}", e))
            }
        }
    }

    /// Read a resource by URI.
    pub async fn read_resource(&self, uri: &str) -> HotSearchResult<ReadResourceResult> {
        match uri {
            CURRENT_LIST_URI => self.current_list.read().await,
            _ => Err(HotSearchError::UnknownOperation(uri.to_string())),
        }
    }

    /// Route one MCP method call and produce its result value.
    pub async fn handle(
        &self,
        method: &str,
        params: Option<serde_json::Value>,
    ) -> Result<serde_json::Value, JsonRpcError> {
        match method {
            "initialize" => to_result(InitializeResult {
                protocol_version: PROTOCOL_VERSION.to_string(),
                capabilities: ServerCapabilities {
                    tools: Some(ListChangedCapability { list_changed: false }),
                    resources: Some(ListChangedCapability { list_changed: false }),
                },
                server_info: self.server_info.clone(),
            }),

            "ping" => Ok(serde_json::json!({})),

            "tools/list" => to_result(self.list_tools()),

            "tools/call" => {
                let invocation: Invocation = parse_params(method, params)?;
                to_result(self.invoke(&invocation).await)
            }

            "resources/list" => to_result(self.list_resources()),

            "resources/read" => {
                let params: ReadResourceParams = parse_params(method, params)?;
                match self.read_resource(&params.uri).await {
                    Ok(result) => to_result(result),
                    Err(e @ HotSearchError::UnknownOperation(_)) => {
                        Err(JsonRpcError::resource_not_found(e.to_string()))
                    }
                    Err(e) => {
                        tracing::warn!("Reading {} failed: {}", params.uri, e);
                        Err(JsonRpcError::internal_error(format!(
                            "Failed to read resource: {}",
                            e
                        )))
                    }
                }
            }

            _ => Err(JsonRpcError::method_not_found(method)),
        }
    }

    /// Handle a full JSON-RPC request. Returns `None` for notifications.
    pub async fn handle_request(&self, req: JsonRpcRequest) -> Option<JsonRpcResponse> {
        if req.is_notification() {
            tracing::debug!("Notification received: {}", req.method);
            return None;
        }

        if req.jsonrpc != "2.0" {
            return Some(JsonRpcResponse::error(req.id, JsonRpcError::invalid_request()));
        }

        tracing::debug!("Handling {}", req.method);
        let response = match self.handle(&req.method, req.params).await {
            Ok(result) => JsonRpcResponse::success(req.id, result),
            Err(error) => JsonRpcResponse::error(req.id, error),
        };
        Some(response)
    }
}

fn parse_params<T: serde::de::DeserializeOwned>(
    method: &str,
    params: Option<serde_json::Value>,
) -> Result<T, JsonRpcError> {
    let params = params
        .ok_or_else(|| JsonRpcError::invalid_params(format!("Missing params for {}", method)))?;
    serde_json::from_value(params)
        .map_err(|e| JsonRpcError::invalid_params(format!("Invalid {} params: {}", method, e)))
}

fn to_result(value: impl Serialize) -> Result<serde_json::Value, JsonRpcError> {
    serde_json::to_value(value).map_err(|e| JsonRpcError::internal_error(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{fetcher_for, mount_items};
    use serde_json::json;
    use wiremock::matchers::method;
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn dispatcher(server: &MockServer) -> Dispatcher {
        Dispatcher::new(fetcher_for(server))
    }

    fn call(name: &str, arguments: serde_json::Value) -> Invocation {
        Invocation {
            name: name.to_string(),
            arguments,
        }
    }

    #[tokio::test]
    async fn test_lists_three_tools_and_one_resource() {
        let server = MockServer::start().await;
        let dispatcher = dispatcher(&server);

        assert_eq!(
            dispatcher.tool_names(),
            vec!["get_hot_search", "search_hot_search", "clear_cache"]
        );

        let tools = dispatcher.handle("tools/list", None).await.unwrap();
        assert_eq!(tools["tools"].as_array().unwrap().len(), 3);
        assert_eq!(
            tools["tools"][0]["inputSchema"]["properties"]["count"]["maximum"],
            50
        );
        assert_eq!(tools["tools"][1]["inputSchema"]["required"], json!(["keyword"]));

        let resources = dispatcher.handle("resources/list", None).await.unwrap();
        assert_eq!(resources["resources"][0]["uri"], CURRENT_LIST_URI);
        assert_eq!(resources["resources"][0]["mimeType"], "application/json");
    }

    #[tokio::test]
    async fn test_unknown_tool_is_error_reply() {
        let server = MockServer::start().await;
        let dispatcher = dispatcher(&server);

        let reply = dispatcher.invoke(&call("frobnicate", json!({}))).await;
        assert!(reply.is_error());
        assert!(reply.text_content().contains("unknown operation: frobnicate"));
    }

    #[tokio::test]
    async fn test_argument_errors_are_error_replies() {
        let server = MockServer::start().await;
        mount_items(&server, 10, 0).await;
        let dispatcher = dispatcher(&server);

        for (name, args, field) in [
            ("get_hot_search", json!({"count": 0}), "count"),
            ("get_hot_search", json!({"use_cache": "yes"}), "use_cache"),
            ("search_hot_search", json!({}), "keyword"),
            ("clear_cache", json!({"force": true}), "force"),
        ] {
            let reply = dispatcher.invoke(&call(name, args)).await;
            assert!(reply.is_error(), "{name} should fail");
            assert!(reply.text_content().contains(&format!("`{}`", field)));
        }
    }

    #[tokio::test]
    async fn test_upstream_failure_is_error_reply_with_reason() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"code": 403, "msg": "bad key"})))
            .mount(&server)
            .await;
        let dispatcher = dispatcher(&server);

        let reply = dispatcher.invoke(&call("get_hot_search", json!({}))).await;
        assert!(reply.is_error());
        assert!(reply.text_content().contains("status code 403"));
    }

    #[tokio::test]
    async fn test_tools_call_through_handle() {
        let server = MockServer::start().await;
        mount_items(&server, 10, 1).await;
        let dispatcher = dispatcher(&server);

        let result = dispatcher
            .handle(
                "tools/call",
                Some(json!({"name": "get_hot_search", "arguments": {"count": 3}})),
            )
            .await
            .unwrap();

        assert!(result.get("isError").is_none());
        let text = result["content"][0]["text"].as_str().unwrap();
        assert!(text.contains("### 3. entry 3"));
        assert!(!text.contains("### 4. "));
    }

    #[tokio::test]
    async fn test_read_resource_returns_json_list() {
        let server = MockServer::start().await;
        mount_items(&server, 4, 1).await;
        let dispatcher = dispatcher(&server);

        let result = dispatcher
            .handle("resources/read", Some(json!({"uri": CURRENT_LIST_URI})))
            .await
            .unwrap();

        let text = result["contents"][0]["text"].as_str().unwrap();
        let items: serde_json::Value = serde_json::from_str(text).unwrap();
        assert_eq!(items.as_array().unwrap().len(), 4);
        assert_eq!(items[0]["rank"], 1);
        assert_eq!(items[0]["hotScore"], "1000");
    }

    #[tokio::test]
    async fn test_unknown_resource_and_method() {
        let server = MockServer::start().await;
        let dispatcher = dispatcher(&server);

        let err = dispatcher
            .handle("resources/read", Some(json!({"uri": "baidu://nope"})))
            .await
            .unwrap_err();
        assert_eq!(err.code, JsonRpcError::RESOURCE_NOT_FOUND);
        assert!(err.message.contains("unknown operation"));

        let err = dispatcher.handle("sampling/create", None).await.unwrap_err();
        assert_eq!(err.code, JsonRpcError::METHOD_NOT_FOUND);

        let err = dispatcher.handle("tools/call", None).await.unwrap_err();
        assert_eq!(err.code, JsonRpcError::INVALID_PARAMS);
    }

    #[tokio::test]
    async fn test_handle_request_envelope() {
        let server = MockServer::start().await;
        let dispatcher = dispatcher(&server);

        let init = dispatcher
            .handle_request(JsonRpcRequest::new(1, "initialize", json!({})))
            .await
            .unwrap();
        let result = init.result.unwrap();
        assert_eq!(init.id, json!(1));
        assert_eq!(result["serverInfo"]["name"], SERVER_NAME);
        assert_eq!(result["protocolVersion"], PROTOCOL_VERSION);

        let none = dispatcher
            .handle_request(JsonRpcRequest::notification("notifications/initialized"))
            .await;
        assert!(none.is_none());

        let mut bad = JsonRpcRequest::new(2, "ping", json!({}));
        bad.jsonrpc = "1.0".to_string();
        let resp = dispatcher.handle_request(bad).await.unwrap();
        assert_eq!(resp.error.unwrap().code, JsonRpcError::INVALID_REQUEST);

        let mut bad_notification = JsonRpcRequest::notification("notifications/initialized");
        bad_notification.jsonrpc = "1.0".to_string();
        assert!(dispatcher.handle_request(bad_notification).await.is_none());
    }
}
