// Shared fixtures for tests that need a mocked upstream

use hotsearch_core::{ContentFetcher, Credentials};
use serde_json::json;
use std::sync::Arc;
use url::Url;
use wiremock::matchers::method;
use wiremock::{Mock, MockServer, ResponseTemplate};

pub fn fetcher_for(server: &MockServer) -> Arc<ContentFetcher> {
    let credentials = Credentials::new("user42", "secret-key-123").unwrap();
    let endpoint = Url::parse(&format!("{}/hot", server.uri())).unwrap();
    Arc::new(
        ContentFetcher::builder(credentials)
            .endpoint(endpoint)
            .build()
            .unwrap(),
    )
}

/// Upstream envelope with `count` items titled `entry 1..=count`.
pub fn envelope(count: usize) -> serde_json::Value {
    let data: Vec<_> = (0..count)
        .map(|i| {
            json!({
                "index": i,
                "word": format!("entry {}", i + 1),
                "hotScore": format!("{}", 1000 - i),
                "hotChange": "up",
                "url": format!("https://example.com/{}", i + 1),
            })
        })
        .collect();
    json!({"code": 200, "data": data})
}

/// Serve `envelope(count)` and expect exactly `calls` requests.
pub async fn mount_items(server: &MockServer, count: usize, calls: u64) {
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(envelope(count)))
        .expect(calls)
        .mount(server)
        .await;
}
