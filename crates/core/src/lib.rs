// Core types and the fetch/normalize/cache pipeline for the hot-search MCP server

pub mod config;
pub mod error;
pub mod fetcher;
pub mod mapping;
pub mod normalize;
pub mod types;

pub use config::{Credentials, UpstreamConfig};
pub use error::{HotSearchError, HotSearchResult};
pub use fetcher::{ContentFetcher, ContentFetcherBuilder};
pub use mapping::{FieldMap, TrendTable};
pub use types::*;
