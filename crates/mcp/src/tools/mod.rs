pub mod args;
pub mod hot_search;
mod registry;

pub use hot_search::{ClearCacheTool, GetHotSearchTool, SearchHotSearchTool};
pub use registry::{
    json_schema_boolean, json_schema_integer, json_schema_object, json_schema_string, Tool,
    ToolRegistry,
};
