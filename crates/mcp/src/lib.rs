// MCP (Model Context Protocol) server for the hot-search list
// Tools and resources are routed by one dispatcher shared by every transport

pub mod dispatcher;
pub mod format;
pub mod protocol;
pub mod resources;
pub mod server;
pub mod tools;

#[cfg(test)]
mod test_support;

pub use dispatcher::{Dispatcher, Invocation};
pub use server::McpServer;
