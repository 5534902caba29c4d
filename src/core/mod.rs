//! Protocol front ends over the tool registry

pub mod mcp;

pub use mcp::MCPServer;
