//! Pipeline stages and supporting services

pub mod compositor;
pub mod page_materializer;
pub mod publish_orchestrator;
pub mod qr_encoder;
pub mod session_allocator;
pub mod target_compiler;
pub mod tool_runner;
pub mod transcoder;

pub use publish_orchestrator::{PublishOrchestrator, Submission};
pub use qr_encoder::entry_url;
pub use tool_runner::{ToolError, ToolOutput, ToolRunner};
