pub mod registry;
pub mod tools;

pub use registry::{ToolContext, ToolInvocation, ToolName, validate_registry};
pub use tools::DocTools;
