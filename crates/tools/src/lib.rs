//! Built-in tool implementations for termpilot.
//!
//! Tools give the agent the ability to work on the local project:
//! read, write and edit files, list directories, search code,
//! run shell commands, and drive git.

mod args;
pub mod code_search;
pub mod directory_list;
pub mod file_edit;
pub mod file_read;
pub mod file_write;
pub mod git_ops;
pub mod terminal;

pub use code_search::CodeSearchTool;
pub use directory_list::DirectoryListTool;
pub use file_edit::FileEditTool;
pub use file_read::FileReadTool;
pub use file_write::FileWriteTool;
pub use git_ops::GitOpsTool;
pub use terminal::TerminalTool;

use termpilot_config::ToolsConfig;
use termpilot_core::tool::ToolRegistry;

/// Create a registry with all built-in tools and default limits.
pub fn default_registry() -> ToolRegistry {
    registry_with(&ToolsConfig::default())
}

/// Create a registry with all built-in tools, using the configured timeouts.
pub fn registry_with(config: &ToolsConfig) -> ToolRegistry {
    let mut registry = ToolRegistry::new();
    registry.register(Box::new(FileReadTool::new()));
    registry.register(Box::new(FileWriteTool::new()));
    registry.register(Box::new(FileEditTool::new()));
    registry.register(Box::new(DirectoryListTool::new()));
    registry.register(Box::new(CodeSearchTool::new()));
    registry.register(Box::new(TerminalTool::new(
        config.terminal_timeout_secs,
        config.terminal_max_timeout_secs,
    )));
    registry.register(Box::new(GitOpsTool::new(config.git_timeout_secs)));
    registry
}
