//! Built-in tool implementations for TinyAgent.
//!
//! Tools give the agent the ability to interact with the machine it runs
//! on: run shell commands and read, write, or edit files. Every tool turns
//! operational failures into `ToolResult { success: false, .. }`.

mod args;
pub mod file_edit;
pub mod file_read;
pub mod file_write;
pub mod shell;

pub use file_edit::EditFileTool;
pub use file_read::ReadFileTool;
pub use file_write::WriteFileTool;
pub use shell::ShellTool;

use tinyagent_config::ToolsConfig;
use tinyagent_core::tool::ToolRegistry;

/// Create a tool registry with all built-in tools.
pub fn default_registry(config: &ToolsConfig) -> ToolRegistry {
    let mut registry = ToolRegistry::new();
    registry.register(Box::new(ShellTool::new(config.shell_timeout_secs)));
    registry.register(Box::new(ReadFileTool::new(config.read_line_limit)));
    registry.register(Box::new(WriteFileTool));
    registry.register(Box::new(EditFileTool));
    registry
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_registry_has_all_tools_in_order() {
        let registry = default_registry(&ToolsConfig::default());
        assert_eq!(
            registry.names(),
            vec!["shell", "read_file", "write_file", "edit_file"]
        );
        for def in registry.export_schemas() {
            assert_eq!(def.parameters["type"], "object", "{} schema", def.name);
            assert!(!def.description.is_empty());
        }
    }

    #[test]
    fn config_flows_into_schemas() {
        let config = ToolsConfig {
            shell_timeout_secs: 90,
            read_line_limit: 50,
        };
        let registry = default_registry(&config);
        let schemas = registry.export_schemas();
        assert_eq!(schemas[0].parameters["properties"]["timeout"]["default"], 90);
        assert_eq!(schemas[1].parameters["properties"]["line_limit"]["default"], 50);
    }
}
