//! `tinyagent tools`: list what the agent can call.

use tinyagent_config::AppConfig;
use tinyagent_core::tool::ToolRegistry;

pub fn run(config: &AppConfig) {
    let registry = tinyagent_tools::default_registry(&config.tools);
    for line in listing(&registry) {
        println!("{line}");
    }
}

fn listing(registry: &ToolRegistry) -> Vec<String> {
    registry
        .export_schemas()
        .into_iter()
        .map(|def| format!("{}: {}", def.name, def.description))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tinyagent_config::ToolsConfig;

    #[test]
    fn lists_default_tools_in_registration_order() {
        let registry = tinyagent_tools::default_registry(&ToolsConfig::default());
        let lines = listing(&registry);
        let names: Vec<&str> = lines
            .iter()
            .filter_map(|l| l.split(':').next())
            .collect();
        assert_eq!(names, vec!["shell", "read_file", "write_file", "edit_file"]);
    }
}
