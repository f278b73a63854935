//! `tinyagent init`: write a default config file.

use std::path::Path;
use tinyagent_config::AppConfig;

pub fn run(path: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    let path = path
        .map(Path::to_path_buf)
        .unwrap_or_else(|| AppConfig::config_dir().join("config.toml"));

    if write_default(&path)? {
        println!("Created config at: {}", path.display());
        println!();
        println!("Next steps:");
        println!("  1. Set api_key in the file, or export TINYAGENT_API_KEY");
        println!("  2. tinyagent run \"list the files in this directory\"");
    } else {
        println!("Config already exists at: {}", path.display());
        println!("Edit it manually or delete it and re-run init.");
    }
    Ok(())
}

/// Write the default configuration unless a file is already there.
/// Returns whether a file was written.
fn write_default(path: &Path) -> std::io::Result<bool> {
    if path.exists() {
        return Ok(false);
    }
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, AppConfig::default_toml())?;
    Ok(true)
}
