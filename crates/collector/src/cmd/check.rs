//! `logfan check` - validate a config without touching any sink

use std::path::Path;

use anyhow::Result;

use super::load_config;

/// Print the enabled sinks in registration order
pub fn run(path: &Path) -> Result<()> {
    let config = load_config(path)?;

    println!("{}: ok", path.display());
    for (name, sink) in config.sinks.iter() {
        let state = if sink.is_enabled() { "enabled" } else { "disabled" };
        println!(
            "  {:<20} {:<14} min_level={:<8} {}",
            name,
            sink.type_name(),
            sink.min_level().as_str(),
            state
        );
    }
    Ok(())
}
