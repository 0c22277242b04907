use bluegreen_core::{EnvironmentConfig, TagSet};
use colored::Colorize;

pub fn handle(env: &EnvironmentConfig, service: &str, json: bool) -> anyhow::Result<()> {
    let tags = TagSet::new(service, env).to_map();

    if json {
        println!("{}", serde_json::to_string_pretty(&tags)?);
        return Ok(());
    }

    for (key, value) in &tags {
        println!("{:<12} {}", key.cyan(), value);
    }
    Ok(())
}
