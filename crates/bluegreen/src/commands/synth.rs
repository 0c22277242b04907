use bluegreen_assembly::{Assembly, TemplateFormat};
use bluegreen_core::{EnvironmentConfig, PipelineOptions};
use colored::Colorize;
use std::path::Path;

pub fn handle(
    env: &EnvironmentConfig,
    options: &PipelineOptions,
    output: &Path,
    format: TemplateFormat,
) -> anyhow::Result<()> {
    println!("{}", "スタックを合成中...".blue());

    let app = bluegreen_core::synthesize(env, options)?;
    let assembly = Assembly::from_app(&app, format)?;
    let manifest = assembly.write(output)?;

    for artifact in assembly.artifacts() {
        println!(
            "  {} {} ({}個のリソース)",
            "✓".green(),
            artifact.id.cyan(),
            artifact.resource_count
        );
    }
    println!();
    println!(
        "{} {}",
        "✓ 合成完了:".green().bold(),
        manifest.display().to_string().cyan()
    );

    Ok(())
}
