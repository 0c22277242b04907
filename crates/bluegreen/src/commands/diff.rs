use bluegreen_assembly::{ActionType, Assembly, Plan, TemplateFormat};
use bluegreen_core::{EnvironmentConfig, PipelineOptions};
use colored::Colorize;
use std::path::Path;

pub fn handle(
    env: &EnvironmentConfig,
    options: &PipelineOptions,
    previous: &Path,
) -> anyhow::Result<()> {
    let before = Assembly::load(previous)?;
    let app = bluegreen_core::synthesize(env, options)?;
    let after = Assembly::from_app(&app, TemplateFormat::Json)?;

    let plan = Plan::between(&before, &after);

    let mut current_artifact = None;
    for action in plan.actions.iter().filter(|a| a.action_type != ActionType::NoOp) {
        if current_artifact != Some(action.artifact.as_str()) {
            println!();
            println!("{}", action.artifact.bold());
            current_artifact = Some(action.artifact.as_str());
        }

        let line = format!("  {} {}", action.action_type.symbol(), action.description);
        match action.action_type {
            ActionType::Create => println!("{}", line.green()),
            ActionType::Update => println!("{}", line.yellow()),
            ActionType::Delete => println!("{}", line.red()),
            ActionType::NoOp => {}
        }
    }

    if !plan.has_changes {
        println!("{}", "✓ 差分はありません".green());
    } else {
        println!();
    }
    println!("{}", plan.summary());

    Ok(())
}
