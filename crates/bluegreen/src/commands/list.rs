use bluegreen_core::{EnvironmentConfig, PipelineOptions};

/// アーティファクトIDを1行ずつ出力
pub fn handle(env: &EnvironmentConfig) -> anyhow::Result<()> {
    let app = bluegreen_core::synthesize(env, &PipelineOptions::default())?;
    for (stage, stack) in app.all_stacks() {
        println!(
            "{}",
            bluegreen_assembly::Artifact::artifact_id(stage, &stack.id)
        );
    }
    Ok(())
}
