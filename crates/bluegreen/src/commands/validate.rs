use bluegreen_core::{BuildWiring, EnvironmentConfig, PipelineOptions};
use colored::Colorize;

pub fn handle(env: &EnvironmentConfig, options: &PipelineOptions) -> anyhow::Result<()> {
    println!("{}", "構成を検証中...".blue());
    println!("デプロイ先: {}", env.target().cyan());
    println!("pattern: {} / stage: {}", env.pattern.cyan(), env.stage.cyan());

    let app = bluegreen_core::synthesize(env, options)?;

    println!("{}", "✓ 構成は正常です！".green().bold());
    println!();
    println!("サマリー:");
    for (stage, stack) in app.all_stacks() {
        let location = stage.map(|s| format!(" [{}]", s)).unwrap_or_default();
        println!(
            "    - {}{} ({}個のリソース)",
            stack.id.cyan(),
            location,
            stack.len()
        );
    }
    println!(
        "  desired count: blue={} green={}",
        options.counts.blue, options.counts.green
    );

    if options.wiring == BuildWiring::Crossed {
        println!();
        println!(
            "{}",
            "⚠ ビルドパイプラインは交差接続です: testblue ブランチが testgreen イメージを、testgreen ブランチが testblue イメージをビルドします"
                .yellow()
        );
        println!("  同名タグに接続するには --direct-build-wiring を指定してください");
    }

    Ok(())
}
