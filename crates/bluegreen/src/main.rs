mod commands;

use bluegreen_assembly::TemplateFormat;
use bluegreen_core::{BuildWiring, PipelineOptions, VariantCounts};
use clap::{Args, Parser, Subcommand};
use colored::Colorize;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "bluegreen")]
#[command(about = "ECS blue/green デプロイ構成を環境から合成する", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// スタックを合成して出力ディレクトリに書き出す
    Synth {
        /// 出力ディレクトリ
        #[arg(short, long, env = "BLUEGREEN_OUTPUT", default_value = "cdk.out")]
        output: PathBuf,
        /// テンプレート形式 (json, yaml)
        #[arg(short, long, env = "BLUEGREEN_FORMAT", default_value = "json")]
        format: TemplateFormat,
        #[command(flatten)]
        synth: SynthArgs,
    },
    /// 合成されるスタックの一覧を表示
    List,
    /// 以前の出力との差分を表示
    Diff {
        /// 比較対象の出力ディレクトリ
        #[arg(short, long)]
        previous: PathBuf,
        #[command(flatten)]
        synth: SynthArgs,
    },
    /// サービス名に対するタグを表示
    Tags {
        /// サービス名
        service: String,
        /// JSON で出力
        #[arg(long)]
        json: bool,
    },
    /// 環境と構成を検証
    Validate {
        #[command(flatten)]
        synth: SynthArgs,
    },
    /// バージョン情報を表示
    Version,
}

/// 合成オプション
#[derive(Args, Debug, Clone)]
struct SynthArgs {
    /// blue サービスの desired count
    #[arg(long, default_value_t = 0)]
    blue_count: u32,
    /// green サービスの desired count
    #[arg(long, default_value_t = 2)]
    green_count: u32,
    /// 各ビルドブランチを同名タグのプロジェクトに接続する（デフォルトは交差接続）
    #[arg(long)]
    direct_build_wiring: bool,
}

impl SynthArgs {
    fn options(&self) -> PipelineOptions {
        PipelineOptions {
            counts: VariantCounts {
                blue: self.blue_count,
                green: self.green_count,
            },
            wiring: if self.direct_build_wiring {
                BuildWiring::Direct
            } else {
                BuildWiring::Crossed
            },
            ..Default::default()
        }
    }
}

fn main() {
    let cli = Cli::parse();

    // 標準出力はコマンド出力専用、ログは stderr
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = run(cli) {
        eprintln!();
        eprintln!("{} {:#}", "✗".red().bold(), e);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    // Versionコマンドは環境不要
    if matches!(cli.command, Commands::Version) {
        println!("bluegreen {}", env!("CARGO_PKG_VERSION"));
        return Ok(());
    }

    // 何かを合成・出力する前に環境を解決する
    let env = bluegreen_config::resolve_environment()?;

    match cli.command {
        Commands::Synth {
            output,
            format,
            synth,
        } => commands::synth::handle(&env, &synth.options(), &output, format),
        Commands::List => commands::list::handle(&env),
        Commands::Diff { previous, synth } => {
            commands::diff::handle(&env, &synth.options(), &previous)
        }
        Commands::Tags { service, json } => commands::tags::handle(&env, &service, json),
        Commands::Validate { synth } => commands::validate::handle(&env, &synth.options()),
        Commands::Version => unreachable!("Version is handled before environment resolution"),
    }
}
