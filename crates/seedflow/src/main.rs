mod commands;
mod git;
mod prompt;
mod release;
mod workflow;

use clap::{Parser, Subcommand};
use colored::Colorize;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "seed")]
#[command(about = "答えるだけで、デプロイ一式が生える。", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// 新しいマルチサービスプロジェクトを対話的にスキャフォールドする
    New {
        /// プロジェクトを生成するディレクトリ（省略時はカレント）
        path: Option<PathBuf>,
        /// プロジェクト名（省略時は対話で入力）
        #[arg(long, env = "SEED_PROJECT_NAME")]
        project_name: Option<String>,
        /// pullバリアントのイメージ参照に使う名前空間
        #[arg(long, default_value = "seedbox")]
        image_namespace: String,
    },
    /// バージョンを表示
    Version,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::New {
            path,
            project_name,
            image_namespace,
        } => {
            let mut prompt = prompt::StdinPrompt::new();
            commands::new::handle(&mut prompt, path, project_name, image_namespace)
        }
        Commands::Version => {
            println!("seedflow {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    };

    if let Err(err) = result {
        eprintln!("{} {err:#}", "エラー:".red().bold());
        std::process::exit(1);
    }
}
