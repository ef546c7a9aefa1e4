use anyhow::Context;
use clap::Parser;
use directory_import::config::{CliConfig, Command};
use directory_import::utils::{logger, validation::Validate};
use directory_import::{
    merge_documents, merge_lenient, BoundedFetcher, CancellationToken, DirectoryImporter,
    ErrorKind, ImportConfig, ImportError, JsonFileSink, MergedDirectory,
};
use std::path::{Path, PathBuf};

const DEFAULT_OUTPUT: &str = "./directory-import.json";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = CliConfig::parse();

    // 初始化日誌
    if cli.json_logs {
        logger::init_json_logger();
    } else {
        logger::init_cli_logger(cli.verbose);
    }

    tracing::info!("Starting directory-import");
    if cli.verbose {
        tracing::debug!("CLI config: {:?}", cli);
    }

    let config = match &cli.config {
        Some(path) => ImportConfig::from_file(path)
            .with_context(|| format!("Failed to load config file '{}'", path.display()))?,
        None => ImportConfig::default(),
    };

    // 驗證配置
    if let Err(e) = config.validate() {
        tracing::error!("❌ Configuration validation failed: {}", e);
        eprintln!("❌ {}", e.user_friendly_message());
        eprintln!("💡 {}", e.recovery_suggestion());
        std::process::exit(1);
    }

    // Ctrl-C 取消進行中的下載
    let cancel = CancellationToken::new();
    let signal_token = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupt received, cancelling");
            signal_token.cancel();
        }
    });

    match run(cli.command, &config, &cancel).await {
        Ok(message) => {
            tracing::info!("✅ {}", message);
            println!("✅ {}", message);
            Ok(())
        }
        Err(e) => {
            tracing::error!("❌ Import failed: {} (Kind: {:?})", e, e.kind());
            eprintln!("❌ {}", e.user_friendly_message());
            eprintln!("💡 {}", e.recovery_suggestion());
            std::process::exit(exit_code(&e));
        }
    }
}

async fn run(
    command: Command,
    config: &ImportConfig,
    cancel: &CancellationToken,
) -> Result<String, ImportError> {
    match command {
        Command::Fetch { url, output } => {
            let fetcher = BoundedFetcher::new(config.fetch_config())?;
            let outcome = fetcher.fetch_with_cancel(&url, &output, cancel).await?;
            Ok(format!(
                "Saved {} bytes from {} to {}",
                outcome.bytes,
                outcome.url,
                output.display()
            ))
        }
        Command::Parse {
            files,
            output,
            lenient,
        } => {
            let mut documents = Vec::with_capacity(files.len());
            for file in &files {
                documents.push(tokio::fs::read(file).await?);
            }

            let merged = if lenient || config.is_lenient() {
                let report = merge_lenient(&documents);
                for failure in &report.failures {
                    eprintln!(
                        "⚠️ Skipped {}: {}",
                        files[failure.index].display(),
                        failure.error
                    );
                }
                report.merged
            } else {
                merge_documents(&documents)?
            };

            write_or_print(&merged, output.as_deref()).await
        }
        Command::Import {
            urls,
            output,
            lenient,
        } => {
            let output = output
                .or_else(|| config.output_path().map(PathBuf::from))
                .unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT));

            let fetcher = BoundedFetcher::new(config.fetch_config())?;
            let importer = DirectoryImporter::new(fetcher, JsonFileSink::new(output))
                .with_lenient(lenient || config.is_lenient());
            let summary = importer.run(&urls, cancel).await?;

            Ok(format!(
                "Imported {} departments and {} people from {} document(s) ({} skipped) into {}",
                summary.departments,
                summary.people,
                summary.documents,
                summary.skipped_documents,
                summary.output
            ))
        }
    }
}

async fn write_or_print(merged: &MergedDirectory, output: Option<&Path>) -> Result<String, ImportError> {
    let json = serde_json::to_string_pretty(merged)?;
    let summary = format!(
        "{} departments, {} people",
        merged.departments.len(),
        merged.people.len()
    );

    match output {
        Some(path) => {
            tokio::fs::write(path, json).await?;
            Ok(format!("Wrote {} to {}", summary, path.display()))
        }
        None => {
            println!("{}", json);
            Ok(summary)
        }
    }
}

// 根據錯誤種類決定退出碼
fn exit_code(e: &ImportError) -> i32 {
    match e.kind() {
        ErrorKind::InvalidUrl | ErrorKind::ParseError | ErrorKind::Config => 1,
        ErrorKind::DownloadTimeout | ErrorKind::FileSizeLimit | ErrorKind::NetworkError => 2,
        ErrorKind::Io => 3,
        ErrorKind::Cancelled => 130,
    }
}
