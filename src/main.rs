// receipt-ocr - Extract structured data from receipts and invoices with Gemini
// Author: kelexine (https://github.com/kelexine)

use anyhow::{Context, Result};
use clap::Parser;
use receipt_ocr::cli::{render_results, Args};
use receipt_ocr::config::AppConfig;
use receipt_ocr::error::ExtractError;
use receipt_ocr::extraction::ReceiptExtractor;
use receipt_ocr::utils::logging;
use std::process::ExitCode;
use tracing::info;

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            let code = err
                .downcast_ref::<ExtractError>()
                .map(ExtractError::exit_code)
                .unwrap_or(1);
            eprintln!("Error: {:#}", err);
            ExitCode::from(code)
        }
    }
}

async fn run() -> Result<()> {
    // Phase 1: Pick up GEMINI_API_KEY from a local .env before clap reads the environment
    dotenvy::dotenv().ok();
    let args = Args::parse();

    // Phase 2: Load configuration, flags win
    let mut config = AppConfig::load(args.config.as_deref())?;
    args.apply_to(&mut config);

    // Phase 3: Initialize logging (stderr)
    logging::init(&config.logging)?;
    info!("Starting receipt-ocr v{}", env!("CARGO_PKG_VERSION"));

    if args.mime_type.is_some() && args.files.len() > 1 {
        anyhow::bail!("--mime-type can only be used with a single input file");
    }

    // Phase 4: One inference call per file, in order; the first failure aborts
    let extractor = ReceiptExtractor::new(&config.gemini)?;
    let mut results = Vec::with_capacity(args.files.len());
    for path in &args.files {
        let result = extractor
            .extract_file(path, args.mime_type.as_deref())
            .await
            .with_context(|| format!("{}", path.display()))?;
        results.push(result);
    }

    // Phase 5: A single file prints one object, several print an array
    let rendered = render_results(&results, args.compact)?;

    match &args.output {
        Some(path) => {
            std::fs::write(path, rendered)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            info!("Wrote result to {}", path.display());
        }
        None => print!("{}", rendered),
    }

    Ok(())
}
