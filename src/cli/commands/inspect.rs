//! Inspect command - show a ledger index header

use crate::cache::FileInfoBackingCache;
use crate::cli::args::{InspectArgs, OutputFormat};
use crate::config::Config;
use crate::error::LedgerResult;
use crate::ui::{self, UiContext};
use serde::Serialize;

#[derive(Debug, Serialize)]
struct IndexReport {
    ledger: u64,
    path: String,
    header_version: u32,
    master_key: String,
    fenced: bool,
    size: u64,
}

/// Execute the inspect command
pub async fn execute(args: InspectArgs, config: &Config) -> LedgerResult<()> {
    let cache = FileInfoBackingCache::from_config(&config.storage);

    let fi = cache.load_file_info(args.ledger, None)?;
    let report = fi.size().map(|size| IndexReport {
        ledger: args.ledger,
        path: fi.path().display().to_string(),
        header_version: fi.header_version(),
        master_key: hex::encode(fi.master_key()),
        fenced: fi.is_fenced(),
        size,
    });
    fi.release()?;
    let report = report?;

    match args.format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
        OutputFormat::Text => {
            let ctx = UiContext::detect();
            ui::section(&ctx, &format!("Ledger {}", report.ledger));
            ui::key_value(&ctx, "path", &report.path);
            ui::key_value(&ctx, "header version", &report.header_version.to_string());
            ui::key_value(&ctx, "master key", &report.master_key);
            ui::key_value(&ctx, "fenced", &report.fenced.to_string());
            ui::key_value(&ctx, "size", &format!("{} bytes", report.size));
        }
    }

    Ok(())
}
