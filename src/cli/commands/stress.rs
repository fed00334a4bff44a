//! Stress command - concurrent load/release cycles on one ledger

use crate::cache::{CacheStats, CachedFileInfo, FileInfoBackingCache, DEAD_REF};
use crate::cli::args::{OutputFormat, StressArgs};
use crate::config::Config;
use crate::error::{LedgerError, LedgerResult};
use crate::fileinfo::FileInfo;
use crate::ui::{self, UiContext};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info};

#[derive(Debug, Serialize)]
struct StressReport {
    ledger: u64,
    ops: usize,
    workers: usize,
    generations: usize,
    violations: usize,
    stats: CacheStats,
}

type Handle = Arc<CachedFileInfo<FileInfo>>;

/// Execute the stress command
pub async fn execute(args: StressArgs, config: &Config) -> LedgerResult<()> {
    let workers = args.workers.max(1);
    let cache = Arc::new(FileInfoBackingCache::from_config(&config.storage));
    let master_key = Arc::new(args.master_key.into_bytes());

    let mut tasks = Vec::with_capacity(workers);
    for worker in 0..workers {
        let ops = args.ops / workers + usize::from(worker < args.ops % workers);
        let cache = Arc::clone(&cache);
        let master_key = Arc::clone(&master_key);
        let ledger = args.ledger;
        tasks.push(tokio::task::spawn_blocking(move || {
            run_worker(&cache, ledger, &master_key, ops)
        }));
    }

    let mut generations: HashMap<u64, Handle> = HashMap::new();
    for task in tasks {
        let seen = task
            .await
            .map_err(|e| LedgerError::Internal(format!("stress worker failed: {}", e)))??;
        for fi in seen {
            generations.entry(fi.generation()).or_insert(fi);
        }
    }

    // Every generation must be fully retired once all workers released.
    let violations = generations
        .values()
        .filter(|fi| !fi.is_closed() || fi.ref_count() != DEAD_REF)
        .count();

    let stats = cache.stats();
    cache.close_all_without_flushing()?;
    info!(
        "Stress run on ledger {}: {} generations, {} violations",
        args.ledger,
        generations.len(),
        violations
    );

    let report = StressReport {
        ledger: args.ledger,
        ops: args.ops,
        workers,
        generations: generations.len(),
        violations,
        stats,
    };

    match args.format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
        OutputFormat::Text => print_report(&report),
    }

    if violations > 0 {
        return Err(LedgerError::Internal(format!(
            "{} handle generations were not retired",
            violations
        )));
    }
    Ok(())
}

fn run_worker(
    cache: &FileInfoBackingCache,
    ledger: u64,
    master_key: &[u8],
    ops: usize,
) -> LedgerResult<Vec<Handle>> {
    let mut seen: Vec<Handle> = Vec::new();
    for _ in 0..ops {
        let fi = cache.load_file_info(ledger, Some(master_key))?;
        if fi.is_closed() {
            return Err(LedgerError::Internal(format!("loaded closed {}", fi)));
        }
        fi.release()?;
        if !seen.iter().any(|s| Arc::ptr_eq(s, &fi)) {
            debug!("Observed {}", fi);
            seen.push(fi);
        }
    }
    Ok(seen)
}

fn print_report(report: &StressReport) {
    let ctx = UiContext::detect();
    ui::section(&ctx, &format!("Stress ledger {}", report.ledger));
    ui::key_value(&ctx, "operations", &report.ops.to_string());
    ui::key_value(&ctx, "workers", &report.workers.to_string());
    ui::key_value(&ctx, "generations", &report.generations.to_string());
    ui::key_value(&ctx, "hits", &report.stats.hits.to_string());
    ui::key_value(&ctx, "evictions", &report.stats.evictions.to_string());
    ui::key_value_status(
        &ctx,
        "eviction failures",
        &report.stats.eviction_failures.to_string(),
        report.stats.eviction_failures == 0,
    );
    ui::key_value_status(
        &ctx,
        "violations",
        &report.violations.to_string(),
        report.violations == 0,
    );
}
