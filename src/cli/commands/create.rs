//! Create command - create a ledger index file

use crate::cache::FileInfoBackingCache;
use crate::cli::args::CreateArgs;
use crate::config::Config;
use crate::error::LedgerResult;
use crate::ui::{self, UiContext};

/// Execute the create command
pub async fn execute(args: CreateArgs, config: &Config) -> LedgerResult<()> {
    let ctx = UiContext::detect();
    let cache = FileInfoBackingCache::from_config(&config.storage);

    let fi = cache.load_file_info(args.ledger, Some(args.master_key.as_bytes()))?;
    let fenced = if args.fenced { fi.set_fenced() } else { Ok(false) };
    let path = fi.path().display().to_string();
    fi.release()?;
    fenced?;

    cache.close_all_without_flushing()?;

    ui::step_ok_detail(&ctx, &format!("Ledger {} index ready", args.ledger), &path);
    Ok(())
}
