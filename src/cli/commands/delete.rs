//! Delete command - delete a ledger index file

use crate::cache::LedgerLoader;
use crate::cli::args::DeleteArgs;
use crate::config::Config;
use crate::error::LedgerResult;
use crate::fileinfo::{DirectoryLoader, FileInfo};
use crate::ui::{self, UiContext};

/// Execute the delete command
///
/// Works on the file directly rather than through the cache: a cached handle
/// would try to flush the deleted index when it is released.
pub async fn execute(args: DeleteArgs, config: &Config) -> LedgerResult<()> {
    let ctx = UiContext::detect();
    let loader = DirectoryLoader::new(&config.storage.ledger_dir);

    let path = loader.resolve(args.ledger, false)?;
    let fi = FileInfo::open(args.ledger, &path, None, config.storage.header_version)?;
    fi.delete()?;

    ui::step_ok_detail(
        &ctx,
        &format!("Deleted ledger {}", args.ledger),
        &path.display().to_string(),
    );
    Ok(())
}
