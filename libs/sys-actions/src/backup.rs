//! timestamped copies of the dnsmasq config
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};
use tracing::{error, info};

use crate::{
    Actions, Result,
    metrics::{ACTION_FAILURES, ACTION_RUNS},
    runner::CommandRunner,
};

/// `<conf>.backup_<YYYYMMDD_HHMMSS>`, next to the config itself
pub fn backup_path(conf: &Path, at: DateTime<Local>) -> PathBuf {
    let mut name = conf.as_os_str().to_owned();
    name.push(format!(".backup_{}", at.format("%Y%m%d_%H%M%S")));
    PathBuf::from(name)
}

impl<R> Actions<R>
where
    R: CommandRunner,
{
    /// Copy the config next to itself, returns the path of the copy.
    pub async fn backup_config(&self) -> Result<PathBuf> {
        ACTION_RUNS.backup.inc();
        let dest = backup_path(&self.cfg.conf_path, Local::now());
        match tokio::fs::copy(&self.cfg.conf_path, &dest).await {
            Ok(bytes) => {
                info!(backup = %dest.display(), bytes, "backup created");
                Ok(dest)
            }
            Err(err) => {
                ACTION_FAILURES.backup.inc();
                error!(?err, conf = %self.cfg.conf_path.display(), "error creating backup");
                Err(err.into())
            }
        }
    }
}
