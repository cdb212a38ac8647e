//! dnsmasq restart & status through systemctl
use tracing::{error, info, instrument, warn};

use crate::{
    Actions, ActionError, Result,
    metrics::{ACTION_FAILURES, ACTION_RUNS},
    runner::CommandRunner,
};

pub const SYSTEMCTL: &str = "systemctl";

impl<R> Actions<R>
where
    R: CommandRunner,
{
    /// Restart the service. When systemctl exits non-zero the current status
    /// is fetched and returned along with its stderr.
    #[instrument(level = "debug", skip_all, fields(service = %self.cfg.service))]
    pub async fn restart_service(&self) -> Result<()> {
        ACTION_RUNS.restart.inc();
        let service = self.cfg.service.as_str();
        let out = match self.runner.run(SYSTEMCTL, &["restart", service]).await {
            Ok(out) => out,
            Err(err) => {
                ACTION_FAILURES.restart.inc();
                error!(?err, "exception when restarting service");
                return Err(err.into());
            }
        };

        if !out.success {
            ACTION_FAILURES.restart.inc();
            let status = self.service_status().await;
            error!(stderr = %out.stderr.trim(), %status, "error restarting service");
            return Err(ActionError::ServiceRestart {
                service: service.to_owned(),
                stderr: out.stderr.trim().to_owned(),
                status,
            });
        }
        info!("service restarted successfully");
        Ok(())
    }

    /// Raw `systemctl status` output. Never fails: when no status can be had
    /// the [`status_unavailable`] placeholder is returned instead.
    ///
    /// [`status_unavailable`]: Actions::status_unavailable
    pub async fn service_status(&self) -> String {
        ACTION_RUNS.status.inc();
        // systemctl exits 3 for an inactive unit but still prints its status
        match self.runner.run(SYSTEMCTL, &["status", self.cfg.service.as_str()]).await {
            Ok(out) if out.success || !out.stdout.trim().is_empty() => out.stdout,
            Ok(out) => {
                ACTION_FAILURES.status.inc();
                warn!(code = ?out.code, stderr = %out.stderr.trim(), "no status from systemctl");
                self.status_unavailable()
            }
            Err(err) => {
                ACTION_FAILURES.status.inc();
                error!(?err, service = %self.cfg.service, "error getting service status");
                self.status_unavailable()
            }
        }
    }

    pub fn status_unavailable(&self) -> String {
        format!("Unable to get {} status", self.cfg.service)
    }
}
