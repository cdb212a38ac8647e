//! powering the device off
use tracing::{error, warn};

use crate::{
    Actions,
    metrics::{ACTION_FAILURES, ACTION_RUNS},
    runner::CommandRunner,
};

pub const SHUTDOWN: &str = "shutdown";

impl<R> Actions<R>
where
    R: CommandRunner,
{
    /// Start `shutdown -h now` and return. The host going away is the only
    /// outcome, so a failure to start the command is logged and nothing more.
    pub async fn shutdown(&self) {
        ACTION_RUNS.shutdown.inc();
        warn!("shutting down the device");
        if let Err(err) = self.runner.spawn(SHUTDOWN, &["-h", "now"]).await {
            ACTION_FAILURES.shutdown.inc();
            error!(?err, "failed to invoke shutdown");
        }
    }
}
