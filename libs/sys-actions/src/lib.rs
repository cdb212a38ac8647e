//! # sys-actions
//!
//! The handful of things the dashboard does to the host besides editing the
//! dnsmasq config: restart dnsmasq or ask for its status, back up its
//! config, move the device onto another Wi-Fi network, and power it off.
//!
//! Each action runs one or more external commands through a
//! [`CommandRunner`] and reports the outcome. Nothing is retried, except
//! that applying Wi-Fi settings polls a bounded number of times for the new
//! network to show up.
//!
//! [`CommandRunner`]: crate::runner::CommandRunner
#![warn(
    missing_debug_implementations,
    rust_2018_idioms,
    unreachable_pub,
    non_snake_case,
    non_upper_case_globals
)]
#![deny(rustdoc::broken_intra_doc_links)]

use std::{path::PathBuf, time::Duration};

pub mod backup;
pub mod error;
pub mod metrics;
pub mod power;
pub mod runner;
pub mod scripted;
pub mod service;
pub mod wifi;

pub use crate::{
    error::{ActionError, Result},
    runner::{CommandOutput, CommandRunner, SystemRunner},
    scripted::ScriptedRunner,
};

/// Default wait between Wi-Fi association checks
pub const DEFAULT_WIFI_POLL_INTERVAL: Duration = Duration::from_secs(1);
/// Default pause after each interface state change
pub const DEFAULT_WIFI_SETTLE_DELAY: Duration = Duration::from_secs(2);

/// Everything the actions need to know about the host
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionsConfig {
    /// systemd unit name
    pub service: String,
    /// dnsmasq config, source of backups
    pub conf_path: PathBuf,
    /// wpa_supplicant config, overwritten by [`Actions::apply_wifi`]
    pub wpa_conf_path: PathBuf,
    pub wifi_interface: String,
    pub wifi_country: String,
    pub wifi_poll_attempts: u32,
    pub wifi_poll_interval: Duration,
    pub wifi_settle_delay: Duration,
}

impl Default for ActionsConfig {
    fn default() -> Self {
        Self {
            service: "dnsmasq".to_owned(),
            conf_path: PathBuf::from("/etc/dnsmasq.conf"),
            wpa_conf_path: PathBuf::from("/etc/wpa_supplicant/wpa_supplicant.conf"),
            wifi_interface: "wlan0".to_owned(),
            wifi_country: "US".to_owned(),
            wifi_poll_attempts: 30,
            wifi_poll_interval: DEFAULT_WIFI_POLL_INTERVAL,
            wifi_settle_delay: DEFAULT_WIFI_SETTLE_DELAY,
        }
    }
}

/// Stateless invoker of host actions
#[derive(Debug)]
pub struct Actions<R> {
    runner: R,
    cfg: ActionsConfig,
}

impl<R> Actions<R>
where
    R: CommandRunner,
{
    pub fn new(runner: R, cfg: ActionsConfig) -> Self {
        Self { runner, cfg }
    }

    pub fn config(&self) -> &ActionsConfig {
        &self.cfg
    }

    pub fn runner(&self) -> &R {
        &self.runner
    }

    /// run `program`, turning a non-zero exit into [`ActionError::CommandFailed`]
    async fn checked(&self, program: &str, args: &[&str]) -> Result<CommandOutput> {
        let out = self.runner.run(program, args).await?;
        if !out.success {
            return Err(ActionError::CommandFailed {
                command: runner::command_line(program, args),
                stderr: out.stderr.trim().to_owned(),
            });
        }
        Ok(out)
    }
}
