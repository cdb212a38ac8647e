//! Wi-Fi client reconfiguration
//!
//! Applying new settings rewrites wpa_supplicant.conf, bounces the wireless
//! interface, asks wpa_supplicant to reload and then polls until the
//! interface reports the new SSID or the attempt budget runs out.
use tracing::{debug, error, info, instrument, warn};

use crate::{
    Actions, ActionError, Result,
    metrics::{ACTION_FAILURES, ACTION_RUNS},
    runner::CommandRunner,
};

pub const IP: &str = "ip";
pub const WPA_CLI: &str = "wpa_cli";
pub const IWGETID: &str = "iwgetid";

/// wpa_supplicant.conf holding a single WPA-PSK network
pub fn supplicant_conf(country: &str, ssid: &str, psk: &str) -> String {
    format!(
        "ctrl_interface=DIR=/var/run/wpa_supplicant GROUP=netdev
update_config=1
country={country}

network={{
    ssid=\"{ssid}\"
    psk=\"{psk}\"
    key_mgmt=WPA-PSK
}}
"
    )
}

/// presence check; quotes & control chars would break out of the quoted value
fn check_field(name: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(ActionError::InvalidInput(format!("{name} is required")));
    }
    if value.chars().any(|c| c == '"' || c.is_control()) {
        return Err(ActionError::InvalidInput(format!(
            "{name} contains unsupported characters"
        )));
    }
    Ok(())
}

impl<R> Actions<R>
where
    R: CommandRunner,
{
    /// Point the Wi-Fi client at `ssid`. Succeeds only once the interface
    /// reports `ssid` as its current network, gives up after
    /// `wifi_poll_attempts` checks.
    #[instrument(level = "debug", skip_all, fields(%ssid, iface = %self.cfg.wifi_interface))]
    pub async fn apply_wifi(&self, ssid: &str, psk: &str) -> Result<()> {
        ACTION_RUNS.wifi.inc();
        let res = self.try_apply_wifi(ssid, psk).await;
        if let Err(err) = &res {
            ACTION_FAILURES.wifi.inc();
            error!(?err, "failed to apply wifi settings");
        }
        res
    }

    async fn try_apply_wifi(&self, ssid: &str, psk: &str) -> Result<()> {
        check_field("ssid", ssid)?;
        check_field("psk", psk)?;
        let iface = self.cfg.wifi_interface.as_str();
        let settle = self.cfg.wifi_settle_delay;

        tokio::fs::write(
            &self.cfg.wpa_conf_path,
            supplicant_conf(&self.cfg.wifi_country, ssid, psk),
        )
        .await?;
        debug!(path = %self.cfg.wpa_conf_path.display(), "wrote supplicant config");

        self.checked(IP, &["link", "set", iface, "down"]).await?;
        tokio::time::sleep(settle).await;
        self.checked(IP, &["link", "set", iface, "up"]).await?;
        tokio::time::sleep(settle).await;
        self.checked(WPA_CLI, &["-i", iface, "reconfigure"]).await?;

        let attempts = self.cfg.wifi_poll_attempts;
        for attempt in 1..=attempts {
            match self.current_ssid().await {
                Some(current) if current == ssid => {
                    info!(attempt, "connected to new network");
                    return Ok(());
                }
                current => debug!(attempt, ?current, "waiting for association"),
            }
            if attempt < attempts {
                tokio::time::sleep(self.cfg.wifi_poll_interval).await;
            }
        }
        Err(ActionError::WifiNotAssociated {
            ssid: ssid.to_owned(),
            attempts,
        })
    }

    /// network the interface is associated with, if any
    async fn current_ssid(&self) -> Option<String> {
        match self
            .runner
            .run(IWGETID, &[self.cfg.wifi_interface.as_str(), "-r"])
            .await
        {
            Ok(out) if out.success => Some(out.stdout.trim().to_owned()).filter(|s| !s.is_empty()),
            Ok(_) => None,
            Err(err) => {
                warn!(?err, "could not query current ssid");
                None
            }
        }
    }
}
