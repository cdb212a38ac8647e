//! # host-registry
//!
//! `host-registry` translates between the `dhcp-host=` directives in a dnsmasq
//! config and a list of [`Reservation`]s.
//!
//! The backing text sits behind the [`Storage`] trait, which only knows how to
//! load and overwrite the whole file. [`HostRegistry`] wraps a `Storage` and
//! implements add/edit/remove on top of it: every change re-reads the file,
//! computes the new reservation list and rewrites the file. Nothing is cached
//! between calls.
//!
//! Changes are serialized by a mutex owned by the registry, so two requests
//! editing at once can no longer silently drop one another's update.
//!
//! [`Storage`]: crate::Storage
//! [`HostRegistry`]: crate::HostRegistry
#![warn(
    missing_debug_implementations,
    rust_2018_idioms,
    unreachable_pub,
    non_snake_case,
    non_upper_case_globals
)]
#![deny(rustdoc::broken_intra_doc_links)]

use std::io;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::{debug, error, info};

pub mod directive;
pub mod error;
pub mod file;
pub mod memory;
pub mod metrics;

pub use crate::{
    error::{RegistryError, Result},
    file::FileStore,
    memory::MemoryStore,
};
use crate::metrics::{REGISTRY_WRITE_ERRORS, REGISTRY_WRITES, RESERVATIONS};

/// Where the config text lives. Implementations only need whole-file
/// load & overwrite, the registry does everything else.
#[async_trait]
pub trait Storage: Send + Sync + 'static {
    async fn load(&self) -> io::Result<String>;
    async fn store(&self, contents: &str) -> io::Result<()>;
    /// human readable location, used in logs
    fn describe(&self) -> String;
}

/// A static mapping from a hardware address to a hostname and, optionally,
/// a fixed address. Without an `ip` dnsmasq picks one from its range.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Reservation {
    pub mac: String,
    pub hostname: String,
    #[serde(default)]
    pub ip: Option<String>,
}

impl Reservation {
    /// Build from raw form input. Surrounding whitespace is dropped and a blank
    /// `ip` means "no fixed address".
    pub fn new(mac: &str, hostname: &str, ip: Option<&str>) -> Self {
        Self {
            mac: mac.trim().to_owned(),
            hostname: hostname.trim().to_owned(),
            ip: ip.map(str::trim).filter(|ip| !ip.is_empty()).map(str::to_owned),
        }
    }

    /// Required fields are present and every field reads back as written,
    /// so nothing outside the directive grammar (newlines, commas, spaces)
    /// ever reaches the config.
    pub fn validate(&self) -> Result<()> {
        if self.mac.is_empty() {
            return Err(RegistryError::MissingField("mac"));
        }
        if self.hostname.is_empty() {
            return Err(RegistryError::MissingField("hostname"));
        }
        check_chars("mac", &self.mac, directive::is_mac_char)?;
        check_chars("hostname", &self.hostname, directive::is_hostname_char)?;
        if let Some(ip) = &self.ip {
            check_chars("ip", ip, directive::is_ip_char)?;
        }
        Ok(())
    }

    /// does this reservation belong to `mac`? see [`mac_eq`]
    pub fn has_mac(&self, mac: &str) -> bool {
        mac_eq(&self.mac, mac)
    }
}

fn check_chars(field: &'static str, value: &str, accept: fn(char) -> bool) -> Result<()> {
    if value.chars().all(accept) {
        Ok(())
    } else {
        Err(RegistryError::InvalidField {
            field,
            value: value.to_owned(),
        })
    }
}

/// MACs compare case-insensitively, and `-` and `:` separators are
/// interchangeable, the same way dnsmasq reads them.
pub fn mac_eq(a: &str, b: &str) -> bool {
    let norm = |c: char| if c == '-' { ':' } else { c.to_ascii_lowercase() };
    a.len() == b.len() && a.chars().map(norm).eq(b.chars().map(norm))
}

/// hostnames are DNS names, compared case-insensitively
pub fn hostname_eq(a: &str, b: &str) -> bool {
    a.eq_ignore_ascii_case(b)
}

/// Result of a successful [`HostRegistry::edit`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditOutcome {
    /// config rewritten, dnsmasq needs a restart
    Updated,
    /// new values equal the old ones, nothing was written
    Unchanged,
}

impl EditOutcome {
    pub fn is_changed(&self) -> bool {
        matches!(self, EditOutcome::Updated)
    }
}

#[derive(Debug)]
pub struct HostRegistry<S> {
    store: S,
    write_lock: Mutex<()>,
}

impl<S> HostRegistry<S>
where
    S: Storage,
{
    pub fn new(store: S) -> Self {
        Self {
            store,
            write_lock: Mutex::new(()),
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// All reservations in file order. A read failure is logged and treated
    /// as "no reservations known".
    pub async fn read_all(&self) -> Vec<Reservation> {
        match self.try_read_all().await {
            Ok(hosts) => hosts,
            Err(err) => {
                error!(?err, store = %self.store.describe(), "error reading DHCP hosts");
                Vec::new()
            }
        }
    }

    /// Like [`read_all`] but hands the i/o error back
    ///
    /// [`read_all`]: HostRegistry::read_all
    pub async fn try_read_all(&self) -> Result<Vec<Reservation>> {
        let contents = self.store.load().await?;
        let hosts = directive::parse(&contents);
        RESERVATIONS.set(hosts.len() as i64);
        debug!(count = hosts.len(), "read hosts from configuration");
        Ok(hosts)
    }

    /// Replace every directive in the config with `hosts`, keeping all other
    /// lines in their existing order.
    pub async fn write_all(&self, hosts: &[Reservation]) -> Result<()> {
        hosts.iter().try_for_each(Reservation::validate)?;
        let _guard = self.write_lock.lock().await;
        self.persist(hosts).await
    }

    /// look up a single reservation by MAC
    pub async fn get(&self, mac: &str) -> Option<Reservation> {
        self.read_all().await.into_iter().find(|h| h.has_mac(mac))
    }

    /// Append `res`, rejecting a MAC or hostname that is already reserved.
    pub async fn add(&self, res: Reservation) -> Result<()> {
        res.validate()?;
        let _guard = self.write_lock.lock().await;
        let mut hosts = self.try_read_all().await?;

        if hosts.iter().any(|h| h.has_mac(&res.mac)) {
            return Err(RegistryError::DuplicateMac(res.mac));
        }
        if hosts.iter().any(|h| hostname_eq(&h.hostname, &res.hostname)) {
            return Err(RegistryError::DuplicateHostname(res.hostname));
        }

        info!(mac = %res.mac, hostname = %res.hostname, ip = ?res.ip, "adding host");
        hosts.push(res);
        self.persist(&hosts).await?;
        REGISTRY_WRITES.add.inc();
        Ok(())
    }

    /// Replace the reservation for `old_mac` with `res`.
    ///
    /// Fails with [`RegistryError::NotFound`] when `old_mac` is not reserved and
    /// with a duplicate error when `res` collides with some other reservation.
    /// Identical values are not written back at all.
    pub async fn edit(&self, old_mac: &str, res: Reservation) -> Result<EditOutcome> {
        res.validate()?;
        let _guard = self.write_lock.lock().await;
        let hosts = self.try_read_all().await?;

        if !hosts.iter().any(|h| h.has_mac(old_mac)) {
            return Err(RegistryError::NotFound(old_mac.to_owned()));
        }
        let others = || hosts.iter().filter(|h| !h.has_mac(old_mac));
        if others().any(|h| h.has_mac(&res.mac)) {
            return Err(RegistryError::DuplicateMac(res.mac));
        }
        if others().any(|h| hostname_eq(&h.hostname, &res.hostname)) {
            return Err(RegistryError::DuplicateHostname(res.hostname));
        }

        let updated = hosts
            .iter()
            .map(|h| {
                if h.has_mac(old_mac) {
                    res.clone()
                } else {
                    h.clone()
                }
            })
            .collect::<Vec<_>>();
        if updated == hosts {
            debug!(%old_mac, "edit made no changes");
            return Ok(EditOutcome::Unchanged);
        }

        info!(%old_mac, new_mac = %res.mac, hostname = %res.hostname, ip = ?res.ip, "updating host");
        self.persist(&updated).await?;
        REGISTRY_WRITES.edit.inc();
        Ok(EditOutcome::Updated)
    }

    /// Delete the reservation for `mac`. The config is left untouched when
    /// there is none.
    pub async fn remove(&self, mac: &str) -> Result<()> {
        let _guard = self.write_lock.lock().await;
        let mut hosts = self.try_read_all().await?;
        let before = hosts.len();
        hosts.retain(|h| !h.has_mac(mac));
        if hosts.len() == before {
            tracing::warn!(%mac, "attempted to remove non-existent host");
            return Err(RegistryError::NotFound(mac.to_owned()));
        }

        self.persist(&hosts).await?;
        REGISTRY_WRITES.remove.inc();
        info!(%mac, "removed host");
        Ok(())
    }

    /// rewrite the config, caller must hold `write_lock`
    async fn persist(&self, hosts: &[Reservation]) -> Result<()> {
        let res = async {
            let contents = self.store.load().await?;
            self.store
                .store(&directive::render(&contents, hosts))
                .await
        }
        .await;

        match res {
            Ok(()) => {
                RESERVATIONS.set(hosts.len() as i64);
                info!(count = hosts.len(), store = %self.store.describe(), "wrote hosts to configuration");
                Ok(())
            }
            Err(err) => {
                REGISTRY_WRITE_ERRORS.inc();
                error!(?err, store = %self.store.describe(), "error writing DHCP hosts");
                Err(err.into())
            }
        }
    }
}
