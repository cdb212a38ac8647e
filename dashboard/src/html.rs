//! form driven html pages: `/`, `/edit` and `/remove`
use std::sync::Arc;

use axum::{
    extract::{Extension, Form, Query},
    response::{Html, IntoResponse, Redirect, Response},
};
use host_registry::{EditOutcome, HostRegistry, Reservation, Storage};
use parking_lot::Mutex;
use serde::Deserialize;
use sys_actions::{Actions, CommandRunner};
use tracing::{debug, warn};

use crate::views;

/// Messages shown once, on the next render of the dashboard. The dashboard
/// has a single operator so one process-wide queue stands in for sessions.
#[derive(Debug, Clone, Default)]
pub struct Flashes(Arc<Mutex<Vec<String>>>);

impl Flashes {
    /// queue `msg` for the next render
    pub fn push(&self, msg: impl Into<String>) {
        self.0.lock().push(msg.into());
    }

    /// drain pending messages
    pub fn take(&self) -> Vec<String> {
        std::mem::take(&mut *self.0.lock())
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct DashboardForm {
    #[serde(default)]
    action: String,
    #[serde(default)]
    mac: String,
    #[serde(default)]
    hostname: String,
    #[serde(default)]
    ip: String,
    #[serde(default)]
    ssid: String,
    #[serde(default)]
    psk: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct MacQuery {
    mac: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct EditForm {
    #[serde(default)]
    old_mac: String,
    #[serde(default)]
    new_mac: String,
    #[serde(default)]
    new_hostname: String,
    #[serde(default)]
    new_ip: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RemoveForm {
    #[serde(default)]
    mac: String,
}

async fn render<S, R>(
    registry: &HostRegistry<S>,
    actions: &Actions<R>,
    flashes: &Flashes,
) -> Response
where
    S: Storage,
    R: CommandRunner,
{
    let hosts = registry.read_all().await;
    Html(views::dashboard(
        &hosts,
        &flashes.take(),
        &actions.config().service,
    ))
    .into_response()
}

pub(crate) async fn index<S, R>(
    Extension(registry): Extension<Arc<HostRegistry<S>>>,
    Extension(actions): Extension<Arc<Actions<R>>>,
    Extension(flashes): Extension<Flashes>,
) -> Response
where
    S: Storage,
    R: CommandRunner,
{
    render(&registry, &actions, &flashes).await
}

pub(crate) async fn submit<S, R>(
    Extension(registry): Extension<Arc<HostRegistry<S>>>,
    Extension(actions): Extension<Arc<Actions<R>>>,
    Extension(flashes): Extension<Flashes>,
    Form(form): Form<DashboardForm>,
) -> Response
where
    S: Storage,
    R: CommandRunner,
{
    let service = actions.config().service.clone();
    debug!(action = %form.action, "dashboard action");
    match form.action.as_str() {
        "add" => {
            let res = Reservation::new(&form.mac, &form.hostname, Some(form.ip.as_str()));
            match registry.add(res).await {
                Ok(()) => restart_after(&actions, &flashes, "Host added successfully.").await,
                Err(err) if err.is_validation() => flashes.push(err.to_string()),
                Err(err) => flashes.push(format!("Error adding host: {err}")),
            }
        }
        "restart" => match actions.restart_service().await {
            Ok(()) => flashes.push(format!("{service} service restarted.")),
            Err(err) => flashes.push(format!("Error restarting {service}: {err}")),
        },
        "backup" => match actions.backup_config().await {
            Ok(path) => flashes.push(format!("Backup created: {}", path.display())),
            Err(err) => flashes.push(format!("Error creating backup: {err}")),
        },
        "status" => {
            let status = actions.service_status().await;
            flashes.push(format!("{service} status:\n{status}"));
        }
        "shutdown" => return Html(views::confirm_shutdown()).into_response(),
        "confirm_shutdown" => {
            flashes.push("Shutting down the device...");
            actions.shutdown().await;
        }
        "wifi" => match actions.apply_wifi(&form.ssid, &form.psk).await {
            Ok(()) => flashes.push(format!("Connected to Wi-Fi network {}.", form.ssid.trim())),
            Err(err) => flashes.push(format!("Error applying Wi-Fi settings: {err}")),
        },
        other => {
            warn!(action = %other, "unknown dashboard action");
            flashes.push(format!("Unknown action: {other}"));
        }
    }
    render(&registry, &actions, &flashes).await
}

pub(crate) async fn edit_page<S>(
    Extension(registry): Extension<Arc<HostRegistry<S>>>,
    Extension(flashes): Extension<Flashes>,
    Query(query): Query<MacQuery>,
) -> Response
where
    S: Storage,
{
    let host = match query.mac {
        Some(mac) => registry.get(&mac).await,
        None => None,
    };
    match host {
        Some(host) => Html(views::edit(&host)).into_response(),
        None => {
            flashes.push("Host not found.");
            Redirect::to("/").into_response()
        }
    }
}

pub(crate) async fn edit_submit<S, R>(
    Extension(registry): Extension<Arc<HostRegistry<S>>>,
    Extension(actions): Extension<Arc<Actions<R>>>,
    Extension(flashes): Extension<Flashes>,
    Form(form): Form<EditForm>,
) -> Redirect
where
    S: Storage,
    R: CommandRunner,
{
    let res = Reservation::new(&form.new_mac, &form.new_hostname, Some(form.new_ip.as_str()));
    match registry.edit(form.old_mac.trim(), res).await {
        Ok(EditOutcome::Unchanged) => flashes.push("No changes were made."),
        Ok(EditOutcome::Updated) => {
            restart_after(&actions, &flashes, "Host updated successfully.").await
        }
        Err(err) if err.is_validation() => flashes.push(err.to_string()),
        Err(err) => flashes.push(format!("Error updating host: {err}")),
    }
    Redirect::to("/")
}

pub(crate) async fn remove<S, R>(
    Extension(registry): Extension<Arc<HostRegistry<S>>>,
    Extension(actions): Extension<Arc<Actions<R>>>,
    Extension(flashes): Extension<Flashes>,
    Form(form): Form<RemoveForm>,
) -> Redirect
where
    S: Storage,
    R: CommandRunner,
{
    match registry.remove(form.mac.trim()).await {
        Ok(()) => restart_after(&actions, &flashes, "Host removed successfully.").await,
        Err(err) if err.is_validation() => flashes.push(err.to_string()),
        Err(err) => flashes.push(format!("Error removing host: {err}")),
    }
    Redirect::to("/")
}

/// the config changed on disk, dnsmasq only notices after a restart
async fn restart_after<R>(actions: &Actions<R>, flashes: &Flashes, done: &str)
where
    R: CommandRunner,
{
    match actions.restart_service().await {
        Ok(()) => flashes.push(done),
        Err(err) => flashes.push(format!("{done} Restarting failed: {err}")),
    }
}
