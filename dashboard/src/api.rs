//! JSON api under `/api`
use std::{io, path::PathBuf, sync::Arc};

use axum::{
    Json,
    extract::{Extension, Path, Query, rejection::JsonRejection},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use host_registry::{HostRegistry, RegistryError, Reservation, Storage};
use serde::Deserialize;
use serde_json::{Value, json};
use sys_actions::{Actions, CommandRunner};
use tracing::{debug, error};

/// default number of lines returned by `/api/logs`
pub(crate) const DEFAULT_LOG_LINES: usize = 100;

/// Where the process writes its log
#[derive(Debug, Clone)]
pub struct LogFile(pub PathBuf);

/// error body `{"status":"error","message":...}`
#[derive(Debug)]
pub(crate) struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (
            self.status,
            Json(json!({ "status": "error", "message": self.message })),
        )
            .into_response()
    }
}

impl From<RegistryError> for ApiError {
    fn from(err: RegistryError) -> Self {
        let status = match &err {
            RegistryError::MissingField(_) | RegistryError::InvalidField { .. } => {
                StatusCode::BAD_REQUEST
            }
            RegistryError::NotFound(_) => StatusCode::NOT_FOUND,
            RegistryError::DuplicateMac(_) | RegistryError::DuplicateHostname(_) => {
                StatusCode::CONFLICT
            }
            RegistryError::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        Self::new(status, err.to_string())
    }
}

impl From<JsonRejection> for ApiError {
    fn from(err: JsonRejection) -> Self {
        Self::new(StatusCode::BAD_REQUEST, err.body_text())
    }
}

type ApiResult<T> = Result<T, ApiError>;

#[derive(Debug, Deserialize)]
pub(crate) struct HostBody {
    mac: Option<String>,
    hostname: Option<String>,
    ip: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct LinesQuery {
    lines: Option<usize>,
}

fn success(extra: Value) -> Value {
    let mut body = json!({ "status": "success" });
    if let (Some(body), Value::Object(extra)) = (body.as_object_mut(), extra) {
        body.extend(extra);
    }
    body
}

/// restart after a successful write; the write itself is not undone, the
/// message tells the client the host was `done` regardless
async fn restart_after<R>(actions: &Actions<R>, done: &str) -> ApiResult<()>
where
    R: CommandRunner,
{
    actions.restart_service().await.map_err(|err| {
        ApiError::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("host {done} but restarting failed: {err}"),
        )
    })
}

pub(crate) async fn list_hosts<S>(
    Extension(registry): Extension<Arc<HostRegistry<S>>>,
) -> ApiResult<Json<Value>>
where
    S: Storage,
{
    let hosts = registry.try_read_all().await?;
    Ok(Json(success(json!({ "hosts": hosts }))))
}

pub(crate) async fn add_host<S, R>(
    Extension(registry): Extension<Arc<HostRegistry<S>>>,
    Extension(actions): Extension<Arc<Actions<R>>>,
    body: Result<Json<HostBody>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<Value>)>
where
    S: Storage,
    R: CommandRunner,
{
    let Json(body) = body?;
    let res = Reservation::new(
        body.mac.as_deref().unwrap_or_default(),
        body.hostname.as_deref().unwrap_or_default(),
        body.ip.as_deref(),
    );
    debug!(?res, "api add host");
    registry.add(res.clone()).await?;
    restart_after(&actions, "saved").await?;
    Ok((StatusCode::CREATED, Json(success(json!({ "host": res })))))
}

pub(crate) async fn update_host<S, R>(
    Extension(registry): Extension<Arc<HostRegistry<S>>>,
    Extension(actions): Extension<Arc<Actions<R>>>,
    Path(mac): Path<String>,
    body: Result<Json<HostBody>, JsonRejection>,
) -> ApiResult<Json<Value>>
where
    S: Storage,
    R: CommandRunner,
{
    let Json(body) = body?;
    let res = Reservation::new(
        body.mac.as_deref().unwrap_or(&mac),
        body.hostname.as_deref().unwrap_or_default(),
        body.ip.as_deref(),
    );
    let outcome = registry.edit(&mac, res).await?;
    if outcome.is_changed() {
        restart_after(&actions, "saved").await?;
    }
    Ok(Json(success(json!({ "changed": outcome.is_changed() }))))
}

pub(crate) async fn delete_host<S, R>(
    Extension(registry): Extension<Arc<HostRegistry<S>>>,
    Extension(actions): Extension<Arc<Actions<R>>>,
    Path(mac): Path<String>,
) -> ApiResult<Json<Value>>
where
    S: Storage,
    R: CommandRunner,
{
    registry.remove(&mac).await?;
    restart_after(&actions, "removed").await?;
    Ok(Json(success(json!({}))))
}

async fn read_log(path: &std::path::Path) -> ApiResult<String> {
    tokio::fs::read_to_string(path).await.map_err(|err| {
        if err.kind() == io::ErrorKind::NotFound {
            ApiError::new(StatusCode::NOT_FOUND, "log file not found")
        } else {
            error!(?err, path = %path.display(), "failed to read log file");
            ApiError::new(StatusCode::INTERNAL_SERVER_ERROR, err.to_string())
        }
    })
}

/// last `n` lines of `contents`
fn tail(contents: &str, n: usize) -> Vec<&str> {
    let lines = contents.lines().collect::<Vec<_>>();
    let skip = lines.len().saturating_sub(n);
    lines[skip..].to_vec()
}

pub(crate) async fn logs(
    Extension(LogFile(path)): Extension<LogFile>,
    Query(query): Query<LinesQuery>,
) -> ApiResult<Json<Value>> {
    let contents = read_log(&path).await?;
    let lines = tail(&contents, query.lines.unwrap_or(DEFAULT_LOG_LINES));
    Ok(Json(success(json!({ "lines": lines }))))
}

pub(crate) async fn download_logs(
    Extension(LogFile(path)): Extension<LogFile>,
) -> ApiResult<Response> {
    let contents = read_log(&path).await?;
    let name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| "dhcp_dashboard.log".to_owned());
    Ok((
        [
            (header::CONTENT_TYPE, "text/plain; charset=utf-8".to_owned()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{name}\""),
            ),
        ],
        contents,
    )
        .into_response())
}

#[cfg(test)]
mod tests {
    use host_registry::MemoryStore;
    use reqwest::StatusCode;
    use serde_json::{Value, json};
    use sys_actions::{CommandOutput, ScriptedRunner};

    use super::tail;
    use crate::testing::{CONF, spawn};

    #[test]
    fn test_tail() {
        assert_eq!(tail("a\nb\nc\n", 2), vec!["b", "c"]);
        assert_eq!(tail("a\nb\n", 10), vec!["a", "b"]);
        assert!(tail("", 5).is_empty());
    }

    #[tokio::test]
    async fn test_list_hosts() -> anyhow::Result<()> {
        let srv = spawn(MemoryStore::new(CONF), ScriptedRunner::new()).await?;
        let body: Value = reqwest::get(srv.url("/api/hosts"))
            .await?
            .error_for_status()?
            .json()
            .await?;
        assert_eq!(
            body,
            json!({
                "status": "success",
                "hosts": [{ "mac": "aa:bb:cc:dd:ee:ff", "hostname": "printer", "ip": "192.168.1.50" }]
            })
        );
        Ok(())
    }

    #[tokio::test]
    async fn test_add_host_status_codes() -> anyhow::Result<()> {
        let srv = spawn(MemoryStore::new(CONF), ScriptedRunner::new()).await?;
        let client = reqwest::Client::new();

        let resp = client
            .post(srv.url("/api/hosts"))
            .json(&json!({ "mac": "11:22:33:44:55:66", "hostname": "laptop" }))
            .send()
            .await?;
        assert_eq!(resp.status(), StatusCode::CREATED);
        assert_eq!(srv.actions.runner().count("systemctl restart"), 1);

        let resp = client
            .post(srv.url("/api/hosts"))
            .json(&json!({ "mac": "AA-BB-CC-DD-EE-FF", "hostname": "other" }))
            .send()
            .await?;
        assert_eq!(resp.status(), StatusCode::CONFLICT);
        let body: Value = resp.json().await?;
        assert_eq!(body["status"], "error");

        let resp = client
            .post(srv.url("/api/hosts"))
            .json(&json!({ "mac": "22:22:33:44:55:66", "hostname": "PRINTER" }))
            .send()
            .await?;
        assert_eq!(resp.status(), StatusCode::CONFLICT);

        let resp = client
            .post(srv.url("/api/hosts"))
            .json(&json!({ "mac": "22:22:33:44:55:66" }))
            .send()
            .await?;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        let resp = client
            .post(srv.url("/api/hosts"))
            .header("content-type", "application/json")
            .body("{not json")
            .send()
            .await?;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        // only the first request restarted
        assert_eq!(srv.actions.runner().count("systemctl restart"), 1);
        Ok(())
    }

    #[tokio::test]
    async fn test_add_host_write_failure() -> anyhow::Result<()> {
        let srv = spawn(MemoryStore::read_only(CONF), ScriptedRunner::new()).await?;
        let resp = reqwest::Client::new()
            .post(srv.url("/api/hosts"))
            .json(&json!({ "mac": "11:22:33:44:55:66", "hostname": "laptop" }))
            .send()
            .await?;
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(srv.actions.runner().count("systemctl restart"), 0);
        Ok(())
    }

    #[tokio::test]
    async fn test_add_host_restart_failure() -> anyhow::Result<()> {
        let srv = spawn(
            MemoryStore::new(CONF),
            ScriptedRunner::new().respond("systemctl restart", CommandOutput::failure(1, "failed")),
        )
        .await?;
        let resp = reqwest::Client::new()
            .post(srv.url("/api/hosts"))
            .json(&json!({ "mac": "11:22:33:44:55:66", "hostname": "laptop" }))
            .send()
            .await?;
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body: Value = resp.json().await?;
        assert!(body["message"].as_str().unwrap_or_default().contains("host saved"));
        assert!(srv.registry.store().contents().contains("laptop"));
        Ok(())
    }

    #[tokio::test]
    async fn test_delete_host_restart_failure() -> anyhow::Result<()> {
        let srv = spawn(
            MemoryStore::new(CONF),
            ScriptedRunner::new().respond("systemctl restart", CommandOutput::failure(1, "failed")),
        )
        .await?;
        let resp = reqwest::Client::new()
            .delete(srv.url("/api/hosts/aa:bb:cc:dd:ee:ff"))
            .send()
            .await?;
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body: Value = resp.json().await?;
        let message = body["message"].as_str().unwrap_or_default().to_owned();
        assert!(message.contains("host removed"), "{message}");
        assert!(!message.contains("saved"), "{message}");
        assert!(!srv.registry.store().contents().contains("printer"));
        Ok(())
    }

    #[tokio::test]
    async fn test_add_host_rejects_line_breaks() -> anyhow::Result<()> {
        let srv = spawn(MemoryStore::new(CONF), ScriptedRunner::new()).await?;
        let client = reqwest::Client::new();

        for body in [
            json!({ "mac": "11:22:33:44:55:66", "hostname": "laptop\nserver=6.6.6.6" }),
            json!({ "mac": "11:22:33:44:55:66", "hostname": "lap top,10.9.9.9" }),
            json!({ "mac": "11:22:33:44:55:66", "hostname": "laptop", "ip": "10.0.0.1 10.0.0.2" }),
            json!({ "mac": "11:22:33:44:55:66", "hostname": "laptop", "ip": "10.0.0.1,5m" }),
        ] {
            let resp = client.post(srv.url("/api/hosts")).json(&body).send().await?;
            assert_eq!(resp.status(), StatusCode::BAD_REQUEST, "{body}");
        }

        let resp = client
            .put(srv.url("/api/hosts/aa:bb:cc:dd:ee:ff"))
            .json(&json!({ "hostname": "printer\naddress=/x/1.2.3.4" }))
            .send()
            .await?;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        assert_eq!(srv.registry.store().contents(), CONF);
        assert_eq!(srv.actions.runner().count("systemctl"), 0);
        Ok(())
    }

    #[tokio::test]
    async fn test_update_host() -> anyhow::Result<()> {
        let srv = spawn(MemoryStore::new(CONF), ScriptedRunner::new()).await?;
        let client = reqwest::Client::new();

        let body: Value = client
            .put(srv.url("/api/hosts/aa:bb:cc:dd:ee:ff"))
            .json(&json!({ "hostname": "printer", "ip": "192.168.1.50" }))
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        assert_eq!(body, json!({ "status": "success", "changed": false }));
        assert_eq!(srv.actions.runner().count("systemctl"), 0);

        let body: Value = client
            .put(srv.url("/api/hosts/aa:bb:cc:dd:ee:ff"))
            .json(&json!({ "hostname": "office-printer" }))
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        assert_eq!(body["changed"], true);
        assert!(
            srv.registry
                .store()
                .contents()
                .contains("dhcp-host=aa:bb:cc:dd:ee:ff,office-printer\n")
        );
        assert_eq!(srv.actions.runner().count("systemctl restart"), 1);

        let resp = client
            .put(srv.url("/api/hosts/00:00:00:00:00:00"))
            .json(&json!({ "hostname": "ghost" }))
            .send()
            .await?;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
        Ok(())
    }

    #[tokio::test]
    async fn test_delete_host() -> anyhow::Result<()> {
        let srv = spawn(MemoryStore::new(CONF), ScriptedRunner::new()).await?;
        let client = reqwest::Client::new();

        let resp = client
            .delete(srv.url("/api/hosts/00:00:00:00:00:00"))
            .send()
            .await?;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);

        let resp = client
            .delete(srv.url("/api/hosts/aa:bb:cc:dd:ee:ff"))
            .send()
            .await?;
        assert_eq!(resp.status(), StatusCode::OK);
        assert!(!srv.registry.store().contents().contains("printer"));
        assert_eq!(srv.actions.runner().count("systemctl restart"), 1);
        Ok(())
    }

    #[tokio::test]
    async fn test_logs() -> anyhow::Result<()> {
        let srv = spawn(MemoryStore::new(CONF), ScriptedRunner::new()).await?;

        let resp = reqwest::get(srv.url("/api/logs")).await?;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);

        let log = (1..=150).map(|i| format!("line {i}\n")).collect::<String>();
        std::fs::write(&srv.log_file, log)?;

        let body: Value = reqwest::get(srv.url("/api/logs")).await?.json().await?;
        let lines = body["lines"].as_array().cloned().unwrap_or_default();
        assert_eq!(lines.len(), 100);
        assert_eq!(lines[0], "line 51");
        assert_eq!(lines[99], "line 150");

        let body: Value = reqwest::get(srv.url("/api/logs?lines=2")).await?.json().await?;
        assert_eq!(body["lines"], json!(["line 149", "line 150"]));

        let resp = reqwest::get(srv.url("/api/logs/download"))
            .await?
            .error_for_status()?;
        assert_eq!(
            resp.headers()
                .get(reqwest::header::CONTENT_DISPOSITION)
                .and_then(|v| v.to_str().ok()),
            Some("attachment; filename=\"dhcp_dashboard.log\"")
        );
        assert!(resp.text().await?.starts_with("line 1\n"));
        Ok(())
    }
}
