// Backend HTTP client
//
// Wraps `reqwest::Client` with backend-specific URL construction and
// response parsing. Error bodies are FastAPI-shaped `{"detail": ...}`;
// the detail string is surfaced as the rejection reason. All methods
// return parsed payloads — callers never see raw responses.

use std::time::Duration;

use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::debug;
use url::Url;

use crate::error::Error;
use crate::models::{
    Ack, AddServerRequest, AddServiceRequest, CheckType, EditServerRequest, EditServiceRequest,
    Mode, RemoveServerRequest, RemoveServiceRequest, Server, ServerList, ServiceList,
    SetModeRequest, StatusMap, StatusSnapshot,
};

/// FastAPI error envelope: `{"detail": "reason"}` with a non-2xx status.
#[derive(serde::Deserialize)]
struct ErrorDetail {
    detail: Option<String>,
}

/// HTTP client for the load-balancer control plane.
///
/// Cheap to clone — the inner `reqwest::Client` is an `Arc` internally.
#[derive(Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: Url,
}

impl ApiClient {
    /// Create a client for the given backend root URL
    /// (e.g. `http://127.0.0.1:5000`).
    pub fn new(base_url: Url, timeout: Duration) -> Result<Self, Error> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(Error::Transport)?;
        Ok(Self { http, base_url })
    }

    /// Create a client with a pre-built `reqwest::Client`.
    pub fn with_client(http: reqwest::Client, base_url: Url) -> Self {
        Self { http, base_url }
    }

    /// The backend root URL.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    // ── URL builders ─────────────────────────────────────────────────

    /// Build a full URL for an API path: `{base}/api/{path}`.
    fn api_url(&self, path: &str) -> Result<Url, Error> {
        let base = self.base_url.as_str().trim_end_matches('/');
        Ok(Url::parse(&format!("{base}/api/{path}"))?)
    }

    /// The log-stream WebSocket URL: `{base}/ws` with the scheme mapped
    /// to `ws`/`wss`. Any path prefix on the base URL (reverse proxies)
    /// is preserved.
    pub fn ws_url(&self) -> Result<Url, Error> {
        let base = self.base_url.as_str().trim_end_matches('/');
        let mut url = Url::parse(&format!("{base}/ws"))?;
        let scheme = if url.scheme() == "https" { "wss" } else { "ws" };
        if url.set_scheme(scheme).is_err() {
            return Err(Error::StreamConnect(format!(
                "cannot derive a websocket URL from {base}"
            )));
        }
        Ok(url)
    }

    // ── Request helpers ──────────────────────────────────────────────

    async fn get<T: DeserializeOwned>(&self, url: Url) -> Result<T, Error> {
        debug!("GET {url}");
        let resp = self.http.get(url).send().await.map_err(Error::Transport)?;
        Self::parse_response(resp).await
    }

    async fn post<T: DeserializeOwned>(
        &self,
        url: Url,
        body: &(impl Serialize + Sync),
    ) -> Result<T, Error> {
        debug!("POST {url}");
        let resp = self
            .http
            .post(url)
            .json(body)
            .send()
            .await
            .map_err(Error::Transport)?;
        Self::parse_response(resp).await
    }

    /// Check the status, extract a `detail` reason on rejection, and
    /// parse the body. A non-JSON body on a success status is a
    /// protocol mismatch, reported as [`Error::Deserialization`].
    async fn parse_response<T: DeserializeOwned>(resp: reqwest::Response) -> Result<T, Error> {
        let status = resp.status();
        let body = resp.text().await.map_err(Error::Transport)?;

        if !status.is_success() {
            let message = serde_json::from_str::<ErrorDetail>(&body)
                .ok()
                .and_then(|e| e.detail)
                .unwrap_or_else(|| format!("HTTP {status}"));
            return Err(Error::Backend {
                status: status.as_u16(),
                message,
            });
        }

        serde_json::from_str(&body).map_err(|e| {
            // Truncate on a char boundary: a multibyte character
            // straddling the cutoff must not panic the preview.
            let mut end = body.len().min(200);
            while !body.is_char_boundary(end) {
                end -= 1;
            }
            let preview = &body[..end];
            Error::Deserialization {
                message: format!("{e} (body preview: {preview:?})"),
                body,
            }
        })
    }

    // ── Read surface ─────────────────────────────────────────────────

    /// Health probe. Any well-formed JSON payload on a success status
    /// counts as reachable; everything else is an error.
    pub async fn probe(&self) -> Result<(), Error> {
        let _: serde_json::Value = self.get(self.api_url("health")?).await?;
        Ok(())
    }

    /// Fetch the configured service list.
    pub async fn list_services(&self) -> Result<Vec<crate::models::Service>, Error> {
        let list: ServiceList = self.get(self.api_url("list_services")?).await?;
        Ok(list.services)
    }

    /// Fetch the servers of one service.
    pub async fn list_servers(&self, service: &str) -> Result<Vec<Server>, Error> {
        let mut url = self.api_url("list_servers")?;
        url.query_pairs_mut().append_pair("service", service);
        let list: ServerList = self.get(url).await?;
        Ok(list.servers)
    }

    /// Fetch the health-status snapshot.
    pub async fn status(&self) -> Result<StatusMap, Error> {
        let snap: StatusSnapshot = self.get(self.api_url("status")?).await?;
        Ok(snap.services)
    }

    // ── Mutation surface ─────────────────────────────────────────────

    pub async fn set_mode(&self, service: &str, mode: Mode) -> Result<Ack, Error> {
        let body = SetModeRequest {
            service: service.to_owned(),
            mode,
        };
        self.post(self.api_url("set_mode")?, &body).await
    }

    pub async fn add_service(&self, name: &str, listen_port: u16, mode: Mode) -> Result<Ack, Error> {
        let body = AddServiceRequest {
            name: name.to_owned(),
            listen_port,
            mode,
        };
        self.post(self.api_url("add_service")?, &body).await
    }

    pub async fn edit_service(&self, req: &EditServiceRequest) -> Result<Ack, Error> {
        self.post(self.api_url("edit_service")?, req).await
    }

    pub async fn remove_service(&self, name: &str) -> Result<Ack, Error> {
        let body = RemoveServiceRequest {
            name: name.to_owned(),
        };
        self.post(self.api_url("remove_service")?, &body).await
    }

    pub async fn add_server(&self, req: &AddServerRequest) -> Result<Ack, Error> {
        self.post(self.api_url("add_server")?, req).await
    }

    pub async fn edit_server(&self, req: &EditServerRequest) -> Result<Ack, Error> {
        self.post(self.api_url("edit_server")?, req).await
    }

    pub async fn remove_server(&self, service: &str, ip: &str, port: u16) -> Result<Ack, Error> {
        let body = RemoveServerRequest {
            service: service.to_owned(),
            ip: ip.to_owned(),
            port,
        };
        self.post(self.api_url("remove_server")?, &body).await
    }
}

/// Build an [`AddServerRequest`], keeping `http_path` only for HTTP checks.
///
/// The backend ignores the field for other check types; the gateway
/// contract is to not send it at all.
pub fn add_server_request(
    service: &str,
    ip: &str,
    port: u16,
    check_type: CheckType,
    http_path: Option<String>,
) -> AddServerRequest {
    AddServerRequest {
        service: service.to_owned(),
        ip: ip.to_owned(),
        port,
        check_type,
        http_path: match check_type {
            CheckType::Http => http_path,
            CheckType::Tcp | CheckType::Smpp => None,
        },
    }
}
