// Device API HTTP client
//
// Wraps `reqwest::Client` with controller-specific URL construction,
// session handling and error classification. Endpoint methods live in
// sibling modules (auth, system, zones) as inherent impls so this file
// stays focused on transport mechanics.

use std::time::Duration;

use reqwest::{RequestBuilder, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace, warn};
use url::Url;

use crate::auth::LoginOutcome;
use crate::error::{CommunicationCause, Error};
use crate::transport::TransportConfig;

/// Path prefix of the device API, relative to the host root.
pub const API_BASE: &str = "/api/4/";

/// Query parameter (and login response field) carrying the session token.
pub(crate) const ACCESS_TOKEN: &str = "access_token";

/// Per-device authentication state.
///
/// The token is set at most once per successful login and is only cleared
/// by building a new client.
pub(crate) struct Session {
    pub(crate) password: SecretString,
    pub(crate) token: Option<SecretString>,
}

/// HTTP client for a single irrigation controller.
///
/// One client owns one session. Login and the token read used to build
/// authenticated requests share a single async lock, so concurrent callers
/// never race a half-finished login.
pub struct DeviceClient {
    http: reqwest::Client,
    base_url: Url,
    address: String,
    timeout: Duration,
    pub(crate) session: Mutex<Session>,
    cancel: CancellationToken,
}

impl DeviceClient {
    /// Create a client for the device at `address`.
    ///
    /// `address` may carry a scheme prefix or a trailing slash; both are
    /// stripped. An empty password puts the client in unauthenticated mode.
    pub fn new(
        address: &str,
        password: SecretString,
        transport: &TransportConfig,
    ) -> Result<Self, Error> {
        let address = normalize_address(address);
        let base_url = Url::parse(&format!("https://{address}{API_BASE}"))?;
        let http = transport.build_client()?;
        let mut client = Self::with_client(http, base_url, password);
        client.timeout = transport.timeout;
        Ok(client)
    }

    /// Create a client with a pre-built `reqwest::Client` and API base URL.
    ///
    /// `base_url` must point at the API root (e.g. `https://host/api/4/`);
    /// a missing trailing slash is added.
    pub fn with_client(http: reqwest::Client, mut base_url: Url, password: SecretString) -> Self {
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }
        let address = match (base_url.host_str(), base_url.port()) {
            (Some(host), Some(port)) => format!("{host}:{port}"),
            (Some(host), None) => host.to_owned(),
            (None, _) => base_url.as_str().to_owned(),
        };
        Self {
            http,
            base_url,
            address,
            timeout: crate::transport::DEFAULT_TIMEOUT,
            session: Mutex::new(Session {
                password,
                token: None,
            }),
            cancel: CancellationToken::new(),
        }
    }

    /// Override the per-request timeout.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// The normalized device address (`host` or `host:port`).
    pub fn address(&self) -> &str {
        &self.address
    }

    /// The API root URL.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// The underlying HTTP client.
    pub fn http(&self) -> &reqwest::Client {
        &self.http
    }

    /// Whether a session token is currently held.
    pub async fn is_authenticated(&self) -> bool {
        self.session.lock().await.token.is_some()
    }

    /// Abort in-flight requests and refuse new ones.
    ///
    /// Requests cut short this way resolve to a communication error with
    /// [`CommunicationCause::Interrupted`].
    pub fn close(&self) {
        debug!(address = %self.address, "closing device client");
        self.cancel.cancel();
    }

    /// Whether [`close()`](Self::close) has been called.
    pub fn is_closed(&self) -> bool {
        self.cancel.is_cancelled()
    }

    // ── URL builders ─────────────────────────────────────────────────

    /// Resolve an endpoint path against the API root.
    pub(crate) fn endpoint_url(&self, path: &str) -> Result<Url, Error> {
        Ok(self.base_url.join(path)?)
    }

    // ── Request helpers ──────────────────────────────────────────────

    /// Send a GET request and deserialize the `200 OK` body.
    ///
    /// When `token` is given it is appended as the `access_token` query
    /// parameter. The token never reaches the logs.
    pub(crate) async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        token: Option<&SecretString>,
    ) -> Result<T, Error> {
        let mut url = self.endpoint_url(path)?;
        debug!("GET {}", url);
        if let Some(token) = token {
            url.query_pairs_mut()
                .append_pair(ACCESS_TOKEN, token.expose_secret());
        }

        let (status, body) = self.execute(self.http.get(url)).await?;
        if status != StatusCode::OK {
            warn!(address = %self.address, path, %status, "device rejected request");
            return Err(self.communication(CommunicationCause::Status {
                status: status.as_u16(),
            }));
        }

        trace!(path, body = %body, "response body");
        parse_body(&body)
    }

    /// Log in if needed, then GET `path` with the session token.
    ///
    /// Without a session (empty password, or the device refused the login)
    /// no request is sent and `T::default()` is returned.
    pub(crate) async fn get_authenticated<T: DeserializeOwned + Default>(
        &self,
        path: &str,
    ) -> Result<T, Error> {
        let token = {
            let mut session = self.session.lock().await;
            if self.login_locked(&mut session).await? == LoginOutcome::NotAuthenticated {
                debug!(path, "no session, returning empty result");
                return Ok(T::default());
            }
            session.token.clone()
        };
        self.get(path, token.as_ref()).await
    }

    /// Send a request and read the whole body, honouring cancellation.
    pub(crate) async fn execute(
        &self,
        builder: RequestBuilder,
    ) -> Result<(StatusCode, String), Error> {
        if self.cancel.is_cancelled() {
            return Err(self.communication(CommunicationCause::Interrupted));
        }

        let exchange = async {
            let resp = builder.timeout(self.timeout).send().await?;
            let status = resp.status();
            let body = resp.text().await?;
            Ok::<_, reqwest::Error>((status, body))
        };

        tokio::select! {
            biased;
            () = self.cancel.cancelled() => {
                Err(self.communication(CommunicationCause::Interrupted))
            }
            result = exchange => result.map_err(|e| self.transport_error(e)),
        }
    }

    fn transport_error(&self, err: reqwest::Error) -> Error {
        let cause = if err.is_timeout() {
            CommunicationCause::timeout(self.timeout)
        } else {
            CommunicationCause::Transport(err)
        };
        self.communication(cause)
    }

    pub(crate) fn communication(&self, cause: CommunicationCause) -> Error {
        Error::Communication {
            address: self.address.clone(),
            cause,
        }
    }
}

/// Strip any `scheme://` prefix and trailing slashes from a device address.
pub fn normalize_address(raw: &str) -> String {
    let trimmed = raw.trim().trim_end_matches('/');
    match trimmed.split_once("://") {
        Some((_, rest)) => rest.trim_end_matches('/').to_owned(),
        None => trimmed.to_owned(),
    }
}

fn parse_body<T: DeserializeOwned>(body: &str) -> Result<T, Error> {
    serde_json::from_str(body).map_err(|e| Error::Deserialization {
        message: e.to_string(),
        body: body.to_owned(),
    })
}
