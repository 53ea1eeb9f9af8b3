//! Hop REST request engine.
//!
//! Unique responsibility: turn (method, path template, params, optional body) into a
//! single HTTP round trip and a typed result or typed error.
//!
//! Wire contract:
//! - Header: `Authorization: <raw credential>` (no `Bearer ` prefix)
//! - Header: `Content-Type: application/json` only when a body is sent
//! - Response envelope: `{"success": true, "data": ...}` or
//!   `{"success": false, "error": {"code", "message"}}`, plus the legacy
//!   `{"statusCode", "error", "message"}` shape
//!
//! There is no retry, no backoff and no default timeout: every call is sent exactly once
//! and transport errors are returned as they come from `reqwest`.

use std::{env, fmt, time::Duration};

use reqwest::{
    Method, StatusCode,
    header::{self, HeaderMap, HeaderName, HeaderValue},
};
use serde::{Serialize, de::DeserializeOwned};
use serde_json::{Map, Value};
use tracing::debug;

use crate::{
    hop_auth::{AuthKind, Authorization},
    hop_error::{ApiError, ApiErrorBody, HopError, RequestSummary, Result},
    hop_url::{Params, build_url},
};

/// The default base URL for Hop's API.
pub const DEFAULT_BASE_URL: &str = "https://api.hop.io";

/// The default `User-Agent` sent outside of browser sandboxes.
pub const DEFAULT_USER_AGENT: &str = concat!("hop-api-rs/", env!("CARGO_PKG_VERSION"));

/// Configuration for the Hop API client.
///
/// Only the credential is required; everything else has a default.
#[derive(Clone)]
pub struct HopConfig {
    /// Raw credential (`ptk_...`, `bearer_...` or `pat_...`).
    /// Env: `HOP_TOKEN` (required)
    pub authorization: String,

    /// API base URL.
    /// Env: `HOP_API_URL` (default: "<https://api.hop.io>")
    pub base_url: String,

    /// Per-request timeout. `None` means no timeout.
    /// Env: `HOP_HTTP_TIMEOUT_MS` (optional, milliseconds)
    pub timeout: Option<Duration>,

    /// User agent for HTTP requests.
    /// Env: `HOP_USER_AGENT` (default: "hop-api-rs/<version>")
    pub user_agent: String,

    /// Do not send a `User-Agent` header (browser-like sandboxes refuse to set it).
    /// Env: `HOP_SUPPRESS_USER_AGENT` (default: false)
    pub suppress_user_agent: bool,

    /// Transport override. When set, this client is used instead of building one.
    pub http: Option<reqwest::Client>,
}

impl HopConfig {
    /// Create a configuration with defaults for everything but the credential.
    #[must_use]
    pub fn new(authorization: impl Into<String>) -> Self {
        Self {
            authorization: authorization.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: None,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            suppress_user_agent: false,
            http: None,
        }
    }

    /// Load configuration from environment variables.
    ///
    /// In local dev, this will also attempt to load `.env` from the current directory.
    ///
    /// # Errors
    ///
    /// Returns an error if required environment variables are missing or invalid.
    pub fn from_env() -> Result<Self> {
        let _ = dotenvy::dotenv();

        Ok(Self {
            authorization: must_env("HOP_TOKEN")?,
            base_url: env::var("HOP_API_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.to_string()),
            timeout: parse_opt_u64_env("HOP_HTTP_TIMEOUT_MS")?.map(Duration::from_millis),
            user_agent: env::var("HOP_USER_AGENT")
                .unwrap_or_else(|_| DEFAULT_USER_AGENT.to_string()),
            suppress_user_agent: parse_bool_env("HOP_SUPPRESS_USER_AGENT", false),
            http: None,
        })
    }

    /// Set the API base URL.
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Set a per-request timeout.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Set the `User-Agent` value.
    #[must_use]
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Mark the client as running in a browser-like sandbox (no `User-Agent` header).
    #[must_use]
    pub const fn with_suppressed_user_agent(mut self, suppress: bool) -> Self {
        self.suppress_user_agent = suppress;
        self
    }

    /// Use the given `reqwest::Client` as transport.
    #[must_use]
    pub fn with_http_client(mut self, http: reqwest::Client) -> Self {
        self.http = Some(http);
        self
    }
}

impl fmt::Debug for HopConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HopConfig")
            .field("base_url", &self.base_url)
            .field("timeout", &self.timeout)
            .field("user_agent", &self.user_agent)
            .field("suppress_user_agent", &self.suppress_user_agent)
            .finish_non_exhaustive()
    }
}

/// Per-call transport overrides, passed straight through to the HTTP call.
#[derive(Debug, Clone, Default)]
pub struct RequestOptions {
    /// Timeout for this call only.
    pub timeout: Option<Duration>,
    /// Extra headers. `Authorization` and `Content-Type` are always set by the client.
    pub headers: HeaderMap,
}

impl RequestOptions {
    /// Set a timeout for this call.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Add an extra header.
    ///
    /// # Errors
    ///
    /// Returns [`HopError::InvalidHeader`] if the name or value is not valid HTTP.
    pub fn with_header(mut self, name: &str, value: &str) -> Result<Self> {
        let name = HeaderName::from_bytes(name.as_bytes())
            .map_err(|e| HopError::InvalidHeader(format!("{name}: {e}")))?;
        let value = HeaderValue::from_str(value)
            .map_err(|e| HopError::InvalidHeader(format!("{name}: {e}")))?;
        self.headers.insert(name, value);
        Ok(self)
    }
}

/// Client for the Hop REST API.
///
/// Cheap to clone: clones share the underlying connection pool.
#[derive(Clone)]
pub struct HopClient {
    cfg: HopConfig,
    authorization: Authorization,
    auth_header: HeaderValue,
    user_agent: Option<HeaderValue>,
    http: reqwest::Client,
}

impl HopClient {
    /// Create a new client.
    ///
    /// # Errors
    ///
    /// Returns an error if the credential prefix is not recognized, if the credential or
    /// user agent cannot be sent as a header, or if the HTTP client cannot be built.
    pub fn new(cfg: HopConfig) -> Result<Self> {
        let authorization = Authorization::parse(cfg.authorization.clone())?;

        let mut auth_header = HeaderValue::from_str(authorization.as_str())
            .map_err(|_| HopError::InvalidHeader("authorization".to_string()))?;
        auth_header.set_sensitive(true);

        let user_agent = if cfg.suppress_user_agent {
            None
        } else {
            Some(
                HeaderValue::from_str(&cfg.user_agent)
                    .map_err(|e| HopError::InvalidHeader(format!("user-agent: {e}")))?,
            )
        };

        let http = match &cfg.http {
            Some(http) => http.clone(),
            None => reqwest::Client::builder().build()?,
        };

        Ok(Self {
            cfg,
            authorization,
            auth_header,
            user_agent,
            http,
        })
    }

    /// Create a client from environment variables.
    ///
    /// # Errors
    ///
    /// See [`HopConfig::from_env`] and [`HopClient::new`].
    pub fn from_env() -> Result<Self> {
        Self::new(HopConfig::from_env()?)
    }

    /// Get a reference to the current configuration.
    #[must_use]
    pub const fn config(&self) -> &HopConfig {
        &self.cfg
    }

    /// The kind of credential this client authenticates with.
    #[must_use]
    pub const fn auth_type(&self) -> AuthKind {
        self.authorization.kind()
    }

    /// The validated credential.
    #[must_use]
    pub const fn authorization(&self) -> &Authorization {
        &self.authorization
    }

    /// The API base URL requests are sent to.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.cfg.base_url
    }

    /// Build the full URL for a path template.
    ///
    /// # Errors
    ///
    /// Returns a parameter error if a placeholder cannot be satisfied.
    pub fn url(&self, path: &str, params: Params) -> Result<String> {
        build_url(&self.cfg.base_url, path, params)
    }

    /// Send a GET request.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the server reports a failure.
    pub async fn get<T: DeserializeOwned>(&self, path: &str, params: Params) -> Result<T> {
        self.request::<T, ()>(Method::GET, path, params, None, &RequestOptions::default())
            .await
    }

    /// Send a POST request.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the server reports a failure.
    pub async fn post<T, B>(&self, path: &str, body: Option<&B>, params: Params) -> Result<T>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        self.request(Method::POST, path, params, body, &RequestOptions::default())
            .await
    }

    /// Send a PUT request.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the server reports a failure.
    pub async fn put<T, B>(&self, path: &str, body: Option<&B>, params: Params) -> Result<T>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        self.request(Method::PUT, path, params, body, &RequestOptions::default())
            .await
    }

    /// Send a PATCH request.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the server reports a failure.
    pub async fn patch<T, B>(&self, path: &str, body: Option<&B>, params: Params) -> Result<T>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        self.request(Method::PATCH, path, params, body, &RequestOptions::default())
            .await
    }

    /// Send a DELETE request. Some endpoints take a body.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the server reports a failure.
    pub async fn delete<T, B>(&self, path: &str, body: Option<&B>, params: Params) -> Result<T>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        self.request(Method::DELETE, path, params, body, &RequestOptions::default())
            .await
    }

    /// Send a request and decode the envelope's `data` into `T`.
    ///
    /// A 204 response or a non-JSON response decodes `T` from JSON `null`; use
    /// `Option<_>` or [`serde::de::IgnoredAny`] for endpoints without a payload.
    ///
    /// The status is not checked for non-JSON responses. An HTML error page from a proxy
    /// (a 502, say) also decodes as `null`, so a `T` that cannot be built from `null`
    /// surfaces as [`HopError::Json`] with no HTTP status attached.
    ///
    /// # Errors
    ///
    /// - [`HopError::BodyOnGet`] / parameter errors, before any network I/O
    /// - [`HopError::Http`] for transport failures
    /// - [`HopError::Api`] when the server reports a failure or sends unparsable JSON
    /// - [`HopError::Json`] when the body cannot be encoded or `data` does not fit `T`
    pub async fn request<T, B>(
        &self,
        method: Method,
        path: &str,
        params: Params,
        body: Option<&B>,
        options: &RequestOptions,
    ) -> Result<T>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        if method == Method::GET && body.is_some() {
            return Err(HopError::BodyOnGet);
        }

        let url = self.url(path, params)?;
        let payload = body.map(serde_json::to_vec).transpose()?;

        let mut req = self
            .http
            .request(method.clone(), &url)
            .headers(self.headers(payload.is_some(), options));

        if let Some(timeout) = options.timeout.or(self.cfg.timeout) {
            req = req.timeout(timeout);
        }
        if let Some(payload) = payload {
            req = req.body(payload);
        }

        debug!(%method, %url, "hop api request");
        let resp = req.send().await?;

        let data = read_response(RequestSummary { method, url }, resp).await?;
        Ok(serde_json::from_value(data)?)
    }

    /// Reject calls that need an explicit project when not using a project token.
    pub(crate) fn require_project(&self, project: Option<&str>, what: &str) -> Result<()> {
        if project.is_none() && self.auth_type() != AuthKind::ProjectToken {
            return Err(HopError::InvalidInput(format!(
                "project must be provided to {what} with bearer or PAT authorization"
            )));
        }
        Ok(())
    }

    fn headers(&self, has_body: bool, options: &RequestOptions) -> HeaderMap {
        let mut headers = options.headers.clone();
        headers.insert(header::AUTHORIZATION, self.auth_header.clone());
        if has_body {
            headers.insert(header::CONTENT_TYPE, HeaderValue::from_static("application/json"));
        }
        if let Some(ua) = &self.user_agent {
            headers.entry(header::USER_AGENT).or_insert_with(|| ua.clone());
        }
        headers
    }
}

impl fmt::Debug for HopClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HopClient")
            .field("base_url", &self.cfg.base_url)
            .field("auth_type", &self.authorization.kind())
            .finish_non_exhaustive()
    }
}

/// Classify a parsed envelope into its `data` payload or an error envelope.
///
/// Failure is an explicit falsy `success`, or a `statusCode` field without any `success`
/// field (legacy shape). Anything else yields `data`, or `null` when absent.
///
/// # Errors
///
/// Returns the normalized error envelope when the response reports a failure.
pub fn classify_envelope(envelope: Value) -> std::result::Result<Value, ApiErrorBody> {
    let Value::Object(mut obj) = envelope else {
        return Ok(Value::Null);
    };

    let failed = obj.get("success").map_or_else(
        || obj.contains_key("statusCode"),
        |success| !is_truthy(success),
    );

    if failed {
        return Err(error_body(&obj));
    }

    Ok(obj.remove("data").unwrap_or(Value::Null))
}

async fn read_response(request: RequestSummary, resp: reqwest::Response) -> Result<Value> {
    let status = resp.status();
    let headers = resp.headers().clone();

    if status == StatusCode::NO_CONTENT || !is_json(&headers) {
        return Ok(Value::Null);
    }

    let bytes = resp.bytes().await?;
    let classified = serde_json::from_slice::<Value>(&bytes)
        .map_err(|e| ApiErrorBody::local(e.to_string()))
        .and_then(classify_envelope);

    classified.map_err(|body| {
        debug!(
            method = %request.method,
            url = %request.url,
            %status,
            code = %body.code,
            "hop api error"
        );
        HopError::from(ApiError {
            request,
            status,
            headers,
            body,
        })
    })
}

fn is_json(headers: &HeaderMap) -> bool {
    headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|ct| ct.contains("application/json"))
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

fn error_body(obj: &Map<String, Value>) -> ApiErrorBody {
    let str_field = |map: &Map<String, Value>, key: &str| {
        map.get(key).and_then(Value::as_str).map(str::to_string)
    };

    match obj.get("error") {
        Some(Value::Object(err)) => ApiErrorBody {
            code: str_field(err, "code").unwrap_or_else(|| "unknown_error".to_string()),
            message: str_field(err, "message").unwrap_or_default(),
        },
        Some(Value::String(name)) => ApiErrorBody {
            code: name.clone(),
            message: str_field(obj, "message").unwrap_or_else(|| name.clone()),
        },
        _ => ApiErrorBody {
            code: "unknown_error".to_string(),
            message: str_field(obj, "message").unwrap_or_else(|| "unknown error".to_string()),
        },
    }
}

// ============================================================================
// Helper functions
// ============================================================================

fn must_env(key: &'static str) -> Result<String> {
    env::var(key).map_err(|_| HopError::MissingEnv(key))
}

fn parse_opt_u64_env(key: &'static str) -> Result<Option<u64>> {
    env::var(key)
        .ok()
        .filter(|v| !v.trim().is_empty())
        .map(|v| {
            v.trim().parse::<u64>().map_err(|_| HopError::InvalidEnv {
                key,
                reason: "expected an unsigned integer",
            })
        })
        .transpose()
}

fn parse_bool_env(key: &'static str, default: bool) -> bool {
    env::var(key).map_or(default, |v| {
        matches!(v.to_lowercase().as_str(), "true" | "1" | "yes")
    })
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn success_envelope_yields_data() {
        let data = json!({"a": [1, {"b": null}], "c": "d"});
        let out = classify_envelope(json!({"success": true, "data": data.clone()})).unwrap();
        assert_eq!(out, data);
    }

    #[test]
    fn modern_error_envelope_is_failure() {
        let err = classify_envelope(json!({
            "success": false,
            "error": {"code": "not_found", "message": "Channel not found"}
        }))
        .unwrap_err();
        assert_eq!(err.code, "not_found");
        assert_eq!(err.message, "Channel not found");
    }

    #[test]
    fn legacy_error_envelope_is_failure() {
        let err = classify_envelope(json!({
            "statusCode": 404,
            "error": "Not Found",
            "message": "Cannot GET /v1/nope"
        }))
        .unwrap_err();
        assert_eq!(err.code, "Not Found");
        assert_eq!(err.message, "Cannot GET /v1/nope");
    }

    #[test]
    fn status_code_with_success_flag_follows_the_flag() {
        let out = classify_envelope(json!({"success": true, "statusCode": 200, "data": 1}));
        assert_eq!(out.unwrap(), json!(1));
    }

    #[test]
    fn envelope_without_data_yields_null() {
        assert_eq!(classify_envelope(json!({"success": true})).unwrap(), Value::Null);
        assert_eq!(classify_envelope(json!([1, 2])).unwrap(), Value::Null);
    }

    #[test]
    fn falsy_success_values_are_failures() {
        for success in [json!(false), json!(null), json!(0), json!("")] {
            assert!(classify_envelope(json!({"success": success})).is_err());
        }
    }

    #[test]
    fn client_rejects_unknown_credential_prefix() {
        let err = HopClient::new(HopConfig::new("sk_nope")).unwrap_err();
        assert!(matches!(err, HopError::InvalidAuthorization { ref prefix } if prefix == "sk"));
    }

    #[test]
    fn client_exposes_auth_type_and_urls() {
        let client = HopClient::new(
            HopConfig::new("ptk_abc").with_base_url("https://api.example.com"),
        )
        .unwrap();
        assert_eq!(client.auth_type(), AuthKind::ProjectToken);
        assert_eq!(client.base_url(), "https://api.example.com");

        let url = client
            .url("/v1/path/to/:resource", Params::new().with("resource", "r").with("limit", 20))
            .unwrap();
        assert_eq!(url, "https://api.example.com/v1/path/to/r?limit=20");
    }

    #[test]
    fn headers_carry_raw_credential_and_conditional_content_type() {
        let client = HopClient::new(HopConfig::new("bearer_xyz")).unwrap();

        let without_body = client.headers(false, &RequestOptions::default());
        assert_eq!(without_body[header::AUTHORIZATION], "bearer_xyz");
        assert!(!without_body.contains_key(header::CONTENT_TYPE));
        assert_eq!(without_body[header::USER_AGENT], DEFAULT_USER_AGENT);

        let with_body = client.headers(true, &RequestOptions::default());
        assert_eq!(with_body[header::CONTENT_TYPE], "application/json");
    }

    #[test]
    fn override_headers_cannot_replace_authorization() {
        let client = HopClient::new(HopConfig::new("pat_1")).unwrap();
        let options = RequestOptions::default()
            .with_header("authorization", "pat_other")
            .unwrap()
            .with_header("x-trace", "abc")
            .unwrap();
        let headers = client.headers(false, &options);
        assert_eq!(headers[header::AUTHORIZATION], "pat_1");
        assert_eq!(headers["x-trace"], "abc");
    }

    #[test]
    fn suppressed_user_agent_is_not_sent() {
        let client =
            HopClient::new(HopConfig::new("pat_1").with_suppressed_user_agent(true)).unwrap();
        let headers = client.headers(false, &RequestOptions::default());
        assert!(!headers.contains_key(header::USER_AGENT));
    }

    #[test]
    fn require_project_depends_on_auth_kind() {
        let ptk = HopClient::new(HopConfig::new("ptk_1")).unwrap();
        assert!(ptk.require_project(None, "create a channel").is_ok());

        let pat = HopClient::new(HopConfig::new("pat_1")).unwrap();
        assert!(matches!(
            pat.require_project(None, "create a channel"),
            Err(HopError::InvalidInput(_))
        ));
        assert!(pat.require_project(Some("project_1"), "create a channel").is_ok());
    }

    #[test]
    fn sub_millisecond_timeout_is_kept_exactly() {
        let cfg = HopConfig::new("ptk_1").with_timeout(Duration::from_micros(500));
        assert_eq!(cfg.timeout, Some(Duration::from_micros(500)));
        assert_ne!(cfg.timeout, Some(Duration::ZERO));
    }

    #[test]
    fn debug_output_hides_credential() {
        let client = HopClient::new(HopConfig::new("pat_secretvalue")).unwrap();
        assert!(!format!("{client:?}").contains("secretvalue"));
        assert!(!format!("{:?}", client.config()).contains("secretvalue"));
    }
}
