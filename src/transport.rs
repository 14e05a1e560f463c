//! Outbound request plumbing.
//!
//! [`Transport`] is the seam between tool handlers and the network: handlers
//! build an [`ApiRequest`], the transport turns it into an HTTP call against the
//! Labellerr API and hands back the decoded JSON body. Every non-2xx status and
//! every network failure becomes a single [`McpError::Api`]. There is no retry.

use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use reqwest::Method;
use serde_json::Value as JsonValue;
use tracing::debug;

use crate::config::Credentials;
use crate::error::{McpError, Result};

/// Request payload.
#[derive(Debug, Clone, PartialEq)]
pub enum RequestBody {
    /// Serialized as JSON with `Content-Type: application/json`.
    Json(JsonValue),
    /// Passed through untouched with its own content type (multipart uploads).
    Raw {
        /// Content type, including any multipart boundary
        content_type: String,
        /// Encoded payload
        bytes: Vec<u8>,
    },
}

/// A single call against the Labellerr API, relative to the base URL.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiRequest {
    /// HTTP method
    pub method: Method,
    /// Path relative to the base URL, with a leading slash
    pub path: String,
    /// Path segments appended after `path`, percent-encoded on send
    pub segments: Vec<String>,
    /// Query parameters, URL-encoded on send
    pub query: Vec<(String, String)>,
    /// Extra headers on top of the credential headers
    pub headers: Vec<(String, String)>,
    /// Optional payload
    pub body: Option<RequestBody>,
}

impl ApiRequest {
    /// Create a request with no query, headers or body.
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            segments: Vec::new(),
            query: Vec::new(),
            headers: Vec::new(),
            body: None,
        }
    }

    /// Shorthand for a GET request.
    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    /// Shorthand for a POST request.
    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::POST, path)
    }

    /// Append one path segment. Reserved characters are escaped, so the value
    /// cannot leave its segment.
    pub fn segment(mut self, value: impl Into<String>) -> Self {
        self.segments.push(value.into());
        self
    }

    /// Unescaped path including segments, for logs and matching.
    pub fn full_path(&self) -> String {
        let mut path = self.path.clone();
        for segment in &self.segments {
            path.push('/');
            path.push_str(segment);
        }
        path
    }

    /// Append a query parameter.
    pub fn query(mut self, key: &str, value: impl Into<String>) -> Self {
        self.query.push((key.to_string(), value.into()));
        self
    }

    /// Add a header; overrides a credential header of the same name.
    pub fn header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.headers.push((name.to_string(), value.into()));
        self
    }

    /// Attach a JSON body.
    pub fn json(mut self, body: JsonValue) -> Self {
        self.body = Some(RequestBody::Json(body));
        self
    }

    /// Attach a pre-encoded body.
    pub fn raw(mut self, content_type: impl Into<String>, bytes: Vec<u8>) -> Self {
        self.body = Some(RequestBody::Raw {
            content_type: content_type.into(),
            bytes,
        });
        self
    }

    /// Look up a query parameter by name.
    pub fn query_param(&self, key: &str) -> Option<&str> {
        self.query
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }
}

/// Sends API requests and decodes their JSON responses.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Execute the request, failing with [`McpError::Api`] on any non-success outcome.
    async fn send(&self, request: ApiRequest) -> Result<JsonValue>;
}

/// reqwest-backed transport that injects the credential headers.
pub struct HttpTransport {
    http: reqwest::Client,
    base_url: String,
    credentials: Credentials,
}

impl HttpTransport {
    /// Create a transport for the given endpoint.
    pub fn new(base_url: impl Into<String>, credentials: Credentials) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into(),
            credentials,
        }
    }

    /// Build the outgoing HTTP request without sending it.
    pub fn build(&self, request: ApiRequest) -> Result<reqwest::Request> {
        let mut url = reqwest::Url::parse(&format!(
            "{}{}",
            self.base_url.trim_end_matches('/'),
            request.path
        ))
        .map_err(|e| McpError::api(None, format!("Invalid API URL/path: {e}")))?;
        if !request.segments.is_empty() {
            url.path_segments_mut()
                .map_err(|_| McpError::api(None, "API URL cannot carry a path"))?
                .pop_if_empty()
                .extend(&request.segments);
        }
        if !request.query.is_empty() {
            let mut qp = url.query_pairs_mut();
            for (k, v) in &request.query {
                qp.append_pair(k, v);
            }
        }

        let mut headers = self.credentials.headers();
        for (name, value) in request.headers {
            headers.retain(|(n, _)| !n.eq_ignore_ascii_case(&name));
            headers.push((name, value));
        }

        let mut builder = self.http.request(request.method, url);
        for (name, value) in headers {
            builder = builder.header(name, value);
        }
        builder = match request.body {
            Some(RequestBody::Json(body)) => builder
                .header(CONTENT_TYPE, "application/json")
                .body(serde_json::to_vec(&body)?),
            Some(RequestBody::Raw {
                content_type,
                bytes,
            }) => builder.header(CONTENT_TYPE, content_type).body(bytes),
            None => builder,
        };

        Ok(builder.build()?)
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(&self, request: ApiRequest) -> Result<JsonValue> {
        let request = self.build(request)?;
        debug!(method = %request.method(), path = %request.url().path(), "labellerr request");

        let response = self.http.execute(request).await?;
        let status = response.status().as_u16();
        let bytes = response.bytes().await?;

        decode_response(status, &bytes)
    }
}

/// Decode a response body, turning non-2xx statuses into [`McpError::Api`].
pub fn decode_response(status: u16, bytes: &[u8]) -> Result<JsonValue> {
    let success = (200..300).contains(&status);
    let parsed = if bytes.iter().all(|b| b.is_ascii_whitespace()) {
        Ok(JsonValue::Null)
    } else {
        serde_json::from_slice::<JsonValue>(bytes)
    };

    if success {
        return parsed.map_err(|e| McpError::api(Some(status), format!("invalid JSON response: {e}")));
    }

    let message = parsed
        .ok()
        .and_then(|body| {
            body.get("message")
                .and_then(|m| m.as_str())
                .filter(|m| !m.is_empty())
                .map(str::to_string)
        })
        .unwrap_or_else(|| format!("Request failed with status {status}"));
    Err(McpError::api(Some(status), message))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn transport() -> HttpTransport {
        let creds = Credentials::from_parts(
            Some("key".into()),
            Some("secret".into()),
            Some("client-1".into()),
        )
        .unwrap();
        HttpTransport::new("https://api.example.test/", creds)
    }

    #[test]
    fn test_build_injects_credentials_and_json_body() {
        let req = ApiRequest::post("/datasets/create")
            .query("client_id", "client-1")
            .query("name", "a b&c")
            .json(json!({"dataset_name": "cats"}));
        let built = transport().build(req).unwrap();

        assert_eq!(built.method(), Method::POST);
        assert_eq!(built.url().path(), "/datasets/create");
        assert_eq!(built.url().query(), Some("client_id=client-1&name=a+b%26c"));
        let headers = built.headers();
        assert_eq!(headers["api_key"], "key");
        assert_eq!(headers["api_secret"], "secret");
        assert_eq!(headers["source"], "mcp-sdk");
        assert_eq!(headers[CONTENT_TYPE], "application/json");

        let body = built.body().and_then(|b| b.as_bytes()).unwrap();
        let decoded: JsonValue = serde_json::from_slice(body).unwrap();
        assert_eq!(decoded, json!({"dataset_name": "cats"}));
    }

    #[test]
    fn test_build_passes_raw_body_through() {
        let req = ApiRequest::post("/upload").raw("multipart/form-data; boundary=xyz", b"--xyz--".to_vec());
        let built = transport().build(req).unwrap();

        assert_eq!(built.headers()[CONTENT_TYPE], "multipart/form-data; boundary=xyz");
        assert_eq!(built.body().and_then(|b| b.as_bytes()), Some(&b"--xyz--"[..]));
    }

    #[test]
    fn test_extra_header_overrides_credential_header() {
        let req = ApiRequest::get("/x").header("client_id", "override");
        let built = transport().build(req).unwrap();
        let values: Vec<_> = built.headers().get_all("client_id").iter().collect();
        assert_eq!(values.len(), 1);
        assert_eq!(values[0], "override");
    }

    #[test]
    fn test_segments_are_escaped() {
        let build = |id: &str| {
            transport()
                .build(ApiRequest::get("/projects").segment(id).query("client_id", "c"))
                .unwrap()
        };

        let built = build("p1#frag");
        assert_eq!(built.url().path(), "/projects/p1%23frag");
        assert_eq!(built.url().query(), Some("client_id=c"));
        assert_eq!(built.url().fragment(), None);

        let built = build("p1?client_id=evil");
        assert_eq!(built.url().path(), "/projects/p1%3Fclient_id=evil");
        assert_eq!(built.url().query(), Some("client_id=c"));

        let built = build("../datasets/list");
        let segments: Vec<_> = built.url().path_segments().unwrap().collect();
        assert_eq!(segments.len(), 2);
        assert_eq!(segments[0], "projects");
        assert!(!segments[1].contains('/'));
        assert_eq!(built.url().query(), Some("client_id=c"));
    }

    #[test]
    fn test_full_path_joins_segments() {
        let req = ApiRequest::get("/datasets").segment("d 1");
        assert_eq!(req.full_path(), "/datasets/d 1");
        assert_eq!(ApiRequest::get("/x").full_path(), "/x");
    }

    #[test]
    fn test_decode_success_and_empty_body() {
        assert_eq!(decode_response(200, br#"{"ok":true}"#).unwrap(), json!({"ok": true}));
        assert_eq!(decode_response(204, b"").unwrap(), JsonValue::Null);
        assert!(decode_response(200, b"<html>").is_err());
    }

    #[test]
    fn test_decode_failure_prefers_remote_message() {
        let err = decode_response(400, br#"{"message":"bad project"}"#).unwrap_err();
        assert_eq!(err, McpError::api(Some(400), "bad project"));

        let err = decode_response(502, b"gateway down").unwrap_err();
        assert_eq!(err.to_string(), "API request failed: Request failed with status 502");
    }
}
