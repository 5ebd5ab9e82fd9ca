use bytes::Bytes;
use http::{HeaderMap, HeaderValue, Method, Uri, Version, header::AsHeaderName};
use http_body_util::BodyExt;
use hyper::body::Incoming as IncomingBody;
use serde::de::DeserializeOwned;

use crate::status_error::StatusError;

pub struct Request {
    pub(crate) parts: http::request::Parts,
    pub(crate) body: IncomingBody,
    pub(crate) cached_body: Option<Bytes>,
    pub(crate) ip: std::net::SocketAddr,
    /// Max body size that the server accepts.
    pub(crate) body_limit: usize,
}

impl Request {
    #[inline]
    pub(crate) fn new(
        request: http::Request<IncomingBody>,
        peer_addr: std::net::SocketAddr,
        body_limit: usize,
    ) -> Self {
        let (parts, body) = request.into_parts();
        Request {
            parts,
            body,
            cached_body: None,
            ip: peer_addr,
            body_limit,
        }
    }

    #[inline]
    pub fn method(&self) -> &Method {
        &self.parts.method
    }

    #[inline]
    pub fn uri(&self) -> &Uri {
        &self.parts.uri
    }

    #[inline]
    pub fn headers(&self) -> &HeaderMap<HeaderValue> {
        &self.parts.headers
    }

    /// Returns the specified header value as a &str.
    #[inline]
    pub fn header<K>(&self, key: K) -> Option<&str>
    where
        K: AsHeaderName,
    {
        self.headers().get(key).and_then(|v| v.to_str().ok())
    }

    #[inline]
    pub fn version(&self) -> Version {
        self.parts.version
    }

    /// Get raw body bytes.
    ///
    /// If body has already been read, returns the cached bytes. (Limits are
    /// not re-applied.)
    #[inline]
    pub async fn bytes(&mut self) -> Result<&Bytes, BodyError> {
        if self.cached_body.is_none() {
            let limited = http_body_util::Limited::new(&mut self.body, self.body_limit);
            let collected = limited.collect().await.map_err(BodyError::Collect)?;
            self.cached_body = Some(collected.to_bytes());
        }
        Ok(self.cached_body.as_ref().expect("body cached above"))
    }

    /// Get body as text.
    #[inline]
    pub async fn text(&mut self) -> Result<&str, BodyError> {
        let bytes = self.bytes().await?;
        Ok(std::str::from_utf8(bytes)?)
    }

    #[inline]
    pub async fn json<T: DeserializeOwned>(&mut self) -> Result<T, BodyError> {
        let bytes = self.bytes().await?;
        Ok(serde_json::from_slice(bytes)?)
    }

    /// Deserialize the query string.
    #[inline]
    pub fn query<T: DeserializeOwned>(&self) -> Result<T, QueryError> {
        let qs = self.parts.uri.query().unwrap_or("");
        Ok(serde_urlencoded::from_str(qs)?)
    }

    #[inline]
    pub fn ip(&self) -> String {
        self.ip.to_string()
    }

    #[inline]
    pub fn is_local(&self) -> bool {
        self.ip.ip().is_loopback()
    }
}

#[derive(Debug, thiserror::Error)]
pub enum BodyError {
    #[error("Failed to collect body")]
    Collect(#[source] Box<dyn std::error::Error + Send + Sync>),

    #[error("Body is not valid UTF-8")]
    InvalidUtf8(#[from] std::str::Utf8Error),

    #[error("Failed to parse JSON")]
    Json(#[from] serde_json::Error),
}

impl From<BodyError> for StatusError {
    fn from(e: BodyError) -> Self {
        match e {
            BodyError::Collect(_) => StatusError::bad_request().brief("Failed to read body"),
            BodyError::InvalidUtf8(_) => {
                StatusError::bad_request().brief("Body is not valid UTF-8")
            }
            BodyError::Json(_) => StatusError::bad_request().brief("Invalid JSON body"),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum QueryError {
    #[error("Failed to parse query string")]
    Parse(#[from] serde_urlencoded::de::Error),
}

impl From<QueryError> for StatusError {
    fn from(_: QueryError) -> Self {
        StatusError::bad_request().brief("Invalid query string")
    }
}
