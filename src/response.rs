use bytes::Bytes;
use http::{
    HeaderName, HeaderValue, StatusCode,
    header::{self},
};
use http_body_util::Full;
use hyper::body::Body as _;
use serde::Serialize;
use std::fmt;

use crate::error::Error;

pub type HttpBody = Full<Bytes>;
pub type HttpResponse<T = HttpBody> = http::Response<T>;

pub struct Response {
    pub(crate) inner: HttpResponse,
    // Indicates if the status code has been modified by the user
    pub(crate) status_modified: bool,
}

impl Response {
    #[inline]
    pub(crate) fn new() -> Self {
        Response {
            inner: HttpResponse::new(HttpBody::default()),
            status_modified: false,
        }
    }

    /// Sets the HTTP status for the response.
    pub fn status(&mut self, status: StatusCode) -> &mut Self {
        if !self.status_modified {
            self.status_modified = true;
        }
        *self.inner.status_mut() = status;
        self
    }

    #[inline]
    pub fn status_code(&self) -> StatusCode {
        self.inner.status()
    }

    /// Sets the status code and the correct status message in the body if
    /// the response body is **empty**.
    pub fn send_status(&mut self, status: StatusCode) -> &mut Self {
        self.status(status);

        if self.inner.body().size_hint().exact() == Some(0) {
            *self.inner.body_mut() = status.canonical_reason().unwrap_or("").into();
        }

        self
    }

    #[inline]
    pub fn headers(&self) -> &http::header::HeaderMap<HeaderValue> {
        self.inner.headers()
    }

    #[inline]
    pub fn headers_mut(&mut self) -> &mut http::header::HeaderMap<HeaderValue> {
        self.inner.headers_mut()
    }

    /// Sets a response header, replacing any previous value.
    #[inline]
    pub fn set<K, V>(&mut self, key: K, value: V) -> Result<&mut Self, Error>
    where
        K: TryInto<HeaderName>,
        V: TryInto<HeaderValue>,
        Error: From<K::Error> + From<V::Error>,
    {
        let k = key.try_into()?;
        let v = value.try_into()?;
        self.inner.headers_mut().insert(k, v);
        Ok(self)
    }

    #[inline]
    pub fn send(&mut self, body: impl Into<HttpBody>) -> &mut Self {
        *self.inner.body_mut() = body.into();
        self
    }

    #[inline]
    pub fn content_type<V>(&mut self, value: V) -> Result<&mut Self, Error>
    where
        V: TryInto<HeaderValue>,
        Error: From<V::Error> + From<std::convert::Infallible>,
    {
        self.set(header::CONTENT_TYPE, value)
    }

    /// 200 text/html response.
    #[inline]
    pub fn html(&mut self, body: impl Into<HttpBody>) -> &mut Self {
        self.inner.headers_mut().insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static("text/html; charset=utf-8"),
        );
        self.status(StatusCode::OK).send(body)
    }

    /// Serializes `value` as the JSON response body.
    #[inline]
    pub fn json<T: Serialize>(&mut self, value: &T) -> &mut Self {
        match serde_json::to_vec(value) {
            Ok(body) => {
                self.inner.headers_mut().insert(
                    header::CONTENT_TYPE,
                    HeaderValue::from_static("application/json"),
                );
                self.send(body)
            }
            Err(e) => {
                tracing::warn!("failed to serialize json response: {e}");
                self.send_status(StatusCode::INTERNAL_SERVER_ERROR)
            }
        }
    }

    /// Redirects to `location` with the given 3xx status.
    #[inline]
    pub fn redirect(&mut self, status: StatusCode, location: &str) -> Result<&mut Self, Error> {
        self.set(header::LOCATION, location)?;
        self.send_status(status);
        Ok(self)
    }
}

impl fmt::Debug for Response {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Response")
            .field("status_code", &self.inner.status())
            .field("body", &self.inner.body())
            .finish()
    }
}
