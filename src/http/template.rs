use std::path::{Path, PathBuf};
use std::time::Duration;

use bytes::Bytes;
use http::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::{Method, Url};

use crate::error::HttpError;

/// Where a request body comes from. A file takes precedence over inline text.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum BodySource {
    #[default]
    Empty,
    Inline(String),
    File(PathBuf),
}

impl BodySource {
    #[must_use]
    pub fn from_parts(file: Option<&Path>, body: Option<&str>) -> Self {
        match (file, body) {
            (Some(path), _) if !path.as_os_str().is_empty() => Self::File(path.to_path_buf()),
            (_, Some(text)) if !text.is_empty() => Self::Inline(text.to_owned()),
            (_, _) => Self::Empty,
        }
    }

    /// Reads the body once; requests clone the returned buffer.
    ///
    /// # Errors
    ///
    /// Returns an error when the body file cannot be read.
    pub async fn load(&self) -> Result<Option<Bytes>, HttpError> {
        match self {
            Self::Empty => Ok(None),
            Self::Inline(text) => Ok(Some(Bytes::from(text.clone()))),
            Self::File(path) => {
                let contents = tokio::fs::read(path)
                    .await
                    .map_err(|source| HttpError::ReadBodyFile {
                        path: path.clone(),
                        source,
                    })?;
                Ok(Some(Bytes::from(contents)))
            }
        }
    }
}

/// Immutable description of the request every worker issues.
#[derive(Debug, Clone)]
pub struct RequestTemplate {
    method: Method,
    url: Url,
    headers: HeaderMap,
    body: Option<Bytes>,
    timeout: Duration,
}

impl RequestTemplate {
    /// # Errors
    ///
    /// Returns an error when the method is not a valid token or the URL
    /// cannot be parsed.
    pub fn new(method: &str, url: &str, timeout: Duration) -> Result<Self, HttpError> {
        let normalized = method.trim().to_ascii_uppercase();
        let method = Method::from_bytes(normalized.as_bytes())
            .map_err(|_err| HttpError::InvalidMethod {
                method: method.to_owned(),
            })?;
        let url = Url::parse(url).map_err(|source| HttpError::InvalidUrl {
            url: url.to_owned(),
            source,
        })?;
        Ok(Self {
            method,
            url,
            headers: HeaderMap::new(),
            body: None,
            timeout,
        })
    }

    /// Sets `name` to `value`, replacing any earlier value for that name.
    ///
    /// # Errors
    ///
    /// Returns an error when the name or value is not valid in HTTP.
    pub fn with_header(mut self, name: &str, value: &str) -> Result<Self, HttpError> {
        let header_name =
            HeaderName::from_bytes(name.as_bytes()).map_err(|source| {
                HttpError::InvalidHeaderName {
                    header: name.to_owned(),
                    source,
                }
            })?;
        let header_value =
            HeaderValue::from_str(value).map_err(|source| HttpError::InvalidHeaderValue {
                header: name.to_owned(),
                source,
            })?;
        self.headers.insert(header_name, header_value);
        Ok(self)
    }

    #[must_use]
    pub fn with_body(mut self, body: Option<Bytes>) -> Self {
        self.body = body;
        self
    }

    #[must_use]
    pub const fn method(&self) -> &Method {
        &self.method
    }

    #[must_use]
    pub const fn url(&self) -> &Url {
        &self.url
    }

    #[must_use]
    pub const fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    #[must_use]
    pub const fn body(&self) -> Option<&Bytes> {
        self.body.as_ref()
    }

    #[must_use]
    pub const fn timeout(&self) -> Duration {
        self.timeout
    }

    /// `METHOD URL`, as shown in reports.
    #[must_use]
    pub fn target(&self) -> String {
        format!("{} {}", self.method, self.url)
    }
}
