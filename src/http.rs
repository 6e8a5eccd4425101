//! HTTP types used throughout the crate.

use std::fmt;

pub use bytes::Bytes;
pub use http::{header, Extensions, HeaderMap, HeaderValue, Method, StatusCode};

pub type Request = http::Request<Bytes>;
pub type ResponseBuilder = http::response::Builder;
pub type Response = http::Response<Body>;

/// Respresents the body of an HTTP response.
#[non_exhaustive]
#[derive(Clone, PartialEq, Eq)]
pub enum Body {
    Once(Bytes),
    Empty,
}

impl Body {
    /// Create a body directly from bytes.
    pub fn once(bytes: impl Into<Bytes>) -> Self {
        Self::Once(bytes.into())
    }

    /// Create an empty `Body`.
    pub fn empty() -> Self {
        Self::Empty
    }

    /// Returns the body contents.
    pub fn as_bytes(&self) -> &[u8] {
        match self {
            Self::Once(bytes) => bytes,
            Self::Empty => &[],
        }
    }

    /// Consume the body, returning its contents.
    pub fn into_bytes(self) -> Bytes {
        match self {
            Self::Once(bytes) => bytes,
            Self::Empty => Bytes::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.as_bytes().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for Body {
    fn default() -> Self {
        Self::empty()
    }
}

impl From<String> for Body {
    fn from(body: String) -> Self {
        Self::once(body)
    }
}

impl From<&'static str> for Body {
    fn from(body: &'static str) -> Self {
        Self::once(body)
    }
}

impl fmt::Debug for Body {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Once(bytes) => f.debug_tuple("Body").field(bytes).finish(),
            Self::Empty => f.debug_struct("Body").finish(),
        }
    }
}
