use crate::http::{header, HeaderMap, Request, StatusCode};
use crate::param::Params;
use crate::reject::Reject;

use std::fmt;

/// Collects the query string and URL-encoded form parameters of a request.
///
/// Form values override query values with the same name. Bodies of any
/// other content type are ignored.
pub(crate) fn params(req: &Request, config: &FormConfig) -> Result<Params, FormRejection> {
    let mut params: Params = match req.uri().query() {
        Some(query) => serde_urlencoded::from_str::<Vec<(String, String)>>(query)
            .map_err(|err| FormRejection(FormRejectionKind::Query(err)))?
            .into_iter()
            .collect(),
        None => Params::new(),
    };

    if !is_url_encoded(req.headers()) {
        return Ok(params);
    }

    let body = req.body();
    if body.len() > config.limit {
        return Err(FormRejection(FormRejectionKind::TooLarge(config.limit)));
    }

    let form = serde_urlencoded::from_bytes::<Vec<(String, String)>>(body)
        .map_err(|err| FormRejection(FormRejectionKind::Deser(err)))?;

    params.extend(form);
    Ok(params)
}

/// Returns `true` if the `Content-Type` of `headers` is
/// `application/x-www-form-urlencoded`, the only body type read into
/// request parameters.
pub fn is_url_encoded(headers: &HeaderMap) -> bool {
    headers
        .get(header::CONTENT_TYPE)
        .and_then(|x| x.to_str().ok())
        .and_then(|x| x.parse::<mime::Mime>().ok())
        .map_or(false, |mime| {
            mime.essence_str() == mime::APPLICATION_WWW_FORM_URLENCODED.essence_str()
        })
}

/// Configuration for reading form parameters.
#[derive(Debug, Clone)]
pub struct FormConfig {
    limit: usize,
}

impl FormConfig {
    /// Create a [`FormConfig`] instance.
    pub fn new() -> Self {
        Self {
            limit: 16_384, // (~16kb)
        }
    }

    /// Set maximum number of bytes a form body can contain.
    ///
    /// By default the limit is 16kb.
    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }

    /// The maximum number of bytes a form body can contain.
    pub fn max_len(&self) -> usize {
        self.limit
    }
}

impl Default for FormConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// The error returned when request parameters cannot be read.
#[derive(Debug)]
pub struct FormRejection(FormRejectionKind);

#[derive(Debug)]
enum FormRejectionKind {
    TooLarge(usize),
    Query(serde_urlencoded::de::Error),
    Deser(serde_urlencoded::de::Error),
}

impl fmt::Display for FormRejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.0 {
            FormRejectionKind::TooLarge(limit) => {
                write!(f, "form body exceeds the limit of {} bytes", limit)
            }
            FormRejectionKind::Query(err) => write!(f, "failed to deserialize query string: {}", err),
            FormRejectionKind::Deser(err) => write!(f, "failed to deserialize body: {}", err),
        }
    }
}

impl Reject for FormRejection {
    fn status(&self) -> StatusCode {
        match self.0 {
            FormRejectionKind::TooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            FormRejectionKind::Query(_) | FormRejectionKind::Deser(_) => StatusCode::BAD_REQUEST,
        }
    }
}
