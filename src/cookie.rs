//! Request cookies and outbound `Set-Cookie` instructions.

use crate::http::{header, HeaderMap, HeaderValue};
use crate::param::GetOptions;

use chrono::{DateTime, Duration, Utc};
use once_cell::unsync::OnceCell;

use std::fmt;

/// Options for [`CookieJar::set`].
///
/// ```
/// use chrono::Duration;
/// use yak::CookieOptions;
///
/// // the cookie expires in 24 hours and is available under /my-app
/// let options = CookieOptions::new()
///     .expire(Duration::hours(24))
///     .path("/my-app");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CookieOptions<'a> {
    /// How long from now the cookie expires. Defaults to one year.
    pub expire: Duration,
    /// Defaults to `/`.
    pub path: &'a str,
    /// Defaults to `None`, the host of the current request.
    pub domain: Option<&'a str>,
    /// Defaults to `false`.
    pub secure: bool,
    /// Defaults to `false`.
    pub http_only: bool,
}

impl<'a> CookieOptions<'a> {
    /// Create a [`CookieOptions`] instance with the default values.
    pub fn new() -> Self {
        Self {
            expire: Duration::days(365),
            path: "/",
            domain: None,
            secure: false,
            http_only: false,
        }
    }

    /// Set how long from now the cookie expires.
    pub fn expire(mut self, expire: Duration) -> Self {
        self.expire = expire;
        self
    }

    /// Set the path the cookie is available under.
    pub fn path(mut self, path: &'a str) -> Self {
        self.path = path;
        self
    }

    /// Set the domain the cookie is available to.
    pub fn domain(mut self, domain: &'a str) -> Self {
        self.domain = Some(domain);
        self
    }

    /// Only send the cookie over secure connections.
    pub fn secure(mut self, secure: bool) -> Self {
        self.secure = secure;
        self
    }

    /// Hide the cookie from client-side scripts.
    pub fn http_only(mut self, http_only: bool) -> Self {
        self.http_only = http_only;
        self
    }
}

impl Default for CookieOptions<'_> {
    fn default() -> Self {
        Self::new()
    }
}

/// A cookie instruction written to the response as a `Set-Cookie` header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SetCookie {
    name: String,
    value: String,
    expires: DateTime<Utc>,
    max_age: i64,
    path: String,
    domain: Option<String>,
    secure: bool,
    http_only: bool,
}

impl SetCookie {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    /// The point in time the cookie expires.
    pub fn expires(&self) -> DateTime<Utc> {
        self.expires
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn domain(&self) -> Option<&str> {
        self.domain.as_deref()
    }

    pub fn secure(&self) -> bool {
        self.secure
    }

    pub fn http_only(&self) -> bool {
        self.http_only
    }

    /// Returns `true` if the instruction deletes the cookie.
    pub fn is_removal(&self) -> bool {
        self.max_age == 0
    }
}

impl fmt::Display for SetCookie {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}={}; Expires={}; Max-Age={}; Path={}",
            self.name,
            self.value,
            self.expires.format("%a, %d %b %Y %H:%M:%S GMT"),
            self.max_age,
            self.path
        )?;

        if let Some(domain) = &self.domain {
            write!(f, "; Domain={}", domain)?;
        }

        if self.secure {
            f.write_str("; Secure")?;
        }

        if self.http_only {
            f.write_str("; HttpOnly")?;
        }

        Ok(())
    }
}

/// The cookies sent with a request, and the cookie instructions
/// that will be sent back with the response.
#[derive(Debug, Default)]
pub struct CookieJar {
    raw: Vec<HeaderValue>,
    incoming: OnceCell<Vec<(String, String)>>,
    pending: Vec<SetCookie>,
}

impl CookieJar {
    /// Create an empty cookie jar.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a cookie jar from the `Cookie` headers of a request.
    ///
    /// The headers are parsed on first access.
    pub fn from_headers(headers: &HeaderMap) -> Self {
        Self {
            raw: headers.get_all(header::COOKIE).iter().cloned().collect(),
            ..Self::default()
        }
    }

    /// Returns the value of the cookie `name`, or the default value
    /// from `options` if it was not sent.
    pub fn get<'a>(&'a self, name: &str, options: GetOptions<'a>) -> Option<&'a str> {
        self.incoming()
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, val)| val.as_str())
            .or(options.default)
    }

    /// Sets a cookie.
    ///
    /// ```
    /// use yak::{CookieJar, CookieOptions, GetOptions};
    ///
    /// let mut jar = CookieJar::new();
    ///
    /// // the cookie expires in one year and is available in the root path
    /// jar.set("token", "123", CookieOptions::new());
    ///
    /// assert_eq!(jar.get("token", GetOptions::new()), Some("123"));
    /// assert_eq!(jar.pending()[0].path(), "/");
    /// ```
    pub fn set(
        &mut self,
        name: impl Into<String>,
        value: impl Into<String>,
        options: CookieOptions<'_>,
    ) {
        let (name, value) = (name.into(), value.into());
        tracing::trace!(%name, "setting cookie");

        self.pending.push(SetCookie {
            name: name.clone(),
            value: value.clone(),
            expires: Utc::now() + options.expire,
            max_age: options.expire.num_seconds().max(0),
            path: options.path.to_owned(),
            domain: options.domain.map(str::to_owned),
            secure: options.secure,
            http_only: options.http_only,
        });

        self.update(|cookies| match cookies.iter_mut().find(|(key, _)| *key == name) {
            Some((_, val)) => *val = value,
            None => cookies.push((name, value)),
        });
    }

    /// Deletes a cookie by writing an instruction that expired an hour ago.
    pub fn del(&mut self, name: &str) {
        tracing::trace!(%name, "deleting cookie");

        self.pending.push(SetCookie {
            name: name.to_owned(),
            value: String::new(),
            expires: Utc::now() - Duration::hours(1),
            max_age: 0,
            path: "/".to_owned(),
            domain: None,
            secure: false,
            http_only: false,
        });

        self.update(|cookies| cookies.retain(|(key, _)| key != name));
    }

    /// The cookie instructions written so far, in order.
    pub fn pending(&self) -> &[SetCookie] {
        &self.pending
    }

    /// Appends a `Set-Cookie` header for every pending instruction.
    pub(crate) fn write_headers(&mut self, headers: &mut HeaderMap) {
        for cookie in self.pending.drain(..) {
            match HeaderValue::try_from(cookie.to_string()) {
                Ok(value) => {
                    headers.append(header::SET_COOKIE, value);
                }
                Err(_) => {
                    tracing::warn!(name = %cookie.name, "skipping cookie with invalid header value")
                }
            }
        }
    }

    fn incoming(&self) -> &Vec<(String, String)> {
        self.incoming.get_or_init(|| parse(&self.raw))
    }

    fn update(&mut self, f: impl FnOnce(&mut Vec<(String, String)>)) {
        let mut cookies = self.incoming.take().unwrap_or_else(|| parse(&self.raw));
        f(&mut cookies);
        self.incoming = OnceCell::from(cookies);
    }
}

// `name=value` pairs separated by `;`. The first occurrence of a name wins,
// browsers send the cookie with the most specific path first.
fn parse(raw: &[HeaderValue]) -> Vec<(String, String)> {
    let mut cookies: Vec<(String, String)> = Vec::new();

    let pairs = raw
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.split_once('='));

    for (name, value) in pairs {
        let name = name.trim();
        let value = value.trim();
        let value = value
            .strip_prefix('"')
            .and_then(|v| v.strip_suffix('"'))
            .unwrap_or(value);

        if name.is_empty() || cookies.iter().any(|(key, _)| key == name) {
            continue;
        }

        cookies.push((name.to_owned(), value.to_owned()));
    }

    cookies
}
