//! The request parameter store.

use crate::http::StatusCode;
use crate::reject::Reject;

use serde::de::DeserializeOwned;

use std::convert::Infallible;
use std::fmt;
use std::net::IpAddr;
use std::str::FromStr;

/// Options for reading a value out of a parameter, cookie or session store.
///
/// ```
/// use yak::GetOptions;
///
/// let options = GetOptions::with_default("0");
/// assert_eq!(options.default, Some("0"));
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GetOptions<'a> {
    /// Returned when the name is not present. Defaults to `None`.
    pub default: Option<&'a str>,
}

impl<'a> GetOptions<'a> {
    /// Create a [`GetOptions`] instance with no default value.
    pub fn new() -> Self {
        Self { default: None }
    }

    /// Create a [`GetOptions`] instance falling back to `default`.
    pub fn with_default(default: &'a str) -> Self {
        Self {
            default: Some(default),
        }
    }
}

/// The unified request parameters: query string values, overridden by
/// URL-encoded form values of the same name.
///
/// Lookups are exact, case-sensitive matches on the parameter name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Params(Vec<(String, String)>);

impl Params {
    /// Create an empty parameter store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the value of the parameter `name`, or the default value
    /// from `options` if it is not present.
    pub fn get<'a>(&'a self, name: &str, options: GetOptions<'a>) -> Option<&'a str> {
        self.0
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, val)| val.as_str())
            .or(options.default)
    }

    /// Inserts or overwrites the parameter `name`.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let (name, value) = (name.into(), value.into());
        tracing::trace!(%name, "setting request parameter");

        match self.0.iter_mut().find(|(key, _)| *key == name) {
            Some((_, val)) => *val = value,
            None => self.0.push((name, value)),
        }
    }

    /// Removes the parameter `name`, if present.
    pub fn del(&mut self, name: &str) {
        self.0.retain(|(key, _)| key != name);
    }

    /// Returns `true` if the parameter `name` is present.
    pub fn contains(&self, name: &str) -> bool {
        self.0.iter().any(|(key, _)| key == name)
    }

    /// Parses the parameter `name` into `T`.
    ///
    /// ```
    /// use yak::Params;
    ///
    /// let mut params = Params::new();
    /// params.set("page", "3");
    ///
    /// let page: u32 = params.parse("page").unwrap();
    /// assert_eq!(page, 3);
    /// assert!(params.parse::<u32>("limit").is_err());
    /// ```
    pub fn parse<'a, T>(&'a self, name: &str) -> Result<T, ParamError<T::Error>>
    where
        T: FromParam<'a>,
    {
        let raw = self
            .get(name, GetOptions::new())
            .ok_or_else(|| ParamError(ParamErrorKind::NotFound(name.to_owned())))?;

        T::from_param(raw).map_err(|err| {
            ParamError(ParamErrorKind::FromStr(
                name.to_owned(),
                std::any::type_name::<T>(),
                err,
            ))
        })
    }

    /// Deserialize all parameters into `T`.
    ///
    /// ```
    /// use serde::Deserialize;
    /// use yak::Params;
    ///
    /// #[derive(Deserialize)]
    /// struct Search {
    ///     name: String,
    ///     page: u32,
    /// }
    ///
    /// let params: Params = [("name", "ox"), ("page", "2")].into_iter().collect();
    /// let search: Search = params.deserialize().unwrap();
    /// assert_eq!(search.name, "ox");
    /// assert_eq!(search.page, 2);
    /// ```
    pub fn deserialize<T>(&self) -> Result<T, ParamError<Infallible>>
    where
        T: DeserializeOwned,
    {
        let encoded = serde_urlencoded::to_string(&self.0)
            .map_err(|err| ParamError(ParamErrorKind::Ser(err)))?;

        serde_urlencoded::from_str(&encoded).map_err(|err| ParamError(ParamErrorKind::Deser(err)))
    }

    /// Iterate over the parameters in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(key, val)| (key.as_str(), val.as_str()))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<N, V> FromIterator<(N, V)> for Params
where
    N: Into<String>,
    V: Into<String>,
{
    fn from_iter<T>(iter: T) -> Self
    where
        T: IntoIterator<Item = (N, V)>,
    {
        let mut params = Params::new();
        params.extend(iter);
        params
    }
}

impl<N, V> Extend<(N, V)> for Params
where
    N: Into<String>,
    V: Into<String>,
{
    fn extend<T>(&mut self, iter: T)
    where
        T: IntoIterator<Item = (N, V)>,
    {
        for (name, value) in iter {
            self.set(name, value);
        }
    }
}

/// Options for [`Context::get_param`](crate::Context::get_param).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ParamOptions<'a> {
    /// Returned when the parameter is not present. Defaults to `None`.
    pub default: Option<&'a str>,
    /// Fail with [`MissingParam`] if the resolved value is absent or empty.
    /// Defaults to `false`.
    pub required: bool,
}

impl<'a> ParamOptions<'a> {
    /// Options for a parameter that must be present and non-empty.
    pub fn required() -> Self {
        Self {
            default: None,
            required: true,
        }
    }

    /// Options for an optional parameter falling back to `default`.
    pub fn with_default(default: &'a str) -> Self {
        Self {
            default: Some(default),
            required: false,
        }
    }
}

/// A required parameter was absent or empty.
///
/// Rejects the request with `400 Bad Request`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MissingParam {
    name: String,
}

impl MissingParam {
    pub(crate) fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    /// The name of the missing parameter.
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl fmt::Display for MissingParam {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "The parameter `{}` is required", self.name)
    }
}

impl Reject for MissingParam {}

/// The error returned by [`Params::parse`] and [`Params::deserialize`].
///
/// Rejects the request with `400 Bad Request`.
#[derive(Debug)]
pub struct ParamError<E>(ParamErrorKind<E>);

#[derive(Debug)]
enum ParamErrorKind<E> {
    NotFound(String),
    Ser(serde_urlencoded::ser::Error),
    Deser(serde_urlencoded::de::Error),
    FromStr(String, &'static str, E),
}

impl<E> ParamError<E> {
    /// Returns `true` if the parameter was not present.
    pub fn is_not_found(&self) -> bool {
        matches!(self.0, ParamErrorKind::NotFound(_))
    }
}

impl<E> fmt::Display for ParamError<E>
where
    E: fmt::Display,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.0 {
            ParamErrorKind::NotFound(name) => write!(f, "parameter '{}' not found", name),
            ParamErrorKind::Ser(err) => write!(f, "failed to encode parameters: {}", err),
            ParamErrorKind::Deser(err) => write!(f, "failed to deserialize parameters: {}", err),
            ParamErrorKind::FromStr(name, ty, err) => write!(
                f,
                "failed to parse `{}` from parameter '{}': {}",
                ty, name, err
            ),
        }
    }
}

impl<E> Reject for ParamError<E>
where
    E: fmt::Debug + fmt::Display + Send + Sync + 'static,
{
    fn status(&self) -> StatusCode {
        StatusCode::BAD_REQUEST
    }
}

/// A type that can be parsed from a request parameter.
///
/// Types implementing this trait can be used with [`Params::parse`].
pub trait FromParam<'a>: Sized {
    type Error: fmt::Debug + fmt::Display + Send + Sync + 'static;

    /// Parse the type from a raw parameter value.
    fn from_param(param: &'a str) -> Result<Self, Self::Error>;
}

impl<'a> FromParam<'a> for &'a str {
    type Error = Infallible;

    fn from_param(param: &'a str) -> Result<Self, Self::Error> {
        Ok(param)
    }
}

impl<'a> FromParam<'a> for String {
    type Error = Infallible;

    fn from_param(param: &'a str) -> Result<Self, Self::Error> {
        Ok(param.to_owned())
    }
}

macro_rules! from_param {
    ($($ty:ty),*) => ($(
        impl<'a> FromParam<'a> for $ty {
            type Error = <$ty as FromStr>::Err;

            fn from_param(param: &'a str) -> Result<Self, Self::Error> {
                <$ty as FromStr>::from_str(param)
            }
        }
    )*)
}

// ids, counters, flags and client addresses
from_param!(i32, i64, u8, u16, u32, u64, usize, f64, bool, IpAddr);
