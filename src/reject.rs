use crate::http::StatusCode;

use std::any::Any;
use std::convert::Infallible;
use std::fmt::{self, Debug, Display};

/// An error capable of rejecting a request.
///
/// Listeners signal failure by returning a type implementing this trait,
/// and views translate it into a client error response.
pub trait Reject: Debug + Display + Send + Sync + 'static {
    /// The status code of the client error response.
    ///
    /// Defaults to `400 Bad Request`.
    fn status(&self) -> StatusCode {
        StatusCode::BAD_REQUEST
    }
}

impl Reject for StatusCode {
    fn status(&self) -> StatusCode {
        *self
    }
}

impl Reject for String {}

impl Reject for &'static str {}

impl Reject for Infallible {
    fn status(&self) -> StatusCode {
        match *self {}
    }
}

/// A dynamically typed rejection.
pub struct Rejection {
    inner: Box<dyn BoxedReject>,
}

impl Rejection {
    /// Create a new `Rejection`.
    pub fn new<E>(err: E) -> Self
    where
        E: IntoRejection,
    {
        err.into_rejection()
    }

    /// Create a `Rejection` from an arbitrary error type.
    ///
    /// The rejection responds with `400 Bad Request`.
    pub fn from_error<E>(err: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        struct Impl<E>(E);

        impl<E: Debug> fmt::Debug for Impl<E> {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                fmt::Debug::fmt(&self.0, f)
            }
        }

        impl<E: Display> fmt::Display for Impl<E> {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                fmt::Display::fmt(&self.0, f)
            }
        }

        impl<E> Reject for Impl<E> where E: std::error::Error + Send + Sync + 'static {}

        Impl(err).into()
    }

    /// The status code this rejection responds with.
    pub fn status(&self) -> StatusCode {
        self.inner.status()
    }

    /// Returns a reference to the inner error if it is of type `T`.
    pub fn downcast_ref<T>(&self) -> Option<&T>
    where
        T: Reject,
    {
        self.inner.as_any().downcast_ref()
    }
}

trait BoxedReject: Reject {
    fn as_any(&self) -> &dyn Any;
}

impl<T: Reject> BoxedReject for T {
    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl fmt::Debug for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&self.inner, f)
    }
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.inner, f)
    }
}

impl std::error::Error for Rejection {}

impl<E> From<E> for Rejection
where
    E: Reject,
{
    fn from(err: E) -> Self {
        Self {
            inner: Box::new(err),
        }
    }
}

/// A type that can be converted into a [`Rejection`].
///
/// This trait allows [`Rejection`] itself to be returned from listeners
/// while not implementing [`Reject`] directly. You shouldn't have to
/// worry about this trait, but it may show up in error messages when
/// [`Reject`] is not implemented.
pub trait IntoRejection {
    fn into_rejection(self) -> Rejection;
}

impl<E> IntoRejection for E
where
    E: Reject,
{
    fn into_rejection(self) -> Rejection {
        self.into()
    }
}

impl IntoRejection for Rejection {
    fn into_rejection(self) -> Rejection {
        self
    }
}
