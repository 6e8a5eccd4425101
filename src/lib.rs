//! Phase-based request controllers, request accessors and views.
//!
//! A [`Controller`] runs the listeners registered for a request in three
//! phases: `OPEN`, the request method, and `CLOSE`. Listeners receive the
//! request [`Context`], which gives access to the request parameters, the
//! cookie jar and the session. A [`View`] processes the request through its
//! controller and prints the resulting document, translating failures into
//! a client error response.

mod context;
mod controller;
mod cookie;
mod form;
mod param;
mod reject;
mod session;

pub mod http;
pub mod view;

pub use crate::http::{Method, StatusCode};
pub use context::Context;
pub use controller::{Controller, InvalidPhase, Outcome, Phase};
pub use cookie::{CookieJar, CookieOptions, SetCookie};
pub use form::{is_url_encoded, FormConfig, FormRejection};
pub use param::{FromParam, GetOptions, MissingParam, ParamError, ParamOptions, Params};
pub use reject::{IntoRejection, Reject, Rejection};
pub use session::{MemoryStore, Session, SessionConfig, SessionData, SessionStore, Sessions};
pub use view::{View, ViewError};
