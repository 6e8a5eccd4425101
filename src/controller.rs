//! Request processing by phase.

use crate::context::Context;
use crate::http::Method;
use crate::reject::Rejection;

use std::fmt;
use std::str::FromStr;

/// A stage of request processing that listeners can be registered for.
///
/// Every request goes through [`Phase::Open`], then the phase of its
/// method, then [`Phase::Close`]. The synthetic phases never match an
/// inbound method, even one spelled `OPEN` or `CLOSE`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Phase {
    /// Runs before any method listeners.
    Open,
    /// Runs for requests with exactly this method.
    Method(Method),
    /// Runs after the method listeners.
    Close,
}

impl From<Method> for Phase {
    fn from(method: Method) -> Self {
        Phase::Method(method)
    }
}

impl FromStr for Phase {
    type Err = InvalidPhase;

    /// Parses `OPEN`, `CLOSE`, or an HTTP method token.
    ///
    /// Method tokens are case-sensitive: `get` is not `GET`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "OPEN" => Ok(Phase::Open),
            "CLOSE" => Ok(Phase::Close),
            _ => Method::from_bytes(s.as_bytes())
                .map(Phase::Method)
                .map_err(|_| InvalidPhase(s.to_owned())),
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Phase::Open => f.write_str("OPEN"),
            Phase::Method(method) => f.write_str(method.as_str()),
            Phase::Close => f.write_str("CLOSE"),
        }
    }
}

/// The error returned when parsing a [`Phase`] fails.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvalidPhase(String);

impl fmt::Display for InvalidPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid request phase: {:?}", self.0)
    }
}

impl std::error::Error for InvalidPhase {}

/// The value a request listener returns.
///
/// Listeners either return nothing, or a `Result` whose error is a
/// [`Rejection`]. Other errors convert into a rejection with `?`.
pub trait Outcome {
    fn into_result(self) -> Result<(), Rejection>;
}

impl Outcome for () {
    fn into_result(self) -> Result<(), Rejection> {
        Ok(())
    }
}

impl Outcome for Result<(), Rejection> {
    fn into_result(self) -> Result<(), Rejection> {
        self
    }
}

type Listener = Box<dyn Fn(&mut Context) -> Result<(), Rejection> + Send + Sync>;

/// Processes HTTP requests and performs actions according
/// to the request method.
///
/// ```
/// use std::sync::{Arc, Mutex};
/// use yak::{Context, Controller, Method};
///
/// let log = Arc::new(Mutex::new(Vec::new()));
/// let mut c = Controller::new();
///
/// // adds some request listeners
/// let l = log.clone();
/// c.on_get(move |_| {
///     l.lock().unwrap().push("processing GET request");
///     Ok(())
/// });
/// let l = log.clone();
/// c.on_open(move |_| {
///     l.lock().unwrap().push("opening request");
///     Ok(())
/// });
/// let l = log.clone();
/// c.on_close(move |_| {
///     l.lock().unwrap().push("closing request");
///     Ok(())
/// });
///
/// // processes the HTTP request
/// c.process_request(&mut Context::new(Method::GET)).unwrap();
///
/// assert_eq!(
///     *log.lock().unwrap(),
///     ["opening request", "processing GET request", "closing request"]
/// );
/// ```
#[derive(Default)]
pub struct Controller {
    listeners: Vec<(Phase, Vec<Listener>)>,
}

impl Controller {
    /// Create a controller with no listeners.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a request listener.
    ///
    /// Listeners of the same phase run in the order they were added.
    ///
    /// ```
    /// use yak::{Controller, Method};
    ///
    /// let mut c = Controller::new();
    /// c.on(Method::PUT, |_| {
    ///     // processing PUT request
    /// });
    /// ```
    pub fn on<P, F, R>(&mut self, phase: P, listener: F) -> &mut Self
    where
        P: Into<Phase>,
        F: Fn(&mut Context) -> R + Send + Sync + 'static,
        R: Outcome,
    {
        let phase = phase.into();
        let listener: Listener = Box::new(move |cx: &mut Context| listener(cx).into_result());

        match self.listeners.iter_mut().find(|(p, _)| *p == phase) {
            Some((_, listeners)) => listeners.push(listener),
            None => self.listeners.push((phase, vec![listener])),
        }

        self
    }

    /// Adds an `OPEN` listener.
    ///
    /// `OPEN` listeners are called first, before any other listeners.
    pub fn on_open<F, R>(&mut self, listener: F) -> &mut Self
    where
        F: Fn(&mut Context) -> R + Send + Sync + 'static,
        R: Outcome,
    {
        self.on(Phase::Open, listener)
    }

    /// Adds a `CLOSE` listener.
    ///
    /// `CLOSE` listeners are called last, after the method listeners.
    pub fn on_close<F, R>(&mut self, listener: F) -> &mut Self
    where
        F: Fn(&mut Context) -> R + Send + Sync + 'static,
        R: Outcome,
    {
        self.on(Phase::Close, listener)
    }

    /// Returns the number of listeners registered for `phase`.
    pub fn listeners(&self, phase: &Phase) -> usize {
        self.listeners
            .iter()
            .find(|(p, _)| p == phase)
            .map_or(0, |(_, listeners)| listeners.len())
    }

    /// Processes the request.
    ///
    /// Calls the `OPEN` listeners, the listeners for the request method, and
    /// the `CLOSE` listeners, in that order. Phases without listeners are
    /// skipped. The first listener to fail stops processing, and its error is
    /// returned.
    pub fn process_request(&self, cx: &mut Context) -> Result<(), Rejection> {
        let phases = [Phase::Open, Phase::Method(cx.method().clone()), Phase::Close];

        for phase in &phases {
            let listeners = match self.listeners.iter().find(|(p, _)| p == phase) {
                Some((_, listeners)) => listeners,
                None => continue,
            };

            tracing::debug!(%phase, listeners = listeners.len(), "dispatching request phase");

            for listener in listeners {
                if let Err(err) = listener(&mut *cx) {
                    tracing::warn!(%phase, error = %err, "request listener failed");
                    return Err(err);
                }
            }
        }

        Ok(())
    }
}

macro_rules! on_method {
    ($name:ident => Method::$method:ident) => {
        #[doc = concat!("Adds a `", stringify!($method), "` listener.")]
        pub fn $name<F, R>(&mut self, listener: F) -> &mut Self
        where
            F: Fn(&mut Context) -> R + Send + Sync + 'static,
            R: Outcome,
        {
            self.on(Method::$method, listener)
        }
    };
}

impl Controller {
    on_method!(on_get => Method::GET);
    on_method!(on_post => Method::POST);
    on_method!(on_put => Method::PUT);
    on_method!(on_delete => Method::DELETE);
    on_method!(on_patch => Method::PATCH);
}

impl fmt::Debug for Controller {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map()
            .entries(
                self.listeners
                    .iter()
                    .map(|(phase, listeners)| (phase, listeners.len())),
            )
            .finish()
    }
}
