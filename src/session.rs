//! Session variables.
//!
//! A [`Session`] is started lazily the first time it is accessed through
//! [`Context::session`](crate::Context::session). The session id travels in a
//! cookie, and the variables themselves live in a [`SessionStore`] provided by
//! the host.

use crate::cookie::{CookieJar, CookieOptions};
use crate::param::GetOptions;

use chrono::Duration;

use std::borrow::Cow;
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};

/// The variables of a single session.
pub type SessionData = HashMap<String, String>;

/// A backend that persists session variables across requests.
pub trait SessionStore: Send + Sync + 'static {
    /// Load the variables of session `id`, returning `None`
    /// if the session is unknown.
    fn load(&self, id: &str) -> Option<SessionData>;

    /// Replace the variables of session `id`.
    fn save(&self, id: &str, data: SessionData);

    /// Forget session `id`.
    fn remove(&self, id: &str);
}

/// An in-memory [`SessionStore`].
///
/// Sessions live as long as the store, and clones share the same sessions.
#[derive(Clone, Default)]
pub struct MemoryStore {
    sessions: Arc<Mutex<HashMap<String, SessionData>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// The number of sessions in the store.
    pub fn len(&self) -> usize {
        self.sessions
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl SessionStore for MemoryStore {
    fn load(&self, id: &str) -> Option<SessionData> {
        let sessions = self.sessions.lock().unwrap_or_else(PoisonError::into_inner);
        sessions.get(id).cloned()
    }

    fn save(&self, id: &str, data: SessionData) {
        let mut sessions = self.sessions.lock().unwrap_or_else(PoisonError::into_inner);
        sessions.insert(id.to_owned(), data);
    }

    fn remove(&self, id: &str) {
        let mut sessions = self.sessions.lock().unwrap_or_else(PoisonError::into_inner);
        sessions.remove(id);
    }
}

impl fmt::Debug for MemoryStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemoryStore")
            .field("sessions", &self.len())
            .finish()
    }
}

/// Configuration for sessions.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    cookie_name: Cow<'static, str>,
    lifetime: Duration,
}

impl SessionConfig {
    /// Create a [`SessionConfig`] instance.
    pub fn new() -> Self {
        Self {
            cookie_name: Cow::Borrowed("YAKSESSID"),
            lifetime: Duration::days(1),
        }
    }

    /// Set the name of the cookie holding the session id.
    ///
    /// By default the name is `YAKSESSID`.
    pub fn cookie_name(mut self, name: impl Into<Cow<'static, str>>) -> Self {
        self.cookie_name = name.into();
        self
    }

    /// Set how long the session cookie lives in the browser.
    ///
    /// By default the cookie expires after one day.
    pub fn lifetime(mut self, lifetime: Duration) -> Self {
        self.lifetime = lifetime;
        self
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// A handle to the session store shared between requests.
#[derive(Clone)]
pub struct Sessions {
    store: Arc<dyn SessionStore>,
    config: SessionConfig,
}

impl Sessions {
    /// Create a handle over the given store.
    pub fn new(store: impl SessionStore) -> Self {
        Self {
            store: Arc::new(store),
            config: SessionConfig::new(),
        }
    }

    /// Create a handle over a fresh [`MemoryStore`].
    pub fn memory() -> Self {
        Self::new(MemoryStore::new())
    }

    /// Replace the session configuration.
    pub fn config(mut self, config: SessionConfig) -> Self {
        self.config = config;
        self
    }
}

impl fmt::Debug for Sessions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Sessions")
            .field("config", &self.config)
            .finish()
    }
}

/// The session of the current request.
#[derive(Debug)]
pub struct Session {
    sessions: Sessions,
    id: Option<String>,
    data: SessionData,
    started: bool,
    destroyed: bool,
}

impl Session {
    pub(crate) fn new(sessions: Sessions) -> Self {
        Self {
            sessions,
            id: None,
            data: SessionData::new(),
            started: false,
            destroyed: false,
        }
    }

    /// Starts the session, if not already started.
    ///
    /// An id sent by the client is only reused if the store knows it,
    /// otherwise a new session is created and its id written to `cookies`.
    pub(crate) fn start(&mut self, cookies: &mut CookieJar) {
        if self.started {
            return;
        }

        self.started = true;
        let config = &self.sessions.config;

        let known = cookies
            .get(&config.cookie_name, GetOptions::new())
            .filter(|id| is_valid_id(id))
            .and_then(|id| Some((id.to_owned(), self.sessions.store.load(id)?)));

        match known {
            Some((id, data)) => {
                tracing::debug!(%id, "resuming session");
                self.id = Some(id);
                self.data = data;
            }
            None => {
                let id = uuid::Uuid::new_v4().simple().to_string();
                tracing::debug!(%id, "starting new session");

                cookies.set(
                    &*config.cookie_name,
                    id.as_str(),
                    CookieOptions::new()
                        .expire(config.lifetime)
                        .http_only(true),
                );

                self.id = Some(id);
            }
        }
    }

    /// Returns `true` if the session was accessed during this request.
    pub fn is_started(&self) -> bool {
        self.started
    }

    /// The session id, once started.
    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    /// Returns the session variable `name`, or the default value
    /// from `options` if it is not set.
    ///
    /// ```
    /// use yak::{Context, GetOptions, Method};
    ///
    /// let mut cx = Context::new(Method::GET);
    /// let username = cx.session().get("username", GetOptions::with_default("root"));
    /// assert_eq!(username, Some("root"));
    /// ```
    pub fn get<'a>(&'a self, name: &str, options: GetOptions<'a>) -> Option<&'a str> {
        self.data.get(name).map(String::as_str).or(options.default)
    }

    /// Sets the session variable `name`.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        tracing::trace!(%name, "setting session variable");

        self.destroyed = false;
        self.data.insert(name, value.into());
    }

    /// Deletes the session variable `name`, if set.
    pub fn del(&mut self, name: &str) {
        self.data.remove(name);
    }

    /// Returns `true` if no variables are set.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Clears all variables. When the request finishes the session is
    /// removed from the store and its cookie deleted.
    pub fn destroy(&mut self) {
        self.data.clear();
        self.destroyed = true;
    }

    /// Writes the session back to the store.
    pub(crate) fn persist(&mut self, cookies: &mut CookieJar) {
        let id = match (&self.id, self.started) {
            (Some(id), true) => id,
            _ => return,
        };

        if self.destroyed {
            tracing::debug!(%id, "destroying session");
            self.sessions.store.remove(id);
            cookies.del(&self.sessions.config.cookie_name);
        } else {
            self.sessions.store.save(id, self.data.clone());
        }
    }
}

#[cfg(feature = "json")]
impl Session {
    /// Returns the session variable `name` deserialized from JSON.
    pub fn get_json<T>(&self, name: &str) -> Result<Option<T>, serde_json::Error>
    where
        T: serde::de::DeserializeOwned,
    {
        self.data
            .get(name)
            .map(|value| serde_json::from_str(value))
            .transpose()
    }

    /// Sets the session variable `name` to `value` serialized as JSON.
    pub fn set_json<T>(&mut self, name: impl Into<String>, value: &T) -> Result<(), serde_json::Error>
    where
        T: serde::Serialize + ?Sized,
    {
        let value = serde_json::to_string(value)?;
        self.set(name, value);
        Ok(())
    }
}

fn is_valid_id(id: &str) -> bool {
    !id.is_empty() && id.len() <= 128 && id.bytes().all(|b| b.is_ascii_alphanumeric())
}
