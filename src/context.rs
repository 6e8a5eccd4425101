use crate::cookie::CookieJar;
use crate::form::{self, FormConfig, FormRejection};
use crate::http::{Extensions, HeaderMap, Method, Request, Response};
use crate::param::{GetOptions, MissingParam, ParamOptions, Params};
use crate::session::{Session, Sessions};

/// Everything known about the request currently being processed.
///
/// A context is created by the host for every inbound request and threaded
/// through each request listener. It owns the request parameters, the cookie
/// jar and the session, and collects the cookie instructions that end up in
/// the response.
///
/// ```
/// use yak::{Context, GetOptions, Method};
///
/// let mut cx = Context::new(Method::GET);
/// cx.params_mut().set("page", "2");
///
/// assert_eq!(cx.params().get("page", GetOptions::new()), Some("2"));
/// assert_eq!(cx.params().get("size", GetOptions::with_default("10")), Some("10"));
/// ```
#[derive(Debug)]
pub struct Context {
    method: Method,
    headers: HeaderMap,
    params: Params,
    cookies: CookieJar,
    session: Session,
    extensions: Extensions,
}

impl Context {
    /// Create an empty context for a request with the given method.
    ///
    /// Sessions are kept in a store private to this context.
    pub fn new(method: Method) -> Self {
        Self::with_sessions(method, &Sessions::memory())
    }

    /// Create an empty context sharing the given session store.
    pub fn with_sessions(method: Method, sessions: &Sessions) -> Self {
        Self {
            method,
            headers: HeaderMap::new(),
            params: Params::new(),
            cookies: CookieJar::new(),
            session: Session::new(sessions.clone()),
            extensions: Extensions::new(),
        }
    }

    /// Create a context from an inbound request.
    ///
    /// Parameters are read from the query string and, for
    /// `application/x-www-form-urlencoded` requests, from the body.
    pub fn from_request(
        req: Request,
        sessions: &Sessions,
        config: &FormConfig,
    ) -> Result<Self, FormRejection> {
        let params = form::params(&req, config)?;
        let (parts, _) = req.into_parts();

        Ok(Self {
            cookies: CookieJar::from_headers(&parts.headers),
            method: parts.method,
            headers: parts.headers,
            params,
            session: Session::new(sessions.clone()),
            extensions: parts.extensions,
        })
    }

    /// The request method.
    pub fn method(&self) -> &Method {
        &self.method
    }

    /// The request headers.
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// The request parameters.
    pub fn params(&self) -> &Params {
        &self.params
    }

    pub fn params_mut(&mut self) -> &mut Params {
        &mut self.params
    }

    /// The request cookies.
    pub fn cookies(&self) -> &CookieJar {
        &self.cookies
    }

    pub fn cookies_mut(&mut self) -> &mut CookieJar {
        &mut self.cookies
    }

    /// The session of the current request, started on first access.
    pub fn session(&mut self) -> &mut Session {
        self.session.start(&mut self.cookies);
        &mut self.session
    }

    /// Gets a request parameter.
    ///
    /// ```
    /// use yak::{Context, Method, ParamOptions};
    ///
    /// let mut cx = Context::new(Method::GET);
    /// cx.params_mut().set("username", "");
    ///
    /// // gets a parameter with a default value
    /// let page = cx.get_param("page", ParamOptions::with_default("0")).unwrap();
    /// assert_eq!(page, Some("0"));
    ///
    /// // the parameter `username` is required
    /// let err = cx.get_param("username", ParamOptions::required()).unwrap_err();
    /// assert_eq!(err.to_string(), "The parameter `username` is required");
    /// ```
    pub fn get_param<'a>(
        &'a self,
        name: &str,
        options: ParamOptions<'a>,
    ) -> Result<Option<&'a str>, MissingParam> {
        let param = self.params.get(
            name,
            GetOptions {
                default: options.default,
            },
        );

        if options.required && param.map_or(true, str::is_empty) {
            return Err(MissingParam::new(name));
        }

        Ok(param)
    }

    /// Values attached to the request by the host or by request listeners.
    pub fn extensions(&self) -> &Extensions {
        &self.extensions
    }

    pub fn extensions_mut(&mut self) -> &mut Extensions {
        &mut self.extensions
    }

    /// Completes the request, writing pending cookie instructions into
    /// `response` and persisting the session.
    pub fn finish(mut self, mut response: Response) -> Response {
        self.session.persist(&mut self.cookies);
        self.cookies.write_headers(response.headers_mut());
        response
    }
}
