//! Serve a [`yak::View`] with hyper.

use std::convert::Infallible;
use std::future::{ready, Future, Ready};
use std::io;
use std::net::*;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use hyper::server::conn::AddrIncoming;
use hyper::service::Service;
use yak::http::{Body, Bytes, Response, StatusCode};
use yak::{FormConfig, Sessions, View};

pub use hyper::Server;

/// A view together with the per-server state shared by its requests.
///
/// ```no_run
/// use yak::{Context, Controller, View};
/// use yak_hyper::{Host, Serve};
///
/// struct Hello(Controller);
///
/// impl View for Hello {
///     fn controller(&self) -> &Controller {
///         &self.0
///     }
///
///     fn document(&self, _: &Context) -> String {
///         "Hello, World!".to_owned()
///     }
/// }
///
/// # async fn run() {
/// Host::new(Hello(Controller::new()))
///     .serve("127.0.0.1:3000")
///     .await
///     .unwrap();
/// # }
/// ```
pub struct Host<V> {
    view: V,
    sessions: Sessions,
    form: FormConfig,
}

impl<V> Host<V>
where
    V: View,
{
    /// Create a host for `view`, keeping sessions in memory.
    pub fn new(view: V) -> Self {
        Self {
            view,
            sessions: Sessions::memory(),
            form: FormConfig::new(),
        }
    }

    /// Use the given session store.
    pub fn sessions(mut self, sessions: Sessions) -> Self {
        self.sessions = sessions;
        self
    }

    /// Replace the form configuration.
    pub fn form_config(mut self, config: FormConfig) -> Self {
        self.form = config;
        self
    }

    /// Processes a request whose body has already been read.
    pub fn respond(&self, req: yak::http::Request) -> Response {
        let cx = match yak::Context::from_request(req, &self.sessions, &self.form) {
            Ok(cx) => cx,
            Err(err) => {
                tracing::warn!(error = %err, "failed to read request parameters");
                return yak::view::client_error(&err.into());
            }
        };

        match self.view.print_document(cx) {
            Ok(response) => response,
            Err(err) => {
                tracing::warn!(error = %err.rejection(), "request rejected");
                err.into_response()
            }
        }
    }
}

pub trait Serve<V> {
    fn serve(self, addr: impl ToSocketAddr) -> Server<AddrIncoming, YakMakeService<V>>;
    fn into_make_service(self) -> YakMakeService<V>;
    fn into_service(self) -> YakService<V>;
}

impl<V> Serve<V> for Host<V>
where
    V: View + Send + Sync + 'static,
{
    fn serve(self, addr: impl ToSocketAddr) -> Server<AddrIncoming, YakMakeService<V>> {
        let addr = addr.to_socket_addr().expect("failed to create socket addr");
        hyper::Server::bind(&addr).serve(self.into_make_service())
    }

    fn into_make_service(self) -> YakMakeService<V> {
        YakMakeService {
            service: self.into_service(),
        }
    }

    fn into_service(self) -> YakService<V> {
        YakService {
            host: Arc::new(self),
        }
    }
}

pub struct YakMakeService<V> {
    service: YakService<V>,
}

impl<T, V> Service<T> for YakMakeService<V> {
    type Response = YakService<V>;
    type Error = Infallible;
    type Future = Ready<Result<Self::Response, Infallible>>;

    fn poll_ready(&mut self, _: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, _: T) -> Self::Future {
        ready(Ok(self.service.clone()))
    }
}

pub struct YakService<V> {
    host: Arc<Host<V>>,
}

impl<V> Service<hyper::Request<hyper::Body>> for YakService<V>
where
    V: View + Send + Sync + 'static,
{
    type Response = hyper::Response<hyper::Body>;
    type Error = Infallible;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(&mut self, _: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, req: hyper::Request<hyper::Body>) -> Self::Future {
        let host = self.host.clone();

        Box::pin(async move {
            let (parts, body) = req.into_parts();

            // only form bodies become parameters, other bodies are never read
            if !yak::is_url_encoded(&parts.headers) {
                let req = yak::http::Request::from_parts(parts, Bytes::new());
                return Ok::<_, Infallible>(into_hyper(host.respond(req)));
            }

            let limited = http_body::Limited::new(body, host.form.max_len());

            let resp = match hyper::body::to_bytes(limited).await {
                Ok(bytes) => host.respond(yak::http::Request::from_parts(parts, bytes)),
                Err(err) => {
                    tracing::warn!(error = %err, "failed to read request body");
                    status(StatusCode::PAYLOAD_TOO_LARGE)
                }
            };

            Ok(into_hyper(resp))
        })
    }
}

impl<V> Clone for YakService<V> {
    fn clone(&self) -> Self {
        Self {
            host: self.host.clone(),
        }
    }
}

fn into_hyper(resp: Response) -> hyper::Response<hyper::Body> {
    let (parts, body) = resp.into_parts();
    hyper::Response::from_parts(parts, hyper::Body::from(body.into_bytes()))
}

fn status(status: StatusCode) -> Response {
    let mut resp = Response::new(Body::empty());
    *resp.status_mut() = status;
    resp
}

pub trait ToSocketAddr {
    fn to_socket_addr(self) -> io::Result<SocketAddr>;
}

impl ToSocketAddr for SocketAddr {
    fn to_socket_addr(self) -> io::Result<SocketAddr> {
        Ok(self)
    }
}

macro_rules! to_socket_addr {
    ($($ty:ty),*) => {$(
        impl ToSocketAddr for $ty {
            fn to_socket_addr(self) -> io::Result<SocketAddr> {
                self.to_socket_addrs()?.next().ok_or_else(|| {
                    io::Error::new(io::ErrorKind::InvalidInput, "no socket address resolved")
                })
            }
        }
    )*}
}

to_socket_addr! {
    &str,
    String,
    (&str, u16),
    (IpAddr, u16),
    (String, u16),
    (Ipv4Addr, u16),
    (Ipv6Addr, u16),
    SocketAddrV4,
    SocketAddrV6
}
