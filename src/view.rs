//! Documents rendered after request processing.

use crate::context::Context;
use crate::controller::Controller;
use crate::http::{header, Body, HeaderValue, Response, StatusCode};
use crate::reject::Rejection;

use mime::Mime;

use std::fmt;

/// The maximum number of characters of a failure message
/// sent back to the client.
pub const MAX_MESSAGE_LEN: usize = 150;

/// The base of any view.
///
/// A view pairs a [`Controller`] with the document it prints once the
/// request has been processed.
///
/// ```
/// use yak::{Context, Controller, Method, View};
///
/// struct Hello {
///     controller: Controller,
/// }
///
/// impl View for Hello {
///     fn controller(&self) -> &Controller {
///         &self.controller
///     }
///
///     fn document(&self, _: &Context) -> String {
///         "Hello, World!".to_owned()
///     }
/// }
///
/// let view = Hello { controller: Controller::new() };
/// let response = view.print_document(Context::new(Method::GET)).unwrap();
/// assert_eq!(response.body().as_bytes(), b"Hello, World!");
/// ```
pub trait View {
    /// The controller processing requests for this view.
    fn controller(&self) -> &Controller;

    /// Gets the document.
    fn document(&self, cx: &Context) -> String;

    /// The content type of the document, or `None` to omit the header.
    ///
    /// Defaults to `text/plain; charset=utf-8`.
    fn content_type(&self) -> Option<Mime> {
        Some(mime::TEXT_PLAIN_UTF_8)
    }

    /// Processes the request and prints the document.
    ///
    /// If processing fails, the client receives a 4xx response carrying a
    /// sanitized version of the failure message (see [`client_error`]),
    /// and the original failure is returned alongside that response.
    fn print_document(&self, mut cx: Context) -> Result<Response, ViewError> {
        if let Err(rejection) = self.controller().process_request(&mut cx) {
            return Err(ViewError {
                response: cx.finish(client_error(&rejection)),
                rejection,
            });
        }

        let mut response = Response::new(Body::once(self.document(&cx)));

        if let Some(content_type) = self.content_type() {
            match HeaderValue::from_str(content_type.as_ref()) {
                Ok(value) => {
                    response.headers_mut().insert(header::CONTENT_TYPE, value);
                }
                Err(_) => tracing::warn!(%content_type, "skipping invalid content type"),
            }
        }

        Ok(cx.finish(response))
    }
}

/// Builds the client error response for a failure.
///
/// The status is the rejection's own if it is a 4xx status, and
/// `400 Bad Request` otherwise. The body is the [`client_message`].
pub fn client_error(rejection: &Rejection) -> Response {
    let status = match rejection.status() {
        status if status.is_client_error() => status,
        _ => StatusCode::BAD_REQUEST,
    };

    let mut response = Response::new(Body::once(client_message(&rejection.to_string())));
    *response.status_mut() = status;
    response.headers_mut().insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("text/plain; charset=utf-8"),
    );
    response
}

/// Builds the failure message sent to the client: runs of ASCII whitespace
/// are collapsed into a single space, and the result is cut to
/// [`MAX_MESSAGE_LEN`] characters.
///
/// ```
/// use yak::view::client_message;
///
/// assert_eq!(client_message("bad\n\n  request\t!"), "bad request !");
/// assert_eq!(client_message(&"x".repeat(200)).len(), 150);
/// ```
pub fn client_message(message: &str) -> String {
    let mut out = String::with_capacity(message.len().min(MAX_MESSAGE_LEN));
    let mut in_whitespace = false;

    for c in message.chars() {
        if c.is_ascii_whitespace() {
            if in_whitespace {
                continue;
            }

            in_whitespace = true;
            out.push(' ');
        } else {
            in_whitespace = false;
            out.push(c);
        }
    }

    match out.char_indices().nth(MAX_MESSAGE_LEN) {
        Some((end, _)) => out[..end].to_owned(),
        None => out,
    }
}

/// The error returned by [`View::print_document`] when processing fails.
///
/// Holds both the client error response and the original failure.
#[derive(Debug)]
pub struct ViewError {
    response: Response,
    rejection: Rejection,
}

impl ViewError {
    /// The client error response.
    pub fn response(&self) -> &Response {
        &self.response
    }

    /// The failure that stopped request processing.
    pub fn rejection(&self) -> &Rejection {
        &self.rejection
    }

    pub fn into_response(self) -> Response {
        self.response
    }

    pub fn into_parts(self) -> (Response, Rejection) {
        (self.response, self.rejection)
    }
}

impl fmt::Display for ViewError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "failed to process request: {}", self.rejection)
    }
}

impl std::error::Error for ViewError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.rejection)
    }
}
