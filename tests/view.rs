use std::sync::{Arc, Mutex};

use yak::http::{header, StatusCode};
use yak::view::{client_message, MAX_MESSAGE_LEN};
use yak::{Context, Controller, CookieOptions, Method, Rejection, View};

struct Greeting {
    controller: Controller,
}

impl Greeting {
    fn new(controller: Controller) -> Self {
        Self { controller }
    }
}

impl View for Greeting {
    fn controller(&self) -> &Controller {
        &self.controller
    }

    fn document(&self, cx: &Context) -> String {
        let name = cx.extensions().get::<String>().map_or("World", String::as_str);
        format!("Hello, {}!", name)
    }
}

#[test]
fn prints_document() {
    let mut controller = Controller::new();
    controller.on_get(|cx| {
        cx.extensions_mut().insert("ox".to_owned());
        cx.cookies_mut().set("visited", "1", CookieOptions::new());
        Ok(())
    });

    let response = Greeting::new(controller)
        .print_document(Context::new(Method::GET))
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[header::CONTENT_TYPE], "text/plain; charset=utf-8");
    assert!(response.headers()[header::SET_COOKIE]
        .to_str()
        .unwrap()
        .starts_with("visited=1;"));
    assert_eq!(response.body().as_bytes(), b"Hello, ox!");
}

#[test]
fn content_type() {
    struct Page(Controller);

    impl View for Page {
        fn controller(&self) -> &Controller {
            &self.0
        }

        fn document(&self, _: &Context) -> String {
            "<p>hi</p>".to_owned()
        }

        fn content_type(&self) -> Option<mime::Mime> {
            Some(mime::TEXT_HTML_UTF_8)
        }
    }

    struct Bare(Controller);

    impl View for Bare {
        fn controller(&self) -> &Controller {
            &self.0
        }

        fn document(&self, _: &Context) -> String {
            String::new()
        }

        fn content_type(&self) -> Option<mime::Mime> {
            None
        }
    }

    let response = Page(Controller::new())
        .print_document(Context::new(Method::GET))
        .unwrap();
    assert_eq!(response.headers()[header::CONTENT_TYPE], "text/html; charset=utf-8");

    let response = Bare(Controller::new())
        .print_document(Context::new(Method::GET))
        .unwrap();
    assert!(response.headers().get(header::CONTENT_TYPE).is_none());
    assert!(response.body().is_empty());
}

#[test]
fn failure_becomes_client_error() {
    let closed = Arc::new(Flag::default());

    let mut controller = Controller::new();
    controller.on_get(|_| Err("invalid\n   input:\tname".into()));

    let flag = closed.clone();
    controller.on_close(move |_| {
        flag.set();
        Ok(())
    });

    let err = Greeting::new(controller)
        .print_document(Context::new(Method::GET))
        .unwrap_err();

    assert!(!closed.get());
    assert_eq!(err.rejection().to_string(), "invalid\n   input:\tname");

    let response = err.response();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(response.body().as_bytes(), b"invalid input: name");
}

#[test]
fn failure_keeps_client_error_status() {
    let mut controller = Controller::new();
    controller.on_post(|_| Err(StatusCode::FORBIDDEN.into()));
    controller.on_put(|_| Err(StatusCode::INTERNAL_SERVER_ERROR.into()));

    let view = Greeting::new(controller);

    let err = view.print_document(Context::new(Method::POST)).unwrap_err();
    assert_eq!(err.response().status(), StatusCode::FORBIDDEN);

    let (response, rejection) = view
        .print_document(Context::new(Method::PUT))
        .unwrap_err()
        .into_parts();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(rejection.status(), StatusCode::INTERNAL_SERVER_ERROR);
}

#[test]
fn failure_message_is_truncated() {
    let message = format!("{} {}", "a".repeat(100), "é".repeat(100));

    let mut controller = Controller::new();
    controller.on_open(move |_| Err(Rejection::new(message.clone())));

    let err = Greeting::new(controller)
        .print_document(Context::new(Method::GET))
        .unwrap_err();

    let body = std::str::from_utf8(err.response().body().as_bytes()).unwrap();
    assert_eq!(body.chars().count(), MAX_MESSAGE_LEN);
    assert!(body.ends_with('é'));
    assert_eq!(err.rejection().to_string().chars().count(), 201);
}

#[test]
fn failure_from_std_error() {
    let mut controller = Controller::new();
    controller.on_get(|cx| {
        let page = cx
            .params()
            .get("page", yak::GetOptions::with_default("one"))
            .unwrap_or_default()
            .parse::<u32>()
            .map_err(Rejection::from_error)?;
        cx.extensions_mut().insert(page);
        Ok(())
    });

    let err = Greeting::new(controller)
        .print_document(Context::new(Method::GET))
        .unwrap_err();

    assert_eq!(err.response().status(), StatusCode::BAD_REQUEST);
    assert_eq!(err.response().body().as_bytes(), b"invalid digit found in string");
}

#[test]
fn client_messages() {
    assert_eq!(client_message(""), "");
    assert_eq!(client_message("  lead and trail  "), " lead and trail ");
    assert_eq!(client_message("a\r\n\r\nb"), "a b");
    assert_eq!(client_message("non\u{a0}\u{a0}breaking"), "non\u{a0}\u{a0}breaking");

    let long = "word ".repeat(40);
    assert_eq!(client_message(&long).len(), MAX_MESSAGE_LEN);
}

#[derive(Default)]
struct Flag(Mutex<bool>);

impl Flag {
    fn set(&self) {
        *self.0.lock().unwrap() = true;
    }

    fn get(&self) -> bool {
        *self.0.lock().unwrap()
    }
}
