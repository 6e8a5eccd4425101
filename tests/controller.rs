use std::sync::{Arc, Mutex};

use yak::{Context, Controller, Method, MissingParam, ParamOptions, Phase, Rejection};

type Log = Arc<Mutex<Vec<&'static str>>>;

fn push(log: &Log, entry: &'static str) -> impl Fn(&mut Context) -> Result<(), Rejection> {
    let log = log.clone();
    move |_| {
        log.lock().unwrap().push(entry);
        Ok(())
    }
}

#[test]
fn phases_run_in_order() {
    let log = Log::default();
    let mut c = Controller::new();

    c.on_get(push(&log, "get"));
    c.on_post(push(&log, "post"));
    c.on_open(push(&log, "open"));
    c.on_close(push(&log, "close"));

    c.process_request(&mut Context::new(Method::GET)).unwrap();
    assert_eq!(*log.lock().unwrap(), ["open", "get", "close"]);

    log.lock().unwrap().clear();
    c.process_request(&mut Context::new(Method::POST)).unwrap();
    assert_eq!(*log.lock().unwrap(), ["open", "post", "close"]);
}

#[test]
fn listeners_run_in_registration_order() {
    let log = Log::default();
    let mut c = Controller::new();

    c.on_get(push(&log, "1"))
        .on_close(push(&log, "close"))
        .on_get(push(&log, "2"))
        .on(Method::GET, push(&log, "3"));

    assert_eq!(c.listeners(&Phase::Method(Method::GET)), 3);

    c.process_request(&mut Context::new(Method::GET)).unwrap();
    assert_eq!(*log.lock().unwrap(), ["1", "2", "3", "close"]);
}

#[test]
fn empty_phases_are_skipped() {
    let log = Log::default();
    let mut c = Controller::new();
    c.on_put(push(&log, "put"));

    c.process_request(&mut Context::new(Method::DELETE)).unwrap();
    assert!(log.lock().unwrap().is_empty());

    Controller::new()
        .process_request(&mut Context::new(Method::GET))
        .unwrap();
}

#[test]
fn failure_stops_processing() {
    let log = Log::default();
    let mut c = Controller::new();

    c.on_open(push(&log, "open"));
    c.on_get(|_| Err("boom".into()));
    c.on_get(push(&log, "get"));
    c.on_close(push(&log, "close"));

    let err = c
        .process_request(&mut Context::new(Method::GET))
        .unwrap_err();

    assert_eq!(err.to_string(), "boom");
    assert_eq!(*log.lock().unwrap(), ["open"]);
}

#[test]
fn methods_are_case_sensitive() {
    let log = Log::default();
    let mut c = Controller::new();
    c.on_get(push(&log, "GET"));

    let lowercase = Method::from_bytes(b"get").unwrap();
    c.process_request(&mut Context::new(lowercase)).unwrap();
    assert!(log.lock().unwrap().is_empty());
}

#[test]
fn synthetic_phases_are_not_methods() {
    let log = Log::default();
    let mut c = Controller::new();

    c.on("OPEN".parse::<Phase>().unwrap(), push(&log, "open"));
    c.on("CLOSE".parse::<Phase>().unwrap(), push(&log, "close"));
    c.on("PURGE".parse::<Phase>().unwrap(), push(&log, "purge"));

    let open = Method::from_bytes(b"OPEN").unwrap();
    c.process_request(&mut Context::new(open)).unwrap();
    assert_eq!(*log.lock().unwrap(), ["open", "close"]);

    log.lock().unwrap().clear();
    let purge = Method::from_bytes(b"PURGE").unwrap();
    c.process_request(&mut Context::new(purge)).unwrap();
    assert_eq!(*log.lock().unwrap(), ["open", "purge", "close"]);

    assert!("NOT A METHOD".parse::<Phase>().is_err());
}

#[test]
fn listeners_share_the_context() {
    let mut c = Controller::new();

    c.on_open(|cx| {
        cx.params_mut().set("user", "ox");
        Ok(())
    });
    c.on_get(|cx| {
        let user = cx.get_param("user", ParamOptions::required())?.unwrap_or_default();
        let greeting = format!("hello {}", user);
        cx.extensions_mut().insert(greeting);
        Ok(())
    });

    let mut cx = Context::new(Method::GET);
    c.process_request(&mut cx).unwrap();
    assert_eq!(cx.extensions().get::<String>().unwrap(), "hello ox");
}

#[test]
fn required_param() {
    let mut cx = Context::new(Method::POST);
    cx.params_mut().set("empty", "");
    cx.params_mut().set("name", "ox");

    let err = cx.get_param("x", ParamOptions::required()).unwrap_err();
    assert_eq!(err.name(), "x");
    assert!(err.to_string().contains("`x`"));

    let err = cx.get_param("empty", ParamOptions::required()).unwrap_err();
    assert_eq!(err.to_string(), "The parameter `empty` is required");

    let options = ParamOptions {
        default: Some(""),
        required: true,
    };
    assert!(cx.get_param("x", options).is_err());

    assert_eq!(cx.get_param("name", ParamOptions::required()).unwrap(), Some("ox"));
    assert_eq!(cx.get_param("x", ParamOptions::default()).unwrap(), None);
    assert_eq!(
        cx.get_param("x", ParamOptions::with_default("1")).unwrap(),
        Some("1")
    );
}

#[test]
fn missing_param_fails_request() {
    let mut c = Controller::new();
    c.on_post(|cx| {
        cx.get_param("token", ParamOptions::required())?;
        Ok(())
    });

    let err = c
        .process_request(&mut Context::new(Method::POST))
        .unwrap_err();

    let missing = err.downcast_ref::<MissingParam>().unwrap();
    assert_eq!(missing.name(), "token");
    assert_eq!(err.status(), yak::StatusCode::BAD_REQUEST);
}

#[test]
fn listeners_without_result() {
    let log = Log::default();
    let mut c = Controller::new();

    let l = log.clone();
    c.on_open(move |_| l.lock().unwrap().push("open"));
    c.on_get(|cx| {
        cx.params_mut().set("seen", "1");
    });
    c.on_close(push(&log, "close"));

    let mut cx = Context::new(Method::GET);
    c.process_request(&mut cx).unwrap();

    assert_eq!(*log.lock().unwrap(), ["open", "close"]);
    assert_eq!(cx.params().get("seen", yak::GetOptions::new()), Some("1"));
}
