//! Tests for forwarding through `ProxyToBackendRoute`

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use backroute::header::{HeaderValue, SET_COOKIE};
use backroute::{
    Body, Error, InterceptorContext, Request, Response, Route, StatusCode, client_fn,
    proxy_to_backend,
};
use bytes::Bytes;
use futures_util::stream;
use http_body_util::BodyExt;

fn get(path: &str) -> Request {
    Request::get(path).build().unwrap()
}

/// Sets its flag when dropped, i.e. when the backend call is released.
struct DropFlag(Arc<AtomicBool>);

impl Drop for DropFlag {
    fn drop(&mut self) {
        self.0.store(true, Ordering::SeqCst);
    }
}

#[derive(Debug)]
struct UpstreamReset {
    stream_id: u32,
}

impl fmt::Display for UpstreamReset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "stream {} reset by upstream", self.stream_id)
    }
}

impl std::error::Error for UpstreamReset {}

#[tokio::test]
async fn test_proxies_using_client() {
    let client = client_fn(|_req: Request| async { Ok(Response::new(StatusCode::OK)) });
    let route = proxy_to_backend(Arc::new(client));

    let response = route.handle(get("/foo"), InterceptorContext::new()).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_backend_timeout_is_propagated_not_converted() {
    let client = client_fn(|_req: Request| async { Err(Error::Timeout(Duration::from_secs(5))) });
    let route = proxy_to_backend(Arc::new(client));

    let err = route.handle(get("/foo"), InterceptorContext::new()).await.unwrap_err();

    assert!(err.is_timeout());
    assert!(matches!(err, Error::Timeout(d) if d == Duration::from_secs(5)));
}

#[tokio::test(start_paused = true)]
async fn test_cancelled_request_never_yields_response() {
    let released = Arc::new(AtomicBool::new(false));
    let completed = Arc::new(AtomicBool::new(false));

    let client = {
        let released = Arc::clone(&released);
        let completed = Arc::clone(&completed);
        client_fn(move |_req: Request| {
            let guard = DropFlag(Arc::clone(&released));
            let completed = Arc::clone(&completed);
            async move {
                let _guard = guard;
                tokio::time::sleep(Duration::from_millis(100)).await;
                completed.store(true, Ordering::SeqCst);
                Ok(Response::new(StatusCode::OK))
            }
        })
    };
    let route = proxy_to_backend(Arc::new(client));

    let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
    let pending = route.handle(get("/foo"), InterceptorContext::new());
    let caller = tokio::spawn(async move {
        let _ = tx.send(pending.await);
    });

    tokio::time::sleep(Duration::from_millis(10)).await;
    caller.abort();
    assert!(caller.await.unwrap_err().is_cancelled());

    // Well past the point where the backend would have answered.
    tokio::time::sleep(Duration::from_millis(200)).await;

    assert!(released.load(Ordering::SeqCst), "backend call was not released");
    assert!(!completed.load(Ordering::SeqCst), "backend call ran to completion");
    assert!(rx.try_recv().is_err(), "a response was delivered after cancellation");
}

#[tokio::test]
async fn test_status_headers_and_body_pass_through() {
    let client = client_fn(|_req: Request| async {
        Ok(Response::builder()
            .status(StatusCode::IM_A_TEAPOT)
            .header(SET_COOKIE, HeaderValue::from_static("a=1"))
            .header(SET_COOKIE, HeaderValue::from_static("b=2"))
            .text("short and stout"))
    });
    let route = proxy_to_backend(Arc::new(client));

    let response = route.handle(get("/pot"), InterceptorContext::new()).await.unwrap();

    assert_eq!(response.status(), StatusCode::IM_A_TEAPOT);
    assert_eq!(response.header("content-type"), Some("text/plain; charset=utf-8"));
    let cookies: Vec<_> = response.headers().get_all(SET_COOKIE).iter().collect();
    assert_eq!(cookies, ["a=1", "b=2"]);
    assert_eq!(response.into_body().collect().await.unwrap(), "short and stout");
}

#[tokio::test]
async fn test_server_errors_are_not_masked() {
    let client = client_fn(|_req: Request| async {
        Ok(Response::builder().status(StatusCode::INTERNAL_SERVER_ERROR).text("db down"))
    });
    let route = proxy_to_backend(Arc::new(client));

    let response = route.handle(get("/"), InterceptorContext::new()).await.unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(response.into_body().collect().await.unwrap(), "db down");
}

#[tokio::test]
async fn test_streamed_body_chunks_keep_order() {
    let client = client_fn(|_req: Request| async {
        let chunks = ["one,", "two,", "three"]
            .into_iter()
            .map(|c| Ok::<_, std::io::Error>(Bytes::from_static(c.as_bytes())));
        Ok(Response::builder().body(Body::from_stream(stream::iter(chunks))))
    });
    let route = proxy_to_backend(Arc::new(client));

    let mut body = route
        .handle(get("/stream"), InterceptorContext::new())
        .await
        .unwrap()
        .into_body();

    let mut seen = Vec::new();
    while let Some(frame) = body.frame().await {
        if let Ok(data) = frame.unwrap().into_data() {
            seen.push(data);
        }
    }
    assert_eq!(seen, ["one,", "two,", "three"]);
}

#[tokio::test]
async fn test_custom_failure_reaches_caller_intact() {
    let client = client_fn(|_req: Request| async {
        Err(Error::backend(UpstreamReset { stream_id: 7 }))
    });
    let route = proxy_to_backend(Arc::new(client));

    let err = route.handle(get("/foo"), InterceptorContext::new()).await.unwrap_err();

    let source = match err {
        Error::Backend(source) => source,
        other => panic!("expected a backend failure, got {other:?}"),
    };
    let reset = source.downcast_ref::<UpstreamReset>().expect("original error type lost");
    assert_eq!(reset.stream_id, 7);
}

#[tokio::test]
async fn test_invalid_request_from_backend_is_not_rewrapped() {
    let client = client_fn(|_req: Request| async {
        Err(Request::get("/bad uri").build().unwrap_err())
    });
    let route = proxy_to_backend(Arc::new(client));

    let err = route.handle(get("/foo"), InterceptorContext::new()).await.unwrap_err();

    assert!(matches!(err, Error::InvalidRequest(_)), "expected InvalidRequest, got {err:?}");
}

#[tokio::test]
async fn test_exactly_one_backend_call_made_before_awaiting() {
    let calls = Arc::new(AtomicUsize::new(0));
    let client = {
        let calls = Arc::clone(&calls);
        client_fn(move |_req: Request| {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Ok(Response::new(StatusCode::NO_CONTENT)) }
        })
    };
    let route = proxy_to_backend(Arc::new(client));

    let pending = route.handle(get("/once"), InterceptorContext::new());
    assert_eq!(calls.load(Ordering::SeqCst), 1);

    let response = pending.await.unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_concurrent_requests_do_not_interfere() {
    let client = client_fn(|req: Request| async move {
        let path = req.path().to_owned();
        // The slower request is issued first; outcomes must still match.
        let delay = if path == "/slow" { 30 } else { 1 };
        tokio::time::sleep(Duration::from_millis(delay)).await;
        if path == "/missing" {
            return Ok(Response::new(StatusCode::NOT_FOUND));
        }
        Ok(Response::text(path))
    });
    let route = proxy_to_backend(Arc::new(client));

    let (slow, fast, missing) = tokio::join!(
        route.handle(get("/slow"), InterceptorContext::new()),
        route.handle(get("/fast"), InterceptorContext::new()),
        route.handle(get("/missing"), InterceptorContext::new()),
    );

    assert_eq!(slow.unwrap().into_body().collect().await.unwrap(), "/slow");
    assert_eq!(fast.unwrap().into_body().collect().await.unwrap(), "/fast");
    assert_eq!(missing.unwrap().status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_request_reaches_client_unchanged() {
    let client = client_fn(|req: Request| async move {
        assert_eq!(req.method(), "PUT");
        assert_eq!(req.uri(), "/items/3?dry_run=1");
        assert_eq!(req.header("x-tenant"), Some("acme"));
        let body = req.into_body().collect().await?;
        Ok::<_, Error>(Response::builder().status(StatusCode::ACCEPTED).body(Body::from(body)))
    });
    let route = proxy_to_backend(Arc::new(client));

    let request = Request::builder()
        .method(backroute::Method::PUT)
        .uri("/items/3?dry_run=1")
        .header("X-Tenant", "acme")
        .body("{\"qty\":2}")
        .unwrap();
    let mut context = InterceptorContext::new();
    context.add("request-id", String::from("r-1"));

    let response = route.handle(request, context).await.unwrap();

    assert_eq!(response.status(), StatusCode::ACCEPTED);
    assert_eq!(response.into_body().collect().await.unwrap(), "{\"qty\":2}");
}

#[tokio::test]
async fn test_route_is_usable_behind_arc_dyn() {
    let client = client_fn(|_req: Request| async { Ok(Response::new(StatusCode::OK)) });
    let route: Arc<dyn Route> = Arc::new(proxy_to_backend(Arc::new(client)));

    let response = route.handle(get("/"), InterceptorContext::new()).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}
