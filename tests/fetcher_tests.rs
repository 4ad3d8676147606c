use httpmock::prelude::*;
use link_preview::{FetchOptions, Fetcher, PreviewError, RedirectMode};
use std::net::TcpListener;
use std::time::Duration;

#[tokio::test]
async fn test_fetch_returns_body_and_normalized_headers() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(GET).path("/page").header("x-client", "chat");
            then.status(200)
                .header("Content-Type", "text/html; charset=utf-8")
                .header("X-Custom", "value")
                .body("<html><title>Hi</title></html>");
        })
        .await;

    let opts = FetchOptions::default().with_header("X-Client", "chat");
    let fetcher = Fetcher::new(&opts).unwrap();
    let content = fetcher.fetch(&server.url("/page")).await.unwrap();

    mock.assert_async().await;
    assert_eq!(content.body, b"<html><title>Hi</title></html>");
    assert_eq!(content.content_type(), Some("text/html; charset=utf-8"));
    assert_eq!(content.headers.get("x-custom").map(String::as_str), Some("value"));
}

#[tokio::test]
async fn test_http_404_error() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/missing");
            then.status(404);
        })
        .await;

    let fetcher = Fetcher::new(&FetchOptions::default()).unwrap();
    match fetcher.fetch(&server.url("/missing")).await.unwrap_err() {
        PreviewError::NotFound(msg) => assert!(msg.contains("not found")),
        e => panic!("Expected NotFound error, got: {:?}", e),
    }
}

#[tokio::test]
async fn test_http_400_and_500_errors() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/bad");
            then.status(400);
        })
        .await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/broken");
            then.status(500);
        })
        .await;

    let fetcher = Fetcher::new(&FetchOptions::default()).unwrap();

    match fetcher.fetch(&server.url("/bad")).await.unwrap_err() {
        PreviewError::ClientError { status, .. } => assert_eq!(status, 400),
        e => panic!("Expected ClientError, got: {:?}", e),
    }
    match fetcher.fetch(&server.url("/broken")).await.unwrap_err() {
        PreviewError::ServerError { status, .. } => assert_eq!(status, 500),
        e => panic!("Expected ServerError, got: {:?}", e),
    }
}

#[tokio::test]
async fn test_timeout_error() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/slow");
            then.status(200).delay(Duration::from_secs(3)).body("late");
        })
        .await;

    let opts = FetchOptions::default().with_timeout(Duration::from_millis(200));
    let fetcher = Fetcher::new(&opts).unwrap();

    let err = fetcher.fetch(&server.url("/slow")).await.unwrap_err();
    assert!(matches!(err, PreviewError::TimeoutError(_)), "got {err:?}");
    assert!(!err.is_unpreviewable());
}

#[tokio::test]
async fn test_connection_refused() {
    let port = {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap().port()
    };

    let fetcher = Fetcher::new(&FetchOptions::default()).unwrap();
    let err = fetcher
        .fetch(&format!("http://127.0.0.1:{port}/"))
        .await
        .unwrap_err();
    assert!(matches!(err, PreviewError::ConnectionError(_)), "got {err:?}");
}

#[tokio::test]
async fn test_body_size_limit() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/big");
            then.status(200).body(vec![b'a'; 4096]);
        })
        .await;

    let opts = FetchOptions::default().with_max_body_size(1024);
    let fetcher = Fetcher::new(&opts).unwrap();

    match fetcher.fetch(&server.url("/big")).await.unwrap_err() {
        PreviewError::ContentSizeExceeded { limit, .. } => assert_eq!(limit, 1024),
        e => panic!("Expected ContentSizeExceeded, got: {:?}", e),
    }
}

#[tokio::test]
async fn test_same_host_redirects() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/old");
            then.status(301).header("Location", "/new");
        })
        .await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/new");
            then.status(200).body("moved here");
        })
        .await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/elsewhere");
            then.status(302)
                .header("Location", "http://other.invalid/landing");
        })
        .await;

    let opts = FetchOptions::default().with_redirect(RedirectMode::SameHost { max_redirects: 5 });
    let fetcher = Fetcher::new(&opts).unwrap();

    let content = fetcher.fetch(&server.url("/old")).await.unwrap();
    assert_eq!(content.body, b"moved here");
    assert!(content.url.ends_with("/new"));

    // cross-host redirect is not followed, the 302 itself is returned
    let err = fetcher.fetch(&server.url("/elsewhere")).await.unwrap_err();
    assert!(matches!(err, PreviewError::FetchError(_)), "got {err:?}");
}
