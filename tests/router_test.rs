// Copyright (c) 2026 shaneyale (shaneyale86@gmail.com)
// All rights reserved.

//! 路由层测试：从原始请求字节到响应报文，不访问网络。

use std::sync::Arc;
use std::time::Duration;

use mockall::mock;
use serde_json::Value;

use portal_attendance::config::Config;
use portal_attendance::exception::Exception;
use portal_attendance::net::{Connector, HttpSession};
use portal_attendance::router;
use portal_attendance::util::SystemClock;
use portal_attendance::{AttendanceService, PortalClient, Request, ResultCache};

mock! {
    pub Portal {}

    impl Connector for Portal {
        fn connect(&self) -> Result<Box<dyn HttpSession>, Exception>;
    }
}

/// 构造一个服务；`connects` 为允许访问门户的次数，门户始终不可达
fn service(connects: usize) -> AttendanceService {
    let mut mock = MockPortal::new();
    mock.expect_connect()
        .times(connects)
        .returning(|| Err(Exception::Network("connection refused".to_string())));
    let cache = Arc::new(ResultCache::new(8, Duration::from_secs(3600)));
    let client = PortalClient::new(Arc::new(mock), Arc::new(Config::default()));
    AttendanceService::new(cache, client, Arc::new(SystemClock))
}

async fn call(raw: &str, service: &AttendanceService) -> (u16, String, Value) {
    let request = Request::try_from(raw.as_bytes(), 1).unwrap();
    let response = router::handle(&request, service, 1).await;
    let bytes = response.as_bytes();
    let text = String::from_utf8(bytes).unwrap();
    let (head, body) = text.split_once("\r\n\r\n").unwrap();
    let json = if body.is_empty() {
        Value::Null
    } else {
        serde_json::from_str(body).unwrap()
    };
    (response.status_code(), head.to_string(), json)
}

fn post(path: &str, body: &str) -> String {
    format!(
        "POST {} HTTP/1.1\r\nHost: localhost\r\nContent-Type: application/json\r\nContent-Length: {}\r\n\r\n{}",
        path,
        body.len(),
        body
    )
}

#[tokio::test]
async fn test_root_and_health() {
    let service = service(0);

    let (status, head, json) = call("GET / HTTP/1.1\r\nHost: localhost\r\n\r\n", &service).await;
    assert_eq!(status, 200);
    assert!(head.contains("Access-Control-Allow-Origin: *"));
    assert_eq!(json["message"], "College Attendance Scraper API is running");

    let (status, _, json) = call("GET /health HTTP/1.1\r\n\r\n", &service).await;
    assert_eq!(status, 200);
    assert_eq!(json["status"], "healthy");
    assert_eq!(json["message"], "API is running with 1-hour caching");
    assert_eq!(json["cache_info"]["attendance_cache_entries"], 0);
    assert_eq!(json["cache_info"]["cache_duration_hours"], 1);
}

#[tokio::test]
async fn test_unknown_route_is_404() {
    let (status, _, json) = call("GET /nope HTTP/1.1\r\n\r\n", &service(0)).await;
    assert_eq!(status, 404);
    assert!(json["detail"].is_string());
}

#[tokio::test]
async fn test_wrong_method_is_405() {
    let (status, _, _) = call("GET /clear-cache HTTP/1.1\r\n\r\n", &service(0)).await;
    assert_eq!(status, 405);
}

#[tokio::test]
async fn test_preflight() {
    let (status, head, json) = call("OPTIONS /dateWise HTTP/1.1\r\n\r\n", &service(0)).await;
    assert_eq!(status, 204);
    assert!(head.contains("Access-Control-Allow-Methods: GET, POST, OPTIONS"));
    assert!(json.is_null());
}

#[tokio::test]
async fn test_missing_query_parameter_is_422() {
    let (status, _, json) = call("GET /dateWise?username=0101 HTTP/1.1\r\n\r\n", &service(0)).await;
    assert_eq!(status, 422);
    assert_eq!(json["detail"], "Missing required parameter: password");
}

#[tokio::test]
async fn test_malformed_body_is_400() {
    let (status, _, _) = call(&post("/login-and-fetch-attendance", "{oops"), &service(0)).await;
    assert_eq!(status, 400);
}

#[tokio::test]
async fn test_portal_failure_is_a_200_with_success_false() {
    let service = service(1);
    let (status, _, json) = call(
        &post(
            "/login-and-fetch-attendance",
            r#"{"college_id":"0101","password":"pw","institution_type":"university"}"#,
        ),
        &service,
    )
    .await;
    assert_eq!(status, 200);
    assert_eq!(json["success"], false);
    assert_eq!(json["message"], "Network error: connection refused");
    assert!(json["data"].is_null());
}

#[tokio::test]
async fn test_till_date_route_reaches_portal() {
    let service = service(1);
    let (status, _, json) = call(
        "GET /getDateWiseAttendance?username=0101&password=pw HTTP/1.1\r\n\r\n",
        &service,
    )
    .await;
    assert_eq!(status, 200);
    assert_eq!(json["success"], false);
}

#[tokio::test]
async fn test_clear_cache_and_test_login() {
    let service = service(0);

    let (status, _, json) = call(&post("/clear-cache", ""), &service).await;
    assert_eq!(status, 200);
    assert_eq!(json["success"], true);
    assert_eq!(json["cleared_entries"]["attendance"], 0);

    let (status, _, json) = call(&post("/test-login", ""), &service).await;
    assert_eq!(status, 200);
    assert_eq!(json["message"], "Test login successful - dummy data");
    assert_eq!(json["data"]["ADA"]["total"], 40);
}

#[test]
fn test_rejected_requests_keep_their_status() {
    let response = router::reject(&Exception::RequestTooLarge);
    assert_eq!(response.status_code(), 413);
    let text = String::from_utf8(response.as_bytes()).unwrap();
    assert!(text.starts_with("HTTP/1.1 413 Payload Too Large\r\n"));
    assert!(text.ends_with(r#"{"detail":"Request too large"}"#));

    let e = Request::try_from(b"GET / HTTP/2.0\r\nHost: localhost\r\n\r\n", 1).unwrap_err();
    assert_eq!(router::reject(&e).status_code(), 505);

    let e = Request::try_from(b"BREW / HTTP/1.1\r\n\r\n", 1).unwrap_err();
    assert_eq!(router::reject(&e).status_code(), 400);
}
