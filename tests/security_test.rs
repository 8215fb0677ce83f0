// Copyright (c) 2026 shaneyale (shaneyale86@gmail.com)
// All rights reserved.

#[cfg(test)]
mod security_tests {
    //! # 畸形请求回归测试
    //!
    //! 覆盖范围包括：
    //! - 协议健壮性（非法方法、版本、编码）
    //! - 注入（查询参数中的 CRLF、请求体中的超长字段）
    //! - 凭据泄露（响应与调试输出中不得出现密码）

    use std::sync::Arc;
    use std::time::Duration;

    use portal_attendance::config::Config;
    use portal_attendance::exception::Exception;
    use portal_attendance::net::ReqwestConnector;
    use portal_attendance::router;
    use portal_attendance::util::SystemClock;
    use portal_attendance::{
        AttendanceService, Credential, InstitutionVariant, PortalClient, Request, ResultCache,
    };

    /// 门户地址指向本机不可达端口，任何抓取都会快速失败
    fn offline_service() -> AttendanceService {
        let config = Arc::new(
            Config::from_toml_str("port = 8000\nworker_threads = 1\nlocal = true\nrequest_timeout_secs = 1")
                .with_base_urls("http://127.0.0.1:9", "http://127.0.0.1:9"),
        );
        let connector = Arc::new(ReqwestConnector::new(config.request_timeout()));
        let cache = Arc::new(ResultCache::new(4, Duration::from_secs(60)));
        AttendanceService::new(cache, PortalClient::new(connector, config), Arc::new(SystemClock))
    }

    async fn respond(raw: &[u8]) -> Result<String, Exception> {
        let request = Request::try_from(raw, 0)?;
        let response = router::handle(&request, &offline_service(), 0).await;
        Ok(String::from_utf8_lossy(&response.as_bytes()).to_string())
    }

    #[tokio::test]
    async fn test_crlf_in_query_does_not_inject_headers() {
        let response = respond(b"GET /dateWise?username=a%0D%0ASet-Cookie:%20x=1 HTTP/1.1\r\n\r\n")
            .await
            .unwrap();
        let (head, _) = response.split_once("\r\n\r\n").unwrap();
        assert!(!head.contains("Set-Cookie"));
        assert!(head.starts_with("HTTP/1.1 422"));
    }

    #[tokio::test]
    async fn test_path_traversal_is_just_not_found() {
        let response = respond(b"GET /../../etc/passwd HTTP/1.1\r\n\r\n").await.unwrap();
        assert!(response.starts_with("HTTP/1.1 404"));
        assert!(!response.contains("root:"));
    }

    #[tokio::test]
    async fn test_null_byte_in_path() {
        let response = respond(b"GET /health\0 HTTP/1.1\r\n\r\n").await.unwrap();
        assert!(response.starts_with("HTTP/1.1 404"));
    }

    #[tokio::test]
    async fn test_garbage_request_line() {
        assert_eq!(
            respond(b"\r\n\r\n").await.unwrap_err(),
            Exception::UnSupportedRequestMethod
        );
        assert_eq!(
            respond(b"BREW /pot HTTP/1.1\r\n\r\n").await.unwrap_err(),
            Exception::UnSupportedRequestMethod
        );
        assert_eq!(
            respond(b"GET / HTTP/0.9\r\n\r\n").await.unwrap_err(),
            Exception::UnsupportedHttpVersion
        );
        assert_eq!(
            respond(&[0xC3, 0x28, b'\r', b'\n', b'\r', b'\n']).await.unwrap_err(),
            Exception::RequestIsNotUtf8
        );
    }

    #[tokio::test]
    async fn test_wrong_json_types_are_missing_parameters() {
        let body = r#"{"college_id": 42, "password": ["x"]}"#;
        let raw = format!(
            "POST /login-and-fetch-attendance HTTP/1.1\r\nContent-Length: {}\r\n\r\n{}",
            body.len(),
            body
        );
        let response = respond(raw.as_bytes()).await.unwrap();
        assert!(response.starts_with("HTTP/1.1 422"));
    }

    #[tokio::test]
    async fn test_unreachable_portal_does_not_echo_password() {
        let response = respond(
            b"GET /dateWise?username=0101&password=hunter2 HTTP/1.1\r\n\r\n",
        )
        .await
        .unwrap();
        assert!(response.starts_with("HTTP/1.1 200"));
        assert!(response.contains("\"success\":false"));
        assert!(!response.contains("hunter2"));
    }

    #[test]
    fn test_credential_debug_redacts_secret() {
        let credential = Credential::new("0101", "hunter2", InstitutionVariant::College);
        let debug = format!("{:?}", credential);
        assert!(debug.contains("0101"));
        assert!(!debug.contains("hunter2"));
    }
}
