// Copyright (c) 2026 shaneyale (shaneyale86@gmail.com)
// All rights reserved.

//! # HTTP 请求处理模块
//!
//! 负责将 TCP 流中读取的原始字节解析为强类型的 `Request` 结构体：
//! 1. 请求行（方法、路径、查询字符串、版本）。
//! 2. 常用标头（`User-Agent`、`Accept-Encoding`、`Content-Length`）。
//! 3. 请求体（JSON 接口使用）。

use std::collections::HashMap;

use crate::{exception::Exception, param::*};
use log::error;

/// 表示一个完整的 HTTP 请求。
#[derive(Debug, Clone)]
pub struct Request {
    /// HTTP 请求方法（GET, POST 等）
    method: HttpRequestMethod,
    /// 请求的资源路径（不含查询字符串）
    path: String,
    /// 已解码的查询参数
    query: HashMap<String, String>,
    /// HTTP 协议版本
    version: HttpVersion,
    /// 客户端标识字符串
    user_agent: String,
    /// 客户端支持的压缩编码列表（按解析顺序排列）
    accept_encoding: Vec<HttpEncoding>,
    /// 请求体
    body: Vec<u8>,
}

/// 在缓冲区中查找报文头结束位置（`\r\n\r\n` 之后的下标）
pub fn header_end(buffer: &[u8]) -> Option<usize> {
    buffer
        .windows(4)
        .position(|w| w == b"\r\n\r\n")
        .map(|p| p + 4)
}

/// 从报文头中读取 `Content-Length`，缺失或非法时为 0
pub fn content_length(head: &[u8]) -> usize {
    String::from_utf8_lossy(head)
        .split(CRLF)
        .find_map(|line| {
            let (name, value) = line.split_once(':')?;
            if name.trim().eq_ignore_ascii_case("content-length") {
                value.trim().parse().ok()
            } else {
                None
            }
        })
        .unwrap_or(0)
}

impl Request {
    /// 从原始字节缓冲区尝试构建 `Request` 实例。
    ///
    /// # 参数
    /// * `buffer` - 从网络 Socket 读取的完整报文（报文头 + 请求体）。
    /// * `id` - 全局请求 ID，用于在多线程环境下追踪日志。
    pub fn try_from(buffer: &[u8], id: u128) -> Result<Self, Exception> {
        let (head, body) = match header_end(buffer) {
            Some(end) => (&buffer[..end], &buffer[end..]),
            None => (buffer, &buffer[buffer.len()..]),
        };

        // 1. 报文头必须是合法的 UTF-8
        let request_string = match std::str::from_utf8(head) {
            Ok(string) => string,
            Err(_) => {
                error!("[ID{}]无法解析HTTP请求", id);
                return Err(Exception::RequestIsNotUtf8);
            }
        };

        let request_lines: Vec<&str> = request_string.split(CRLF).collect();

        // 2. 解析请求行 (e.g., "GET /dateWise?username=1 HTTP/1.1")
        let first_line_parts: Vec<&str> = request_lines[0].split(' ').collect();

        if first_line_parts.len() < 3 {
            error!("[ID{}]HTTP请求行格式不正确：{}", id, request_lines[0]);
            return Err(Exception::UnSupportedRequestMethod);
        }

        let method_str = first_line_parts[0].to_uppercase();
        let method = match method_str.as_str() {
            "GET" => HttpRequestMethod::Get,
            "OPTIONS" => HttpRequestMethod::Options,
            "POST" => HttpRequestMethod::Post,
            _ => {
                error!("[ID{}]不支持的HTTP请求方法：{}", id, &method_str);
                return Err(Exception::UnSupportedRequestMethod);
            }
        };

        let version_str = first_line_parts[first_line_parts.len() - 1].to_uppercase();
        let version = match version_str.as_str() {
            "HTTP/1.1" => HttpVersion::V1_1,
            _ => {
                error!("[ID{}]不支持的HTTP协议版本：{}", id, &version_str);
                return Err(Exception::UnsupportedHttpVersion);
            }
        };

        let target = if first_line_parts.len() == 3 {
            first_line_parts[1].to_string()
        } else {
            first_line_parts[1..first_line_parts.len() - 1].join(" ")
        };
        let (path, query) = match target.split_once('?') {
            Some((path, query)) => (
                path.to_string(),
                url::form_urlencoded::parse(query.as_bytes())
                    .into_owned()
                    .collect(),
            ),
            None => (target, HashMap::new()),
        };

        // 3. 迭代各行解析 Headers
        let mut user_agent = "".to_string();
        let mut accept_encoding = vec![];
        for line in request_lines.iter().skip(1) {
            let Some((name, value)) = line.split_once(':') else {
                continue;
            };
            let name = name.trim().to_lowercase();
            let value = value.trim();
            if name == "user-agent" {
                user_agent = value.to_string();
            } else if name == "accept-encoding" {
                if value.contains("gzip") {
                    accept_encoding.push(HttpEncoding::Gzip);
                }
                if value.contains("deflate") {
                    accept_encoding.push(HttpEncoding::Deflate);
                }
                if value.contains("br") {
                    accept_encoding.push(HttpEncoding::Br);
                }
            }
        }

        // 4. 请求体按 Content-Length 截断
        let length = content_length(head).min(body.len());

        Ok(Self {
            method,
            path,
            query,
            version,
            user_agent,
            accept_encoding,
            body: body[..length].to_vec(),
        })
    }
}

// --- Getter 访问器实现 ---

impl Request {
    /// 获取 HTTP 协议版本
    pub fn version(&self) -> &HttpVersion {
        &self.version
    }

    /// 获取请求路径（不含查询参数）
    pub fn path(&self) -> &str {
        &self.path
    }

    /// 获取已解码的查询参数
    pub fn query(&self, name: &str) -> Option<&str> {
        self.query.get(name).map(String::as_str)
    }

    /// 获取请求方法
    pub fn method(&self) -> HttpRequestMethod {
        self.method
    }

    /// 获取用户代理字符串
    pub fn user_agent(&self) -> &str {
        &self.user_agent
    }

    /// 获取客户端支持的压缩算法列表
    pub fn accept_encoding(&self) -> &Vec<HttpEncoding> {
        &self.accept_encoding
    }

    /// 获取请求体
    pub fn body(&self) -> &[u8] {
        &self.body
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_get_request_with_query() {
        let request_str = "GET /dateWise?username=0101&password=p%40ss&institution_type=university HTTP/1.1\r\nHost: localhost:8000\r\nUser-Agent: Test-Browser\r\nAccept-Encoding: gzip, deflate, br\r\n\r\n";
        let request = Request::try_from(request_str.as_bytes(), 0).unwrap();

        assert_eq!(request.method(), HttpRequestMethod::Get);
        assert_eq!(request.path(), "/dateWise");
        assert_eq!(request.query("username"), Some("0101"));
        assert_eq!(request.query("password"), Some("p@ss"));
        assert_eq!(request.query("institution_type"), Some("university"));
        assert_eq!(request.query("missing"), None);
        assert_eq!(request.user_agent(), "Test-Browser");
        assert!(request.accept_encoding().contains(&HttpEncoding::Gzip));
        assert!(request.accept_encoding().contains(&HttpEncoding::Br));
    }

    #[test]
    fn test_parse_post_request_with_body() {
        let body = r#"{"college_id":"0101","password":"pw"}"#;
        let request_str = format!(
            "POST /login-and-fetch-attendance HTTP/1.1\r\nHost: localhost\r\nContent-Type: application/json\r\nContent-Length: {}\r\n\r\n{}",
            body.len(),
            body
        );
        let request = Request::try_from(request_str.as_bytes(), 0).unwrap();

        assert_eq!(request.method(), HttpRequestMethod::Post);
        assert_eq!(request.path(), "/login-and-fetch-attendance");
        assert_eq!(request.body(), body.as_bytes());
    }

    #[test]
    fn test_body_is_truncated_to_content_length() {
        let request_str = "POST /clear-cache HTTP/1.1\r\nContent-Length: 2\r\n\r\n{}garbage";
        let request = Request::try_from(request_str.as_bytes(), 0).unwrap();
        assert_eq!(request.body(), b"{}");
    }

    #[test]
    fn test_parse_options_request() {
        let request_str = "OPTIONS * HTTP/1.1\r\nHost: localhost:8000\r\n\r\n";
        let request = Request::try_from(request_str.as_bytes(), 0).unwrap();

        assert_eq!(request.method(), HttpRequestMethod::Options);
        assert_eq!(request.path(), "*");
    }

    #[test]
    fn test_unsupported_method() {
        let request_str = "DELETE /resource HTTP/1.1\r\nHost: localhost:8000\r\n\r\n";
        let result = Request::try_from(request_str.as_bytes(), 0);

        match result {
            Err(Exception::UnSupportedRequestMethod) => {}
            _ => panic!("Expected UnSupportedRequestMethod error"),
        }
    }

    #[test]
    fn test_unsupported_http_version() {
        let request_str = "GET / HTTP/2.0\r\nHost: localhost:8000\r\n\r\n";
        let result = Request::try_from(request_str.as_bytes(), 0);

        match result {
            Err(Exception::UnsupportedHttpVersion) => {}
            _ => panic!("Expected UnsupportedHttpVersion error"),
        }
    }

    #[test]
    fn test_invalid_utf8() {
        let buffer = vec![0xFF, 0xFE, 0xFD];
        let result = Request::try_from(&buffer, 0);

        match result {
            Err(Exception::RequestIsNotUtf8) => {}
            _ => panic!("Expected RequestIsNotUtf8 error"),
        }
    }

    #[test]
    fn test_case_insensitive_headers() {
        let request_str = "GET / HTTP/1.1\r\nhost: localhost:8000\r\nuser-agent: Test\r\naccept-encoding: gzip\r\n\r\n";
        let request = Request::try_from(request_str.as_bytes(), 0).unwrap();

        assert_eq!(request.user_agent(), "Test");
        assert!(request.accept_encoding().contains(&HttpEncoding::Gzip));
        assert!(!request.accept_encoding().contains(&HttpEncoding::Deflate));
    }

    #[test]
    fn test_lowercase_method() {
        let request_str = "get /health HTTP/1.1\r\nHost: localhost:8000\r\n\r\n";
        let request = Request::try_from(request_str.as_bytes(), 0).unwrap();

        assert_eq!(request.method(), HttpRequestMethod::Get);
    }

    #[test]
    fn test_header_end_and_content_length() {
        let raw = b"POST / HTTP/1.1\r\ncontent-length: 12\r\n\r\nbody";
        let end = header_end(raw).unwrap();
        assert_eq!(&raw[end..], b"body");
        assert_eq!(content_length(&raw[..end]), 12);
        assert_eq!(header_end(b"GET / HTTP/1.1\r\n"), None);
        assert_eq!(content_length(b"GET / HTTP/1.1\r\n\r\n"), 0);
    }
}
