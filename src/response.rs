use crate::{
    param::*,
    request::Request,
    util::{format_date, format_file_size},
};

use brotli::enc::{self, backward_references::BrotliEncoderParams};
use bytes::Bytes;
use chrono::prelude::*;
use flate2::{
    write::{DeflateEncoder, GzEncoder},
    Compression,
};
use log::{debug, error};
use serde::Serialize;

use std::io::{self, Write};

#[derive(Debug, Clone)]
pub struct Response {
    version: HttpVersion,
    status_code: u16,
    information: String,
    content_type: Option<String>,
    content_length: u64,
    date: DateTime<Utc>,
    content_encoding: Option<HttpEncoding>,
    server_name: String,
    allow: Option<Vec<HttpRequestMethod>>,
    content: Option<Bytes>,
}

impl Default for Response {
    fn default() -> Self {
        Self::new()
    }
}

impl Response {
    pub fn new() -> Self {
        Self {
            version: HttpVersion::V1_1,
            status_code: 200,
            information: "OK".to_string(),
            content_type: None,
            content_length: 0,
            date: Utc::now(),
            content_encoding: None,
            server_name: SERVER_NAME.to_string(),
            allow: None,
            content: None,
        }
    }

    fn set_date(&mut self) -> &mut Self {
        self.date = Utc::now();
        self
    }

    fn set_version(&mut self) -> &mut Self {
        self.version = HttpVersion::V1_1;
        self
    }

    fn set_server_name(&mut self) -> &mut Self {
        self.server_name = SERVER_NAME.to_string();
        self
    }

    fn set_code(&mut self, code: u16) -> &mut Self {
        self.status_code = code;
        self.information = match STATUS_CODES.get(&code) {
            Some(info) => info.to_string(),
            None => {
                error!("不支持的状态码：{}", code);
                "Unknown".to_string()
            }
        };
        self
    }

    /// 以 JSON 形式返回 `value`，客户端支持时进行压缩
    pub fn json<T: Serialize>(code: u16, value: &T, request: &Request, id: u128) -> Self {
        let body = match serde_json::to_vec(value) {
            Ok(body) => body,
            Err(e) => {
                error!("[ID{}]JSON序列化失败：{}", id, e);
                return Self::error(500, "Internal server error", request, id);
            }
        };

        let mut response = Self::new();
        response
            .set_date()
            .set_version()
            .set_server_name()
            .set_code(code);
        response.content_type = Some("application/json".to_string());

        let encoding = decide_encoding(request.accept_encoding());
        let content = match compress(body.clone(), encoding) {
            Ok(compressed) => {
                response.content_encoding = encoding;
                compressed
            }
            Err(e) => {
                error!("[ID{}]压缩失败，改为发送原始内容：{}", id, e);
                body
            }
        };
        response.content_length = content.len() as u64;
        response.content = Some(Bytes::from(content));
        response
    }

    /// 错误响应：`{"detail": message}`
    pub fn error(code: u16, message: &str, request: &Request, id: u128) -> Self {
        debug!("[ID{}]返回错误响应：{} {}", id, code, message);
        let detail = serde_json::json!({ "detail": message });
        let mut response = Self::new();
        response.set_code(code);
        let body = detail.to_string().into_bytes();
        let encoding = decide_encoding(request.accept_encoding());
        let content = match compress(body.clone(), encoding) {
            Ok(compressed) => {
                response.content_encoding = encoding;
                compressed
            }
            Err(_) => body,
        };
        response.content_type = Some("application/json".to_string());
        response.content_length = content.len() as u64;
        response.content = Some(Bytes::from(content));
        response
    }

    /// 请求无法解析时使用，不依赖 `Request`
    pub fn rejected(code: u16, message: &str) -> Self {
        let mut response = Self::new();
        response.set_code(code);
        let body = serde_json::json!({ "detail": message }).to_string();
        response.content_type = Some("application/json".to_string());
        response.content_length = body.len() as u64;
        response.content = Some(Bytes::from(body));
        response
    }

    /// CORS 预检响应
    pub fn preflight() -> Self {
        let mut response = Self::new();
        response.set_code(204);
        response.allow = Some(ALLOWED_METHODS.to_vec());
        response
    }

    pub fn as_bytes(&self) -> Vec<u8> {
        let version: &str = match self.version {
            HttpVersion::V1_1 => "HTTP/1.1",
        };
        let status_code: &str = &self.status_code.to_string();
        let information: &str = &self.information;
        let content_length: &str = &self.content_length.to_string();
        let date: &str = &format_date(&self.date);
        let server: &str = &self.server_name;
        let methods = ALLOWED_METHODS
            .iter()
            .map(|m| m.to_string())
            .collect::<Vec<_>>()
            .join(", ");

        let header = [
            version,
            " ",
            status_code,
            " ",
            information,
            CRLF,
            match &self.content_type {
                Some(t) => ["Content-Type: ", t, CRLF].concat(),
                None => "".to_string(),
            }
            .as_str(),
            match self.content_encoding {
                Some(e) => ["Content-Encoding: ", &e.to_string(), CRLF].concat(),
                None => "".to_string(),
            }
            .as_str(),
            "Content-Length: ",
            content_length,
            CRLF,
            "Date: ",
            date,
            CRLF,
            "Server: ",
            server,
            CRLF,
            "Access-Control-Allow-Origin: *",
            CRLF,
            "Access-Control-Allow-Methods: ",
            &methods,
            CRLF,
            "Access-Control-Allow-Headers: *",
            CRLF,
            match &self.allow {
                Some(a) => {
                    let allow_str = a
                        .iter()
                        .map(|m| m.to_string())
                        .collect::<Vec<_>>()
                        .join(", ");
                    ["Allow: ", &allow_str, CRLF].concat()
                }
                None => "".to_string(),
            }
            .as_str(),
            CRLF,
        ]
        .concat();
        [
            header.as_bytes(),
            match &self.content {
                Some(c) => c,
                None => b"",
            },
        ]
        .concat()
    }
}

impl Response {
    pub fn status_code(&self) -> u16 {
        self.status_code
    }

    pub fn information(&self) -> &str {
        &self.information
    }

    pub fn content_encoding(&self) -> Option<HttpEncoding> {
        self.content_encoding
    }

    pub fn content(&self) -> Option<&[u8]> {
        self.content.as_deref()
    }
}

fn compress(data: Vec<u8>, mode: Option<HttpEncoding>) -> io::Result<Vec<u8>> {
    let original_size = data.len();
    let result = match mode {
        Some(HttpEncoding::Gzip) => {
            let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
            encoder.write_all(&data)?;
            encoder.finish()
        }
        Some(HttpEncoding::Deflate) => {
            let mut encoder = DeflateEncoder::new(Vec::new(), Compression::default());
            encoder.write_all(&data)?;
            encoder.finish()
        }
        Some(HttpEncoding::Br) => {
            let params = BrotliEncoderParams::default();
            let mut output = Vec::new();
            enc::BrotliCompress(&mut io::Cursor::new(data), &mut output, &params)?;
            Ok(output)
        }
        None => Ok(data),
    };

    if let Ok(ref compressed) = result {
        debug!(
            "压缩完成: {:?}, 原始大小: {}, 压缩后: {}",
            mode,
            format_file_size(original_size as u64),
            format_file_size(compressed.len() as u64)
        );
    }

    result
}

/// 优先 gzip，其次 deflate，再次 br
fn decide_encoding(accept_encoding: &[HttpEncoding]) -> Option<HttpEncoding> {
    if accept_encoding.contains(&HttpEncoding::Gzip) {
        Some(HttpEncoding::Gzip)
    } else if accept_encoding.contains(&HttpEncoding::Deflate) {
        Some(HttpEncoding::Deflate)
    } else if accept_encoding.contains(&HttpEncoding::Br) {
        Some(HttpEncoding::Br)
    } else {
        None
    }
}
