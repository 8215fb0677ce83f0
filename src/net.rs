// Copyright (c) 2026 shaneyale (shaneyale86@gmail.com)
// All rights reserved.

//! # 网络传输层
//!
//! 门户客户端通过两个 trait 访问网络：
//! - [`Connector`]：为每次登录打开一个全新的会话，会话之间不共享 Cookie。
//! - [`HttpSession`]：带 Cookie 的 GET / 表单 POST，请求自动跟随重定向。
//!
//! 默认实现基于 `reqwest`，测试中可替换为脚本化的假实现。

use std::time::Duration;

use async_trait::async_trait;
use log::debug;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, REFERER};

use crate::exception::Exception;
use crate::param::BROWSER_HEADERS;

/// 门户返回的页面：跟随重定向后的最终地址与正文
#[derive(Debug, Clone, PartialEq)]
pub struct PortalResponse {
    pub url: String,
    pub body: String,
}

/// 一次登录尝试所使用的会话（Cookie 罐 + 基础请求头）
#[async_trait]
pub trait HttpSession: Send {
    async fn get(&mut self, url: &str, referer: Option<&str>) -> Result<PortalResponse, Exception>;

    async fn post_form(
        &mut self,
        url: &str,
        form: &[(&'static str, String)],
    ) -> Result<PortalResponse, Exception>;
}

/// 会话工厂
pub trait Connector: Send + Sync {
    fn connect(&self) -> Result<Box<dyn HttpSession>, Exception>;
}

/// 基于 `reqwest` 的连接器
#[derive(Debug, Clone)]
pub struct ReqwestConnector {
    timeout: Duration,
}

impl ReqwestConnector {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }
}

fn browser_header_map() -> Result<HeaderMap, Exception> {
    let mut headers = HeaderMap::new();
    for (name, value) in BROWSER_HEADERS.iter() {
        let name = HeaderName::from_bytes(name.as_bytes())
            .map_err(|e| Exception::Network(format!("invalid header name '{}': {}", name, e)))?;
        let value = HeaderValue::from_str(value)
            .map_err(|e| Exception::Network(format!("invalid header value '{}': {}", value, e)))?;
        headers.insert(name, value);
    }
    Ok(headers)
}

impl Connector for ReqwestConnector {
    fn connect(&self) -> Result<Box<dyn HttpSession>, Exception> {
        let client = reqwest::Client::builder()
            .cookie_store(true)
            .default_headers(browser_header_map()?)
            .timeout(self.timeout)
            .build()?;
        Ok(Box::new(ReqwestSession { client }))
    }
}

struct ReqwestSession {
    client: reqwest::Client,
}

impl ReqwestSession {
    async fn finish(response: reqwest::Response) -> Result<PortalResponse, Exception> {
        let url = response.url().to_string();
        let status = response.status();
        debug!("门户响应：{} {}", status, url);
        let body = response.text().await?;
        Ok(PortalResponse { url, body })
    }
}

#[async_trait]
impl HttpSession for ReqwestSession {
    async fn get(&mut self, url: &str, referer: Option<&str>) -> Result<PortalResponse, Exception> {
        let mut request = self.client.get(url);
        if let Some(referer) = referer {
            request = request.header(REFERER, referer);
        }
        let response = request.send().await?;
        Self::finish(response).await
    }

    async fn post_form(
        &mut self,
        url: &str,
        form: &[(&'static str, String)],
    ) -> Result<PortalResponse, Exception> {
        let response = self.client.post(url).form(form).send().await?;
        Self::finish(response).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_browser_header_map_is_valid() {
        let headers = browser_header_map().unwrap();
        assert_eq!(headers.get("accept-encoding").unwrap(), "gzip, deflate");
        assert_eq!(headers.get("connection").unwrap(), "keep-alive");
        assert!(headers
            .get("user-agent")
            .unwrap()
            .to_str()
            .unwrap()
            .starts_with("Mozilla/5.0"));
    }

    #[test]
    fn test_connector_opens_independent_sessions() {
        let connector = ReqwestConnector::new(Duration::from_secs(5));
        assert!(connector.connect().is_ok());
        assert!(connector.connect().is_ok());
    }
}
