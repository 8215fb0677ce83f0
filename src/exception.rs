// Copyright (c) 2026 shaneyale (shaneyale86@gmail.com)
// All rights reserved.

//! # Exception 模块
//!
//! 该模块定义了考勤服务在一次请求的生命周期中可能出现的各类异常情况。
//!
//! ## 分类
//! - **网络错误**：超时、连接失败等，由门户客户端抛出，不做自动重试。
//! - **认证错误**：登录表单缺失、凭据错误、凭据与所选院校不匹配。
//! - **页面结构错误**：历史考勤页缺少汇总计数器或考勤表。
//! - **前端协议错误**：对外 HTTP 接口收到的非法请求。
//!
//! 所有异常都只影响当前请求，不会导致进程退出。

use serde_derive::Serialize;
use std::fmt;

/// 汇总计数器定位失败时附带的 span 片段，用于排查门户页面改版
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SpanSnippet {
    pub id: String,
    pub text: String,
}

/// 服务处理请求过程中发生的异常类型。
#[derive(Debug, Clone, PartialEq)]
pub enum Exception {
    /// 与门户通信时超时。
    Timeout,
    /// 与门户通信失败（连接错误、非法响应等）。
    Network(String),
    /// 登录页中缺少必需的隐藏令牌（`__VIEWSTATE` / `__EVENTVALIDATION`）。
    AuthFormMissing,
    /// 提交凭据后仍停留在登录页。
    InvalidCredentials,
    /// 登录成功，但考勤页不包含任何考勤数据，通常是选错了院校部署。
    InvalidCredentialsForInstitution,
    /// 历史考勤页中找不到汇总计数器，附带找到的 span 片段。
    SummaryCountersNotFound(Vec<SpanSnippet>),
    /// 历史考勤页中没有任何表格。
    AttendanceTableNotFound,
    /// 客户端发送的请求字节流无法解析为合法的 UTF-8 字符串。
    RequestIsNotUtf8,
    /// 客户端使用了服务器不支持的 HTTP 方法。
    UnSupportedRequestMethod,
    /// 客户端使用了服务器不支持的 HTTP 协议版本。
    UnsupportedHttpVersion,
    /// 请求超过允许的最大字节数，对应 `413`。
    RequestTooLarge,
    /// 请求的路由不存在，对应 `404 Not Found`。
    RouteNotFound,
    /// 缺少必需的请求参数，对应 `422`。
    MissingParameter(&'static str),
    /// 请求体不是合法的 JSON，对应 `400 Bad Request`。
    MalformedBody,
}

use Exception::*;

impl Exception {
    /// 是否属于网络层错误
    pub fn is_network(&self) -> bool {
        matches!(self, Timeout | Network(_))
    }
}

impl fmt::Display for Exception {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Timeout => write!(f, "Portal request timed out. Please try again later."),
            Network(detail) => write!(f, "Network error: {}", detail),
            AuthFormMissing => write!(f, "Could not extract login form data"),
            InvalidCredentials => write!(f, "Invalid credentials"),
            InvalidCredentialsForInstitution => write!(
                f,
                "No attendance data found - invalid credentials for this institution"
            ),
            SummaryCountersNotFound(spans) => {
                write!(f, "Could not find attendance data elements. Found spans: [")?;
                for (index, span) in spans.iter().enumerate() {
                    if index > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{{id: {}, text: {}}}", span.id, span.text)?;
                }
                write!(f, "]")
            }
            AttendanceTableNotFound => write!(f, "Could not find any attendance table"),
            RequestIsNotUtf8 => write!(f, "Request bytes can't be parsed in UTF-8"),
            UnSupportedRequestMethod => write!(f, "Unsupported request method"),
            UnsupportedHttpVersion => write!(f, "Unsupported HTTP version"),
            RequestTooLarge => write!(f, "Request too large"),
            RouteNotFound => write!(f, "Route not found (404)"),
            MissingParameter(name) => write!(f, "Missing required parameter: {}", name),
            MalformedBody => write!(f, "Request body is not valid JSON (400)"),
        }
    }
}

impl std::error::Error for Exception {}

impl From<reqwest::Error> for Exception {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            Timeout
        } else {
            Network(e.to_string())
        }
    }
}
