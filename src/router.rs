// Copyright (c) 2026 shaneyale (shaneyale86@gmail.com)
// All rights reserved.

//! # 路由模块
//!
//! 将解析后的 [`Request`] 分派到 [`AttendanceService`] 的各个操作，并把结果编码为 JSON 响应。
//!
//! | 方法 | 路径 | 参数 |
//! |---|---|---|
//! | POST | `/login-and-fetch-attendance` | JSON `{college_id, password, institution_type?}` |
//! | GET | `/dateWise` | 查询参数 `username, password, institution_type?` |
//! | GET | `/getDateWiseAttendance` | 查询参数 `username, password, institution_type?` |
//! | POST | `/clear-cache` | 无 |
//! | POST | `/test-login` | 无 |
//! | GET | `/`、`/health` | 无 |
//! | OPTIONS | 任意 | CORS 预检 |

use log::{debug, info, warn};
use serde_json::{json, Value};

use crate::exception::Exception;
use crate::param::{HttpRequestMethod, InstitutionVariant};
use crate::portal::Credential;
use crate::request::Request;
use crate::response::Response;
use crate::service::{sample_attendance, AttendanceService};

/// 已识别的接口
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Root,
    Health,
    Attendance,
    DateWise,
    TillDate,
    ClearCache,
    TestLogin,
    Preflight,
}

/// 根据方法与路径识别接口。路径存在但方法不符时返回 `None`。
pub fn resolve(method: HttpRequestMethod, path: &str) -> Result<Option<Route>, Exception> {
    use HttpRequestMethod::*;

    if method == Options {
        return Ok(Some(Route::Preflight));
    }
    let (expected, route) = match path {
        "/" => (Get, Route::Root),
        "/health" => (Get, Route::Health),
        "/login-and-fetch-attendance" => (Post, Route::Attendance),
        "/dateWise" => (Get, Route::DateWise),
        "/getDateWiseAttendance" => (Get, Route::TillDate),
        "/clear-cache" => (Post, Route::ClearCache),
        "/test-login" => (Post, Route::TestLogin),
        _ => return Err(Exception::RouteNotFound),
    };
    Ok((method == expected).then_some(route))
}

fn required<'a>(value: Option<&'a str>, name: &'static str) -> Result<&'a str, Exception> {
    match value {
        Some(v) if !v.is_empty() => Ok(v),
        _ => Err(Exception::MissingParameter(name)),
    }
}

/// 从查询参数中读取凭据（逐日与累计接口）
pub fn credential_from_query(request: &Request) -> Result<Credential, Exception> {
    let username = required(request.query("username"), "username")?;
    let password = required(request.query("password"), "password")?;
    let variant = request
        .query("institution_type")
        .map(InstitutionVariant::parse_lenient)
        .unwrap_or_default();
    Ok(Credential::new(username, password, variant))
}

/// 从 JSON 请求体中读取凭据（课程考勤接口）
pub fn credential_from_body(body: &[u8]) -> Result<Credential, Exception> {
    let value: Value = serde_json::from_slice(body).map_err(|_| Exception::MalformedBody)?;
    if !value.is_object() {
        return Err(Exception::MalformedBody);
    }
    let college_id = required(value.get("college_id").and_then(Value::as_str), "college_id")?;
    let password = required(value.get("password").and_then(Value::as_str), "password")?;
    let variant = value
        .get("institution_type")
        .and_then(Value::as_str)
        .map(InstitutionVariant::parse_lenient)
        .unwrap_or_default();
    Ok(Credential::new(college_id, password, variant))
}

fn status_of(e: &Exception) -> u16 {
    match e {
        Exception::RouteNotFound => 404,
        Exception::MissingParameter(_) => 422,
        Exception::RequestTooLarge => 413,
        Exception::UnsupportedHttpVersion => 505,
        _ => 400,
    }
}

/// 请求在进入路由之前就被拒绝（超长或无法解析）时的响应
pub fn reject(e: &Exception) -> Response {
    Response::rejected(status_of(e), &e.to_string())
}

/// 处理一个请求并生成响应
pub async fn handle(request: &Request, service: &AttendanceService, id: u128) -> Response {
    let route = match resolve(request.method(), request.path()) {
        Ok(Some(route)) => route,
        Ok(None) => {
            warn!("[ID{}]方法不匹配：{} {}", id, request.method(), request.path());
            return Response::error(405, "Method Not Allowed", request, id);
        }
        Err(e) => {
            warn!("[ID{}]{}：{}", id, e, request.path());
            return Response::error(status_of(&e), &e.to_string(), request, id);
        }
    };
    debug!("[ID{}]路由：{:?}", id, route);

    match dispatch(route, request, service, id).await {
        Ok(response) => response,
        Err(e) => {
            warn!("[ID{}]请求参数错误：{}", id, e);
            Response::error(status_of(&e), &e.to_string(), request, id)
        }
    }
}

async fn dispatch(
    route: Route,
    request: &Request,
    service: &AttendanceService,
    id: u128,
) -> Result<Response, Exception> {
    let response = match route {
        Route::Preflight => Response::preflight(),
        Route::Root => Response::json(
            200,
            &json!({ "message": "College Attendance Scraper API is running" }),
            request,
            id,
        ),
        Route::Health => Response::json(200, &service.health(), request, id),
        Route::Attendance => {
            let credential = credential_from_body(request.body())?;
            info!("[ID{}]课程考勤：{} ({})", id, credential.identity, credential.variant);
            Response::json(200, &service.fetch_attendance(&credential).await, request, id)
        }
        Route::DateWise => {
            let credential = credential_from_query(request)?;
            info!("[ID{}]逐日考勤：{} ({})", id, credential.identity, credential.variant);
            Response::json(200, &service.fetch_date_wise(&credential).await, request, id)
        }
        Route::TillDate => {
            let credential = credential_from_query(request)?;
            info!("[ID{}]累计考勤：{} ({})", id, credential.identity, credential.variant);
            Response::json(200, &service.fetch_till_date(&credential).await, request, id)
        }
        Route::ClearCache => Response::json(200, &service.clear_cache(), request, id),
        Route::TestLogin => Response::json(200, &sample_attendance(), request, id),
    };
    Ok(response)
}
