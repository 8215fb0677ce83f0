// Copyright (c) 2026 shaneyale (shaneyale86@gmail.com)
// All rights reserved.

//! # 门户认证客户端
//!
//! 模拟浏览器完成 ASP.NET WebForms 的两步登录：
//! 1. GET 登录页，取出隐藏令牌 `__VIEWSTATE`、`__VIEWSTATEGENERATOR`、`__EVENTVALIDATION`。
//! 2. 携带令牌与凭据 POST 回登录页，跟随重定向。
//! 3. 以登录页为 `Referer` 请求考勤页，并粗略校验页面确实包含考勤数据。
//!
//! 每次调用都打开新的会话，会话在返回前被丢弃。凭据不会被记录或持久化。

use std::fmt;
use std::sync::Arc;

use log::{debug, info, warn};

use crate::config::Config;
use crate::exception::Exception;
use crate::html::Document;
use crate::net::Connector;
use crate::param::*;

/// 登录凭据，只在单个请求内存活
#[derive(Clone)]
pub struct Credential {
    pub identity: String,
    pub secret: String,
    pub variant: InstitutionVariant,
}

impl Credential {
    pub fn new(identity: impl Into<String>, secret: impl Into<String>, variant: InstitutionVariant) -> Self {
        Self {
            identity: identity.into(),
            secret: secret.into(),
            variant,
        }
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("identity", &self.identity)
            .field("secret", &"***")
            .field("variant", &self.variant)
            .finish()
    }
}

/// 登录页中的三个隐藏令牌
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginForm {
    pub viewstate: String,
    pub viewstate_generator: String,
    pub event_validation: String,
}

impl LoginForm {
    /// 从登录页提取令牌。`__VIEWSTATE` 与 `__EVENTVALIDATION` 必须存在，
    /// `__VIEWSTATEGENERATOR` 缺失时按空串处理。
    pub fn parse(document: &Document) -> Result<Self, Exception> {
        let viewstate = document.input_value(FIELD_VIEWSTATE);
        let event_validation = document.input_value(FIELD_EVENT_VALIDATION);
        match (viewstate, event_validation) {
            (Some(viewstate), Some(event_validation)) => Ok(Self {
                viewstate,
                viewstate_generator: document
                    .input_value(FIELD_VIEWSTATE_GENERATOR)
                    .unwrap_or_default(),
                event_validation,
            }),
            _ => Err(Exception::AuthFormMissing),
        }
    }

    /// 消费令牌，生成提交给门户的表单字段
    pub fn into_fields(self, credential: &Credential) -> Vec<(&'static str, String)> {
        vec![
            (FIELD_VIEWSTATE, self.viewstate),
            (FIELD_EVENT_VALIDATION, self.event_validation),
            (FIELD_VIEWSTATE_GENERATOR, self.viewstate_generator),
            (FIELD_LOGIN_TYPE, STUDENT_LOGIN_TYPE.to_string()),
            (FIELD_USERNAME, credential.identity.clone()),
            (FIELD_PASSWORD, credential.secret.clone()),
            (FIELD_LOGIN_BUTTON, LOGIN_BUTTON_TEXT.to_string()),
            (FIELD_EVENT_TARGET, String::new()),
            (FIELD_EVENT_ARGUMENT, String::new()),
            (FIELD_LAST_FOCUS, String::new()),
        ]
    }
}

/// 登录后取得的考勤页原文
#[derive(Debug, Clone, PartialEq)]
pub struct AttendancePage {
    pub url: String,
    pub html: String,
}

impl AttendancePage {
    pub fn document(&self) -> Document {
        Document::parse(&self.html)
    }
}

fn is_login_page(url: &str) -> bool {
    url.to_lowercase().contains(LOGIN_PAGE_MARKER)
}

/// 去掉 `%` 与 `.` 后是否为非空纯数字
fn looks_numeric(text: &str) -> bool {
    let digits: String = text.chars().filter(|c| *c != '%' && *c != '.').collect();
    !digits.is_empty() && digits.chars().all(|c| c.is_ascii_digit())
}

/// 页面是否像一张考勤页：出现考勤关键字，或某张表的数据行含有数字单元格
pub fn looks_like_attendance_page(document: &Document) -> bool {
    let text = document.text().to_lowercase();
    if ATTENDANCE_KEYWORDS.iter().any(|k| text.contains(k)) {
        return true;
    }
    document.tables().iter().any(|table| {
        table
            .rows
            .iter()
            .skip(1)
            .filter(|row| row.cells.len() >= 3)
            .any(|row| row.cells.iter().any(|cell| looks_numeric(cell)))
    })
}

/// 门户认证客户端
#[derive(Clone)]
pub struct PortalClient {
    connector: Arc<dyn Connector>,
    config: Arc<Config>,
}

impl PortalClient {
    pub fn new(connector: Arc<dyn Connector>, config: Arc<Config>) -> Self {
        Self { connector, config }
    }

    /// 完成登录并返回考勤页
    pub async fn login(&self, credential: &Credential) -> Result<AttendancePage, Exception> {
        let (login_url, attendance_url) = self.config.endpoints(credential.variant);
        let mut session = self.connector.connect()?;
        info!("开始登录门户：{} ({})", credential.identity, credential.variant);

        // 1. 取登录页中的隐藏令牌
        let login_page = session.get(&login_url, None).await?;
        let form = LoginForm::parse(&Document::parse(&login_page.body))?;
        debug!("已取得登录表单令牌");

        // 2. 提交凭据
        let submitted = session
            .post_form(&login_url, &form.into_fields(credential))
            .await?;
        if is_login_page(&submitted.url) {
            warn!("登录失败，仍停留在登录页：{}", credential.identity);
            return Err(Exception::InvalidCredentials);
        }

        // 3. 访问考勤页
        let attendance = session.get(&attendance_url, Some(&login_url)).await?;
        if is_login_page(&attendance.url) {
            warn!("访问考勤页时被重定向回登录页：{}", credential.identity);
            return Err(Exception::InvalidCredentials);
        }

        if !looks_like_attendance_page(&Document::parse(&attendance.body)) {
            warn!("考勤页中没有考勤数据，可能选错了院校：{}", credential.identity);
            return Err(Exception::InvalidCredentialsForInstitution);
        }

        info!("登录成功：{}", credential.identity);
        Ok(AttendancePage {
            url: attendance.url,
            html: attendance.body,
        })
    }
}
