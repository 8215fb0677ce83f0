// Copyright (c) 2026 shaneyale (shaneyale86@gmail.com)
// All rights reserved.

//! # 门户协议参数与常量模块
//!
//! 该模块集中定义了与 Accsoft 学生门户交互时所需的全部常量：
//! - 两个院校部署（college / university）的登录页与考勤页地址。
//! - 模拟浏览器所需的请求头集合。
//! - ASP.NET WebForms 登录表单的隐藏字段名与提交字段名。
//! - 历史考勤表的解析参数（固定行偏移、占位文案等）。
//! - 本服务对外暴露的 HTTP 方法、版本及编码格式的强类型枚举。

use lazy_static::lazy_static;
use std::collections::HashMap;
use serde_derive::{Deserialize, Serialize};

/// 服务器名称标识，用于 HTTP 响应头的 `Server` 字段
pub const SERVER_NAME: &str = "portal-attendance";

/// HTTP 协议规定的换行符（Carriage Return Line Feed）
pub const CRLF: &str = "\r\n";

/// college 部署的默认站点根地址
pub const COLLEGE_BASE_URL: &str = "https://portal.lnct.ac.in";

/// university 部署的默认站点根地址
pub const UNIVERSITY_BASE_URL: &str = "https://accsoft.lnctu.ac.in";

/// 登录页相对路径
pub const LOGIN_PATH: &str = "/Accsoft2/StudentLogin.aspx";

/// 考勤页相对路径
pub const ATTENDANCE_PATH: &str = "/Accsoft2/Parents/StuAttendanceStatus.aspx";

/// 用于判断是否仍停留在登录页的路径片段（小写比较）
pub const LOGIN_PAGE_MARKER: &str = "studentlogin.aspx";

/// 单次门户请求允许的最长等待时间（秒）
pub const MAX_REQUEST_TIMEOUT_SECS: u64 = 10;

// --- 登录表单字段 ---

pub const FIELD_VIEWSTATE: &str = "__VIEWSTATE";
pub const FIELD_VIEWSTATE_GENERATOR: &str = "__VIEWSTATEGENERATOR";
pub const FIELD_EVENT_VALIDATION: &str = "__EVENTVALIDATION";
pub const FIELD_EVENT_TARGET: &str = "__EVENTTARGET";
pub const FIELD_EVENT_ARGUMENT: &str = "__EVENTARGUMENT";
pub const FIELD_LAST_FOCUS: &str = "__LASTFOCUS";
pub const FIELD_LOGIN_TYPE: &str = "ctl00$cph1$rdbtnlType";
pub const FIELD_USERNAME: &str = "ctl00$cph1$txtStuUser";
pub const FIELD_PASSWORD: &str = "ctl00$cph1$txtStuPsw";
pub const FIELD_LOGIN_BUTTON: &str = "ctl00$cph1$btnStuLogin";

/// 单选框取值 `2` 表示“学生登录”
pub const STUDENT_LOGIN_TYPE: &str = "2";

/// 登录按钮的提交值，门户会校验该文本
pub const LOGIN_BUTTON_TEXT: &str = "Login »";

// --- 历史考勤表 ---

/// 总课时计数器的完整元素 ID
pub const TOTAL_PERIOD_ID: &str = "ctl00_ContentPlaceHolder1_lbltotperiod";

/// “不适用”课时计数器的完整元素 ID
pub const NOT_APPLICABLE_ID: &str = "ctl00_ContentPlaceHolder1_lbltotaln";

/// 历史考勤表中数据行的起始下标。
///
/// 门户在表格顶部渲染了固定的 24 行横幅/表头区域。该常量与门户的页面布局强耦合，
/// 页面改版时需要同步调整。
pub const HISTORY_ROW_OFFSET: usize = 24;

/// 无论计数器给出多少行，至少扫描的行数
pub const HISTORY_MIN_SCAN_ROWS: usize = 10;

/// 行数超过该值的表格被优先视为考勤日志表
pub const HISTORY_TABLE_MIN_ROWS: usize = 20;

/// 学期尚未开始时占位条目使用的文案
pub const SEMESTER_NOT_BEGUN: &str = "Classes for this semester is yet to begin";

/// 诊断信息中最多携带的 span 片段数量
pub const MAX_DIAGNOSTIC_SPANS: usize = 10;

lazy_static! {
    /// 模拟真实浏览器的基础请求头。
    ///
    /// `Accept-Encoding` 只声明 gzip 与 deflate，HTTP 客户端可以透明解压这两种格式。
    pub static ref BROWSER_HEADERS: Vec<(&'static str, &'static str)> = {
        vec![
            (
                "User-Agent",
                "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36",
            ),
            (
                "Accept",
                "text/html,application/xhtml+xml,application/xml;q=0.9,image/webp,*/*;q=0.8",
            ),
            ("Accept-Language", "en-US,en;q=0.5"),
            ("Accept-Encoding", "gzip, deflate"),
            ("Connection", "keep-alive"),
            ("Upgrade-Insecure-Requests", "1"),
        ]
    };
}

lazy_static! {
    /// 出现任一关键字即认为页面属于考勤领域
    pub static ref ATTENDANCE_KEYWORDS: Vec<&'static str> = {
        vec![
            "attendance",
            "subject",
            "percentage",
            "present",
            "absent",
            "total classes",
        ]
    };
}

lazy_static! {
    /// 计数器回退扫描时，用于识别相关 span 的关键字
    pub static ref COUNTER_KEYWORDS: Vec<&'static str> = {
        vec!["total", "period", "lecture", "attendance"]
    };
}

lazy_static! {
    /// 对外接口会用到的 HTTP 状态码及其原因短语
    pub static ref STATUS_CODES: HashMap<u16, &'static str> = {
        let mut map = HashMap::new();
        map.insert(200, "OK");
        map.insert(204, "No Content");

        map.insert(400, "Bad Request");
        map.insert(404, "Not Found");
        map.insert(405, "Method Not Allowed");
        map.insert(413, "Payload Too Large");
        map.insert(422, "Unprocessable Entity");

        map.insert(500, "Internal Server Error");
        map.insert(505, "HTTP Version Not Supported");
        map
    };
}

lazy_static! {
    /// 服务器当前允许处理的 HTTP 方法列表。
    pub static ref ALLOWED_METHODS: Vec<HttpRequestMethod> = {
        vec![
            HttpRequestMethod::Get,
            HttpRequestMethod::Post,
            HttpRequestMethod::Options,
        ]
    };
}

/// 门户的两种部署形态，决定登录页与考勤页的地址
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InstitutionVariant {
    #[default]
    College,
    University,
}

impl InstitutionVariant {
    /// 宽松解析：除 `university` 以外的取值一律视为 college
    pub fn parse_lenient(value: &str) -> Self {
        if value.trim().eq_ignore_ascii_case("university") {
            InstitutionVariant::University
        } else {
            InstitutionVariant::College
        }
    }
}

/// 结果缓存的查询类别，每个类别对应一个独立的存储区
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CacheKind {
    Attendance,
    DateWise,
    TillDate,
}

impl CacheKind {
    pub const ALL: [CacheKind; 3] = [CacheKind::Attendance, CacheKind::DateWise, CacheKind::TillDate];
}

/// 支持的 HTTP 协议版本
#[derive(Debug, Clone, Copy)]
pub enum HttpVersion {
    /// HTTP/1.1 版本
    V1_1,
}

/// 标准 HTTP 请求方法
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum HttpRequestMethod {
    /// 获取资源
    Get,
    /// 查询服务器支持的选项（CORS 预检）
    Options,
    /// 提交数据或执行操作
    Post,
}

/// 支持的内容编码（压缩）格式
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum HttpEncoding {
    /// GNU zip 压缩
    Gzip,
    /// zlib 压缩
    Deflate,
    /// Brotli 压缩
    Br,
}

use std::fmt;

impl fmt::Display for InstitutionVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            InstitutionVariant::College => write!(f, "college"),
            InstitutionVariant::University => write!(f, "university"),
        }
    }
}

impl fmt::Display for CacheKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            CacheKind::Attendance => write!(f, "attendance"),
            CacheKind::DateWise => write!(f, "datewise"),
            CacheKind::TillDate => write!(f, "tilldate"),
        }
    }
}

impl fmt::Display for HttpVersion {
    /// 将枚举格式化为 HTTP 报文中的版本字符串
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            HttpVersion::V1_1 => write!(f, "1.1"),
        }
    }
}

impl fmt::Display for HttpRequestMethod {
    /// 将枚举格式化为 HTTP 标准大写方法名
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            HttpRequestMethod::Get => write!(f, "GET"),
            HttpRequestMethod::Options => write!(f, "OPTIONS"),
            HttpRequestMethod::Post => write!(f, "POST"),
        }
    }
}

impl fmt::Display for HttpEncoding {
    /// 将枚举格式化为 `Content-Encoding` 头所使用的标识符
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            HttpEncoding::Gzip => write!(f, "gzip"),
            HttpEncoding::Deflate => write!(f, "deflate"),
            HttpEncoding::Br => write!(f, "br"),
        }
    }
}
