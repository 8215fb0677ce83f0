// Copyright (c) 2026 shaneyale (shaneyale86@gmail.com)
// All rights reserved.

//! # 页面解析器
//!
//! - [`attendance`]：考勤汇总表 → 课程考勤。
//! - [`history`]：历史考勤日志 → 逐日视图与累计视图。
//!
//! 解析器都是文档内容的纯函数，不访问网络，也不读写缓存。

pub mod attendance;
pub mod history;

pub use attendance::extract_attendance;
pub use history::{extract_cumulative, extract_history};
