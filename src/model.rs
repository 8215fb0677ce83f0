// Copyright (c) 2026 shaneyale (shaneyale86@gmail.com)
// All rights reserved.

//! # 数据模型
//!
//! 解析器输出与缓存、对外接口共享的强类型结构。所有结构都能直接序列化为
//! 与原有移动端约定一致的 JSON。

use std::collections::BTreeMap;

use serde::ser::{Serialize, SerializeMap, Serializer};
use serde_derive::Serialize;

/// 单门课程的考勤汇总
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct AttendanceRecord {
    pub total: u32,
    pub attended: u32,
    /// 0 到 100 之间，保留两位小数
    pub percentage: f64,
}

/// 课程名 → 考勤汇总
pub type AttendanceMap = BTreeMap<String, AttendanceRecord>;

/// 某一节课的记录：课程名（或说明文字）→ 出勤状态
#[derive(Debug, Clone, PartialEq)]
pub struct LectureMark {
    pub label: String,
    pub status: String,
}

impl LectureMark {
    pub fn new(label: impl Into<String>, status: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            status: status.into(),
        }
    }
}

// 序列化为单键对象 `{"ADA": "P"}`
impl Serialize for LectureMark {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(1))?;
        map.serialize_entry(&self.label, &self.status)?;
        map.end()
    }
}

/// 某一天的全部课程记录
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DateEntry {
    /// 门户原样显示的日期字符串，不做标准化
    pub date: String,
    pub data: Vec<LectureMark>,
}

/// 截至某一天的累计出勤
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CumulativeEntry {
    pub date: String,
    pub present: u32,
    pub total_lectures: u32,
    pub percentage: f64,
}

/// 按日期分组的考勤历史，正序与倒序两种视图
#[derive(Debug, Clone, PartialEq)]
pub struct DateWiseHistory {
    pub forward: Vec<DateEntry>,
    pub backward: Vec<DateEntry>,
}

// 对外格式为二元数组 `[forward, backward]`
impl Serialize for DateWiseHistory {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        (&self.forward, &self.backward).serialize(serializer)
    }
}

/// 缓存中保存的载荷
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    Attendance(AttendanceMap),
    DateWise(DateWiseHistory),
    TillDate(Vec<CumulativeEntry>),
}

/// 服务门面的统一返回结构。`success=false` 是正常返回值而不是错误。
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ApiResult<T> {
    pub success: bool,
    pub message: String,
    pub data: Option<T>,
}

impl<T> ApiResult<T> {
    pub fn ok(message: impl Into<String>, data: T) -> Self {
        Self {
            success: true,
            message: message.into(),
            data: Some(data),
        }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            data: None,
        }
    }
}

/// 清空缓存前各存储区的条目数
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ClearedCounts {
    pub attendance: usize,
    pub datewise: usize,
    pub tilldate: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClearResult {
    pub success: bool,
    pub message: String,
    pub cleared_entries: ClearedCounts,
}

/// 缓存运行状态
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CacheStats {
    pub attendance_cache_entries: usize,
    pub datewise_cache_entries: usize,
    pub tilldate_cache_entries: usize,
    pub cache_duration_hours: u64,
    pub server_time: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HealthReport {
    pub status: String,
    pub message: String,
    pub cache_info: CacheStats,
}
