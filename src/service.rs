// Copyright (c) 2026 shaneyale (shaneyale86@gmail.com)
// All rights reserved.

//! # 服务门面
//!
//! 对外提供四个操作：课程考勤、逐日考勤、累计考勤、清空缓存。
//! 处理流程：缓存查询 → (未命中) 登录门户 → 解析页面 → 写入缓存 → 返回结果。
//!
//! 所有操作都不会向调用方返回 `Err`，失败以 `success=false` 的结果返回；
//! 失败的抓取不会修改缓存中已有的数据。

use std::sync::Arc;

use chrono::Local;
use log::{error, info, warn};

use crate::cache::ResultCache;
use crate::exception::Exception;
use crate::extract::{extract_attendance, extract_cumulative, extract_history};
use crate::model::*;
use crate::param::CacheKind;
use crate::portal::{Credential, PortalClient};
use crate::util::Clock;

pub struct AttendanceService {
    cache: Arc<ResultCache>,
    portal: PortalClient,
    clock: Arc<dyn Clock>,
}

fn failure_message(context: &str, e: &Exception) -> String {
    if e.is_network() {
        e.to_string()
    } else {
        format!("{}: {}", context, e)
    }
}

impl AttendanceService {
    pub fn new(cache: Arc<ResultCache>, portal: PortalClient, clock: Arc<dyn Clock>) -> Self {
        Self {
            cache,
            portal,
            clock,
        }
    }

    fn cached_message(&self, what: &str) -> String {
        format!(
            "{} retrieved from cache (less than {} hours old)",
            what,
            self.cache.ttl().as_secs() / 3600
        )
    }

    /// 课程考勤汇总
    pub async fn fetch_attendance(&self, credential: &Credential) -> ApiResult<AttendanceMap> {
        if let Some(payload) = self.cache.get(&credential.identity, CacheKind::Attendance) {
            if let Payload::Attendance(map) = payload.as_ref() {
                return ApiResult::ok(self.cached_message("Attendance data"), map.clone());
            }
        }
        info!("缓存未命中，重新抓取：{} - attendance", credential.identity);

        let ticket = self.cache.generation();
        let page = match self.portal.login(credential).await {
            Ok(page) => page,
            Err(e) => {
                error!("抓取课程考勤失败：{}：{}", credential.identity, e);
                return ApiResult::failed(failure_message("General error", &e));
            }
        };

        let records = extract_attendance(&page.document());
        if records.is_empty() {
            warn!("考勤页中没有可解析的考勤表：{}", credential.identity);
            return ApiResult::ok(
                "No attendance data found on the page. The page structure may have changed.",
                records,
            );
        }

        info!("解析到{}门课程：{}", records.len(), credential.identity);
        self.cache.put_since(
            ticket,
            &credential.identity,
            CacheKind::Attendance,
            Payload::Attendance(records.clone()),
        );
        ApiResult::ok("Attendance data fetched successfully", records)
    }

    /// 逐日考勤，正序与倒序两种视图
    pub async fn fetch_date_wise(&self, credential: &Credential) -> ApiResult<DateWiseHistory> {
        if let Some(payload) = self.cache.get(&credential.identity, CacheKind::DateWise) {
            if let Payload::DateWise(history) = payload.as_ref() {
                return ApiResult::ok(self.cached_message("Date-wise attendance"), history.clone());
            }
        }
        info!("缓存未命中，重新抓取：{} - datewise", credential.identity);

        let ticket = self.cache.generation();
        let extracted = match self.portal.login(credential).await {
            Ok(page) => extract_history(&page.document(), self.clock.today()),
            Err(e) => Err(e),
        };
        match extracted {
            Ok(history) => {
                self.cache.put_since(
                    ticket,
                    &credential.identity,
                    CacheKind::DateWise,
                    Payload::DateWise(history.clone()),
                );
                ApiResult::ok("Date-wise attendance retrieved successfully", history)
            }
            Err(e) => {
                error!("抓取逐日考勤失败：{}：{}", credential.identity, e);
                ApiResult::failed(failure_message("Failed to retrieve date-wise attendance", &e))
            }
        }
    }

    /// 截至每一天的累计出勤
    pub async fn fetch_till_date(&self, credential: &Credential) -> ApiResult<Vec<CumulativeEntry>> {
        if let Some(payload) = self.cache.get(&credential.identity, CacheKind::TillDate) {
            if let Payload::TillDate(entries) = payload.as_ref() {
                return ApiResult::ok(self.cached_message("Till-date attendance"), entries.clone());
            }
        }
        info!("缓存未命中，重新抓取：{} - tilldate", credential.identity);

        let ticket = self.cache.generation();
        let extracted = match self.portal.login(credential).await {
            Ok(page) => extract_cumulative(&page.document(), self.clock.today()),
            Err(e) => Err(e),
        };
        match extracted {
            Ok(entries) => {
                self.cache.put_since(
                    ticket,
                    &credential.identity,
                    CacheKind::TillDate,
                    Payload::TillDate(entries.clone()),
                );
                ApiResult::ok("Till-date attendance retrieved successfully", entries)
            }
            Err(e) => {
                error!("抓取累计考勤失败：{}：{}", credential.identity, e);
                ApiResult::failed(failure_message("Failed to retrieve till-date attendance", &e))
            }
        }
    }

    /// 清空全部缓存
    pub fn clear_cache(&self) -> ClearResult {
        let cleared_entries = self.cache.clear();
        info!("缓存已清空：{:?}", cleared_entries);
        ClearResult {
            success: true,
            message: "All caches cleared successfully".to_string(),
            cleared_entries,
        }
    }

    /// 服务健康状态与缓存统计
    pub fn health(&self) -> HealthReport {
        let hours = self.cache.ttl().as_secs() / 3600;
        HealthReport {
            status: "healthy".to_string(),
            message: format!("API is running with {}-hour caching", hours),
            cache_info: CacheStats {
                attendance_cache_entries: self.cache.len(CacheKind::Attendance),
                datewise_cache_entries: self.cache.len(CacheKind::DateWise),
                tilldate_cache_entries: self.cache.len(CacheKind::TillDate),
                cache_duration_hours: hours,
                server_time: Local::now().to_rfc3339(),
            },
        }
    }
}

/// 不访问门户的演示数据，供客户端联调使用
pub fn sample_attendance() -> ApiResult<AttendanceMap> {
    let rows: [(&str, u32, u32, f64); 10] = [
        ("ADA", 40, 35, 87.50),
        ("COA", 45, 34, 75.56),
        ("Mathematics-III", 48, 42, 87.50),
        ("Operating Systems", 42, 38, 90.48),
        ("Database Management Systems", 44, 40, 90.91),
        ("Software Engineering", 38, 32, 84.21),
        ("Computer Networks", 36, 30, 83.33),
        ("Data Structures Lab", 24, 22, 91.67),
        ("Web Technology", 32, 28, 87.50),
        ("Python Programming", 36, 33, 91.67),
    ];
    let data = rows
        .iter()
        .map(|(subject, total, attended, percentage)| {
            (
                subject.to_string(),
                AttendanceRecord {
                    total: *total,
                    attended: *attended,
                    percentage: *percentage,
                },
            )
        })
        .collect();
    ApiResult::ok("Test login successful - dummy data", data)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sample_attendance() {
        let result = sample_attendance();
        assert!(result.success);
        let data = result.data.unwrap();
        assert_eq!(data.len(), 10);
        assert_eq!(data["COA"].percentage, 75.56);
    }

    #[test]
    fn test_failure_message_context() {
        assert_eq!(
            failure_message("Failed to retrieve date-wise attendance", &Exception::InvalidCredentials),
            "Failed to retrieve date-wise attendance: Invalid credentials"
        );
        assert!(failure_message("General error", &Exception::Timeout).contains("timed out"));
        assert!(failure_message("General error", &Exception::Network("refused".into()))
            .starts_with("Network error"));
    }
}
