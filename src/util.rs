use std::time::Instant;

use chrono::{DateTime, Local, NaiveDate, Utc};

/// 时间来源。
///
/// 缓存过期判断使用单调时钟 `now`，占位条目的日期使用本地日历 `today`。
/// 测试中可以替换为手动推进的实现。
pub trait Clock: Send + Sync {
    fn now(&self) -> Instant;
    fn today(&self) -> NaiveDate;
}

/// 基于系统时间的默认时钟
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }

    fn today(&self) -> NaiveDate {
        Local::now().date_naive()
    }
}

/// 四舍五入保留两位小数
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// 按门户的显示格式输出日期，例如 `05 Mar 2024`
pub fn format_portal_date(date: NaiveDate) -> String {
    date.format("%d %b %Y").to_string()
}

/// HTTP `Date` 头使用的 RFC 2822 格式
pub fn format_date(date: &DateTime<Utc>) -> String {
    date.to_rfc2822()
}

/// 将字节数格式化为便于阅读的大小
pub fn format_file_size(size: u64) -> String {
    let units = ["B", "KB", "MB", "GB", "TB"];
    let mut size = size as f64;
    let mut unit_index = 0;

    while size >= 1024.0 && unit_index < units.len() - 1 {
        size /= 1024.0;
        unit_index += 1;
    }

    format!("{:.1} {}", size, units[unit_index])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round2() {
        assert_eq!(round2(87.5), 87.5);
        assert_eq!(round2(66.666666), 66.67);
        assert_eq!(round2(0.0), 0.0);
    }

    #[test]
    fn test_portal_date_is_zero_padded() {
        let date = NaiveDate::from_ymd_opt(2024, 3, 5).unwrap();
        assert_eq!(format_portal_date(date), "05 Mar 2024");
        let date = NaiveDate::from_ymd_opt(2024, 12, 25).unwrap();
        assert_eq!(format_portal_date(date), "25 Dec 2024");
    }

    #[test]
    fn test_format_date() {
        let date = Utc::now();
        let formatted = format_date(&date);

        assert!(formatted.contains("+0000") || formatted.contains("GMT"));
    }

    #[test]
    fn test_file_size() {
        assert_eq!(format_file_size(0), "0.0 B");
        assert_eq!(format_file_size(9926), "9.7 KB");
        assert_eq!(format_file_size(1048576), "1.0 MB");
    }

    #[test]
    fn test_system_clock_is_monotonic() {
        let clock = SystemClock;
        let a = clock.now();
        let b = clock.now();
        assert!(b >= a);
    }
}
