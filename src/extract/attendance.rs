//! 考勤汇总表解析。
//!
//! 不同院校部署的表格列顺序和列数都不一致，因此对每一行依次尝试一组候选列映射，
//! 采用第一个通过校验的映射。

use log::debug;

use crate::html::{Document, Row, Table};
use crate::model::{AttendanceMap, AttendanceRecord};
use crate::util::round2;

/// 每行至少需要的单元格数：课程名 + 总数 + 出勤 + 百分比
const MIN_CELLS: usize = 4;

/// 表头中可能出现在首列的文字
const HEADER_LABELS: [&str; 2] = ["subject", "total"];

/// 一种候选列映射：总数、出勤、百分比所在的列
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnMapping {
    pub total: usize,
    pub attended: usize,
    pub percentage: usize,
}

impl ColumnMapping {
    fn at(offset: usize) -> Self {
        Self {
            total: offset,
            attended: offset + 1,
            percentage: offset + 2,
        }
    }

    /// 按该映射读取一行，数值不合法或越界时返回 `None`
    pub fn apply(&self, cells: &[String]) -> Option<AttendanceRecord> {
        let total: i64 = cells.get(self.total)?.parse().ok()?;
        let attended: i64 = cells.get(self.attended)?.parse().ok()?;
        let percentage: f64 = cells
            .get(self.percentage)?
            .replace(['%', ' '], "")
            .parse()
            .ok()?;
        if total > 0 && attended >= 0 && (0.0..=100.0).contains(&percentage) {
            Some(AttendanceRecord {
                total: u32::try_from(total).ok()?,
                attended: u32::try_from(attended).ok()?,
                percentage: round2(percentage),
            })
        } else {
            None
        }
    }
}

/// 对宽度为 `width` 的行，按顺序给出全部候选映射（首列固定为课程名）
pub fn candidate_mappings(width: usize) -> impl Iterator<Item = ColumnMapping> {
    (1..width.saturating_sub(2)).map(ColumnMapping::at)
}

fn subject_of(row: &Row) -> Option<&str> {
    let subject = row.cells.first()?.as_str();
    let lower = subject.to_lowercase();
    if subject.is_empty() || HEADER_LABELS.contains(&lower.as_str()) {
        None
    } else {
        Some(subject)
    }
}

fn parse_row(row: &Row) -> Option<(&str, AttendanceRecord)> {
    if row.cells.len() < MIN_CELLS {
        return None;
    }
    let subject = subject_of(row)?;
    candidate_mappings(row.cells.len())
        .find_map(|mapping| mapping.apply(&row.cells))
        .map(|record| (subject, record))
}

fn extract_table(table: &Table, records: &mut AttendanceMap) {
    // 首行视为表头
    for row in table.rows.iter().skip(1) {
        if let Some((subject, record)) = parse_row(row) {
            debug!("解析到课程：{} -> {:?}", subject, record);
            records.insert(subject.to_string(), record);
        }
    }
}

/// 从考勤页中提取各课程的考勤汇总。找不到任何数据时返回空表，不报错。
pub fn extract_attendance(document: &Document) -> AttendanceMap {
    let tables = document.tables();
    debug!("考勤页共有{}张表格", tables.len());
    let mut records = AttendanceMap::new();
    for table in &tables {
        extract_table(table, &mut records);
    }
    records
}
