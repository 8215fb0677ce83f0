//! 历史考勤（逐日 / 累计）解析。
//!
//! 历史页顶部有两个汇总计数器（总课时与不适用课时），二者之和决定需要扫描的行数。
//! 日志表的数据从固定的第 24 行开始，每行的第 1、3、4 列分别是日期、课程、出勤状态。

use std::collections::HashMap;

use chrono::NaiveDate;
use lazy_static::lazy_static;
use log::{debug, warn};
use regex::Regex;

use crate::exception::{Exception, SpanSnippet};
use crate::html::{Document, Table};
use crate::model::{CumulativeEntry, DateEntry, DateWiseHistory, LectureMark};
use crate::param::*;
use crate::util::{format_portal_date, round2};

lazy_static! {
    // "Total Period : 50" 中第一个冒号之后、下一个冒号之前的部分
    static ref COUNTER_VALUE: Regex = Regex::new(r"^[^:]*:([^:]*)").expect("静态正则");
}

const TOTAL_PERIOD_FRAGMENTS: [&str; 2] = ["lbltotperiod", "totperiod"];
const NOT_APPLICABLE_FRAGMENTS: [&str; 2] = ["lbltotaln", "totaln"];

/// 汇总计数器
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SummaryCounters {
    pub total: usize,
    pub not_applicable: usize,
}

impl SummaryCounters {
    pub fn total_rows(&self) -> usize {
        self.total.saturating_add(self.not_applicable)
    }
}

/// 解析 `"label : N"` 形式的计数，没有冒号或无法解析时为 0
pub fn parse_counter(text: &str) -> usize {
    COUNTER_VALUE
        .captures(text)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().trim().parse().ok())
        .unwrap_or(0)
}

fn find_counter(document: &Document, exact_id: &str, fragments: &[&str]) -> Option<String> {
    document.span_text_by_id(exact_id).or_else(|| {
        fragments
            .iter()
            .find_map(|fragment| document.span_text_by_id_fragment(fragment))
    })
}

fn has_counter_value(text: &str) -> bool {
    COUNTER_VALUE
        .captures(text)
        .and_then(|caps| caps.get(1))
        .is_some_and(|m| m.as_str().trim().parse::<usize>().is_ok())
}

/// 最后的回退：在所有 span 中按关键字寻找带计数的文本
fn scan_counters(spans: &[SpanSnippet]) -> Option<SummaryCounters> {
    let counted: Vec<(&SpanSnippet, String)> = spans
        .iter()
        .filter(|s| has_counter_value(&s.text))
        .map(|s| (s, s.text.to_lowercase()))
        .collect();
    let not_applicable = counted
        .iter()
        .find(|(_, lower)| lower.contains("not applicable"))
        .map(|(s, _)| parse_counter(&s.text))
        .unwrap_or(0);
    counted
        .iter()
        .filter(|(_, lower)| !lower.contains("not applicable"))
        .find(|(_, lower)| COUNTER_KEYWORDS.iter().any(|k| lower.contains(k)))
        .map(|(s, _)| SummaryCounters {
            total: parse_counter(&s.text),
            not_applicable,
        })
}

fn diagnostics(spans: &[SpanSnippet]) -> Vec<SpanSnippet> {
    let relevant: Vec<SpanSnippet> = spans
        .iter()
        .filter(|s| {
            let lower = s.text.to_lowercase();
            COUNTER_KEYWORDS.iter().any(|k| lower.contains(k))
        })
        .take(MAX_DIAGNOSTIC_SPANS)
        .cloned()
        .collect();
    let snippets = if relevant.is_empty() {
        spans.iter().take(MAX_DIAGNOSTIC_SPANS).cloned().collect()
    } else {
        relevant
    };
    snippets
        .into_iter()
        .map(|s| SpanSnippet {
            id: s.id,
            text: s.text.chars().take(50).collect(),
        })
        .collect()
}

/// 定位汇总计数器：完整 ID → ID 片段 → 关键字扫描
pub fn locate_counters(document: &Document) -> Result<SummaryCounters, Exception> {
    let total = find_counter(document, TOTAL_PERIOD_ID, &TOTAL_PERIOD_FRAGMENTS);
    let not_applicable = find_counter(document, NOT_APPLICABLE_ID, &NOT_APPLICABLE_FRAGMENTS);
    if let (Some(total), Some(not_applicable)) = (&total, &not_applicable) {
        debug!("汇总计数器：{} / {}", total, not_applicable);
        return Ok(SummaryCounters {
            total: parse_counter(total),
            not_applicable: parse_counter(not_applicable),
        });
    }

    let spans = document.spans();
    match scan_counters(&spans) {
        Some(counters) => {
            warn!("未找到汇总计数器元素，使用关键字回退：{:?}", counters);
            Ok(counters)
        }
        None => {
            warn!("页面中共有{}个span，均不包含汇总计数", spans.len());
            Err(Exception::SummaryCountersNotFound(diagnostics(&spans)))
        }
    }
}

/// 选出考勤日志表：优先第一张超过 20 行的表，否则取行数最多的表
pub fn select_log_table(tables: &[Table]) -> Option<&Table> {
    tables
        .iter()
        .find(|t| t.row_count() > HISTORY_TABLE_MIN_ROWS)
        .or_else(|| {
            tables
                .iter()
                .reduce(|best, t| if t.row_count() > best.row_count() { t } else { best })
        })
}

/// 日志表中的一节课
#[derive(Debug, Clone, PartialEq)]
struct LectureRow<'a> {
    date: &'a str,
    label: &'a str,
    status: &'a str,
}

fn lecture_rows(table: &Table, total_rows: usize) -> Vec<LectureRow<'_>> {
    let end = HISTORY_ROW_OFFSET
        .saturating_add(total_rows.max(HISTORY_MIN_SCAN_ROWS))
        .min(table.row_count());
    debug!("扫描第{}行到第{}行", HISTORY_ROW_OFFSET, end);
    table
        .rows
        .get(HISTORY_ROW_OFFSET..end)
        .unwrap_or_default()
        .iter()
        .filter(|row| row.data_cells.len() >= 5)
        .map(|row| LectureRow {
            date: &row.data_cells[1],
            label: &row.data_cells[3],
            status: &row.data_cells[4],
        })
        .collect()
}

fn load_rows(document: &Document) -> Result<Vec<(String, String, String)>, Exception> {
    let counters = locate_counters(document)?;
    let tables = document.tables();
    let table = select_log_table(&tables).ok_or(Exception::AttendanceTableNotFound)?;
    Ok(lecture_rows(table, counters.total_rows())
        .into_iter()
        .map(|r| (r.date.to_string(), r.label.to_string(), r.status.to_string()))
        .collect())
}

/// 逐日视图：同一日期的多节课追加到同一条目中
fn group_by_date(rows: &[(String, String, String)]) -> Vec<DateEntry> {
    let mut entries: Vec<DateEntry> = Vec::new();
    let mut index: HashMap<&str, usize> = HashMap::new();
    for (date, label, status) in rows {
        if date.is_empty() || label.is_empty() {
            continue;
        }
        let mark = LectureMark::new(label.as_str(), status.as_str());
        match index.get(date.as_str()) {
            Some(&i) => entries[i].data.push(mark),
            None => {
                index.insert(date, entries.len());
                entries.push(DateEntry {
                    date: date.clone(),
                    data: vec![mark],
                });
            }
        }
    }
    entries
}

/// 累计视图：同一日期再次出现时用当前的累计值覆盖该日期的条目
fn accumulate(rows: &[(String, String, String)]) -> Vec<CumulativeEntry> {
    let mut entries: Vec<CumulativeEntry> = Vec::new();
    let mut index: HashMap<&str, usize> = HashMap::new();
    let mut present = 0u32;
    let mut total_lectures = 0u32;
    for (date, _, status) in rows {
        if date.is_empty() || status.is_empty() {
            continue;
        }
        if !status.eq_ignore_ascii_case("A") {
            present += 1;
        }
        total_lectures += 1;
        let percentage = if total_lectures > 0 {
            round2(f64::from(present) * 100.0 / f64::from(total_lectures))
        } else {
            100.0
        };
        match index.get(date.as_str()) {
            Some(&i) => {
                let entry = &mut entries[i];
                entry.present = present;
                entry.total_lectures = total_lectures;
                entry.percentage = percentage;
            }
            None => {
                index.insert(date, entries.len());
                entries.push(CumulativeEntry {
                    date: date.clone(),
                    present,
                    total_lectures,
                    percentage,
                });
            }
        }
    }
    entries
}

/// 逐日考勤，返回正序与倒序两种视图。没有任何记录时返回一条“学期未开始”的占位条目。
pub fn extract_history(document: &Document, today: NaiveDate) -> Result<DateWiseHistory, Exception> {
    let rows = load_rows(document)?;
    let mut forward = group_by_date(&rows);
    debug!("逐日视图共{}天", forward.len());
    if forward.is_empty() {
        forward.push(DateEntry {
            date: format_portal_date(today),
            data: vec![LectureMark::new(SEMESTER_NOT_BEGUN, "")],
        });
    }
    let backward = forward.iter().rev().cloned().collect();
    Ok(DateWiseHistory { forward, backward })
}

/// 截至每一天的累计出勤。没有任何记录时返回一条 100% 的占位条目。
pub fn extract_cumulative(
    document: &Document,
    today: NaiveDate,
) -> Result<Vec<CumulativeEntry>, Exception> {
    let rows = load_rows(document)?;
    let mut entries = accumulate(&rows);
    debug!("累计视图共{}天", entries.len());
    if entries.is_empty() {
        entries.push(CumulativeEntry {
            date: format_portal_date(today),
            present: 0,
            total_lectures: 0,
            percentage: 100.0,
        });
    }
    Ok(entries)
}
