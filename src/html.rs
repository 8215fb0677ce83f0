// Copyright (c) 2026 shaneyale (shaneyale86@gmail.com)
// All rights reserved.

//! # HTML 查询门面
//!
//! 对 `scraper` 的薄封装，只暴露解析器需要的几种查询：
//! 按标签/属性查找元素、列出全部表格行、取去空白后的文本。
//!
//! `scraper::Html` 不是 `Send`，因此 `Document` 只能在同步代码中构建和使用，
//! 不要跨越 `.await` 持有。

use lazy_static::lazy_static;
use scraper::{ElementRef, Html, Selector};

use crate::exception::SpanSnippet;

lazy_static! {
    static ref TABLE: Selector = Selector::parse("table").expect("静态选择器");
    static ref ROW: Selector = Selector::parse("tr").expect("静态选择器");
    static ref CELL: Selector = Selector::parse("td, th").expect("静态选择器");
    static ref DATA_CELL: Selector = Selector::parse("td").expect("静态选择器");
    static ref SPAN: Selector = Selector::parse("span").expect("静态选择器");
    static ref INPUT: Selector = Selector::parse("input").expect("静态选择器");
}

/// 表格中的一行
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Row {
    /// 所有 `td`/`th` 单元格的文本，按文档顺序
    pub cells: Vec<String>,
    /// 仅 `td` 单元格的文本
    pub data_cells: Vec<String>,
}

/// 一张表格，行按文档顺序排列（包含嵌套表格中的行）
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    pub rows: Vec<Row>,
}

impl Table {
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }
}

/// 已解析的 HTML 文档
pub struct Document {
    html: Html,
}

impl Document {
    pub fn parse(source: &str) -> Self {
        Self {
            html: Html::parse_document(source),
        }
    }

    /// 按 `name` 属性查找 `input` 元素并返回其 `value`
    pub fn input_value(&self, name: &str) -> Option<String> {
        self.html
            .select(&INPUT)
            .find(|el| el.value().attr("name") == Some(name))
            .map(|el| el.value().attr("value").unwrap_or_default().to_string())
    }

    /// 按完整 ID 查找 `span` 并返回其文本
    pub fn span_text_by_id(&self, id: &str) -> Option<String> {
        self.html
            .select(&SPAN)
            .find(|el| el.value().id() == Some(id))
            .map(|el| stripped_text(&el))
    }

    /// 返回第一个 ID 包含给定片段的 `span` 的文本
    pub fn span_text_by_id_fragment(&self, fragment: &str) -> Option<String> {
        self.html
            .select(&SPAN)
            .find(|el| el.value().id().is_some_and(|id| id.contains(fragment)))
            .map(|el| stripped_text(&el))
    }

    /// 所有 `span` 的 (ID, 文本)，无 ID 时记为 `no-id`
    pub fn spans(&self) -> Vec<SpanSnippet> {
        self.html
            .select(&SPAN)
            .map(|el| SpanSnippet {
                id: el.value().id().unwrap_or("no-id").to_string(),
                text: stripped_text(&el),
            })
            .collect()
    }

    /// 文档中的全部表格
    pub fn tables(&self) -> Vec<Table> {
        self.html
            .select(&TABLE)
            .map(|table| Table {
                rows: table
                    .select(&ROW)
                    .map(|row| Row {
                        cells: row.select(&CELL).map(|c| stripped_text(&c)).collect(),
                        data_cells: row.select(&DATA_CELL).map(|c| stripped_text(&c)).collect(),
                    })
                    .collect(),
            })
            .collect()
    }

    /// 整个文档的纯文本
    pub fn text(&self) -> String {
        self.html.root_element().text().collect::<Vec<_>>().join(" ")
    }
}

/// 每个文本节点去除首尾空白后直接拼接，丢弃空节点
fn stripped_text(element: &ElementRef) -> String {
    element
        .text()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect()
}
