use chrono::{DateTime, NaiveDate};

pub mod embeds;
pub mod filter;
pub mod forms;
pub mod lazy;
pub mod preview;
pub mod selection;
pub mod sidebar;
pub mod slug;
pub mod tables;
pub mod theme;

/// 页面统一的日期格式 `dd.mm.yyyy`
pub fn format_date(date: NaiveDate) -> String {
    date.format("%d.%m.%Y").to_string()
}

/// 接受 RFC 3339 时间或 `YYYY-MM-DD`，无法解析时返回 None
pub fn format_date_str(raw: &str) -> Option<String> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(format_date(dt.date_naive()));
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d").ok().map(format_date)
}
