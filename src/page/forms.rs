use std::sync::LazyLock;

use regex::Regex;

use crate::dom::{Document, ElementId, Selector};

static EMAIL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^\s@]+@[^\s@]+$").expect("邮箱正则无效"));

fn controls() -> Selector {
    Selector::tag("input")
        .or(Selector::tag("select"))
        .or(Selector::tag("textarea"))
}

fn control_value(doc: &Document, el: ElementId) -> &str {
    // textarea 可能只有文本内容没有 value
    match doc.attr(el, "value") {
        None if doc.tag(el) == "textarea" => doc.text(el),
        _ => doc.value(el),
    }
}

fn is_checkable(doc: &Document, el: ElementId) -> bool {
    matches!(doc.attr(el, "type"), Some("checkbox" | "radio"))
}

/// 单个控件是否满足约束：`required` 非空（勾选类需勾选），`type="email"` 格式正确
fn control_is_valid(doc: &Document, el: ElementId) -> bool {
    if doc.has_attr(el, "disabled") {
        return true;
    }
    let value = control_value(doc, el);
    if doc.has_attr(el, "required") {
        let filled = if is_checkable(doc, el) {
            doc.is_checked(el)
        } else {
            !value.is_empty()
        };
        if !filled {
            return false;
        }
    }
    if doc.attr(el, "type") == Some("email") && !value.is_empty() {
        return EMAIL_RE.is_match(value);
    }
    true
}

/// 表单内所有控件都满足约束
pub fn is_valid(doc: &Document, form: ElementId) -> bool {
    doc.select_all_within(form, &controls())
        .into_iter()
        .all(|el| control_is_valid(doc, el))
}

/// `.needs-validation` 表单提交：总是加上 `was-validated`，返回是否允许提交
pub fn validate_on_submit(doc: &mut Document, form: ElementId) -> bool {
    if !doc.has_class(form, "needs-validation") {
        return true;
    }
    let valid = is_valid(doc, form);
    doc.add_class(form, "was-validated");
    if !valid {
        tracing::debug!("表单校验未通过，阻止提交");
    }
    valid
}

/// 去掉首尾空白后为空即标记 `is-invalid`，返回是否允许提交
fn require_non_blank(doc: &mut Document, field: ElementId) -> bool {
    let filled = !control_value(doc, field).trim().is_empty();
    if filled {
        doc.remove_class(field, "is-invalid");
    } else {
        doc.add_class(field, "is-invalid");
    }
    filled
}

/// 前台搜索表单 `form[action="/arama"]`：关键词 `q` 不能为空白
pub fn check_search_form(doc: &mut Document) -> bool {
    let Some(form) = doc.select(&Selector::tag("form").with_attr("action", "/arama")) else {
        return true;
    };
    match doc.select_within(form, &Selector::tag("input").with_attr("name", "q")) {
        Some(input) => require_non_blank(doc, input),
        None => true,
    }
}

/// 评论表单 `#commentForm`：`#commentContent` 不能为空白
pub fn check_comment_form(doc: &mut Document) -> bool {
    if doc.select(&Selector::id("commentForm")).is_none() {
        return true;
    }
    match doc.select(&Selector::id("commentContent")) {
        Some(content) => require_non_blank(doc, content),
        None => true,
    }
}

/// 按 FormData 规则收集字段：有 name、未禁用；勾选类只收已勾选的（默认值 "on"）；
/// 文件与按钮类控件不收集
pub fn collect_fields(doc: &Document, form: ElementId) -> Vec<(String, String)> {
    doc.select_all_within(form, &controls())
        .into_iter()
        .filter(|el| !doc.has_attr(*el, "disabled"))
        .filter_map(|el| {
            let name = doc.attr(el, "name").filter(|n| !n.is_empty())?;
            match doc.attr(el, "type") {
                Some("file" | "submit" | "button" | "reset" | "image") => None,
                Some("checkbox" | "radio") if !doc.is_checked(el) => None,
                Some("checkbox" | "radio") => Some((
                    name.to_string(),
                    doc.attr(el, "value").unwrap_or("on").to_string(),
                )),
                _ => Some((name.to_string(), control_value(doc, el).to_string())),
            }
        })
        .collect()
}
