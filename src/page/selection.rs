use crate::dom::{Document, ElementId, Selector};

/// 当前勾选的行标识。不单独保存，始终以页面上 `.item-checkbox` 的勾选状态为准
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectionSet {
    ids: Vec<String>,
}

impl SelectionSet {
    /// 按文档顺序读取；复选框没有 `value` 时取所在行的 `data-id`
    pub fn read(doc: &Document) -> Self {
        let row_with_id = Selector::has_attr("data-id");
        let ids = doc
            .select_all(&checked_items())
            .into_iter()
            .filter_map(|cb| match doc.attr(cb, "value") {
                Some(v) if !v.is_empty() => Some(v.to_string()),
                _ => doc
                    .closest(cb, &row_with_id)
                    .and_then(|row| doc.attr(row, "data-id"))
                    .map(str::to_string),
            })
            .collect();
        Self { ids }
    }

    pub fn ids(&self) -> &[String] {
        &self.ids
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn into_ids(self) -> Vec<String> {
        self.ids
    }
}

/// `.item-checkbox:checked`
fn checked_items() -> Selector {
    Selector::class("item-checkbox").checked()
}

/// `.selectable-row` 被点击。点在按钮、链接或输入框上时不处理，返回 false
pub fn row_clicked(doc: &mut Document, row: ElementId, target: ElementId) -> bool {
    let interactive = Selector::tag("button")
        .or(Selector::tag("a"))
        .or(Selector::tag("input"));
    if doc.closest(target, &interactive).is_some() {
        return false;
    }

    doc.toggle_class(row, "selected");
    let checkbox = doc.select_within(row, &Selector::tag("input").with_attr("type", "checkbox"));
    if let Some(checkbox) = checkbox {
        let checked = doc.is_checked(checkbox);
        doc.set_checked(checkbox, !checked);
        refresh_bulk_actions(doc);
    }
    true
}

/// `#selectAll` 状态变化，把所有 `.item-checkbox` 及所在行同步过去
pub fn select_all_changed(doc: &mut Document) {
    let Some(master) = doc.select(&Selector::id("selectAll")) else {
        return;
    };
    let checked = doc.is_checked(master);
    for checkbox in doc.select_all(&Selector::class("item-checkbox")) {
        doc.set_checked(checkbox, checked);
        sync_row(doc, checkbox);
    }
    refresh_bulk_actions(doc);
}

/// 单个 `.item-checkbox` 状态变化
pub fn checkbox_changed(doc: &mut Document, checkbox: ElementId) {
    sync_row(doc, checkbox);
    refresh_bulk_actions(doc);
}

fn sync_row(doc: &mut Document, checkbox: ElementId) {
    if let Some(row) = doc.closest(checkbox, &Selector::tag("tr")) {
        if doc.is_checked(checkbox) {
            doc.add_class(row, "selected");
        } else {
            doc.remove_class(row, "selected");
        }
    }
}

/// 按勾选数量启用或禁用 `.bulk-actions-btn`，并更新其中的 `.count`
pub fn refresh_bulk_actions(doc: &mut Document) {
    let Some(button) = doc.select(&Selector::class("bulk-actions-btn")) else {
        return;
    };
    let count = doc.select_all(&checked_items()).len();
    if count > 0 {
        doc.remove_class(button, "disabled");
    } else {
        doc.add_class(button, "disabled");
    }
    if let Some(counter) = doc.select_within(button, &Selector::class("count")) {
        doc.set_text(counter, &count.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct ListPage {
        doc: Document,
        select_all: ElementId,
        rows: Vec<ElementId>,
        boxes: Vec<ElementId>,
        button: ElementId,
        count: ElementId,
    }

    fn list_page() -> ListPage {
        let mut doc = Document::new();
        let body = doc.body();
        let button = doc
            .build(body, "button")
            .class("bulk-actions-btn")
            .class("disabled")
            .finish();
        let count = doc.build(button, "span").class("count").text("0").finish();
        let table = doc.build(body, "table").finish();
        let head = doc.build(table, "tr").finish();
        let select_all = doc
            .build(head, "input")
            .attr("type", "checkbox")
            .attr("id", "selectAll")
            .finish();

        let mut rows = Vec::new();
        let mut boxes = Vec::new();
        for (id, value) in [("10", "10"), ("11", ""), ("12", "12")] {
            let row = doc
                .build(table, "tr")
                .class("selectable-row")
                .attr("data-id", id)
                .finish();
            let cell = doc.build(row, "td").finish();
            let mut cb = doc
                .build(cell, "input")
                .attr("type", "checkbox")
                .class("item-checkbox");
            if !value.is_empty() {
                cb = cb.attr("value", value);
            }
            boxes.push(cb.finish());
            rows.push(row);
        }

        ListPage {
            doc,
            select_all,
            rows,
            boxes,
            button,
            count,
        }
    }

    #[test]
    fn row_click_toggles_checkbox_and_counter() {
        let mut page = list_page();
        let row = page.rows[1];
        let cell = page.doc.children(row)[0];

        assert!(row_clicked(&mut page.doc, row, cell));
        assert!(page.doc.has_class(row, "selected"));
        assert!(page.doc.is_checked(page.boxes[1]));
        assert!(!page.doc.has_class(page.button, "disabled"));
        assert_eq!(page.doc.text(page.count), "1");
        assert_eq!(SelectionSet::read(&page.doc).ids(), ["11"]);

        assert!(row_clicked(&mut page.doc, row, cell));
        assert!(SelectionSet::read(&page.doc).is_empty());
        assert!(page.doc.has_class(page.button, "disabled"));
        assert_eq!(page.doc.text(page.count), "0");
    }

    #[test]
    fn clicks_on_controls_are_ignored() {
        let mut page = list_page();
        let row = page.rows[0];
        assert!(!row_clicked(&mut page.doc, row, page.boxes[0]));
        assert!(!page.doc.has_class(row, "selected"));
    }

    #[test]
    fn select_all_syncs_every_row() {
        let mut page = list_page();
        page.doc.set_checked(page.select_all, true);
        select_all_changed(&mut page.doc);

        assert!(page.rows.iter().all(|r| page.doc.has_class(*r, "selected")));
        assert_eq!(page.doc.text(page.count), "3");
        assert_eq!(SelectionSet::read(&page.doc).into_ids(), vec!["10", "11", "12"]);

        page.doc.set_checked(page.select_all, false);
        select_all_changed(&mut page.doc);
        assert!(page.rows.iter().all(|r| !page.doc.has_class(*r, "selected")));
        assert_eq!(SelectionSet::read(&page.doc).len(), 0);
    }

    #[test]
    fn single_checkbox_change_updates_its_row() {
        let mut page = list_page();
        page.doc.set_checked(page.boxes[2], true);
        checkbox_changed(&mut page.doc, page.boxes[2]);

        assert!(page.doc.has_class(page.rows[2], "selected"));
        assert!(!page.doc.has_class(page.rows[0], "selected"));
        assert_eq!(SelectionSet::read(&page.doc).ids(), ["12"]);
        assert_eq!(page.doc.text(page.count), "1");
    }
}
