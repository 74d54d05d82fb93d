use crate::dom::{Document, Selector};

/// 给 `.table-responsive-stack` 每个 `td` 加上对应列头的 `data-label`，
/// 返回写入的单元格数。列头不够时跳过多出的单元格
pub fn label_responsive_tables(doc: &mut Document) -> usize {
    let header_cells = Selector::tag("thead").descendant(Selector::tag("th"));
    let body_rows = Selector::tag("tbody").descendant(Selector::tag("tr"));
    let cell = Selector::tag("td");

    let mut labelled = 0;
    for table in doc.select_all(&Selector::class("table-responsive-stack")) {
        let headers: Vec<String> = doc
            .select_all_within(table, &header_cells)
            .into_iter()
            .map(|th| doc.text_content(th))
            .collect();
        for row in doc.select_all_within(table, &body_rows) {
            for (idx, td) in doc.select_all_within(row, &cell).into_iter().enumerate() {
                if let Some(label) = headers.get(idx) {
                    doc.set_attr(td, "data-label", label);
                    labelled += 1;
                }
            }
        }
    }
    labelled
}
