use crate::dom::{Document, Selector};

/// 把 `.article-content` 中的 iframe 包进 `div.ratio.ratio-16x9.my-4`，返回包裹数量
pub fn wrap_iframes(doc: &mut Document) -> usize {
    let Some(content) = doc.select(&Selector::class("article-content")) else {
        return 0;
    };
    let iframes = doc.select_all_within(content, &Selector::tag("iframe"));
    for &iframe in &iframes {
        let Some(parent) = doc.parent(iframe) else {
            continue;
        };
        let wrapper = doc.create_element("div");
        for class in ["ratio", "ratio-16x9", "my-4"] {
            doc.add_class(wrapper, class);
        }
        doc.insert_before(parent, wrapper, iframe);
        doc.append_child(wrapper, iframe);
    }
    iframes.len()
}
