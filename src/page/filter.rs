use crate::dom::{Document, ElementId, Selector};

/// 显示全部文章的分类值
pub const ALL_CATEGORIES: &str = "all";

/// `.category-filter` 被点击：只有它保留 `active`，
/// `.article-item` 按 `data-category` 显示或隐藏。返回可见文章数
pub fn filter_clicked(doc: &mut Document, filter: ElementId) -> usize {
    for other in doc.select_all(&Selector::class("category-filter")) {
        doc.remove_class(other, "active");
    }
    doc.add_class(filter, "active");

    let category = doc.attr(filter, "data-category").unwrap_or_default().to_string();
    let mut visible = 0;
    for article in doc.select_all(&Selector::class("article-item")) {
        let show = category == ALL_CATEGORIES
            || doc.attr(article, "data-category") == Some(category.as_str());
        doc.set_style(article, "display", if show { "block" } else { "none" });
        visible += usize::from(show);
    }
    tracing::debug!(category = %category, visible, "分类筛选");
    visible
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shows_matching_articles_and_moves_active_marker() {
        let mut doc = Document::new();
        let body = doc.body();
        let all = doc
            .build(body, "a")
            .class("category-filter")
            .class("active")
            .attr("data-category", "all")
            .finish();
        let sport = doc
            .build(body, "a")
            .class("category-filter")
            .attr("data-category", "spor")
            .finish();
        let articles: Vec<ElementId> = ["spor", "ekonomi", "spor"]
            .into_iter()
            .map(|c| {
                doc.build(body, "article")
                    .class("article-item")
                    .attr("data-category", c)
                    .finish()
            })
            .collect();

        assert_eq!(filter_clicked(&mut doc, sport), 2);
        assert!(doc.has_class(sport, "active"));
        assert!(!doc.has_class(all, "active"));
        assert_eq!(doc.style(articles[0], "display"), Some("block"));
        assert_eq!(doc.style(articles[1], "display"), Some("none"));

        assert_eq!(filter_clicked(&mut doc, all), 3);
        assert!(articles.iter().all(|a| doc.style(*a, "display") == Some("block")));
    }
}
