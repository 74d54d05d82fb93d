use crate::dom::{Document, ElementId, Selector};

/// 可见性由宿主环境上报，这里只维护观察列表
#[derive(Debug, Default)]
pub struct LazyImages {
    observed: Vec<ElementId>,
}

impl LazyImages {
    /// 观察页面上所有 `img[data-src]`
    pub fn observe(doc: &Document) -> Self {
        let observed = doc.select_all(&Selector::tag("img").with_attr_present("data-src"));
        Self { observed }
    }

    /// 处理一批 (图片, 是否进入视口) 记录，返回本次加载的图片
    pub fn on_intersection(
        &mut self,
        doc: &mut Document,
        entries: &[(ElementId, bool)],
    ) -> Vec<ElementId> {
        let mut loaded = Vec::new();
        for &(img, intersecting) in entries {
            if !intersecting || !self.observed.contains(&img) {
                continue;
            }
            if let Some(src) = doc.attr(img, "data-src").map(str::to_string) {
                doc.set_attr(img, "src", &src);
                doc.remove_attr(img, "data-src");
            }
            self.observed.retain(|o| *o != img);
            loaded.push(img);
        }
        loaded
    }

    /// 尚未加载的图片
    pub fn pending(&self) -> &[ElementId] {
        &self.observed
    }
}
