use crate::dom::{Document, Selector};

/// 页面加载时视口不超过该宽度才为导航链接绑定收起行为
pub const NARROW_VIEWPORT: u32 = 992;
/// 点击导航链接时视口不超过该宽度才收起
pub const PHONE_VIEWPORT: u32 = 576;

const COLLAPSED: &str = "sidebar-collapsed";

/// `.sidebar-toggle-btn` 点击，返回切换后是否收起；页面没有 `.admin-layout` 时返回 None
pub fn toggle(doc: &mut Document) -> Option<bool> {
    let layout = doc.select(&Selector::class("admin-layout"))?;
    Some(doc.toggle_class(layout, COLLAPSED))
}

/// 加载时的视口宽度决定导航链接是否会收起侧边栏
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SidebarBinding {
    collapse_on_nav: bool,
}

impl SidebarBinding {
    pub fn bind(load_width: u32) -> Self {
        Self {
            collapse_on_nav: load_width <= NARROW_VIEWPORT,
        }
    }

    pub fn collapses_on_nav(&self) -> bool {
        self.collapse_on_nav
    }

    /// `.admin-sidebar .nav-link` 点击，`width` 为点击时的视口宽度。返回是否收起
    pub fn nav_link_clicked(&self, doc: &mut Document, width: u32) -> bool {
        if !self.collapse_on_nav || width > PHONE_VIEWPORT {
            return false;
        }
        match doc.select(&Selector::class("admin-layout")) {
            Some(layout) => {
                doc.add_class(layout, COLLAPSED);
                true
            }
            None => false,
        }
    }
}
