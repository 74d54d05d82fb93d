use std::collections::HashMap;
use std::sync::Mutex;

use crate::dom::{Document, Selector};

/// 偏好存储中的键
pub const THEME_KEY: &str = "theme";

const DARK_CLASS: &str = "dark-mode";

/// 浏览器本地存储的抽象
pub trait PreferenceStore: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&self, key: &str, value: &str);
}

/// 进程内偏好存储
#[derive(Debug, Default)]
pub struct MemoryPreferences {
    values: Mutex<HashMap<String, String>>,
}

impl PreferenceStore for MemoryPreferences {
    fn get(&self, key: &str) -> Option<String> {
        self.values
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .get(key)
            .cloned()
    }

    fn set(&self, key: &str, value: &str) {
        self.values
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert(key.to_string(), value.to_string());
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Theme {
    Light,
    Dark,
}

impl Theme {
    pub fn as_str(&self) -> &'static str {
        match self {
            Theme::Light => "light",
            Theme::Dark => "dark",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "light" => Some(Theme::Light),
            "dark" => Some(Theme::Dark),
            _ => None,
        }
    }
}

fn apply(doc: &mut Document, theme: Theme) {
    let body = doc.body();
    match theme {
        Theme::Dark => doc.add_class(body, DARK_CLASS),
        Theme::Light => doc.remove_class(body, DARK_CLASS),
    }
    if let Some(toggle) = doc.select(&Selector::id("darkModeToggle")) {
        doc.set_checked(toggle, theme == Theme::Dark);
    }
}

/// 页面加载时按已保存的偏好设置开关和 `body`。
/// 没有 `#darkModeToggle` 或没有有效偏好时不改动页面
pub fn restore(doc: &mut Document, store: &dyn PreferenceStore) -> Option<Theme> {
    doc.select(&Selector::id("darkModeToggle"))?;
    let theme = store.get(THEME_KEY).as_deref().and_then(Theme::parse)?;
    apply(doc, theme);
    Some(theme)
}

/// `#darkModeToggle` 状态变化，按开关状态切换并保存
pub fn changed(doc: &mut Document, store: &dyn PreferenceStore) -> Option<Theme> {
    let toggle = doc.select(&Selector::id("darkModeToggle"))?;
    let theme = if doc.is_checked(toggle) {
        Theme::Dark
    } else {
        Theme::Light
    };
    apply(doc, theme);
    store.set(THEME_KEY, theme.as_str());
    Some(theme)
}
