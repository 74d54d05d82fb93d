use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard};

pub mod selector;

pub use selector::{Selector, SelectorError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ElementId(usize);

#[derive(Debug, Clone)]
struct Element {
    tag: String,
    attributes: BTreeMap<String, String>,
    classes: Vec<String>,
    styles: BTreeMap<String, String>,
    text: String,
    checked: bool,
    parent: Option<ElementId>,
    children: Vec<ElementId>,
}

impl Element {
    fn new(tag: &str) -> Self {
        Self {
            tag: tag.to_ascii_lowercase(),
            attributes: BTreeMap::new(),
            classes: Vec::new(),
            styles: BTreeMap::new(),
            text: String::new(),
            checked: false,
            parent: None,
            children: Vec::new(),
        }
    }
}

/// 元素以 arena 方式存放，移除只是断开父子关系，已发出的 `ElementId` 始终有效。
///
/// 槽位不回收，arena 只增不减：一个文档对应一次页面加载，
/// 每条通知约留下 8 个游离元素，随页面刷新整体释放。
#[derive(Debug, Clone)]
pub struct Document {
    elements: Vec<Element>,
    root: ElementId,
    body: ElementId,
}

/// 行为层共享的文档句柄。锁只在同步片段内持有，不跨 `.await`
pub type SharedDocument = Arc<Mutex<Document>>;

pub fn lock(doc: &SharedDocument) -> MutexGuard<'_, Document> {
    doc.lock().unwrap_or_else(|e| e.into_inner())
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Document {
    pub fn new() -> Self {
        let mut doc = Self {
            elements: vec![Element::new("html")],
            root: ElementId(0),
            body: ElementId(0),
        };
        let body = doc.create_element("body");
        doc.append_child(doc.root, body);
        doc.body = body;
        doc
    }

    pub fn into_shared(self) -> SharedDocument {
        Arc::new(Mutex::new(self))
    }

    pub fn root(&self) -> ElementId {
        self.root
    }

    pub fn body(&self) -> ElementId {
        self.body
    }

    /// 创建游离元素，需要 `append_child` 挂到树上
    pub fn create_element(&mut self, tag: &str) -> ElementId {
        self.elements.push(Element::new(tag));
        ElementId(self.elements.len() - 1)
    }

    /// 在 `parent` 下创建元素并返回构造器
    pub fn build(&mut self, parent: ElementId, tag: &str) -> ElementBuilder<'_> {
        let id = self.create_element(tag);
        self.append_child(parent, id);
        ElementBuilder { doc: self, id }
    }

    fn node(&self, id: ElementId) -> &Element {
        &self.elements[id.0]
    }

    fn node_mut(&mut self, id: ElementId) -> &mut Element {
        &mut self.elements[id.0]
    }

    fn detach(&mut self, child: ElementId) {
        if let Some(parent) = self.node(child).parent {
            self.node_mut(parent).children.retain(|c| *c != child);
            self.node_mut(child).parent = None;
        }
    }

    pub fn append_child(&mut self, parent: ElementId, child: ElementId) {
        self.detach(child);
        self.node_mut(parent).children.push(child);
        self.node_mut(child).parent = Some(parent);
    }

    /// `reference` 不是 `parent` 的子元素时退化为追加
    pub fn insert_before(&mut self, parent: ElementId, child: ElementId, reference: ElementId) {
        self.detach(child);
        let siblings = &mut self.node_mut(parent).children;
        match siblings.iter().position(|c| *c == reference) {
            Some(idx) => siblings.insert(idx, child),
            None => siblings.push(child),
        }
        self.node_mut(child).parent = Some(parent);
    }

    /// arena 中的元素总数，包括已移除的
    pub fn element_count(&self) -> usize {
        self.elements.len()
    }

    /// 从树上移除元素，返回移除前是否挂在树上
    pub fn remove(&mut self, id: ElementId) -> bool {
        let attached = self.node(id).parent.is_some();
        self.detach(id);
        attached
    }

    pub fn is_connected(&self, id: ElementId) -> bool {
        let mut current = id;
        loop {
            if current == self.root {
                return true;
            }
            match self.node(current).parent {
                Some(parent) => current = parent,
                None => return false,
            }
        }
    }

    pub fn parent(&self, id: ElementId) -> Option<ElementId> {
        self.node(id).parent
    }

    pub fn children(&self, id: ElementId) -> &[ElementId] {
        &self.node(id).children
    }

    pub fn next_element_sibling(&self, id: ElementId) -> Option<ElementId> {
        let parent = self.node(id).parent?;
        let siblings = &self.node(parent).children;
        let idx = siblings.iter().position(|c| *c == id)?;
        siblings.get(idx + 1).copied()
    }

    pub fn tag(&self, id: ElementId) -> &str {
        &self.node(id).tag
    }

    pub fn attr(&self, id: ElementId, name: &str) -> Option<&str> {
        self.node(id).attributes.get(name).map(String::as_str)
    }

    pub fn has_attr(&self, id: ElementId, name: &str) -> bool {
        (name == "class" && !self.node(id).classes.is_empty())
            || self.node(id).attributes.contains_key(name)
    }

    /// `class` 属性会被拆分成 class 列表
    pub fn set_attr(&mut self, id: ElementId, name: &str, value: &str) {
        if name == "class" {
            self.set_class_name(id, value);
            return;
        }
        self.node_mut(id)
            .attributes
            .insert(name.to_string(), value.to_string());
    }

    pub fn remove_attr(&mut self, id: ElementId, name: &str) {
        if name == "class" {
            self.node_mut(id).classes.clear();
            return;
        }
        self.node_mut(id).attributes.remove(name);
    }

    /// 表单控件的当前值，未设置时为空串
    pub fn value(&self, id: ElementId) -> &str {
        self.attr(id, "value").unwrap_or("")
    }

    pub fn set_value(&mut self, id: ElementId, value: &str) {
        self.set_attr(id, "value", value);
    }

    pub fn class_name(&self, id: ElementId) -> String {
        self.node(id).classes.join(" ")
    }

    pub fn set_class_name(&mut self, id: ElementId, class_name: &str) {
        let classes = &mut self.node_mut(id).classes;
        classes.clear();
        for class in class_name.split_whitespace() {
            if !classes.iter().any(|c| c == class) {
                classes.push(class.to_string());
            }
        }
    }

    pub fn has_class(&self, id: ElementId, class: &str) -> bool {
        self.node(id).classes.iter().any(|c| c == class)
    }

    pub fn add_class(&mut self, id: ElementId, class: &str) {
        if !self.has_class(id, class) {
            self.node_mut(id).classes.push(class.to_string());
        }
    }

    pub fn remove_class(&mut self, id: ElementId, class: &str) {
        self.node_mut(id).classes.retain(|c| c != class);
    }

    /// 切换 class，返回切换后是否存在
    pub fn toggle_class(&mut self, id: ElementId, class: &str) -> bool {
        if self.has_class(id, class) {
            self.remove_class(id, class);
            false
        } else {
            self.add_class(id, class);
            true
        }
    }

    pub fn text(&self, id: ElementId) -> &str {
        &self.node(id).text
    }

    pub fn set_text(&mut self, id: ElementId, text: &str) {
        self.node_mut(id).text = text.to_string();
    }

    /// 自身与所有后代文本按文档顺序拼接
    pub fn text_content(&self, id: ElementId) -> String {
        let mut out = self.node(id).text.clone();
        for child in self.descendants(id) {
            out.push_str(&self.node(child).text);
        }
        out
    }

    pub fn style(&self, id: ElementId, property: &str) -> Option<&str> {
        self.node(id).styles.get(property).map(String::as_str)
    }

    pub fn set_style(&mut self, id: ElementId, property: &str, value: &str) {
        self.node_mut(id)
            .styles
            .insert(property.to_string(), value.to_string());
    }

    pub fn is_checked(&self, id: ElementId) -> bool {
        self.node(id).checked
    }

    pub fn set_checked(&mut self, id: ElementId, checked: bool) {
        self.node_mut(id).checked = checked;
    }

    /// 先序遍历 `id` 的所有后代（不含自身）
    pub fn descendants(&self, id: ElementId) -> Vec<ElementId> {
        let mut out = Vec::new();
        let mut stack: Vec<ElementId> = self.node(id).children.iter().rev().copied().collect();
        while let Some(next) = stack.pop() {
            out.push(next);
            stack.extend(self.node(next).children.iter().rev().copied());
        }
        out
    }

    pub fn matches(&self, id: ElementId, selector: &Selector) -> bool {
        selector.matches(self, id)
    }

    pub fn select(&self, selector: &Selector) -> Option<ElementId> {
        self.select_within(self.root, selector)
    }

    pub fn select_all(&self, selector: &Selector) -> Vec<ElementId> {
        self.select_all_within(self.root, selector)
    }

    /// 仅在 `scope` 的后代中查找，匹配时仍考虑 `scope` 之外的祖先
    pub fn select_within(&self, scope: ElementId, selector: &Selector) -> Option<ElementId> {
        self.descendants(scope)
            .into_iter()
            .find(|el| selector.matches(self, *el))
    }

    pub fn select_all_within(&self, scope: ElementId, selector: &Selector) -> Vec<ElementId> {
        self.descendants(scope)
            .into_iter()
            .filter(|el| selector.matches(self, *el))
            .collect()
    }

    pub fn query_selector(&self, selector: &str) -> Result<Option<ElementId>, SelectorError> {
        Ok(self.select(&Selector::parse(selector)?))
    }

    pub fn query_selector_all(&self, selector: &str) -> Result<Vec<ElementId>, SelectorError> {
        Ok(self.select_all(&Selector::parse(selector)?))
    }

    /// 自身或最近的匹配祖先
    pub fn closest(&self, id: ElementId, selector: &Selector) -> Option<ElementId> {
        let mut current = Some(id);
        while let Some(el) = current {
            if selector.matches(self, el) {
                return Some(el);
            }
            current = self.node(el).parent;
        }
        None
    }
}

pub struct ElementBuilder<'a> {
    doc: &'a mut Document,
    id: ElementId,
}

impl ElementBuilder<'_> {
    pub fn attr(self, name: &str, value: &str) -> Self {
        self.doc.set_attr(self.id, name, value);
        self
    }

    pub fn class(self, class: &str) -> Self {
        self.doc.add_class(self.id, class);
        self
    }

    pub fn text(self, text: &str) -> Self {
        self.doc.set_text(self.id, text);
        self
    }

    pub fn checked(self, checked: bool) -> Self {
        self.doc.set_checked(self.id, checked);
        self
    }

    pub fn style(self, property: &str, value: &str) -> Self {
        self.doc.set_style(self.id, property, value);
        self
    }

    pub fn finish(self) -> ElementId {
        self.id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn removed_elements_are_no_longer_selectable() {
        let mut doc = Document::new();
        let body = doc.body();
        let row = doc.build(body, "tr").attr("data-id", "42").finish();
        doc.build(row, "td").text("Başlık").finish();

        assert_eq!(doc.query_selector(r#"[data-id="42"]"#).unwrap(), Some(row));
        assert!(doc.remove(row));
        assert!(!doc.is_connected(row));
        assert_eq!(doc.query_selector(r#"[data-id="42"]"#).unwrap(), None);
        assert!(!doc.remove(row));
    }

    #[test]
    fn removed_ids_are_never_reused() {
        let mut doc = Document::new();
        let body = doc.body();
        let row = doc.build(body, "tr").text("eski").finish();
        let before = doc.element_count();

        doc.remove(row);
        let fresh = doc.build(body, "tr").text("yeni").finish();

        assert_ne!(fresh, row);
        assert_eq!(doc.element_count(), before + 1);
        assert_eq!(doc.text(row), "eski");
        assert_eq!(doc.parent(row), None);
        assert_eq!(doc.select_all(&Selector::tag("tr")), vec![fresh]);
    }

    #[test]
    fn class_name_replaces_whole_list() {
        let mut doc = Document::new();
        let body = doc.body();
        let badge = doc
            .build(body, "span")
            .class("status-badge")
            .class("status-badge-draft")
            .finish();

        doc.set_class_name(badge, "status-badge  status-badge-active");
        assert_eq!(doc.class_name(badge), "status-badge status-badge-active");
        assert!(!doc.has_class(badge, "status-badge-draft"));

        assert!(!doc.toggle_class(badge, "status-badge"));
        assert!(doc.toggle_class(badge, "status-badge"));
    }

    #[test]
    fn descendants_follow_document_order() {
        let mut doc = Document::new();
        let body = doc.body();
        let list = doc.build(body, "ul").finish();
        let first = doc.build(list, "li").text("a").finish();
        let nested = doc.build(first, "span").text("b").finish();
        let second = doc.build(list, "li").text("c").finish();

        assert_eq!(doc.descendants(list), vec![first, nested, second]);
        assert_eq!(doc.text_content(list), "abc");
        assert_eq!(doc.next_element_sibling(first), Some(second));
        assert_eq!(doc.next_element_sibling(second), None);
    }

    #[test]
    fn insert_before_moves_existing_node() {
        let mut doc = Document::new();
        let body = doc.body();
        let article = doc.build(body, "div").class("article-content").finish();
        let iframe = doc.build(article, "iframe").finish();
        let wrapper = doc.create_element("div");

        doc.insert_before(article, wrapper, iframe);
        doc.append_child(wrapper, iframe);

        assert_eq!(doc.children(article), &[wrapper]);
        assert_eq!(doc.parent(iframe), Some(wrapper));
    }

    #[test]
    fn closest_includes_self() {
        let mut doc = Document::new();
        let body = doc.body();
        let button = doc.build(body, "button").class("close-btn").finish();
        let icon = doc.build(button, "i").class("bi-x").finish();

        let sel = Selector::tag("button");
        assert_eq!(doc.closest(icon, &sel), Some(button));
        assert_eq!(doc.closest(button, &sel), Some(button));
        assert_eq!(doc.closest(body, &sel), None);
    }
}
