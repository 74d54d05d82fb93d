use thiserror::Error;

use crate::dom::{Document, ElementId};

#[derive(Debug, Error, PartialEq)]
pub enum SelectorError {
    #[error("选择器为空")]
    Empty,

    #[error("选择器语法错误（位置 {pos}）：{message}")]
    Syntax { pos: usize, message: String },
}

#[derive(Debug, Clone, PartialEq)]
enum AttrMatch {
    Exists,
    Equals(String),
    Contains(String),
}

/// 单个复合选择器：tag#id.class[attr]:checked
#[derive(Debug, Clone, Default, PartialEq)]
struct Compound {
    tag: Option<String>,
    id: Option<String>,
    classes: Vec<String>,
    attrs: Vec<(String, AttrMatch)>,
    checked: bool,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Combinator {
    Descendant,
    Child,
}

/// 由组合符连接的复合选择器链，`combinators[i]` 连接 `compounds[i]` 与 `compounds[i + 1]`
#[derive(Debug, Clone, PartialEq)]
struct Complex {
    compounds: Vec<Compound>,
    combinators: Vec<Combinator>,
}

/// CSS 选择器子集，覆盖页面标记约定用到的写法
///
/// 支持：标签、`*`、`#id`、`.class`、`[attr]`、`[attr="v"]`、`[attr*="v"]`、
/// `:checked`、后代组合符（空白）、子代组合符 `>`、逗号分隔的选择器列表。
#[derive(Debug, Clone, PartialEq)]
pub struct Selector {
    alternatives: Vec<Complex>,
}

impl Selector {
    pub fn parse(input: &str) -> Result<Self, SelectorError> {
        if input.trim().is_empty() {
            return Err(SelectorError::Empty);
        }

        let mut parser = Parser {
            chars: input.chars().collect(),
            pos: 0,
        };
        let mut alternatives = Vec::new();
        loop {
            alternatives.push(parser.complex()?);
            parser.skip_whitespace();
            match parser.peek() {
                None => break,
                Some(',') => parser.pos += 1,
                Some(c) => return Err(parser.error(format!("意外的字符 '{c}'"))),
            }
        }
        Ok(Self { alternatives })
    }

    fn single(compound: Compound) -> Self {
        Self {
            alternatives: vec![Complex {
                compounds: vec![compound],
                combinators: Vec::new(),
            }],
        }
    }

    pub fn tag(name: &str) -> Self {
        Self::single(Compound {
            tag: Some(name.to_ascii_lowercase()),
            ..Compound::default()
        })
    }

    pub fn class(name: &str) -> Self {
        Self::single(Compound {
            classes: vec![name.to_string()],
            ..Compound::default()
        })
    }

    pub fn id(id: &str) -> Self {
        Self::single(Compound {
            id: Some(id.to_string()),
            ..Compound::default()
        })
    }

    /// `[name="value"]`，值按原样比较，无需转义
    pub fn attr_equals(name: &str, value: &str) -> Self {
        Self::single(Compound {
            attrs: vec![(name.to_string(), AttrMatch::Equals(value.to_string()))],
            ..Compound::default()
        })
    }

    /// `[name]`
    pub fn has_attr(name: &str) -> Self {
        Self::single(Compound {
            attrs: vec![(name.to_string(), AttrMatch::Exists)],
            ..Compound::default()
        })
    }

    /// 在最右侧的复合选择器上追加 `[name="value"]`
    pub fn with_attr(mut self, name: &str, value: &str) -> Self {
        for complex in &mut self.alternatives {
            if let Some(last) = complex.compounds.last_mut() {
                last.attrs
                    .push((name.to_string(), AttrMatch::Equals(value.to_string())));
            }
        }
        self
    }

    /// 在最右侧的复合选择器上追加 `[name]`
    pub fn with_attr_present(mut self, name: &str) -> Self {
        for complex in &mut self.alternatives {
            if let Some(last) = complex.compounds.last_mut() {
                last.attrs.push((name.to_string(), AttrMatch::Exists));
            }
        }
        self
    }

    /// 在最右侧的复合选择器上追加 `:checked`
    pub fn checked(mut self) -> Self {
        for complex in &mut self.alternatives {
            if let Some(last) = complex.compounds.last_mut() {
                last.checked = true;
            }
        }
        self
    }

    /// 选择器列表：`self, other`
    pub fn or(mut self, other: Selector) -> Self {
        self.alternatives.extend(other.alternatives);
        self
    }

    /// 以后代组合符拼接：`self inner`
    pub fn descendant(self, inner: Selector) -> Self {
        let mut alternatives = Vec::with_capacity(self.alternatives.len() * inner.alternatives.len());
        for outer in &self.alternatives {
            for tail in &inner.alternatives {
                let mut compounds = outer.compounds.clone();
                let mut combinators = outer.combinators.clone();
                combinators.push(Combinator::Descendant);
                compounds.extend(tail.compounds.iter().cloned());
                combinators.extend(tail.combinators.iter().copied());
                alternatives.push(Complex {
                    compounds,
                    combinators,
                });
            }
        }
        Self { alternatives }
    }

    pub(crate) fn matches(&self, doc: &Document, el: ElementId) -> bool {
        self.alternatives.iter().any(|c| c.matches(doc, el))
    }
}

impl std::str::FromStr for Selector {
    type Err = SelectorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Complex {
    fn matches(&self, doc: &Document, el: ElementId) -> bool {
        self.matches_at(doc, el, self.compounds.len() - 1)
    }

    // 从右向左匹配，后代组合符需要回溯所有祖先
    fn matches_at(&self, doc: &Document, el: ElementId, idx: usize) -> bool {
        if !self.compounds[idx].matches(doc, el) {
            return false;
        }
        if idx == 0 {
            return true;
        }
        match self.combinators[idx - 1] {
            Combinator::Child => doc
                .parent(el)
                .is_some_and(|p| self.matches_at(doc, p, idx - 1)),
            Combinator::Descendant => {
                let mut current = doc.parent(el);
                while let Some(ancestor) = current {
                    if self.matches_at(doc, ancestor, idx - 1) {
                        return true;
                    }
                    current = doc.parent(ancestor);
                }
                false
            }
        }
    }
}

impl Compound {
    fn is_empty(&self) -> bool {
        self.tag.is_none()
            && self.id.is_none()
            && self.classes.is_empty()
            && self.attrs.is_empty()
            && !self.checked
    }

    fn matches(&self, doc: &Document, el: ElementId) -> bool {
        if let Some(tag) = &self.tag
            && doc.tag(el) != tag
        {
            return false;
        }
        if let Some(id) = &self.id
            && doc.attr(el, "id") != Some(id.as_str())
        {
            return false;
        }
        if !self.classes.iter().all(|c| doc.has_class(el, c)) {
            return false;
        }
        if self.checked && !doc.is_checked(el) {
            return false;
        }
        self.attrs.iter().all(|(name, rule)| {
            // class 不在属性表里，按拼接后的 className 比较
            let class_name;
            let value = if name == "class" {
                class_name = doc.class_name(el);
                (!class_name.is_empty()).then_some(class_name.as_str())
            } else {
                doc.attr(el, name)
            };
            match (rule, value) {
                (_, None) => false,
                (AttrMatch::Exists, Some(_)) => true,
                (AttrMatch::Equals(v), Some(actual)) => actual == v,
                (AttrMatch::Contains(v), Some(actual)) => actual.contains(v.as_str()),
            }
        })
    }
}

struct Parser {
    chars: Vec<char>,
    pos: usize,
}

impl Parser {
    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn error(&self, message: impl Into<String>) -> SelectorError {
        SelectorError::Syntax {
            pos: self.pos,
            message: message.into(),
        }
    }

    fn skip_whitespace(&mut self) -> bool {
        let start = self.pos;
        while self.peek().is_some_and(char::is_whitespace) {
            self.pos += 1;
        }
        self.pos > start
    }

    fn complex(&mut self) -> Result<Complex, SelectorError> {
        self.skip_whitespace();
        let mut compounds = vec![self.compound()?];
        let mut combinators = Vec::new();

        loop {
            let had_space = self.skip_whitespace();
            match self.peek() {
                None | Some(',') => break,
                Some('>') => {
                    self.pos += 1;
                    self.skip_whitespace();
                    combinators.push(Combinator::Child);
                }
                Some(_) if had_space => combinators.push(Combinator::Descendant),
                Some(c) => return Err(self.error(format!("意外的字符 '{c}'"))),
            }
            compounds.push(self.compound()?);
        }

        Ok(Complex {
            compounds,
            combinators,
        })
    }

    fn compound(&mut self) -> Result<Compound, SelectorError> {
        let mut compound = Compound::default();
        let mut universal = false;

        loop {
            match self.peek() {
                Some('*') if compound.is_empty() && !universal => {
                    self.pos += 1;
                    universal = true;
                }
                Some(c) if is_ident_char(c) && compound.is_empty() && !universal => {
                    compound.tag = Some(self.ident()?.to_ascii_lowercase());
                }
                Some('#') => {
                    self.pos += 1;
                    compound.id = Some(self.ident()?);
                }
                Some('.') => {
                    self.pos += 1;
                    compound.classes.push(self.ident()?);
                }
                Some('[') => {
                    self.pos += 1;
                    compound.attrs.push(self.attribute()?);
                }
                Some(':') => {
                    self.pos += 1;
                    let pseudo = self.ident()?;
                    if pseudo != "checked" {
                        return Err(self.error(format!("不支持的伪类 :{pseudo}")));
                    }
                    compound.checked = true;
                }
                _ => break,
            }
        }

        if compound.is_empty() && !universal {
            return Err(self.error("缺少选择器"));
        }
        Ok(compound)
    }

    fn attribute(&mut self) -> Result<(String, AttrMatch), SelectorError> {
        self.skip_whitespace();
        let name = self.ident()?;
        self.skip_whitespace();

        let rule = match self.peek() {
            Some(']') => AttrMatch::Exists,
            Some('=') => {
                self.pos += 1;
                AttrMatch::Equals(self.attr_value()?)
            }
            Some('*') if self.chars.get(self.pos + 1) == Some(&'=') => {
                self.pos += 2;
                AttrMatch::Contains(self.attr_value()?)
            }
            _ => return Err(self.error("属性选择器缺少 ']'")),
        };

        self.skip_whitespace();
        if self.peek() != Some(']') {
            return Err(self.error("属性选择器缺少 ']'"));
        }
        self.pos += 1;
        Ok((name, rule))
    }

    fn attr_value(&mut self) -> Result<String, SelectorError> {
        self.skip_whitespace();
        match self.peek() {
            Some(quote @ ('"' | '\'')) => {
                self.pos += 1;
                let start = self.pos;
                while let Some(c) = self.peek() {
                    if c == quote {
                        let value: String = self.chars[start..self.pos].iter().collect();
                        self.pos += 1;
                        return Ok(value);
                    }
                    self.pos += 1;
                }
                Err(self.error("引号未闭合"))
            }
            _ => self.ident(),
        }
    }

    fn ident(&mut self) -> Result<String, SelectorError> {
        let start = self.pos;
        while self.peek().is_some_and(is_ident_char) {
            self.pos += 1;
        }
        if self.pos == start {
            return Err(self.error("缺少标识符"));
        }
        Ok(self.chars[start..self.pos].iter().collect())
    }
}

fn is_ident_char(c: char) -> bool {
    c.is_alphanumeric() || c == '-' || c == '_'
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> (Document, ElementId, ElementId, ElementId) {
        let mut doc = Document::new();
        let body = doc.body();
        let table = doc.build(body, "table").class("posts").finish();
        let row = doc.build(table, "tr").attr("data-id", "7").finish();
        let badge = doc
            .build(row, "span")
            .class("status-badge")
            .class("status-badge-draft")
            .text("DRAFT")
            .finish();
        let checkbox = doc
            .build(row, "input")
            .attr("type", "checkbox")
            .class("item-checkbox")
            .checked(true)
            .finish();
        (doc, row, badge, checkbox)
    }

    #[test]
    fn parses_compound_and_combinators() {
        let (doc, row, badge, checkbox) = sample();

        let sel = Selector::parse(r#"[data-id="7"] .status-badge"#).unwrap();
        assert!(sel.matches(&doc, badge));
        assert!(!sel.matches(&doc, row));

        let child = Selector::parse("tr > input.item-checkbox:checked").unwrap();
        assert!(child.matches(&doc, checkbox));

        let not_child = Selector::parse("table > input").unwrap();
        assert!(!not_child.matches(&doc, checkbox));
    }

    #[test]
    fn selector_list_matches_any_alternative() {
        let (doc, row, badge, _) = sample();
        let sel = Selector::parse("button, a, tr").unwrap();
        assert!(sel.matches(&doc, row));
        assert!(!sel.matches(&doc, badge));
    }

    #[test]
    fn contains_and_existence_attribute_rules() {
        let mut doc = Document::new();
        let body = doc.body();
        let img = doc
            .build(body, "img")
            .attr("src", "https://images.unsplash.com/photo-1?w=800")
            .attr("data-src", "/real.jpg")
            .finish();

        assert!(Selector::parse(r#"img[src*="unsplash.com"]"#).unwrap().matches(&doc, img));
        assert!(Selector::parse("img[data-src]").unwrap().matches(&doc, img));
        assert!(!Selector::parse("img[alt]").unwrap().matches(&doc, img));
    }

    #[test]
    fn builder_matches_values_needing_escapes() {
        let mut doc = Document::new();
        let body = doc.body();
        let row = doc.build(body, "tr").attr("data-id", r#"a"b"#).finish();
        let badge = doc.build(row, "span").class("status-badge").finish();

        let sel = Selector::attr_equals("data-id", r#"a"b"#).descendant(Selector::class("status-badge"));
        assert!(sel.matches(&doc, badge));
    }

    #[test]
    fn rejects_malformed_input() {
        assert_eq!(Selector::parse("   "), Err(SelectorError::Empty));
        assert!(matches!(
            Selector::parse("div[data-id"),
            Err(SelectorError::Syntax { .. })
        ));
        assert!(matches!(
            Selector::parse("a:hover"),
            Err(SelectorError::Syntax { .. })
        ));
        assert!(matches!(
            Selector::parse(r#"[data-id="1]"#),
            Err(SelectorError::Syntax { .. })
        ));
    }
}
