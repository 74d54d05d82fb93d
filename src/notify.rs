use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::oneshot;
use tokio::time::Instant;

use crate::config::NotificationConfig;
use crate::dom::{self, ElementId, Selector, SharedDocument};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Info,
    Success,
    Warning,
    Error,
}

impl Severity {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Info => "info",
            Self::Success => "success",
            Self::Warning => "warning",
            Self::Error => "error",
        }
    }

    /// Bootstrap Icons 图标名
    fn icon(self) -> &'static str {
        match self {
            Self::Success => "check-circle",
            Self::Error => "exclamation-circle",
            Self::Info | Self::Warning => "info-circle",
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Notification {
    pub title: String,
    pub message: String,
    pub severity: Severity,
    pub auto_dismiss: Duration,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NotificationTiming {
    pub enter_delay: Duration,
    pub auto_dismiss: Duration,
    pub transition: Duration,
}

impl Default for NotificationTiming {
    fn default() -> Self {
        Self::from(&NotificationConfig::default())
    }
}

impl From<&NotificationConfig> for NotificationTiming {
    fn from(config: &NotificationConfig) -> Self {
        Self {
            enter_delay: config.enter_delay(),
            auto_dismiss: config.auto_dismiss(),
            transition: config.transition(),
        }
    }
}

/// 关闭时的退场方式
#[derive(Debug, Clone, Copy)]
enum Exit {
    /// 动态创建的通知：移除 `show`
    HideShow,
    /// 服务端渲染的通知：添加 `closing`
    AddClosing,
}

struct Lifecycle {
    node: ElementId,
    enter: Option<Duration>,
    dismiss_at: Option<Instant>,
    exit: Exit,
    transition: Duration,
}

/// 每条通知独立计时，通知之间不共享调度状态
#[derive(Clone)]
pub struct NotificationPresenter {
    document: SharedDocument,
    container: ElementId,
    timing: NotificationTiming,
    /// 通知节点 -> 关闭信号，仅用于把关闭按钮路由到对应的计时任务
    close_signals: Arc<Mutex<HashMap<ElementId, oneshot::Sender<()>>>>,
}

impl NotificationPresenter {
    pub fn new(document: SharedDocument, container: ElementId, timing: NotificationTiming) -> Self {
        Self {
            document,
            container,
            timing,
            close_signals: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    pub fn document(&self) -> &SharedDocument {
        &self.document
    }

    pub fn container(&self) -> ElementId {
        self.container
    }

    pub fn timing(&self) -> NotificationTiming {
        self.timing
    }

    /// 插入一条通知。容器已不在文档中时不显示，返回 None
    ///
    /// 需要在 tokio 运行时内调用，计时任务通过 `tokio::spawn` 启动。
    pub fn show(&self, title: &str, message: &str, severity: Severity) -> Option<NotificationHandle> {
        let notification = Notification {
            title: title.to_string(),
            message: message.to_string(),
            severity,
            auto_dismiss: self.timing.auto_dismiss,
        };

        let node = {
            let mut doc = dom::lock(&self.document);
            if !doc.is_connected(self.container) {
                tracing::warn!(title, "通知容器不在页面中，忽略通知");
                return None;
            }
            render(&mut doc, self.container, &notification)
        };

        match severity {
            Severity::Error => tracing::error!(title, message, "通知"),
            Severity::Warning => tracing::warn!(title, message, "通知"),
            Severity::Info | Severity::Success => tracing::info!(title, message, %severity, "通知"),
        }

        let created = Instant::now();
        self.start(Lifecycle {
            node,
            enter: Some(self.timing.enter_delay),
            dismiss_at: Some(created + notification.auto_dismiss),
            exit: Exit::HideShow,
            transition: self.timing.transition,
        });

        Some(NotificationHandle {
            node,
            presenter: self.clone(),
        })
    }

    /// 接管服务端渲染的 `.admin-notification`：绑定关闭按钮，
    /// 带 `data-auto-dismiss` 的按其毫秒数自动关闭（无法解析或为 0 时用默认时长）
    pub fn adopt_existing(&self) -> Vec<ElementId> {
        let nodes: Vec<(ElementId, Option<Duration>)> = {
            let doc = dom::lock(&self.document);
            let signals = self.close_signals.lock().unwrap_or_else(|e| e.into_inner());
            doc.select_all(&Selector::class("admin-notification"))
                .into_iter()
                .filter(|node| !signals.contains_key(node))
                .map(|node| {
                    let delay = doc.attr(node, "data-auto-dismiss").map(|raw| {
                        match raw.trim().parse::<u64>() {
                            Ok(ms) if ms > 0 => Duration::from_millis(ms),
                            _ => self.timing.auto_dismiss,
                        }
                    });
                    (node, delay)
                })
                .collect()
        };

        let now = Instant::now();
        for (node, delay) in &nodes {
            self.start(Lifecycle {
                node: *node,
                enter: None,
                dismiss_at: delay.map(|d| now + d),
                exit: Exit::AddClosing,
                transition: self.timing.transition,
            });
        }
        tracing::debug!(count = nodes.len(), "已接管页面内的通知");
        nodes.into_iter().map(|(node, _)| node).collect()
    }

    /// 关闭按钮被点击，`target` 可以是按钮本身或按钮内的图标
    pub fn close_clicked(&self, target: ElementId) -> bool {
        let node = {
            let doc = dom::lock(&self.document);
            let Some(button) = doc.closest(target, &Selector::class("close-btn")) else {
                return false;
            };
            doc.closest(button, &Selector::class("admin-notification"))
        };
        node.is_some_and(|node| self.dismiss(node))
    }

    /// 提前关闭通知，已经关闭或不存在时返回 false
    pub fn dismiss(&self, node: ElementId) -> bool {
        let sender = self
            .close_signals
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .remove(&node);
        match sender {
            Some(tx) => tx.send(()).is_ok(),
            None => false,
        }
    }

    /// 当前仍在显示（尚未开始退场）的通知数量
    pub fn active_count(&self) -> usize {
        self.close_signals
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .len()
    }

    fn start(&self, lifecycle: Lifecycle) {
        let (tx, rx) = oneshot::channel();
        self.close_signals
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert(lifecycle.node, tx);

        let document = Arc::clone(&self.document);
        let signals = Arc::clone(&self.close_signals);
        tokio::spawn(run_lifecycle(document, signals, lifecycle, rx));
    }
}

/// 单条通知的句柄，可用于提前关闭
#[derive(Clone)]
pub struct NotificationHandle {
    node: ElementId,
    presenter: NotificationPresenter,
}

impl NotificationHandle {
    pub fn node(&self) -> ElementId {
        self.node
    }

    pub fn close(&self) -> bool {
        self.presenter.dismiss(self.node)
    }
}

fn render(doc: &mut dom::Document, container: ElementId, notification: &Notification) -> ElementId {
    let severity = notification.severity;
    let node = doc
        .build(container, "div")
        .class("admin-notification")
        .class(severity.as_str())
        .attr(
            "data-auto-dismiss",
            &notification.auto_dismiss.as_millis().to_string(),
        )
        .finish();

    let icon = doc.build(node, "div").class("notification-icon").finish();
    doc.build(icon, "i")
        .class("bi")
        .class(&format!("bi-{}-fill", severity.icon()))
        .finish();

    let content = doc.build(node, "div").class("notification-content").finish();
    doc.build(content, "h6").text(&notification.title).finish();
    doc.build(content, "p").text(&notification.message).finish();

    let close = doc.build(node, "button").class("close-btn").finish();
    doc.build(close, "i").class("bi").class("bi-x").finish();

    node
}

async fn run_lifecycle(
    document: SharedDocument,
    signals: Arc<Mutex<HashMap<ElementId, oneshot::Sender<()>>>>,
    lifecycle: Lifecycle,
    mut close_rx: oneshot::Receiver<()>,
) {
    let node = lifecycle.node;
    let mut closed = false;

    if let Some(enter) = lifecycle.enter {
        tokio::select! {
            _ = tokio::time::sleep(enter) => {
                dom::lock(&document).add_class(node, "show");
            }
            _ = &mut close_rx => closed = true,
        }
    }

    if !closed {
        match lifecycle.dismiss_at {
            Some(deadline) => {
                tokio::select! {
                    _ = tokio::time::sleep_until(deadline) => {}
                    _ = &mut close_rx => {}
                }
            }
            None => {
                // 没有自动关闭，只等关闭按钮；发送端被丢弃同样视为关闭
                let _ = (&mut close_rx).await;
            }
        }
    }

    signals
        .lock()
        .unwrap_or_else(|e| e.into_inner())
        .remove(&node);

    {
        let mut doc = dom::lock(&document);
        match lifecycle.exit {
            Exit::HideShow => doc.remove_class(node, "show"),
            Exit::AddClosing => doc.add_class(node, "closing"),
        }
    }

    tokio::time::sleep(lifecycle.transition).await;
    dom::lock(&document).remove(node);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::Document;

    fn presenter() -> NotificationPresenter {
        let mut doc = Document::new();
        let body = doc.body();
        let container = doc.build(body, "div").class("notification-container").finish();
        NotificationPresenter::new(doc.into_shared(), container, NotificationTiming::default())
    }

    fn notifications(presenter: &NotificationPresenter) -> Vec<ElementId> {
        dom::lock(presenter.document()).select_all(&Selector::class("admin-notification"))
    }

    async fn advance(ms: u64) {
        tokio::time::sleep(Duration::from_millis(ms)).await;
    }

    #[tokio::test(start_paused = true)]
    async fn renders_and_becomes_visible_after_enter_delay() {
        let presenter = presenter();
        let handle = presenter.show("Başarılı", "deleted", Severity::Success).unwrap();
        let node = handle.node();

        {
            let doc = dom::lock(presenter.document());
            assert_eq!(doc.class_name(node), "admin-notification success");
            assert!(!doc.has_class(node, "show"));
            assert_eq!(doc.attr(node, "data-auto-dismiss"), Some("5000"));
            let icon = doc.query_selector(".notification-icon i").unwrap().unwrap();
            assert!(doc.has_class(icon, "bi-check-circle-fill"));
            let title = doc.select_within(node, &Selector::tag("h6")).unwrap();
            assert_eq!(doc.text(title), "Başarılı");
            let message = doc.select_within(node, &Selector::tag("p")).unwrap();
            assert_eq!(doc.text(message), "deleted");
        }

        advance(11).await;
        assert!(dom::lock(presenter.document()).has_class(node, "show"));
    }

    #[tokio::test(start_paused = true)]
    async fn auto_dismiss_removes_node_after_transition() {
        let presenter = presenter();
        let node = presenter.show("Hata", "boom", Severity::Error).unwrap().node();

        advance(5001).await;
        {
            let doc = dom::lock(presenter.document());
            assert!(doc.is_connected(node));
            assert!(!doc.has_class(node, "show"));
        }
        assert_eq!(presenter.active_count(), 0);

        advance(300).await;
        assert!(!dom::lock(presenter.document()).is_connected(node));
    }

    #[tokio::test(start_paused = true)]
    async fn close_control_dismisses_immediately() {
        let presenter = presenter();
        let node = presenter.show("Bilgi", "x", Severity::Info).unwrap().node();
        advance(100).await;

        let icon = {
            let doc = dom::lock(presenter.document());
            doc.select_within(node, &Selector::parse(".close-btn i").unwrap()).unwrap()
        };
        assert!(presenter.close_clicked(icon));
        assert!(!presenter.close_clicked(icon));

        advance(1).await;
        assert!(!dom::lock(presenter.document()).has_class(node, "show"));
        advance(300).await;
        assert!(!dom::lock(presenter.document()).is_connected(node));
    }

    #[tokio::test(start_paused = true)]
    async fn closing_before_enter_skips_show() {
        let presenter = presenter();
        let handle = presenter.show("Uyarı", "x", Severity::Warning).unwrap();
        let node = handle.node();

        assert!(handle.close());
        assert_eq!(presenter.active_count(), 0);

        advance(11).await;
        {
            let doc = dom::lock(presenter.document());
            assert!(doc.is_connected(node));
            assert!(!doc.has_class(node, "show"));
        }

        advance(290).await;
        assert!(!dom::lock(presenter.document()).is_connected(node));
    }

    #[tokio::test(start_paused = true)]
    async fn stacked_notifications_keep_independent_timers() {
        let presenter = presenter();
        let first = presenter.show("A", "1", Severity::Info).unwrap();
        advance(2000).await;
        let second = presenter.show("B", "2", Severity::Warning).unwrap();
        assert_eq!(notifications(&presenter).len(), 2);

        assert!(first.close());
        advance(301).await;
        assert_eq!(notifications(&presenter), vec![second.node()]);

        // 第二条从自己的创建时刻计时
        advance(4600).await;
        assert!(dom::lock(presenter.document()).is_connected(second.node()));
        advance(500).await;
        assert!(notifications(&presenter).is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn detached_container_shows_nothing() {
        let presenter = presenter();
        dom::lock(presenter.document()).remove(presenter.container());
        assert!(presenter.show("A", "1", Severity::Info).is_none());
        assert_eq!(presenter.active_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn adopts_server_rendered_notifications() {
        let presenter = presenter();
        let (timed, sticky, fallback) = {
            let mut doc = dom::lock(presenter.document());
            let container = presenter.container();
            let timed = doc
                .build(container, "div")
                .class("admin-notification")
                .attr("data-auto-dismiss", "2000")
                .finish();
            let sticky = doc.build(container, "div").class("admin-notification").finish();
            doc.build(sticky, "button").class("close-btn").finish();
            let fallback = doc
                .build(container, "div")
                .class("admin-notification")
                .attr("data-auto-dismiss", "soon")
                .finish();
            (timed, sticky, fallback)
        };

        let adopted = presenter.adopt_existing();
        assert_eq!(adopted, vec![timed, sticky, fallback]);
        assert!(presenter.adopt_existing().is_empty());

        advance(2001).await;
        assert!(dom::lock(presenter.document()).has_class(timed, "closing"));
        advance(300).await;
        assert!(!dom::lock(presenter.document()).is_connected(timed));

        advance(3000).await;
        {
            let doc = dom::lock(presenter.document());
            assert!(!doc.is_connected(fallback));
            assert!(doc.is_connected(sticky));
        }

        let button = dom::lock(presenter.document())
            .select_within(sticky, &Selector::class("close-btn"))
            .unwrap();
        assert!(presenter.close_clicked(button));
        advance(301).await;
        assert!(!dom::lock(presenter.document()).is_connected(sticky));
    }
}
