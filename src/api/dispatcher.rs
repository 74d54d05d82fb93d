use std::sync::{Arc, Mutex};
use std::time::Duration;

use serde_json::json;
use tokio::task::JoinHandle;

use crate::api::{ActionError, ActionRequest, ActionResult, HttpMethod, Transport};
use crate::config::{MessagesConfig, PanelConfig};
use crate::dom::{self, ElementId, Selector, SharedDocument};
use crate::notify::{NotificationPresenter, Severity};
use crate::page::forms;

/// 删除前的交互确认（浏览器中对应 `window.confirm`）
pub trait Confirm: Send + Sync {
    fn confirm(&self, message: &str) -> bool;
}

/// 页面导航（浏览器中对应 `window.location`）
pub trait Navigator: Send + Sync {
    fn reload(&self);
    fn assign(&self, url: &str);
}

/// 分发器所在的宿主环境
#[derive(Clone)]
pub struct Browser {
    pub document: SharedDocument,
    pub navigator: Arc<dyn Navigator>,
    pub confirmer: Arc<dyn Confirm>,
}

#[derive(Debug, Clone)]
pub struct DispatcherSettings {
    pub reload_delay: Duration,
    pub confirm_message: String,
    pub messages: MessagesConfig,
}

impl Default for DispatcherSettings {
    fn default() -> Self {
        Self::from_config(&PanelConfig::default())
    }
}

impl DispatcherSettings {
    pub fn from_config(config: &PanelConfig) -> Self {
        Self {
            reload_delay: config.dispatcher.reload_delay(),
            confirm_message: config.dispatcher.confirm_message.clone(),
            messages: config.messages.clone(),
        }
    }
}

/// 一次调用在本地的结局；网络与应用层失败走 `Err(ActionError)`
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// 请求已发出且服务端返回成功
    Completed(ActionResult),
    /// 用户取消了删除确认，未发请求
    Declined,
    /// 批量操作没有选中任何项，未发请求
    NothingSelected,
}

/// 后台操作分发器
///
/// 单项操作（删除、改状态）成功后就地修改页面，找不到目标元素才整页刷新；
/// 批量操作成功后总是延迟整页刷新，不逐项回填。
#[derive(Clone)]
pub struct ActionDispatcher {
    transport: Arc<dyn Transport>,
    presenter: NotificationPresenter,
    browser: Browser,
    settings: Arc<DispatcherSettings>,
    reloads: Arc<Mutex<Vec<JoinHandle<()>>>>,
}

impl ActionDispatcher {
    pub fn new(
        transport: Arc<dyn Transport>,
        presenter: NotificationPresenter,
        browser: Browser,
        settings: DispatcherSettings,
    ) -> Self {
        Self {
            transport,
            presenter,
            browser,
            settings: Arc::new(settings),
            reloads: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn presenter(&self) -> &NotificationPresenter {
        &self.presenter
    }

    /// 确认后发送 `DELETE {url}/{id}`，成功则移除 `[data-id="{id}"]`
    pub async fn delete_item(
        &self,
        url: &str,
        id: &str,
        confirm_message: Option<&str>,
    ) -> Result<Outcome, ActionError> {
        let prompt = confirm_message.unwrap_or(&self.settings.confirm_message);
        if !self.browser.confirmer.confirm(prompt) {
            tracing::debug!(url, id, "用户取消删除");
            return Ok(Outcome::Declined);
        }

        let msgs = &self.settings.messages;
        let request = ActionRequest::new(HttpMethod::Delete, format!("{url}/{id}"));
        let result = self.execute(request, &msgs.delete_failed).await?;
        self.notify_success(&result, &msgs.delete_done);

        let removed = {
            let mut doc = dom::lock(&self.browser.document);
            match doc.select(&Selector::attr_equals("data-id", id)) {
                Some(el) => doc.remove(el),
                None => false,
            }
        };
        if !removed {
            self.schedule_reload();
        }

        Ok(Outcome::Completed(result))
    }

    /// `POST {url}/{id}/status`，成功后只按服务端确认的状态更新徽标
    pub async fn update_status(&self, url: &str, id: &str, status: &str) -> Result<Outcome, ActionError> {
        let msgs = &self.settings.messages;
        let request = ActionRequest::post_json(format!("{url}/{id}/status"), json!({ "status": status }));
        let result = self.execute(request, &msgs.status_failed).await?;
        self.notify_success(&result, &msgs.status_done);

        let updated = {
            let mut doc = dom::lock(&self.browser.document);
            let selector = Selector::attr_equals("data-id", id).descendant(Selector::class("status-badge"));
            match doc.select(&selector) {
                Some(badge) => {
                    apply_status(&mut doc, badge, status);
                    true
                }
                None => false,
            }
        };
        if !updated {
            self.schedule_reload();
        }

        Ok(Outcome::Completed(result))
    }

    /// 空选择直接给出警告，不发请求；成功后总是延迟整页刷新
    pub async fn bulk_action(&self, url: &str, action: &str, ids: &[String]) -> Result<Outcome, ActionError> {
        let msgs = &self.settings.messages;
        if ids.is_empty() {
            self.presenter
                .show(&msgs.warning_title, &msgs.empty_selection, Severity::Warning);
            return Ok(Outcome::NothingSelected);
        }

        let request = ActionRequest::post_json(url, json!({ "action": action, "ids": ids }));
        let result = self.execute(request, &msgs.bulk_failed).await?;
        self.notify_success(&result, &msgs.bulk_done);
        self.schedule_reload();

        Ok(Outcome::Completed(result))
    }

    /// 提交排序结果，只给通知，不改页面也不刷新
    pub async fn update_order(&self, url: &str, items: &[serde_json::Value]) -> Result<Outcome, ActionError> {
        let msgs = &self.settings.messages;
        let request = ActionRequest::post_json(url, json!({ "items": items }));
        let result = self.execute(request, &msgs.order_failed).await?;
        self.notify_success(&result, &msgs.order_done);

        Ok(Outcome::Completed(result))
    }

    /// 提交弹窗内的表单：地址取 `action`，方法取 `method`（默认 POST）
    ///
    /// 成功后关闭弹窗；有 `redirect` 则跳转，否则给出通知并按 `reload` 决定是否刷新。
    pub async fn submit_form(&self, form: ElementId) -> Result<Outcome, ActionError> {
        let msgs = &self.settings.messages;
        let (request, modal) = {
            let doc = dom::lock(&self.browser.document);
            let url = doc.attr(form, "action").unwrap_or_default().to_string();
            let method = doc
                .attr(form, "method")
                .map(HttpMethod::from_form_attr)
                .unwrap_or(HttpMethod::Post);
            let fields = forms::collect_fields(&doc, form);
            let modal = doc.closest(form, &Selector::class("modal"));
            (ActionRequest::form(method, url, fields), modal)
        };

        let result = self.execute(request, &msgs.form_failed).await?;

        if let Some(modal) = modal {
            dom::lock(&self.browser.document).remove_class(modal, "show");
        }

        match result.redirect_target() {
            Some(target) => {
                tracing::debug!(target, "表单提交成功，跳转");
                self.browser.navigator.assign(target);
            }
            None => {
                self.notify_success(&result, &msgs.form_done);
                if result.wants_reload() {
                    self.schedule_reload();
                }
            }
        }

        Ok(Outcome::Completed(result))
    }

    /// 等待所有已安排的延迟刷新执行完毕
    pub async fn settle(&self) {
        let pending: Vec<JoinHandle<()>> = {
            let mut reloads = self.reloads.lock().unwrap_or_else(|e| e.into_inner());
            reloads.drain(..).collect()
        };
        for handle in pending {
            if let Err(e) = handle.await {
                tracing::warn!("延迟刷新任务异常退出: {e}");
            }
        }
    }

    async fn execute(&self, request: ActionRequest, failure_fallback: &str) -> Result<ActionResult, ActionError> {
        let method = request.method;
        let url = request.url.clone();

        let outcome = match self.transport.send(request).await {
            Ok(result) => result.into_result(),
            Err(e) => Err(e),
        };

        if let Err(err) = &outcome {
            tracing::warn!(%method, url = %url, "后台操作失败: {err}");
            let msgs = &self.settings.messages;
            let text = err.user_message(&msgs.transport_error_prefix, failure_fallback);
            self.presenter.show(&msgs.error_title, &text, Severity::Error);
        }
        outcome
    }

    fn notify_success(&self, result: &ActionResult, fallback: &str) {
        let msgs = &self.settings.messages;
        self.presenter
            .show(&msgs.success_title, &result.message_or(fallback), Severity::Success);
    }

    fn schedule_reload(&self) {
        let navigator = Arc::clone(&self.browser.navigator);
        let delay = self.settings.reload_delay;
        tracing::debug!(?delay, "已安排整页刷新");

        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            navigator.reload();
        });

        let mut reloads = self.reloads.lock().unwrap_or_else(|e| e.into_inner());
        reloads.retain(|h| !h.is_finished());
        reloads.push(handle);
    }
}

/// 徽标 class 整体替换为 `status-badge status-badge-{小写状态}`，文本为原状态
fn apply_status(doc: &mut dom::Document, badge: ElementId, status: &str) {
    doc.set_class_name(badge, &format!("status-badge status-badge-{}", status.to_lowercase()));
    doc.set_text(badge, status);
}
