use anyhow::Result;
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

#[derive(Debug, Default, Deserialize)]
pub struct PanelConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub notification: NotificationConfig,
    #[serde(default)]
    pub dispatcher: DispatcherConfig,
    #[serde(default)]
    pub messages: MessagesConfig,
}

#[derive(Debug, Deserialize)]
pub struct ServerConfig {
    /// 后台接口地址，相对 URL 基于它解析
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NotificationConfig {
    /// 插入节点到添加 show class 的间隔，给 CSS 过渡留一帧
    #[serde(default = "default_enter_delay_ms")]
    pub enter_delay_ms: u64,
    #[serde(default = "default_auto_dismiss_ms")]
    pub auto_dismiss_ms: u64,
    #[serde(default = "default_transition_ms")]
    pub transition_ms: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DispatcherConfig {
    #[serde(default = "default_reload_delay_ms")]
    pub reload_delay_ms: u64,
    #[serde(default = "default_confirm_message")]
    pub confirm_message: String,
}

/// 所有用户可见的标题与兜底文案，服务端未返回 message 时使用
#[derive(Debug, Clone, Deserialize)]
pub struct MessagesConfig {
    #[serde(default = "default_success_title")]
    pub success_title: String,
    #[serde(default = "default_error_title")]
    pub error_title: String,
    #[serde(default = "default_warning_title")]
    pub warning_title: String,
    /// 网络层失败时拼接在错误详情前
    #[serde(default = "default_transport_error_prefix")]
    pub transport_error_prefix: String,
    #[serde(default = "default_delete_done")]
    pub delete_done: String,
    #[serde(default = "default_delete_failed")]
    pub delete_failed: String,
    #[serde(default = "default_status_done")]
    pub status_done: String,
    #[serde(default = "default_status_failed")]
    pub status_failed: String,
    #[serde(default = "default_bulk_done")]
    pub bulk_done: String,
    #[serde(default = "default_bulk_failed")]
    pub bulk_failed: String,
    #[serde(default = "default_empty_selection")]
    pub empty_selection: String,
    #[serde(default = "default_order_done")]
    pub order_done: String,
    #[serde(default = "default_order_failed")]
    pub order_failed: String,
    #[serde(default = "default_form_done")]
    pub form_done: String,
    #[serde(default = "default_form_failed")]
    pub form_failed: String,
}

impl PanelConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("读取 {} 失败：{}", path.display(), e))?;
        Self::parse(&content).map_err(|e| anyhow::anyhow!("解析 {} 失败：{}", path.display(), e))
    }

    pub fn parse(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// 配置文件不存在时使用默认值，存在但解析失败仍然报错
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        Self::load(path)
    }

    /// 检查取值是否合理，返回全部问题描述
    pub fn validate(&self) -> Vec<String> {
        let mut problems = Vec::new();

        if let Err(e) = reqwest::Url::parse(&self.server.base_url) {
            problems.push(format!("server.base_url 无效（{}）：{e}", self.server.base_url));
        }
        if tracing_subscriber::EnvFilter::try_new(&self.server.log_level).is_err() {
            problems.push(format!("server.log_level 无效：{}", self.server.log_level));
        }
        if self.notification.auto_dismiss_ms == 0 {
            problems.push("notification.auto_dismiss_ms 不能为 0".to_string());
        }
        if self.notification.enter_delay_ms >= self.notification.auto_dismiss_ms {
            problems.push("notification.enter_delay_ms 必须小于 auto_dismiss_ms".to_string());
        }
        if self.dispatcher.confirm_message.trim().is_empty() {
            problems.push("dispatcher.confirm_message 不能为空".to_string());
        }

        problems
    }
}

impl NotificationConfig {
    pub fn enter_delay(&self) -> Duration {
        Duration::from_millis(self.enter_delay_ms)
    }

    pub fn auto_dismiss(&self) -> Duration {
        Duration::from_millis(self.auto_dismiss_ms)
    }

    pub fn transition(&self) -> Duration {
        Duration::from_millis(self.transition_ms)
    }
}

impl DispatcherConfig {
    pub fn reload_delay(&self) -> Duration {
        Duration::from_millis(self.reload_delay_ms)
    }
}

// 默认值函数
fn default_base_url() -> String { "http://127.0.0.1:3000".into() }
fn default_log_level() -> String { "info".into() }
fn default_enter_delay_ms() -> u64 { 10 }
fn default_auto_dismiss_ms() -> u64 { 5000 }
fn default_transition_ms() -> u64 { 300 }
fn default_reload_delay_ms() -> u64 { 1000 }
fn default_confirm_message() -> String { "Bu öğeyi silmek istediğinize emin misiniz?".into() }
fn default_success_title() -> String { "Başarılı".into() }
fn default_error_title() -> String { "Hata".into() }
fn default_warning_title() -> String { "Uyarı".into() }
fn default_transport_error_prefix() -> String { "Bir hata oluştu: ".into() }
fn default_delete_done() -> String { "Öğe başarıyla silindi".into() }
fn default_delete_failed() -> String { "Silme işlemi başarısız oldu".into() }
fn default_status_done() -> String { "Durum başarıyla güncellendi".into() }
fn default_status_failed() -> String { "Durum güncelleme başarısız oldu".into() }
fn default_bulk_done() -> String { "İşlem başarıyla tamamlandı".into() }
fn default_bulk_failed() -> String { "İşlem başarısız oldu".into() }
fn default_empty_selection() -> String { "Lütfen en az bir öğe seçin".into() }
fn default_order_done() -> String { "Sıralama başarıyla güncellendi".into() }
fn default_order_failed() -> String { "Sıralama güncelleme başarısız oldu".into() }
fn default_form_done() -> String { "İşlem başarıyla tamamlandı".into() }
fn default_form_failed() -> String { "Bir hata oluştu".into() }

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            log_level: default_log_level(),
        }
    }
}

impl Default for NotificationConfig {
    fn default() -> Self {
        Self {
            enter_delay_ms: default_enter_delay_ms(),
            auto_dismiss_ms: default_auto_dismiss_ms(),
            transition_ms: default_transition_ms(),
        }
    }
}

impl Default for DispatcherConfig {
    fn default() -> Self {
        Self {
            reload_delay_ms: default_reload_delay_ms(),
            confirm_message: default_confirm_message(),
        }
    }
}

impl Default for MessagesConfig {
    fn default() -> Self {
        Self {
            success_title: default_success_title(),
            error_title: default_error_title(),
            warning_title: default_warning_title(),
            transport_error_prefix: default_transport_error_prefix(),
            delete_done: default_delete_done(),
            delete_failed: default_delete_failed(),
            status_done: default_status_done(),
            status_failed: default_status_failed(),
            bulk_done: default_bulk_done(),
            bulk_failed: default_bulk_failed(),
            empty_selection: default_empty_selection(),
            order_done: default_order_done(),
            order_failed: default_order_failed(),
            form_done: default_form_done(),
            form_failed: default_form_failed(),
        }
    }
}
