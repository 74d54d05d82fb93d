use async_trait::async_trait;
use serde::Deserialize;
use thiserror::Error;

pub mod dispatcher;
pub mod http;

pub use dispatcher::{ActionDispatcher, Browser, Confirm, DispatcherSettings, Navigator, Outcome};
pub use http::HttpTransport;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Patch,
    Delete,
}

impl HttpMethod {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Patch => "PATCH",
            Self::Delete => "DELETE",
        }
    }

    /// 表单 `method` 属性，空值或无法识别时按 POST 处理
    pub fn from_form_attr(raw: &str) -> Self {
        match raw.trim().to_ascii_uppercase().as_str() {
            "GET" => Self::Get,
            "PUT" => Self::Put,
            "PATCH" => Self::Patch,
            "DELETE" => Self::Delete,
            _ => Self::Post,
        }
    }
}

impl std::fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum RequestBody {
    Empty,
    Json(serde_json::Value),
    /// 表单字段，按 multipart 发送（GET 时拼到查询串）
    Form(Vec<(String, String)>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct ActionRequest {
    pub url: String,
    pub method: HttpMethod,
    pub body: RequestBody,
}

impl ActionRequest {
    pub fn new(method: HttpMethod, url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            method,
            body: RequestBody::Empty,
        }
    }

    pub fn post_json(url: impl Into<String>, body: serde_json::Value) -> Self {
        Self {
            url: url.into(),
            method: HttpMethod::Post,
            body: RequestBody::Json(body),
        }
    }

    pub fn form(method: HttpMethod, url: impl Into<String>, fields: Vec<(String, String)>) -> Self {
        Self {
            url: url.into(),
            method,
            body: RequestBody::Form(fields),
        }
    }
}

/// 服务端约定的响应体 `{success, message?, redirect?, reload?}`
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ActionResult {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub redirect: Option<String>,
    #[serde(default)]
    pub reload: Option<bool>,
}

impl ActionResult {
    /// 服务端消息，缺失或为空时用兜底文案
    pub fn message_or(&self, fallback: &str) -> String {
        non_empty(self.message.as_deref()).unwrap_or(fallback).to_string()
    }

    pub fn redirect_target(&self) -> Option<&str> {
        non_empty(self.redirect.as_deref())
    }

    pub fn wants_reload(&self) -> bool {
        self.reload.unwrap_or(false)
    }

    /// `success: false` 转为应用层错误
    pub fn into_result(self) -> Result<Self, ActionError> {
        if self.success {
            Ok(self)
        } else {
            Err(ActionError::Application {
                message: self.message,
            })
        }
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|s| !s.is_empty())
}

/// 两类错误都不致命，只会变成一条错误通知
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ActionError {
    /// 请求未能完成或响应体不是合法 JSON
    #[error("请求失败：{0}")]
    Transport(String),

    /// 服务端返回 `success: false`
    #[error("操作失败：{}", message.as_deref().unwrap_or("服务端未说明原因"))]
    Application { message: Option<String> },
}

impl ActionError {
    /// 用于通知的文案：网络错误拼接前缀，应用错误优先服务端消息
    pub fn user_message(&self, transport_prefix: &str, fallback: &str) -> String {
        match self {
            Self::Transport(detail) => format!("{transport_prefix}{detail}"),
            Self::Application { message } => non_empty(message.as_deref()).unwrap_or(fallback).to_string(),
        }
    }
}

/// 每次调用至多发送一次，不重试
#[async_trait]
pub trait Transport: Send + Sync {
    /// 发送请求并解析响应体；`success: false` 不在这里转成错误
    async fn send(&self, request: ActionRequest) -> Result<ActionResult, ActionError>;
}
