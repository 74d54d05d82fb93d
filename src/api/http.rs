use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, Method, Url};

use crate::api::{ActionError, ActionRequest, ActionResult, HttpMethod, RequestBody, Transport};

/// 基于 reqwest 的传输层
///
/// 不检查 HTTP 状态码：成功与否由响应体的 `success` 字段决定，
/// 只有请求发不出去或响应体不是 JSON 才算网络层失败。
#[derive(Clone)]
pub struct HttpTransport {
    client: Client,
    base_url: Url,
}

impl HttpTransport {
    pub fn new(base_url: &str) -> anyhow::Result<Self> {
        let base_url = Url::parse(base_url)
            .map_err(|e| anyhow::anyhow!("后台地址无效 {base_url}：{e}"))?;
        Ok(Self::with_client(Client::new(), base_url))
    }

    pub fn with_client(client: Client, base_url: Url) -> Self {
        Self { client, base_url }
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn resolve(&self, url: &str) -> Result<Url, ActionError> {
        self.base_url
            .join(url)
            .map_err(|e| ActionError::Transport(format!("无效的请求地址 {url}：{e}")))
    }
}

fn to_reqwest(method: HttpMethod) -> Method {
    match method {
        HttpMethod::Get => Method::GET,
        HttpMethod::Post => Method::POST,
        HttpMethod::Put => Method::PUT,
        HttpMethod::Patch => Method::PATCH,
        HttpMethod::Delete => Method::DELETE,
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(&self, request: ActionRequest) -> Result<ActionResult, ActionError> {
        let url = self.resolve(&request.url)?;
        tracing::debug!(method = %request.method, %url, "发送后台操作请求");

        let builder = self.client.request(to_reqwest(request.method), url.clone());
        let builder = match request.body {
            RequestBody::Empty => builder.header(CONTENT_TYPE, "application/json"),
            RequestBody::Json(body) => builder.json(&body),
            RequestBody::Form(fields) if request.method == HttpMethod::Get => builder.query(&fields),
            RequestBody::Form(fields) => {
                let form = fields
                    .into_iter()
                    .fold(reqwest::multipart::Form::new(), |form, (name, value)| {
                        form.text(name, value)
                    });
                builder.multipart(form)
            }
        };

        let response = builder
            .send()
            .await
            .map_err(|e| ActionError::Transport(e.to_string()))?;
        let status = response.status();
        tracing::debug!(%status, %url, "后台接口已响应");

        response.json::<ActionResult>().await.map_err(|e| {
            tracing::warn!(%status, %url, "响应体不是合法的 JSON：{e}");
            ActionError::Transport(e.to_string())
        })
    }
}
