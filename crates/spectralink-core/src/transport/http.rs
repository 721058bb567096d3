//! HTTP implementation of the collaborator boundary.

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, Response};
use tracing::{debug, info};
use url::Url;

use super::ChatTransport;
use crate::auth::{Credentials, LoginResponse, Registration};
use crate::config::ClientConfig;
use crate::error::{ChatError, Result};
use crate::models::{
    Attachment, Group, MessageQuery, NewGroup, OutgoingMessage, RosterEntry, UploadResponse,
    WireMessage,
};

/// Talks to a SpectraLink server over JSON/HTTP.
#[derive(Clone)]
pub struct HttpTransport {
    client: Client,
    base_url: String,
}

impl HttpTransport {
    pub fn new(config: &ClientConfig) -> Result<Self> {
        // Fail early on a malformed base URL rather than on the first request.
        Url::parse(&config.server_url)?;

        let client = Client::builder()
            .timeout(config.request_timeout)
            .build()?;

        Ok(Self {
            client,
            base_url: config.server_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Absolute URL for an attachment locator returned by the server.
    pub fn resolve_locator(&self, locator: &str) -> String {
        if locator.starts_with("http://") || locator.starts_with("https://") {
            locator.to_string()
        } else {
            format!("{}/{}", self.base_url, locator.trim_start_matches('/'))
        }
    }

    fn endpoint(&self, path: &str) -> Result<Url> {
        Ok(Url::parse(&format!("{}/{}", self.base_url, path))?)
    }

    /// Log in and return the identity as stored by the server.
    pub async fn login(&self, credentials: &Credentials) -> Result<String> {
        let resp = self
            .client
            .post(self.endpoint("login")?)
            .json(&credentials.to_wire())
            .send()
            .await?;
        let body: LoginResponse = check(resp).await?.json().await?;
        info!("Logged in as {}", credentials.username);
        Ok(body.username)
    }

    pub async fn register(&self, registration: &Registration) -> Result<()> {
        registration.validate()?;
        let resp = self
            .client
            .post(self.endpoint("register")?)
            .json(&registration.to_wire())
            .send()
            .await?;
        check(resp).await?;
        info!("Registered {}", registration.username);
        Ok(())
    }

    pub async fn download(&self, locator: &str) -> Result<Vec<u8>> {
        let resp = self.client.get(self.resolve_locator(locator)).send().await?;
        Ok(check(resp).await?.bytes().await?.to_vec())
    }
}

#[async_trait]
impl ChatTransport for HttpTransport {
    async fn fetch_roster(&self) -> Result<Vec<RosterEntry>> {
        let resp = self.client.get(self.endpoint("users")?).send().await?;
        Ok(check(resp).await?.json().await?)
    }

    async fn fetch_messages(&self, query: &MessageQuery) -> Result<Vec<WireMessage>> {
        let mut url = self.endpoint("messages")?;
        url.query_pairs_mut().extend_pairs(query.params());
        debug!("GET {}", url);

        let resp = self.client.get(url).send().await?;
        Ok(check(resp).await?.json().await?)
    }

    async fn send_message(&self, message: &OutgoingMessage) -> Result<()> {
        let resp = self
            .client
            .post(self.endpoint("send")?)
            .json(message)
            .send()
            .await?;
        check(resp).await?;
        Ok(())
    }

    async fn upload_attachment(&self, attachment: &Attachment) -> Result<String> {
        let mut part = Part::bytes(attachment.bytes.clone()).file_name(attachment.filename.clone());
        if let Some(content_type) = &attachment.content_type {
            part = part.mime_str(content_type)?;
        }
        let form = Form::new().part("file", part);

        let resp = self
            .client
            .post(self.endpoint("upload")?)
            .multipart(form)
            .send()
            .await?;
        let body: UploadResponse = check(resp).await?.json().await?;
        debug!("Uploaded {} -> {}", attachment.filename, body.url);
        Ok(body.url)
    }

    async fn fetch_groups(&self, member: &str) -> Result<Vec<Group>> {
        let mut url = self.endpoint("groups")?;
        url.query_pairs_mut().append_pair("user", member);

        let resp = self.client.get(url).send().await?;
        Ok(check(resp).await?.json().await?)
    }

    async fn create_group(&self, group: &NewGroup) -> Result<Group> {
        let resp = self
            .client
            .post(self.endpoint("groups")?)
            .json(group)
            .send()
            .await?;
        Ok(check(resp).await?.json().await?)
    }
}

/// Turn a non-success response into [`ChatError::Status`], keeping the
/// server's error message when it sent one.
async fn check(resp: Response) -> Result<Response> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }

    let text = resp.text().await.unwrap_or_default();
    let message = serde_json::from_str::<serde_json::Value>(&text)
        .ok()
        .and_then(|v| v["error"]["message"].as_str().map(str::to_string))
        .unwrap_or(text);

    Err(ChatError::Status {
        status: status.as_u16(),
        message,
    })
}
