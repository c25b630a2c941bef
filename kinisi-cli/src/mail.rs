//! Mail gateway: find report threads, read plain-text bodies, mark
//! threads processed.
//!
//! The workflow needs only four operations, so the gateway is a narrow
//! trait with the Gmail REST implementation behind it; tests inject an
//! in-memory fake instead of rebinding anything global.

use async_trait::async_trait;
use base64::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::info;

use kinisi_core::ServiceError;

const GMAIL_API_BASE: &str = "https://gmail.googleapis.com/gmail/v1/users/me";

/// Handle to one mail conversation, the unit of processed/unprocessed
/// labeling.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThreadRef {
    pub id: String,
}

/// Handle to one message within a thread.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageRef {
    pub id: String,
}

#[async_trait]
pub trait MailGateway {
    /// Threads carrying the primary label but not the processed label.
    async fn unprocessed_threads(&self) -> Result<Vec<ThreadRef>, ServiceError>;

    /// Messages of a thread, in the order the mail service returns them.
    async fn messages(&self, thread: &ThreadRef) -> Result<Vec<MessageRef>, ServiceError>;

    /// Plain-text body of one message. HTML parts and attachments are
    /// never read.
    async fn plain_body(&self, message: &MessageRef) -> Result<String, ServiceError>;

    /// Attach the processed label, creating the label first if it does
    /// not exist yet. Idempotent.
    async fn mark_processed(&self, thread: &ThreadRef) -> Result<(), ServiceError>;
}

#[derive(Debug, Deserialize)]
struct ThreadListResponse {
    threads: Option<Vec<ThreadListEntry>>,
}

#[derive(Debug, Deserialize)]
struct ThreadListEntry {
    id: String,
}

#[derive(Debug, Deserialize)]
struct ThreadResponse {
    messages: Option<Vec<MessageEntry>>,
}

#[derive(Debug, Deserialize)]
struct MessageEntry {
    id: String,
}

#[derive(Debug, Deserialize)]
struct MessageResponse {
    payload: Option<MessagePart>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct MessagePart {
    mime_type: Option<String>,
    body: Option<PartBody>,
    parts: Option<Vec<MessagePart>>,
}

#[derive(Debug, Deserialize)]
struct PartBody {
    data: Option<String>,
}

#[derive(Debug, Deserialize)]
struct LabelsListResponse {
    labels: Option<Vec<GmailLabel>>,
}

#[derive(Debug, Deserialize)]
struct GmailLabel {
    id: String,
    name: String,
}

#[derive(Debug, Serialize)]
struct CreateLabelRequest {
    name: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ModifyRequest {
    add_label_ids: Vec<String>,
}

/// Gmail REST API v1 implementation of [`MailGateway`].
pub struct GmailMail {
    client: reqwest::Client,
    token: String,
    primary_label: String,
    processed_label: String,
}

impl GmailMail {
    pub fn new(token: String, primary_label: &str, processed_label: &str) -> GmailMail {
        GmailMail {
            client: reqwest::Client::new(),
            token,
            primary_label: primary_label.to_string(),
            processed_label: processed_label.to_string(),
        }
    }

    async fn get<T: for<'de> Deserialize<'de>>(
        &self,
        endpoint: &str,
        query: &[(&str, &str)],
    ) -> Result<T, ServiceError> {
        let url = format!("{GMAIL_API_BASE}{endpoint}");
        let response = self
            .client
            .get(&url)
            .bearer_auth(&self.token)
            .query(query)
            .send()
            .await
            .map_err(|e| ServiceError::Mail(format!("GET {endpoint}: {e}")))?;
        if !response.status().is_success() {
            return Err(ServiceError::Mail(format!(
                "GET {endpoint}: status {}",
                response.status()
            )));
        }
        response
            .json()
            .await
            .map_err(|e| ServiceError::Mail(format!("GET {endpoint}: {e}")))
    }

    async fn post<T: for<'de> Deserialize<'de>, B: Serialize>(
        &self,
        endpoint: &str,
        body: &B,
    ) -> Result<T, ServiceError> {
        let url = format!("{GMAIL_API_BASE}{endpoint}");
        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.token)
            .json(body)
            .send()
            .await
            .map_err(|e| ServiceError::Mail(format!("POST {endpoint}: {e}")))?;
        if !response.status().is_success() {
            return Err(ServiceError::Mail(format!(
                "POST {endpoint}: status {}",
                response.status()
            )));
        }
        response
            .json()
            .await
            .map_err(|e| ServiceError::Mail(format!("POST {endpoint}: {e}")))
    }

    /// Id of the processed label, creating the label on first use.
    async fn processed_label_id(&self) -> Result<String, ServiceError> {
        let listing: LabelsListResponse = self.get("/labels", &[]).await?;
        if let Some(label) = listing
            .labels
            .unwrap_or_default()
            .into_iter()
            .find(|label| label.name == self.processed_label)
        {
            return Ok(label.id);
        }

        info!("creating the processed label: {}", self.processed_label);
        let created: GmailLabel = self
            .post(
                "/labels",
                &CreateLabelRequest {
                    name: self.processed_label.clone(),
                },
            )
            .await?;
        Ok(created.id)
    }
}

/// Base64url data of the first text/plain part, walking nested multiparts.
fn find_plain_text(part: &MessagePart) -> Option<&str> {
    if part.mime_type.as_deref() == Some("text/plain") {
        if let Some(data) = part.body.as_ref().and_then(|body| body.data.as_deref()) {
            return Some(data);
        }
    }
    part.parts.as_ref()?.iter().find_map(find_plain_text)
}

fn decode_body(data: &str) -> Result<String, ServiceError> {
    let bytes = BASE64_URL_SAFE_NO_PAD
        .decode(data.trim_end_matches('='))
        .map_err(|e| ServiceError::Mail(format!("body decode: {e}")))?;
    String::from_utf8(bytes).map_err(|e| ServiceError::Mail(format!("body decode: {e}")))
}

#[async_trait]
impl MailGateway for GmailMail {
    async fn unprocessed_threads(&self) -> Result<Vec<ThreadRef>, ServiceError> {
        let query = format!(
            "label:{} -label:{}",
            self.primary_label, self.processed_label
        );
        let listing: ThreadListResponse = self.get("/threads", &[("q", query.as_str())]).await?;
        Ok(listing
            .threads
            .unwrap_or_default()
            .into_iter()
            .map(|thread| ThreadRef { id: thread.id })
            .collect())
    }

    async fn messages(&self, thread: &ThreadRef) -> Result<Vec<MessageRef>, ServiceError> {
        let endpoint = format!("/threads/{}", thread.id);
        let response: ThreadResponse = self.get(&endpoint, &[("format", "minimal")]).await?;
        Ok(response
            .messages
            .unwrap_or_default()
            .into_iter()
            .map(|message| MessageRef { id: message.id })
            .collect())
    }

    async fn plain_body(&self, message: &MessageRef) -> Result<String, ServiceError> {
        let endpoint = format!("/messages/{}", message.id);
        let response: MessageResponse = self.get(&endpoint, &[("format", "full")]).await?;
        let payload = response
            .payload
            .ok_or_else(|| ServiceError::Mail(format!("message {} has no payload", message.id)))?;
        let data = find_plain_text(&payload).ok_or_else(|| {
            ServiceError::Mail(format!("message {} has no text/plain part", message.id))
        })?;
        decode_body(data)
    }

    async fn mark_processed(&self, thread: &ThreadRef) -> Result<(), ServiceError> {
        let label_id = self.processed_label_id().await?;
        let endpoint = format!("/threads/{}/modify", thread.id);
        let _: serde_json::Value = self
            .post(
                &endpoint,
                &ModifyRequest {
                    add_label_ids: vec![label_id],
                },
            )
            .await?;
        Ok(())
    }
}
