use anyhow::{Result, anyhow};
use async_trait::async_trait;
use axum::{
    Router,
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Json, Response},
    routing::post,
};
use serde::de::DeserializeOwned;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use super::{ChatSink, deliver_replies};
use crate::core::commands::{ChatBot, ChatEvent};
use crate::core::notify::Attachment;
use crate::core::text::is_direct_message;

#[derive(Clone)]
pub struct SlackState {
    pub bot: Arc<ChatBot>,
    pub sink: Arc<dyn ChatSink>,
    pub signing_secret: String,
}

#[derive(serde::Deserialize, Debug)]
struct SlackEventPayload {
    #[serde(rename = "type")]
    event_type: String,
    challenge: Option<String>,
    event: Option<SlackEventDetails>,
}

#[derive(serde::Deserialize, Debug)]
struct SlackEventDetails {
    #[serde(rename = "type")]
    inner_type: String,
    text: Option<String>,
    user: Option<String>,
    channel: Option<String>,
    bot_id: Option<String>,
}

/// Body of every Slack Web API response.
#[derive(serde::Deserialize, Debug)]
struct SlackResponse {
    ok: bool,
    #[serde(default)]
    error: Option<String>,
}

/// Reply of `files.getUploadURLExternal`.
#[derive(serde::Deserialize, Debug)]
struct UploadTicket {
    upload_url: String,
    file_id: String,
}

fn unix_now() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}

/// Check the `v0` HMAC-SHA256 signature Slack puts on every request.
pub(crate) fn verify_slack_signature(
    headers: &HeaderMap,
    body: &[u8],
    signing_secret: &str,
    now: u64,
) -> bool {
    use hmac::Mac;
    use sha2::Sha256;
    type HmacSha256 = hmac::Hmac<Sha256>;

    let Some(timestamp) = headers
        .get("x-slack-request-timestamp")
        .and_then(|v| v.to_str().ok())
    else {
        return false;
    };

    // stale requests may be replays
    match timestamp.parse::<u64>() {
        Ok(ts) if now.abs_diff(ts) <= 300 => {}
        _ => return false,
    }

    let Some(sig) = headers
        .get("x-slack-signature")
        .and_then(|v| v.to_str().ok())
    else {
        return false;
    };

    let Ok(mut mac) = HmacSha256::new_from_slice(signing_secret.as_bytes()) else {
        return false;
    };
    mac.update(format!("v0:{}:", timestamp).as_bytes());
    mac.update(body);
    let expected = format!("v0={}", hex::encode(mac.finalize().into_bytes()));

    // constant time
    if sig.len() != expected.len() {
        return false;
    }
    sig.as_bytes()
        .iter()
        .zip(expected.as_bytes().iter())
        .fold(0u8, |acc, (a, b)| acc | (a ^ b))
        == 0
}

/// Drop a leading `<@BOT>` mention so `@bot launch` reads as `launch`.
fn strip_mention(text: &str) -> &str {
    let trimmed = text.trim_start();
    if trimmed.starts_with("<@")
        && let Some(end) = trimmed.find('>')
    {
        return trimmed[end + 1..].trim_start();
    }
    trimmed
}

/// Channel mentions also arrive as plain `message` events, so those only
/// count in direct messages.
fn addressed_to_bot(event_type: &str, channel: &str) -> bool {
    match event_type {
        "app_mention" => true,
        "message" => is_direct_message(channel),
        _ => false,
    }
}

async fn slack_webhook(
    State(state): State<SlackState>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    if !state.signing_secret.is_empty()
        && !verify_slack_signature(&headers, &body, &state.signing_secret, unix_now())
    {
        return (
            StatusCode::UNAUTHORIZED,
            Json(serde_json::json!({ "error": "Invalid signature" })),
        )
            .into_response();
    }

    let payload: SlackEventPayload = match serde_json::from_slice(&body) {
        Ok(p) => p,
        Err(_) => {
            return (
                StatusCode::BAD_REQUEST,
                Json(serde_json::json!({ "error": "Invalid JSON" })),
            )
                .into_response();
        }
    };

    if payload.event_type == "url_verification"
        && let Some(challenge) = payload.challenge
    {
        return Json(serde_json::json!({ "challenge": challenge })).into_response();
    }

    if payload.event_type == "event_callback"
        && let Some(event) = payload.event
    {
        if event.bot_id.is_some() {
            return Json(serde_json::json!({ "status": "ignored_bot" })).into_response();
        }

        if let (Some(text), Some(user), Some(channel)) = (event.text, event.user, event.channel)
            && addressed_to_bot(&event.inner_type, &channel)
        {
            info!("Received Slack command from {} in {}: {}", user, channel, text);
            let event = ChatEvent {
                text: strip_mention(&text).to_string(),
                user,
                channel,
            };

            // Slack retries unless it gets a 200 quickly
            tokio::spawn(async move {
                let replies = state.bot.handle(&event).await;
                deliver_replies(state.sink.as_ref(), &event.channel, &replies).await;
            });
        }
    }

    Json(serde_json::json!({ "status": "ok" })).into_response()
}

pub fn router(state: SlackState) -> Router {
    Router::new()
        .route("/slack/events", post(slack_webhook))
        .with_state(state)
}

pub async fn serve(listen: &str, state: SlackState, cancel: CancellationToken) -> Result<()> {
    if state.signing_secret.is_empty() {
        warn!("No Slack signing secret configured. Webhook requests will NOT be verified.");
    }
    let listener = tokio::net::TcpListener::bind(listen).await?;
    info!("Slack webhook listening at http://{}/slack/events", listen);
    axum::serve(listener, router(state))
        .with_graceful_shutdown(cancel.cancelled_owned())
        .await?;
    info!("Slack webhook stopped");
    Ok(())
}

/// Slack Web API client used for replies and credential uploads.
pub struct SlackClient {
    client: reqwest::Client,
    api_base: String,
    bot_token: String,
}

impl SlackClient {
    pub fn new(api_base: impl Into<String>, bot_token: impl Into<String>) -> Self {
        let api_base: String = api_base.into();
        Self {
            client: reqwest::Client::new(),
            api_base: api_base.trim_end_matches('/').to_string(),
            bot_token: bot_token.into(),
        }
    }

    fn url(&self, method: &str) -> String {
        format!("{}/{}", self.api_base, method)
    }

    /// Read a Web API reply, failing on HTTP errors and `"ok": false`.
    async fn check<T: DeserializeOwned>(method: &str, res: reqwest::Response) -> Result<T> {
        if !res.status().is_success() {
            return Err(anyhow!("Slack {} returned HTTP {}", method, res.status()));
        }
        let body: serde_json::Value = res.json().await?;
        let status: SlackResponse = serde_json::from_value(body.clone())?;
        if !status.ok {
            return Err(anyhow!(
                "Slack {} failed: {}",
                method,
                status.error.unwrap_or_else(|| "unknown error".to_string())
            ));
        }
        Ok(serde_json::from_value(body)?)
    }

    /// External upload: reserve an upload URL, send the bytes there, then
    /// share the file into the channel with its comment.
    async fn upload_external(&self, attachment: &Attachment) -> Result<()> {
        let length = attachment.content.len().to_string();
        let res = self
            .client
            .post(self.url("files.getUploadURLExternal"))
            .bearer_auth(&self.bot_token)
            .form(&[
                ("filename", attachment.filename.as_str()),
                ("length", length.as_str()),
                ("snippet_type", attachment.filetype.as_str()),
            ])
            .send()
            .await?;
        let ticket: UploadTicket = Self::check("files.getUploadURLExternal", res).await?;

        let part = reqwest::multipart::Part::text(attachment.content.clone())
            .file_name(attachment.filename.clone());
        let res = self
            .client
            .post(&ticket.upload_url)
            .multipart(reqwest::multipart::Form::new().part("file", part))
            .send()
            .await?;
        if !res.status().is_success() {
            return Err(anyhow!("Slack upload of {} returned HTTP {}", ticket.file_id, res.status()));
        }

        let res = self
            .client
            .post(self.url("files.completeUploadExternal"))
            .bearer_auth(&self.bot_token)
            .json(&serde_json::json!({
                "files": [{ "id": ticket.file_id, "title": attachment.filename }],
                "channel_id": attachment.channel,
                "initial_comment": attachment.comment,
            }))
            .send()
            .await?;
        Self::check::<SlackResponse>("files.completeUploadExternal", res).await?;
        Ok(())
    }
}

#[async_trait]
impl ChatSink for SlackClient {
    async fn post_message(&self, channel: &str, text: &str) -> Result<()> {
        let res = self
            .client
            .post(self.url("chat.postMessage"))
            .bearer_auth(&self.bot_token)
            .json(&serde_json::json!({ "channel": channel, "text": text }))
            .send()
            .await?;
        Self::check::<SlackResponse>("chat.postMessage", res).await?;
        Ok(())
    }

    async fn upload_file(&self, attachment: &Attachment) -> Result<()> {
        self.upload_external(attachment).await.inspect_err(|e| {
            error!("Upload of {} failed: {:#}", attachment.filename, e);
        })
    }
}
