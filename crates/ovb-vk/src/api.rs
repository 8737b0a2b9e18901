//! Thin client for the VK API (`api.vk.com/method/*`).
//!
//! Every call is an HTTPS POST form; the body comes back wrapped in either a
//! `response` or an `error { error_code, error_msg }` envelope.

use std::time::Duration;

use serde::{de::DeserializeOwned, Deserialize, Deserializer};

use ovb_core::{
    domain::{ChatId, PeerId},
    errors::Error,
    messaging::types::DedupToken,
    Result,
};

const API_BASE: &str = "https://api.vk.com/method";

#[derive(Clone, Debug)]
pub struct VkApi {
    http: reqwest::Client,
    token: String,
    version: String,
}

#[derive(Debug, Deserialize)]
struct Envelope<T> {
    response: Option<T>,
    error: Option<ApiError>,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    error_code: i64,
    error_msg: String,
}

/// Community the access token belongs to (`groups.getById`).
#[derive(Clone, Debug, Deserialize)]
pub struct GroupInfo {
    pub id: i64,
    pub name: String,
    pub screen_name: String,
}

/// Bots Long Poll session (`groups.getLongPollServer`).
#[derive(Clone, Debug, Deserialize)]
pub struct LongPollServer {
    pub key: String,
    pub server: String,
    #[serde(deserialize_with = "de_string_or_number")]
    pub ts: String,
}

impl VkApi {
    pub fn new(token: String, version: String, timeout: Duration) -> Self {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .expect("reqwest client build");
        Self {
            http,
            token,
            version,
        }
    }

    async fn call<T: DeserializeOwned>(&self, method: &str, params: &[(&str, String)]) -> Result<T> {
        let url = format!("{API_BASE}/{method}");

        let mut form: Vec<(&str, String)> = params.to_vec();
        form.push(("access_token", self.token.clone()));
        form.push(("v", self.version.clone()));

        let resp = self
            .http
            .post(url)
            .form(&form)
            .send()
            .await
            .map_err(|e| Error::External(format!("vk request error: {e}")))?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            return Err(Error::External(format!(
                "vk {method} failed: {status} {}",
                body.chars().take(200).collect::<String>()
            )));
        }

        let envelope: Envelope<T> = resp
            .json()
            .await
            .map_err(|e| Error::External(format!("vk json error: {e}")))?;

        if let Some(err) = envelope.error {
            return Err(Error::Api {
                code: err.error_code,
                message: err.error_msg,
            });
        }

        envelope
            .response
            .ok_or_else(|| Error::External(format!("vk {method} returned no response")))
    }

    /// Send a message into a group conversation by its normalized chat id.
    pub async fn messages_send_to_chat(
        &self,
        chat: ChatId,
        text: &str,
        dedup: DedupToken,
    ) -> Result<()> {
        // messages.send answers with the new message id; unused here.
        let _: serde_json::Value = self
            .call(
                "messages.send",
                &[
                    ("chat_id", chat.0.to_string()),
                    ("message", text.to_string()),
                    ("random_id", dedup.0.to_string()),
                ],
            )
            .await?;
        Ok(())
    }

    /// Send a message addressed by raw peer id (replies to incoming messages).
    pub async fn messages_send_to_peer(
        &self,
        peer: PeerId,
        text: &str,
        dedup: DedupToken,
    ) -> Result<()> {
        let _: serde_json::Value = self
            .call(
                "messages.send",
                &[
                    ("peer_id", peer.0.to_string()),
                    ("message", text.to_string()),
                    ("random_id", dedup.0.to_string()),
                ],
            )
            .await?;
        Ok(())
    }

    /// Resolve the community behind the token. With a group token and no
    /// arguments, `groups.getById` answers with exactly that community.
    pub async fn group_info(&self) -> Result<GroupInfo> {
        let groups: Vec<GroupInfo> = self.call("groups.getById", &[]).await?;
        groups
            .into_iter()
            .next()
            .ok_or_else(|| Error::External("groups.getById returned no groups".to_string()))
    }

    pub async fn long_poll_server(&self, group_id: i64) -> Result<LongPollServer> {
        self.call(
            "groups.getLongPollServer",
            &[("group_id", group_id.to_string())],
        )
        .await
    }
}

/// VK serializes `ts` sometimes as a string, sometimes as a number.
pub(crate) fn de_string_or_number<'de, D>(d: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let v = serde_json::Value::deserialize(d)?;
    match v {
        serde_json::Value::String(s) => Ok(s),
        serde_json::Value::Number(n) => Ok(n.to_string()),
        _ => Err(serde::de::Error::custom("expected string or number")),
    }
}

pub(crate) fn de_opt_string_or_number<'de, D>(d: D) -> std::result::Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let v = serde_json::Value::deserialize(d)?;
    match v {
        serde_json::Value::Null => Ok(None),
        serde_json::Value::String(s) => Ok(Some(s)),
        serde_json::Value::Number(n) => Ok(Some(n.to_string())),
        _ => Err(serde::de::Error::custom("expected string or number")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn long_poll_server_accepts_string_ts() {
        let json = r#"{"key":"abc","server":"https://lp.vk.com/wh1","ts":"42"}"#;
        let s: LongPollServer = serde_json::from_str(json).unwrap();
        assert_eq!(s.ts, "42");
    }

    #[test]
    fn long_poll_server_accepts_numeric_ts() {
        let json = r#"{"key":"abc","server":"https://lp.vk.com/wh1","ts":42}"#;
        let s: LongPollServer = serde_json::from_str(json).unwrap();
        assert_eq!(s.ts, "42");
    }

    #[test]
    fn error_envelope_decodes() {
        let json = r#"{"error":{"error_code":5,"error_msg":"User authorization failed"}}"#;
        let env: Envelope<serde_json::Value> = serde_json::from_str(json).unwrap();
        let err = env.error.unwrap();
        assert_eq!(err.error_code, 5);
        assert!(env.response.is_none());
    }

    #[test]
    fn group_list_decodes() {
        let json = r#"[{"id":123,"name":"Test Club","screen_name":"club123"}]"#;
        let groups: Vec<GroupInfo> = serde_json::from_str(json).unwrap();
        assert_eq!(groups[0].id, 123);
        assert_eq!(groups[0].screen_name, "club123");
    }
}
