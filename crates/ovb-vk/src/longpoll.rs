//! VK Bots Long Poll listener.
//!
//! Session lifecycle per the platform contract: obtain `{server, key, ts}` via
//! `groups.getLongPollServer`, then poll `server?act=a_check` with the last
//! seen `ts`. A `failed: 1` frame resets `ts`; `failed: 2 | 3` invalidates the
//! key and the whole session is renewed. Transport errors are logged and
//! retried, never propagated.

use std::time::Duration;

use serde::Deserialize;
use tokio::time::sleep;
use tracing::{error, info, warn};

use ovb_core::{
    domain::PeerId, errors::Error, messaging::types::IncomingMessage, Result,
};

use crate::api::{de_opt_string_or_number, LongPollServer, VkApi};

const RETRY_DELAY: Duration = Duration::from_secs(3);

pub struct LongPoller {
    api: VkApi,
    http: reqwest::Client,
    group_id: Option<i64>,
    wait: Duration,
}

#[derive(Debug, Deserialize)]
struct PollFrame {
    #[serde(default)]
    failed: Option<u8>,
    #[serde(default, deserialize_with = "de_opt_string_or_number")]
    ts: Option<String>,
    #[serde(default)]
    updates: Vec<Update>,
}

#[derive(Debug, Deserialize)]
struct Update {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    object: serde_json::Value,
}

impl LongPoller {
    pub fn new(api: VkApi, group_id: Option<i64>, wait: Duration) -> Self {
        // The poll request blocks server-side for up to `wait`, so this client
        // needs a longer timeout than the one used for plain method calls.
        let http = reqwest::Client::builder()
            .timeout(wait + Duration::from_secs(10))
            .build()
            .expect("reqwest client build");
        Self {
            api,
            http,
            group_id,
            wait,
        }
    }

    /// Poll for updates forever, feeding each incoming text message to
    /// `on_message`. Does not return under normal operation.
    pub async fn run<F, Fut>(&self, on_message: F) -> Result<()>
    where
        F: Fn(IncomingMessage) -> Fut,
        Fut: std::future::Future<Output = ()>,
    {
        loop {
            let mut session = match self.establish().await {
                Ok(s) => s,
                Err(e) => {
                    error!("error starting long poll session: {e}");
                    sleep(RETRY_DELAY).await;
                    continue;
                }
            };
            info!("long poll started");

            loop {
                let frame = match self.poll(&session).await {
                    Ok(f) => f,
                    Err(e) => {
                        warn!("long poll request failed: {e}");
                        sleep(RETRY_DELAY).await;
                        continue;
                    }
                };

                if let Some(code) = frame.failed {
                    if code == 1 {
                        warn!("long poll history outdated, resetting ts");
                        if let Some(ts) = frame.ts {
                            session.ts = ts;
                        }
                        continue;
                    }
                    warn!("long poll session invalid (failed={code}), renewing");
                    break;
                }

                if let Some(ts) = frame.ts {
                    session.ts = ts;
                }

                for update in frame.updates {
                    if update.kind != "message_new" {
                        continue;
                    }
                    let Some(msg) = decode_message_new(&update.object) else {
                        continue;
                    };
                    on_message(msg).await;
                }
            }
        }
    }

    async fn establish(&self) -> Result<LongPollServer> {
        let group_id = match self.group_id {
            Some(id) => id,
            None => self.api.group_info().await?.id,
        };
        self.api.long_poll_server(group_id).await
    }

    async fn poll(&self, session: &LongPollServer) -> Result<PollFrame> {
        let wait = self.wait.as_secs().to_string();
        let resp = self
            .http
            .get(session.server.as_str())
            .query(&[
                ("act", "a_check"),
                ("key", session.key.as_str()),
                ("ts", session.ts.as_str()),
                ("wait", wait.as_str()),
            ])
            .send()
            .await
            .map_err(|e| Error::External(format!("long poll request error: {e}")))?;

        resp.json()
            .await
            .map_err(|e| Error::External(format!("long poll json error: {e}")))
    }
}

/// Pull `{peer_id, text}` out of a `message_new` payload.
///
/// On current API versions the message sits under `object.message`; older
/// group event formats put it directly in `object`.
fn decode_message_new(object: &serde_json::Value) -> Option<IncomingMessage> {
    let msg = object.get("message").unwrap_or(object);
    let peer_id = msg.get("peer_id")?.as_i64()?;
    let text = msg
        .get("text")
        .and_then(|t| t.as_str())
        .unwrap_or("")
        .to_string();
    Some(IncomingMessage {
        peer_id: PeerId(peer_id),
        text,
    })
}
