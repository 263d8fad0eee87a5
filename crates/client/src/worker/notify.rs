//! Push notifications and notification clicks.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use url::Url;

use super::{PendingWork, Worker};
use offgrid_core::Error;
use offgrid_core::url::canonicalize;

pub const ACTION_OPEN: &str = "open";
pub const ACTION_CLOSE: &str = "close";

/// Push payload as delivered by the push service. Every field is optional.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct PushPayload {
    pub title: Option<String>,
    pub body: Option<String>,
    pub primary_key: Option<String>,
    pub url: Option<String>,
}

impl PushPayload {
    pub fn parse(data: &[u8]) -> Result<Self, Error> {
        serde_json::from_slice(data).map_err(|e| Error::PayloadInvalid(e.to_string()))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, schemars::JsonSchema)]
pub struct NotificationAction {
    pub action: String,
    pub title: String,
    pub icon: String,
}

/// A notification ready to render. Lives only until it is clicked or dismissed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, schemars::JsonSchema)]
pub struct NotificationIntent {
    pub tag: String,
    pub title: String,
    pub body: String,
    pub icon: String,
    pub badge: String,
    pub vibrate: Vec<u32>,
    /// Absolute URL opened or focused on click.
    pub target_url: String,
    pub primary_key: Option<String>,
    /// RFC 3339 arrival time.
    pub arrived_at: String,
    pub actions: Vec<NotificationAction>,
}

/// A click (or dismissal) of a displayed notification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, schemars::JsonSchema)]
pub struct NotificationClick {
    /// The chosen action; `None` for a tap on the notification body.
    pub action: Option<String>,
    pub notification: NotificationIntent,
}

impl Worker {
    /// Build a notification intent from a payload, filling in defaults.
    ///
    /// A malformed payload still produces a notification made of defaults.
    pub fn notification_for(&self, data: &[u8]) -> NotificationIntent {
        let payload = PushPayload::parse(data).unwrap_or_else(|e| {
            tracing::warn!(error = %e, "malformed push payload, showing default notification");
            PushPayload::default()
        });

        let defaults = &self.config.notification;
        let target = payload.url.as_deref().unwrap_or(&defaults.url);
        let target_url = match canonicalize(target, Some(self.origin())) {
            Ok(url) => url.to_string(),
            Err(e) => {
                tracing::warn!(url = %target, error = %e, "unusable notification target, using origin");
                self.origin().to_string()
            }
        };

        let arrived_at = Utc::now();
        let tag = payload
            .primary_key
            .clone()
            .unwrap_or_else(|| format!("offgrid-{}", arrived_at.timestamp_millis()));

        NotificationIntent {
            tag,
            title: payload.title.unwrap_or_else(|| defaults.title.clone()),
            body: payload.body.unwrap_or_else(|| defaults.body.clone()),
            icon: defaults.icon.clone(),
            badge: defaults.badge.clone(),
            vibrate: defaults.vibrate.clone(),
            target_url,
            primary_key: payload.primary_key,
            arrived_at: arrived_at.to_rfc3339(),
            actions: vec![
                NotificationAction {
                    action: ACTION_OPEN.into(),
                    title: defaults.open_label.clone(),
                    icon: defaults.open_icon.clone(),
                },
                NotificationAction {
                    action: ACTION_CLOSE.into(),
                    title: defaults.close_label.clone(),
                    icon: defaults.close_icon.clone(),
                },
            ],
        }
    }

    /// Handle a push. Without data nothing is shown.
    ///
    /// Rendering is registered on `pending`.
    pub fn handle_push(&self, data: Option<&[u8]>, pending: &PendingWork) -> Option<NotificationIntent> {
        let Some(data) = data else {
            tracing::debug!("push without data ignored");
            return None;
        };

        let intent = self.notification_for(data);
        let host = self.host.clone();
        let shown = intent.clone();
        pending.wait_until(async move {
            if let Err(e) = host.show_notification(&shown).await {
                tracing::warn!(tag = %shown.tag, error = %e, "failed to show notification");
            }
        });
        Some(intent)
    }

    /// Handle a click on a notification.
    ///
    /// The notification is always closed. "close" stops there; "open" or a
    /// plain tap focuses a window already showing the target, or opens one.
    /// Navigation is registered on `pending`.
    pub async fn handle_notification_click(&self, click: NotificationClick, pending: &PendingWork) {
        self.host.close_notification(&click.notification.tag).await;

        match click.action.as_deref() {
            Some(ACTION_CLOSE) => {
                tracing::debug!(tag = %click.notification.tag, "notification dismissed");
            }
            None | Some(ACTION_OPEN) => {
                let worker = self.clone();
                let target = click.notification.target_url;
                pending.wait_until(async move {
                    if let Err(e) = worker.navigate_to(&target).await {
                        tracing::warn!(url = %target, error = %e, "failed to route notification click");
                    }
                });
            }
            Some(other) => {
                tracing::debug!(action = %other, "unknown notification action ignored");
            }
        }
    }

    async fn navigate_to(&self, target: &str) -> Result<(), Error> {
        let wanted = canonicalize(target, None).map_err(|e| Error::InvalidUrl(format!("{target}: {e}")))?;
        let target = Url::parse(target).map_err(|e| Error::InvalidUrl(format!("{target}: {e}")))?;

        for client in self.host.match_clients().await {
            let same = canonicalize(&client.url, None).is_ok_and(|u| u == wanted);
            if same {
                tracing::debug!(client = %client.id, "focusing existing window");
                return self.host.focus_client(&client.id).await;
            }
        }

        tracing::debug!(url = %target, "opening new window");
        self.host.open_window(&target).await
    }
}
