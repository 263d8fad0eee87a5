//! The host environment as seen from the worker.

use std::sync::{Mutex, PoisonError};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use url::Url;

use super::notify::NotificationIntent;
use offgrid_core::Error;

/// An open page controlled (or controllable) by the worker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, schemars::JsonSchema)]
pub struct ClientWindow {
    pub id: String,
    pub url: String,
}

/// Capabilities the host environment provides to the worker.
#[async_trait]
pub trait Host: Send + Sync {
    /// Become the active worker without waiting for existing pages to close.
    async fn skip_waiting(&self);

    /// Take control of already-open pages without a reload.
    async fn claim_clients(&self);

    async fn show_notification(&self, intent: &NotificationIntent) -> Result<(), Error>;

    async fn close_notification(&self, tag: &str);

    /// Window clients currently open.
    async fn match_clients(&self) -> Vec<ClientWindow>;

    async fn focus_client(&self, id: &str) -> Result<(), Error>;

    async fn open_window(&self, url: &Url) -> Result<(), Error>;
}

/// A side effect requested from the host.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, schemars::JsonSchema)]
#[serde(tag = "effect", rename_all = "snake_case")]
pub enum HostEffect {
    SkipWaiting,
    ClaimClients,
    ShowNotification { notification: NotificationIntent },
    CloseNotification { tag: String },
    FocusClient { id: String },
    OpenWindow { url: String },
}

/// Host that records every requested effect for the caller to apply.
///
/// Used by the stdio bridge, where the real host lives on the other side of
/// the pipe, and by tests.
#[derive(Debug, Default)]
pub struct RecordingHost {
    clients: Vec<ClientWindow>,
    effects: Mutex<Vec<HostEffect>>,
}

impl RecordingHost {
    pub fn new(clients: Vec<ClientWindow>) -> Self {
        Self { clients, effects: Mutex::new(Vec::new()) }
    }

    fn record(&self, effect: HostEffect) {
        tracing::debug!(?effect, "host effect");
        self.effects.lock().unwrap_or_else(PoisonError::into_inner).push(effect);
    }

    /// Effects recorded so far, in order.
    pub fn effects(&self) -> Vec<HostEffect> {
        self.effects.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    /// Remove and return every recorded effect.
    pub fn take_effects(&self) -> Vec<HostEffect> {
        std::mem::take(&mut *self.effects.lock().unwrap_or_else(PoisonError::into_inner))
    }
}

#[async_trait]
impl Host for RecordingHost {
    async fn skip_waiting(&self) {
        self.record(HostEffect::SkipWaiting);
    }

    async fn claim_clients(&self) {
        self.record(HostEffect::ClaimClients);
    }

    async fn show_notification(&self, intent: &NotificationIntent) -> Result<(), Error> {
        self.record(HostEffect::ShowNotification { notification: intent.clone() });
        Ok(())
    }

    async fn close_notification(&self, tag: &str) {
        self.record(HostEffect::CloseNotification { tag: tag.to_string() });
    }

    async fn match_clients(&self) -> Vec<ClientWindow> {
        self.clients.clone()
    }

    async fn focus_client(&self, id: &str) -> Result<(), Error> {
        if !self.clients.iter().any(|c| c.id == id) {
            return Err(Error::InvalidInput(format!("no client with id {id}")));
        }
        self.record(HostEffect::FocusClient { id: id.to_string() });
        Ok(())
    }

    async fn open_window(&self, url: &Url) -> Result<(), Error> {
        self.record(HostEffect::OpenWindow { url: url.to_string() });
        Ok(())
    }
}
