use std::sync::Arc;

use midas_core::{texts, Command, UserId};
use midas_ports::{Clock, Messenger};
use midas_store::{RedeemOutcome, Store, StoreError};
use midas_subscription::SubscriptionManager;
use uuid::Uuid;

use crate::error::GatewayError;
use crate::telegram::wire::Update;

/// Routes parsed inbound commands to the subscription manager and renders
/// replies from the texts table. Administrator commands from anyone else
/// return silently.
pub struct InboundRouter {
    subscriptions: Arc<SubscriptionManager>,
    store: Arc<Store>,
    messenger: Arc<dyn Messenger>,
    clock: Arc<dyn Clock>,
    admin_id: UserId,
}

impl InboundRouter {
    pub fn new(
        subscriptions: Arc<SubscriptionManager>,
        store: Arc<Store>,
        messenger: Arc<dyn Messenger>,
        clock: Arc<dyn Clock>,
        admin_id: UserId,
    ) -> Self {
        Self {
            subscriptions,
            store,
            messenger,
            clock,
            admin_id,
        }
    }

    /// Handle one inbound update; non-message updates are ignored
    pub async fn handle_update(&self, update: &Update) -> Result<(), GatewayError> {
        let Some(message) = &update.message else {
            return Ok(());
        };
        let Some(text) = message.text.as_deref() else {
            return Ok(());
        };
        let (user_id, username) = match &message.from {
            Some(contact) => (contact.id, contact.username.as_deref()),
            None => (message.chat.id, None),
        };
        self.handle_text(user_id, username, text).await
    }

    /// Handle one inbound message. Every contact refreshes the user row
    /// before the command runs.
    pub async fn handle_text(
        &self,
        user_id: UserId,
        username: Option<&str>,
        text: &str,
    ) -> Result<(), GatewayError> {
        self.subscriptions.on_user_contact(user_id, username).await?;

        match Command::parse(text) {
            Command::Start => self.reply(user_id, texts::welcome()).await,
            Command::Redeem { code } => self.redeem(user_id, &code).await?,
            Command::Status => self.status(user_id).await?,
            Command::CreateKey { days } => self.create_key(user_id, days).await?,
            Command::ListKeys => self.list_keys(user_id).await?,
            Command::Stats => self.stats(user_id).await?,
            Command::Help => self.reply(user_id, texts::help()).await,
        }
        Ok(())
    }

    async fn redeem(&self, user_id: UserId, code: &str) -> Result<(), GatewayError> {
        let reply = match self.subscriptions.redeem(user_id, code).await? {
            RedeemOutcome::Granted { expiry } => texts::activated_until(expiry),
            RedeemOutcome::KeyAlreadyUsed => texts::key_already_used().to_string(),
            RedeemOutcome::KeyNotFound => texts::invalid_code().to_string(),
        };
        self.reply(user_id, &reply).await;
        Ok(())
    }

    async fn status(&self, user_id: UserId) -> Result<(), GatewayError> {
        let reply = match self.subscriptions.find_user(user_id).await? {
            Some(user) if user.is_active_at(self.clock.epoch()) => {
                texts::status_active(user.expiry)
            }
            _ => texts::status_inactive().to_string(),
        };
        self.reply(user_id, &reply).await;
        Ok(())
    }

    async fn create_key(&self, user_id: UserId, days: i64) -> Result<(), GatewayError> {
        if user_id != self.admin_id {
            log::debug!("ignoring create-key from non-admin {user_id}");
            return Ok(());
        }
        let code = Uuid::new_v4().simple().to_string();
        match self.store.create_key(&code, days, self.clock.epoch()).await {
            Ok(key) => {
                self.reply(user_id, &texts::key_created(&key.code, key.duration_days))
                    .await;
                Ok(())
            }
            Err(StoreError::InvalidDuration(_)) => {
                self.reply(user_id, texts::invalid_duration()).await;
                Ok(())
            }
            Err(err) => Err(err.into()),
        }
    }

    async fn list_keys(&self, user_id: UserId) -> Result<(), GatewayError> {
        if user_id != self.admin_id {
            return Ok(());
        }
        let keys = self.store.list_keys().await?;
        self.reply(user_id, &texts::keys_list(&keys)).await;
        Ok(())
    }

    async fn stats(&self, user_id: UserId) -> Result<(), GatewayError> {
        if user_id != self.admin_id {
            return Ok(());
        }
        let active = self.subscriptions.active_users().await?.len();
        self.reply(user_id, &texts::stats(active)).await;
        Ok(())
    }

    /// Replies are best-effort; the user can resend the command
    async fn reply(&self, user_id: UserId, text: &str) {
        if let Err(err) = self.messenger.send(user_id, text).await {
            log::warn!("reply to {user_id} failed: {err}");
        }
    }
}
