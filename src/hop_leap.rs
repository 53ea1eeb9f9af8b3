//! Leap channel helper.
//!
//! Unique responsibility: coordinate token subscriptions and state writes for a single
//! channel, keeping a local view of what this instance has already done.
//!
//! The local view is best-effort and never authoritative:
//! - a token is marked subscribed *before* its request is sent, and stays marked even
//!   if the request fails, so it will not be retried by this instance;
//! - the cached state is overwritten with whatever was last written (for a patch, the
//!   patch itself, not the server-side merge result).
//!
//! Nothing is shared between instances and nothing is persisted.

use std::{collections::HashSet, future::Future};

use serde::Serialize;
use tracing::debug;

use crate::{
    hop_channels::{
        Channel, ChannelToken, Channels, State, StateMode, StateUpdate, fetch_tokens, publish,
        put_subscriber, subscribe_all, write_state,
    },
    hop_client::HopClient,
    hop_error::Result,
};

/// Stateful helper bound to one channel.
#[derive(Debug, Clone)]
pub struct LeapChannel {
    client: HopClient,
    channel: Channel,
    subscriptions: HashSet<String>,
}

impl LeapChannel {
    /// Wrap an already-fetched channel.
    #[must_use]
    pub fn new(client: HopClient, channel: Channel) -> Self {
        Self {
            client,
            channel,
            subscriptions: HashSet::new(),
        }
    }

    /// Fetch a channel by ID and wrap it.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the server reports a failure.
    pub async fn fetch(client: HopClient, channel_id: &str) -> Result<Self> {
        let channel = Channels::new(client.clone()).get(channel_id).await?;
        Ok(Self::new(client, channel))
    }

    /// The channel as last known locally.
    #[must_use]
    pub const fn channel(&self) -> &Channel {
        &self.channel
    }

    /// The cached state (last value written or fetched by this instance).
    #[must_use]
    pub const fn state(&self) -> &State {
        &self.channel.state
    }

    /// Whether this instance has already sent a subscription for `token`.
    #[must_use]
    pub fn is_subscribed(&self, token: &str) -> bool {
        self.subscriptions.contains(token)
    }

    /// Subscribe a token, unless this instance already did.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails. The token stays marked as subscribed.
    pub async fn subscribe_token(&mut self, token: &str) -> Result<()> {
        if !self.subscriptions.insert(token.to_string()) {
            debug!(channel_id = %self.channel.id, token, "token already subscribed");
            return Ok(());
        }

        put_subscriber(&self.client, &self.channel.id, token).await
    }

    /// Subscribe many tokens in parallel and wait for all of them.
    ///
    /// Tokens already known to this instance are skipped. Individual failures are
    /// logged and otherwise ignored.
    pub async fn subscribe_tokens<I, S>(&mut self, tokens: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let fresh: Vec<String> = tokens
            .into_iter()
            .map(|t| t.as_ref().to_string())
            .filter(|t| self.subscriptions.insert(t.clone()))
            .collect();

        subscribe_all(&self.client, &self.channel.id, fresh.iter().map(String::as_str)).await;
    }

    /// Get all tokens subscribed to the channel.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the server reports a failure.
    pub async fn get_all_tokens(&self) -> Result<Vec<ChannelToken>> {
        fetch_tokens(&self.client, &self.channel.id).await
    }

    /// Write a state update and cache the written state.
    ///
    /// # Errors
    ///
    /// Returns an error if a request fails; the cache is left untouched in that case.
    pub async fn update_state(&mut self, update: StateUpdate<'_>, mode: StateMode) -> Result<&State> {
        let state = write_state(&self.client, &self.channel.id, update, mode).await?;
        self.channel.state = state;
        Ok(&self.channel.state)
    }

    /// Replace the channel state.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the server reports a failure.
    pub async fn set_state(&mut self, state: State) -> Result<&State> {
        self.update_state(StateUpdate::Replace(state), StateMode::Set).await
    }

    /// Patch the channel state.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the server reports a failure.
    pub async fn patch_state(&mut self, state: State) -> Result<&State> {
        self.update_state(StateUpdate::Replace(state), StateMode::Patch).await
    }

    /// Replace the channel state with a value computed from the current remote state.
    ///
    /// # Errors
    ///
    /// Returns an error if either request fails or the server reports a failure.
    pub async fn set_state_with<F, Fut>(&mut self, f: F) -> Result<&State>
    where
        F: FnOnce(State) -> Fut + Send,
        Fut: Future<Output = State> + Send,
    {
        self.update_state(StateUpdate::transform(f), StateMode::Set).await
    }

    /// Patch the channel state with a value computed from the current remote state.
    ///
    /// # Errors
    ///
    /// Returns an error if either request fails or the server reports a failure.
    pub async fn patch_state_with<F, Fut>(&mut self, f: F) -> Result<&State>
    where
        F: FnOnce(State) -> Fut + Send,
        Fut: Future<Output = State> + Send,
    {
        self.update_state(StateUpdate::transform(f), StateMode::Patch).await
    }

    /// Publish an event to the channel.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the server reports a failure.
    pub async fn publish_message<D>(&self, name: &str, data: &D) -> Result<()>
    where
        D: Serialize + ?Sized,
    {
        publish(&self.client, &self.channel.id, name, data).await
    }
}
