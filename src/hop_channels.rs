//! Hop channels (pub/sub) resource SDK.
//!
//! Unique responsibility: map channel operations onto the request engine.
//!
//! REST endpoints:
//! - POST/GET <https://api.hop.io/v1/channels>
//! - PUT/GET/DELETE `/v1/channels/:channel_id`
//! - PUT `/v1/channels/:channel_id/subscribers/:token`
//! - GET/PUT/PATCH `/v1/channels/:channel_id/state`
//! - POST `/v1/channels/:channel_id/messages`
//! - `/v1/channels/tokens[/:token[/messages]]`
//!
//! State writes that take a transform are read-modify-write with no concurrency guard:
//! the state is read, transformed locally, then written back. A concurrent writer
//! between the read and the write is overwritten (last write wins).

use std::{fmt, future::Future};

use futures::future::{BoxFuture, join_all};
use serde::{Deserialize, Serialize, de::IgnoredAny};
use serde_json::{Map, Value};
use tracing::warn;

use crate::{
    hop_client::HopClient,
    hop_error::Result,
    hop_projects::Project,
    hop_url::Params,
};

const CHANNELS_PATH: &str = "/v1/channels";
const CHANNEL_PATH: &str = "/v1/channels/:channel_id";
const SUBSCRIBER_PATH: &str = "/v1/channels/:channel_id/subscribers/:token";
const TOKENS_OF_CHANNEL_PATH: &str = "/v1/channels/:channel_id/tokens";
const STATE_PATH: &str = "/v1/channels/:channel_id/state";
const MESSAGES_PATH: &str = "/v1/channels/:channel_id/messages";
const STATS_PATH: &str = "/v1/channels/:channel_id/stats";
const TOKENS_PATH: &str = "/v1/channels/tokens";
const TOKEN_PATH: &str = "/v1/channels/tokens/:token";
const TOKEN_MESSAGES_PATH: &str = "/v1/channels/tokens/:token/messages";

/// Application-defined JSON state attached to a channel or token.
pub type State = Map<String, Value>;

// ============================================================================
// Types
// ============================================================================

/// Access type of a channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChannelType {
    /// Only subscribed tokens can connect.
    Private,
    /// Anyone can subscribe, only the server can publish.
    Public,
    /// Anyone can subscribe and publish.
    Unprotected,
}

/// A channel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Channel {
    /// Channel ID.
    pub id: String,
    /// Project the channel belongs to.
    #[serde(default)]
    pub project: Option<Project>,
    /// Channel state.
    #[serde(default)]
    pub state: State,
    /// Capability flags.
    #[serde(default)]
    pub capabilities: u64,
    /// Creation time (ISO 8601).
    #[serde(default)]
    pub created_at: Option<String>,
    /// Access type.
    #[serde(rename = "type")]
    pub channel_type: ChannelType,
}

/// A token that can subscribe to channels.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChannelToken {
    /// Token ID (`leap_token_...`).
    pub id: String,
    /// Token state.
    #[serde(default)]
    pub state: State,
    /// Project the token belongs to.
    #[serde(default)]
    pub project_id: Option<String>,
    /// Whether the token currently holds a live connection.
    #[serde(default)]
    pub is_online: bool,
    /// Expiry time (ISO 8601), if any.
    #[serde(default)]
    pub expires_at: Option<String>,
}

/// Live statistics of a channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelStats {
    /// Number of connected clients.
    pub online_count: u64,
}

/// How a new state is written.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StateMode {
    /// Replace the whole state (PUT).
    Set,
    /// Let the server merge the new state into the current one (PATCH).
    Patch,
}

/// A state update: either a literal next state or a transform of the current one.
pub enum StateUpdate<'a> {
    /// Use this value as the next state.
    Replace(State),
    /// Read the current remote state and compute the next one from it.
    Transform(Box<dyn FnOnce(State) -> BoxFuture<'a, State> + Send + 'a>),
}

impl<'a> StateUpdate<'a> {
    /// Build a transform update from a (possibly async) function of the current state.
    ///
    /// ```ignore
    /// let update = StateUpdate::transform(|mut state| async move {
    ///     state.insert("count".into(), 1.into());
    ///     state
    /// });
    /// ```
    pub fn transform<F, Fut>(f: F) -> Self
    where
        F: FnOnce(State) -> Fut + Send + 'a,
        Fut: Future<Output = State> + Send + 'a,
    {
        Self::Transform(Box::new(move |state| Box::pin(f(state))))
    }
}

impl From<State> for StateUpdate<'_> {
    fn from(value: State) -> Self {
        Self::Replace(value)
    }
}

impl fmt::Debug for StateUpdate<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Replace(state) => f.debug_tuple("Replace").field(state).finish(),
            Self::Transform(_) => f.write_str("Transform(..)"),
        }
    }
}

// ============================================================================
// SDK
// ============================================================================

/// Channels SDK.
#[derive(Debug, Clone)]
pub struct Channels {
    client: HopClient,
}

impl Channels {
    /// Create the SDK over an existing client.
    #[must_use]
    pub const fn new(client: HopClient) -> Self {
        Self { client }
    }

    /// Create a channel. With a non-empty `id`, the channel gets that ID; otherwise the
    /// server picks one.
    ///
    /// # Errors
    ///
    /// Returns [`crate::HopError::InvalidInput`] if no project is given with bearer or PAT
    /// authorization, or any request error.
    pub async fn create(
        &self,
        channel_type: ChannelType,
        id: Option<&str>,
        project: Option<&str>,
    ) -> Result<Channel> {
        self.client.require_project(project, "create a channel")?;

        let body = CreateChannelBody { channel_type };
        let params = Params::new().with_opt("project", project);

        let resp: ChannelResponse = match id.filter(|id| !id.is_empty()) {
            Some(id) => {
                self.client
                    .put(CHANNEL_PATH, Some(&body), params.with("channel_id", id))
                    .await?
            }
            None => self.client.post(CHANNELS_PATH, Some(&body), params).await?,
        };

        Ok(resp.channel)
    }

    /// Get a channel by ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the server reports a failure.
    pub async fn get(&self, channel_id: &str) -> Result<Channel> {
        let resp: ChannelResponse = self.client.get(CHANNEL_PATH, channel_params(channel_id)).await?;
        Ok(resp.channel)
    }

    /// Get all channels of a project.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the server reports a failure.
    pub async fn get_all(&self, project: Option<&str>) -> Result<Vec<Channel>> {
        let params = Params::new().with_opt("project", project);
        let resp: ChannelsResponse = self.client.get(CHANNELS_PATH, params).await?;
        Ok(resp.channels)
    }

    /// Delete a channel.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the server reports a failure.
    pub async fn delete(&self, channel_id: &str) -> Result<()> {
        let _: IgnoredAny = self
            .client
            .delete::<_, ()>(CHANNEL_PATH, None, channel_params(channel_id))
            .await?;
        Ok(())
    }

    /// Subscribe a token to a channel.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the server reports a failure.
    pub async fn subscribe_token(&self, channel_id: &str, token: &str) -> Result<()> {
        put_subscriber(&self.client, channel_id, token).await
    }

    /// Subscribe many tokens in parallel and wait for all of them.
    ///
    /// Individual failures are logged and otherwise ignored.
    pub async fn subscribe_tokens<I, S>(&self, channel_id: &str, tokens: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let tokens: Vec<S> = tokens.into_iter().collect();
        subscribe_all(&self.client, channel_id, tokens.iter().map(S::as_ref)).await;
    }

    /// Get all tokens subscribed to a channel.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the server reports a failure.
    pub async fn get_all_tokens(&self, channel_id: &str) -> Result<Vec<ChannelToken>> {
        fetch_tokens(&self.client, channel_id).await
    }

    /// Read the current remote state of a channel.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the server reports a failure.
    pub async fn get_state(&self, channel_id: &str) -> Result<State> {
        read_state(&self.client, channel_id).await
    }

    /// Replace the state of a channel.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the server reports a failure.
    pub async fn set_state(&self, channel_id: &str, state: State) -> Result<()> {
        self.update_state(channel_id, StateUpdate::Replace(state), StateMode::Set)
            .await
            .map(drop)
    }

    /// Merge a partial state into the state of a channel.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the server reports a failure.
    pub async fn patch_state(&self, channel_id: &str, state: State) -> Result<()> {
        self.update_state(channel_id, StateUpdate::Replace(state), StateMode::Patch)
            .await
            .map(drop)
    }

    /// Replace the state with a value computed from the current remote state.
    ///
    /// Returns the state that was written.
    ///
    /// # Errors
    ///
    /// Returns an error if either request fails or the server reports a failure.
    pub async fn set_state_with<F, Fut>(&self, channel_id: &str, f: F) -> Result<State>
    where
        F: FnOnce(State) -> Fut + Send,
        Fut: Future<Output = State> + Send,
    {
        self.update_state(channel_id, StateUpdate::transform(f), StateMode::Set)
            .await
    }

    /// Patch the state with a value computed from the current remote state.
    ///
    /// Returns the state that was written.
    ///
    /// # Errors
    ///
    /// Returns an error if either request fails or the server reports a failure.
    pub async fn patch_state_with<F, Fut>(&self, channel_id: &str, f: F) -> Result<State>
    where
        F: FnOnce(State) -> Fut + Send,
        Fut: Future<Output = State> + Send,
    {
        self.update_state(channel_id, StateUpdate::transform(f), StateMode::Patch)
            .await
    }

    /// Write a state update with the given mode. Returns the state that was written.
    ///
    /// # Errors
    ///
    /// Returns an error if a request fails or the server reports a failure.
    pub async fn update_state(
        &self,
        channel_id: &str,
        update: StateUpdate<'_>,
        mode: StateMode,
    ) -> Result<State> {
        write_state(&self.client, channel_id, update, mode).await
    }

    /// Publish an event to every client connected to a channel.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the server reports a failure.
    pub async fn publish_message<D>(&self, channel_id: &str, name: &str, data: &D) -> Result<()>
    where
        D: Serialize + ?Sized,
    {
        publish(&self.client, channel_id, name, data).await
    }

    /// Get live statistics of a channel.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the server reports a failure.
    pub async fn get_stats(&self, channel_id: &str) -> Result<ChannelStats> {
        let resp: StatsResponse = self.client.get(STATS_PATH, channel_params(channel_id)).await?;
        Ok(resp.stats)
    }

    /// Channel token operations.
    #[must_use]
    pub const fn tokens(&self) -> ChannelTokens<'_> {
        ChannelTokens {
            client: &self.client,
        }
    }
}

/// Channel token SDK, borrowed from [`Channels::tokens`].
#[derive(Debug, Clone, Copy)]
pub struct ChannelTokens<'a> {
    client: &'a HopClient,
}

impl ChannelTokens<'_> {
    /// Create a token with the given state.
    ///
    /// # Errors
    ///
    /// Returns [`crate::HopError::InvalidInput`] if no project is given with bearer or PAT
    /// authorization, or any request error.
    pub async fn create(&self, state: State, project: Option<&str>) -> Result<ChannelToken> {
        self.client.require_project(project, "create a channel token")?;

        let body = TokenStateBody {
            state,
            expires_at: None,
        };
        let params = Params::new().with_opt("project", project);
        let resp: TokenResponse = self.client.post(TOKENS_PATH, Some(&body), params).await?;
        Ok(resp.token)
    }

    /// Get a token by ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the server reports a failure.
    pub async fn get(&self, token: &str) -> Result<ChannelToken> {
        let resp: TokenResponse = self.client.get(TOKEN_PATH, token_params(token)).await?;
        Ok(resp.token)
    }

    /// Update the state (and optionally the expiry) of a token.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the server reports a failure.
    pub async fn update(
        &self,
        token: &str,
        state: State,
        expires_at: Option<&str>,
    ) -> Result<ChannelToken> {
        let body = TokenStateBody {
            state,
            expires_at: expires_at.map(str::to_string),
        };
        let resp: TokenResponse = self
            .client
            .patch(TOKEN_PATH, Some(&body), token_params(token))
            .await?;
        Ok(resp.token)
    }

    /// Delete a token.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the server reports a failure.
    pub async fn delete(&self, token: &str) -> Result<()> {
        let _: IgnoredAny = self
            .client
            .delete::<_, ()>(TOKEN_PATH, None, token_params(token))
            .await?;
        Ok(())
    }

    /// Send an event directly to a single token.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the server reports a failure.
    pub async fn publish_direct_message<D>(&self, token: &str, name: &str, data: &D) -> Result<()>
    where
        D: Serialize + ?Sized,
    {
        let body = MessageBody { e: name, d: data };
        let _: IgnoredAny = self
            .client
            .post(TOKEN_MESSAGES_PATH, Some(&body), token_params(token))
            .await?;
        Ok(())
    }
}

// ============================================================================
// Shared operations (also used by the leap channel helper)
// ============================================================================

pub(crate) async fn put_subscriber(client: &HopClient, channel_id: &str, token: &str) -> Result<()> {
    let params = channel_params(channel_id).with("token", token);
    let _: IgnoredAny = client.put::<_, ()>(SUBSCRIBER_PATH, None, params).await?;
    Ok(())
}

/// Fan out subscribe calls and wait for every one of them, ignoring failures.
pub(crate) async fn subscribe_all<'t>(
    client: &HopClient,
    channel_id: &str,
    tokens: impl Iterator<Item = &'t str>,
) {
    let calls = tokens.map(|token| async move {
        if let Err(e) = put_subscriber(client, channel_id, token).await {
            warn!(channel_id, token, error = %e, "failed to subscribe token");
        }
    });
    join_all(calls).await;
}

pub(crate) async fn fetch_tokens(client: &HopClient, channel_id: &str) -> Result<Vec<ChannelToken>> {
    let resp: TokensResponse = client
        .get(TOKENS_OF_CHANNEL_PATH, channel_params(channel_id))
        .await?;
    Ok(resp.tokens)
}

pub(crate) async fn read_state(client: &HopClient, channel_id: &str) -> Result<State> {
    let resp: StateResponse = client.get(STATE_PATH, channel_params(channel_id)).await?;
    Ok(resp.state)
}

pub(crate) async fn write_state(
    client: &HopClient,
    channel_id: &str,
    update: StateUpdate<'_>,
    mode: StateMode,
) -> Result<State> {
    let state = match update {
        StateUpdate::Replace(state) => state,
        StateUpdate::Transform(f) => {
            let current = read_state(client, channel_id).await?;
            f(current).await
        }
    };

    let params = channel_params(channel_id);
    let _: IgnoredAny = match mode {
        StateMode::Set => client.put(STATE_PATH, Some(&state), params).await?,
        StateMode::Patch => client.patch(STATE_PATH, Some(&state), params).await?,
    };

    Ok(state)
}

pub(crate) async fn publish<D>(client: &HopClient, channel_id: &str, name: &str, data: &D) -> Result<()>
where
    D: Serialize + ?Sized,
{
    let body = MessageBody { e: name, d: data };
    let _: IgnoredAny = client
        .post(MESSAGES_PATH, Some(&body), channel_params(channel_id))
        .await?;
    Ok(())
}

fn channel_params(channel_id: &str) -> Params {
    Params::new().with("channel_id", channel_id)
}

fn token_params(token: &str) -> Params {
    Params::new().with("token", token)
}

// ============================================================================
// Wire types (internal)
// ============================================================================

#[derive(Debug, Serialize)]
struct CreateChannelBody {
    #[serde(rename = "type")]
    channel_type: ChannelType,
}

#[derive(Debug, Serialize)]
struct TokenStateBody {
    state: State,
    #[serde(rename = "expiresAt", skip_serializing_if = "Option::is_none")]
    expires_at: Option<String>,
}

#[derive(Debug, Serialize)]
struct MessageBody<'a, D: ?Sized> {
    e: &'a str,
    d: &'a D,
}

#[derive(Debug, Deserialize)]
struct ChannelResponse {
    channel: Channel,
}

#[derive(Debug, Deserialize)]
struct ChannelsResponse {
    channels: Vec<Channel>,
}

#[derive(Debug, Deserialize)]
struct TokensResponse {
    tokens: Vec<ChannelToken>,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    token: ChannelToken,
}

#[derive(Debug, Deserialize)]
struct StateResponse {
    #[serde(default)]
    state: State,
}

#[derive(Debug, Deserialize)]
struct StatsResponse {
    stats: ChannelStats,
}
