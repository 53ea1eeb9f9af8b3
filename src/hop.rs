//! Entry point bundling the client and every resource SDK.

use crate::{
    hop_channels::Channels,
    hop_client::{HopClient, HopConfig},
    hop_error::Result,
    hop_leap::LeapChannel,
    hop_projects::Projects,
};

/// A Hop API client and all of its SDKs.
///
/// ```ignore
/// let hop = Hop::new(HopConfig::new("ptk_...").with_base_url("https://api.hop.io"))?;
/// let channels = hop.channels.get_all(None).await?;
/// ```
#[derive(Debug, Clone)]
pub struct Hop {
    /// The underlying request engine.
    pub client: HopClient,
    /// Channels SDK.
    pub channels: Channels,
    /// Projects SDK.
    pub projects: Projects,
}

impl Hop {
    /// Build a client and its SDKs.
    ///
    /// # Errors
    ///
    /// Returns an error if the credential is invalid or the HTTP client cannot be built.
    pub fn new(cfg: HopConfig) -> Result<Self> {
        Ok(Self::with_client(HopClient::new(cfg)?))
    }

    /// Build from environment variables (see [`HopConfig::from_env`]).
    ///
    /// # Errors
    ///
    /// Returns an error if configuration is missing or invalid.
    pub fn from_env() -> Result<Self> {
        Self::new(HopConfig::from_env()?)
    }

    /// Build the SDKs over an existing client.
    #[must_use]
    pub fn with_client(client: HopClient) -> Self {
        Self {
            channels: Channels::new(client.clone()),
            projects: Projects::new(client.clone()),
            client,
        }
    }

    /// Fetch a channel and wrap it in a [`LeapChannel`] helper.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the server reports a failure.
    pub async fn leap_channel(&self, channel_id: &str) -> Result<LeapChannel> {
        LeapChannel::fetch(self.client.clone(), channel_id).await
    }
}
