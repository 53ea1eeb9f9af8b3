//! Hop API - typed client for the Hop REST API.
//!
//! A small library built around one request engine:
//! - **Request engine**: `:name` path templates, query strings, raw-credential auth,
//!   JSON envelopes and typed errors
//! - **Channels**: pub/sub channels, tokens, state and messages
//! - **Leap channels**: per-channel helper with subscription de-duplication and a cached state
//! - **Projects**: project tokens and members
//!
//! ## Quick Start
//!
//! Configuration can be loaded from environment variables. Create a `.env` file:
//!
//! ```text
//! HOP_TOKEN=ptk_your_project_token
//! HOP_API_URL=https://api.hop.io
//! ```
//!
//! Then:
//!
//! ```ignore
//! use hop_api::{Hop, ChannelType};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let hop = Hop::from_env()?;
//!
//!     let channel = hop.channels.create(ChannelType::Unprotected, Some("lobby"), None).await?;
//!     let mut lobby = hop_api::LeapChannel::new(hop.client.clone(), channel);
//!
//!     lobby.subscribe_tokens(["leap_token_a", "leap_token_b"]).await;
//!     lobby
//!         .set_state_with(|mut state| async move {
//!             state.insert("round".into(), 1.into());
//!             state
//!         })
//!         .await?;
//!     lobby.publish_message("round_started", &serde_json::json!({"round": 1})).await?;
//!
//!     Ok(())
//! }
//! ```

// ============================================================================
// Strict linting - Dangerous or non-idiomatic practices are forbidden
// ============================================================================

#![deny(warnings)]                    // All warnings are treated as errors
#![deny(unsafe_code)]                 // Unsafe code is forbidden
#![deny(missing_docs)]                // All public items must be documented
#![deny(dead_code)]                   // Unused code is forbidden
#![deny(unused_imports)]              // Unused imports are forbidden
#![deny(unused_variables)]            // Unused variables are forbidden
#![deny(unused_must_use)]             // Must handle Result and Option explicitly
#![deny(nonstandard_style)]           // Non-standard code style is forbidden

// Clippy for strict discipline
#![deny(clippy::all)]                 // All standard Clippy lints
#![deny(clippy::pedantic)]            // Very strict Clippy lints
#![deny(clippy::unwrap_used)]         // unwrap() is forbidden
#![deny(clippy::expect_used)]         // expect() is forbidden
#![deny(clippy::panic)]               // panic!() is forbidden
#![deny(clippy::print_stdout)]        // println!() is forbidden in a library
#![deny(clippy::todo)]                // TODO is forbidden
#![deny(clippy::unimplemented)]       // unimplemented!() is forbidden
#![deny(clippy::redundant_clone)]     // Useless clones are forbidden
#![cfg_attr(test, allow(clippy::unwrap_used, clippy::expect_used))]

// ============================================================================
// Modules
// ============================================================================

/// Credentials and their kinds.
pub mod hop_auth;

/// Error taxonomy shared by every operation.
pub mod hop_error;

/// `:name` path templates and query strings.
pub mod hop_url;

/// The request engine and its configuration.
///
/// Use this module to call any endpoint directly.
pub mod hop_client;

/// Channels, channel tokens and channel state.
pub mod hop_channels;

/// Stateful helper bound to one channel.
pub mod hop_leap;

/// Project tokens and members.
pub mod hop_projects;

/// Entry point bundling every SDK.
pub mod hop;

// ============================================================================
// Re-exports for convenience
// ============================================================================

pub use hop::Hop;
pub use hop_auth::{AuthKind, Authorization};
pub use hop_channels::{
    Channel, ChannelStats, ChannelToken, ChannelTokens, ChannelType, Channels, State, StateMode,
    StateUpdate,
};
pub use hop_client::{DEFAULT_BASE_URL, HopClient, HopConfig, RequestOptions, classify_envelope};
pub use hop_error::{ApiError, ApiErrorBody, HopError, LOCAL_CLIENT_ERROR_CODE, RequestSummary, Result};
pub use hop_leap::LeapChannel;
pub use hop_projects::{Member, MemberRole, Project, ProjectToken, Projects};
pub use hop_url::Params;
pub use reqwest::Method;
