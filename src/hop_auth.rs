//! Credentials accepted by the Hop API.
//!
//! A credential is an opaque string whose prefix (everything before the first `_`)
//! tells which kind of principal it authenticates. Only three prefixes are accepted.

use std::{fmt, str::FromStr};

use crate::hop_error::{HopError, Result};

/// Kind of credential, inferred from its prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AuthKind {
    /// Project token (`ptk_...`). Scoped to a single project.
    ProjectToken,
    /// User bearer token (`bearer_...`).
    Bearer,
    /// Personal access token (`pat_...`).
    PersonalAccessToken,
}

impl AuthKind {
    /// All recognized kinds.
    pub const ALL: [Self; 3] = [Self::ProjectToken, Self::Bearer, Self::PersonalAccessToken];

    /// The wire prefix for this kind.
    #[must_use]
    pub const fn as_prefix(self) -> &'static str {
        match self {
            Self::ProjectToken => "ptk",
            Self::Bearer => "bearer",
            Self::PersonalAccessToken => "pat",
        }
    }

    /// Look up a kind from its prefix.
    #[must_use]
    pub fn from_prefix(prefix: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.as_prefix() == prefix)
    }
}

impl fmt::Display for AuthKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_prefix())
    }
}

impl FromStr for AuthKind {
    type Err = HopError;

    fn from_str(s: &str) -> Result<Self> {
        Self::from_prefix(s).ok_or_else(|| HopError::InvalidAuthorization {
            prefix: s.to_string(),
        })
    }
}

/// A validated credential with its kind parsed once.
#[derive(Clone, PartialEq, Eq)]
pub struct Authorization {
    raw: String,
    kind: AuthKind,
}

impl Authorization {
    /// Validate a raw credential string.
    ///
    /// # Errors
    ///
    /// Returns [`HopError::InvalidAuthorization`] if the prefix is not recognized.
    pub fn parse(raw: impl Into<String>) -> Result<Self> {
        let raw = raw.into();
        let prefix = raw.split_once('_').map_or(raw.as_str(), |(p, _)| p);
        let kind = prefix.parse::<AuthKind>()?;
        Ok(Self { raw, kind })
    }

    /// The credential kind.
    #[must_use]
    pub const fn kind(&self) -> AuthKind {
        self.kind
    }

    /// The raw credential, sent as-is in the `Authorization` header.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.raw
    }
}

impl fmt::Debug for Authorization {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Authorization")
            .field(&format_args!("{}_***", self.kind.as_prefix()))
            .finish()
    }
}

impl FromStr for Authorization {
    type Err = HopError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}
