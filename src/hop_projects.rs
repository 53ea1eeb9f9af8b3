//! Hop projects resource SDK: project tokens and members.
//!
//! REST endpoints:
//! - GET/POST `/v1/projects/:project_id/tokens`
//! - DELETE `/v1/projects/:project_id/tokens/:project_token_id`
//! - GET `/v1/projects/:project_id/members[/@me]`
//!
//! With a project token the project is implicit: the `@this` routes are used when no
//! project ID is given. Bearer and PAT callers must name the project.

use serde::{Deserialize, Serialize, de::IgnoredAny};

use crate::{
    hop_auth::AuthKind,
    hop_client::HopClient,
    hop_error::{HopError, Result},
    hop_url::Params,
};

/// A project.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Project {
    /// Project ID (`project_...`).
    pub id: String,
    /// Display name.
    #[serde(default)]
    pub name: Option<String>,
    /// Registry namespace.
    #[serde(default)]
    pub namespace: Option<String>,
    /// Project type ("regular" or "personal").
    #[serde(default, rename = "type")]
    pub project_type: Option<String>,
    /// Billing tier ("free" or "paid").
    #[serde(default)]
    pub tier: Option<String>,
    /// Icon URL.
    #[serde(default)]
    pub icon: Option<String>,
    /// Creation time (ISO 8601).
    #[serde(default)]
    pub created_at: Option<String>,
}

/// A project token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectToken {
    /// Token ID (`ptkid_...`).
    pub id: String,
    /// Token value (`ptk_...`), usually partially obfuscated.
    pub token: String,
    /// Permission flags.
    pub flags: u64,
    /// Creation time (ISO 8601).
    #[serde(default)]
    pub created_at: Option<String>,
    /// Owning project, only present right after creation.
    #[serde(default)]
    pub project: Option<Project>,
}

/// A role a member holds in a project.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemberRole {
    /// Role ID.
    pub id: String,
    /// Role name.
    pub name: String,
    /// Permission flags.
    pub flags: u64,
}

/// A project member.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Member {
    /// Member ID (`pm_...`).
    pub id: String,
    /// Display name.
    #[serde(default)]
    pub name: Option<String>,
    /// Username.
    #[serde(default)]
    pub username: Option<String>,
    /// Role in the project.
    pub role: MemberRole,
    /// Whether the member has MFA enabled.
    #[serde(default)]
    pub mfa_enabled: bool,
    /// Join time (ISO 8601).
    #[serde(default)]
    pub joined_at: Option<String>,
}

/// Projects SDK.
#[derive(Debug, Clone)]
pub struct Projects {
    client: HopClient,
}

impl Projects {
    /// Create the SDK over an existing client.
    #[must_use]
    pub const fn new(client: HopClient) -> Self {
        Self { client }
    }

    /// Create a project token with the given permission flags.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the server reports a failure.
    pub async fn create_project_token(&self, project: &str, flags: u64) -> Result<ProjectToken> {
        let params = Params::new().with("project_id", project);
        let resp: ProjectTokenResponse = self
            .client
            .post("/v1/projects/:project_id/tokens", Some(&FlagsBody { flags }), params)
            .await?;
        Ok(resp.project_token)
    }

    /// Get all project tokens.
    ///
    /// # Errors
    ///
    /// Returns [`HopError::InvalidInput`] if no project is given with bearer or PAT
    /// authorization, or any request error.
    pub async fn get_project_tokens(&self, project: Option<&str>) -> Result<Vec<ProjectToken>> {
        self.client.require_project(project, "list project tokens")?;

        let resp: ProjectTokensResponse = match project {
            Some(project) => {
                let params = Params::new().with("project_id", project);
                self.client.get("/v1/projects/:project_id/tokens", params).await?
            }
            None => self.client.get("/v1/projects/@this/tokens", Params::new()).await?,
        };
        Ok(resp.project_tokens)
    }

    /// Delete a project token by its ID.
    ///
    /// # Errors
    ///
    /// Returns [`HopError::InvalidInput`] if no project is given with bearer or PAT
    /// authorization, or any request error.
    pub async fn delete_project_token(&self, token_id: &str, project: Option<&str>) -> Result<()> {
        self.client.require_project(project, "delete a project token")?;

        let params = Params::new().with("project_token_id", token_id);
        let _: IgnoredAny = match project {
            Some(project) => {
                self.client
                    .delete::<_, ()>(
                        "/v1/projects/:project_id/tokens/:project_token_id",
                        None,
                        params.with("project_id", project),
                    )
                    .await?
            }
            None => {
                self.client
                    .delete::<_, ()>("/v1/projects/@this/tokens/:project_token_id", None, params)
                    .await?
            }
        };
        Ok(())
    }

    /// Get the member the client is authorized as.
    ///
    /// # Errors
    ///
    /// Returns [`HopError::InvalidInput`] with a project token (no user is attached to
    /// it), or any request error.
    pub async fn get_current_member(&self, project: &str) -> Result<Member> {
        if self.client.auth_type() == AuthKind::ProjectToken {
            return Err(HopError::InvalidInput(
                "cannot resolve a member from a project token, use a bearer or PAT".to_string(),
            ));
        }

        let params = Params::new().with("project_id", project);
        let resp: CurrentMemberResponse = self
            .client
            .get("/v1/projects/:project_id/members/@me", params)
            .await?;
        Ok(resp.project_member)
    }

    /// Get all members of a project.
    ///
    /// # Errors
    ///
    /// Returns [`HopError::InvalidInput`] if no project is given with bearer or PAT
    /// authorization, or any request error.
    pub async fn get_all_members(&self, project: Option<&str>) -> Result<Vec<Member>> {
        self.client.require_project(project, "list project members")?;

        let resp: MembersResponse = match project {
            Some(project) => {
                let params = Params::new().with("project_id", project);
                self.client.get("/v1/projects/:project_id/members", params).await?
            }
            None => self.client.get("/v1/projects/@this/members", Params::new()).await?,
        };
        Ok(resp.members)
    }
}

#[derive(Debug, Serialize)]
struct FlagsBody {
    flags: u64,
}

#[derive(Debug, Deserialize)]
struct ProjectTokenResponse {
    project_token: ProjectToken,
}

#[derive(Debug, Deserialize)]
struct ProjectTokensResponse {
    project_tokens: Vec<ProjectToken>,
}

#[derive(Debug, Deserialize)]
struct CurrentMemberResponse {
    project_member: Member,
}

#[derive(Debug, Deserialize)]
struct MembersResponse {
    members: Vec<Member>,
}
