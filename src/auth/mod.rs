//! Verified-identity input.
//!
//! Token verification happens upstream (gateway / auth middleware); by the
//! time a request reaches this service the caller's identity and role have
//! already been checked and arrive as trusted headers. This module only
//! extracts them and gates operations by role.

use async_trait::async_trait;
use axum::{extract::FromRequestParts, http::request::Parts};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use uuid::Uuid;

use crate::errors::ServiceError;

pub const ACTOR_ID_HEADER: &str = "x-actor-id";
pub const ACTOR_ROLE_HEADER: &str = "x-actor-role";

/// Back-office roles, mirroring the upstream user directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString)]
#[strum(serialize_all = "PascalCase")]
pub enum Role {
    Admin,
    Employee,
    Watcher,
    ReportViewer,
}

/// Authenticated actor attached to every core operation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthUser {
    pub user_id: Uuid,
    pub role: Role,
}

impl AuthUser {
    pub fn new(user_id: Uuid, role: Role) -> Self {
        Self { user_id, role }
    }

    pub fn has_role(&self, role: Role) -> bool {
        self.role == role
    }

    pub fn is_admin(&self) -> bool {
        self.has_role(Role::Admin)
    }

    /// Gate an operation to the given roles.
    pub fn require_any(&self, allowed: &[Role]) -> Result<(), ServiceError> {
        if allowed.contains(&self.role) {
            Ok(())
        } else {
            Err(ServiceError::Forbidden(format!(
                "role {} may not perform this operation",
                self.role
            )))
        }
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = ServiceError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let header = |name: &str| -> Result<&str, ServiceError> {
            parts
                .headers
                .get(name)
                .and_then(|v| v.to_str().ok())
                .ok_or_else(|| {
                    ServiceError::Unauthorized(format!("missing or invalid {name} header"))
                })
        };

        let user_id = header(ACTOR_ID_HEADER)?
            .parse::<Uuid>()
            .map_err(|_| ServiceError::Unauthorized("malformed actor id".to_string()))?;

        let role = header(ACTOR_ROLE_HEADER)?
            .parse::<Role>()
            .map_err(|_| ServiceError::Unauthorized("unknown actor role".to_string()))?;

        Ok(AuthUser::new(user_id, role))
    }
}
