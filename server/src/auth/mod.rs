//! Authentication: JWT validation and the [`CurrentUser`] extractor
//!
//! Token issuance lives in the account service; this server only validates
//! bearer tokens and resolves them to the calling staff member.

mod extractor;
pub mod jwt;

pub use jwt::{Claims, JwtConfig, JwtError, JwtService};

/// The authenticated caller, resolved from JWT claims
#[derive(Debug, Clone)]
pub struct CurrentUser {
    /// Restaurant account every entity is scoped to
    pub tenant_id: String,
    /// Display name, recorded on audit entries
    pub actor_name: String,
    pub role: String,
}

impl From<Claims> for CurrentUser {
    fn from(claims: Claims) -> Self {
        Self {
            tenant_id: claims.tenant_id,
            actor_name: claims.name,
            role: claims.role,
        }
    }
}
