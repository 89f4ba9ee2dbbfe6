//! Token entities for JWT-based session renewal.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::user::Role;

/// Access token expiration time (15 minutes)
pub const ACCESS_TOKEN_EXPIRY_MINUTES: i64 = 15;

/// Refresh token expiration time (7 days)
pub const REFRESH_TOKEN_EXPIRY_DAYS: i64 = 7;

/// JWT issuer
pub const JWT_ISSUER: &str = "rotor";

/// JWT audience
pub const JWT_AUDIENCE: &str = "rotor-api";

/// Claims structure for JWT payload
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (user ID)
    pub sub: String,

    /// Role of the user at issuance time
    pub role: Role,

    /// Issued at timestamp
    pub iat: i64,

    /// Expiration timestamp
    pub exp: i64,

    /// Not before timestamp
    pub nbf: i64,

    /// Issuer
    pub iss: String,

    /// Audience
    pub aud: String,

    /// JWT ID (unique identifier for the token)
    pub jti: String,
}

impl Claims {
    /// Creates new claims for an access token
    ///
    /// # Arguments
    ///
    /// * `user_id` - The user's UUID
    /// * `role` - The user's role
    /// * `ttl` - How long the token stays valid
    /// * `issuer` - Value of the `iss` claim
    /// * `audience` - Value of the `aud` claim
    pub fn new_access_token(
        user_id: Uuid,
        role: Role,
        ttl: Duration,
        issuer: &str,
        audience: &str,
    ) -> Self {
        let now = Utc::now();
        let expiry = now.checked_add_signed(ttl).unwrap_or(DateTime::<Utc>::MAX_UTC);

        Self {
            sub: user_id.to_string(),
            role,
            iat: now.timestamp(),
            exp: expiry.timestamp(),
            nbf: now.timestamp(),
            iss: issuer.to_string(),
            aud: audience.to_string(),
            jti: Uuid::new_v4().to_string(),
        }
    }

    /// Gets the user ID from the claims
    pub fn user_id(&self) -> Result<Uuid, uuid::Error> {
        Uuid::parse_str(&self.sub)
    }
}

/// Persisted refresh credential, one node of a rotation family.
///
/// Fields are private: `used` and `revoked` only ever move from `false` to
/// `true`, through [`RefreshCredential::mark_used`] and
/// [`RefreshCredential::revoke`]. Everything else is fixed at creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefreshCredential {
    id: Uuid,
    owner_id: Uuid,
    /// SHA-256 (hex) of the bearer secret; the raw secret is never stored
    secret_hash: String,
    created_at: DateTime<Utc>,
    expires_at: DateTime<Utc>,
    used: bool,
    revoked: bool,
    /// Credential whose rotation produced this one; `None` for a family root
    parent_id: Option<Uuid>,
}

impl RefreshCredential {
    /// Creates a fresh credential expiring `ttl` from now
    ///
    /// # Arguments
    ///
    /// * `owner_id` - The user this credential authenticates
    /// * `secret_hash` - Hash of the generated bearer secret
    /// * `parent_id` - The credential being rotated, `None` at login
    /// * `ttl` - Lifetime of the credential
    pub fn issue(owner_id: Uuid, secret_hash: String, parent_id: Option<Uuid>, ttl: Duration) -> Self {
        let now = Utc::now();

        Self {
            id: Uuid::new_v4(),
            owner_id,
            secret_hash,
            created_at: now,
            expires_at: now.checked_add_signed(ttl).unwrap_or(DateTime::<Utc>::MAX_UTC),
            used: false,
            revoked: false,
            parent_id,
        }
    }

    /// Rebuilds a credential from persisted state
    #[allow(clippy::too_many_arguments)]
    pub fn restore(
        id: Uuid,
        owner_id: Uuid,
        secret_hash: String,
        created_at: DateTime<Utc>,
        expires_at: DateTime<Utc>,
        used: bool,
        revoked: bool,
        parent_id: Option<Uuid>,
    ) -> Self {
        Self {
            id,
            owner_id,
            secret_hash,
            created_at,
            expires_at,
            used,
            revoked,
            parent_id,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn owner_id(&self) -> Uuid {
        self.owner_id
    }

    pub fn secret_hash(&self) -> &str {
        &self.secret_hash
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn expires_at(&self) -> DateTime<Utc> {
        self.expires_at
    }

    pub fn is_used(&self) -> bool {
        self.used
    }

    pub fn is_revoked(&self) -> bool {
        self.revoked
    }

    pub fn parent_id(&self) -> Option<Uuid> {
        self.parent_id
    }

    /// Whether this credential was created at login rather than by rotation
    pub fn is_root(&self) -> bool {
        self.parent_id.is_none()
    }

    /// Checks expiry against the given instant; the boundary itself counts as expired
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }

    /// A credential can be rotated iff it is unused, unrevoked and unexpired
    pub fn is_usable_at(&self, now: DateTime<Utc>) -> bool {
        !self.used && !self.revoked && !self.is_expired_at(now)
    }

    /// Consumes the credential.
    ///
    /// Returns `true` only for the call that performs the `false -> true`
    /// transition. A revoked credential cannot be consumed.
    pub fn mark_used(&mut self) -> bool {
        if self.used || self.revoked {
            return false;
        }
        self.used = true;
        true
    }

    /// Revokes the credential, returning `true` if it was not revoked before
    pub fn revoke(&mut self) -> bool {
        let newly_revoked = !self.revoked;
        self.revoked = true;
        newly_revoked
    }
}

/// Result of a successful issuance: what the client receives plus the stored record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssuedTokens {
    /// Signed short-lived access token
    pub access_token: String,

    /// Raw refresh secret; only ever handed out here
    pub refresh_token: String,

    /// Access token lifetime in seconds
    pub expires_in: i64,

    /// The persisted refresh credential
    pub credential: RefreshCredential,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn root() -> RefreshCredential {
        RefreshCredential::issue(
            Uuid::new_v4(),
            "hash".to_string(),
            None,
            Duration::days(REFRESH_TOKEN_EXPIRY_DAYS),
        )
    }

    #[test]
    fn test_access_token_claims() {
        let user_id = Uuid::new_v4();
        let claims = Claims::new_access_token(
            user_id,
            Role::Admin,
            Duration::minutes(ACCESS_TOKEN_EXPIRY_MINUTES),
            JWT_ISSUER,
            JWT_AUDIENCE,
        );

        assert_eq!(claims.sub, user_id.to_string());
        assert_eq!(claims.iss, JWT_ISSUER);
        assert_eq!(claims.aud, JWT_AUDIENCE);
        assert_eq!(claims.role, Role::Admin);
        assert_eq!(claims.exp - claims.iat, ACCESS_TOKEN_EXPIRY_MINUTES * 60);
        assert_eq!(claims.nbf, claims.iat);
        assert_eq!(claims.user_id().unwrap(), user_id);
    }

    #[test]
    fn test_new_credential_is_usable_root() {
        let credential = root();

        assert!(credential.is_root());
        assert!(!credential.is_used());
        assert!(!credential.is_revoked());
        assert!(credential.is_usable_at(Utc::now()));
    }

    #[test]
    fn test_child_links_parent() {
        let parent = root();
        let child = RefreshCredential::issue(
            parent.owner_id(),
            "child".to_string(),
            Some(parent.id()),
            Duration::days(1),
        );

        assert!(!child.is_root());
        assert_eq!(child.parent_id(), Some(parent.id()));
        assert_ne!(child.id(), parent.id());
    }

    #[test]
    fn test_mark_used_transitions_once() {
        let mut credential = root();

        assert!(credential.mark_used());
        assert!(!credential.mark_used());
        assert!(credential.is_used());
        assert!(!credential.is_usable_at(Utc::now()));
    }

    #[test]
    fn test_revoked_credential_cannot_be_consumed() {
        let mut credential = root();

        assert!(credential.revoke());
        assert!(!credential.revoke());
        assert!(!credential.mark_used());
        assert!(!credential.is_used());
        assert!(credential.is_revoked());
    }

    #[test]
    fn test_expiry_boundary_counts_as_expired() {
        let credential = root();
        let expires_at = credential.expires_at();

        assert!(credential.is_expired_at(expires_at));
        assert!(!credential.is_expired_at(expires_at - Duration::seconds(1)));
        assert!(!credential.is_usable_at(expires_at));
    }

    #[test]
    fn test_restore_preserves_state() {
        let id = Uuid::new_v4();
        let parent = Uuid::new_v4();
        let now = Utc::now();
        let credential = RefreshCredential::restore(
            id,
            Uuid::new_v4(),
            "h".to_string(),
            now - Duration::days(8),
            now - Duration::days(1),
            true,
            false,
            Some(parent),
        );

        assert_eq!(credential.id(), id);
        assert!(credential.is_used());
        assert!(credential.is_expired_at(now));
        assert!(!credential.is_usable_at(now));
        assert_eq!(credential.parent_id(), Some(parent));
    }

    #[test]
    fn test_overflowing_lifetime_saturates() {
        let credential = RefreshCredential::issue(Uuid::new_v4(), "h".to_string(), None, Duration::MAX);
        assert_eq!(credential.expires_at(), DateTime::<Utc>::MAX_UTC);

        let claims =
            Claims::new_access_token(Uuid::new_v4(), Role::User, Duration::MAX, JWT_ISSUER, JWT_AUDIENCE);
        assert_eq!(claims.exp, DateTime::<Utc>::MAX_UTC.timestamp());
    }
}
