// Collaborators the ledger consumes but never manages.

use async_trait::async_trait;
use uuid::Uuid;

use crate::error::Error;

/// Supplies the authenticated acting user. The ledger never authenticates
/// anyone itself.
pub trait IdentityProvider: Send + Sync {
    /// `Err(Error::Unauthenticated)` when nobody is signed in.
    fn current_user(&self) -> Result<Uuid, Error>;
}

/// Identity already resolved by the caller (tests, jobs, trusted adapters).
#[derive(Debug, Clone, Copy)]
pub struct FixedIdentity(pub Uuid);

impl IdentityProvider for FixedIdentity {
    fn current_user(&self) -> Result<Uuid, Error> {
        Ok(self.0)
    }
}

/// Team existence and membership facts.
#[async_trait]
pub trait TeamDirectory: Send + Sync {
    async fn team_exists(&self, team_id: Uuid) -> Result<bool, Error>;
    async fn is_member(&self, user_id: Uuid, team_id: Uuid) -> Result<bool, Error>;
    async fn list_team_ids(&self) -> Result<Vec<Uuid>, Error>;
    async fn teams_for_user(&self, user_id: Uuid) -> Result<Vec<Uuid>, Error>;
}
