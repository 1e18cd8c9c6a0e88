use async_trait::async_trait;
use caip_scope::SessionGrant;

use crate::error::HostError;

/// Persistent permission storage.
#[async_trait]
pub trait PermissionStore: Send + Sync {
    async fn grant_permission(&self, origin: &str, grant: &SessionGrant) -> Result<(), HostError>;

    /// Whether `origin` was ever granted any permission.
    fn has_permission_history(&self, origin: &str) -> bool;
}
