use async_trait::async_trait;

use crate::error::HostError;
use crate::types::{AccountApproval, AccountApprovalRequest};

/// User-facing account selection.
#[async_trait]
pub trait AccountApprover: Send + Sync {
    /// Asks the user which accounts to expose. Called once per negotiation.
    async fn request_account_approval(
        &self,
        request: AccountApprovalRequest,
    ) -> Result<AccountApproval, HostError>;

    /// Number of accounts the wallet holds.
    fn account_count(&self) -> usize;
}
