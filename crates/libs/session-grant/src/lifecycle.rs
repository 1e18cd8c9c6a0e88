use crate::error::SessionError;
use serde::{Deserialize, Serialize};

/// Progress of a single negotiation call.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum NegotiationStage {
    Init,
    ScopesFlattened,
    PropertiesProcessed,
    Bucketed,
    AccountsAssigned,
    NetworksProvisioned,
    PermissionGranted,
    Aborted,
}

impl NegotiationStage {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Init => "init",
            Self::ScopesFlattened => "scopes_flattened",
            Self::PropertiesProcessed => "properties_processed",
            Self::Bucketed => "bucketed",
            Self::AccountsAssigned => "accounts_assigned",
            Self::NetworksProvisioned => "networks_provisioned",
            Self::PermissionGranted => "permission_granted",
            Self::Aborted => "aborted",
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, Self::PermissionGranted | Self::Aborted)
    }

    fn successor(self) -> Option<Self> {
        match self {
            Self::Init => Some(Self::ScopesFlattened),
            Self::ScopesFlattened => Some(Self::PropertiesProcessed),
            Self::PropertiesProcessed => Some(Self::Bucketed),
            Self::Bucketed => Some(Self::AccountsAssigned),
            Self::AccountsAssigned => Some(Self::NetworksProvisioned),
            Self::NetworksProvisioned => Some(Self::PermissionGranted),
            Self::PermissionGranted | Self::Aborted => None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NegotiationLifecycle {
    stage: NegotiationStage,
    aborted_at: Option<NegotiationStage>,
}

impl Default for NegotiationLifecycle {
    fn default() -> Self {
        Self { stage: NegotiationStage::Init, aborted_at: None }
    }
}

impl NegotiationLifecycle {
    pub fn stage(&self) -> NegotiationStage {
        self.stage
    }

    /// Stage that was current when the call aborted.
    pub fn aborted_at(&self) -> Option<NegotiationStage> {
        self.aborted_at
    }

    /// Moves to `next`, which must directly follow the current stage.
    pub fn advance(&mut self, next: NegotiationStage) -> Result<(), SessionError> {
        if self.stage.successor() != Some(next) {
            return Err(SessionError::internal(format!(
                "illegal negotiation transition {} -> {}",
                self.stage.as_str(),
                next.as_str()
            )));
        }
        log::debug!("negotiation stage {} -> {}", self.stage.as_str(), next.as_str());
        self.stage = next;
        Ok(())
    }

    pub fn mark_scopes_flattened(&mut self) -> Result<(), SessionError> {
        self.advance(NegotiationStage::ScopesFlattened)
    }

    pub fn mark_properties_processed(&mut self) -> Result<(), SessionError> {
        self.advance(NegotiationStage::PropertiesProcessed)
    }

    pub fn mark_bucketed(&mut self) -> Result<(), SessionError> {
        self.advance(NegotiationStage::Bucketed)
    }

    pub fn mark_accounts_assigned(&mut self) -> Result<(), SessionError> {
        self.advance(NegotiationStage::AccountsAssigned)
    }

    pub fn mark_networks_provisioned(&mut self) -> Result<(), SessionError> {
        self.advance(NegotiationStage::NetworksProvisioned)
    }

    pub fn mark_permission_granted(&mut self) -> Result<(), SessionError> {
        self.advance(NegotiationStage::PermissionGranted)
    }

    /// Aborts from any non-terminal stage.
    pub fn mark_aborted(&mut self) -> Result<(), SessionError> {
        if self.stage.is_terminal() {
            return Err(SessionError::internal(format!(
                "cannot abort a negotiation that already ended in {}",
                self.stage.as_str()
            )));
        }
        self.aborted_at = Some(self.stage);
        self.stage = NegotiationStage::Aborted;
        Ok(())
    }
}
