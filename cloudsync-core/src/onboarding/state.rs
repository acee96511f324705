//! 引导流程状态定义

use cloudsync_client::{
    ClientError, Credential, DuraCloudPayload, FedoraPayload, ObjectStore, ProviderAccount, Space,
    StoreKind, StorePayload,
};

/// Identifies one outstanding remote request.
///
/// A completion is applied only while the workflow is still waiting on the
/// same ticket; anything else is stale and dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RequestTicket(pub(crate) u64);

/// Choices made on the provider/space step of a `DuraCloud` onboarding.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DuraCloudSelection {
    /// Accounts offered by the last successful validation
    pub accounts: Vec<ProviderAccount>,
    pub provider_id: Option<String>,
    /// Spaces of `provider_id` only; emptied whenever the provider changes
    pub spaces: Vec<Space>,
    pub space: Option<String>,
    pub prefix: String,
}

impl DuraCloudSelection {
    pub fn provider(&self) -> Option<&ProviderAccount> {
        let id = self.provider_id.as_deref()?;
        self.accounts.iter().find(|a| a.id == id)
    }

    pub(crate) fn offers_provider(&self, id: &str) -> bool {
        self.accounts.iter().any(|a| a.id == id)
    }

    pub(crate) fn offers_space(&self, id: &str) -> bool {
        self.spaces.iter().any(|s| s.id == id)
    }
}

/// Where a store points, beyond its credential.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreTarget {
    DuraCloud {
        provider_id: String,
        provider_name: String,
        space: String,
        prefix: String,
    },
    Fedora,
}

/// Everything the operator reviews before saving.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreDetails {
    /// Display name; derived on entering review, editable afterwards
    pub name: String,
    pub credential: Credential,
    pub target: StoreTarget,
}

impl StoreDetails {
    pub fn kind(&self) -> StoreKind {
        match self.target {
            StoreTarget::DuraCloud { .. } => StoreKind::DuraCloud,
            StoreTarget::Fedora => StoreKind::Fedora,
        }
    }

    /// The store as it will be sent to the service.
    pub fn to_object_store(&self) -> Result<ObjectStore, ClientError> {
        let Credential {
            url,
            username,
            password,
        } = self.credential.clone();

        let payload = match &self.target {
            StoreTarget::DuraCloud {
                provider_id,
                provider_name,
                space,
                prefix,
            } => StorePayload::DuraCloud(DuraCloudPayload {
                url,
                username,
                password,
                provider_id: provider_id.clone(),
                provider_name: provider_name.clone(),
                space: space.clone(),
                prefix: prefix.clone(),
            }),
            StoreTarget::Fedora => StorePayload::Fedora(FedoraPayload {
                url,
                username,
                password,
            }),
        };

        ObjectStore::new(self.name.clone(), &payload)
    }
}

/// Steps of the onboarding workflow.
///
/// `error` fields carry the message of the last failed round-trip; they are
/// cleared by the next successful step.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum OnboardingState {
    /// No flow in progress
    #[default]
    Idle,

    CollectingCredentials {
        kind: StoreKind,
        /// Prefilled after a failed validation or a restart
        credential: Credential,
        /// Choices from an earlier pass, reapplied after re-validation
        selection: Option<DuraCloudSelection>,
        error: Option<String>,
    },

    /// Awaiting the provider-account listing
    ValidatingCredentials {
        credential: Credential,
        selection: Option<DuraCloudSelection>,
        ticket: RequestTicket,
    },

    SelectingProviderAndSpace {
        credential: Credential,
        selection: DuraCloudSelection,
        /// Space listing in flight for `selection.provider_id`
        pending_spaces: Option<RequestTicket>,
        error: Option<String>,
    },

    ReviewingDetails {
        details: StoreDetails,
        /// `None` for Fedora stores
        selection: Option<DuraCloudSelection>,
        error: Option<String>,
    },

    /// Awaiting the create call
    Committing {
        details: StoreDetails,
        selection: Option<DuraCloudSelection>,
        ticket: RequestTicket,
    },

    /// Terminal; the store was created
    Done { details: StoreDetails },
}

impl OnboardingState {
    /// Short description used in logs and error messages.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::CollectingCredentials { .. } => "collecting credentials",
            Self::ValidatingCredentials { .. } => "validating credentials",
            Self::SelectingProviderAndSpace { .. } => "selecting provider and space",
            Self::ReviewingDetails { .. } => "reviewing details",
            Self::Committing { .. } => "committing",
            Self::Done { .. } => "done",
        }
    }

    /// A flow has been started and has not finished or been cancelled.
    pub fn is_active(&self) -> bool {
        !matches!(self, Self::Idle | Self::Done { .. })
    }

    /// The ticket whose completion this state is waiting for.
    pub fn pending_ticket(&self) -> Option<RequestTicket> {
        match self {
            Self::ValidatingCredentials { ticket, .. } | Self::Committing { ticket, .. } => {
                Some(*ticket)
            }
            Self::SelectingProviderAndSpace { pending_spaces, .. } => *pending_spaces,
            _ => None,
        }
    }

    /// The credential entered so far, if any.
    pub fn credential(&self) -> Option<&Credential> {
        match self {
            Self::CollectingCredentials { credential, .. }
            | Self::ValidatingCredentials { credential, .. }
            | Self::SelectingProviderAndSpace { credential, .. } => Some(credential),
            Self::ReviewingDetails { details, .. }
            | Self::Committing { details, .. }
            | Self::Done { details } => Some(&details.credential),
            Self::Idle => None,
        }
    }

    /// Message of the last failed round-trip shown on the current step.
    pub fn error(&self) -> Option<&str> {
        match self {
            Self::CollectingCredentials { error, .. }
            | Self::SelectingProviderAndSpace { error, .. }
            | Self::ReviewingDetails { error, .. } => error.as_deref(),
            _ => None,
        }
    }
}
