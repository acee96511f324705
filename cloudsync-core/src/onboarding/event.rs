//! 引导流程事件与副作用

use cloudsync_client::{
    Credential, GatewayError, ObjectStore, ProviderAccount, Space, StoreKind,
};

use super::state::RequestTicket;

/// Operator input and remote completions fed into the workflow.
#[derive(Debug, Clone)]
pub enum OnboardingEvent {
    /// Begin registering a store of the given kind
    Start(StoreKind),
    SubmitCredentials(Credential),
    ProviderAccountsLoaded {
        ticket: RequestTicket,
        result: Result<Vec<ProviderAccount>, GatewayError>,
    },
    SelectProvider(String),
    SpacesLoaded {
        ticket: RequestTicket,
        result: Result<Vec<Space>, GatewayError>,
    },
    SelectSpace(String),
    EditPrefix(String),
    /// Leave the provider/space step for review
    ConfirmSelection,
    EditName(String),
    Save,
    CommitFinished {
        ticket: RequestTicket,
        result: Result<Option<ObjectStore>, GatewayError>,
    },
    /// One step back, keeping every entered value
    Back,
    /// Return to the credential step with the credential prefilled
    Restart,
    /// Abandon the flow; in-flight responses become stale
    Cancel,
}

impl OnboardingEvent {
    /// Verb phrase used in logs and error messages.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Start(_) => "start onboarding",
            Self::SubmitCredentials(_) => "submit credentials",
            Self::ProviderAccountsLoaded { .. } => "apply provider accounts",
            Self::SelectProvider(_) => "select a provider account",
            Self::SpacesLoaded { .. } => "apply spaces",
            Self::SelectSpace(_) => "select a space",
            Self::EditPrefix(_) => "edit the prefix",
            Self::ConfirmSelection => "confirm the selection",
            Self::EditName(_) => "edit the name",
            Self::Save => "save",
            Self::CommitFinished { .. } => "apply the commit result",
            Self::Back => "go back",
            Self::Restart => "restart",
            Self::Cancel => "cancel",
        }
    }

    /// Ticket of a remote completion; `None` for operator input.
    pub fn ticket(&self) -> Option<RequestTicket> {
        match self {
            Self::ProviderAccountsLoaded { ticket, .. }
            | Self::SpacesLoaded { ticket, .. }
            | Self::CommitFinished { ticket, .. } => Some(*ticket),
            _ => None,
        }
    }
}

/// Work the caller must carry out after a transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Issue a remote call and feed its completion back in
    Remote(RemoteCall),
    /// The store list changed; rebuild it from a fresh fetch
    RefreshStores,
}

/// A remote round-trip requested by the workflow.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemoteCall {
    ValidateCredentials {
        ticket: RequestTicket,
        credential: Credential,
    },
    FetchSpaces {
        ticket: RequestTicket,
        credential: Credential,
        provider_id: String,
    },
    CreateStore {
        ticket: RequestTicket,
        store: ObjectStore,
    },
}

impl RemoteCall {
    pub fn ticket(&self) -> RequestTicket {
        match self {
            Self::ValidateCredentials { ticket, .. }
            | Self::FetchSpaces { ticket, .. }
            | Self::CreateStore { ticket, .. } => *ticket,
        }
    }
}
