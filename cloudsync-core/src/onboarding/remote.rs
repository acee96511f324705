//! Carrying out the workflow's remote calls.

use cloudsync_client::{FailureHandler, GatewayError, ResourceClient};

use super::event::{OnboardingEvent, RemoteCall};

/// Failure continuation for credential validation.
///
/// A rejected credential is reported on the credential step itself, so it
/// bypasses the session's default notice.
#[derive(Debug, Clone, Copy, Default)]
pub struct ValidationNotice;

impl FailureHandler for ValidationNotice {
    fn on_failure(&self, error: &GatewayError) {
        log::warn!("DuraCloud credential validation failed: {error}");
    }
}

impl RemoteCall {
    /// Issue the call and turn its outcome into the completion event.
    ///
    /// Takes its own client handle so the future can outlive the caller's
    /// borrow while it is in flight.
    pub async fn perform(self, client: ResourceClient) -> OnboardingEvent {
        match self {
            Self::ValidateCredentials { ticket, credential } => {
                let result = client
                    .list_provider_accounts(&credential, Some(&ValidationNotice))
                    .await;
                OnboardingEvent::ProviderAccountsLoaded { ticket, result }
            }
            Self::FetchSpaces {
                ticket,
                credential,
                provider_id,
            } => {
                let result = client.list_spaces(&credential, &provider_id, None).await;
                OnboardingEvent::SpacesLoaded { ticket, result }
            }
            Self::CreateStore { ticket, store } => {
                let result = client.create_object_store(&store, None).await;
                OnboardingEvent::CommitFinished { ticket, result }
            }
        }
    }
}
