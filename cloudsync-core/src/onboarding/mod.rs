//! ObjectStore onboarding workflow
//!
//! | Step | Operator input | Remote call |
//! |------|----------------|-------------|
//! | collecting credentials | url, username, password | - |
//! | validating credentials | - | `POST duracloud/provideraccounts` |
//! | selecting provider and space | provider, space, prefix | `POST duracloud/spaces` per provider |
//! | reviewing details | name | - |
//! | committing | - | `POST objectstores` |
//!
//! Fedora stores skip validation and selection.

mod event;
mod machine;
mod naming;
mod remote;
mod state;

pub use event::{Effect, OnboardingEvent, RemoteCall};
pub use machine::{OnboardingWorkflow, VALIDATION_FAILED};
pub use naming::{duracloud_store_name, fedora_store_name};
pub use remote::ValidationNotice;
pub use state::{DuraCloudSelection, OnboardingState, RequestTicket, StoreDetails, StoreTarget};
