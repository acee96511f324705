//! CloudSync Console Core Library
//!
//! Session-level logic of the CloudSync admin console, on top of
//! [`cloudsync_client`]:
//! - Tab views (tasks, object sets, object stores) built from fresh fetches
//! - Object set and object store management
//! - The object store onboarding workflow (`DuraCloud` and Fedora)
//!
//! The library holds no global state. Everything lives in a [`ConsoleSession`]
//! created after login and dropped at logout.

pub mod error;
pub mod onboarding;
pub mod session;
pub mod views;

#[cfg(test)]
mod test_utils;

// Re-export common types
pub use error::{CoreError, CoreResult, OnboardingError};
pub use onboarding::{OnboardingEvent, OnboardingState, OnboardingWorkflow};
pub use session::{ConsoleSession, NewObjectSet};
pub use views::{SetsView, StoresView, Tab, TabView, TasksView};
