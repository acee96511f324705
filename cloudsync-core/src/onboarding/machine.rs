//! 引导流程状态机
//!
//! `dispatch` maps (current state, event) to (next state, effects). The
//! machine never performs I/O itself: remote calls come back out as
//! [`Effect::Remote`] and their completions are fed back in as events.

use std::mem;

use cloudsync_client::{Credential, StoreKind};

use super::event::{Effect, OnboardingEvent, RemoteCall};
use super::naming::{duracloud_store_name, fedora_store_name};
use super::state::{DuraCloudSelection, OnboardingState, RequestTicket, StoreDetails, StoreTarget};
use crate::error::OnboardingError;

/// Shown on the credential step when validation fails.
pub const VALIDATION_FAILED: &str =
    "Error connecting to DuraCloud instance.\nWrong URL, Username, or Password?";

/// The rejected state is handed back untouched alongside the error.
type Transition =
    Result<(OnboardingState, Vec<Effect>), (OnboardingState, OnboardingError)>;

/// A name seen on an earlier pass through review, with the default it was
/// derived as.
#[derive(Debug, Clone, PartialEq, Eq)]
struct ReviewedName {
    derived: String,
    name: String,
}

/// The single onboarding flow of a console session.
#[derive(Debug, Default)]
pub struct OnboardingWorkflow {
    state: OnboardingState,
    last_ticket: u64,
    /// Survives leaving review so an edited name is not re-derived
    reviewed_name: Option<ReviewedName>,
}

impl OnboardingWorkflow {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &OnboardingState {
        &self.state
    }

    pub fn is_active(&self) -> bool {
        self.state.is_active()
    }

    /// Apply one event.
    ///
    /// Completions whose ticket the current state is not waiting for are
    /// dropped without error. A rejected event leaves the state unchanged.
    pub fn dispatch(&mut self, event: OnboardingEvent) -> Result<Vec<Effect>, OnboardingError> {
        if let Some(ticket) = event.ticket() {
            if self.state.pending_ticket() != Some(ticket) {
                log::debug!(
                    "Discarding stale response ({}, {ticket:?}) while {}",
                    event.name(),
                    self.state.name()
                );
                return Ok(Vec::new());
            }
        }

        let from = self.state.name();
        let event_name = event.name();
        let state = mem::take(&mut self.state);

        match self.transition(state, event) {
            Ok((next, effects)) => {
                log::debug!("Onboarding: {from} --[{event_name}]--> {}", next.name());
                self.state = next;
                Ok(effects)
            }
            Err((unchanged, error)) => {
                log::debug!("Onboarding: rejected '{event_name}' while {from}: {error}");
                self.state = unchanged;
                Err(error)
            }
        }
    }

    fn issue_ticket(&mut self) -> RequestTicket {
        self.last_ticket += 1;
        RequestTicket(self.last_ticket)
    }

    /// Space listing for the selected provider, if one is selected.
    fn fetch_spaces(
        &mut self,
        credential: &Credential,
        provider_id: Option<&str>,
    ) -> (Option<RequestTicket>, Vec<Effect>) {
        let Some(provider_id) = provider_id else {
            return (None, Vec::new());
        };
        let ticket = self.issue_ticket();
        let call = RemoteCall::FetchSpaces {
            ticket,
            credential: credential.clone(),
            provider_id: provider_id.to_string(),
        };
        (Some(ticket), vec![Effect::Remote(call)])
    }

    /// Remember the reviewed name when leaving review.
    fn leave_review(&mut self, details: &StoreDetails) {
        self.reviewed_name = Some(ReviewedName {
            derived: default_name(&details.credential, &details.target),
            name: details.name.clone(),
        });
    }

    /// Name for a new review: the earlier one while its default still
    /// applies, otherwise the freshly derived default.
    fn review_name(&mut self, credential: &Credential, target: &StoreTarget) -> String {
        let derived = default_name(credential, target);
        match self.reviewed_name.take() {
            Some(reviewed) if reviewed.derived == derived => reviewed.name,
            _ => derived,
        }
    }

    fn transition(&mut self, state: OnboardingState, event: OnboardingEvent) -> Transition {
        use OnboardingEvent as E;
        use OnboardingState as S;

        let illegal = OnboardingError::IllegalTransition {
            state: state.name(),
            event: event.name(),
        };

        match (state, event) {
            (_, E::Cancel) => {
                self.reviewed_name = None;
                Ok((S::Idle, Vec::new()))
            }

            // ===== 开始 =====
            (state @ (S::Idle | S::Done { .. }), E::Start(kind)) => match kind {
                StoreKind::DuraCloud | StoreKind::Fedora => {
                    self.reviewed_name = None;
                    Ok((
                        S::CollectingCredentials {
                            kind,
                            credential: Credential::default(),
                            selection: None,
                            error: None,
                        },
                        Vec::new(),
                    ))
                }
                StoreKind::Other => Err((state, OnboardingError::UnsupportedKind(kind))),
            },
            (state, E::Start(_)) => Err((state, OnboardingError::AlreadyActive)),
            (S::Idle, _) => Err((S::Idle, OnboardingError::NotActive)),

            // 等待远端响应期间只接受响应本身（和取消）
            (state @ (S::ValidatingCredentials { .. } | S::Committing { .. }), event)
                if event.ticket().is_none() =>
            {
                Err((state, OnboardingError::Busy))
            }

            // ===== 凭证 =====
            (
                S::CollectingCredentials {
                    kind, selection, ..
                },
                E::SubmitCredentials(credential),
            ) => {
                if let Some(field) = missing_field(&credential) {
                    let state = S::CollectingCredentials {
                        kind,
                        credential,
                        selection,
                        error: None,
                    };
                    return Err((state, OnboardingError::MissingField(field)));
                }

                match kind {
                    StoreKind::Fedora => {
                        let target = StoreTarget::Fedora;
                        let details = StoreDetails {
                            name: self.review_name(&credential, &target),
                            credential,
                            target,
                        };
                        Ok((
                            S::ReviewingDetails {
                                details,
                                selection: None,
                                error: None,
                            },
                            Vec::new(),
                        ))
                    }
                    StoreKind::DuraCloud | StoreKind::Other => {
                        let ticket = self.issue_ticket();
                        let call = RemoteCall::ValidateCredentials {
                            ticket,
                            credential: credential.clone(),
                        };
                        Ok((
                            S::ValidatingCredentials {
                                credential,
                                selection,
                                ticket,
                            },
                            vec![Effect::Remote(call)],
                        ))
                    }
                }
            }

            (
                S::ValidatingCredentials {
                    credential,
                    selection,
                    ..
                },
                E::ProviderAccountsLoaded { result, .. },
            ) => match result {
                Ok(accounts) => {
                    let previous = selection.unwrap_or_default();
                    let kept_provider = previous
                        .provider_id
                        .filter(|id| accounts.iter().any(|a| &a.id == id));
                    // 之前选择的 space 只在 provider 未变时保留
                    let space = kept_provider.as_ref().and(previous.space);
                    let provider_id =
                        kept_provider.or_else(|| accounts.first().map(|a| a.id.clone()));

                    let selection = DuraCloudSelection {
                        accounts,
                        provider_id,
                        spaces: Vec::new(),
                        space,
                        prefix: previous.prefix,
                    };
                    let (pending_spaces, effects) =
                        self.fetch_spaces(&credential, selection.provider_id.as_deref());

                    Ok((
                        S::SelectingProviderAndSpace {
                            credential,
                            selection,
                            pending_spaces,
                            error: None,
                        },
                        effects,
                    ))
                }
                Err(_) => Ok((
                    S::CollectingCredentials {
                        kind: StoreKind::DuraCloud,
                        credential,
                        selection,
                        error: Some(VALIDATION_FAILED.to_string()),
                    },
                    Vec::new(),
                )),
            },

            // ===== Provider / Space =====
            (
                S::SelectingProviderAndSpace {
                    credential,
                    mut selection,
                    pending_spaces,
                    error,
                },
                E::SelectProvider(id),
            ) => {
                if !selection.offers_provider(&id) {
                    let state = S::SelectingProviderAndSpace {
                        credential,
                        selection,
                        pending_spaces,
                        error,
                    };
                    return Err((state, OnboardingError::UnknownProvider(id)));
                }

                if selection.provider_id.as_deref() == Some(id.as_str()) && error.is_none() {
                    let state = S::SelectingProviderAndSpace {
                        credential,
                        selection,
                        pending_spaces,
                        error,
                    };
                    return Ok((state, Vec::new()));
                }

                selection.provider_id = Some(id);
                selection.spaces.clear();
                selection.space = None;
                let (pending_spaces, effects) =
                    self.fetch_spaces(&credential, selection.provider_id.as_deref());

                Ok((
                    S::SelectingProviderAndSpace {
                        credential,
                        selection,
                        pending_spaces,
                        error: None,
                    },
                    effects,
                ))
            }

            (
                S::SelectingProviderAndSpace {
                    credential,
                    mut selection,
                    ..
                },
                E::SpacesLoaded { result, .. },
            ) => {
                let error = match result {
                    Ok(spaces) => {
                        let kept = selection
                            .space
                            .take()
                            .filter(|id| spaces.iter().any(|s| &s.id == id));
                        selection.space = kept.or_else(|| spaces.first().map(|s| s.id.clone()));
                        selection.spaces = spaces;
                        None
                    }
                    Err(e) => {
                        selection.spaces.clear();
                        selection.space = None;
                        Some(e.notice())
                    }
                };

                Ok((
                    S::SelectingProviderAndSpace {
                        credential,
                        selection,
                        pending_spaces: None,
                        error,
                    },
                    Vec::new(),
                ))
            }

            (
                S::SelectingProviderAndSpace {
                    credential,
                    mut selection,
                    pending_spaces,
                    error,
                },
                E::SelectSpace(id),
            ) => {
                let rejected = !selection.offers_space(&id);
                if !rejected {
                    selection.space = Some(id.clone());
                }
                let state = S::SelectingProviderAndSpace {
                    credential,
                    selection,
                    pending_spaces,
                    error,
                };
                if rejected {
                    Err((state, OnboardingError::UnknownSpace(id)))
                } else {
                    Ok((state, Vec::new()))
                }
            }

            (
                S::SelectingProviderAndSpace {
                    credential,
                    mut selection,
                    pending_spaces,
                    error,
                },
                E::EditPrefix(prefix),
            ) => {
                selection.prefix = prefix;
                Ok((
                    S::SelectingProviderAndSpace {
                        credential,
                        selection,
                        pending_spaces,
                        error,
                    },
                    Vec::new(),
                ))
            }

            (
                S::SelectingProviderAndSpace {
                    credential,
                    selection,
                    pending_spaces,
                    error,
                },
                E::ConfirmSelection,
            ) => {
                let target = if pending_spaces.is_some() {
                    Err(OnboardingError::Busy)
                } else {
                    selection_target(&selection)
                };

                match target {
                    Ok(target) => {
                        let name = self.review_name(&credential, &target);
                        let details = StoreDetails {
                            name,
                            credential,
                            target,
                        };
                        Ok((
                            S::ReviewingDetails {
                                details,
                                selection: Some(selection),
                                error: None,
                            },
                            Vec::new(),
                        ))
                    }
                    Err(e) => Err((
                        S::SelectingProviderAndSpace {
                            credential,
                            selection,
                            pending_spaces,
                            error,
                        },
                        e,
                    )),
                }
            }

            // ===== 确认与提交 =====
            (
                S::ReviewingDetails {
                    mut details,
                    selection,
                    error,
                },
                E::EditName(name),
            ) => {
                details.name = name;
                Ok((
                    S::ReviewingDetails {
                        details,
                        selection,
                        error,
                    },
                    Vec::new(),
                ))
            }

            (
                S::ReviewingDetails {
                    details,
                    selection,
                    error,
                },
                E::Save,
            ) => {
                let store = if details.name.trim().is_empty() {
                    Err(OnboardingError::MissingField("name"))
                } else {
                    details
                        .to_object_store()
                        .map_err(|e| OnboardingError::InvalidPayload(e.to_string()))
                };

                match store {
                    Ok(store) => {
                        let ticket = self.issue_ticket();
                        Ok((
                            S::Committing {
                                details,
                                selection,
                                ticket,
                            },
                            vec![Effect::Remote(RemoteCall::CreateStore { ticket, store })],
                        ))
                    }
                    Err(e) => Err((
                        S::ReviewingDetails {
                            details,
                            selection,
                            error,
                        },
                        e,
                    )),
                }
            }

            (
                S::Committing {
                    details, selection, ..
                },
                E::CommitFinished { result, .. },
            ) => match result {
                Ok(_) => {
                    log::info!("Object store '{}' created", details.name.trim());
                    Ok((S::Done { details }, vec![Effect::RefreshStores]))
                }
                Err(e) => Ok((
                    S::ReviewingDetails {
                        details,
                        selection,
                        error: Some(e.notice()),
                    },
                    Vec::new(),
                )),
            },

            // ===== 返回 / 重新开始 =====
            (
                S::SelectingProviderAndSpace {
                    credential,
                    selection,
                    ..
                },
                E::Back | E::Restart,
            ) => Ok((
                S::CollectingCredentials {
                    kind: StoreKind::DuraCloud,
                    credential,
                    selection: Some(selection),
                    error: None,
                },
                Vec::new(),
            )),

            (
                S::ReviewingDetails {
                    details,
                    selection: Some(selection),
                    ..
                },
                E::Back,
            ) => {
                self.leave_review(&details);
                Ok((
                    S::SelectingProviderAndSpace {
                        credential: details.credential,
                        selection,
                        pending_spaces: None,
                        error: None,
                    },
                    Vec::new(),
                ))
            }

            (
                S::ReviewingDetails {
                    details, selection, ..
                },
                E::Back | E::Restart,
            ) => {
                self.leave_review(&details);
                Ok((
                    S::CollectingCredentials {
                        kind: details.kind(),
                        credential: details.credential,
                        selection,
                        error: None,
                    },
                    Vec::new(),
                ))
            }

            (
                S::CollectingCredentials {
                    kind,
                    credential,
                    selection,
                    ..
                },
                E::Restart,
            ) => Ok((
                S::CollectingCredentials {
                    kind,
                    credential,
                    selection,
                    error: None,
                },
                Vec::new(),
            )),

            (state, _) => Err((state, illegal)),
        }
    }
}

/// Default display name for a store pointing at `target`.
fn default_name(credential: &Credential, target: &StoreTarget) -> String {
    match target {
        StoreTarget::DuraCloud {
            provider_name,
            space,
            prefix,
            ..
        } => duracloud_store_name(space, prefix, credential, provider_name),
        StoreTarget::Fedora => fedora_store_name(credential),
    }
}

fn missing_field(credential: &Credential) -> Option<&'static str> {
    if credential.url.trim().is_empty() {
        Some("url")
    } else if credential.username.trim().is_empty() {
        Some("username")
    } else if credential.password.is_empty() {
        Some("password")
    } else {
        None
    }
}

fn selection_target(selection: &DuraCloudSelection) -> Result<StoreTarget, OnboardingError> {
    let account = selection
        .provider()
        .ok_or(OnboardingError::MissingSelection("provider account"))?;
    let space = selection
        .space
        .as_ref()
        .ok_or(OnboardingError::MissingSelection("space"))?;

    Ok(StoreTarget::DuraCloud {
        provider_id: account.id.clone(),
        provider_name: account.provider_type.clone(),
        space: space.clone(),
        prefix: selection.prefix.clone(),
    })
}
