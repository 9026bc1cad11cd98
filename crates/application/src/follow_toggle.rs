//! Follow relationship observation and toggling.

use std::collections::HashSet;
use std::sync::Arc;

use agora_core::{AppError, AppResult};
use agora_domain::{FollowMarker, FollowPair, RelationshipState, ToggleOutcome};
use tokio::sync::watch;

use crate::{DiagnosticEvent, Diagnostics, FollowRepository, Notice, UserNotifier};

#[cfg(test)]
mod tests;

const TOGGLE_ERROR_TITLE: &str = "Error";
const TOGGLE_ERROR_DESCRIPTION: &str = "Failed to update follow status. Please try again.";

/// Follow observation published to the rendering layer.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FollowSnapshot {
    pair: Option<FollowPair>,
    state: RelationshipState,
    is_loaded: bool,
    busy_pairs: HashSet<FollowPair>,
    last_error: Option<String>,
    epoch: u64,
}

impl FollowSnapshot {
    /// Returns the observed pair, if any pair was observed yet.
    #[must_use]
    pub fn pair(&self) -> Option<&FollowPair> {
        self.pair.as_ref()
    }

    /// Returns the cached relationship state.
    #[must_use]
    pub fn state(&self) -> RelationshipState {
        self.state
    }

    /// Returns whether the state of the observed pair was confirmed by the store.
    #[must_use]
    pub fn is_loaded(&self) -> bool {
        self.is_loaded
    }

    /// Returns whether a toggle for the observed pair is in flight.
    #[must_use]
    pub fn is_busy(&self) -> bool {
        self.pair
            .as_ref()
            .is_some_and(|pair| self.busy_pairs.contains(pair))
    }

    /// Returns the message of the last failed toggle for the observed pair.
    #[must_use]
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }
}

enum StatusCheck {
    Cached(RelationshipState),
    AwaitInFlight,
    Fetch { epoch: u64 },
}

enum WaitOutcome {
    Loaded(RelationshipState),
    Abandoned,
    Superseded,
}

/// Clears the busy flag of a pair once its toggle ends, including cancellation.
struct BusyPair<'a> {
    state: &'a watch::Sender<FollowSnapshot>,
    pair: &'a FollowPair,
}

impl Drop for BusyPair<'_> {
    fn drop(&mut self) {
        let pair = self.pair;
        self.state
            .send_if_modified(|snapshot| snapshot.busy_pairs.remove(pair));
    }
}

/// Releases an unfinished pair when the check issued for it is dropped.
struct PendingCheck<'a> {
    state: &'a watch::Sender<FollowSnapshot>,
    epoch: u64,
}

impl Drop for PendingCheck<'_> {
    fn drop(&mut self) {
        let epoch = self.epoch;
        self.state.send_if_modified(|snapshot| {
            if snapshot.epoch != epoch || snapshot.is_loaded {
                return false;
            }

            snapshot.pair = None;
            snapshot.state = RelationshipState::NotFollowing;
            snapshot.epoch = snapshot.epoch.wrapping_add(1);
            true
        });
    }
}

/// Application service observing and flipping one follow relationship.
///
/// The displayed state only ever changes to values confirmed by the store.
#[derive(Clone)]
pub struct FollowToggle {
    repository: Arc<dyn FollowRepository>,
    notifier: Arc<dyn UserNotifier>,
    diagnostics: Arc<dyn Diagnostics>,
    state: Arc<watch::Sender<FollowSnapshot>>,
}

impl FollowToggle {
    /// Creates a toggle that has not observed any pair yet.
    #[must_use]
    pub fn new(
        repository: Arc<dyn FollowRepository>,
        notifier: Arc<dyn UserNotifier>,
        diagnostics: Arc<dyn Diagnostics>,
    ) -> Self {
        Self {
            repository,
            notifier,
            diagnostics,
            state: Arc::new(watch::Sender::new(FollowSnapshot::default())),
        }
    }

    /// Returns the current snapshot.
    #[must_use]
    pub fn snapshot(&self) -> FollowSnapshot {
        self.state.borrow().clone()
    }

    /// Subscribes to snapshot changes.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<FollowSnapshot> {
        self.state.subscribe()
    }

    /// Observes a pair and returns its relationship state.
    ///
    /// The store is read once per newly observed pair. Store errors and
    /// markers other than `follow` resolve to `NotFollowing`.
    ///
    /// A cancelled check releases the pair; callers waiting on it read the
    /// store themselves.
    pub async fn check_status(&self, pair: FollowPair) -> RelationshipState {
        loop {
            match self.begin_check(&pair) {
                StatusCheck::Cached(state) => return state,
                StatusCheck::Fetch { epoch } => {
                    let _pending = PendingCheck {
                        state: &self.state,
                        epoch,
                    };
                    let state = self.fetch_state(&pair).await;
                    self.complete_check(&pair, state, epoch);
                    return state;
                }
                StatusCheck::AwaitInFlight => match self.wait_for_pair(&pair).await {
                    WaitOutcome::Loaded(state) => return state,
                    WaitOutcome::Abandoned => {}
                    WaitOutcome::Superseded => return self.fetch_state(&pair).await,
                },
            }
        }
    }

    /// Flips the relationship for a pair through the store.
    ///
    /// Rejected with [`AppError::Conflict`] while another toggle for the same
    /// pair is in flight. On failure the cached state is left unchanged, an
    /// error notice is raised and the error is returned. The pair is released
    /// when the call ends, also when its future is dropped.
    pub async fn toggle(&self, pair: FollowPair) -> AppResult<RelationshipState> {
        let mut accepted = false;
        self.state.send_if_modified(|snapshot| {
            if !snapshot.busy_pairs.insert(pair.clone()) {
                return false;
            }

            if snapshot.pair.as_ref() == Some(&pair) {
                snapshot.last_error = None;
            }
            accepted = true;
            true
        });

        if !accepted {
            return Err(AppError::Conflict(format!(
                "a follow toggle for '{pair}' is already in progress"
            )));
        }

        let _busy = BusyPair {
            state: &self.state,
            pair: &pair,
        };

        match self.repository.toggle_follow(&pair).await {
            Ok(outcome) => {
                let state = RelationshipState::from(outcome);
                self.state.send_modify(|snapshot| {
                    snapshot.busy_pairs.remove(&pair);
                    if snapshot.pair.as_ref() == Some(&pair) {
                        snapshot.state = state;
                        snapshot.is_loaded = true;
                        snapshot.epoch = snapshot.epoch.wrapping_add(1);
                    }
                });
                self.notifier.notify(confirmation_notice(outcome));
                Ok(state)
            }
            Err(error) => {
                self.diagnostics.record(DiagnosticEvent::ToggleFailed {
                    key: pair.to_string(),
                    error: error.clone(),
                });
                self.state.send_modify(|snapshot| {
                    snapshot.busy_pairs.remove(&pair);
                    if snapshot.pair.as_ref() == Some(&pair) {
                        snapshot.last_error = Some(TOGGLE_ERROR_DESCRIPTION.to_owned());
                    }
                });
                self.notifier
                    .notify(Notice::error(TOGGLE_ERROR_TITLE, TOGGLE_ERROR_DESCRIPTION));
                Err(error)
            }
        }
    }

    fn begin_check(&self, pair: &FollowPair) -> StatusCheck {
        let mut check = StatusCheck::AwaitInFlight;
        self.state.send_if_modified(|snapshot| {
            if snapshot.pair.as_ref() == Some(pair) {
                if snapshot.is_loaded {
                    check = StatusCheck::Cached(snapshot.state);
                }
                return false;
            }

            snapshot.pair = Some(pair.clone());
            snapshot.state = RelationshipState::NotFollowing;
            snapshot.is_loaded = false;
            snapshot.last_error = None;
            snapshot.epoch = snapshot.epoch.wrapping_add(1);
            check = StatusCheck::Fetch {
                epoch: snapshot.epoch,
            };
            true
        });

        check
    }

    async fn fetch_state(&self, pair: &FollowPair) -> RelationshipState {
        match self.repository.check_follow(pair).await {
            Ok(marker) => {
                if let FollowMarker::Unrecognized(value) = &marker {
                    self.diagnostics.record(DiagnosticEvent::UnrecognizedStoreValue {
                        operation: "check_follow",
                        key: pair.to_string(),
                        value: value.clone(),
                    });
                }
                RelationshipState::from(&marker)
            }
            Err(error) => {
                self.diagnostics.record(DiagnosticEvent::FetchFailed {
                    operation: "check_follow",
                    key: pair.to_string(),
                    error,
                });
                RelationshipState::NotFollowing
            }
        }
    }

    fn complete_check(&self, pair: &FollowPair, state: RelationshipState, epoch: u64) {
        let applied = self.state.send_if_modified(|snapshot| {
            if snapshot.epoch != epoch {
                return false;
            }

            snapshot.state = state;
            snapshot.is_loaded = true;
            true
        });

        if !applied {
            self.diagnostics.record(DiagnosticEvent::StaleResponseDiscarded {
                operation: "check_follow",
                key: pair.to_string(),
            });
        }
    }

    async fn wait_for_pair(&self, pair: &FollowPair) -> WaitOutcome {
        let mut receiver = self.state.subscribe();
        let observed = receiver
            .wait_for(|snapshot| snapshot.is_loaded || snapshot.pair.as_ref() != Some(pair))
            .await
            .map(|snapshot| match snapshot.pair.as_ref() {
                Some(observed) if observed == pair => WaitOutcome::Loaded(snapshot.state),
                Some(_) => WaitOutcome::Superseded,
                None => WaitOutcome::Abandoned,
            });

        observed.unwrap_or(WaitOutcome::Abandoned)
    }
}

fn confirmation_notice(outcome: ToggleOutcome) -> Notice {
    match outcome {
        ToggleOutcome::Following => Notice::success("Following", "You are now following this user."),
        ToggleOutcome::Unfollowed => Notice::success("Unfollowed", "You have unfollowed this user."),
    }
}
