//! Effective-role resolution for one observed subject.
//!
//! A resolver instance caches the role of the subject/scope key it currently
//! observes. Every key change issues exactly one store read; completions are
//! tagged with the epoch of the key they were issued for and dropped when a
//! newer key has been observed in the meantime. A read whose caller is
//! cancelled releases its key, so the next caller reads again.

use std::sync::Arc;

use agora_domain::{CommunityRole, RankedRole, UserId, UserRole, highest_role};
use tokio::sync::watch;

use crate::{DiagnosticEvent, Diagnostics, RoleAssignmentRepository};


/// Resolver for platform-wide roles.
pub type UserRoleResolver = RoleResolver<UserRole>;

/// Resolver for roles inside one community.
pub type CommunityRoleResolver = RoleResolver<CommunityRole>;

/// Subject and scope a role is resolved for.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RoleQuery<S> {
    /// Observed subject, absent when nobody is signed in.
    pub subject_id: Option<UserId>,
    /// Scope the role is resolved in.
    pub scope: S,
}

impl<S: std::fmt::Display> std::fmt::Display for RoleQuery<S> {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.subject_id {
            Some(subject_id) => write!(formatter, "{subject_id}@{}", self.scope),
            None => write!(formatter, "<anonymous>@{}", self.scope),
        }
    }
}

/// Role observation published to the rendering layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoleSnapshot<R: RankedRole> {
    query: Option<RoleQuery<R::Scope>>,
    role: R,
    is_loaded: bool,
    epoch: u64,
}

impl<R: RankedRole> RoleSnapshot<R> {
    fn unobserved() -> Self {
        Self {
            query: None,
            role: R::LOWEST,
            is_loaded: false,
            epoch: 0,
        }
    }

    /// Returns the key this snapshot belongs to, if any key was observed yet.
    #[must_use]
    pub fn query(&self) -> Option<&RoleQuery<R::Scope>> {
        self.query.as_ref()
    }

    /// Returns the effective role. The lowest role until loaded.
    #[must_use]
    pub fn role(&self) -> R {
        self.role
    }

    /// Returns whether resolution for the current key has completed.
    #[must_use]
    pub fn is_loaded(&self) -> bool {
        self.is_loaded
    }
}

enum Resolution<R: RankedRole> {
    Cached(RoleSnapshot<R>),
    AwaitInFlight,
    Fetch { subject_id: UserId, epoch: u64 },
}

enum WaitOutcome<R: RankedRole> {
    Loaded(RoleSnapshot<R>),
    Abandoned,
    Superseded { epoch: u64 },
}

/// Releases an unfinished key when the read issued for it is dropped.
struct PendingFetch<'a, R: RankedRole> {
    state: &'a watch::Sender<RoleSnapshot<R>>,
    epoch: u64,
}

impl<R: RankedRole> Drop for PendingFetch<'_, R> {
    fn drop(&mut self) {
        let epoch = self.epoch;
        self.state.send_if_modified(|snapshot| {
            if snapshot.epoch != epoch || snapshot.is_loaded {
                return false;
            }

            snapshot.query = None;
            snapshot.role = R::LOWEST;
            snapshot.epoch = snapshot.epoch.wrapping_add(1);
            true
        });
    }
}

/// Application service resolving a subject's effective role in one role family.
pub struct RoleResolver<R: RankedRole> {
    repository: Arc<dyn RoleAssignmentRepository<R>>,
    diagnostics: Arc<dyn Diagnostics>,
    state: Arc<watch::Sender<RoleSnapshot<R>>>,
}

impl<R: RankedRole> Clone for RoleResolver<R> {
    fn clone(&self) -> Self {
        Self {
            repository: Arc::clone(&self.repository),
            diagnostics: Arc::clone(&self.diagnostics),
            state: Arc::clone(&self.state),
        }
    }
}

impl<R: RankedRole> RoleResolver<R> {
    /// Creates a resolver that has not observed any key yet.
    #[must_use]
    pub fn new(
        repository: Arc<dyn RoleAssignmentRepository<R>>,
        diagnostics: Arc<dyn Diagnostics>,
    ) -> Self {
        Self {
            repository,
            diagnostics,
            state: Arc::new(watch::Sender::new(RoleSnapshot::unobserved())),
        }
    }

    /// Returns the current snapshot.
    #[must_use]
    pub fn snapshot(&self) -> RoleSnapshot<R> {
        self.state.borrow().clone()
    }

    /// Subscribes to snapshot changes.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<RoleSnapshot<R>> {
        self.state.subscribe()
    }

    /// Observes a subject/scope key and resolves its effective role.
    ///
    /// Without a subject the lowest role is returned immediately and the store
    /// is not contacted. Store failures resolve to the lowest role and are
    /// reported to diagnostics only. The returned snapshot belongs to the
    /// requested key even when a newer key superseded it before completion;
    /// observers only ever see the newest key's state.
    ///
    /// Dropping the returned future before it completes releases the key:
    /// callers waiting on the same key issue the read themselves.
    pub async fn resolve(&self, subject_id: Option<UserId>, scope: R::Scope) -> RoleSnapshot<R> {
        let query = RoleQuery { subject_id, scope };
        loop {
            match self.begin(&query) {
                Resolution::Cached(snapshot) => return snapshot,
                Resolution::Fetch { subject_id, epoch } => {
                    let _pending = PendingFetch {
                        state: &self.state,
                        epoch,
                    };
                    let role = self.fetch_role(&subject_id, &query).await;
                    return self.complete(query, role, epoch);
                }
                Resolution::AwaitInFlight => match self.wait_for_query(&query).await {
                    WaitOutcome::Loaded(snapshot) => return snapshot,
                    WaitOutcome::Abandoned => {}
                    WaitOutcome::Superseded { epoch } => {
                        return self.fetch_detached(query, epoch).await;
                    }
                },
            }
        }
    }

    fn begin(&self, query: &RoleQuery<R::Scope>) -> Resolution<R> {
        let mut resolution = Resolution::AwaitInFlight;
        self.state.send_if_modified(|snapshot| {
            if snapshot.query.as_ref() == Some(query) {
                if snapshot.is_loaded {
                    resolution = Resolution::Cached(snapshot.clone());
                }
                return false;
            }

            snapshot.query = Some(query.clone());
            snapshot.role = R::LOWEST;
            snapshot.epoch = snapshot.epoch.wrapping_add(1);
            match &query.subject_id {
                Some(subject_id) => {
                    snapshot.is_loaded = false;
                    resolution = Resolution::Fetch {
                        subject_id: subject_id.clone(),
                        epoch: snapshot.epoch,
                    };
                }
                None => {
                    snapshot.is_loaded = true;
                    resolution = Resolution::Cached(snapshot.clone());
                }
            }

            true
        });

        resolution
    }

    async fn fetch_role(&self, subject_id: &UserId, query: &RoleQuery<R::Scope>) -> R {
        match self
            .repository
            .list_role_assignments(subject_id, &query.scope)
            .await
        {
            Ok(assignments) => highest_role(
                assignments
                    .into_iter()
                    .filter(|assignment| {
                        &assignment.subject_id == subject_id && assignment.scope == query.scope
                    })
                    .map(|assignment| assignment.role),
            ),
            Err(error) => {
                self.diagnostics.record(DiagnosticEvent::FetchFailed {
                    operation: "list_role_assignments",
                    key: query.to_string(),
                    error,
                });
                R::LOWEST
            }
        }
    }

    fn complete(&self, query: RoleQuery<R::Scope>, role: R, epoch: u64) -> RoleSnapshot<R> {
        let applied = self.state.send_if_modified(|snapshot| {
            if snapshot.epoch != epoch {
                return false;
            }

            snapshot.role = role;
            snapshot.is_loaded = true;
            true
        });

        if !applied {
            self.diagnostics.record(DiagnosticEvent::StaleResponseDiscarded {
                operation: "list_role_assignments",
                key: query.to_string(),
            });
        }

        RoleSnapshot {
            query: Some(query),
            role,
            is_loaded: true,
            epoch,
        }
    }

    /// Reads a key that is no longer observed without touching the shared state.
    async fn fetch_detached(&self, query: RoleQuery<R::Scope>, epoch: u64) -> RoleSnapshot<R> {
        let role = match &query.subject_id {
            Some(subject_id) => self.fetch_role(subject_id, &query).await,
            None => R::LOWEST,
        };

        RoleSnapshot {
            query: Some(query),
            role,
            is_loaded: true,
            epoch,
        }
    }

    async fn wait_for_query(&self, query: &RoleQuery<R::Scope>) -> WaitOutcome<R> {
        let mut receiver = self.state.subscribe();
        let observed = receiver
            .wait_for(|snapshot| snapshot.is_loaded || snapshot.query.as_ref() != Some(query))
            .await
            .map(|snapshot| snapshot.clone());

        match observed {
            Ok(snapshot) if snapshot.query.as_ref() == Some(query) => {
                WaitOutcome::Loaded(snapshot)
            }
            Ok(snapshot) if snapshot.query.is_some() => WaitOutcome::Superseded {
                epoch: snapshot.epoch,
            },
            Ok(_) | Err(_) => WaitOutcome::Abandoned,
        }
    }
}
