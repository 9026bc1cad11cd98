use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex as StdMutex};
use std::time::Duration;

use agora_core::{AppError, AppResult};
use agora_domain::{FollowMarker, FollowPair, RelationshipState, ToggleOutcome, UserId};
use async_trait::async_trait;
use tokio::sync::{Mutex, mpsc, oneshot};

use crate::{DiagnosticEvent, Diagnostics, FollowRepository, Notice, NoticeKind, UserNotifier};

use super::FollowToggle;

fn pair(follower: &str, followee: &str) -> FollowPair {
    let ids = UserId::new(follower).and_then(|follower_id| {
        UserId::new(followee).and_then(|followee_id| FollowPair::new(follower_id, followee_id))
    });
    match ids {
        Ok(pair) => pair,
        Err(error) => panic!("invalid test pair: {error}"),
    }
}

fn lock<T>(mutex: &StdMutex<T>) -> std::sync::MutexGuard<'_, T> {
    match mutex.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

#[derive(Default)]
struct RecordingDiagnostics {
    events: StdMutex<Vec<DiagnosticEvent>>,
}

impl RecordingDiagnostics {
    fn kinds(&self) -> Vec<&'static str> {
        lock(&self.events).iter().map(DiagnosticEvent::kind).collect()
    }
}

impl Diagnostics for RecordingDiagnostics {
    fn record(&self, event: DiagnosticEvent) {
        lock(&self.events).push(event);
    }
}

#[derive(Default)]
struct RecordingNotifier {
    notices: StdMutex<Vec<Notice>>,
}

impl RecordingNotifier {
    fn titles(&self) -> Vec<(NoticeKind, String)> {
        lock(&self.notices)
            .iter()
            .map(|notice| (notice.kind, notice.title.clone()))
            .collect()
    }
}

impl UserNotifier for RecordingNotifier {
    fn notify(&self, notice: Notice) {
        lock(&self.notices).push(notice);
    }
}

#[derive(Default)]
struct FakeFollowRepository {
    follows: Mutex<HashSet<FollowPair>>,
    raw_markers: HashMap<FollowPair, String>,
    check_gates: Mutex<HashMap<FollowPair, oneshot::Receiver<String>>>,
    toggle_gate: Mutex<Option<oneshot::Receiver<()>>>,
    started: Option<mpsc::UnboundedSender<FollowPair>>,
    fail_check: bool,
    fail_toggle: bool,
    check_calls: AtomicUsize,
    toggle_calls: AtomicUsize,
}

impl FakeFollowRepository {
    fn signal_started(&self, pair: &FollowPair) {
        if let Some(started) = &self.started {
            let _ = started.send(pair.clone());
        }
    }
}

#[async_trait]
impl FollowRepository for FakeFollowRepository {
    async fn check_follow(&self, pair: &FollowPair) -> AppResult<FollowMarker> {
        self.check_calls.fetch_add(1, Ordering::SeqCst);
        let gate = self.check_gates.lock().await.remove(pair);
        self.signal_started(pair);

        if let Some(gate) = gate {
            let raw = gate
                .await
                .map_err(|_| AppError::Internal("gate dropped".to_owned()))?;
            return Ok(FollowMarker::from_store(raw.as_str()));
        }

        if self.fail_check {
            return Err(AppError::Unavailable("store offline".to_owned()));
        }

        if let Some(raw) = self.raw_markers.get(pair) {
            return Ok(FollowMarker::from_store(raw.as_str()));
        }

        let follows = self.follows.lock().await;
        Ok(if follows.contains(pair) {
            FollowMarker::Follow
        } else {
            FollowMarker::None
        })
    }

    async fn toggle_follow(&self, pair: &FollowPair) -> AppResult<ToggleOutcome> {
        self.toggle_calls.fetch_add(1, Ordering::SeqCst);
        let gate = self.toggle_gate.lock().await.take();
        self.signal_started(pair);

        if let Some(gate) = gate {
            gate.await
                .map_err(|_| AppError::Internal("gate dropped".to_owned()))?;
        }

        if self.fail_toggle {
            return Err(AppError::Unavailable("store offline".to_owned()));
        }

        let mut follows = self.follows.lock().await;
        if follows.remove(pair) {
            Ok(ToggleOutcome::Unfollowed)
        } else {
            follows.insert(pair.clone());
            Ok(ToggleOutcome::Following)
        }
    }
}

struct Harness {
    toggle: FollowToggle,
    repository: Arc<FakeFollowRepository>,
    notifier: Arc<RecordingNotifier>,
    diagnostics: Arc<RecordingDiagnostics>,
}

fn harness(repository: FakeFollowRepository) -> Harness {
    let repository = Arc::new(repository);
    let notifier = Arc::new(RecordingNotifier::default());
    let diagnostics = Arc::new(RecordingDiagnostics::default());
    let toggle = FollowToggle::new(repository.clone(), notifier.clone(), diagnostics.clone());

    Harness {
        toggle,
        repository,
        notifier,
        diagnostics,
    }
}

#[tokio::test]
async fn none_marker_then_toggle_confirms_following() {
    let u1_u2 = pair("u1", "u2");
    let harness = harness(FakeFollowRepository {
        raw_markers: HashMap::from([(u1_u2.clone(), "none".to_owned())]),
        ..FakeFollowRepository::default()
    });

    let state = harness.toggle.check_status(u1_u2.clone()).await;
    assert_eq!(state, RelationshipState::NotFollowing);

    let toggled = harness.toggle.toggle(u1_u2).await;
    assert_eq!(toggled, Ok(RelationshipState::Following));
    assert_eq!(
        harness.toggle.snapshot().state(),
        RelationshipState::Following
    );
    assert_eq!(
        harness.notifier.titles(),
        vec![(NoticeKind::Success, "Following".to_owned())]
    );
}

#[tokio::test]
async fn repeated_check_is_idempotent_and_reads_once() {
    let u1_u2 = pair("u1", "u2");
    let harness = harness(FakeFollowRepository {
        follows: Mutex::new(HashSet::from([u1_u2.clone()])),
        ..FakeFollowRepository::default()
    });

    let first = harness.toggle.check_status(u1_u2.clone()).await;
    let second = harness.toggle.check_status(u1_u2).await;

    assert_eq!(first, RelationshipState::Following);
    assert_eq!(first, second);
    assert_eq!(harness.repository.check_calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn toggling_twice_returns_to_not_following() {
    let u1_u2 = pair("u1", "u2");
    let harness = harness(FakeFollowRepository::default());

    assert_eq!(
        harness.toggle.check_status(u1_u2.clone()).await,
        RelationshipState::NotFollowing
    );
    assert_eq!(
        harness.toggle.toggle(u1_u2.clone()).await,
        Ok(RelationshipState::Following)
    );
    assert_eq!(
        harness.toggle.toggle(u1_u2).await,
        Ok(RelationshipState::NotFollowing)
    );
    assert_eq!(
        harness.notifier.titles(),
        vec![
            (NoticeKind::Success, "Following".to_owned()),
            (NoticeKind::Success, "Unfollowed".to_owned()),
        ]
    );
}

#[tokio::test]
async fn toggle_waits_for_the_store_before_changing_state() {
    let u1_u2 = pair("u1", "u2");
    let (started_tx, mut started_rx) = mpsc::unbounded_channel();
    let (release, gate) = oneshot::channel();
    let harness = harness(FakeFollowRepository {
        toggle_gate: Mutex::new(Some(gate)),
        started: Some(started_tx),
        ..FakeFollowRepository::default()
    });
    harness.toggle.check_status(u1_u2.clone()).await;
    let _ = started_rx.recv().await;

    let in_flight = tokio::spawn({
        let toggle = harness.toggle.clone();
        let u1_u2 = u1_u2.clone();
        async move { toggle.toggle(u1_u2).await }
    });
    assert_eq!(started_rx.recv().await, Some(u1_u2));

    let during = harness.toggle.snapshot();
    assert!(during.is_busy());
    assert_eq!(during.state(), RelationshipState::NotFollowing);

    assert!(release.send(()).is_ok());
    let result = in_flight.await.ok();
    assert_eq!(result, Some(Ok(RelationshipState::Following)));

    let after = harness.toggle.snapshot();
    assert!(!after.is_busy());
    assert_eq!(after.state(), RelationshipState::Following);
}

#[tokio::test]
async fn second_toggle_while_busy_is_rejected() {
    let u1_u2 = pair("u1", "u2");
    let (started_tx, mut started_rx) = mpsc::unbounded_channel();
    let (release, gate) = oneshot::channel();
    let harness = harness(FakeFollowRepository {
        toggle_gate: Mutex::new(Some(gate)),
        started: Some(started_tx),
        ..FakeFollowRepository::default()
    });

    let first = tokio::spawn({
        let toggle = harness.toggle.clone();
        let u1_u2 = u1_u2.clone();
        async move { toggle.toggle(u1_u2).await }
    });
    assert_eq!(started_rx.recv().await, Some(u1_u2.clone()));

    let second = harness.toggle.toggle(u1_u2).await;
    assert!(matches!(second, Err(AppError::Conflict(_))));

    assert!(release.send(()).is_ok());
    assert_eq!(first.await.ok(), Some(Ok(RelationshipState::Following)));
    assert_eq!(harness.repository.toggle_calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn failed_toggle_keeps_state_and_surfaces_error() {
    let u1_u2 = pair("u1", "u2");
    let harness = harness(FakeFollowRepository {
        follows: Mutex::new(HashSet::from([u1_u2.clone()])),
        fail_toggle: true,
        ..FakeFollowRepository::default()
    });
    harness.toggle.check_status(u1_u2.clone()).await;

    let result = harness.toggle.toggle(u1_u2).await;

    assert!(matches!(result, Err(AppError::Unavailable(_))));
    let snapshot = harness.toggle.snapshot();
    assert_eq!(snapshot.state(), RelationshipState::Following);
    assert!(!snapshot.is_busy());
    assert!(snapshot.last_error().is_some());
    assert_eq!(
        harness.notifier.titles(),
        vec![(NoticeKind::Error, "Error".to_owned())]
    );
    assert_eq!(harness.diagnostics.kinds(), vec!["toggle_failed"]);
}

#[tokio::test]
async fn failed_check_falls_back_to_not_following_silently() {
    let harness = harness(FakeFollowRepository {
        fail_check: true,
        ..FakeFollowRepository::default()
    });

    let state = harness.toggle.check_status(pair("u1", "u2")).await;

    assert_eq!(state, RelationshipState::NotFollowing);
    assert!(harness.toggle.snapshot().is_loaded());
    assert!(harness.notifier.titles().is_empty());
    assert_eq!(harness.diagnostics.kinds(), vec!["fetch_failed"]);
}

#[tokio::test]
async fn unrecognized_marker_fails_closed() {
    let u1_u2 = pair("u1", "u2");
    let harness = harness(FakeFollowRepository {
        raw_markers: HashMap::from([(u1_u2.clone(), "pending".to_owned())]),
        ..FakeFollowRepository::default()
    });

    let state = harness.toggle.check_status(u1_u2).await;

    assert_eq!(state, RelationshipState::NotFollowing);
    assert_eq!(harness.diagnostics.kinds(), vec!["unrecognized_store_value"]);
}

#[tokio::test]
async fn superseded_check_does_not_overwrite_newer_pair() {
    let a_b = pair("a", "b");
    let a_c = pair("a", "c");
    let (started_tx, mut started_rx) = mpsc::unbounded_channel();
    let (release_a_b, a_b_gate) = oneshot::channel();
    let harness = harness(FakeFollowRepository {
        check_gates: Mutex::new(HashMap::from([(a_b.clone(), a_b_gate)])),
        started: Some(started_tx),
        ..FakeFollowRepository::default()
    });

    let first = tokio::spawn({
        let toggle = harness.toggle.clone();
        let a_b = a_b.clone();
        async move { toggle.check_status(a_b).await }
    });
    assert_eq!(started_rx.recv().await, Some(a_b));

    let newer = harness.toggle.check_status(a_c.clone()).await;
    assert_eq!(newer, RelationshipState::NotFollowing);

    assert!(release_a_b.send("follow".to_owned()).is_ok());
    assert_eq!(first.await.ok(), Some(RelationshipState::Following));

    let snapshot = harness.toggle.snapshot();
    assert_eq!(snapshot.pair(), Some(&a_c));
    assert_eq!(snapshot.state(), RelationshipState::NotFollowing);
    assert_eq!(
        harness.diagnostics.kinds(),
        vec!["stale_response_discarded"]
    );
}

#[tokio::test]
async fn cancelled_toggle_releases_the_pair() {
    let u1_u2 = pair("u1", "u2");
    let (started_tx, mut started_rx) = mpsc::unbounded_channel();
    let (_release, gate) = oneshot::channel();
    let harness = harness(FakeFollowRepository {
        toggle_gate: Mutex::new(Some(gate)),
        started: Some(started_tx),
        ..FakeFollowRepository::default()
    });
    harness.toggle.check_status(u1_u2.clone()).await;
    let _ = started_rx.recv().await;

    let first = tokio::spawn({
        let toggle = harness.toggle.clone();
        let u1_u2 = u1_u2.clone();
        async move { toggle.toggle(u1_u2).await }
    });
    assert_eq!(started_rx.recv().await, Some(u1_u2.clone()));
    assert!(harness.toggle.snapshot().is_busy());

    first.abort();
    assert!(first.await.is_err_and(|error| error.is_cancelled()));
    assert!(!harness.toggle.snapshot().is_busy());

    let retry = harness.toggle.toggle(u1_u2).await;

    assert_eq!(retry, Ok(RelationshipState::Following));
    assert_eq!(harness.repository.toggle_calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn cancelled_check_releases_the_pair() {
    let a_b = pair("a", "b");
    let (started_tx, mut started_rx) = mpsc::unbounded_channel();
    let (_release_a_b, a_b_gate) = oneshot::channel();
    let harness = harness(FakeFollowRepository {
        follows: Mutex::new(HashSet::from([a_b.clone()])),
        check_gates: Mutex::new(HashMap::from([(a_b.clone(), a_b_gate)])),
        started: Some(started_tx),
        ..FakeFollowRepository::default()
    });

    let first = tokio::spawn({
        let toggle = harness.toggle.clone();
        let a_b = a_b.clone();
        async move { toggle.check_status(a_b).await }
    });
    assert_eq!(started_rx.recv().await, Some(a_b.clone()));
    first.abort();
    assert!(first.await.is_err_and(|error| error.is_cancelled()));

    let retry = tokio::time::timeout(
        Duration::from_secs(2),
        harness.toggle.check_status(a_b.clone()),
    )
    .await;

    assert_eq!(retry.ok(), Some(RelationshipState::Following));
    let snapshot = harness.toggle.snapshot();
    assert_eq!(snapshot.pair(), Some(&a_b));
    assert!(snapshot.is_loaded());
    assert_eq!(harness.repository.check_calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn waiter_reads_its_own_pair_when_superseded() {
    let a_b = pair("a", "b");
    let a_c = pair("a", "c");
    let (started_tx, mut started_rx) = mpsc::unbounded_channel();
    let (release_a_b, a_b_gate) = oneshot::channel();
    let harness = harness(FakeFollowRepository {
        follows: Mutex::new(HashSet::from([a_b.clone()])),
        check_gates: Mutex::new(HashMap::from([(a_b.clone(), a_b_gate)])),
        started: Some(started_tx),
        ..FakeFollowRepository::default()
    });

    let first = tokio::spawn({
        let toggle = harness.toggle.clone();
        let a_b = a_b.clone();
        async move { toggle.check_status(a_b).await }
    });
    assert_eq!(started_rx.recv().await, Some(a_b.clone()));

    let waiter = tokio::spawn({
        let toggle = harness.toggle.clone();
        let a_b = a_b.clone();
        async move { toggle.check_status(a_b).await }
    });
    while harness.toggle.state.receiver_count() == 0 {
        tokio::task::yield_now().await;
    }

    let newer = harness.toggle.check_status(a_c.clone()).await;
    assert_eq!(newer, RelationshipState::NotFollowing);

    assert_eq!(waiter.await.ok(), Some(RelationshipState::Following));
    assert!(release_a_b.send("follow".to_owned()).is_ok());
    assert_eq!(first.await.ok(), Some(RelationshipState::Following));

    assert_eq!(harness.toggle.snapshot().pair(), Some(&a_c));
    assert_eq!(harness.repository.check_calls.load(Ordering::SeqCst), 3);
}
