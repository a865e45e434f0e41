//! Runs blocking core calls off the caller's thread and publishes their
//! progress to typed observers.
//!
//! 将阻塞的核心调用放到后台线程执行，并把进度广播给订阅者。

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use qj_core::ids::{ChatId, ContactId, OperationId};
use qj_core::ports::{CoreError, CoreErrorKind, OngoingProcessPort};
use qj_core::progress::{
    FailureCause, OperationKind, Permille, ProgressEvent, ProgressPayload, UNKNOWN_ERROR,
};
use tokio::runtime::Handle;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use super::subscription::{ObserverId, ProgressSubscription};

/// Result of one blocking core call. Secure-join returns the new chat.
pub type OperationResult = Result<Option<ChatId>, CoreError>;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BridgeError {
    #[error("a {0} operation is already running")]
    AlreadyRunning(OperationKind),
}

/// Reference to one operation started through [`ProgressBridge::run`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct OperationHandle {
    id: OperationId,
    kind: OperationKind,
}

impl OperationHandle {
    pub fn id(&self) -> &OperationId {
        &self.id
    }

    pub fn kind(&self) -> OperationKind {
        self.kind
    }
}

struct ActiveOperation {
    id: OperationId,
    last_permille: Option<Permille>,
    /// A failure was already published; later signals are dropped.
    terminal: bool,
    last_error: Option<(String, FailureCause)>,
}

#[derive(Default)]
struct BridgeState {
    active: HashMap<OperationKind, ActiveOperation>,
    observers: HashMap<OperationKind, Vec<(ObserverId, mpsc::UnboundedSender<ProgressEvent>)>>,
    next_observer_id: u64,
}

pub(crate) struct BridgeShared {
    state: Mutex<BridgeState>,
}

impl BridgeShared {
    fn lock(&self) -> MutexGuard<'_, BridgeState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub(crate) fn remove_observer(&self, id: ObserverId) -> bool {
        let mut state = self.lock();
        let mut found = false;
        for observers in state.observers.values_mut() {
            let before = observers.len();
            observers.retain(|(observer_id, _)| *observer_id != id);
            found |= observers.len() < before;
        }
        found
    }

    fn finish(&self, kind: OperationKind, id: &OperationId, result: OperationResult) {
        let mut state = self.lock();
        if state.active.get(&kind).map(|op| &op.id) != Some(id) {
            debug!(operation_id = %id, %kind, "ignoring result of detached operation");
            return;
        }
        let Some(op) = state.active.remove(&kind) else {
            return;
        };
        if op.terminal {
            debug!(operation_id = %id, %kind, "operation returned after reporting failure");
            return;
        }

        let payload = match result {
            Ok(chat_id) => ProgressPayload::Success { chat_id },
            Err(err) => {
                let (message, cause) = failure_text(&err, op.last_error);
                ProgressPayload::Failure { message, cause }
            }
        };
        info!(operation_id = %id, %kind, ?payload, "operation finished");
        publish(&mut state, kind, id, payload);
    }
}

/// Pub/sub bridge between blocking core calls and any number of observers.
///
/// At most one operation runs at a time, across all kinds: the core's stop
/// and error signals are not scoped to an operation. For each
/// operation, observers see stage updates in non-decreasing order followed by
/// exactly one `Failure` or `Success`, unless the operation is cancelled, in
/// which case nothing more is published.
#[derive(Clone)]
pub struct ProgressBridge {
    shared: Arc<BridgeShared>,
    runtime: Handle,
    stopper: Arc<dyn OngoingProcessPort>,
}

impl ProgressBridge {
    pub fn new(runtime: Handle, stopper: Arc<dyn OngoingProcessPort>) -> Self {
        Self {
            shared: Arc::new(BridgeShared {
                state: Mutex::new(BridgeState::default()),
            }),
            runtime,
            stopper,
        }
    }

    /// Starts `operation` on the blocking pool.
    ///
    /// Rejected with [`BridgeError::AlreadyRunning`], naming the running kind,
    /// while any operation is active; nothing is queued.
    pub fn run<F>(&self, kind: OperationKind, operation: F) -> Result<OperationHandle, BridgeError>
    where
        F: FnOnce() -> OperationResult + Send + 'static,
    {
        let id = OperationId::new();
        {
            let mut state = self.shared.lock();
            // the core runs one ongoing process at a time, whatever its kind
            if let Some(running) = state.active.keys().next().copied() {
                warn!(%kind, %running, "rejecting operation, another one is running");
                return Err(BridgeError::AlreadyRunning(running));
            }
            state.active.insert(
                kind,
                ActiveOperation {
                    id: id.clone(),
                    last_permille: None,
                    terminal: false,
                    last_error: None,
                },
            );
        }
        info!(operation_id = %id, %kind, "operation started");

        let shared = self.shared.clone();
        let operation_id = id.clone();
        let blocking = self.runtime.spawn_blocking(operation);
        self.runtime.spawn(async move {
            let result = match blocking.await {
                Ok(result) => result,
                Err(err) => Err(CoreError::protocol(format!("operation aborted: {err}"))),
            };
            shared.finish(kind, &operation_id, result);
        });

        Ok(OperationHandle { id, kind })
    }

    /// Feeds a progress signal from the core into the active operation.
    ///
    /// `0` fails the operation with the last recorded error, values above
    /// `1000` and regressions are dropped. Ignored when nothing is running.
    pub fn report(&self, kind: OperationKind, permille: u16, peer: Option<ContactId>) {
        let Some(permille) = Permille::new(permille) else {
            warn!(%kind, permille, "dropping out-of-range progress");
            return;
        };

        let mut state = self.shared.lock();
        let Some(op) = state.active.get_mut(&kind) else {
            debug!(%kind, %permille, "progress without active operation");
            return;
        };
        if op.terminal {
            return;
        }

        let id = op.id.clone();
        let payload = if permille.is_failure() {
            op.terminal = true;
            let (message, cause) = op
                .last_error
                .clone()
                .unwrap_or_else(|| (UNKNOWN_ERROR.to_string(), FailureCause::Peer));
            ProgressPayload::Failure { message, cause }
        } else {
            if op.last_permille.is_some_and(|last| permille < last) {
                debug!(operation_id = %id, %permille, "dropping regressed progress");
                return;
            }
            op.last_permille = Some(permille);
            ProgressPayload::StageUpdate { permille, peer }
        };
        publish(&mut state, kind, &id, payload);
    }

    /// Remembers error text for the next failure of the running operation.
    pub fn record_error(&self, message: &str, cause: FailureCause) {
        let mut state = self.shared.lock();
        for op in state.active.values_mut().filter(|op| !op.terminal) {
            op.last_error = Some((message.to_string(), cause));
        }
    }

    /// Cancels the operation behind `handle`.
    ///
    /// Safe from any thread and idempotent. After a terminal event, or for an
    /// operation that is no longer current, this does nothing. Otherwise the
    /// slot is freed, the core is asked to stop and no further event of that
    /// operation is published. Returns whether anything was cancelled.
    pub fn cancel(&self, handle: &OperationHandle) -> bool {
        {
            let mut state = self.shared.lock();
            match state.active.get(&handle.kind) {
                Some(op) if op.id == handle.id && !op.terminal => {
                    state.active.remove(&handle.kind);
                }
                _ => return false,
            }
        }
        info!(operation_id = %handle.id, kind = %handle.kind, "operation cancelled");
        self.stopper.stop_ongoing_process();
        true
    }

    /// Registers an observer for `kind`. No replay of earlier events.
    pub fn subscribe(&self, kind: OperationKind) -> ProgressSubscription {
        let (tx, rx) = mpsc::unbounded_channel();
        let id = {
            let mut state = self.shared.lock();
            let id = ObserverId(state.next_observer_id);
            state.next_observer_id += 1;
            state.observers.entry(kind).or_default().push((id, tx));
            id
        };
        debug!(observer = id.0, %kind, "observer subscribed");
        ProgressSubscription {
            id,
            kind,
            rx,
            bridge: Arc::downgrade(&self.shared),
        }
    }

    /// Removes an observer. Returns false if it was already gone.
    pub fn unsubscribe(&self, id: ObserverId) -> bool {
        self.shared.remove_observer(id)
    }

    /// Runtime the bridge spawns its work on.
    pub fn runtime(&self) -> &Handle {
        &self.runtime
    }

    pub fn is_active(&self, kind: OperationKind) -> bool {
        self.shared.lock().active.contains_key(&kind)
    }

    pub fn active_operation(&self, kind: OperationKind) -> Option<OperationId> {
        self.shared.lock().active.get(&kind).map(|op| op.id.clone())
    }

    pub fn observer_count(&self, kind: OperationKind) -> usize {
        self.shared
            .lock()
            .observers
            .get(&kind)
            .map_or(0, |observers| observers.len())
    }
}

fn failure_text(err: &CoreError, recorded: Option<(String, FailureCause)>) -> (String, FailureCause) {
    let cause = match err.kind {
        CoreErrorKind::Network => FailureCause::Transport,
        CoreErrorKind::Protocol | CoreErrorKind::Aborted => FailureCause::Peer,
    };
    if !err.message.is_empty() {
        return (err.message.clone(), cause);
    }
    recorded.unwrap_or_else(|| (UNKNOWN_ERROR.to_string(), cause))
}

/// Sends under the state lock so every observer sees one global order.
fn publish(state: &mut BridgeState, kind: OperationKind, id: &OperationId, payload: ProgressPayload) {
    let event = ProgressEvent {
        operation_id: id.clone(),
        kind,
        payload,
    };
    if let Some(observers) = state.observers.get_mut(&kind) {
        observers.retain(|(_, tx)| tx.send(event.clone()).is_ok());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::mpsc as std_mpsc;
    use std::time::Duration;

    #[derive(Default)]
    struct CountingStopper {
        stops: AtomicUsize,
    }

    impl OngoingProcessPort for CountingStopper {
        fn stop_ongoing_process(&self) {
            self.stops.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn bridge() -> (ProgressBridge, Arc<CountingStopper>) {
        let stopper = Arc::new(CountingStopper::default());
        (ProgressBridge::new(Handle::current(), stopper.clone()), stopper)
    }

    async fn next(sub: &mut ProgressSubscription) -> ProgressEvent {
        tokio::time::timeout(Duration::from_secs(5), sub.recv())
            .await
            .expect("timed out waiting for event")
            .expect("subscription closed")
    }

    fn stage(value: u16) -> ProgressPayload {
        ProgressPayload::StageUpdate {
            permille: Permille::new(value).unwrap(),
            peer: None,
        }
    }

    #[tokio::test]
    async fn publishes_stages_then_success_in_order() {
        let (bridge, _) = bridge();
        let mut sub = bridge.subscribe(OperationKind::Configure);
        let (go_tx, go_rx) = std_mpsc::channel::<()>();

        let handle = bridge
            .run(OperationKind::Configure, move || {
                go_rx.recv().ok();
                Ok(None)
            })
            .unwrap();
        bridge.report(OperationKind::Configure, 100, None);
        bridge.report(OperationKind::Configure, 50, None);
        bridge.report(OperationKind::Configure, 700, None);
        go_tx.send(()).unwrap();

        assert_eq!(next(&mut sub).await.payload, stage(100));
        assert_eq!(next(&mut sub).await.payload, stage(700));
        let done = next(&mut sub).await;
        assert_eq!(done.payload, ProgressPayload::Success { chat_id: None });
        assert_eq!(&done.operation_id, handle.id());
        assert!(!bridge.is_active(OperationKind::Configure));
    }

    #[tokio::test]
    async fn second_run_of_same_kind_is_rejected() {
        let (bridge, _) = bridge();
        let (go_tx, go_rx) = std_mpsc::channel::<()>();
        let first = bridge
            .run(OperationKind::ImportExport, move || {
                go_rx.recv().ok();
                Ok(None)
            })
            .unwrap();

        let second = bridge.run(OperationKind::ImportExport, || Ok(None));
        assert_eq!(
            second,
            Err(BridgeError::AlreadyRunning(OperationKind::ImportExport))
        );
        assert_eq!(
            bridge.active_operation(OperationKind::ImportExport).as_ref(),
            Some(first.id())
        );

        go_tx.send(()).unwrap();
    }

    #[tokio::test]
    async fn other_kinds_are_rejected_while_one_runs() {
        let (bridge, stopper) = bridge();
        let mut join_sub = bridge.subscribe(OperationKind::SecureJoin);
        let (go_tx, go_rx) = std_mpsc::channel::<()>();
        let join = bridge
            .run(OperationKind::SecureJoin, move || {
                go_rx.recv().ok();
                Ok(ChatId::new(12))
            })
            .unwrap();

        let configure = bridge.run(OperationKind::Configure, || Ok(None));
        assert_eq!(
            configure,
            Err(BridgeError::AlreadyRunning(OperationKind::SecureJoin))
        );
        assert!(!bridge.is_active(OperationKind::Configure));

        // nothing of the rejected kind can stop the join or taint its error text
        bridge.report(OperationKind::Configure, 0, None);
        go_tx.send(()).unwrap();
        let done = next(&mut join_sub).await;
        assert_eq!(&done.operation_id, join.id());
        assert_eq!(
            done.payload,
            ProgressPayload::Success {
                chat_id: ChatId::new(12)
            }
        );
        assert_eq!(stopper.stops.load(Ordering::SeqCst), 0);

        assert!(bridge.run(OperationKind::Configure, || Ok(None)).is_ok());
    }

    #[tokio::test]
    async fn zero_fails_with_recorded_error_and_result_is_dropped() {
        let (bridge, _) = bridge();
        let mut sub = bridge.subscribe(OperationKind::Configure);
        let (go_tx, go_rx) = std_mpsc::channel::<()>();
        bridge
            .run(OperationKind::Configure, move || {
                go_rx.recv().ok();
                Ok(None)
            })
            .unwrap();

        bridge.report(OperationKind::Configure, 200, None);
        bridge.record_error("server unreachable", FailureCause::Transport);
        bridge.report(OperationKind::Configure, 0, None);
        bridge.report(OperationKind::Configure, 300, None);
        go_tx.send(()).unwrap();

        assert_eq!(next(&mut sub).await.payload, stage(200));
        assert_eq!(
            next(&mut sub).await.payload,
            ProgressPayload::Failure {
                message: "server unreachable".to_string(),
                cause: FailureCause::Transport,
            }
        );
        // the slot frees once the call returns, without another event
        while bridge.is_active(OperationKind::Configure) {
            tokio::task::yield_now().await;
        }
        assert!(sub.try_recv().is_none());
    }

    #[tokio::test]
    async fn failure_without_text_uses_placeholder() {
        let (bridge, _) = bridge();
        let mut sub = bridge.subscribe(OperationKind::ImportExport);

        bridge
            .run(OperationKind::ImportExport, || {
                Err(CoreError::protocol(String::new()))
            })
            .unwrap();

        assert_eq!(
            next(&mut sub).await.payload,
            ProgressPayload::Failure {
                message: UNKNOWN_ERROR.to_string(),
                cause: FailureCause::Peer,
            }
        );
    }

    #[tokio::test]
    async fn cancel_stops_core_and_silences_operation() {
        let (bridge, stopper) = bridge();
        let mut sub = bridge.subscribe(OperationKind::SecureJoin);
        let (go_tx, go_rx) = std_mpsc::channel::<()>();
        let handle = bridge
            .run(OperationKind::SecureJoin, move || {
                go_rx.recv().ok();
                Err(CoreError::aborted())
            })
            .unwrap();

        assert!(bridge.cancel(&handle));
        assert!(!bridge.cancel(&handle));
        assert_eq!(stopper.stops.load(Ordering::SeqCst), 1);
        assert!(!bridge.is_active(OperationKind::SecureJoin));

        bridge.report(OperationKind::SecureJoin, 400, None);
        go_tx.send(()).unwrap();
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(sub.try_recv().is_none());
    }

    #[tokio::test]
    async fn cancel_after_completion_is_noop() {
        let (bridge, stopper) = bridge();
        let mut sub = bridge.subscribe(OperationKind::Configure);
        let handle = bridge.run(OperationKind::Configure, || Ok(None)).unwrap();
        next(&mut sub).await;

        assert!(!bridge.cancel(&handle));
        assert_eq!(stopper.stops.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn late_subscriber_gets_no_replay_and_drop_unsubscribes() {
        let (bridge, _) = bridge();
        let (go_tx, go_rx) = std_mpsc::channel::<()>();
        bridge
            .run(OperationKind::Configure, move || {
                go_rx.recv().ok();
                Ok(None)
            })
            .unwrap();
        bridge.report(OperationKind::Configure, 100, None);

        let mut late = bridge.subscribe(OperationKind::Configure);
        let early_gone = bridge.subscribe(OperationKind::Configure);
        assert_eq!(bridge.observer_count(OperationKind::Configure), 2);
        drop(early_gone);
        assert_eq!(bridge.observer_count(OperationKind::Configure), 1);

        bridge.report(OperationKind::Configure, 500, None);
        go_tx.send(()).unwrap();
        assert_eq!(next(&mut late).await.payload, stage(500));

        let id = late.id();
        assert!(bridge.unsubscribe(id));
        assert!(!bridge.unsubscribe(id));
    }
}
