//! Secure-join handshake engine
//!
//! 负责编排加入方握手：启动阻塞的核心调用，把进度事件转换为状态机事件，
//! 并执行状态机返回的动作。
//!
//! ```text
//! core join call (blocking pool)
//!   ↓ JoinerProgress
//! ProgressBridge (SecureJoin)
//!   ↓ ProgressEvent
//! SecureJoinEngine listener → HandshakeStateMachine
//!   ↓ state changes / actions
//! HandshakeObserver, HandshakeHandle
//! ```

use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use chrono::Utc;
use qj_core::ids::{ContactId, OperationId, SessionId};
use qj_core::ports::SecureJoinCorePort;
use qj_core::progress::{FailureCause, OperationKind, ProgressPayload, UNKNOWN_ERROR};
use qj_core::securejoin::{
    HandshakeAction, HandshakeError, HandshakeEvent, HandshakeOutcome, HandshakeSession,
    HandshakeState,
};
use tokio::sync::{mpsc, watch};
use tracing::{debug, info, info_span, warn, Instrument};

use super::observer::HandshakeObserver;
use crate::progress::{BridgeError, OperationHandle, ProgressBridge, ProgressSubscription};

enum Notification {
    State(HandshakeState),
    PeerVerified(ContactId),
}

/// Shared between the handle, the listener task and the watchdog.
struct SessionCell {
    session: Mutex<HandshakeSession>,
    operation: Mutex<Option<OperationHandle>>,
    notifications: mpsc::UnboundedSender<Notification>,
    state_tx: watch::Sender<HandshakeState>,
    bridge: ProgressBridge,
}

impl SessionCell {
    fn session(&self) -> MutexGuard<'_, HandshakeSession> {
        self.session.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn operation(&self) -> Option<OperationHandle> {
        self.operation
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    fn state(&self) -> HandshakeState {
        self.session().state.clone()
    }

    /// Applies `event` and executes the resulting actions.
    ///
    /// Notifications are queued while the session lock is held, so observers
    /// see transitions in the order they happened.
    fn apply(&self, event: HandshakeEvent) -> bool {
        let mut stop_core = false;
        let changed = {
            let mut session = self.session();
            let (changed, actions) = session.apply(event);
            if changed {
                self.state_tx.send_replace(session.state.clone());
                // the dispatcher may be gone after a terminal state; nothing to deliver then
                let _ = self
                    .notifications
                    .send(Notification::State(session.state.clone()));
            }
            for action in actions {
                debug!(session_id = %session.id, ?action, "secure-join executing action");
                match action {
                    HandshakeAction::AnnouncePeer { peer } => {
                        // dropped when the dispatcher already ended
                        let _ = self.notifications.send(Notification::PeerVerified(peer));
                    }
                    HandshakeAction::StopCoreProcess => stop_core = true,
                }
            }
            changed
        };

        if stop_core {
            if let Some(operation) = self.operation() {
                self.bridge.cancel(&operation);
            }
        }
        changed
    }
}

/// Caller's reference to one handshake.
#[derive(Clone)]
pub struct HandshakeHandle {
    session_id: SessionId,
    operation_id: OperationId,
    state_rx: watch::Receiver<HandshakeState>,
    cell: Arc<SessionCell>,
}

impl HandshakeHandle {
    pub fn session_id(&self) -> &SessionId {
        &self.session_id
    }

    pub fn operation_id(&self) -> &OperationId {
        &self.operation_id
    }

    pub fn state(&self) -> HandshakeState {
        self.state_rx.borrow().clone()
    }

    /// Snapshot of the whole session, including the last progress stage.
    pub fn session(&self) -> HandshakeSession {
        self.cell.session().clone()
    }

    /// Waits for the terminal state.
    pub async fn wait(&self) -> HandshakeOutcome {
        let mut rx = self.state_rx.clone();
        loop {
            if let Some(outcome) = rx.borrow_and_update().outcome() {
                return outcome;
            }
            if rx.changed().await.is_err() {
                // sender lives in the cell we hold; only reachable on shutdown
                return self.cell.state().outcome().unwrap_or(Err(HandshakeError::Cancelled));
            }
        }
    }
}

/// Runs joiner-side secure-join handshakes, one at a time.
pub struct SecureJoinEngine {
    bridge: ProgressBridge,
    core: Arc<dyn SecureJoinCorePort>,
    watchdog: Option<Duration>,
    current: Mutex<Option<Arc<SessionCell>>>,
}

impl SecureJoinEngine {
    pub fn new(bridge: ProgressBridge, core: Arc<dyn SecureJoinCorePort>) -> Self {
        Self {
            bridge,
            core,
            watchdog: None,
            current: Mutex::new(None),
        }
    }

    /// Fails sessions that are still running after `timeout`.
    pub fn with_watchdog(mut self, timeout: Option<Duration>) -> Self {
        self.watchdog = timeout;
        self
    }

    /// Starts the handshake for an already classified invitation.
    ///
    /// Returns immediately; the core call runs on the blocking pool and
    /// `observer` receives every state change. Rejected with
    /// [`HandshakeError::AlreadyInProgress`] while another handshake of this
    /// engine is running, leaving that one untouched.
    pub fn begin_handshake(
        &self,
        code: &str,
        observer: Arc<dyn HandshakeObserver>,
    ) -> Result<HandshakeHandle, HandshakeError> {
        let mut current = self
            .current
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        if current.as_ref().is_some_and(|cell| !cell.state().is_terminal()) {
            warn!("rejecting secure-join, another handshake is running");
            return Err(HandshakeError::AlreadyInProgress);
        }

        // Subscribe before starting so no early progress is missed.
        let subscription = self.bridge.subscribe(OperationKind::SecureJoin);
        let core = self.core.clone();
        let join_code = code.to_string();
        let operation = self
            .bridge
            .run(OperationKind::SecureJoin, move || {
                core.join_securejoin(&join_code).map(Some)
            })
            .map_err(|err| match err {
                BridgeError::AlreadyRunning(_) => HandshakeError::AlreadyInProgress,
            })?;

        let session = HandshakeSession::new(SessionId::new(), code, Utc::now());
        let session_id = session.id.clone();
        let (notify_tx, notify_rx) = mpsc::unbounded_channel();
        let (state_tx, state_rx) = watch::channel(session.state.clone());
        let cell = Arc::new(SessionCell {
            session: Mutex::new(session),
            operation: Mutex::new(Some(operation.clone())),
            notifications: notify_tx,
            state_tx,
            bridge: self.bridge.clone(),
        });

        let span = info_span!(
            "usecase.secure_join.handshake",
            session_id = %session_id,
            operation_id = %operation.id()
        );
        let runtime = self.bridge.runtime();
        runtime.spawn(
            dispatch_notifications(session_id.clone(), notify_rx, observer)
                .instrument(span.clone()),
        );

        cell.apply(HandshakeEvent::Start);
        info!(parent: &span, "secure-join started");

        runtime.spawn(
            listen(cell.clone(), operation.id().clone(), subscription).instrument(span.clone()),
        );
        if let Some(timeout) = self.watchdog {
            runtime.spawn(watchdog(Arc::downgrade(&cell), timeout).instrument(span));
        }

        *current = Some(cell.clone());
        Ok(HandshakeHandle {
            session_id,
            operation_id: operation.id().clone(),
            state_rx,
            cell,
        })
    }

    /// Cancels `handle`'s handshake.
    ///
    /// Idempotent; a no-op once the handshake reached a terminal state.
    pub fn cancel(&self, handle: &HandshakeHandle) -> bool {
        let cancelled = handle.cell.apply(HandshakeEvent::Cancel);
        if cancelled {
            info!(session_id = %handle.session_id, "secure-join cancelled");
        }
        cancelled
    }

    pub fn is_busy(&self) -> bool {
        self.current
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .as_ref()
            .is_some_and(|cell| !cell.state().is_terminal())
    }
}

/// Translates bridge events into handshake events until the session ends.
///
/// Also ends on cancellation or timeout, dropping the bridge subscription.
async fn listen(
    cell: Arc<SessionCell>,
    operation_id: OperationId,
    mut subscription: ProgressSubscription,
) {
    let mut state_rx = cell.state_tx.subscribe();
    loop {
        if state_rx.borrow_and_update().is_terminal() {
            break;
        }
        tokio::select! {
            event = subscription.recv() => {
                let Some(event) = event else { break };
                if event.operation_id != operation_id {
                    continue;
                }
                cell.apply(handshake_event(event.payload));
            }
            changed = state_rx.changed() => {
                if changed.is_err() {
                    break;
                }
            }
        }
    }
    debug!("secure-join listener finished");
}

fn handshake_event(payload: ProgressPayload) -> HandshakeEvent {
    match payload {
        ProgressPayload::StageUpdate { permille, peer } => HandshakeEvent::Progress { permille, peer },
        ProgressPayload::Success {
            chat_id: Some(chat_id),
        } => HandshakeEvent::Succeeded { chat_id },
        ProgressPayload::Success { chat_id: None } => HandshakeEvent::Failed {
            message: UNKNOWN_ERROR.to_string(),
            cause: FailureCause::Peer,
        },
        ProgressPayload::Failure { message, cause } => HandshakeEvent::Failed { message, cause },
    }
}

async fn dispatch_notifications(
    session_id: SessionId,
    mut notifications: mpsc::UnboundedReceiver<Notification>,
    observer: Arc<dyn HandshakeObserver>,
) {
    while let Some(notification) = notifications.recv().await {
        match notification {
            Notification::State(state) => {
                observer.on_state_changed(&session_id, &state);
                if state.is_terminal() {
                    break;
                }
            }
            Notification::PeerVerified(peer) => observer.on_peer_verified(&session_id, peer),
        }
    }
}

async fn watchdog(cell: std::sync::Weak<SessionCell>, timeout: Duration) {
    tokio::time::sleep(timeout).await;
    let Some(cell) = cell.upgrade() else {
        return;
    };
    if cell.apply(HandshakeEvent::TimedOut) {
        warn!(timeout_secs = timeout.as_secs(), "secure-join timed out locally");
    }
}
