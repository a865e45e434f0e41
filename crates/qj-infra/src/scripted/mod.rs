//! Scripted stand-in for the messaging core.
//!
//! Replays a recorded joiner transcript (progress stages, inviter id, final
//! chat or error) with the same blocking and stop semantics as the real
//! core, and reports through the registered [`CoreEventHandler`].
//!
//! 回放预先录制的握手过程，用于命令行演示和测试。

use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard, RwLock};
use std::thread;
use std::time::Duration;

use anyhow::{anyhow, Result};
use qj_core::config::TranscriptConfig;
use qj_core::ids::{ChatId, ContactId};
use qj_core::ports::{
    AccountCorePort, CoreError, CoreEvent, CoreEventHandler, ImexMode, OngoingProcessPort,
    SecureJoinCorePort,
};
use tracing::{debug, info};

/// Inviter id used when the transcript names none.
const DEFAULT_PEER_ID: u32 = 10;
const DEFAULT_STAGES: [u16; 3] = [100, 400, 1000];
const ACCOUNT_STAGES: [u16; 5] = [100, 300, 600, 900, 1000];
/// Granularity at which a sleeping step notices a stop request.
const STOP_POLL: Duration = Duration::from_millis(5);

/// What one join call replays.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transcript {
    pub stages: Vec<u16>,
    pub peer: ContactId,
    pub chat: Option<ChatId>,
    pub error: Option<String>,
    pub transport_error: bool,
    pub step_delay: Duration,
}

impl Transcript {
    /// Successful run ending in `chat`.
    pub fn success(peer: ContactId, chat: ChatId) -> Self {
        Self {
            stages: DEFAULT_STAGES.to_vec(),
            peer,
            chat: Some(chat),
            error: None,
            transport_error: false,
            step_delay: Duration::ZERO,
        }
    }

    pub fn from_config(config: &TranscriptConfig) -> Result<Self> {
        let peer_raw = config.peer_id.unwrap_or(DEFAULT_PEER_ID);
        let peer = ContactId::new(peer_raw).ok_or_else(|| anyhow!("invalid peer_id {peer_raw}"))?;
        let chat = match config.chat_id {
            Some(raw) => Some(ChatId::new(raw).ok_or_else(|| anyhow!("invalid chat_id {raw}"))?),
            None => None,
        };
        let stages = if config.stages.is_empty() {
            DEFAULT_STAGES.to_vec()
        } else {
            config.stages.clone()
        };
        Ok(Self {
            stages,
            peer,
            chat,
            error: config.error.clone(),
            transport_error: config.transport_error,
            step_delay: Duration::from_millis(config.step_delay_ms),
        })
    }
}

/// Calls currently inside the core, keyed by call number; the flag is their
/// stop request.
#[derive(Default)]
struct Ongoing {
    next_call: u64,
    running: HashMap<u64, bool>,
}

pub struct ScriptedCore {
    transcript: Transcript,
    handler: RwLock<Option<Arc<dyn CoreEventHandler>>>,
    ongoing: Mutex<Ongoing>,
}

impl ScriptedCore {
    pub fn new(transcript: Transcript) -> Self {
        Self {
            transcript,
            handler: RwLock::new(None),
            ongoing: Mutex::new(Ongoing::default()),
        }
    }

    /// Registers the receiver of core events; replaces any previous one.
    pub fn set_event_handler(&self, handler: Arc<dyn CoreEventHandler>) {
        *self
            .handler
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = Some(handler);
    }

    fn emit(&self, event: CoreEvent) {
        let handler = self
            .handler
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone();
        match handler {
            Some(handler) => handler.on_core_event(event),
            None => debug!(?event, "core event without handler"),
        }
    }

    fn ongoing(&self) -> MutexGuard<'_, Ongoing> {
        self.ongoing
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn begin_call(&self) -> u64 {
        let mut ongoing = self.ongoing();
        let call = ongoing.next_call;
        ongoing.next_call += 1;
        ongoing.running.insert(call, false);
        call
    }

    fn end_call(&self, call: u64) {
        self.ongoing().running.remove(&call);
    }

    fn is_stopped(&self, call: u64) -> bool {
        self.ongoing().running.get(&call).copied().unwrap_or(true)
    }

    /// Sleeps one step; false if `call` was stopped meanwhile.
    fn step(&self, call: u64) -> bool {
        let mut remaining = self.transcript.step_delay;
        while !remaining.is_zero() {
            if self.is_stopped(call) {
                return false;
            }
            let nap = remaining.min(STOP_POLL);
            thread::sleep(nap);
            remaining -= nap;
        }
        !self.is_stopped(call)
    }

    fn failure(&self, message: String) -> CoreError {
        if self.transcript.transport_error {
            self.emit(CoreEvent::ErrorNetwork(message.clone()));
            CoreError::network(message)
        } else {
            self.emit(CoreEvent::Error(message.clone()));
            CoreError::protocol(message)
        }
    }

    /// Runs `stages` through `progress`, honouring stop requests made while
    /// this call is running.
    fn replay(
        &self,
        stages: &[u16],
        progress: impl Fn(u16) -> CoreEvent,
    ) -> Result<(), CoreError> {
        let call = self.begin_call();
        let result = (|| {
            for &permille in stages {
                if !self.step(call) {
                    info!("scripted core stopped");
                    return Err(CoreError::aborted());
                }
                if permille == 0 {
                    let message = self.transcript.error.clone().unwrap_or_default();
                    let err = self.failure(message);
                    self.emit(progress(0));
                    return Err(err);
                }
                self.emit(progress(permille));
            }
            Ok(())
        })();
        self.end_call(call);
        result
    }
}

impl OngoingProcessPort for ScriptedCore {
    fn stop_ongoing_process(&self) {
        let mut ongoing = self.ongoing();
        if ongoing.running.is_empty() {
            debug!("no ongoing process to stop");
            return;
        }
        info!(calls = ongoing.running.len(), "stop of ongoing process requested");
        // only calls running now; a later call starts unstopped
        ongoing.running.values_mut().for_each(|stopped| *stopped = true);
    }
}

impl SecureJoinCorePort for ScriptedCore {
    fn join_securejoin(&self, code: &str) -> Result<ChatId, CoreError> {
        debug!(code_len = code.len(), "scripted join started");
        let peer = self.transcript.peer;
        self.replay(&self.transcript.stages, |permille| CoreEvent::JoinerProgress {
            contact_id: peer,
            permille,
        })?;

        match self.transcript.chat {
            Some(chat) => Ok(chat),
            None => {
                let message = self.transcript.error.clone().unwrap_or_default();
                Err(self.failure(message))
            }
        }
    }
}

impl AccountCorePort for ScriptedCore {
    fn configure(&self) -> Result<(), CoreError> {
        self.replay(&ACCOUNT_STAGES, |permille| CoreEvent::ConfigureProgress { permille })
    }

    fn imex(&self, mode: ImexMode, path: &Path) -> Result<(), CoreError> {
        let usable = match mode {
            ImexMode::ImportBackup | ImexMode::ImportKeys => path.exists(),
            ImexMode::ExportBackup | ImexMode::ExportKeys => path.is_dir(),
        };
        if !usable {
            let err = self.failure(format!("cannot use {} for {:?}", path.display(), mode));
            self.emit(CoreEvent::ImexProgress { permille: 0 });
            return Err(err);
        }
        self.replay(&ACCOUNT_STAGES, |permille| CoreEvent::ImexProgress { permille })
    }
}
