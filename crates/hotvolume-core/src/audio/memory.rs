//! In-memory audio backend.
//!
//! Models processes with audio sessions entirely in memory so the registry,
//! volume operations and anything built on them can run without an audio
//! stack. Handles returned by [`MemoryBackend::add_session`] stay connected
//! to the session and can inspect or mutate it from the outside.

use crate::{
    AudioError, CoreResult,
    audio::{AudioBackend, Endpoint, EndpointControl, ProcessInfo},
};

use std::{
    panic::Location,
    sync::{
        Arc, Mutex,
        atomic::{AtomicBool, AtomicUsize, Ordering},
    },
};

use error_location::ErrorLocation;

/// One simulated audio session.
#[derive(Debug)]
pub struct MemorySession {
    name: String,
    pid: u32,
    volume: Mutex<f32>,
    muted: AtomicBool,
    failing: AtomicBool,
    expired: AtomicBool,
    writes: AtomicUsize,
}

impl MemorySession {
    /// Executable name of the owning process.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Process id.
    pub fn pid(&self) -> u32 {
        self.pid
    }

    /// Current volume, bypassing any failure injection.
    pub fn volume(&self) -> f32 {
        *self.volume.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Current mute flag, bypassing any failure injection.
    pub fn is_muted(&self) -> bool {
        self.muted.load(Ordering::SeqCst)
    }

    /// Change the volume as another program would.
    pub fn set_external_volume(&self, level: f32) {
        *self.volume.lock().unwrap_or_else(|e| e.into_inner()) = level;
    }

    /// Change the mute flag as another program would.
    pub fn set_external_mute(&self, muted: bool) {
        self.muted.store(muted, Ordering::SeqCst);
    }

    /// Make every control call on this session fail.
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Number of successful writes through endpoint controls.
    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    #[track_caller]
    fn check_usable(&self) -> CoreResult<()> {
        let reason = if self.expired.load(Ordering::SeqCst) {
            "session expired"
        } else if self.failing.load(Ordering::SeqCst) {
            "injected failure"
        } else {
            return Ok(());
        };

        Err(AudioError::EndpointControl {
            process: self.name.clone(),
            pid: self.pid,
            reason: reason.to_string(),
            location: ErrorLocation::from(Location::caller()),
        })
    }
}

#[derive(Debug, Default)]
struct MemoryState {
    sessions: Vec<Arc<MemorySession>>,
    fail_enumeration: bool,
    enumerations: usize,
}

/// Backend whose sessions live in memory. Clones share the same sessions.
#[derive(Debug, Clone, Default)]
pub struct MemoryBackend {
    state: Arc<Mutex<MemoryState>>,
}

impl MemoryBackend {
    /// Create a backend with no sessions.
    pub fn new() -> Self {
        Self::default()
    }

    /// Open a session for a process and return a handle to it.
    pub fn add_session(&self, name: &str, pid: u32, volume: f32, muted: bool) -> Arc<MemorySession> {
        let session = Arc::new(MemorySession {
            name: name.to_string(),
            pid,
            volume: Mutex::new(volume),
            muted: AtomicBool::new(muted),
            failing: AtomicBool::new(false),
            expired: AtomicBool::new(false),
            writes: AtomicUsize::new(0),
        });

        self.lock().sessions.push(Arc::clone(&session));
        session
    }

    /// Close every session of a process. Endpoints already handed out expire.
    pub fn remove_process(&self, pid: u32) {
        self.lock().sessions.retain(|session| {
            if session.pid == pid {
                session.expired.store(true, Ordering::SeqCst);
                false
            } else {
                true
            }
        });
    }

    /// Make the next enumerations fail.
    pub fn set_enumeration_failure(&self, fail: bool) {
        self.lock().fail_enumeration = fail;
    }

    /// Number of enumerations performed so far.
    pub fn enumeration_count(&self) -> usize {
        self.lock().enumerations
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, MemoryState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl AudioBackend for MemoryBackend {
    fn name(&self) -> &'static str {
        "memory"
    }

    #[track_caller]
    fn enumerate(&self) -> CoreResult<Vec<Endpoint>> {
        let mut state = self.lock();
        state.enumerations += 1;

        if state.fail_enumeration {
            return Err(AudioError::EnumerationFailed {
                reason: "injected enumeration failure".to_string(),
                location: ErrorLocation::from(Location::caller()),
            });
        }

        Ok(state
            .sessions
            .iter()
            .map(|session| {
                Endpoint::new(
                    ProcessInfo {
                        name: session.name.clone(),
                        pid: session.pid,
                    },
                    MemoryControl(Arc::clone(session)),
                )
            })
            .collect())
    }
}

struct MemoryControl(Arc<MemorySession>);

impl EndpointControl for MemoryControl {
    fn volume(&self) -> CoreResult<f32> {
        self.0.check_usable()?;
        Ok(self.0.volume())
    }

    fn set_volume(&self, level: f32) -> CoreResult<()> {
        self.0.check_usable()?;
        self.0.set_external_volume(level);
        self.0.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn is_muted(&self) -> CoreResult<bool> {
        self.0.check_usable()?;
        Ok(self.0.is_muted())
    }

    fn set_mute(&self, muted: bool) -> CoreResult<()> {
        self.0.check_usable()?;
        self.0.set_external_mute(muted);
        self.0.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
