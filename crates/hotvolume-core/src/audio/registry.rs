use crate::{
    AppIdentity, AudioError, CoreResult,
    audio::{AudioBackend, Endpoint, SessionSnapshot, create_backend},
};

use std::{
    panic::Location,
    sync::{
        Arc, RwLock,
        atomic::{AtomicU64, Ordering},
    },
};

use error_location::ErrorLocation;
use tracing::{debug, info, instrument, warn};

/// Result of a write that fans out to every endpoint of an identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FanOut {
    /// Every endpoint accepted the write.
    Complete {
        /// Number of endpoints updated.
        endpoints: usize,
    },
    /// Some endpoints accepted the write, others failed.
    Partial {
        /// Number of endpoints updated.
        applied: usize,
        /// Number of endpoints that rejected the write.
        failed: usize,
    },
}

impl FanOut {
    /// True when no endpoint failed.
    pub fn is_complete(&self) -> bool {
        matches!(self, FanOut::Complete { .. })
    }

    /// Number of endpoints that were updated.
    pub fn applied(&self) -> usize {
        match *self {
            FanOut::Complete { endpoints } => endpoints,
            FanOut::Partial { applied, .. } => applied,
        }
    }
}

/// Owns the latest audio session snapshot and routes volume operations to it.
///
/// Reads go to the snapshot taken by the most recent [`refresh`](Self::refresh).
/// The registry never refreshes on its own; callers that need fresh data
/// refresh first.
///
/// # Fan-out
///
/// Writes are best-effort: a failing endpoint is logged and skipped, the
/// remaining endpoints are still written, and the caller gets a
/// [`FanOut::Partial`] outcome. A write where every endpoint fails is an error.
pub struct SessionRegistry {
    backend: Box<dyn AudioBackend>,
    current: RwLock<Arc<SessionSnapshot>>,
    next_version: AtomicU64,
}

impl SessionRegistry {
    /// Create a registry over a backend. Starts with an empty snapshot.
    pub fn new(backend: Box<dyn AudioBackend>) -> Self {
        info!(backend = backend.name(), "Session registry created");
        Self {
            backend,
            current: RwLock::new(Arc::new(SessionSnapshot::empty(0))),
            next_version: AtomicU64::new(1),
        }
    }

    /// Create a registry over the host platform's backend.
    pub fn with_platform_backend() -> Self {
        Self::new(create_backend())
    }

    /// Re-enumerate all sessions and replace the snapshot wholesale.
    ///
    /// Enumeration failures are logged and produce an empty snapshot; they
    /// are never returned. A refresh that completes after a newer one does
    /// not overwrite it.
    #[instrument(skip(self))]
    pub fn refresh(&self) -> Arc<SessionSnapshot> {
        let version = self.next_version.fetch_add(1, Ordering::Relaxed);

        let snapshot = match self.backend.enumerate() {
            Ok(endpoints) => SessionSnapshot::from_endpoints(version, endpoints),
            Err(e) => {
                warn!(error = %e, "Audio session enumeration failed, continuing with no sessions");
                SessionSnapshot::empty(version)
            }
        };

        let snapshot = Arc::new(snapshot);
        let mut current = self.current.write().unwrap_or_else(|e| e.into_inner());

        if current.version() > snapshot.version() {
            debug!(
                stale_version = snapshot.version(),
                current_version = current.version(),
                "Discarding snapshot superseded by a newer refresh"
            );
            return Arc::clone(&current);
        }

        *current = Arc::clone(&snapshot);

        debug!(
            version = snapshot.version(),
            identities = snapshot.identities().len(),
            endpoints = snapshot.endpoint_count(),
            "Session snapshot replaced"
        );

        snapshot
    }

    /// The current snapshot.
    pub fn snapshot(&self) -> Arc<SessionSnapshot> {
        Arc::clone(&self.current.read().unwrap_or_else(|e| e.into_inner()))
    }

    /// Identities present in the current snapshot.
    ///
    /// May be stale; call [`refresh`](Self::refresh) first when freshness matters.
    pub fn list_identities(&self) -> Vec<AppIdentity> {
        self.snapshot().identities()
    }

    /// Volume of the identity's first endpoint.
    #[track_caller]
    pub fn get_volume(&self, identity: &AppIdentity) -> CoreResult<f32> {
        let snapshot = self.snapshot();
        representative(&snapshot, identity)?.volume()
    }

    /// Mute flag of the identity's first endpoint.
    #[track_caller]
    pub fn get_mute(&self, identity: &AppIdentity) -> CoreResult<bool> {
        let snapshot = self.snapshot();
        representative(&snapshot, identity)?.is_muted()
    }

    /// Set the volume of every endpoint of an identity. `level` is clamped.
    #[track_caller]
    #[instrument(skip(self, identity), fields(identity = %identity))]
    pub fn set_volume(&self, identity: &AppIdentity, level: f32) -> CoreResult<FanOut> {
        self.fan_out(identity, "set_volume", |endpoint| endpoint.set_volume(level))
    }

    /// Set the mute flag of every endpoint of an identity.
    #[track_caller]
    #[instrument(skip(self, identity), fields(identity = %identity))]
    pub fn set_mute(&self, identity: &AppIdentity, muted: bool) -> CoreResult<FanOut> {
        self.fan_out(identity, "set_mute", |endpoint| endpoint.set_mute(muted))
    }

    #[track_caller]
    fn fan_out<F>(&self, identity: &AppIdentity, operation: &str, write: F) -> CoreResult<FanOut>
    where
        F: Fn(&Endpoint) -> CoreResult<()>,
    {
        let snapshot = self.snapshot();
        let endpoints = snapshot.endpoints(identity);

        if endpoints.is_empty() {
            return Err(AudioError::SessionNotFound {
                identity: identity.clone(),
                location: ErrorLocation::from(Location::caller()),
            });
        }

        let mut applied = 0;
        let mut failed = 0;

        for endpoint in endpoints {
            match write(endpoint) {
                Ok(()) => applied += 1,
                Err(e) => {
                    failed += 1;
                    warn!(
                        operation,
                        pid = endpoint.process().pid,
                        error = %e,
                        "Endpoint write failed, continuing with remaining endpoints"
                    );
                }
            }
        }

        match (applied, failed) {
            (0, failed) => Err(AudioError::FanOutFailed {
                identity: identity.clone(),
                failed,
                location: ErrorLocation::from(Location::caller()),
            }),
            (endpoints, 0) => Ok(FanOut::Complete { endpoints }),
            (applied, failed) => Ok(FanOut::Partial { applied, failed }),
        }
    }
}

#[track_caller]
fn representative<'a>(
    snapshot: &'a SessionSnapshot,
    identity: &AppIdentity,
) -> CoreResult<&'a Endpoint> {
    snapshot
        .endpoints(identity)
        .first()
        .ok_or_else(|| AudioError::SessionNotFound {
            identity: identity.clone(),
            location: ErrorLocation::from(Location::caller()),
        })
}
