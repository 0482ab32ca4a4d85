use crate::mapping::{MappingStore, Shortcut};

use std::sync::Arc;

use hotvolume_core::{ActionOutcome, AppIdentity, AudioError, SessionRegistry, VolumeAction, volume};
use tracing::{debug, error, info, instrument, warn};
use uuid::Uuid;

/// What happened to one triggered action.
#[derive(Debug)]
pub enum DispatchOutcome {
    /// No mapping is bound to the shortcut.
    Unmapped,
    /// The action reached every endpoint.
    Applied(ActionOutcome),
    /// The action reached some endpoints, others failed.
    Partial(ActionOutcome),
    /// The application has no audio session right now.
    AppNotFound(AppIdentity),
    /// The action failed outright.
    Failed(AudioError),
}

/// Routes shortcuts and manual controls to volume operations.
#[derive(Clone)]
pub struct Dispatcher {
    registry: Arc<SessionRegistry>,
    store: Arc<MappingStore>,
}

impl Dispatcher {
    /// Create a dispatcher over a shared registry and store.
    pub fn new(registry: Arc<SessionRegistry>, store: Arc<MappingStore>) -> Self {
        Self { registry, store }
    }

    /// Registry the actions run against.
    pub fn registry(&self) -> &Arc<SessionRegistry> {
        &self.registry
    }

    /// Store consulted for mappings.
    pub fn store(&self) -> &Arc<MappingStore> {
        &self.store
    }

    /// Look up the mapping for `shortcut` and run its action.
    ///
    /// Blocks on audio enumeration; call from a blocking context.
    #[instrument(skip(self, shortcut), fields(shortcut = %shortcut))]
    pub fn dispatch(&self, shortcut: &Shortcut) -> DispatchOutcome {
        let dispatch_id = Uuid::new_v4();

        let Some(mapping) = self.store.get(shortcut) else {
            debug!(dispatch_id = %dispatch_id, "No mapping bound, ignoring");
            return DispatchOutcome::Unmapped;
        };

        self.run(dispatch_id, &mapping.app, mapping.action, mapping.step)
    }

    /// Run an action outside of any mapping, e.g. from a tray menu.
    #[instrument(skip(self, identity), fields(identity = %identity))]
    pub fn apply(&self, identity: &AppIdentity, action: VolumeAction, step: f64) -> DispatchOutcome {
        self.run(Uuid::new_v4(), identity, action, step)
    }

    fn run(&self, dispatch_id: Uuid, identity: &AppIdentity, action: VolumeAction, step: f64) -> DispatchOutcome {
        // Endpoints from an earlier snapshot may point at closed streams.
        self.registry.refresh();

        match volume::apply(&self.registry, identity, action, step as f32) {
            Ok(outcome) if outcome.fan_out().is_complete() => {
                info!(
                    dispatch_id = %dispatch_id,
                    app = %identity,
                    action = %action,
                    outcome = ?outcome,
                    "Action applied"
                );
                DispatchOutcome::Applied(outcome)
            }
            Ok(outcome) => {
                warn!(
                    dispatch_id = %dispatch_id,
                    app = %identity,
                    action = %action,
                    applied = outcome.fan_out().applied(),
                    outcome = ?outcome,
                    "Action applied to some sessions only"
                );
                DispatchOutcome::Partial(outcome)
            }
            Err(e) if e.is_not_found() => {
                warn!(
                    dispatch_id = %dispatch_id,
                    app = %identity,
                    action = %action,
                    "Application is not playing audio"
                );
                DispatchOutcome::AppNotFound(identity.clone())
            }
            Err(e) => {
                error!(
                    dispatch_id = %dispatch_id,
                    app = %identity,
                    action = %action,
                    error = ?e,
                    "Action failed"
                );
                DispatchOutcome::Failed(e)
            }
        }
    }
}
