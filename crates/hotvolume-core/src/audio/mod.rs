mod backend;
mod endpoint;
mod identity;
#[cfg(any(test, feature = "memory-backend"))]
pub mod memory;
mod platform;
mod registry;
mod snapshot;

pub use {
    backend::AudioBackend,
    endpoint::{Endpoint, EndpointControl, ProcessInfo},
    identity::AppIdentity,
    platform::create_backend,
    registry::{FanOut, SessionRegistry},
    snapshot::SessionSnapshot,
};
