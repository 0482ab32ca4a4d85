use crate::{CoreResult, audio::Endpoint};

/// Source of per-process audio endpoints.
pub trait AudioBackend: Send + Sync {
    /// Short backend name for logs.
    fn name(&self) -> &'static str;

    /// List every live audio endpoint owned by a user process.
    ///
    /// Returns fresh control handles on each call; nothing from a previous
    /// enumeration is reused.
    fn enumerate(&self) -> CoreResult<Vec<Endpoint>>;
}
