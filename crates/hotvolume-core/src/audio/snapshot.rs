use crate::{AppIdentity, audio::Endpoint};

use std::collections::BTreeMap;

/// Immutable result of one enumeration, grouped by application identity.
///
/// Snapshots are never mutated after construction. A refresh builds a new
/// one and swaps it in, so a reader holding an `Arc<SessionSnapshot>` can
/// iterate without racing a concurrent refresh.
#[derive(Debug)]
pub struct SessionSnapshot {
    version: u64,
    groups: BTreeMap<AppIdentity, Vec<Endpoint>>,
}

impl SessionSnapshot {
    pub(crate) fn empty(version: u64) -> Self {
        Self {
            version,
            groups: BTreeMap::new(),
        }
    }

    pub(crate) fn from_endpoints(version: u64, endpoints: Vec<Endpoint>) -> Self {
        let mut groups: BTreeMap<AppIdentity, Vec<Endpoint>> = BTreeMap::new();
        for endpoint in endpoints {
            groups
                .entry(endpoint.identity().clone())
                .or_default()
                .push(endpoint);
        }

        Self {
            version,
            groups,
        }
    }

    /// Monotonic snapshot version; 0 is the initial empty snapshot.
    pub fn version(&self) -> u64 {
        self.version
    }

    /// Identities present in this snapshot, sorted.
    pub fn identities(&self) -> Vec<AppIdentity> {
        self.groups.keys().cloned().collect()
    }

    /// Endpoints of one identity; empty if the identity is absent.
    pub fn endpoints(&self, identity: &AppIdentity) -> &[Endpoint] {
        self.groups.get(identity).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Total number of endpoints across all identities.
    pub fn endpoint_count(&self) -> usize {
        self.groups.values().map(Vec::len).sum()
    }

    /// True when no application has a live endpoint.
    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }
}
