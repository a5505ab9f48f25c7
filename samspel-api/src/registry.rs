//! Federation registry: id to federate lookup.

use std::sync::Arc;

use parking_lot::RwLock;
use tracing::debug;

use crate::error::SchedulerError;
use crate::event::FederateId;
use crate::federate::Federate;

/// Lookup surface the scheduler uses to resolve event targets.
pub trait FederationRegistry: Send + Sync {
    /// All joined federates, in join order where the implementation can
    /// provide one. No ordering is guaranteed to callers.
    fn federates(&self) -> Vec<(FederateId, Arc<dyn Federate>)>;

    /// Resolve a single federate by id.
    fn federate(&self, id: &FederateId) -> Option<Arc<dyn Federate>>;
}

/// In-process registry backed by a map, for federations whose members all
/// live in the local process.
#[derive(Default)]
pub struct LocalFederation {
    federates: RwLock<Vec<(FederateId, Arc<dyn Federate>)>>,
}

impl LocalFederation {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a federate to the federation. Ids must be unique.
    pub fn join(
        &self,
        id: FederateId,
        federate: Arc<dyn Federate>,
    ) -> Result<(), SchedulerError> {
        let mut federates = self.federates.write();
        if federates.iter().any(|(joined, _)| *joined == id) {
            return Err(SchedulerError::AlreadyJoined(id));
        }
        debug!(federate = %id, "federate joined the federation");
        federates.push((id, federate));
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.federates.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.federates.read().is_empty()
    }
}

impl FederationRegistry for LocalFederation {
    fn federates(&self) -> Vec<(FederateId, Arc<dyn Federate>)> {
        self.federates.read().clone()
    }

    fn federate(&self, id: &FederateId) -> Option<Arc<dyn Federate>> {
        self.federates
            .read()
            .iter()
            .find(|(joined, _)| joined == id)
            .map(|(_, federate)| Arc::clone(federate))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FederateError;

    struct Inert;

    impl Federate for Inert {
        fn initialize(&self, _start_time: i64, _end_time: i64) -> Result<(), FederateError> {
            Ok(())
        }

        fn advance_time(&self, _time: i64) -> Result<(), FederateError> {
            Ok(())
        }

        fn finish_simulation(&self) -> Result<(), FederateError> {
            Ok(())
        }
    }

    #[test]
    fn join_and_lookup() {
        let federation = LocalFederation::new();
        federation.join("traffic".into(), Arc::new(Inert)).unwrap();
        assert!(federation.federate(&"traffic".into()).is_some());
        assert!(federation.federate(&"network".into()).is_none());
        assert_eq!(federation.len(), 1);
    }

    #[test]
    fn duplicate_join_is_rejected() {
        let federation = LocalFederation::new();
        federation.join("traffic".into(), Arc::new(Inert)).unwrap();
        let err = federation.join("traffic".into(), Arc::new(Inert));
        assert!(matches!(err, Err(SchedulerError::AlreadyJoined(_))));
    }
}
