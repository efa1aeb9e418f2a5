use crate::core::Instance;
use crate::storage::CredentialStore;
use tracing::{debug, info};

/// Give every inventory instance a credential entry.
///
/// Missing endpoints get an empty credential; existing entries, including
/// entries for endpoints that left the topology, are never touched. The store
/// is written once, and only if something was added. Returns the number of
/// entries added.
pub fn reconcile(instances: &[Instance], store: &mut CredentialStore) -> usize {
    let mut added = 0;
    for instance in instances {
        if store.insert_if_absent(instance.endpoint()) {
            debug!(endpoint = instance.endpoint(), "credential entry added");
            added += 1;
        }
    }

    if added > 0 {
        store.flush();
    }
    info!(added, total = store.len(), "credential store reconciled");
    added
}
