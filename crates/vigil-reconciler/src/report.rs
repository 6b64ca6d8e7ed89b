use vigil_domain::{CheckId, HostId, Pair};

#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum Change {
    HostUpserted(HostId),
    HostDeleted(HostId),
    CheckUpserted(CheckId),
    CheckDeleted(CheckId),
    PairScheduled(Pair),
    PairOrphaned(Pair),
}

/// Summary of one reconcile pass, returned to the caller for logging and to
/// the `-validate`/API surfaces that want to report what changed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReconcileReport {
    pub changes: Vec<Change>,
}

impl ReconcileReport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, change: Change) {
        self.changes.push(change);
    }

    pub fn orphaned_pairs(&self) -> impl Iterator<Item = &Pair> {
        self.changes.iter().filter_map(|c| match c {
            Change::PairOrphaned(pair) => Some(pair),
            _ => None,
        })
    }
}
