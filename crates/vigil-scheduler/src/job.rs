use vigil_domain::Pair;

/// A unit of work handed from the dispatcher to the worker pool.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Job {
    pub pair: Pair,
}
