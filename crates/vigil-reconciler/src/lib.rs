pub mod error;
pub mod maintenance;
pub mod reconcile;
pub mod report;

pub use error::ReconcileError;
pub use maintenance::Maintenance;
pub use reconcile::reconcile;
pub use report::{Change, ReconcileReport};
