pub mod result;
pub mod tracker;

pub use result::TrackedResult;
pub use tracker::Tracker;
