pub mod alert;
pub mod effective;
pub mod engine;
pub mod error;
pub mod quiet_hours;
pub mod template;
pub mod throttle;
pub mod transport;

pub use alert::{AlertBook, Notification};
pub use effective::{resolve, QuietHours, ResolvedSettings};
pub use engine::NotificationEngine;
pub use error::NotifyError;
pub use throttle::Throttle;
pub use transport::{HttpPushTransport, PushMessage, PushTransport};
