pub mod error;
pub mod external;
pub mod http;
pub mod ping;
pub mod probe;
pub mod registry;
pub mod tcp;

pub use error::ProbeError;
pub use external::ExternalProbe;
pub use http::HttpProbe;
pub use ping::PingProbe;
pub use probe::{Probe, ProbeOutcome};
pub use registry::ProbeRegistry;
pub use tcp::TcpProbe;

/// Builds a [`ProbeRegistry`] with all four built-in probes registered.
pub fn default_registry() -> ProbeRegistry {
    use std::sync::Arc;
    let mut registry = ProbeRegistry::new();
    registry
        .register(Arc::new(PingProbe::new()))
        .register(Arc::new(TcpProbe::new()))
        .register(Arc::new(HttpProbe::new()))
        .register(Arc::new(ExternalProbe::new()));
    registry
}
