//! Flight source module
//!
//! Defines the FlightSource trait and provides a registry for all suppliers.

mod loader;
mod registry;
mod traits;

pub mod fixture;

// Source implementations
pub mod airasia;
pub mod batik_air;
pub mod garuda;
pub mod http;
pub mod lion_air;

pub use loader::SourceLoader;
pub use registry::SourceRegistry;
pub use traits::*;
