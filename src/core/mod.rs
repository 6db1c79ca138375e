pub mod gate;
pub mod message;
pub mod model;
pub mod registry;

pub use gate::{GateGuard, RequestGate};
pub use model::Model;
pub use registry::{DriverRegistry, RegistryError};
