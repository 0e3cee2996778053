//! Service-discovery registry abstractions and implementations

mod traits;
mod memory_store;
mod consul_store;

pub use traits::{RegistryStore, RegistryError, RegistryResult};
pub use memory_store::{MemoryRegistryStore, RegistryOperation};
pub use consul_store::ConsulRegistryStore;
