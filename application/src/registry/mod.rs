//! Session registry
//!
//! Opens tool sessions together, merges their catalogs and routes tool
//! calls to the owning session.

pub mod error;
pub mod session_registry;

pub use error::{DispatchError, RegistryError, ResourceReadError};
pub use session_registry::{RegisteredResource, SessionRegistry};
