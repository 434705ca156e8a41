// Best-effort external mirroring
//
// The in-memory structures owned by the services are always authoritative.
// The mirror store only exists for recovery and observability, so every
// write goes through the fire-and-forget `Mirror` wrapper and failures are
// logged rather than surfaced.

pub use mirror::Mirror;
pub use store::{InMemoryMirrorStore, MirrorStore};

pub mod keys;
mod mirror;
mod store;
