//! Access-gated listing of approved talent.
//!
//! The gate only controls whether the listing is handed out; it is not an
//! account system and keeps no session state of its own.

pub mod gate;
pub mod listing;

pub use gate::{
    hash_access_code, AccessVerifier, DirectoryGate, DirectorySession, GateError,
    RemoteAuthVerifier, SharedCodeVerifier,
};
pub use listing::{industries, DirectoryEntry, DirectoryFilter, ALL_INDUSTRIES};
