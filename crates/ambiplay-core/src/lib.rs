//! Shared types, configuration, and session logic for ambiplay.

pub mod access;
pub mod config;
pub mod control;
pub mod idle;
pub mod model;
pub mod normalize;
pub mod publisher;
pub mod selector;
pub mod session;
pub mod sync;
pub mod util;

pub use access::AccessGate;
pub use config::*;
pub use control::*;
pub use idle::*;
pub use model::*;
pub use normalize::normalize;
pub use publisher::SnapshotPublisher;
pub use selector::select;
pub use session::*;
pub use sync::Synchronizer;
