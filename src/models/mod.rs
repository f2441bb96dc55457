//! Data models for the leadflow backend.
//!
//! Field names serialize in camelCase for the web client.

mod bulk;
mod customer;
mod intake;
mod lead;
mod member;
mod revision;
mod settings;
mod transition;

pub use bulk::*;
pub use customer::*;
pub use intake::*;
pub use lead::*;
pub use member::*;
pub use revision::*;
pub use settings::*;
pub use transition::*;
