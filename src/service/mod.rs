//! Service layer tying the pure engine to storage and events.

pub mod bulk;
pub mod leads;

pub use bulk::BulkCoordinator;
pub use leads::{AutoAssignOutcome, IntakeOutcome, LeadService};
