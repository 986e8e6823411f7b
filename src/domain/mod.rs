//! Domain layer types and invariants.

pub mod applications;
pub mod checklist;
pub mod documents;
pub mod error;
pub mod payments;
pub mod permit_numbers;
pub mod types;
pub mod workflow;
