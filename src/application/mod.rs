pub mod checklist;
pub mod documents;
pub mod error;
pub mod payments;
pub mod permit_numbers;
pub mod repos;
pub mod retry;
pub mod workflow;
