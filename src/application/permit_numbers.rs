//! Permit number assignment.

use std::sync::Arc;

use time::OffsetDateTime;

use crate::application::error::WorkflowError;
use crate::application::repos::ApplicationsRepo;
use crate::domain::permit_numbers::{format_permit_number, next_sequence, period_key_for};
use crate::domain::types::ApplicationType;

/// Allocates the next permit number in the issuance period.
///
/// The sequence is shared across both application types but stored only
/// inside issued permit numbers, so allocation queries the highest
/// sequence per type and merges client-side before incrementing. Two
/// issuances racing in the same period can read the same maximum; the
/// window is accepted and the loser surfaces as a duplicate on insert.
#[derive(Clone)]
pub struct PermitNumberGenerator {
    applications: Arc<dyn ApplicationsRepo>,
}

impl PermitNumberGenerator {
    pub fn new(applications: Arc<dyn ApplicationsRepo>) -> Self {
        Self { applications }
    }

    pub async fn generate(&self, issued_at: OffsetDateTime) -> Result<String, WorkflowError> {
        let period = period_key_for(issued_at);
        let building = self
            .applications
            .max_permit_sequence(ApplicationType::Building, &period)
            .await?;
        let occupancy = self
            .applications
            .max_permit_sequence(ApplicationType::Occupancy, &period)
            .await?;
        let highest = building.into_iter().chain(occupancy).max();
        Ok(format_permit_number(&period, next_sequence(highest)))
    }
}
