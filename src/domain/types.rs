//! Shared domain enumerations aligned with persisted values.
//!
//! Status and role strings carry spaces and legacy casing on the wire
//! ("Pending MEO", "meoadmin"), so conversions are explicit rather than
//! derived.

use serde::{Deserialize, Serialize};

/// The two permit application variants. Both share the same lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ApplicationType {
    Building,
    Occupancy,
}

impl ApplicationType {
    pub fn as_str(self) -> &'static str {
        match self {
            ApplicationType::Building => "Building",
            ApplicationType::Occupancy => "Occupancy",
        }
    }

    /// Reference-number prefix ("BP-25-000042" / "OP-25-000042").
    pub fn reference_prefix(self) -> &'static str {
        match self {
            ApplicationType::Building => "BP",
            ApplicationType::Occupancy => "OP",
        }
    }
}

impl TryFrom<&str> for ApplicationType {
    type Error = ();

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "Building" => Ok(ApplicationType::Building),
            "Occupancy" => Ok(ApplicationType::Occupancy),
            _ => Err(()),
        }
    }
}

/// Application lifecycle status. The set is closed; anything else is
/// rejected before it can be persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ApplicationStatus {
    Submitted,
    PendingMeo,
    PendingBfp,
    PendingMayor,
    Approved,
    Rejected,
    PaymentPending,
    PaymentSubmitted,
    PermitIssued,
}

impl ApplicationStatus {
    pub const ALL: [ApplicationStatus; 9] = [
        ApplicationStatus::Submitted,
        ApplicationStatus::PendingMeo,
        ApplicationStatus::PendingBfp,
        ApplicationStatus::PendingMayor,
        ApplicationStatus::Approved,
        ApplicationStatus::Rejected,
        ApplicationStatus::PaymentPending,
        ApplicationStatus::PaymentSubmitted,
        ApplicationStatus::PermitIssued,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ApplicationStatus::Submitted => "Submitted",
            ApplicationStatus::PendingMeo => "Pending MEO",
            ApplicationStatus::PendingBfp => "Pending BFP",
            ApplicationStatus::PendingMayor => "Pending Mayor",
            ApplicationStatus::Approved => "Approved",
            ApplicationStatus::Rejected => "Rejected",
            ApplicationStatus::PaymentPending => "Payment Pending",
            ApplicationStatus::PaymentSubmitted => "Payment Submitted",
            ApplicationStatus::PermitIssued => "Permit Issued",
        }
    }

    /// Parse a wire status, normalizing the legacy `Pending` alias to
    /// `Pending MEO`. Unknown values are an error for the caller to map.
    pub fn normalize(value: &str) -> Option<ApplicationStatus> {
        match value {
            "Pending" => Some(ApplicationStatus::PendingMeo),
            other => Self::ALL.iter().copied().find(|s| s.as_str() == other),
        }
    }
}

impl Serialize for ApplicationStatus {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for ApplicationStatus {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        ApplicationStatus::normalize(&raw)
            .ok_or_else(|| serde::de::Error::custom(format!("unknown application status `{raw}`")))
    }
}

/// Resolved requester role, supplied by the upstream auth collaborator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RequesterRole {
    #[serde(rename = "meoadmin")]
    MeoAdmin,
    #[serde(rename = "bfpadmin")]
    BfpAdmin,
    #[serde(rename = "mayoradmin")]
    MayorAdmin,
    Applicant,
}

impl RequesterRole {
    pub fn as_str(self) -> &'static str {
        match self {
            RequesterRole::MeoAdmin => "meoadmin",
            RequesterRole::BfpAdmin => "bfpadmin",
            RequesterRole::MayorAdmin => "mayoradmin",
            RequesterRole::Applicant => "applicant",
        }
    }

    pub fn is_admin(self) -> bool {
        !matches!(self, RequesterRole::Applicant)
    }

    /// The reviewing office an admin role acts for, if any.
    pub fn office(self) -> Option<ReviewOffice> {
        match self {
            RequesterRole::MeoAdmin => Some(ReviewOffice::Meo),
            RequesterRole::BfpAdmin => Some(ReviewOffice::Bfp),
            RequesterRole::MayorAdmin => Some(ReviewOffice::Mayor),
            RequesterRole::Applicant => None,
        }
    }
}

impl TryFrom<&str> for RequesterRole {
    type Error = ();

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "meoadmin" => Ok(RequesterRole::MeoAdmin),
            "bfpadmin" => Ok(RequesterRole::BfpAdmin),
            "mayoradmin" => Ok(RequesterRole::MayorAdmin),
            "applicant" | "user" => Ok(RequesterRole::Applicant),
            _ => Err(()),
        }
    }
}

/// Reviewing office a document or transition gate belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ReviewOffice {
    #[serde(rename = "MEO")]
    Meo,
    #[serde(rename = "BFP")]
    Bfp,
    #[serde(rename = "MAYOR")]
    Mayor,
}

impl ReviewOffice {
    pub fn as_str(self) -> &'static str {
        match self {
            ReviewOffice::Meo => "MEO",
            ReviewOffice::Bfp => "BFP",
            ReviewOffice::Mayor => "MAYOR",
        }
    }
}

impl TryFrom<&str> for ReviewOffice {
    type Error = ();

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "MEO" => Ok(ReviewOffice::Meo),
            "BFP" => Ok(ReviewOffice::Bfp),
            "MAYOR" => Ok(ReviewOffice::Mayor),
            _ => Err(()),
        }
    }
}

/// Origin of an uploaded document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Uploader {
    User,
    System,
    Admin,
}

impl Uploader {
    pub fn as_str(self) -> &'static str {
        match self {
            Uploader::User => "user",
            Uploader::System => "system",
            Uploader::Admin => "admin",
        }
    }
}

impl TryFrom<&str> for Uploader {
    type Error = ();

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "user" => Ok(Uploader::User),
            "system" => Ok(Uploader::System),
            "admin" => Ok(Uploader::Admin),
            _ => Err(()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PaymentMethod {
    #[serde(rename = "Walk-In")]
    WalkIn,
    Online,
}

impl PaymentMethod {
    pub fn as_str(self) -> &'static str {
        match self {
            PaymentMethod::WalkIn => "Walk-In",
            PaymentMethod::Online => "Online",
        }
    }
}

impl TryFrom<&str> for PaymentMethod {
    type Error = ();

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "Walk-In" => Ok(PaymentMethod::WalkIn),
            "Online" => Ok(PaymentMethod::Online),
            _ => Err(()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PaymentStatus {
    Pending,
    Verified,
    Failed,
}

impl PaymentStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            PaymentStatus::Pending => "Pending",
            PaymentStatus::Verified => "Verified",
            PaymentStatus::Failed => "Failed",
        }
    }
}

impl TryFrom<&str> for PaymentStatus {
    type Error = ();

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "Pending" => Ok(PaymentStatus::Pending),
            "Verified" => Ok(PaymentStatus::Verified),
            "Failed" => Ok(PaymentStatus::Failed),
            _ => Err(()),
        }
    }
}
