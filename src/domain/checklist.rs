//! Admin checklist structure and the flag/resolve protocol.
//!
//! The taxonomy of categories and items is fixed configuration data; the
//! per-application state tracks which items are checked, flagged, or
//! resolved. Flag state is kept in sync with the application's
//! rejection-details missing-documents list by the checklist service.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

/// One category of the fixed checklist taxonomy.
#[derive(Debug, Clone, Copy)]
pub struct ChecklistCategory {
    pub key: &'static str,
    pub title: &'static str,
    pub items: &'static [&'static str],
}

/// The checklist of requirements reviewed by the MEO and BFP desks.
pub const TAXONOMY: &[ChecklistCategory] = &[
    ChecklistCategory {
        key: "unified_application_forms",
        title: "1. Unified Application Forms",
        items: &[
            "4 notarized copies of the Unified Application Form",
            "Locational Clearance",
            "Fire Safety Evaluation Clearance",
        ],
    },
    ChecklistCategory {
        key: "additional_locational_clearance",
        title: "2. Additional Locational Clearance Requirements",
        items: &[
            "CAAP Height Clearance (Tall Structures)",
            "Subdivision / HOA / Property Manager Clearance",
            "Initial Environmental Examination (IEE)",
            "Water Management Plan",
            "Historic Site / Facility Statement",
            "Drainage Impact Statement",
            "Socio-Economic Impact Statement",
            "Traffic Impact Assessment",
            "Line and Grade Clearance",
            "Waterways Clearance",
            "Flood Protection Evaluation",
            "Soil Test Report",
        ],
    },
    ChecklistCategory {
        key: "ownership_land_documents",
        title: "3. Ownership / Land Documents",
        items: &[
            "Original Certificate of Title / TCT (1 original + 3 photocopies)",
            "Contract of Lease (if applicable)",
            "Deed of Absolute Sale (if applicable)",
        ],
    },
    ChecklistCategory {
        key: "special_documents",
        title: "4. Special Documents",
        items: &["Special Power of Attorney (SPA) or Secretary's Certificate"],
    },
    ChecklistCategory {
        key: "building_survey_plans",
        title: "5. Building & Survey Plans (Signed & Sealed)",
        items: &[
            "Architectural Documents",
            "Civil / Structural Documents",
            "Electrical Documents",
            "Mechanical Documents",
            "Sanitary Documents",
            "Plumbing Documents",
            "Electronics Documents",
            "Geodetic Documents",
            "Fire Protection Plan",
        ],
    },
    ChecklistCategory {
        key: "professional_documents",
        title: "6. Professional Documents",
        items: &["PRC License (all involved professionals)", "PTR Receipts"],
    },
    ChecklistCategory {
        key: "construction_details",
        title: "7. Construction Details",
        items: &[
            "Estimated Total Construction Cost Sheet",
            "Construction Safety & Health Program (CSHP)",
            "Construction Logbook",
        ],
    },
    ChecklistCategory {
        key: "others",
        title: "8. Others",
        items: &["Affidavit of Undertaking"],
    },
];

pub fn category(key: &str) -> Option<&'static ChecklistCategory> {
    TAXONOMY.iter().find(|cat| cat.key == key)
}

/// Per-application state of one checklist item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChecklistItem {
    pub item: String,
    pub checked: bool,
    pub flagged: bool,
    pub resolved_by: Option<String>,
    pub resolved_at: Option<OffsetDateTime>,
}

impl ChecklistItem {
    fn fresh(label: &str) -> Self {
        Self {
            item: label.to_string(),
            checked: false,
            flagged: false,
            resolved_by: None,
            resolved_at: None,
        }
    }
}

/// Category key → ordered item states. Categories follow taxonomy order;
/// items keep their taxonomy position.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AdminChecklist(pub BTreeMap<String, Vec<ChecklistItem>>);

/// Addresses one item within the taxonomy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemKey {
    pub category: String,
    pub item: String,
}

impl AdminChecklist {
    /// A checklist seeded with every taxonomy item in its initial state.
    pub fn seeded() -> Self {
        let mut map = BTreeMap::new();
        for cat in TAXONOMY {
            map.insert(
                cat.key.to_string(),
                cat.items.iter().map(|label| ChecklistItem::fresh(label)).collect(),
            );
        }
        Self(map)
    }

    /// Fill in any taxonomy items missing from stored state, preserving
    /// existing entries. Stored checklists written before a taxonomy
    /// addition stay usable.
    pub fn ensure_seeded(&mut self) {
        for cat in TAXONOMY {
            let items = self.0.entry(cat.key.to_string()).or_default();
            for label in cat.items {
                if !items.iter().any(|existing| existing.item == *label) {
                    items.push(ChecklistItem::fresh(label));
                }
            }
        }
    }

    pub fn item_mut(&mut self, key: &ItemKey) -> Option<&mut ChecklistItem> {
        self.0
            .get_mut(&key.category)
            .and_then(|items| items.iter_mut().find(|entry| entry.item == key.item))
    }

    pub fn flagged_labels(&self) -> Vec<String> {
        self.0
            .values()
            .flatten()
            .filter(|item| item.flagged)
            .map(|item| item.item.clone())
            .collect()
    }

    /// Flag each selected item not already flagged. Returns the labels
    /// that newly flagged; already-flagged selections are skipped.
    pub fn flag(&mut self, keys: &[ItemKey]) -> Vec<String> {
        let mut newly_flagged = Vec::new();
        for key in keys {
            if let Some(item) = self.item_mut(key)
                && !item.flagged
            {
                item.flagged = true;
                item.resolved_by = None;
                item.resolved_at = None;
                newly_flagged.push(item.item.clone());
            }
        }
        newly_flagged
    }

    /// Resolve each selected flagged item, stamping who resolved it and
    /// when. Returns the labels that were actually resolved.
    pub fn resolve(&mut self, keys: &[ItemKey], resolver: &str, at: OffsetDateTime) -> Vec<String> {
        let mut resolved = Vec::new();
        for key in keys {
            if let Some(item) = self.item_mut(key)
                && item.flagged
            {
                item.flagged = false;
                item.resolved_by = Some(resolver.to_string());
                item.resolved_at = Some(at);
                resolved.push(item.item.clone());
            }
        }
        resolved
    }
}

/// Add newly flagged labels to a missing-documents list, skipping
/// duplicates.
pub fn add_missing(mut missing: Vec<String>, flagged: &[String]) -> Vec<String> {
    for label in flagged {
        if !missing.contains(label) {
            missing.push(label.clone());
        }
    }
    missing
}

/// Remove resolved labels from a missing-documents list.
pub fn remove_missing(missing: Vec<String>, resolved: &[String]) -> Vec<String> {
    missing
        .into_iter()
        .filter(|label| !resolved.contains(label))
        .collect()
}
