mod applications;
mod checklist;
mod documents;
mod health;
mod payments;

pub use applications::{
    apply_transition, get_application, get_by_reference, list_applications, resubmit_revisions,
    submit_building, submit_occupancy,
};
pub use checklist::{flag_checklist_items, resolve_checklist_items};
pub use documents::{get_document, list_documents, replace_document, upload_document};
pub use health::health;
pub use payments::{get_payment, get_payment_proof, set_payment_status, submit_payment};
