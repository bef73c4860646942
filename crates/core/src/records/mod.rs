//! Per-kind convenience modules.
//!
//! Each module fixes the document type (and, for set kinds, the semantic set
//! id field name) of one clinical record kind and forwards to the generic
//! operations in [`crate::store`]. Callers that work with a known kind use
//! these instead of spelling type strings at every call site.

pub mod assessment_logs;
pub mod assessments;
pub mod clinical_history;
pub mod profile;
pub mod safety_plan;
pub mod sentinel;
pub mod sessions;
pub mod values_inventory;
