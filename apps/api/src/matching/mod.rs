// The similarity-matching core: per-field normalizers, the keyword-table
// classifier, the weighted scorer, and the ranking/categorization engine.
// Everything here is pure and deterministic; store.rs holds the read-only
// corpus queries.

pub mod classifier;
pub mod gpa;
pub mod language;
pub mod ranking;
pub mod scorer;
pub mod store;
