// Offline corpus rebuild: extract.rs normalizes one raw record, pipeline.rs
// drives the batched source-to-target rebuild.

pub mod extract;
pub mod pipeline;
