// The school-planning service: handlers.rs exposes the HTTP operations,
// report.rs produces the narrative analysis behind the ReportGenerator seam,
// prompts.rs holds the consultant prompt constants.

pub mod handlers;
pub mod prompts;
pub mod report;
