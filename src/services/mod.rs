/// Award deliberations, disqualifications and winner assignment.
pub mod deliberation_service;
/// OpenAPI documentation generation.
pub mod documentation;
/// Robot-game match lifecycle and scoresheet flow.
pub mod field_service;
/// Health check service.
pub mod health_service;
/// Judging session lifecycle, Core Values forms and the lead-judge call.
pub mod judging_service;
/// One-shot wall-clock timer scheduling.
pub mod scheduler;
/// Server-Sent Events message generation.
pub mod sse_events;
/// Server-Sent Events broadcasting service.
pub mod sse_service;
/// Live team roster flags.
pub mod team_service;
