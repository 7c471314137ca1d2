pub mod orchestrator;

pub use orchestrator::{EventFailure, EventOutcome, EventStage, Pipeline, PipelineSummary};
