pub mod health;
pub mod meeting;
pub mod task;

pub use health::{HealthOutcome, HealthPipeline};
pub use meeting::{MeetingContext, MeetingOutcome, MeetingPipeline};
pub use task::{compute_progress, TaskContext, TaskOutcome, TaskPipeline};
