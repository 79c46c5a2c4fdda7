pub mod history;
pub mod plan;
pub mod profile;

pub use history::{HistoryEntry, Template};
pub use plan::{AgeBand, Engine, Goal, PlanResponse, TrainingRequestParams};
pub use profile::{Profile, ProfileUpdate};
