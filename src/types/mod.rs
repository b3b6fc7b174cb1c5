pub mod creative;
pub mod insight;
pub mod lenient;
pub mod record;
pub mod summary;
pub mod task;

pub use creative::CreativeSuggestion;
pub use insight::{
    Hypothesis, Insights, Priority, Recommendation, Strength, ValidatedHypothesis, Validation,
    ValidationMetrics,
};
pub use record::{Dataset, Record};
pub use summary::DataSummary;
pub use task::{AgentTag, StageKind, Task};
