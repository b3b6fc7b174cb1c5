pub mod creative_agent;
pub mod data_agent;
pub mod evaluator_agent;
pub mod insight_agent;
pub mod planner;

pub use creative_agent::CreativeAgent;
pub use data_agent::DataAgent;
pub use evaluator_agent::EvaluatorAgent;
pub use insight_agent::InsightAgent;
pub use planner::PlannerAgent;
