pub mod agents;
pub mod context;
pub mod orchestrator;
pub mod outlet;
pub mod report;
pub mod results;
pub mod stage;
pub mod workflow;
