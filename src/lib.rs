pub mod cli;
pub mod config;
pub mod data;
pub mod generator;
pub mod llm;
pub mod logging;
pub mod types;
pub mod utils;

// Re-export commonly used types
pub use config::Config;
pub use generator::orchestrator::Orchestrator;
pub use generator::report::Report;
pub use generator::workflow::{AnalysisOutcome, execute, launch};
pub use llm::client::{MockGenerator, TextGenerator};
