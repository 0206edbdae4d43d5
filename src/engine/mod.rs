// ============================================================================
// Engine Module
// Contains the core matching engine business logic
// ============================================================================

mod dispatcher;
mod errors;
mod instrument;
mod matching;
mod matching_engine;

pub mod builder;

pub use builder::{create_from_config, create_from_env, MatchingEngineBuilder};
pub use errors::{ConfigError, EngineError, InvariantViolation, StartupError, ValidationError};
pub use matching::{match_order, prices_cross};
pub use matching_engine::{CancelResult, MatchingEngine, SubmitResult};
