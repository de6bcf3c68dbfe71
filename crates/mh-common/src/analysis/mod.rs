pub mod engine;
pub mod evaluation;
pub mod formatter;
pub mod generator;
pub mod parse;
pub mod prompt;
pub mod record;
pub mod response;

pub use engine::{AnalysisError, MatchAnalysisEngine};
pub use generator::{GeminiClient, GeminiConfig, GenerationError, TextGenerator};
pub use record::{AnalysisOutcome, AnalysisRecord, FallbackAnalysis, RecoveredAnalysis};
pub use response::{AlertCategory, MatchWireResponse, Severity, WireAlert, WireResume};
