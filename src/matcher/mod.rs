pub mod deterministic;
pub mod llm;
pub mod question_matcher;
pub mod semantic;
