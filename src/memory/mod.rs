pub mod event;
pub mod run_log;
