pub mod answer_key;
pub mod browser;
pub mod cli;
pub mod error;
pub mod form;
pub mod matcher;
pub mod memory;
pub mod report;
pub mod resolver;
pub mod run;
pub mod verify;
