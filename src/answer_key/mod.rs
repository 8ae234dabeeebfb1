pub mod store;

pub use store::{AnswerEntry, AnswerKey};
