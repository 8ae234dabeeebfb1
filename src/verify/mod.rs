pub mod field_check;
pub mod verifier;
