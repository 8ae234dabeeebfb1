#![allow(dead_code)]

pub mod fake_page;
pub mod fake_semantic;
pub mod fixtures;
