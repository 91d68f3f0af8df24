pub mod catalog;
pub mod engine;
pub mod handlers;
pub mod matcher;
pub mod prompts;
pub mod quiz;
pub mod scoring;
