pub mod classifier;
pub mod distribution;
pub mod handlers;
pub mod prompts;
pub mod tree;
pub mod validator;
