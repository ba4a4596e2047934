pub mod builtin;
pub mod channel;
pub mod config;
pub mod error;
pub mod eval;
pub mod exec;
pub mod glob;
pub mod global;
pub mod history;
pub mod launch;
pub mod lexer;
pub mod pipeline;
pub mod reap;
pub mod search;
pub mod types;


pub use error::PipelineError;
pub use exec::{execute,run_pipeline,Execution,PipelineResult};
