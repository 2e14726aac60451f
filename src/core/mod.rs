// src/core/mod.rs

pub mod completion_client;
pub mod fs_ops;

pub use completion_client::{
    CompletionClient, CompletionError, CompletionService, StageRequest,
};
pub use fs_ops::FsOps;
