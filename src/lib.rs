// src/lib.rs

pub mod config;
pub mod core;
pub mod generation;
pub mod history;
pub mod profile;
pub mod storage;
pub mod types;
pub mod utils;
pub mod web;

pub use config::AppConfig;
pub use generation::{GenerationError, GenerationEvent, GenerationOrchestrator};
pub use history::{HistoryFilter, HistorySort, HistoryStore};
pub use web::start_web_server;
