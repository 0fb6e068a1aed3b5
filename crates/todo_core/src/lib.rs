//! Core domain logic for the local TODO list.
//! This crate owns the storage contract and the view controller.

pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;
pub mod speech;

pub use config::{AppConfig, ConfigError, ResolvedConfig};
pub use logging::{default_log_level, init_logging, logging_status, LoggingError};
pub use model::todo::{is_submittable, TodoId, TodoItem};
pub use repo::todo_repo::{
    RepoError, RepoResult, SqliteTodoRepository, StoreLocation, TodoRepository, TodoStore,
};
pub use service::todo_controller::{
    ControllerPhase, LoadTicket, StorageNotice, StorageOperation, SubmitOutcome, TodoController,
    VoiceOutcome,
};
pub use speech::{
    detect_recognizer, CommandRecognizer, RecognitionConfig, SpeechError, SpeechRecognizer,
    SpeechSettings, Transcript,
};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
