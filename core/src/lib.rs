// Herald Core Library
// Event-driven component runtime: named events, in-process bus, telemetry

pub mod component;
pub mod event;
pub mod telemetry;

// Export core types
pub use component::{Component, Herald};
pub use event::{Event, EventBus, EventBusStats, EventHandler};

// Error types
use thiserror::Error;

#[derive(Error, Debug)]
pub enum HeraldError {
    #[error("Component error: {0}")]
    ComponentError(String),

    #[error("Synthesis error: {0}")]
    SynthesisError(String),

    #[error("Engine not found: {0}")]
    EngineNotFound(String),

    #[error("Config error: {0}")]
    ConfigError(String),

    #[error("Telemetry error: {0}")]
    TelemetryError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
}
pub type Result<T> = std::result::Result<T, HeraldError>;
