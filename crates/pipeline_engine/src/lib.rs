//! Pipeline engine: backend API client and effect execution.
mod client;
mod engine;
mod types;
pub mod wire;

pub use client::{ClientSettings, PipelineApi, ReqwestPipelineApi};
pub use engine::{EngineHandle, SEGMENTATION_PHASE_DELAY};
pub use types::{ApiError, EngineError, EngineEvent, FailureKind};
