//! KYC Core Library
//!
//! This crate provides the domain models, step flow state machine, validation,
//! media capture rules, configuration and error types shared by the KYC client
//! crates. It performs no network I/O.

pub mod config;
pub mod error;
pub mod flow;
pub mod media;
pub mod models;
pub mod validation;

// Re-export commonly used types
pub use config::{KycConfig, UploadServiceKind};
pub use error::{ErrorMetadata, KycError, KycResult, LogLevel};
pub use flow::{StepFlow, StepView};
pub use media::{CaptureConstraints, CaptureSession, ClipInfo, RecordingLimits};
