//! Data models for the KYC client
//!
//! Each sub-module covers one area of the self-service flow: the wizard steps,
//! document uploads, server-side case progress, the review form, registration
//! and risk analysis.

mod progress;
mod registration;
mod review;
mod risk;
mod step;
mod upload;

pub use progress::*;
pub use registration::*;
pub use review::*;
pub use risk::*;
pub use step::*;
pub use upload::*;
