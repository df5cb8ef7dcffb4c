//! Document upload
//!
//! Two services accept KYC documents: the main API's multipart endpoint
//! ("existing") and the S3/Lambda JSON endpoint ("new"). [`UploadRouter`] picks one
//! from configuration and gives callers a single response shape.

pub mod encoding;
pub mod existing;
pub mod lambda;
pub mod router;
pub mod tracker;
pub mod traits;

pub use existing::ExistingUploadService;
pub use lambda::LambdaUploadService;
pub use router::{ServiceInfo, UploadRouter};
pub use tracker::{UploadSnapshot, UploadTracker};
pub use traits::UploadStrategy;
