//! Upload strategy trait

use async_trait::async_trait;
use kyc_core::models::{UploadRequest, UploadResponse};
use kyc_core::UploadServiceKind;

/// One way of delivering a document to storage.
///
/// Strategies report backend rejections (non-2xx) as a failed [`UploadResponse`]
/// and everything else that goes wrong as `Err`. The router folds both into the
/// same failure shape.
#[async_trait]
pub trait UploadStrategy: Send + Sync {
    /// Which service this strategy talks to
    fn kind(&self) -> UploadServiceKind;

    /// URL the upload is posted to
    fn endpoint(&self) -> &str;

    async fn upload(&self, request: &UploadRequest) -> anyhow::Result<UploadResponse>;
}
