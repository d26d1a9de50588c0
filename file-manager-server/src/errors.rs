use actix_multipart::MultipartError;
use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use blob_store::StoreError;
use thiserror::Error;
use validator::ValidationErrors;


/// Reasons an upload can be turned down. All of them surface to the client as
/// the same message; the detail is for the logs.
#[derive(Debug, Error)]
pub enum UploadErr {
    #[error("Malformed multipart payload")]
    Multipart(#[from] MultipartError),

    #[error("No file part found in the upload")]
    MissingFile,

    #[error("Upload is larger than {0} bytes")]
    TooLarge(usize),

    #[error("Failed to store the upload")]
    Store(#[source] StoreError),
}

#[derive(Debug, Error)]
pub enum FileManagerErr {
    #[error("Error in file upload.")]
    Upload(#[from] UploadErr),

    #[error("Error.")]
    InvalidQuery(#[from] ValidationErrors),

    #[error("Error.")]
    Content(#[source] StoreError),
}

impl ResponseError for FileManagerErr {
    fn status_code(&self) -> StatusCode {
        StatusCode::BAD_REQUEST
    }

    fn error_response(&self) -> HttpResponse {
        match self {
            FileManagerErr::Upload(reason) => tracing::info!("Rejected upload: {:?}", reason),
            FileManagerErr::InvalidQuery(e) => tracing::debug!("Rejected query: {}", e),
            FileManagerErr::Content(e) => tracing::debug!("Content operation failed: {}", e),
        }
        HttpResponse::BadRequest().body(self.to_string())
    }
}
