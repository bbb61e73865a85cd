use axum::http::StatusCode;

use crate::app::models::api_error::ApiError;

#[derive(Debug)]
pub enum FilesApiError {
    FileNotFound,
    ContentMismatch,
    UploadTimedOut,
}

impl FilesApiError {
    pub fn value(&self) -> ApiError {
        match *self {
            Self::FileNotFound => ApiError {
                code: StatusCode::NOT_FOUND,
                message: "File not found.".to_string(),
            },
            Self::ContentMismatch => ApiError {
                code: StatusCode::CONFLICT,
                message: "A different file already exists under this id.".to_string(),
            },
            Self::UploadTimedOut => ApiError {
                code: StatusCode::REQUEST_TIMEOUT,
                message: "Upload timed out.".to_string(),
            },
        }
    }
}
