use axum::extract::State;

use crate::AppState;

use super::models::api_error::ApiError;

pub async fn get_root(State(state): State<AppState>) -> Result<String, ApiError> {
    Ok("Welcome to the stash file service. Use /upload to upload files.".to_string())
}
