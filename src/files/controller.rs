use axum::{
    extract::{Multipart, Path, Query, State},
    http::{header, StatusCode},
    Json,
};
use validator::Validate;

use crate::{app::models::api_error::ApiError, AppState};

use super::{dtos::get_files_filter_dto::GetFilesFilterDto, models::stored_file::StoredFile, service};

pub async fn upload_file(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<(StatusCode, Json<StoredFile>), ApiError> {
    match service::upload_file(multipart, &state.registry, &state.envy).await {
        Ok(file) => Ok((StatusCode::CREATED, Json(file))),
        Err(e) => Err(e),
    }
}

pub async fn get_files(
    State(state): State<AppState>,
    Query(dto): Query<GetFilesFilterDto>,
) -> Result<Json<Vec<StoredFile>>, ApiError> {
    match dto.validate() {
        Ok(_) => match service::get_files(&dto, &state.registry).await {
            Ok(files) => Ok(Json(files)),
            Err(e) => Err(e),
        },
        Err(e) => Err(ApiError {
            code: StatusCode::BAD_REQUEST,
            message: e.to_string(),
        }),
    }
}

pub async fn get_file_by_id(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<StoredFile>, ApiError> {
    match service::get_file_by_id(&id, &state.registry).await {
        Ok(file) => Ok(Json(file)),
        Err(e) => Err(e),
    }
}

pub async fn download_file_by_id(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<([(header::HeaderName, String); 1], bytes::Bytes), ApiError> {
    match service::download_file_by_id(&id, &state.registry, &state.envy).await {
        Ok((file, bytes)) => Ok(([(header::CONTENT_TYPE, file.mime_type)], bytes)),
        Err(e) => Err(e),
    }
}

pub async fn delete_file_by_id(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<(), ApiError> {
    return service::delete_file_by_id(&id, &state.registry, &state.envy).await;
}
