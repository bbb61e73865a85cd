use axum::http::StatusCode;
use serde::Deserialize;
use validator::Validate;

use crate::{app::models::api_error::ApiError, files::models::stored_file::FILES_SORTABLE_FIELDS};

#[derive(Debug, Deserialize, Validate)]
pub struct GetFilesFilterDto {
    #[validate(length(
        min = 1,
        max = 255,
        message = "filename must be between 1 and 255 characters."
    ))]
    pub filename: Option<String>,
    pub mime_type: Option<String>,
    pub sort: Option<String>,
    pub cursor: Option<String>,
    #[validate(range(max = 100, message = "limit must be equal or less than 100."))]
    pub limit: Option<u8>,
}

/// Filter compiled from the query string, applied by the registry.
#[derive(Debug)]
pub struct FilesQuery {
    pub filename: Option<String>,
    pub mime_type: Option<String>,
    pub sort_field: String,
    pub descending: bool,
    pub cursor: Option<i64>,
    pub limit: usize,
}

impl GetFilesFilterDto {
    pub fn to_query(&self) -> Result<FilesQuery, ApiError> {
        let mut sort_field = "created_at".to_string();
        let mut descending = true;
        let mut page_limit: usize = 50;

        // SORT
        if let Some(sort) = &self.sort {
            let sort_params: Vec<&str> = sort.split(",").collect();

            if sort_params.len() != 2 {
                return Err(ApiError {
                    code: StatusCode::BAD_REQUEST,
                    message: "Malformed sort query.".to_string(),
                });
            }
            if !FILES_SORTABLE_FIELDS.contains(&sort_params[0]) {
                return Err(ApiError {
                    code: StatusCode::BAD_REQUEST,
                    message: "Invalid sort field.".to_string(),
                });
            }

            sort_field = sort_params[0].to_string();

            descending = match sort_params[1].to_uppercase().as_str() {
                "ASC" => false,
                "DESC" => true,
                _ => {
                    return Err(ApiError {
                        code: StatusCode::BAD_REQUEST,
                        message: "Malformed sort query.".to_string(),
                    })
                }
            };
        }

        // CURSOR
        let cursor = match &self.cursor {
            Some(cursor) => match cursor.parse::<i64>() {
                Ok(value) => Some(value),
                Err(_) => {
                    return Err(ApiError {
                        code: StatusCode::BAD_REQUEST,
                        message: "Malformed cursor.".to_string(),
                    })
                }
            },
            None => None,
        };

        // LIMIT
        if let Some(limit) = self.limit {
            page_limit = limit as usize;
        }

        Ok(FilesQuery {
            filename: self.filename.clone(),
            mime_type: self.mime_type.clone(),
            sort_field,
            descending,
            cursor,
            limit: page_limit,
        })
    }
}
