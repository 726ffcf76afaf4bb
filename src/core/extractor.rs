use axum::{
    body::Body,
    extract::{
        rejection::{JsonRejection, PathRejection, QueryRejection},
        FromRequest, FromRequestParts, Multipart, Path, Query, Request,
    },
    http::request::Parts,
    response::{IntoResponse, Response},
    Json,
};
use serde::de::DeserializeOwned;
use std::collections::HashMap;
use tracing::debug;

use crate::core::error::AppError;
use crate::modules::storage::UploadedImage;

/// Custom JSON extractor that provides consistent error responses
pub struct AppJson<T>(pub T);

impl<T, S> FromRequest<S> for AppJson<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = AppJsonRejection;

    async fn from_request(req: Request<Body>, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(value) => Ok(Self(value.0)),
            Err(rejection) => Err(AppJsonRejection(rejection)),
        }
    }
}

pub struct AppJsonRejection(JsonRejection);

impl IntoResponse for AppJsonRejection {
    fn into_response(self) -> Response {
        let message = match self.0 {
            JsonRejection::JsonDataError(err) => format!("Invalid JSON data: {}", err),
            JsonRejection::JsonSyntaxError(err) => format!("Invalid JSON syntax: {}", err),
            JsonRejection::MissingJsonContentType(err) => {
                format!("Missing JSON content type: {}", err)
            }
            _ => "Failed to parse JSON body".to_string(),
        };

        AppError::BadRequest(message).into_response()
    }
}

/// Path extractor whose rejections use the API envelope
pub struct AppPath<T>(pub T);

impl<T, S> FromRequestParts<S> for AppPath<T>
where
    T: DeserializeOwned + Send,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        match Path::<T>::from_request_parts(parts, state).await {
            Ok(Path(value)) => Ok(Self(value)),
            Err(PathRejection::FailedToDeserializePathParams(err)) => Err(AppError::BadRequest(
                format!("Invalid path parameter: {}", err.body_text()),
            )),
            Err(rejection) => Err(AppError::Internal(rejection.body_text())),
        }
    }
}

/// Query string extractor whose rejections use the API envelope
pub struct AppQuery<T>(pub T);

impl<T, S> FromRequestParts<S> for AppQuery<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        match Query::<T>::from_request_parts(parts, state).await {
            Ok(Query(value)) => Ok(Self(value)),
            Err(QueryRejection::FailedToDeserializeQueryString(err)) => Err(AppError::BadRequest(
                format!("Invalid query parameters: {}", err.body_text()),
            )),
            Err(rejection) => Err(AppError::BadRequest(rejection.body_text())),
        }
    }
}

/// Multipart form for catalogue writes: text fields plus an optional `image` file.
///
/// A file part with no bytes is treated as "no image supplied", which is what
/// browsers send when the file input is left empty.
#[derive(Debug, Default)]
pub struct CatalogueForm {
    fields: HashMap<String, Vec<String>>,
    pub image: Option<UploadedImage>,
}

impl CatalogueForm {
    pub const IMAGE_FIELD: &'static str = "image";

    /// First value of a text field, if the field was sent at all
    pub fn text(&self, name: &str) -> Option<&str> {
        self.fields
            .get(name)
            .and_then(|values| values.first())
            .map(String::as_str)
    }

    /// All values of a repeated text field
    pub fn values(&self, name: &str) -> &[String] {
        self.fields.get(name).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn contains(&self, name: &str) -> bool {
        self.fields.contains_key(name)
    }

    #[cfg(test)]
    pub fn with_text(mut self, name: &str, value: &str) -> Self {
        self.fields
            .entry(name.to_string())
            .or_default()
            .push(value.to_string());
        self
    }

    async fn read(mut multipart: Multipart) -> Result<Self, AppError> {
        let mut form = CatalogueForm::default();

        while let Some(field) = multipart.next_field().await.map_err(|e| {
            debug!("Failed to read multipart field: {}", e);
            AppError::BadRequest(format!("Failed to read multipart data: {}", e))
        })? {
            let field_name = field.name().unwrap_or("").to_string();

            if field_name == Self::IMAGE_FIELD && field.file_name().is_some() {
                let content_type = field
                    .content_type()
                    .map(|s| s.to_string())
                    .unwrap_or_else(|| "application/octet-stream".to_string());
                let file_name = field.file_name().unwrap_or("unnamed").to_string();

                let data = field.bytes().await.map_err(|e| {
                    debug!("Failed to read image bytes: {}", e);
                    AppError::BadRequest(format!("Failed to read image data: {}", e))
                })?;

                if data.is_empty() {
                    continue;
                }

                form.image = Some(UploadedImage::new(data.to_vec(), file_name, content_type)?);
                continue;
            }

            let text = field.text().await.map_err(|e| {
                AppError::BadRequest(format!("Failed to read field '{}': {}", field_name, e))
            })?;
            form.fields.entry(field_name).or_default().push(text);
        }

        Ok(form)
    }
}

impl<S> FromRequest<S> for CatalogueForm
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request<Body>, state: &S) -> Result<Self, Self::Rejection> {
        let multipart = Multipart::from_request(req, state)
            .await
            .map_err(|e| AppError::BadRequest(format!("Expected multipart form data: {}", e)))?;

        Self::read(multipart).await
    }
}
