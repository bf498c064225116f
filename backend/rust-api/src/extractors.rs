use axum::{
    extract::{FromRequest, Request},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

/// JSON body extractor whose rejections use the same `{error, status}` body
/// as `ApiError`, so clients only ever parse one error shape.
pub struct AppJson<T>(pub T);

impl<T, S> FromRequest<S> for AppJson<T>
where
    T: serde::de::DeserializeOwned + 'static,
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(AppJson(value)),
            Err(rejection) => {
                let status = rejection.status();
                let message = format!("Invalid request body: {}", rejection.body_text());
                tracing::warn!("{}", message);
                let status = if status == StatusCode::UNSUPPORTED_MEDIA_TYPE {
                    status
                } else {
                    StatusCode::BAD_REQUEST
                };
                let body = json!({
                    "error": message,
                    "status": status.as_u16(),
                });
                Err((status, Json(body)).into_response())
            }
        }
    }
}
