//! Request body extractor accepting JSON or an HTML form post.

use axum::{
    extract::{FromRequest, Request},
    http::header::CONTENT_TYPE,
    Form, Json,
};
use serde::de::DeserializeOwned;

use super::error::ApiError;

// ---

/// Body decoded from `application/x-www-form-urlencoded` when the request
/// says so, and from JSON otherwise. Rejections become 400 envelopes.
#[derive(Debug)]
pub struct Payload<T>(pub T);

fn is_form(req: &Request) -> bool {
    req.headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|ct| ct.starts_with("application/x-www-form-urlencoded"))
}

impl<S, T> FromRequest<S> for Payload<T>
where
    T: DeserializeOwned + Send,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        // ---
        if is_form(&req) {
            let Form(value) = Form::<T>::from_request(req, state).await?;
            Ok(Payload(value))
        } else {
            let Json(value) = Json::<T>::from_request(req, state).await?;
            Ok(Payload(value))
        }
    }
}
