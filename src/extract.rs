//! Extractors whose rejections render as the JSON error envelope.

use axum::extract::{FromRequest, FromRequestParts, Json, Path, Query, Request};
use axum_valid::Valid;
use serde::de::DeserializeOwned;
use validator::Validate;

use crate::error::ApiError;

/// `Path` with an [`ApiError`] rejection
#[derive(Debug, FromRequestParts)]
#[from_request(via(Path), rejection(ApiError))]
pub struct ApiPath<T>(pub T);

/// `Query` with an [`ApiError`] rejection
#[derive(Debug, FromRequestParts)]
#[from_request(via(Query), rejection(ApiError))]
pub struct ApiQuery<T>(pub T);

/// JSON body that passed its `validator` rules
#[derive(Debug)]
pub struct ValidJson<T>(pub T);

#[axum::async_trait]
impl<S, T> FromRequest<S> for ValidJson<T>
where
    S: Send + Sync,
    T: DeserializeOwned + Validate,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Valid(Json(value)) = Valid::<Json<T>>::from_request(req, state).await?;
        Ok(ValidJson(value))
    }
}
