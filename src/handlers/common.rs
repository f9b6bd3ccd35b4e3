use crate::errors::ServiceError;
use axum::{
    async_trait,
    extract::{FromRequest, Request},
    Json,
};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

/// JSON body extractor whose rejections use the standard error envelope
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonBody<T>(pub T);

#[async_trait]
impl<S, T> FromRequest<S> for JsonBody<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ServiceError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(Self(value)),
            Err(rejection) => Err(ServiceError::InvalidInput(rejection.body_text())),
        }
    }
}

/// Body of the delete/disable endpoints, `{ "_id": "…" }`
#[derive(Debug, Clone, Deserialize, Serialize, ToSchema)]
pub struct IdInput {
    #[serde(alias = "_id")]
    pub id: Uuid,
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;

    #[tokio::test]
    async fn malformed_json_becomes_invalid_input() {
        let request = Request::builder()
            .header("content-type", "application/json")
            .body(Body::from("{\"_id\": 12"))
            .unwrap();
        let result = JsonBody::<IdInput>::from_request(request, &()).await;
        assert!(matches!(result, Err(ServiceError::InvalidInput(_))));
    }

    #[tokio::test]
    async fn id_input_accepts_underscore_alias() {
        let id = Uuid::new_v4();
        let request = Request::builder()
            .header("content-type", "application/json")
            .body(Body::from(format!("{{\"_id\": \"{id}\"}}")))
            .unwrap();
        let JsonBody(input) = JsonBody::<IdInput>::from_request(request, &())
            .await
            .unwrap();
        assert_eq!(input.id, id);
    }
}
