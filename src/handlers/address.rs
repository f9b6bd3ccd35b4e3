use crate::{
    auth::AuthUser,
    entities::address,
    handlers::common::{IdInput, JsonBody},
    services::addresses::{CreateAddressInput, UpdateAddressInput},
    ApiResponse, ApiResult, AppState,
};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
    routing::{delete, get, post, put},
    Extension, Router,
};
use uuid::Uuid;

/// Address routes; callers wrap them with authentication
pub fn address_routes() -> Router<AppState> {
    Router::new()
        .route("/create", post(create_address))
        .route("/get", get(list_addresses))
        .route("/get/:id", get(get_address))
        .route("/update", put(update_address))
        .route("/disable", delete(disable_address))
}

pub async fn create_address(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    JsonBody(input): JsonBody<CreateAddressInput>,
) -> Result<(StatusCode, Json<ApiResponse<address::Model>>), crate::errors::ServiceError> {
    let created = state.services.addresses.create(user.user_id, input).await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::with_message(created, "Address created")),
    ))
}

/// Active addresses only
pub async fn list_addresses(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> ApiResult<Vec<address::Model>> {
    let addresses = state.services.addresses.list_active(user.user_id).await?;
    Ok(Json(ApiResponse::success(addresses)))
}

/// Includes disabled addresses so past orders can still show them
pub async fn get_address(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<Uuid>,
) -> ApiResult<address::Model> {
    let address = state.services.addresses.get(user.user_id, id).await?;
    Ok(Json(ApiResponse::success(address)))
}

pub async fn update_address(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    JsonBody(input): JsonBody<UpdateAddressInput>,
) -> ApiResult<address::Model> {
    let updated = state.services.addresses.update(user.user_id, input).await?;
    Ok(Json(ApiResponse::with_message(updated, "Address updated")))
}

pub async fn disable_address(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    JsonBody(input): JsonBody<IdInput>,
) -> ApiResult<address::Model> {
    let disabled = state.services.addresses.disable(user.user_id, input.id).await?;
    Ok(Json(ApiResponse::with_message(disabled, "Address removed")))
}
