use crate::{
    auth::{auth_cookie, AuthUser, ACCESS_TOKEN_COOKIE, REFRESH_TOKEN_COOKIE},
    errors::ServiceError,
    handlers::common::JsonBody,
    services::users::{LoginInput, LoginResponse, RegisterInput, UpdateRoleInput, UserView},
    ApiResponse, ApiResult, AppState,
};
use axum::{
    extract::State,
    http::{header::SET_COOKIE, StatusCode},
    response::{AppendHeaders, IntoResponse, Json},
    routing::{get, post, put},
    Extension, Router,
};

pub fn public_user_routes() -> Router<AppState> {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
}

pub fn authenticated_user_routes() -> Router<AppState> {
    Router::new().route("/user-details", get(user_details))
}

/// Mounted behind the ADMIN role
pub fn admin_user_routes() -> Router<AppState> {
    Router::new()
        .route("/update-role", put(update_role))
        .route("/delivery-users", get(delivery_users))
}

pub async fn register(
    State(state): State<AppState>,
    JsonBody(input): JsonBody<RegisterInput>,
) -> Result<(StatusCode, Json<ApiResponse<UserView>>), ServiceError> {
    let user = state.services.users.register(input).await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::with_message(user, "User registered successfully")),
    ))
}

/// Issues tokens in the body and as http-only cookies
pub async fn login(
    State(state): State<AppState>,
    JsonBody(input): JsonBody<LoginInput>,
) -> Result<impl IntoResponse, ServiceError> {
    let response: LoginResponse = state.services.users.login(input).await?;
    let secure = state.config.cookie_secure;
    let cookies = AppendHeaders([
        (
            SET_COOKIE,
            auth_cookie(
                ACCESS_TOKEN_COOKIE,
                &response.tokens.access_token,
                response.tokens.expires_in,
                secure,
            ),
        ),
        (
            SET_COOKIE,
            auth_cookie(
                REFRESH_TOKEN_COOKIE,
                &response.tokens.refresh_token,
                response.tokens.refresh_expires_in,
                secure,
            ),
        ),
    ]);
    Ok((
        cookies,
        Json(ApiResponse::with_message(response, "Login successfully")),
    ))
}

pub async fn user_details(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> ApiResult<UserView> {
    let details = state.services.users.user_details(user.user_id).await?;
    Ok(Json(ApiResponse::success(details)))
}

pub async fn update_role(
    State(state): State<AppState>,
    Extension(admin): Extension<AuthUser>,
    JsonBody(input): JsonBody<UpdateRoleInput>,
) -> ApiResult<UserView> {
    let user = state.services.users.update_role(admin.user_id, input).await?;
    Ok(Json(ApiResponse::with_message(user, "Role updated")))
}

pub async fn delivery_users(State(state): State<AppState>) -> ApiResult<Vec<UserView>> {
    let users = state.services.users.delivery_users().await?;
    Ok(Json(ApiResponse::success(users)))
}
