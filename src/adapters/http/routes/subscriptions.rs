use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::{HeaderMap, header::AUTHORIZATION},
    response::IntoResponse,
    routing::{get, post},
};
use axum_extra::extract::cookie::CookieJar;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    adapters::http::app_state::AppState,
    app_error::{AppError, AppResult, LimitedResource},
    application::jwt,
    domain::entities::payment_method::PaymentMethod,
    use_cases::{
        entitlements::{SubscribeInput, SubscriptionView},
        plan_catalog::PlanView,
    },
};

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SubscribePayload {
    plan_id: Uuid,
    #[serde(default)]
    payment_method: String,
    #[serde(default)]
    payment_token: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct CountQuery {
    current_count: i32,
}

#[derive(Serialize)]
struct SubscribeResponse {
    success: bool,
    message: &'static str,
    subscription: SubscriptionView,
}

#[derive(Serialize)]
struct MessageResponse {
    success: bool,
    message: &'static str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct FeatureAccessResponse {
    has_access: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    feature: Option<String>,
}

/// Body of the limit checks. Failed lookups report only the flag.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct LimitResponse {
    #[serde(rename = "canCreate", skip_serializing_if = "Option::is_none")]
    can_create: Option<bool>,
    #[serde(rename = "canJoin", skip_serializing_if = "Option::is_none")]
    can_join: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    current_count: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_allowed: Option<i32>,
}

impl LimitResponse {
    fn denied(resource: LimitedResource) -> Self {
        Self::new(resource, false, None, None)
    }

    fn new(
        resource: LimitedResource,
        allowed: bool,
        current_count: Option<i32>,
        max_allowed: Option<i32>,
    ) -> Self {
        let (can_create, can_join) = match resource {
            LimitedResource::Trips => (Some(allowed), None),
            LimitedResource::Clubs => (None, Some(allowed)),
        };
        Self {
            can_create,
            can_join,
            current_count,
            max_allowed,
        }
    }
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/plans", get(list_plans))
        .route("/plans/{plan_id}", get(get_plan))
        .route("/my-subscription", get(my_subscription))
        .route("/history", get(history))
        .route("/subscribe", post(subscribe))
        .route("/cancel", post(cancel))
        .route("/feature-access/{feature}", get(feature_access))
        .route("/can-create-trip", get(can_create_trip))
        .route("/can-join-club", get(can_join_club))
}

async fn list_plans(State(app_state): State<AppState>) -> AppResult<impl IntoResponse> {
    let plans = app_state.entitlement_use_cases.catalog().list_active().await?;
    let views: Vec<PlanView> = plans.iter().map(PlanView::from).collect();
    Ok(Json(views))
}

async fn get_plan(
    State(app_state): State<AppState>,
    Path(plan_id): Path<Uuid>,
) -> AppResult<impl IntoResponse> {
    let plan = app_state
        .entitlement_use_cases
        .catalog()
        .get_by_id(plan_id)
        .await?;
    Ok(Json(PlanView::from(&plan)))
}

async fn my_subscription(
    State(app_state): State<AppState>,
    headers: HeaderMap,
    cookies: CookieJar,
) -> AppResult<impl IntoResponse> {
    let user_id = current_user_id(&headers, &cookies, &app_state)?;
    let view = app_state
        .entitlement_use_cases
        .get_current_subscription(user_id)
        .await?;
    Ok(Json(view))
}

async fn history(
    State(app_state): State<AppState>,
    headers: HeaderMap,
    cookies: CookieJar,
) -> AppResult<impl IntoResponse> {
    let user_id = current_user_id(&headers, &cookies, &app_state)?;
    let views = app_state.entitlement_use_cases.history(user_id).await?;
    Ok(Json(views))
}

async fn subscribe(
    State(app_state): State<AppState>,
    headers: HeaderMap,
    cookies: CookieJar,
    Json(payload): Json<SubscribePayload>,
) -> AppResult<impl IntoResponse> {
    let user_id = current_user_id(&headers, &cookies, &app_state)?;

    let input = SubscribeInput {
        plan_id: payload.plan_id,
        payment_method: PaymentMethod::from_str_lossy(&payload.payment_method),
        payment_token: payload.payment_token,
    };
    let subscription = app_state
        .entitlement_use_cases
        .subscribe(user_id, &input)
        .await?;

    Ok(Json(SubscribeResponse {
        success: true,
        message: "Successfully subscribed to plan",
        subscription,
    }))
}

async fn cancel(
    State(app_state): State<AppState>,
    headers: HeaderMap,
    cookies: CookieJar,
) -> AppResult<impl IntoResponse> {
    let user_id = current_user_id(&headers, &cookies, &app_state)?;
    app_state
        .entitlement_use_cases
        .cancel_subscription(user_id)
        .await?;
    Ok(Json(MessageResponse {
        success: true,
        message: "Subscription cancelled successfully",
    }))
}

/// Lookup failures degrade to "no access" instead of an error status.
async fn feature_access(
    State(app_state): State<AppState>,
    headers: HeaderMap,
    cookies: CookieJar,
    Path(feature): Path<String>,
) -> AppResult<impl IntoResponse> {
    let user_id = current_user_id(&headers, &cookies, &app_state)?;
    let response = match app_state
        .entitlement_use_cases
        .has_feature_access(user_id, &feature)
        .await
    {
        Ok(has_access) => FeatureAccessResponse {
            has_access,
            feature: Some(feature),
        },
        Err(e) => {
            tracing::warn!(user_id = %user_id, feature = %feature, error = %e, "Feature check failed");
            FeatureAccessResponse {
                has_access: false,
                feature: None,
            }
        }
    };
    Ok(Json(response))
}

async fn can_create_trip(
    State(app_state): State<AppState>,
    headers: HeaderMap,
    cookies: CookieJar,
    Query(query): Query<CountQuery>,
) -> AppResult<impl IntoResponse> {
    let user_id = current_user_id(&headers, &cookies, &app_state)?;
    Ok(Json(
        limit_check(&app_state, user_id, LimitedResource::Trips, query.current_count).await,
    ))
}

async fn can_join_club(
    State(app_state): State<AppState>,
    headers: HeaderMap,
    cookies: CookieJar,
    Query(query): Query<CountQuery>,
) -> AppResult<impl IntoResponse> {
    let user_id = current_user_id(&headers, &cookies, &app_state)?;
    Ok(Json(
        limit_check(&app_state, user_id, LimitedResource::Clubs, query.current_count).await,
    ))
}

async fn limit_check(
    app_state: &AppState,
    user_id: Uuid,
    resource: LimitedResource,
    current_count: i32,
) -> LimitResponse {
    match app_state
        .entitlement_use_cases
        .check_limit(user_id, resource, current_count)
        .await
    {
        Ok(check) => LimitResponse::new(
            resource,
            check.allowed,
            Some(check.current_count),
            Some(check.max_allowed),
        ),
        Err(e) => {
            tracing::warn!(
                user_id = %user_id,
                resource = resource.as_str(),
                error = %e,
                "Limit check failed"
            );
            LimitResponse::denied(resource)
        }
    }
}

/// Caller identity from a Bearer token, falling back to the `access_token` cookie.
fn current_user_id(
    headers: &HeaderMap,
    cookies: &CookieJar,
    app_state: &AppState,
) -> AppResult<Uuid> {
    let bearer = headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::to_owned);
    let access_token = bearer
        .or_else(|| cookies.get("access_token").map(|c| c.value().to_owned()))
        .ok_or(AppError::InvalidCredentials)?;
    let claims = jwt::verify(&access_token, &app_state.config.jwt_secret)?;
    claims.user_id()
}
