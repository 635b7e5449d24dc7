//! Guards for trip and club services. Call these right before the write with a
//! freshly computed count; the check is advisory and reserves nothing.

use uuid::Uuid;

use crate::{
    app_error::{AppError, AppResult, LimitedResource},
    use_cases::entitlements::EntitlementUseCases,
};

pub async fn ensure_can_create_trip(
    entitlements: &EntitlementUseCases,
    user_id: Uuid,
    current_trip_count: i32,
) -> AppResult<()> {
    ensure_within_limit(
        entitlements,
        user_id,
        LimitedResource::Trips,
        current_trip_count,
    )
    .await
}

pub async fn ensure_can_join_club(
    entitlements: &EntitlementUseCases,
    user_id: Uuid,
    current_club_count: i32,
) -> AppResult<()> {
    ensure_within_limit(
        entitlements,
        user_id,
        LimitedResource::Clubs,
        current_club_count,
    )
    .await
}

async fn ensure_within_limit(
    entitlements: &EntitlementUseCases,
    user_id: Uuid,
    resource: LimitedResource,
    current_count: i32,
) -> AppResult<()> {
    let check = entitlements
        .check_limit(user_id, resource, current_count)
        .await?;
    if check.allowed {
        return Ok(());
    }

    tracing::info!(
        user_id = %user_id,
        resource = resource.as_str(),
        current_count,
        max_allowed = check.max_allowed,
        "Plan limit reached"
    );
    Err(AppError::LimitExceeded {
        resource,
        max_allowed: check.max_allowed,
    })
}
