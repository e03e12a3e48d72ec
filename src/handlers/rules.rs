//! Detection rule handlers

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::middleware::auth::CurrentUser;
use crate::models::{CreateRule, DetectionRule, UpdateRule};
use crate::{AppError, AppResult, AppState};

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub skip: Option<i64>,
    pub limit: Option<i64>,
}

impl ListQuery {
    /// Effective (skip, limit): defaults 0/100, negatives clamped to 0 so
    /// they never reach OFFSET/LIMIT, which Postgres would reject.
    fn pagination(&self) -> (i64, i64) {
        (
            self.skip.unwrap_or(0).max(0),
            self.limit.unwrap_or(100).max(0),
        )
    }
}

/// Create a new detection rule owned by the caller
pub async fn create(
    State(state): State<AppState>,
    user: CurrentUser,
    Json(req): Json<CreateRule>,
) -> AppResult<Json<DetectionRule>> {
    let rule = DetectionRule::create(&state.pool, user.id, req).await?;

    tracing::info!("Detection rule created: {} ({})", rule.name, rule.id);

    Ok(Json(rule))
}

/// List the caller's detection rules, paginated
pub async fn list(
    State(state): State<AppState>,
    user: CurrentUser,
    Query(query): Query<ListQuery>,
) -> AppResult<Json<Vec<DetectionRule>>> {
    let (skip, limit) = query.pagination();

    let rules = DetectionRule::list_by_owner(&state.pool, user.id, skip, limit).await?;
    Ok(Json(rules))
}

/// Get a single detection rule
pub async fn get(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<DetectionRule>> {
    // The lookup is ownership-gated, so someone else's rule 404s the same as
    // a nonexistent one.
    let rule = DetectionRule::find_by_id_and_owner(&state.pool, id, user.id)
        .await?
        .ok_or_else(|| AppError::NotFound("Detection rule not found".to_string()))?;

    Ok(Json(rule))
}

/// Apply a sparse update to a detection rule
pub async fn update(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateRule>,
) -> AppResult<Json<DetectionRule>> {
    if state.config.strict_stage_transitions {
        if let Some(target) = req.current_stage {
            let current = DetectionRule::find_by_id_and_owner(&state.pool, id, user.id)
                .await?
                .ok_or_else(|| AppError::NotFound("Detection rule not found".to_string()))?
                .current_stage;

            if !current.can_transition_to(target) {
                tracing::warn!(
                    "Rejected stage transition {} -> {} on rule {}",
                    current.as_str(),
                    target.as_str(),
                    id
                );
                return Err(AppError::ValidationError(format!(
                    "Cannot move from stage '{}' to '{}'",
                    current.as_str(),
                    target.as_str()
                )));
            }
        }
    }

    let rule = DetectionRule::update(&state.pool, id, user.id, req)
        .await?
        .ok_or_else(|| AppError::NotFound("Detection rule not found".to_string()))?;

    Ok(Json(rule))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pagination_defaults() {
        let query = ListQuery { skip: None, limit: None };
        assert_eq!(query.pagination(), (0, 100));
    }

    #[test]
    fn test_pagination_passthrough() {
        let query = ListQuery { skip: Some(100), limit: Some(50) };
        assert_eq!(query.pagination(), (100, 50));
    }

    #[test]
    fn test_negative_pagination_clamped() {
        let query = ListQuery { skip: Some(-1), limit: Some(-10) };
        assert_eq!(query.pagination(), (0, 0));
    }
}
