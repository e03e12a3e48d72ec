//! Detection rule model
//!
//! One row per ADS framework document. A rule walks through nine authoring
//! stages; by default any stage may be assigned at any time (the workflow is
//! advisory), with an opt-in strict mode that rejects skipping ahead.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use sqlx::types::Json;
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

/// Nine-stage ADS authoring workflow, in authoring order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(type_name = "ads_stage", rename_all = "snake_case")]
pub enum AdsStage {
    Goal,
    Categorisation,
    StrategyAbstract,
    TechnicalContext,
    BlindSpots,
    FalsePositives,
    Validation,
    Priority,
    Response,
}

impl AdsStage {
    pub const ORDER: [AdsStage; 9] = [
        AdsStage::Goal,
        AdsStage::Categorisation,
        AdsStage::StrategyAbstract,
        AdsStage::TechnicalContext,
        AdsStage::BlindSpots,
        AdsStage::FalsePositives,
        AdsStage::Validation,
        AdsStage::Priority,
        AdsStage::Response,
    ];

    /// Position in the authoring workflow (0 = goal)
    pub fn index(self) -> usize {
        Self::ORDER.iter().position(|s| *s == self).unwrap_or(0)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Goal => "goal",
            Self::Categorisation => "categorisation",
            Self::StrategyAbstract => "strategy_abstract",
            Self::TechnicalContext => "technical_context",
            Self::BlindSpots => "blind_spots",
            Self::FalsePositives => "false_positives",
            Self::Validation => "validation",
            Self::Priority => "priority",
            Self::Response => "response",
        }
    }

    /// Strict-mode transition check: staying put, advancing one stage, or
    /// returning to any earlier stage for rework is allowed; skipping ahead
    /// is not.
    pub fn can_transition_to(self, target: AdsStage) -> bool {
        target.index() <= self.index() + 1
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(type_name = "priority_level", rename_all = "snake_case")]
pub enum PriorityLevel {
    Low,
    Medium,
    High,
    Critical,
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct DetectionRule {
    pub id: Uuid,
    pub name: String,
    pub version: String,
    pub current_stage: AdsStage,
    pub is_completed: bool,
    pub created_by: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,

    // ADS framework fields
    pub goal: Option<String>,
    pub mitre_tactics: Option<Json<Vec<String>>>,
    pub mitre_techniques: Option<Json<Vec<String>>>,
    pub strategy_abstract: Option<String>,
    pub technical_context: Option<Json<serde_json::Value>>,
    pub blind_spots: Option<String>,
    pub false_positives: Option<String>,
    pub validation_steps: Option<Json<Vec<serde_json::Value>>>,
    pub priority_level: Option<PriorityLevel>,
    pub response_procedures: Option<String>,

    // Generated outputs (no generation path yet)
    pub sigma_rule: Option<String>,
    pub splunk_query: Option<String>,
    pub elastic_query: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CreateRule {
    pub name: String,
    pub goal: Option<String>,
}

/// Marks a field as present even when its value is `null`, so a sparse
/// update can tell "leave unchanged" (absent, outer `None`) apart from
/// "clear the field" (`Some(None)`).
fn present<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// Sparse update body: only the fields present in the request are applied.
/// A present `null` clears the field; `name` and `current_stage` are
/// non-nullable columns, so for those a `null` is ignored.
#[derive(Debug, Default, Deserialize)]
pub struct UpdateRule {
    pub name: Option<String>,
    pub current_stage: Option<AdsStage>,
    #[serde(default, deserialize_with = "present")]
    pub goal: Option<Option<String>>,
    #[serde(default, deserialize_with = "present")]
    pub mitre_tactics: Option<Option<Json<Vec<String>>>>,
    #[serde(default, deserialize_with = "present")]
    pub mitre_techniques: Option<Option<Json<Vec<String>>>>,
    #[serde(default, deserialize_with = "present")]
    pub strategy_abstract: Option<Option<String>>,
    #[serde(default, deserialize_with = "present")]
    pub technical_context: Option<Option<Json<serde_json::Value>>>,
    #[serde(default, deserialize_with = "present")]
    pub blind_spots: Option<Option<String>>,
    #[serde(default, deserialize_with = "present")]
    pub false_positives: Option<Option<String>>,
    #[serde(default, deserialize_with = "present")]
    pub validation_steps: Option<Option<Json<Vec<serde_json::Value>>>>,
    #[serde(default, deserialize_with = "present")]
    pub priority_level: Option<Option<PriorityLevel>>,
    #[serde(default, deserialize_with = "present")]
    pub response_procedures: Option<Option<String>>,
}

impl DetectionRule {
    pub async fn create(pool: &PgPool, owner: Uuid, data: CreateRule) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, Self>(
            r#"
            INSERT INTO detection_rules (name, goal, created_by)
            VALUES ($1, $2, $3)
            RETURNING *
            "#,
        )
        .bind(&data.name)
        .bind(&data.goal)
        .bind(owner)
        .fetch_one(pool)
        .await
    }

    pub async fn list_by_owner(
        pool: &PgPool,
        owner: Uuid,
        skip: i64,
        limit: i64,
    ) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Self>(
            r#"
            SELECT * FROM detection_rules
            WHERE created_by = $1
            ORDER BY created_at, id
            OFFSET $2 LIMIT $3
            "#,
        )
        .bind(owner)
        .bind(skip)
        .bind(limit)
        .fetch_all(pool)
        .await
    }

    /// Ownership-gated lookup: a rule owned by someone else is reported the
    /// same as a rule that does not exist.
    pub async fn find_by_id_and_owner(
        pool: &PgPool,
        id: Uuid,
        owner: Uuid,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Self>(
            "SELECT * FROM detection_rules WHERE id = $1 AND created_by = $2",
        )
        .bind(id)
        .bind(owner)
        .fetch_optional(pool)
        .await
    }

    /// Sparse update: absent fields stay untouched, present fields are
    /// written verbatim (a present `null` clears the column), `updated_at`
    /// always moves. Each nullable field binds a presence flag plus its
    /// value, since COALESCE alone cannot express "set to NULL".
    pub async fn update(
        pool: &PgPool,
        id: Uuid,
        owner: Uuid,
        data: UpdateRule,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Self>(
            r#"
            UPDATE detection_rules
            SET name = COALESCE($3, name),
                current_stage = COALESCE($4, current_stage),
                goal = CASE WHEN $5 THEN $6 ELSE goal END,
                mitre_tactics = CASE WHEN $7 THEN $8 ELSE mitre_tactics END,
                mitre_techniques = CASE WHEN $9 THEN $10 ELSE mitre_techniques END,
                strategy_abstract = CASE WHEN $11 THEN $12 ELSE strategy_abstract END,
                technical_context = CASE WHEN $13 THEN $14 ELSE technical_context END,
                blind_spots = CASE WHEN $15 THEN $16 ELSE blind_spots END,
                false_positives = CASE WHEN $17 THEN $18 ELSE false_positives END,
                validation_steps = CASE WHEN $19 THEN $20 ELSE validation_steps END,
                priority_level = CASE WHEN $21 THEN $22 ELSE priority_level END,
                response_procedures = CASE WHEN $23 THEN $24 ELSE response_procedures END,
                updated_at = NOW()
            WHERE id = $1 AND created_by = $2
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(owner)
        .bind(data.name)
        .bind(data.current_stage)
        .bind(data.goal.is_some())
        .bind(data.goal.flatten())
        .bind(data.mitre_tactics.is_some())
        .bind(data.mitre_tactics.flatten())
        .bind(data.mitre_techniques.is_some())
        .bind(data.mitre_techniques.flatten())
        .bind(data.strategy_abstract.is_some())
        .bind(data.strategy_abstract.flatten())
        .bind(data.technical_context.is_some())
        .bind(data.technical_context.flatten())
        .bind(data.blind_spots.is_some())
        .bind(data.blind_spots.flatten())
        .bind(data.false_positives.is_some())
        .bind(data.false_positives.flatten())
        .bind(data.validation_steps.is_some())
        .bind(data.validation_steps.flatten())
        .bind(data.priority_level.is_some())
        .bind(data.priority_level.flatten())
        .bind(data.response_procedures.is_some())
        .bind(data.response_procedures.flatten())
        .fetch_optional(pool)
        .await
    }
}
