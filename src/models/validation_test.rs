//! Validation test model
//!
//! Per-rule test records for the validation stage. The table and model exist
//! for schema compatibility; no API endpoint exposes them yet.

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, FromRow)]
#[allow(dead_code)]
pub struct ValidationTest {
    pub id: Uuid,
    pub detection_rule_id: Option<Uuid>,
    pub test_name: String,
    pub test_description: Option<String>,
    pub test_script: Option<String>,
    pub expected_result: Option<String>,
    pub actual_result: Option<String>,
    pub test_passed: Option<bool>,
    pub executed_at: Option<DateTime<Utc>>,
}
