//! Database module - PostgreSQL connection and migrations

use sqlx::{postgres::PgPoolOptions, PgPool};

/// Create database connection pool
pub async fn create_pool(database_url: &str) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .connect(database_url)
        .await
}

/// Run database migrations
pub async fn run_migrations(pool: &PgPool) -> Result<(), sqlx::Error> {
    // Create tables if not exist
    sqlx::raw_sql(SCHEMA_SQL)
        .execute(pool)
        .await?;

    tracing::info!("Database schema applied successfully");
    Ok(())
}

/// Database schema SQL
const SCHEMA_SQL: &str = r#"
-- Enum types (guarded: CREATE TYPE has no IF NOT EXISTS)
DO $$ BEGIN
    CREATE TYPE ads_stage AS ENUM (
        'goal',
        'categorisation',
        'strategy_abstract',
        'technical_context',
        'blind_spots',
        'false_positives',
        'validation',
        'priority',
        'response'
    );
EXCEPTION WHEN duplicate_object THEN NULL;
END $$;

DO $$ BEGIN
    CREATE TYPE priority_level AS ENUM ('low', 'medium', 'high', 'critical');
EXCEPTION WHEN duplicate_object THEN NULL;
END $$;

-- Users
CREATE TABLE IF NOT EXISTS users (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    username VARCHAR(50) NOT NULL UNIQUE,
    email VARCHAR(100) NOT NULL UNIQUE,
    password_hash VARCHAR(255) NOT NULL,
    is_active BOOLEAN NOT NULL DEFAULT true,
    is_admin BOOLEAN NOT NULL DEFAULT false,
    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
);

-- Detection rules (one row per ADS framework document)
CREATE TABLE IF NOT EXISTS detection_rules (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    name VARCHAR(255) NOT NULL,
    version VARCHAR(50) NOT NULL DEFAULT '1.0.0',
    current_stage ads_stage NOT NULL DEFAULT 'goal',
    is_completed BOOLEAN NOT NULL DEFAULT false,
    created_by UUID NOT NULL REFERENCES users(id),
    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),

    -- ADS framework fields
    goal TEXT,
    mitre_tactics JSONB,
    mitre_techniques JSONB,
    strategy_abstract TEXT,
    technical_context JSONB,
    blind_spots TEXT,
    false_positives TEXT,
    validation_steps JSONB,
    priority_level priority_level,
    response_procedures TEXT,

    -- Generated outputs
    sigma_rule TEXT,
    splunk_query TEXT,
    elastic_query TEXT
);

-- Validation tests (schema only, not yet exposed through the API)
CREATE TABLE IF NOT EXISTS validation_tests (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    detection_rule_id UUID REFERENCES detection_rules(id),
    test_name VARCHAR(255) NOT NULL,
    test_description TEXT,
    test_script TEXT,
    expected_result TEXT,
    actual_result TEXT,
    test_passed BOOLEAN,
    executed_at TIMESTAMPTZ
);

-- Indexes
CREATE INDEX IF NOT EXISTS idx_rules_owner ON detection_rules(created_by);
CREATE INDEX IF NOT EXISTS idx_validation_tests_rule ON validation_tests(detection_rule_id);
"#;
