use anyhow::{Context, Result};
use sqlx::postgres::PgPoolOptions;
use sqlx::{Executor, PgPool};
use tracing::info;

/// Idempotent schema. Enum columns are TEXT holding snake_case names.
/// `applications` deliberately has no (candidate_id, job_id) unique index.
pub const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS candidate_profiles (
    id UUID PRIMARY KEY,
    user_id UUID NOT NULL UNIQUE,
    full_name TEXT,
    email TEXT,
    mobile TEXT,
    pincode TEXT,
    headline TEXT,
    location TEXT,
    expected_salary_min BIGINT,
    expected_salary_max BIGINT,
    experience_years INTEGER,
    education_level TEXT,
    summary TEXT,
    resume_url TEXT,
    resume_path TEXT,
    resume_text TEXT,
    skills TEXT[] NOT NULL DEFAULT '{}',
    preferred_job_type TEXT,
    onboarding_completed BOOLEAN NOT NULL DEFAULT FALSE,
    onboarding_step SMALLINT NOT NULL DEFAULT 1,
    work_status TEXT,
    profile_photo_url TEXT,
    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
);

CREATE INDEX IF NOT EXISTS idx_candidate_profiles_updated ON candidate_profiles(updated_at);

CREATE TABLE IF NOT EXISTS candidate_education (
    id UUID PRIMARY KEY,
    candidate_id UUID NOT NULL REFERENCES candidate_profiles(id) ON DELETE CASCADE,
    degree TEXT,
    institution TEXT,
    field_of_study TEXT,
    start_year INTEGER,
    end_year INTEGER,
    grade TEXT,
    is_highest BOOLEAN NOT NULL DEFAULT FALSE,
    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
);

CREATE TABLE IF NOT EXISTS candidate_employment (
    id UUID PRIMARY KEY,
    candidate_id UUID NOT NULL REFERENCES candidate_profiles(id) ON DELETE CASCADE,
    company_name TEXT NOT NULL,
    designation TEXT,
    start_date DATE,
    end_date DATE,
    is_current BOOLEAN NOT NULL DEFAULT FALSE,
    description TEXT,
    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
);

CREATE TABLE IF NOT EXISTS candidate_internships (
    id UUID PRIMARY KEY,
    candidate_id UUID NOT NULL REFERENCES candidate_profiles(id) ON DELETE CASCADE,
    company_name TEXT NOT NULL,
    role TEXT,
    start_date DATE,
    end_date DATE,
    description TEXT,
    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
);

CREATE TABLE IF NOT EXISTS candidate_projects (
    id UUID PRIMARY KEY,
    candidate_id UUID NOT NULL REFERENCES candidate_profiles(id) ON DELETE CASCADE,
    title TEXT NOT NULL,
    description TEXT,
    url TEXT,
    technologies TEXT[] NOT NULL DEFAULT '{}',
    start_date DATE,
    end_date DATE,
    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
);

CREATE TABLE IF NOT EXISTS candidate_languages (
    id UUID PRIMARY KEY,
    candidate_id UUID NOT NULL REFERENCES candidate_profiles(id) ON DELETE CASCADE,
    language TEXT NOT NULL,
    proficiency TEXT,
    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
);

CREATE TABLE IF NOT EXISTS candidate_accomplishments (
    id UUID PRIMARY KEY,
    candidate_id UUID NOT NULL REFERENCES candidate_profiles(id) ON DELETE CASCADE,
    kind TEXT NOT NULL,
    title TEXT NOT NULL,
    issuer TEXT,
    issued_on DATE,
    url TEXT,
    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
);

CREATE TABLE IF NOT EXISTS candidate_exams (
    id UUID PRIMARY KEY,
    candidate_id UUID NOT NULL REFERENCES candidate_profiles(id) ON DELETE CASCADE,
    exam_name TEXT NOT NULL,
    score TEXT,
    year INTEGER,
    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
);

CREATE TABLE IF NOT EXISTS recruiter_profiles (
    id UUID PRIMARY KEY,
    user_id UUID NOT NULL UNIQUE,
    company_name TEXT,
    has_premium_access BOOLEAN NOT NULL DEFAULT FALSE,
    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
);

CREATE TABLE IF NOT EXISTS jobs (
    id UUID PRIMARY KEY,
    recruiter_id UUID NOT NULL REFERENCES recruiter_profiles(id) ON DELETE CASCADE,
    title TEXT NOT NULL,
    company_name TEXT NOT NULL,
    location TEXT,
    employment_type TEXT NOT NULL,
    work_mode TEXT NOT NULL,
    salary_min BIGINT,
    salary_max BIGINT,
    experience_min INTEGER,
    experience_max INTEGER,
    education_required TEXT,
    skills_required TEXT[] NOT NULL DEFAULT '{}',
    description TEXT NOT NULL DEFAULT '',
    is_active BOOLEAN NOT NULL DEFAULT TRUE,
    num_positions INTEGER NOT NULL DEFAULT 1,
    application_deadline DATE,
    visibility TEXT NOT NULL DEFAULT 'public',
    role_category TEXT,
    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
);

CREATE INDEX IF NOT EXISTS idx_jobs_active_created ON jobs(is_active, created_at DESC);

CREATE TABLE IF NOT EXISTS applications (
    id UUID PRIMARY KEY,
    candidate_id UUID NOT NULL REFERENCES candidate_profiles(id) ON DELETE CASCADE,
    job_id UUID NOT NULL REFERENCES jobs(id) ON DELETE CASCADE,
    status TEXT NOT NULL DEFAULT 'applied',
    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
);

CREATE INDEX IF NOT EXISTS idx_applications_pair ON applications(candidate_id, job_id);

CREATE TABLE IF NOT EXISTS saved_jobs (
    candidate_id UUID NOT NULL REFERENCES candidate_profiles(id) ON DELETE CASCADE,
    job_id UUID NOT NULL REFERENCES jobs(id) ON DELETE CASCADE,
    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    PRIMARY KEY (candidate_id, job_id)
);
"#;

/// Creates and returns a PostgreSQL connection pool.
pub async fn create_pool(database_url: &str) -> Result<PgPool> {
    info!("Connecting to PostgreSQL...");

    let pool = PgPoolOptions::new()
        .max_connections(10)
        .connect(database_url)
        .await?;

    info!("PostgreSQL connection pool established");
    Ok(pool)
}

/// Applies [`SCHEMA`] as one simple-protocol batch.
pub async fn ensure_schema(pool: &PgPool) -> Result<()> {
    pool.execute(SCHEMA)
        .await
        .context("Failed to apply database schema")?;
    info!("Database schema is up to date");
    Ok(())
}
