use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Postgres, QueryBuilder};
use tracing::debug;
use uuid::Uuid;

use crate::matching::filters::{CandidateFilter, JobFilter};
use crate::models::{
    Application, ApplicationStatus, CandidateProfile, ChildEntry, ChildKind, ChildRow, Job,
    RecruiterProfile, SavedJob,
};
use crate::store::{JobBoardStore, StoreError, StoreResult};

/// PostgreSQL-backed store over a shared connection pool.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

/// Rebuilds a typed child entry from a row rendered with `to_jsonb`.
fn decode_child(
    kind: ChildKind,
    (id, candidate_id, created_at, mut data): (Uuid, Uuid, DateTime<Utc>, serde_json::Value),
) -> StoreResult<ChildRow> {
    if let Some(object) = data.as_object_mut() {
        object.insert(
            "collection".to_string(),
            serde_json::Value::String(kind.as_str().to_string()),
        );
    }
    Ok(ChildRow {
        id,
        candidate_id,
        created_at,
        entry: serde_json::from_value(data)?,
    })
}

#[async_trait]
impl JobBoardStore for PgStore {
    async fn get_profile_by_user(&self, user_id: Uuid) -> StoreResult<Option<CandidateProfile>> {
        let row = sqlx::query_as("SELECT * FROM candidate_profiles WHERE user_id = $1")
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    async fn insert_profile(&self, p: &CandidateProfile) -> StoreResult<CandidateProfile> {
        let row = sqlx::query_as(
            r#"
            INSERT INTO candidate_profiles
                (id, user_id, full_name, email, mobile, pincode, headline, location,
                 expected_salary_min, expected_salary_max, experience_years, education_level,
                 summary, resume_url, resume_path, resume_text, skills, preferred_job_type,
                 onboarding_completed, onboarding_step, work_status, profile_photo_url,
                 created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16,
                    $17, $18, $19, $20, $21, $22, $23, $24)
            RETURNING *
            "#,
        )
        .bind(p.id)
        .bind(p.user_id)
        .bind(&p.full_name)
        .bind(&p.email)
        .bind(&p.mobile)
        .bind(&p.pincode)
        .bind(&p.headline)
        .bind(&p.location)
        .bind(p.expected_salary_min)
        .bind(p.expected_salary_max)
        .bind(p.experience_years)
        .bind(p.education_level)
        .bind(&p.summary)
        .bind(&p.resume_url)
        .bind(&p.resume_path)
        .bind(&p.resume_text)
        .bind(&p.skills)
        .bind(p.preferred_job_type)
        .bind(p.onboarding_completed)
        .bind(p.onboarding_step)
        .bind(p.work_status)
        .bind(&p.profile_photo_url)
        .bind(p.created_at)
        .bind(p.updated_at)
        .fetch_one(&self.pool)
        .await?;
        Ok(row)
    }

    async fn update_profile(&self, p: &CandidateProfile) -> StoreResult<CandidateProfile> {
        let row = sqlx::query_as(
            r#"
            UPDATE candidate_profiles SET
                full_name = $2, email = $3, mobile = $4, pincode = $5, headline = $6,
                location = $7, expected_salary_min = $8, expected_salary_max = $9,
                experience_years = $10, education_level = $11, summary = $12,
                resume_url = $13, resume_path = $14, resume_text = $15, skills = $16,
                preferred_job_type = $17, onboarding_completed = $18, onboarding_step = $19,
                work_status = $20, profile_photo_url = $21, updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(p.id)
        .bind(&p.full_name)
        .bind(&p.email)
        .bind(&p.mobile)
        .bind(&p.pincode)
        .bind(&p.headline)
        .bind(&p.location)
        .bind(p.expected_salary_min)
        .bind(p.expected_salary_max)
        .bind(p.experience_years)
        .bind(p.education_level)
        .bind(&p.summary)
        .bind(&p.resume_url)
        .bind(&p.resume_path)
        .bind(&p.resume_text)
        .bind(&p.skills)
        .bind(p.preferred_job_type)
        .bind(p.onboarding_completed)
        .bind(p.onboarding_step)
        .bind(p.work_status)
        .bind(&p.profile_photo_url)
        .fetch_optional(&self.pool)
        .await?;
        row.ok_or_else(|| StoreError::NotFound(format!("candidate profile {}", p.id)))
    }

    async fn filter_candidates(
        &self,
        filter: &CandidateFilter,
        now: DateTime<Utc>,
    ) -> StoreResult<Vec<CandidateProfile>> {
        let mut qb: QueryBuilder<Postgres> =
            QueryBuilder::new("SELECT * FROM candidate_profiles WHERE TRUE");
        filter.push_predicates(&mut qb, now);
        debug!("Candidate filter SQL: {}", qb.sql());
        let rows = qb.build_query_as().fetch_all(&self.pool).await?;
        Ok(rows)
    }

    async fn insert_child(&self, candidate_id: Uuid, entry: &ChildEntry) -> StoreResult<ChildRow> {
        let id = Uuid::new_v4();
        let created_at: DateTime<Utc> = match entry {
            ChildEntry::Education(e) => {
                sqlx::query_scalar(
                    r#"
                    INSERT INTO candidate_education
                        (id, candidate_id, degree, institution, field_of_study,
                         start_year, end_year, grade, is_highest)
                    VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
                    RETURNING created_at
                    "#,
                )
                .bind(id)
                .bind(candidate_id)
                .bind(&e.degree)
                .bind(&e.institution)
                .bind(&e.field_of_study)
                .bind(e.start_year)
                .bind(e.end_year)
                .bind(&e.grade)
                .bind(e.is_highest)
                .fetch_one(&self.pool)
                .await?
            }
            ChildEntry::Employment(e) => {
                sqlx::query_scalar(
                    r#"
                    INSERT INTO candidate_employment
                        (id, candidate_id, company_name, designation, start_date, end_date,
                         is_current, description)
                    VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
                    RETURNING created_at
                    "#,
                )
                .bind(id)
                .bind(candidate_id)
                .bind(&e.company_name)
                .bind(&e.designation)
                .bind(e.start_date)
                .bind(e.end_date)
                .bind(e.is_current)
                .bind(&e.description)
                .fetch_one(&self.pool)
                .await?
            }
            ChildEntry::Internship(e) => {
                sqlx::query_scalar(
                    r#"
                    INSERT INTO candidate_internships
                        (id, candidate_id, company_name, role, start_date, end_date, description)
                    VALUES ($1, $2, $3, $4, $5, $6, $7)
                    RETURNING created_at
                    "#,
                )
                .bind(id)
                .bind(candidate_id)
                .bind(&e.company_name)
                .bind(&e.role)
                .bind(e.start_date)
                .bind(e.end_date)
                .bind(&e.description)
                .fetch_one(&self.pool)
                .await?
            }
            ChildEntry::Project(e) => {
                sqlx::query_scalar(
                    r#"
                    INSERT INTO candidate_projects
                        (id, candidate_id, title, description, url, technologies,
                         start_date, end_date)
                    VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
                    RETURNING created_at
                    "#,
                )
                .bind(id)
                .bind(candidate_id)
                .bind(&e.title)
                .bind(&e.description)
                .bind(&e.url)
                .bind(&e.technologies)
                .bind(e.start_date)
                .bind(e.end_date)
                .fetch_one(&self.pool)
                .await?
            }
            ChildEntry::Language(e) => {
                sqlx::query_scalar(
                    r#"
                    INSERT INTO candidate_languages (id, candidate_id, language, proficiency)
                    VALUES ($1, $2, $3, $4)
                    RETURNING created_at
                    "#,
                )
                .bind(id)
                .bind(candidate_id)
                .bind(&e.language)
                .bind(&e.proficiency)
                .fetch_one(&self.pool)
                .await?
            }
            ChildEntry::Accomplishment(e) => {
                sqlx::query_scalar(
                    r#"
                    INSERT INTO candidate_accomplishments
                        (id, candidate_id, kind, title, issuer, issued_on, url)
                    VALUES ($1, $2, $3, $4, $5, $6, $7)
                    RETURNING created_at
                    "#,
                )
                .bind(id)
                .bind(candidate_id)
                .bind(e.kind)
                .bind(&e.title)
                .bind(&e.issuer)
                .bind(e.issued_on)
                .bind(&e.url)
                .fetch_one(&self.pool)
                .await?
            }
            ChildEntry::Exam(e) => {
                sqlx::query_scalar(
                    r#"
                    INSERT INTO candidate_exams (id, candidate_id, exam_name, score, year)
                    VALUES ($1, $2, $3, $4, $5)
                    RETURNING created_at
                    "#,
                )
                .bind(id)
                .bind(candidate_id)
                .bind(&e.exam_name)
                .bind(&e.score)
                .bind(e.year)
                .fetch_one(&self.pool)
                .await?
            }
        };
        Ok(ChildRow {
            id,
            candidate_id,
            created_at,
            entry: entry.clone(),
        })
    }

    async fn list_children(&self, candidate_id: Uuid, kind: ChildKind) -> StoreResult<Vec<ChildRow>> {
        // Table names come from a closed enum, never from input.
        let sql = format!(
            "SELECT id, candidate_id, created_at, to_jsonb(t) AS data FROM {} t \
             WHERE candidate_id = $1 ORDER BY created_at",
            kind.table()
        );
        let rows: Vec<(Uuid, Uuid, DateTime<Utc>, serde_json::Value)> = sqlx::query_as(&sql)
            .bind(candidate_id)
            .fetch_all(&self.pool)
            .await?;
        rows.into_iter().map(|row| decode_child(kind, row)).collect()
    }

    async fn count_children(&self, candidate_id: Uuid, kind: ChildKind) -> StoreResult<usize> {
        let sql = format!("SELECT COUNT(*) FROM {} WHERE candidate_id = $1", kind.table());
        let count: i64 = sqlx::query_scalar(&sql)
            .bind(candidate_id)
            .fetch_one(&self.pool)
            .await?;
        Ok(count.max(0) as usize)
    }

    async fn get_job(&self, id: Uuid) -> StoreResult<Option<Job>> {
        let row = sqlx::query_as("SELECT * FROM jobs WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    async fn insert_job(&self, j: &Job) -> StoreResult<Job> {
        let row = sqlx::query_as(
            r#"
            INSERT INTO jobs
                (id, recruiter_id, title, company_name, location, employment_type, work_mode,
                 salary_min, salary_max, experience_min, experience_max, education_required,
                 skills_required, description, is_active, num_positions, application_deadline,
                 visibility, role_category, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16,
                    $17, $18, $19, $20, $21)
            RETURNING *
            "#,
        )
        .bind(j.id)
        .bind(j.recruiter_id)
        .bind(&j.title)
        .bind(&j.company_name)
        .bind(&j.location)
        .bind(j.employment_type)
        .bind(j.work_mode)
        .bind(j.salary_min)
        .bind(j.salary_max)
        .bind(j.experience_min)
        .bind(j.experience_max)
        .bind(j.education_required)
        .bind(&j.skills_required)
        .bind(&j.description)
        .bind(j.is_active)
        .bind(j.num_positions)
        .bind(j.application_deadline)
        .bind(j.visibility)
        .bind(&j.role_category)
        .bind(j.created_at)
        .bind(j.updated_at)
        .fetch_one(&self.pool)
        .await?;
        Ok(row)
    }

    async fn update_job(&self, j: &Job) -> StoreResult<Job> {
        let row = sqlx::query_as(
            r#"
            UPDATE jobs SET
                title = $2, company_name = $3, location = $4, employment_type = $5,
                work_mode = $6, salary_min = $7, salary_max = $8, experience_min = $9,
                experience_max = $10, education_required = $11, skills_required = $12,
                description = $13, is_active = $14, num_positions = $15,
                application_deadline = $16, visibility = $17, role_category = $18,
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(j.id)
        .bind(&j.title)
        .bind(&j.company_name)
        .bind(&j.location)
        .bind(j.employment_type)
        .bind(j.work_mode)
        .bind(j.salary_min)
        .bind(j.salary_max)
        .bind(j.experience_min)
        .bind(j.experience_max)
        .bind(j.education_required)
        .bind(&j.skills_required)
        .bind(&j.description)
        .bind(j.is_active)
        .bind(j.num_positions)
        .bind(j.application_deadline)
        .bind(j.visibility)
        .bind(&j.role_category)
        .fetch_optional(&self.pool)
        .await?;
        row.ok_or_else(|| StoreError::NotFound(format!("job {}", j.id)))
    }

    async fn delete_job(&self, id: Uuid) -> StoreResult<bool> {
        let result = sqlx::query("DELETE FROM jobs WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn filter_jobs(&self, filter: &JobFilter, now: DateTime<Utc>) -> StoreResult<Vec<Job>> {
        let mut qb: QueryBuilder<Postgres> = QueryBuilder::new("SELECT * FROM jobs WHERE TRUE");
        filter.push_predicates(&mut qb, now);
        debug!("Job filter SQL: {}", qb.sql());
        let rows = qb.build_query_as().fetch_all(&self.pool).await?;
        Ok(rows)
    }

    async fn find_application(
        &self,
        candidate_id: Uuid,
        job_id: Uuid,
    ) -> StoreResult<Option<Application>> {
        // No unique index: take the oldest when a race produced duplicates.
        let row = sqlx::query_as(
            "SELECT * FROM applications WHERE candidate_id = $1 AND job_id = $2 \
             ORDER BY created_at LIMIT 1",
        )
        .bind(candidate_id)
        .bind(job_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    async fn get_application(&self, id: Uuid) -> StoreResult<Option<Application>> {
        let row = sqlx::query_as("SELECT * FROM applications WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    async fn insert_application(
        &self,
        candidate_id: Uuid,
        job_id: Uuid,
        status: ApplicationStatus,
    ) -> StoreResult<Application> {
        let row = sqlx::query_as(
            r#"
            INSERT INTO applications (id, candidate_id, job_id, status)
            VALUES ($1, $2, $3, $4)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(candidate_id)
        .bind(job_id)
        .bind(status)
        .fetch_one(&self.pool)
        .await?;
        Ok(row)
    }

    async fn update_application_status(
        &self,
        id: Uuid,
        status: ApplicationStatus,
    ) -> StoreResult<Application> {
        let row = sqlx::query_as(
            "UPDATE applications SET status = $2, updated_at = NOW() WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .bind(status)
        .fetch_optional(&self.pool)
        .await?;
        row.ok_or_else(|| StoreError::NotFound(format!("application {id}")))
    }

    async fn list_candidate_applications(&self, candidate_id: Uuid) -> StoreResult<Vec<Application>> {
        let rows = sqlx::query_as(
            "SELECT * FROM applications WHERE candidate_id = $1 ORDER BY created_at DESC",
        )
        .bind(candidate_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn find_saved_job(&self, candidate_id: Uuid, job_id: Uuid) -> StoreResult<Option<SavedJob>> {
        let row = sqlx::query_as("SELECT * FROM saved_jobs WHERE candidate_id = $1 AND job_id = $2")
            .bind(candidate_id)
            .bind(job_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    async fn insert_saved_job(&self, candidate_id: Uuid, job_id: Uuid) -> StoreResult<SavedJob> {
        let row = sqlx::query_as(
            r#"
            INSERT INTO saved_jobs (candidate_id, job_id)
            VALUES ($1, $2)
            ON CONFLICT (candidate_id, job_id) DO UPDATE SET candidate_id = EXCLUDED.candidate_id
            RETURNING *
            "#,
        )
        .bind(candidate_id)
        .bind(job_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(row)
    }

    async fn delete_saved_job(&self, candidate_id: Uuid, job_id: Uuid) -> StoreResult<bool> {
        let result = sqlx::query("DELETE FROM saved_jobs WHERE candidate_id = $1 AND job_id = $2")
            .bind(candidate_id)
            .bind(job_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn get_recruiter_by_user(&self, user_id: Uuid) -> StoreResult<Option<RecruiterProfile>> {
        let row = sqlx::query_as("SELECT * FROM recruiter_profiles WHERE user_id = $1")
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }
}
