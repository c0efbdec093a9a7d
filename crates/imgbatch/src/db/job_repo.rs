//! Queries over the `jobs` table.

use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::{params, Row};

use super::{Database, DatabaseError};
use crate::job::{Job, JobStatus};

/// A raw job row from the database.
#[derive(Debug, Clone)]
pub struct JobRow {
    pub id: String,
    pub email: Option<String>,
    pub status: String,
    pub input_name: String,
    pub input_path: String,
    pub output_path: Option<String>,
    pub errors: String,
    pub webhook_url: Option<String>,
    pub message: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl JobRow {
    fn from_row(row: &Row<'_>) -> Result<Self, rusqlite::Error> {
        Ok(Self {
            id: row.get("id")?,
            email: row.get("email")?,
            status: row.get("status")?,
            input_name: row.get("input_name")?,
            input_path: row.get("input_path")?,
            output_path: row.get("output_path")?,
            errors: row.get("errors")?,
            webhook_url: row.get("webhook_url")?,
            message: row.get("message")?,
            created_at: row.get("created_at")?,
            updated_at: row.get("updated_at")?,
        })
    }

    pub fn into_job(self) -> Result<Job, DatabaseError> {
        let status = self
            .status
            .parse::<JobStatus>()
            .map_err(|e| DatabaseError::CorruptRow {
                id: self.id.clone(),
                reason: e.to_string(),
            })?;
        let created_at = parse_timestamp(&self.id, &self.created_at)?;
        let updated_at = parse_timestamp(&self.id, &self.updated_at)?;

        Ok(Job {
            id: self.id,
            email: self.email,
            status,
            input_name: self.input_name,
            input_path: self.input_path,
            output_path: self.output_path,
            errors: self.errors,
            webhook_url: self.webhook_url,
            message: self.message,
            created_at,
            updated_at,
        })
    }
}

impl From<&Job> for JobRow {
    fn from(job: &Job) -> Self {
        Self {
            id: job.id.clone(),
            email: job.email.clone(),
            status: job.status.as_str().to_string(),
            input_name: job.input_name.clone(),
            input_path: job.input_path.clone(),
            output_path: job.output_path.clone(),
            errors: job.errors.clone(),
            webhook_url: job.webhook_url.clone(),
            message: job.message.clone(),
            created_at: format_timestamp(job.created_at),
            updated_at: format_timestamp(job.updated_at),
        }
    }
}

/// Fixed-width RFC 3339 so that text ordering matches time ordering.
pub fn format_timestamp(dt: DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn parse_timestamp(id: &str, s: &str) -> Result<DateTime<Utc>, DatabaseError> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| DatabaseError::CorruptRow {
            id: id.to_string(),
            reason: format!("bad timestamp '{}': {}", s, e),
        })
}

/// Inserts a new job row.
pub fn insert(db: &Database, job: &Job) -> Result<(), DatabaseError> {
    let row = JobRow::from(job);
    db.with_conn(|conn| {
        conn.execute(
            "INSERT INTO jobs (id, email, status, input_name, input_path, output_path,
             errors, webhook_url, message, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
            params![
                row.id,
                row.email,
                row.status,
                row.input_name,
                row.input_path,
                row.output_path,
                row.errors,
                row.webhook_url,
                row.message,
                row.created_at,
                row.updated_at,
            ],
        )?;
        Ok(())
    })
}

/// Updates an existing job row. All fields except `id` and `created_at` are overwritten.
pub fn update(db: &Database, job: &Job) -> Result<(), DatabaseError> {
    let row = JobRow::from(job);
    db.with_conn(|conn| {
        conn.execute(
            "UPDATE jobs SET email=?2, status=?3, input_name=?4, input_path=?5,
             output_path=?6, errors=?7, webhook_url=?8, message=?9, updated_at=?10
             WHERE id=?1",
            params![
                row.id,
                row.email,
                row.status,
                row.input_name,
                row.input_path,
                row.output_path,
                row.errors,
                row.webhook_url,
                row.message,
                row.updated_at,
            ],
        )?;
        Ok(())
    })
}

/// Finds a job by its ID.
pub fn find_by_id(db: &Database, id: &str) -> Result<Option<Job>, DatabaseError> {
    let row = db.with_conn(|conn| {
        let mut stmt = conn.prepare("SELECT * FROM jobs WHERE id = ?1")?;
        let mut rows = stmt.query_map(params![id], JobRow::from_row)?;
        match rows.next() {
            Some(Ok(row)) => Ok(Some(row)),
            Some(Err(e)) => Err(DatabaseError::Sqlite(e)),
            None => Ok(None),
        }
    })?;
    row.map(JobRow::into_job).transpose()
}

/// Returns true if a job with this id exists.
pub fn exists(db: &Database, id: &str) -> Result<bool, DatabaseError> {
    db.with_conn(|conn| {
        let count: u64 = conn.query_row(
            "SELECT COUNT(*) FROM jobs WHERE id = ?1",
            params![id],
            |r| r.get(0),
        )?;
        Ok(count > 0)
    })
}

/// Lists jobs with the given status, oldest first.
pub fn list_by_status(db: &Database, status: JobStatus) -> Result<Vec<Job>, DatabaseError> {
    let rows = db.with_conn(|conn| {
        let mut stmt = conn.prepare(
            "SELECT * FROM jobs WHERE status = ?1 ORDER BY created_at ASC, rowid ASC",
        )?;
        let rows = stmt
            .query_map(params![status.as_str()], JobRow::from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    })?;
    rows.into_iter().map(JobRow::into_job).collect()
}

/// Counts jobs with the given status.
pub fn count_by_status(db: &Database, status: JobStatus) -> Result<u64, DatabaseError> {
    db.with_conn(|conn| {
        let count: u64 = conn.query_row(
            "SELECT COUNT(*) FROM jobs WHERE status = ?1",
            params![status.as_str()],
            |r| r.get(0),
        )?;
        Ok(count)
    })
}
