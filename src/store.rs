//! Reference persistence collaborator (`store` feature).
//!
//! The analyzer never calls into this module — it exists only to give the
//! schema named in the external-interfaces contract a concrete, idiomatic
//! shape: two cascade-linked tables and a handful of CRUD entry points that
//! return a `{status, data|message}` envelope over whatever report JSON the
//! caller hands it.

use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Db(#[from] rusqlite::Error),
    #[error("project {0} not found")]
    ProjectNotFound(i64),
    #[error("sample {0} not found")]
    SampleNotFound(i64),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// The `{status, data|message}` envelope named in the external-interfaces
/// contract: every CRUD entry point's `StoreResult` converts into one of
/// these before crossing an IPC boundary, so a caller always sees
/// `{"status":"success","data":...}` or `{"status":"error","message":"..."}`.
#[derive(Debug, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum Envelope<T> {
    Success { data: T },
    Error { message: String },
}

impl<T> From<StoreResult<T>> for Envelope<T> {
    fn from(result: StoreResult<T>) -> Self {
        match result {
            Ok(data) => Envelope::Success { data },
            Err(err) => Envelope::Error {
                message: err.to_string(),
            },
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Sample {
    pub id: i64,
    pub project_id: i64,
    pub filename: String,
    pub filepath: String,
    pub analysis_results_json: Option<String>,
    pub upload_date: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct Project {
    pub id: i64,
    pub name: String,
    pub created_at: String,
    pub samples: Vec<Sample>,
}

/// Opens (creating if necessary) the schema on a connection and turns on
/// cascade-delete enforcement, which SQLite otherwise leaves off per
/// connection.
pub fn open(path: &str) -> StoreResult<Connection> {
    let conn = Connection::open(path)?;
    conn.execute_batch(
        "PRAGMA foreign_keys = ON;
         CREATE TABLE IF NOT EXISTS projects (
             id INTEGER PRIMARY KEY AUTOINCREMENT,
             name TEXT NOT NULL,
             created_at TEXT NOT NULL
         );
         CREATE TABLE IF NOT EXISTS samples (
             id INTEGER PRIMARY KEY AUTOINCREMENT,
             project_id INTEGER NOT NULL,
             filename TEXT NOT NULL,
             filepath TEXT NOT NULL,
             analysis_results_json TEXT,
             upload_date TEXT NOT NULL,
             FOREIGN KEY (project_id) REFERENCES projects (id) ON DELETE CASCADE
         );",
    )?;
    Ok(conn)
}

pub fn create_project(conn: &Connection, name: &str) -> StoreResult<Project> {
    let created_at = Utc::now().to_rfc3339();
    conn.execute(
        "INSERT INTO projects (name, created_at) VALUES (?1, ?2)",
        params![name, created_at],
    )?;
    let id = conn.last_insert_rowid();
    Ok(Project {
        id,
        name: name.to_string(),
        created_at,
        samples: Vec::new(),
    })
}

pub fn list_projects(conn: &Connection) -> StoreResult<Vec<Project>> {
    let mut stmt = conn.prepare("SELECT id, name, created_at FROM projects ORDER BY created_at DESC")?;
    let projects = stmt
        .query_map([], |row| {
            Ok(Project {
                id: row.get(0)?,
                name: row.get(1)?,
                created_at: row.get(2)?,
                samples: Vec::new(),
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;

    let mut result = Vec::with_capacity(projects.len());
    for mut project in projects {
        project.samples = samples_for_project(conn, project.id)?;
        result.push(project);
    }
    Ok(result)
}

fn samples_for_project(conn: &Connection, project_id: i64) -> StoreResult<Vec<Sample>> {
    let mut stmt = conn.prepare(
        "SELECT id, project_id, filename, filepath, analysis_results_json, upload_date
         FROM samples WHERE project_id = ?1 ORDER BY upload_date DESC",
    )?;
    let samples = stmt
        .query_map(params![project_id], |row| {
            Ok(Sample {
                id: row.get(0)?,
                project_id: row.get(1)?,
                filename: row.get(2)?,
                filepath: row.get(3)?,
                analysis_results_json: row.get(4)?,
                upload_date: row.get(5)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(samples)
}

pub fn delete_project(conn: &Connection, project_id: i64) -> StoreResult<()> {
    let affected = conn.execute("DELETE FROM projects WHERE id = ?1", params![project_id])?;
    if affected == 0 {
        return Err(StoreError::ProjectNotFound(project_id));
    }
    Ok(())
}

pub fn add_sample(
    conn: &Connection,
    project_id: i64,
    filename: &str,
    filepath: &str,
    analysis_results_json: Option<&str>,
) -> StoreResult<Sample> {
    let upload_date = Utc::now().to_rfc3339();
    conn.execute(
        "INSERT INTO samples (project_id, filename, filepath, analysis_results_json, upload_date)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![project_id, filename, filepath, analysis_results_json, upload_date],
    )?;
    let id = conn.last_insert_rowid();
    Ok(Sample {
        id,
        project_id,
        filename: filename.to_string(),
        filepath: filepath.to_string(),
        analysis_results_json: analysis_results_json.map(str::to_string),
        upload_date,
    })
}

pub fn update_sample(
    conn: &Connection,
    sample_id: i64,
    analysis_results_json: &str,
) -> StoreResult<Sample> {
    conn.execute(
        "UPDATE samples SET analysis_results_json = ?1 WHERE id = ?2",
        params![analysis_results_json, sample_id],
    )?;

    conn.query_row(
        "SELECT id, project_id, filename, filepath, analysis_results_json, upload_date
         FROM samples WHERE id = ?1",
        params![sample_id],
        |row| {
            Ok(Sample {
                id: row.get(0)?,
                project_id: row.get(1)?,
                filename: row.get(2)?,
                filepath: row.get(3)?,
                analysis_results_json: row.get(4)?,
                upload_date: row.get(5)?,
            })
        },
    )
    .optional()?
    .ok_or(StoreError::SampleNotFound(sample_id))
}

pub fn delete_sample(conn: &Connection, sample_id: i64) -> StoreResult<()> {
    let affected = conn.execute("DELETE FROM samples WHERE id = ?1", params![sample_id])?;
    if affected == 0 {
        return Err(StoreError::SampleNotFound(sample_id));
    }
    Ok(())
}
