//! SQLite chain repository implementation.
//!
//! Implements `ChainRepository` from `scanflow-core` using sqlx with
//! split read/write pools. Edge conditions are stored as JSON text;
//! edges carry an explicit `position` column so first-match resolution
//! is deterministic regardless of row insertion order.

use chrono::{DateTime, Utc};
use scanflow_core::repository::chain::ChainRepository;
use scanflow_types::chain::{ChainEdge, ProjectDetails, Prompt};
use scanflow_types::error::RepositoryError;
use scanflow_types::workflow::AuditEntry;
use sqlx::Row;
use uuid::Uuid;

use super::pool::DatabasePool;

/// SQLite-backed implementation of `ChainRepository`.
pub struct SqliteChainRepository {
    pool: DatabasePool,
}

impl SqliteChainRepository {
    /// Create a new repository backed by the given database pool.
    pub fn new(pool: DatabasePool) -> Self {
        Self { pool }
    }

    /// Upsert a project row. Used by seeding.
    pub async fn upsert_project(
        &self,
        id: &Uuid,
        project_name: &str,
    ) -> Result<(), RepositoryError> {
        sqlx::query(
            r#"INSERT INTO projects (id, project_name, created_at)
               VALUES (?, ?, ?)
               ON CONFLICT(id) DO UPDATE SET project_name = excluded.project_name"#,
        )
        .bind(id.to_string())
        .bind(project_name)
        .bind(format_datetime(&Utc::now()))
        .execute(&self.pool.writer)
        .await
        .map_err(|e| RepositoryError::Query(e.to_string()))?;

        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Internal row conversion
// ---------------------------------------------------------------------------

fn row_to_prompt(row: &sqlx::sqlite::SqliteRow) -> Result<Prompt, RepositoryError> {
    let id: String = row
        .try_get("id")
        .map_err(|e| RepositoryError::Query(e.to_string()))?;
    let active: i64 = row
        .try_get("active")
        .map_err(|e| RepositoryError::Query(e.to_string()))?;

    Ok(Prompt {
        id: parse_uuid(&id)?,
        title: row
            .try_get("title")
            .map_err(|e| RepositoryError::Query(e.to_string()))?,
        body: row
            .try_get("body")
            .map_err(|e| RepositoryError::Query(e.to_string()))?,
        active: active != 0,
    })
}

fn row_to_edge(row: &sqlx::sqlite::SqliteRow) -> Result<ChainEdge, RepositoryError> {
    let id: String = row
        .try_get("id")
        .map_err(|e| RepositoryError::Query(e.to_string()))?;
    let from_prompt_id: Option<String> = row
        .try_get("from_prompt_id")
        .map_err(|e| RepositoryError::Query(e.to_string()))?;
    let to_prompt_id: String = row
        .try_get("to_prompt_id")
        .map_err(|e| RepositoryError::Query(e.to_string()))?;
    let condition: String = row
        .try_get("condition")
        .map_err(|e| RepositoryError::Query(e.to_string()))?;

    let condition = serde_json::from_str::<serde_json::Value>(&condition)
        .map_err(|e| RepositoryError::Query(format!("invalid condition JSON: {e}")))?
        .as_object()
        .cloned()
        .ok_or_else(|| RepositoryError::Query("condition is not a JSON object".to_string()))?;

    Ok(ChainEdge {
        id: parse_uuid(&id)?,
        from_prompt_id: from_prompt_id.as_deref().map(parse_uuid).transpose()?,
        to_prompt_id: parse_uuid(&to_prompt_id)?,
        condition,
        notes: row
            .try_get("notes")
            .map_err(|e| RepositoryError::Query(e.to_string()))?,
        position: row
            .try_get("position")
            .map_err(|e| RepositoryError::Query(e.to_string()))?,
    })
}

fn row_to_audit(row: &sqlx::sqlite::SqliteRow) -> Result<AuditEntry, RepositoryError> {
    let id: String = row
        .try_get("id")
        .map_err(|e| RepositoryError::Query(e.to_string()))?;
    let metadata: String = row
        .try_get("metadata")
        .map_err(|e| RepositoryError::Query(e.to_string()))?;
    let created_at: String = row
        .try_get("created_at")
        .map_err(|e| RepositoryError::Query(e.to_string()))?;

    Ok(AuditEntry {
        id: parse_uuid(&id)?,
        step: row
            .try_get("step")
            .map_err(|e| RepositoryError::Query(e.to_string()))?,
        status: row
            .try_get("status")
            .map_err(|e| RepositoryError::Query(e.to_string()))?,
        content: row
            .try_get("content")
            .map_err(|e| RepositoryError::Query(e.to_string()))?,
        metadata: serde_json::from_str(&metadata)
            .map_err(|e| RepositoryError::Query(format!("invalid metadata JSON: {e}")))?,
        created_at: parse_datetime(&created_at)?,
    })
}

fn parse_uuid(s: &str) -> Result<Uuid, RepositoryError> {
    Uuid::parse_str(s).map_err(|e| RepositoryError::Query(format!("invalid uuid '{s}': {e}")))
}

fn parse_datetime(s: &str) -> Result<DateTime<Utc>, RepositoryError> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| RepositoryError::Query(format!("invalid datetime '{s}': {e}")))
}

fn format_datetime(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339()
}

// ---------------------------------------------------------------------------
// ChainRepository implementation
// ---------------------------------------------------------------------------

impl ChainRepository for SqliteChainRepository {
    async fn entry_edges(&self) -> Result<Vec<ChainEdge>, RepositoryError> {
        let rows = sqlx::query(
            "SELECT * FROM chain_edges WHERE from_prompt_id IS NULL ORDER BY position, created_at",
        )
        .fetch_all(&self.pool.reader)
        .await
        .map_err(|e| RepositoryError::Query(e.to_string()))?;

        let edges = rows
            .iter()
            .map(row_to_edge)
            .collect::<Result<Vec<_>, _>>()?;

        // Only edges carrying the start marker count as entry edges.
        Ok(edges.into_iter().filter(|e| e.is_entry()).collect())
    }

    async fn edges_from(&self, from: &Uuid) -> Result<Vec<ChainEdge>, RepositoryError> {
        let rows = sqlx::query(
            "SELECT * FROM chain_edges WHERE from_prompt_id = ? ORDER BY position, created_at",
        )
        .bind(from.to_string())
        .fetch_all(&self.pool.reader)
        .await
        .map_err(|e| RepositoryError::Query(e.to_string()))?;

        rows.iter().map(row_to_edge).collect()
    }

    async fn all_edges(&self) -> Result<Vec<ChainEdge>, RepositoryError> {
        let rows = sqlx::query("SELECT * FROM chain_edges ORDER BY position, created_at")
            .fetch_all(&self.pool.reader)
            .await
            .map_err(|e| RepositoryError::Query(e.to_string()))?;

        rows.iter().map(row_to_edge).collect()
    }

    async fn prompt(&self, id: &Uuid) -> Result<Option<Prompt>, RepositoryError> {
        let row = sqlx::query("SELECT * FROM prompts WHERE id = ? AND active = 1")
            .bind(id.to_string())
            .fetch_optional(&self.pool.reader)
            .await
            .map_err(|e| RepositoryError::Query(e.to_string()))?;

        row.as_ref().map(row_to_prompt).transpose()
    }

    async fn upsert_prompt(&self, prompt: &Prompt) -> Result<(), RepositoryError> {
        sqlx::query(
            r#"INSERT INTO prompts (id, title, body, active, created_at)
               VALUES (?, ?, ?, ?, ?)
               ON CONFLICT(id) DO UPDATE SET
                   title = excluded.title,
                   body = excluded.body,
                   active = excluded.active"#,
        )
        .bind(prompt.id.to_string())
        .bind(&prompt.title)
        .bind(&prompt.body)
        .bind(prompt.active as i64)
        .bind(format_datetime(&Utc::now()))
        .execute(&self.pool.writer)
        .await
        .map_err(|e| RepositoryError::Query(e.to_string()))?;

        Ok(())
    }

    async fn upsert_edge(&self, edge: &ChainEdge) -> Result<(), RepositoryError> {
        let condition = serde_json::to_string(&edge.condition)
            .map_err(|e| RepositoryError::Query(e.to_string()))?;

        sqlx::query(
            r#"INSERT INTO chain_edges (id, from_prompt_id, to_prompt_id, condition, notes, position, created_at)
               VALUES (?, ?, ?, ?, ?, ?, ?)
               ON CONFLICT(id) DO UPDATE SET
                   from_prompt_id = excluded.from_prompt_id,
                   to_prompt_id = excluded.to_prompt_id,
                   condition = excluded.condition,
                   notes = excluded.notes,
                   position = excluded.position"#,
        )
        .bind(edge.id.to_string())
        .bind(edge.from_prompt_id.map(|id| id.to_string()))
        .bind(edge.to_prompt_id.to_string())
        .bind(condition)
        .bind(&edge.notes)
        .bind(edge.position)
        .bind(format_datetime(&Utc::now()))
        .execute(&self.pool.writer)
        .await
        .map_err(|e| RepositoryError::Query(e.to_string()))?;

        Ok(())
    }

    async fn project(&self, id: &Uuid) -> Result<Option<ProjectDetails>, RepositoryError> {
        let row = sqlx::query("SELECT project_name, created_at FROM projects WHERE id = ?")
            .bind(id.to_string())
            .fetch_optional(&self.pool.reader)
            .await
            .map_err(|e| RepositoryError::Query(e.to_string()))?;

        row.map(|row| {
            let created_at: String = row
                .try_get("created_at")
                .map_err(|e| RepositoryError::Query(e.to_string()))?;
            Ok(ProjectDetails {
                project_name: row
                    .try_get("project_name")
                    .map_err(|e| RepositoryError::Query(e.to_string()))?,
                created_at: parse_datetime(&created_at)?,
            })
        })
        .transpose()
    }

    async fn append_audit(&self, entry: &AuditEntry) -> Result<(), RepositoryError> {
        let metadata = serde_json::to_string(&entry.metadata)
            .map_err(|e| RepositoryError::Query(e.to_string()))?;

        sqlx::query(
            r#"INSERT INTO audit_log (id, step, status, content, metadata, created_at)
               VALUES (?, ?, ?, ?, ?, ?)"#,
        )
        .bind(entry.id.to_string())
        .bind(&entry.step)
        .bind(&entry.status)
        .bind(&entry.content)
        .bind(metadata)
        .bind(format_datetime(&entry.created_at))
        .execute(&self.pool.writer)
        .await
        .map_err(|e| RepositoryError::Query(e.to_string()))?;

        Ok(())
    }

    async fn recent_audit(&self, limit: i64) -> Result<Vec<AuditEntry>, RepositoryError> {
        let rows = sqlx::query("SELECT * FROM audit_log ORDER BY created_at DESC LIMIT ?")
            .bind(limit)
            .fetch_all(&self.pool.reader)
            .await
            .map_err(|e| RepositoryError::Query(e.to_string()))?;

        rows.iter().map(row_to_audit).collect()
    }
}
