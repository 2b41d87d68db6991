//! Chain repository trait definition.
//!
//! Defines the storage interface for the prompt chain graph, project
//! metadata, and the audit log. The infrastructure layer (scanflow-infra)
//! implements this trait with SQLite persistence; tests use in-memory
//! fakes.
//!
//! Uses native async fn in traits (Rust 2024 edition, no async_trait
//! macro).

use scanflow_types::chain::{ChainEdge, ProjectDetails, Prompt};
use scanflow_types::error::RepositoryError;
use scanflow_types::workflow::AuditEntry;
use uuid::Uuid;

/// Repository trait for chain graph persistence.
///
/// Covers three entity families:
/// - **Chain graph:** prompts and conditional edges (read, plus upserts
///   for seeding).
/// - **Projects:** read-only metadata for the context-enriching step.
/// - **Audit log:** append and recent-history queries.
pub trait ChainRepository: Send + Sync {
    // -----------------------------------------------------------------------
    // Chain graph
    // -----------------------------------------------------------------------

    /// All entry edges (`from_prompt_id IS NULL` with the `start_prompt`
    /// condition marker). The accessor validates that exactly one exists.
    fn entry_edges(
        &self,
    ) -> impl std::future::Future<Output = Result<Vec<ChainEdge>, RepositoryError>> + Send;

    /// Edges leaving `from`, in listing order (`position` ascending).
    fn edges_from(
        &self,
        from: &Uuid,
    ) -> impl std::future::Future<Output = Result<Vec<ChainEdge>, RepositoryError>> + Send;

    /// Every edge in the store, for graph validation.
    fn all_edges(
        &self,
    ) -> impl std::future::Future<Output = Result<Vec<ChainEdge>, RepositoryError>> + Send;

    /// Get an active prompt by its UUID.
    fn prompt(
        &self,
        id: &Uuid,
    ) -> impl std::future::Future<Output = Result<Option<Prompt>, RepositoryError>> + Send;

    /// Upsert a prompt (insert or replace by ID). Used by seeding.
    fn upsert_prompt(
        &self,
        prompt: &Prompt,
    ) -> impl std::future::Future<Output = Result<(), RepositoryError>> + Send;

    /// Upsert a chain edge (insert or replace by ID). Used by seeding.
    fn upsert_edge(
        &self,
        edge: &ChainEdge,
    ) -> impl std::future::Future<Output = Result<(), RepositoryError>> + Send;

    // -----------------------------------------------------------------------
    // Projects
    // -----------------------------------------------------------------------

    /// Get project metadata by ID.
    fn project(
        &self,
        id: &Uuid,
    ) -> impl std::future::Future<Output = Result<Option<ProjectDetails>, RepositoryError>> + Send;

    // -----------------------------------------------------------------------
    // Audit log
    // -----------------------------------------------------------------------

    /// Append an audit entry.
    fn append_audit(
        &self,
        entry: &AuditEntry,
    ) -> impl std::future::Future<Output = Result<(), RepositoryError>> + Send;

    /// The most recent audit entries, newest first.
    fn recent_audit(
        &self,
        limit: i64,
    ) -> impl std::future::Future<Output = Result<Vec<AuditEntry>, RepositoryError>> + Send;
}
