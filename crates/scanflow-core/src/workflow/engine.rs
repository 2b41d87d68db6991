//! Workflow engine: sequential step loop over the chain graph.
//!
//! One run walks the graph from the entry edge: render the active
//! prompt against the accumulated context, invoke the fallback
//! executor, strict-parse the JSON output, resolve the next edge, merge
//! and repeat. Absence of a matching outgoing edge is the designed
//! success terminal; every fatal condition short-circuits to a failure
//! result without committing that step's context changes.
//!
//! A run is strictly sequential: one model call and one store lookup in
//! flight at a time. The step ceiling is the sole circuit breaker
//! against cyclic or malformed chains.

use serde_json::{Map, Value, json};
use uuid::Uuid;

use scanflow_types::config::OrchestratorConfig;
use scanflow_types::error::WorkflowError;
use scanflow_types::usage::{UsageLogEntry, UsageReport};
use scanflow_types::workflow::{AuditEntry, WorkflowResult};

use crate::chain::ChainStore;
use crate::llm::FallbackExecutor;
use crate::repository::chain::ChainRepository;

use super::context::shallow_merge;
use super::render;

/// How many recent audit entries the context-enriching step embeds.
const RECENT_LOGS_LIMIT: i64 = 5;

/// Outcome of a successful internal run, before audit logging.
struct RunSuccess {
    output: Value,
    final_step: String,
    provider: String,
    duration_ms: u64,
    estimated_cost: f64,
}

/// Drives the step loop for one workflow at a time.
///
/// Holds its own [`FallbackExecutor`] (and therefore its own usage
/// log): independent engines share no mutable state, so concurrent
/// runs are fully isolated.
pub struct WorkflowEngine<R: ChainRepository> {
    store: ChainStore<R>,
    executor: FallbackExecutor,
    context_loader_title: String,
    project_id: Option<Uuid>,
    max_steps: u32,
}

impl<R: ChainRepository> WorkflowEngine<R> {
    /// Create an engine from an injected repository, executor, and
    /// configuration. No process-wide singletons.
    pub fn new(repo: R, executor: FallbackExecutor, config: &OrchestratorConfig) -> Self {
        Self {
            store: ChainStore::new(repo),
            executor,
            context_loader_title: config.context_loader_title.clone(),
            project_id: config.project_id,
            max_steps: config.max_steps,
        }
    }

    /// Execute one workflow run with the caller-supplied input.
    ///
    /// Never returns `Err`: every fatal condition is folded into a
    /// `{success: false, error}` result. Terminal audit entries are
    /// written on both paths; an audit write failure is warned about
    /// and swallowed, never changing the run outcome.
    pub async fn execute(&mut self, input: Value) -> WorkflowResult {
        tracing::info!("starting workflow run");
        let mut steps = 0u32;

        match self.run(&input, &mut steps).await {
            Ok(success) => {
                let content =
                    serde_json::to_string(&success.output).unwrap_or_default();
                self.write_audit(AuditEntry::new(
                    &success.final_step,
                    "success",
                    &content,
                    json!({
                        "provider": success.provider,
                        "durationMs": success.duration_ms,
                        "estimatedCost": success.estimated_cost,
                        "totalSteps": steps,
                        "input": input,
                    }),
                ))
                .await;

                tracing::info!(total_steps = steps, "workflow completed");
                WorkflowResult::success(success.output, steps)
            }
            Err(err) => {
                tracing::error!(error = %err, step = steps, "workflow run failed");
                self.write_audit(AuditEntry::new(
                    "workflow_error",
                    "error",
                    &err.to_string(),
                    json!({ "input": input, "totalSteps": steps }),
                ))
                .await;

                WorkflowResult::failure(err.to_string(), steps)
            }
        }
    }

    /// Usage report for every provider attempt made by this engine.
    pub fn usage_report(&self) -> UsageReport {
        self.executor.usage_report()
    }

    /// The executor's full append-only usage log.
    pub fn usage_log(&self) -> &[UsageLogEntry] {
        self.executor.usage_log()
    }

    /// The step loop. `steps` counts executed steps for both terminal
    /// paths.
    async fn run(
        &mut self,
        input: &Value,
        steps: &mut u32,
    ) -> Result<RunSuccess, WorkflowError> {
        let (_, mut current) = self.store.load_start().await?;
        let mut context = input.clone();

        loop {
            if *steps >= self.max_steps {
                return Err(WorkflowError::MaxStepsExceeded {
                    max: self.max_steps,
                });
            }
            *steps += 1;

            tracing::info!(step = *steps, prompt = %current.title, "executing step");

            let body = render::substitute_input(&current.body, &context);
            let rendered = if current.title == self.context_loader_title {
                let (project, recent) = self.enrichment().await;
                render::render_enriched(&body, &project, &recent, &context)
            } else {
                render::render_step(&body, &context)
            };

            let outcome = self.executor.execute(&rendered, &current.title).await?;
            if outcome.content.trim().is_empty() {
                return Err(WorkflowError::EmptyModelResponse);
            }

            let parsed = parse_strict_json(&outcome.content)?;

            match self.store.find_next(&current.id, &parsed).await? {
                Some(next) => {
                    context = shallow_merge(context, &parsed);
                    current = next;
                }
                None => {
                    // No outgoing edge matched: designed end of workflow.
                    return Ok(RunSuccess {
                        output: Value::Object(parsed),
                        final_step: current.title,
                        provider: outcome.provider,
                        duration_ms: outcome.duration_ms,
                        estimated_cost: outcome.estimated_cost,
                    });
                }
            }
        }
    }

    /// Fetch the auxiliary read-only context for the enriching step.
    ///
    /// Fetch failures are embedded as `{"error": ...}` rather than
    /// aborting the run: the enrichment is advisory context for the
    /// model, not a correctness dependency.
    async fn enrichment(&self) -> (Value, Value) {
        let project = match self.project_id {
            Some(id) => match self.store.repo().project(&id).await {
                Ok(Some(details)) => {
                    serde_json::to_value(&details).unwrap_or(Value::Null)
                }
                Ok(None) => json!({ "error": format!("project {id} not found") }),
                Err(err) => {
                    tracing::warn!(error = %err, "could not load project details");
                    json!({ "error": err.to_string() })
                }
            },
            None => json!({ "error": "no project configured" }),
        };

        let recent = match self.store.repo().recent_audit(RECENT_LOGS_LIMIT).await {
            Ok(entries) => {
                let rows: Vec<Value> = entries
                    .iter()
                    .map(|e| {
                        json!({
                            "created_at": e.created_at,
                            "step": e.step,
                            "status": e.status,
                        })
                    })
                    .collect();
                Value::Array(rows)
            }
            Err(err) => {
                tracing::warn!(error = %err, "could not load recent logs");
                json!({ "error": err.to_string() })
            }
        };

        (project, recent)
    }

    /// Append a terminal audit entry, swallowing failures.
    async fn write_audit(&self, entry: AuditEntry) {
        if let Err(err) = self.store.repo().append_audit(&entry).await {
            tracing::warn!(error = %err, "could not write audit entry, continuing");
        }
    }
}

/// Parse a model response under the strict-JSON contract.
///
/// The response must be exactly one JSON object. No repair, extraction,
/// or re-prompting is attempted on failure.
fn parse_strict_json(content: &str) -> Result<Map<String, Value>, WorkflowError> {
    let value: Value = serde_json::from_str(content.trim())
        .map_err(|e| WorkflowError::InvalidModelOutput(e.to_string()))?;

    match value {
        Value::Object(map) => Ok(map),
        other => Err(WorkflowError::InvalidModelOutput(format!(
            "expected a JSON object, got {}",
            json_type_name(&other)
        ))),
    }
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::{BoxModelProvider, ModelProvider};
    use scanflow_types::chain::{ChainEdge, ProjectDetails, Prompt};
    use scanflow_types::error::RepositoryError;
    use scanflow_types::model::ModelError;
    use std::collections::VecDeque;
    use std::future::Future;
    use std::sync::{Arc, Mutex};

    // --- scripted provider --------------------------------------------------

    struct ScriptedProvider {
        name: String,
        responses: Mutex<VecDeque<Result<String, String>>>,
        prompts_seen: Arc<Mutex<Vec<String>>>,
    }

    impl ScriptedProvider {
        fn new(name: &str, responses: Vec<Result<&str, &str>>) -> Self {
            Self {
                name: name.to_string(),
                responses: Mutex::new(
                    responses
                        .into_iter()
                        .map(|r| r.map(String::from).map_err(String::from))
                        .collect(),
                ),
                prompts_seen: Arc::new(Mutex::new(Vec::new())),
            }
        }

        fn with_capture(mut self, seen: Arc<Mutex<Vec<String>>>) -> Self {
            self.prompts_seen = seen;
            self
        }
    }

    impl ModelProvider for ScriptedProvider {
        fn name(&self) -> &str {
            &self.name
        }

        fn cost_per_token(&self) -> f64 {
            0.000003
        }

        fn invoke(
            &self,
            prompt: &str,
        ) -> impl Future<Output = Result<String, ModelError>> + Send {
            self.prompts_seen.lock().unwrap().push(prompt.to_string());
            let next = self
                .responses
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or(Err("script exhausted".to_string()));
            async move { next.map_err(|message| ModelError::Provider { message }) }
        }
    }

    // --- in-memory repository ----------------------------------------------

    #[derive(Default)]
    struct TestRepo {
        prompts: Vec<Prompt>,
        edges: Vec<ChainEdge>,
        project: Option<ProjectDetails>,
        audit: Arc<Mutex<Vec<AuditEntry>>>,
        fail_audit: bool,
    }

    impl ChainRepository for TestRepo {
        fn entry_edges(
            &self,
        ) -> impl Future<Output = Result<Vec<ChainEdge>, RepositoryError>> + Send {
            let entries: Vec<ChainEdge> =
                self.edges.iter().filter(|e| e.is_entry()).cloned().collect();
            async move { Ok(entries) }
        }

        fn edges_from(
            &self,
            from: &Uuid,
        ) -> impl Future<Output = Result<Vec<ChainEdge>, RepositoryError>> + Send {
            let mut edges: Vec<ChainEdge> = self
                .edges
                .iter()
                .filter(|e| e.from_prompt_id.as_ref() == Some(from))
                .cloned()
                .collect();
            edges.sort_by_key(|e| e.position);
            async move { Ok(edges) }
        }

        fn all_edges(
            &self,
        ) -> impl Future<Output = Result<Vec<ChainEdge>, RepositoryError>> + Send {
            let edges = self.edges.clone();
            async move { Ok(edges) }
        }

        fn prompt(
            &self,
            id: &Uuid,
        ) -> impl Future<Output = Result<Option<Prompt>, RepositoryError>> + Send {
            let prompt = self.prompts.iter().find(|p| &p.id == id).cloned();
            async move { Ok(prompt) }
        }

        fn upsert_prompt(
            &self,
            _prompt: &Prompt,
        ) -> impl Future<Output = Result<(), RepositoryError>> + Send {
            async { Ok(()) }
        }

        fn upsert_edge(
            &self,
            _edge: &ChainEdge,
        ) -> impl Future<Output = Result<(), RepositoryError>> + Send {
            async { Ok(()) }
        }

        fn project(
            &self,
            _id: &Uuid,
        ) -> impl Future<Output = Result<Option<ProjectDetails>, RepositoryError>> + Send {
            let project = self.project.clone();
            async move { Ok(project) }
        }

        fn append_audit(
            &self,
            entry: &AuditEntry,
        ) -> impl Future<Output = Result<(), RepositoryError>> + Send {
            if !self.fail_audit {
                self.audit.lock().unwrap().push(entry.clone());
            }
            let fail = self.fail_audit;
            async move {
                if fail {
                    Err(RepositoryError::Query("audit table missing".to_string()))
                } else {
                    Ok(())
                }
            }
        }

        fn recent_audit(
            &self,
            limit: i64,
        ) -> impl Future<Output = Result<Vec<AuditEntry>, RepositoryError>> + Send {
            let mut entries: Vec<AuditEntry> =
                self.audit.lock().unwrap().iter().rev().cloned().collect();
            entries.truncate(limit as usize);
            async move { Ok(entries) }
        }
    }

    // --- fixtures -----------------------------------------------------------

    fn prompt(title: &str, body: &str) -> Prompt {
        Prompt {
            id: Uuid::now_v7(),
            title: title.to_string(),
            body: body.to_string(),
            active: true,
        }
    }

    fn obj(value: Value) -> Map<String, Value> {
        value.as_object().unwrap().clone()
    }

    fn entry_edge(to: Uuid) -> ChainEdge {
        ChainEdge {
            id: Uuid::now_v7(),
            from_prompt_id: None,
            to_prompt_id: to,
            condition: obj(json!({"start_prompt": true})),
            notes: None,
            position: 0,
        }
    }

    fn edge(from: Uuid, to: Uuid, condition: Value, position: i64) -> ChainEdge {
        ChainEdge {
            id: Uuid::now_v7(),
            from_prompt_id: Some(from),
            to_prompt_id: to,
            condition: obj(condition),
            notes: None,
            position,
        }
    }

    fn engine_with(
        repo: TestRepo,
        providers: Vec<BoxModelProvider>,
    ) -> WorkflowEngine<TestRepo> {
        WorkflowEngine::new(
            repo,
            FallbackExecutor::new(providers),
            &OrchestratorConfig::default(),
        )
    }

    // --- scenarios ----------------------------------------------------------

    #[tokio::test]
    async fn test_single_step_run() {
        // Entry edge to P; P has no outgoing edges; model returns {"x":1}.
        let p = prompt("Scanner: Classify", "Classify {{input}}");
        let repo = TestRepo {
            edges: vec![entry_edge(p.id)],
            prompts: vec![p],
            ..Default::default()
        };
        let audit = repo.audit.clone();

        let mut engine = engine_with(
            repo,
            vec![BoxModelProvider::new(ScriptedProvider::new(
                "claude",
                vec![Ok(r#"{"x":1}"#)],
            ))],
        );

        let result = engine.execute(json!({"barcode": "078742133121"})).await;
        assert!(result.success);
        assert_eq!(result.final_output, Some(json!({"x": 1})));
        assert_eq!(result.total_steps, 1);
        assert!(result.error.is_none());

        let audit = audit.lock().unwrap();
        assert_eq!(audit.len(), 1);
        assert_eq!(audit[0].step, "Scanner: Classify");
        assert_eq!(audit[0].status, "success");
    }

    #[tokio::test]
    async fn test_two_step_run_follows_matching_edge() {
        let p1 = prompt("Scanner: Classify", "Classify {{input}}");
        let p2 = prompt("Scanner: Enrich", "Enrich the record");
        let repo = TestRepo {
            edges: vec![
                entry_edge(p1.id),
                edge(p1.id, p2.id, json!({"status": "ok"}), 0),
            ],
            prompts: vec![p1, p2],
            ..Default::default()
        };

        let mut engine = engine_with(
            repo,
            vec![BoxModelProvider::new(ScriptedProvider::new(
                "claude",
                vec![Ok(r#"{"status":"ok"}"#), Ok(r#"{"done":true}"#)],
            ))],
        );

        let result = engine.execute(json!({"barcode": "123"})).await;
        assert!(result.success);
        assert_eq!(result.final_output, Some(json!({"done": true})));
        assert_eq!(result.total_steps, 2);
    }

    #[tokio::test]
    async fn test_unmatched_condition_ends_run() {
        // P1's only outgoing edge requires status=ok; the model says
        // status=failed, so the run ends at step 1 with P1's output.
        let p1 = prompt("Scanner: Classify", "Classify");
        let p2 = prompt("Scanner: Enrich", "Enrich");
        let repo = TestRepo {
            edges: vec![
                entry_edge(p1.id),
                edge(p1.id, p2.id, json!({"status": "ok"}), 0),
            ],
            prompts: vec![p1, p2],
            ..Default::default()
        };

        let mut engine = engine_with(
            repo,
            vec![BoxModelProvider::new(ScriptedProvider::new(
                "claude",
                vec![Ok(r#"{"status":"failed"}"#)],
            ))],
        );

        let result = engine.execute(json!({})).await;
        assert!(result.success);
        assert_eq!(result.final_output, Some(json!({"status": "failed"})));
        assert_eq!(result.total_steps, 1);
    }

    #[tokio::test]
    async fn test_non_json_output_is_fatal() {
        let p = prompt("Scanner: Classify", "Classify");
        let repo = TestRepo {
            edges: vec![entry_edge(p.id)],
            prompts: vec![p],
            ..Default::default()
        };
        let audit = repo.audit.clone();

        let mut engine = engine_with(
            repo,
            vec![BoxModelProvider::new(ScriptedProvider::new(
                "claude",
                vec![Ok("hello")],
            ))],
        );

        let result = engine.execute(json!({})).await;
        assert!(!result.success);
        assert!(result.final_output.is_none());
        assert!(result.error.unwrap().contains("JSON"));

        let audit = audit.lock().unwrap();
        assert_eq!(audit[0].step, "workflow_error");
        assert_eq!(audit[0].status, "error");
    }

    #[tokio::test]
    async fn test_non_object_json_output_is_fatal() {
        let p = prompt("Scanner: Classify", "Classify");
        let repo = TestRepo {
            edges: vec![entry_edge(p.id)],
            prompts: vec![p],
            ..Default::default()
        };

        let mut engine = engine_with(
            repo,
            vec![BoxModelProvider::new(ScriptedProvider::new(
                "claude",
                vec![Ok("[1, 2, 3]")],
            ))],
        );

        let result = engine.execute(json!({})).await;
        assert!(!result.success);
        assert!(result.error.unwrap().contains("an array"));
    }

    #[tokio::test]
    async fn test_all_providers_failing_is_fatal_with_three_log_entries() {
        let p = prompt("Scanner: Classify", "Classify");
        let repo = TestRepo {
            edges: vec![entry_edge(p.id)],
            prompts: vec![p],
            ..Default::default()
        };

        let mut engine = engine_with(
            repo,
            vec![
                BoxModelProvider::new(ScriptedProvider::new("claude", vec![Err("down")])),
                BoxModelProvider::new(ScriptedProvider::new("gpt4o", vec![Err("down")])),
                BoxModelProvider::new(ScriptedProvider::new("gemini", vec![Err("down")])),
            ],
        );

        let result = engine.execute(json!({})).await;
        assert!(!result.success);
        assert!(result.error.unwrap().contains("all model providers failed"));

        let log = engine.usage_log();
        assert_eq!(log.len(), 3);
        assert!(log.iter().all(|entry| !entry.success));
    }

    #[tokio::test]
    async fn test_empty_response_is_fatal() {
        let p = prompt("Scanner: Classify", "Classify");
        let repo = TestRepo {
            edges: vec![entry_edge(p.id)],
            prompts: vec![p],
            ..Default::default()
        };

        let mut engine = engine_with(
            repo,
            vec![BoxModelProvider::new(ScriptedProvider::new(
                "claude",
                vec![Ok("  \n ")],
            ))],
        );

        let result = engine.execute(json!({})).await;
        assert!(!result.success);
        assert_eq!(
            result.error.as_deref(),
            Some("model returned an empty response")
        );
    }

    #[tokio::test]
    async fn test_cyclic_chain_hits_step_ceiling() {
        // P1 loops back to itself unconditionally.
        let p1 = prompt("Scanner: Loop", "Loop");
        let repo = TestRepo {
            edges: vec![entry_edge(p1.id), edge(p1.id, p1.id, json!({}), 0)],
            prompts: vec![p1],
            ..Default::default()
        };

        let responses: Vec<Result<&str, &str>> = (0..10).map(|_| Ok("{}")).collect();
        let mut engine = engine_with(
            repo,
            vec![BoxModelProvider::new(ScriptedProvider::new(
                "claude", responses,
            ))],
        );

        let result = engine.execute(json!({})).await;
        assert!(!result.success);
        assert!(result.error.unwrap().contains("maximum of 10 steps"));
        assert_eq!(result.total_steps, 10);
    }

    #[tokio::test]
    async fn test_context_accumulates_into_later_prompts() {
        // P2's body interpolates the accumulated context; P1's output
        // must be visible there after the merge.
        let p1 = prompt("Scanner: Classify", "Classify");
        let p2 = prompt("Scanner: Enrich", "Enrich {{input}}");
        let repo = TestRepo {
            edges: vec![
                entry_edge(p1.id),
                edge(p1.id, p2.id, json!({"status": "ok"}), 0),
            ],
            prompts: vec![p1, p2],
            ..Default::default()
        };

        let seen = Arc::new(Mutex::new(Vec::new()));
        let provider = ScriptedProvider::new(
            "claude",
            vec![
                Ok(r#"{"status":"ok","volume":"12oz"}"#),
                Ok(r#"{"done":true}"#),
            ],
        )
        .with_capture(seen.clone());

        let mut engine = engine_with(repo, vec![BoxModelProvider::new(provider)]);
        let result = engine.execute(json!({"barcode": "123"})).await;
        assert!(result.success);

        let prompts = seen.lock().unwrap();
        assert_eq!(prompts.len(), 2);
        assert!(prompts[1].contains("12oz"));
        assert!(prompts[1].contains("barcode"));
    }

    #[tokio::test]
    async fn test_context_loader_step_is_enriched() {
        let loader = prompt("Scanner: Context Loader", "Analyze the input");
        let repo = TestRepo {
            edges: vec![entry_edge(loader.id)],
            prompts: vec![loader],
            project: Some(ProjectDetails {
                project_name: "scanner".to_string(),
                created_at: chrono::Utc::now(),
            }),
            ..Default::default()
        };

        let seen = Arc::new(Mutex::new(Vec::new()));
        let provider = ScriptedProvider::new("claude", vec![Ok(r#"{"ready":true}"#)])
            .with_capture(seen.clone());

        let mut config = OrchestratorConfig::default();
        config.project_id = Some(Uuid::now_v7());

        let mut engine = WorkflowEngine::new(
            repo,
            FallbackExecutor::new(vec![BoxModelProvider::new(provider)]),
            &config,
        );

        let result = engine.execute(json!({"barcode": "123"})).await;
        assert!(result.success);

        let prompts = seen.lock().unwrap();
        assert!(prompts[0].contains("Project Details:"));
        assert!(prompts[0].contains("scanner"));
        assert!(prompts[0].contains("Recent Logs:"));
    }

    #[tokio::test]
    async fn test_no_start_point_fails_cleanly() {
        let repo = TestRepo::default();
        let mut engine = engine_with(repo, vec![]);

        let result = engine.execute(json!({})).await;
        assert!(!result.success);
        assert_eq!(
            result.error.as_deref(),
            Some("no workflow start point found")
        );
        assert_eq!(result.total_steps, 0);
    }

    #[tokio::test]
    async fn test_audit_failure_never_changes_run_outcome() {
        let p = prompt("Scanner: Classify", "Classify");
        let repo = TestRepo {
            edges: vec![entry_edge(p.id)],
            prompts: vec![p],
            fail_audit: true,
            ..Default::default()
        };

        let mut engine = engine_with(
            repo,
            vec![BoxModelProvider::new(ScriptedProvider::new(
                "claude",
                vec![Ok(r#"{"x":1}"#)],
            ))],
        );

        let result = engine.execute(json!({})).await;
        assert!(result.success, "audit failure must not fail the run");
        assert_eq!(result.final_output, Some(json!({"x": 1})));
    }

    // --- parse_strict_json --------------------------------------------------

    #[test]
    fn test_parse_strict_json_accepts_object_with_whitespace() {
        let parsed = parse_strict_json("  {\"a\": 1}\n").unwrap();
        assert_eq!(parsed.get("a"), Some(&json!(1)));
    }

    #[test]
    fn test_parse_strict_json_rejects_scalars() {
        assert!(matches!(
            parse_strict_json("42"),
            Err(WorkflowError::InvalidModelOutput(msg)) if msg.contains("a number")
        ));
    }

    #[test]
    fn test_parse_strict_json_rejects_prose_wrapped_json() {
        // No extraction or repair is attempted.
        assert!(parse_strict_json("Here you go: {\"a\": 1}").is_err());
    }
}
