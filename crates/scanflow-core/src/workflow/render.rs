//! Prompt rendering.
//!
//! Pure functions, independent of I/O: templates in, text out. Every
//! rendered prompt carries the strict-JSON instruction wrapper that
//! forces the model to emit exactly one JSON object with no prose.

use serde_json::Value;

/// Placeholder in prompt bodies replaced with the accumulated context.
pub const INPUT_PLACEHOLDER: &str = "{{input}}";

/// Instruction preamble applied to every rendered prompt.
const STRICT_JSON_PREAMBLE: &str = "You are a system service that only returns JSON. \
Do not include any human-readable text, greetings, or explanations outside of the JSON structure.";

/// Closing instruction applied to every rendered prompt.
const STRICT_JSON_CLOSE: &str = "Your response MUST be a single, valid JSON object.";

/// Replace every `{{input}}` placeholder in `body` with the compact JSON
/// of `input`.
pub fn substitute_input(body: &str, input: &Value) -> String {
    if !body.contains(INPUT_PLACEHOLDER) {
        return body.to_string();
    }
    let rendered = serde_json::to_string(input).unwrap_or_else(|_| "null".to_string());
    body.replace(INPUT_PLACEHOLDER, &rendered)
}

/// Render an ordinary step: previous step input plus the prompt body.
pub fn render_step(body: &str, previous: &Value) -> String {
    format!(
        "{STRICT_JSON_PREAMBLE}\n\n\
         CONTEXT:\n\
         - Previous Step Input: {}\n\n\
         TASK:\n\
         Perform the following task based on the original prompt body: \"{body}\".\n\n\
         {STRICT_JSON_CLOSE}",
        pretty(previous),
    )
}

/// Render the context-enriching step: project metadata and recent
/// history are embedded verbatim alongside the running context.
pub fn render_enriched(body: &str, project: &Value, recent: &Value, input: &Value) -> String {
    format!(
        "{STRICT_JSON_PREAMBLE}\n\n\
         CONTEXT:\n\
         - Project Details: {}\n\
         - Recent Logs: {}\n\
         - Current Input: {}\n\n\
         TASK:\n\
         Analyze the provided CONTEXT and perform the following task based on the original \
         prompt body: \"{body}\".\n\n\
         {STRICT_JSON_CLOSE}",
        pretty(project),
        pretty(recent),
        pretty(input),
    )
}

fn pretty(value: &Value) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| "null".to_string())
}
