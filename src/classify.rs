// classify.rs - Invocation results and output classification

use lazy_static::lazy_static;
use regex::Regex;
use serde::Serialize;

use crate::error::OsintError;
use crate::tools::{ExitPolicy, OutputFormat, ToolId, ToolSpec};

lazy_static! {
    // CSI sequences (colors, cursor movement) emitted by tools that ignore --no-color
    static ref ANSI_ESCAPE: Regex = Regex::new(r"\x1b\[[0-9;?]*[ -/]*[@-~]").unwrap();
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Classification {
    Success,
    Empty,
    Error,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "format", content = "data", rename_all = "lowercase")]
pub enum Payload {
    Json(serde_json::Value),
    Text(String),
}

#[derive(Debug, Clone, Serialize)]
pub struct InvocationResult {
    pub tool: ToolId,
    pub classification: Classification,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payload: Option<Payload>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stderr: Option<String>,
    pub message: String,
    /// JSON was expected but the output did not parse
    pub raw_fallback: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_kind: Option<&'static str>,
    pub duration_ms: u64,
}

impl InvocationResult {
    pub fn is_success(&self) -> bool {
        self.classification == Classification::Success
    }

    pub fn with_duration(mut self, duration_ms: u64) -> Self {
        self.duration_ms = duration_ms;
        self
    }

    /// Result for a failed invocation
    pub fn from_error(spec: &ToolSpec, err: &OsintError) -> Self {
        let (message, stderr) = match err {
            OsintError::Execution { message, stderr } => (message.clone(), stderr.clone()),
            other => (format!("{}: {}", spec.messages.error_prefix, other), None),
        };

        Self {
            tool: spec.id,
            classification: Classification::Error,
            payload: None,
            stderr,
            message,
            raw_fallback: false,
            error_kind: Some(err.kind()),
            duration_ms: 0,
        }
    }

    /// Result for a library call that returned structured data
    pub fn from_value(spec: &ToolSpec, value: serde_json::Value) -> Self {
        if is_empty_value(&value) {
            return Self::empty(spec, None);
        }

        Self {
            tool: spec.id,
            classification: Classification::Success,
            payload: Some(Payload::Json(value)),
            stderr: None,
            message: spec.messages.success.to_string(),
            raw_fallback: false,
            error_kind: None,
            duration_ms: 0,
        }
    }

    pub fn empty(spec: &ToolSpec, stderr: Option<String>) -> Self {
        Self {
            tool: spec.id,
            classification: Classification::Empty,
            payload: None,
            stderr,
            message: spec.messages.empty.to_string(),
            raw_fallback: false,
            error_kind: None,
            duration_ms: 0,
        }
    }
}

/// Captured streams of one finished process
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CapturedOutput {
    pub stdout: String,
    pub stderr: String,
    /// None when the process was killed by a signal
    pub exit_code: Option<i32>,
}

impl CapturedOutput {
    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }
}

pub fn strip_ansi(text: &str) -> String {
    ANSI_ESCAPE.replace_all(text, "").into_owned()
}

pub fn parse_structured(text: &str) -> Result<serde_json::Value, OsintError> {
    serde_json::from_str(text.trim()).map_err(|e| OsintError::Parse(e.to_string()))
}

fn is_empty_value(value: &serde_json::Value) -> bool {
    match value {
        serde_json::Value::Null => true,
        serde_json::Value::Object(map) => map.is_empty(),
        serde_json::Value::Array(items) => items.is_empty(),
        serde_json::Value::String(s) => s.trim().is_empty(),
        _ => false,
    }
}

/// Classify the captured output of a process tool.
///
/// Order matters: empty output wins over exit status, a strict tool's
/// non-zero exit wins over parsing, and JSON is attempted for every tool.
pub fn classify_process_output(spec: &ToolSpec, output: &CapturedOutput) -> InvocationResult {
    let stdout = strip_ansi(&output.stdout);
    let stderr = strip_ansi(&output.stderr);
    let stderr = if stderr.trim().is_empty() {
        None
    } else {
        Some(stderr.trim_end().to_string())
    };

    if stdout.trim().is_empty() {
        return InvocationResult::empty(spec, stderr);
    }

    if spec.exit_policy == ExitPolicy::Strict && !output.success() {
        let err = OsintError::Execution {
            message: spec.messages.error_prefix.to_string(),
            stderr: stderr.or_else(|| Some(exit_description(output))),
        };
        return InvocationResult::from_error(spec, &err);
    }

    let (payload, raw_fallback, message) = match parse_structured(&stdout) {
        Ok(value) => (Payload::Json(value), false, spec.messages.success.to_string()),
        Err(_) if spec.output == OutputFormat::Json => (
            Payload::Text(stdout.trim_end().to_string()),
            true,
            "Could not parse JSON output. Showing raw output instead:".to_string(),
        ),
        Err(_) => (
            Payload::Text(stdout.trim_end().to_string()),
            false,
            spec.messages.success.to_string(),
        ),
    };

    InvocationResult {
        tool: spec.id,
        classification: Classification::Success,
        payload: Some(payload),
        stderr,
        message,
        raw_fallback,
        error_kind: None,
        duration_ms: 0,
    }
}

fn exit_description(output: &CapturedOutput) -> String {
    match output.exit_code {
        Some(code) => format!("process exited with status {}", code),
        None => "process terminated by signal".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn captured(stdout: &str, stderr: &str, code: i32) -> CapturedOutput {
        CapturedOutput {
            stdout: stdout.to_string(),
            stderr: stderr.to_string(),
            exit_code: Some(code),
        }
    }

    #[test]
    fn test_json_output_is_structured_success() {
        let stdout = r#"{"octocat": {"GitHub": {"status": "Claimed", "url": "https://github.com/octocat"}}}"#;
        let result = classify_process_output(ToolId::Maigret.spec(), &captured(stdout, "", 0));

        assert_eq!(result.classification, Classification::Success);
        assert!(!result.raw_fallback);
        let expected: serde_json::Value = serde_json::from_str(stdout).unwrap();
        assert_eq!(result.payload, Some(Payload::Json(expected)));
    }

    #[test]
    fn test_unparseable_json_tool_falls_back_to_text() {
        let result = classify_process_output(
            ToolId::Maigret.spec(),
            &captured("[+] GitHub: https://github.com/octocat\n", "", 0),
        );
        assert_eq!(result.classification, Classification::Success);
        assert!(result.raw_fallback);
        assert_eq!(
            result.payload,
            Some(Payload::Text("[+] GitHub: https://github.com/octocat".into()))
        );
        assert!(result.message.starts_with("Could not parse JSON output"));
    }

    #[test]
    fn test_text_tool_has_no_fallback_flag() {
        let result = classify_process_output(
            ToolId::Sherlock.spec(),
            &captured("[+] GitHub: https://github.com/octocat\n", "", 0),
        );
        assert!(!result.raw_fallback);
        assert_eq!(result.message, "Results fetched successfully");
    }

    #[test]
    fn test_empty_output_is_empty_regardless_of_exit() {
        for code in [0, 1, 127] {
            let result = classify_process_output(
                ToolId::SocialAnalyzer.spec(),
                &captured("  \n", "", code),
            );
            assert_eq!(result.classification, Classification::Empty);
            assert_eq!(result.message, "No profiles found for this username.");
        }
    }

    #[test]
    fn test_stderr_attached_to_success() {
        let result = classify_process_output(
            ToolId::Holehe.spec(),
            &captured("[+] twitter.com\n", "rate limited on 3 sites\n", 0),
        );
        assert_eq!(result.classification, Classification::Success);
        assert_eq!(result.stderr.as_deref(), Some("rate limited on 3 sites"));
    }

    #[test]
    fn test_strict_tool_nonzero_exit_is_error_with_stderr() {
        let result = classify_process_output(
            ToolId::SocialAnalyzer.spec(),
            &captured("partial", "Traceback: bad website list", 2),
        );
        assert_eq!(result.classification, Classification::Error);
        assert_eq!(result.error_kind, Some("execution"));
        assert_eq!(result.stderr.as_deref(), Some("Traceback: bad website list"));
        assert_eq!(
            result.message,
            "Social Analyzer exited with an error. Check the input."
        );
    }

    #[test]
    fn test_lenient_tool_ignores_exit_status() {
        let result = classify_process_output(ToolId::Holehe.spec(), &captured("ok", "", 1));
        assert_eq!(result.classification, Classification::Success);
    }

    #[test]
    fn test_ansi_sequences_removed() {
        assert_eq!(strip_ansi("\x1b[32m[+]\x1b[0m found"), "[+] found");
        let result = classify_process_output(
            ToolId::Holehe.spec(),
            &captured("\x1b[0m\x1b[0m\n", "", 0),
        );
        assert_eq!(result.classification, Classification::Empty);
    }

    #[test]
    fn test_library_value_classification() {
        let spec = ToolId::Whois.spec();
        let ok = InvocationResult::from_value(spec, json!({"domain_name": "EXAMPLE.COM"}));
        assert!(ok.is_success());
        let empty = InvocationResult::from_value(spec, json!({}));
        assert_eq!(empty.classification, Classification::Empty);
        assert_eq!(empty.message, "No registration data returned.");
    }

    #[test]
    fn test_lookup_error_message_prefixed() {
        let spec = ToolId::Whois.spec();
        let err = OsintError::Lookup("No match for \"nothing.example\".".into());
        let result = InvocationResult::from_error(spec, &err);
        assert_eq!(result.classification, Classification::Error);
        assert_eq!(result.message, "Error: No match for \"nothing.example\".");
    }

    #[test]
    fn test_serialized_shape() {
        let result = InvocationResult::from_value(ToolId::Whois.spec(), json!({"a": 1}));
        let value = serde_json::to_value(&result).unwrap();
        assert_eq!(value["tool"], "whois");
        assert_eq!(value["classification"], "success");
        assert_eq!(value["payload"]["format"], "json");
        assert_eq!(value["payload"]["data"]["a"], 1);
    }
}
