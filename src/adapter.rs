// adapter.rs - Tool invocation adapter
// Purpose: validate a query, invoke the selected tool once, classify the result
// Contract: invoke(session, tool, query) -> InvocationResult | ValidationError

use colored::*;
use std::collections::HashMap;
use std::io::ErrorKind;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::Mutex;

use crate::activity::ActivityLog;
use crate::auth::Session;
use crate::classify::{classify_process_output, Classification, InvocationResult};
use crate::cleanup::ReportCleanupGuard;
use crate::config::ToolOverride;
use crate::error::{OsintError, ValidationError};
use crate::lookups::Lookups;
use crate::query::{Query, ValidQuery};
use crate::runner::ProcessRunner;
use crate::tools::{Backend, CleanupPolicy, LibraryCall, ToolId, ToolSpec};

pub struct Adapter {
    runner: Arc<dyn ProcessRunner>,
    lookups: Arc<dyn Lookups>,
    workdir: PathBuf,
    overrides: HashMap<ToolId, ToolOverride>,
    activity: ActivityLog,
    // At most one query is processed at a time
    busy: Mutex<()>,
}

impl Adapter {
    pub fn new(runner: Arc<dyn ProcessRunner>, lookups: Arc<dyn Lookups>, workdir: impl Into<PathBuf>) -> Self {
        Self {
            runner,
            lookups,
            workdir: workdir.into(),
            overrides: HashMap::new(),
            activity: ActivityLog::disabled(),
            busy: Mutex::new(()),
        }
    }

    pub fn with_overrides(mut self, overrides: HashMap<ToolId, ToolOverride>) -> Self {
        self.overrides = overrides;
        self
    }

    pub fn with_activity(mut self, activity: ActivityLog) -> Self {
        self.activity = activity;
        self
    }

    pub fn activity(&self) -> &ActivityLog {
        &self.activity
    }

    /// Program a process tool runs as, after configuration overrides
    pub fn program_for(&self, spec: &ToolSpec) -> Option<String> {
        self.overrides
            .get(&spec.id)
            .and_then(|o| o.program.clone())
            .or_else(|| spec.default_program().map(str::to_string))
    }

    pub async fn invoke(&self, session: &Session, tool: ToolId, query: &Query) -> Result<InvocationResult, ValidationError> {
        let spec = tool.spec();

        if !session.authenticated {
            return Err(ValidationError::new("Please enter your username and password"));
        }

        let valid = match query.validate(spec) {
            Ok(valid) => valid,
            Err(err) => {
                self.activity
                    .invocation_rejected(&session.display_name, tool.as_str(), &err.warning);
                return Err(err);
            }
        };

        let _busy = self.busy.lock().await;

        let shown = query.describe();
        println!("{}", format!("[*] {} for '{}'", spec.messages.running, shown).cyan());
        self.activity
            .invocation_started(&session.display_name, tool.as_str(), &shown);

        let started = Instant::now();
        let result = match spec.backend {
            Backend::Process { .. } => self.run_process(session, spec, &valid).await,
            Backend::Library(call) => self.run_library(spec, call, &valid).await,
        };
        let result = result.with_duration(started.elapsed().as_millis() as u64);

        let line = format!("[{}] {}: {}", marker(result.classification), tool, result.message);
        match result.classification {
            Classification::Success => println!("{}", line.green()),
            Classification::Empty => println!("{}", line.yellow()),
            Classification::Error => eprintln!("{}", line.red()),
        }
        self.activity.invocation_finished(
            &session.display_name,
            tool.as_str(),
            classification_name(result.classification),
            result.duration_ms,
            &result.message,
        );

        Ok(result)
    }

    async fn run_process(&self, session: &Session, spec: &ToolSpec, valid: &ValidQuery) -> InvocationResult {
        let ValidQuery::Text(value) = valid else {
            return InvocationResult::from_error(spec, &OsintError::Validation(spec.messages.missing_input.to_string()));
        };

        let Some(program) = self.program_for(spec) else {
            return InvocationResult::from_error(spec, &OsintError::execution("No program configured"));
        };
        let extra: &[String] = self
            .overrides
            .get(&spec.id)
            .map(|o| o.extra_args.as_slice())
            .unwrap_or(&[]);
        let args = spec.build_args(value, extra);

        // Dropped on every return path below
        let _cleanup = match spec.cleanup {
            CleanupPolicy::QueryReports => {
                let activity = self.activity.clone();
                let operator = session.display_name.clone();
                Some(
                    ReportCleanupGuard::new(&self.workdir, value.clone()).on_done(move |report| {
                        for (path, error) in &report.failed {
                            activity.cleanup_failed(&operator, path, error);
                        }
                    }),
                )
            }
            CleanupPolicy::None => None,
        };

        match self.runner.run(&program, &args, &self.workdir).await {
            Ok(output) => classify_process_output(spec, &output),
            Err(e) => {
                let reason = if e.kind() == ErrorKind::NotFound {
                    "command not found".to_string()
                } else {
                    e.to_string()
                };
                let err = OsintError::execution(format!("Error running {}: {}", program, reason));
                InvocationResult::from_error(spec, &err)
            }
        }
    }

    async fn run_library(&self, spec: &ToolSpec, call: LibraryCall, valid: &ValidQuery) -> InvocationResult {
        let outcome = match (call, valid) {
            (LibraryCall::Profile, ValidQuery::Text(username)) => self.lookups.profile(username).await,
            (LibraryCall::Whois, ValidQuery::Text(domain)) => self.lookups.whois(domain).await,
            (LibraryCall::ImageMetadata, ValidQuery::Image(source)) => self.lookups.image_metadata(source).await,
            _ => Err(OsintError::Validation(spec.messages.missing_input.to_string())),
        };

        match outcome {
            Ok(value) => InvocationResult::from_value(spec, value),
            Err(err) => InvocationResult::from_error(spec, &err),
        }
    }
}

fn marker(classification: Classification) -> &'static str {
    match classification {
        Classification::Success => "+",
        Classification::Empty => "!",
        Classification::Error => "-",
    }
}

pub fn classification_name(classification: Classification) -> &'static str {
    match classification {
        Classification::Success => "success",
        Classification::Empty => "empty",
        Classification::Error => "error",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::{CapturedOutput, Payload};
    use crate::lookups::NetworkLookups;
    use crate::query::ImageSource;
    use async_trait::async_trait;
    use serde_json::{json, Value};
    use std::path::Path;
    use std::sync::Mutex as StdMutex;

    #[derive(Default)]
    struct FakeRunner {
        calls: StdMutex<Vec<(String, Vec<String>)>>,
        output: CapturedOutput,
        fail_launch: bool,
        // Report file the fake tool leaves in its working directory
        writes_report: Option<String>,
    }

    #[async_trait]
    impl ProcessRunner for FakeRunner {
        async fn run(&self, program: &str, args: &[String], cwd: &Path) -> std::io::Result<CapturedOutput> {
            self.calls
                .lock()
                .unwrap()
                .push((program.to_string(), args.to_vec()));
            if let Some(name) = &self.writes_report {
                std::fs::write(cwd.join(name), "found accounts")?;
            }
            if self.fail_launch {
                return Err(std::io::Error::new(ErrorKind::NotFound, "no such file"));
            }
            Ok(self.output.clone())
        }
    }

    impl FakeRunner {
        fn printing(stdout: &str) -> Self {
            Self {
                output: CapturedOutput {
                    stdout: stdout.to_string(),
                    stderr: String::new(),
                    exit_code: Some(0),
                },
                ..Self::default()
            }
        }

        fn call_count(&self) -> usize {
            self.calls.lock().unwrap().len()
        }
    }

    #[derive(Default)]
    struct FakeLookups {
        calls: StdMutex<usize>,
        whois_error: Option<String>,
        value: Value,
    }

    impl FakeLookups {
        fn answer(&self) -> Result<Value, OsintError> {
            *self.calls.lock().unwrap() += 1;
            if let Some(message) = &self.whois_error {
                return Err(OsintError::Lookup(message.clone()));
            }
            Ok(self.value.clone())
        }

        fn call_count(&self) -> usize {
            *self.calls.lock().unwrap()
        }
    }

    #[async_trait]
    impl Lookups for FakeLookups {
        async fn profile(&self, _username: &str) -> Result<Value, OsintError> {
            self.answer()
        }

        async fn whois(&self, _domain: &str) -> Result<Value, OsintError> {
            self.answer()
        }

        async fn image_metadata(&self, _source: &ImageSource) -> Result<Value, OsintError> {
            self.answer()
        }
    }

    fn operator() -> Session {
        Session::authenticated("jsmith", "John Smith")
    }

    fn adapter(runner: Arc<FakeRunner>, lookups: Arc<FakeLookups>, dir: &Path) -> Adapter {
        Adapter::new(runner, lookups, dir)
    }

    #[tokio::test]
    async fn test_empty_query_never_invokes_anything() {
        let dir = tempfile::tempdir().unwrap();
        let runner = Arc::new(FakeRunner::printing("ignored"));
        let lookups = Arc::new(FakeLookups::default());
        let adapter = adapter(Arc::clone(&runner), Arc::clone(&lookups), dir.path());

        for tool in ToolId::ALL {
            for query in [Query::text(""), Query::text("   ")] {
                let err = adapter.invoke(&operator(), tool, &query).await.unwrap_err();
                assert_eq!(err.warning, tool.spec().messages.missing_input);
            }
        }

        assert_eq!(runner.call_count(), 0);
        assert_eq!(lookups.call_count(), 0);
    }

    #[tokio::test]
    async fn test_empty_email_warns() {
        let dir = tempfile::tempdir().unwrap();
        let runner = Arc::new(FakeRunner::printing("ignored"));
        let adapter = adapter(Arc::clone(&runner), Arc::new(FakeLookups::default()), dir.path());

        let err = adapter
            .invoke(&operator(), ToolId::Holehe, &Query::text(""))
            .await
            .unwrap_err();
        assert_eq!(err.warning, "Please enter an email address");
        assert_eq!(runner.call_count(), 0);
        assert_eq!(adapter.activity().get_events().len(), 1);
    }

    #[tokio::test]
    async fn test_maigret_json_listing_is_structured_success() {
        let dir = tempfile::tempdir().unwrap();
        let listing = json!({
            "GitHub": {"status": "Claimed", "url": "https://github.com/octocat"},
            "Reddit": {"status": "Claimed", "url": "https://www.reddit.com/user/octocat"}
        });
        let runner = Arc::new(FakeRunner::printing(&listing.to_string()));
        let adapter = adapter(Arc::clone(&runner), Arc::new(FakeLookups::default()), dir.path());

        let result = adapter
            .invoke(&operator(), ToolId::Maigret, &Query::text("octocat"))
            .await
            .unwrap();

        assert_eq!(result.classification, Classification::Success);
        assert_eq!(result.payload, Some(Payload::Json(listing)));

        let calls = runner.calls.lock().unwrap();
        assert_eq!(calls[0], ("maigret".to_string(), vec!["octocat".to_string()]));
    }

    #[tokio::test]
    async fn test_override_program_and_args() {
        let dir = tempfile::tempdir().unwrap();
        let runner = Arc::new(FakeRunner::printing("ok"));
        let overrides = HashMap::from([(
            ToolId::Holehe,
            ToolOverride {
                program: Some("/opt/holehe/bin/holehe".into()),
                extra_args: vec!["--only-used".into()],
            },
        )]);
        let adapter = adapter(Arc::clone(&runner), Arc::new(FakeLookups::default()), dir.path())
            .with_overrides(overrides);

        adapter
            .invoke(&operator(), ToolId::Holehe, &Query::text("a@b.io"))
            .await
            .unwrap();

        let calls = runner.calls.lock().unwrap();
        assert_eq!(calls[0].0, "/opt/holehe/bin/holehe");
        assert_eq!(calls[0].1, vec!["a@b.io", "--only-used"]);
    }

    #[tokio::test]
    async fn test_sherlock_reports_cleaned_after_success() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("notes.txt"), "keep").unwrap();
        let runner = Arc::new(FakeRunner {
            writes_report: Some("octocat.txt".into()),
            ..FakeRunner::printing("[+] GitHub: https://github.com/octocat")
        });
        let adapter = adapter(Arc::clone(&runner), Arc::new(FakeLookups::default()), dir.path());

        let result = adapter
            .invoke(&operator(), ToolId::Sherlock, &Query::text("octocat"))
            .await
            .unwrap();

        assert!(result.is_success());
        assert!(!dir.path().join("octocat.txt").exists());
        assert!(dir.path().join("notes.txt").exists());
    }

    #[tokio::test]
    async fn test_sherlock_reports_cleaned_when_launch_fails() {
        let dir = tempfile::tempdir().unwrap();
        let runner = Arc::new(FakeRunner {
            writes_report: Some("octocat_partial.txt".into()),
            fail_launch: true,
            ..FakeRunner::default()
        });
        let adapter = adapter(Arc::clone(&runner), Arc::new(FakeLookups::default()), dir.path());

        let result = adapter
            .invoke(&operator(), ToolId::Sherlock, &Query::text("octocat"))
            .await
            .unwrap();

        assert_eq!(result.classification, Classification::Error);
        assert_eq!(result.message, "Error running sherlock: command not found");
        assert!(!dir.path().join("octocat_partial.txt").exists());
    }

    #[tokio::test]
    async fn test_other_tools_leave_reports_alone() {
        let dir = tempfile::tempdir().unwrap();
        let runner = Arc::new(FakeRunner {
            writes_report: Some("octocat.txt".into()),
            ..FakeRunner::printing("{}")
        });
        let adapter = adapter(Arc::clone(&runner), Arc::new(FakeLookups::default()), dir.path());

        adapter
            .invoke(&operator(), ToolId::Maigret, &Query::text("octocat"))
            .await
            .unwrap();
        assert!(dir.path().join("octocat.txt").exists());
    }

    #[tokio::test]
    async fn test_empty_output_is_empty_classification() {
        let dir = tempfile::tempdir().unwrap();
        let runner = Arc::new(FakeRunner {
            output: CapturedOutput {
                stdout: String::new(),
                stderr: "Traceback".into(),
                exit_code: Some(1),
            },
            ..FakeRunner::default()
        });
        let adapter = adapter(runner, Arc::new(FakeLookups::default()), dir.path());

        let result = adapter
            .invoke(&operator(), ToolId::Sherlock, &Query::text("octocat"))
            .await
            .unwrap();
        assert_eq!(result.classification, Classification::Empty);
        assert_eq!(result.message, "No accounts found.");
        assert_eq!(result.stderr.as_deref(), Some("Traceback"));
    }

    #[tokio::test]
    async fn test_whois_lookup_error_is_error_result() {
        let dir = tempfile::tempdir().unwrap();
        let lookups = Arc::new(FakeLookups {
            whois_error: Some("No match for \"nothing-here.com\".".into()),
            ..FakeLookups::default()
        });
        let adapter = adapter(Arc::new(FakeRunner::default()), Arc::clone(&lookups), dir.path());

        let result = adapter
            .invoke(&operator(), ToolId::Whois, &Query::text("nothing-here.com"))
            .await
            .unwrap();

        assert_eq!(result.classification, Classification::Error);
        assert_eq!(result.error_kind, Some("lookup"));
        assert_eq!(result.message, "Error: No match for \"nothing-here.com\".");
        assert_eq!(lookups.call_count(), 1);
    }

    #[tokio::test]
    async fn test_option_like_username_never_reaches_the_tool() {
        let dir = tempfile::tempdir().unwrap();
        let runner = Arc::new(FakeRunner::printing("x"));
        let adapter = adapter(Arc::clone(&runner), Arc::new(FakeLookups::default()), dir.path());

        let err = adapter
            .invoke(&operator(), ToolId::Sherlock, &Query::text("--output=/tmp/pwn"))
            .await
            .unwrap_err();
        assert_eq!(err.warning, "Username Check 2 does not accept values starting with '-'.");
        assert_eq!(runner.call_count(), 0);
    }

    #[tokio::test]
    async fn test_unauthenticated_session_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let runner = Arc::new(FakeRunner::printing("x"));
        let adapter = adapter(Arc::clone(&runner), Arc::new(FakeLookups::default()), dir.path());

        let err = adapter
            .invoke(&Session::anonymous(), ToolId::Sherlock, &Query::text("octocat"))
            .await
            .unwrap_err();
        assert_eq!(err.warning, "Please enter your username and password");
        assert_eq!(runner.call_count(), 0);
    }

    // Serves one HTML response and returns the image URL pointing at it
    async fn serve_image_url(status: &'static str, body: &'static str) -> String {
        use tokio::io::{AsyncReadExt, AsyncWriteExt};

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        tokio::spawn(async move {
            if let Ok((mut socket, _)) = listener.accept().await {
                let mut buf = vec![0u8; 2048];
                let _ = socket.read(&mut buf).await;
                let response = format!(
                    "HTTP/1.1 {}\r\nContent-Type: text/html\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                    status,
                    body.len(),
                    body
                );
                let _ = socket.write_all(response.as_bytes()).await;
            }
        });
        format!("http://127.0.0.1:{}/photo.jpg", port)
    }

    #[tokio::test]
    async fn test_image_url_with_non_image_payload_is_empty() {
        let url = serve_image_url("200 OK", "<html><body>not a picture</body></html>").await;

        let dir = tempfile::tempdir().unwrap();
        let adapter = Adapter::new(
            Arc::new(FakeRunner::default()),
            Arc::new(NetworkLookups::new()),
            dir.path(),
        );

        let result = adapter
            .invoke(&operator(), ToolId::Exif, &Query::ImageUrl(url))
            .await
            .unwrap();

        assert_eq!(result.classification, Classification::Empty);
        assert_eq!(result.message, "No EXIF metadata found.");
    }

    #[tokio::test]
    async fn test_image_url_http_failure_is_transport_error() {
        let url = serve_image_url("404 Not Found", "<html>gone</html>").await;

        let dir = tempfile::tempdir().unwrap();
        let adapter = Adapter::new(
            Arc::new(FakeRunner::default()),
            Arc::new(NetworkLookups::new()),
            dir.path(),
        );

        let result = adapter
            .invoke(&operator(), ToolId::Exif, &Query::ImageUrl(url))
            .await
            .unwrap();

        assert_eq!(result.classification, Classification::Error);
        assert_eq!(result.error_kind, Some("transport"));
        assert_eq!(result.message, "Error reading image: Failed to fetch image: HTTP 404");
    }

    #[tokio::test]
    async fn test_uploaded_image_tags_extracted() {
        let dir = tempfile::tempdir().unwrap();
        let adapter = Adapter::new(
            Arc::new(FakeRunner::default()),
            Arc::new(NetworkLookups::new()),
            dir.path(),
        );

        let query = Query::Upload {
            bytes: crate::exif_meta::tests::tiff_with_make(),
            filename: Some("photo.tif".into()),
        };
        let result = adapter.invoke(&operator(), ToolId::Exif, &query).await.unwrap();

        assert!(result.is_success());
        let Some(Payload::Json(tags)) = result.payload else {
            panic!("expected structured tags");
        };
        assert_eq!(tags["Image Make"], "Canon");
    }
}
