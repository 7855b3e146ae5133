//! Reader-friendly extraction of an archived page via Mozilla Readability

use serde_json::{Map, Value};
use std::ffi::OsString;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tempfile::NamedTempFile;

use crate::{
    atomic::AtomicWriter,
    config::ReadabilityConfig,
    error::{ExtractError, Result},
    link::Link,
    process::{BoundedProcessRunner, ProcessOutput},
    result::ArchiveResult,
    source::DocumentSource,
    timer::RunTimer,
};

/// Directory, relative to the output root, holding the artifact set.
pub const OUTPUT_DIR: &str = "readability";
pub const HTML_FILE: &str = "content.html";
pub const TEXT_FILE: &str = "content.txt";
/// Written last; its presence marks a completed extraction.
pub const ARTICLE_FILE: &str = "article.json";

const TAIL_LINES: usize = 3;

/// Runs the readability extractor for one link at a time
pub struct ReadabilityExtractor {
    config: ReadabilityConfig,
    source: Arc<dyn DocumentSource>,
    runner: BoundedProcessRunner,
}

impl ReadabilityExtractor {
    pub fn new(config: ReadabilityConfig, source: Arc<dyn DocumentSource>) -> Self {
        Self {
            config,
            source,
            runner: BoundedProcessRunner::new(),
        }
    }

    pub fn with_runner(mut self, runner: BoundedProcessRunner) -> Self {
        self.runner = runner;
        self
    }

    pub fn config(&self) -> &ReadabilityConfig {
        &self.config
    }

    /// Where the artifact set for `link` lives.
    pub fn output_folder(link: &Link, out_dir: Option<&Path>) -> PathBuf {
        absolute(link.output_root(out_dir)).join(OUTPUT_DIR)
    }

    /// Whether `extract` should run for `link`: extraction is enabled and
    /// no article has been saved yet. [`extract`](Self::extract) does not
    /// consult this itself.
    pub fn should_extract(&self, link: &Link, out_dir: Option<&Path>) -> bool {
        let marker = link
            .output_root(out_dir)
            .join(OUTPUT_DIR)
            .join(ARTICLE_FILE);
        self.config.enabled && !marker.exists()
    }

    /// Download `link`, run the extractor on it and persist the artifacts.
    ///
    /// Never fails: every error is folded into the returned record.
    pub async fn extract(
        &self,
        link: &Link,
        out_dir: Option<&Path>,
        timeout: Option<Duration>,
    ) -> ArchiveResult {
        let pwd = absolute(link.output_root(out_dir));
        let output_folder = pwd.join(OUTPUT_DIR);
        let timeout = timeout.unwrap_or_else(|| self.config.timeout());
        let mut cmd = vec![self.config.binary.clone().into_os_string()];

        tracing::info!(url = %link.url, output = %output_folder.display(), "extracting readability");

        let timer = RunTimer::start();
        let outcome = self
            .run(link, &pwd, &output_folder, timeout, &mut cmd)
            .await;
        let timing = timer.stop();

        match &outcome {
            Ok(()) => tracing::info!(
                url = %link.url,
                elapsed_secs = timing.duration.as_secs_f64(),
                "readability extraction succeeded"
            ),
            Err(err) => tracing::warn!(
                url = %link.url,
                kind = ?err.kind(),
                error = %err,
                hints = ?err.hints(),
                "readability extraction failed"
            ),
        }

        // The record is for display; the process received `cmd` unchanged.
        let cmd = cmd
            .iter()
            .map(|arg| arg.to_string_lossy().to_string())
            .collect();

        ArchiveResult::new(
            cmd,
            pwd,
            self.config.version.clone(),
            output_folder,
            &outcome,
            timing,
        )
    }

    async fn run(
        &self,
        link: &Link,
        pwd: &Path,
        output_folder: &Path,
        timeout: Duration,
        cmd: &mut Vec<OsString>,
    ) -> Result<()> {
        let document = self.source.download(&link.url).await?;

        // Removed when dropped, whichever way this function returns.
        let mut staged = NamedTempFile::new()?;
        staged.write_all(&document)?;
        staged.flush()?;
        cmd.push(staged.path().as_os_str().to_os_string());
        tracing::debug!(?cmd, "staged document");

        let output = self.runner.run(cmd.as_slice(), pwd, timeout).await?;
        if !output.success() {
            return Err(non_zero_exit(&output));
        }

        let article = parse_article(&output.stdout)?;
        let writer = AtomicWriter::new(self.config.output_permissions);
        write_artifacts(&writer, output_folder, article)
    }
}

/// Build the error for a tool that exited with a failure status.
fn non_zero_exit(output: &ProcessOutput) -> ExtractError {
    let code = output
        .exit_code
        .map_or_else(|| "signal".to_string(), |code| code.to_string());
    let mut hints = vec![format!("Got readability response code: {}.", code)];
    hints.extend(output.tail_lines(TAIL_LINES));
    ExtractError::NonZeroExit {
        code: output.exit_code,
        hints,
    }
}

/// The extractor's JSON output split into its artifacts.
#[derive(Debug, PartialEq)]
struct Article {
    content: String,
    text_content: String,
    rest: Map<String, Value>,
}

fn parse_article(stdout: &[u8]) -> Result<Article> {
    let mut object = match serde_json::from_slice::<Value>(stdout)? {
        Value::Object(object) => object,
        other => {
            return Err(ExtractError::Malformed(format!(
                "expected a JSON object, got {}",
                json_type(&other)
            )))
        }
    };
    let content = take_string(&mut object, "content")?;
    let text_content = take_string(&mut object, "textContent")?;
    Ok(Article {
        content,
        text_content,
        rest: object,
    })
}

fn take_string(object: &mut Map<String, Value>, key: &str) -> Result<String> {
    match object.remove(key) {
        Some(Value::String(value)) => Ok(value),
        Some(other) => Err(ExtractError::Malformed(format!(
            "field {:?} should be a string, got {}",
            key,
            json_type(&other)
        ))),
        None => Err(ExtractError::Malformed(format!("missing field {:?}", key))),
    }
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

fn write_artifacts(writer: &AtomicWriter, output_folder: &Path, article: Article) -> Result<()> {
    std::fs::create_dir_all(output_folder)?;
    writer.write(output_folder.join(HTML_FILE), article.content)?;
    writer.write(output_folder.join(TEXT_FILE), article.text_content)?;
    writer.write_json(output_folder.join(ARTICLE_FILE), &article.rest)?;
    Ok(())
}

fn absolute(path: &Path) -> PathBuf {
    std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf())
}
