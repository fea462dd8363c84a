//! Ollama HTTP adapter.
//!
//! The [`GenerationService`] trait decouples setup and generation from the
//! Ollama daemon. Tests use scripted services that return predetermined
//! replies and progress events without touching the network.

use std::io::{BufRead, BufReader, Lines};
use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use reqwest::StatusCode;
use reqwest::blocking::{Client, Response};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, warn};

use crate::core::types::{GenerationOptions, ModelDefinition, ModelParameters, ProgressEvent};
use crate::error::DevaiError;

/// Lazily consumed, in-order sequence of progress events. A stream either
/// yields a final `success` event and ends, or ends with an `Err`.
pub type ProgressStream<'a> = Box<dyn Iterator<Item = Result<ProgressEvent>> + 'a>;

/// Everything devai needs from a local model server.
pub trait GenerationService {
    /// True when the daemon answers. Never fails for an unreachable daemon.
    fn check_connection(&self) -> Result<bool>;
    fn model_exists(&self, name: &str) -> Result<bool>;
    fn pull_model(&self, name: &str) -> Result<ProgressStream<'_>>;
    fn create_model(&self, definition: &ModelDefinition) -> Result<ProgressStream<'_>>;
    fn delete_model(&self, name: &str) -> Result<()>;
    fn generate(&self, prompt: &str, options: &GenerationOptions) -> Result<String>;
}

const HEALTH_TIMEOUT: Duration = Duration::from_secs(5);

/// Blocking client for the Ollama REST API.
pub struct OllamaClient {
    host: String,
    http: Client,
    request_timeout: Duration,
}

#[derive(Deserialize)]
struct TagsResponse {
    #[serde(default)]
    models: Vec<ModelTag>,
}

#[derive(Deserialize)]
struct ModelTag {
    name: String,
}

#[derive(Serialize)]
struct PullRequest<'a> {
    model: &'a str,
    stream: bool,
}

#[derive(Serialize)]
struct CreateRequest<'a> {
    model: &'a str,
    from: &'a str,
    system: &'a str,
    parameters: &'a ModelParameters,
    stream: bool,
}

#[derive(Serialize)]
struct DeleteRequest<'a> {
    model: &'a str,
}

#[derive(Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
    options: GenerateOptions,
    #[serde(skip_serializing_if = "Option::is_none")]
    keep_alive: Option<u64>,
}

#[derive(Serialize)]
struct GenerateOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    num_ctx: Option<u32>,
}

#[derive(Deserialize)]
struct GenerateResponse {
    response: String,
}

impl OllamaClient {
    /// `host` is the base URL, e.g. `http://localhost:11434`.
    pub fn new(host: impl Into<String>, request_timeout: Duration) -> Result<Self> {
        // No client-wide deadline; short calls set one per request.
        let http = Client::builder()
            .timeout(None::<Duration>)
            .build()
            .context("build Ollama HTTP client")?;
        Ok(Self {
            host: host.into().trim_end_matches('/').to_string(),
            http,
            request_timeout,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/api/{path}", self.host)
    }

    fn list_models(&self) -> Result<Vec<String>> {
        let response = self
            .http
            .get(self.url("tags"))
            .timeout(self.request_timeout)
            .send()
            .map_err(|err| map_transport_error(&err, "Failed to list models"))?;
        let tags: TagsResponse = ensure_success(response, "Failed to list models")?
            .json()
            .context("parse Ollama tags response")?;
        Ok(tags.models.into_iter().map(|tag| tag.name).collect())
    }

    /// POST to a streaming endpoint (`pull` or `create`).
    fn stream(
        &self,
        operation: &'static str,
        body: &impl Serialize,
    ) -> Result<ProgressStream<'_>> {
        let failure = format!("Ollama {operation} request failed");
        let response = self
            .http
            .post(self.url(operation))
            .json(body)
            .send()
            .map_err(|err| map_transport_error(&err, &failure))?;
        let response = ensure_success(response, &failure)?;
        Ok(Box::new(NdjsonProgress::new(BufReader::new(response), operation)))
    }
}

impl GenerationService for OllamaClient {
    fn check_connection(&self) -> Result<bool> {
        match self
            .http
            .get(self.url("tags"))
            .timeout(HEALTH_TIMEOUT)
            .send()
        {
            Ok(resp) if resp.status().is_success() => {
                debug!(host = %self.host, "Ollama health check passed");
                Ok(true)
            }
            Ok(resp) => {
                warn!(status = %resp.status(), "Ollama health check failed");
                Ok(false)
            }
            Err(err) => {
                warn!(error = %err, "Ollama unreachable");
                Ok(false)
            }
        }
    }

    fn model_exists(&self, name: &str) -> Result<bool> {
        let models = self.list_models()?;
        let found = models.iter().any(|candidate| same_model(candidate, name));
        debug!(model = name, found, installed = models.len(), "model lookup");
        Ok(found)
    }

    #[instrument(skip(self))]
    fn pull_model(&self, name: &str) -> Result<ProgressStream<'_>> {
        info!("pulling model");
        self.stream(
            "pull",
            &PullRequest {
                model: name,
                stream: true,
            },
        )
    }

    #[instrument(skip_all, fields(model = %definition.name, from = %definition.from))]
    fn create_model(&self, definition: &ModelDefinition) -> Result<ProgressStream<'_>> {
        info!("creating model");
        self.stream(
            "create",
            &CreateRequest {
                model: &definition.name,
                from: &definition.from,
                system: &definition.system,
                parameters: &definition.parameters,
                stream: true,
            },
        )
    }

    #[instrument(skip(self))]
    fn delete_model(&self, name: &str) -> Result<()> {
        let response = self
            .http
            .delete(self.url("delete"))
            .json(&DeleteRequest { model: name })
            .timeout(self.request_timeout)
            .send()
            .map_err(|err| map_transport_error(&err, "Failed to delete model"))?;
        ensure_success(response, "Failed to delete model")?;
        debug!("model deleted");
        Ok(())
    }

    #[instrument(skip_all, fields(model = %options.model, prompt_bytes = prompt.len()))]
    fn generate(&self, prompt: &str, options: &GenerationOptions) -> Result<String> {
        let request = GenerateRequest {
            model: &options.model,
            prompt,
            stream: false,
            options: GenerateOptions {
                temperature: options.temperature,
                num_ctx: options.num_ctx,
            },
            keep_alive: options.keep_alive,
        };
        let response = self
            .http
            .post(self.url("generate"))
            .json(&request)
            .timeout(self.request_timeout)
            .send()
            .map_err(|err| map_transport_error(&err, "Failed to generate text"))?;
        let reply: GenerateResponse = ensure_success(response, "Failed to generate text")?
            .json()
            .context("parse Ollama generate response")?;
        debug!(reply_bytes = reply.response.len(), "generation finished");
        Ok(reply.response)
    }
}

/// Compare model names, treating an untagged name as `:latest`.
fn same_model(a: &str, b: &str) -> bool {
    with_tag(a) == with_tag(b)
}

fn with_tag(name: &str) -> String {
    let last_segment = name.rsplit('/').next().unwrap_or(name);
    if last_segment.contains(':') {
        name.to_string()
    } else {
        format!("{name}:latest")
    }
}

fn map_transport_error(err: &reqwest::Error, failure: &str) -> anyhow::Error {
    if err.is_timeout() {
        return DevaiError::service(
            "Ollama request timeout",
            "Check Ollama status and network connectivity",
        )
        .into();
    }
    if err.is_connect() {
        return DevaiError::service("Ollama daemon not running", "Start Ollama: ollama serve")
            .into();
    }
    anyhow!("{failure}: {err}")
}

fn ensure_success(response: Response, failure: &str) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().unwrap_or_default();
    warn!(%status, body = %body.trim(), "Ollama returned an error status");
    if status == StatusCode::NOT_FOUND {
        return Err(DevaiError::user(
            "Model not found",
            "Run `devai-cli setup` to provision the model",
        )
        .into());
    }
    Err(DevaiError::service(
        failure,
        format!("Ollama returned {status}: {}", error_text(&body)),
    )
    .into())
}

fn error_text(body: &str) -> String {
    #[derive(Deserialize)]
    struct ErrorBody {
        error: String,
    }
    serde_json::from_str::<ErrorBody>(body)
        .map(|parsed| parsed.error)
        .unwrap_or_else(|_| body.trim().to_string())
}

#[derive(Deserialize)]
struct StreamLine {
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    completed: Option<u64>,
    #[serde(default)]
    total: Option<u64>,
}

/// Progress events read from a newline-delimited JSON body.
///
/// The `success` status is the completion marker. An `error` line, malformed
/// JSON, or end of input before `success` each yield one `Err` and stop.
pub struct NdjsonProgress<R> {
    lines: Lines<R>,
    operation: &'static str,
    finished: bool,
}

impl<R: BufRead> NdjsonProgress<R> {
    pub fn new(reader: R, operation: &'static str) -> Self {
        Self {
            lines: reader.lines(),
            operation,
            finished: false,
        }
    }

    fn fail(&mut self, err: anyhow::Error) -> Option<Result<ProgressEvent>> {
        self.finished = true;
        Some(Err(err))
    }
}

impl<R: BufRead> Iterator for NdjsonProgress<R> {
    type Item = Result<ProgressEvent>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }
        loop {
            let line = match self.lines.next() {
                None => {
                    let op = self.operation;
                    return self.fail(anyhow!("{op} stream ended before completion"));
                }
                Some(Err(err)) => {
                    let op = self.operation;
                    return self.fail(anyhow::Error::new(err).context(format!("read {op} stream")));
                }
                Some(Ok(line)) => line,
            };
            if line.trim().is_empty() {
                continue;
            }

            let parsed: StreamLine = match serde_json::from_str(&line) {
                Ok(parsed) => parsed,
                Err(err) => {
                    let op = self.operation;
                    return self.fail(
                        anyhow::Error::new(err).context(format!("parse {op} progress line")),
                    );
                }
            };
            if let Some(message) = parsed.error {
                let op = self.operation;
                return self.fail(anyhow!("{op} failed: {message}"));
            }

            let event = ProgressEvent {
                status: parsed.status.unwrap_or_default(),
                current: parsed.completed,
                total: parsed.total,
            };
            if event.status == "success" {
                self.finished = true;
            }
            return Some(Ok(event));
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::*;
    use crate::error::domain_error;

    fn collect(body: &str) -> Vec<Result<ProgressEvent>> {
        NdjsonProgress::new(Cursor::new(body.to_string()), "pull").collect()
    }

    #[test]
    fn reads_events_in_order_until_success() {
        let body = concat!(
            "{\"status\":\"pulling manifest\"}\n",
            "{\"status\":\"downloading\",\"digest\":\"sha256:abc\",\"total\":200,\"completed\":50}\n",
            "\n",
            "{\"status\":\"verifying sha256 digest\"}\n",
            "{\"status\":\"success\"}\n",
            "{\"status\":\"ignored after success\"}\n",
        );
        let events: Vec<ProgressEvent> = collect(body)
            .into_iter()
            .map(|event| event.expect("event"))
            .collect();
        assert_eq!(
            events.iter().map(|e| e.status.as_str()).collect::<Vec<_>>(),
            vec!["pulling manifest", "downloading", "verifying sha256 digest", "success"]
        );
        assert_eq!(events[1].current, Some(50));
        assert_eq!(events[1].total, Some(200));
    }

    #[test]
    fn error_line_ends_stream_with_error() {
        let body = concat!(
            "{\"status\":\"pulling manifest\"}\n",
            "{\"error\":\"pull model manifest: file does not exist\"}\n",
            "{\"status\":\"success\"}\n",
        );
        let items = collect(body);
        assert_eq!(items.len(), 2);
        let err = items[1].as_ref().expect_err("error item");
        assert!(err.to_string().contains("file does not exist"));
    }

    #[test]
    fn truncated_stream_is_an_error() {
        let items = collect("{\"status\":\"downloading\"}\n");
        assert_eq!(items.len(), 2);
        let err = items[1].as_ref().expect_err("error item");
        assert!(err.to_string().contains("ended before completion"));
        assert!(domain_error(err).is_none());
    }

    #[test]
    fn malformed_line_is_an_error() {
        let items = collect("not json\n");
        assert_eq!(items.len(), 1);
        assert!(items[0].is_err());
    }

    #[test]
    fn untagged_names_match_latest() {
        assert!(same_model("devai-cli-commit:latest", "devai-cli-commit"));
        assert!(same_model("qwen2.5-coder:1.5b", "qwen2.5-coder:1.5b"));
        assert!(!same_model("qwen2.5-coder:7b", "qwen2.5-coder:1.5b"));
        assert!(same_model(
            "registry.local:5000/team/model",
            "registry.local:5000/team/model:latest"
        ));
    }

    #[test]
    fn generate_request_body_matches_api() {
        let request = GenerateRequest {
            model: "devai-cli-commit:latest",
            prompt: "p",
            stream: false,
            options: GenerateOptions {
                temperature: Some(0.3),
                num_ctx: Some(10_000),
            },
            keep_alive: None,
        };
        let json = serde_json::to_value(&request).expect("serialize");
        assert_eq!(
            json,
            serde_json::json!({
                "model": "devai-cli-commit:latest",
                "prompt": "p",
                "stream": false,
                "options": { "temperature": 0.3f32, "num_ctx": 10000 }
            })
        );
    }

    #[test]
    fn create_request_carries_base_and_system_prompt() {
        let parameters = ModelParameters {
            temperature: 0.2,
            num_ctx: 131_072,
        };
        let request = CreateRequest {
            model: "custom:latest",
            from: "base:1b",
            system: "be terse",
            parameters: &parameters,
            stream: true,
        };
        let json = serde_json::to_value(&request).expect("serialize");
        assert_eq!(json["from"], "base:1b");
        assert_eq!(json["system"], "be terse");
        assert_eq!(json["parameters"]["num_ctx"], 131_072);
        assert_eq!(json["stream"], true);
    }

    #[test]
    fn error_text_prefers_json_error_field() {
        assert_eq!(error_text("{\"error\":\"model is busy\"}"), "model is busy");
        assert_eq!(error_text(" plain text \n"), "plain text");
    }

    #[test]
    fn unreachable_daemon_reports_not_connected() {
        let client = OllamaClient::new("http://127.0.0.1:9", Duration::from_secs(2))
            .expect("client");
        assert!(!client.check_connection().expect("check"));
    }
}
