//! Environment provisioning for `devai-cli setup`.
//!
//! Three idempotent stages, each safe to re-run:
//! 1. the Ollama daemon answers,
//! 2. the base model is present (pulled if missing),
//! 3. the custom commit model is (re)created from the current configuration.
//!
//! Stream progress is forwarded to the caller one event at a time, in the
//! order the service produced it.

use anyhow::Result;
use tracing::{debug, info, instrument};

use crate::core::types::{BaseModelResult, CustomModelResult, ProgressEvent, SetupStage};
use crate::error::{DevaiError, domain_error, into_domain_error};
use crate::io::config::ModelConfig;
use crate::io::ollama::{GenerationService, ProgressStream};
use crate::io::terminal::SetupUi;

/// Summary of a completed setup run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SetupReport {
    pub base_model: BaseModelResult,
    pub custom_model: CustomModelResult,
}

/// Runs the provisioning stages against a [`GenerationService`].
pub struct Provisioner<'a, S: ?Sized> {
    service: &'a S,
    config: &'a ModelConfig,
}

impl<'a, S: GenerationService + ?Sized> Provisioner<'a, S> {
    pub fn new(service: &'a S, config: &'a ModelConfig) -> Self {
        Self { service, config }
    }

    /// Stage 1: fail unless the daemon answers.
    pub fn check_daemon(&self) -> Result<()> {
        let connected = self.service.check_connection().map_err(|err| {
            wrap_unless_service(err, || {
                DevaiError::service("Failed to check daemon status", "Start Ollama: ollama serve")
            })
        })?;
        if !connected {
            return Err(DevaiError::service(
                "Ollama daemon is not running or accessible",
                "Start Ollama: ollama serve\n\nOr install from: https://ollama.com/download",
            )
            .into());
        }
        Ok(())
    }

    /// Stage 2: make sure the base model is available, pulling it if needed.
    #[instrument(skip_all, fields(model = %self.config.base_model))]
    pub fn ensure_base_model(
        &self,
        mut on_progress: impl FnMut(&ProgressEvent),
    ) -> Result<BaseModelResult> {
        let base = &self.config.base_model;
        let manual = || {
            DevaiError::service(
                format!("Failed to auto-pull '{base}'"),
                format!(
                    "Try manually: ollama pull {base}\n\nCheck network connection and Ollama daemon status."
                ),
            )
        };

        let exists = self.service.model_exists(base)?;
        if exists {
            debug!("base model already present");
            return Ok(BaseModelResult {
                existed: true,
                pulled: None,
            });
        }

        info!("base model missing, pulling");
        self.service
            .pull_model(base)
            .and_then(|stream| drain(stream, &mut on_progress))
            .map_err(|err| wrap_unless_service(err, manual))?;
        Ok(BaseModelResult {
            existed: false,
            pulled: Some(true),
        })
    }

    /// Stage 3: create the custom model, deleting any previous copy first.
    #[instrument(skip_all, fields(model = %self.config.name))]
    pub fn provision_custom_model(
        &self,
        mut on_progress: impl FnMut(&ProgressEvent),
    ) -> Result<CustomModelResult> {
        let name = &self.config.name;
        let failure = || {
            DevaiError::service(
                "Failed to provision custom model",
                "Check base model availability",
            )
        };

        let existed = self.service.model_exists(name)?;
        if existed {
            info!("custom model exists, recreating");
            self.service
                .delete_model(name)
                .map_err(|err| wrap_unless_service(err, failure))?;
        }

        let definition = self.config.definition();
        self.service
            .create_model(&definition)
            .and_then(|stream| drain(stream, &mut on_progress))
            .map_err(|err| wrap_unless_service(err, failure))?;
        Ok(CustomModelResult {
            existed,
            created: Some(true),
        })
    }

    /// Run every stage, reporting to `ui`. Stops at the first failure.
    pub fn run<U: SetupUi + ?Sized>(&self, ui: &mut U) -> Result<SetupReport, DevaiError> {
        ui.show_intro();

        let stage = SetupStage::Daemon;
        ui.on_stage_start(stage, "Checking Ollama daemon...");
        self.check_daemon()
            .map_err(|err| report_failure(ui, stage, err))?;
        ui.on_stage_success(stage, "Ollama daemon is running");

        let stage = SetupStage::BaseModel;
        let base = &self.config.base_model;
        ui.on_stage_start(stage, &format!("Checking base model ({base})..."));
        let base_model = self
            .ensure_base_model(|event| ui.on_progress(event))
            .map_err(|err| report_failure(ui, stage, err))?;
        let verb = if base_model.existed { "available" } else { "pulled" };
        ui.on_stage_success(stage, &format!("Base model '{base}' {verb}"));

        let stage = SetupStage::CustomModel;
        let name = &self.config.name;
        ui.on_stage_start(stage, &format!("Checking custom model ({name})..."));
        let custom_model = self
            .provision_custom_model(|event| ui.on_progress(event))
            .map_err(|err| report_failure(ui, stage, err))?;
        ui.on_stage_success(stage, &format!("Custom model '{name}' ready"));

        ui.show_outro(self.config);
        Ok(SetupReport {
            base_model,
            custom_model,
        })
    }
}

/// Consume a progress stream to completion, forwarding every event.
fn drain(stream: ProgressStream<'_>, on_progress: &mut impl FnMut(&ProgressEvent)) -> Result<()> {
    let mut events = 0usize;
    for event in stream {
        let event = event?;
        on_progress(&event);
        events += 1;
    }
    debug!(events, "progress stream finished");
    Ok(())
}

/// Keep service-availability errors as they are; wrap everything else.
fn wrap_unless_service(err: anyhow::Error, wrap: impl FnOnce() -> DevaiError) -> anyhow::Error {
    if domain_error(&err).is_some_and(DevaiError::is_service_unavailable) {
        return err;
    }
    debug!(error = %format!("{err:#}"), "wrapping provisioning failure");
    wrap().into()
}

fn report_failure<U: SetupUi + ?Sized>(
    ui: &mut U,
    stage: SetupStage,
    err: anyhow::Error,
) -> DevaiError {
    let domain = into_domain_error(err, |_| {
        DevaiError::service(
            format!("Failed during {stage} provisioning"),
            "Check configuration and try again",
        )
    });
    ui.on_stage_failure(stage, &domain);
    domain
}
