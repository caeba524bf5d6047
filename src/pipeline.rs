//! Deployment pipeline orchestration.
//!
//! Three stages run in strict order: validate, test, deploy. Each stage
//! reports pass/fail; the first failure short-circuits the run. Remote
//! and IO failures are absorbed into the stage result and logged, never
//! propagated — only configuration errors abort before the first stage.

use crate::api::{DeployRequest, ScriptService};
use crate::config::PipelineConfig;
use crate::error::Error;
use crate::logging::Logger;
use crate::script::{self, Script};
use chrono::Local;
use serde_json::Value;
use std::path::Path;

/// Pipeline progress. `Deployed` and `Failed` are terminal; a stage
/// failure moves straight to `Failed` with no further stages attempted.
/// `Tested` is only reached when the test stage actually ran.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineState {
    NotStarted,
    Validated,
    Tested,
    Deployed,
    Failed,
}

impl PipelineState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, PipelineState::Deployed | PipelineState::Failed)
    }
}

pub struct PipelineRunner<'a> {
    config: PipelineConfig,
    service: &'a dyn ScriptService,
    logger: Logger,
    state: PipelineState,
}

impl<'a> PipelineRunner<'a> {
    pub fn new(config: PipelineConfig, service: &'a dyn ScriptService, logger: Logger) -> Self {
        Self {
            config,
            service,
            logger,
            state: PipelineState::NotStarted,
        }
    }

    pub fn state(&self) -> PipelineState {
        self.state
    }

    /// Sends the script to the validation endpoint. Invalid scripts get
    /// each diagnostic logged with its line number; IO and network
    /// failures also yield `false`.
    pub fn validate(&self, script_path: &Path) -> bool {
        self.logger
            .info("validate", format!("Validating script: {}", script_path.display()));

        let script = match Script::load(script_path) {
            Ok(script) => script,
            Err(e) => {
                self.log_stage_error("validate", "Script validation failed", &e);
                return false;
            }
        };

        match self.service.validate_script(&script.content) {
            Ok(outcome) if outcome.valid => {
                self.logger.info(
                    "validate",
                    format!("Script validation successful: {}", script_path.display()),
                );
                true
            }
            Ok(outcome) => {
                for error in &outcome.errors {
                    match error.line {
                        Some(line) => self.logger.error(
                            "validate",
                            format!("Validation error: {} at line {}", error.message, line),
                        ),
                        None => self
                            .logger
                            .error("validate", format!("Validation error: {}", error.message)),
                    }
                }
                false
            }
            Err(e) => {
                self.log_stage_error("validate", "Script validation failed", &e);
                false
            }
        }
    }

    /// Submits the test-suite document wholesale and passes only when
    /// every reported test passed.
    pub fn run_tests(&self, test_suite_path: &Path) -> bool {
        self.logger.info(
            "test",
            format!("Running test suite: {}", test_suite_path.display()),
        );

        let suite = match load_test_suite(test_suite_path) {
            Ok(suite) => suite,
            Err(e) => {
                self.log_stage_error("test", "Test execution failed", &e);
                return false;
            }
        };

        match self.service.run_tests(&suite) {
            Ok(report) => {
                self.logger.info(
                    "test",
                    format!("Tests completed: {}/{} passed", report.passed, report.total),
                );

                for failure in &report.failures {
                    self.logger.error(
                        "test",
                        format!("Test failure: {} - {}", failure.name, failure.message),
                    );
                }

                report.passed == report.total
            }
            Err(e) => {
                self.log_stage_error("test", "Test execution failed", &e);
                false
            }
        }
    }

    /// Deploys the script to the named environment. An environment
    /// missing from the configuration fails fast with no remote call.
    pub fn deploy(&self, script_path: &Path, environment: &str) -> bool {
        self.logger.info(
            "deploy",
            format!("Deploying script to {}: {}", environment, script_path.display()),
        );

        let env_config = match self.config.environment(environment) {
            Some(env_config) => env_config,
            None => {
                self.logger.error(
                    "deploy",
                    format!("Environment configuration not found for: {}", environment),
                );
                return false;
            }
        };

        let script = match Script::load(script_path) {
            Ok(script) => script,
            Err(e) => {
                self.log_stage_error("deploy", "Deployment failed", &e);
                return false;
            }
        };

        let request = DeployRequest {
            script_content: script.content,
            environment: environment.to_string(),
            business_unit_id: env_config.business_unit_id.clone(),
            script_name: script.name,
            description: format!("Deployed by pipeline on {}", Local::now().to_rfc3339()),
        };

        match self.service.deploy_script(&request) {
            Ok(outcome) => match outcome.deployment_id {
                Some(id) => {
                    self.logger
                        .info("deploy", format!("Deployment successful. Deployment ID: {}", id));
                    true
                }
                None => {
                    self.logger.error(
                        "deploy",
                        format!(
                            "Deployment failed: {}",
                            outcome.message.as_deref().unwrap_or("Unknown error")
                        ),
                    );
                    false
                }
            },
            Err(e) => {
                self.log_stage_error("deploy", "Deployment failed", &e);
                false
            }
        }
    }

    /// Runs validate, test, deploy in order, stopping at the first
    /// failing stage. The test stage is skipped with a warning when
    /// `skip_tests` is set or no conventional suite file exists.
    pub fn run_pipeline(&mut self, script_path: &Path, environment: &str, skip_tests: bool) -> bool {
        self.logger.info(
            "pipeline",
            format!(
                "Starting deployment pipeline for {} to {}",
                script_path.display(),
                environment
            ),
        );
        self.state = PipelineState::NotStarted;

        if !self.validate(script_path) {
            self.logger.error("pipeline", "Pipeline failed at validation stage");
            self.state = PipelineState::Failed;
            return false;
        }
        self.state = PipelineState::Validated;

        if skip_tests {
            self.logger.info("pipeline", "Skipping tests (--skip-tests)");
        } else {
            let test_suite_path = script::conventional_test_suite_path(script_path);

            if test_suite_path.exists() {
                if !self.run_tests(&test_suite_path) {
                    self.logger.error("pipeline", "Pipeline failed at testing stage");
                    self.state = PipelineState::Failed;
                    return false;
                }
                self.state = PipelineState::Tested;
            } else {
                self.logger.warn(
                    "pipeline",
                    format!(
                        "No test suite found at {}, skipping tests",
                        test_suite_path.display()
                    ),
                );
            }
        }

        if !self.deploy(script_path, environment) {
            self.logger.error("pipeline", "Pipeline failed at deployment stage");
            self.state = PipelineState::Failed;
            return false;
        }
        self.state = PipelineState::Deployed;

        self.logger.info(
            "pipeline",
            format!(
                "Pipeline completed successfully for {} to {}",
                script_path.display(),
                environment
            ),
        );
        true
    }

    /// Logs a stage error, including response status and body when the
    /// error carries them.
    fn log_stage_error(&self, stage: &str, context: &str, err: &Error) {
        self.logger.error(stage, format!("{}: {}", context, err));

        if let Some(status) = err.details.get("status") {
            self.logger.error(stage, format!("Response status: {}", status));
        }
        if let Some(body) = err.details.get("body").and_then(Value::as_str) {
            self.logger.error(stage, format!("Response body: {}", body));
        }
    }
}

/// Reads a YAML test-suite document into the JSON value submitted to
/// the service, unmodified.
fn load_test_suite(path: &Path) -> crate::error::Result<Value> {
    let raw = std::fs::read_to_string(path).map_err(|e| {
        Error::internal_io(
            e.to_string(),
            Some(format!("read test suite {}", path.display())),
        )
    })?;

    serde_yml::from_str(&raw).map_err(|e| Error::suite_invalid_yaml(path.display().to_string(), e))
}
