use clap::{Parser, ValueEnum};
use std::path::PathBuf;
use std::process::ExitCode;

use flowdeploy::api::ApiClient;
use flowdeploy::config::PipelineConfig;
use flowdeploy::logging::Logger;
use flowdeploy::pipeline::PipelineRunner;
use flowdeploy::Error;

const VERSION: &str = env!("CARGO_PKG_VERSION");

#[derive(Parser)]
#[command(name = "flowdeploy")]
#[command(version = VERSION)]
#[command(about = "Validate, test, and deploy telephony scripts through the script-management API")]
struct Cli {
    /// Path to the YAML configuration file
    #[arg(long)]
    config: PathBuf,
    /// Path to the script file
    #[arg(long)]
    script: PathBuf,
    /// Target environment
    #[arg(long, value_enum)]
    environment: Environment,
    /// Skip the test stage
    #[arg(long)]
    skip_tests: bool,
    /// Mirror log output to a file
    #[arg(long)]
    log_file: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Environment {
    Dev,
    Staging,
    Prod,
}

impl Environment {
    fn as_str(&self) -> &'static str {
        match self {
            Environment::Dev => "dev",
            Environment::Staging => "staging",
            Environment::Prod => "prod",
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(&cli) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(err) => {
            report_fatal(&err);
            ExitCode::FAILURE
        }
    }
}

/// Constructs the pipeline and runs it. Only configuration errors reach
/// this boundary; stage failures come back as `Ok(false)`.
fn run(cli: &Cli) -> flowdeploy::Result<bool> {
    let logger = match &cli.log_file {
        Some(path) => Logger::with_file(path)?,
        None => Logger::to_stderr(),
    };

    let config = PipelineConfig::load(&cli.config)?;
    let api_key = config.resolve_api_key()?;
    let client = ApiClient::new(&config.api_base_url, &api_key);

    let mut runner = PipelineRunner::new(config, &client, logger);
    Ok(runner.run_pipeline(&cli.script, cli.environment.as_str(), cli.skip_tests))
}

fn report_fatal(err: &Error) {
    eprintln!("flowdeploy: {} ({})", err, err.code.as_str());
    for hint in &err.hints {
        eprintln!("  hint: {}", hint.message);
    }
}
