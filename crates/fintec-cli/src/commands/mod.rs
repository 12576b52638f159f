mod allocate;
mod compare;
mod convert;
mod format;
mod history;
mod intent;
mod rates;

use std::time::Duration;

use fintec_assistant::{AssistantConfig, IntentionDetector};
use fintec_core::{FallbackReason, RateProvenance, RateServices, RateServicesBuilder, RateSource};
use serde_json::Value;

use crate::cli::{Cli, Command};
use crate::error::CliError;

pub struct CommandResult {
    pub data: Value,
    pub warnings: Vec<String>,
}

impl CommandResult {
    pub fn ok(data: Value) -> Self {
        Self {
            data,
            warnings: Vec::new(),
        }
    }

    pub fn with_warning(mut self, warning: impl Into<String>) -> Self {
        self.warnings.push(warning.into());
        self
    }

    pub fn with_warnings(mut self, warnings: impl IntoIterator<Item = String>) -> Self {
        self.warnings.extend(warnings);
        self
    }
}

/// Upper bound on waiting for remote history writes before the process exits.
const MIRROR_FLUSH_TIMEOUT: Duration = Duration::from_secs(5);

pub async fn run(cli: &Cli) -> Result<CommandResult, CliError> {
    let services = cli.command.uses_rates().then(|| services(cli));
    let result = dispatch(cli, services.as_ref()).await;
    let Some(services) = services else {
        return result;
    };

    let abandoned = services.flush_mirror(MIRROR_FLUSH_TIMEOUT).await;
    result.map(|result| match abandoned {
        0 => result,
        count => result.with_warning(format!(
            "{count} remote history write(s) did not finish before exit"
        )),
    })
}

async fn dispatch(cli: &Cli, services: Option<&RateServices>) -> Result<CommandResult, CliError> {
    match (&cli.command, services) {
        (Command::Rates(args), Some(services)) => rates::run(args, services).await,
        (Command::History(args), Some(services)) => history::run(args, services).await,
        (Command::Trends(args), Some(services)) => history::trends(args, services).await,
        (Command::Compare, Some(services)) => compare::run(services).await,
        (Command::Convert(args), Some(services)) => convert::run(args, services).await,
        (Command::Format(args), services) => format::run(args, services).await,
        (Command::Allocate(args), _) => allocate::run(args),
        (Command::Intent(args), _) => intent::run(args, &detector(cli)?),
        (Command::Reply(args), _) => intent::reply(args, &detector(cli)?),
        (command, None) => Err(CliError::Command(format!(
            "`{}` needs the rate services",
            command.name()
        ))),
    }
}

fn services(cli: &Cli) -> RateServices {
    let builder = RateServicesBuilder::from_env();
    if cli.offline {
        builder.with_offline_mode().build()
    } else {
        builder.build()
    }
}

fn detector(cli: &Cli) -> Result<IntentionDetector, CliError> {
    let config = match &cli.lexicon {
        Some(path) => AssistantConfig::from_path(path)?,
        None => AssistantConfig::default(),
    };
    Ok(IntentionDetector::new(config))
}

/// Warning line for rates that did not come from a fresh live fetch.
fn fallback_warning(source: RateSource, provenance: &RateProvenance) -> Option<String> {
    let reason = match provenance.fallback_reason? {
        FallbackReason::Cache => "in-memory cache",
        FallbackReason::History => "local history",
        FallbackReason::Static => "static constants",
        FallbackReason::Upstream => "the rates API fallback",
    };
    let age = provenance
        .data_age
        .map(|seconds| format!(", {seconds}s old"))
        .unwrap_or_default();
    Some(format!("{source} rates served from {reason}{age}"))
}
