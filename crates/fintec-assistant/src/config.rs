//! Loading assistant tables from JSON or YAML.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::confirm::ConfirmationPolicy;
use crate::intent::ActionType;
use crate::lexicon::Lexicon;
use crate::rules::RuleSet;

#[derive(Debug, Error)]
pub enum LexiconError {
    #[error("failed to read lexicon {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid JSON lexicon: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid YAML lexicon: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("unsupported lexicon format {} (expected .json, .yaml or .yml)", path.display())]
    UnsupportedFormat { path: PathBuf },

    #[error("rule for {action} has confidence {value} outside [0, 1]")]
    InvalidConfidence { action: ActionType, value: f64 },

    #[error("query rule maps to non-query action {action}")]
    NonQueryRule { action: ActionType },

    #[error("confirmation threshold '{name}' must be finite and non-negative, got {value}")]
    InvalidThreshold { name: &'static str, value: f64 },
}

/// Lexicon, rule tables and confirmation policy in one document.
///
/// ```yaml
/// lexicon:
///   keywords:
///     create: [crear, montar]
/// rules:
///   unknown_query_confidence: 0.5
/// confirmation:
///   usd_transaction_threshold: 250
/// ```
///
/// Sections and keyword groups left out keep their built-in values.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AssistantConfig {
    pub lexicon: Lexicon,
    pub rules: RuleSet,
    pub confirmation: ConfirmationPolicy,
}

impl AssistantConfig {
    pub fn from_json_str(input: &str) -> Result<Self, LexiconError> {
        serde_json::from_str::<Self>(input)?.validated()
    }

    pub fn from_yaml_str(input: &str) -> Result<Self, LexiconError> {
        serde_yaml::from_str::<Self>(input)?.validated()
    }

    /// Load by file extension.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, LexiconError> {
        let path = path.as_ref();
        let extension = path
            .extension()
            .and_then(|extension| extension.to_str())
            .map(str::to_ascii_lowercase);
        let read = || {
            fs::read_to_string(path).map_err(|source| LexiconError::Io {
                path: path.to_path_buf(),
                source,
            })
        };

        match extension.as_deref() {
            Some("json") => Self::from_json_str(&read()?),
            Some("yaml" | "yml") => Self::from_yaml_str(&read()?),
            _ => Err(LexiconError::UnsupportedFormat {
                path: path.to_path_buf(),
            }),
        }
    }

    fn validated(mut self) -> Result<Self, LexiconError> {
        self.lexicon = self.lexicon.merged_with(Lexicon::default());

        for rule in self.rules.actions.iter().chain(&self.rules.queries) {
            if !(0.0..=1.0).contains(&rule.confidence) {
                return Err(LexiconError::InvalidConfidence {
                    action: rule.action,
                    value: rule.confidence,
                });
            }
        }
        if let Some(rule) = self
            .rules
            .queries
            .iter()
            .find(|rule| !rule.action.is_query() && rule.action != ActionType::Unknown)
        {
            return Err(LexiconError::NonQueryRule {
                action: rule.action,
            });
        }
        for value in [
            self.rules.unknown_action_confidence,
            self.rules.unknown_query_confidence,
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(LexiconError::InvalidConfidence {
                    action: ActionType::Unknown,
                    value,
                });
            }
        }
        self.confirmation.validate()?;

        Ok(self)
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;
    use crate::lexicon::Signal;

    #[test]
    fn partial_yaml_keeps_defaults() {
        let config = AssistantConfig::from_yaml_str(
            "lexicon:\n  keywords:\n    create: [montar]\nconfirmation:\n  usd_transaction_threshold: 250\n",
        )
        .expect("valid yaml");

        assert_eq!(config.lexicon.keywords[&Signal::Create], vec![String::from("montar")]);
        assert!(!config.lexicon.keywords[&Signal::Transfer].is_empty());
        assert_eq!(config.confirmation.usd_transaction_threshold, 250.0);
        assert_eq!(config.confirmation.other_transaction_threshold, 1_000.0);
        assert_eq!(config.rules, RuleSet::default());
    }

    #[test]
    fn rejects_query_rules_that_point_at_actions() {
        let error = AssistantConfig::from_json_str(
            r#"{"rules":{"queries":[{"action":"CREATE_TRANSFER","any_of":["transfer"],"confidence":0.5}]}}"#,
        )
        .expect_err("must reject");

        assert!(matches!(
            error,
            LexiconError::NonQueryRule {
                action: ActionType::CreateTransfer
            }
        ));
    }

    #[test]
    fn rejects_out_of_range_confidence() {
        let error = AssistantConfig::from_json_str(
            r#"{"rules":{"actions":[{"action":"CREATE_GOAL","all_of":["goal"],"confidence":1.5}]}}"#,
        )
        .expect_err("must reject");

        assert!(matches!(error, LexiconError::InvalidConfidence { .. }));
    }

    #[test]
    fn loads_files_by_extension() {
        let dir = tempfile::tempdir().expect("tempdir");
        let json_path = dir.path().join("lexicon.json");
        let mut file = std::fs::File::create(&json_path).expect("create");
        file.write_all(br#"{"confirmation":{"account_initial_balance_threshold":5000}}"#)
            .expect("write");

        let config = AssistantConfig::from_path(&json_path).expect("load json");
        assert_eq!(config.confirmation.account_initial_balance_threshold, 5_000.0);

        let unsupported = AssistantConfig::from_path(dir.path().join("lexicon.toml"));
        assert!(matches!(unsupported, Err(LexiconError::UnsupportedFormat { .. })));

        let missing = AssistantConfig::from_path(dir.path().join("missing.yaml"));
        assert!(matches!(missing, Err(LexiconError::Io { .. })));
    }
}
