//! # fintec-assistant
//!
//! Rule-based natural-language front end for the fintec chat assistant.
//!
//! ## Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`detector`] | Action/query classification and parameter extraction |
//! | [`confirm`] | Confirmation decision table, parameter validation, reply classification |
//! | [`correction`] | Follow-up corrections of a previous query |
//! | [`lexicon`] | Keyword groups and alias tables |
//! | [`rules`] | Ordered action and query rules |
//! | [`config`] | JSON/YAML loading of the tables above |
//!
//! ## Quick Start
//!
//! ```rust
//! use fintec_assistant::{classify_response, detect_intention, ActionType, ReplyClass};
//!
//! let intention = detect_intention("transferir 200 euros");
//! assert_eq!(intention.action_type, ActionType::CreateTransfer);
//! assert!(intention.requires_confirmation);
//!
//! assert_eq!(classify_response("sí, adelante"), ReplyClass::Confirmed);
//! ```
//!
//! The pipeline is stateless: each message is classified on its own, and multi-turn slot
//! filling is left to the caller, which can merge `missing_parameters` answers itself.

pub mod config;
pub mod confirm;
pub mod correction;
pub mod detector;
pub mod intent;
pub mod lexicon;
pub mod rules;
mod extract;
mod text;

pub use config::{AssistantConfig, LexiconError};
pub use confirm::{
    classify_response, confirmation_message, is_confirmation_response, is_rejection_response,
    missing_parameters_message, requires_confirmation, validate_action_parameters,
    ActionConfirmer, ConfirmationPolicy, ConfirmationRequirement, ReplyClass, ValidationReport,
};
pub use correction::{detect_correction, DetectedCorrection};
pub use detector::{detect_intention, IntentionDetector};
pub use intent::{ActionType, DetectedIntention, IntentionType, Parameters, UnknownActionType};
pub use lexicon::{AccountKind, Lexicon, Signal};
pub use rules::{Rule, RuleSet};
pub use text::fold;
