//! Rule-table intention detector.

use std::sync::LazyLock;

use fintec_core::DayKey;
use serde_json::{json, Value};
use tracing::debug;

use crate::config::AssistantConfig;
use crate::confirm::ActionConfirmer;
use crate::extract::{self, Amount};
use crate::intent::{ActionType, DetectedIntention, IntentionType, Parameters};
use crate::lexicon::{Signal, SignalSet, Vocabulary};
use crate::rules::RuleSet;
use crate::text::Message;

const DEFAULT_CURRENCY: &str = "USD";

/// Turns a chat message into a [`DetectedIntention`].
///
/// Detection never fails: input that matches no rule comes back as `UNKNOWN` with the
/// low confidence configured in [`RuleSet`].
#[derive(Debug, Clone)]
pub struct IntentionDetector {
    vocabulary: Vocabulary,
    rules: RuleSet,
    confirmer: ActionConfirmer,
}

impl Default for IntentionDetector {
    fn default() -> Self {
        Self::new(AssistantConfig::default())
    }
}

impl IntentionDetector {
    pub fn new(config: AssistantConfig) -> Self {
        Self {
            vocabulary: Vocabulary::new(&config.lexicon),
            rules: config.rules,
            confirmer: ActionConfirmer::new(config.confirmation),
        }
    }

    pub fn confirmer(&self) -> &ActionConfirmer {
        &self.confirmer
    }

    /// Detect against today's date in Caracas.
    pub fn detect(&self, message: &str) -> DetectedIntention {
        self.detect_on(message, DayKey::caracas_today())
    }

    /// Detect with relative dates ("ayer", "mes pasado") resolved against `today`.
    pub fn detect_on(&self, message: &str, today: DayKey) -> DetectedIntention {
        let message = Message::new(message);
        let signals = self.vocabulary.signals(&message);

        let intention = if self.is_action(&signals) {
            self.detect_action(&message, &signals, today)
        } else {
            self.detect_query(&message, &signals, today)
        };
        debug!(
            kind = ?intention.kind,
            action = %intention.action_type,
            confidence = intention.confidence,
            "intention detected"
        );
        intention
    }

    fn is_action(&self, signals: &SignalSet) -> bool {
        let has = |signal| signals.contains(&signal);
        let listing = has(Signal::Listing);
        let command = has(Signal::Command) || has(Signal::ActionVerb);

        if has(Signal::Query) || listing {
            // "hazme la lista" asks for data; "crear" without a listing word acts.
            return has(Signal::Create) && !listing;
        }
        has(Signal::Create) || has(Signal::Update) || command || has(Signal::Transfer)
    }

    fn detect_action(
        &self,
        message: &Message<'_>,
        signals: &SignalSet,
        today: DayKey,
    ) -> DetectedIntention {
        let (action, confidence) = self.rules.classify_action(signals);
        let amount = extract::amount(message, &self.vocabulary);
        let mut parameters = Parameters::new();
        let mut missing = Vec::new();

        match action {
            ActionType::CreateTransaction => {
                insert_amount(&mut parameters, &mut missing, "amount", amount.as_ref());
                match extract::description(message, &self.vocabulary) {
                    Some(description) => insert(&mut parameters, "description", description),
                    None => missing.push("description"),
                }
                if let Some(date) = extract::date(signals, today) {
                    insert(&mut parameters, "date", date.to_string());
                }
                let kind = if signals.contains(&Signal::Income) && !signals.contains(&Signal::Expense)
                {
                    "INCOME"
                } else {
                    "EXPENSE"
                };
                insert(&mut parameters, "type", kind);
            }
            ActionType::CreateBudget | ActionType::UpdateBudget => {
                insert_amount(&mut parameters, &mut missing, "amount", amount.as_ref());
                match self.vocabulary.category_in(message) {
                    Some(category) => insert(&mut parameters, "category", category),
                    None => missing.push("category"),
                }
            }
            ActionType::CreateGoal | ActionType::UpdateGoal => {
                insert_amount(&mut parameters, &mut missing, "target", amount.as_ref());
                if let Some(name) = extract::goal_name(message) {
                    insert(&mut parameters, "name", name);
                }
            }
            ActionType::CreateAccount => {
                match extract::account_name(message) {
                    Some(name) => insert(&mut parameters, "name", name),
                    None => missing.push("name"),
                }
                match self.vocabulary.account_kind_in(message) {
                    Some(kind) => insert(&mut parameters, "type", kind.as_str()),
                    None => missing.push("type"),
                }
                let currency = amount
                    .as_ref()
                    .and_then(|amount| amount.currency.clone())
                    .or_else(|| self.vocabulary.currency_in(message));
                match currency {
                    Some(currency) => insert(&mut parameters, "currency", currency),
                    None => missing.push("currency"),
                }
                if let Some(amount) = &amount {
                    insert(&mut parameters, "initialBalance", amount.value);
                }
            }
            ActionType::CreateTransfer => {
                insert_amount(&mut parameters, &mut missing, "amount", amount.as_ref());
                // Account names need conversational context the detector does not have.
                missing.extend(["fromAccount", "toAccount"]);
            }
            _ => {}
        }

        let requires_confirmation = self
            .confirmer
            .requires_confirmation(action, &parameters)
            .required;

        DetectedIntention {
            kind: IntentionType::Action,
            action_type: action,
            confidence,
            parameters,
            requires_confirmation,
            missing_parameters: missing.into_iter().map(str::to_owned).collect(),
        }
    }

    fn detect_query(
        &self,
        message: &Message<'_>,
        signals: &SignalSet,
        today: DayKey,
    ) -> DetectedIntention {
        let (action, confidence) = self.rules.classify_query(signals);

        DetectedIntention {
            kind: IntentionType::Query,
            action_type: action,
            confidence,
            parameters: self.query_parameters(message, signals, today),
            requires_confirmation: false,
            missing_parameters: Vec::new(),
        }
    }

    fn query_parameters(
        &self,
        message: &Message<'_>,
        signals: &SignalSet,
        today: DayKey,
    ) -> Parameters {
        let mut parameters = Parameters::new();

        if let Some(limit) = extract::limit(message) {
            insert(&mut parameters, "limit", limit);
        }
        let range = extract::date_range(message, today)
            .or_else(|| extract::date(signals, today).map(|day| (day, day)));
        if let Some((from, to)) = range {
            insert(&mut parameters, "dateFrom", from.to_string());
            insert(&mut parameters, "dateTo", to.to_string());
        }
        if let Some(category) = self.vocabulary.category_in(message) {
            insert(&mut parameters, "category", category);
        }
        if signals.contains(&Signal::Expense) {
            insert(&mut parameters, "transactionType", "EXPENSE");
        } else if signals.contains(&Signal::Income) {
            insert(&mut parameters, "transactionType", "INCOME");
        }
        if let Some(currency) = self.vocabulary.currency_in(message) {
            insert(&mut parameters, "currency", currency);
        }
        let (min, max) = extract::amount_range(message);
        if let Some(min) = min {
            insert(&mut parameters, "amountMin", min);
        }
        if let Some(max) = max {
            insert(&mut parameters, "amountMax", max);
        }

        parameters
    }
}

fn insert(parameters: &mut Parameters, name: &str, value: impl Into<Value>) {
    parameters.insert(name.to_owned(), value.into());
}

fn insert_amount(
    parameters: &mut Parameters,
    missing: &mut Vec<&'static str>,
    name: &'static str,
    amount: Option<&Amount>,
) {
    match amount {
        Some(amount) => {
            insert(parameters, name, amount.value);
            let currency = amount.currency.as_deref().unwrap_or(DEFAULT_CURRENCY);
            parameters.insert(String::from("currency"), json!(currency));
        }
        None => missing.push(name),
    }
}

static DEFAULT_DETECTOR: LazyLock<IntentionDetector> = LazyLock::new(IntentionDetector::default);

/// [`IntentionDetector::detect`] with the built-in lexicon.
pub fn detect_intention(message: &str) -> DetectedIntention {
    DEFAULT_DETECTOR.detect(message)
}
