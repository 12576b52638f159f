//! Confirmation decisions, parameter validation and reply classification.

use std::sync::LazyLock;

use serde::{Deserialize, Serialize};

use crate::config::LexiconError;
use crate::intent::{ActionType, Parameters};
use crate::lexicon::AccountKind;
use crate::text::{Message, PhraseSet};

/// Thresholds and reply phrases used by [`ActionConfirmer`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConfirmationPolicy {
    /// USD transactions at or above this amount need confirmation.
    pub usd_transaction_threshold: f64,
    /// Same, for every other currency.
    pub other_transaction_threshold: f64,
    /// New accounts need confirmation above this opening balance.
    pub account_initial_balance_threshold: f64,
    /// Amounts above this produce a non-blocking warning.
    pub large_amount_warning: f64,
    pub confirm_phrases: Vec<String>,
    pub reject_phrases: Vec<String>,
}

impl Default for ConfirmationPolicy {
    fn default() -> Self {
        let phrases = |entries: &[&str]| entries.iter().map(|entry| (*entry).to_owned()).collect();

        Self {
            usd_transaction_threshold: 100.0,
            other_transaction_threshold: 1_000.0,
            account_initial_balance_threshold: 1_000.0,
            large_amount_warning: 1_000_000.0,
            confirm_phrases: phrases(&[
                "sí", "yes", "ok", "okay", "confirmo", "confirmar", "correcto", "correct",
                "de acuerdo", "está bien", "adelante", "procede", "hazlo", "hacerlo",
                "ejecuta", "ejecutar", "claro", "por supuesto", "seguro", "vamos",
            ]),
            reject_phrases: phrases(&[
                "no", "nope", "cancelar", "cancela", "cancel", "mejor no", "no gracias",
                "no quiero", "no lo hagas", "no confirmo", "espera", "wait", "detente",
                "stop", "no ahora",
            ]),
        }
    }
}

impl ConfirmationPolicy {
    pub(crate) fn validate(&self) -> Result<(), LexiconError> {
        for (name, value) in [
            ("usd_transaction_threshold", self.usd_transaction_threshold),
            ("other_transaction_threshold", self.other_transaction_threshold),
            (
                "account_initial_balance_threshold",
                self.account_initial_balance_threshold,
            ),
            ("large_amount_warning", self.large_amount_warning),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(LexiconError::InvalidThreshold { name, value });
            }
        }
        Ok(())
    }

    fn transaction_threshold(&self, currency: &str) -> f64 {
        if currency.eq_ignore_ascii_case("USD") {
            self.usd_transaction_threshold
        } else {
            self.other_transaction_threshold
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfirmationRequirement {
    pub required: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confirmation_message: Option<String>,
}

impl ConfirmationRequirement {
    fn not_required() -> Self {
        Self {
            required: false,
            reason: None,
            confirmation_message: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationReport {
    pub valid: bool,
    pub errors: Vec<String>,
    /// Non-blocking.
    pub warnings: Vec<String>,
}

/// How a reply to a confirmation prompt reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ReplyClass {
    Confirmed,
    Rejected,
    /// Neither list matched; the caller must ask again.
    Ambiguous,
}

fn number(parameters: &Parameters, name: &str) -> Option<f64> {
    parameters.get(name).and_then(serde_json::Value::as_f64)
}

fn text<'a>(parameters: &'a Parameters, name: &str) -> Option<&'a str> {
    parameters
        .get(name)
        .and_then(serde_json::Value::as_str)
        .map(str::trim)
        .filter(|value| !value.is_empty())
}

fn money_text(parameters: &Parameters, name: &str) -> String {
    format!("{:.2}", number(parameters, name).unwrap_or(0.0))
}

#[derive(Debug, Clone)]
pub struct ActionConfirmer {
    policy: ConfirmationPolicy,
    confirm: PhraseSet,
    reject: PhraseSet,
}

impl Default for ActionConfirmer {
    fn default() -> Self {
        Self::new(ConfirmationPolicy::default())
    }
}

impl ActionConfirmer {
    pub fn new(policy: ConfirmationPolicy) -> Self {
        Self {
            confirm: PhraseSet::new(&policy.confirm_phrases),
            reject: PhraseSet::new(&policy.reject_phrases),
            policy,
        }
    }

    pub fn policy(&self) -> &ConfirmationPolicy {
        &self.policy
    }

    pub fn requires_confirmation(
        &self,
        action: ActionType,
        parameters: &Parameters,
    ) -> ConfirmationRequirement {
        let reason = match action {
            action if action.is_analysis() || action.is_query() => None,
            ActionType::CreateTransfer => {
                Some(String::from("Las transferencias afectan múltiples cuentas"))
            }
            ActionType::CreateTransaction => {
                let currency = text(parameters, "currency").unwrap_or("USD");
                number(parameters, "amount")
                    .filter(|amount| *amount >= self.policy.transaction_threshold(currency))
                    .map(|amount| {
                        format!(
                            "El monto ({amount:.2} {currency}) es mayor al umbral de confirmación"
                        )
                    })
            }
            ActionType::UpdateBudget | ActionType::UpdateGoal => Some(String::from(
                "Las actualizaciones modifican datos existentes",
            )),
            ActionType::CreateAccount => number(parameters, "initialBalance")
                .filter(|balance| *balance > self.policy.account_initial_balance_threshold)
                .map(|_| {
                    String::from("Crear cuenta con balance inicial grande requiere confirmación")
                }),
            _ => None,
        };

        match reason {
            Some(reason) => ConfirmationRequirement {
                required: true,
                reason: Some(reason),
                confirmation_message: Some(confirmation_message(action, parameters)),
            },
            None => ConfirmationRequirement::not_required(),
        }
    }

    /// Presence and positivity checks per action.
    pub fn validate_action_parameters(
        &self,
        action: ActionType,
        parameters: &Parameters,
    ) -> ValidationReport {
        let mut errors = Vec::new();
        let mut warnings = Vec::new();
        let positive = |name: &str| number(parameters, name).is_some_and(|value| value > 0.0);
        let mut require = |present: bool, message: &str| {
            if !present {
                errors.push(message.to_owned());
            }
        };

        match action {
            ActionType::CreateTransaction => {
                require(positive("amount"), "El monto debe ser mayor a 0");
                require(
                    text(parameters, "type").is_some(),
                    "El tipo de transacción es requerido (EXPENSE o INCOME)",
                );
                require(
                    text(parameters, "description").is_some(),
                    "La descripción es requerida",
                );
            }
            ActionType::CreateBudget => {
                require(text(parameters, "category").is_some(), "La categoría es requerida");
                require(
                    positive("amount"),
                    "El monto del presupuesto debe ser mayor a 0",
                );
            }
            ActionType::CreateGoal => {
                require(
                    text(parameters, "name").is_some(),
                    "El nombre de la meta es requerido",
                );
                require(positive("target"), "El objetivo debe ser mayor a 0");
            }
            ActionType::CreateAccount => {
                require(
                    text(parameters, "name").is_some(),
                    "El nombre de la cuenta es requerido",
                );
                require(
                    text(parameters, "type").is_some(),
                    "El tipo de cuenta es requerido",
                );
                require(text(parameters, "currency").is_some(), "La moneda es requerida");
            }
            ActionType::CreateTransfer => {
                let from = text(parameters, "fromAccount");
                let to = text(parameters, "toAccount");
                require(positive("amount"), "El monto debe ser mayor a 0");
                require(from.is_some(), "La cuenta de origen es requerida");
                require(to.is_some(), "La cuenta de destino es requerida");
                if let (Some(from), Some(to)) = (from, to) {
                    require(
                        !from.eq_ignore_ascii_case(to),
                        "No se puede transferir a la misma cuenta",
                    );
                }
            }
            other => warnings.push(format!(
                "Tipo de acción {other} no tiene validación específica"
            )),
        }

        let large = ["amount", "target", "initialBalance"]
            .iter()
            .filter_map(|name| number(parameters, name))
            .any(|value| value > self.policy.large_amount_warning);
        if large {
            warnings.push(String::from("El monto es muy grande. ¿Estás seguro?"));
        }

        ValidationReport {
            valid: errors.is_empty(),
            errors,
            warnings,
        }
    }

    pub fn is_confirmation_response(&self, reply: &str) -> bool {
        Message::new(reply).contains_any(&self.confirm)
    }

    pub fn is_rejection_response(&self, reply: &str) -> bool {
        Message::new(reply).contains_any(&self.reject)
    }

    /// Rejection wins when a reply matches both lists.
    pub fn classify_response(&self, reply: &str) -> ReplyClass {
        if self.is_rejection_response(reply) {
            ReplyClass::Rejected
        } else if self.is_confirmation_response(reply) {
            ReplyClass::Confirmed
        } else {
            ReplyClass::Ambiguous
        }
    }
}

/// Spanish confirmation prompt describing `action`.
pub fn confirmation_message(action: ActionType, parameters: &Parameters) -> String {
    let currency = text(parameters, "currency").unwrap_or("USD");
    let optional = |name: &str, render: fn(&str) -> String| {
        text(parameters, name).map(render).unwrap_or_default()
    };

    match action {
        ActionType::CreateTransaction => {
            let kind = if text(parameters, "type") == Some("INCOME") {
                "ingreso"
            } else {
                "gasto"
            };
            format!(
                "¿Confirmas crear un {kind} de {} {currency}{}{} por \"{}\"{}?",
                money_text(parameters, "amount"),
                optional("accountName", |name| format!(" en la cuenta \"{name}\"")),
                optional("category", |name| format!(" en la categoría \"{name}\"")),
                text(parameters, "description").unwrap_or("Sin descripción"),
                optional("date", |date| format!(" para la fecha {date}")),
            )
        }
        ActionType::CreateBudget | ActionType::UpdateBudget => {
            let verb = if action == ActionType::CreateBudget {
                "crear"
            } else {
                "actualizar"
            };
            let period = text(parameters, "monthYear")
                .map(|month| format!(" para {month}"))
                .unwrap_or_else(|| String::from(" para este mes"));
            format!(
                "¿Confirmas {verb} un presupuesto de {} {currency} para la categoría \"{}\"{period}?",
                money_text(parameters, "amount"),
                text(parameters, "category").unwrap_or("Sin categoría"),
            )
        }
        ActionType::CreateGoal | ActionType::UpdateGoal => {
            let verb = if action == ActionType::CreateGoal {
                "crear"
            } else {
                "actualizar"
            };
            format!(
                "¿Confirmas {verb} una meta de ahorro \"{}\" con objetivo de {} {currency}{}{}?",
                text(parameters, "name").unwrap_or("Sin nombre"),
                money_text(parameters, "target"),
                optional("targetDate", |date| format!(" con fecha objetivo {date}")),
                optional("accountName", |name| format!(
                    " asociada a la cuenta \"{name}\""
                )),
            )
        }
        ActionType::CreateAccount => {
            let kind = match text(parameters, "type") {
                Some("CARD") => AccountKind::Card.label_es().to_owned(),
                Some("CASH") => AccountKind::Cash.label_es().to_owned(),
                Some("SAVINGS") => AccountKind::Savings.label_es().to_owned(),
                Some("INVESTMENT") => AccountKind::Investment.label_es().to_owned(),
                Some("BANK") | None => AccountKind::Bank.label_es().to_owned(),
                Some(other) => other.to_lowercase(),
            };
            let balance = number(parameters, "initialBalance")
                .filter(|balance| *balance > 0.0)
                .map(|balance| format!(" con balance inicial de {balance:.2} {currency}"))
                .unwrap_or_default();
            format!(
                "¿Confirmas crear una {kind} llamada \"{}\" en {currency}{balance}?",
                text(parameters, "name").unwrap_or("Sin nombre"),
            )
        }
        ActionType::CreateTransfer => format!(
            "¿Confirmas transferir {} {currency} de \"{}\" a \"{}\"{}{}?",
            money_text(parameters, "amount"),
            text(parameters, "fromAccount").unwrap_or("cuenta origen"),
            text(parameters, "toAccount").unwrap_or("cuenta destino"),
            optional("description", |description| format!(" ({description})")),
            optional("date", |date| format!(" para la fecha {date}")),
        ),
        _ => String::from("¿Confirmas ejecutar esta acción?"),
    }
}

fn parameter_label(name: &str) -> &str {
    match name {
        "amount" => "monto",
        "description" => "descripción",
        "type" => "tipo",
        "category" => "categoría",
        "name" => "nombre",
        "target" => "objetivo",
        "currency" => "moneda",
        "fromAccount" => "cuenta de origen",
        "toAccount" => "cuenta de destino",
        other => other,
    }
}

/// Follow-up prompt listing what the user still has to provide; empty when nothing is missing.
pub fn missing_parameters_message<S: AsRef<str>>(action: ActionType, missing: &[S]) -> String {
    if missing.is_empty() {
        return String::new();
    }
    let names: Vec<&str> = missing
        .iter()
        .map(|name| parameter_label(name.as_ref()))
        .collect();
    format!(
        "Para {}, necesito que especifiques: {}.",
        action.description_es(),
        names.join(", ")
    )
}

static DEFAULT_CONFIRMER: LazyLock<ActionConfirmer> = LazyLock::new(ActionConfirmer::default);

/// [`ActionConfirmer::requires_confirmation`] with the default policy.
pub fn requires_confirmation(action: ActionType, parameters: &Parameters) -> ConfirmationRequirement {
    DEFAULT_CONFIRMER.requires_confirmation(action, parameters)
}

pub fn validate_action_parameters(action: ActionType, parameters: &Parameters) -> ValidationReport {
    DEFAULT_CONFIRMER.validate_action_parameters(action, parameters)
}

pub fn is_confirmation_response(reply: &str) -> bool {
    DEFAULT_CONFIRMER.is_confirmation_response(reply)
}

pub fn is_rejection_response(reply: &str) -> bool {
    DEFAULT_CONFIRMER.is_rejection_response(reply)
}

pub fn classify_response(reply: &str) -> ReplyClass {
    DEFAULT_CONFIRMER.classify_response(reply)
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn params(value: serde_json::Value) -> Parameters {
        match value {
            serde_json::Value::Object(map) => map,
            other => panic!("expected object, got {other}"),
        }
    }

    #[test]
    fn usd_transactions_confirm_from_one_hundred() {
        let below = params(json!({"amount": 99.0, "currency": "USD"}));
        let at = params(json!({"amount": 100.0, "currency": "USD"}));

        assert!(!requires_confirmation(ActionType::CreateTransaction, &below).required);
        let requirement = requires_confirmation(ActionType::CreateTransaction, &at);
        assert!(requirement.required);
        assert_eq!(
            requirement.reason.as_deref(),
            Some("El monto (100.00 USD) es mayor al umbral de confirmación")
        );
    }

    #[test]
    fn other_currencies_use_the_higher_threshold() {
        let bolivars = params(json!({"amount": 999.0, "currency": "VES"}));
        let euros = params(json!({"amount": 1000.0, "currency": "EUR"}));

        assert!(!requires_confirmation(ActionType::CreateTransaction, &bolivars).required);
        assert!(requires_confirmation(ActionType::CreateTransaction, &euros).required);
    }

    #[test]
    fn decision_table_covers_every_action_family() {
        let empty = Parameters::new();

        assert!(requires_confirmation(ActionType::CreateTransfer, &empty).required);
        assert!(requires_confirmation(ActionType::UpdateBudget, &empty).required);
        assert!(requires_confirmation(ActionType::UpdateGoal, &empty).required);
        assert!(!requires_confirmation(ActionType::CreateBudget, &empty).required);
        assert!(!requires_confirmation(ActionType::QueryRates, &empty).required);
        assert!(!requires_confirmation(ActionType::AnalyzeSpending, &empty).required);
        assert!(!requires_confirmation(ActionType::Unknown, &empty).required);

        let modest = params(json!({"initialBalance": 1000.0}));
        let large = params(json!({"initialBalance": 1000.01}));
        assert!(!requires_confirmation(ActionType::CreateAccount, &modest).required);
        assert!(requires_confirmation(ActionType::CreateAccount, &large).required);
    }

    #[test]
    fn policy_thresholds_are_configurable() {
        let confirmer = ActionConfirmer::new(ConfirmationPolicy {
            usd_transaction_threshold: 500.0,
            ..ConfirmationPolicy::default()
        });
        let amount = params(json!({"amount": 100.0, "currency": "USD"}));

        assert!(!confirmer
            .requires_confirmation(ActionType::CreateTransaction, &amount)
            .required);
    }

    #[test]
    fn transfer_validation_reports_each_problem() {
        let same = params(json!({"amount": 0, "fromAccount": "Ahorros", "toAccount": "ahorros"}));

        let report = validate_action_parameters(ActionType::CreateTransfer, &same);

        assert!(!report.valid);
        assert_eq!(
            report.errors,
            vec![
                String::from("El monto debe ser mayor a 0"),
                String::from("No se puede transferir a la misma cuenta"),
            ]
        );
    }

    #[test]
    fn large_amounts_warn_without_blocking() {
        let transaction = params(json!({
            "amount": 2_000_000.0,
            "type": "EXPENSE",
            "description": "Casa nueva"
        }));

        let report = validate_action_parameters(ActionType::CreateTransaction, &transaction);

        assert!(report.valid);
        assert_eq!(report.warnings, vec![String::from("El monto es muy grande. ¿Estás seguro?")]);
    }

    #[test]
    fn unvalidated_actions_get_a_warning() {
        let report = validate_action_parameters(ActionType::UpdateGoal, &Parameters::new());

        assert!(report.valid);
        assert_eq!(
            report.warnings,
            vec![String::from("Tipo de acción UPDATE_GOAL no tiene validación específica")]
        );
    }

    #[test]
    fn messages_are_in_spanish() {
        let transaction = params(json!({
            "amount": 150.0,
            "currency": "USD",
            "type": "EXPENSE",
            "description": "supermercado",
            "date": "2025-03-10"
        }));
        assert_eq!(
            confirmation_message(ActionType::CreateTransaction, &transaction),
            "¿Confirmas crear un gasto de 150.00 USD por \"supermercado\" para la fecha 2025-03-10?"
        );

        let account = params(json!({"name": "Banesco", "type": "SAVINGS", "currency": "VES", "initialBalance": 2500.0}));
        assert_eq!(
            confirmation_message(ActionType::CreateAccount, &account),
            "¿Confirmas crear una cuenta de ahorros llamada \"Banesco\" en VES con balance inicial de 2500.00 VES?"
        );

        assert_eq!(
            missing_parameters_message(ActionType::CreateTransfer, &["fromAccount", "toAccount"]),
            "Para realizar esta transferencia, necesito que especifiques: cuenta de origen, cuenta de destino."
        );
        assert_eq!(missing_parameters_message::<&str>(ActionType::CreateGoal, &[]), "");
    }

    #[test]
    fn replies_are_classified_with_rejection_first() {
        assert!(is_confirmation_response("sí, adelante"));
        assert!(is_rejection_response("mejor no"));
        assert_eq!(classify_response("Sí, adelante"), ReplyClass::Confirmed);
        assert_eq!(classify_response("no, mejor cancela"), ReplyClass::Rejected);
        assert_eq!(classify_response("ok no"), ReplyClass::Rejected);
        assert_eq!(classify_response("déjame pensarlo"), ReplyClass::Ambiguous);
    }

    #[test]
    fn reply_matching_is_whole_word() {
        // "nota" contains "no" and "sigo" contains "si".
        assert!(!is_rejection_response("nota"));
        assert!(!is_confirmation_response("sigo pensando"));
    }
}
