//! Intention types shared by the detector and the confirmer.

use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Extracted parameters keyed by their wire names (`amount`, `dateFrom`, ...).
pub type Parameters = serde_json::Map<String, serde_json::Value>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ActionType {
    CreateTransaction,
    CreateBudget,
    CreateGoal,
    CreateAccount,
    CreateTransfer,
    UpdateBudget,
    UpdateGoal,
    QueryBalance,
    QueryTransactions,
    QueryBudgets,
    QueryGoals,
    QueryAccounts,
    QueryRates,
    QueryCategories,
    QueryRecurring,
    AnalyzeSpending,
    CalculatePercentages,
    GetFinancialSummary,
    ComparePeriods,
    AnalyzeByCategory,
    GetSpendingTrends,
    Unknown,
}

impl ActionType {
    pub const ALL: [Self; 22] = [
        Self::CreateTransaction,
        Self::CreateBudget,
        Self::CreateGoal,
        Self::CreateAccount,
        Self::CreateTransfer,
        Self::UpdateBudget,
        Self::UpdateGoal,
        Self::QueryBalance,
        Self::QueryTransactions,
        Self::QueryBudgets,
        Self::QueryGoals,
        Self::QueryAccounts,
        Self::QueryRates,
        Self::QueryCategories,
        Self::QueryRecurring,
        Self::AnalyzeSpending,
        Self::CalculatePercentages,
        Self::GetFinancialSummary,
        Self::ComparePeriods,
        Self::AnalyzeByCategory,
        Self::GetSpendingTrends,
        Self::Unknown,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::CreateTransaction => "CREATE_TRANSACTION",
            Self::CreateBudget => "CREATE_BUDGET",
            Self::CreateGoal => "CREATE_GOAL",
            Self::CreateAccount => "CREATE_ACCOUNT",
            Self::CreateTransfer => "CREATE_TRANSFER",
            Self::UpdateBudget => "UPDATE_BUDGET",
            Self::UpdateGoal => "UPDATE_GOAL",
            Self::QueryBalance => "QUERY_BALANCE",
            Self::QueryTransactions => "QUERY_TRANSACTIONS",
            Self::QueryBudgets => "QUERY_BUDGETS",
            Self::QueryGoals => "QUERY_GOALS",
            Self::QueryAccounts => "QUERY_ACCOUNTS",
            Self::QueryRates => "QUERY_RATES",
            Self::QueryCategories => "QUERY_CATEGORIES",
            Self::QueryRecurring => "QUERY_RECURRING",
            Self::AnalyzeSpending => "ANALYZE_SPENDING",
            Self::CalculatePercentages => "CALCULATE_PERCENTAGES",
            Self::GetFinancialSummary => "GET_FINANCIAL_SUMMARY",
            Self::ComparePeriods => "COMPARE_PERIODS",
            Self::AnalyzeByCategory => "ANALYZE_BY_CATEGORY",
            Self::GetSpendingTrends => "GET_SPENDING_TRENDS",
            Self::Unknown => "UNKNOWN",
        }
    }

    pub const fn is_query(self) -> bool {
        matches!(
            self,
            Self::QueryBalance
                | Self::QueryTransactions
                | Self::QueryBudgets
                | Self::QueryGoals
                | Self::QueryAccounts
                | Self::QueryRates
                | Self::QueryCategories
                | Self::QueryRecurring
        )
    }

    /// Read-only analysis tools; these never need confirmation.
    pub const fn is_analysis(self) -> bool {
        matches!(
            self,
            Self::AnalyzeSpending
                | Self::CalculatePercentages
                | Self::GetFinancialSummary
                | Self::ComparePeriods
                | Self::AnalyzeByCategory
                | Self::GetSpendingTrends
        )
    }

    /// Spanish infinitive phrase used in assistant prompts.
    pub const fn description_es(self) -> &'static str {
        match self {
            Self::CreateTransaction => "crear esta transacción",
            Self::CreateBudget => "crear este presupuesto",
            Self::CreateGoal => "crear esta meta",
            Self::CreateAccount => "crear esta cuenta",
            Self::CreateTransfer => "realizar esta transferencia",
            Self::UpdateBudget => "actualizar este presupuesto",
            Self::UpdateGoal => "actualizar esta meta",
            Self::QueryBalance => "consultar el saldo",
            Self::QueryTransactions => "consultar las transacciones",
            Self::QueryBudgets => "consultar los presupuestos",
            Self::QueryGoals => "consultar las metas",
            Self::QueryAccounts => "consultar las cuentas",
            Self::QueryRates => "consultar las tasas de cambio",
            Self::QueryCategories => "consultar las categorías",
            Self::QueryRecurring => "consultar las transacciones recurrentes",
            Self::AnalyzeSpending => "analizar gastos",
            Self::CalculatePercentages => "calcular porcentajes",
            Self::GetFinancialSummary => "obtener resumen financiero",
            Self::ComparePeriods => "comparar períodos",
            Self::AnalyzeByCategory => "analizar por categoría",
            Self::GetSpendingTrends => "obtener tendencias de gasto",
            Self::Unknown => "realizar esta acción",
        }
    }
}

impl Display for ActionType {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown action type '{0}'")]
pub struct UnknownActionType(pub String);

impl FromStr for ActionType {
    type Err = UnknownActionType;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let wanted = value.trim().replace('-', "_").to_ascii_uppercase();
        Self::ALL
            .into_iter()
            .find(|action| action.as_str() == wanted)
            .ok_or_else(|| UnknownActionType(value.to_owned()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum IntentionType {
    Action,
    Query,
}

/// Structured reading of one chat message.
///
/// A `Query` intention never requires confirmation and always carries a `QUERY_*`
/// action or `UNKNOWN`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DetectedIntention {
    #[serde(rename = "type")]
    pub kind: IntentionType,
    pub action_type: ActionType,
    /// Fixed per rule; a display hint, not a probability.
    pub confidence: f64,
    pub parameters: Parameters,
    pub requires_confirmation: bool,
    pub missing_parameters: Vec<String>,
}

impl DetectedIntention {
    pub fn is_action(&self) -> bool {
        self.kind == IntentionType::Action
    }

    pub fn parameter_f64(&self, name: &str) -> Option<f64> {
        self.parameters.get(name).and_then(serde_json::Value::as_f64)
    }

    pub fn parameter_str(&self, name: &str) -> Option<&str> {
        self.parameters.get(name).and_then(serde_json::Value::as_str)
    }
}
