//! Ordered rule tables mapping signals to actions.

use serde::{Deserialize, Serialize};

use crate::intent::ActionType;
use crate::lexicon::{Signal, SignalSet};

/// Fires when every `all_of` signal is present and, if `any_of` is non-empty, at least
/// one of those as well.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rule {
    pub action: ActionType,
    #[serde(default)]
    pub all_of: Vec<Signal>,
    #[serde(default)]
    pub any_of: Vec<Signal>,
    pub confidence: f64,
}

impl Rule {
    fn new(action: ActionType, all_of: &[Signal], any_of: &[Signal], confidence: f64) -> Self {
        Self {
            action,
            all_of: all_of.to_vec(),
            any_of: any_of.to_vec(),
            confidence,
        }
    }

    pub(crate) fn matches(&self, signals: &SignalSet) -> bool {
        self.all_of.iter().all(|signal| signals.contains(signal))
            && (self.any_of.is_empty() || self.any_of.iter().any(|signal| signals.contains(signal)))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuleSet {
    /// Evaluated top to bottom for action intentions.
    pub actions: Vec<Rule>,
    /// Evaluated top to bottom for query intentions.
    pub queries: Vec<Rule>,
    pub unknown_action_confidence: f64,
    pub unknown_query_confidence: f64,
}

impl Default for RuleSet {
    fn default() -> Self {
        use ActionType as A;
        use Signal as S;

        let listing = [S::Listing, S::Command];

        Self {
            actions: vec![
                Rule::new(A::CreateTransaction, &[S::ActionVerb], &[], 0.9),
                Rule::new(A::CreateTransaction, &[S::Transaction], &[], 0.8),
                Rule::new(A::CreateTransfer, &[S::Transfer], &[], 0.7),
                Rule::new(A::UpdateBudget, &[S::Budget, S::Update], &[], 0.7),
                Rule::new(A::CreateBudget, &[S::Budget], &[], 0.8),
                Rule::new(A::UpdateGoal, &[S::Goal, S::Update], &[], 0.7),
                Rule::new(A::CreateGoal, &[S::Goal], &[], 0.8),
                Rule::new(A::CreateAccount, &[S::Account], &[], 0.8),
            ],
            queries: vec![
                Rule::new(A::QueryAccounts, &[S::Accounts], &listing, 0.98),
                Rule::new(A::QueryTransactions, &[S::Transactions], &listing, 0.95),
                Rule::new(A::QueryBudgets, &[S::Budgets], &listing, 0.95),
                Rule::new(A::QueryGoals, &[S::Goals], &listing, 0.95),
                Rule::new(A::QueryCategories, &[S::Categories], &listing, 0.95),
                Rule::new(A::QueryRecurring, &[S::Recurring], &listing, 0.95),
                Rule::new(A::QueryRates, &[S::Rates], &[], 0.95),
                Rule::new(A::QueryBalance, &[S::Balance], &[], 0.9),
                Rule::new(A::QueryCategories, &[S::Categories], &[], 0.85),
                Rule::new(A::QueryRecurring, &[S::Recurring], &[], 0.85),
                Rule::new(A::QueryAccounts, &[S::Accounts], &[], 0.85),
                Rule::new(A::QueryTransactions, &[S::Transactions], &[], 0.8),
                Rule::new(A::QueryBudgets, &[S::Budgets], &[], 0.8),
                Rule::new(A::QueryGoals, &[S::Goals], &[], 0.8),
            ],
            unknown_action_confidence: 0.3,
            unknown_query_confidence: 0.6,
        }
    }
}

impl RuleSet {
    /// First matching action rule as `(action, confidence)`.
    pub(crate) fn classify_action(&self, signals: &SignalSet) -> (ActionType, f64) {
        first_match(&self.actions, signals)
            .unwrap_or((ActionType::Unknown, self.unknown_action_confidence))
    }

    pub(crate) fn classify_query(&self, signals: &SignalSet) -> (ActionType, f64) {
        first_match(&self.queries, signals)
            .unwrap_or((ActionType::Unknown, self.unknown_query_confidence))
    }
}

fn first_match(rules: &[Rule], signals: &SignalSet) -> Option<(ActionType, f64)> {
    rules
        .iter()
        .find(|rule| rule.matches(signals))
        .map(|rule| (rule.action, rule.confidence))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn signals(list: &[Signal]) -> SignalSet {
        list.iter().copied().collect()
    }

    #[test]
    fn explicit_spending_verb_outranks_transaction_keyword() {
        let rules = RuleSet::default();

        assert_eq!(
            rules.classify_action(&signals(&[Signal::ActionVerb, Signal::Transaction])),
            (ActionType::CreateTransaction, 0.9)
        );
        assert_eq!(
            rules.classify_action(&signals(&[Signal::Transaction, Signal::Budget])),
            (ActionType::CreateTransaction, 0.8)
        );
    }

    #[test]
    fn updates_need_both_target_and_update_word() {
        let rules = RuleSet::default();

        assert_eq!(
            rules.classify_action(&signals(&[Signal::Budget, Signal::Update])).0,
            ActionType::UpdateBudget
        );
        assert_eq!(
            rules.classify_action(&signals(&[Signal::Goal])).0,
            ActionType::CreateGoal
        );
        assert_eq!(
            rules.classify_action(&signals(&[Signal::Create])),
            (ActionType::Unknown, 0.3)
        );
    }

    #[test]
    fn listing_queries_rank_above_topic_only_queries() {
        let rules = RuleSet::default();

        assert_eq!(
            rules.classify_query(&signals(&[Signal::Listing, Signal::Accounts, Signal::Rates])),
            (ActionType::QueryAccounts, 0.98)
        );
        assert_eq!(
            rules.classify_query(&signals(&[Signal::Accounts, Signal::Balance])),
            (ActionType::QueryBalance, 0.9)
        );
        assert_eq!(
            rules.classify_query(&signals(&[])),
            (ActionType::Unknown, 0.6)
        );
    }

    #[test]
    fn rule_tables_load_from_yaml() {
        let yaml = r#"
actions:
  - action: CREATE_GOAL
    all_of: [goal]
    confidence: 0.5
queries: []
"#;
        let rules: RuleSet = serde_yaml::from_str(yaml).expect("yaml");

        assert_eq!(rules.actions.len(), 1);
        assert!(rules.queries.is_empty());
        assert_eq!(rules.unknown_query_confidence, 0.6);
    }
}
