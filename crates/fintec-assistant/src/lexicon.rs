//! Keyword groups and alias tables that drive the detector.
//!
//! Everything here is plain data. The built-in [`Lexicon::default`] covers Spanish and
//! English; a file loaded through [`crate::AssistantConfig`] may override any group, and
//! groups it leaves out keep their defaults.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use serde::{Deserialize, Serialize};

use crate::text::{Message, PhraseSet};

/// A named keyword group.
///
/// Singular names (`transaction`, `budget`, ...) mark action targets; plural names
/// (`transactions`, `budgets`, ...) mark query topics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Signal {
    Create,
    Update,
    Command,
    ActionVerb,
    Query,
    Listing,
    Transaction,
    Budget,
    Goal,
    Account,
    Transfer,
    Expense,
    Income,
    Balance,
    Rates,
    Transactions,
    Budgets,
    Goals,
    Accounts,
    Categories,
    Recurring,
    Today,
    Yesterday,
    Tomorrow,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AccountKind {
    Bank,
    Card,
    Cash,
    Savings,
    Investment,
}

impl AccountKind {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Bank => "BANK",
            Self::Card => "CARD",
            Self::Cash => "CASH",
            Self::Savings => "SAVINGS",
            Self::Investment => "INVESTMENT",
        }
    }

    pub const fn label_es(self) -> &'static str {
        match self {
            Self::Bank => "cuenta bancaria",
            Self::Card => "tarjeta",
            Self::Cash => "efectivo",
            Self::Savings => "cuenta de ahorros",
            Self::Investment => "cuenta de inversión",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurrencyAlias {
    pub code: String,
    pub words: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryAlias {
    pub category: String,
    pub words: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountKindAlias {
    pub kind: AccountKind,
    pub words: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Lexicon {
    pub keywords: BTreeMap<Signal, Vec<String>>,
    pub currencies: Vec<CurrencyAlias>,
    /// Checked in order; the first listed category whose word appears wins.
    pub categories: Vec<CategoryAlias>,
    pub account_kinds: Vec<AccountKindAlias>,
    pub stopwords: Vec<String>,
}

fn words(entries: &[&str]) -> Vec<String> {
    entries.iter().map(|entry| (*entry).to_owned()).collect()
}

impl Default for Lexicon {
    fn default() -> Self {
        let keywords = BTreeMap::from([
            (
                Signal::Create,
                words(&[
                    "crear", "crea", "agregar", "agrega", "añadir", "añade", "nuevo", "nueva",
                    "registrar", "registra", "agreguemos", "add", "create", "new", "register",
                ]),
            ),
            (
                Signal::Update,
                words(&[
                    "actualizar", "actualiza", "modificar", "modifica", "cambiar", "cambia",
                    "editar", "edita", "aumentar", "aumenta", "disminuir", "disminuye",
                    "update", "modify", "change", "edit", "increase", "decrease",
                ]),
            ),
            (
                Signal::Command,
                words(&["hazme", "haz", "haz que", "make me", "make"]),
            ),
            (
                Signal::ActionVerb,
                words(&[
                    "gasté", "gaste", "gastar", "spent", "compré", "compre", "comprar",
                    "bought", "pagué", "pague", "pagar", "paid",
                ]),
            ),
            (
                Signal::Query,
                words(&[
                    "cuánto", "cuánta", "cuántos", "cuántas", "cuál", "cuáles", "dónde",
                    "cuándo", "qué", "quién", "mostrar", "muestra", "listar", "lista", "ver",
                    "verme", "dime", "dame", "how much", "how many", "what", "which", "where",
                    "when", "who", "show", "list", "tell me", "give me",
                ]),
            ),
            (
                Signal::Listing,
                words(&[
                    "listado", "listar", "lista", "muéstrame", "mostrar", "muestra", "ver",
                    "show", "display", "list", "dame", "give me",
                ]),
            ),
            (
                Signal::Transaction,
                words(&[
                    "transacción", "gasto", "gastos", "ingreso", "ingresos", "pago", "pagos",
                    "cobro", "cobros", "compra", "compras", "transaction", "expense", "income",
                    "payment", "purchase",
                ]),
            ),
            (
                Signal::Budget,
                words(&[
                    "presupuesto", "presupuestos", "límite", "tope", "topes", "budget", "limit",
                    "quota",
                ]),
            ),
            (
                Signal::Goal,
                words(&[
                    "meta", "metas", "objetivo", "objetivos", "ahorro", "ahorros", "goal",
                    "target", "savings",
                ]),
            ),
            (
                Signal::Account,
                words(&[
                    "cuenta", "cuentas", "banco", "bancos", "tarjeta", "tarjetas", "account",
                    "bank", "card",
                ]),
            ),
            (
                Signal::Transfer,
                words(&[
                    "transferir", "transfiere", "transferencia", "transferencias", "mover",
                    "movimiento", "enviar", "transfer", "move", "send",
                ]),
            ),
            (
                Signal::Expense,
                words(&[
                    "gasto", "gastos", "pago", "pagos", "compra", "compras", "expense",
                    "expenses",
                ]),
            ),
            (
                Signal::Income,
                words(&[
                    "ingreso", "ingresos", "cobro", "cobros", "salario", "sueldo", "income",
                    "salary",
                ]),
            ),
            (
                Signal::Balance,
                words(&["saldo", "balance", "dinero", "money", "cuánto", "tengo"]),
            ),
            (
                Signal::Rates,
                words(&[
                    "tasa", "tasas", "cambio", "tipo de cambio", "exchange", "bcv", "binance",
                    "dólar", "dólares", "bolívar", "bolívares", "rate", "rates",
                ]),
            ),
            (
                Signal::Transactions,
                words(&[
                    "transacción", "transacciones", "transaction", "transactions", "gasto",
                    "gastos", "expense", "expenses", "ingreso", "ingresos", "income", "pago",
                    "pagos", "payment", "payments", "cobro", "cobros",
                ]),
            ),
            (
                Signal::Budgets,
                words(&["presupuesto", "presupuestos", "budget", "budgets"]),
            ),
            (
                Signal::Goals,
                words(&[
                    "meta", "metas", "objetivo", "objetivos", "goal", "goals", "target",
                    "targets",
                ]),
            ),
            (
                Signal::Accounts,
                words(&["cuenta", "cuentas", "account", "accounts"]),
            ),
            (
                Signal::Categories,
                words(&["categoría", "categorías", "category", "categories"]),
            ),
            (
                Signal::Recurring,
                words(&[
                    "recurrente", "recurrentes", "recurring", "automática", "automáticas",
                    "periódica", "periódicas", "programada", "programadas",
                ]),
            ),
            (Signal::Today, words(&["hoy", "today"])),
            (Signal::Yesterday, words(&["ayer", "yesterday"])),
            (Signal::Tomorrow, words(&["mañana", "tomorrow"])),
        ]);

        let currency = |code: &str, aliases: &[&str]| CurrencyAlias {
            code: code.to_owned(),
            words: words(aliases),
        };
        let category = |name: &str, aliases: &[&str]| CategoryAlias {
            category: name.to_owned(),
            words: words(aliases),
        };
        let kind = |kind: AccountKind, aliases: &[&str]| AccountKindAlias {
            kind,
            words: words(aliases),
        };

        Self {
            keywords,
            currencies: vec![
                currency("USD", &["usd", "dólar", "dólares", "dollar", "dollars"]),
                currency("VES", &["ves", "bs", "bolívar", "bolívares"]),
                currency("EUR", &["eur", "euro", "euros"]),
                currency("GBP", &["gbp", "libra", "libras", "pound", "pounds"]),
                currency("JPY", &["jpy", "yen", "yenes"]),
                currency("CAD", &["cad"]),
                currency("AUD", &["aud"]),
                currency("MXN", &["mxn", "peso", "pesos"]),
                currency("BRL", &["brl", "real", "reales"]),
            ],
            categories: vec![
                category("Comida", &["comida", "food", "restaurante", "supermercado"]),
                category(
                    "Transporte",
                    &["transporte", "transport", "gasolina", "gas", "uber", "taxi"],
                ),
                category("Compras", &["compras", "shopping"]),
                category("Entretenimiento", &["entretenimiento", "entertainment"]),
                category("Salud", &["salud", "health"]),
                category("Hogar", &["hogar", "home"]),
                category("Educación", &["educación", "education"]),
                category("Salario", &["salario", "salary", "sueldo"]),
            ],
            account_kinds: vec![
                kind(AccountKind::Bank, &["bancaria", "banco", "bank"]),
                kind(AccountKind::Card, &["tarjeta", "card", "crédito"]),
                kind(AccountKind::Cash, &["efectivo", "cash"]),
                kind(AccountKind::Savings, &["ahorro", "ahorros", "savings"]),
                kind(AccountKind::Investment, &["inversión", "investment"]),
            ],
            stopwords: words(&[
                "de", "del", "en", "para", "por", "con", "el", "la", "los", "las", "un", "una",
                "unos", "unas", "al", "mi", "mis", "a", "an", "the", "for", "of", "on", "in",
                "my",
            ]),
        }
    }
}

impl Lexicon {
    /// Fill groups and tables this lexicon leaves empty from `defaults`.
    pub fn merged_with(mut self, defaults: Lexicon) -> Self {
        for (signal, entries) in defaults.keywords {
            self.keywords.entry(signal).or_insert(entries);
        }
        if self.currencies.is_empty() {
            self.currencies = defaults.currencies;
        }
        if self.categories.is_empty() {
            self.categories = defaults.categories;
        }
        if self.account_kinds.is_empty() {
            self.account_kinds = defaults.account_kinds;
        }
        if self.stopwords.is_empty() {
            self.stopwords = defaults.stopwords;
        }
        self
    }
}

/// Signals found in one message.
pub(crate) type SignalSet = BTreeSet<Signal>;

/// A [`Lexicon`] folded and tokenised for matching.
#[derive(Debug, Clone)]
pub(crate) struct Vocabulary {
    keywords: BTreeMap<Signal, PhraseSet>,
    currencies: HashMap<String, String>,
    categories: Vec<(PhraseSet, String)>,
    account_kinds: Vec<(PhraseSet, AccountKind)>,
    stopwords: PhraseSet,
}

impl Vocabulary {
    pub fn new(lexicon: &Lexicon) -> Self {
        let currencies = lexicon
            .currencies
            .iter()
            .flat_map(|alias| {
                PhraseSet::new(&alias.words)
                    .iter()
                    .filter_map(|phrase| phrase.as_word().map(str::to_owned))
                    .map(|word| (word, alias.code.trim().to_ascii_uppercase()))
                    .collect::<Vec<_>>()
            })
            .collect();

        Self {
            keywords: lexicon
                .keywords
                .iter()
                .map(|(signal, entries)| (*signal, PhraseSet::new(entries)))
                .collect(),
            currencies,
            categories: lexicon
                .categories
                .iter()
                .map(|alias| (PhraseSet::new(&alias.words), alias.category.clone()))
                .collect(),
            account_kinds: lexicon
                .account_kinds
                .iter()
                .map(|alias| (PhraseSet::new(&alias.words), alias.kind))
                .collect(),
            stopwords: PhraseSet::new(&lexicon.stopwords),
        }
    }

    pub fn signals(&self, message: &Message<'_>) -> SignalSet {
        self.keywords
            .iter()
            .filter(|(_, phrases)| message.contains_any(phrases))
            .map(|(signal, _)| *signal)
            .collect()
    }

    /// Whether `word` (already folded) is a single-word keyword of `signal`.
    pub fn is_keyword(&self, signal: Signal, word: &str) -> bool {
        self.keywords
            .get(&signal)
            .is_some_and(|phrases| phrases.has_word(word))
    }

    pub fn currency_for(&self, word: &str) -> Option<&str> {
        self.currencies.get(word).map(String::as_str)
    }

    /// First currency named anywhere in the message, in reading order.
    pub fn currency_in(&self, message: &Message<'_>) -> Option<String> {
        message
            .tokens
            .iter()
            .find_map(|token| self.currency_for(&token.folded))
            .map(str::to_owned)
    }

    pub fn category_in(&self, message: &Message<'_>) -> Option<String> {
        self.categories
            .iter()
            .find(|(phrases, _)| message.contains_any(phrases))
            .map(|(_, category)| category.clone())
    }

    pub fn account_kind_in(&self, message: &Message<'_>) -> Option<AccountKind> {
        self.account_kinds
            .iter()
            .find(|(phrases, _)| message.contains_any(phrases))
            .map(|(_, kind)| *kind)
    }

    pub fn is_stopword(&self, word: &str) -> bool {
        self.stopwords.has_word(word)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_lexicon_defines_every_signal() {
        let lexicon = Lexicon::default();
        for signal in [
            Signal::Create,
            Signal::Query,
            Signal::Listing,
            Signal::Transfer,
            Signal::Rates,
            Signal::Recurring,
            Signal::Tomorrow,
        ] {
            assert!(
                lexicon.keywords.get(&signal).is_some_and(|entries| !entries.is_empty()),
                "{signal:?}"
            );
        }
        assert_eq!(lexicon.keywords.len(), 24);
    }

    #[test]
    fn signals_match_accented_and_plain_spellings() {
        let vocabulary = Vocabulary::new(&Lexicon::default());

        let accented = vocabulary.signals(&Message::new("¿Cuánto gasté ayer?"));
        let plain = vocabulary.signals(&Message::new("cuanto gaste ayer"));

        assert_eq!(accented, plain);
        assert!(accented.contains(&Signal::Query));
        assert!(accented.contains(&Signal::ActionVerb));
        assert!(accented.contains(&Signal::Yesterday));
    }

    #[test]
    fn currency_aliases_resolve_in_reading_order() {
        let vocabulary = Vocabulary::new(&Lexicon::default());

        assert_eq!(vocabulary.currency_for("bolivares"), Some("VES"));
        assert_eq!(
            vocabulary.currency_in(&Message::new("pasar 20 euros a dólares")),
            Some(String::from("EUR"))
        );
        assert_eq!(vocabulary.currency_in(&Message::new("sin moneda")), None);
    }

    #[test]
    fn merging_keeps_overrides_and_fills_the_rest() {
        let custom = Lexicon {
            keywords: BTreeMap::from([(Signal::Create, words(&["montar"]))]),
            currencies: Vec::new(),
            categories: Vec::new(),
            account_kinds: Vec::new(),
            stopwords: Vec::new(),
        };

        let merged = custom.merged_with(Lexicon::default());

        assert_eq!(merged.keywords[&Signal::Create], vec![String::from("montar")]);
        assert!(!merged.keywords[&Signal::Query].is_empty());
        assert_eq!(merged.currencies, Lexicon::default().currencies);
    }
}
