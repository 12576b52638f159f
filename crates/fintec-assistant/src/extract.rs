//! Parameter extractors.
//!
//! Pattern-based extractors run on the folded message so accented and plain spellings
//! behave the same; name extractors run on the original text to keep the user's spelling.

use std::sync::LazyLock;

use fintec_core::DayKey;
use regex::Regex;

use crate::lexicon::{Signal, SignalSet, Vocabulary};
use crate::text::{Message, Token, NUMBER};

fn pattern(source: &str) -> Regex {
    Regex::new(source).expect("extractor pattern is valid")
}

static THOUSANDS: LazyLock<Regex> = LazyLock::new(|| pattern(r"^\d{1,3}(?:\.\d{3})+$"));

static DECIMAL_COMMA: LazyLock<Regex> =
    LazyLock::new(|| pattern(r"^\d+(?:\.\d{3})*,\d{1,2}$"));

static DOLLAR_PREFIXED: LazyLock<Regex> =
    LazyLock::new(|| pattern(&format!(r"\$\s*({NUMBER})")));

const NAME_END: &str = r"(?:\s+(?:de|con|tipo|en|with|in|of)\b|[.,;!?]|$)";

static GOAL_NAME: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r"(?i)\bmeta\s+(?:de\s+la|del|de|para)\s+(.+?)",
        r"(?i)\bahorrar\s+para\s+(?:el\s+|la\s+)?(.+?)",
        r"(?i)\bobjetivo\s+(?:de|para)\s+(.+?)",
        r"(?i)\b(?:goal|save)\s+(?:for|to)\s+(.+?)",
    ]
    .iter()
    .map(|head| pattern(&format!("{head}{NAME_END}")))
    .collect()
});

static ACCOUNT_NAME: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r"(?i)\b(?:llamada|llamado|called|named)\s+(.+?)",
        r"(?i)\bcuenta\s+(?:nombre|de)\s+(.+?)",
        r"(?i)\bcuenta\s+(.+?)",
    ]
    .iter()
    .map(|head| pattern(&format!("{head}{NAME_END}")))
    .collect()
});

static LIMIT: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r"\b(?:ultimas?|ultimos?|last|primeras?|primeros?|first|solo|only|unicamente|just|exactamente|exactly)\s+(\d+)\b",
        r"\b(\d+)\s+(?:ultimas?|ultimos?|last|primeras?|primeros?|first|transacciones?|transactions?|gastos?|expenses?|ingresos?|income|items?|elementos?)\b",
        r"\b(?:dame|muestra|muestrame|listar|lista|listado|show|give|tell)\s+(?:me\s+|una\s+|un\s+)?(?:lista\s+de\s+)?(?:mis\s+|las\s+|los\s+|the\s+)?(?:ultimas?\s+|ultimos?\s+|last\s+)?(\d+)\b",
        r"\b(?:solo|only|just)\s+(?:quiero|want|necesito|need)?\s*(\d+)\b",
    ]
    .iter()
    .map(|source| pattern(source))
    .collect()
});

static BARE_LIMIT: LazyLock<Regex> = LazyLock::new(|| pattern(r"\b(\d{1,2})\b"));

static LIMIT_CONTEXT: LazyLock<Regex> = LazyLock::new(|| {
    pattern(r"\b(?:transacciones?|transactions?|gastos?|expenses?|ingresos?|lista|muestra|dame|show|list)\b")
});

static AGO: LazyLock<Regex> = LazyLock::new(|| {
    pattern(r"\bhace\s+(\d+)\s+(dias?|semanas?|mes|meses)\b|\b(\d+)\s+(days?|weeks?|months?)\s+ago\b")
});

/// "hace N ..." ranges never reach further back than this.
const MAX_LOOKBACK_YEARS: u32 = 100;

static AMOUNT_MIN: LazyLock<Regex> = LazyLock::new(|| {
    pattern(&format!(r"\b(?:mayor(?:es)?\s+(?:a|que)|mas\s+de|more\s+than|greater\s+than|over|above)\s*({NUMBER})"))
});

static AMOUNT_MAX: LazyLock<Regex> = LazyLock::new(|| {
    pattern(&format!(r"\b(?:menor(?:es)?\s+(?:a|que)|menos\s+de|less\s+than|under|below)\s*({NUMBER})"))
});

static AMOUNT_BETWEEN: LazyLock<Regex> = LazyLock::new(|| {
    pattern(&format!(r"\b(?:entre|between)\s*({NUMBER})\s*(?:y|and)\s*({NUMBER})"))
});

/// A monetary amount as written in a message.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Amount {
    pub value: f64,
    /// `None` when no currency was written; callers default to USD.
    pub currency: Option<String>,
}

/// Parse `1500`, `12.50` or grouped `1.500.000`.
pub(crate) fn parse_number(text: &str) -> Option<f64> {
    let value = if THOUSANDS.is_match(text) {
        text.replace('.', "").parse::<f64>().ok()?
    } else if DECIMAL_COMMA.is_match(text) {
        text.replace('.', "").replace(',', ".").parse::<f64>().ok()?
    } else {
        text.parse::<f64>().ok()?
    };
    value.is_finite().then_some(value)
}

fn positive_number(token: &Token<'_>) -> Option<f64> {
    if !token.is_number() {
        return None;
    }
    parse_number(&token.folded).filter(|value| *value > 0.0)
}

/// Currency-suffixed numbers first, then `$` amounts, then any positive number.
pub(crate) fn amount(message: &Message<'_>, vocabulary: &Vocabulary) -> Option<Amount> {
    let suffixed = message.tokens.windows(2).find_map(|pair| {
        let value = positive_number(&pair[0])?;
        let currency = vocabulary.currency_for(&pair[1].folded)?;
        Some(Amount {
            value,
            currency: Some(currency.to_owned()),
        })
    });
    if suffixed.is_some() {
        return suffixed;
    }

    let dollars = DOLLAR_PREFIXED
        .captures_iter(message.original)
        .filter_map(|captures| parse_number(captures.get(1)?.as_str()))
        .find(|value| *value > 0.0);
    if let Some(value) = dollars {
        return Some(Amount {
            value,
            currency: Some(String::from("USD")),
        });
    }

    message
        .tokens
        .iter()
        .find_map(positive_number)
        .map(|value| Amount {
            value,
            currency: vocabulary.currency_in(message),
        })
}

pub(crate) fn date(signals: &SignalSet, today: DayKey) -> Option<DayKey> {
    if signals.contains(&Signal::Today) {
        Some(today)
    } else if signals.contains(&Signal::Yesterday) {
        Some(today.minus_days(1))
    } else if signals.contains(&Signal::Tomorrow) {
        Some(today.plus_days(1))
    } else {
        None
    }
}

const DESCRIPTION_NOISE: [Signal; 7] = [
    Signal::Create,
    Signal::Command,
    Signal::ActionVerb,
    Signal::Transaction,
    Signal::Today,
    Signal::Yesterday,
    Signal::Tomorrow,
];

/// The message minus action words, numbers, currency words and stopwords.
pub(crate) fn description(message: &Message<'_>, vocabulary: &Vocabulary) -> Option<String> {
    let kept: Vec<&str> = message
        .tokens
        .iter()
        .filter(|token| {
            let word = token.folded.as_str();
            !token.is_number()
                && vocabulary.currency_for(word).is_none()
                && !vocabulary.is_stopword(word)
                && !DESCRIPTION_NOISE
                    .iter()
                    .any(|signal| vocabulary.is_keyword(*signal, word))
        })
        .map(|token| token.raw)
        .collect();

    let description = kept.join(" ");
    let length = description.chars().count();
    (length > 3 && length < 100).then_some(description)
}

fn first_name(patterns: &[Regex], text: &str) -> Option<String> {
    patterns.iter().find_map(|pattern| {
        let name = pattern.captures(text)?.get(1)?.as_str().trim();
        let starts_with_digit = name.chars().next().is_some_and(|ch| ch.is_ascii_digit());
        (!name.is_empty() && !starts_with_digit).then(|| name.to_owned())
    })
}

pub(crate) fn goal_name(message: &Message<'_>) -> Option<String> {
    first_name(&GOAL_NAME, message.original)
}

pub(crate) fn account_name(message: &Message<'_>) -> Option<String> {
    first_name(&ACCOUNT_NAME, message.original)
}

/// Result count asked for, within 1..=100.
pub(crate) fn limit(message: &Message<'_>) -> Option<u32> {
    let text = message.folded.as_str();
    let in_range = |raw: &str| raw.parse::<u32>().ok().filter(|value| (1..=100).contains(value));

    let explicit = LIMIT.iter().find_map(|pattern| {
        pattern
            .captures(text)
            .and_then(|captures| in_range(captures.get(1)?.as_str()))
    });
    if explicit.is_some() {
        return explicit;
    }

    let mentions_amounts =
        AMOUNT_MIN.is_match(text) || AMOUNT_MAX.is_match(text) || AMOUNT_BETWEEN.is_match(text);
    if mentions_amounts || !LIMIT_CONTEXT.is_match(text) {
        return None;
    }
    BARE_LIMIT
        .captures(text)
        .and_then(|captures| in_range(captures.get(1)?.as_str()))
}

/// Calendar range named by the message, inclusive on both ends.
pub(crate) fn date_range(message: &Message<'_>, today: DayKey) -> Option<(DayKey, DayKey)> {
    let text = message.folded.as_str();
    let has = |phrases: &[&str]| phrases.iter().any(|phrase| text.contains(phrase));

    if has(&["este mes", "this month"]) {
        return Some((today.month_start(), today));
    }
    if has(&["mes pasado", "last month"]) {
        let this_month = today.month_start();
        return Some((this_month.minus_months(1), this_month.minus_days(1)));
    }
    if has(&["esta semana", "this week"]) {
        return Some((today.week_start(), today));
    }
    if has(&["semana pasada", "last week"]) {
        let this_week = today.week_start();
        return Some((this_week.minus_days(7), this_week.minus_days(1)));
    }

    let captures = AGO.captures(text)?;
    let (count, unit) = match (captures.get(1), captures.get(2)) {
        (Some(count), Some(unit)) => (count, unit),
        _ => (captures.get(3)?, captures.get(4)?),
    };
    // Digits too long for u32 saturate and are then capped like any other large count.
    let count: u32 = count.as_str().parse().unwrap_or(u32::MAX);
    let unit = unit.as_str();
    let from = if unit.starts_with("dia") || unit.starts_with("day") {
        today.minus_days(i64::from(count.min(MAX_LOOKBACK_YEARS * 366)))
    } else if unit.starts_with("semana") || unit.starts_with("week") {
        today.minus_days(i64::from(count.min(MAX_LOOKBACK_YEARS * 53)) * 7)
    } else {
        today.minus_months(count.min(MAX_LOOKBACK_YEARS * 12))
    };
    Some((from, today))
}

/// `(amountMin, amountMax)` from "más de", "menos de" and "entre X y Y" phrases.
pub(crate) fn amount_range(message: &Message<'_>) -> (Option<f64>, Option<f64>) {
    let text = message.folded.as_str();
    let capture = |pattern: &Regex, group: usize| {
        pattern
            .captures(text)
            .and_then(|captures| parse_number(captures.get(group)?.as_str()))
    };

    if let (Some(min), Some(max)) = (capture(&AMOUNT_BETWEEN, 1), capture(&AMOUNT_BETWEEN, 2)) {
        return (Some(min), Some(max));
    }
    (capture(&AMOUNT_MIN, 1), capture(&AMOUNT_MAX, 1))
}
