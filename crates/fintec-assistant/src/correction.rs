//! Follow-up corrections such as "pero te pedí solo 5".

use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;
use tracing::debug;

use crate::text::fold;

const STRONG_CONFIDENCE: f64 = 0.9;
const WEAK_CONFIDENCE: f64 = 0.7;

static STRONG: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r"\b(?:me|you)\s+(?:mostraste|mostraron|diste|dieron|gave|showed|shows)\s+(\d+)",
        r"\b(?:pero|but)\s+(?:te|you|me|i)\s+(?:pedi|pediste|asked(?:\s+for)?|dije|dijiste|said)\s+(?:(?:solo|only|just|exactamente|exactly)\s+)?(\d+)",
        r"\b(?:solo|only|just)\s+(?:pedi|pediste|asked(?:\s+for)?|quiero|want|necesito|need)\s*(\d+)",
        r"\b(?:corrige|correct|correccion|correction|corregir)\s+(?:(?:a|to)\s+)?(\d+)",
        r"(?:^|\b(?:pero|but)\s+)(?:solo|only|just|exactamente|exactly)\s+(\d+)",
    ]
    .iter()
    .map(|source| Regex::new(source).expect("correction pattern is valid"))
    .collect()
});

static CORRECTION_WORD: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(?:pero|but|corrige|correct|correccion|correction|solo|only|just|exactamente|exactly)\b")
        .expect("correction pattern is valid")
});

static SMALL_NUMBER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b(\d{1,2})\b").expect("correction pattern is valid"));

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DetectedCorrection {
    pub is_correction: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub corrected_parameter: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub corrected_value: Option<u32>,
    pub confidence: f64,
}

impl DetectedCorrection {
    pub fn none() -> Self {
        Self {
            is_correction: false,
            corrected_parameter: None,
            corrected_value: None,
            confidence: 0.0,
        }
    }

    fn limit(value: u32, confidence: f64) -> Self {
        Self {
            is_correction: true,
            corrected_parameter: Some(String::from("limit")),
            corrected_value: Some(value),
            confidence,
        }
    }
}

fn in_range(raw: &str) -> Option<u32> {
    raw.parse::<u32>()
        .ok()
        .filter(|value| (1..=100).contains(value))
}

/// Detect a correction of the result count requested earlier.
///
/// Only the `limit` parameter is corrected. A recognised phrase gives confidence 0.9;
/// a correction word next to a small number gives 0.7.
pub fn detect_correction(message: &str) -> DetectedCorrection {
    let text = fold(message.trim());

    let strong = STRONG.iter().find_map(|pattern| {
        pattern
            .captures(&text)
            .and_then(|captures| in_range(captures.get(1)?.as_str()))
    });
    if let Some(value) = strong {
        debug!(value, "correction detected");
        return DetectedCorrection::limit(value, STRONG_CONFIDENCE);
    }

    if CORRECTION_WORD.is_match(&text) {
        let weak = SMALL_NUMBER
            .captures(&text)
            .and_then(|captures| in_range(captures.get(1)?.as_str()));
        if let Some(value) = weak {
            debug!(value, "weak correction detected");
            return DetectedCorrection::limit(value, WEAK_CONFIDENCE);
        }
    }

    DetectedCorrection::none()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recognised_phrases_are_strong_corrections() {
        for message in [
            "pero te pedí solo 5",
            "Me mostraste 20, solo quiero 5",
            "but I asked for only 5",
            "corrige a 5",
            "solo 5",
        ] {
            let correction = detect_correction(message);
            assert!(correction.is_correction, "{message}");
            assert_eq!(correction.confidence, 0.9, "{message}");
        }
        assert_eq!(detect_correction("pero te pedí solo 5").corrected_value, Some(5));
    }

    #[test]
    fn shown_count_is_read_from_the_first_phrase() {
        // "me mostraste 20" matches before "solo quiero 5".
        assert_eq!(
            detect_correction("Me mostraste 20, solo quiero 5").corrected_value,
            Some(20)
        );
    }

    #[test]
    fn correction_word_with_number_is_weak() {
        let correction = detect_correction("eran 7 pero bueno");

        assert!(correction.is_correction);
        assert_eq!(correction.corrected_parameter.as_deref(), Some("limit"));
        assert_eq!(correction.corrected_value, Some(7));
        assert_eq!(correction.confidence, 0.7);
    }

    #[test]
    fn ordinary_messages_are_not_corrections() {
        assert_eq!(detect_correction("muéstrame mis gastos"), DetectedCorrection::none());
        assert_eq!(detect_correction("pero no sé"), DetectedCorrection::none());
        assert_eq!(detect_correction("solo 500"), DetectedCorrection::none());
    }
}
