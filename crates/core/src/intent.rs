use crate::models::Intent;

pub fn normalize_text(input: &str) -> String {
    input
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .trim()
        .to_string()
}

/// Keyword rules are checked in order, so "pnr" wins over "train" when a
/// request mentions both.
pub fn classify_intent(text: &str) -> Intent {
    let lower = text.to_lowercase();

    if lower.contains("pnr") {
        return Intent::PnrQuery;
    }

    if lower.contains("train") {
        return Intent::TrainQuery;
    }

    Intent::Unknown
}
