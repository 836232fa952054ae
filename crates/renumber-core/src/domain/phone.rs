use crate::error::CoreError;
use serde::{Deserialize, Serialize};
use std::fmt;

const COUNTRY_CODE: &str = "91";
const LOCAL_DIGITS: usize = 10;

/// Digits-only form of a phone number, used to match contacts.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NormalizedNumber(String);

impl NormalizedNumber {
    pub fn parse(raw: &str) -> Result<Self, CoreError> {
        let digits = normalize_number(raw);
        if digits.is_empty() {
            return Err(CoreError::EmptyNumber(raw.trim().to_string()));
        }
        Ok(Self(digits))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn variants(&self) -> Vec<String> {
        search_variants(&self.0)
    }
}

impl fmt::Display for NormalizedNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Strips everything but ASCII digits. Numbers longer than ten digits that
/// start with the Indian country code keep only their trailing ten digits.
///
/// The prefix check is a heuristic: a longer foreign number that happens to
/// start with `91` is cut down the same way.
pub fn normalize_number(raw: &str) -> String {
    let digits: String = raw.chars().filter(|ch| ch.is_ascii_digit()).collect();
    if digits.starts_with(COUNTRY_CODE) && digits.len() > LOCAL_DIGITS {
        return digits[digits.len() - LOCAL_DIGITS..].to_string();
    }
    digits
}

/// Textual forms a contacts search index may have stored for `digits`.
///
/// Always yields the plain digits and the `+91` form. Ten-digit numbers also
/// get `XXX-XXX-XXXX` and `XXXXX XXXXX`; eleven-digit numbers get
/// `XXXXXX XXXXX`. No duplicates; order is stable.
pub fn search_variants(digits: &str) -> Vec<String> {
    let mut variants = vec![digits.to_string(), format!("+{COUNTRY_CODE}{digits}")];

    // Slicing by byte offset relies on the input being ASCII digits.
    let ascii = digits.is_ascii();
    match digits.len() {
        10 if ascii => {
            variants.push(format!("{}-{}-{}", &digits[..3], &digits[3..6], &digits[6..]));
            variants.push(format!("{} {}", &digits[..5], &digits[5..]));
        }
        11 if ascii => {
            variants.push(format!("{} {}", &digits[..6], &digits[6..]));
        }
        _ => {}
    }

    let mut seen = std::collections::HashSet::new();
    variants.retain(|variant| seen.insert(variant.clone()));
    variants
}
