//! Regexes shared by the reconstructor, tracker and matcher.

use regex::Regex;
use std::sync::OnceLock;

/// Row-leading date token used for column detection: `31/03`, `1/4`.
pub fn date_token_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^\d{1,2}/\d{1,2}").expect("date token regex"))
}

/// A monetary value at the start of a text: `1.234,56`, `- 0,02`.
pub fn leading_value_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[+-]?\s*\d{1,3}(?:\.\d{3})*,\d{2}").expect("leading value regex"))
}

/// A text that is nothing but a monetary value.
pub fn value_only_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^-?\s*\d{1,3}(?:\.\d{3})*,\d{2}$").expect("value only regex"))
}

/// Date (1-4 digits to absorb OCR junk), lazy middle, signed amount.
pub fn transaction_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?P<date>\d{1,4}/\d{2})(?P<middle>.*?)(?P<amount>-?\d{1,3}(?:\.\d{3})*,\d{2})")
            .expect("transaction regex")
    })
}

/// `- 12,34` -> `-12,34`
pub fn detached_sign_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"-\s+(\d)").expect("detached sign regex"))
}
