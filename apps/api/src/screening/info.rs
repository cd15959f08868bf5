//! Heuristic information extraction from resume text: name, contact details, years of experience.

use once_cell::sync::Lazy;
use regex::Regex;

pub const UNKNOWN_NAME: &str = "Unknown";

/// How many non-empty lines from the top of the resume are considered for the name.
const NAME_SCAN_LINES: usize = 5;
const NAME_MAX_TOKENS: usize = 3;

static EMAIL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"[A-Za-z0-9._%+\-]+@[A-Za-z0-9.\-]+\.[A-Za-z]{2,}").expect("valid email regex")
});

static PHONE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\+?\(?\d[\d \t().\-]{5,}\d").expect("valid phone regex"));

static YEAR_RANGE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(?:19|20)\d{2}\s*[-.]\s*(?:19|20)\d{2}$").expect("valid year range regex"));

static YEARS_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(\d{1,2})\s*\+?\s*(?:years?|yrs?)\b").expect("valid years regex")
});

const PHONE_MIN_DIGITS: usize = 7;
const PHONE_MAX_DIGITS: usize = 15;

/// Guesses the candidate's name: the first short line near the top of the resume.
///
/// Scans at most the first five non-empty lines and returns the first whose
/// trimmed form is longer than one character and has at most three
/// whitespace-separated tokens. Falls back to `"Unknown"`.
pub fn extract_name(text: &str) -> String {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .take(NAME_SCAN_LINES)
        .find(|line| {
            line.chars().count() > 1 && line.split_whitespace().count() <= NAME_MAX_TOKENS
        })
        .map(str::to_string)
        .unwrap_or_else(|| UNKNOWN_NAME.to_string())
}

pub fn extract_email(text: &str) -> Option<String> {
    EMAIL_RE.find(text).map(|m| m.as_str().to_string())
}

/// First run of digits and separators that looks like a phone number.
pub fn extract_phone(text: &str) -> Option<String> {
    PHONE_RE
        .find_iter(text)
        .map(|m| m.as_str().trim())
        .find(|candidate| {
            let digits = candidate.chars().filter(char::is_ascii_digit).count();
            (PHONE_MIN_DIGITS..=PHONE_MAX_DIGITS).contains(&digits)
                && !YEAR_RANGE_RE.is_match(candidate)
        })
        .map(str::to_string)
}

/// Largest "N years" / "N+ yrs" mention in the text.
pub fn extract_experience_years(text: &str) -> Option<u32> {
    YEARS_RE
        .captures_iter(text)
        .filter_map(|c| c.get(1).and_then(|m| m.as_str().parse::<u32>().ok()))
        .max()
}
