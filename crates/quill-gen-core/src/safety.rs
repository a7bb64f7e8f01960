//! Content safety filter
//!
//! A pure, deterministic pattern classifier applied to every inbound field
//! and every outbound text. False positives are the accepted failure mode;
//! a flagged string is never sent to (or returned from) the model.

use regex::RegexSet;
use regex::RegexSetBuilder;

/// Disallowed patterns. Character classes cover the common letter/digit
/// look-alikes so trivial substitutions match the plain form.
const BLOCKLIST: &[&str] = &[
    // Hate speech & slurs (representative, not exhaustive)
    r"n[i!1]gg[e3]r",
    r"k[i!1]k[e3]",
    r"sp[i!1]c\b",
    r"ch[i!1]nk",
    // Explicit violence
    r"kill\s(your|them)self",
    r"i want to kill",
    r"murder them",
    r"bomb the place",
    r"shoot up",
    // Doxxing
    r"d[o0]xx[i!1]ng",
    r"release personal info",
    r"address is",
    r"phone number is",
    r"social security number",
    // Illegal instructions
    r"how to make a bomb",
    r"how to cook meth",
    r"steal credit card",
    r"how to commit fraud",
];

/// Pattern-based safety classifier
#[derive(Clone)]
pub struct SafetyFilter {
    patterns: RegexSet,
}

impl SafetyFilter {
    /// Build the filter with the fixed blocklist
    pub fn new() -> Self {
        Self::with_patterns(BLOCKLIST)
    }

    /// Build a filter over a custom pattern set
    pub fn with_patterns(patterns: &[&str]) -> Self {
        let patterns = RegexSetBuilder::new(patterns)
            .case_insensitive(true)
            .build()
            // The blocklist is a compile-time constant; a bad pattern is a
            // programming error, not a runtime condition.
            .expect("safety blocklist patterns must compile");
        Self { patterns }
    }

    /// Whether the text is free of disallowed patterns
    pub fn is_safe(&self, text: &str) -> bool {
        !self.patterns.is_match(text)
    }
}

impl Default for SafetyFilter {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clean_text_is_safe() {
        let filter = SafetyFilter::new();
        for text in [
            "Just shipped a new feature, so proud of the team!",
            "What's your favorite productivity hack?",
            "Coffee first, code second.",
            "",
        ] {
            assert!(filter.is_safe(text), "{text}");
        }
    }

    #[test]
    fn blocklisted_phrases_are_unsafe() {
        let filter = SafetyFilter::new();
        for text in [
            "here is how to make a bomb",
            "I'll murder them all",
            "their address is 12 Main St",
            "go shoot up the school",
        ] {
            assert!(!filter.is_safe(text), "{text}");
        }
    }

    #[test]
    fn matching_is_case_insensitive() {
        let filter = SafetyFilter::new();
        assert!(!filter.is_safe("HOW TO MAKE A BOMB"));
        assert!(!filter.is_safe("How To Cook Meth"));
        assert!(!filter.is_safe("Steal Credit Card numbers"));
    }

    #[test]
    fn leetspeak_substitutions_match() {
        let filter = SafetyFilter::new();
        assert!(!filter.is_safe("stop d0xx1ng people"));
        assert!(!filter.is_safe("doxxing is fine actually"));
    }

    #[test]
    fn substrings_inside_longer_text_match() {
        let filter = SafetyFilter::new();
        assert!(!filter.is_safe(
            "Totally normal tweet... but also their phone number is 555-0199, spread it"
        ));
    }
}
