//! Provider name → URL segment convention.
//!
//! # Design Decisions
//! - Naive on purpose: provider names are chosen by developers, not users
//! - Every upper-case letter after the first starts a new `_`-separated word
//! - Pluralization is a literal trailing `s` (no irregular forms)

/// Convert a provider name into its URL path segment.
///
/// `UserAccount` → `user_accounts`. Callers guarantee a non-empty name
/// starting with an upper-case letter (enforced at registration).
pub fn to_url_segment(name: &str) -> String {
    let mut segment = String::with_capacity(name.len() + 4);

    for (i, ch) in name.chars().enumerate() {
        if ch.is_uppercase() {
            if i != 0 {
                segment.push('_');
            }
            segment.extend(ch.to_lowercase());
        } else {
            segment.push(ch);
        }
    }
    segment.push('s');

    segment
}

/// Registration rule for provider names: non-empty, upper-case first letter.
pub fn is_valid_provider_name(name: &str) -> bool {
    name.chars().next().is_some_and(char::is_uppercase)
}
