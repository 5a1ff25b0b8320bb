//! Slug and random token generation.

use rand::distributions::Alphanumeric;
use rand::Rng;

const MAX_SLUG_BASE_LEN: usize = 48;
const SLUG_SUFFIX_LEN: usize = 6;

/// Lower-case, dash separated form of an event name.
pub fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    let mut pending_dash = false;

    for ch in name.chars().flat_map(char::to_lowercase) {
        if ch.is_ascii_alphanumeric() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.push(ch);
            if slug.len() >= MAX_SLUG_BASE_LEN {
                break;
            }
        } else {
            pending_dash = true;
        }
    }

    if slug.is_empty() {
        "event".to_string()
    } else {
        slug
    }
}

/// Slug for a new event: the slugified name plus a random suffix.
pub fn generate_slug(name: &str) -> String {
    format!("{}-{}", slugify(name), random_token(SLUG_SUFFIX_LEN))
}

/// Random lower-case alphanumeric token.
pub fn random_token(len: usize) -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(len)
        .map(|byte| char::from(byte).to_ascii_lowercase())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slugify_collapses_separators() {
        assert_eq!(slugify("Priya & Arjun's Wedding!"), "priya-arjun-s-wedding");
        assert_eq!(slugify("  --Summer   Fest 2025-- "), "summer-fest-2025");
    }

    #[test]
    fn slugify_falls_back_for_symbol_only_names() {
        assert_eq!(slugify("🎉🎉"), "event");
        assert_eq!(slugify(""), "event");
    }

    #[test]
    fn slugify_caps_length() {
        let long = "a".repeat(200);
        assert_eq!(slugify(&long).len(), MAX_SLUG_BASE_LEN);
    }

    #[test]
    fn generated_slugs_carry_random_suffix() {
        let first = generate_slug("Garden Party");
        let second = generate_slug("Garden Party");
        assert!(first.starts_with("garden-party-"));
        assert_eq!(first.len(), "garden-party-".len() + SLUG_SUFFIX_LEN);
        assert_ne!(first, second);
    }
}
