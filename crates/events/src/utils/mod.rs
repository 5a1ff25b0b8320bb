//! Utility helpers for the events crate.

pub mod datetime;
pub mod slug;
pub mod validation;

pub use datetime::{combine_local, format_timestamp, parse_timestamp, split_local, utc_offset};
pub use slug::{generate_slug, random_token, slugify};
pub use validation::Validator;

/// Trim a form value and drop it when nothing is left.
pub fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn non_empty_drops_blank_values() {
        assert_eq!(non_empty(None), None);
        assert_eq!(non_empty(Some("   ".into())), None);
        assert_eq!(non_empty(Some(" Hall A ".into())), Some("Hall A".into()));
    }
}
