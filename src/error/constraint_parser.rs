use std::sync::OnceLock;
use regex::Regex;

/// Utility for parsing PostgreSQL constraint violation messages.
///
/// Registration relies on this to tell a duplicate name from a duplicate
/// email, so the store can report which uniqueness constraint fired.
pub struct ConstraintParser;

/// Suffixes Postgres (and our migrations) append to unique constraint names
const UNIQUE_SUFFIXES: [&str; 3] = ["_key", "_unique", "_idx"];

struct RegexPatterns {
    key_value: Regex,
    column_name: Regex,
    table_name: Regex,
}

impl RegexPatterns {
    fn new() -> Self {
        Self {
            // Matches "Key (field)=(value)" pattern in PostgreSQL messages
            key_value: Regex::new(r"Key \(([^)]+)\)=\(([^)]*)\)").unwrap(),
            column_name: Regex::new(r#"column "([^"]+)""#).unwrap(),
            table_name: Regex::new(r#"(?:table|relation) "([^"]+)""#).unwrap(),
        }
    }
}

static REGEX_PATTERNS: OnceLock<RegexPatterns> = OnceLock::new();

impl ConstraintParser {
    fn patterns() -> &'static RegexPatterns {
        REGEX_PATTERNS.get_or_init(RegexPatterns::new)
    }

    /// Parses a unique constraint violation into `(entity, field, value)`.
    ///
    /// The constraint name wins when present (`users_email_key`,
    /// `users_name_unique`); otherwise the `Key (field)=(value)` detail of
    /// the message is used.
    ///
    /// # Examples
    /// ```
    /// use knowstro_rs::error::ConstraintParser;
    ///
    /// let message = "duplicate key value violates unique constraint \"users_email_key\"\nDETAIL: Key (email)=(a@x.com) already exists.";
    /// let result = ConstraintParser::parse_unique_violation(message, Some("users_email_key"));
    /// assert_eq!(result, Some(("users".to_string(), "email".to_string(), "a@x.com".to_string())));
    /// ```
    pub fn parse_unique_violation(
        message: &str,
        constraint_name: Option<&str>,
    ) -> Option<(String, String, String)> {
        if let Some((entity, field)) = constraint_name.and_then(Self::parse_constraint_name) {
            let value = Self::extract_key_value_from_message(message)
                .map(|(_, value)| value)
                .unwrap_or_else(|| "duplicate_value".to_string());
            return Some((entity, field, value));
        }

        let (field, value) = Self::extract_key_value_from_message(message)?;
        let entity = Self::extract_table_from_message(message)
            .unwrap_or_else(|| "resource".to_string());
        Some((entity, field, value))
    }

    /// Parses a not null violation into `(entity, field)`.
    pub fn parse_not_null_violation(message: &str) -> Option<(String, String)> {
        let field = Self::extract_column_from_message(message)?;
        let entity = Self::extract_table_from_message(message)
            .unwrap_or_else(|| "resource".to_string());
        Some((entity, field))
    }

    /// Splits a unique constraint name into table and column.
    ///
    /// - "users_email_key" -> ("users", "email")
    /// - "users_name_unique" -> ("users", "name")
    /// - "users_password_hash_key" -> ("users", "password_hash")
    pub fn parse_constraint_name(constraint_name: &str) -> Option<(String, String)> {
        let stem = UNIQUE_SUFFIXES
            .iter()
            .find_map(|suffix| constraint_name.strip_suffix(suffix))?;
        let (entity, field) = stem.split_once('_')?;
        if entity.is_empty() || field.is_empty() {
            return None;
        }
        Some((entity.to_string(), field.to_string()))
    }

    pub fn extract_column_from_message(message: &str) -> Option<String> {
        Self::patterns()
            .column_name
            .captures(message)
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str().to_string())
    }

    pub fn extract_table_from_message(message: &str) -> Option<String> {
        Self::patterns()
            .table_name
            .captures(message)
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str().to_string())
    }

    /// Extracts `(field, value)` from a "Key (field)=(value)" detail line.
    pub fn extract_key_value_from_message(message: &str) -> Option<(String, String)> {
        Self::patterns()
            .key_value
            .captures(message)
            .and_then(|caps| {
                let field = caps.get(1)?.as_str().to_string();
                let value = caps.get(2)?.as_str().to_string();
                Some((field, value))
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_unique_violation_email() {
        let message = "duplicate key value violates unique constraint \"users_email_key\"\nDETAIL: Key (email)=(a@x.com) already exists.";
        let result = ConstraintParser::parse_unique_violation(message, Some("users_email_key"));
        assert_eq!(result, Some(("users".to_string(), "email".to_string(), "a@x.com".to_string())));
    }

    #[test]
    fn test_parse_unique_violation_name_unique_suffix() {
        let message = "duplicate key value violates unique constraint \"users_name_unique\"\nDETAIL: Key (name)=(alice) already exists.";
        let result = ConstraintParser::parse_unique_violation(message, Some("users_name_unique"));
        assert_eq!(result, Some(("users".to_string(), "name".to_string(), "alice".to_string())));
    }

    #[test]
    fn test_parse_unique_violation_without_constraint_name() {
        let message = "duplicate key value violates unique constraint\nDETAIL: Key (name)=(bob) already exists.";
        let result = ConstraintParser::parse_unique_violation(message, None);
        assert_eq!(result, Some(("resource".to_string(), "name".to_string(), "bob".to_string())));
    }

    #[test]
    fn test_parse_constraint_name() {
        assert_eq!(
            ConstraintParser::parse_constraint_name("users_email_key"),
            Some(("users".to_string(), "email".to_string()))
        );
        assert_eq!(
            ConstraintParser::parse_constraint_name("users_password_hash_key"),
            Some(("users".to_string(), "password_hash".to_string()))
        );
        assert_eq!(ConstraintParser::parse_constraint_name("tokens_pkey"), None);
        assert_eq!(ConstraintParser::parse_constraint_name("invalid"), None);
    }

    #[test]
    fn test_parse_not_null_violation_with_relation() {
        let message = "null value in column \"email\" of relation \"users\" violates not-null constraint";
        let result = ConstraintParser::parse_not_null_violation(message);
        assert_eq!(result, Some(("users".to_string(), "email".to_string())));
    }

    #[test]
    fn test_graceful_parsing_failures() {
        let message = "completely unrelated error message";
        assert_eq!(ConstraintParser::parse_unique_violation(message, None), None);
        assert_eq!(ConstraintParser::parse_not_null_violation(message), None);
    }
}
