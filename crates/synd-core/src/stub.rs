//! Minimal identity of an exportable content record.

use serde::{Deserialize, Serialize};

/// Placeholder publish date for records that carry none.
pub const DEFAULT_DATE: &str = "0000-00-00";

/// A minimal pointer to a content record, produced either by the document
/// store inquirer or by the publication-event mapper.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stub {
    /// Canonical content identifier.
    pub uuid: String,
    /// Publish date as `YYYY-MM-DD`, [`DEFAULT_DATE`] when absent.
    pub date: String,
    /// Content type, e.g. `"Article"`.
    pub content_type: String,
    /// Distribution marker; only the literal `"yes"` permits export.
    pub can_be_distributed: Option<String>,
    /// Publication identifiers the record belongs to; possibly empty.
    pub publication: Vec<String>,
}

/// Picks the publish date for a record: `firstPublishedDate` wins over
/// `publishedDate`, ISO-8601 values are truncated at the first `'T'`, and
/// records without either date get [`DEFAULT_DATE`].
pub fn date_or_default(
    first_published_date: Option<&str>,
    published_date: Option<&str>,
) -> String {
    for candidate in [first_published_date, published_date] {
        if let Some(value) = candidate {
            let date = value.split('T').next().unwrap_or_default();
            if !date.is_empty() {
                return date.to_string();
            }
        }
    }
    DEFAULT_DATE.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_published_date_wins() {
        let date = date_or_default(Some("2024-01-17T10:00:00.000Z"), Some("2024-02-01T09:00:00Z"));
        assert_eq!(date, "2024-01-17");
    }

    #[test]
    fn falls_back_to_published_date() {
        let date = date_or_default(None, Some("2024-02-01T09:00:00Z"));
        assert_eq!(date, "2024-02-01");
    }

    #[test]
    fn empty_first_published_date_falls_through() {
        let date = date_or_default(Some(""), Some("2024-02-01"));
        assert_eq!(date, "2024-02-01");
    }

    #[test]
    fn defaults_when_no_date_present() {
        assert_eq!(date_or_default(None, None), DEFAULT_DATE);
        assert_eq!(date_or_default(Some(""), Some("")), DEFAULT_DATE);
    }
}
