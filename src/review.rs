use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Pre-assigned sentiment label of a review
///
/// The order of the variants is the order labels appear in every chart and
/// series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sentiment {
    Positive,
    Neutral,
    Negative,
}

impl Sentiment {
    /// All labels in display order
    pub const ALL: [Sentiment; 3] = [Sentiment::Positive, Sentiment::Neutral, Sentiment::Negative];

    pub fn from_label(label: &str) -> Option<Self> {
        match label.trim().to_lowercase().as_str() {
            "positive" => Some(Sentiment::Positive),
            "neutral" => Some(Sentiment::Neutral),
            "negative" => Some(Sentiment::Negative),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Sentiment::Positive => "positive",
            Sentiment::Neutral => "neutral",
            Sentiment::Negative => "negative",
        }
    }

    /// Marker colour used for this label on every chart
    pub fn color(&self) -> &'static str {
        match self {
            Sentiment::Positive => "#3498db",
            Sentiment::Neutral => "#9b59b6",
            Sentiment::Negative => "#1abc9c",
        }
    }
}

impl fmt::Display for Sentiment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// One labelled product review
#[derive(Debug, Clone, PartialEq)]
pub struct Review {
    /// Product identifier
    pub asin: Option<String>,

    /// Product title as scraped, marketing suffixes and all
    pub title: Option<String>,

    pub brand: Option<String>,

    /// Product category, `None` when the cell was empty
    pub category: Option<String>,

    /// Star rating, always within 1..=5
    pub rating: u8,

    pub sentiment: Sentiment,

    pub review_date: NaiveDate,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn labels_parse_case_insensitively() {
        assert_eq!(Sentiment::from_label("Positive"), Some(Sentiment::Positive));
        assert_eq!(Sentiment::from_label(" NEGATIVE "), Some(Sentiment::Negative));
        assert_eq!(Sentiment::from_label("mixed"), None);
    }
}
