use crate::review::Review;

/// Values of the category selector that mean "no filtering"
pub const ALL_CATEGORIES: &str = "All Categories";
const ALL_SHORTHAND: &str = "all";

/// Optional restriction of the dataset to a single category
///
/// Matching is an exact string comparison on the category field. A category
/// that does not exist in the data is not an error; it simply matches no rows.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum CategoryFilter {
    #[default]
    All,
    Only(String),
}

impl CategoryFilter {
    /// Build a filter from a request parameter
    ///
    /// Absent, empty, `"All Categories"` and `"all"` all select every row.
    pub fn from_param(param: Option<&str>) -> Self {
        match param {
            None => CategoryFilter::All,
            Some(p) if p.is_empty() || p == ALL_CATEGORIES || p == ALL_SHORTHAND => {
                CategoryFilter::All
            }
            Some(p) => CategoryFilter::Only(p.to_string()),
        }
    }

    pub fn matches(&self, review: &Review) -> bool {
        match self {
            CategoryFilter::All => true,
            CategoryFilter::Only(wanted) => review.category.as_deref() == Some(wanted.as_str()),
        }
    }

    /// Suffix appended to chart titles, e.g. `" - Headphones"`
    pub fn title_suffix(&self) -> String {
        match self {
            CategoryFilter::All => String::new(),
            CategoryFilter::Only(c) => format!(" - {}", c),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::review::Sentiment;
    use chrono::NaiveDate;

    fn review_in(category: Option<&str>) -> Review {
        Review {
            asin: None,
            title: None,
            brand: None,
            category: category.map(str::to_string),
            rating: 3,
            sentiment: Sentiment::Neutral,
            review_date: NaiveDate::from_ymd_opt(2020, 1, 1).unwrap(),
        }
    }

    #[test]
    fn sentinel_values_disable_filtering() {
        assert_eq!(CategoryFilter::from_param(None), CategoryFilter::All);
        assert_eq!(CategoryFilter::from_param(Some("")), CategoryFilter::All);
        assert_eq!(CategoryFilter::from_param(Some("all")), CategoryFilter::All);
        assert_eq!(
            CategoryFilter::from_param(Some("All Categories")),
            CategoryFilter::All
        );
    }

    #[test]
    fn match_is_exact() {
        let filter = CategoryFilter::from_param(Some("Headphones"));
        assert!(filter.matches(&review_in(Some("Headphones"))));
        assert!(!filter.matches(&review_in(Some("headphones"))));
        assert!(!filter.matches(&review_in(None)));
        assert!(CategoryFilter::All.matches(&review_in(None)));
    }

    #[test]
    fn title_suffix_names_the_category() {
        assert_eq!(CategoryFilter::All.title_suffix(), "");
        assert_eq!(
            CategoryFilter::Only("Cameras".to_string()).title_suffix(),
            " - Cameras"
        );
    }
}
