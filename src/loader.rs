use chrono::{DateTime, NaiveDate, NaiveDateTime};
use csv::{ReaderBuilder, StringRecord};
use log::{debug, info};
use std::collections::BTreeSet;
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use crate::error::LoadError;
use crate::filter::{ALL_CATEGORIES, CategoryFilter};
use crate::review::{Review, Sentiment};

/// Category columns in order of preference; older exports only carry `main_category`
const CATEGORY_COLUMNS: [&str; 3] = ["overall_category", "main_category", "category"];

/// Umbrella category that is hidden from the category selector
const UMBRELLA_CATEGORY: &str = "All Electronics";

/// Immutable, ordered collection of reviews
///
/// Built once from the CSV export and shared read-only between requests.
#[derive(Debug, Clone, Default)]
pub struct Dataset {
    reviews: Vec<Review>,
}

impl Dataset {
    /// Load the dataset from a CSV file
    ///
    /// # Arguments
    /// * `filepath` - Path to the review export
    ///
    /// # Returns
    /// * `Result<Dataset, LoadError>` - The parsed dataset or the first problem found
    ///
    /// # Examples
    /// ```no_run
    /// use review_dashboard::loader::Dataset;
    ///
    /// match Dataset::from_csv("data/reviews.csv") {
    ///     Ok(data) => println!("Loaded {} reviews", data.len()),
    ///     Err(e) => eprintln!("Error loading CSV: {}", e),
    /// }
    /// ```
    pub fn from_csv(filepath: impl AsRef<Path>) -> Result<Self, LoadError> {
        let path = filepath.as_ref();
        let file = File::open(path).map_err(|source| LoadError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        let dataset = Self::from_reader(file)?;
        info!("Loaded {} reviews from {}", dataset.len(), path.display());
        Ok(dataset)
    }

    /// Parse CSV text with a header row
    ///
    /// Columns are located by header name, so their order does not matter and
    /// extra columns are ignored. `review_date`, `overall` and `sentiment` are
    /// required; everything else is optional.
    pub fn from_reader(reader: impl Read) -> Result<Self, LoadError> {
        let mut csv_reader = ReaderBuilder::new().has_headers(true).from_reader(reader);
        let columns = Columns::locate(csv_reader.headers()?)?;

        let mut reviews = Vec::new();
        for record in csv_reader.records() {
            let record = record?;
            reviews.push(columns.parse_row(&record)?);
        }

        Ok(Self { reviews })
    }

    pub fn reviews(&self) -> &[Review] {
        &self.reviews
    }

    pub fn len(&self) -> usize {
        self.reviews.len()
    }

    pub fn is_empty(&self) -> bool {
        self.reviews.is_empty()
    }

    /// Rows passing the category filter, in original order
    pub fn filtered<'a>(&'a self, filter: &'a CategoryFilter) -> impl Iterator<Item = &'a Review> + 'a {
        self.reviews.iter().filter(move |r| filter.matches(r))
    }

    /// Sorted distinct non-blank category values
    pub fn categories(&self) -> Vec<String> {
        self.reviews
            .iter()
            .filter_map(|r| r.category.as_deref())
            .filter(|c| !c.trim().is_empty())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .map(str::to_string)
            .collect()
    }

    /// Options for the category selector, "All Categories" first
    pub fn selector_categories(&self) -> Vec<String> {
        std::iter::once(ALL_CATEGORIES.to_string())
            .chain(
                self.categories()
                    .into_iter()
                    .filter(|c| c != UMBRELLA_CATEGORY),
            )
            .collect()
    }
}

/// Header positions of the columns the dashboard reads
struct Columns {
    review_date: usize,
    rating: usize,
    sentiment: usize,
    category: Option<usize>,
    brand: Option<usize>,
    asin: Option<usize>,
    title: Option<usize>,
}

impl Columns {
    fn locate(headers: &StringRecord) -> Result<Self, LoadError> {
        let find = |name: &str| headers.iter().position(|h| h.trim() == name);
        let require = |name: &'static str| find(name).ok_or(LoadError::MissingColumn(name));

        Ok(Self {
            review_date: require("review_date")?,
            rating: require("overall")?,
            sentiment: require("sentiment")?,
            category: CATEGORY_COLUMNS.iter().find_map(|name| find(*name)),
            brand: find("brand"),
            asin: find("asin"),
            title: find("title"),
        })
    }

    fn parse_row(&self, record: &StringRecord) -> Result<Review, LoadError> {
        let line = record.position().map(|p| p.line()).unwrap_or(0);
        let invalid = |reason: String| LoadError::InvalidRow { line, reason };

        let rating_text = record.get(self.rating).unwrap_or("");
        let rating = parse_rating(rating_text)
            .ok_or_else(|| invalid(format!("rating `{}` is not a whole number from 1 to 5", rating_text)))?;

        let sentiment_text = record.get(self.sentiment).unwrap_or("");
        let sentiment = Sentiment::from_label(sentiment_text)
            .ok_or_else(|| invalid(format!("unknown sentiment label `{}`", sentiment_text)))?;

        let date_text = record.get(self.review_date).unwrap_or("");
        let review_date = parse_review_date(date_text)
            .ok_or_else(|| invalid(format!("unparsable review date `{}`", date_text)))?;

        let optional = |index: Option<usize>| {
            index
                .and_then(|i| record.get(i))
                .filter(|v| !v.is_empty())
                .map(str::to_string)
        };

        Ok(Review {
            asin: optional(self.asin),
            title: optional(self.title),
            brand: optional(self.brand),
            category: optional(self.category),
            rating,
            sentiment,
            review_date,
        })
    }
}

/// Ratings are exported as floats (`5.0`) by some tools
fn parse_rating(text: &str) -> Option<u8> {
    let value: f64 = text.trim().parse().ok()?;
    if value.fract() != 0.0 || !(1.0..=5.0).contains(&value) {
        return None;
    }
    Some(value as u8)
}

fn parse_review_date(text: &str) -> Option<NaiveDate> {
    let text = text.trim();
    NaiveDate::parse_from_str(text, "%Y-%m-%d")
        .ok()
        .or_else(|| {
            NaiveDateTime::parse_from_str(text, "%Y-%m-%d %H:%M:%S")
                .ok()
                .map(|dt| dt.date())
        })
        .or_else(|| DateTime::parse_from_rfc3339(text).ok().map(|dt| dt.date_naive()))
}

/// Single-slot, process-lifetime cache of the dataset
///
/// The first successful `get` loads the file and every later call returns the
/// same instance. The slot is filled under a mutex so concurrent first
/// requests never observe a half-built dataset. A failed load leaves the
/// slot empty.
#[derive(Debug)]
pub struct DatasetCache {
    path: PathBuf,
    slot: Mutex<Option<Arc<Dataset>>>,
}

impl DatasetCache {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            slot: Mutex::new(None),
        }
    }

    /// Shared dataset, loading it on first use
    ///
    /// # Errors
    /// * Propagates any [`LoadError`] from reading the file
    pub fn get(&self) -> Result<Arc<Dataset>, LoadError> {
        // Poisoning cannot leave a partial value behind; the slot is only
        // written after a complete load.
        let mut slot = self.slot.lock().unwrap_or_else(|e| e.into_inner());

        if let Some(dataset) = slot.as_ref() {
            return Ok(Arc::clone(dataset));
        }

        debug!("Dataset cache empty, loading {}", self.path.display());
        let dataset = Arc::new(Dataset::from_csv(&self.path)?);
        *slot = Some(Arc::clone(&dataset));
        Ok(dataset)
    }

    pub fn is_loaded(&self) -> bool {
        self.slot.lock().map(|s| s.is_some()).unwrap_or(false)
    }
}
