//! Review aggregation engine
//!
//! Every function here is a pure computation over a [`Dataset`] and a
//! [`CategoryFilter`]. Results are created fresh for each request and never
//! cached. Empty input gives empty or zero-filled output, never an error.

use chrono::{Datelike, NaiveDate};
use std::collections::{BTreeMap, HashMap};

use crate::config::DashboardConfig;
use crate::filter::CategoryFilter;
use crate::loader::Dataset;
use crate::review::{Review, Sentiment};
use crate::title::normalize_title;

/// Grouping values that carry no information and are left out of group views
const EXCLUDED_GROUP_VALUES: [&str; 3] = ["Unknown", "Unknown Brand", "Uncategorized"];

/// Every star rating, in axis order
pub const RATINGS: [u8; 5] = [1, 2, 3, 4, 5];

/// Per-label review counts
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SentimentCounts {
    pub positive: usize,
    pub neutral: usize,
    pub negative: usize,
}

impl SentimentCounts {
    pub fn tally<'a>(reviews: impl IntoIterator<Item = &'a Review>) -> Self {
        let mut counts = Self::default();
        for review in reviews {
            counts.add(review.sentiment);
        }
        counts
    }

    pub fn add(&mut self, sentiment: Sentiment) {
        match sentiment {
            Sentiment::Positive => self.positive += 1,
            Sentiment::Neutral => self.neutral += 1,
            Sentiment::Negative => self.negative += 1,
        }
    }

    pub fn get(&self, sentiment: Sentiment) -> usize {
        match sentiment {
            Sentiment::Positive => self.positive,
            Sentiment::Neutral => self.neutral,
            Sentiment::Negative => self.negative,
        }
    }

    pub fn total(&self) -> usize {
        self.positive + self.neutral + self.negative
    }

    /// Rows carrying any label other than `sentiment`
    pub fn other_than(&self, sentiment: Sentiment) -> usize {
        self.total() - self.get(sentiment)
    }

    /// Percentage of rows with `sentiment`; an empty bucket is 0% for every label
    pub fn share(&self, sentiment: Sentiment) -> f64 {
        match self.total() {
            0 => 0.0,
            total => self.get(sentiment) as f64 / total as f64 * 100.0,
        }
    }
}

/// Sentiment mix of the filtered rows (pie chart)
#[derive(Debug, Clone, PartialEq)]
pub struct OverallSummary {
    pub counts: SentimentCounts,
    pub total: usize,
}

pub fn overall_summary(dataset: &Dataset, filter: &CategoryFilter) -> OverallSummary {
    let counts = SentimentCounts::tally(dataset.filtered(filter));
    OverallSummary {
        counts,
        total: counts.total(),
    }
}

/// Sentiment mix of one star rating
#[derive(Debug, Clone, PartialEq)]
pub struct RatingBucket {
    pub rating: u8,
    pub counts: SentimentCounts,
}

impl RatingBucket {
    pub fn share(&self, sentiment: Sentiment) -> f64 {
        self.counts.share(sentiment)
    }
}

/// One bucket per rating 1..=5, in order, including ratings with no rows
pub fn rating_breakdown(dataset: &Dataset, filter: &CategoryFilter) -> Vec<RatingBucket> {
    let mut buckets: Vec<RatingBucket> = RATINGS
        .iter()
        .map(|&rating| RatingBucket {
            rating,
            counts: SentimentCounts::default(),
        })
        .collect();

    for review in dataset.filtered(filter) {
        // The loader guarantees 1..=5; anything else would be skipped, not panic
        if let Some(bucket) = buckets.get_mut(usize::from(review.rating).wrapping_sub(1)) {
            bucket.counts.add(review.sentiment);
        }
    }

    buckets
}

/// Review field a group view is keyed by
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GroupField {
    Category,
    Brand,
}

impl GroupField {
    /// Trimmed grouping value of a row, `None` when it is missing or uninformative
    fn value<'a>(&self, review: &'a Review) -> Option<&'a str> {
        let raw = match self {
            GroupField::Category => review.category.as_deref(),
            GroupField::Brand => review.brand.as_deref(),
        }?;

        let trimmed = raw.trim();
        if trimmed.is_empty() || EXCLUDED_GROUP_VALUES.contains(&trimmed) {
            None
        } else {
            Some(trimmed)
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            GroupField::Category => "Category",
            GroupField::Brand => "Brand",
        }
    }
}

/// Ranking key of a group view
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RankBy {
    Total,
    Count(Sentiment),
}

impl RankBy {
    fn key(&self, counts: &SentimentCounts) -> usize {
        match self {
            RankBy::Total => counts.total(),
            RankBy::Count(sentiment) => counts.get(*sentiment),
        }
    }
}

/// Parameters of a category or brand view
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupSpec {
    pub field: GroupField,
    /// Groups with fewer rows are dropped before ranking
    pub min_support: usize,
    pub top_n: usize,
    pub rank_by: RankBy,
}

impl GroupSpec {
    /// Top categories by positive review count
    pub fn categories(config: &DashboardConfig) -> Self {
        Self {
            field: GroupField::Category,
            min_support: 1,
            top_n: config.category_top_n,
            rank_by: RankBy::Count(Sentiment::Positive),
        }
    }

    /// Top brands by review volume, ignoring brands with too few reviews
    pub fn brands(config: &DashboardConfig) -> Self {
        Self {
            field: GroupField::Brand,
            min_support: config.brand_min_reviews,
            top_n: config.brand_top_n,
            rank_by: RankBy::Total,
        }
    }
}

/// Sentiment mix of one category or brand
#[derive(Debug, Clone, PartialEq)]
pub struct GroupSummary {
    pub key: String,
    pub counts: SentimentCounts,
}

impl GroupSummary {
    pub fn total(&self) -> usize {
        self.counts.total()
    }
}

/// Top groups of a category or brand view, best first
///
/// Ties keep the order in which the groups were first seen in the data.
pub fn group_summary(
    dataset: &Dataset,
    filter: &CategoryFilter,
    spec: &GroupSpec,
) -> Vec<GroupSummary> {
    let mut groups: Vec<GroupSummary> = tally_by(dataset.filtered(filter), |r| spec.field.value(r))
        .into_iter()
        .filter(|group| group.counts.total() >= spec.min_support)
        .map(|group| GroupSummary {
            key: group.key.to_string(),
            counts: group.counts,
        })
        .collect();

    groups.sort_by(|a, b| spec.rank_by.key(&b.counts).cmp(&spec.rank_by.key(&a.counts)));
    groups.truncate(spec.top_n);
    groups
}

/// Monthly review counts per label on a shared month axis
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TimeSeries {
    /// First day of each month, ascending and without gaps
    pub months: Vec<NaiveDate>,
    /// One count per month for each label, in [`Sentiment::ALL`] order
    pub series: Vec<(Sentiment, Vec<usize>)>,
}

impl TimeSeries {
    pub fn counts(&self, sentiment: Sentiment) -> &[usize] {
        self.series
            .iter()
            .find(|(s, _)| *s == sentiment)
            .map(|(_, counts)| counts.as_slice())
            .unwrap_or(&[])
    }
}

pub fn time_series(dataset: &Dataset, filter: &CategoryFilter) -> TimeSeries {
    let mut per_month: BTreeMap<NaiveDate, SentimentCounts> = BTreeMap::new();
    for review in dataset.filtered(filter) {
        per_month
            .entry(month_start(review.review_date))
            .or_default()
            .add(review.sentiment);
    }

    let (Some(first), Some(last)) = (per_month.keys().next(), per_month.keys().next_back()) else {
        return TimeSeries::default();
    };
    let months = month_span(*first, *last);

    let series = Sentiment::ALL
        .iter()
        .map(|&sentiment| {
            let counts = months
                .iter()
                .map(|m| per_month.get(m).map_or(0, |c| c.get(sentiment)))
                .collect();
            (sentiment, counts)
        })
        .collect();

    TimeSeries { months, series }
}

fn month_start(date: NaiveDate) -> NaiveDate {
    date.with_day(1).unwrap_or(date)
}

fn next_month(month: NaiveDate) -> Option<NaiveDate> {
    if month.month() == 12 {
        NaiveDate::from_ymd_opt(month.year() + 1, 1, 1)
    } else {
        NaiveDate::from_ymd_opt(month.year(), month.month() + 1, 1)
    }
}

/// Every month start from `first` to `last` inclusive
fn month_span(first: NaiveDate, last: NaiveDate) -> Vec<NaiveDate> {
    let mut months = Vec::new();
    let mut current = Some(first);
    while let Some(month) = current.filter(|m| *m <= last) {
        months.push(month);
        current = next_month(month);
    }
    months
}

/// Label a product ranking rewards
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RankTarget {
    Positive,
    Negative,
}

impl RankTarget {
    pub fn sentiment(&self) -> Sentiment {
        match self {
            RankTarget::Positive => Sentiment::Positive,
            RankTarget::Negative => Sentiment::Negative,
        }
    }
}

/// Parameters of a top-product view
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductRanking {
    pub target: RankTarget,
    pub min_reviews: usize,
    pub top_n: usize,
    pub title_max_len: usize,
}

impl ProductRanking {
    pub fn new(target: RankTarget, config: &DashboardConfig) -> Self {
        Self {
            target,
            min_reviews: config.product_min_reviews,
            top_n: config.product_top_n,
            title_max_len: config.title_max_len,
        }
    }
}

/// One ranked product
#[derive(Debug, Clone, PartialEq)]
pub struct ProductSummary {
    pub asin: String,
    /// Display title after normalisation
    pub title: String,
    pub counts: SentimentCounts,
    pub score: f64,
}

impl ProductSummary {
    pub fn total(&self) -> usize {
        self.counts.total()
    }

    /// `target:other` count label, e.g. `"20:2"`
    pub fn ratio_label(&self, target: RankTarget) -> String {
        let sentiment = target.sentiment();
        format!(
            "{}:{}",
            self.counts.get(sentiment),
            self.counts.other_than(sentiment)
        )
    }
}

/// Composite score rewarding both volume and skew towards the target label
///
/// `target * target / (other + 1)`; the `+ 1` keeps the ratio finite and damps
/// it for products with few reviews.
pub fn sentiment_score(target_count: usize, other_count: usize) -> f64 {
    let target = target_count as f64;
    target * (target / (other_count as f64 + 1.0))
}

/// Best-scoring products, highest score first
///
/// Rows without a usable title (missing, blank, or "untitled") are ignored,
/// as are rows without a product id. Products need at least
/// `min_reviews` remaining rows to be ranked. Ties keep first-seen order.
pub fn top_products(
    dataset: &Dataset,
    filter: &CategoryFilter,
    ranking: &ProductRanking,
) -> Vec<ProductSummary> {
    let titled = dataset.filtered(filter).filter(|r| has_usable_title(r));
    let target = ranking.target.sentiment();

    let mut products: Vec<ProductSummary> = tally_by(titled, |r| r.asin.as_deref())
        .into_iter()
        .filter(|group| group.counts.total() >= ranking.min_reviews)
        .map(|group| {
            let original = group.first.title.as_deref();
            ProductSummary {
                asin: group.key.to_string(),
                title: normalize_title(original, ranking.title_max_len),
                counts: group.counts,
                score: sentiment_score(group.counts.get(target), group.counts.other_than(target)),
            }
        })
        .collect();

    products.sort_by(|a, b| b.score.total_cmp(&a.score));
    products.truncate(ranking.top_n);
    products
}

fn has_usable_title(review: &Review) -> bool {
    match review.title.as_deref() {
        Some(title) => !title.trim().is_empty() && !title.to_lowercase().contains("untitled"),
        None => false,
    }
}

/// Counts of one group plus the first row that opened it
struct Tally<'a> {
    key: &'a str,
    first: &'a Review,
    counts: SentimentCounts,
}

/// Group rows by `key`, keeping groups in first-seen order
///
/// Rows whose key is `None` are skipped.
fn tally_by<'a, I, F>(rows: I, key: F) -> Vec<Tally<'a>>
where
    I: Iterator<Item = &'a Review>,
    F: Fn(&'a Review) -> Option<&'a str>,
{
    let mut groups: Vec<Tally<'a>> = Vec::new();
    let mut index: HashMap<&'a str, usize> = HashMap::new();

    for review in rows {
        let Some(k) = key(review) else { continue };
        let slot = *index.entry(k).or_insert_with(|| {
            groups.push(Tally {
                key: k,
                first: review,
                counts: SentimentCounts::default(),
            });
            groups.len() - 1
        });
        groups[slot].counts.add(review.sentiment);
    }

    groups
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_counts_have_zero_shares() {
        let counts = SentimentCounts::default();
        for sentiment in Sentiment::ALL {
            assert_eq!(counts.share(sentiment), 0.0);
        }
    }

    #[test]
    fn month_span_fills_gaps_across_year_end() {
        let first = NaiveDate::from_ymd_opt(2019, 11, 1).unwrap();
        let last = NaiveDate::from_ymd_opt(2020, 2, 1).unwrap();
        let months = month_span(first, last);
        assert_eq!(months.len(), 4);
        assert_eq!(months[2], NaiveDate::from_ymd_opt(2020, 1, 1).unwrap());
    }

    #[test]
    fn month_start_truncates_day() {
        let date = NaiveDate::from_ymd_opt(2021, 7, 23).unwrap();
        assert_eq!(month_start(date), NaiveDate::from_ymd_opt(2021, 7, 1).unwrap());
    }

    #[test]
    fn score_damps_small_products() {
        assert!((sentiment_score(20, 2) - 400.0 / 3.0).abs() < 1e-9);
        assert_eq!(sentiment_score(5, 0), 25.0);
        assert_eq!(sentiment_score(0, 7), 0.0);
    }

    #[test]
    fn untitled_rows_are_unusable() {
        let mut review = Review {
            asin: Some("B00".to_string()),
            title: Some("Untitled Product".to_string()),
            brand: None,
            category: None,
            rating: 4,
            sentiment: Sentiment::Positive,
            review_date: NaiveDate::from_ymd_opt(2020, 1, 1).unwrap(),
        };
        assert!(!has_usable_title(&review));
        review.title = Some("   ".to_string());
        assert!(!has_usable_title(&review));
        review.title = Some("Phone Case".to_string());
        assert!(has_usable_title(&review));
    }
}
