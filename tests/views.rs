use std::io::Write;
use std::sync::Arc;

use review_dashboard::aggregate::{
    GroupSpec, ProductRanking, RankTarget, group_summary, overall_summary, rating_breakdown,
    time_series, top_products,
};
use review_dashboard::dashboard::{ViewKind, build_payload};
use review_dashboard::report::render_report;
use review_dashboard::{
    CategoryFilter, DashboardConfig, Dataset, DatasetCache, LoadError, Sentiment,
};
use tempfile::NamedTempFile;

const HEADER: &str = "asin,title,brand,main_category,overall,sentiment,review_date";

struct Rows(Vec<String>);

impl Rows {
    fn new() -> Self {
        Rows(Vec::new())
    }

    fn add(
        &mut self,
        count: usize,
        asin: &str,
        title: &str,
        brand: &str,
        category: &str,
        rating: u8,
        sentiment: &str,
        date: &str,
    ) -> &mut Self {
        for _ in 0..count {
            self.0.push(format!(
                "{},\"{}\",{},{},{},{},{}",
                asin, title, brand, category, rating, sentiment, date
            ));
        }
        self
    }

    fn csv(&self) -> String {
        let mut text = String::from(HEADER);
        for row in &self.0 {
            text.push('\n');
            text.push_str(row);
        }
        text.push('\n');
        text
    }

    fn dataset(&self) -> Dataset {
        Dataset::from_reader(self.csv().as_bytes()).unwrap()
    }

    fn file(&self) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(self.csv().as_bytes()).unwrap();
        file
    }
}

fn mixed_rows() -> Rows {
    let mut rows = Rows::new();
    rows.add(20, "P1", "Widget One", "Globex", "Electronics", 5, "Positive", "2023-01-10")
        .add(1, "P1", "Widget One", "Globex", "Electronics", 3, "Neutral", "2023-01-11")
        .add(1, "P1", "Widget One", "Globex", "Electronics", 1, "Negative", "2023-03-02")
        .add(5, "P2", "Widget Two", "Acme", "Home", 4, "Positive", "2023-03-05")
        .add(4, "P3", "Gadget", "Acme", "Home", 2, "Negative", "2023-03-06");
    rows
}

fn mixed_dataset() -> Dataset {
    mixed_rows().dataset()
}

#[test]
fn rating_bucket_shares_follow_the_labels() {
    let mut rows = Rows::new();
    rows.add(6, "A1", "Speaker", "Sonic", "Audio", 5, "Positive", "2023-05-01")
        .add(3, "A1", "Speaker", "Sonic", "Audio", 5, "Neutral", "2023-05-01")
        .add(1, "A1", "Speaker", "Sonic", "Audio", 5, "Negative", "2023-05-01");
    let data = rows.dataset();

    let overall = overall_summary(&data, &CategoryFilter::All);
    assert_eq!(overall.total, 10);
    assert_eq!(overall.counts.positive, 6);
    assert_eq!(overall.counts.neutral, 3);
    assert_eq!(overall.counts.negative, 1);

    let buckets = rating_breakdown(&data, &CategoryFilter::All);
    assert_eq!(buckets.len(), 5);
    let five = buckets.iter().find(|b| b.rating == 5).unwrap();
    assert!((five.share(Sentiment::Positive) - 60.0).abs() < 1e-9);
    assert!((five.share(Sentiment::Neutral) - 30.0).abs() < 1e-9);
    assert!((five.share(Sentiment::Negative) - 10.0).abs() < 1e-9);
    assert_eq!(buckets.iter().filter(|b| b.counts.total() == 0).count(), 4);
}

#[test]
fn brands_below_the_threshold_are_left_out() {
    let data = mixed_dataset();
    let config = DashboardConfig::default();

    let brands = group_summary(&data, &CategoryFilter::All, &GroupSpec::brands(&config));
    let keys: Vec<&str> = brands.iter().map(|g| g.key.as_str()).collect();
    assert_eq!(keys, vec!["Globex"]);
    assert!(brands.len() <= config.brand_top_n);
}

#[test]
fn products_rank_by_sentiment_score() {
    let data = mixed_dataset();
    let config = DashboardConfig::default();
    let ranking = ProductRanking::new(RankTarget::Positive, &config);

    let products = top_products(&data, &CategoryFilter::All, &ranking);
    assert_eq!(products[0].asin, "P1");
    assert!((products[0].score - 400.0 / 3.0).abs() < 1e-9);
    assert_eq!(products[1].asin, "P2");
    assert!((products[1].score - 25.0).abs() < 1e-9);
    assert!(products.len() <= config.product_top_n);
    assert_eq!(products[0].ratio_label(RankTarget::Positive), "20:2");
}

#[test]
fn negative_ranking_scores_the_negative_share() {
    let mut rows = mixed_rows();
    rows.add(5, "P5", "Box Fan", "Breeze", "Home", 1, "Negative", "2023-03-08");
    let data = rows.dataset();
    let ranking = ProductRanking::new(RankTarget::Negative, &DashboardConfig::default());

    let products = top_products(&data, &CategoryFilter::All, &ranking);
    let asins: Vec<&str> = products.iter().map(|p| p.asin.as_str()).collect();
    // P3 has only four rows
    assert_eq!(asins, vec!["P5", "P1", "P2"]);
    assert_eq!(products[0].score, 25.0);
    assert_eq!(products[0].ratio_label(RankTarget::Negative), "5:0");
    assert!((products[1].score - 1.0 / 22.0).abs() < 1e-9);
    assert_eq!(products[1].ratio_label(RankTarget::Negative), "1:21");
    assert_eq!(products[2].score, 0.0);
}

#[test]
fn category_view_ranks_by_positive_count() {
    let mut rows = Rows::new();
    for (category, positive, neutral) in [
        ("C1", 3, 0),
        ("C2", 3, 0),
        ("Bulk", 1, 8),
        ("C3", 5, 0),
        ("Unknown", 9, 0),
        (" ", 9, 0),
        ("", 9, 0),
        ("Uncategorized", 9, 0),
        ("C4", 3, 0),
        ("C5", 3, 0),
        ("C6", 3, 0),
    ] {
        rows.add(positive, "X1", "Thing", "Acme", category, 5, "Positive", "2023-01-01")
            .add(neutral, "X1", "Thing", "Acme", category, 3, "Neutral", "2023-01-01");
    }
    let data = rows.dataset();

    let spec = GroupSpec::categories(&DashboardConfig::default());
    let groups = group_summary(&data, &CategoryFilter::All, &spec);
    let ranked: Vec<(&str, usize)> = groups
        .iter()
        .map(|g| (g.key.as_str(), g.counts.positive))
        .collect();
    assert_eq!(
        ranked,
        vec![("C3", 5), ("C1", 3), ("C2", 3), ("C4", 3), ("C5", 3)]
    );
}

#[test]
fn brand_view_keeps_the_ten_largest() {
    let mut rows = Rows::new();
    for (brand, count) in [
        ("B1", 12),
        ("B2", 20),
        ("B3", 12),
        ("B4", 15),
        ("B5", 10),
        ("B6", 18),
        ("Unknown Brand", 40),
        ("B7", 11),
        ("B8", 14),
        ("Tiny", 9),
        ("B9", 13),
        ("B10", 16),
        ("B11", 17),
    ] {
        rows.add(count, "X1", "Thing", brand, "Home", 4, "Positive", "2023-01-01");
    }
    let data = rows.dataset();

    let config = DashboardConfig::default();
    let brands = group_summary(&data, &CategoryFilter::All, &GroupSpec::brands(&config));
    let keys: Vec<&str> = brands.iter().map(|g| g.key.as_str()).collect();
    assert_eq!(
        keys,
        vec!["B2", "B6", "B11", "B10", "B4", "B8", "B9", "B1", "B3", "B7"]
    );
    assert_eq!(brands.len(), config.brand_top_n);
}

#[test]
fn padded_brand_names_share_a_group() {
    let mut rows = Rows::new();
    rows.add(6, "X1", "Thing", " Acme", "Home", 4, "Positive", "2023-01-01")
        .add(6, "X1", "Thing", "Acme", "Home", 2, "Negative", "2023-01-02");
    let data = rows.dataset();

    let spec = GroupSpec::brands(&DashboardConfig::default());
    let brands = group_summary(&data, &CategoryFilter::All, &spec);
    assert_eq!(brands.len(), 1);
    assert_eq!(brands[0].key, "Acme");
    assert_eq!(brands[0].total(), 12);
}

#[test]
fn missing_months_are_zero_filled() {
    let data = mixed_dataset();
    let series = time_series(&data, &CategoryFilter::All);

    let months: Vec<String> = series
        .months
        .iter()
        .map(|m| m.format("%Y-%m").to_string())
        .collect();
    assert_eq!(months, vec!["2023-01", "2023-02", "2023-03"]);
    for sentiment in Sentiment::ALL {
        assert_eq!(series.counts(sentiment)[1], 0);
    }
    assert_eq!(series.counts(Sentiment::Positive)[0], 20);
    assert_eq!(series.counts(Sentiment::Negative)[2], 5);
}

#[test]
fn category_filter_narrows_every_view() {
    let data = mixed_dataset();
    let home = CategoryFilter::from_param(Some("Home"));

    assert_eq!(overall_summary(&data, &home).total, 9);
    let config = DashboardConfig::default();
    let ranking = ProductRanking::new(RankTarget::Negative, &config);
    let products = top_products(&data, &home, &ranking);
    assert!(products.iter().all(|p| p.asin != "P1"));
}

#[test]
fn unknown_category_yields_empty_views() {
    let data = mixed_dataset();
    let config = DashboardConfig::default();
    let nowhere = CategoryFilter::from_param(Some("Garden"));

    assert_eq!(overall_summary(&data, &nowhere).total, 0);
    assert!(rating_breakdown(&data, &nowhere).iter().all(|b| b.counts.total() == 0));
    assert!(time_series(&data, &nowhere).months.is_empty());
    let ranking = ProductRanking::new(RankTarget::Positive, &config);
    assert!(top_products(&data, &nowhere, &ranking).is_empty());

    let payload = build_payload(&data, &nowhere, &ViewKind::REFRESH, &config);
    assert_eq!(payload.len(), ViewKind::REFRESH.len());
    assert!(payload.values().all(|v| v.get("error").is_none()));
}

#[test]
fn payload_has_every_view() {
    let data = mixed_dataset();
    let payload = build_payload(
        &data,
        &CategoryFilter::All,
        &ViewKind::ALL,
        &DashboardConfig::default(),
    );

    for kind in ViewKind::ALL {
        let figure = payload.get(kind.key()).unwrap();
        assert!(figure.get("data").is_some(), "{} has no data", kind.key());
        assert!(figure.get("layout").is_some(), "{} has no layout", kind.key());
    }
}

#[test]
fn report_lists_top_products() {
    let data = mixed_dataset();
    let text = render_report(&data, &CategoryFilter::All, &DashboardConfig::default()).unwrap();
    assert!(text.contains("Total reviews: 31"));
    assert!(text.contains("1. Widget One [P1]"));
    assert!(text.contains("2023-02"));
}

#[test]
fn cache_loads_once() {
    let mut rows = Rows::new();
    rows.add(3, "B1", "Lamp", "Lumo", "Home", 4, "Positive", "2023-06-01");
    let file = rows.file();

    let cache = DatasetCache::new(file.path());
    assert!(!cache.is_loaded());
    let first = cache.get().unwrap();
    let second = cache.get().unwrap();
    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!(first.len(), 3);
    assert!(cache.is_loaded());
}

#[test]
fn missing_file_is_an_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let cache = DatasetCache::new(dir.path().join("absent.csv"));

    assert!(matches!(cache.get(), Err(LoadError::Io { .. })));
    assert!(!cache.is_loaded());
}

#[test]
fn missing_required_column_is_reported() {
    let csv = "asin,title,overall,review_date\nX1,Thing,5,2023-01-01\n";
    let result = Dataset::from_reader(csv.as_bytes());
    assert!(matches!(result, Err(LoadError::MissingColumn("sentiment"))));
}

#[test]
fn out_of_range_rating_rejects_the_file() {
    let mut rows = Rows::new();
    rows.add(1, "X1", "Thing", "Brand", "Home", 7, "Positive", "2023-01-01");
    let result = Dataset::from_reader(rows.csv().as_bytes());
    assert!(matches!(result, Err(LoadError::InvalidRow { .. })));
}
