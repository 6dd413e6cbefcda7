//! Payload assembly
//!
//! Each view is computed and serialised on its own; a view that fails is
//! reported under its key and the remaining views are still delivered.

use log::{debug, warn};
use serde_json::{Map, Value, json};

use crate::aggregate::{
    GroupSpec, ProductRanking, RankTarget, group_summary, overall_summary, rating_breakdown,
    time_series, top_products,
};
use crate::chart::{self, Figure};
use crate::config::DashboardConfig;
use crate::error::DashboardError;
use crate::filter::CategoryFilter;
use crate::loader::Dataset;

/// Summary views the dashboard can show
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ViewKind {
    Overall,
    RatingCounts,
    RatingShare,
    Category,
    Brand,
    TimeSeries,
    TopPositive,
    TopNegative,
}

impl ViewKind {
    pub const ALL: [ViewKind; 8] = [
        ViewKind::Overall,
        ViewKind::RatingCounts,
        ViewKind::RatingShare,
        ViewKind::Category,
        ViewKind::Brand,
        ViewKind::TimeSeries,
        ViewKind::TopPositive,
        ViewKind::TopNegative,
    ];

    /// Views recomputed when the category selector changes
    pub const REFRESH: [ViewKind; 6] = [
        ViewKind::Overall,
        ViewKind::RatingShare,
        ViewKind::Brand,
        ViewKind::TimeSeries,
        ViewKind::TopPositive,
        ViewKind::TopNegative,
    ];

    /// Key of the view in the JSON payload and the page template
    pub fn key(&self) -> &'static str {
        match self {
            ViewKind::Overall => "overall_plot",
            ViewKind::RatingCounts => "rating_distribution",
            ViewKind::RatingShare => "rating_plot",
            ViewKind::Category => "category_distribution",
            ViewKind::Brand => "brand_plot",
            ViewKind::TimeSeries => "time_series_plot",
            ViewKind::TopPositive => "top_positive_plot",
            ViewKind::TopNegative => "top_negative_plot",
        }
    }

    /// Short name used in `/chart/{view}` URLs
    pub fn slug(&self) -> &'static str {
        match self {
            ViewKind::Overall => "overall",
            ViewKind::RatingCounts => "rating-counts",
            ViewKind::RatingShare => "rating",
            ViewKind::Category => "category",
            ViewKind::Brand => "brand",
            ViewKind::TimeSeries => "timeline",
            ViewKind::TopPositive => "top-positive",
            ViewKind::TopNegative => "top-negative",
        }
    }

    pub fn from_slug(slug: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.slug() == slug)
    }
}

/// Build the chart description of one view
pub fn build_figure(
    kind: ViewKind,
    dataset: &Dataset,
    filter: &CategoryFilter,
    config: &DashboardConfig,
) -> Figure {
    match kind {
        ViewKind::Overall => chart::overall_figure(&overall_summary(dataset, filter), filter),
        ViewKind::RatingCounts => chart::rating_counts_figure(&rating_breakdown(dataset, filter)),
        ViewKind::RatingShare => {
            chart::rating_share_figure(&rating_breakdown(dataset, filter), filter)
        }
        ViewKind::Category => {
            let spec = GroupSpec::categories(config);
            chart::group_figure(&group_summary(dataset, filter, &spec), &spec, filter)
        }
        ViewKind::Brand => {
            let spec = GroupSpec::brands(config);
            chart::group_figure(&group_summary(dataset, filter, &spec), &spec, filter)
        }
        ViewKind::TimeSeries => chart::time_series_figure(&time_series(dataset, filter), filter),
        ViewKind::TopPositive => {
            let ranking = ProductRanking::new(RankTarget::Positive, config);
            chart::top_products_figure(&top_products(dataset, filter, &ranking), &ranking, filter)
        }
        ViewKind::TopNegative => {
            let ranking = ProductRanking::new(RankTarget::Negative, config);
            chart::top_products_figure(&top_products(dataset, filter, &ranking), &ranking, filter)
        }
    }
}

/// Build and serialise one view
pub fn render_view(
    kind: ViewKind,
    dataset: &Dataset,
    filter: &CategoryFilter,
    config: &DashboardConfig,
) -> Result<Value, DashboardError> {
    let value = build_figure(kind, dataset, filter, config).to_value()?;
    debug!("Rendered {} for {:?}", kind.key(), filter);
    Ok(value)
}

/// Named entries for every requested view
///
/// A failed view is stored as `{"error": "..."}` under its key.
pub fn build_payload(
    dataset: &Dataset,
    filter: &CategoryFilter,
    kinds: &[ViewKind],
    config: &DashboardConfig,
) -> Map<String, Value> {
    let mut payload = Map::new();
    for &kind in kinds {
        let entry = match render_view(kind, dataset, filter, config) {
            Ok(value) => value,
            Err(e) => {
                warn!("View {} failed: {}", kind.key(), e);
                json!({ "error": e.to_string() })
            }
        };
        payload.insert(kind.key().to_string(), entry);
    }
    payload
}
