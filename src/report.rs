use std::fmt::Write;

use crate::aggregate::{
    GroupSpec, GroupSummary, ProductRanking, RankTarget, SentimentCounts, group_summary,
    overall_summary, rating_breakdown, time_series, top_products,
};
use crate::config::DashboardConfig;
use crate::filter::CategoryFilter;
use crate::loader::Dataset;
use crate::review::Sentiment;

/// Plain-text rendering of every summary view
///
/// # Examples
/// ```
/// use review_dashboard::config::DashboardConfig;
/// use review_dashboard::filter::CategoryFilter;
/// use review_dashboard::loader::Dataset;
/// use review_dashboard::report::render_report;
///
/// let data = Dataset::default();
/// let text = render_report(&data, &CategoryFilter::All, &DashboardConfig::default()).unwrap();
/// assert!(text.contains("Total reviews: 0"));
/// ```
pub fn render_report(
    dataset: &Dataset,
    filter: &CategoryFilter,
    config: &DashboardConfig,
) -> Result<String, std::fmt::Error> {
    let mut out = String::new();
    write_report(&mut out, dataset, filter, config)?;
    Ok(out)
}

fn write_report(
    out: &mut String,
    dataset: &Dataset,
    filter: &CategoryFilter,
    config: &DashboardConfig,
) -> std::fmt::Result {
    let overall = overall_summary(dataset, filter);
    writeln!(out, "== Overall sentiment{} ==", filter.title_suffix())?;
    writeln!(out, "Total reviews: {}", overall.total)?;
    writeln!(out, "{}", counts_line(&overall.counts))?;

    writeln!(out, "\n== Sentiment by rating ==")?;
    for bucket in rating_breakdown(dataset, filter) {
        writeln!(
            out,
            "{} stars ({:>6} reviews): {}",
            bucket.rating,
            bucket.counts.total(),
            shares_line(&bucket.counts)
        )?;
    }

    let categories = GroupSpec::categories(config);
    writeln!(out, "\n== Top categories by positive reviews ==")?;
    write_groups(out, &group_summary(dataset, filter, &categories))?;

    let brands = GroupSpec::brands(config);
    writeln!(
        out,
        "\n== Top brands (at least {} reviews) ==",
        brands.min_support
    )?;
    write_groups(out, &group_summary(dataset, filter, &brands))?;

    writeln!(out, "\n== Monthly reviews ==")?;
    let series = time_series(dataset, filter);
    for (i, month) in series.months.iter().enumerate() {
        let counts: Vec<String> = Sentiment::ALL
            .iter()
            .map(|s| format!("{}={}", s, series.counts(*s)[i]))
            .collect();
        writeln!(out, "{}  {}", month.format("%Y-%m"), counts.join(" "))?;
    }

    for target in [RankTarget::Positive, RankTarget::Negative] {
        let ranking = ProductRanking::new(target, config);
        writeln!(out, "\n== Top {} products ==", target.sentiment())?;
        let products = top_products(dataset, filter, &ranking);
        if products.is_empty() {
            writeln!(out, "(no products with sufficient reviews)")?;
        }
        for (rank, product) in products.iter().enumerate() {
            writeln!(
                out,
                "{}. {} [{}] score {:.1}, ratio {}",
                rank + 1,
                product.title,
                product.asin,
                product.score,
                product.ratio_label(target)
            )?;
        }
    }

    Ok(())
}

fn write_groups(out: &mut String, groups: &[GroupSummary]) -> std::fmt::Result {
    if groups.is_empty() {
        writeln!(out, "(no groups with sufficient reviews)")?;
    }
    for group in groups {
        writeln!(
            out,
            "{} ({} reviews): {}",
            group.key,
            group.total(),
            shares_line(&group.counts)
        )?;
    }
    Ok(())
}

fn counts_line(counts: &SentimentCounts) -> String {
    Sentiment::ALL
        .iter()
        .map(|s| format!("{}: {}", s, counts.get(*s)))
        .collect::<Vec<_>>()
        .join(", ")
}

fn shares_line(counts: &SentimentCounts) -> String {
    Sentiment::ALL
        .iter()
        .map(|s| format!("{} {:.1}%", s, counts.share(*s)))
        .collect::<Vec<_>>()
        .join(", ")
}
