//! Chart descriptions for the browser
//!
//! Summary views are turned into Plotly figure objects (`data` + `layout`).
//! Only the attributes the dashboard uses are modelled; `None` fields are
//! left out of the JSON so Plotly falls back to its own defaults.

use serde::Serialize;
use serde_json::{Value, json};

use crate::aggregate::{
    GroupField, GroupSpec, GroupSummary, OverallSummary, ProductRanking, ProductSummary, RankBy,
    RankTarget, RatingBucket, TimeSeries,
};
use crate::filter::CategoryFilter;
use crate::review::Sentiment;

/// Complete figure as consumed by `Plotly.newPlot`
#[derive(Debug, Clone, Default, Serialize)]
pub struct Figure {
    pub data: Vec<Trace>,
    pub layout: Layout,
}

impl Figure {
    pub fn to_value(&self) -> Result<Value, serde_json::Error> {
        serde_json::to_value(self)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TraceKind {
    Bar,
    Pie,
    Scatter,
}

#[derive(Debug, Clone, Serialize)]
pub struct Trace {
    #[serde(rename = "type")]
    pub kind: TraceKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub x: Option<Vec<Value>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub y: Option<Vec<Value>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub labels: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub values: Option<Vec<usize>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub orientation: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mode: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub marker: Option<Marker>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line: Option<Marker>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub textinfo: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub customdata: Option<Vec<Value>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hovertemplate: Option<String>,
}

impl Trace {
    fn new(kind: TraceKind) -> Self {
        Self {
            kind,
            name: None,
            x: None,
            y: None,
            labels: None,
            values: None,
            orientation: None,
            mode: None,
            marker: None,
            line: None,
            textinfo: None,
            customdata: None,
            hovertemplate: None,
        }
    }

    /// Bar trace coloured and named after a sentiment label
    fn sentiment_bar(sentiment: Sentiment) -> Self {
        Self {
            name: Some(sentiment.label().to_string()),
            marker: Some(Marker::color(sentiment.color())),
            ..Self::new(TraceKind::Bar)
        }
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct Marker {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub colors: Option<Vec<&'static str>>,
}

impl Marker {
    fn color(color: &'static str) -> Self {
        Self {
            color: Some(color),
            colors: None,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct Text {
    pub text: String,
}

impl Text {
    fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct Axis {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<Text>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub automargin: Option<bool>,
}

impl Axis {
    fn titled(title: &str) -> Self {
        Self {
            title: Some(Text::new(title)),
            automargin: None,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Annotation {
    pub text: String,
    pub xref: &'static str,
    pub yref: &'static str,
    pub x: f64,
    pub y: f64,
    pub showarrow: bool,
}

impl Annotation {
    fn centered(text: impl Into<String>, y: f64) -> Self {
        Self {
            text: text.into(),
            xref: "paper",
            yref: "paper",
            x: 0.5,
            y,
            showarrow: false,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Margin {
    pub t: u32,
    pub l: u32,
    pub r: u32,
    pub b: u32,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct Layout {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<Text>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub xaxis: Option<Axis>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub yaxis: Option<Axis>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub barmode: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hovermode: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub height: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub showlegend: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub margin: Option<Margin>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub annotations: Vec<Annotation>,
}

/// Pie chart of the overall sentiment mix
pub fn overall_figure(summary: &OverallSummary, filter: &CategoryFilter) -> Figure {
    let pie = Trace {
        labels: Some(Sentiment::ALL.iter().map(|s| s.label().to_string()).collect()),
        values: Some(Sentiment::ALL.iter().map(|s| summary.counts.get(*s)).collect()),
        marker: Some(Marker {
            color: None,
            colors: Some(Sentiment::ALL.iter().map(|s| s.color()).collect()),
        }),
        textinfo: Some("value+percent"),
        hovertemplate: Some(
            "<b>%{label}</b><br>Count: %{value}<br>Percentage: %{percent}<br><extra></extra>"
                .to_string(),
        ),
        ..Trace::new(TraceKind::Pie)
    };

    Figure {
        data: vec![pie],
        layout: Layout {
            title: Some(Text::new(format!(
                "Overall Sentiment Distribution{}<br>Total Reviews: {}",
                filter.title_suffix(),
                summary.total
            ))),
            margin: Some(Margin { t: 50, l: 0, r: 0, b: 0 }),
            showlegend: Some(true),
            ..Layout::default()
        },
    }
}

/// Grouped bars of raw review counts per rating
pub fn rating_counts_figure(buckets: &[RatingBucket]) -> Figure {
    let data = Sentiment::ALL
        .iter()
        .map(|&sentiment| Trace {
            x: Some(buckets.iter().map(|b| json!(b.rating)).collect()),
            y: Some(buckets.iter().map(|b| json!(b.counts.get(sentiment))).collect()),
            ..Trace::sentiment_bar(sentiment)
        })
        .collect();

    Figure {
        data,
        layout: Layout {
            title: Some(Text::new("Sentiment Distribution by Rating for Electronic Products")),
            xaxis: Some(Axis::titled("Rating Score")),
            yaxis: Some(Axis::titled("Number of Reviews")),
            barmode: Some("group"),
            showlegend: Some(true),
            ..Layout::default()
        },
    }
}

/// Stacked bars of each label's percentage within every rating
pub fn rating_share_figure(buckets: &[RatingBucket], filter: &CategoryFilter) -> Figure {
    let data = Sentiment::ALL
        .iter()
        .map(|&sentiment| Trace {
            x: Some(buckets.iter().map(|b| json!(b.rating)).collect()),
            y: Some(buckets.iter().map(|b| json!(b.share(sentiment))).collect()),
            customdata: Some(buckets.iter().map(|b| json!(b.counts.get(sentiment))).collect()),
            hovertemplate: Some(format!(
                "{}: %{{y:.1f}}%<br>count: %{{customdata}}<extra></extra>",
                sentiment
            )),
            ..Trace::sentiment_bar(sentiment)
        })
        .collect();

    Figure {
        data,
        layout: Layout {
            title: Some(Text::new(format!(
                "Sentiment Distribution by Rating{}",
                filter.title_suffix()
            ))),
            xaxis: Some(Axis::titled("Rating")),
            yaxis: Some(Axis::titled("Percentage")),
            barmode: Some("stack"),
            showlegend: Some(true),
            ..Layout::default()
        },
    }
}

/// Horizontal stacked bars for a category or brand view
pub fn group_figure(groups: &[GroupSummary], spec: &GroupSpec, filter: &CategoryFilter) -> Figure {
    let (plural, height) = match spec.field {
        GroupField::Category => ("Categories", 400),
        GroupField::Brand => ("Brands", 500),
    };

    if groups.is_empty() {
        return Figure {
            data: Vec::new(),
            layout: Layout {
                title: Some(Text::new(format!(
                    "No {} with sufficient reviews in this category",
                    plural.to_lowercase()
                ))),
                height: Some(height),
                ..Layout::default()
            },
        };
    }

    let ranked_by = match spec.rank_by {
        RankBy::Total => "Review Volume and Sentiment Distribution".to_string(),
        RankBy::Count(sentiment) => format!("{} Review Count", capitalize(sentiment.label())),
    };

    let data = Sentiment::ALL
        .iter()
        .map(|&sentiment| Trace {
            x: Some(groups.iter().map(|g| json!(g.counts.get(sentiment))).collect()),
            y: Some(groups.iter().map(|g| json!(g.key)).collect()),
            orientation: Some("h"),
            customdata: Some(
                groups
                    .iter()
                    .map(|g| json!([g.counts.share(sentiment), g.counts.get(sentiment)]))
                    .collect(),
            ),
            hovertemplate: Some(share_hover(sentiment)),
            ..Trace::sentiment_bar(sentiment)
        })
        .collect();

    Figure {
        data,
        layout: Layout {
            title: Some(Text::new(format!(
                "Top {} {} by {}{}",
                spec.top_n,
                plural,
                ranked_by,
                filter.title_suffix()
            ))),
            xaxis: Some(Axis::titled("Number of Reviews")),
            yaxis: Some(Axis::titled(spec.field.label())),
            barmode: Some("stack"),
            hovermode: Some("y unified"),
            height: Some(height),
            ..Layout::default()
        },
    }
}

/// One line per label over the shared month axis
pub fn time_series_figure(series: &TimeSeries, filter: &CategoryFilter) -> Figure {
    let months: Vec<Value> = series
        .months
        .iter()
        .map(|m| json!(m.format("%Y-%m").to_string()))
        .collect();

    let data = series
        .series
        .iter()
        .map(|(sentiment, counts)| Trace {
            name: Some(sentiment.label().to_string()),
            x: Some(months.clone()),
            y: Some(counts.iter().map(|c| json!(c)).collect()),
            mode: Some("lines+markers"),
            line: Some(Marker::color(sentiment.color())),
            ..Trace::new(TraceKind::Scatter)
        })
        .collect();

    Figure {
        data,
        layout: Layout {
            title: Some(Text::new(format!(
                "Sentiment Trends Over Time{}",
                filter.title_suffix()
            ))),
            xaxis: Some(Axis::titled("Date")),
            yaxis: Some(Axis::titled("Number of Reviews")),
            ..Layout::default()
        },
    }
}

/// Horizontal stacked bars of the best-scoring products
pub fn top_products_figure(
    products: &[ProductSummary],
    ranking: &ProductRanking,
    filter: &CategoryFilter,
) -> Figure {
    let target = ranking.target.sentiment();
    let title = format!(
        "Top {} {} Products{}",
        ranking.top_n,
        capitalize(target.label()),
        filter.title_suffix()
    );

    if products.is_empty() {
        return Figure {
            data: Vec::new(),
            layout: Layout {
                title: Some(Text::new(title)),
                height: Some(400),
                annotations: vec![Annotation::centered(
                    "No products with sufficient reviews in this category",
                    0.5,
                )],
                ..Layout::default()
            },
        };
    }

    let labels: Vec<Value> = products
        .iter()
        .map(|p| {
            json!(format!(
                "{}<br>ASIN: {}<br>Ratio: {}",
                p.title,
                p.asin,
                p.ratio_label(ranking.target)
            ))
        })
        .collect();

    let data = Sentiment::ALL
        .iter()
        .map(|&sentiment| Trace {
            x: Some(products.iter().map(|p| json!(p.counts.get(sentiment))).collect()),
            y: Some(labels.clone()),
            orientation: Some("h"),
            customdata: Some(
                products
                    .iter()
                    .map(|p| json!([p.counts.share(sentiment), p.counts.get(sentiment)]))
                    .collect(),
            ),
            hovertemplate: Some(share_hover(sentiment)),
            ..Trace::sentiment_bar(sentiment)
        })
        .collect();

    let note = match ranking.target {
        RankTarget::Positive => "Note: Ratio refers to positive:(neutral + negative)",
        RankTarget::Negative => "Note: Ratio refers to negative:(positive + neutral)",
    };

    Figure {
        data,
        layout: Layout {
            title: Some(Text::new(format!(
                "{}<br><sup>Based on both review count and sentiment ratio</sup>",
                title
            ))),
            xaxis: Some(Axis::titled("Number of Reviews")),
            yaxis: Some(Axis {
                title: Some(Text::new("Products")),
                automargin: Some(true),
            }),
            barmode: Some("stack"),
            hovermode: Some("y unified"),
            height: Some(500),
            margin: Some(Margin { t: 80, l: 300, r: 20, b: 80 }),
            annotations: vec![Annotation::centered(note, -0.15)],
            ..Layout::default()
        },
    }
}

/// Hover text for bars carrying `[percentage, count]` custom data
fn share_hover(sentiment: Sentiment) -> String {
    format!(
        "{0} count: %{{customdata[1]}}<br>{0}: %{{customdata[0]:.1f}}%<br><extra></extra>",
        sentiment
    )
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::SentimentCounts;

    #[test]
    fn pie_lists_labels_in_fixed_order() {
        let summary = OverallSummary {
            counts: SentimentCounts {
                positive: 6,
                neutral: 3,
                negative: 1,
            },
            total: 10,
        };
        let value = overall_figure(&summary, &CategoryFilter::All).to_value().unwrap();

        assert_eq!(value["data"][0]["type"], "pie");
        assert_eq!(value["data"][0]["labels"], json!(["positive", "neutral", "negative"]));
        assert_eq!(value["data"][0]["values"], json!([6, 3, 1]));
        assert_eq!(
            value["layout"]["title"]["text"],
            "Overall Sentiment Distribution<br>Total Reviews: 10"
        );
    }

    #[test]
    fn unset_attributes_are_omitted() {
        let value = rating_counts_figure(&[]).to_value().unwrap();
        let trace = value["data"][0].as_object().unwrap();
        assert!(!trace.contains_key("labels"));
        assert!(!trace.contains_key("orientation"));
        assert!(value["layout"].get("annotations").is_none());
    }

    #[test]
    fn empty_product_view_keeps_its_title() {
        let config = crate::config::DashboardConfig::default();
        let ranking = ProductRanking::new(RankTarget::Negative, &config);
        let filter = CategoryFilter::Only("Garden".to_string());
        let value = top_products_figure(&[], &ranking, &filter).to_value().unwrap();

        assert_eq!(value["layout"]["title"]["text"], "Top 5 Negative Products - Garden");
        assert_eq!(
            value["layout"]["annotations"][0]["text"],
            "No products with sufficient reviews in this category"
        );
        assert_eq!(value["data"], json!([]));
    }

    #[test]
    fn capitalize_handles_empty() {
        assert_eq!(capitalize("positive"), "Positive");
        assert_eq!(capitalize(""), "");
    }
}
