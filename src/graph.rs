#![cfg(not(tarpaulin_include))]
#![cfg(feature = "web")]
use plotters::prelude::*;
use std::error::Error;
use std::io::Cursor;

use crate::aggregate::{
    GroupSpec, ProductRanking, RankTarget, group_summary, overall_summary, rating_breakdown,
    time_series, top_products,
};
use crate::config::DashboardConfig;
use crate::dashboard::ViewKind;
use crate::filter::CategoryFilter;
use crate::loader::Dataset;
use crate::review::Sentiment;

pub type GraphResult<T> = Result<T, Box<dyn Error>>;

/// Available graph types for server-side rendering
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GraphType {
    /// One line per sentiment label over an ordered axis
    Line,

    /// One column per label on the x axis, split into sentiment segments
    StackedBar,
}

/// Configuration options for graph generation
#[derive(Clone, Debug)]
pub struct GraphOptions {
    /// Title displayed at the top of the graph
    pub title: String,

    /// Label for the X-axis
    pub x_label: String,

    /// Label for the Y-axis
    pub y_label: String,

    /// Width of the graph in pixels
    pub width: u32,

    /// Height of the graph in pixels
    pub height: u32,

    /// Type of graph to generate
    pub graph_type: GraphType,
}

impl Default for GraphOptions {
    /// Creates a default configuration for graph generation
    ///
    /// # Returns
    /// * `GraphOptions` - Stacked bars, 800x600 pixels, generic labels
    fn default() -> Self {
        Self {
            title: "Graph".to_string(),
            x_label: "X Axis".to_string(),
            y_label: "Y Axis".to_string(),
            width: 800,
            height: 600,
            graph_type: GraphType::StackedBar,
        }
    }
}

/// Values to plot: one x label per column, one value per column for each label
#[derive(Clone, Debug, Default, PartialEq)]
pub struct GraphData {
    pub labels: Vec<String>,
    pub series: Vec<(Sentiment, Vec<f64>)>,
}

impl GraphData {
    /// Height of the tallest stacked column
    fn stacked_max(&self) -> f64 {
        (0..self.labels.len())
            .map(|i| {
                self.series
                    .iter()
                    .map(|(_, values)| values.get(i).copied().unwrap_or(0.0))
                    .sum::<f64>()
            })
            .fold(0.0, f64::max)
    }

    fn series_max(&self) -> f64 {
        self.series
            .iter()
            .flat_map(|(_, values)| values.iter().copied())
            .fold(0.0, f64::max)
    }
}

/// Renders a dashboard view as a PNG image
///
/// This is the entry point used by the `/chart/{view}` endpoint. The view is
/// aggregated exactly as for the browser payload and then drawn with plotters.
///
/// # Returns
/// * A Result containing the PNG image data as bytes or an error
pub fn render_view_png(
    kind: ViewKind,
    dataset: &Dataset,
    filter: &CategoryFilter,
    config: &DashboardConfig,
) -> GraphResult<Vec<u8>> {
    let (data, options) = graph_for_view(kind, dataset, filter, config);
    create_graph(&data, &options)
}

/// Creates a graph from prepared data
///
/// # Returns
/// * A Result containing the PNG image data as bytes or an error
pub fn create_graph(data: &GraphData, options: &GraphOptions) -> GraphResult<Vec<u8>> {
    if data.labels.is_empty() {
        return Err("nothing to plot".into());
    }

    match options.graph_type {
        GraphType::Line => create_line_graph(data, options),
        GraphType::StackedBar => create_stacked_bar_graph(data, options),
    }
}

/// Aggregates a view and picks matching graph options
fn graph_for_view(
    kind: ViewKind,
    dataset: &Dataset,
    filter: &CategoryFilter,
    config: &DashboardConfig,
) -> (GraphData, GraphOptions) {
    let suffix = filter.title_suffix();
    let stacked = |title: String, x_label: &str, y_label: &str| GraphOptions {
        title,
        x_label: x_label.to_string(),
        y_label: y_label.to_string(),
        ..GraphOptions::default()
    };

    match kind {
        ViewKind::Overall => {
            let summary = overall_summary(dataset, filter);
            // Each label gets its own column with a single coloured segment
            let series = Sentiment::ALL
                .iter()
                .map(|&s| {
                    let values = Sentiment::ALL
                        .iter()
                        .map(|&column| if column == s { summary.counts.get(s) as f64 } else { 0.0 })
                        .collect();
                    (s, values)
                })
                .collect();
            let data = GraphData {
                labels: Sentiment::ALL.iter().map(|s| s.label().to_string()).collect(),
                series,
            };
            let title = format!("Overall Sentiment Distribution{} ({} reviews)", suffix, summary.total);
            (data, stacked(title, "Sentiment", "Number of Reviews"))
        }
        ViewKind::RatingCounts | ViewKind::RatingShare => {
            let buckets = rating_breakdown(dataset, filter);
            let as_share = kind == ViewKind::RatingShare;
            let data = GraphData {
                labels: buckets.iter().map(|b| b.rating.to_string()).collect(),
                series: Sentiment::ALL
                    .iter()
                    .map(|&s| {
                        let values = buckets
                            .iter()
                            .map(|b| if as_share { b.share(s) } else { b.counts.get(s) as f64 })
                            .collect();
                        (s, values)
                    })
                    .collect(),
            };
            let y_label = if as_share { "Percentage" } else { "Number of Reviews" };
            let title = format!("Sentiment Distribution by Rating{}", suffix);
            (data, stacked(title, "Rating", y_label))
        }
        ViewKind::Category | ViewKind::Brand => {
            let spec = if kind == ViewKind::Category {
                GroupSpec::categories(config)
            } else {
                GroupSpec::brands(config)
            };
            let groups = group_summary(dataset, filter, &spec);
            let data = GraphData {
                labels: groups.iter().map(|g| g.key.clone()).collect(),
                series: Sentiment::ALL
                    .iter()
                    .map(|&s| (s, groups.iter().map(|g| g.counts.get(s) as f64).collect()))
                    .collect(),
            };
            let title = format!("{} Sentiment Mix{}", spec.field.label(), suffix);
            (data, stacked(title, spec.field.label(), "Number of Reviews"))
        }
        ViewKind::TimeSeries => {
            let series = time_series(dataset, filter);
            let data = GraphData {
                labels: series
                    .months
                    .iter()
                    .map(|m| m.format("%Y-%m").to_string())
                    .collect(),
                series: series
                    .series
                    .iter()
                    .map(|(s, counts)| (*s, counts.iter().map(|c| *c as f64).collect()))
                    .collect(),
            };
            let options = GraphOptions {
                graph_type: GraphType::Line,
                ..stacked(
                    format!("Sentiment Trends Over Time{}", suffix),
                    "Month",
                    "Number of Reviews",
                )
            };
            (data, options)
        }
        ViewKind::TopPositive | ViewKind::TopNegative => {
            let target = if kind == ViewKind::TopPositive {
                RankTarget::Positive
            } else {
                RankTarget::Negative
            };
            let ranking = ProductRanking::new(target, config);
            let products = top_products(dataset, filter, &ranking);
            let data = GraphData {
                labels: products.iter().map(|p| p.title.clone()).collect(),
                series: Sentiment::ALL
                    .iter()
                    .map(|&s| (s, products.iter().map(|p| p.counts.get(s) as f64).collect()))
                    .collect(),
            };
            let title = format!("Top {} Products{}", target.sentiment(), suffix);
            (data, stacked(title, "Product", "Number of Reviews"))
        }
    }
}

fn sentiment_color(sentiment: Sentiment) -> RGBColor {
    match sentiment {
        Sentiment::Positive => RGBColor(0x34, 0x98, 0xdb),
        Sentiment::Neutral => RGBColor(0x9b, 0x59, 0xb6),
        Sentiment::Negative => RGBColor(0x1a, 0xbc, 0x9c),
    }
}

/// Name of the column at an x coordinate, blank between columns
fn column_label(labels: &[String], x: f64) -> String {
    if (x - x.round()).abs() > 1e-6 || x < 0.0 {
        return String::new();
    }
    labels.get(x.round() as usize).cloned().unwrap_or_default()
}

/// Creates a stacked bar graph
///
/// # Implementation Notes
/// * Column `i` is centred on `x = i`, 0.8 units wide
/// * Segments are drawn bottom-up in positive, neutral, negative order
fn create_stacked_bar_graph(data: &GraphData, options: &GraphOptions) -> GraphResult<Vec<u8>> {
    let mut buffer = vec![0u8; options.width as usize * options.height as usize * 3];
    {
        let root = BitMapBackend::with_buffer(&mut buffer, (options.width, options.height))
            .into_drawing_area();
        root.fill(&WHITE)?;

        let columns = data.labels.len();
        let y_max = data.stacked_max().max(1.0) * 1.1;
        let x_range = -0.5..columns as f64 - 0.5;

        let mut chart = ChartBuilder::on(&root)
            .caption(&options.title, ("sans-serif", 24).into_font())
            .margin(10)
            .x_label_area_size(40)
            .y_label_area_size(50)
            .build_cartesian_2d(x_range, 0.0..y_max)?;

        let formatter = |x: &f64| column_label(&data.labels, *x);
        chart
            .configure_mesh()
            .disable_x_mesh()
            .x_labels(columns)
            .x_label_formatter(&formatter)
            .x_desc(&options.x_label)
            .y_desc(&options.y_label)
            .draw()?;

        let mut base = vec![0.0; columns];
        for (sentiment, values) in &data.series {
            let color = sentiment_color(*sentiment);
            let mut bars = Vec::with_capacity(columns);
            for (i, bottom) in base.iter_mut().enumerate() {
                let value = values.get(i).copied().unwrap_or(0.0);
                let x = i as f64;
                bars.push(Rectangle::new(
                    [(x - 0.4, *bottom), (x + 0.4, *bottom + value)],
                    color.filled(),
                ));
                *bottom += value;
            }

            chart
                .draw_series(bars)?
                .label(sentiment.label())
                .legend(move |(x, y)| Rectangle::new([(x, y - 5), (x + 10, y + 5)], color.filled()));
        }

        chart
            .configure_series_labels()
            .background_style(&WHITE.mix(0.8))
            .border_style(&BLACK)
            .draw()?;

        root.present()?;
    }

    encode_png(buffer, options)
}

/// Creates a line graph with markers at every point
fn create_line_graph(data: &GraphData, options: &GraphOptions) -> GraphResult<Vec<u8>> {
    let mut buffer = vec![0u8; options.width as usize * options.height as usize * 3];
    {
        let root = BitMapBackend::with_buffer(&mut buffer, (options.width, options.height))
            .into_drawing_area();
        root.fill(&WHITE)?;

        let points = data.labels.len();
        let y_max = data.series_max().max(1.0) * 1.1;
        // A single month still needs a non-empty x range
        let x_range = -0.5..(points as f64 - 0.5).max(0.5);

        let mut chart = ChartBuilder::on(&root)
            .caption(&options.title, ("sans-serif", 24).into_font())
            .margin(10)
            .x_label_area_size(40)
            .y_label_area_size(50)
            .build_cartesian_2d(x_range, 0.0..y_max)?;

        let formatter = |x: &f64| column_label(&data.labels, *x);
        chart
            .configure_mesh()
            .x_labels(points.min(12))
            .x_label_formatter(&formatter)
            .x_desc(&options.x_label)
            .y_desc(&options.y_label)
            .draw()?;

        for (sentiment, values) in &data.series {
            let color = sentiment_color(*sentiment);
            let line: Vec<(f64, f64)> = values
                .iter()
                .enumerate()
                .map(|(i, v)| (i as f64, *v))
                .collect();

            chart
                .draw_series(LineSeries::new(line.iter().copied(), &color))?
                .label(sentiment.label())
                .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 15, y)], &color));
            chart.draw_series(line.iter().map(|&p| Circle::new(p, 3, color.filled())))?;
        }

        chart
            .configure_series_labels()
            .background_style(&WHITE.mix(0.8))
            .border_style(&BLACK)
            .draw()?;

        root.present()?;
    }

    encode_png(buffer, options)
}

/// Wraps a raw RGB buffer in a PNG container
fn encode_png(buffer: Vec<u8>, options: &GraphOptions) -> GraphResult<Vec<u8>> {
    let image = image::RgbImage::from_raw(options.width, options.height, buffer)
        .ok_or("bitmap buffer does not match the graph size")?;

    let mut png = Vec::new();
    image.write_to(&mut Cursor::new(&mut png), image::ImageOutputFormat::Png)?;
    Ok(png)
}
