/*!
# Review Sentiment Dashboard

A small analytics service over a table of product reviews that were
already labelled Positive, Neutral or Negative.

## Overview

The review table is read once from CSV and kept in memory. Every view of
the dashboard is a pure summary of that table, optionally narrowed to a
single product category, and is turned into a Plotly-compatible chart
description that the browser draws.

## Architecture

### Data Layer
- **loader**: CSV ingestion into an immutable `Dataset`, plus the
  process-wide `DatasetCache` that loads it lazily exactly once
- **review**: the `Review` record and the `Sentiment` label
- **title**: product title clean-up for chart labels

### Analysis Layer
- **filter**: the category filter shared by every view
- **aggregate**: overall mix, per-rating mix, grouped rankings, the
  monthly timeline and product ranking by sentiment score

### Presentation Layer
- **chart**: typed Plotly figure descriptions
- **dashboard**: named payload assembly with per-view error isolation
- **report**: the same views as plain text for the command line
- **graph** (`web` feature): server-side PNG rendering with plotters
- **app** (`web` feature): routing and handlers

## HTTP Endpoints

- `/` - Dashboard page with every view embedded
- `/update_plots/{category}` - Refreshed views for one category as JSON
- `/chart/{view}?category=...` - One view rendered as a PNG image
- `/static/...` - Stylesheets and other static files

## Configuration

Every setting has a default. A JSON file passed with `--config <path>`
overrides individual fields, see [`config::DashboardConfig`].
*/

pub mod aggregate;
pub mod chart;
pub mod config;
pub mod dashboard;
pub mod error;
pub mod filter;
pub mod loader;
pub mod report;
pub mod review;
pub mod title;

#[cfg(feature = "web")]
pub mod app;
#[cfg(feature = "web")]
pub mod graph;

pub use config::DashboardConfig;
pub use error::{ConfigError, DashboardError, LoadError};
pub use filter::CategoryFilter;
pub use loader::{Dataset, DatasetCache};
pub use review::{Review, Sentiment};
