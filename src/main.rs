use review_dashboard::{CategoryFilter, DashboardConfig, DatasetCache, report};
use std::env;

/// Print every dashboard view as text
///
/// Usage: `review-dashboard [--config <path>] [category]`
fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args: Vec<String> = env::args().skip(1).collect();
    let config = DashboardConfig::from_args(&args)?;
    let filter = CategoryFilter::from_param(category_arg(&args));

    let cache = DatasetCache::new(&config.data_path);
    let dataset = cache.get()?;
    print!("{}", report::render_report(&dataset, &filter, &config)?);

    Ok(())
}

/// First positional argument that is not the value of `--config`
fn category_arg(args: &[String]) -> Option<&str> {
    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        if arg == "--config" {
            iter.next();
        } else {
            return Some(arg);
        }
    }
    None
}
