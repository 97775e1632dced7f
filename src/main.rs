use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::Parser;
use food_discovery::{SearchLocation, SearchResult, SearchState, Settings};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "food-discovery", about = "Discover dishes from liked and disliked examples")]
struct Args {
    /// TOML settings file, defaults to ./food-discovery.toml when present
    #[arg(long)]
    config: Option<PathBuf>,
    #[arg(long)]
    base_url: Option<String>,
    /// Product id to use as a positive example
    #[arg(long = "like")]
    likes: Vec<String>,
    /// Product id to use as a negative example
    #[arg(long = "dislike")]
    dislikes: Vec<String>,
    /// Free-text query the results should match
    #[arg(long = "query")]
    queries: Vec<String>,
    /// Free-text query to mark as disliked
    #[arg(long = "avoid")]
    avoid: Vec<String>,
    /// Restrict results around `LAT,LON`
    #[arg(long, value_parser = parse_point)]
    near: Option<(f64, f64)>,
    #[arg(long)]
    radius: Option<f64>,
    /// Rank with the average vector instead of the best score
    #[arg(long)]
    average_vector: bool,
    #[arg(long)]
    limit: Option<u32>,
}

fn parse_point(raw: &str) -> std::result::Result<(f64, f64), String> {
    let (lat, lon) = raw
        .split_once(',')
        .ok_or_else(|| format!("expected LAT,LON, got `{raw}`"))?;
    let lat = lat.trim().parse().map_err(|_| format!("bad latitude `{lat}`"))?;
    let lon = lon.trim().parse().map_err(|_| format!("bad longitude `{lon}`"))?;
    Ok((lat, lon))
}

// Ids given on the command line have no details beyond the id itself.
fn product_stub(id: &str) -> SearchResult {
    SearchResult {
        product_id: id.to_string(),
        product_name: id.to_string(),
        product_description: String::new(),
        product_image_url: String::new(),
        product_restaurant: None,
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();
    let args = Args::parse();

    let mut settings = Settings::load(args.config.as_deref()).context("loading settings")?;
    if let Some(base_url) = args.base_url {
        settings.base_url = base_url;
    }
    if let Some(radius) = args.radius {
        settings.radius_km = radius;
    }
    if args.limit.is_some() {
        settings.limit = args.limit;
    }
    settings.validate()?;

    let mut state = SearchState::new(&settings)?;
    for id in &args.dislikes {
        state.add_product_filter(product_stub(id), false);
    }
    for id in &args.likes {
        state.add_product_filter(product_stub(id), true);
    }
    for query in &args.avoid {
        state.add_text_filter(query, false);
    }
    for query in &args.queries {
        state.add_text_filter(query, true);
    }
    if let Some((latitude, longitude)) = args.near {
        state.set_location(Some(SearchLocation::new(latitude, longitude, settings.radius_km)?));
    }
    state.set_new_strategy(!args.average_vector);

    let results = match state.try_retrieve_results(None, None, None).await {
        Ok(results) => results,
        Err(err) => bail!("search against {} failed: {err}", settings.search_url()),
    };
    for result in results {
        match &result.product_restaurant {
            Some(restaurant) => println!(
                "{}\t{}\t[{}]",
                result.product_id, result.product_name, restaurant.name
            ),
            None => println!("{}\t{}", result.product_id, result.product_name),
        }
    }
    Ok(())
}
