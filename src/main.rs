use std::env;

use anyhow::{bail, Context, Result};

use smart_meal_finder::{init_tracing, AppConfig, LatLng, RecommendationPipeline};

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();

    let mut args = env::args().skip(1);
    let (query, location, radius) = match (args.next(), args.next()) {
        (Some(query), Some(location)) => {
            let radius = args
                .next()
                .map(|r| r.parse::<u32>().context("radius must be a number of meters"))
                .transpose()?;
            (query, location, radius)
        }
        _ => bail!("usage: smart-meal-finder <query> <lat,lng> [radius_meters]"),
    };

    let config = AppConfig::from_env();
    let location = LatLng::parse(&location)?;
    let pipeline = RecommendationPipeline::new(&config)?;

    println!("Searching for: {query} near {},{} ...\n", location.lat, location.lng);
    let recommendations = pipeline.run(&query, location, radius).await?;

    if recommendations.is_empty() {
        println!("No places found.");
        return Ok(());
    }

    for r in &recommendations {
        println!("--- {} ---", r.name);
        if let Some(address) = &r.address {
            println!("Address: {address}");
        }
        match (r.rating, r.rating_count) {
            (Some(rating), Some(count)) => println!("Rating: {rating} ({count} reviews)"),
            (Some(rating), None) => println!("Rating: {rating}"),
            _ => {}
        }
        println!(
            "Match: {}",
            r.match_summary.as_deref().unwrap_or("unavailable")
        );
        if let Some(excerpt) = &r.menu_excerpt {
            println!("Menu excerpt: {excerpt}");
        }
        match &r.review {
            Some(review) => {
                println!("Review summary: {}", review.summary);
                println!("Price: {}", review.price_label);
                if !review.opening_hours.is_empty() {
                    println!("Hours: {}", review.opening_hours.join("; "));
                }
            }
            None => println!("Review summary: unavailable"),
        }
        println!();
    }

    Ok(())
}
