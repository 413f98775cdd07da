//! Basic property search
//!
//! This example demonstrates the fundamental search operations:
//! - Creating a searcher from the `ZILLOW_*` environment variables
//! - Free-form and filtered searches
//! - Searching around a coordinate
//!
//! Run with `ZILLOW_URL` and `ZILLOW_API_KEY` set.

use homesift::{
    GeoPoint, NearbyRequest, PropertySearcher, SearchConfigBuilder, SearchFilters, SearchRequest,
    SearchResponse,
};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    homesift::init_logging(tracing::Level::INFO)?;

    let searcher =
        PropertySearcher::from_env()?.with_config(SearchConfigBuilder::development().build());

    // Unfiltered: fans out over every listing status
    println!("Searching for 'San Antonio, TX':");
    let response = searcher.search_query("San Antonio, TX").await?;
    print_response(&response, 5);

    // Filtered, ranked by distance from downtown Longview
    println!("\nSearching for '3 bedroom homes in Longview TX' (for sale, $200k+):");
    let filters = SearchFilters::new()
        .apply()
        .listing_status("ForSale")
        .price_min(200_000);
    let request = SearchRequest::new("3 bedroom homes in Longview TX")
        .with_filters(filters)
        .with_origin(GeoPoint::new(32.5007, -94.7405));
    print_response(&searcher.search(&request).await?, 5);

    // Coordinate search
    println!("\nHomes within 2 miles of the Texas Capitol:");
    let nearby = NearbyRequest::new(GeoPoint::new(30.2747, -97.7404)).with_radius(2.0);
    print_response(&searcher.search_nearby(&nearby).await?, 5);

    Ok(())
}

fn print_response(response: &SearchResponse, limit: usize) {
    println!(
        "  type: {}, confidence: {:.2}, strategy: {}",
        response.search_type.as_str(),
        response.confidence,
        response.successful_strategy.as_deref().unwrap_or("-"),
    );

    for (i, home) in response.nearby_homes.iter().take(limit).enumerate() {
        println!(
            "  {}. {} - ${:.0}, {} bd, {:.2} mi",
            i + 1,
            home.address.as_deref().unwrap_or("Unknown"),
            home.price.unwrap_or(0.0),
            home.bedrooms.map_or_else(|| "?".to_string(), |b| b.to_string()),
            home.distance(),
        );
    }

    if response.len() > limit {
        println!("  ... and {} more", response.len() - limit);
    }
}
