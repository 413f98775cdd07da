//! Offline query analysis
//!
//! Shows how queries are classified and which fallbacks would be tried,
//! without contacting the listings provider.

use homesift::{analysis::SAMPLE_QUERIES, diagnose};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    for query in SAMPLE_QUERIES {
        let report = diagnose(query);
        println!(
            "{query:?}\n  -> {} ({:.2})",
            report.analysis.search_type(),
            report.analysis.confidence
        );

        for (i, fallback) in report.fallback_strategies.iter().enumerate() {
            println!(
                "     fallback-{}: {:?} ({:.2})",
                i + 1,
                fallback.extracted_data.location().unwrap_or_default(),
                fallback.confidence
            );
        }
        for recommendation in &report.recommendations {
            println!("     hint: {recommendation}");
        }
    }

    // Full report as JSON for one query
    println!("\n{}", serde_json::to_string_pretty(&diagnose("3 bedroom homes in Longview TX"))?);
    Ok(())
}
