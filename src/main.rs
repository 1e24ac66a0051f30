//! CLI interface for spontaria

use clap::{Parser, Subcommand};
use spontaria::{logging, search_flights, suggest_airports, ResultFilter, SearchRequest};
use std::fs;

#[derive(Parser)]
#[command(name = "spontaria")]
#[command(about = "Cheap flight offers across several origins")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Search flight offers
    Search {
        /// Origin airport codes (comma-separated)
        #[arg(short, long)]
        from: String,
        /// Destination airport code; omit for Adventure Anywhere
        #[arg(short, long)]
        to: Option<String>,
        /// Departure date (YYYY-MM-DD or YYYY-MM)
        #[arg(short, long)]
        date: Option<String>,
        /// Only direct flights
        #[arg(long)]
        direct_only: bool,
        /// Departure time window (HH:MM-HH:MM)
        #[arg(long)]
        depart_window: Option<String>,
        /// Sort order (price, shortest, longest)
        #[arg(long)]
        sort: Option<String>,
        /// Output file for JSON results
        #[arg(short, long)]
        output: Option<String>,
    },
    /// Look up airports by name
    Airports {
        /// Airport or city name
        query: String,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    logging::init_stderr("spontaria=warn")?;

    match cli.command {
        Commands::Search {
            from,
            to,
            date,
            direct_only,
            depart_window,
            sort,
            output,
        } => {
            let filter = ResultFilter::from_params(Some(direct_only), depart_window.as_deref(), sort.as_deref())?;
            let request = SearchRequest::new(&from, to.as_deref(), date.as_deref()).with_filter(filter);

            println!("Searching for flights...");
            match search_flights(request).await {
                Ok(result) => {
                    let json = serde_json::to_string_pretty(&result)?;

                    if let Some(output_file) = output {
                        fs::write(&output_file, &json)?;
                        println!("Results saved to {}", output_file);
                    } else {
                        println!("{}", json);
                    }

                    println!("\nSummary:");
                    println!("Source: {}", result.source);
                    println!("Found {} offers", result.count);

                    if let Some(cheapest) = result.data.iter().min_by(|a, b| a.price.total_cmp(&b.price)) {
                        println!(
                            "Cheapest: {} -> {} on {} for ${:.0}",
                            cheapest.origin, cheapest.destination, cheapest.airline_name, cheapest.price
                        );
                    }
                }
                Err(e) => {
                    eprintln!("Error searching for flights: {}", e);
                    std::process::exit(1);
                }
            }
        }
        Commands::Airports { query } => {
            let suggestions = suggest_airports(&query).await?;
            if suggestions.is_empty() {
                println!("No airports found for '{}'", query);
            }
            for s in suggestions {
                println!("{}  {} ({})", s.code, s.name, s.city);
            }
        }
    }

    Ok(())
}
