mod parser;
mod storage;
mod favorites;
mod vendors;
mod display;
mod web;

use std::path::Path;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    // Check if we should run in web mode
    let args: Vec<String> = std::env::args().collect();
    if args.len() > 1 && args[1] == "web" {
        let port = args.get(2)
            .and_then(|p| p.parse::<u16>().ok())
            .unwrap_or(8080);

        let data_path = parser::schedule_data_path();
        println!("Loading schedule data from {}...", data_path.display());
        let data = parser::load_schedule(&data_path)?;

        println!("Starting web server on port {}...", port);
        println!("Access the site at http://localhost:{}", port);

        web::start_server(port, data).await?;
        return Ok(());
    }

    // CLI mode: one-shot drink vendor categorization, rewriting the
    // vendors file in place. Prefer the bundled data/ copy if present.
    let vendors_path = if Path::new("data/vendors-data.json").exists() {
        "data/vendors-data.json"
    } else {
        "vendors-data.json"
    };

    println!("Categorizing drink vendors in {}...", vendors_path);
    let summary = vendors::categorize_drink_vendors(vendors_path)?;
    println!(
        "Found {} drink vendors, added {} category tags",
        summary.drink_vendors_found, summary.categories_added
    );

    Ok(())
}
