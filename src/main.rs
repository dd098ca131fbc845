use anyhow::{Context, Result};

use brezza::App;
use brezza_core::Config;
use brezza_store::FileStore;
use brezza_weather::{IpLocator, WeatherClient};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize core
    brezza_core::init()?;

    let (config, _validation) = Config::load_validated()?;

    let api_key = config.provider.effective_api_key().context(
        "No API key configured; set OPENWEATHER_API_KEY or provider.api_key in config.toml",
    )?;

    let client = WeatherClient::new(&api_key, &config.provider.language)?
        .with_base_urls(&config.provider.api_url, &config.provider.geo_url);

    let locator = if config.provider.locate_url.is_empty() {
        None
    } else {
        Some(IpLocator::new(&config.provider.locate_url)?)
    };

    let store = FileStore::new(&config.config_dir);
    let mut app = App::new(client, locator, store);

    app.start().await;

    tracing::info!("Brezza session started");

    println!("Brezza - Weather Lookup");
    println!("State directory: {}", config.config_dir.display());
    println!();

    if app.needs_consent_prompt() {
        println!("Location consent is undecided; the location card stays off until a decision is recorded.");
    }

    if let Some(current) = app.current_location() {
        let snapshot = &current.0;
        println!(
            "My location: {} {:.0}° ({})",
            snapshot.name, snapshot.current.temperature, snapshot.current.description
        );
    }

    if let Some(message) = app.error() {
        println!("! {}", message);
    }

    if app.cities().is_empty() && app.current_location().is_none() {
        println!("No saved cities. Search for a city to see its forecast.");
    } else {
        for city in app.cities() {
            println!(
                "{} {:.0}° ({})  min {:.0}° / max {:.0}°",
                city.name,
                city.current.temperature,
                city.current.description,
                city.current.temp_min,
                city.current.temp_max
            );
        }
    }

    Ok(())
}
