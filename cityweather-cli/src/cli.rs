use anyhow::{Context, bail};
use clap::{Parser, Subcommand};
use inquire::{Password, PasswordDisplayMode};

use cityweather_core::{
    Config, Coordinate, FavoriteEntry, FavoritesStore, PlaceName, WeatherSession,
};

use crate::render;

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "cityweather", version, about = "City weather lookups and favorites")]
pub struct Cli {
    /// Enable debug logging (RUST_LOG takes precedence).
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Store the OpenWeatherMap API key.
    Configure,

    /// Show weather for a city.
    Show {
        /// City name, e.g. "Sydney".
        city: String,

        /// Number of hourly entries to print.
        #[arg(long, default_value_t = 12)]
        hours: usize,
    },

    /// Show weather for a coordinate, as when dropping a pin on a map.
    At {
        #[arg(allow_negative_numbers = true)]
        latitude: f64,

        #[arg(allow_negative_numbers = true)]
        longitude: f64,

        #[arg(long, default_value_t = 12)]
        hours: usize,
    },

    /// Manage favorite cities.
    Favorites {
        #[command(subcommand)]
        action: FavoritesCommand,
    },
}

#[derive(Debug, Subcommand)]
pub enum FavoritesCommand {
    /// List saved cities.
    List,
    /// Look up a city and save it.
    Add { city: String },
    /// Remove a saved city.
    Remove { city: String },
    /// Fetch current weather for every saved city.
    Refresh,
}

impl Cli {
    pub async fn run(self) -> anyhow::Result<()> {
        match self.command {
            Command::Configure => configure(),
            Command::Show { city, hours } => {
                validate_city_name(&city)?;
                let session = session()?;
                let (coordinate, snapshot) = session
                    .search_city(&city)
                    .await
                    .with_context(|| format!("Could not get weather for '{city}'"))?;

                render::print_weather(&city, coordinate, &snapshot, hours);
                Ok(())
            }
            Command::At {
                latitude,
                longitude,
                hours,
            } => {
                let session = session()?;
                let coordinate = Coordinate::new(latitude, longitude);

                // A missing place name is shown as "Unknown" rather than failing the command.
                let place = match session.place_name(coordinate).await {
                    Ok(place) => place.to_string(),
                    Err(e) => {
                        tracing::warn!("Reverse geocoding {coordinate} failed: {e}");
                        PlaceName::UNKNOWN.to_string()
                    }
                };

                let snapshot = session
                    .fetch_weather(latitude, longitude)
                    .await
                    .with_context(|| format!("Could not get weather for {coordinate}"))?;

                render::print_weather(&place, coordinate, &snapshot, hours);
                Ok(())
            }
            Command::Favorites { action } => run_favorites(action).await,
        }
    }
}

async fn run_favorites(action: FavoritesCommand) -> anyhow::Result<()> {
    let mut store = FavoritesStore::open_default()?;

    match action {
        FavoritesCommand::List => {
            if store.entries().is_empty() {
                println!("No favorites yet. Add one with `cityweather favorites add <city>`.");
            }
            for entry in store.entries() {
                println!("{:<24} {}", entry.city, entry.coordinate());
            }
        }
        FavoritesCommand::Add { city } => {
            validate_city_name(&city)?;
            let coordinate = session()?
                .fetch_location(&city)
                .await
                .with_context(|| format!("Could not find '{city}'"))?;

            store.add(FavoriteEntry::new(city.trim(), coordinate))?;
            println!("Saved {} ({coordinate})", city.trim());
        }
        FavoritesCommand::Remove { city } => {
            let city = city.trim();
            if store.remove(city)? {
                println!("Removed {city}");
            } else {
                println!("{city} is not in favorites");
            }
        }
        FavoritesCommand::Refresh => {
            let session = session()?;
            let results = session.refresh_favorites(store.entries()).await;
            for (entry, result) in store.entries().iter().zip(results) {
                match result {
                    Ok(snapshot) => println!("{}", render::favorite_line(entry, &snapshot)),
                    Err(e) => println!("{:<24} {}", entry.city, e.user_message()),
                }
            }
        }
    }

    Ok(())
}

fn configure() -> anyhow::Result<()> {
    let mut config = Config::load()?;

    let api_key = Password::new("OpenWeatherMap API key:")
        .with_display_mode(PasswordDisplayMode::Masked)
        .without_confirmation()
        .prompt()
        .context("Failed to read API key")?;

    let api_key = api_key.trim();
    if api_key.is_empty() {
        bail!("API key must not be empty");
    }

    config.set_api_key(api_key.to_string());
    config.save()?;
    println!("Saved configuration to {}", Config::config_file_path()?.display());
    Ok(())
}

fn session() -> anyhow::Result<WeatherSession> {
    let config = Config::load()?;
    WeatherSession::from_config(&config)
}

/// Accept letters (any script), spaces, and `-`, `'` or `.` as found in place names.
fn validate_city_name(city: &str) -> anyhow::Result<()> {
    let trimmed = city.trim();
    if trimmed.is_empty() {
        bail!("City name must not be empty");
    }

    let valid = trimmed
        .chars()
        .all(|c| c.is_alphabetic() || matches!(c, ' ' | '-' | '\'' | '.'));
    if !valid {
        bail!("Invalid city name '{city}'. Use letters and spaces only.");
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_ordinary_city_names() {
        for name in ["Sydney", "New York", "Saint-Étienne", "St. John's", "Zürich", "Washington D.C."] {
            assert!(validate_city_name(name).is_ok(), "{name} should be valid");
        }
    }

    #[test]
    fn rejects_digits_and_symbols() {
        for name in ["", "   ", "Sydney2000", "Paris;DROP", "<script>", "Paris, France"] {
            assert!(validate_city_name(name).is_err(), "{name:?} should be invalid");
        }
    }

    #[test]
    fn parses_negative_coordinates() {
        let cli = Cli::try_parse_from(["cityweather", "at", "-33.8688", "151.2093"]).unwrap();
        match cli.command {
            Command::At {
                latitude,
                longitude,
                hours,
            } => {
                assert_eq!(latitude, -33.8688);
                assert_eq!(longitude, 151.2093);
                assert_eq!(hours, 12);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn parses_favorites_subcommands() {
        let cli = Cli::try_parse_from(["cityweather", "-v", "favorites", "add", "Sydney"]).unwrap();
        assert!(cli.verbose);
        assert!(matches!(
            cli.command,
            Command::Favorites {
                action: FavoritesCommand::Add { ref city }
            } if city == "Sydney"
        ));
    }
}
