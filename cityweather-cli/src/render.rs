//! Plain-text rendering of weather snapshots.

use chrono::{DateTime, FixedOffset};
use cityweather_core::{Coordinate, FavoriteEntry, HourlyEntry, WeatherSnapshot, icon};

pub fn print_weather(title: &str, coordinate: Coordinate, snapshot: &WeatherSnapshot, hours: usize) {
    println!("{title} ({coordinate})");
    println!("{}", current_summary(snapshot));
    println!(
        "  Sunrise {}  Sunset {}",
        snapshot.format_clock(snapshot.current.sunrise),
        snapshot.format_clock(snapshot.current.sunset)
    );
    println!(
        "  Humidity {}%  UV index {:.1}",
        snapshot.current.humidity, snapshot.current.uvi
    );

    let upcoming = snapshot.next_hours(hours);
    if !upcoming.is_empty() {
        println!();
        for hour in upcoming {
            println!("{}", hourly_line(snapshot, hour));
        }
    }
}

fn current_summary(snapshot: &WeatherSnapshot) -> String {
    let current = &snapshot.current;
    let (description, symbol) = current
        .primary()
        .map(|w| (w.description.as_str(), icon::symbol_for(&w.icon)))
        .unwrap_or(("unknown", icon::FALLBACK_SYMBOL));

    format!(
        "  {:.0}°C, feels like {:.0}°C, {description} [{symbol}]",
        current.temp, current.feels_like
    )
}

fn hourly_line(snapshot: &WeatherSnapshot, hour: &HourlyEntry) -> String {
    let label = snapshot
        .local_time(hour.dt)
        .map(|t| hour_label(&t))
        .unwrap_or_else(|| "--".to_string());
    let description = hour.primary().map(|w| w.description.as_str()).unwrap_or("");

    format!(
        "  {label:>8}  {:>5.1}°C  {:>3.0}% rain  {description}",
        hour.temp,
        hour.pop * 100.0
    )
}

fn hour_label(time: &DateTime<FixedOffset>) -> String {
    time.format("%a %-I%p").to_string()
}

pub fn favorite_line(entry: &FavoriteEntry, snapshot: &WeatherSnapshot) -> String {
    let symbol = snapshot
        .current
        .primary()
        .map(|w| icon::symbol_for(&w.icon))
        .unwrap_or(icon::FALLBACK_SYMBOL);

    format!("{:<24} {:>4.0}°C  {symbol}", entry.city, snapshot.current.temp)
}
