//! Utility functions for distances and itinerary output.

use std::fmt::Write as _;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

use crate::problem::Coordinate;
use crate::solution::{Itinerary, Role};

/// Mean Euclidean distance from `point` to each of `others`.
///
/// Returns `None` for an empty set, which callers treat as "no anchor".
pub fn mean_distance(point: &Coordinate, others: &[Coordinate]) -> Option<f64> {
    if others.is_empty() {
        return None;
    }

    let total: f64 = others.iter().map(|o| point.euclidean(o)).sum();
    Some(total / others.len() as f64)
}

/// Save an itinerary as pretty-printed JSON.
pub fn save_itinerary<P: AsRef<Path>>(itinerary: &Itinerary, path: P) -> io::Result<()> {
    let mut writer = BufWriter::new(File::create(path)?);
    serde_json::to_writer_pretty(&mut writer, itinerary)?;
    writeln!(writer)?;
    writer.flush()
}

/// Render an itinerary as a human-readable summary.
pub fn format_itinerary(itinerary: &Itinerary) -> String {
    let mut out = String::new();

    let _ = writeln!(out, "Total Distance: {:.2} km", itinerary.total_distance_km());
    let _ = writeln!(out, "Number of Days: {}", itinerary.days.len());
    let _ = writeln!(out);

    for day in &itinerary.days {
        let _ = writeln!(out, "{} ({:.2} km)", day.day, day.distance_km);

        if day.route.is_empty() {
            let _ = writeln!(out, "  Empty");
            continue;
        }

        for (i, stop) in day.route.iter().enumerate() {
            let marker = match stop.role {
                Some(Role::Origin) => " [origin]",
                Some(Role::Destination) => " [destination]",
                Some(Role::Accommodation) => " [accommodation]",
                None => "",
            };
            let _ = writeln!(out, "  {:>2}. {}{}", i + 1, stop.name, marker);
        }
        let _ = writeln!(out);
    }

    if !itinerary.suggestions.is_empty() {
        let _ = writeln!(out, "Unplaced:");
        for suggestion in &itinerary.suggestions {
            let days: Vec<String> = suggestion
                .suggested_days
                .iter()
                .map(ToString::to_string)
                .collect();
            let hint = if days.is_empty() {
                "no suggestion".to_string()
            } else {
                format!("try {}", days.join(", "))
            };
            let _ = writeln!(
                out,
                "  {} ({}): {}",
                suggestion.name, suggestion.category, hint
            );
        }
    }

    out
}
