//! Bundled US postal-code table for instant, offline lookups.

use crate::types::GeoPoint;
use once_cell::sync::Lazy;
use std::collections::HashMap;
use tracing::warn;

const ZIPCODES_CSV: &str = include_str!("../../data/zipcodes.csv");

#[derive(Debug, Clone, PartialEq)]
pub struct ZipEntry {
    pub lat: f64,
    pub lng: f64,
    pub city: &'static str,
    pub state: &'static str,
}

static ZIP_TABLE: Lazy<HashMap<&'static str, ZipEntry>> = Lazy::new(|| {
    let mut table = HashMap::new();
    for (line_no, line) in ZIPCODES_CSV.lines().enumerate().skip(1) {
        if line.trim().is_empty() {
            continue;
        }
        match parse_row(line) {
            Some((zip, entry)) => {
                table.insert(zip, entry);
            }
            None => warn!("Skipping malformed zip table row {}", line_no + 1),
        }
    }
    table
});

fn parse_row(line: &'static str) -> Option<(&'static str, ZipEntry)> {
    let mut cols = line.split(',').map(str::trim);
    let zip = cols.next()?;
    let lat = cols.next()?.parse().ok()?;
    let lng = cols.next()?.parse().ok()?;
    let city = cols.next()?;
    let state = cols.next()?;
    Some((zip, ZipEntry { lat, lng, city, state }))
}

/// Resolves an exact 5-digit code. Never touches the network.
pub fn lookup_zip_code(zip: &str) -> Option<GeoPoint> {
    let zip = zip.trim();
    if zip.len() != 5 || !zip.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    ZIP_TABLE.get(zip).map(|entry| GeoPoint {
        lat: entry.lat,
        lng: entry.lng,
        display_name: format!("{}, {} {}", entry.city, entry.state, zip),
    })
}

pub fn zip_count() -> usize {
    ZIP_TABLE.len()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_zip_resolves() {
        let point = lookup_zip_code("30022").unwrap();
        assert_eq!(point.display_name, "Alpharetta, GA 30022");
        assert!((point.lat - 34.0236).abs() < 1e-6);
    }

    #[test]
    fn malformed_or_unknown_zip_is_none() {
        assert!(lookup_zip_code("3002").is_none());
        assert!(lookup_zip_code("3002a").is_none());
        assert!(lookup_zip_code("00000").is_none());
    }

    #[test]
    fn every_row_parses() {
        let rows = ZIPCODES_CSV.lines().skip(1).filter(|l| !l.trim().is_empty()).count();
        assert_eq!(zip_count(), rows);
    }
}
