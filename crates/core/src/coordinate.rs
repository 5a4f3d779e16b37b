//! Free-form coordinate parsing.
//!
//! Merchants and customers paste coordinates copied from all kinds of map
//! tools, some of which emit `lat, lng` and some `lng, lat`. [`parse`] accepts
//! both and decides which number is the latitude from the value ranges.

use crate::types::{LatLng, MAX_LAT, MAX_LNG, MIN_LAT, MIN_LNG};

/// Order in which [`format`] writes the two components.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CoordinateOrder {
    #[default]
    LatLng,
    LngLat,
}

/// Parse `"a, b"` into a latitude/longitude pair.
///
/// Returns `None` for empty input, input without a comma, or when either side
/// is not a finite number. The first number is taken as the latitude when it
/// lies in [-90, 90] and the second lies in [-180, 180]; otherwise the two are
/// swapped. Values valid in either role therefore resolve lat-first, and a
/// pair valid in neither role still comes back swapped rather than `None`.
pub fn parse(input: &str) -> Option<LatLng> {
    let collapsed = input.split_whitespace().collect::<Vec<_>>().join(" ");
    if collapsed.is_empty() {
        return None;
    }

    let (left, right) = collapsed.split_once(',')?;
    let first = parse_finite(left)?;
    let second = parse_finite(right)?;

    let first_is_lat = (MIN_LAT..=MAX_LAT).contains(&first);
    let second_is_lng = (MIN_LNG..=MAX_LNG).contains(&second);

    if first_is_lat && second_is_lng {
        Some(LatLng::new(first, second))
    } else {
        Some(LatLng::new(second, first))
    }
}

/// Render a point with six decimals in the requested order.
pub fn format(point: &LatLng, order: CoordinateOrder) -> String {
    match order {
        CoordinateOrder::LatLng => format!("{:.6}, {:.6}", point.lat, point.lng),
        CoordinateOrder::LngLat => format!("{:.6}, {:.6}", point.lng, point.lat),
    }
}

fn parse_finite(part: &str) -> Option<f64> {
    part.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_close(actual: LatLng, lat: f64, lng: f64) {
        assert!((actual.lat - lat).abs() < 1e-6, "lat {} != {}", actual.lat, lat);
        assert!((actual.lng - lng).abs() < 1e-6, "lng {} != {}", actual.lng, lng);
    }

    #[test]
    fn test_parse_lat_first() {
        let point = parse("24.7136, 46.6753").unwrap();
        assert_close(point, 24.7136, 46.6753);
    }

    #[test]
    fn test_parse_swaps_when_first_is_not_latitude() {
        let point = parse("-122.0553238, 37.3615593").unwrap();
        assert_close(point, 37.3615593, -122.0553238);
    }

    #[test]
    fn test_parse_ambiguous_defaults_to_lat_first() {
        let point = parse("46.6753, 24.7136").unwrap();
        assert_close(point, 46.6753, 24.7136);

        let point = parse("10, 20").unwrap();
        assert_eq!(point, LatLng::new(10.0, 20.0));
    }

    #[test]
    fn test_parse_out_of_range_is_best_effort() {
        // Neither ordering is valid; the swapped pair is still returned.
        let point = parse("200, 300").unwrap();
        assert_eq!(point, LatLng::new(300.0, 200.0));
        assert!(!point.is_valid());
    }

    #[test]
    fn test_parse_collapses_whitespace() {
        let point = parse("  24.7136 ,\t\n  46.6753  ").unwrap();
        assert_close(point, 24.7136, 46.6753);
        assert_eq!(parse("24.7136,46.6753"), Some(LatLng::new(24.7136, 46.6753)));
    }

    #[test]
    fn test_parse_rejects_bad_input() {
        assert_eq!(parse(""), None);
        assert_eq!(parse("   \t "), None);
        assert_eq!(parse("24.7136 46.6753"), None);
        assert_eq!(parse("abc, 46.6753"), None);
        assert_eq!(parse("24.7136, "), None);
        assert_eq!(parse("NaN, 10"), None);
        assert_eq!(parse("inf, 10"), None);
        assert_eq!(parse("24.7, 46.6, 12"), None);
    }

    #[test]
    fn test_format_then_parse_is_stable() {
        let original = LatLng::new(37.3615593, -122.0553238);

        let lat_first = format(&original, CoordinateOrder::LatLng);
        assert_eq!(lat_first, "37.361559, -122.055324");
        assert_close(parse(&lat_first).unwrap(), 37.361559, -122.055324);

        // The swapped rendering recovers the same logical point.
        let lng_first = format(&original, CoordinateOrder::LngLat);
        assert_close(parse(&lng_first).unwrap(), 37.361559, -122.055324);

        let reparsed = parse(&format(&parse(&lat_first).unwrap(), CoordinateOrder::LatLng));
        assert_eq!(reparsed, parse(&lat_first));
    }
}
