use hermes_routing::geopoint::GeoPoint;
use jiff::SpanRelativeTo;

pub fn parse_duration(input: &str) -> Result<jiff::SignedDuration, String> {
    if let Ok(duration) = input.parse::<jiff::SignedDuration>() {
        return Ok(duration);
    }

    if let Ok(duration) = input
        .parse::<jiff::Span>()
        .and_then(|span| span.to_duration(SpanRelativeTo::days_are_24_hours()))
    {
        return Ok(duration);
    }

    if let Ok(seconds) = input.parse::<i64>() {
        return Ok(jiff::SignedDuration::from_secs(seconds.abs()));
    }

    Err(String::from("Invalid duration"))
}

/// Parses `lng,lat` in degrees.
pub fn parse_point(input: &str) -> Result<GeoPoint, String> {
    let Some((lng, lat)) = input.split_once(',') else {
        return Err(format!("Expected `lng,lat`, got `{input}`"));
    };

    let lng = lng.trim().parse::<f64>().map_err(|error| format!("Invalid longitude: {error}"))?;
    let lat = lat.trim().parse::<f64>().map_err(|error| format!("Invalid latitude: {error}"))?;

    let point = GeoPoint::new(lng, lat);
    if !point.is_valid() {
        return Err(format!("Coordinates out of range: `{input}`"));
    }
    Ok(point)
}
