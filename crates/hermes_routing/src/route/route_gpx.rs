use quick_xml::{
    Writer,
    events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event},
};

use crate::{error::RouteXmlError, geopoint::GeoPoint};

use super::route::Route;

/// Writes the route geometry as a GPX 1.1 track, one track segment per section.
pub fn write_route_gpx(route: &Route) -> Result<String, RouteXmlError> {
    let mut writer = Writer::new_with_indent(Vec::new(), b' ', 2);
    writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;

    let mut gpx = BytesStart::new("gpx");
    gpx.push_attribute(("version", "1.1"));
    gpx.push_attribute(("creator", "hermes"));
    gpx.push_attribute(("xmlns", "http://www.topografix.com/GPX/1/1"));
    writer.write_event(Event::Start(gpx))?;
    writer.write_event(Event::Start(BytesStart::new("trk")))?;

    writer.write_event(Event::Start(BytesStart::new("name")))?;
    writer.write_event(Event::Text(BytesText::new(&route.profile().name)))?;
    writer.write_event(Event::End(BytesEnd::new("name")))?;

    let mut current_section = None;
    let mut last_point: Option<GeoPoint> = None;

    for segment in route.segments() {
        if current_section != Some(segment.section) {
            if current_section.is_some() {
                writer.write_event(Event::End(BytesEnd::new("trkseg")))?;
            }
            writer.write_event(Event::Start(BytesStart::new("trkseg")))?;
            current_section = Some(segment.section);
            last_point = None;
        }

        for point in &segment.path {
            // Consecutive segments share their joining point
            if last_point == Some(*point) {
                continue;
            }
            let mut trkpt = BytesStart::new("trkpt");
            trkpt.push_attribute(("lat", point.lat.to_string().as_str()));
            trkpt.push_attribute(("lon", point.lng.to_string().as_str()));
            writer.write_event(Event::Empty(trkpt))?;
            last_point = Some(*point);
        }
    }
    if current_section.is_some() {
        writer.write_event(Event::End(BytesEnd::new("trkseg")))?;
    }

    writer.write_event(Event::End(BytesEnd::new("trk")))?;
    writer.write_event(Event::End(BytesEnd::new("gpx")))?;

    Ok(String::from_utf8(writer.into_inner())?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{profile::RouteProfile, test_utils::sample_route_segments};

    #[test]
    fn test_gpx_track_per_section() {
        let route = Route::from_segments(sample_route_segments(), RouteProfile::default()).unwrap();
        let gpx = write_route_gpx(&route).unwrap();

        assert!(gpx.starts_with("<?xml version=\"1.0\" encoding=\"UTF-8\"?>"));
        assert!(gpx.contains("<name>car</name>"));
        assert_eq!(gpx.matches("<trkseg>").count(), 2);
        // Three points in the first section, two in the second.
        assert_eq!(gpx.matches("<trkpt ").count(), 5);
        assert!(gpx.contains("<trkpt lat=\"-0.001\" lon=\"0.002\"/>"));
    }
}
