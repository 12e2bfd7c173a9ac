use std::str::FromStr;

use quick_xml::{
    Reader, Writer,
    events::{BytesDecl, BytesEnd, BytesStart, Event},
};

use crate::{
    arc_attributes::{AccessFlags, Gradient, RoadClass},
    error::RouteXmlError,
    geopoint::GeoPoint,
    profile::{RouteProfile, VehicleType},
    turn::Turn,
};

use super::{route::Route, route_segment::RouteSegment};

const ROUTE: &str = "route";
const PROFILE: &str = "profile";
const VEHICLE: &str = "vehicle";
const ROAD_CLASS: &str = "road_class";
const GRADIENT: &str = "gradient";
const SEGMENT: &str = "segment";
const TURN: &str = "turn";
const POINT: &str = "point";

fn element<'a>(name: &'a str, attributes: &[(&str, String)]) -> BytesStart<'a> {
    let mut element = BytesStart::new(name);
    for (key, value) in attributes {
        element.push_attribute((*key, value.as_str()));
    }
    element
}

fn profile_attributes(profile: &RouteProfile) -> Vec<(&'static str, String)> {
    vec![
        ("name", profile.name.clone()),
        ("turn_time", profile.turn_time.to_string()),
        ("u_turn_time", profile.u_turn_time.to_string()),
        ("cross_traffic_turn_time", profile.cross_traffic_turn_time.to_string()),
        ("traffic_light_time", profile.traffic_light_time.to_string()),
        ("shortest", profile.shortest.to_string()),
        ("shortest_by_time", profile.shortest_by_time.to_string()),
        ("toll_penalty", profile.toll_penalty.to_string()),
        ("gradient_flags", profile.gradient_flags.to_string()),
    ]
}

fn vehicle_attributes(vehicle: &VehicleType) -> Vec<(&'static str, String)> {
    vec![
        ("access_flags", vehicle.access_flags.bits().to_string()),
        ("weight", vehicle.weight.to_string()),
        ("axle_load", vehicle.axle_load.to_string()),
        ("double_axle_load", vehicle.double_axle_load.to_string()),
        ("triple_axle_load", vehicle.triple_axle_load.to_string()),
        ("height", vehicle.height.to_string()),
        ("width", vehicle.width.to_string()),
        ("length", vehicle.length.to_string()),
        ("hazardous_materials", vehicle.hazardous_materials.to_string()),
    ]
}

fn segment_attributes(segment: &RouteSegment) -> Vec<(&'static str, String)> {
    vec![
        ("road_class", segment.road_class.to_string()),
        ("max_speed", segment.max_speed.to_string()),
        ("name", segment.name.clone()),
        ("ref", segment.reference.clone()),
        ("distance", segment.distance.to_string()),
        ("time", segment.time.to_string()),
        ("turn_time", segment.turn_time.to_string()),
        ("section", segment.section.to_string()),
        ("restricted", segment.restricted.to_string()),
        ("toll", segment.toll.to_string()),
        ("roundabout", segment.roundabout.to_string()),
    ]
}

fn turn_attributes(turn: &Turn) -> Vec<(&'static str, String)> {
    vec![
        ("type", turn.turn_type.to_string()),
        ("continuation", turn.continuation.to_string()),
        ("roundabout", turn.roundabout_state.to_string()),
        ("angle", turn.angle.to_string()),
        ("in_direction", turn.in_direction.to_string()),
        ("out_direction", turn.out_direction.to_string()),
        ("exit_number", turn.exit_number.to_string()),
        ("choices", turn.choices.to_string()),
        ("left_alternatives", turn.left_alternatives.to_string()),
        ("right_alternatives", turn.right_alternatives.to_string()),
        ("fork", turn.is_fork.to_string()),
        ("turn_off", turn.turn_off.to_string()),
        ("junction_name", turn.junction_name.clone()),
        ("junction_ref", turn.junction_ref.clone()),
    ]
}

/// Writes the route with its profile, segments and turns. Reading the
/// result back gives an equal route.
pub fn write_route_xml(route: &Route) -> Result<String, RouteXmlError> {
    let mut writer = Writer::new_with_indent(Vec::new(), b' ', 2);
    writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;

    writer.write_event(Event::Start(element(
        ROUTE,
        &[
            ("distance", route.distance().to_string()),
            ("time", route.time().to_string()),
        ],
    )))?;

    let profile = route.profile();
    writer.write_event(Event::Start(element(PROFILE, &profile_attributes(profile))))?;
    writer.write_event(Event::Empty(element(VEHICLE, &vehicle_attributes(&profile.vehicle))))?;
    for (index, speed) in profile.speed.iter().enumerate() {
        let Some(road_class) = RoadClass::from_index(index) else {
            continue;
        };
        writer.write_event(Event::Empty(element(
            ROAD_CLASS,
            &[
                ("name", road_class.to_string()),
                ("speed", speed.to_string()),
                ("bonus", profile.bonus[index].to_string()),
                ("restriction_override", profile.restriction_override[index].bits().to_string()),
            ],
        )))?;
    }
    for (index, speed) in profile.gradient_speed.iter().enumerate() {
        let Some(gradient) = u8::try_from(index).ok().and_then(Gradient::from_repr) else {
            continue;
        };
        writer.write_event(Event::Empty(element(
            GRADIENT,
            &[
                ("name", gradient.to_string()),
                ("speed", speed.to_string()),
                ("bonus", profile.gradient_bonus[index].to_string()),
            ],
        )))?;
    }
    writer.write_event(Event::End(BytesEnd::new(PROFILE)))?;

    for segment in route.segments() {
        writer.write_event(Event::Start(element(SEGMENT, &segment_attributes(segment))))?;
        writer.write_event(Event::Empty(element(TURN, &turn_attributes(&segment.turn))))?;
        for point in &segment.path {
            writer.write_event(Event::Empty(element(
                POINT,
                &[("lat", point.lat.to_string()), ("lng", point.lng.to_string())],
            )))?;
        }
        writer.write_event(Event::End(BytesEnd::new(SEGMENT)))?;
    }

    writer.write_event(Event::End(BytesEnd::new(ROUTE)))?;

    Ok(String::from_utf8(writer.into_inner())?)
}

struct ElementAttributes {
    element: &'static str,
    values: Vec<(String, String)>,
}

impl ElementAttributes {
    fn read(element: &'static str, start: &BytesStart) -> Result<Self, RouteXmlError> {
        let mut values = Vec::new();
        for attribute in start.attributes() {
            let attribute = attribute?;
            let key = String::from_utf8(attribute.key.as_ref().to_vec())?;
            let value = attribute.unescape_value()?.into_owned();
            values.push((key, value));
        }
        Ok(ElementAttributes { element, values })
    }

    fn get(&self, attribute: &str) -> Option<&str> {
        self.values
            .iter()
            .find(|(key, _)| key == attribute)
            .map(|(_, value)| value.as_str())
    }

    fn required(&self, attribute: &'static str) -> Result<&str, RouteXmlError> {
        self.get(attribute).ok_or(RouteXmlError::MissingAttribute {
            element: self.element,
            attribute,
        })
    }

    fn parse<T: FromStr>(&self, attribute: &'static str) -> Result<T, RouteXmlError> {
        let value = self.required(attribute)?;
        value.parse().map_err(|_| RouteXmlError::InvalidValue {
            attribute: attribute.to_string(),
            value: value.to_string(),
        })
    }

    fn parse_or<T: FromStr>(&self, attribute: &'static str, default: T) -> Result<T, RouteXmlError> {
        match self.get(attribute) {
            Some(_) => self.parse(attribute),
            None => Ok(default),
        }
    }

    fn text_or_empty(&self, attribute: &str) -> String {
        self.get(attribute).unwrap_or_default().to_string()
    }
}

fn read_profile(attributes: &ElementAttributes) -> Result<RouteProfile, RouteXmlError> {
    let defaults = RouteProfile::default();
    Ok(RouteProfile {
        name: attributes.text_or_empty("name"),
        turn_time: attributes.parse_or("turn_time", defaults.turn_time)?,
        u_turn_time: attributes.parse_or("u_turn_time", defaults.u_turn_time)?,
        cross_traffic_turn_time: attributes.parse_or("cross_traffic_turn_time", defaults.cross_traffic_turn_time)?,
        traffic_light_time: attributes.parse_or("traffic_light_time", defaults.traffic_light_time)?,
        shortest: attributes.parse_or("shortest", false)?,
        shortest_by_time: attributes.parse_or("shortest_by_time", false)?,
        toll_penalty: attributes.parse_or("toll_penalty", 0.0)?,
        gradient_flags: attributes.parse_or("gradient_flags", defaults.gradient_flags)?,
        ..defaults
    })
}

fn read_vehicle(attributes: &ElementAttributes) -> Result<VehicleType, RouteXmlError> {
    Ok(VehicleType {
        access_flags: AccessFlags::from_bits_truncate(attributes.parse("access_flags")?),
        weight: attributes.parse_or("weight", 0.0)?,
        axle_load: attributes.parse_or("axle_load", 0.0)?,
        double_axle_load: attributes.parse_or("double_axle_load", 0.0)?,
        triple_axle_load: attributes.parse_or("triple_axle_load", 0.0)?,
        height: attributes.parse_or("height", 0.0)?,
        width: attributes.parse_or("width", 0.0)?,
        length: attributes.parse_or("length", 0.0)?,
        hazardous_materials: attributes.parse_or("hazardous_materials", false)?,
    })
}

fn read_segment(attributes: &ElementAttributes) -> Result<RouteSegment, RouteXmlError> {
    Ok(RouteSegment {
        road_class: attributes.parse("road_class")?,
        max_speed: attributes.parse_or("max_speed", 0.0)?,
        name: attributes.text_or_empty("name"),
        reference: attributes.text_or_empty("ref"),
        distance: attributes.parse("distance")?,
        time: attributes.parse("time")?,
        turn_time: attributes.parse_or("turn_time", 0.0)?,
        path: Vec::new(),
        section: attributes.parse_or("section", 0)?,
        turn: Turn::default(),
        restricted: attributes.parse_or("restricted", false)?,
        toll: attributes.parse_or("toll", false)?,
        roundabout: attributes.parse_or("roundabout", false)?,
    })
}

fn read_turn(attributes: &ElementAttributes) -> Result<Turn, RouteXmlError> {
    Ok(Turn {
        turn_type: attributes.parse("type")?,
        continuation: attributes.parse_or("continuation", false)?,
        roundabout_state: attributes.parse_or("roundabout", Default::default())?,
        angle: attributes.parse_or("angle", 0.0)?,
        in_direction: attributes.parse_or("in_direction", 0.0)?,
        out_direction: attributes.parse_or("out_direction", 0.0)?,
        exit_number: attributes.parse_or("exit_number", 0)?,
        choices: attributes.parse_or("choices", 0)?,
        left_alternatives: attributes.parse_or("left_alternatives", 0)?,
        right_alternatives: attributes.parse_or("right_alternatives", 0)?,
        is_fork: attributes.parse_or("fork", false)?,
        turn_off: attributes.parse_or("turn_off", false)?,
        junction_name: attributes.text_or_empty("junction_name"),
        junction_ref: attributes.text_or_empty("junction_ref"),
    })
}

#[derive(Default)]
struct RouteXmlBuilder {
    seen_route: bool,
    profile: Option<RouteProfile>,
    segments: Vec<RouteSegment>,
    current_segment: Option<RouteSegment>,
}

impl RouteXmlBuilder {
    fn profile_mut(&mut self, element: &str) -> Result<&mut RouteProfile, RouteXmlError> {
        self.profile
            .as_mut()
            .ok_or_else(|| RouteXmlError::UnexpectedElement(element.to_string()))
    }

    fn segment_mut(&mut self, element: &str) -> Result<&mut RouteSegment, RouteXmlError> {
        self.current_segment
            .as_mut()
            .ok_or_else(|| RouteXmlError::UnexpectedElement(element.to_string()))
    }

    fn start(&mut self, start: &BytesStart, is_empty: bool) -> Result<(), RouteXmlError> {
        let name = String::from_utf8(start.name().as_ref().to_vec())?;
        match name.as_str() {
            ROUTE => self.seen_route = true,
            PROFILE => {
                self.profile = Some(read_profile(&ElementAttributes::read(PROFILE, start)?)?);
            }
            VEHICLE => {
                let vehicle = read_vehicle(&ElementAttributes::read(VEHICLE, start)?)?;
                self.profile_mut(VEHICLE)?.vehicle = vehicle;
            }
            ROAD_CLASS => {
                let attributes = ElementAttributes::read(ROAD_CLASS, start)?;
                let road_class: RoadClass = attributes.parse("name")?;
                let index = road_class.index();
                let speed = attributes.parse("speed")?;
                let bonus = attributes.parse_or("bonus", 0.0)?;
                let restriction_override = AccessFlags::from_bits_truncate(attributes.parse_or("restriction_override", 0)?);

                let profile = self.profile_mut(ROAD_CLASS)?;
                profile.speed[index] = speed;
                profile.bonus[index] = bonus;
                profile.restriction_override[index] = restriction_override;
            }
            GRADIENT => {
                let attributes = ElementAttributes::read(GRADIENT, start)?;
                let gradient: Gradient = attributes.parse("name")?;
                let speed = attributes.parse("speed")?;
                let bonus = attributes.parse_or("bonus", 0.0)?;

                let profile = self.profile_mut(GRADIENT)?;
                profile.gradient_speed[gradient.index()] = speed;
                profile.gradient_bonus[gradient.index()] = bonus;
            }
            SEGMENT => {
                let segment = read_segment(&ElementAttributes::read(SEGMENT, start)?)?;
                if is_empty {
                    self.segments.push(segment);
                } else {
                    self.current_segment = Some(segment);
                }
            }
            TURN => {
                let turn = read_turn(&ElementAttributes::read(TURN, start)?)?;
                self.segment_mut(TURN)?.turn = turn;
            }
            POINT => {
                let attributes = ElementAttributes::read(POINT, start)?;
                let point = GeoPoint::new(attributes.parse("lng")?, attributes.parse("lat")?);
                self.segment_mut(POINT)?.path.push(point);
            }
            _ => return Err(RouteXmlError::UnexpectedElement(name)),
        }
        Ok(())
    }

    fn end(&mut self, name: &[u8]) {
        if name == SEGMENT.as_bytes() {
            if let Some(segment) = self.current_segment.take() {
                self.segments.push(segment);
            }
        }
    }

    fn build(self) -> Result<Route, RouteXmlError> {
        if !self.seen_route {
            return Err(RouteXmlError::MissingRoute);
        }
        Ok(Route::from_segments(self.segments, self.profile.unwrap_or_default())?)
    }
}

/// Reads a route written by [`write_route_xml`]. Totals are recomputed from the segments.
pub fn read_route_xml(xml: &str) -> Result<Route, RouteXmlError> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut builder = RouteXmlBuilder::default();
    loop {
        match reader.read_event()? {
            Event::Start(start) => builder.start(&start, false)?,
            Event::Empty(start) => builder.start(&start, true)?,
            Event::End(end) => builder.end(end.name().as_ref()),
            Event::Eof => break,
            _ => {}
        }
    }

    builder.build()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        arc_attributes::RoadClass,
        profile::RouteProfileType,
        test_utils::{sample_route_segments, segment_on},
        turn::{RoundaboutState, TurnType},
    };

    #[test]
    fn test_route_xml_round_trip() {
        let mut profile = RouteProfile::new(RouteProfileType::Cycle);
        profile.toll_penalty = 0.25;
        profile.restriction_override[RoadClass::Track.index()] = AccessFlags::BICYCLE;
        let route = Route::from_segments(sample_route_segments(), profile).unwrap();

        let xml = write_route_xml(&route).unwrap();
        let read = read_route_xml(&xml).unwrap();

        assert_eq!(read, route);
        assert!((read.distance() - route.distance()).abs() < 1e-9);
        assert_eq!(read.segments().len(), route.segments().len());
        for (read, written) in read.segments().iter().zip(route.segments()) {
            assert_eq!(read.road_class, written.road_class);
            assert_eq!(read.name, written.name);
            assert_eq!(read.turn.turn_type, written.turn.turn_type);
        }
    }

    #[test]
    fn test_escapes_names() {
        let mut segment = segment_on(0, &[(0.0, 0.0), (0.001, 0.0)], 10.0);
        segment.name = "Rue de l'Église & <Quai>".to_string();
        segment.turn.roundabout_state = RoundaboutState::Exit;
        segment.turn.turn_type = TurnType::BearLeft;
        let route = Route::from_segments(vec![segment], RouteProfile::default()).unwrap();

        let read = read_route_xml(&write_route_xml(&route).unwrap()).unwrap();
        assert_eq!(read.segments()[0].name, "Rue de l'Église & <Quai>");
        assert_eq!(read.segments()[0].turn.roundabout_state, RoundaboutState::Exit);
    }

    #[test]
    fn test_read_errors() {
        assert!(matches!(read_route_xml(""), Err(RouteXmlError::MissingRoute)));
        assert!(matches!(
            read_route_xml("<route><segment distance=\"1\" time=\"1\"/></route>"),
            Err(RouteXmlError::MissingAttribute {
                element: "segment",
                attribute: "road_class"
            })
        ));
        assert!(matches!(
            read_route_xml("<route><lane/></route>"),
            Err(RouteXmlError::UnexpectedElement(name)) if name == "lane"
        ));
        assert!(matches!(
            read_route_xml("<route><segment road_class=\"canal\" distance=\"1\" time=\"1\"/></route>"),
            Err(RouteXmlError::InvalidValue { .. })
        ));
    }
}
