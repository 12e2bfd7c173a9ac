use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RouteError {
    #[error("No roads found near the start of the route")]
    NoRoadsNearStart,
    #[error("No roads found near the end of the route")]
    NoRoadsNearEnd,
    #[error("No roads found near waypoint {0}")]
    NoRoadsNearWaypoint(usize),
    #[error("Waypoint {from} is not connected to waypoint {to}")]
    NoRouteConnectivity { from: usize, to: usize },
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    #[error("Route request was cancelled")]
    Cancelled,
    #[error("Route distance or time is too large")]
    Overflow,
}

#[derive(Error, Debug)]
pub enum RouteXmlError {
    #[error("Malformed route XML")]
    Xml(#[from] quick_xml::Error),
    #[error("Malformed attribute in route XML")]
    Attribute(#[from] quick_xml::events::attributes::AttrError),
    #[error("Failed to write route XML")]
    Io(#[from] std::io::Error),
    #[error("Route XML is not valid UTF-8")]
    Utf8(#[from] std::string::FromUtf8Error),
    #[error("Missing attribute `{attribute}` on <{element}>")]
    MissingAttribute {
        element: &'static str,
        attribute: &'static str,
    },
    #[error("Invalid value `{value}` for attribute `{attribute}`")]
    InvalidValue { attribute: String, value: String },
    #[error("Unexpected element <{0}>")]
    UnexpectedElement(String),
    #[error("No route element found")]
    MissingRoute,
    #[error(transparent)]
    Route(#[from] RouteError),
}

#[derive(Error, Debug)]
pub enum GraphError {
    #[error("Failed to read graph file")]
    Read(#[from] std::io::Error),
    #[error("Failed to parse graph file")]
    Parse(#[from] serde_json::Error),
    #[error("Road {road} references unknown node {node}")]
    UnknownNode { road: usize, node: usize },
    #[error("Road {0} starts and ends at the same node without intermediate points")]
    DegenerateRoad(usize),
}
