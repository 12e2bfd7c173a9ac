use std::{fs::File, io::BufReader, path::Path};

use anyhow::Context;
use hermes_navigation::instructions::{InstructionOptions, Locale};
use hermes_routing::{
    graph::RoadGraph,
    profile::{RouteProfile, RouteProfileType},
};
use serde::de::DeserializeOwned;

pub fn load_graph(path: &Path) -> anyhow::Result<RoadGraph> {
    RoadGraph::from_file(path).with_context(|| format!("Failed to load road graph {}", path.display()))
}

pub fn load_json<T: DeserializeOwned>(path: &Path) -> anyhow::Result<T> {
    let file = File::open(path).with_context(|| format!("Failed to open {}", path.display()))?;
    serde_json::from_reader(BufReader::new(file)).with_context(|| format!("Failed to parse {}", path.display()))
}

/// The built-in profile for `profile_type`, unless a profile file is given.
pub fn load_profile(profile_type: RouteProfileType, file: Option<&Path>) -> anyhow::Result<RouteProfile> {
    match file {
        Some(path) => load_json(path),
        None => Ok(RouteProfile::new(profile_type)),
    }
}

pub fn instruction_options(locale: &str, imperial: bool) -> InstructionOptions {
    InstructionOptions {
        locale: Locale::from_tag(locale),
        metric: !imperial,
        ..InstructionOptions::default()
    }
}
