//! Map command handler
//!
//! Console front end for the corridor map checks: validation plus
//! connectivity on `validate`, nearest-node lookup on `nearest`.

use std::path::Path;

use colored::Colorize;

use crate::cli::MapCommand;
use crate::error::{Result, ScoutError};
use crate::map::CorridorMap;

/// Handle `map` subcommands.
///
/// # Errors
///
/// Fails when the file cannot be loaded; `validate` also fails when
/// issues are found so scripted checks get a nonzero exit.
pub fn handle_map(command: MapCommand) -> Result<()> {
    match command {
        MapCommand::Validate { file } => validate(&file),
        MapCommand::Nearest { file, lon, lat } => nearest(&file, lon, lat),
    }
}

fn validate(file: &Path) -> Result<()> {
    let map = CorridorMap::from_file(file)?;
    let issues = map.validate();
    let report = map.connectivity();

    println!(
        "{} feature(s), {} node(s), {} component(s), {} unreachable",
        map.features.len(),
        report.node_count,
        report.component_count,
        report.unreachable_nodes
    );
    if report.component_count > 1 {
        println!(
            "{}",
            format!(
                "Warning: corridor graph is split into {} components",
                report.component_count
            )
            .yellow()
        );
    }

    if issues.is_empty() {
        println!("{}", "Map is valid.".green());
        return Ok(());
    }
    for issue in &issues {
        println!(
            "  {} feature {}: {}",
            "invalid".red(),
            issue.feature,
            issue.message
        );
    }
    Err(ScoutError::Map(format!("{} validation issue(s) found", issues.len())).into())
}

fn nearest(file: &Path, lon: f64, lat: f64) -> Result<()> {
    let map = CorridorMap::from_file(file)?;
    let node = map
        .nearest_node(lon, lat)
        .ok_or_else(|| ScoutError::Map("map has no nodes".to_string()))?;

    match &node.name {
        Some(name) => println!(
            "Nearest node: {} at ({}, {}), {:.1} m away",
            name.cyan(),
            node.lon,
            node.lat,
            node.distance_meters
        ),
        None => println!(
            "Nearest node: ({}, {}), {:.1} m away",
            node.lon, node.lat, node.distance_meters
        ),
    }
    Ok(())
}
