//! Corridor map utilities
//!
//! Loads the building's static GeoJSON corridor file and offers three
//! checks over it: coordinate validation, connectivity of the corridor
//! graph, and nearest-node lookup. Nodes are corridor vertices plus any
//! standalone Point features; two corridors are connected when they
//! share a vertex.
//!
//! This is deliberately not a router. It validates and measures.

use std::collections::{HashMap, HashSet};
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Result, ScoutError};

/// Vertices closer than this (in degrees) are treated as the same node.
/// At building scale this is well under a centimeter.
const NODE_EPSILON_DEGREES: f64 = 1e-7;

/// A GeoJSON FeatureCollection restricted to the geometry types the
/// corridor file uses.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorridorMap {
    #[serde(rename = "type")]
    pub collection_type: String,
    pub features: Vec<Feature>,
}

/// One feature in the collection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Feature {
    #[serde(default)]
    pub properties: serde_json::Value,
    pub geometry: Geometry,
}

/// Supported geometries. Coordinates keep any extra ordinates the file
/// carries; only the first two are interpreted.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Geometry {
    /// A corridor segment chain
    LineString { coordinates: Vec<Vec<f64>> },
    /// A named node such as a room door or stairwell
    Point { coordinates: Vec<f64> },
}

/// One problem found by [`CorridorMap::validate`].
#[derive(Debug, Clone, Serialize)]
pub struct ValidationIssue {
    /// Index of the offending feature in the collection
    pub feature: usize,
    /// Human-readable description
    pub message: String,
}

/// Outcome of the connectivity check.
#[derive(Debug, Clone, Serialize)]
pub struct ConnectivityReport {
    /// Distinct graph nodes
    pub node_count: usize,
    /// Connected components among them
    pub component_count: usize,
    /// Nodes outside the largest component
    pub unreachable_nodes: usize,
}

/// Nearest node to a query point.
#[derive(Debug, Clone, Serialize)]
pub struct NearestNode {
    pub lon: f64,
    pub lat: f64,
    /// Approximate distance in meters
    pub distance_meters: f64,
    /// The `name` property of the owning feature, when present
    pub name: Option<String>,
}

impl CorridorMap {
    /// Load and parse a GeoJSON file.
    ///
    /// # Errors
    ///
    /// Returns an error when the file cannot be read, is not valid
    /// GeoJSON of the supported shape, or is not a FeatureCollection.
    pub fn from_file(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path)
            .map_err(|e| ScoutError::Map(format!("cannot read {}: {}", path.display(), e)))?;
        Self::from_str(&json)
    }

    /// Parse GeoJSON text.
    pub fn from_str(json: &str) -> Result<Self> {
        let map: CorridorMap = serde_json::from_str(json)
            .map_err(|e| ScoutError::Map(format!("invalid GeoJSON: {}", e)))?;
        if map.collection_type != "FeatureCollection" {
            return Err(ScoutError::Map(format!(
                "expected a FeatureCollection, found {}",
                map.collection_type
            ))
            .into());
        }
        Ok(map)
    }

    /// Check every coordinate pair and segment. An empty issue list
    /// means the file is valid.
    pub fn validate(&self) -> Vec<ValidationIssue> {
        let mut issues = Vec::new();
        for (index, feature) in self.features.iter().enumerate() {
            match &feature.geometry {
                Geometry::Point { coordinates } => {
                    check_position(index, coordinates, &mut issues);
                }
                Geometry::LineString { coordinates } => {
                    if coordinates.len() < 2 {
                        issues.push(ValidationIssue {
                            feature: index,
                            message: format!(
                                "LineString has {} position(s), need at least 2",
                                coordinates.len()
                            ),
                        });
                    }
                    for position in coordinates {
                        check_position(index, position, &mut issues);
                    }
                    for (a, b) in coordinates.iter().zip(coordinates.iter().skip(1)) {
                        if a.len() >= 2
                            && b.len() >= 2
                            && (a[0] - b[0]).abs() < NODE_EPSILON_DEGREES
                            && (a[1] - b[1]).abs() < NODE_EPSILON_DEGREES
                        {
                            issues.push(ValidationIssue {
                                feature: index,
                                message: format!(
                                    "degenerate segment at ({}, {})",
                                    a[0], a[1]
                                ),
                            });
                        }
                    }
                }
            }
        }
        issues
    }

    /// Connected-component analysis over shared corridor vertices.
    /// Point features count as nodes too; a Point coinciding with a
    /// corridor vertex joins that corridor's component.
    pub fn connectivity(&self) -> ConnectivityReport {
        let mut node_ids: HashMap<(i64, i64), usize> = HashMap::new();
        let mut adjacency: Vec<Vec<usize>> = Vec::new();

        let mut node_id = |lon: f64, lat: f64, adjacency: &mut Vec<Vec<usize>>| -> usize {
            let key = quantize(lon, lat);
            *node_ids.entry(key).or_insert_with(|| {
                adjacency.push(Vec::new());
                adjacency.len() - 1
            })
        };

        for feature in &self.features {
            match &feature.geometry {
                Geometry::Point { coordinates } => {
                    if coordinates.len() >= 2 {
                        node_id(coordinates[0], coordinates[1], &mut adjacency);
                    }
                }
                Geometry::LineString { coordinates } => {
                    let ids: Vec<usize> = coordinates
                        .iter()
                        .filter(|p| p.len() >= 2)
                        .map(|p| node_id(p[0], p[1], &mut adjacency))
                        .collect();
                    for pair in ids.windows(2) {
                        adjacency[pair[0]].push(pair[1]);
                        adjacency[pair[1]].push(pair[0]);
                    }
                }
            }
        }

        let node_count = adjacency.len();
        let mut visited: HashSet<usize> = HashSet::new();
        let mut component_sizes = Vec::new();
        for start in 0..node_count {
            if !visited.insert(start) {
                continue;
            }
            let mut size = 1;
            let mut queue = vec![start];
            while let Some(node) = queue.pop() {
                for &next in &adjacency[node] {
                    if visited.insert(next) {
                        size += 1;
                        queue.push(next);
                    }
                }
            }
            component_sizes.push(size);
        }

        let largest = component_sizes.iter().copied().max().unwrap_or(0);
        ConnectivityReport {
            node_count,
            component_count: component_sizes.len(),
            unreachable_nodes: node_count - largest,
        }
    }

    /// Find the node nearest to the query point.
    ///
    /// Uses squared equirectangular distance for comparison, which is
    /// accurate at building scale, then reports meters.
    pub fn nearest_node(&self, lon: f64, lat: f64) -> Option<NearestNode> {
        let mut best: Option<(f64, f64, f64, Option<String>)> = None;
        for feature in &self.features {
            let name = feature
                .properties
                .get("name")
                .and_then(|v| v.as_str())
                .map(str::to_string);
            let positions: Vec<&Vec<f64>> = match &feature.geometry {
                Geometry::Point { coordinates } => vec![coordinates],
                Geometry::LineString { coordinates } => coordinates.iter().collect(),
            };
            for position in positions {
                if position.len() < 2 {
                    continue;
                }
                let d2 = equirectangular_sq(lon, lat, position[0], position[1]);
                if best.as_ref().map_or(true, |(bd, _, _, _)| d2 < *bd) {
                    best = Some((d2, position[0], position[1], name.clone()));
                }
            }
        }
        best.map(|(d2, node_lon, node_lat, name)| NearestNode {
            lon: node_lon,
            lat: node_lat,
            distance_meters: d2.sqrt() * METERS_PER_DEGREE,
            name,
        })
    }
}

/// Meters per degree of latitude; longitude is scaled by cos(lat) in
/// the distance formula.
const METERS_PER_DEGREE: f64 = 111_320.0;

fn quantize(lon: f64, lat: f64) -> (i64, i64) {
    let scale = 1.0 / NODE_EPSILON_DEGREES;
    ((lon * scale).round() as i64, (lat * scale).round() as i64)
}

/// Squared distance in degrees, with longitude corrected for latitude.
fn equirectangular_sq(lon_a: f64, lat_a: f64, lon_b: f64, lat_b: f64) -> f64 {
    let mean_lat = ((lat_a + lat_b) / 2.0).to_radians();
    let dx = (lon_a - lon_b) * mean_lat.cos();
    let dy = lat_a - lat_b;
    dx * dx + dy * dy
}

fn check_position(feature: usize, position: &[f64], issues: &mut Vec<ValidationIssue>) {
    if position.len() < 2 {
        issues.push(ValidationIssue {
            feature,
            message: format!("position has {} ordinate(s), need at least 2", position.len()),
        });
        return;
    }
    let (lon, lat) = (position[0], position[1]);
    if !(-180.0..=180.0).contains(&lon) {
        issues.push(ValidationIssue {
            feature,
            message: format!("longitude {} out of range [-180, 180]", lon),
        });
    }
    if !(-90.0..=90.0).contains(&lat) {
        issues.push(ValidationIssue {
            feature,
            message: format!("latitude {} out of range [-90, 90]", lat),
        });
    }
}
