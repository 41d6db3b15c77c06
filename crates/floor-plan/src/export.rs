//! Coordinate export record consumed by map renderers
//!
//! Indices are 1-based at this boundary.

use crate::graph::{ConnectivityGraph, Direction};
use crate::layout::{LayoutPath, LayoutStrategy};
use serde::{Deserialize, Serialize};
use vmap_common::{ProcessingError, Result};

/// Optional labels describing where the sequence was captured
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SiteInfo {
    pub building: Option<String>,
    pub floor: Option<i32>,
    pub wing: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub x: f64,
    pub y: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportConnection {
    /// 1-based id of the connected position
    pub target_id: usize,
    pub direction: Direction,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportPosition {
    /// 1-based display index
    pub id: usize,
    pub filename: String,
    pub coordinates: Coordinates,
    pub connections: Vec<ExportConnection>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayoutExport {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub building: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub floor: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub wing: Option<String>,
    pub layout: LayoutStrategy,
    pub total_images: usize,
    pub positions: Vec<ExportPosition>,
}

impl LayoutExport {
    /// Assemble the export for an ordered sequence
    ///
    /// # Errors
    /// Returns [`ProcessingError::DegenerateInput`] if the identifiers, path and graph
    /// disagree on the number of positions
    pub fn build<S: AsRef<str>>(
        ids: &[S],
        path: &LayoutPath,
        graph: &ConnectivityGraph,
        strategy: LayoutStrategy,
        site: &SiteInfo,
    ) -> Result<Self> {
        if ids.len() != path.len() || graph.node_count() != path.len() {
            return Err(ProcessingError::DegenerateInput(format!(
                "layout size mismatch: {} ids, {} points, {} graph nodes",
                ids.len(),
                path.len(),
                graph.node_count()
            )));
        }

        let positions = path
            .points()
            .iter()
            .zip(ids)
            .map(|(point, id)| ExportPosition {
                id: point.index + 1,
                filename: id.as_ref().to_string(),
                coordinates: Coordinates {
                    x: point.x,
                    y: point.y,
                },
                connections: graph
                    .edges_from(point.index)
                    .iter()
                    .map(|edge| ExportConnection {
                        target_id: edge.to + 1,
                        direction: edge.direction,
                    })
                    .collect(),
            })
            .collect();

        Ok(Self {
            building: site.building.clone(),
            floor: site.floor,
            wing: site.wing.clone(),
            layout: strategy,
            total_images: ids.len(),
            positions,
        })
    }

    /// Identifiers in capture order
    pub fn filenames(&self) -> impl Iterator<Item = &str> + '_ {
        self.positions.iter().map(|p| p.filename.as_str())
    }

    /// # Errors
    /// Returns [`ProcessingError::Serialization`] if encoding fails
    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::{place, LayoutConfig};

    fn export(ids: &[&str], strategy: LayoutStrategy, site: &SiteInfo) -> LayoutExport {
        let path = place(ids.len(), strategy, &LayoutConfig::default()).unwrap();
        let graph = ConnectivityGraph::from_path(&path);
        LayoutExport::build(ids, &path, &graph, strategy, site).unwrap()
    }

    #[test]
    fn test_one_based_ids_and_targets() {
        let ids = ["a.jpg", "b.jpg", "c.jpg"];
        let record = export(&ids, LayoutStrategy::Linear, &SiteInfo::default());
        assert_eq!(record.total_images, 3);
        assert_eq!(record.filenames().collect::<Vec<_>>(), ids);

        let ids: Vec<usize> = record.positions.iter().map(|p| p.id).collect();
        assert_eq!(ids, vec![1, 2, 3]);

        let middle = &record.positions[1];
        assert_eq!(middle.coordinates, Coordinates { x: 10.0, y: 0.0 });
        assert_eq!(
            middle.connections,
            vec![
                ExportConnection {
                    target_id: 1,
                    direction: Direction::Back
                },
                ExportConnection {
                    target_id: 3,
                    direction: Direction::Forward
                },
            ]
        );
        assert_eq!(record.positions[0].connections.len(), 1);
        assert_eq!(record.positions[2].connections.len(), 1);
    }

    #[test]
    fn test_json_shape() {
        let site = SiteInfo {
            building: Some("StanGrad".to_string()),
            floor: Some(2),
            wing: Some("MB Wing".to_string()),
        };
        let record = export(&["p1.jpg", "p2.jpg"], LayoutStrategy::Grid, &site);
        let json = record.to_json_pretty().unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();

        assert_eq!(value["building"], "StanGrad");
        assert_eq!(value["floor"], 2);
        assert_eq!(value["layout"], "grid");
        assert_eq!(value["total_images"], 2);
        assert_eq!(value["positions"][0]["connections"][0]["target_id"], 2);
        assert_eq!(
            value["positions"][0]["connections"][0]["direction"],
            "forward"
        );
        assert_eq!(value["positions"][1]["coordinates"]["x"], 10.0);
    }

    #[test]
    fn test_site_fields_omitted_when_absent() {
        let record = export(&[], LayoutStrategy::Auto, &SiteInfo::default());
        let value = serde_json::to_value(&record).unwrap();
        assert!(value.get("building").is_none());
        assert_eq!(value["total_images"], 0);
        assert_eq!(value["positions"].as_array().unwrap().len(), 0);
    }

    #[test]
    fn test_mismatched_sizes_rejected() {
        let path = place(2, LayoutStrategy::Linear, &LayoutConfig::default()).unwrap();
        let graph = ConnectivityGraph::from_path(&path);
        let result = LayoutExport::build(
            &["only-one.jpg"],
            &path,
            &graph,
            LayoutStrategy::Linear,
            &SiteInfo::default(),
        );
        assert!(result.is_err());
    }
}
