//! Floor Plan - Arrange an ordered photo sequence into a navigable 2-D layout
//!
//! Every item gets one coordinate, and consecutive items are linked by forward/back
//! edges so a viewer can walk the capture sequence.
//!
//! **Strategies:** `linear`, `grid`, `serpentine` and `auto` (serpentine for now).
//! Coordinates are abstract units scaled by [`LayoutConfig::spacing`].

pub mod export;
pub mod graph;
pub mod layout;

pub use export::{Coordinates, ExportConnection, ExportPosition, LayoutExport, SiteInfo};
pub use graph::{ConnectivityGraph, Direction, Edge};
pub use layout::{place, Bounds, LayoutConfig, LayoutPath, LayoutPoint, LayoutStrategy};

use tracing::info;
use vmap_common::Result;

/// Place an ordered list of identifiers and derive its connectivity graph
///
/// # Errors
/// Returns [`vmap_common::ProcessingError::Configuration`] if `config` is invalid
pub fn compute_layout<S: AsRef<str>>(
    ids: &[S],
    strategy: LayoutStrategy,
    config: &LayoutConfig,
) -> Result<(LayoutPath, ConnectivityGraph)> {
    let path = place(ids.len(), strategy, config)?;
    let graph = ConnectivityGraph::from_path(&path);
    info!(
        "Laid out {} positions ({strategy}) with {} connections",
        path.len(),
        graph.edges().len()
    );
    Ok((path, graph))
}

/// Place, link and export in one step
///
/// # Errors
/// Returns [`vmap_common::ProcessingError::Configuration`] if `config` is invalid
pub fn export_layout<S: AsRef<str>>(
    ids: &[S],
    strategy: LayoutStrategy,
    config: &LayoutConfig,
    site: &SiteInfo,
) -> Result<LayoutExport> {
    let (path, graph) = compute_layout(ids, strategy, config)?;
    LayoutExport::build(ids, &path, &graph, strategy, site)
}
