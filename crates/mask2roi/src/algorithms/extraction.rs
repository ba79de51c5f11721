use crate::{
    config::Connectivity,
    error::Result,
    traits::BoundaryExtractor,
    types::{BoundaryPointSet, Mask},
};

/// Marks foreground pixels with at least one background neighbour.
///
/// Neighbours follow the given connectivity; pixels outside the raster count as background,
/// so a region touching the image edge is closed along that edge.
#[derive(Debug, Clone, Default)]
pub struct NeighbourBoundaryExtractor;

impl BoundaryExtractor for NeighbourBoundaryExtractor {
    fn boundary_mask(&self, region: &Mask, connectivity: Connectivity) -> Result<Mask> {
        let (width, height) = region.dimensions();
        let mut edges = Mask::new(width, height);

        for (x, y) in region.foreground_pixels() {
            let touches_background = connectivity.offsets().iter().any(|&(dx, dy)| {
                !region.is_foreground_at(i64::from(x) + dx, i64::from(y) + dy)
            });
            if touches_background {
                edges.set(x, y, true);
            }
        }

        Ok(edges)
    }
}

/// Boundary points of one region, in the order the tour builder will see them
pub fn boundary_points(
    extractor: &dyn BoundaryExtractor,
    region: &Mask,
    connectivity: Connectivity,
) -> Result<(Mask, BoundaryPointSet)> {
    let edges = extractor.boundary_mask(region, connectivity)?;
    let points = BoundaryPointSet::from_mask(&edges);
    Ok((edges, points))
}
