use std::num::NonZeroUsize;

use crate::{traits::VertexDecimator, types::Polygon};

/// Point decimation (keeps every nth vertex, starting with the first)
#[derive(Debug, Clone)]
pub struct StrideDecimator {
    pub stride: NonZeroUsize,
}

impl StrideDecimator {
    pub fn new(stride: NonZeroUsize) -> Self {
        Self { stride }
    }
}

impl Default for StrideDecimator {
    fn default() -> Self {
        Self {
            stride: NonZeroUsize::MIN.saturating_add(1),
        }
    }
}

impl VertexDecimator for StrideDecimator {
    fn decimate(&self, polygon: &Polygon) -> Polygon {
        Polygon::new(
            polygon
                .vertices
                .iter()
                .step_by(self.stride.get())
                .copied()
                .collect(),
        )
    }
}

/// Round every vertex of every polygon in place
pub fn round_polygons(polygons: &mut [Polygon]) {
    for polygon in polygons {
        polygon.round();
    }
}
