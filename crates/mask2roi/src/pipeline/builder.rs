use crate::{
    algorithms::{
        BorderFloodHoleFiller, ImageprocRegionLabeler, MinAreaObjectFilter,
        NearestNeighbourTour, NeighbourBoundaryExtractor, StrideDecimator,
    },
    config::Configuration,
    pipeline::RegionPipeline,
    traits::{BoundaryExtractor, HoleFiller, ObjectFilter, RegionLabeler, TourBuilder, VertexDecimator},
};

/// Builder for creating region pipelines with a fluent API
pub struct RegionPipelineBuilder {
    configuration: Configuration,
    hole_filler: Option<Box<dyn HoleFiller>>,
    object_filter: Option<Box<dyn ObjectFilter>>,
    labeler: Option<Box<dyn RegionLabeler>>,
    boundary_extractor: Option<Box<dyn BoundaryExtractor>>,
    tour_builder: Option<Box<dyn TourBuilder>>,
    decimator: Option<Box<dyn VertexDecimator>>,
}

impl RegionPipelineBuilder {
    /// Create a new pipeline builder with the default configuration
    pub fn new() -> Self {
        Self {
            configuration: Configuration::default(),
            hole_filler: None,
            object_filter: None,
            labeler: None,
            boundary_extractor: None,
            tour_builder: None,
            decimator: None,
        }
    }

    /// Use a resolved configuration
    pub fn configuration(mut self, configuration: Configuration) -> Self {
        self.configuration = configuration;
        self
    }

    /// Set the hole filler (replaces any existing one)
    pub fn set_hole_filler<H>(mut self, hole_filler: H) -> Self
    where
        H: HoleFiller + 'static,
    {
        self.hole_filler = Some(Box::new(hole_filler));
        self
    }

    /// Set the small-object filter (replaces any existing one)
    pub fn set_object_filter<F>(mut self, object_filter: F) -> Self
    where
        F: ObjectFilter + 'static,
    {
        self.object_filter = Some(Box::new(object_filter));
        self
    }

    /// Set the region labeller (replaces any existing one)
    pub fn set_labeler<L>(mut self, labeler: L) -> Self
    where
        L: RegionLabeler + 'static,
    {
        self.labeler = Some(Box::new(labeler));
        self
    }

    /// Set the boundary extractor (replaces any existing one)
    pub fn set_boundary_extractor<E>(mut self, extractor: E) -> Self
    where
        E: BoundaryExtractor + 'static,
    {
        self.boundary_extractor = Some(Box::new(extractor));
        self
    }

    /// Set the tour builder (replaces any existing one)
    pub fn set_tour_builder<T>(mut self, tour_builder: T) -> Self
    where
        T: TourBuilder + 'static,
    {
        self.tour_builder = Some(Box::new(tour_builder));
        self
    }

    /// Set the vertex decimator; by default the configured stride is used
    pub fn set_decimator<D>(mut self, decimator: D) -> Self
    where
        D: VertexDecimator + 'static,
    {
        self.decimator = Some(Box::new(decimator));
        self
    }

    /// Build the pipeline with default components if not specified
    pub fn build(self) -> RegionPipeline {
        let stride = self.configuration.decimation_stride;

        RegionPipeline::new(
            self.configuration,
            self.hole_filler
                .unwrap_or_else(|| Box::new(BorderFloodHoleFiller::default())),
            self.object_filter
                .unwrap_or_else(|| Box::new(MinAreaObjectFilter)),
            self.labeler
                .unwrap_or_else(|| Box::new(ImageprocRegionLabeler)),
            self.boundary_extractor
                .unwrap_or_else(|| Box::new(NeighbourBoundaryExtractor)),
            self.tour_builder
                .unwrap_or_else(|| Box::new(NearestNeighbourTour)),
            self.decimator
                .unwrap_or_else(|| Box::new(StrideDecimator::new(stride))),
        )
    }
}

impl Default for RegionPipelineBuilder {
    fn default() -> Self {
        Self::new()
    }
}
