use std::{collections::HashMap, path::Path};

use geo_types::{Coord, LineString, Polygon as GeoPolygon};
use image::{GrayImage, ImageBuffer, Luma};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::{
    config::Configuration,
    error::{Mask2RoiError, Result, Warning},
};

/// Pixel value used for foreground pixels in a [`Mask`].
pub const FOREGROUND: u8 = 255;
/// Pixel value used for background pixels in a [`Mask`].
pub const BACKGROUND: u8 = 0;

/// A 2D boolean raster, foreground = `true`.
///
/// Backed by a `GrayImage` holding only [`FOREGROUND`] and [`BACKGROUND`]
/// so the `imageproc` primitives can run on it directly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mask {
    image: GrayImage,
}

impl Mask {
    /// Create an all-background mask
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            image: GrayImage::new(width, height),
        }
    }

    /// Build a mask from rows of booleans (`rows[y][x]`).
    pub fn from_rows<R: AsRef<[bool]>>(rows: &[R]) -> Result<Self> {
        let height = rows.len();
        let width = rows.first().map(|row| row.as_ref().len()).unwrap_or(0);
        if height == 0 || width == 0 {
            return Err(Mask2RoiError::EmptyMask);
        }

        let mut mask = Self::new(dimension(width)?, dimension(height)?);
        for (y, row) in rows.iter().enumerate() {
            let row = row.as_ref();
            if row.len() != width {
                return Err(Mask2RoiError::RaggedMask {
                    row: y,
                    expected: width,
                    actual: row.len(),
                });
            }
            for (x, &value) in row.iter().enumerate() {
                mask.set(x as u32, y as u32, value);
            }
        }
        Ok(mask)
    }

    /// Wrap a grayscale image that already holds binary data.
    ///
    /// Only the values 0, 1 and 255 are accepted; anything else is reported
    /// as [`Mask2RoiError::NonBinaryMask`] with the first offending pixel.
    pub fn from_gray_image(image: &GrayImage) -> Result<Self> {
        ensure_not_empty(image)?;
        if let Some((x, y, pixel)) = image
            .enumerate_pixels()
            .find(|(_, _, pixel)| !matches!(pixel[0], 0 | 1 | 255))
        {
            return Err(Mask2RoiError::NonBinaryMask { x, y, value: pixel[0] });
        }
        Self::from_gray_image_thresholded(image, 0)
    }

    /// Binarize a grayscale image: values strictly above `threshold` are foreground.
    pub fn from_gray_image_thresholded(image: &GrayImage, threshold: u8) -> Result<Self> {
        ensure_not_empty(image)?;
        let image = GrayImage::from_fn(image.width(), image.height(), |x, y| {
            if image.get_pixel(x, y)[0] > threshold {
                Luma([FOREGROUND])
            } else {
                Luma([BACKGROUND])
            }
        });
        Ok(Self { image })
    }

    /// Load a mask from an image file.
    ///
    /// Without a threshold the file must contain strictly binary data.
    pub fn open<P: AsRef<Path>>(path: P, threshold: Option<u8>) -> Result<Self> {
        let image = image::open(path)?.to_luma8();
        match threshold {
            Some(threshold) => Self::from_gray_image_thresholded(&image, threshold),
            None => Self::from_gray_image(&image),
        }
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    pub fn dimensions(&self) -> (u32, u32) {
        self.image.dimensions()
    }

    pub fn is_empty(&self) -> bool {
        self.width() == 0 || self.height() == 0
    }

    /// Foreground test. Panics when out of bounds, like `GrayImage::get_pixel`.
    pub fn get(&self, x: u32, y: u32) -> bool {
        self.image.get_pixel(x, y)[0] == FOREGROUND
    }

    /// Foreground test with signed coordinates; outside the raster is background.
    pub fn is_foreground_at(&self, x: i64, y: i64) -> bool {
        x >= 0
            && y >= 0
            && x < i64::from(self.width())
            && y < i64::from(self.height())
            && self.get(x as u32, y as u32)
    }

    pub fn set(&mut self, x: u32, y: u32, foreground: bool) {
        let value = if foreground { FOREGROUND } else { BACKGROUND };
        self.image.put_pixel(x, y, Luma([value]));
    }

    /// Foreground pixel coordinates `(x, y)` in row-major order.
    pub fn foreground_pixels(&self) -> impl Iterator<Item = (u32, u32)> + '_ {
        self.image
            .enumerate_pixels()
            .filter(|(_, _, pixel)| pixel[0] == FOREGROUND)
            .map(|(x, y, _)| (x, y))
    }

    pub fn foreground_count(&self) -> usize {
        self.foreground_pixels().count()
    }

    pub fn as_image(&self) -> &GrayImage {
        &self.image
    }

    pub fn into_image(self) -> GrayImage {
        self.image
    }

    /// Rows of booleans, the inverse of [`Mask::from_rows`].
    pub fn to_rows(&self) -> Vec<Vec<bool>> {
        (0..self.height())
            .map(|y| (0..self.width()).map(|x| self.get(x, y)).collect())
            .collect()
    }

    /// Construct from a `GrayImage` whose values are known to be 0/255.
    pub(crate) fn from_binary_image(image: GrayImage) -> Self {
        Self { image }
    }
}

fn ensure_not_empty(image: &GrayImage) -> Result<()> {
    if image.width() == 0 || image.height() == 0 {
        return Err(Mask2RoiError::EmptyMask);
    }
    Ok(())
}

fn dimension(len: usize) -> Result<u32> {
    u32::try_from(len).map_err(|_| {
        Mask2RoiError::ImageProcessing(format!("mask dimension {len} exceeds u32::MAX"))
    })
}

/// Per-pixel region ids: 0 is background, 1..=count are regions.
///
/// Labels are numbered in row-major order of each region's first pixel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabeledRaster {
    labels: ImageBuffer<Luma<u32>, Vec<u32>>,
    count: u32,
}

impl LabeledRaster {
    /// Renumber an arbitrary labelling so ids follow row-major first occurrence.
    pub fn from_components(raw: ImageBuffer<Luma<u32>, Vec<u32>>) -> Self {
        let mut remap: HashMap<u32, u32> = HashMap::new();
        let mut count = 0u32;
        let labels = ImageBuffer::from_fn(raw.width(), raw.height(), |x, y| {
            let raw_label = raw.get_pixel(x, y)[0];
            if raw_label == 0 {
                return Luma([0]);
            }
            let label = *remap.entry(raw_label).or_insert_with(|| {
                count += 1;
                count
            });
            Luma([label])
        });
        Self { labels, count }
    }

    /// Number of regions (K).
    pub fn count(&self) -> u32 {
        self.count
    }

    pub fn width(&self) -> u32 {
        self.labels.width()
    }

    pub fn height(&self) -> u32 {
        self.labels.height()
    }

    pub fn label_at(&self, x: u32, y: u32) -> u32 {
        self.labels.get_pixel(x, y)[0]
    }

    /// Pixel area of every region, indexed by `label - 1`.
    pub fn region_areas(&self) -> Vec<usize> {
        let mut areas = vec![0usize; self.count as usize];
        for pixel in self.labels.pixels() {
            if pixel[0] > 0 {
                areas[(pixel[0] - 1) as usize] += 1;
            }
        }
        areas
    }

    /// Boolean mask of one region. A label with no pixels yields an empty mask.
    pub fn region_mask(&self, label: u32) -> Mask {
        let image = GrayImage::from_fn(self.width(), self.height(), |x, y| {
            if label != 0 && self.label_at(x, y) == label {
                Luma([FOREGROUND])
            } else {
                Luma([BACKGROUND])
            }
        });
        Mask::from_binary_image(image)
    }

    pub fn as_image(&self) -> &ImageBuffer<Luma<u32>, Vec<u32>> {
        &self.labels
    }
}

/// Unordered boundary pixels `[x, y]` of one region.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BoundaryPointSet {
    points: Vec<[u32; 2]>,
}

impl BoundaryPointSet {
    /// Collect the foreground pixels of an edge mask in row-major order.
    pub fn from_mask(edge_mask: &Mask) -> Self {
        Self {
            points: edge_mask.foreground_pixels().map(|(x, y)| [x, y]).collect(),
        }
    }

    /// Build from explicit points, dropping repeats while keeping the first occurrence.
    pub fn from_points<I: IntoIterator<Item = [u32; 2]>>(points: I) -> Self {
        let mut seen = std::collections::HashSet::new();
        Self {
            points: points.into_iter().filter(|point| seen.insert(*point)).collect(),
        }
    }

    pub fn points(&self) -> &[[u32; 2]] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

/// An ordered outline, one `[x, y]` vertex per row (x = column, y = row).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(transparent)]
pub struct Polygon {
    pub vertices: Vec<[f32; 2]>,
}

impl Polygon {
    pub fn new(vertices: Vec<[f32; 2]>) -> Self {
        Self { vertices }
    }

    /// The placeholder emitted for a requested region that does not exist.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.vertices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    /// The N×2 view: column 0 is x, column 1 is y.
    pub fn rows(&self) -> &[[f32; 2]] {
        &self.vertices
    }

    /// Round every coordinate to the nearest integer (halves away from zero).
    pub fn round(&mut self) {
        for vertex in &mut self.vertices {
            vertex[0] = vertex[0].round();
            vertex[1] = vertex[1].round();
        }
    }

    pub fn rounded(&self) -> Self {
        let mut polygon = self.clone();
        polygon.round();
        polygon
    }

    /// Convert to a geo-types Polygon (the ring is closed automatically)
    pub fn to_geo_polygon(&self) -> GeoPolygon<f32> {
        let coords: Vec<Coord<f32>> = self
            .vertices
            .iter()
            .map(|&[x, y]| Coord { x, y })
            .collect();
        GeoPolygon::new(LineString::new(coords), vec![])
    }

    /// Enclosed area of the closed outline
    pub fn area(&self) -> f32 {
        use geo::Area;
        if self.vertices.len() < 3 {
            return 0.0;
        }
        self.to_geo_polygon().unsigned_area()
    }

    pub fn centroid(&self) -> Option<[f32; 2]> {
        use geo::Centroid;
        if self.is_empty() {
            return None;
        }
        if let Some(centroid) = self.to_geo_polygon().centroid() {
            return Some([centroid.x(), centroid.y()]);
        }
        // Degenerate outline: fall back to the bounding box center
        self.bounding_box()
            .map(|(min, max)| [(min[0] + max[0]) / 2.0, (min[1] + max[1]) / 2.0])
    }

    pub fn bounding_box(&self) -> Option<([f32; 2], [f32; 2])> {
        let first = *self.vertices.first()?;
        Some(self.vertices.iter().fold((first, first), |(min, max), &[x, y]| {
            ([min[0].min(x), min[1].min(y)], [max[0].max(x), max[1].max(y)])
        }))
    }

    /// Length of the closed outline, including the closing edge
    pub fn perimeter(&self) -> f32 {
        if self.vertices.len() < 2 {
            return 0.0;
        }
        let closing = [self.vertices[self.vertices.len() - 1], self.vertices[0]];
        self.vertices
            .windows(2)
            .chain(std::iter::once(&closing[..]))
            .map(|pair| {
                let dx = pair[1][0] - pair[0][0];
                let dy = pair[1][1] - pair[0][1];
                (dx * dx + dy * dy).sqrt()
            })
            .sum()
    }
}

/// Whether the pipeline should return the per-region boundary masks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BoundaryOutput {
    #[default]
    Discard,
    Keep,
}

/// Result of one invocation: one polygon per processed region, in label order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoiSet {
    pub polygons: Vec<Polygon>,
    /// Boundary mask per polygon, only present when requested
    #[serde(skip)]
    pub boundary_masks: Option<Vec<Mask>>,
    pub warnings: Vec<Warning>,
    /// Number of regions discovered by labelling (K)
    pub regions_found: usize,
    pub configuration: Configuration,
    pub image_width: u32,
    pub image_height: u32,
}

impl RoiSet {
    pub fn len(&self) -> usize {
        self.polygons.len()
    }

    pub fn is_empty(&self) -> bool {
        self.polygons.is_empty()
    }

    /// Number of empty polygons standing in for requested regions that do not exist.
    pub fn placeholder_count(&self) -> usize {
        self.polygons.iter().filter(|polygon| polygon.is_empty()).count()
    }

    /// Total vertex count across all polygons
    pub fn vertex_count(&self) -> usize {
        self.polygons.iter().map(Polygon::len).sum()
    }

    /// Serialize polygons, warnings and configuration as pretty JSON
    pub fn to_json_string(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
