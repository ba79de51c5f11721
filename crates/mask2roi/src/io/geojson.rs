use geojson::{Feature, FeatureCollection, Geometry, Value};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::{
    config::Configuration,
    error::{Mask2RoiError, Result},
    types::{Polygon, RoiSet},
};

/// Properties attached to every ROI feature
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, JsonSchema)]
#[schemars(description = "Properties for ROI polygon features")]
pub struct RoiProperties {
    #[schemars(description = "Zero-based position of the ROI in the output")]
    pub id: usize,
    #[schemars(description = "Region label the ROI was traced from")]
    pub label: usize,
    #[schemars(description = "Number of polygon vertices")]
    pub vertex_count: usize,
    #[schemars(description = "Enclosed area in square pixels")]
    pub area: f64,
    #[schemars(description = "Closed outline length in pixels")]
    pub perimeter: f64,
    #[schemars(description = "Centroid [x, y], absent for empty ROIs")]
    pub centroid: Option<[f64; 2]>,
}

impl RoiProperties {
    fn for_polygon(index: usize, polygon: &Polygon) -> Self {
        Self {
            id: index,
            label: index + 1,
            vertex_count: polygon.len(),
            area: f64::from(polygon.area()),
            perimeter: f64::from(polygon.perimeter()),
            centroid: polygon
                .centroid()
                .map(|[x, y]| [f64::from(x), f64::from(y)]),
        }
    }
}

fn position([x, y]: [f32; 2]) -> Vec<f64> {
    vec![f64::from(x), f64::from(y)]
}

/// GeoJSON geometry for one ROI.
///
/// Outlines with fewer than three vertices cannot form a valid ring, so they
/// are written as a `Point` or `LineString`; empty ROIs have no geometry.
fn roi_geometry(polygon: &Polygon) -> Option<Geometry> {
    let positions: Vec<Vec<f64>> = polygon.rows().iter().copied().map(position).collect();
    let value = match positions.len() {
        0 => return None,
        1 => Value::Point(positions[0].clone()),
        2 => Value::LineString(positions),
        _ => {
            let mut ring = positions;
            ring.push(ring[0].clone());
            Value::Polygon(vec![ring])
        }
    };
    Some(Geometry::new(value))
}

fn to_vertices(positions: &[Vec<f64>]) -> Vec<[f32; 2]> {
    positions
        .iter()
        .filter(|position| position.len() >= 2)
        .map(|position| [position[0] as f32, position[1] as f32])
        .collect()
}

impl RoiSet {
    /// Export to a GeoJSON FeatureCollection, one feature per ROI.
    ///
    /// Empty placeholder ROIs keep their slot as a feature without geometry.
    /// Outlines too short for a ring become points or line strings.
    pub fn to_geojson(&self) -> Result<FeatureCollection> {
        let mut features = Vec::with_capacity(self.polygons.len());

        for (i, polygon) in self.polygons.iter().enumerate() {
            let geometry = roi_geometry(polygon);

            let properties = match serde_json::to_value(RoiProperties::for_polygon(i, polygon))? {
                serde_json::Value::Object(map) => map,
                _ => serde_json::Map::new(),
            };

            features.push(Feature {
                bbox: None,
                geometry,
                id: Some(geojson::feature::Id::Number(serde_json::Number::from(i))),
                properties: Some(properties),
                foreign_members: None,
            });
        }

        // Add metadata to foreign members of the FeatureCollection
        let mut foreign_members = serde_json::Map::new();
        foreign_members.insert("image_width".to_string(), serde_json::Value::from(self.image_width));
        foreign_members.insert("image_height".to_string(), serde_json::Value::from(self.image_height));
        foreign_members.insert("regions_found".to_string(), serde_json::Value::from(self.regions_found));
        foreign_members.insert("roi_count".to_string(), serde_json::Value::from(self.polygons.len()));
        foreign_members.insert("configuration".to_string(), serde_json::to_value(&self.configuration)?);

        Ok(FeatureCollection {
            bbox: None,
            features,
            foreign_members: Some(foreign_members),
        })
    }

    /// Export to GeoJSON and serialize to JSON string
    pub fn to_geojson_string(&self) -> Result<String> {
        let geojson = self.to_geojson()?;
        Ok(serde_json::to_string_pretty(&geojson)?)
    }

    /// Save GeoJSON to file
    pub fn save_geojson(&self, path: &str) -> Result<()> {
        let geojson_string = self.to_geojson_string()?;
        std::fs::write(path, geojson_string)?;
        Ok(())
    }

    /// Load an RoiSet from a GeoJSON string written by [`RoiSet::to_geojson_string`].
    ///
    /// Warnings and boundary masks are not part of the GeoJSON and come back empty.
    pub fn from_geojson_string(geojson_str: &str) -> Result<Self> {
        let geojson: FeatureCollection = geojson_str.parse()?;

        let foreign_members = geojson.foreign_members.as_ref().ok_or_else(|| {
            Mask2RoiError::ImageProcessing("Missing metadata in GeoJSON".to_string())
        })?;
        let metadata = |key: &str| {
            foreign_members
                .get(key)
                .and_then(|v| v.as_u64())
                .ok_or_else(|| {
                    Mask2RoiError::ImageProcessing(format!("Missing or invalid {key}"))
                })
        };
        let dimension = |key: &str| {
            u32::try_from(metadata(key)?).map_err(|_| {
                Mask2RoiError::ImageProcessing(format!("{key} does not fit in u32"))
            })
        };
        let image_width = dimension("image_width")?;
        let image_height = dimension("image_height")?;
        let regions_found = usize::try_from(metadata("regions_found")?).map_err(|_| {
            Mask2RoiError::ImageProcessing("regions_found does not fit in usize".to_string())
        })?;
        let configuration: Configuration = match foreign_members.get("configuration") {
            Some(value) => serde_json::from_value(value.clone())?,
            None => Configuration::default(),
        };

        let polygons = geojson
            .features
            .into_iter()
            .map(|feature| match feature.geometry.map(|geometry| geometry.value) {
                Some(Value::Polygon(rings)) => {
                    let mut vertices = rings.first().map(|ring| to_vertices(ring)).unwrap_or_default();
                    // Drop the closing position added on export
                    if vertices.len() > 1 && vertices.first() == vertices.last() {
                        vertices.pop();
                    }
                    Polygon::new(vertices)
                }
                Some(Value::LineString(line)) => Polygon::new(to_vertices(&line)),
                Some(Value::Point(point)) => Polygon::new(to_vertices(&[point])),
                _ => Polygon::empty(),
            })
            .collect();

        Ok(RoiSet {
            polygons,
            boundary_masks: None,
            warnings: Vec::new(),
            regions_found,
            configuration,
            image_width,
            image_height,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn roi_set() -> RoiSet {
        RoiSet {
            polygons: vec![
                Polygon::new(vec![[1.0, 1.0], [3.0, 1.0], [3.0, 3.0], [1.0, 3.0]]),
                Polygon::empty(),
            ],
            boundary_masks: None,
            warnings: Vec::new(),
            regions_found: 1,
            configuration: Configuration::default(),
            image_width: 8,
            image_height: 6,
        }
    }

    #[test]
    fn test_geojson_export() {
        let geojson = roi_set().to_geojson().expect("Should create GeoJSON");
        assert_eq!(geojson.features.len(), 2);

        let first = &geojson.features[0];
        match &first.geometry.as_ref().expect("Should have geometry").value {
            Value::Polygon(rings) => {
                assert_eq!(rings[0].len(), 5, "ring is closed");
                assert_eq!(rings[0][0], rings[0][4]);
            }
            other => panic!("unexpected geometry: {other:?}"),
        }
        let properties = first.properties.as_ref().expect("Should have properties");
        assert_eq!(properties["label"], 1);
        assert_eq!(properties["vertex_count"], 4);
        assert_eq!(properties["area"], 4.0);

        assert!(geojson.features[1].geometry.is_none());
        let members = geojson.foreign_members.as_ref().expect("Should have metadata");
        assert_eq!(members["roi_count"], 2);
        assert_eq!(members["regions_found"], 1);
    }

    #[test]
    fn test_geojson_string_reload() {
        let original = roi_set();
        let text = original.to_geojson_string().expect("Should serialize");
        let reloaded = RoiSet::from_geojson_string(&text).expect("Should parse");

        assert_eq!(reloaded.polygons, original.polygons);
        assert_eq!(reloaded.regions_found, 1);
        assert_eq!(reloaded.configuration, original.configuration);
        assert_eq!((reloaded.image_width, reloaded.image_height), (8, 6));
    }

    #[test]
    fn test_short_outlines_are_not_written_as_rings() {
        let rois = RoiSet {
            polygons: vec![
                Polygon::new(vec![[2.0, 2.0], [3.0, 3.0]]),
                Polygon::new(vec![[5.0, 1.0]]),
            ],
            ..roi_set()
        };
        let geojson = rois.to_geojson().expect("Should create GeoJSON");

        let values: Vec<&Value> = geojson
            .features
            .iter()
            .map(|feature| &feature.geometry.as_ref().expect("Should have geometry").value)
            .collect();
        assert_eq!(values[0], &Value::LineString(vec![vec![2.0, 2.0], vec![3.0, 3.0]]));
        assert_eq!(values[1], &Value::Point(vec![5.0, 1.0]));

        let reloaded = RoiSet::from_geojson_string(&rois.to_geojson_string().expect("Should serialize"))
            .expect("Should parse");
        assert_eq!(reloaded.polygons, rois.polygons);
    }

    #[test]
    fn test_three_pixel_region_exports_valid_geometry() {
        let mask = crate::Mask::from_rows(&[
            vec![false, false, false, false],
            vec![false, true, false, false],
            vec![false, true, true, false],
            vec![false, false, false, false],
        ])
        .expect("Should build mask");
        let rois = crate::mask2roi::<&str>(&mask, &[]).expect("Should process successfully");
        assert_eq!(rois.polygons[0].len(), 2);

        let geojson = rois.to_geojson().expect("Should create GeoJSON");
        match &geojson.features[0].geometry.as_ref().expect("Should have geometry").value {
            Value::Polygon(rings) => panic!("ring with {} positions", rings[0].len()),
            Value::LineString(line) => assert_eq!(line.len(), 2),
            other => panic!("unexpected geometry: {other:?}"),
        }
    }

    #[test]
    fn test_oversized_dimensions_are_rejected() {
        let mut geojson = roi_set().to_geojson().expect("Should create GeoJSON");
        geojson
            .foreign_members
            .as_mut()
            .expect("Should have metadata")
            .insert("image_width".to_string(), serde_json::Value::from(u64::from(u32::MAX) + 1));
        let text = serde_json::to_string(&geojson).expect("Should serialize");

        let err = RoiSet::from_geojson_string(&text).expect_err("Width must fit in u32");
        assert!(err.to_string().contains("image_width"));
    }
}
