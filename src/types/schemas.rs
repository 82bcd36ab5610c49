//! # 接口数据结构
//!
//! 请求体、响应体以及列表接口使用的 GeoJSON `Feature` / `FeatureCollection`

use entity::{drill_holes, mines};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::geometry::{GeoLineString, GeoPoint, Geometry};
use crate::error::Result;

pub const MAX_NAME_LEN: usize = 120;
pub const MAX_TYPE_LEN: usize = 60;

fn validate_text(value: &str, field: &str, max_len: usize) -> Result<()> {
    crate::ensure_valid!(!value.trim().is_empty(), field, "{} 不能为空", field);
    crate::ensure_valid!(
        value.chars().count() <= max_len,
        field,
        "{} 长度不能超过 {} 个字符",
        field,
        max_len
    );
    Ok(())
}

/// 矿山
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MineSchema {
    pub id: Uuid,
    pub name: String,
    #[serde(rename = "type")]
    pub mine_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub elevation: Option<f64>,
    pub location: GeoPoint,
}

impl TryFrom<mines::Model> for MineSchema {
    type Error = crate::error::GeoAiError;

    fn try_from(model: mines::Model) -> Result<Self> {
        Ok(Self {
            location: GeoPoint::from_ewkb_hex(&model.location)?,
            id: model.id,
            name: model.name,
            mine_type: model.mine_type,
            elevation: model.elevation,
        })
    }
}

/// 创建矿山请求
#[derive(Debug, Clone, Deserialize)]
pub struct CreateMineRequest {
    pub name: String,
    #[serde(rename = "type")]
    pub mine_type: String,
    #[serde(default)]
    pub elevation: Option<f64>,
    pub location: GeoPoint,
}

impl CreateMineRequest {
    pub fn validate(&self) -> Result<()> {
        validate_text(&self.name, "name", MAX_NAME_LEN)?;
        validate_text(&self.mine_type, "type", MAX_TYPE_LEN)?;
        if let Some(elevation) = self.elevation {
            crate::ensure_valid!(elevation.is_finite(), "elevation", "海拔必须是有限数值");
        }
        self.location.validate("location")
    }
}

/// 钻孔
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DrillHoleSchema {
    pub id: Uuid,
    pub mine_id: Uuid,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub depth: Option<f64>,
    pub collar_location: GeoPoint,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<GeoLineString>,
}

impl TryFrom<drill_holes::Model> for DrillHoleSchema {
    type Error = crate::error::GeoAiError;

    fn try_from(model: drill_holes::Model) -> Result<Self> {
        Ok(Self {
            collar_location: GeoPoint::from_ewkb_hex(&model.collar_location)?,
            path: model
                .path
                .as_deref()
                .map(GeoLineString::from_ewkb_hex)
                .transpose()?,
            id: model.id,
            mine_id: model.mine_id,
            name: model.name,
            depth: model.depth,
        })
    }
}

/// 创建钻孔请求
#[derive(Debug, Clone, Deserialize)]
pub struct CreateDrillHoleRequest {
    pub name: String,
    #[serde(default)]
    pub depth: Option<f64>,
    pub collar_location: GeoPoint,
    #[serde(default)]
    pub path: Option<GeoLineString>,
}

impl CreateDrillHoleRequest {
    pub fn validate(&self) -> Result<()> {
        validate_text(&self.name, "name", MAX_NAME_LEN)?;
        if let Some(depth) = self.depth {
            crate::ensure_valid!(
                depth.is_finite() && depth >= 0.0,
                "depth",
                "深度必须为非负数: {}",
                depth
            );
        }
        self.collar_location.validate("collar_location")?;
        if let Some(path) = &self.path {
            path.validate("path")?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FeatureKind {
    Feature,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FeatureCollectionKind {
    FeatureCollection,
}

/// GeoJSON Feature
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Feature<P> {
    #[serde(rename = "type")]
    pub kind: FeatureKind,
    pub geometry: Geometry,
    pub properties: P,
}

/// GeoJSON FeatureCollection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureCollection<P> {
    #[serde(rename = "type")]
    pub kind: FeatureCollectionKind,
    pub features: Vec<Feature<P>>,
}

impl<P> FromIterator<Feature<P>> for FeatureCollection<P> {
    fn from_iter<I: IntoIterator<Item = Feature<P>>>(iter: I) -> Self {
        Self {
            kind: FeatureCollectionKind::FeatureCollection,
            features: iter.into_iter().collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MineProperties {
    pub id: Uuid,
    pub name: String,
    #[serde(rename = "type")]
    pub mine_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub elevation: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DrillHoleProperties {
    pub id: Uuid,
    pub mine_id: Uuid,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub depth: Option<f64>,
}

impl From<MineSchema> for Feature<MineProperties> {
    fn from(mine: MineSchema) -> Self {
        Self {
            kind: FeatureKind::Feature,
            geometry: Geometry::Point(mine.location),
            properties: MineProperties {
                id: mine.id,
                name: mine.name,
                mine_type: mine.mine_type,
                elevation: mine.elevation,
            },
        }
    }
}

/// 有轨迹时用轨迹，否则用孔口位置
impl From<DrillHoleSchema> for Feature<DrillHoleProperties> {
    fn from(hole: DrillHoleSchema) -> Self {
        let geometry = hole
            .path
            .map_or(Geometry::Point(hole.collar_location), Geometry::LineString);
        Self {
            kind: FeatureKind::Feature,
            geometry,
            properties: DrillHoleProperties {
                id: hole.id,
                mine_id: hole.mine_id,
                name: hole.name,
                depth: hole.depth,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn mine_request(name: &str, mine_type: &str) -> CreateMineRequest {
        CreateMineRequest {
            name: name.to_string(),
            mine_type: mine_type.to_string(),
            elevation: Some(1200.0),
            location: GeoPoint::new(116.4, 39.9),
        }
    }

    #[test]
    fn test_mine_request_validation() {
        assert!(mine_request("Bayan Obo", "open-pit").validate().is_ok());
        assert!(mine_request("   ", "open-pit").validate().is_err());
        assert!(mine_request("Bayan Obo", "").validate().is_err());
        assert!(mine_request(&"x".repeat(121), "open-pit").validate().is_err());
        assert!(mine_request(&"矿".repeat(120), "open-pit").validate().is_ok());
        assert!(mine_request("Bayan Obo", &"t".repeat(61)).validate().is_err());
    }

    #[test]
    fn test_drill_hole_request_rejects_negative_depth() {
        let request: CreateDrillHoleRequest = serde_json::from_value(json!({
            "name": "DH-001",
            "depth": -5.0,
            "collar_location": {"type": "Point", "coordinates": [116.4, 39.9]}
        }))
        .unwrap();
        let err = request.validate().unwrap_err();
        assert_eq!(err.to_http_response_parts().0.as_u16(), 422);
    }

    #[test]
    fn test_drill_hole_feature_prefers_path() {
        let hole = DrillHoleSchema {
            id: Uuid::nil(),
            mine_id: Uuid::nil(),
            name: "DH-001".to_string(),
            depth: None,
            collar_location: GeoPoint::new(1.0, 2.0),
            path: Some(GeoLineString::new(vec![[1.0, 2.0], [1.0, 2.1]])),
        };
        let feature = Feature::from(hole.clone());
        assert!(matches!(feature.geometry, Geometry::LineString(_)));

        let feature = Feature::from(DrillHoleSchema { path: None, ..hole });
        assert_eq!(feature.geometry, Geometry::Point(GeoPoint::new(1.0, 2.0)));
    }

    #[test]
    fn test_feature_collection_json_shape() {
        let mine = MineSchema {
            id: Uuid::nil(),
            name: "Bayan Obo".to_string(),
            mine_type: "open-pit".to_string(),
            elevation: None,
            location: GeoPoint::new(109.97, 41.78),
        };
        let collection: FeatureCollection<MineProperties> =
            std::iter::once(Feature::from(mine)).collect();

        assert_eq!(
            serde_json::to_value(&collection).unwrap(),
            json!({
                "type": "FeatureCollection",
                "features": [{
                    "type": "Feature",
                    "geometry": {"type": "Point", "coordinates": [109.97, 41.78]},
                    "properties": {
                        "id": "00000000-0000-0000-0000-000000000000",
                        "name": "Bayan Obo",
                        "type": "open-pit"
                    }
                }]
            })
        );
    }
}
