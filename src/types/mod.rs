//! # 领域类型

pub mod geometry;
pub mod schemas;

pub use geometry::{GeoLineString, GeoPoint, Geometry, SRID_WGS84};
pub use schemas::{
    CreateDrillHoleRequest, CreateMineRequest, DrillHoleProperties, DrillHoleSchema, Feature,
    FeatureCollection, MineProperties, MineSchema,
};
