//! # GeoJSON 几何类型
//!
//! 写库时转为 EWKT（`SRID=4326;POINT(lon lat)`），读库时把列转为 `text`，
//! PostGIS 返回十六进制 EWKB，由本模块解码。

use serde::{Deserialize, Serialize};
use std::fmt::Write as _;

use crate::error::{GeoAiError, Result};

/// WGS 84
pub const SRID_WGS84: i32 = 4326;

const WKB_POINT: u32 = 1;
const WKB_LINESTRING: u32 = 2;
const EWKB_SRID_FLAG: u32 = 0x2000_0000;
const EWKB_M_FLAG: u32 = 0x4000_0000;
const EWKB_Z_FLAG: u32 = 0x8000_0000;

/// `[经度, 纬度]`
pub type Position = [f64; 2];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PointKind {
    Point,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LineStringKind {
    LineString,
}

/// GeoJSON Point
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    #[serde(rename = "type")]
    pub kind: PointKind,
    pub coordinates: Position,
}

/// GeoJSON LineString
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeoLineString {
    #[serde(rename = "type")]
    pub kind: LineStringKind,
    pub coordinates: Vec<Position>,
}

/// Feature 中使用的几何
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Geometry {
    Point(GeoPoint),
    LineString(GeoLineString),
}

fn validate_position(position: Position, field: &str) -> Result<()> {
    let [lon, lat] = position;
    crate::ensure_valid!(
        (-180.0..=180.0).contains(&lon),
        field,
        "经度超出范围 [-180, 180]: {}",
        lon
    );
    crate::ensure_valid!(
        (-90.0..=90.0).contains(&lat),
        field,
        "纬度超出范围 [-90, 90]: {}",
        lat
    );
    Ok(())
}

impl GeoPoint {
    pub const fn new(lon: f64, lat: f64) -> Self {
        Self {
            kind: PointKind::Point,
            coordinates: [lon, lat],
        }
    }

    pub const fn lon(&self) -> f64 {
        self.coordinates[0]
    }

    pub const fn lat(&self) -> f64 {
        self.coordinates[1]
    }

    /// 检查经纬度范围，`field` 用于错误信息
    pub fn validate(&self, field: &str) -> Result<()> {
        validate_position(self.coordinates, field)
    }

    pub fn to_ewkt(&self) -> String {
        format!("SRID={SRID_WGS84};POINT({} {})", self.lon(), self.lat())
    }

    pub fn from_ewkb_hex(value: &str) -> Result<Self> {
        match decode_ewkb_hex(value)? {
            Geometry::Point(point) => Ok(point),
            Geometry::LineString(_) => Err(GeoAiError::internal("期望 Point 几何，实际为 LineString")),
        }
    }
}

impl GeoLineString {
    pub const fn new(coordinates: Vec<Position>) -> Self {
        Self {
            kind: LineStringKind::LineString,
            coordinates,
        }
    }

    /// 至少两个点，且每个点在经纬度范围内
    pub fn validate(&self, field: &str) -> Result<()> {
        crate::ensure_valid!(
            self.coordinates.len() >= 2,
            field,
            "LineString 至少需要 2 个点，实际 {} 个",
            self.coordinates.len()
        );
        for position in &self.coordinates {
            validate_position(*position, field)?;
        }
        Ok(())
    }

    pub fn to_ewkt(&self) -> String {
        let mut ewkt = format!("SRID={SRID_WGS84};LINESTRING(");
        for (i, [lon, lat]) in self.coordinates.iter().enumerate() {
            if i > 0 {
                ewkt.push_str(", ");
            }
            let _ = write!(ewkt, "{lon} {lat}");
        }
        ewkt.push(')');
        ewkt
    }

    pub fn from_ewkb_hex(value: &str) -> Result<Self> {
        match decode_ewkb_hex(value)? {
            Geometry::LineString(line) => Ok(line),
            Geometry::Point(_) => Err(GeoAiError::internal("期望 LineString 几何，实际为 Point")),
        }
    }
}

/// 顺序读取 WKB 字节
struct WkbReader<'a> {
    bytes: &'a [u8],
    pos: usize,
    little_endian: bool,
}

impl<'a> WkbReader<'a> {
    const fn new(bytes: &'a [u8]) -> Self {
        Self {
            bytes,
            pos: 0,
            little_endian: true,
        }
    }

    fn take<const N: usize>(&mut self) -> Result<[u8; N]> {
        let end = self.pos + N;
        let slice = self
            .bytes
            .get(self.pos..end)
            .ok_or_else(|| GeoAiError::internal(format!("EWKB 数据在偏移 {} 处截断", self.pos)))?;
        self.pos = end;
        let mut buf = [0u8; N];
        buf.copy_from_slice(slice);
        Ok(buf)
    }

    fn read_u8(&mut self) -> Result<u8> {
        Ok(self.take::<1>()?[0])
    }

    fn read_u32(&mut self) -> Result<u32> {
        let buf = self.take::<4>()?;
        Ok(if self.little_endian {
            u32::from_le_bytes(buf)
        } else {
            u32::from_be_bytes(buf)
        })
    }

    fn read_f64(&mut self) -> Result<f64> {
        let buf = self.take::<8>()?;
        Ok(if self.little_endian {
            f64::from_le_bytes(buf)
        } else {
            f64::from_be_bytes(buf)
        })
    }

    fn read_position(&mut self) -> Result<Position> {
        let lon = self.read_f64()?;
        let lat = self.read_f64()?;
        if lon.is_nan() || lat.is_nan() {
            return Err(GeoAiError::internal("不支持空几何 (EMPTY)"));
        }
        Ok([lon, lat])
    }

    const fn is_exhausted(&self) -> bool {
        self.pos == self.bytes.len()
    }
}

/// 解码 PostGIS 以 `text` 输出的十六进制 EWKB
///
/// 仅支持二维 Point 与 LineString，大小端均可，SRID 可有可无。
pub fn decode_ewkb_hex(value: &str) -> Result<Geometry> {
    let bytes = hex::decode(value.trim())
        .map_err(|e| GeoAiError::internal_with_source("无效的十六进制 EWKB", e))?;
    let mut reader = WkbReader::new(&bytes);

    reader.little_endian = match reader.read_u8()? {
        0 => false,
        1 => true,
        other => {
            return Err(GeoAiError::internal(format!("无效的 WKB 字节序标记: {other}")));
        }
    };

    let type_word = reader.read_u32()?;
    if type_word & (EWKB_Z_FLAG | EWKB_M_FLAG) != 0 || (type_word & 0xFFFF) >= 1000 {
        return Err(GeoAiError::internal("不支持带 Z/M 坐标的几何"));
    }
    if type_word & EWKB_SRID_FLAG != 0 {
        // SRID 固定为 4326，列定义已约束
        let _srid = reader.read_u32()?;
    }

    let geometry = match type_word & 0x0FFF_FFFF {
        WKB_POINT => Geometry::Point(GeoPoint {
            kind: PointKind::Point,
            coordinates: reader.read_position()?,
        }),
        WKB_LINESTRING => {
            let count = reader.read_u32()? as usize;
            // 按剩余字节数限制预分配，每个点 16 字节
            let remaining = bytes.len().saturating_sub(reader.pos) / 16;
            let mut coordinates = Vec::with_capacity(count.min(remaining));
            for _ in 0..count {
                coordinates.push(reader.read_position()?);
            }
            Geometry::LineString(GeoLineString::new(coordinates))
        }
        other => {
            return Err(GeoAiError::internal(format!("不支持的几何类型代码: {other}")));
        }
    };

    if !reader.is_exhausted() {
        return Err(GeoAiError::internal("EWKB 数据末尾存在多余字节"));
    }
    Ok(geometry)
}
