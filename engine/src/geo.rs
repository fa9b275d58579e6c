//! Geospatial shapes used by `GEOWITHIN` predicates.
//!
//! Points are validated on construction; shapes built from valid points carry
//! their own invariants (non-negative radius, closed polygon rings).

use crate::{error::Result, Error};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::hash::{Hash, Hasher};

/// Mean earth radius used to turn surface distances into radians.
pub const EARTH_RADIUS_METERS: f64 = 6_371_009.0;

const METERS_PER_MILE: f64 = 1609.344;

/// A point on the earth's surface.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawPoint", rename_all = "camelCase")]
pub struct GeoPoint {
    latitude: f64,
    longitude: f64,
}

#[derive(Deserialize)]
struct RawPoint {
    latitude: f64,
    longitude: f64,
}

impl TryFrom<RawPoint> for GeoPoint {
    type Error = Error;

    fn try_from(raw: RawPoint) -> Result<Self> {
        GeoPoint::new(raw.latitude, raw.longitude)
    }
}

impl GeoPoint {
    /// Create a point, rejecting out-of-range coordinates.
    pub fn new(latitude: f64, longitude: f64) -> Result<Self> {
        if !(-90.0..=90.0).contains(&latitude) {
            return Err(Error::InvalidGeoShape(format!(
                "latitude {latitude} is outside [-90, 90]"
            )));
        }
        if !(-180.0..=180.0).contains(&longitude) {
            return Err(Error::InvalidGeoShape(format!(
                "longitude {longitude} is outside [-180, 180]"
            )));
        }
        // -0.0 and 0.0 compare equal, so store one of them for hashing.
        Ok(Self {
            latitude: latitude + 0.0,
            longitude: longitude + 0.0,
        })
    }

    pub fn latitude(&self) -> f64 {
        self.latitude
    }

    pub fn longitude(&self) -> f64 {
        self.longitude
    }
}

impl Hash for GeoPoint {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.latitude.to_bits().hash(state);
        self.longitude.to_bits().hash(state);
    }
}

impl fmt::Display for GeoPoint {
    // Longitude first, as the query grammar expects.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {}]", self.longitude, self.latitude)
    }
}

/// A distance on the earth's surface, stored in radians.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub struct Distance {
    radians: f64,
}

impl Distance {
    pub fn radians(radians: f64) -> Result<Self> {
        if radians.is_nan() || radians < 0.0 {
            return Err(Error::InvalidGeoShape(format!(
                "distance must be non-negative, got {radians}"
            )));
        }
        Ok(Self {
            radians: radians + 0.0,
        })
    }

    pub fn degrees(degrees: f64) -> Result<Self> {
        Self::radians(degrees.to_radians())
    }

    pub fn kilometers(kilometers: f64) -> Result<Self> {
        Self::radians(kilometers * 1000.0 / EARTH_RADIUS_METERS)
    }

    pub fn miles(miles: f64) -> Result<Self> {
        Self::radians(miles * METERS_PER_MILE / EARTH_RADIUS_METERS)
    }

    pub fn as_radians(&self) -> f64 {
        self.radians
    }

    pub fn as_kilometers(&self) -> f64 {
        self.radians * EARTH_RADIUS_METERS / 1000.0
    }
}

/// Rectangle given by its bottom-left and top-right corners.
#[derive(Debug, Clone, Copy, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeoBox {
    pub bottom_left: GeoPoint,
    pub top_right: GeoPoint,
}

impl GeoBox {
    pub fn new(bottom_left: GeoPoint, top_right: GeoPoint) -> Self {
        Self {
            bottom_left,
            top_right,
        }
    }
}

/// Circle given by a center and a radius in radians.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawCircle", rename_all = "camelCase")]
pub struct GeoCircle {
    center: GeoPoint,
    radius: f64,
}

#[derive(Deserialize)]
struct RawCircle {
    center: GeoPoint,
    radius: f64,
}

impl TryFrom<RawCircle> for GeoCircle {
    type Error = Error;

    fn try_from(raw: RawCircle) -> Result<Self> {
        Ok(GeoCircle::new(raw.center, Distance::radians(raw.radius)?))
    }
}

impl GeoCircle {
    pub fn new(center: GeoPoint, radius: Distance) -> Self {
        Self {
            center,
            radius: radius.as_radians(),
        }
    }

    pub fn center(&self) -> GeoPoint {
        self.center
    }

    pub fn radius(&self) -> Distance {
        Distance {
            radians: self.radius,
        }
    }
}

impl Hash for GeoCircle {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.center.hash(state);
        self.radius.to_bits().hash(state);
    }
}

/// Polygon with an outer ring and optional holes.
///
/// Every ring is closed (first point equals last) and has at least four points.
#[derive(Debug, Clone, PartialEq, Hash, Serialize, Deserialize)]
#[serde(try_from = "RawPolygon", rename_all = "camelCase")]
pub struct GeoPolygon {
    outer_ring: Vec<GeoPoint>,
    holes: Vec<Vec<GeoPoint>>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawPolygon {
    outer_ring: Vec<GeoPoint>,
    #[serde(default)]
    holes: Vec<Vec<GeoPoint>>,
}

impl TryFrom<RawPolygon> for GeoPolygon {
    type Error = Error;

    fn try_from(raw: RawPolygon) -> Result<Self> {
        GeoPolygon::new(raw.outer_ring, raw.holes)
    }
}

impl GeoPolygon {
    pub fn new(outer_ring: Vec<GeoPoint>, holes: Vec<Vec<GeoPoint>>) -> Result<Self> {
        validate_ring(&outer_ring)?;
        for hole in &holes {
            validate_ring(hole)?;
        }
        Ok(Self { outer_ring, holes })
    }

    pub fn outer_ring(&self) -> &[GeoPoint] {
        &self.outer_ring
    }

    pub fn holes(&self) -> &[Vec<GeoPoint>] {
        &self.holes
    }
}

fn validate_ring(ring: &[GeoPoint]) -> Result<()> {
    if ring.len() < 4 {
        return Err(Error::InvalidGeoShape(format!(
            "polygon ring needs at least 4 points, got {}",
            ring.len()
        )));
    }
    if ring.first() != ring.last() {
        return Err(Error::InvalidGeoShape(
            "polygon ring must be closed (first point equal to last)".into(),
        ));
    }
    Ok(())
}

/// Any shape a point can be tested against.
#[derive(Debug, Clone, PartialEq, Hash, Serialize, Deserialize)]
#[serde(tag = "shape", rename_all = "lowercase")]
pub enum GeoShape {
    Box(GeoBox),
    Circle(GeoCircle),
    Polygon(GeoPolygon),
}

impl From<GeoBox> for GeoShape {
    fn from(shape: GeoBox) -> Self {
        GeoShape::Box(shape)
    }
}

impl From<GeoCircle> for GeoShape {
    fn from(shape: GeoCircle) -> Self {
        GeoShape::Circle(shape)
    }
}

impl From<GeoPolygon> for GeoShape {
    fn from(shape: GeoPolygon) -> Self {
        GeoShape::Polygon(shape)
    }
}

impl fmt::Display for GeoShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GeoShape::Box(b) => write!(f, "geoBox({}, {})", b.bottom_left, b.top_right),
            GeoShape::Circle(c) => write!(f, "geoCircle({}, {})", c.center, c.radius),
            GeoShape::Polygon(p) => {
                write!(f, "geoPolygon(")?;
                write_ring(f, &p.outer_ring)?;
                for hole in &p.holes {
                    write!(f, ", ")?;
                    write_ring(f, hole)?;
                }
                write!(f, ")")
            }
        }
    }
}

fn write_ring(f: &mut fmt::Formatter<'_>, ring: &[GeoPoint]) -> fmt::Result {
    write!(f, "{{")?;
    for (i, point) in ring.iter().enumerate() {
        if i > 0 {
            write!(f, ", ")?;
        }
        write!(f, "{point}")?;
    }
    write!(f, "}}")
}
