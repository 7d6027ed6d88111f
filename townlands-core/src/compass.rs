//! Eight-point compass buckets derived from bearings.
//!
//! A bucket is a pure function of the bearing: the circle is split into eight
//! half-open arcs of 45° centred on the principal and intermediate points, so
//! each boundary belongs to the arc clockwise of it.
//!
//! # Examples
//! ```
//! use townlands_core::CompassBucket;
//!
//! assert_eq!(CompassBucket::from_bearing(45.0), Some(CompassBucket::NorthEast));
//! assert_eq!(CompassBucket::NorthEast.as_str(), "NE");
//! assert_eq!(CompassBucket::from_bearing(-10.0), Some(CompassBucket::North));
//! ```

/// Upper bounds (exclusive) of each arc after the northern one, in degrees.
const ARC_UPPER_BOUNDS: [(f64, CompassBucket); 7] = [
    (67.5, CompassBucket::NorthEast),
    (112.5, CompassBucket::East),
    (157.5, CompassBucket::SouthEast),
    (202.5, CompassBucket::South),
    (247.5, CompassBucket::SouthWest),
    (292.5, CompassBucket::West),
    (337.5, CompassBucket::NorthWest),
];

/// One of the eight compass labels stored alongside a touch edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CompassBucket {
    /// `[337.5, 360) ∪ [0, 22.5)`
    North,
    /// `[22.5, 67.5)`
    NorthEast,
    /// `[67.5, 112.5)`
    East,
    /// `[112.5, 157.5)`
    SouthEast,
    /// `[157.5, 202.5)`
    South,
    /// `[202.5, 247.5)`
    SouthWest,
    /// `[247.5, 292.5)`
    West,
    /// `[292.5, 337.5)`
    NorthWest,
}

impl CompassBucket {
    /// Classify a bearing in degrees.
    ///
    /// Bearings outside `[0, 360)` are reduced with a Euclidean remainder
    /// first. Non-finite bearings have no bucket.
    #[must_use]
    pub fn from_bearing(degrees: f64) -> Option<Self> {
        if !degrees.is_finite() {
            return None;
        }
        let reduced = degrees.rem_euclid(360.0);
        if reduced < 22.5 {
            return Some(Self::North);
        }
        let bucket = ARC_UPPER_BOUNDS
            .iter()
            .find(|(upper, _)| reduced < *upper)
            .map_or(Self::North, |(_, bucket)| *bucket);
        Some(bucket)
    }

    /// Return the stored label (`"N"`, `"NE"`, ...).
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::North => "N",
            Self::NorthEast => "NE",
            Self::East => "E",
            Self::SouthEast => "SE",
            Self::South => "S",
            Self::SouthWest => "SW",
            Self::West => "W",
            Self::NorthWest => "NW",
        }
    }
}
