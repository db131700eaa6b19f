//! Coordinate geometry shared by the projector and the stitcher.
//!
//! Every function here is pure: no I/O, no global state, all parameters
//! explicit. Both pipelines go through the same intermediate, a unit
//! [`Direction`] on the sphere:
//!
//! ```text
//! equirect (lon, lat)  ⇄  Direction (x, y, z)  ⇄  cube face (face, u, v)
//! ```
//!
//! ## Axis convention
//!
//! Right-handed, krpano style: `+Z` is front, `+X` is right, `+Y` is up.
//! Longitude grows to the right across the equirectangular canvas and the top
//! row is the north pole (`lat = +π/2`).
//!
//! ## Face orientation
//!
//! Each face is seen from the cube centre with its plane coordinates `(a, b)`
//! in `[-1, 1]²`, `a` to the right and `b` upwards:
//!
//! | Face  | Axis | direction from `(a, b)` |
//! |-------|------|-------------------------|
//! | front | +Z | `( a,  b,  1)` |
//! | back  | −Z | `(−a,  b, −1)` |
//! | left  | −X | `(−1,  b,  a)` |
//! | right | +X | `( 1,  b, −a)` |
//! | up    | +Y | `( a,  1, −b)` |
//! | down  | −Y | `( a, −1,  b)` |
//!
//! With this table the four side faces form a continuous strip and the top
//! edge of front meets the bottom edge of up (likewise front/down), so
//! adjacent faces share edges without mirroring.
//!
//! ## Pixel convention
//!
//! Continuous pixel coordinates place pixel `i` on `[i, i + 1)` with its centre
//! at `i + 0.5`. Face rows run top to bottom, so `v` grows downwards while the
//! plane coordinate `b` grows upwards.

use std::f64::consts::{FRAC_PI_2, PI};

/// One of the six cube faces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Face {
    Front,
    Back,
    Left,
    Right,
    Up,
    Down,
}

impl Face {
    /// All faces in canonical order. [`Face::index`] is the position in this array.
    pub const ALL: [Face; 6] = [
        Face::Front,
        Face::Back,
        Face::Left,
        Face::Right,
        Face::Up,
        Face::Down,
    ];

    pub fn index(self) -> usize {
        match self {
            Face::Front => 0,
            Face::Back => 1,
            Face::Left => 2,
            Face::Right => 3,
            Face::Up => 4,
            Face::Down => 5,
        }
    }

    /// Lower-case name used in messages.
    pub fn name(self) -> &'static str {
        match self {
            Face::Front => "front",
            Face::Back => "back",
            Face::Left => "left",
            Face::Right => "right",
            Face::Up => "up",
            Face::Down => "down",
        }
    }

    /// The axis-aligned direction through the centre of this face.
    pub fn axis(self) -> Direction {
        direction_from_face_plane(self, 0.0, 0.0)
    }
}

impl std::fmt::Display for Face {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// A direction from the sphere centre. Unit length unless stated otherwise.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Direction {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Direction {
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    pub fn length(self) -> f64 {
        (self.x * self.x + self.y * self.y + self.z * self.z).sqrt()
    }

    /// Scale to unit length. The zero vector is returned unchanged.
    pub fn normalized(self) -> Self {
        let len = self.length();
        if len == 0.0 {
            return self;
        }
        Self::new(self.x / len, self.y / len, self.z / len)
    }

    pub fn dot(self, other: Direction) -> f64 {
        self.x * other.x + self.y * other.y + self.z * other.z
    }
}

// ============================================================================
// Sphere ⇄ equirectangular
// ============================================================================

/// Unit direction for a longitude/latitude pair (radians).
pub fn direction_from_equirect(lon: f64, lat: f64) -> Direction {
    let (sin_lat, cos_lat) = lat.sin_cos();
    let (sin_lon, cos_lon) = lon.sin_cos();
    Direction::new(cos_lat * sin_lon, sin_lat, cos_lat * cos_lon)
}

/// Longitude in `[-π, π]` and latitude in `[-π/2, π/2]` of a unit direction.
///
/// `y` is clamped before `asin` so normalisation error cannot produce NaN.
pub fn equirect_from_direction(dir: Direction) -> (f64, f64) {
    let lon = dir.x.atan2(dir.z);
    let lat = dir.y.clamp(-1.0, 1.0).asin();
    (lon, lat)
}

/// Continuous equirect pixel coordinates of a longitude/latitude pair.
///
/// `x` is in `[0, width]` and must be treated as cyclic by samplers; `y` is
/// in `[0, height]`.
pub fn equirect_pixel_from_lonlat(lon: f64, lat: f64, width: u32, height: u32) -> (f64, f64) {
    let x = (lon / PI + 1.0) * 0.5 * width as f64;
    let y = (0.5 - lat / PI) * height as f64;
    (x, y)
}

/// Longitude/latitude at continuous equirect pixel coordinates.
pub fn lonlat_from_equirect_pixel(x: f64, y: f64, width: u32, height: u32) -> (f64, f64) {
    let lon = (x / width as f64 * 2.0 - 1.0) * PI;
    let lat = (0.5 - y / height as f64) * PI;
    (lon, lat.clamp(-FRAC_PI_2, FRAC_PI_2))
}

// ============================================================================
// Sphere ⇄ cube face
// ============================================================================

/// Pick the face for a direction and project onto its plane.
///
/// Returns the face and plane coordinates `(a, b)` clamped to `[-1, 1]`. The
/// dominant-axis rule never divides by zero for a non-zero vector; the zero
/// vector maps to the centre of the front face.
pub fn face_plane_from_direction(dir: Direction) -> (Face, f64, f64) {
    let Direction { x, y, z } = dir;
    let (ax, ay, az) = (x.abs(), y.abs(), z.abs());

    let (face, a, b) = if ax >= ay && ax >= az {
        if ax == 0.0 {
            return (Face::Front, 0.0, 0.0);
        }
        if x > 0.0 {
            (Face::Right, -z / x, y / x)
        } else {
            (Face::Left, -z / x, -y / x)
        }
    } else if ay >= az {
        if y > 0.0 {
            (Face::Up, x / y, -z / y)
        } else {
            (Face::Down, -x / y, -z / y)
        }
    } else if z > 0.0 {
        (Face::Front, x / z, y / z)
    } else {
        (Face::Back, x / z, -y / z)
    };

    (face, a.clamp(-1.0, 1.0), b.clamp(-1.0, 1.0))
}

/// Unit direction through plane coordinates `(a, b)` of a face.
pub fn direction_from_face_plane(face: Face, a: f64, b: f64) -> Direction {
    let raw = match face {
        Face::Front => Direction::new(a, b, 1.0),
        Face::Back => Direction::new(-a, b, -1.0),
        Face::Left => Direction::new(-1.0, b, a),
        Face::Right => Direction::new(1.0, b, -a),
        Face::Up => Direction::new(a, 1.0, -b),
        Face::Down => Direction::new(a, -1.0, b),
    };
    raw.normalized()
}

/// Face and continuous pixel coordinates `(u, v)` in `[0, size]²`.
pub fn face_and_uv_from_direction(dir: Direction, size: u32) -> (Face, f64, f64) {
    let (face, a, b) = face_plane_from_direction(dir);
    let s = size as f64;
    (face, (a + 1.0) * 0.5 * s, (1.0 - b) * 0.5 * s)
}

/// Unit direction through continuous pixel coordinates `(u, v)` of a face.
///
/// Exact inverse of [`face_and_uv_from_direction`] up to normalisation.
pub fn direction_from_face_uv(face: Face, u: f64, v: f64, size: u32) -> Direction {
    let s = size as f64;
    let a = 2.0 * u / s - 1.0;
    let b = 1.0 - 2.0 * v / s;
    direction_from_face_plane(face, a, b)
}
