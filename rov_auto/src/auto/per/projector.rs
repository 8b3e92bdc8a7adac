//! # Geometric projector
//!
//! Converts camera frames into a top-down view of the ground in front of the rover and maps
//! classified pixels between the image, rover-centric and world frames.
//!
//! The perspective transform is a fixed homography calculated once from a calibration trapezoid
//! in the camera image and the square it should become in the top-down view. In the top-down
//! (warped) view each pixel is roughly one decimeter of ground.
//!
//! Frames used here:
//! - Image: pixel coordinates, origin at the top left, x to the right, y down.
//! - Rover-centric: origin at the rover's ground contact point (bottom centre of the warped
//!   image), x forward, y left.
//! - World: cells of the world map, x and y along the map axes.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use image::{Rgb, RgbImage};
use nalgebra::{DMatrix, DVector, Matrix3, Vector2, Vector3};
use serde::{Deserialize, Serialize};

use super::classifier::ClassMask;
use crate::auto::loc::Pose;

// ------------------------------------------------------------------------------------------------
// CONSTANTS
// ------------------------------------------------------------------------------------------------

/// Smallest homogeneous scale that is still considered a finite projection.
const MIN_HOMOGENEOUS_SCALE: f64 = 1e-12;

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// A 3x3 perspective transform between two image planes.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Homography {
    /// Forward transform, source -> destination.
    fwd: Matrix3<f64>,

    /// Inverse transform, destination -> source.
    inv: Matrix3<f64>,
}

/// Parameters of the perspective calibration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CalibParams {
    /// Four points in the camera image bounding one square meter of ground, ordered bottom left,
    /// bottom right, top right, top left.
    ///
    /// Units: pixels
    pub src_points: [[f64; 2]; 4],

    /// Half the side length of the square the calibration points map to in the warped view.
    ///
    /// Units: pixels
    pub dst_size: f64,

    /// Distance between the bottom of the image and the bottom of the destination square. The
    /// bottom of the camera image is a little in front of the rover.
    ///
    /// Units: pixels
    pub bottom_offset: f64,
}

/// Warps frames and projects masks between frames.
#[derive(Debug, Clone)]
pub struct Projector {
    homography: Homography,

    width: u32,
    height: u32,

    /// Points further than this from the rover are discarded.
    ///
    /// Units: warped pixels
    sensing_radius: f64,
}

/// Offsets of the set pixels of a mask from the rover's ground contact point.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RoverCentricPoints(pub Vec<Vector2<f64>>);

/// Polar form of a set of rover-centric points.
///
/// `dists[i]` and `bearings_rad[i]` describe the same point. Bearings are relative to the rover's
/// heading, zero straight ahead and positive to the left.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PolarObservation {
    pub dists: Vec<f64>,
    pub bearings_rad: Vec<f64>,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

#[derive(Debug, Clone, thiserror::Error)]
pub enum ProjectorError {
    #[error("The calibration points do not define a valid perspective transform")]
    Degenerate,

    #[error("Cannot project onto a {0}x{1} image")]
    InvalidImageSize(u32, u32),
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl Default for CalibParams {
    fn default() -> Self {
        Self {
            src_points: [[14.0, 140.0], [301.0, 140.0], [200.0, 96.0], [118.0, 96.0]],
            dst_size: 5.0,
            bottom_offset: 6.0,
        }
    }
}

impl CalibParams {
    /// The destination square for an image of the given size, in the same order as
    /// `src_points`.
    pub fn dst_points(&self, width: u32, height: u32) -> [[f64; 2]; 4] {
        let cx = width as f64 / 2.0;
        let bottom = height as f64 - self.bottom_offset;
        let top = bottom - 2.0 * self.dst_size;

        [
            [cx - self.dst_size, bottom],
            [cx + self.dst_size, bottom],
            [cx + self.dst_size, top],
            [cx - self.dst_size, top],
        ]
    }
}

impl Homography {
    /// Solve for the transform mapping each of the `src` points onto the matching `dst` point.
    pub fn from_point_pairs(
        src: &[[f64; 2]; 4],
        dst: &[[f64; 2]; 4],
    ) -> Result<Self, ProjectorError> {
        // Four points only define a perspective transform if no three of them are collinear
        if has_collinear_triple(src) || has_collinear_triple(dst) {
            return Err(ProjectorError::Degenerate);
        }

        // With h33 fixed at 1 each pair gives two equations in the remaining 8 unknowns:
        //   u = (h11 x + h12 y + h13) / (h31 x + h32 y + 1)
        //   v = (h21 x + h22 y + h23) / (h31 x + h32 y + 1)
        let mut a = DMatrix::<f64>::zeros(8, 8);
        let mut b = DVector::<f64>::zeros(8);

        for (i, ([x, y], [u, v])) in src.iter().zip(dst.iter()).enumerate() {
            let r = 2 * i;

            a[(r, 0)] = *x;
            a[(r, 1)] = *y;
            a[(r, 2)] = 1.0;
            a[(r, 6)] = -u * x;
            a[(r, 7)] = -u * y;
            b[r] = *u;

            a[(r + 1, 3)] = *x;
            a[(r + 1, 4)] = *y;
            a[(r + 1, 5)] = 1.0;
            a[(r + 1, 6)] = -v * x;
            a[(r + 1, 7)] = -v * y;
            b[r + 1] = *v;
        }

        let h = a.lu().solve(&b).ok_or(ProjectorError::Degenerate)?;

        if h.iter().any(|v| !v.is_finite()) {
            return Err(ProjectorError::Degenerate);
        }

        let fwd = Matrix3::new(h[0], h[1], h[2], h[3], h[4], h[5], h[6], h[7], 1.0);
        let inv = fwd.try_inverse().ok_or(ProjectorError::Degenerate)?;

        Ok(Self { fwd, inv })
    }

    /// Map a source point into the destination plane.
    ///
    /// Returns `None` for points on the horizon line of the transform.
    pub fn apply(&self, x: f64, y: f64) -> Option<Vector2<f64>> {
        project(&self.fwd, x, y)
    }

    /// Map a destination point back into the source plane.
    pub fn apply_inverse(&self, x: f64, y: f64) -> Option<Vector2<f64>> {
        project(&self.inv, x, y)
    }

    /// The forward transform matrix.
    pub fn matrix(&self) -> &Matrix3<f64> {
        &self.fwd
    }
}

impl Projector {
    /// Create a new projector for images of the given size.
    pub fn new(
        calib: &CalibParams,
        width: u32,
        height: u32,
        sensing_radius: f64,
    ) -> Result<Self, ProjectorError> {
        if width == 0 || height == 0 {
            return Err(ProjectorError::InvalidImageSize(width, height));
        }

        let homography =
            Homography::from_point_pairs(&calib.src_points, &calib.dst_points(width, height))?;

        Ok(Self {
            homography,
            width,
            height,
            sensing_radius,
        })
    }

    /// The dimensions of the images this projector was calibrated for.
    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn homography(&self) -> &Homography {
        &self.homography
    }

    /// Warp a camera frame into the top-down view.
    ///
    /// Each destination pixel is mapped back into the camera frame and sampled with bilinear
    /// interpolation. Pixels which map outside the camera frame are black.
    pub fn warp(&self, frame: &RgbImage) -> RgbImage {
        RgbImage::from_fn(self.width, self.height, |u, v| {
            match self.homography.apply_inverse(u as f64, v as f64) {
                Some(src) => sample_bilinear(frame, src.x, src.y),
                None => Rgb([0, 0, 0]),
            }
        })
    }

    /// Convert the set pixels of a mask into rover-centric offsets, discarding any that are
    /// beyond the sensing radius.
    pub fn to_rover_centric(&self, mask: &ClassMask) -> RoverCentricPoints {
        let (rows, cols) = mask.dim();
        let half_width = cols as f64 / 2.0;

        let points = mask
            .indexed_iter()
            .filter(|(_, &v)| v != 0)
            .map(|((row, col), _)| Vector2::new(rows as f64 - row as f64, half_width - col as f64))
            .filter(|p| p.norm() < self.sensing_radius)
            .collect();

        RoverCentricPoints(points)
    }
}

impl RoverCentricPoints {
    /// Convert the points to polar form.
    pub fn to_polar(&self) -> PolarObservation {
        let (dists, bearings_rad) = self.0.iter().map(|p| (p.norm(), p.y.atan2(p.x))).unzip();

        PolarObservation {
            dists,
            bearings_rad,
        }
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl PolarObservation {
    pub fn len(&self) -> usize {
        self.dists.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dists.is_empty()
    }

    /// Distance to the closest point, if there are any.
    pub fn min_dist(&self) -> Option<f64> {
        self.dists
            .iter()
            .copied()
            .min_by_key(|&d| ordered_float::OrderedFloat(d))
    }

    /// Mean bearing of all points, in degrees.
    pub fn mean_bearing_deg(&self) -> Option<f64> {
        util::maths::mean(&self.bearings_rad).map(f64::to_degrees)
    }

    /// Distance of the point closest to straight ahead.
    ///
    /// The point with the smallest bearing magnitude is chosen, the first such point if several
    /// share it.
    pub fn forward_dist(&self) -> Option<f64> {
        self.bearings_rad
            .iter()
            .enumerate()
            .min_by_key(|(_, b)| ordered_float::OrderedFloat(b.abs()))
            .map(|(i, _)| self.dists[i])
    }

    /// Project the observation into the world map.
    ///
    /// `scale` is the number of rover-centric units per world cell. Cells are clamped into
    /// `[0, world_size - 1]` on both axes, so this never fails.
    pub fn to_world(&self, pose: &Pose, world_size: usize, scale: f64) -> Vec<Vector2<usize>> {
        let heading = pose.get_heading();

        self.dists
            .iter()
            .zip(self.bearings_rad.iter())
            .map(|(&d, &b)| {
                let angle = b + heading;
                let range = d / scale;

                Vector2::new(
                    clamp_to_grid(range * angle.cos() + pose.position.x, world_size),
                    clamp_to_grid(range * angle.sin() + pose.position.y, world_size),
                )
            })
            .collect()
    }
}

// ------------------------------------------------------------------------------------------------
// FUNCTIONS
// ------------------------------------------------------------------------------------------------

fn project(m: &Matrix3<f64>, x: f64, y: f64) -> Option<Vector2<f64>> {
    let p = m * Vector3::new(x, y, 1.0);

    if p.z.abs() < MIN_HOMOGENEOUS_SCALE {
        None
    } else {
        Some(Vector2::new(p.x / p.z, p.y / p.z))
    }
}

fn has_collinear_triple(points: &[[f64; 2]; 4]) -> bool {
    const TRIPLES: [[usize; 3]; 4] = [[0, 1, 2], [0, 1, 3], [0, 2, 3], [1, 2, 3]];

    TRIPLES.iter().any(|&[a, b, c]| {
        let ab = [points[b][0] - points[a][0], points[b][1] - points[a][1]];
        let ac = [points[c][0] - points[a][0], points[c][1] - points[a][1]];

        (ab[0] * ac[1] - ab[1] * ac[0]).abs() < 1e-9
    })
}

/// Sample the frame at a sub-pixel position, black outside the frame.
fn sample_bilinear(frame: &RgbImage, x: f64, y: f64) -> Rgb<u8> {
    let max_x = frame.width() as f64 - 1.0;
    let max_y = frame.height() as f64 - 1.0;

    if !(x >= 0.0 && y >= 0.0 && x <= max_x && y <= max_y) {
        return Rgb([0, 0, 0]);
    }

    let x0 = x.floor();
    let y0 = y.floor();
    let x1 = (x0 + 1.0).min(max_x);
    let y1 = (y0 + 1.0).min(max_y);
    let fx = x - x0;
    let fy = y - y0;

    let p00 = frame.get_pixel(x0 as u32, y0 as u32);
    let p10 = frame.get_pixel(x1 as u32, y0 as u32);
    let p01 = frame.get_pixel(x0 as u32, y1 as u32);
    let p11 = frame.get_pixel(x1 as u32, y1 as u32);

    let mut out = [0u8; 3];
    for (c, v) in out.iter_mut().enumerate() {
        let top = p00[c] as f64 * (1.0 - fx) + p10[c] as f64 * fx;
        let bottom = p01[c] as f64 * (1.0 - fx) + p11[c] as f64 * fx;
        *v = (top * (1.0 - fy) + bottom * fy).round().max(0.0).min(255.0) as u8;
    }

    Rgb(out)
}

/// Truncate a world coordinate to a cell index inside the map.
fn clamp_to_grid(value: f64, world_size: usize) -> usize {
    let max = world_size.saturating_sub(1) as f64;
    let value = value.trunc();

    if value.is_nan() {
        0
    } else {
        value.max(0.0).min(max) as usize
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use std::f64::consts::FRAC_PI_2;

    const EPS: f64 = 1e-6;

    fn sim_projector() -> Projector {
        Projector::new(&CalibParams::default(), 320, 160, 80.0).unwrap()
    }

    #[test]
    fn test_homography_maps_calibration_points() {
        let calib = CalibParams::default();
        let dst = calib.dst_points(320, 160);
        let h = Homography::from_point_pairs(&calib.src_points, &dst).unwrap();

        for (s, d) in calib.src_points.iter().zip(dst.iter()) {
            let p = h.apply(s[0], s[1]).unwrap();
            assert!((p.x - d[0]).abs() < EPS, "{:?} -> {:?}, expected {:?}", s, p, d);
            assert!((p.y - d[1]).abs() < EPS, "{:?} -> {:?}, expected {:?}", s, p, d);

            let back = h.apply_inverse(d[0], d[1]).unwrap();
            assert!((back.x - s[0]).abs() < EPS);
            assert!((back.y - s[1]).abs() < EPS);
        }

        // Destination square is centred horizontally, 6 px above the bottom, 10 px across
        assert_eq!(dst[0], [155.0, 154.0]);
        assert_eq!(dst[2], [165.0, 144.0]);
    }

    #[test]
    fn test_homography_degenerate() {
        let collinear = [[0.0, 0.0], [1.0, 1.0], [2.0, 2.0], [3.0, 3.0]];
        let dst = CalibParams::default().dst_points(320, 160);

        assert!(matches!(
            Homography::from_point_pairs(&collinear, &dst),
            Err(ProjectorError::Degenerate)
        ));
        assert!(matches!(
            Projector::new(&CalibParams::default(), 0, 160, 80.0),
            Err(ProjectorError::InvalidImageSize(0, 160))
        ));
    }

    #[test]
    fn test_warp_is_deterministic() {
        let projector = sim_projector();
        let frame = RgbImage::from_fn(320, 160, |x, y| {
            Rgb([(x % 256) as u8, (y * 3 % 256) as u8, ((x + y) % 256) as u8])
        });

        let a = projector.warp(&frame);
        let b = projector.warp(&frame);
        assert_eq!(a.dimensions(), (320, 160));
        assert_eq!(a, b);

        // A projector built from the same calibration warps identically
        assert_eq!(a, sim_projector().warp(&frame));
    }

    #[test]
    fn test_warp_uniform_ground() {
        let projector = sim_projector();
        let frame = RgbImage::from_pixel(320, 160, Rgb([200, 190, 180]));
        let warped = projector.warp(&frame);

        // The centre of the destination square comes from inside the calibration trapezoid
        assert_eq!(warped.get_pixel(160, 149), &Rgb([200, 190, 180]));

        // Ground just in front of the rover but far to the side is outside the camera's view
        assert_eq!(warped.get_pixel(0, 150), &Rgb([0, 0, 0]));
        assert_eq!(warped.get_pixel(319, 150), &Rgb([0, 0, 0]));

        // As is everything behind the bottom edge of the camera frame
        assert_eq!(warped.get_pixel(160, 159), &Rgb([0, 0, 0]));
    }

    #[test]
    fn test_to_rover_centric() {
        let projector = sim_projector();
        let mut mask = ClassMask::zeros((160, 320));

        // Directly ahead, 10 px in front of the rover
        mask[[150, 160]] = 1;
        // Ahead and to the left
        mask[[140, 150]] = 1;
        // Far away at the top of the frame, outside the sensing radius
        mask[[0, 160]] = 1;

        let points = projector.to_rover_centric(&mask);
        assert_eq!(points.len(), 2);
        assert!(points.0.contains(&Vector2::new(10.0, 0.0)));
        assert!(points.0.contains(&Vector2::new(20.0, 10.0)));
    }

    #[test]
    fn test_to_polar() {
        let points = RoverCentricPoints(vec![
            Vector2::new(10.0, 0.0),
            Vector2::new(0.0, 5.0),
            Vector2::new(3.0, -4.0),
        ]);
        let polar = points.to_polar();

        assert_eq!(polar.dists, vec![10.0, 5.0, 5.0]);
        assert!((polar.bearings_rad[0]).abs() < EPS);
        assert!((polar.bearings_rad[1] - FRAC_PI_2).abs() < EPS);
        assert!(polar.bearings_rad[2] < 0.0);

        assert_eq!(polar.min_dist(), Some(5.0));
        assert_eq!(polar.forward_dist(), Some(10.0));
        assert_eq!(PolarObservation::default().min_dist(), None);
        assert_eq!(PolarObservation::default().forward_dist(), None);
    }

    #[test]
    fn test_forward_dist_symmetric_bearings() {
        // Bearings summing to zero must still pick the straightest point
        let polar = PolarObservation {
            dists: vec![4.0, 7.0, 4.0],
            bearings_rad: vec![0.3, 0.0, -0.3],
        };
        assert_eq!(polar.forward_dist(), Some(7.0));

        // Ties resolve to the first point
        let polar = PolarObservation {
            dists: vec![4.0, 9.0],
            bearings_rad: vec![-0.2, 0.2],
        };
        assert_eq!(polar.forward_dist(), Some(4.0));
    }

    #[test]
    fn test_mean_bearing_deg() {
        let polar = PolarObservation {
            dists: vec![1.0, 1.0],
            bearings_rad: vec![0.1, 0.3],
        };
        assert!((polar.mean_bearing_deg().unwrap() - 0.2f64.to_degrees()).abs() < EPS);
        assert_eq!(PolarObservation::default().mean_bearing_deg(), None);
    }

    #[test]
    fn test_to_world() {
        let pose = Pose {
            position: Vector2::new(100.0, 50.0),
            yaw_deg: 90.0,
            ..Default::default()
        };

        // 20 units straight ahead while facing +y is 2 cells along +y
        let polar = PolarObservation {
            dists: vec![20.0],
            bearings_rad: vec![0.0],
        };
        assert_eq!(polar.to_world(&pose, 200, 10.0), vec![Vector2::new(100, 52)]);

        // 30 units to the left while facing +y is 3 cells along -x
        let polar = PolarObservation {
            dists: vec![30.0],
            bearings_rad: vec![FRAC_PI_2],
        };
        assert_eq!(polar.to_world(&pose, 200, 10.0), vec![Vector2::new(97, 50)]);
    }

    #[test]
    fn test_to_world_clamps() {
        let pose = Pose {
            position: Vector2::new(199.5, 0.5),
            ..Default::default()
        };

        let polar = PolarObservation {
            dists: vec![80.0, 80.0, f64::NAN],
            bearings_rad: vec![0.0, -FRAC_PI_2, 0.0],
        };
        let cells = polar.to_world(&pose, 200, 10.0);

        assert_eq!(cells[0], Vector2::new(199, 0));
        assert_eq!(cells[1], Vector2::new(199, 0));
        assert_eq!(cells[2], Vector2::new(0, 0));
    }
}
