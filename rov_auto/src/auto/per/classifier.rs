//! # Terrain classifier
//!
//! Thresholds a warped frame into one binary mask per terrain class. Thresholds are tuned for the
//! simulator's lighting and are not calibrated at runtime.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use image::{Rgb, RgbImage};
use ndarray::Array2;
use serde::{Deserialize, Serialize};

// ------------------------------------------------------------------------------------------------
// TYPES
// ------------------------------------------------------------------------------------------------

/// Binary occupancy grid over the pixels of a warped frame, indexed `[[row, col]]`.
///
/// Every value is either 0 or 1.
pub type ClassMask = Array2<u8>;

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Inclusive, channel-wise colour range.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ColourThreshold {
    /// Lowest accepted value of each of the R, G, B channels.
    pub low: [u8; 3],

    /// Highest accepted value of each of the R, G, B channels.
    pub high: [u8; 3],
}

/// The masks produced by classifying a single frame.
#[derive(Debug, Clone, PartialEq)]
pub struct ClassMasks {
    pub navigable: ClassMask,
    pub sample: ClassMask,

    /// Complement of `navigable`, so may overlap with `sample`.
    pub obstacle: ClassMask,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

/// Terrain classes distinguished by the classifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TerrainClass {
    /// Drivable ground
    Navigable,

    /// A rock sample to be collected
    Sample,

    /// Anything that isn't navigable
    Obstacle,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl ColourThreshold {
    /// Threshold accepting pixels whose channels are all at least `low`.
    pub fn above(low: [u8; 3]) -> Self {
        Self {
            low,
            high: [255; 3],
        }
    }

    /// Returns true if every channel of the pixel lies in the threshold's range.
    pub fn contains(&self, pixel: &Rgb<u8>) -> bool {
        pixel
            .0
            .iter()
            .zip(self.low.iter().zip(self.high.iter()))
            .all(|(v, (lo, hi))| v >= lo && v <= hi)
    }
}

impl ClassMasks {
    /// Get the mask of the given class.
    pub fn get(&self, class: TerrainClass) -> &ClassMask {
        match class {
            TerrainClass::Navigable => &self.navigable,
            TerrainClass::Sample => &self.sample,
            TerrainClass::Obstacle => &self.obstacle,
        }
    }

    /// Number of pixels set in the given class's mask.
    pub fn area(&self, class: TerrainClass) -> usize {
        self.get(class).iter().filter(|&&v| v != 0).count()
    }

    /// Build the false-colour view of the masks: red for obstacles, green for samples and blue for
    /// navigable terrain.
    pub fn vision_image(&self) -> RgbImage {
        let (rows, cols) = self.navigable.dim();

        RgbImage::from_fn(cols as u32, rows as u32, |x, y| {
            let idx = [y as usize, x as usize];
            Rgb([
                self.obstacle[idx] * 255,
                self.sample[idx] * 255,
                self.navigable[idx] * 255,
            ])
        })
    }
}

// ------------------------------------------------------------------------------------------------
// FUNCTIONS
// ------------------------------------------------------------------------------------------------

/// Classify every pixel of the (warped) frame.
///
/// - Navigable pixels are those within `navigable`.
/// - Sample pixels are those within `sample`, regardless of whether they are navigable.
/// - Obstacle pixels are all pixels which are not navigable.
pub fn classify(
    frame: &RgbImage,
    navigable: &ColourThreshold,
    sample: &ColourThreshold,
) -> ClassMasks {
    let shape = (frame.height() as usize, frame.width() as usize);

    let mut masks = ClassMasks {
        navigable: ClassMask::zeros(shape),
        sample: ClassMask::zeros(shape),
        obstacle: ClassMask::zeros(shape),
    };

    for (x, y, pixel) in frame.enumerate_pixels() {
        let idx = [y as usize, x as usize];

        if navigable.contains(pixel) {
            masks.navigable[idx] = 1;
        } else {
            masks.obstacle[idx] = 1;
        }

        if sample.contains(pixel) {
            masks.sample[idx] = 1;
        }
    }

    masks
}

#[cfg(test)]
mod test {
    use super::*;

    fn thresholds() -> (ColourThreshold, ColourThreshold) {
        (
            ColourThreshold::above([160, 160, 160]),
            ColourThreshold {
                low: [140, 120, 0],
                high: [255, 230, 80],
            },
        )
    }

    /// Frame with one column each of: ground, rock, dark rock wall, sky-ish bright blue.
    fn test_frame() -> RgbImage {
        RgbImage::from_fn(4, 3, |x, _| match x {
            0 => Rgb([180, 170, 165]),
            1 => Rgb([200, 170, 30]),
            2 => Rgb([60, 50, 40]),
            _ => Rgb([160, 159, 255]),
        })
    }

    #[test]
    fn test_classify() {
        let (nav, sample) = thresholds();
        let masks = classify(&test_frame(), &nav, &sample);

        for row in 0..3 {
            assert_eq!(masks.navigable.row(row).to_vec(), vec![1, 0, 0, 0]);
            assert_eq!(masks.sample.row(row).to_vec(), vec![0, 1, 0, 0]);
            assert_eq!(masks.obstacle.row(row).to_vec(), vec![0, 1, 1, 1]);
        }

        assert_eq!(masks.area(TerrainClass::Navigable), 3);
        assert_eq!(masks.area(TerrainClass::Sample), 3);
        assert_eq!(masks.area(TerrainClass::Obstacle), 9);
    }

    #[test]
    fn test_obstacle_is_complement_of_navigable() {
        let (nav, sample) = thresholds();

        // Sweep through a range of colours so every combination of classes appears
        let frame = RgbImage::from_fn(64, 32, |x, y| {
            Rgb([(x * 4) as u8, (y * 8) as u8, ((x * 3 + y * 5) % 256) as u8])
        });
        let masks = classify(&frame, &nav, &sample);

        for ((&n, &o), &s) in masks
            .navigable
            .iter()
            .zip(masks.obstacle.iter())
            .zip(masks.sample.iter())
        {
            assert!(n <= 1 && o <= 1 && s <= 1);
            assert_eq!(n + o, 1);
        }
    }

    #[test]
    fn test_threshold_bounds_are_inclusive() {
        let (_, sample) = thresholds();

        assert!(sample.contains(&Rgb([140, 120, 0])));
        assert!(sample.contains(&Rgb([255, 230, 80])));
        assert!(!sample.contains(&Rgb([139, 120, 0])));
        assert!(!sample.contains(&Rgb([255, 231, 80])));
        assert!(!sample.contains(&Rgb([255, 230, 81])));
    }

    #[test]
    fn test_vision_image() {
        let (nav, sample) = thresholds();
        let vision = classify(&test_frame(), &nav, &sample).vision_image();

        assert_eq!(vision.dimensions(), (4, 3));
        assert_eq!(vision.get_pixel(0, 0), &Rgb([0, 0, 255]));
        assert_eq!(vision.get_pixel(1, 1), &Rgb([255, 255, 0]));
        assert_eq!(vision.get_pixel(2, 2), &Rgb([255, 0, 0]));
    }
}
