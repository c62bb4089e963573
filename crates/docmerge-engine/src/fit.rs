use serde::{Deserialize, Serialize};

use crate::error::{ComposeError, ComposeResult};

/// Bounding box used when an image rule does not supply one.
pub const DEFAULT_IMAGE_BOUNDS: Dimensions = Dimensions::new(50.0, 50.0);

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Dimensions {
    pub height: f64,
    pub width: f64,
}

impl Dimensions {
    pub const fn new(height: f64, width: f64) -> Self {
        Self { height, width }
    }
}

pub(crate) fn validate_bounds(bounds: Dimensions) -> ComposeResult<()> {
    if is_positive(bounds.height) && is_positive(bounds.width) {
        Ok(())
    } else {
        Err(ComposeError::InvalidBounds {
            height: bounds.height,
            width: bounds.width,
        })
    }
}

/// Shrinks `natural` into `bounds`, preserving aspect ratio.
///
/// Width is clamped first, then the (possibly already scaled) height. The two
/// steps are sequential, not a single min-ratio scale, and each floors the
/// dimension it derives.
pub fn fit_within(natural: Dimensions, bounds: Dimensions) -> ComposeResult<Dimensions> {
    validate_bounds(bounds)?;
    if !(is_positive(natural.height) && is_positive(natural.width)) {
        return Err(ComposeError::DegenerateImage {
            height: natural.height,
            width: natural.width,
        });
    }

    let mut height = natural.height;
    let mut width = natural.width;

    if width > bounds.width {
        let coefficient = bounds.width / width;
        height = (height * coefficient).floor();
        width = bounds.width;
    }

    if height > bounds.height {
        let coefficient = bounds.height / height;
        width = (width * coefficient).floor();
        height = bounds.height;
    }

    Ok(Dimensions { height, width })
}

fn is_positive(value: f64) -> bool {
    value.is_finite() && value > 0.0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fit(natural: (f64, f64), bounds: (f64, f64)) -> (f64, f64) {
        let fitted = fit_within(
            Dimensions::new(natural.0, natural.1),
            Dimensions::new(bounds.0, bounds.1),
        )
        .unwrap();
        (fitted.height, fitted.width)
    }

    #[test]
    fn leaves_small_images_untouched() {
        assert_eq!(fit((30.0, 40.0), (50.0, 50.0)), (30.0, 40.0));
        assert_eq!(fit((50.0, 50.0), (50.0, 50.0)), (50.0, 50.0));
    }

    #[test]
    fn clamps_width_and_scales_height() {
        assert_eq!(fit((100.0, 200.0), (50.0, 50.0)), (25.0, 50.0));
    }

    #[test]
    fn clamps_height_and_scales_width() {
        assert_eq!(fit((200.0, 100.0), (50.0, 50.0)), (50.0, 25.0));
    }

    #[test]
    fn applies_height_step_to_width_scaled_result() {
        // 300x200 -> width step gives 75x50 -> height step gives 50x33.
        assert_eq!(fit((300.0, 200.0), (50.0, 50.0)), (50.0, 33.0));
    }

    #[test]
    fn floors_derived_dimension() {
        assert_eq!(fit((101.0, 1000.0), (10.0, 100.0)), (10.0, 100.0));
        assert_eq!(fit((99.0, 70.0), (50.0, 500.0)), (50.0, 35.0));
    }

    #[test]
    fn never_exceeds_bounds() {
        let naturals = [(1.0, 1.0), (10.0, 999.0), (999.0, 10.0), (640.0, 480.0), (3.0, 7.0)];
        let bounds = [(50.0, 50.0), (20.0, 300.0), (300.0, 20.0), (1.0, 1.0)];
        for natural in naturals {
            for bound in bounds {
                let (height, width) = fit(natural, bound);
                assert!(height <= bound.0, "{natural:?} in {bound:?}");
                assert!(width <= bound.1, "{natural:?} in {bound:?}");
            }
        }
    }

    #[test]
    fn rejects_degenerate_images() {
        let err = fit_within(Dimensions::new(0.0, 10.0), DEFAULT_IMAGE_BOUNDS).unwrap_err();
        assert!(matches!(err, ComposeError::DegenerateImage { .. }));

        let err = fit_within(Dimensions::new(10.0, 0.0), DEFAULT_IMAGE_BOUNDS).unwrap_err();
        assert!(matches!(err, ComposeError::DegenerateImage { .. }));
    }

    #[test]
    fn rejects_non_positive_bounds() {
        let err = fit_within(Dimensions::new(10.0, 10.0), Dimensions::new(0.0, 50.0)).unwrap_err();
        assert!(matches!(err, ComposeError::InvalidBounds { .. }));

        let err =
            fit_within(Dimensions::new(10.0, 10.0), Dimensions::new(50.0, f64::NAN)).unwrap_err();
        assert!(matches!(err, ComposeError::InvalidBounds { .. }));
    }
}
