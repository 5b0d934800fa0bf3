/// Largest size with the same aspect ratio that fits inside `max_width` x
/// `max_height`. Never upscales and never returns a zero dimension.
pub fn fit_within(width: u32, height: u32, max_width: u32, max_height: u32) -> (u32, u32) {
    if width == 0 || height == 0 {
        return (width.max(1), height.max(1));
    }
    if width <= max_width && height <= max_height {
        return (width, height);
    }
    let scale = f64::min(
        max_width as f64 / width as f64,
        max_height as f64 / height as f64,
    );
    let fitted_width = ((width as f64 * scale).round() as u32).max(1);
    let fitted_height = ((height as f64 * scale).round() as u32).max(1);
    (fitted_width, fitted_height)
}

/// Height that keeps the aspect ratio when scaling to `target_width`.
pub fn height_for_width(width: u32, height: u32, target_width: u32) -> u32 {
    if width == 0 {
        return height.max(1);
    }
    ((height as f64 * target_width as f64 / width as f64).round() as u32).max(1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fits_landscape_and_portrait() {
        assert_eq!(fit_within(4000, 3000, 200, 200), (200, 150));
        assert_eq!(fit_within(3000, 4000, 200, 200), (150, 200));
        assert_eq!(fit_within(1000, 100, 300, 300), (300, 30));
    }

    #[test]
    fn never_upscales() {
        assert_eq!(fit_within(100, 50, 800, 800), (100, 50));
    }

    #[test]
    fn extreme_ratios_keep_one_pixel() {
        assert_eq!(fit_within(10000, 1, 100, 100), (100, 1));
    }

    #[test]
    fn responsive_height_tracks_width() {
        assert_eq!(height_for_width(1600, 900, 320), 180);
    }
}
