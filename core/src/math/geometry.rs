pub struct GeometryHelper;

impl GeometryHelper {
    /// Maps `value` within `[0, extent]` onto a rounded 0..=100 grid.
    pub fn to_percent(value: f64, extent: f64) -> u8 {
        if extent <= 0.0 || !value.is_finite() {
            return 0;
        }
        ((value / extent) * 100.0).round().clamp(0.0, 100.0) as u8
    }

    /// Rescales a coordinate measured on one extent to another.
    pub fn rescale(value: f64, from_extent: f64, to_extent: f64) -> f64 {
        if from_extent <= 0.0 {
            return 0.0;
        }
        (value / from_extent) * to_extent
    }
}
