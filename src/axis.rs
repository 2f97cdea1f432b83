//! Selected interval along a single array axis.

use std::num::IntErrorKind;

use crate::error::AxisError;

/// Inclusive `lower..=upper` selection along one axis of size `size`.
///
/// Both bounds always lie in `[0, size - 1]`. They are clamped independently,
/// so `lower > upper` is representable and yields an empty half-open range.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AxisRange {
    index: usize,
    size: usize,
    name: String,
    lower: usize,
    upper: usize,
}

pub fn default_axis_name(index: usize) -> String {
    format!("Axis {index}")
}

impl AxisRange {
    pub fn create(index: usize, size: usize, name: Option<&str>) -> Result<Self, AxisError> {
        if size == 0 {
            return Err(AxisError::ZeroSize { index });
        }
        let name = match name {
            Some(name) if !name.is_empty() => name.to_owned(),
            _ => default_axis_name(index),
        };
        Ok(Self {
            index,
            size,
            name,
            lower: 0,
            upper: size - 1,
        })
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn lower(&self) -> usize {
        self.lower
    }

    pub fn upper(&self) -> usize {
        self.upper
    }

    pub fn bounds(&self) -> (usize, usize) {
        (self.lower, self.upper)
    }

    fn max_index(&self) -> usize {
        self.size - 1
    }

    fn clamp(&self, value: i64) -> usize {
        if value <= 0 {
            0
        } else {
            (value as u64).min(self.max_index() as u64) as usize
        }
    }

    /// Parse the two text fields of the axis.
    ///
    /// An empty field selects that side's default. A field that does not parse
    /// as an integer also falls back to that side's default, leaving the other
    /// side alone.
    pub fn set_bounds(&mut self, lower_text: &str, upper_text: &str) {
        let lower = parse_side(lower_text).unwrap_or(0);
        let upper = parse_side(upper_text).unwrap_or(self.max_index() as i64);
        self.set_clamped(lower, upper);
    }

    /// Clamp each side into `[0, size - 1]` and store it. `lower <= upper`
    /// is not enforced.
    pub fn set_clamped(&mut self, lower: i64, upper: i64) {
        self.lower = self.clamp(lower);
        self.upper = self.clamp(upper);
    }

    pub fn reset(&mut self) {
        self.lower = 0;
        self.upper = self.max_index();
    }

    pub fn resize(&mut self, new_size: usize, new_name: Option<&str>) -> Result<(), AxisError> {
        if new_size == 0 {
            return Err(AxisError::ZeroSize { index: self.index });
        }
        self.size = new_size;
        if let Some(name) = new_name.filter(|n| !n.is_empty()) {
            self.name = name.to_owned();
        }
        self.reset();
        Ok(())
    }

    pub fn to_half_open_range(&self) -> (usize, usize) {
        (self.lower, self.upper + 1)
    }

    pub fn is_spatial(&self) -> bool {
        self.size > 1
    }
}

fn parse_side(text: &str) -> Option<i64> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }
    match text.parse::<i64>() {
        Ok(value) => Some(value),
        // out of range still means "past that end"
        Err(e) => match e.kind() {
            IntErrorKind::PosOverflow => Some(i64::MAX),
            IntErrorKind::NegOverflow => Some(i64::MIN),
            _ => None,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_axis_spans_full_extent() {
        for size in [1, 2, 7, 1000] {
            let axis = AxisRange::create(0, size, None).unwrap();
            assert_eq!(axis.bounds(), (0, size - 1));
        }
    }

    #[test]
    fn zero_size_is_rejected() {
        assert_eq!(
            AxisRange::create(3, 0, None),
            Err(AxisError::ZeroSize { index: 3 })
        );
    }

    #[test]
    fn default_name() {
        assert_eq!(AxisRange::create(2, 5, None).unwrap().name(), "Axis 2");
        assert_eq!(AxisRange::create(2, 5, Some("")).unwrap().name(), "Axis 2");
        assert_eq!(AxisRange::create(2, 5, Some("t")).unwrap().name(), "t");
    }

    #[test]
    fn valid_bounds_round_trip() {
        let mut axis = AxisRange::create(0, 10, None).unwrap();
        for (lo, hi) in [(0, 0), (0, 9), (3, 7), (9, 9)] {
            axis.set_bounds(&lo.to_string(), &hi.to_string());
            assert_eq!(axis.to_half_open_range(), (lo, hi + 1));
        }
    }

    #[test]
    fn bounds_are_clamped() {
        let mut axis = AxisRange::create(0, 10, None).unwrap();
        axis.set_bounds("-4", "250");
        assert_eq!(axis.bounds(), (0, 9));
        axis.set_bounds("42", "-1");
        assert_eq!(axis.bounds(), (9, 0));
    }

    #[test]
    fn out_of_range_numbers_clamp() {
        let mut axis = AxisRange::create(0, 10, None).unwrap();
        axis.set_bounds("99999999999999999999", "-99999999999999999999");
        assert_eq!(axis.bounds(), (9, 0));
    }

    #[test]
    fn invalid_text_resets_only_that_side() {
        let mut axis = AxisRange::create(0, 10, None).unwrap();
        axis.set_bounds("abc", "5");
        assert_eq!(axis.bounds(), (0, 5));
        axis.set_bounds("3", "1.5");
        assert_eq!(axis.bounds(), (3, 9));
        axis.set_bounds("", "");
        assert_eq!(axis.bounds(), (0, 9));
        axis.set_bounds(" 2 ", " 4");
        assert_eq!(axis.bounds(), (2, 4));
    }

    #[test]
    fn lower_above_upper_is_kept() {
        let mut axis = AxisRange::create(0, 10, None).unwrap();
        axis.set_bounds("6", "2");
        assert_eq!(axis.bounds(), (6, 2));
        assert_eq!(axis.to_half_open_range(), (6, 3));
    }

    #[test]
    fn reset_is_idempotent() {
        let mut axis = AxisRange::create(0, 8, None).unwrap();
        axis.set_bounds("2", "3");
        axis.reset();
        let once = axis.clone();
        axis.reset();
        assert_eq!(axis, once);
        assert_eq!(axis.bounds(), (0, 7));
    }

    #[test]
    fn resize_resets_bounds() {
        let mut axis = AxisRange::create(1, 8, Some("y")).unwrap();
        axis.set_bounds("2", "3");
        axis.resize(20, None).unwrap();
        assert_eq!(axis.bounds(), (0, 19));
        assert_eq!(axis.name(), "y");
        axis.resize(4, Some("rows")).unwrap();
        assert_eq!((axis.size(), axis.name()), (4, "rows"));
        assert!(axis.resize(0, None).is_err());
    }

    #[test]
    fn spatial_means_more_than_one_position() {
        assert!(!AxisRange::create(0, 1, None).unwrap().is_spatial());
        assert!(AxisRange::create(0, 2, None).unwrap().is_spatial());
    }
}
