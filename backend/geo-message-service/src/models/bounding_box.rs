/// Query-time latitude/longitude rectangle (WGS84 degrees).
///
/// Only constructible through [`BoundingBox::new`], so every value in
/// circulation has already passed validation.
use crate::error::ValidationError;
use crate::models::Message;

pub const LATITUDE_RANGE: std::ops::RangeInclusive<f64> = -90.0..=90.0;
pub const LONGITUDE_RANGE: std::ops::RangeInclusive<f64> = -180.0..=180.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    lat_bottom: f64,
    lat_top: f64,
    lon_left: f64,
    lon_right: f64,
}

impl BoundingBox {
    /// Validate the four edges and build a box.
    ///
    /// Checks run in a fixed order (latitude ranges, longitude ranges,
    /// latitude ordering, longitude ordering) and the first failure is
    /// returned. NaN never satisfies a range check.
    pub fn new(
        lat_bottom: f64,
        lat_top: f64,
        lon_left: f64,
        lon_right: f64,
    ) -> Result<Self, ValidationError> {
        if !LATITUDE_RANGE.contains(&lat_bottom) {
            return Err(ValidationError::InvalidLatitudeBottom);
        }
        if !LATITUDE_RANGE.contains(&lat_top) {
            return Err(ValidationError::InvalidLatitudeTop);
        }
        if !LONGITUDE_RANGE.contains(&lon_left) {
            return Err(ValidationError::InvalidLongitudeLeft);
        }
        if !LONGITUDE_RANGE.contains(&lon_right) {
            return Err(ValidationError::InvalidLongitudeRight);
        }
        if lat_bottom > lat_top {
            return Err(ValidationError::InvertedLatitude);
        }
        if lon_left > lon_right {
            return Err(ValidationError::AntimeridianCrossing);
        }

        Ok(Self {
            lat_bottom,
            lat_top,
            lon_left,
            lon_right,
        })
    }

    pub fn lat_bottom(&self) -> f64 {
        self.lat_bottom
    }

    pub fn lat_top(&self) -> f64 {
        self.lat_top
    }

    pub fn lon_left(&self) -> f64 {
        self.lon_left
    }

    pub fn lon_right(&self) -> f64 {
        self.lon_right
    }

    pub fn latitude_span(&self) -> f64 {
        self.lat_top - self.lat_bottom
    }

    pub fn longitude_span(&self) -> f64 {
        self.lon_right - self.lon_left
    }

    pub fn contains_latitude(&self, latitude: f64) -> bool {
        (self.lat_bottom..=self.lat_top).contains(&latitude)
    }

    pub fn contains_longitude(&self, longitude: f64) -> bool {
        (self.lon_left..=self.lon_right).contains(&longitude)
    }

    /// Edges are inclusive on all four sides.
    pub fn contains(&self, message: &Message) -> bool {
        self.contains_latitude(message.latitude) && self.contains_longitude(message.longitude)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn message_at(latitude: f64, longitude: f64) -> Message {
        Message {
            id: "m1".to_string(),
            user_id: "u1".to_string(),
            text: String::new(),
            image_url: String::new(),
            latitude,
            longitude,
        }
    }

    #[test]
    fn accepts_valid_box() {
        let bbox = BoundingBox::new(5.0, 15.0, 5.0, 15.0).unwrap();
        assert_eq!(bbox.lat_bottom(), 5.0);
        assert_eq!(bbox.lat_top(), 15.0);
        assert_eq!(bbox.lon_left(), 5.0);
        assert_eq!(bbox.lon_right(), 15.0);
    }

    #[test]
    fn rejects_inverted_latitude() {
        assert_eq!(
            BoundingBox::new(50.0, 10.0, 0.0, 1.0),
            Err(ValidationError::InvertedLatitude)
        );
    }

    #[test]
    fn rejects_antimeridian_crossing() {
        assert_eq!(
            BoundingBox::new(0.0, 1.0, 170.0, -170.0),
            Err(ValidationError::AntimeridianCrossing)
        );
    }

    #[test]
    fn rejects_out_of_range_top() {
        assert_eq!(
            BoundingBox::new(0.0, 95.0, 0.0, 1.0),
            Err(ValidationError::InvalidLatitudeTop)
        );
    }

    #[test]
    fn reports_first_failure_in_check_order() {
        // Out-of-range longitude wins over the inverted latitude checked later.
        assert_eq!(
            BoundingBox::new(50.0, 10.0, -181.0, 0.0),
            Err(ValidationError::InvalidLongitudeLeft)
        );
        assert_eq!(
            BoundingBox::new(-91.0, 95.0, 0.0, 0.0),
            Err(ValidationError::InvalidLatitudeBottom)
        );
        assert_eq!(
            BoundingBox::new(0.0, 0.0, 0.0, 180.5),
            Err(ValidationError::InvalidLongitudeRight)
        );
    }

    #[test]
    fn rejects_nan() {
        assert_eq!(
            BoundingBox::new(f64::NAN, 10.0, 0.0, 1.0),
            Err(ValidationError::InvalidLatitudeBottom)
        );
    }

    #[test]
    fn degenerate_box_is_legal_and_inclusive() {
        let point = BoundingBox::new(10.0, 10.0, 20.0, 20.0).unwrap();
        assert!(point.contains(&message_at(10.0, 20.0)));
        assert!(!point.contains(&message_at(10.0, 20.000001)));
        assert_eq!(point.latitude_span(), 0.0);
    }

    #[test]
    fn full_globe_box_contains_poles_and_antimeridian() {
        let globe = BoundingBox::new(-90.0, 90.0, -180.0, 180.0).unwrap();
        assert!(globe.contains(&message_at(90.0, 180.0)));
        assert!(globe.contains(&message_at(-90.0, -180.0)));
    }
}
