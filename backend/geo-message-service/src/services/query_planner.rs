/// Geo range query planner
///
/// The store accepts one range predicate per query, so a bounding box is
/// answered by pushing one coordinate to the store as a range and checking
/// the other in memory (the residual filter). Pages are ordered by
/// `(pushed coordinate, id)` and chained with a `start_after` cursor.
///
/// When latitude is pushed, scan order equals result order (latitude, id),
/// so the finder can stop once it holds `max_records` matches. When
/// longitude is pushed, the whole band must be scanned before the
/// latitude-ordered prefix is known.
use crate::config::{PushStrategy, RetrievalConfig};
use crate::db::{coordinate_cmp, CoordinateField, Cursor, SortKey, StoreQuery};
use crate::models::{BoundingBox, Message};

const LATITUDE_DOMAIN: f64 = 180.0;
const LONGITUDE_DOMAIN: f64 = 360.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Termination {
    /// Stop as soon as `max_records` residual matches are held
    StopWhenFilled,
    /// Scan the pushed band to exhaustion, then sort and truncate
    ExhaustBand,
}

#[derive(Debug, Clone)]
pub struct PlannerSettings {
    pub overfetch_factor: usize,
    pub max_page_size: usize,
    pub push_strategy: PushStrategy,
}

impl From<&RetrievalConfig> for PlannerSettings {
    fn from(cfg: &RetrievalConfig) -> Self {
        Self {
            overfetch_factor: cfg.overfetch_factor,
            max_page_size: cfg.max_page_size,
            push_strategy: cfg.push_strategy,
        }
    }
}

impl Default for PlannerSettings {
    fn default() -> Self {
        Self::from(&RetrievalConfig::default())
    }
}

/// Executable plan for one bounding-box retrieval
#[derive(Debug, Clone)]
pub struct GeoQueryPlan {
    bbox: BoundingBox,
    pushed: CoordinateField,
    page_size: usize,
    max_records: usize,
    termination: Termination,
}

impl GeoQueryPlan {
    pub fn pushed(&self) -> CoordinateField {
        self.pushed
    }

    pub fn residual(&self) -> CoordinateField {
        match self.pushed {
            CoordinateField::Latitude => CoordinateField::Longitude,
            CoordinateField::Longitude => CoordinateField::Latitude,
        }
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    pub fn max_records(&self) -> usize {
        self.max_records
    }

    pub fn termination(&self) -> Termination {
        self.termination
    }

    pub fn sort_key(&self) -> SortKey {
        SortKey::Coordinate(self.pushed)
    }

    /// Store query for the page following `after` (the first page when `None`).
    pub fn page_query(&self, after: Option<Cursor>) -> StoreQuery {
        let (lower, upper) = match self.pushed {
            CoordinateField::Latitude => (self.bbox.lat_bottom(), self.bbox.lat_top()),
            CoordinateField::Longitude => (self.bbox.lon_left(), self.bbox.lon_right()),
        };

        StoreQuery::new()
            .where_range(self.pushed, lower, upper)
            .order_by(self.sort_key())
            .start_after(after)
            .limit(self.page_size)
    }

    /// Residual check. Both edges are re-evaluated so a store returning
    /// rows outside the pushed range still cannot leak them.
    pub fn accepts(&self, message: &Message) -> bool {
        self.bbox.contains(message)
    }
}

#[derive(Debug, Clone, Default)]
pub struct GeoRangeQueryPlanner {
    settings: PlannerSettings,
}

impl GeoRangeQueryPlanner {
    pub fn new(settings: PlannerSettings) -> Self {
        Self { settings }
    }

    pub fn settings(&self) -> &PlannerSettings {
        &self.settings
    }

    /// `max_records` must already be validated as positive.
    pub fn plan(&self, bbox: &BoundingBox, max_records: usize) -> GeoQueryPlan {
        let pushed = choose_pushed_dimension(self.settings.push_strategy, bbox);
        let termination = match pushed {
            CoordinateField::Latitude => Termination::StopWhenFilled,
            CoordinateField::Longitude => Termination::ExhaustBand,
        };

        GeoQueryPlan {
            bbox: *bbox,
            pushed,
            page_size: page_size(
                max_records,
                self.settings.overfetch_factor,
                self.settings.max_page_size,
            ),
            max_records,
            termination,
        }
    }
}

/// Deterministic choice of the dimension sent to the store.
///
/// `Tightest` compares each span as a share of its domain (180° for
/// latitude, 360° for longitude); ties go to latitude.
pub fn choose_pushed_dimension(strategy: PushStrategy, bbox: &BoundingBox) -> CoordinateField {
    match strategy {
        PushStrategy::Latitude => CoordinateField::Latitude,
        PushStrategy::Tightest => {
            let lat_share = bbox.latitude_span() / LATITUDE_DOMAIN;
            let lon_share = bbox.longitude_span() / LONGITUDE_DOMAIN;
            if lon_share < lat_share {
                CoordinateField::Longitude
            } else {
                CoordinateField::Latitude
            }
        }
    }
}

/// `max_records * overfetch_factor`, clamped to `[max_records, max(max_page_size, max_records)]`.
pub fn page_size(max_records: usize, overfetch_factor: usize, max_page_size: usize) -> usize {
    let ceiling = max_page_size.max(max_records).max(1);
    max_records
        .saturating_mul(overfetch_factor.max(1))
        .clamp(max_records.max(1), ceiling)
}

/// Final result order: latitude ascending, then id ascending.
pub fn sort_by_latitude_then_id(messages: &mut [Message]) {
    messages.sort_by(|a, b| {
        coordinate_cmp(a.latitude, b.latitude).then_with(|| a.id.cmp(&b.id))
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    fn planner(strategy: PushStrategy) -> GeoRangeQueryPlanner {
        GeoRangeQueryPlanner::new(PlannerSettings {
            overfetch_factor: 4,
            max_page_size: 100,
            push_strategy: strategy,
        })
    }

    fn message(id: &str, latitude: f64, longitude: f64) -> Message {
        Message {
            id: id.to_string(),
            user_id: "u".to_string(),
            text: String::new(),
            image_url: String::new(),
            latitude,
            longitude,
        }
    }

    #[test]
    fn latitude_strategy_pushes_latitude_range() {
        let bbox = BoundingBox::new(5.0, 15.0, -170.0, 170.0).unwrap();
        let plan = planner(PushStrategy::Latitude).plan(&bbox, 10);

        assert_eq!(plan.pushed(), CoordinateField::Latitude);
        assert_eq!(plan.residual(), CoordinateField::Longitude);
        assert_eq!(plan.termination(), Termination::StopWhenFilled);
        assert_eq!(plan.page_size(), 40);

        let query = plan.page_query(None);
        let range = query.range.unwrap();
        assert_eq!(range.field, CoordinateField::Latitude);
        assert_eq!((range.lower, range.upper), (5.0, 15.0));
        assert_eq!(query.order_by, SortKey::Coordinate(CoordinateField::Latitude));
        assert_eq!(query.limit, Some(40));
        assert!(query.equals.is_empty());
        assert!(query.start_after.is_none());
    }

    #[test]
    fn tightest_strategy_pushes_narrow_longitude() {
        // 10% of latitude domain vs ~0.3% of longitude domain.
        let bbox = BoundingBox::new(0.0, 18.0, 10.0, 11.0).unwrap();
        let plan = planner(PushStrategy::Tightest).plan(&bbox, 5);

        assert_eq!(plan.pushed(), CoordinateField::Longitude);
        assert_eq!(plan.termination(), Termination::ExhaustBand);
        let range = plan.page_query(None).range.unwrap();
        assert_eq!((range.lower, range.upper), (10.0, 11.0));
    }

    #[test]
    fn tightest_strategy_breaks_ties_towards_latitude() {
        // 10/180 == 20/360
        let bbox = BoundingBox::new(0.0, 10.0, 0.0, 20.0).unwrap();
        assert_eq!(
            choose_pushed_dimension(PushStrategy::Tightest, &bbox),
            CoordinateField::Latitude
        );
    }

    #[test]
    fn page_size_is_clamped() {
        assert_eq!(page_size(10, 4, 1000), 40);
        assert_eq!(page_size(500, 4, 1000), 1000);
        // never below max_records even if the page cap is smaller
        assert_eq!(page_size(50, 4, 20), 50);
        assert_eq!(page_size(3, 0, 1000), 3);
        assert_eq!(page_size(usize::MAX, 4, 10), usize::MAX);
    }

    #[test]
    fn page_query_carries_cursor() {
        let bbox = BoundingBox::new(0.0, 1.0, 0.0, 1.0).unwrap();
        let plan = planner(PushStrategy::Latitude).plan(&bbox, 1);
        let last = message("m9", 0.5, 0.5);

        let query = plan.page_query(Some(Cursor::after(&last, plan.sort_key())));
        assert_eq!(
            query.start_after,
            Some(Cursor {
                value: 0.5,
                id: "m9".to_string()
            })
        );
    }

    #[test]
    fn accepts_checks_both_dimensions() {
        let bbox = BoundingBox::new(5.0, 15.0, 5.0, 15.0).unwrap();
        let plan = planner(PushStrategy::Latitude).plan(&bbox, 10);

        assert!(plan.accepts(&message("a", 10.0, 10.0)));
        assert!(!plan.accepts(&message("b", 10.0, 20.0)));
        assert!(!plan.accepts(&message("c", 20.0, 10.0)));
    }

    #[test]
    fn sorts_by_latitude_then_id() {
        let mut messages = vec![
            message("b", 10.0, 0.0),
            message("c", -1.0, 0.0),
            message("a", 10.0, 5.0),
        ];
        sort_by_latitude_then_id(&mut messages);
        let ids: Vec<&str> = messages.iter().map(|m| m.id.as_str()).collect();
        assert_eq!(ids, vec!["c", "a", "b"]);
    }

    #[test]
    fn signed_zero_latitudes_tie_break_by_id() {
        let mut messages = vec![message("b", -0.0, 1.0), message("a", 0.0, 1.0)];
        sort_by_latitude_then_id(&mut messages);
        assert_eq!(messages[0].id, "a");
        assert_eq!(messages[1].id, "b");
    }
}
