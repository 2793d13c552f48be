/// Business logic layer
///
/// - `query_planner`: turns a bounding box into single-range store queries
/// - `message_finder`: bounding-box and per-user retrieval
/// - `message_editor`: create/update/delete of a user's messages
pub mod message_editor;
pub mod message_finder;
pub mod query_planner;

pub use message_editor::MessageEditor;
pub use message_finder::{FinderError, FinderSettings, MessageFinder};
pub use query_planner::{GeoQueryPlan, GeoRangeQueryPlanner, PlannerSettings, Termination};
