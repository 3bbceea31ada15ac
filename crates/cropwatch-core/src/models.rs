pub mod geometry;
pub mod job;
pub mod search;

pub use geometry::{LngLat, Polygon, ShapeId};
pub use job::{
    AnalysisRequest, DateRange, JobId, JobSnapshot, JobStatus, Prediction, SubmitResponse,
    TimeSeriesPoint,
};
pub use search::{MapView, Overlay, PlaceKind, SearchCandidate, ZoomLevels};
