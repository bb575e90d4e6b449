mod model;
mod pipeline;

pub use model::{
    COUNTS_FIELD, CREATED_AT_FIELD, DataQuery, DataQueryRecord, KEY_FIELD, TOTAL_COUNT_FIELD,
};
pub use pipeline::{Pipeline, Stage};
