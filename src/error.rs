use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ChartError {
    #[error("Multiple rows for disaggregation value '{disaggregation}' and x axis value '{x_axis}'")]
    DuplicateCell {
        disaggregation: String,
        x_axis: String,
    },

    #[error("Unknown indicator: {0}")]
    UnknownIndicator(String),

    #[error("Unknown filter: {0}")]
    UnknownFilter(String),

    #[error("Unknown option '{option}' for filter '{filter}'")]
    UnknownOption { filter: String, option: String },

    #[error("Selections are not initialised")]
    Uninitialised,
}

pub type ChartResult<T> = std::result::Result<T, ChartError>;
