use thiserror::Error;

use crate::api::Category;

#[derive(Error, Debug)]
pub enum HueError {
    /* mapped errors */
    #[error(transparent)]
    SerdeJson(#[from] serde_json::Error),

    /* hue api errors */
    #[error("Resource {0} not found")]
    NotFound(String),

    #[error("Resource {id} is a {found:?}, expected {expected:?}")]
    WrongType {
        id: String,
        expected: Category,
        found: Category,
    },

    #[error("Group {0} has no grouped_light service")]
    NoGroupedLight(String),

    #[error("Light {0} does not support gradients")]
    NoGradient(String),

    #[error("Gradient point {point} out of range (light {id} has {capable} points)")]
    GradientPointOutOfRange { id: String, point: u32, capable: u32 },

    #[error("Resource {0} cannot take this command")]
    Unsupported(String),
}

pub type HueResult<T> = Result<T, HueError>;
