use mf_spatial::SpatialError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DeviceError {
    #[error("road network has {nodes} node(s); route following needs at least 2")]
    NetworkTooSmall { nodes: usize },

    #[error("invalid device parameters: {0}")]
    InvalidParams(String),

    #[error("routing failed: {0}")]
    Routing(#[from] SpatialError),
}

pub type DeviceResult<T> = Result<T, DeviceError>;
