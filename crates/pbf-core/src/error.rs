use glam::Vec3;

/// Errors surfaced by the solver, colliders, and configuration loading.
#[derive(Debug)]
pub enum PbfError {
    /// The boundary surface could not produce a closest point for `query`.
    NoClosestPoint { query: Vec3 },
    /// The boundary surface answered with a non-finite point, normal, or distance.
    DegenerateSurface { query: Vec3 },
    /// Negative or non-finite time step.
    InvalidTimeStep(f32),
    /// Parameters failed validation or could not be parsed.
    InvalidConfig(String),
    /// Reading a configuration file failed.
    Io(std::io::Error),
}

impl std::fmt::Display for PbfError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PbfError::NoClosestPoint { query } => {
                write!(f, "no closest point on collider surface for {}", query)
            }
            PbfError::DegenerateSurface { query } => {
                write!(f, "collider surface query at {} returned non-finite data", query)
            }
            PbfError::InvalidTimeStep(dt) => write!(f, "invalid time step: {}", dt),
            PbfError::InvalidConfig(msg) => write!(f, "invalid configuration: {}", msg),
            PbfError::Io(e) => write!(f, "I/O error: {}", e),
        }
    }
}

impl std::error::Error for PbfError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            PbfError::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for PbfError {
    fn from(e: std::io::Error) -> Self {
        PbfError::Io(e)
    }
}
