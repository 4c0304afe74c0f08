#[derive(Debug, Clone, PartialEq)]
pub enum GeometryError {
    EmptyPath,
    NonFiniteCoordinate { index: usize },
    DegenerateRing { points: usize },
    Triangulation,
}

impl std::fmt::Display for GeometryError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GeometryError::EmptyPath => write!(f, "path has no points"),
            GeometryError::NonFiniteCoordinate { index } => {
                write!(f, "coordinate {index} is not finite")
            }
            GeometryError::DegenerateRing { points } => {
                write!(f, "ring needs at least 3 distinct points, got {points}")
            }
            GeometryError::Triangulation => write!(f, "triangulation failed"),
        }
    }
}

impl std::error::Error for GeometryError {}
