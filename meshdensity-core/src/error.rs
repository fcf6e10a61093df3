//! Error types for meshdensity

use crate::mesh::MeshSummary;
use thiserror::Error;

/// Main error type for density analysis and reduction.
///
/// Every mesh-related variant carries the [`MeshSummary`] of the mesh that
/// triggered it so callers can report what was being processed.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    /// Density cannot be defined: no triangles, or zero area/volume.
    #[error("Degenerate mesh ({mesh}): {reason}")]
    DegenerateMesh { mesh: MeshSummary, reason: String },

    #[error("Invalid parameter `{name}` = {value} ({mesh}): expected {expected}")]
    InvalidParameter {
        name: &'static str,
        value: f64,
        expected: &'static str,
        mesh: MeshSummary,
    },

    /// Too few vertices to perform any edge collapse.
    #[error("Insufficient geometry ({mesh}): at least {required} vertices required")]
    InsufficientGeometry { mesh: MeshSummary, required: usize },

    #[error("Face {face} references vertex {index}, out of range ({mesh})")]
    IndexOutOfRange {
        face: usize,
        index: usize,
        mesh: MeshSummary,
    },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl Error {
    pub fn degenerate(mesh: MeshSummary, reason: impl Into<String>) -> Self {
        Error::DegenerateMesh {
            mesh,
            reason: reason.into(),
        }
    }

    pub fn invalid_parameter(
        name: &'static str,
        value: f64,
        expected: &'static str,
        mesh: MeshSummary,
    ) -> Self {
        Error::InvalidParameter {
            name,
            value,
            expected,
            mesh,
        }
    }

    /// The mesh summary attached to this error, if any.
    pub fn mesh_summary(&self) -> Option<MeshSummary> {
        match self {
            Error::DegenerateMesh { mesh, .. }
            | Error::InvalidParameter { mesh, .. }
            | Error::InsufficientGeometry { mesh, .. }
            | Error::IndexOutOfRange { mesh, .. } => Some(*mesh),
            Error::InvalidConfig(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_carries_summary() {
        let mesh = MeshSummary {
            vertices: 3,
            triangles: 1,
        };
        let err = Error::InsufficientGeometry { mesh, required: 4 };
        let text = err.to_string();
        assert!(text.contains("3 vertices, 1 triangles"));
        assert!(text.contains("at least 4"));
        assert_eq!(err.mesh_summary(), Some(mesh));
    }

    #[test]
    fn test_invalid_parameter_display() {
        let err = Error::invalid_parameter(
            "target_ratio",
            1.5,
            "a value in (0, 1]",
            MeshSummary::default(),
        );
        assert!(err.to_string().contains("target_ratio"));
        assert!(err.to_string().contains("1.5"));
    }

    #[test]
    fn test_config_error_has_no_summary() {
        assert_eq!(Error::InvalidConfig("x".into()).mesh_summary(), None);
    }
}
