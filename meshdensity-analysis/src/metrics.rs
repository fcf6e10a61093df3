//! Geometric metrics of a triangle mesh
//!
//! Volume uses the signed-tetrahedron decomposition (divergence theorem): each
//! face `(a, b, c)` contributes `a · (b × c) / 6` and the absolute value of the
//! sum is the enclosed volume. The result is exact for closed, consistently
//! wound manifolds only; other input is measured anyway, with a warning.

use crate::manifold::ManifoldDiagnostics;
use meshdensity_core::{Error, Result, TriangleMesh};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Density above which a mesh is reported as high density, in triangles/mm³.
pub const HIGH_DENSITY_THRESHOLD: f64 = 10.0;

/// Relative volume floor: a mesh whose volume is at or below
/// `VOLUME_EPSILON * area^1.5` encloses nothing measurable.
pub const VOLUME_EPSILON: f64 = 1e-9;

/// Normalisation making the per-face aspect ratio exactly 1.0 for an
/// equilateral triangle (`longest / (2 * inradius)` is `sqrt(3)` there).
const EQUILATERAL_ASPECT: f64 = 1.732_050_807_568_877_2;

/// Measured geometry of a mesh. Derived entirely from the mesh; never mutated.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeometryMetrics {
    pub triangle_count: usize,
    /// Enclosed volume in mm³
    pub volume: f64,
    /// Surface area in mm²
    pub surface_area: f64,
    /// Mean length of the three edges of every face; shared edges count twice
    pub avg_edge_length: f64,
    /// Mean per-face aspect ratio, 1.0 for equilateral triangles
    pub aspect_ratio: f64,
    /// Triangles per mm³
    pub density: f64,
    pub is_high_density: bool,
}

impl GeometryMetrics {
    /// `detect` report rows, rounded the way they are displayed.
    pub fn report_lines(&self) -> Vec<(&'static str, String)> {
        vec![
            ("triangle_count", self.triangle_count.to_string()),
            ("density_triangles_per_mm3", round_to(self.density, 4).to_string()),
            ("avg_edge_length", round_to(self.avg_edge_length, 4).to_string()),
            ("aspect_ratio", round_to(self.aspect_ratio, 4).to_string()),
            ("volume", round_to(self.volume, 2).to_string()),
            ("surface_area", round_to(self.surface_area, 2).to_string()),
            ("is_high_density", self.is_high_density.to_string()),
        ]
    }
}

/// Round `value` to `decimals` places for display.
pub fn round_to(value: f64, decimals: i32) -> f64 {
    let scale = 10f64.powi(decimals);
    (value * scale).round() / scale
}

/// Compute [`GeometryMetrics`] for `mesh`.
///
/// # Errors
/// - [`Error::IndexOutOfRange`] if a face references a missing vertex
/// - [`Error::DegenerateMesh`] if the mesh has no triangles, no surface area,
///   or encloses no volume (flat or open sheet), since density is undefined
#[tracing::instrument(skip_all, fields(faces = mesh.face_count(), vertices = mesh.vertex_count()))]
pub fn compute_metrics(mesh: &TriangleMesh) -> Result<GeometryMetrics> {
    mesh.validate()?;
    if mesh.faces.is_empty() {
        return Err(Error::degenerate(mesh.summary(), "mesh has no triangles"));
    }

    let mut triple_products = 0.0f64;
    let mut surface_area = 0.0f64;
    let mut edge_length_sum = 0.0f64;
    let mut aspect_sum = 0.0f64;
    let mut aspect_faces = 0usize;

    for [a, b, c] in mesh.triangles() {
        // Six times the signed tetrahedron volume
        triple_products += a.coords.dot(&b.coords.cross(&c.coords));

        let area = 0.5 * (b - a).cross(&(c - a)).norm();
        surface_area += area;

        let lengths = [(b - a).norm(), (c - b).norm(), (a - c).norm()];
        let perimeter: f64 = lengths.iter().sum();
        edge_length_sum += perimeter;

        // longest / (2 * inradius), with inradius = area / semi-perimeter
        if area > 0.0 {
            let longest = lengths.iter().copied().fold(0.0f64, f64::max);
            aspect_sum += longest * (0.5 * perimeter) / (2.0 * area) / EQUILATERAL_ASPECT;
            aspect_faces += 1;
        }
    }

    let diagnostics = ManifoldDiagnostics::analyze(mesh);
    if !diagnostics.is_closed_manifold() {
        warn!(
            boundary_edges = diagnostics.boundary_edges,
            non_manifold_edges = diagnostics.non_manifold_edges,
            inconsistent_edges = diagnostics.inconsistent_edges,
            "Mesh is not a closed consistently wound manifold ({}); volume may be unreliable",
            diagnostics
        );
    }

    if !(surface_area > 0.0) || !surface_area.is_finite() {
        return Err(Error::degenerate(mesh.summary(), "mesh has zero surface area"));
    }
    let volume = triple_products.abs() / 6.0;
    if !(volume > VOLUME_EPSILON * surface_area.powf(1.5)) || !volume.is_finite() {
        return Err(Error::degenerate(
            mesh.summary(),
            "mesh encloses no volume (flat or open surface)",
        ));
    }

    let triangle_count = mesh.faces.len();
    let density = triangle_count as f64 / volume;
    let metrics = GeometryMetrics {
        triangle_count,
        volume,
        surface_area,
        avg_edge_length: edge_length_sum / (3 * triangle_count) as f64,
        aspect_ratio: if aspect_faces > 0 {
            aspect_sum / aspect_faces as f64
        } else {
            1.0
        },
        density,
        is_high_density: density > HIGH_DENSITY_THRESHOLD,
    };

    debug!(
        volume = metrics.volume,
        surface_area = metrics.surface_area,
        density = metrics.density,
        "Computed mesh metrics"
    );
    Ok(metrics)
}
