//! Mesh building over dense clouds.

use scan_engine::{EngineCloud, GeometryEngine};
use scan_types::Mesh;
use tracing::debug;

use crate::error::{PipelineError, PipelineResult};
use crate::store::DenseCloud;

/// Output of [`build_mesh`].
#[derive(Debug, Clone, PartialEq)]
pub struct MeshBuild {
    /// The source cloud with estimated normals, in source order.
    pub normals: EngineCloud,
    /// Faces over the source cloud.
    pub mesh: Mesh,
}

/// Estimates normals, reconstructs a surface and wraps the faces in a mesh
/// that references `name`.
///
/// # Errors
///
/// Returns an error if the engine is unavailable or fails, or if the engine
/// returns a face index the source cloud does not have.
pub fn build_mesh(
    engine: &dyn GeometryEngine,
    name: &str,
    cloud: &DenseCloud,
) -> PipelineResult<MeshBuild> {
    let source = cloud.to_engine_cloud();
    let normals = engine.estimate_normals(&source)?;
    let reconstruction = engine.reconstruct(&normals)?;
    debug!(cloud = name, %reconstruction, "surface reconstructed");

    let len = cloud.len();
    if let Some(&index) = reconstruction
        .faces
        .iter()
        .flatten()
        .find(|&&i| i as usize >= len)
    {
        return Err(PipelineError::MeshIndexOutOfRange { index, len });
    }

    Ok(MeshBuild {
        normals: reconstruction.cloud,
        mesh: Mesh::new(name, reconstruction.faces),
    })
}
