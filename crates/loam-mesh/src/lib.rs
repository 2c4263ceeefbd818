//! CPU terrain meshing: bordered heightmaps to LOD meshes with seam-safe normals.
#![forbid(unsafe_code)]

mod curve;
mod mesh_build;
mod terrain;

pub use curve::HeightCurve;
pub use mesh_build::TerrainMesh;
pub use terrain::{build_terrain_mesh, lod_stride, vertices_per_line};
