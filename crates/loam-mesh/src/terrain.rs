use loam_geom::Vec3;
use loam_noise::HeightMap;

use crate::curve::HeightCurve;
use crate::mesh_build::{MeshData, TerrainMesh};

/// Grid cells skipped between sampled vertices at `lod`.
#[inline]
pub fn lod_stride(lod: u32) -> usize {
    if lod == 0 { 1 } else { lod as usize * 2 }
}

/// Interior vertices along one side for a bordered grid of `bordered` samples.
#[inline]
pub fn vertices_per_line(bordered: usize, lod: u32) -> usize {
    let s = lod_stride(lod);
    match bordered.checked_sub(2 * s + 1) {
        Some(span) => span / s + 1,
        None => 0,
    }
}

/// Builds the interior mesh of a bordered heightmap at `lod`.
///
/// The map is expected square with a one-sample rim on every side. Rim samples
/// only contribute to the normals of the interior vertices they touch.
pub fn build_terrain_mesh(
    map: &HeightMap,
    height_multiplier: f32,
    curve: &HeightCurve,
    lod: u32,
) -> TerrainMesh {
    let bordered = map.width().min(map.height());
    let step = lod_stride(lod);
    let per_line = vertices_per_line(bordered, lod);
    if per_line == 0 {
        return TerrainMesh {
            lod,
            ..TerrainMesh::default()
        };
    }

    let mesh_size = bordered - 2 * step;
    let unsimplified = bordered - 2;
    let top_left_x = (unsimplified as f32 - 1.0) / -2.0;
    let top_left_z = (unsimplified as f32 - 1.0) / 2.0;

    let mut index_map = vec![0i32; bordered * bordered];
    let mut interior_index = 0i32;
    let mut border_index = -1i32;
    for y in (0..bordered).step_by(step) {
        for x in (0..bordered).step_by(step) {
            let on_rim = x == 0 || y == 0 || x == bordered - 1 || y == bordered - 1;
            index_map[y * bordered + x] = if on_rim {
                border_index -= 1;
                border_index + 1
            } else {
                interior_index += 1;
                interior_index - 1
            };
        }
    }

    let mut data = MeshData::with_capacity(per_line);
    for y in (0..bordered).step_by(step) {
        for x in (0..bordered).step_by(step) {
            let index = index_map[y * bordered + x];
            let px = (x as f32 - step as f32) / mesh_size as f32;
            let py = (y as f32 - step as f32) / mesh_size as f32;
            let h = curve.evaluate(map.get(x, y)) * height_multiplier;
            let position = Vec3::new(
                top_left_x + px * unsimplified as f32,
                h,
                top_left_z - py * unsimplified as f32,
            );
            data.add_vertex(position, (px, py), index);

            if x + step < bordered && y + step < bordered {
                let a = index;
                let b = index_map[y * bordered + x + step];
                let c = index_map[(y + step) * bordered + x];
                let d = index_map[(y + step) * bordered + x + step];
                data.add_triangle(a, d, c);
                data.add_triangle(d, a, b);
            }
        }
    }

    data.finish(lod, per_line)
}
