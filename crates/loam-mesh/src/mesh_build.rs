use loam_geom::Vec3;

/// Finished chunk mesh at one LOD.
///
/// `pos`/`norm`/`uv`/`idx` are the rendered interior. `border_pos` and
/// `border_idx` are the rim ring kept for normal computation only; border
/// indices are signed, `-1 - i` naming `border_pos[i]`.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TerrainMesh {
    pub lod: u32,
    pub vertices_per_line: usize,
    pub pos: Vec<f32>,
    pub norm: Vec<f32>,
    pub uv: Vec<f32>,
    pub idx: Vec<u32>,
    pub border_pos: Vec<f32>,
    pub border_idx: Vec<i32>,
}

impl TerrainMesh {
    #[inline]
    pub fn vertex_count(&self) -> usize {
        self.pos.len() / 3
    }

    #[inline]
    pub fn triangle_count(&self) -> usize {
        self.idx.len() / 3
    }

    #[inline]
    pub fn border_vertex_count(&self) -> usize {
        self.border_pos.len() / 3
    }

    #[inline]
    pub fn position(&self, i: usize) -> Vec3 {
        Vec3::new(self.pos[i * 3], self.pos[i * 3 + 1], self.pos[i * 3 + 2])
    }

    #[inline]
    pub fn normal(&self, i: usize) -> Vec3 {
        Vec3::new(self.norm[i * 3], self.norm[i * 3 + 1], self.norm[i * 3 + 2])
    }

    #[inline]
    pub fn uv_at(&self, i: usize) -> (f32, f32) {
        (self.uv[i * 2], self.uv[i * 2 + 1])
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.pos.is_empty()
    }
}

/// Accumulates interior and rim geometry in one signed index space.
pub(crate) struct MeshData {
    vertices: Vec<Vec3>,
    uvs: Vec<(f32, f32)>,
    triangles: Vec<u32>,
    border_vertices: Vec<Vec3>,
    border_triangles: Vec<i32>,
}

impl MeshData {
    pub(crate) fn with_capacity(vertices_per_line: usize) -> Self {
        let n = vertices_per_line;
        let quads = n.saturating_sub(1) * n.saturating_sub(1);
        Self {
            vertices: vec![Vec3::ZERO; n * n],
            uvs: vec![(0.0, 0.0); n * n],
            triangles: Vec::with_capacity(quads * 6),
            border_vertices: vec![Vec3::ZERO; n * 4 + 4],
            border_triangles: Vec::with_capacity(24 * n),
        }
    }

    pub(crate) fn add_vertex(&mut self, position: Vec3, uv: (f32, f32), index: i32) {
        if index < 0 {
            let slot = (-index - 1) as usize;
            if slot >= self.border_vertices.len() {
                self.border_vertices.resize(slot + 1, Vec3::ZERO);
            }
            self.border_vertices[slot] = position;
        } else {
            let slot = index as usize;
            if slot >= self.vertices.len() {
                self.vertices.resize(slot + 1, Vec3::ZERO);
                self.uvs.resize(slot + 1, (0.0, 0.0));
            }
            self.vertices[slot] = position;
            self.uvs[slot] = uv;
        }
    }

    pub(crate) fn add_triangle(&mut self, a: i32, b: i32, c: i32) {
        if a < 0 || b < 0 || c < 0 {
            self.border_triangles.extend_from_slice(&[a, b, c]);
        } else {
            self.triangles
                .extend_from_slice(&[a as u32, b as u32, c as u32]);
        }
    }

    #[inline]
    fn point(&self, index: i32) -> Vec3 {
        if index < 0 {
            self.border_vertices[(-index - 1) as usize]
        } else {
            self.vertices[index as usize]
        }
    }

    /// Area-weighted face normal: the raw cross product, not normalized.
    #[inline]
    fn face_normal(&self, a: i32, b: i32, c: i32) -> Vec3 {
        let pa = self.point(a);
        (self.point(b) - pa).cross(self.point(c) - pa)
    }

    fn bake_normals(&self) -> Vec<Vec3> {
        let mut normals = vec![Vec3::ZERO; self.vertices.len()];
        for tri in self.triangles.chunks_exact(3) {
            let (a, b, c) = (tri[0] as i32, tri[1] as i32, tri[2] as i32);
            let n = self.face_normal(a, b, c);
            normals[tri[0] as usize] += n;
            normals[tri[1] as usize] += n;
            normals[tri[2] as usize] += n;
        }
        for tri in self.border_triangles.chunks_exact(3) {
            let n = self.face_normal(tri[0], tri[1], tri[2]);
            for &v in tri {
                if v >= 0 {
                    normals[v as usize] += n;
                }
            }
        }
        for n in &mut normals {
            *n = n.normalized_or(Vec3::UP);
        }
        normals
    }

    pub(crate) fn finish(self, lod: u32, vertices_per_line: usize) -> TerrainMesh {
        let normals = self.bake_normals();
        let mut pos = Vec::with_capacity(self.vertices.len() * 3);
        for v in &self.vertices {
            pos.extend_from_slice(&v.to_array());
        }
        let mut norm = Vec::with_capacity(normals.len() * 3);
        for n in &normals {
            norm.extend_from_slice(&n.to_array());
        }
        let mut uv = Vec::with_capacity(self.uvs.len() * 2);
        for &(u, v) in &self.uvs {
            uv.extend_from_slice(&[u, v]);
        }
        let mut border_pos = Vec::with_capacity(self.border_vertices.len() * 3);
        for v in &self.border_vertices {
            border_pos.extend_from_slice(&v.to_array());
        }
        TerrainMesh {
            lod,
            vertices_per_line,
            pos,
            norm,
            uv,
            idx: self.triangles,
            border_pos,
            border_idx: self.border_triangles,
        }
    }
}
