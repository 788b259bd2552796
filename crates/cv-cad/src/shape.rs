//! Shape handles and tessellated meshes exchanged with the kernel

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Topological type of a shape
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ShapeType {
    #[default]
    Compound,
    CompSolid,
    Solid,
    Shell,
    Face,
    Wire,
    Edge,
    Vertex,
}

impl ShapeType {
    /// Get display name
    pub fn display_name(&self) -> &'static str {
        match self {
            ShapeType::Compound => "Compound",
            ShapeType::CompSolid => "CompSolid",
            ShapeType::Solid => "Solid",
            ShapeType::Shell => "Shell",
            ShapeType::Face => "Face",
            ShapeType::Wire => "Wire",
            ShapeType::Edge => "Edge",
            ShapeType::Vertex => "Vertex",
        }
    }
}

/// A boundary-representation shape
///
/// The geometry itself lives inside the kernel, this is only a handle to it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Shape {
    /// Unique identifier (kernel-side key)
    pub id: Uuid,
    /// Topological type
    pub shape_type: ShapeType,
}

impl Shape {
    /// Create a handle for a new kernel shape
    pub fn new(shape_type: ShapeType) -> Self {
        Self {
            id: Uuid::new_v4(),
            shape_type,
        }
    }

    /// Create a handle with a known ID
    pub fn with_id(id: Uuid, shape_type: ShapeType) -> Self {
        Self { id, shape_type }
    }
}

/// A tessellated mesh (triangulation of a shape, or a mesh read from file)
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TessellatedMesh {
    /// Vertex positions (3 floats per vertex)
    pub vertices: Vec<[f32; 3]>,
    /// Vertex normals (3 floats per vertex, may be empty)
    pub normals: Vec<[f32; 3]>,
    /// Triangle indices (3 indices per triangle)
    pub indices: Vec<u32>,
}

impl TessellatedMesh {
    /// Create an empty tessellated mesh
    pub fn new() -> Self {
        Self::default()
    }

    /// Check if the mesh is empty
    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    /// Get the number of vertices
    pub fn node_count(&self) -> usize {
        self.vertices.len()
    }

    /// Get the number of triangles
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// Iterate over triangles as vertex triples
    ///
    /// Triangles referencing out-of-range vertices are skipped.
    pub fn triangles(&self) -> impl Iterator<Item = [[f32; 3]; 3]> + '_ {
        self.indices.chunks_exact(3).filter_map(|tri| {
            Some([
                *self.vertices.get(tri[0] as usize)?,
                *self.vertices.get(tri[1] as usize)?,
                *self.vertices.get(tri[2] as usize)?,
            ])
        })
    }

    /// Append another mesh, offsetting its indices
    pub fn merge(&mut self, other: &TessellatedMesh) {
        let offset = self.vertices.len() as u32;
        self.vertices.extend_from_slice(&other.vertices);
        self.normals.extend_from_slice(&other.normals);
        self.indices.extend(other.indices.iter().map(|i| i + offset));
    }

    /// Axis-aligned bounding box, `None` for an empty mesh
    pub fn bounding_box(&self) -> Option<([f32; 3], [f32; 3])> {
        if self.vertices.is_empty() {
            return None;
        }

        let mut min = [f32::MAX; 3];
        let mut max = [f32::MIN; 3];
        for v in &self.vertices {
            for i in 0..3 {
                min[i] = min[i].min(v[i]);
                max[i] = max[i].max(v[i]);
            }
        }
        Some((min, max))
    }
}

/// Unit normal of a triangle, +Z for degenerate triangles
pub fn triangle_normal(tri: &[[f32; 3]; 3]) -> [f32; 3] {
    let [v0, v1, v2] = tri;
    let e1 = [v1[0] - v0[0], v1[1] - v0[1], v1[2] - v0[2]];
    let e2 = [v2[0] - v0[0], v2[1] - v0[1], v2[2] - v0[2]];
    let cross = [
        e1[1] * e2[2] - e1[2] * e2[1],
        e1[2] * e2[0] - e1[0] * e2[2],
        e1[0] * e2[1] - e1[1] * e2[0],
    ];
    let len = (cross[0] * cross[0] + cross[1] * cross[1] + cross[2] * cross[2]).sqrt();
    if len > 0.0 {
        [cross[0] / len, cross[1] / len, cross[2] / len]
    } else {
        [0.0, 0.0, 1.0]
    }
}
