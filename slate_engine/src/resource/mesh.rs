/// Mesh resource - glTF geometry flattened to one vertex/index list
///
/// Every primitive of every mesh in the document is appended, with its
/// indices rebased onto the shared vertex list. GPU buffers are created on
/// first use and dropped whenever the geometry is reloaded.

use std::path::Path;
use std::sync::Arc;

use bytemuck::{Pod, Zeroable};

use crate::error::Result;
use crate::renderer::{BufferDesc, BufferUsage, GpuBuffer, RenderBackend};
use crate::resource::{Resource, ResourceInfo, ResourceKind};

/// Interleaved vertex as uploaded to the GPU
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Pod, Zeroable)]
pub struct Vertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    pub uv: [f32; 2],
}

struct MeshBuffers {
    vertex_buffer: Arc<dyn GpuBuffer>,
    index_buffer: Option<Arc<dyn GpuBuffer>>,
}

#[derive(Default)]
pub struct MeshResource {
    info: ResourceInfo,
    vertices: Vec<Vertex>,
    indices: Vec<u32>,
    gpu: Option<MeshBuffers>,
}

impl MeshResource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mesh built in memory, with no backing file
    pub fn from_geometry(vertices: Vec<Vertex>, indices: Vec<u32>) -> Self {
        Self {
            vertices,
            indices,
            ..Self::default()
        }
    }

    pub fn vertices(&self) -> &[Vertex] {
        &self.vertices
    }

    pub fn indices(&self) -> &[u32] {
        &self.indices
    }

    pub fn vertex_count(&self) -> u32 {
        self.vertices.len() as u32
    }

    pub fn index_count(&self) -> u32 {
        self.indices.len() as u32
    }

    pub fn has_gpu_buffers(&self) -> bool {
        self.gpu.is_some()
    }

    /// Vertex and index buffers, uploaded on first call
    pub fn ensure_gpu_buffers(
        &mut self,
        backend: &mut dyn RenderBackend,
    ) -> Result<(Arc<dyn GpuBuffer>, Option<Arc<dyn GpuBuffer>>)> {
        if let Some(gpu) = &self.gpu {
            return Ok((Arc::clone(&gpu.vertex_buffer), gpu.index_buffer.clone()));
        }
        if self.vertices.is_empty() {
            crate::engine_bail!(InvalidResource, "slate::MeshResource",
                "Mesh '{}' has no vertices to upload", self.info.file_name);
        }

        let vertex_bytes: &[u8] = bytemuck::cast_slice(&self.vertices);
        let vertex_buffer = backend.create_buffer(BufferDesc {
            name: format!("{}:vertices", self.info.file_name),
            size: vertex_bytes.len() as u64,
            usage: BufferUsage::VERTEX,
            host_visible: true,
        })?;
        vertex_buffer.update(0, vertex_bytes)?;

        let index_buffer = if self.indices.is_empty() {
            None
        } else {
            let index_bytes: &[u8] = bytemuck::cast_slice(&self.indices);
            let buffer = backend.create_buffer(BufferDesc {
                name: format!("{}:indices", self.info.file_name),
                size: index_bytes.len() as u64,
                usage: BufferUsage::INDEX,
                host_visible: true,
            })?;
            buffer.update(0, index_bytes)?;
            Some(buffer)
        };

        self.gpu = Some(MeshBuffers {
            vertex_buffer: Arc::clone(&vertex_buffer),
            index_buffer: index_buffer.clone(),
        });
        Ok((vertex_buffer, index_buffer))
    }
}

impl Resource for MeshResource {
    const KIND: ResourceKind = ResourceKind::Mesh;

    fn info(&self) -> &ResourceInfo {
        &self.info
    }

    fn info_mut(&mut self) -> &mut ResourceInfo {
        &mut self.info
    }

    fn parse(&mut self, path: &Path) -> Result<()> {
        let (document, buffers, _images) = gltf::import(path).map_err(|e| {
            crate::engine_err!(InvalidResource, "slate::MeshResource",
                "Failed to import glTF '{}': {}", path.display(), e)
        })?;

        let mut vertices = Vec::new();
        let mut indices = Vec::new();

        for mesh in document.meshes() {
            for primitive in mesh.primitives() {
                let reader = primitive.reader(|buffer| Some(&buffers[buffer.index()]));
                let Some(positions) = reader.read_positions() else {
                    crate::engine_warn!("slate::MeshResource",
                        "Skipping primitive without positions in '{}'", path.display());
                    continue;
                };

                let base = vertices.len() as u32;
                let first = vertices.len();
                vertices.extend(positions.map(|position| Vertex { position, ..Vertex::default() }));
                let count = vertices.len() - first;

                if let Some(normals) = reader.read_normals() {
                    for (vertex, normal) in vertices[first..].iter_mut().zip(normals) {
                        vertex.normal = normal;
                    }
                }
                if let Some(uvs) = reader.read_tex_coords(0) {
                    for (vertex, uv) in vertices[first..].iter_mut().zip(uvs.into_f32()) {
                        vertex.uv = uv;
                    }
                }

                match reader.read_indices() {
                    Some(read) => indices.extend(read.into_u32().map(|i| base + i)),
                    None => indices.extend(base..base + count as u32),
                }
            }
        }

        self.vertices = vertices;
        self.indices = indices;
        self.gpu = None;
        Ok(())
    }
}

#[cfg(test)]
#[path = "mesh_tests.rs"]
mod tests;
