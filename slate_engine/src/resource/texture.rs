/// Texture resource - decoded RGBA8 pixels

use std::path::Path;
use std::sync::Arc;

use crate::error::Result;
use crate::renderer::{BufferDesc, BufferUsage, GpuBuffer, RenderBackend};
use crate::resource::{Resource, ResourceInfo, ResourceKind};

#[derive(Default)]
pub struct TextureResource {
    info: ResourceInfo,
    width: u32,
    height: u32,
    /// Tightly packed RGBA8 rows
    pixels: Vec<u8>,
    gpu_buffer: Option<Arc<dyn GpuBuffer>>,
}

impl TextureResource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Texture from in-memory RGBA8 pixels
    pub fn from_rgba8(width: u32, height: u32, pixels: Vec<u8>) -> Result<Self> {
        let expected = width as usize * height as usize * 4;
        if pixels.len() != expected {
            crate::engine_bail!(InvalidResource, "slate::TextureResource",
                "{}x{} RGBA8 texture needs {} bytes, got {}", width, height, expected, pixels.len());
        }
        Ok(Self {
            width,
            height,
            pixels,
            ..Self::default()
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    /// RGBA of the pixel at (x, y)
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let start = (y as usize * self.width as usize + x as usize) * 4;
        let mut rgba = [0; 4];
        rgba.copy_from_slice(&self.pixels[start..start + 4]);
        Some(rgba)
    }

    pub fn has_gpu_buffer(&self) -> bool {
        self.gpu_buffer.is_some()
    }

    /// Pixel buffer on the GPU, uploaded on first call
    pub fn ensure_gpu_buffer(&mut self, backend: &mut dyn RenderBackend) -> Result<Arc<dyn GpuBuffer>> {
        if let Some(buffer) = &self.gpu_buffer {
            return Ok(Arc::clone(buffer));
        }
        if self.pixels.is_empty() {
            crate::engine_bail!(InvalidResource, "slate::TextureResource",
                "Texture '{}' has no pixels to upload", self.info.file_name);
        }
        let buffer = backend.create_buffer(BufferDesc {
            name: format!("{}:pixels", self.info.file_name),
            size: self.pixels.len() as u64,
            usage: BufferUsage::STORAGE,
            host_visible: true,
        })?;
        buffer.update(0, &self.pixels)?;
        self.gpu_buffer = Some(Arc::clone(&buffer));
        Ok(buffer)
    }
}

impl Resource for TextureResource {
    const KIND: ResourceKind = ResourceKind::Texture;

    fn info(&self) -> &ResourceInfo {
        &self.info
    }

    fn info_mut(&mut self) -> &mut ResourceInfo {
        &mut self.info
    }

    fn parse(&mut self, path: &Path) -> Result<()> {
        let image = image::open(path).map_err(|e| {
            crate::engine_err!(InvalidResource, "slate::TextureResource",
                "Failed to decode '{}': {}", path.display(), e)
        })?;
        let rgba = image.to_rgba8();
        self.width = rgba.width();
        self.height = rgba.height();
        self.pixels = rgba.into_raw();
        self.gpu_buffer = None;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::renderer::RecordingBackend;

    fn write_checker(path: &Path) {
        let image = image::RgbaImage::from_fn(2, 2, |x, y| {
            if (x + y) % 2 == 0 {
                image::Rgba([255, 255, 255, 255])
            } else {
                image::Rgba([0, 0, 0, 255])
            }
        });
        image.save(path).unwrap();
    }

    #[test]
    fn test_load_png() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("checker.png");
        write_checker(&path);

        let mut texture = TextureResource::new();
        texture.load(&path).unwrap();
        assert_eq!((texture.width(), texture.height()), (2, 2));
        assert_eq!(texture.pixels().len(), 16);
        assert_eq!(texture.pixel(0, 0), Some([255, 255, 255, 255]));
        assert_eq!(texture.pixel(1, 0), Some([0, 0, 0, 255]));
        assert_eq!(texture.pixel(2, 0), None);
    }

    #[test]
    fn test_load_rejects_corrupt_image() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("corrupt.png");
        std::fs::write(&path, b"definitely not a png").unwrap();

        let mut texture = TextureResource::new();
        assert!(texture.load(&path).is_err());
        assert!(!texture.is_loaded());
    }

    #[test]
    fn test_from_rgba8_checks_size() {
        assert!(TextureResource::from_rgba8(2, 2, vec![0; 16]).is_ok());
        assert!(TextureResource::from_rgba8(2, 2, vec![0; 15]).is_err());
    }

    #[test]
    fn test_gpu_buffer_uploaded_once() {
        let mut backend = RecordingBackend::new();
        let mut texture = TextureResource::from_rgba8(1, 1, vec![1, 2, 3, 4]).unwrap();

        let first = texture.ensure_gpu_buffer(&mut backend).unwrap();
        let second = texture.ensure_gpu_buffer(&mut backend).unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(first.size(), 4);
        assert_eq!(backend.buffers_created, 1);
    }
}
