/// Environment maps - equirectangular HDR to cube faces, with a disk cache
///
/// Conversion goes through the vertical cross layout:
///
/// ```text
///      +----+
///      | +Y |
/// +----+----+----+
/// | -X | -Z | +X |
/// +----+----+----+
///      | -Y |
///      +----+
///      | +Z |
///      +----+
/// ```

use std::f32::consts::PI;
use std::fs;
use std::path::{Path, PathBuf};

use glam::Vec3;

use crate::error::Result;

// ===== HDR IMAGE =====

/// Linear RGB float image, row-major
#[derive(Debug, Clone, PartialEq)]
pub struct HdrImage {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<Vec3>,
}

impl HdrImage {
    /// Black image
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            pixels: vec![Vec3::ZERO; width as usize * height as usize],
        }
    }

    pub fn from_fn(width: u32, height: u32, mut f: impl FnMut(u32, u32) -> Vec3) -> Self {
        let mut image = Self::new(width, height);
        for y in 0..height {
            for x in 0..width {
                image.set(x, y, f(x, y));
            }
        }
        image
    }

    pub fn get(&self, x: u32, y: u32) -> Vec3 {
        self.pixels[self.index(x, y)]
    }

    pub fn set(&mut self, x: u32, y: u32, color: Vec3) {
        let index = self.index(x, y);
        self.pixels[index] = color;
    }

    /// Bilinear sample at pixel coordinates, clamped to the edges
    pub fn sample(&self, u: f32, v: f32) -> Vec3 {
        let max_x = self.width.saturating_sub(1);
        let max_y = self.height.saturating_sub(1);
        // Clamp before weighting so coordinates outside the image repeat the edge
        let u = u.clamp(0.0, max_x as f32);
        let v = v.clamp(0.0, max_y as f32);
        let x1 = (u.floor() as u32).min(max_x);
        let y1 = (v.floor() as u32).min(max_y);
        let x2 = (x1 + 1).min(max_x);
        let y2 = (y1 + 1).min(max_y);
        let s = u - x1 as f32;
        let t = v - y1 as f32;

        let a = self.get(x1, y1);
        let b = self.get(x2, y1);
        let c = self.get(x1, y2);
        let d = self.get(x2, y2);
        a * (1.0 - s) * (1.0 - t) + b * s * (1.0 - t) + c * (1.0 - s) * t + d * s * t
    }

    /// Decode any float-capable format the `image` crate reads
    pub fn open(path: &Path) -> Result<Self> {
        let decoded = image::open(path).map_err(|e| {
            crate::engine_err!(InvalidResource, "slate::HdrImage",
                "Failed to decode '{}': {}", path.display(), e)
        })?;
        let rgb = decoded.into_rgb32f();
        let pixels = rgb.pixels().map(|p| Vec3::from_array(p.0)).collect();
        Ok(Self {
            width: rgb.width(),
            height: rgb.height(),
            pixels,
        })
    }

    /// Write as Radiance HDR
    pub fn save(&self, path: &Path) -> Result<()> {
        let raw: Vec<f32> = self.pixels.iter().flat_map(|p| p.to_array()).collect();
        let Some(buffer) = image::Rgb32FImage::from_raw(self.width, self.height, raw) else {
            crate::engine_bail!(InvalidResource, "slate::HdrImage",
                "Pixel count does not match {}x{}", self.width, self.height);
        };
        image::DynamicImage::ImageRgb32F(buffer)
            .save_with_format(path, image::ImageFormat::Hdr)
            .map_err(|e| crate::engine_err!(IoFailure, "slate::HdrImage",
                "Failed to write '{}': {}", path.display(), e))
    }

    fn index(&self, x: u32, y: u32) -> usize {
        y as usize * self.width as usize + x as usize
    }
}

// ===== CONVERSION =====

/// Direction through texel (i, j) of cube face `face`
fn face_direction(i: u32, j: u32, face: usize, face_size: u32) -> Vec3 {
    let a = 2.0 * i as f32 / face_size as f32;
    let b = 2.0 * j as f32 / face_size as f32;
    match face {
        0 => Vec3::new(-1.0, a - 1.0, b - 1.0),
        1 => Vec3::new(a - 1.0, -1.0, 1.0 - b),
        2 => Vec3::new(1.0, a - 1.0, 1.0 - b),
        3 => Vec3::new(1.0 - a, 1.0, 1.0 - b),
        4 => Vec3::new(b - 1.0, a - 1.0, 1.0),
        _ => Vec3::new(1.0 - b, a - 1.0, -1.0),
    }
}

/// Resample an equirectangular map into a `3f x 4f` vertical cross
///
/// The face size `f` is a quarter of the source width.
pub fn equirect_to_vertical_cross(source: &HdrImage) -> HdrImage {
    let f = source.width / 4;
    let offsets = [(f, 3 * f), (0, f), (f, f), (2 * f, f), (f, 0), (f, 2 * f)];
    let mut cross = HdrImage::new(3 * f, 4 * f);

    for (face, &(offset_x, offset_y)) in offsets.iter().enumerate() {
        for i in 0..f {
            for j in 0..f {
                let p = face_direction(i, j, face, f);
                let r = p.x.hypot(p.y);
                let theta = p.y.atan2(p.x);
                let phi = p.z.atan2(r);
                let u = 2.0 * f as f32 * (theta + PI) / PI;
                let v = 2.0 * f as f32 * (PI / 2.0 - phi) / PI;
                cross.set(i + offset_x, j + offset_y, source.sample(u, v));
            }
        }
    }
    cross
}

/// Split a vertical cross into faces ordered +X, -X, +Y, -Y, +Z, -Z
pub fn vertical_cross_to_faces(cross: &HdrImage) -> [HdrImage; 6] {
    let w = cross.width / 3;
    let h = cross.height / 4;
    std::array::from_fn(|face| {
        HdrImage::from_fn(w, h, |i, j| {
            let (x, y) = match face {
                0 => (2 * w + i, h + j),
                1 => (i, h + j),
                2 => (w + i, j),
                3 => (w + i, 2 * h + j),
                4 => (w + i, h + j),
                _ => (2 * w - (i + 1), cross.height - (j + 1)),
            };
            cross.get(x, y)
        })
    })
}

// ===== CACHE =====

/// Converted environment maps kept on disk as vertical crosses
#[derive(Debug, Clone)]
pub struct EnvironmentMapCache {
    cache_dir: PathBuf,
}

impl EnvironmentMapCache {
    pub fn new(cache_dir: impl Into<PathBuf>) -> Self {
        Self { cache_dir: cache_dir.into() }
    }

    pub fn cache_dir(&self) -> &Path {
        &self.cache_dir
    }

    /// `<cache_dir>/<stem>.hdr` for `source`
    pub fn cached_path(&self, source: &Path) -> PathBuf {
        let stem = source.file_stem().map(|s| s.to_string_lossy().into_owned()).unwrap_or_default();
        self.cache_dir.join(format!("{}.hdr", stem))
    }

    /// Vertical cross for `source`, converted and cached on first request
    pub fn load_or_convert(&self, source: &Path) -> Result<HdrImage> {
        let cached = self.cached_path(source);
        if cached.is_file() {
            crate::engine_debug!("slate::EnvironmentMapCache", "Using cached '{}'", cached.display());
            return HdrImage::open(&cached);
        }

        let equirect = HdrImage::open(source)?;
        if equirect.width < 4 {
            crate::engine_bail!(InvalidResource, "slate::EnvironmentMapCache",
                "'{}' is too small for a cube map ({}x{})", source.display(), equirect.width, equirect.height);
        }
        let cross = equirect_to_vertical_cross(&equirect);
        fs::create_dir_all(&self.cache_dir)?;
        cross.save(&cached)?;
        crate::engine_info!("slate::EnvironmentMapCache",
            "Converted '{}' to {}x{} cross at '{}'", source.display(), cross.width, cross.height, cached.display());
        Ok(cross)
    }
}

#[cfg(test)]
#[path = "environment_tests.rs"]
mod tests;
