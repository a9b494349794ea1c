use super::*;

// ============================================================================
// SAMPLING
// ============================================================================

#[test]
fn test_sample_at_texel_is_exact() {
    let image = HdrImage::from_fn(4, 2, |x, y| Vec3::new(x as f32, y as f32, 0.0));
    assert_eq!(image.sample(2.0, 1.0), Vec3::new(2.0, 1.0, 0.0));
}

#[test]
fn test_sample_interpolates_between_texels() {
    let image = HdrImage::from_fn(4, 2, |x, y| Vec3::new(x as f32, y as f32, 0.0));
    let sample = image.sample(1.5, 0.25);
    assert!((sample.x - 1.5).abs() < 1e-5);
    assert!((sample.y - 0.25).abs() < 1e-5);
}

#[test]
fn test_sample_clamps_to_edges() {
    let image = HdrImage::from_fn(4, 2, |x, _| Vec3::splat(x as f32));
    assert_eq!(image.sample(-3.0, 0.0), Vec3::ZERO);
    assert_eq!(image.sample(10.0, 5.0), Vec3::splat(3.0));
}

#[test]
fn test_sample_outside_image_repeats_edge_pixels() {
    let image = HdrImage::from_fn(4, 2, |x, y| Vec3::new(x as f32, y as f32, 1.0));
    assert_eq!(image.sample(-0.5, -7.0), Vec3::new(0.0, 0.0, 1.0));
    assert_eq!(image.sample(2.5, -1.0), Vec3::new(2.5, 0.0, 1.0));
    assert_eq!(image.sample(3.75, 1.5), Vec3::new(3.0, 1.0, 1.0));
}

// ============================================================================
// CONVERSION
// ============================================================================

#[test]
fn test_cross_dimensions() {
    let equirect = HdrImage::new(16, 8);
    let cross = equirect_to_vertical_cross(&equirect);
    assert_eq!((cross.width, cross.height), (12, 16));
}

#[test]
fn test_constant_map_fills_every_face() {
    let color = Vec3::new(0.25, 0.5, 2.0);
    let equirect = HdrImage::from_fn(16, 8, |_, _| color);
    let cross = equirect_to_vertical_cross(&equirect);

    for face in vertical_cross_to_faces(&cross) {
        assert_eq!((face.width, face.height), (4, 4));
        for pixel in &face.pixels {
            assert!((*pixel - color).length() < 1e-5);
        }
    }
    // corners of the cross lie outside every face
    assert_eq!(cross.get(0, 0), Vec3::ZERO);
    assert_eq!(cross.get(11, 15), Vec3::ZERO);
}

#[test]
fn test_faces_read_their_cross_region() {
    // Tag every cross texel with its region (column, row)
    let cross = HdrImage::from_fn(6, 8, |x, y| Vec3::new((x / 2) as f32, (y / 2) as f32, 0.0));
    let faces = vertical_cross_to_faces(&cross);

    let region = |face: &HdrImage| (face.get(0, 0).x, face.get(0, 0).y);
    assert_eq!(region(&faces[0]), (2.0, 1.0));
    assert_eq!(region(&faces[1]), (0.0, 1.0));
    assert_eq!(region(&faces[2]), (1.0, 0.0));
    assert_eq!(region(&faces[3]), (1.0, 2.0));
    assert_eq!(region(&faces[4]), (1.0, 1.0));
    assert_eq!(region(&faces[5]), (1.0, 3.0));
}

#[test]
fn test_negative_z_face_is_flipped() {
    let cross = HdrImage::from_fn(6, 8, |x, y| Vec3::new(x as f32, y as f32, 0.0));
    let faces = vertical_cross_to_faces(&cross);
    assert_eq!(faces[5].get(0, 0), Vec3::new(3.0, 7.0, 0.0));
    assert_eq!(faces[5].get(1, 1), Vec3::new(2.0, 6.0, 0.0));
}

// ============================================================================
// CACHE
// ============================================================================

#[test]
fn test_cached_path_uses_stem() {
    let cache = EnvironmentMapCache::new("/tmp/slate-cache");
    assert_eq!(cache.cached_path(Path::new("skies/sunset.exr")), PathBuf::from("/tmp/slate-cache/sunset.hdr"));
}

#[test]
fn test_load_or_convert_writes_and_reuses_cache() {
    let dir = tempfile::tempdir().unwrap();
    let source = dir.path().join("sky.hdr");
    HdrImage::from_fn(16, 8, |_, _| Vec3::splat(1.0)).save(&source).unwrap();

    let cache = EnvironmentMapCache::new(dir.path().join("cache"));
    let cross = cache.load_or_convert(&source).unwrap();
    assert_eq!((cross.width, cross.height), (12, 16));
    assert!(cache.cached_path(&source).is_file());

    // the cached cross is used even once the source is gone
    std::fs::remove_file(&source).unwrap();
    let cached = cache.load_or_convert(&source).unwrap();
    assert_eq!((cached.width, cached.height), (12, 16));
}

#[test]
fn test_load_or_convert_missing_source() {
    let dir = tempfile::tempdir().unwrap();
    let cache = EnvironmentMapCache::new(dir.path().join("cache"));
    assert!(cache.load_or_convert(&dir.path().join("absent.hdr")).is_err());
    assert!(!dir.path().join("cache").exists());
}
