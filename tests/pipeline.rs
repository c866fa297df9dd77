//! End-to-end pipeline runs on real encoded images.
//!
//! These drive the public API with the production backend: real JPEG, PNG and
//! WebP files on disk, real decode/resize/encode. Images are kept small and the
//! rendition table is scaled down to match so the suite stays fast in debug
//! builds.

use image::codecs::jpeg::JpegEncoder;
use image::{ExtendedColorType, GenericImageView, ImageEncoder, Rgb, RgbImage, Rgba, RgbaImage};
use portfolio_media::config::{self, PipelineConfig, RenditionSpec};
use portfolio_media::manifest;
use portfolio_media::process::{Pipeline, ProcessError, ProcessEvent, ProjectOutcome};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

// =========================================================================
// Fixtures
// =========================================================================

/// Four renditions at a tenth of the stock bounds.
fn small_config() -> PipelineConfig {
    PipelineConfig {
        renditions: vec![
            RenditionSpec::new("thumb", 40),
            RenditionSpec::new("medium", 80),
            RenditionSpec::new("large", 120),
            RenditionSpec::new("xlarge", 200),
        ],
        ..Default::default()
    }
}

fn project(root: &Path, name: &str) -> PathBuf {
    let dir = root.join(name);
    fs::create_dir_all(&dir).unwrap();
    dir
}

fn rendition(root: &Path, project: &str, size: &str, file: &str) -> PathBuf {
    root.join(project).join("sizes").join(size).join(file)
}

fn write_jpeg(path: &Path, width: u32, height: u32) {
    let img = RgbImage::from_fn(width, height, |x, y| {
        Rgb([(x % 256) as u8, (y % 256) as u8, 90])
    });
    let mut bytes = Vec::new();
    JpegEncoder::new_with_quality(&mut bytes, 90)
        .write_image(img.as_raw(), width, height, ExtendedColorType::Rgb8)
        .unwrap();
    fs::write(path, bytes).unwrap();
}

/// APP1 segment carrying only an IFD0 Orientation entry (big-endian TIFF).
fn exif_app1(orientation: u16) -> Vec<u8> {
    let mut tiff = Vec::new();
    tiff.extend_from_slice(b"MM");
    tiff.extend_from_slice(&42u16.to_be_bytes());
    tiff.extend_from_slice(&8u32.to_be_bytes());
    tiff.extend_from_slice(&1u16.to_be_bytes()); // entry count
    tiff.extend_from_slice(&0x0112u16.to_be_bytes());
    tiff.extend_from_slice(&3u16.to_be_bytes()); // SHORT
    tiff.extend_from_slice(&1u32.to_be_bytes());
    tiff.extend_from_slice(&orientation.to_be_bytes());
    tiff.extend_from_slice(&[0, 0]);
    tiff.extend_from_slice(&0u32.to_be_bytes()); // no IFD1

    let mut segment = vec![0xFF, 0xE1];
    segment.extend_from_slice(&((6 + tiff.len() + 2) as u16).to_be_bytes());
    segment.extend_from_slice(b"Exif\0\0");
    segment.extend_from_slice(&tiff);
    segment
}

fn write_oriented_jpeg(path: &Path, width: u32, height: u32, orientation: u16) {
    write_jpeg(path, width, height);
    let bytes = fs::read(path).unwrap();
    let mut spliced = bytes[..2].to_vec();
    spliced.extend_from_slice(&exif_app1(orientation));
    spliced.extend_from_slice(&bytes[2..]);
    fs::write(path, spliced).unwrap();
}

/// Left half fully transparent red, right half opaque blue.
fn write_transparent_png(path: &Path, width: u32, height: u32) {
    let img = RgbaImage::from_fn(width, height, |x, _| {
        if x < width / 2 {
            Rgba([255, 0, 0, 0])
        } else {
            Rgba([0, 0, 255, 255])
        }
    });
    img.save_with_format(path, image::ImageFormat::Png).unwrap();
}

fn write_webp(path: &Path, width: u32, height: u32) {
    let img = RgbImage::from_fn(width, height, |x, y| Rgb([x as u8, y as u8, 200]));
    img.save_with_format(path, image::ImageFormat::WebP).unwrap();
}

fn dims(path: &Path) -> (u32, u32) {
    image::image_dimensions(path).unwrap()
}

// =========================================================================
// Rendition geometry
// =========================================================================

#[test]
fn every_rendition_fits_its_bound_and_keeps_aspect() {
    let tmp = TempDir::new().unwrap();
    let dir = project(tmp.path(), "bench");
    write_jpeg(&dir.join("wide.jpg"), 300, 200);

    let pipeline = Pipeline::new(tmp.path(), small_config());
    let result = pipeline.process_project("bench", None).unwrap();
    assert_eq!(result.processed, vec!["wide.jpg"]);
    assert_eq!(result.moved_to_originals, vec!["wide.jpg"]);

    let expected = [
        ("thumb", (40, 26)),
        ("medium", (80, 53)),
        ("large", (120, 80)),
        ("xlarge", (200, 133)),
    ];
    for (size, want) in expected {
        let (w, h) = dims(&rendition(tmp.path(), "bench", size, "wide.jpg"));
        assert_eq!((w, h), want, "{size}");
        // Within one pixel of the source's 3:2 ratio
        assert!((w as f64 / 1.5 - h as f64).abs() <= 1.0, "{size}");
    }
}

#[test]
fn rotated_jpeg_renditions_are_upright() {
    let tmp = TempDir::new().unwrap();
    let dir = project(tmp.path(), "p");
    // Stored landscape, tagged "rotate 90 CW to display"
    write_oriented_jpeg(&dir.join("phone.jpg"), 300, 200, 6);

    let pipeline = Pipeline::new(tmp.path(), small_config());
    pipeline.process_project("p", None).unwrap();

    assert_eq!(dims(&rendition(tmp.path(), "p", "thumb", "phone.jpg")), (26, 40));
    assert_eq!(dims(&rendition(tmp.path(), "p", "medium", "phone.jpg")), (53, 80));
    assert_eq!(dims(&rendition(tmp.path(), "p", "large", "phone.jpg")), (80, 120));
    assert_eq!(dims(&rendition(tmp.path(), "p", "xlarge", "phone.jpg")), (133, 200));
}

#[test]
fn small_source_is_copied_byte_for_byte() {
    let tmp = TempDir::new().unwrap();
    let dir = project(tmp.path(), "p");
    write_jpeg(&dir.join("tiny.jpg"), 30, 20);
    let original = fs::read(dir.join("tiny.jpg")).unwrap();

    let pipeline = Pipeline::new(tmp.path(), small_config());
    pipeline.process_project("p", None).unwrap();

    for size in ["thumb", "medium", "large", "xlarge"] {
        assert_eq!(
            fs::read(rendition(tmp.path(), "p", size, "tiny.jpg")).unwrap(),
            original,
            "{size}"
        );
    }
    assert_eq!(fs::read(dir.join("originals/tiny.jpg")).unwrap(), original);
}

#[test]
fn mid_size_source_copies_only_larger_renditions() {
    let tmp = TempDir::new().unwrap();
    let dir = project(tmp.path(), "p");
    write_jpeg(&dir.join("mid.jpg"), 100, 60);
    let original = fs::read(dir.join("mid.jpg")).unwrap();

    let (tx, rx) = std::sync::mpsc::channel();
    let pipeline = Pipeline::new(tmp.path(), small_config());
    pipeline.process_project("p", Some(tx)).unwrap();

    assert_eq!(dims(&rendition(tmp.path(), "p", "thumb", "mid.jpg")), (40, 24));
    assert_eq!(dims(&rendition(tmp.path(), "p", "medium", "mid.jpg")), (80, 48));
    assert_eq!(fs::read(rendition(tmp.path(), "p", "large", "mid.jpg")).unwrap(), original);
    assert_eq!(fs::read(rendition(tmp.path(), "p", "xlarge", "mid.jpg")).unwrap(), original);

    let lines: Vec<String> = rx
        .iter()
        .flat_map(|e| portfolio_media::output::format_process_event(&e))
        .collect();
    assert!(lines.contains(&"        thumb: encoded".to_string()));
    assert!(lines.contains(&"        large: copied".to_string()));
}

// =========================================================================
// Formats
// =========================================================================

#[test]
fn png_renditions_keep_transparency() {
    let tmp = TempDir::new().unwrap();
    let dir = project(tmp.path(), "p");
    write_transparent_png(&dir.join("logo.png"), 160, 80);

    let pipeline = Pipeline::new(tmp.path(), small_config());
    pipeline.process_project("p", None).unwrap();

    let thumb = image::open(rendition(tmp.path(), "p", "thumb", "logo.png")).unwrap();
    assert_eq!(thumb.dimensions(), (40, 20));
    assert!(thumb.color().has_alpha());
    let left = thumb.get_pixel(2, 10);
    let right = thumb.get_pixel(37, 10);
    assert!(left[3] <= 2, "left alpha {}", left[3]);
    assert!(right[3] >= 253, "right alpha {}", right[3]);
}

#[test]
fn webp_source_yields_webp_renditions() {
    let tmp = TempDir::new().unwrap();
    let dir = project(tmp.path(), "p");
    write_webp(&dir.join("shot.webp"), 150, 250);

    let pipeline = Pipeline::new(tmp.path(), small_config());
    pipeline.process_project("p", None).unwrap();

    let thumb = rendition(tmp.path(), "p", "thumb", "shot.webp");
    assert_eq!(&fs::read(&thumb).unwrap()[8..12], b"WEBP");
    assert_eq!(dims(&thumb), (24, 40));
    assert_eq!(dims(&rendition(tmp.path(), "p", "large", "shot.webp")), (72, 120));
}

#[test]
fn uppercase_extensions_are_processed() {
    let tmp = TempDir::new().unwrap();
    let dir = project(tmp.path(), "p");
    write_jpeg(&dir.join("IMG_0001.JPG"), 300, 300);

    let pipeline = Pipeline::new(tmp.path(), small_config());
    let result = pipeline.process_project("p", None).unwrap();
    assert_eq!(result.processed, vec!["IMG_0001.JPG"]);
    assert_eq!(dims(&rendition(tmp.path(), "p", "thumb", "IMG_0001.JPG")), (40, 40));
}

// =========================================================================
// Idempotence and durability
// =========================================================================

#[test]
fn second_run_changes_nothing() {
    let tmp = TempDir::new().unwrap();
    let dir = project(tmp.path(), "p");
    write_jpeg(&dir.join("a.jpg"), 300, 200);
    write_transparent_png(&dir.join("b.png"), 60, 60);

    let pipeline = Pipeline::new(tmp.path(), small_config());
    let first = pipeline.process_project("p", None).unwrap();
    assert_eq!(first.processed, vec!["a.jpg", "b.png"]);

    let snapshot = |root: &Path| -> Vec<(PathBuf, Vec<u8>)> {
        let mut files: Vec<(PathBuf, Vec<u8>)> = walkdir::WalkDir::new(root)
            .into_iter()
            .filter_map(Result::ok)
            .filter(|e| e.file_type().is_file())
            .map(|e| (e.path().to_path_buf(), fs::read(e.path()).unwrap()))
            .collect();
        files.sort();
        files
    };
    let before = snapshot(tmp.path());

    let second = pipeline.process_project("p", None).unwrap();
    assert!(second.processed.is_empty());
    assert!(second.moved_to_originals.is_empty());
    assert!(second.errors.is_empty());
    assert_eq!(snapshot(tmp.path()), before);
}

#[test]
fn reupload_of_processed_name_is_left_alone() {
    let tmp = TempDir::new().unwrap();
    let dir = project(tmp.path(), "p");
    write_jpeg(&dir.join("a.jpg"), 300, 200);

    let pipeline = Pipeline::new(tmp.path(), small_config());
    pipeline.process_project("p", None).unwrap();
    let thumb_before = fs::read(rendition(tmp.path(), "p", "thumb", "a.jpg")).unwrap();

    write_jpeg(&dir.join("a.jpg"), 500, 500);
    let result = pipeline.process_project("p", None).unwrap();
    assert_eq!(result.skipped, vec!["a.jpg"]);
    assert!(dir.join("a.jpg").exists());
    assert_eq!(
        fs::read(rendition(tmp.path(), "p", "thumb", "a.jpg")).unwrap(),
        thumb_before
    );
}

#[test]
fn no_partial_files_left_behind() {
    let tmp = TempDir::new().unwrap();
    let dir = project(tmp.path(), "p");
    write_jpeg(&dir.join("a.jpg"), 300, 200);

    Pipeline::new(tmp.path(), small_config())
        .process_project("p", None)
        .unwrap();

    let leftovers: Vec<PathBuf> = walkdir::WalkDir::new(tmp.path())
        .into_iter()
        .filter_map(Result::ok)
        .filter(|e| e.file_name().to_string_lossy().ends_with(".partial"))
        .map(|e| e.into_path())
        .collect();
    assert!(leftovers.is_empty(), "{leftovers:?}");
}

// =========================================================================
// Failure isolation
// =========================================================================

#[test]
fn corrupt_file_is_reported_and_others_complete() {
    let tmp = TempDir::new().unwrap();
    let dir = project(tmp.path(), "p");
    for name in ["1.jpg", "2.jpg", "3.jpg"] {
        write_jpeg(&dir.join(name), 120, 90);
    }
    fs::write(dir.join("broken.jpg"), b"not a jpeg at all").unwrap();

    let pipeline = Pipeline::new(tmp.path(), small_config());
    let result = pipeline.process_project("p", None).unwrap();

    assert_eq!(result.processed, vec!["1.jpg", "2.jpg", "3.jpg"]);
    assert_eq!(result.moved_to_originals, vec!["1.jpg", "2.jpg", "3.jpg"]);
    assert_eq!(result.errors.len(), 1);
    assert_eq!(result.errors[0].filename, "broken.jpg");

    assert!(dir.join("broken.jpg").exists());
    for size in ["thumb", "medium", "large", "xlarge"] {
        assert!(!rendition(tmp.path(), "p", size, "broken.jpg").exists());
    }

    // Still failing, still isolated, on the next run
    let again = pipeline.process_project("p", None).unwrap();
    assert_eq!(again.skipped, Vec::<String>::new());
    assert_eq!(again.errors.len(), 1);
}

#[test]
fn missing_project_is_reported() {
    let tmp = TempDir::new().unwrap();
    let pipeline = Pipeline::new(tmp.path(), small_config());
    let err = pipeline.process_project("ghost", None).unwrap_err();
    assert!(matches!(err, ProcessError::ProjectNotFound(_)));
    assert_eq!(
        serde_json::json!({ "error": err.to_string() }),
        serde_json::json!({ "error": "Project directory not found" })
    );
}

// =========================================================================
// Whole root and manifest
// =========================================================================

#[test]
fn process_all_then_manifest() {
    let tmp = TempDir::new().unwrap();
    write_jpeg(&project(tmp.path(), "bench").join("a.jpg"), 300, 200);
    write_jpeg(&project(tmp.path(), "stool").join("b.jpg"), 30, 30);
    project(tmp.path(), "empty");

    let pipeline = Pipeline::new(tmp.path(), small_config());
    let (tx, rx) = std::sync::mpsc::channel();
    let outcomes = pipeline.process_all_projects(Some(tx));
    assert_eq!(outcomes.len(), 3);
    assert!(matches!(&outcomes["bench"], ProjectOutcome::Processed(r) if r.processed == ["a.jpg"]));
    let started = rx
        .iter()
        .filter(|e| matches!(e, ProcessEvent::ProjectStarted { .. }))
        .count();
    assert_eq!(started, 3);

    let manifest = pipeline.build_manifest().unwrap();
    assert_eq!(manifest.keys().collect::<Vec<_>>(), vec!["bench", "stool"]);
    assert_eq!(
        manifest["bench"][0].srcset,
        "/workshops/bench/sizes/thumb/a.jpg 40w, \
         /workshops/bench/sizes/medium/a.jpg 80w, \
         /workshops/bench/sizes/large/a.jpg 120w, \
         /workshops/bench/sizes/xlarge/a.jpg 200w"
    );
}

#[cfg(unix)]
#[test]
fn symlinked_projects_and_sources_are_processed() {
    use std::os::unix::fs::symlink;

    let tmp = TempDir::new().unwrap();
    let root = tmp.path().join("workshops");
    let shared = tmp.path().join("shared");
    write_jpeg(&project(&shared, "bench").join("a.jpg"), 300, 200);
    write_jpeg(&shared.join("loose.jpg"), 300, 200);
    fs::create_dir_all(&root).unwrap();
    symlink(shared.join("bench"), root.join("linked")).unwrap();
    symlink(shared.join("loose.jpg"), project(&root, "local").join("b.jpg")).unwrap();

    let pipeline = Pipeline::new(&root, small_config());
    let outcomes = pipeline.process_all_projects(None);
    assert_eq!(outcomes.keys().collect::<Vec<_>>(), vec!["linked", "local"]);
    assert!(matches!(&outcomes["linked"], ProjectOutcome::Processed(r) if r.processed == ["a.jpg"]));
    assert!(matches!(&outcomes["local"], ProjectOutcome::Processed(r) if r.processed == ["b.jpg"]));

    assert_eq!(dims(&rendition(&root, "linked", "thumb", "a.jpg")), (40, 26));
    assert_eq!(dims(&rendition(&root, "local", "thumb", "b.jpg")), (40, 26));

    let manifest = pipeline.build_manifest().unwrap();
    assert_eq!(manifest.keys().collect::<Vec<_>>(), vec!["linked", "local"]);
}

#[test]
fn manifest_reflects_renditions_on_disk() {
    let tmp = TempDir::new().unwrap();
    write_jpeg(&project(tmp.path(), "p").join("a.jpg"), 300, 200);

    let pipeline = Pipeline::new(tmp.path(), small_config());
    pipeline.process_project("p", None).unwrap();
    fs::remove_file(rendition(tmp.path(), "p", "medium", "a.jpg")).unwrap();
    fs::remove_file(rendition(tmp.path(), "p", "xlarge", "a.jpg")).unwrap();

    let manifest = manifest::build_manifest(tmp.path(), pipeline.config()).unwrap();
    assert_eq!(
        manifest["p"][0].srcset,
        "/workshops/p/sizes/thumb/a.jpg 40w, /workshops/p/sizes/large/a.jpg 120w"
    );
}

// =========================================================================
// Configuration from disk
// =========================================================================

#[test]
fn pipeline_toml_drives_renditions_and_urls() {
    let tmp = TempDir::new().unwrap();
    fs::write(
        tmp.path().join(config::CONFIG_FILENAME),
        r#"
[[renditions]]
name = "sm"
bound = 50

[[renditions]]
name = "lg"
bound = 150

[encoding]
quality = 70

[manifest]
url_prefix = "https://cdn.example.com/media"
"#,
    )
    .unwrap();
    write_jpeg(&project(tmp.path(), "p").join("a.jpg"), 200, 100);

    let loaded = config::load_config(&tmp.path().join(config::CONFIG_FILENAME)).unwrap();
    let pipeline = Pipeline::new(tmp.path(), loaded);
    pipeline.process_project("p", None).unwrap();

    assert_eq!(dims(&rendition(tmp.path(), "p", "sm", "a.jpg")), (50, 25));
    assert_eq!(dims(&rendition(tmp.path(), "p", "lg", "a.jpg")), (150, 75));
    assert!(!tmp.path().join("p/sizes/thumb").exists());

    let manifest = pipeline.build_manifest().unwrap();
    assert_eq!(
        manifest["p"][0].srcset,
        "https://cdn.example.com/media/p/sizes/sm/a.jpg 50w, \
         https://cdn.example.com/media/p/sizes/lg/a.jpg 150w"
    );
}
