//! End-to-end batch runs over files on disk

use image::{Rgb, RgbImage};
use std::path::Path;
use vmap_batch::{BatchProcessor, BatchReport, FileImageSource, ItemOutcome, VmapConfig};
use vmap_common::SpaceCategory;
use vmap_floor_plan::{Direction, LayoutStrategy, SiteInfo};

fn write_png(dir: &Path, name: &str, image: &RgbImage) -> FileImageSource {
    let path = dir.join(name);
    image.save(&path).unwrap();
    FileImageSource::new(path)
}

fn survey(dir: &Path) -> Vec<FileImageSource> {
    let bright = RgbImage::from_pixel(96, 48, Rgb([230, 230, 230]));
    let dark = RgbImage::from_pixel(96, 48, Rgb([15, 15, 15]));
    let broken = dir.join("IMG_0002.png");
    std::fs::write(&broken, b"not a png").unwrap();

    vec![
        write_png(dir, "IMG_0001.png", &bright),
        FileImageSource::new(broken),
        write_png(dir, "IMG_0003.png", &dark),
        write_png(dir, "IMG_0004.png", &bright),
    ]
}

#[test]
fn test_batch_survives_undecodable_file() {
    let dir = tempfile::tempdir().unwrap();
    let sources = survey(dir.path());
    let processor = BatchProcessor::new(VmapConfig::default()).unwrap();
    let report = processor.run(&sources);

    assert_eq!(report.total, 4);
    assert_eq!(report.processed, 3);
    assert_eq!(report.errors, 1);
    assert_eq!(report.cancelled, 0);
    assert_eq!(report.failures[0].filename, "IMG_0002.png");
    assert_eq!(report.failures[0].kind, "decode");
    assert_eq!(report.categories.get("common_area"), Some(&2));
    assert_eq!(report.categories.get("unknown"), Some(&1));
    assert_eq!(report.files[1].category, SpaceCategory::Unknown);
    assert_eq!(report.files[1].dimensions.width, 96);
}

#[test]
fn test_parallel_and_sequential_agree() {
    let dir = tempfile::tempdir().unwrap();
    let sources = survey(dir.path());

    let parallel = BatchProcessor::new(VmapConfig::default()).unwrap();
    let sequential = BatchProcessor::new(VmapConfig {
        parallel: false,
        ..Default::default()
    })
    .unwrap();

    let a = parallel.process(&sources);
    let b = sequential.process(&sources);
    assert_eq!(a, b);
    let names: Vec<&str> = a.iter().map(ItemOutcome::filename).collect();
    assert_eq!(
        names,
        vec!["IMG_0001.png", "IMG_0002.png", "IMG_0003.png", "IMG_0004.png"]
    );
}

#[test]
fn test_missing_file_is_io_failure() {
    let processor = BatchProcessor::new(VmapConfig::default()).unwrap();
    let outcome = processor.process_item(&FileImageSource::new("/nonexistent/IMG_9.jpg"));
    match outcome {
        ItemOutcome::Failed(error) => assert_eq!(error.kind, "io"),
        other => panic!("unexpected outcome: {other:?}"),
    }
}

#[test]
fn test_report_json_round_trips() {
    let dir = tempfile::tempdir().unwrap();
    let processor = BatchProcessor::new(VmapConfig::default()).unwrap();
    let report = processor.run(&survey(dir.path()));

    let json = report.to_json_pretty().unwrap();
    let parsed: BatchReport = serde_json::from_str(&json).unwrap();
    assert_eq!(parsed, report);
}

#[test]
fn test_layout_export_covers_failed_items_too() {
    let dir = tempfile::tempdir().unwrap();
    let sources = survey(dir.path());
    let config = VmapConfig {
        strategy: LayoutStrategy::Linear,
        site: SiteInfo {
            building: Some("Library".to_string()),
            floor: Some(0),
            wing: Some("North".to_string()),
        },
        ..Default::default()
    };
    let processor = BatchProcessor::new(config).unwrap();
    let export = processor.export_layout(&sources).unwrap();

    assert_eq!(export.total_images, 4);
    assert_eq!(export.layout, LayoutStrategy::Linear);
    assert_eq!(export.building.as_deref(), Some("Library"));
    assert_eq!(export.positions[1].filename, "IMG_0002.png");
    assert_eq!(export.positions[3].coordinates.x, 30.0);
    let last = &export.positions[3].connections;
    assert_eq!(last.len(), 1);
    assert_eq!(last[0].target_id, 3);
    assert_eq!(last[0].direction, Direction::Back);
}

#[test]
fn test_records_carry_file_metadata() {
    let dir = tempfile::tempdir().unwrap();
    let sources = survey(dir.path());
    let processor = BatchProcessor::new(VmapConfig::default()).unwrap();
    let report = processor.run(&sources);

    let first = &report.files[0];
    let on_disk = std::fs::metadata(dir.path().join("IMG_0001.png")).unwrap().len();
    assert_eq!(first.file_size, Some(on_disk));
    assert_eq!(
        first.hash.map(|h| h.to_string()).as_deref(),
        Some("0000000000000000")
    );
    assert_eq!(first.dominant_colors, vec![[230, 230, 230]]);
    assert_eq!(report.files[1].dominant_colors, vec![[15, 15, 15]]);
}

#[test]
fn test_organize_groups_renamed_survey() {
    let dir = tempfile::tempdir().unwrap();
    let config = VmapConfig {
        rename: true,
        organize: true,
        ..Default::default()
    };
    let processor = BatchProcessor::new(config)
        .unwrap()
        .with_rename_date(chrono::NaiveDate::from_ymd_opt(2024, 3, 7).unwrap());
    let report = processor.run(&survey(dir.path()));

    assert_eq!(
        report.sequence_groups["seq_000-009"],
        vec![
            "common_area_0001_20240307.png",
            "unknown_0003_20240307.png",
            "common_area_0004_20240307.png",
        ]
    );
    let json = report.to_json_pretty().unwrap();
    let value: serde_json::Value = serde_json::from_str(&json).unwrap();
    assert_eq!(value["files"][2]["sequence_group"], "seq_000-009");
}
