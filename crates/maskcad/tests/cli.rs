//! Command-line behavior: files in, DXF out.

#![allow(clippy::unwrap_used)]

use std::path::{Path, PathBuf};

use assert_cmd::Command;
use image::{GrayImage, Luma};
use predicates::prelude::*;

/// Writes a 100x100 manifest with one square mask per `(lo, hi)` pair.
fn fixture(dir: &Path, squares: &[(u32, u32)]) -> PathBuf {
    let mut entries = Vec::new();
    for (i, (lo, hi)) in squares.iter().enumerate() {
        let image = GrayImage::from_fn(100, 100, |x, y| {
            Luma([if (*lo..*hi).contains(&x) && (*lo..*hi).contains(&y) {
                255
            } else {
                0
            }])
        });
        let name = format!("mask{i}.png");
        image.save(dir.join(&name)).unwrap();
        entries.push(format!(r#"{{"path": "{name}", "score": 0.9}}"#));
    }
    let manifest = dir.join("manifest.json");
    std::fs::write(
        &manifest,
        format!(
            r#"{{"image": {{"width": 100, "height": 100}}, "masks": [{}]}}"#,
            entries.join(",")
        ),
    )
    .unwrap();
    manifest
}

fn maskcad() -> Command {
    Command::cargo_bin("maskcad").unwrap()
}

#[test]
fn exports_dxf_and_prints_report() {
    let dir = tempfile::tempdir().unwrap();
    let manifest = fixture(dir.path(), &[(10, 50), (60, 90)]);
    let out = dir.path().join("out.dxf");

    maskcad()
        .arg(&manifest)
        .arg("-o")
        .arg(&out)
        .assert()
        .success()
        .stdout(predicate::str::contains("exported 2/2 masks: 2 entities"));

    let dxf = std::fs::read_to_string(&out).unwrap();
    assert!(dxf.contains("AC1032"));
    assert_eq!(dxf.matches("LWPOLYLINE").count(), 2);
    assert!(dxf.contains("  9\n$DWGTITLE\n  1\nmanifest\n"));
    assert!(dxf.contains("  9\n$DWGAUTHOR\n  1\nmaskcad\n"));
}

/// Adds a mask entry to a fixture manifest.
fn add_entry(manifest: &Path, entry: &str) {
    let text = std::fs::read_to_string(manifest).unwrap();
    let text = text.replacen("\"masks\": [", &format!("\"masks\": [{entry}, "), 1);
    std::fs::write(manifest, text).unwrap();
}

#[test]
fn bad_mask_is_reported_and_the_rest_exported() {
    let dir = tempfile::tempdir().unwrap();
    let manifest = fixture(dir.path(), &[(10, 50), (60, 90)]);
    // Valid image, score out of range: becomes mask 0.
    add_entry(&manifest, r#"{"path": "mask0.png", "score": 1.5}"#);
    let out = dir.path().join("out.dxf");

    maskcad()
        .arg(&manifest)
        .arg("-o")
        .arg(&out)
        .assert()
        .success()
        .stdout(predicate::str::contains("exported 2/3 masks: 2 entities"))
        .stdout(predicate::str::contains("1 failed"))
        .stdout(predicate::str::contains("mask 0: load stage failed"))
        .stdout(predicate::str::contains("1.5"));

    let dxf = std::fs::read_to_string(&out).unwrap();
    assert_eq!(dxf.matches("LWPOLYLINE").count(), 2);
}

#[test]
fn invalid_config_is_reported_before_masks_are_read() {
    let dir = tempfile::tempdir().unwrap();
    let manifest = fixture(dir.path(), &[(10, 50)]);
    add_entry(&manifest, r#"{"path": "gone.png"}"#);
    let out = dir.path().join("out.dxf");

    maskcad()
        .arg(&manifest)
        .args(["--scale", "0", "-o"])
        .arg(&out)
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid transform"))
        .stderr(predicate::str::contains("gone.png").not());

    assert!(!out.exists());
}

#[test]
fn annotate_flag_writes_labels() {
    let dir = tempfile::tempdir().unwrap();
    let manifest = fixture(dir.path(), &[(10, 50)]);
    add_entry(&manifest, r#"{"path": "mask0.png", "label": "wall"}"#);
    let out = dir.path().join("out.dxf");

    maskcad()
        .arg(&manifest)
        .args(["--annotate", "--text-height", "4", "-o"])
        .arg(&out)
        .assert()
        .success()
        .stdout(predicate::str::contains("1 labels"));

    let dxf = std::fs::read_to_string(&out).unwrap();
    assert_eq!(dxf.matches("\nTEXT\n").count(), 1);
    assert!(dxf.contains("  8\nMASKCAD_TEXT\n"));
    assert!(dxf.contains(" 40\n4.0\n  1\nwall\n"));
}

#[test]
fn version_and_units_flags_apply() {
    let dir = tempfile::tempdir().unwrap();
    let manifest = fixture(dir.path(), &[(10, 50)]);
    let out = dir.path().join("out.dxf");

    maskcad()
        .arg(&manifest)
        .args(["--version", "R2000", "--units", "cm", "-o"])
        .arg(&out)
        .assert()
        .success();

    let dxf = std::fs::read_to_string(&out).unwrap();
    assert!(dxf.contains("AC1015"));
    assert!(dxf.contains("  9\n$INSUNITS\n 70\n5\n"));
}

#[test]
fn unsupported_version_writes_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let manifest = fixture(dir.path(), &[(10, 50)]);
    let out = dir.path().join("out.dxf");

    maskcad()
        .arg(&manifest)
        .args(["--version", "R14", "-o"])
        .arg(&out)
        .assert()
        .failure()
        .stderr(predicate::str::contains("unsupported DXF version"));

    assert!(!out.exists());
}

#[test]
fn invalid_scale_fails_before_writing() {
    let dir = tempfile::tempdir().unwrap();
    let manifest = fixture(dir.path(), &[(10, 50)]);
    let out = dir.path().join("out.dxf");

    maskcad()
        .arg(&manifest)
        .args(["--scale", "-2", "-o"])
        .arg(&out)
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid transform"));

    assert!(!out.exists());
}

#[test]
fn area_preset_names_layers() {
    let dir = tempfile::tempdir().unwrap();
    let manifest = fixture(dir.path(), &[(10, 50)]);
    let out = dir.path().join("out.dxf");

    maskcad()
        .arg(&manifest)
        .args(["--layer-preset", "area", "--layer-prefix", "WALL", "-o"])
        .arg(&out)
        .assert()
        .success();

    // 40x40 square: 1600 units², the medium band.
    let dxf = std::fs::read_to_string(&out).unwrap();
    assert!(dxf.contains("WALL_MEDIUM"));
}

#[test]
fn json_report_and_svg_preview() {
    let dir = tempfile::tempdir().unwrap();
    let manifest = fixture(dir.path(), &[(10, 50)]);
    let out = dir.path().join("out.dxf");
    let svg = dir.path().join("preview.svg");

    let assert = maskcad()
        .arg(&manifest)
        .arg("--json")
        .arg("--svg")
        .arg(&svg)
        .arg("-o")
        .arg(&out)
        .assert()
        .success();

    let stdout = String::from_utf8(assert.get_output().stdout.clone()).unwrap();
    assert!(stdout.contains("\"entities_written\": 1"));
    assert!(std::fs::read_to_string(&svg).unwrap().contains("<path"));
}

#[test]
fn missing_manifest_fails() {
    let dir = tempfile::tempdir().unwrap();
    maskcad()
        .arg(dir.path().join("nope.json"))
        .arg("-o")
        .arg(dir.path().join("out.dxf"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("nope.json"));
}

#[test]
fn config_file_is_read() {
    let dir = tempfile::tempdir().unwrap();
    let manifest = fixture(dir.path(), &[(10, 50)]);
    let config = dir.path().join("config.json");
    std::fs::write(&config, r#"{"dxf_version": "R12", "transform": {"scale": 2.0}}"#).unwrap();
    let out = dir.path().join("out.dxf");

    maskcad()
        .arg(&manifest)
        .arg("--config")
        .arg(&config)
        .arg("-o")
        .arg(&out)
        .assert()
        .success();

    let dxf = std::fs::read_to_string(&out).unwrap();
    assert!(dxf.contains("AC1009"));
    assert!(dxf.contains("POLYLINE"));
    // Top-left pixel corner (10, 10) lands at (20, 180) with scale 2.
    assert!(dxf.contains(" 10\n20.0\n 20\n180.0\n"));
}
