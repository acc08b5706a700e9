use assert_cmd::prelude::*;
use image::{GenericImageView, ImageBuffer, Rgb};
use predicates::prelude::*;
use std::path::Path;
use std::process::Command;
use tempfile::TempDir;

fn write_fixture(path: &Path, width: u32, height: u32) {
    let data: Vec<u8> = (0..width * height * 3)
        .map(|i| ((i * 29 + i / 5 * 7) % 256) as u8)
        .collect();
    let img: ImageBuffer<Rgb<u8>, Vec<u8>> = ImageBuffer::from_raw(width, height, data).unwrap();
    img.save(path).unwrap();
}

fn seamcarve() -> Command {
    Command::cargo_bin("seamcarve").unwrap()
}

#[test]
fn narrows_to_a_pixel_width() {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("in.png");
    let output = dir.path().join("out.png");
    write_fixture(&input, 12, 8);

    seamcarve()
        .arg(&input)
        .arg("-o")
        .arg(&output)
        .args(&["-w", "9"])
        .assert()
        .success();

    assert_eq!(image::open(&output).unwrap().dimensions(), (9, 8));
}

#[test]
fn narrows_by_a_fraction_and_writes_diagnostics() {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("in.png");
    let output = dir.path().join("out.png");
    let energy = dir.path().join("energy.png");
    let seams = dir.path().join("seams.png");
    write_fixture(&input, 10, 6);

    seamcarve()
        .arg(&input)
        .arg("-o")
        .arg(&output)
        .args(&["--width", "0.5"])
        .arg("--energy")
        .arg(&energy)
        .arg("--seams")
        .arg(&seams)
        .assert()
        .success();

    assert_eq!(image::open(&output).unwrap().dimensions(), (5, 6));
    assert_eq!(image::open(&energy).unwrap().dimensions(), (6, 6));
    assert_eq!(image::open(&seams).unwrap().dimensions(), (6, 6));
}

#[test]
fn refuses_to_shrink_the_height() {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("in.png");
    let output = dir.path().join("out.png");
    write_fixture(&input, 6, 6);

    seamcarve()
        .arg(&input)
        .arg("-o")
        .arg(&output)
        .args(&["-H", "0.5"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("not supported"));

    assert!(!output.exists());
}

#[test]
fn refuses_to_widen() {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("in.png");
    write_fixture(&input, 6, 4);

    seamcarve()
        .arg(&input)
        .arg("-o")
        .arg(dir.path().join("out.png"))
        .args(&["-w", "7"])
        .assert()
        .failure();
}

#[test]
fn reports_a_missing_input() {
    let dir = TempDir::new().unwrap();

    seamcarve()
        .arg(dir.path().join("missing.png"))
        .arg("-o")
        .arg(dir.path().join("out.png"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("failed to load"));
}

#[test]
fn rejects_a_zero_blur_sigma() {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("in.png");
    let output = dir.path().join("out.png");
    write_fixture(&input, 6, 4);

    seamcarve()
        .arg(&input)
        .arg("-o")
        .arg(&output)
        .args(&["-w", "5", "--sigma", "0"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("positive number"));

    assert!(!output.exists());
}

#[test]
fn a_bare_one_keeps_the_full_width() {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("in.png");
    let output = dir.path().join("out.png");
    write_fixture(&input, 6, 4);

    seamcarve()
        .arg(&input)
        .arg("-o")
        .arg(&output)
        .args(&["-w", "1"])
        .assert()
        .success();

    assert_eq!(image::open(&output).unwrap().dimensions(), (6, 4));
}
