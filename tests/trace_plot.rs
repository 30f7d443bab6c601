use assert_cmd::Command;
use std::fs::{self, File};
use std::io::Write;

#[test]
fn trace_plot_renders_png() {
    let dir = tempfile::tempdir().expect("tempdir");
    let csv_path = dir.path().join("trace.csv");
    let png_path = dir.path().join("plots").join("trace.png");

    let mut file = File::create(&csv_path).expect("csv create");
    writeln!(
        file,
        "kind,distance_m,cumulative_km,energy_kwh,elevation_m,grade_percent,soc_percent"
    )
    .unwrap();
    let mut soc = 40.0;
    for i in 1..=12 {
        soc -= 1.5;
        let elevation = 300.0 + (i as f64 * 0.7).sin() * 80.0;
        writeln!(
            file,
            "drive,5000.0,{:.3},0.5662,{elevation:.1},0.00,{soc:.2}",
            i as f64 * 5.0
        )
        .unwrap();
        if i == 6 {
            writeln!(file, "charge,0.0,30.000,-29.1000,{elevation:.1},0.00,100.00").unwrap();
            soc = 100.0;
        }
    }

    Command::cargo_bin("trace_plot")
        .expect("trace_plot bin")
        .args([
            "--input",
            csv_path.to_str().unwrap(),
            "--output",
            png_path.to_str().unwrap(),
            "--width",
            "400",
            "--height",
            "300",
        ])
        .assert()
        .success();

    let metadata = fs::metadata(png_path).expect("png metadata");
    assert!(metadata.len() > 0, "PNG output should not be empty");
}

#[test]
fn trace_plot_rejects_csv_without_trace_columns() {
    let dir = tempfile::tempdir().expect("tempdir");
    let csv_path = dir.path().join("other.csv");
    fs::write(&csv_path, "a,b\n1,2\n").expect("write");

    Command::cargo_bin("trace_plot")
        .expect("trace_plot bin")
        .args([
            "--input",
            csv_path.to_str().unwrap(),
            "--output",
            dir.path().join("out.png").to_str().unwrap(),
        ])
        .assert()
        .failure();
}
