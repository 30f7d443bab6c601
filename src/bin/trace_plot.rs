use clap::Parser;
use csv::ReaderBuilder;
use plotters::prelude::*;
use std::fs;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "Render the SoC and elevation profile of a trip trace CSV"
)]
struct Cli {
    #[arg(long)]
    input: String,
    #[arg(long, default_value = "artifacts/trace.png")]
    output: PathBuf,
    #[arg(long, default_value_t = 1200)]
    width: u32,
    #[arg(long, default_value_t = 800)]
    height: u32,
    /// Reserve SoC marked on the chart (%)
    #[arg(long, default_value_t = 25.0)]
    reserve: f64,
}

#[derive(Debug, Clone, Copy)]
struct Row {
    km: f64,
    soc: f64,
    elevation: f64,
    charge: bool,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let rows = read_rows(&cli.input)?;
    if rows.is_empty() {
        return Err(anyhow::anyhow!("No trace rows in the provided CSV"));
    }

    if let Some(parent) = cli.output.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    let output_str = cli
        .output
        .to_str()
        .ok_or_else(|| anyhow::anyhow!("Output path contains invalid UTF-8"))?;
    let root = BitMapBackend::new(output_str, (cli.width, cli.height)).into_drawing_area();
    root.fill(&WHITE)?;

    let font_family = select_font_family();
    let caption_font = FontDesc::new(font_family, 24.0, FontStyle::Bold);
    let label_font = FontDesc::new(font_family, 16.0, FontStyle::Normal);

    let max_km = rows.iter().map(|r| r.km).fold(0.0_f64, f64::max).max(1.0);
    let soc_min = rows.iter().map(|r| r.soc).fold(0.0_f64, f64::min);
    let soc_max = rows.iter().map(|r| r.soc).fold(100.0_f64, f64::max);
    let (elev_min, elev_max) = padded_range(rows.iter().map(|r| r.elevation));

    let (soc_area, elev_area) = root.split_vertically((cli.height as f64 * 0.6) as u32);

    {
        let mut chart = ChartBuilder::on(&soc_area)
            .margin(20)
            .caption("State of charge", caption_font.clone())
            .x_label_area_size(40)
            .y_label_area_size(70)
            .build_cartesian_2d(0.0..max_km, soc_min..soc_max)?;

        chart
            .configure_mesh()
            .x_desc("Distance (km)")
            .y_desc("SoC (%)")
            .label_style(label_font.clone())
            .draw()?;

        chart.draw_series(std::iter::once(PathElement::new(
            rows.iter().map(|r| (r.km, r.soc)).collect::<Vec<_>>(),
            ShapeStyle::from(&BLUE).stroke_width(2),
        )))?;
        chart.draw_series(std::iter::once(PathElement::new(
            vec![(0.0, cli.reserve), (max_km, cli.reserve)],
            ShapeStyle::from(&RED.mix(0.7)).stroke_width(1),
        )))?;

        let marker = RGBColor(210, 100, 20);
        chart.draw_series(
            rows.iter()
                .filter(|r| r.charge)
                .map(|r| Circle::new((r.km, r.soc), 5, marker.filled())),
        )?;
    }

    {
        let mut chart = ChartBuilder::on(&elev_area)
            .margin(20)
            .caption("Elevation", caption_font)
            .x_label_area_size(40)
            .y_label_area_size(70)
            .build_cartesian_2d(0.0..max_km, elev_min..elev_max)?;

        chart
            .configure_mesh()
            .x_desc("Distance (km)")
            .y_desc("Elevation (m)")
            .label_style(label_font)
            .draw()?;

        let green = RGBColor(40, 140, 60);
        let profile: Vec<(f64, f64)> = rows
            .iter()
            .filter(|r| !r.charge)
            .map(|r| (r.km, r.elevation))
            .collect();
        if let (Some(first), Some(last)) = (profile.first(), profile.last()) {
            let mut outline = profile.clone();
            outline.push((last.0, elev_min));
            outline.push((first.0, elev_min));
            chart.draw_series(std::iter::once(Polygon::new(outline, green.mix(0.3).filled())))?;
        }
        chart.draw_series(std::iter::once(PathElement::new(
            profile,
            ShapeStyle::from(&green).stroke_width(2),
        )))?;
    }

    root.present()?;
    Ok(())
}

fn padded_range(values: impl Iterator<Item = f64>) -> (f64, f64) {
    let (lo, hi) = values.fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
        (lo.min(v), hi.max(v))
    });
    if !lo.is_finite() || !hi.is_finite() {
        return (0.0, 1.0);
    }
    let pad = ((hi - lo) * 0.1).max(10.0);
    (lo - pad, hi + pad)
}

fn select_font_family() -> FontFamily<'static> {
    if cfg!(target_os = "macos") {
        FontFamily::Name("Helvetica")
    } else if cfg!(target_os = "windows") {
        FontFamily::Name("Arial")
    } else {
        FontFamily::Name("DejaVu Sans")
    }
}

fn read_rows(path: &str) -> anyhow::Result<Vec<Row>> {
    let mut rdr = ReaderBuilder::new().has_headers(true).from_path(path)?;
    let headers = rdr.headers()?.clone();
    let column = |name: &str| {
        headers
            .iter()
            .position(|h| h.eq_ignore_ascii_case(name))
            .ok_or_else(|| anyhow::anyhow!("CSV missing '{name}' column"))
    };
    let kind_idx = column("kind")?;
    let km_idx = column("cumulative_km")?;
    let soc_idx = column("soc_percent")?;
    let elev_idx = column("elevation_m")?;

    let mut rows = Vec::new();
    for rec in rdr.records() {
        let r = rec?;
        let km: f64 = r.get(km_idx).unwrap_or("").parse().unwrap_or(f64::NAN);
        let soc: f64 = r.get(soc_idx).unwrap_or("").parse().unwrap_or(f64::NAN);
        let elevation: f64 = r.get(elev_idx).unwrap_or("").parse().unwrap_or(0.0);
        let charge = r.get(kind_idx).unwrap_or("").eq_ignore_ascii_case("charge");
        if km.is_finite() && soc.is_finite() {
            rows.push(Row {
                km,
                soc,
                elevation,
                charge,
            });
        }
    }
    Ok(rows)
}
