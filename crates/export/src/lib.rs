//! Export helpers for CSV and JSON artifacts.

use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::Path;

/// Create a writer for the target path, handling stdout (`-`) by convention.
pub fn writer_for_path(path: &Path) -> io::Result<Box<dyn Write>> {
    if path == Path::new("-") {
        return Ok(Box::new(BufWriter::new(io::stdout())));
    }
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    let file = File::create(path)?;
    Ok(Box::new(BufWriter::new(file)))
}

pub mod trace {
    use std::io::{self, Write};

    use ev_planner::{TraceEntry, TraceKind};

    pub const HEADER: &str =
        "kind,distance_m,cumulative_km,energy_kwh,elevation_m,grade_percent,soc_percent";

    /// Write the standard trace CSV header.
    pub fn write_header(writer: &mut dyn Write) -> io::Result<()> {
        writeln!(writer, "{}", HEADER)
    }

    /// CSV row emitted by the trace exporter.
    #[derive(Debug, Clone, Copy)]
    pub struct Record<'a> {
        pub entry: &'a TraceEntry,
    }

    impl Record<'_> {
        /// Serialize the record to CSV, matching the standard header ordering.
        pub fn write_to(&self, writer: &mut dyn Write) -> io::Result<()> {
            let e = self.entry;
            let kind = match e.kind {
                TraceKind::Drive => "drive",
                TraceKind::Charge => "charge",
            };
            writeln!(
                writer,
                "{},{:.1},{:.3},{:.4},{:.1},{:.2},{:.2}",
                kind,
                e.distance_m,
                e.cumulative_distance_m / 1_000.0,
                e.energy_kwh,
                e.elevation_m,
                e.grade * 100.0,
                e.soc_percent,
            )
        }
    }

    /// Header plus one row per trace entry.
    pub fn write_trace(writer: &mut dyn Write, trace: &[TraceEntry]) -> io::Result<()> {
        write_header(writer)?;
        for entry in trace {
            Record { entry }.write_to(writer)?;
        }
        writer.flush()
    }
}

pub mod summary {
    use std::io::{self, Write};
    use std::path::Path;

    use chrono::{SecondsFormat, Utc};
    use ev_planner::providers::ChargerCandidate;
    use ev_planner::{ChargeEvent, EnergyBreakdown, Feasibility, TripEnvironment, TripPlan};
    use serde::Serialize;
    use serde_json::to_writer_pretty;

    /// Labels describing the request that produced a plan.
    #[derive(Debug)]
    pub struct Metadata<'a> {
        pub vehicle: &'a str,
        pub origin: &'a str,
        pub destination: &'a str,
        pub start_soc_percent: f64,
    }

    #[derive(Serialize)]
    struct SummarySidecar<'a> {
        generated_at: String,
        vehicle: &'a str,
        origin: &'a str,
        destination: &'a str,
        start_soc_percent: f64,
        distance_km: f64,
        duration_min: f64,
        energy_consumed_kwh: f64,
        final_soc_percent: f64,
        min_soc_percent: f64,
        feasibility: Feasibility,
        rescue_iterations: usize,
        route_complexity: f64,
        environment: TripEnvironment,
        breakdown: EnergyBreakdown,
        injected_stops: &'a [ChargerCandidate],
        charge_events: &'a [ChargeEvent],
    }

    /// Write the pretty-printed JSON summary of `plan` to `output` (`-` for stdout).
    pub fn write_summary(output: &Path, meta: &Metadata<'_>, plan: &TripPlan) -> io::Result<()> {
        let sidecar = SummarySidecar {
            generated_at: Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true),
            vehicle: meta.vehicle,
            origin: meta.origin,
            destination: meta.destination,
            start_soc_percent: meta.start_soc_percent,
            distance_km: plan.distance_km,
            duration_min: plan.duration_min,
            energy_consumed_kwh: plan.energy_consumed_kwh,
            final_soc_percent: plan.final_soc_percent,
            min_soc_percent: plan.min_soc_percent,
            feasibility: plan.feasibility,
            rescue_iterations: plan.rescue_iterations,
            route_complexity: plan.route_complexity,
            environment: plan.environment,
            breakdown: plan.breakdown,
            injected_stops: &plan.injected_stops,
            charge_events: &plan.charge_events,
        };
        let mut writer = super::writer_for_path(output)?;
        to_writer_pretty(&mut writer, &sidecar)?;
        writeln!(writer)?;
        writer.flush()
    }
}

#[cfg(test)]
mod tests {
    use super::trace;
    use ev_planner::{TraceEntry, TraceKind};

    #[test]
    fn trace_rows_follow_the_header() {
        let entries = vec![
            TraceEntry {
                kind: TraceKind::Drive,
                distance_m: 5_012.3,
                cumulative_distance_m: 5_012.3,
                energy_kwh: 0.5678,
                elevation_m: 411.0,
                grade: 0.012,
                soc_percent: 48.5,
            },
            TraceEntry {
                kind: TraceKind::Charge,
                distance_m: 0.0,
                cumulative_distance_m: 5_012.3,
                energy_kwh: -20.0,
                elevation_m: 411.0,
                grade: 0.0,
                soc_percent: 100.0,
            },
        ];
        let mut buffer = Vec::new();
        trace::write_trace(&mut buffer, &entries).expect("write");
        let text = String::from_utf8(buffer).expect("utf8");
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], trace::HEADER);
        assert_eq!(lines[1], "drive,5012.3,5.012,0.5678,411.0,1.20,48.50");
        assert!(lines[2].starts_with("charge,0.0,5.012,-20.0000"));
    }

    #[test]
    fn writer_creates_missing_parent_directories() {
        use std::io::Write;

        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("nested").join("trace.csv");
        {
            let mut writer = super::writer_for_path(&path).expect("writer");
            trace::write_header(writer.as_mut()).expect("header");
            writer.flush().expect("flush");
        }
        let text = std::fs::read_to_string(&path).expect("read back");
        assert_eq!(text.trim_end(), trace::HEADER);
    }
}
