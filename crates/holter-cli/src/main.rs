use anyhow::{Context, Result};
use chrono::NaiveDateTime;
use clap::{Parser, Subcommand};
use holter_lib::{
    io::RecordReader,
    measure::Measurements,
    wave::{Wave, WaveTag},
};
use plotters::prelude::*;
use serde::Serialize;
use std::path::{Path, PathBuf};

const START_TIME_FORMAT: &str = "%Y/%m/%d %H:%M:%S%.f";

#[derive(Parser)]
#[command(
    name = "holter",
    version,
    about = "Analyse a Holter record and print valuable information about delineation"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Aggregate a record into rhythm statistics and wave counts
    Analyse {
        /// Holter record file
        #[arg(short, long, value_name = "INFILE")]
        file: PathBuf,
        /// Record's wall-clock start time
        #[arg(
            short,
            long,
            value_name = "RECORD_START_TIME",
            default_value = "1970/01/01 00:00:00.000"
        )]
        start_time: String,
        /// Render the heart-rate chart to this PNG file
        #[arg(long, value_name = "OUT")]
        plot: Option<PathBuf>,
        /// Emit the report as one JSON object instead of text
        #[arg(long)]
        json: bool,
    },
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();
    match cli.command {
        Commands::Analyse {
            file,
            start_time,
            plot,
            json,
        } => cmd_analyse(&file, &start_time, plot.as_deref(), json)?,
    }
    Ok(())
}

#[derive(Debug, Serialize)]
struct RatePoint {
    bpm: i64,
    time: NaiveDateTime,
}

#[derive(Debug, Serialize)]
struct WaveCounts {
    p: usize,
    qrs: usize,
    t: usize,
    inv: usize,
}

#[derive(Debug, Serialize)]
struct Report {
    record_start: NaiveDateTime,
    record_end: NaiveDateTime,
    mean_period_ms: f64,
    mean_heartrate_bpm: Option<i64>,
    /// Slowest rate, i.e. the longest observed period.
    min_heartrate: Option<RatePoint>,
    /// Fastest rate, i.e. the shortest observed period.
    max_heartrate: Option<RatePoint>,
    counts: WaveCounts,
    p_premature: usize,
    qrs_premature: usize,
}

fn to_bpm(period_ms: f64) -> Option<i64> {
    if period_ms > 0.0 {
        Some((1000.0 * 60.0 / period_ms).round() as i64)
    } else {
        None
    }
}

fn premature_count(waves: &[Wave]) -> usize {
    waves
        .iter()
        .filter(|wave| wave.has_tag(WaveTag::Premature))
        .count()
}

fn build_report(measurements: &Measurements, record_start: NaiveDateTime) -> Report {
    let summary = measurements.summary();
    Report {
        record_start,
        record_end: measurements.time_last_sampling(),
        mean_period_ms: summary.average,
        mean_heartrate_bpm: to_bpm(summary.average),
        min_heartrate: summary.max.and_then(|extremum| {
            to_bpm(extremum.period).map(|bpm| RatePoint {
                bpm,
                time: extremum.time,
            })
        }),
        max_heartrate: summary.min.and_then(|extremum| {
            to_bpm(extremum.period).map(|bpm| RatePoint {
                bpm,
                time: extremum.time,
            })
        }),
        counts: WaveCounts {
            p: measurements.p().len(),
            qrs: measurements.qrs().len(),
            t: measurements.t().len(),
            inv: measurements.inv().len(),
        },
        p_premature: premature_count(measurements.p()),
        qrs_premature: premature_count(measurements.qrs()),
    }
}

fn print_report(report: &Report) {
    println!("Record start time: {}", report.record_start);
    println!("Record end time: {}", report.record_end);
    println!("mean period QRS: {} ms", report.mean_period_ms.round());
    match report.mean_heartrate_bpm {
        Some(bpm) => println!("mean heartrate: {} heartbeats/min", bpm),
        None => println!("mean heartrate: unavailable (no heartbeat period observed)"),
    }
    match &report.min_heartrate {
        Some(point) => println!("min heartrate: {}BpM ({})", point.bpm, point.time),
        None => println!("min heartrate: unavailable"),
    }
    match &report.max_heartrate {
        Some(point) => println!("max heartrate: {}BpM ({})", point.bpm, point.time),
        None => println!("max heartrate: unavailable"),
    }
    println!(
        "P: {}, QRS: {}, T: {}, INV: {}",
        report.counts.p, report.counts.qrs, report.counts.t, report.counts.inv
    );
    println!("P premature: {}", report.p_premature);
    println!("QRS premature: {}", report.qrs_premature);
}

fn cmd_analyse(
    file: &Path,
    start_time: &str,
    plot: Option<&Path>,
    json: bool,
) -> Result<()> {
    let record_start = NaiveDateTime::parse_from_str(start_time, START_TIME_FORMAT)
        .with_context(|| format!("invalid record start time {:?}", start_time))?;

    let mut measurements = Measurements::new(record_start);
    for wave in RecordReader::open(file)? {
        measurements.update(wave?);
    }

    let report = build_report(&measurements, record_start);
    if json {
        println!("{}", serde_json::to_string(&report)?);
    } else {
        print_report(&report);
    }

    if let Some(out) = plot {
        draw_chart(out, &measurements, &report)?;
    }
    Ok(())
}

fn onset_minutes(wave: &Wave) -> f64 {
    wave.timing.onset / 60_000.0
}

fn draw_chart(path: &Path, measurements: &Measurements, report: &Report) -> Result<()> {
    let heartrate: Vec<(f64, f64)> = measurements
        .heartbeat_periods()
        .iter()
        .filter(|(period, _)| *period > 0.0)
        .map(|(period, onset)| (onset / 60_000.0, 1000.0 * 60.0 / period))
        .collect();
    let inv: Vec<(f64, f64)> = measurements
        .inv()
        .iter()
        .map(|wave| (onset_minutes(wave), 10.0))
        .collect();
    let p_premature: Vec<(f64, f64)> = measurements
        .p()
        .iter()
        .filter(|wave| wave.has_tag(WaveTag::Premature))
        .map(|wave| (onset_minutes(wave), 6.0))
        .collect();
    let qrs_premature: Vec<(f64, f64)> = measurements
        .qrs()
        .iter()
        .filter(|wave| wave.has_tag(WaveTag::Premature))
        .map(|wave| (onset_minutes(wave), 2.0))
        .collect();

    let x_max = heartrate
        .iter()
        .chain(&inv)
        .chain(&p_premature)
        .chain(&qrs_premature)
        .map(|(x, _)| *x)
        .fold(0.0, f64::max)
        .max(1e-3);
    let y_max = heartrate
        .iter()
        .map(|(_, y)| *y)
        .fold(0.0, f64::max)
        .max(60.0)
        * 1.1;

    let root = BitMapBackend::new(path, (1024, 600)).into_drawing_area();
    root.fill(&WHITE)?;
    let mut chart = ChartBuilder::on(&root)
        .margin(10)
        .caption(
            format!(
                "Heartrate record from {} to {}",
                report.record_start, report.record_end
            ),
            ("sans-serif", 20),
        )
        .x_label_area_size(30)
        .y_label_area_size(40)
        .build_cartesian_2d(0.0..x_max, 0.0..y_max)?;
    chart
        .configure_mesh()
        .x_desc("time (minutes)")
        .y_desc("heartbeats / minute")
        .draw()?;

    chart
        .draw_series(LineSeries::new(heartrate, &BLUE))?
        .label("heartrate")
        .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], BLUE));
    chart
        .draw_series(inv.iter().map(|&(x, y)| Circle::new((x, y), 2, BLACK.filled())))?
        .label("INV")
        .legend(|(x, y)| Circle::new((x, y), 3, BLACK.filled()));
    chart
        .draw_series(
            p_premature
                .iter()
                .map(|&(x, y)| Circle::new((x, y), 2, RED.filled())),
        )?
        .label("P premature")
        .legend(|(x, y)| Circle::new((x, y), 3, RED.filled()));
    chart
        .draw_series(
            qrs_premature
                .iter()
                .map(|&(x, y)| Circle::new((x, y), 2, GREEN.filled())),
        )?
        .label("QRS premature")
        .legend(|(x, y)| Circle::new((x, y), 3, GREEN.filled()));

    chart
        .configure_series_labels()
        .background_style(WHITE.mix(0.8))
        .border_style(BLACK)
        .draw()?;
    root.present()?;
    Ok(())
}
