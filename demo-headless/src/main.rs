use chrono::{Datelike, Duration, NaiveDate};
use clap::Parser;
use fire_ignition_core::pipeline::{collect_table, run_batch};
use fire_ignition_core::summary::trailing_normals;
use fire_ignition_core::{
    AggregationMode, BatchRequest, BatchUnit, CoverType, DeficitRecord, DeficitSeries, ModelVersion,
    NormalSummary, NowCastWindow, ProjectionLabel, RatingConfig, RatingPipeline,
};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Fire ignition danger demo over a synthetic deficit record
#[derive(Parser, Debug)]
#[command(name = "fire-ignition-demo")]
#[command(about = "Fire ignition danger ratings, normals and now-cast", long_about = None)]
struct Args {
    /// Site identifier used in every summary row
    #[arg(short, long, default_value = "FLFOForest_1")]
    site: String,

    /// First year of the historic normal
    #[arg(long, default_value_t = 1991)]
    start_year: i32,

    /// Last year of the historic normal
    #[arg(long, default_value_t = 2020)]
    end_year: i32,

    /// Model version (v1 or v2)
    #[arg(short, long, default_value_t = ModelVersion::V2)]
    model: ModelVersion,

    /// Override the moving-average window in days
    #[arg(short, long)]
    window_days: Option<usize>,

    /// Seed for the synthetic deficit generator
    #[arg(long, default_value_t = 42)]
    seed: u64,

    /// Number of synthetic climate models per scenario
    #[arg(long, default_value_t = 4)]
    members: usize,

    /// Now-cast horizon in days
    #[arg(long, default_value_t = 60)]
    horizon: u64,

    /// Now-cast start date (YYYY-MM-DD), defaults to today
    #[arg(long)]
    today: Option<NaiveDate>,

    /// Years of single-year normals to show before the now-cast year
    #[arg(long, default_value_t = 5)]
    look_back: u32,
}

/// Synthetic daily deficit: a seasonal cycle peaking in early September,
/// a per-series `warming` scale, day-to-day noise and occasional missing
/// readings.
fn synthetic_series(
    site: &str,
    first: NaiveDate,
    last: NaiveDate,
    warming: f64,
    rng: &mut StdRng,
) -> DeficitSeries {
    let days = (last - first).num_days();
    let mut records = Vec::with_capacity(usize::try_from(days + 1).unwrap_or_default());
    let mut anomaly = 0.0_f64;
    for i in 0..=days {
        let date = first + Duration::days(i);
        let phase = (f64::from(date.ordinal()) - 244.0) / 366.0 * std::f64::consts::TAU;
        anomaly = 0.9 * anomaly + rng.random_range(-4.0..4.0);
        let reading = if rng.random_bool(0.01) {
            None
        } else {
            Some((warming * (60.0 + 50.0 * phase.cos()) + anomaly).max(0.0))
        };
        records.push(DeficitRecord::new(date, reading));
    }
    match DeficitSeries::new(site, records) {
        Ok(series) => series,
        Err(e) => {
            eprintln!("Failed to build synthetic series: {}", e);
            std::process::exit(1);
        }
    }
}

fn print_normal(normal: &NormalSummary) {
    let coverage = normal
        .now_cast_count
        .map(|n| format!("  ({} days with readings)", n))
        .unwrap_or_default();
    println!(
        "  {:<11} {:<10} {:<6} {:<10} High {:>6.1}  Medium {:>6.1}  Low {:>6.1}{}",
        normal.cover_type.label(),
        normal.date_range,
        normal.rcp_label(),
        normal.gcm_label(),
        normal.high_mean,
        normal.medium_mean,
        normal.low_mean,
        coverage
    );
}

/// Calendar date, exiting with a message when it does not exist
fn calendar_date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).unwrap_or_else(|| {
        eprintln!("Date {}-{:02}-{:02} is out of range", year, month, day);
        std::process::exit(1);
    })
}

/// January 1st `years` calendar years before `today`'s year
fn look_back_start(today: NaiveDate, years: u32) -> Option<NaiveDate> {
    let years = i32::try_from(years).ok()?;
    NaiveDate::from_ymd_opt(today.year().checked_sub(years)?, 1, 1)
}

fn fail(context: &str, e: &fire_ignition_core::IgnitionError) -> ! {
    eprintln!("{}: {}", context, e);
    std::process::exit(1);
}

fn main() {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    println!("=== Fire Ignition Danger Demo ===\n");

    info!("Generating synthetic deficits with seed {}", args.seed);
    let mut rng = StdRng::seed_from_u64(args.seed);
    let today = args
        .today
        .unwrap_or_else(|| chrono::Local::now().date_naive());
    let history_start = calendar_date(1980, 1, 1);
    let history_end = calendar_date(today.year() - 1, 12, 31);
    let history = synthetic_series(&args.site, history_start, history_end, 1.0, &mut rng);
    println!(
        "Synthetic history: {} days ({} with readings)",
        history.len(),
        history.reading_count()
    );

    // ─── Historic normals ──────────────────────────────────────────────────
    let mut config = RatingConfig::historic(&args.site).with_model_version(args.model);
    if let Some(window) = args.window_days {
        config = config.with_window_days(window);
    }
    let historic = RatingPipeline::build(config, &history)
        .unwrap_or_else(|e| fail("Historic pipeline", &e));

    let era = AggregationMode::Years {
        start: args.start_year,
        end: args.end_year,
    };
    println!("\nHistoric annual counts ({}):", era.label());
    for cover in CoverType::ALL {
        let annual = historic
            .annual(&history, cover, era)
            .unwrap_or_else(|e| fail("Annual counts", &e));
        for row in annual.iter().rev().take(5).rev() {
            println!(
                "  {:<11} {}  High {:>3}  Medium {:>3}  Low {:>3}",
                cover.label(),
                row.label,
                row.counts.high,
                row.counts.medium,
                row.counts.low
            );
        }
    }

    println!("\nHistoric normals:");
    for cover in CoverType::ALL {
        match historic.summarize(&history, cover, era, None) {
            Ok(normal) => print_normal(&normal),
            Err(e) => eprintln!("  {} normal failed: {}", cover.label(), e),
        }
    }

    // ─── Projections and ensembles ─────────────────────────────────────────
    let eras = [
        AggregationMode::years(2031, 2060),
        AggregationMode::years(2061, 2090),
    ];
    let projection_start = calendar_date(2031, 1, 1);
    let projection_end = calendar_date(2090, 12, 31);
    let mut units = Vec::new();
    for (rcp, forcing) in [("rcp45", 0.05), ("rcp85", 0.15)] {
        for member in 0..args.members {
            let gcm = format!("SYN-{}", member + 1);
            let warming = 1.0 + forcing + rng.random_range(-0.05..0.05);
            let series = synthetic_series(
                &args.site,
                projection_start,
                projection_end,
                warming,
                &mut rng,
            );
            let name = format!("deficit_{}_{}", gcm, rcp);
            let projection = match name.parse::<ProjectionLabel>() {
                Ok(label) => label,
                Err(e) => fail("Projection label", &e),
            };
            for cover in CoverType::ALL {
                for mode in eras {
                    units.push(BatchUnit {
                        name: format!("{} {} {}", name, cover, mode.label()),
                        series: series.clone(),
                        cover_type: cover,
                        request: BatchRequest::Normal(mode),
                        projection: Some(projection.clone()),
                    });
                }
            }
        }
    }

    let outcomes = run_batch(&historic, &units);
    let table = collect_table(&outcomes).unwrap_or_else(|e| fail("Ensemble table", &e));
    println!(
        "\nProjection normals: {} run(s), {} ensemble(s)",
        table.normals.len(),
        table.ensembles.len()
    );
    for ensemble in &table.ensembles {
        print!("  [{} members]", ensemble.members);
        print_normal(&ensemble.summary);
    }

    // ─── Now-cast ──────────────────────────────────────────────────────────
    let mut now_config = RatingConfig::now_cast(&args.site).with_model_version(args.model);
    if let Some(window) = args.window_days {
        now_config = now_config.with_window_days(window);
    }
    let now_cast = RatingPipeline::build(now_config, &history)
        .unwrap_or_else(|e| fail("Now-cast pipeline", &e));
    let window =
        NowCastWindow::new(today, args.horizon).unwrap_or_else(|e| fail("Now-cast window", &e));
    let current_start = look_back_start(today, args.look_back).unwrap_or_else(|| {
        eprintln!("Look-back of {} years is out of range", args.look_back);
        std::process::exit(1);
    });
    let current_end = window.last_day().unwrap_or_else(|e| fail("Now-cast window", &e));
    let current = synthetic_series(&args.site, current_start, current_end, 1.1, &mut rng);

    println!("\nNow-cast from {} to {}:", today, current_end);
    for cover in CoverType::ALL {
        match now_cast.now_cast(&current, cover, &window, None) {
            Ok(normal) => print_normal(&normal),
            Err(e) => eprintln!("  {} now-cast failed: {}", cover.label(), e),
        }
    }

    println!("\nPrevious {} years:", args.look_back);
    for cover in CoverType::ALL {
        let yearly = now_cast
            .classify_as_of(&current, cover, today)
            .and_then(|classified| {
                trailing_normals(&classified, today.year(), args.look_back, None)
            });
        match yearly {
            Ok(normals) => normals.iter().for_each(print_normal),
            Err(e) => eprintln!("  {} look-back failed: {}", cover.label(), e),
        }
    }
}
