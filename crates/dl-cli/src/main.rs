//! darklimit CLI

use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use serde::Serialize;
use std::io::Write;
use std::path::{Path, PathBuf};

use dl_core::{ExclusionCurve, LimitPoint, LimitStatus, ParticleModel};
use dl_inference::{Detector, limit_curve, limit_curve_par, upper_bound};
use dl_physics::units::{CM, GEV};

mod config;
mod data;

use config::{RunConfig, read_run_config};

#[derive(Parser)]
#[command(name = "darklimit")]
#[command(about = "darklimit - exclusion limits for dark matter direct detection")]
#[command(version)]
struct Cli {
    /// Log verbosity level (trace, debug, info, warn, error)
    #[arg(long, global = true, default_value = "warn")]
    log_level: tracing::Level,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Exclusion curve over the configured mass grid
    Limits {
        /// Run configuration (JSON)
        #[arg(short, long)]
        config: PathBuf,

        /// Output file. Defaults to stdout.
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Output format
        #[arg(long, value_enum, default_value = "json")]
        format: Format,

        /// Threads (0 = auto). Use 1 for a sequential scan.
        #[arg(long, default_value = "1")]
        threads: usize,
    },

    /// Upper bound at a single mass
    Bound {
        /// Run configuration (JSON)
        #[arg(short, long)]
        config: PathBuf,

        /// Dark matter mass in GeV
        #[arg(long)]
        mass: f64,

        /// Override the configured confidence level
        #[arg(long)]
        cl: Option<f64>,

        /// Output file (pretty JSON). Defaults to stdout.
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Print the configured detector and its kinematic reach
    Summary {
        /// Run configuration (JSON)
        #[arg(short, long)]
        config: PathBuf,
    },

    /// Evaluate Yellin's maximum-gap CDF C0(x, mu)
    GapCdf {
        /// Largest gap in expected events
        #[arg(long)]
        x: f64,

        /// Total expected events
        #[arg(long)]
        mu: f64,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum Format {
    Json,
    Table,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_max_level(cli.log_level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Limits { config, output, format, threads } => {
            cmd_limits(&config, output.as_ref(), format, threads)
        }
        Commands::Bound { config, mass, cl, output } => cmd_bound(&config, mass, cl, output.as_ref()),
        Commands::Summary { config } => cmd_summary(&config),
        Commands::GapCdf { x, mu } => cmd_gap_cdf(x, mu),
    }
}

fn load_config(path: &Path) -> Result<(RunConfig, Detector)> {
    tracing::info!(path = %path.display(), "loading run configuration");
    let cfg = read_run_config(path)?;
    let base_dir = path.parent().unwrap_or_else(|| Path::new("."));
    let detector = cfg.detector(base_dir)?;
    tracing::info!(detector = detector.name(), mode = detector.mode().name(), "detector ready");
    Ok((cfg, detector))
}

fn cmd_limits(config: &Path, output: Option<&PathBuf>, format: Format, threads: usize) -> Result<()> {
    let (cfg, detector) = load_config(config)?;
    let model = cfg.particle()?;
    let halo = cfg.halo();
    let masses = cfg.masses()?;
    let solver = cfg.solver();

    let start = std::time::Instant::now();
    let curve = if threads == 1 {
        limit_curve(&detector, &model, &halo, &masses, &solver)?
    } else {
        if threads > 0 {
            // Best-effort; if a global pool already exists, keep going.
            let _ = rayon::ThreadPoolBuilder::new().num_threads(threads).build_global();
        }
        limit_curve_par(&detector, &model, &halo, &masses, &solver)?
    };
    tracing::info!(
        points = curve.len(),
        bounded = curve.bounded().count(),
        wall_time_s = start.elapsed().as_secs_f64(),
        "scan complete"
    );

    let report = CurveReport::new(&detector, &curve);
    match format {
        Format::Json => write_json(output, &report),
        Format::Table => write_text(output, &report.to_table()),
    }
}

fn cmd_bound(config: &Path, mass: f64, cl: Option<f64>, output: Option<&PathBuf>) -> Result<()> {
    if !(mass > 0.0 && mass.is_finite()) {
        anyhow::bail!("--mass must be > 0, got {}", mass);
    }
    let (cfg, detector) = load_config(config)?;
    let mut model = cfg.particle()?;
    model.set_mass(mass * GEV);
    let mut solver = cfg.solver();
    if let Some(cl) = cl {
        solver.confidence_level = cl;
    }

    let outcome = upper_bound(&detector, &model, &cfg.halo(), &solver)?;
    let point = PointReport::from(&LimitPoint::from_outcome(mass * GEV, outcome));
    let output_json = serde_json::json!({
        "detector": detector.name(),
        "statistics": detector.mode().name(),
        "confidence_level": solver.confidence_level,
        "mass_gev": point.mass_gev,
        "sigma_cm2": point.sigma_cm2,
        "status": point.status,
    });
    write_json(output, &output_json)
}

fn cmd_summary(config: &Path) -> Result<()> {
    let (cfg, detector) = load_config(config)?;
    let model = cfg.particle()?;
    let halo = cfg.halo();
    println!("{}", detector);
    match detector.minimum_mass(&model, &halo, 1e-6 * GEV, 1e6 * GEV) {
        Ok(m) => println!("  minimum mass: {:.4} GeV", m / GEV),
        Err(e) => println!("  minimum mass: n/a ({})", e),
    }
    Ok(())
}

fn cmd_gap_cdf(x: f64, mu: f64) -> Result<()> {
    let cdf = dl_prob::cdf_maximum_gap(x, mu);
    let output_json = serde_json::json!({
        "x": x,
        "mu": mu,
        "cdf": cdf,
        "p_value": 1.0 - cdf,
    });
    write_json(None, &output_json)
}

#[derive(Debug, Serialize)]
struct PointReport {
    mass_gev: f64,
    /// `null` when there is no bound.
    sigma_cm2: Option<f64>,
    status: LimitStatus,
}

impl From<&LimitPoint> for PointReport {
    fn from(p: &LimitPoint) -> Self {
        Self {
            mass_gev: p.mass / GEV,
            sigma_cm2: p.strength.is_finite().then(|| p.strength / (CM * CM)),
            status: p.status.clone(),
        }
    }
}

#[derive(Debug, Serialize)]
struct CurveReport {
    detector: String,
    statistics: &'static str,
    confidence_level: f64,
    points: Vec<PointReport>,
}

impl CurveReport {
    fn new(detector: &Detector, curve: &ExclusionCurve) -> Self {
        Self {
            detector: detector.name().to_string(),
            statistics: detector.mode().name(),
            confidence_level: curve.confidence_level,
            points: curve.points.iter().map(PointReport::from).collect(),
        }
    }

    fn to_table(&self) -> String {
        let mut out = format!(
            "# {} ({}, CL = {})\n# mass [GeV]    sigma_p [cm^2]    status\n",
            self.detector, self.statistics, self.confidence_level
        );
        for p in &self.points {
            let sigma = p.sigma_cm2.map_or_else(|| "inf".to_string(), |s| format!("{:.6e}", s));
            let status = match &p.status {
                LimitStatus::Converged => "converged".to_string(),
                LimitStatus::KinematicallyForbidden => "kinematically_forbidden".to_string(),
                LimitStatus::Unconstrained => "unconstrained".to_string(),
                LimitStatus::Failed(reason) => format!("failed: {}", reason),
            };
            out.push_str(&format!("{:<14.6e} {:<17} {}\n", p.mass_gev, sigma, status));
        }
        out
    }
}

fn write_json<T: Serialize>(output: Option<&PathBuf>, value: &T) -> Result<()> {
    write_text(output, &format!("{}\n", serde_json::to_string_pretty(value)?))
}

fn write_text(output: Option<&PathBuf>, text: &str) -> Result<()> {
    if let Some(path) = output {
        std::fs::write(path, text)?;
        tracing::info!(path = %path.display(), "output written");
    } else {
        std::io::stdout().write_all(text.as_bytes())?;
    }
    Ok(())
}
