use anyhow::Context;
use clap::Parser;
use log::info;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::PathBuf;
use workflow::config::WorkflowConfig;
use workflow::runner::Runner;

mod generator;
mod workflow;

#[derive(Parser)]
#[command(author, version, about = "Surveys a synthetic FRB population")]
struct Args {
    /// Load a workflow config from YAML
    #[arg(long)]
    workflow: Option<PathBuf>,
    #[arg(long, default_value_t = 0)]
    seed: u64,
    /// Number of sources to generate
    #[arg(long, default_value_t = 10_000)]
    sources: usize,
    /// Observing time the population stands for
    #[arg(long, default_value_t = 1.0)]
    days: f64,
    #[arg(long)]
    snr_limit: Option<f64>,
    #[arg(long, default_value_t = false)]
    scattering: bool,
    #[arg(long, default_value_t = false)]
    scintillation: bool,
    #[arg(long, default_value_t = false)]
    no_rate_limit: bool,
    /// Haslam 408 MHz sky temperature map
    #[arg(long)]
    sky_map: Option<PathBuf>,
    /// File the run summary is appended to
    #[arg(long, default_value = "tools/data/survey_rates.log")]
    report: PathBuf,
    /// Print the rate record as JSON
    #[arg(long, default_value_t = false)]
    json: bool,
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let args = Args::parse();

    let mut workflow_config = if let Some(path) = &args.workflow {
        WorkflowConfig::load(path)?
    } else {
        WorkflowConfig::from_args(args.seed, args.sources, args.days)
    };
    if let Some(limit) = args.snr_limit {
        workflow_config.survey.snr_limit = limit;
    }
    if args.sky_map.is_some() {
        workflow_config.sky_map = args.sky_map.clone();
    }
    workflow_config.options.scattering |= args.scattering;
    workflow_config.options.scintillation |= args.scintillation;
    if args.no_rate_limit {
        workflow_config.options.rate_limit = false;
    }

    info!(
        "generating {} sources over {} days",
        workflow_config.generator.n_sources, workflow_config.generator.days
    );
    let result = Runner::new(workflow_config).execute()?;
    let rates = &result.rates;

    if args.json {
        let json = serde_json::to_string_pretty(&result).context("serialising rate record")?;
        println!("{}", json);
    } else {
        println!(
            "{} with {} -> detected {}, faint {}, out {}, late {} ({:.3} per sky per day)",
            result.population,
            result.survey,
            rates.det,
            rates.faint,
            rates.out,
            rates.late,
            result.scaled.det
        );
    }

    let mut report = serde_json::to_string(&result).context("serialising run report")?;
    report.push('\n');
    if let Some(parent) = args.report.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("creating report directory {}", parent.display()))?;
    }
    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&args.report)
        .with_context(|| format!("opening report {}", args.report.display()))?;
    file.write_all(report.as_bytes())
        .context("appending run report")?;

    Ok(())
}
