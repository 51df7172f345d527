mod collectors;
mod config;
mod error;
mod models;
mod pipeline;
mod rules;
mod util;

use anyhow::Result;
use clap::Parser;
use collectors::scrutiny::ScrutinyClient;
use collectors::summary_file::SummaryFile;
use collectors::DeviceSource;
use models::metric::{FleetStats, ResolvedMetric, StatusClass};
use pipeline::MetricContext;
use rules::RuleStore;
use std::path::PathBuf;
use util::history::{self, ChartSeries, Period};

#[derive(Parser, Debug)]
#[command(name = "drivelife", about = "SSD wear and endurance report for a Scrutiny fleet", version = "0.1")]
struct Cli {
    /// Print a one-shot JSON snapshot of all device metrics and exit
    #[arg(long)]
    json: bool,

    /// One-shot health check: exit 0=OK, 1=WARN, 2=FAIL, 3=UNKNOWN (nagios/cron compatible)
    #[arg(long)]
    check: bool,

    /// Print write/life history for one device (by WWN) as JSON
    #[arg(long, value_name = "WWN")]
    history: Option<String>,

    /// Trailing points of history to chart (used with --history)
    #[arg(long)]
    days: Option<usize>,

    /// History period: 1D, 1W, 1M, 1Y (used with --history; --days wins)
    #[arg(long, default_value = "1W")]
    period: String,

    /// Print the loaded wear rules and exit
    #[arg(long)]
    rules: bool,

    /// Print config file path and current values, then exit
    #[arg(long)]
    config: bool,

    /// Read the device mapping from a JSON file instead of the API
    #[arg(long, value_name = "FILE")]
    input: Option<PathBuf>,

    /// Scrutiny base URL (overrides config and $SCRUTINY_BASE)
    #[arg(long, value_name = "URL")]
    base: Option<String>,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let cli = Cli::parse();

    let mut cfg = config::Config::load();
    if let Some(base) = &cli.base {
        cfg.apply_env(Some(base.as_str()));
    }

    if cli.config {
        return run_print_config(&cfg);
    }

    let rules = RuleStore::from_env_or_file(cfg.general.rules_path.as_deref());
    if cli.rules {
        println!("{}", rules);
        return Ok(());
    }

    let source: Box<dyn DeviceSource> = match &cli.input {
        Some(path) => Box::new(SummaryFile::load(path)?),
        None       => Box::new(ScrutinyClient::new(&cfg.general.base_url, &cfg.general)),
    };

    if let Some(wwn) = &cli.history {
        let points = match cli.days {
            Some(d) => d,
            None => Period::from_name(&cli.period)
                .ok_or_else(|| anyhow::anyhow!("unknown period {:?} (expected 1D, 1W, 1M or 1Y)", cli.period))?
                .points(),
        };
        return run_history(source.as_ref(), wwn, points);
    }

    let ctx = MetricContext {
        rules:      &rules,
        thresholds: &cfg.thresholds,
        base_url:   &cfg.general.base_url,
    };
    let fleet = pipeline::derive_fleet(source.as_ref(), &ctx);
    if cli.check {
        return run_check(fleet);
    }
    let metrics = fleet?;
    let stats = FleetStats::from_metrics(&metrics);

    if cli.json {
        return run_json_snapshot(&metrics, &stats);
    }
    print!("{}", util::report::generate(&metrics, &stats));
    Ok(())
}

fn run_json_snapshot(metrics: &[ResolvedMetric], stats: &FleetStats) -> Result<()> {
    let snapshot = serde_json::json!({
        "drivelife_version": "0.1",
        "timestamp": chrono::Local::now().to_rfc3339(),
        "stats":     stats,
        "devices":   metrics,
    });
    println!("{}", serde_json::to_string_pretty(&snapshot)?);
    Ok(())
}

fn run_history(source: &dyn DeviceSource, wwn: &str, points: usize) -> Result<()> {
    let all = pipeline::device_history(source, wwn)?;
    let shown = history::window(&all, points);
    let out = serde_json::json!({
        "wwn":     wwn,
        "history": shown,
        "chart":   ChartSeries::from_points(shown),
    });
    println!("{}", serde_json::to_string_pretty(&out)?);
    Ok(())
}

fn run_print_config(cfg: &config::Config) -> Result<()> {
    let path = config::Config::config_path()
        .map(|p| p.to_string_lossy().into_owned())
        .unwrap_or_else(|| "(unknown)".to_string());
    let g = &cfg.general;
    let t = &cfg.thresholds;
    let rules_path = g.rules_path.as_ref()
        .map(|p| p.to_string_lossy().into_owned())
        .unwrap_or_else(|| "(not set)".to_string());
    println!("Config: {}", path);
    println!();
    println!("[general]");
    println!("  base_url         = {}", g.base_url);
    println!("  timeout_sec      = {}", g.timeout_sec);
    println!("  retry            = {}", g.retry);
    println!("  retry_backoff_ms = {}", g.retry_backoff_ms);
    println!("  rules_path       = {}", rules_path);
    println!();
    println!("[thresholds]");
    println!("  temp_min  = {}°C", t.temp_min);
    println!("  temp_max  = {}°C", t.temp_max);
    println!("  temp_crit = {}°C", t.temp_crit);
    Ok(())
}

const EXIT_OK:      i32 = 0;
const EXIT_WARN:    i32 = 1;
const EXIT_FAIL:    i32 = 2;
const EXIT_UNKNOWN: i32 = 3;

/// Exit code for `--check`; `None` means the fleet could not be fetched.
fn check_exit_code(stats: Option<&FleetStats>) -> i32 {
    match stats {
        None                      => EXIT_UNKNOWN,
        Some(s) if s.fail > 0     => EXIT_FAIL,
        Some(s) if s.warn > 0     => EXIT_WARN,
        Some(_)                   => EXIT_OK,
    }
}

fn run_check(fleet: error::Result<Vec<ResolvedMetric>>) -> Result<()> {
    let metrics = match fleet {
        Ok(m) => m,
        Err(e) => {
            println!("UNKNOWN: cannot fetch device data: {}", e);
            std::process::exit(check_exit_code(None));
        }
    };
    let stats = FleetStats::from_metrics(&metrics);

    let flagged: Vec<&ResolvedMetric> = metrics.iter()
        .filter(|m| matches!(m.status.class, StatusClass::Warn | StatusClass::Fail))
        .collect();
    if flagged.is_empty() {
        println!("OK: {} device(s), no warnings", stats.total);
    }
    for m in &flagged {
        println!("[{}] {} ({}) {}", m.status.class.label(), m.model, m.wwn, m.formatted_text);
    }
    std::process::exit(check_exit_code(Some(&stats)));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn check_codes_follow_worst_status() {
        let mut stats = FleetStats { total: 3, ok: 3, ..FleetStats::default() };
        assert_eq!(check_exit_code(Some(&stats)), EXIT_OK);
        stats.warn = 1;
        assert_eq!(check_exit_code(Some(&stats)), EXIT_WARN);
        stats.fail = 1;
        assert_eq!(check_exit_code(Some(&stats)), EXIT_FAIL);
    }

    #[test]
    fn unreachable_service_is_unknown_not_warn() {
        let general = config::GeneralConfig { timeout_sec: 1, retry: 0, ..config::GeneralConfig::default() };
        let client = ScrutinyClient::new("http://127.0.0.1:9", &general);
        let (rules, thr) = (RuleStore::default(), config::Thresholds::default());
        let ctx = MetricContext { rules: &rules, thresholds: &thr, base_url: &client.base };

        let fleet = pipeline::derive_fleet(&client, &ctx);
        assert!(fleet.is_err());
        let code = check_exit_code(fleet.as_ref().ok().map(|m| FleetStats::from_metrics(m)).as_ref());
        assert_eq!(code, EXIT_UNKNOWN);
        assert_ne!(code, EXIT_WARN);
    }
}
