pub mod oplog;
pub mod orchestrator;
pub mod output;
pub mod registry;
pub mod report;
pub mod runtime;

use crate::config::Config;
use crate::utils::Result;
use oplog::OpLog;
use orchestrator::Orchestrator;
use registry::HubRegistry;
use report::{CheckReport, Outcome, UpdateReport};
use runtime::DockerRuntime;

fn now() -> String {
    chrono::Local::now()
        .format("%Y-%m-%d %H:%M:%S %z")
        .to_string()
}

pub fn run_check(config_path: &str, output_format: &str, verbose: bool) -> Result<()> {
    let config = Config::load(config_path)?;
    let runtime = DockerRuntime::probe()?;
    let registry = HubRegistry::new()?;
    let log = OpLog::new(&config.log_file);

    eprintln!("Checking {} tracked services...", config.services.len());
    let orch = Orchestrator::new(&config, &registry, &runtime, &log);
    let comparisons = orch.check_all();

    let report = CheckReport {
        collected_at: now(),
        tag: config.tag.clone(),
        comparisons,
    };

    output::display_check(&report, output_format, verbose)
}

pub fn run_update_all(config_path: &str, dry_run: bool, verbose: bool) -> Result<()> {
    let config = Config::load(config_path)?;
    let runtime = DockerRuntime::probe()?;
    let registry = HubRegistry::new()?;
    let log = OpLog::new(&config.log_file);

    eprintln!("Checking {} tracked services...", config.services.len());
    let orch = Orchestrator::new(&config, &registry, &runtime, &log);
    let (comparisons, results, summary) = orch.update_all(dry_run);

    let report = UpdateReport {
        collected_at: now(),
        tag: config.tag.clone(),
        dry_run,
        comparisons,
        results,
        summary,
    };

    output::display_update(&report, verbose);
    Ok(())
}

/// Why a single-service update attempted nothing. A registry failure must
/// not read as "nothing to do".
fn skip_notice(service: &str, outcome: Outcome) -> Option<String> {
    match outcome {
        Outcome::UpToDate => Some(format!("{}: no update needed", service)),
        Outcome::NetworkError | Outcome::ParseError => Some(format!(
            "{}: check failed ({}), not updating", service, outcome
        )),
        _ => None,
    }
}

pub fn run_update_one(config_path: &str, service: &str, dry_run: bool, verbose: bool) -> Result<()> {
    let config = Config::load(config_path)?;

    // 服务名校验在探测外部工具之后、任何网络请求之前
    let runtime = DockerRuntime::probe()?;
    let registry = HubRegistry::new()?;
    let log = OpLog::new(&config.log_file);

    let orch = Orchestrator::new(&config, &registry, &runtime, &log);
    let (comparison, result, summary) = orch.update_one(service, dry_run)?;

    if result.is_none() {
        if let Some(notice) = skip_notice(service, comparison.outcome) {
            eprintln!("{}", notice);
        }
    }

    let report = UpdateReport {
        collected_at: now(),
        tag: config.tag.clone(),
        dry_run,
        comparisons: vec![comparison],
        results: result.into_iter().collect(),
        summary,
    };

    output::display_update(&report, verbose);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn up_to_date_reads_as_no_update_needed() {
        let n = skip_notice("backend", Outcome::UpToDate).unwrap();
        assert_eq!(n, "backend: no update needed");
    }

    #[test]
    fn check_failures_read_as_failures() {
        let n = skip_notice("backend", Outcome::NetworkError).unwrap();
        assert!(n.contains("check failed"));
        let n = skip_notice("backend", Outcome::ParseError).unwrap();
        assert!(n.contains("check failed"));
    }

    #[test]
    fn update_outcomes_produce_no_skip_notice() {
        assert!(skip_notice("backend", Outcome::UpdateAvailable).is_none());
        assert!(skip_notice("backend", Outcome::NotFoundLocally).is_none());
    }
}
