//! 更新编排：逐服务比较摘要，按需 pull + 重启
//! 单个服务的失败不影响其它服务；不自动重试，下个周期再查

use crate::config::{Config, TrackedService};
use crate::update::oplog::OpLog;
use crate::update::registry::Registry;
use crate::update::report::{DigestComparison, Outcome, UpdateResult, UpdateSummary};
use crate::update::runtime::ContainerRuntime;
use crate::utils::{Result, UpdockError};

pub struct Orchestrator<'a, R: Registry, C: ContainerRuntime> {
    config: &'a Config,
    registry: &'a R,
    runtime: &'a C,
    log: &'a OpLog,
}

impl<'a, R: Registry, C: ContainerRuntime> Orchestrator<'a, R, C> {
    pub fn new(config: &'a Config, registry: &'a R, runtime: &'a C, log: &'a OpLog) -> Self {
        Orchestrator { config, registry, runtime, log }
    }

    // ── 检查 ────────────────────────────────────────────────────────────────

    pub fn check_all(&self) -> Vec<DigestComparison> {
        self.config.services.iter()
            .map(|svc| {
                let cmp = self.check_one(svc);
                self.log.append_best_effort(&format!(
                    "check {}: {}", svc.service, cmp.outcome
                ));
                cmp
            })
            .collect()
    }

    fn check_one(&self, svc: &TrackedService) -> DigestComparison {
        let remote = match self.registry.digest(&svc.image, &self.config.tag) {
            Ok(d) => d,
            Err(e) => {
                let outcome = match e {
                    UpdockError::Parse(_) => Outcome::ParseError,
                    _ => Outcome::NetworkError,
                };
                return DigestComparison {
                    service: svc.clone(),
                    remote_digest: None,
                    local_digest: None,
                    outcome,
                    detail: Some(e.to_string()),
                };
            }
        };

        let local = self.runtime.local_digest(&svc.image, &self.config.tag);
        let outcome = match &local {
            None => Outcome::NotFoundLocally,
            Some(l) if *l == remote => Outcome::UpToDate,
            Some(_) => Outcome::UpdateAvailable,
        };

        DigestComparison {
            service: svc.clone(),
            remote_digest: Some(remote),
            local_digest: local,
            outcome,
            detail: None,
        }
    }

    // ── 更新 ────────────────────────────────────────────────────────────────

    pub fn update_service(&self, svc: &TrackedService, dry_run: bool) -> UpdateResult {
        let reference = format!("{}:{}", svc.image, self.config.tag);

        if dry_run {
            self.log.append_best_effort(&format!(
                "dry run {}: would pull {} and restart", svc.service, reference
            ));
            return UpdateResult {
                service: svc.clone(),
                dry_run: true,
                pulled: false,
                restarted: false,
                error: None,
            };
        }

        self.log.append_best_effort(&format!("pull {}: start", reference));
        if let Err(e) = self.runtime.pull(&svc.image, &self.config.tag) {
            self.log.append_best_effort(&format!("pull {}: FAILED: {}", reference, e));
            return UpdateResult {
                service: svc.clone(),
                dry_run: false,
                pulled: false,
                restarted: false,
                error: Some(e.to_string()),
            };
        }
        self.log.append_best_effort(&format!("pull {}: ok", reference));

        self.log.append_best_effort(&format!("restart {}: start", svc.service));
        if let Err(e) = self.runtime.restart(&svc.service) {
            self.log.append_best_effort(&format!("restart {}: FAILED: {}", svc.service, e));
            return UpdateResult {
                service: svc.clone(),
                dry_run: false,
                pulled: true,
                restarted: false,
                error: Some(e.to_string()),
            };
        }
        self.log.append_best_effort(&format!("restart {}: ok", svc.service));

        UpdateResult {
            service: svc.clone(),
            dry_run: false,
            pulled: true,
            restarted: true,
            error: None,
        }
    }

    pub fn update_all(&self, dry_run: bool)
        -> (Vec<DigestComparison>, Vec<UpdateResult>, UpdateSummary)
    {
        let comparisons = self.check_all();
        let mut results = Vec::new();
        let mut summary = UpdateSummary {
            checked: comparisons.len(),
            ..Default::default()
        };

        for cmp in &comparisons {
            if cmp.outcome.needs_update() {
                let result = self.update_service(&cmp.service, dry_run);
                if result.succeeded() {
                    summary.updated += 1;
                } else {
                    summary.failed += 1;
                }
                results.push(result);
            } else {
                summary.skipped += 1;
            }
        }

        self.log.append_best_effort(&format!(
            "summary{}: checked={} updated={} failed={} skipped={}",
            if dry_run { " (dry run)" } else { "" },
            summary.checked, summary.updated, summary.failed, summary.skipped
        ));

        (comparisons, results, summary)
    }

    /// 未跟踪的服务名在任何网络请求之前就报错
    pub fn update_one(&self, name: &str, dry_run: bool)
        -> Result<(DigestComparison, Option<UpdateResult>, UpdateSummary)>
    {
        let svc = self.config.find_service(name)
            .ok_or_else(|| UpdockError::UnknownService(name.to_string()))?
            .clone();

        let cmp = self.check_one(&svc);
        self.log.append_best_effort(&format!("check {}: {}", svc.service, cmp.outcome));

        let mut summary = UpdateSummary { checked: 1, ..Default::default() };
        let result = if cmp.outcome.needs_update() {
            let r = self.update_service(&svc, dry_run);
            if r.succeeded() { summary.updated += 1 } else { summary.failed += 1 }
            Some(r)
        } else {
            summary.skipped += 1;
            None
        };

        Ok((cmp, result, summary))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use std::cell::RefCell;
    use std::collections::HashMap;

    // ── test doubles ──────────────────────────────────────────────────────

    struct FakeRegistry {
        digests: HashMap<String, Result<String>>,
        calls: RefCell<usize>,
    }

    impl FakeRegistry {
        fn new() -> Self {
            FakeRegistry { digests: HashMap::new(), calls: RefCell::new(0) }
        }

        fn with(mut self, image: &str, result: Result<String>) -> Self {
            self.digests.insert(image.to_string(), result);
            self
        }

        fn call_count(&self) -> usize {
            *self.calls.borrow()
        }
    }

    impl Registry for FakeRegistry {
        fn digest(&self, image: &str, _tag: &str) -> Result<String> {
            *self.calls.borrow_mut() += 1;
            match self.digests.get(image) {
                Some(Ok(d)) => Ok(d.clone()),
                Some(Err(UpdockError::Http(m))) => Err(UpdockError::Http(m.clone())),
                Some(Err(UpdockError::Parse(m))) => Err(UpdockError::Parse(m.clone())),
                Some(Err(_)) => unreachable!("fake only stores Http/Parse"),
                None => Err(UpdockError::Http("unconfigured image".to_string())),
            }
        }
    }

    #[derive(Default)]
    struct FakeRuntime {
        local: HashMap<String, String>,
        fail_pull: Vec<String>,
        pulls: RefCell<Vec<String>>,
        restarts: RefCell<Vec<String>>,
    }

    impl FakeRuntime {
        fn with_local(mut self, image: &str, digest: &str) -> Self {
            self.local.insert(image.to_string(), digest.to_string());
            self
        }

        fn failing_pull(mut self, image: &str) -> Self {
            self.fail_pull.push(image.to_string());
            self
        }
    }

    impl ContainerRuntime for FakeRuntime {
        fn local_digest(&self, image: &str, _tag: &str) -> Option<String> {
            self.local.get(image).cloned()
        }

        fn pull(&self, image: &str, _tag: &str) -> Result<()> {
            self.pulls.borrow_mut().push(image.to_string());
            if self.fail_pull.iter().any(|i| i == image) {
                Err(UpdockError::Docker(format!("pull {} refused", image)))
            } else {
                Ok(())
            }
        }

        fn restart(&self, service: &str) -> Result<()> {
            self.restarts.borrow_mut().push(service.to_string());
            Ok(())
        }
    }

    fn config(pairs: &[(&str, &str)]) -> Config {
        let services = pairs.iter()
            .map(|(i, s)| TrackedService { image: i.to_string(), service: s.to_string() })
            .collect();
        Config {
            tag: "latest".to_string(),
            log_file: "unused".to_string(),
            services,
        }
    }

    fn temp_log(name: &str) -> OpLog {
        let path = std::env::temp_dir()
            .join(format!("updock-test-{}-{}.log", name, std::process::id()));
        let _ = std::fs::remove_file(&path);
        OpLog::new(path)
    }

    // ── check classification ──────────────────────────────────────────────

    #[test]
    fn equal_digests_classify_up_to_date() {
        let cfg = config(&[("acme/a", "a")]);
        let reg = FakeRegistry::new().with("acme/a", Ok("sha256:x".to_string()));
        let rt = FakeRuntime::default().with_local("acme/a", "sha256:x");
        let log = temp_log("uptodate");
        let orch = Orchestrator::new(&cfg, &reg, &rt, &log);

        let cmps = orch.check_all();
        assert_eq!(cmps[0].outcome, Outcome::UpToDate);
        assert_eq!(cmps[0].remote_digest.as_deref(), Some("sha256:x"));
    }

    #[test]
    fn missing_local_image_classifies_not_found() {
        let cfg = config(&[("acme/a", "a")]);
        let reg = FakeRegistry::new().with("acme/a", Ok("sha256:x".to_string()));
        let rt = FakeRuntime::default();
        let log = temp_log("notfound");
        let orch = Orchestrator::new(&cfg, &reg, &rt, &log);

        let cmps = orch.check_all();
        assert_eq!(cmps[0].outcome, Outcome::NotFoundLocally);
        assert!(cmps[0].local_digest.is_none());
    }

    #[test]
    fn parse_error_is_isolated_per_service() {
        let cfg = config(&[("acme/a", "a"), ("acme/b", "b"), ("acme/c", "c")]);
        let reg = FakeRegistry::new()
            .with("acme/a", Ok("sha256:x".to_string()))
            .with("acme/b", Err(UpdockError::Parse("bad json".to_string())))
            .with("acme/c", Err(UpdockError::Http("timed out".to_string())));
        let rt = FakeRuntime::default().with_local("acme/a", "sha256:x");
        let log = temp_log("isolate");
        let orch = Orchestrator::new(&cfg, &reg, &rt, &log);

        let cmps = orch.check_all();
        assert_eq!(cmps.len(), 3);
        assert_eq!(cmps[0].outcome, Outcome::UpToDate);
        assert_eq!(cmps[1].outcome, Outcome::ParseError);
        assert_eq!(cmps[2].outcome, Outcome::NetworkError);
        assert!(cmps[1].detail.as_deref().unwrap().contains("bad json"));
    }

    // ── update_all ────────────────────────────────────────────────────────

    #[test]
    fn up_to_date_service_is_skipped_and_stale_one_updated() {
        let cfg = config(&[("acme/a", "a"), ("acme/b", "b")]);
        let reg = FakeRegistry::new()
            .with("acme/a", Ok("sha256:same".to_string()))
            .with("acme/b", Ok("sha256:new".to_string()));
        let rt = FakeRuntime::default()
            .with_local("acme/a", "sha256:same")
            .with_local("acme/b", "sha256:old");
        let log = temp_log("updateall");
        let orch = Orchestrator::new(&cfg, &reg, &rt, &log);

        let (cmps, results, summary) = orch.update_all(false);
        assert_eq!(cmps[0].outcome, Outcome::UpToDate);
        assert_eq!(cmps[1].outcome, Outcome::UpdateAvailable);

        assert_eq!(results.len(), 1);
        assert_eq!(results[0].service.service, "b");
        assert!(results[0].pulled);
        assert!(results[0].restarted);

        assert_eq!(summary.updated, 1);
        assert_eq!(summary.failed, 0);
        assert_eq!(summary.skipped, 1);

        // a was never pulled or restarted
        assert_eq!(rt.pulls.borrow().as_slice(), ["acme/b"]);
        assert_eq!(rt.restarts.borrow().as_slice(), ["b"]);
    }

    #[test]
    fn not_found_locally_triggers_a_pull() {
        let cfg = config(&[("acme/a", "a")]);
        let reg = FakeRegistry::new().with("acme/a", Ok("sha256:x".to_string()));
        let rt = FakeRuntime::default();
        let log = temp_log("firstpull");
        let orch = Orchestrator::new(&cfg, &reg, &rt, &log);

        let (_, results, summary) = orch.update_all(false);
        assert_eq!(rt.pulls.borrow().len(), 1);
        assert_eq!(results[0].pulled, true);
        assert_eq!(summary.updated, 1);
    }

    #[test]
    fn pull_failure_does_not_abort_other_services() {
        let cfg = config(&[("acme/a", "a"), ("acme/b", "b")]);
        let reg = FakeRegistry::new()
            .with("acme/a", Ok("sha256:new".to_string()))
            .with("acme/b", Ok("sha256:new".to_string()));
        let rt = FakeRuntime::default()
            .with_local("acme/a", "sha256:old")
            .with_local("acme/b", "sha256:old")
            .failing_pull("acme/a");
        let log = temp_log("partial");
        let orch = Orchestrator::new(&cfg, &reg, &rt, &log);

        let (_, results, summary) = orch.update_all(false);
        assert_eq!(results.len(), 2);
        assert!(!results[0].pulled);
        assert!(results[0].error.is_some());
        // a failed at pull, so its restart was never attempted
        assert_eq!(rt.restarts.borrow().as_slice(), ["b"]);
        assert_eq!(summary.updated, 1);
        assert_eq!(summary.failed, 1);
    }

    #[test]
    fn dry_run_never_mutates() {
        let cfg = config(&[("acme/a", "a"), ("acme/b", "b")]);
        let reg = FakeRegistry::new()
            .with("acme/a", Ok("sha256:new".to_string()))
            .with("acme/b", Ok("sha256:new".to_string()));
        let rt = FakeRuntime::default().with_local("acme/a", "sha256:old");
        let log = temp_log("dryrun");
        let orch = Orchestrator::new(&cfg, &reg, &rt, &log);

        let (_, results, summary) = orch.update_all(true);
        assert_eq!(results.len(), 2);
        assert!(results.iter().all(|r| r.dry_run && !r.pulled && !r.restarted));
        assert!(rt.pulls.borrow().is_empty());
        assert!(rt.restarts.borrow().is_empty());
        // dry-run attempts still count as updated in the summary
        assert_eq!(summary.updated, 2);
    }

    // ── update_one ────────────────────────────────────────────────────────

    #[test]
    fn unknown_service_fails_before_any_network_call() {
        let cfg = config(&[("acme/a", "a")]);
        let reg = FakeRegistry::new().with("acme/a", Ok("sha256:x".to_string()));
        let rt = FakeRuntime::default();
        let log = temp_log("unknown");
        let orch = Orchestrator::new(&cfg, &reg, &rt, &log);

        let r = orch.update_one("nope", false);
        assert_matches!(r, Err(UpdockError::UnknownService(ref n)) if n == "nope");
        assert_eq!(reg.call_count(), 0);
    }

    #[test]
    fn update_one_reports_no_update_needed() {
        let cfg = config(&[("acme/a", "a")]);
        let reg = FakeRegistry::new().with("acme/a", Ok("sha256:x".to_string()));
        let rt = FakeRuntime::default().with_local("acme/a", "sha256:x");
        let log = temp_log("noop");
        let orch = Orchestrator::new(&cfg, &reg, &rt, &log);

        let (cmp, result, summary) = orch.update_one("a", false).unwrap();
        assert_eq!(cmp.outcome, Outcome::UpToDate);
        assert!(result.is_none());
        assert_eq!(summary.skipped, 1);
        assert!(rt.pulls.borrow().is_empty());
    }

    #[test]
    fn update_one_updates_a_stale_service() {
        let cfg = config(&[("acme/a", "a")]);
        let reg = FakeRegistry::new().with("acme/a", Ok("sha256:new".to_string()));
        let rt = FakeRuntime::default().with_local("acme/a", "sha256:old");
        let log = temp_log("one");
        let orch = Orchestrator::new(&cfg, &reg, &rt, &log);

        let (cmp, result, summary) = orch.update_one("a", false).unwrap();
        assert_eq!(cmp.outcome, Outcome::UpdateAvailable);
        let result = result.unwrap();
        assert!(result.pulled && result.restarted);
        assert_eq!(summary.updated, 1);
    }

    #[test]
    fn check_errors_suppress_the_update_path() {
        let cfg = config(&[("acme/a", "a")]);
        let reg = FakeRegistry::new()
            .with("acme/a", Err(UpdockError::Http("unreachable".to_string())));
        let rt = FakeRuntime::default();
        let log = temp_log("suppress");
        let orch = Orchestrator::new(&cfg, &reg, &rt, &log);

        let (_, results, summary) = orch.update_all(false);
        assert!(results.is_empty());
        assert_eq!(summary.skipped, 1);
        assert!(rt.pulls.borrow().is_empty());
    }
}
