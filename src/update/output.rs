//! 输出层：接收报告，渲染 text 或 json

use crate::update::report::{CheckReport, DigestComparison, Outcome, UpdateReport, UpdateResult, UpdateSummary};
use crate::utils::{Result, UpdockError};

pub fn display_check(report: &CheckReport, format: &str, verbose: bool) -> Result<()> {
    match format {
        "json" => display_json(report),
        "text" => {
            display_check_text(report, verbose);
            Ok(())
        }
        other => Err(UpdockError::Config(format!("unknown format: {}", other))),
    }
}

pub fn display_update(report: &UpdateReport, verbose: bool) {
    print_section(if report.dry_run { "UPDATE (dry run)" } else { "UPDATE" });
    println!("  Collected at : {}", report.collected_at);
    println!("  Tag          : {}", report.tag);

    for cmp in &report.comparisons {
        display_comparison(cmp, verbose);
    }

    if !report.results.is_empty() {
        print_section("ACTIONS");
        for r in &report.results {
            display_result(r);
        }
    }

    display_summary(&report.summary, report.dry_run);
}

// ── JSON ────────────────────────────────────────────────────────────────────

fn display_json<T: serde::Serialize>(report: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(report)
        .map_err(|e| UpdockError::Parse(format!("JSON serialize: {}", e)))?;
    println!("{}", json);
    Ok(())
}

// ── Text ────────────────────────────────────────────────────────────────────

fn display_check_text(report: &CheckReport, verbose: bool) {
    print_section("CHECK");
    println!("  Collected at : {}", report.collected_at);
    println!("  Tag          : {}", report.tag);

    for cmp in &report.comparisons {
        display_comparison(cmp, verbose);
    }

    let updates = report.comparisons.iter()
        .filter(|c| c.outcome.needs_update())
        .count();
    let errors = report.comparisons.iter()
        .filter(|c| matches!(c.outcome, Outcome::NetworkError | Outcome::ParseError))
        .count();
    println!();
    println!("  {} checked  {} need update  {} errors",
        report.comparisons.len(), updates, errors);
}

fn display_comparison(cmp: &DigestComparison, verbose: bool) {
    let marker = match cmp.outcome {
        Outcome::UpToDate        => "✓",
        Outcome::UpdateAvailable => "↑",
        Outcome::NotFoundLocally => "○",
        Outcome::NetworkError    => "⚠",
        Outcome::ParseError      => "⚠",
    };

    println!("  {} {:<12} {:<20} [{}]",
        marker, cmp.service.service, cmp.service.image, cmp.outcome);

    if verbose {
        println!("      remote : {}", cmp.remote_digest.as_deref().unwrap_or("(unknown)"));
        println!("      local  : {}", cmp.local_digest.as_deref().unwrap_or("(none)"));
    }
    if let Some(detail) = &cmp.detail {
        println!("      detail : {}", detail);
    }
}

fn display_result(r: &UpdateResult) {
    if r.dry_run {
        println!("  ~ {:<12} would pull {} and restart", r.service.service, r.service.image);
        return;
    }

    match &r.error {
        None => println!("  ✓ {:<12} pulled and restarted", r.service.service),
        Some(e) if !r.pulled => println!("  ✗ {:<12} pull failed: {}", r.service.service, e),
        Some(e) => println!("  ✗ {:<12} pulled, restart failed: {}", r.service.service, e),
    }
}

fn display_summary(s: &UpdateSummary, dry_run: bool) {
    println!();
    println!("  Summary{}     : checked={} updated={} failed={} skipped={}",
        if dry_run { " ~" } else { "  " },
        s.checked, s.updated, s.failed, s.skipped);
}

// ── 格式化工具 ───────────────────────────────────────────────────────────────

fn print_section(title: &str) {
    println!("\n{}", "─".repeat(60));
    println!("  {}", title);
    println!("{}", "─".repeat(60));
}
