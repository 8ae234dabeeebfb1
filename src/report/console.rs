use crate::report::report_model::{RunOutcome, RunReport, Verification};
use crate::resolver::resolver::Resolution;

// ============================================================================
// Console reporter: formatted terminal output
// ============================================================================

/// Format a run report for terminal output.
///
/// Produces output like:
/// ```text
/// === Form: https://forms.gle/abc ===
///
/// ✓ TYPE [3] "EAG"  Which course is he/she taking? (Dropdown, High)
/// ✗ UNRESOLVED  Is he/she married?: no radio option labelled 'Maybe'
///
/// Submitted: CLICK [10] (confirmed: "response has been recorded")
/// === Result: partial, 1 filled, 1 unresolved, 0 unmatched in 12.3s ===
/// ```
pub fn format_console_report(report: &RunReport) -> String {
    let mut out = String::new();

    out.push_str(&format!("=== Form: {} ===\n\n", report.form_url));

    for f in &report.filled {
        out.push_str(&format!(
            "\u{2713} {}  {} ({:?}, {:?})\n",
            f.action,
            f.question,
            f.field_kind,
            f.confidence
        ));
    }

    for u in &report.unresolved {
        out.push_str(&format!("\u{2717} UNRESOLVED  {}: {}\n", u.question, u.reason));
    }

    for u in &report.unmatched {
        out.push_str(&format!("\u{2717} UNMATCHED  {}\n", u.question));
    }

    for issue in &report.field_issues {
        out.push_str(&format!("\u{2717} NOT SET  {}: {}\n", issue.question, issue.problem));
    }

    out.push('\n');
    match (&report.submit, report.verification) {
        (Some(action), Verification::Confirmed) => out.push_str(&format!(
            "Submitted: {} (confirmed: \"{}\")\n",
            action,
            report.success_marker.as_deref().unwrap_or("")
        )),
        (Some(action), Verification::Inconclusive) => out.push_str(&format!(
            "Submitted: {} (no confirmation seen, check the form responses)\n",
            action
        )),
        (Some(action), Verification::Skipped) => {
            out.push_str(&format!("Planned submit: {} (dry run)\n", action))
        }
        (None, _) if !report.field_issues.is_empty() => {
            out.push_str("Not submitted: filled fields failed the pre-submit check\n")
        }
        (None, _) => out.push_str("Not submitted\n"),
    }

    if let Some(url) = &report.final_url {
        out.push_str(&format!("Landed on: {}\n", url));
    }

    let outcome = match report.outcome() {
        RunOutcome::Complete => "complete",
        RunOutcome::Partial => "partial",
        RunOutcome::Blocked => "blocked",
    };
    out.push_str(&format!(
        "=== Result: {}, {} filled, {} unresolved, {} unmatched",
        outcome,
        report.filled.len(),
        report.unresolved.len(),
        report.unmatched.len()
    ));

    if let Some(ms) = report.duration_ms {
        let secs = ms as f64 / 1000.0;
        out.push_str(&format!(" in {:.1}s", secs));
    }

    out.push_str(" ===\n");

    out
}

/// Format an offline resolution plan.
pub fn format_plan(resolution: &Resolution) -> String {
    let mut out = String::new();

    for (i, step) in resolution.steps.iter().enumerate() {
        out.push_str(&format!("{:>2}. {}  <- {}\n", i + 1, step.action, step.question));
    }

    match &resolution.submit {
        Some(action) => out.push_str(&format!("{:>2}. {}  <- submit\n", resolution.steps.len() + 1, action)),
        None => out.push_str("    (no submit button found)\n"),
    }

    for u in &resolution.unresolved {
        out.push_str(&format!("    \u{2717} {}: {}\n", u.question, u.reason));
    }

    out
}
