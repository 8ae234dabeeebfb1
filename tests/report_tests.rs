use form_autofill::form::form_model::{FieldKind, FillAction};
use form_autofill::matcher::question_matcher::Unmatched;
use form_autofill::report::console::{format_console_report, format_plan};
use form_autofill::report::report_model::{FilledQuestion, RunOutcome, RunReport, Verification};
use form_autofill::resolver::resolver::resolve;
use form_autofill::verify::field_check::{FieldIssue, FieldProblem, check_filled};
use form_autofill::verify::verifier::{matched_marker, verify};

use crate::common::fixtures::{button, hidden, matched, radio, raining_snapshot};

mod common;

// ============================================================================
// Helper builders
// ============================================================================

fn complete_report() -> RunReport {
    let mut report = RunReport::new("https://forms.gle/abc", "da39a3ee5e6b-1700000000000");
    report.questions_found = 2;
    report.filled.push(FilledQuestion::new(
        &matched("Is it raining?", "No", FieldKind::Radio),
        FillAction::click(1),
    ));
    report.filled.push(FilledQuestion::new(
        &matched("Pick a color", "Blue", FieldKind::Dropdown),
        FillAction::type_text(3, "Blue"),
    ));
    report.submit = Some(FillAction::click(4));
    report.verification = Verification::Confirmed;
    report.success_marker = Some("your response has been recorded".into());
    report
}

// ============================================================================
// Verifier
// ============================================================================

#[test]
fn verify_recognises_google_forms_confirmation() {
    assert!(verify("Student Application\nYour response has been recorded.\nSubmit another response"));
    assert!(verify("THANK YOU for applying"));
    assert!(verify("View score"));
}

#[test]
fn verify_false_on_the_form_itself() {
    assert!(!verify("Student Application\nWhat is your name?\nSubmit\nClear form"));
    assert!(!verify(""));
}

#[test]
fn matched_marker_reports_the_most_specific_phrase_first() {
    assert_eq!(
        matched_marker("Your response has been recorded."),
        Some("your response has been recorded")
    );
    assert_eq!(matched_marker("Thanks for your time"), Some("thanks for"));
    assert_eq!(matched_marker("Please try again"), None);
}

// ============================================================================
// Pre-submit field check
// ============================================================================

#[test]
fn filled_fields_holding_their_answers_pass() {
    let report = complete_report();
    let elements = vec![
        radio(0, "Yes"),
        radio(1, "No").checked(),
        hidden(3).with_value("  blue "),
        button(4, "Submit"),
    ];

    assert!(check_filled(&report.filled, &elements).is_empty());
}

#[test]
fn check_names_each_field_off_its_answer() {
    let report = complete_report();

    let unselected = vec![radio(1, "No"), hidden(3).with_value("Red")];
    let issues = check_filled(&report.filled, &unselected);
    assert_eq!(
        issues,
        vec![
            FieldIssue {
                question: "Is it raining?".into(),
                problem: FieldProblem::NotSelected { index: 1 },
            },
            FieldIssue {
                question: "Pick a color".into(),
                problem: FieldProblem::WrongValue {
                    index: 3,
                    expected: "Blue".into(),
                    found: Some("Red".into()),
                },
            },
        ]
    );

    let gone = check_filled(&report.filled, &[radio(1, "No").checked()]);
    assert_eq!(gone.len(), 1);
    assert_eq!(gone[0].problem, FieldProblem::Missing { index: 3 });
    assert_eq!(gone[0].problem.to_string(), "field [3] is gone");
}

// ============================================================================
// Report model
// ============================================================================

#[test]
fn report_without_gaps_is_complete() {
    let report = complete_report();
    assert_eq!(report.outcome(), RunOutcome::Complete);
    assert!(report.is_complete());
}

#[test]
fn unmatched_or_unresolved_makes_the_run_partial() {
    let mut report = complete_report();
    report.unmatched.push(Unmatched {
        question: "Favourite planet?".into(),
    });
    assert_eq!(report.outcome(), RunOutcome::Partial);

    let mut report = complete_report();
    let resolution = resolve(
        &[matched("Is it raining?", "Maybe", FieldKind::Radio)],
        &raining_snapshot(),
    );
    report.unresolved = resolution.unresolved;
    assert_eq!(report.outcome(), RunOutcome::Partial);
}

#[test]
fn field_issues_block_when_nothing_was_submitted() {
    let issue = FieldIssue {
        question: "Pick a color".into(),
        problem: FieldProblem::WrongValue {
            index: 3,
            expected: "Blue".into(),
            found: None,
        },
    };

    let mut submitted = complete_report();
    submitted.field_issues.push(issue.clone());
    assert_eq!(submitted.outcome(), RunOutcome::Partial);

    let mut blocked = complete_report();
    blocked.field_issues.push(issue);
    blocked.submit = None;
    blocked.verification = Verification::Skipped;
    blocked.success_marker = None;
    assert_eq!(blocked.outcome(), RunOutcome::Blocked);

    let output = format_console_report(&blocked);
    assert!(output.contains("\u{2717} NOT SET  Pick a color: field [3] is empty, expected 'Blue'"));
    assert!(output.contains("Not submitted: filled fields failed the pre-submit check"));
    assert!(output.contains("=== Result: blocked,"));

    let json = serde_json::to_value(&blocked).unwrap();
    assert_eq!(json["field_issues"][0]["problem"], "wrong_value");
    assert_eq!(json["field_issues"][0]["index"], 3);
}

#[test]
fn report_serializes_to_json() {
    let report = complete_report().with_duration(1234);
    let json = serde_json::to_value(&report).unwrap();

    assert_eq!(json["form_url"], "https://forms.gle/abc");
    assert_eq!(json["verification"], "confirmed");
    assert_eq!(json["filled"][0]["action"]["verb"], "click");
    assert_eq!(json["filled"][1]["field_kind"], "dropdown");
    assert_eq!(json["filled"][1]["confidence"], "high");
    assert_eq!(json["submit"]["target_index"], 4);
    assert_eq!(json["duration_ms"], 1234);
}

#[test]
fn empty_optionals_are_left_out_of_json() {
    let report = RunReport::new("https://forms.gle/abc", "run");
    let json = serde_json::to_value(&report).unwrap();

    assert!(json.get("submit").is_none());
    assert!(json.get("success_marker").is_none());
    assert!(json.get("duration_ms").is_none());
    assert_eq!(json["verification"], "skipped");
}

// ============================================================================
// Console output
// ============================================================================

#[test]
fn console_report_lists_actions_and_result() {
    let output = format_console_report(&complete_report().with_duration(12_300));

    assert!(output.contains("=== Form: https://forms.gle/abc ==="));
    assert!(output.contains("\u{2713} CLICK [1]  Is it raining?"));
    assert!(output.contains("\u{2713} TYPE [3] \"Blue\"  Pick a color"));
    assert!(output.contains("Submitted: CLICK [4] (confirmed: \"your response has been recorded\")"));
    assert!(!output.contains("Landed on"));
    assert!(output.contains("=== Result: complete, 2 filled, 0 unresolved, 0 unmatched in 12.3s ==="));
}

#[test]
fn console_report_marks_gaps() {
    let mut report = complete_report();
    report.verification = Verification::Inconclusive;
    report.success_marker = None;
    report.unmatched.push(Unmatched {
        question: "Favourite planet?".into(),
    });
    report.unresolved = resolve(
        &[matched("Is it raining?", "Maybe", FieldKind::Radio)],
        &raining_snapshot(),
    )
    .unresolved;

    let output = format_console_report(&report);

    assert!(output.contains("\u{2717} UNRESOLVED  Is it raining?: no radio option labelled 'Maybe'"));
    assert!(output.contains("\u{2717} UNMATCHED  Favourite planet?"));
    assert!(output.contains("no confirmation seen"));
    assert!(output.contains("=== Result: partial, 2 filled, 1 unresolved, 1 unmatched ==="));
}

#[test]
fn console_report_for_dry_run() {
    let mut report = complete_report();
    report.verification = Verification::Skipped;
    report.success_marker = None;

    let output = format_console_report(&report);
    assert!(output.contains("Planned submit: CLICK [4] (dry run)"));
}

#[test]
fn plan_lists_steps_then_submit() {
    let resolution = resolve(
        &[
            matched("Is it raining?", "No", FieldKind::Radio),
            matched("Pick a color", "Blue", FieldKind::Dropdown),
        ],
        &raining_snapshot(),
    );

    let output = format_plan(&resolution);
    let lines: Vec<&str> = output.lines().collect();

    assert_eq!(lines[0], " 1. CLICK [1]  <- Is it raining?");
    assert_eq!(lines[1], " 2. TYPE [3] \"Blue\"  <- Pick a color");
    assert_eq!(lines[2], " 3. CLICK [4]  <- submit");
}
