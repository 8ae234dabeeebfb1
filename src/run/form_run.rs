use std::time::Instant;

use crate::answer_key::AnswerKey;
use crate::browser::page::FormPage;
use crate::error::FillError;
use crate::form::form_model::{ElementKind, FillAction};
use crate::matcher::question_matcher::QuestionMatcher;
use crate::memory::event::{RunEvent, RunStage, now_ms, run_id};
use crate::memory::run_log::RunLog;
use crate::report::report_model::{FilledQuestion, RunReport, Verification};
use crate::resolver::resolver::{Resolver, order_by_page, resolve};
use crate::verify::field_check::check_filled;
use crate::verify::verifier;

pub const DEFAULT_SETTLE_MS: u64 = 500;
pub const DEFAULT_SUBMIT_WAIT_MS: u64 = 3000;

#[derive(Debug, Clone)]
pub struct RunOptions {
    /// Pause after every action
    pub settle_ms: u64,
    /// Pause between clicking submit and reading the confirmation page
    pub submit_wait_ms: u64,
    /// Blank every visible text input before filling
    pub clear_fields: bool,
    /// Resolve against one snapshot and report the plan without acting
    pub dry_run: bool,
    /// Refuse to submit when a filled field does not hold its answer
    pub validate_before_submit: bool,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            settle_ms: DEFAULT_SETTLE_MS,
            submit_wait_ms: DEFAULT_SUBMIT_WAIT_MS,
            clear_fields: true,
            dry_run: false,
            validate_before_submit: true,
        }
    }
}

/// One end-to-end fill of a form page.
///
/// Strictly sequential: every answer is resolved against a snapshot taken
/// after the previous action, so dropdown companions revealed by earlier
/// clicks are seen.
pub struct FormRun<'a> {
    key: &'a AnswerKey,
    matcher: &'a QuestionMatcher,
    log: &'a RunLog,
    options: RunOptions,
    run_id: String,
}

impl<'a> FormRun<'a> {
    pub fn new(key: &'a AnswerKey, matcher: &'a QuestionMatcher, log: &'a RunLog, options: RunOptions) -> Self {
        let run_id = run_id(&key.fingerprint(), now_ms());
        Self {
            key,
            matcher,
            log,
            options,
            run_id,
        }
    }

    pub fn run_id(&self) -> &str {
        &self.run_id
    }

    pub fn execute(&self, page: &mut dyn FormPage, url: &str) -> Result<RunReport, FillError> {
        let started = Instant::now();
        let mut report = RunReport::new(url, &self.run_id);

        self.record(RunEvent::now(&self.run_id, RunStage::Started).with_detail(url));
        tracing::info!("Opening form {}", url);

        page.navigate(url)?;
        page.settle(self.options.settle_ms)?;

        if self.options.clear_fields && !self.options.dry_run {
            self.clear_text_inputs(page)?;
        }

        // ---- Questions ----
        let snapshot = page.snapshot()?;
        if snapshot.questions.is_empty() {
            return Err(FillError::NoQuestions);
        }
        report.questions_found = snapshot.questions.len();
        tracing::info!("Found {} questions", snapshot.questions.len());

        let (matches, unmatched) = self.matcher.match_all(&snapshot.questions, self.key);
        for m in &matches {
            self.record(RunEvent::now(&self.run_id, RunStage::Matched).with_match(m));
        }
        for u in &unmatched {
            self.record(RunEvent::now(&self.run_id, RunStage::Unmatched).with_question(&u.question));
        }
        report.unmatched = unmatched;

        if self.options.dry_run {
            let plan = resolve(&matches, &snapshot);
            for step in &plan.steps {
                if let Some(m) = matches.iter().find(|m| m.question == step.question) {
                    report.filled.push(FilledQuestion::new(m, step.action.clone()));
                }
            }
            report.unresolved = plan.unresolved;
            report.submit = plan.submit;
            return Ok(report.with_duration(started.elapsed().as_millis()));
        }

        // ---- Fill ----
        let mut resolver = Resolver::new();
        for m in order_by_page(&matches, &snapshot.questions) {
            let current = page.snapshot()?;
            match resolver.next(m, &current.elements) {
                Ok(action) => {
                    tracing::debug!("{} <- {}", action, m.question);
                    self.perform(page, &action, &m.question)?;
                    page.settle(self.options.settle_ms)?;
                    self.record(RunEvent::now(&self.run_id, RunStage::Acted).with_question(&m.question).with_action(&action));
                    report.filled.push(FilledQuestion::new(m, action));
                }
                Err(unresolved) => {
                    tracing::warn!("Unresolved '{}': {}", unresolved.question, unresolved.reason);
                    self.record(
                        RunEvent::now(&self.run_id, RunStage::Unresolved)
                            .with_question(&unresolved.question)
                            .with_detail(&unresolved.reason),
                    );
                    report.unresolved.push(unresolved);
                }
            }
        }

        // ---- Check ----
        let current = page.snapshot()?;
        report.field_issues = check_filled(&report.filled, &current.elements);
        for issue in &report.field_issues {
            tracing::warn!("'{}': {}", issue.question, issue.problem);
        }
        self.record(
            RunEvent::now(&self.run_id, RunStage::Checked)
                .with_detail(format!("{} of {} fields off", report.field_issues.len(), report.filled.len())),
        );

        if !report.field_issues.is_empty() && self.options.validate_before_submit {
            tracing::error!(
                "{} filled fields do not hold their answers, not submitting",
                report.field_issues.len()
            );
            let report = report.with_duration(started.elapsed().as_millis());
            self.record(RunEvent::now(&self.run_id, RunStage::Finished).with_detail(format!("{:?}", report.outcome())));
            return Ok(report);
        }

        // ---- Submit ----
        let submit = Resolver::submit_action(&current.elements).ok_or(FillError::SubmitNotFound)?;
        self.perform(page, &submit, "submit")?;
        page.settle(self.options.submit_wait_ms)?;
        self.record(RunEvent::now(&self.run_id, RunStage::Submitted).with_action(&submit));
        report.submit = Some(submit);

        match page.current_url() {
            Ok(url) => {
                tracing::info!("Landed on {}", url);
                report.final_url = Some(url);
            }
            Err(e) => tracing::warn!("Could not read the page address after submitting: {}", e),
        }

        // ---- Verify ----
        let text = page.page_text()?;
        match verifier::matched_marker(&text) {
            Some(marker) => {
                tracing::info!("Submission confirmed ('{}')", marker);
                report.verification = Verification::Confirmed;
                report.success_marker = Some(marker.to_string());
            }
            None => {
                tracing::warn!("No confirmation text after submitting; check the form responses");
                report.verification = Verification::Inconclusive;
            }
        }
        self.record(RunEvent::now(&self.run_id, RunStage::Verified).with_detail(format!("{:?}", report.verification)));

        let report = report.with_duration(started.elapsed().as_millis());
        self.record(RunEvent::now(&self.run_id, RunStage::Finished).with_detail(format!("{:?}", report.outcome())));
        Ok(report)
    }

    /// Forms may keep an earlier draft; blank every visible text input.
    fn clear_text_inputs(&self, page: &mut dyn FormPage) -> Result<(), FillError> {
        let snapshot = page.snapshot()?;
        let targets: Vec<u32> = snapshot.of_kind(ElementKind::TextInput).map(|e| e.index).collect();
        let cleared = !targets.is_empty();
        for index in targets {
            let action = FillAction::type_text(index, "");
            if let Err(e) = page.act(index, action.verb, action.value.as_deref()) {
                tracing::warn!("Could not clear input [{}]: {}", index, e);
            }
        }
        if cleared {
            page.settle(self.options.settle_ms)?;
        }
        Ok(())
    }

    fn perform(&self, page: &mut dyn FormPage, action: &FillAction, question: &str) -> Result<(), FillError> {
        page.act(action.target_index, action.verb, action.value.as_deref())
            .map_err(|e| match e {
                e @ FillError::ActionFailure { .. } => e,
                other => FillError::ActionFailure {
                    question: question.to_string(),
                    index: action.target_index,
                    verb: action.verb,
                    reason: other.to_string(),
                },
            })
    }

    fn record(&self, event: RunEvent) {
        self.log.log(&event);
    }
}

