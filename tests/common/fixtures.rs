use form_autofill::answer_key::AnswerKey;
use form_autofill::form::form_model::{Confidence, ElementKind, FieldKind, FormElement, MatchResult};
use form_autofill::form::snapshot::FormSnapshot;

/// Answer key in the shape people actually write them.
pub const INFO_MD: &str = "\
# Details for the application form

* What is the student's full name?
Priya Sharma

* What is your email address?
priya.sharma@example.com

* Is he/she married?
No

* Which course is he/she taking?
EAG

* What is the date of birth?
2001-04-17
";

pub fn key(document: &str) -> AnswerKey {
    AnswerKey::load(document).expect("fixture answer key parses")
}

pub fn info_key() -> AnswerKey {
    key(INFO_MD)
}

pub fn text(index: u32) -> FormElement {
    FormElement::new(index, ElementKind::TextInput, None)
}

pub fn radio(index: u32, label: &str) -> FormElement {
    FormElement::new(index, ElementKind::RadioOption, Some(label))
}

pub fn dropdown(index: u32) -> FormElement {
    FormElement::new(index, ElementKind::DropdownControl, Some("Choose"))
}

pub fn hidden(index: u32) -> FormElement {
    FormElement::new(index, ElementKind::HiddenTextInput, None)
}

pub fn button(index: u32, label: &str) -> FormElement {
    FormElement::new(index, ElementKind::Button, Some(label))
}

pub fn matched(question: &str, answer: &str, field_kind: FieldKind) -> MatchResult {
    MatchResult {
        question: question.to_string(),
        answer: answer.to_string(),
        field_kind,
        confidence: Confidence::High,
    }
}

pub fn questions(qs: &[&str]) -> Vec<String> {
    qs.iter().map(|q| q.to_string()).collect()
}

/// `[RADIO Yes, RADIO No, DROPDOWN, HIDDEN, BUTTON Submit]`
pub fn raining_snapshot() -> FormSnapshot {
    FormSnapshot::new(
        questions(&["Is it raining?", "Pick a color"]),
        vec![
            radio(0, "Yes"),
            radio(1, "No"),
            dropdown(2),
            hidden(3),
            button(4, "Submit"),
        ],
    )
}

/// The application form the `INFO_MD` key was written for.
pub fn application_snapshot() -> FormSnapshot {
    FormSnapshot::new(
        questions(&[
            "What is the student's full name?",
            "What is your email address?",
            "Is he/she married?",
            "Which course is he/she taking?",
        ]),
        vec![
            text(0),
            text(1),
            radio(2, "Yes").with_group("married"),
            radio(3, "No").with_group("married"),
            dropdown(4),
            hidden(5),
            button(6, "Clear form"),
            button(7, "Submit"),
        ],
    )
}
