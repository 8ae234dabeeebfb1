use std::fmt;

use serde::Serialize;

use crate::form::form_model::{ElementKind, FieldKind, FillAction, FormElement, MatchResult};
use crate::form::snapshot::FormSnapshot;

/// Button labels that count as the form's submit control.
pub const SUBMIT_MARKERS: [&str; 2] = ["submit", "send"];

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum UnresolvedReason {
    /// Snapshot has no element of the required kind at all
    KindAbsent { kind: FieldKind },
    /// Every element of the required kind was already used
    KindExhausted { kind: FieldKind },
    /// No radio option is labelled with the answer
    NoRadioLabel { answer: String },
    /// Dropdown control found but its hidden backing input is not where
    /// expected
    NoCompanionInput { control_index: u32 },
}

impl fmt::Display for UnresolvedReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UnresolvedReason::KindAbsent { kind } => write!(f, "no {:?} field on the page", kind),
            UnresolvedReason::KindExhausted { kind } => {
                write!(f, "all {:?} fields are already taken", kind)
            }
            UnresolvedReason::NoRadioLabel { answer } => {
                write!(f, "no radio option labelled '{}'", answer)
            }
            UnresolvedReason::NoCompanionInput { control_index } => write!(
                f,
                "dropdown [{}] has no hidden input after it",
                control_index
            ),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UnresolvedQuestion {
    pub question: String,
    #[serde(flatten)]
    pub reason: UnresolvedReason,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedStep {
    pub question: String,
    pub action: FillAction,
}

/// Outcome of resolving a whole batch against one snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Resolution {
    pub steps: Vec<ResolvedStep>,
    pub unresolved: Vec<UnresolvedQuestion>,
    /// Final submit click; `None` when no button carries a submit marker
    pub submit: Option<FillAction>,
}

impl Resolution {
    /// Every action in execution order, submit last.
    pub fn actions(&self) -> Vec<FillAction> {
        self.steps
            .iter()
            .map(|s| s.action.clone())
            .chain(self.submit.clone())
            .collect()
    }
}

/// Elements of one snapshot split by kind, page order kept within each kind.
struct Partition<'a> {
    text_inputs: Vec<&'a FormElement>,
    radio_options: Vec<&'a FormElement>,
    dropdown_controls: Vec<&'a FormElement>,
    buttons: Vec<&'a FormElement>,
}

impl<'a> Partition<'a> {
    fn new(elements: &'a [FormElement]) -> Self {
        let mut p = Partition {
            text_inputs: Vec::new(),
            radio_options: Vec::new(),
            dropdown_controls: Vec::new(),
            buttons: Vec::new(),
        };
        for el in elements {
            match el.kind {
                ElementKind::TextInput => p.text_inputs.push(el),
                ElementKind::RadioOption => p.radio_options.push(el),
                ElementKind::DropdownControl => p.dropdown_controls.push(el),
                // reached through their dropdown control
                ElementKind::HiddenTextInput => {}
                ElementKind::Button => p.buttons.push(el),
            }
        }
        p
    }

    fn has(&self, kind: FieldKind) -> bool {
        match kind {
            FieldKind::Text => !self.text_inputs.is_empty(),
            FieldKind::Radio => !self.radio_options.is_empty(),
            FieldKind::Dropdown => !self.dropdown_controls.is_empty(),
        }
    }
}

/// Decides which element each matched answer goes into.
///
/// Text inputs and dropdowns are claimed by position within their kind:
/// an element tied to the match's question is taken first, otherwise the
/// earliest free one that no other question owns. Radio options are picked by
/// label, among the options of the match's own question when the page ties
/// them to one. State lives in positions within each kind rather than element
/// indices, so the same resolver can be fed a fresh snapshot before every
/// action.
#[derive(Debug, Clone, Default)]
pub struct Resolver {
    claimed_texts: Vec<usize>,
    claimed_dropdowns: Vec<usize>,
    claimed_radios: Vec<usize>,
    answered_groups: Vec<String>,
}

impl Resolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolve one match against the current snapshot elements.
    pub fn next(&mut self, m: &MatchResult, elements: &[FormElement]) -> Result<FillAction, UnresolvedQuestion> {
        let parts = Partition::new(elements);
        let wanted = normalize(&m.question);
        let kind = self.effective_kind(m, &wanted, &parts, elements);

        let unresolved = |reason| UnresolvedQuestion {
            question: m.question.clone(),
            reason,
        };

        if !parts.has(kind) {
            return Err(unresolved(UnresolvedReason::KindAbsent { kind }));
        }

        match kind {
            FieldKind::Text => {
                let pos = pick_slot(&parts.text_inputs, &self.claimed_texts, &wanted)
                    .ok_or_else(|| unresolved(UnresolvedReason::KindExhausted { kind }))?;
                self.claimed_texts.push(pos);
                Ok(FillAction::type_text(parts.text_inputs[pos].index, &m.answer))
            }

            FieldKind::Radio => {
                let own: Vec<(usize, &FormElement)> = parts
                    .radio_options
                    .iter()
                    .copied()
                    .enumerate()
                    .filter(|(_, o)| tied_to(o, &wanted))
                    .collect();
                let candidates: Vec<(usize, &FormElement)> = if own.is_empty() {
                    parts.radio_options.iter().copied().enumerate().collect()
                } else {
                    own
                };

                let (pos, option) = self.find_radio(&candidates, &m.answer).ok_or_else(|| {
                    unresolved(UnresolvedReason::NoRadioLabel {
                        answer: m.answer.clone(),
                    })
                })?;
                self.claimed_radios.push(pos);
                if let Some(group) = &option.group {
                    self.answered_groups.push(group.clone());
                }
                Ok(FillAction::click(option.index))
            }

            FieldKind::Dropdown => {
                let pos = pick_slot(&parts.dropdown_controls, &self.claimed_dropdowns, &wanted)
                    .ok_or_else(|| unresolved(UnresolvedReason::KindExhausted { kind }))?;
                // Claimed even when its companion is missing, so later
                // dropdowns stay aligned with their controls.
                self.claimed_dropdowns.push(pos);
                let control = parts.dropdown_controls[pos];
                let hidden = companion_input(control, elements).ok_or_else(|| {
                    unresolved(UnresolvedReason::NoCompanionInput {
                        control_index: control.index,
                    })
                })?;
                Ok(FillAction::type_text(hidden.index, &m.answer))
            }
        }
    }

    /// The first button whose label carries a submit marker.
    pub fn submit_action(elements: &[FormElement]) -> Option<FillAction> {
        Partition::new(elements)
            .buttons
            .iter()
            .find(|b| {
                b.label.as_deref().is_some_and(|l| {
                    let lower = l.to_lowercase();
                    SUBMIT_MARKERS.iter().any(|m| lower.contains(m))
                })
            })
            .map(|b| FillAction::click(b.index))
    }

    /// The snapshot is ground truth: when elements are tied to this question,
    /// their kind overrides the matcher's guess. When the guessed kind is not
    /// on the page at all, an answer labelling a radio option means Radio,
    /// and otherwise the one other kind with a free element is used.
    fn effective_kind(&self, m: &MatchResult, wanted: &str, parts: &Partition<'_>, elements: &[FormElement]) -> FieldKind {
        let associated = elements
            .iter()
            .filter(|e| tied_to(e, wanted))
            .find_map(|e| FieldKind::for_element(e.kind));

        if let Some(kind) = associated {
            if kind != m.field_kind {
                tracing::debug!(
                    "'{}': page shows {:?}, matcher guessed {:?}",
                    m.question,
                    kind,
                    m.field_kind
                );
            }
            return kind;
        }

        if parts.has(m.field_kind) {
            return m.field_kind;
        }

        if m.field_kind != FieldKind::Radio && parts.radio_options.iter().any(|o| label_eq(o, &m.answer)) {
            tracing::debug!(
                "'{}': no {:?} field on the page, using matching radio option",
                m.question,
                m.field_kind
            );
            return FieldKind::Radio;
        }

        let free: Vec<FieldKind> = [
            (FieldKind::Text, &parts.text_inputs, &self.claimed_texts),
            (FieldKind::Dropdown, &parts.dropdown_controls, &self.claimed_dropdowns),
        ]
        .into_iter()
        .filter(|(kind, slots, claimed)| *kind != m.field_kind && pick_slot(slots, claimed, wanted).is_some())
        .map(|(kind, _, _)| kind)
        .collect();

        if let [only] = free.as_slice() {
            tracing::debug!(
                "'{}': no {:?} field on the page, using the free {:?} field",
                m.question,
                m.field_kind,
                only
            );
            return *only;
        }

        m.field_kind
    }

    /// Exact case-insensitive label first, else the closest substring match
    /// (smallest length difference, earliest on ties).
    fn find_radio<'a>(&self, options: &[(usize, &'a FormElement)], answer: &str) -> Option<(usize, &'a FormElement)> {
        let answer_lower = answer.trim().to_lowercase();
        if answer_lower.is_empty() {
            return None;
        }

        let available: Vec<(usize, &'a FormElement)> = options
            .iter()
            .copied()
            .filter(|(pos, o)| {
                !self.claimed_radios.contains(pos)
                    && o.group
                        .as_ref()
                        .is_none_or(|g| !self.answered_groups.contains(g))
            })
            .collect();

        if let Some(exact) = available.iter().find(|(_, o)| label_eq(o, &answer_lower)) {
            return Some(*exact);
        }

        available
            .iter()
            .filter_map(|(pos, o)| {
                let label = o.label.as_deref()?.trim().to_lowercase();
                if label.is_empty() {
                    return None;
                }
                let overlaps = label.contains(&answer_lower) || answer_lower.contains(&label);
                overlaps.then(|| (label.len().abs_diff(answer_lower.len()), *pos, *o))
            })
            .min_by_key(|(diff, pos, _)| (*diff, *pos))
            .map(|(_, pos, o)| (pos, o))
    }
}

/// Position of the element a match should take among `slots`: the free one
/// tied to its question, else the earliest free one owned by no question.
fn pick_slot(slots: &[&FormElement], claimed: &[usize], wanted: &str) -> Option<usize> {
    let free = |pos: &usize| !claimed.contains(pos);
    (0..slots.len())
        .filter(free)
        .find(|&pos| tied_to(slots[pos], wanted))
        .or_else(|| {
            (0..slots.len())
                .filter(free)
                .find(|&pos| slots[pos].question.is_none())
        })
}

/// Resolve a batch of matches against one snapshot.
///
/// Matches are taken in the order their questions appear on the page. A
/// fresh resolver is used each call, so the same inputs always give the same
/// resolution.
pub fn resolve(matches: &[MatchResult], snapshot: &FormSnapshot) -> Resolution {
    let mut resolver = Resolver::new();
    let mut steps = Vec::new();
    let mut unresolved = Vec::new();

    for m in order_by_page(matches, &snapshot.questions) {
        match resolver.next(m, &snapshot.elements) {
            Ok(action) => steps.push(ResolvedStep {
                question: m.question.clone(),
                action,
            }),
            Err(u) => {
                tracing::warn!("Unresolved '{}': {}", u.question, u.reason);
                unresolved.push(u);
            }
        }
    }

    Resolution {
        steps,
        unresolved,
        submit: Resolver::submit_action(&snapshot.elements),
    }
}

/// Sort matches by where their question first appears on the page. Matches
/// for questions not on the page keep their relative order at the end.
pub fn order_by_page<'a>(matches: &'a [MatchResult], page_questions: &[String]) -> Vec<&'a MatchResult> {
    let position = |q: &str| {
        let q = normalize(q);
        page_questions
            .iter()
            .position(|p| normalize(p) == q)
            .unwrap_or(usize::MAX)
    };
    let mut ordered: Vec<&MatchResult> = matches.iter().collect();
    ordered.sort_by_key(|m| position(&m.question));
    ordered
}

/// The hidden input backing a dropdown control: the declared companion if
/// the page exposes one, else the element right after the control.
fn companion_input<'a>(control: &FormElement, elements: &'a [FormElement]) -> Option<&'a FormElement> {
    if let Some(companion) = control.companion {
        match elements.iter().find(|e| e.index == companion) {
            Some(e) if e.kind == ElementKind::HiddenTextInput => return Some(e),
            _ => tracing::debug!(
                "Declared companion [{}] of dropdown [{}] is not a hidden input, trying adjacency",
                companion,
                control.index
            ),
        }
    }

    let pos = elements.iter().position(|e| e.index == control.index)?;
    elements
        .get(pos + 1)
        .filter(|e| e.kind == ElementKind::HiddenTextInput)
}

fn tied_to(element: &FormElement, wanted: &str) -> bool {
    element.question.as_deref().is_some_and(|q| normalize(q) == wanted)
}

fn label_eq(option: &FormElement, answer: &str) -> bool {
    option
        .label
        .as_deref()
        .is_some_and(|l| l.trim().to_lowercase() == answer.trim().to_lowercase())
}

fn normalize(text: &str) -> String {
    text.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .trim_end_matches('*')
        .trim()
        .to_lowercase()
}
