use form_autofill::browser::page::FormPage;
use form_autofill::error::FillError;
use form_autofill::form::form_model::{ElementKind, FormElement, Verb};
use form_autofill::form::snapshot::FormSnapshot;

#[derive(Debug, Clone, PartialEq)]
pub struct Act {
    pub index: u32,
    pub verb: Verb,
    pub value: Option<String>,
}

/// In-memory form page. Records every call and keeps typed values and radio
/// selections on its elements; acting on the reveal trigger appends the
/// held-back elements, the way a dropdown renders its options lazily.
pub struct ScriptedPage {
    pub snapshot: FormSnapshot,
    pub acts: Vec<Act>,
    pub navigated: Vec<String>,
    pub settles: Vec<u64>,
    pub snapshots_taken: usize,
    pub fail_on: Option<u32>,
    /// Element that accepts actions but never keeps what was entered
    pub drops_input: Option<u32>,
    pub confirmation: String,
    reveal: Option<(u32, Vec<FormElement>)>,
    submitted: bool,
}

impl ScriptedPage {
    pub fn new(snapshot: FormSnapshot) -> Self {
        Self {
            snapshot,
            acts: Vec::new(),
            navigated: Vec::new(),
            settles: Vec::new(),
            snapshots_taken: 0,
            fail_on: None,
            drops_input: None,
            confirmation: "Your response has been recorded.\nSubmit another response".to_string(),
            reveal: None,
            submitted: false,
        }
    }

    pub fn failing_on(mut self, index: u32) -> Self {
        self.fail_on = Some(index);
        self
    }

    pub fn dropping_input(mut self, index: u32) -> Self {
        self.drops_input = Some(index);
        self
    }

    pub fn with_confirmation(mut self, text: &str) -> Self {
        self.confirmation = text.to_string();
        self
    }

    pub fn revealing(mut self, trigger: u32, elements: Vec<FormElement>) -> Self {
        self.reveal = Some((trigger, elements));
        self
    }

    fn apply(&mut self, target: &FormElement, verb: Verb, value: Option<&str>) {
        match (target.kind, verb) {
            (ElementKind::Button, Verb::Click) => self.submitted = true,
            (ElementKind::RadioOption, Verb::Click) => {
                for el in self.snapshot.elements.iter_mut() {
                    let same_question = (target.group.is_some() && el.group == target.group)
                        || (target.question.is_some() && el.question == target.question);
                    if el.index == target.index {
                        el.checked = true;
                    } else if el.kind == ElementKind::RadioOption && same_question {
                        el.checked = false;
                    }
                }
            }
            (_, Verb::Type) => {
                if let Some(el) = self.snapshot.elements.iter_mut().find(|e| e.index == target.index) {
                    el.value = value.map(str::to_string);
                }
            }
            _ => {}
        }
    }

    pub fn rendered(&self) -> Vec<String> {
        self.acts
            .iter()
            .map(|a| match (&a.verb, &a.value) {
                (Verb::Type, Some(v)) => format!("TYPE {} {}", a.index, v),
                (Verb::Type, None) => format!("TYPE {}", a.index),
                (Verb::Click, _) => format!("CLICK {}", a.index),
            })
            .collect()
    }
}

impl FormPage for ScriptedPage {
    fn navigate(&mut self, url: &str) -> Result<(), FillError> {
        self.navigated.push(url.to_string());
        Ok(())
    }

    fn snapshot(&mut self) -> Result<FormSnapshot, FillError> {
        self.snapshots_taken += 1;
        Ok(self.snapshot.clone())
    }

    fn act(&mut self, index: u32, verb: Verb, value: Option<&str>) -> Result<(), FillError> {
        if self.fail_on == Some(index) {
            return Err(FillError::SessionProtocol {
                command: "act".into(),
                error: format!("element [{}] is detached", index),
            });
        }

        self.acts.push(Act {
            index,
            verb,
            value: value.map(str::to_string),
        });

        let target = self.snapshot.elements.iter().find(|e| e.index == index).cloned();
        if let Some(target) = target {
            if self.drops_input != Some(index) {
                self.apply(&target, verb, value);
            }
        }

        let triggered = matches!(&self.reveal, Some((trigger, _)) if *trigger == index);
        if triggered {
            if let Some((_, extra)) = self.reveal.take() {
                self.snapshot.elements.extend(extra);
                self.snapshot.elements.sort_by_key(|e| e.index);
            }
        }
        Ok(())
    }

    fn page_text(&mut self) -> Result<String, FillError> {
        if self.submitted {
            Ok(self.confirmation.clone())
        } else {
            Ok(self.snapshot.questions.join("\n"))
        }
    }

    fn current_url(&mut self) -> Result<String, FillError> {
        let url = self.navigated.last().cloned().unwrap_or_else(|| "about:blank".to_string());
        if self.submitted {
            Ok(format!("{}/formResponse", url))
        } else {
            Ok(url)
        }
    }

    fn settle(&mut self, ms: u64) -> Result<(), FillError> {
        self.settles.push(ms);
        Ok(())
    }
}
