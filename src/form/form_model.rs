use serde::{Deserialize, Serialize};

/// Interactive element kinds the resolver distinguishes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ElementKind {
    TextInput,
    RadioOption,
    DropdownControl,
    /// Non-visible text field backing a dropdown's selected value
    HiddenTextInput,
    Button,
}

/// One interactive element of a form snapshot.
///
/// `index` is unique within a snapshot only. Any action that can change the
/// DOM may renumber elements, so indices must never be carried across
/// snapshots.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FormElement {
    pub index: u32,
    pub kind: ElementKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,

    /// For a dropdown control: index of its hidden backing input, when the
    /// page exposes the association.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub companion: Option<u32>,

    /// Radio group name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group: Option<String>,

    /// Question heading this element sits under
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub question: Option<String>,

    /// Current value of a text or hidden input
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,

    /// Radio option currently selected
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub checked: bool,
}

impl FormElement {
    pub fn new(index: u32, kind: ElementKind, label: Option<&str>) -> Self {
        Self {
            index,
            kind,
            label: label.map(str::to_string),
            companion: None,
            group: None,
            question: None,
            value: None,
            checked: false,
        }
    }

    pub fn with_companion(mut self, index: u32) -> Self {
        self.companion = Some(index);
        self
    }

    pub fn with_group(mut self, group: &str) -> Self {
        self.group = Some(group.to_string());
        self
    }

    pub fn with_question(mut self, question: &str) -> Self {
        self.question = Some(question.to_string());
        self
    }

    pub fn with_value(mut self, value: &str) -> Self {
        self.value = Some(value.to_string());
        self
    }

    pub fn checked(mut self) -> Self {
        self.checked = true;
        self
    }
}

/// How a matched answer is entered into the form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldKind {
    Text,
    Radio,
    Dropdown,
}

impl FieldKind {
    /// Parse the loose spelling an LLM may reply with.
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_lowercase().as_str() {
            "text" | "textbox" | "short_answer" | "input" => Some(FieldKind::Text),
            "radio" | "radio_button" | "choice" => Some(FieldKind::Radio),
            "dropdown" | "select" | "listbox" => Some(FieldKind::Dropdown),
            _ => None,
        }
    }

    /// Field kind implied by an element kind, if that element carries answers.
    pub fn for_element(kind: ElementKind) -> Option<Self> {
        match kind {
            ElementKind::TextInput => Some(FieldKind::Text),
            ElementKind::RadioOption => Some(FieldKind::Radio),
            ElementKind::DropdownControl => Some(FieldKind::Dropdown),
            ElementKind::HiddenTextInput | ElementKind::Button => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Confidence {
    High,
    Medium,
    Low,
}

impl Confidence {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_lowercase().as_str() {
            "high" => Some(Confidence::High),
            "medium" => Some(Confidence::Medium),
            "low" => Some(Confidence::Low),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchResult {
    pub question: String,
    pub answer: String,
    pub field_kind: FieldKind,
    pub confidence: Confidence,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Verb {
    Type,
    Click,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FillAction {
    pub target_index: u32,
    pub verb: Verb,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
}

impl FillAction {
    pub fn type_text(target_index: u32, value: &str) -> Self {
        Self {
            target_index,
            verb: Verb::Type,
            value: Some(value.to_string()),
        }
    }

    pub fn click(target_index: u32) -> Self {
        Self {
            target_index,
            verb: Verb::Click,
            value: None,
        }
    }
}

impl std::fmt::Display for FillAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match (&self.verb, &self.value) {
            (Verb::Type, Some(v)) => write!(f, "TYPE [{}] {:?}", self.target_index, v),
            (Verb::Type, None) => write!(f, "TYPE [{}]", self.target_index),
            (Verb::Click, _) => write!(f, "CLICK [{}]", self.target_index),
        }
    }
}
