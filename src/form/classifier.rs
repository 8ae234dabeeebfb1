use serde::Deserialize;

use crate::form::form_model::{ElementKind, FormElement};

/// Element as reported by the browser driver, before classification.
#[derive(Debug, Clone, Deserialize)]
pub struct RawElement {
    pub index: u32,
    pub tag: String,
    #[serde(default)]
    pub r#type: Option<String>,
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub hidden: bool,
    #[serde(default)]
    pub disabled: bool,
    #[serde(default)]
    pub question: Option<String>,
    #[serde(default)]
    pub companion: Option<u32>,
    #[serde(default)]
    pub group: Option<String>,
    #[serde(default)]
    pub value: Option<String>,
    #[serde(default, alias = "selected")]
    pub checked: bool,
}

/// Classify raw driver elements into form elements, keeping page order.
/// Elements that are neither fillable nor clickable are dropped.
pub fn classify(elements: &[RawElement]) -> Vec<FormElement> {
    elements
        .iter()
        .filter_map(|el| {
            let kind = element_kind(el)?;
            Some(FormElement {
                index: el.index,
                kind,
                label: el
                    .label
                    .as_deref()
                    .map(str::trim)
                    .filter(|l| !l.is_empty())
                    .map(str::to_string),
                companion: el.companion,
                group: el.group.clone(),
                question: el.question.clone(),
                value: el.value.clone(),
                checked: el.checked,
            })
        })
        .collect()
}

fn element_kind(el: &RawElement) -> Option<ElementKind> {
    let role = el.role.as_deref().unwrap_or("");
    let tag = el.tag.to_lowercase();

    // Google Forms renders choices as div[role=radio] and dropdowns as div[role=listbox]
    if role == "radio" || (tag == "input" && el.r#type.as_deref() == Some("radio")) {
        return (!el.disabled).then_some(ElementKind::RadioOption);
    }
    if role == "listbox" || tag == "select" {
        return Some(ElementKind::DropdownControl);
    }
    if is_button(el, role, &tag) {
        return (!el.disabled).then_some(ElementKind::Button);
    }
    if is_text_entry(el, &tag) {
        if el.hidden || el.r#type.as_deref() == Some("hidden") {
            return Some(ElementKind::HiddenTextInput);
        }
        return Some(ElementKind::TextInput);
    }
    None
}

fn is_button(el: &RawElement, role: &str, tag: &str) -> bool {
    if role == "button" || tag == "button" {
        return true;
    }
    tag == "input" && matches!(el.r#type.as_deref(), Some("submit") | Some("button"))
}

fn is_text_entry(el: &RawElement, tag: &str) -> bool {
    if tag == "textarea" {
        return true;
    }
    if tag != "input" {
        return false;
    }

    match el.r#type.as_deref() {
        None
        | Some("text")
        | Some("email")
        | Some("number")
        | Some("tel")
        | Some("url")
        | Some("date")
        | Some("time")
        | Some("hidden") => true,

        Some("checkbox") | Some("file") | Some("image") | Some("reset") | Some("password") => false,

        _ => false,
    }
}
