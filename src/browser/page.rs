use crate::error::FillError;
use crate::form::form_model::Verb;
use crate::form::snapshot::FormSnapshot;

/// Live form page the run drives.
///
/// `snapshot` must reflect the current DOM and may be called any number of
/// times; `act` reports failure and never retries.
pub trait FormPage {
    fn navigate(&mut self, url: &str) -> Result<(), FillError>;

    fn snapshot(&mut self) -> Result<FormSnapshot, FillError>;

    fn act(&mut self, index: u32, verb: Verb, value: Option<&str>) -> Result<(), FillError>;

    /// Visible text of the current page
    fn page_text(&mut self) -> Result<String, FillError>;

    /// Address the page is on now, after any redirect
    fn current_url(&mut self) -> Result<String, FillError>;

    /// Give the page time to settle after an action.
    fn settle(&mut self, ms: u64) -> Result<(), FillError>;
}
