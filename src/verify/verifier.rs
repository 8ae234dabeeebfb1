/// Case-insensitive phrases shown by Google Forms once a response is stored.
pub const SUCCESS_MARKERS: [&str; 6] = [
    "your response has been recorded",
    "response has been recorded",
    "submit another response",
    "view score",
    "thanks for",
    "thank you",
];

/// Best-effort check that the post-submit page confirms the submission.
///
/// `false` only means no marker was seen; the response may still have been
/// recorded.
pub fn verify(post_submit_text: &str) -> bool {
    matched_marker(post_submit_text).is_some()
}

/// The marker that confirmed the submission, if any.
pub fn matched_marker(post_submit_text: &str) -> Option<&'static str> {
    let text = post_submit_text.to_lowercase();
    SUCCESS_MARKERS.iter().copied().find(|m| text.contains(m))
}
