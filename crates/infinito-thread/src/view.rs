use infinito_persist::{Thread, THREAD_SEPARATOR};

use crate::splitter::{split, Disclosure};

/// Locally rendered thread: the root answer plus any appended expansions.
///
/// After an edit the view shows only the edited text, matching the single
/// root record left in the store.
#[derive(Debug, Clone, Default)]
pub struct ThreadView {
    answer: String,
    displayed: String,
}

impl ThreadView {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_thread(thread: &Thread) -> Self {
        Self {
            answer: thread.root().output.clone(),
            displayed: thread.rendered_text(),
        }
    }

    /// Streamed text so far; the answer is not settled until `show_answer`
    pub fn push_fragment(&mut self, fragment: &str) {
        self.displayed.push_str(fragment);
    }

    pub fn show_answer(&mut self, text: &str) {
        self.answer = text.to_string();
        self.displayed = text.to_string();
    }

    pub fn append_expansion(&mut self, text: &str) {
        if !self.displayed.is_empty() {
            self.displayed.push_str(THREAD_SEPARATOR);
        }
        self.displayed.push_str(text);
    }

    /// Collapse to a single edited text
    pub fn replace(&mut self, text: &str) {
        self.show_answer(text);
    }

    pub fn clear(&mut self) {
        self.answer.clear();
        self.displayed.clear();
    }

    pub fn answer(&self) -> &str {
        &self.answer
    }

    pub fn text(&self) -> &str {
        &self.displayed
    }

    pub fn disclosure(&self) -> Disclosure {
        split(&self.answer)
    }
}
