use regex::{Regex, RegexBuilder};

use crate::model::todo::TodoItem;

/// Filters todos by their text.
#[derive(Debug, Clone)]
pub struct TodoMatcher {
    term: String,
    fuzzy: bool,
    re: Option<Regex>,
}

impl TodoMatcher {
    pub fn new(term: &str, fuzzy: bool) -> Self {
        let re = RegexBuilder::new(&regex::escape(term))
            .case_insensitive(true)
            .build()
            .ok();
        TodoMatcher {
            term: term.to_lowercase(),
            fuzzy,
            re,
        }
    }

    /// An empty term matches everything.
    pub fn matches(&self, todo: &TodoItem) -> bool {
        if self.term.is_empty() {
            return true;
        }
        if self.fuzzy {
            self.fuzzy_match(&todo.text)
        } else {
            self.exact_match(&todo.text)
        }
    }

    /// True when the todo or any of its subtasks matches
    pub fn matches_tree(&self, todo: &TodoItem) -> bool {
        self.matches(todo) || todo.subtasks.iter().any(|s| self.matches_tree(s))
    }

    fn exact_match(&self, text: &str) -> bool {
        match &self.re {
            Some(re) => re.is_match(text),
            None => text.to_lowercase().contains(&self.term),
        }
    }

    // Every term character must appear in order; gaps are allowed.
    fn fuzzy_match(&self, text: &str) -> bool {
        let mut haystack = text.chars().flat_map(char::to_lowercase);
        self.term.chars().all(|c| haystack.any(|h| h == c))
    }
}
