//! Snippet records and their on-disk representation.

use std::fmt;

/// Keyword opening a snippet block.
pub const START_KEYWORD: &str = "startsnip";
/// Keyword closing a snippet block.
pub const END_KEYWORD: &str = "endsnip";

/// A named, described block of reusable text.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Snippet {
    /// Unique identifier within a container.
    pub name: String,
    /// Free-text description shown in listings.
    pub description: String,
    /// Snippet text; may be empty or span several lines.
    pub body: String,
}

impl Snippet {
    /// Builds a snippet from its parts.
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        body: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            body: body.into(),
        }
    }

    /// Serialised form used both in the snippet file and in insert requests.
    ///
    /// ```text
    /// startsnip <name> "<description>"
    /// <body>
    /// endsnip
    ///
    /// ```
    #[must_use]
    pub fn repr(&self) -> String {
        self.to_string()
    }

    /// The `name\tdescription` line used by listings.
    #[must_use]
    pub fn listing(&self) -> String {
        format!("{}\t{}", self.name, self.description)
    }
}

impl fmt::Display for Snippet {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            formatter,
            "{START_KEYWORD} {} \"{}\"\n{}\n{END_KEYWORD}\n\n",
            self.name, self.description, self.body
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn repr_wraps_body_in_envelope() {
        let snippet = Snippet::new("func", "desc", "body line");
        assert_eq!(
            snippet.repr(),
            "startsnip func \"desc\"\nbody line\nendsnip\n\n"
        );
    }

    #[test]
    fn listing_separates_name_and_description_with_tab() {
        let snippet = Snippet::new("alpha", "first letter", "a");
        assert_eq!(snippet.listing(), "alpha\tfirst letter");
    }
}
