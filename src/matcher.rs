//! Declarative view-element pattern matching.
//!
//! A pattern constrains any combination of element name, classes,
//! attributes and style properties; each constraint value may be an exact
//! string, a regex, a predicate, or a wildcard. A successful match reports
//! exactly the facets it tested; the caller consumes those, and nothing
//! more, from the ledger.

use compact_str::CompactString;
use regex::Regex;

use crate::consumable::Facet;
use crate::view::ViewElement;

/// Constraint on a single string value.
#[derive(Debug, Clone)]
pub enum MatchValue {
    /// Any value passes (presence check only).
    Any,
    /// Exact string equality.
    Exact(String),
    /// Regex match (unanchored; anchor explicitly when needed).
    Re(Regex),
    /// Arbitrary predicate.
    Pred(fn(&str) -> bool),
}

impl MatchValue {
    fn matches(&self, value: &str) -> bool {
        match self {
            MatchValue::Any => true,
            MatchValue::Exact(s) => s == value,
            MatchValue::Re(re) => re.is_match(value),
            MatchValue::Pred(f) => f(value),
        }
    }
}

impl From<&str> for MatchValue {
    fn from(s: &str) -> Self {
        MatchValue::Exact(s.to_string())
    }
}

impl From<Regex> for MatchValue {
    fn from(re: Regex) -> Self {
        MatchValue::Re(re)
    }
}

/// Declarative pattern over one view element.
#[derive(Debug, Clone, Default)]
pub struct Pattern {
    /// Constraint on the element name, if any.
    pub name: Option<MatchValue>,
    /// Class constraints; each must match at least one class.
    pub classes: Vec<MatchValue>,
    /// Attribute constraints as key plus value constraint.
    pub attributes: Vec<(CompactString, MatchValue)>,
    /// Style constraints as property plus value constraint.
    pub styles: Vec<(CompactString, MatchValue)>,
}

impl Pattern {
    /// Pattern matching an exact element name.
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: Some(MatchValue::Exact(name.into())),
            ..Self::default()
        }
    }

    /// Pattern with no constraints at all (matches any element, consumes
    /// nothing). Mostly useful as a base for the builders below.
    pub fn any() -> Self {
        Self::default()
    }

    /// Constrain the element name.
    pub fn with_name(mut self, value: impl Into<MatchValue>) -> Self {
        self.name = Some(value.into());
        self
    }

    /// Require a class.
    pub fn with_class(mut self, value: impl Into<MatchValue>) -> Self {
        self.classes.push(value.into());
        self
    }

    /// Require an attribute.
    pub fn with_attribute(
        mut self,
        key: impl Into<CompactString>,
        value: impl Into<MatchValue>,
    ) -> Self {
        self.attributes.push((key.into(), value.into()));
        self
    }

    /// Require a style property.
    pub fn with_style(
        mut self,
        prop: impl Into<CompactString>,
        value: impl Into<MatchValue>,
    ) -> Self {
        self.styles.push((prop.into(), value.into()));
        self
    }

    /// Test this pattern against an element.
    fn matches(&self, element: &ViewElement) -> Option<MatchResult> {
        let mut result = MatchResult::default();

        if let Some(name) = &self.name {
            if !name.matches(&element.name) {
                return None;
            }
            result.name = true;
        }

        for constraint in &self.classes {
            let class = element.classes.iter().find(|c| constraint.matches(c))?;
            result.classes.push(class.clone());
        }

        for (key, constraint) in &self.attributes {
            let value = element.get_attr(key)?;
            if !constraint.matches(value) {
                return None;
            }
            result.attributes.push(key.clone());
        }

        for (prop, constraint) in &self.styles {
            let value = element.get_style(prop)?;
            if !constraint.matches(value) {
                return None;
            }
            result.styles.push(prop.clone());
        }

        Some(result)
    }
}

impl From<&str> for Pattern {
    fn from(name: &str) -> Self {
        Pattern::named(name)
    }
}

/// The facets a successful match actually tested.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MatchResult {
    /// Whether the element name was constrained.
    pub name: bool,
    /// Attribute keys that were tested.
    pub attributes: Vec<CompactString>,
    /// Class names that were tested.
    pub classes: Vec<CompactString>,
    /// Style properties that were tested.
    pub styles: Vec<CompactString>,
}

impl MatchResult {
    /// Convert into the facet list used by the consumable ledger.
    pub fn facets(&self) -> Vec<Facet> {
        let mut facets = Vec::new();
        if self.name {
            facets.push(Facet::Name);
        }
        facets.extend(self.attributes.iter().cloned().map(Facet::Attribute));
        facets.extend(self.classes.iter().cloned().map(Facet::Class));
        facets.extend(self.styles.iter().cloned().map(Facet::Style));
        facets
    }
}

/// One or more patterns tested in declaration order; the first match wins.
#[derive(Debug, Clone, Default)]
pub struct Matcher {
    patterns: Vec<Pattern>,
}

impl Matcher {
    /// Matcher over a single pattern.
    pub fn single(pattern: impl Into<Pattern>) -> Self {
        Self {
            patterns: vec![pattern.into()],
        }
    }

    /// Matcher over several patterns.
    pub fn list(patterns: impl IntoIterator<Item = Pattern>) -> Self {
        Self {
            patterns: patterns.into_iter().collect(),
        }
    }

    /// Add another pattern.
    pub fn add(&mut self, pattern: impl Into<Pattern>) {
        self.patterns.push(pattern.into());
    }

    /// Match an element against the pattern list; `None` when no pattern
    /// matches, in which case nothing may be consumed.
    pub fn match_element(&self, element: &ViewElement) -> Option<MatchResult> {
        self.patterns.iter().find_map(|p| p.matches(element))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_name_match() {
        let matcher = Matcher::single("strong");
        let el = ViewElement::new("strong");
        let m = matcher.match_element(&el).unwrap();
        assert!(m.name);
        assert!(m.attributes.is_empty());
        assert!(matcher.match_element(&ViewElement::new("em")).is_none());
    }

    #[test]
    fn test_regex_name() {
        let matcher = Matcher::single(Pattern::any().with_name(Regex::new("^h[1-6]$").unwrap()));
        assert!(matcher.match_element(&ViewElement::new("h2")).is_some());
        assert!(matcher.match_element(&ViewElement::new("head")).is_none());
    }

    #[test]
    fn test_attribute_and_class_facets() {
        let pattern = Pattern::named("span")
            .with_class("error")
            .with_attribute("data-id", MatchValue::Any);
        let matcher = Matcher::single(pattern);

        let el = ViewElement::new("span")
            .class("error")
            .class("extra")
            .attr("data-id", "7");
        let m = matcher.match_element(&el).unwrap();
        assert!(m.name);
        assert_eq!(m.classes, vec!["error"]);
        assert_eq!(m.attributes, vec!["data-id"]);
        // Untested facets are never reported.
        assert!(!m.classes.iter().any(|c| c == "extra"));
    }

    #[test]
    fn test_style_value_constraint() {
        let pattern = Pattern::any().with_style("font-weight", "bold");
        let matcher = Matcher::single(pattern);

        let el = ViewElement::new("span").style("font-weight", "bold");
        assert!(matcher.match_element(&el).is_some());

        let el = ViewElement::new("span").style("font-weight", "400");
        assert!(matcher.match_element(&el).is_none());
    }

    #[test]
    fn test_predicate_value() {
        let pattern = Pattern::any().with_attribute("href", MatchValue::Pred(|v| v.starts_with('/')));
        let matcher = Matcher::single(pattern);
        assert!(matcher
            .match_element(&ViewElement::new("a").attr("href", "/local"))
            .is_some());
        assert!(matcher
            .match_element(&ViewElement::new("a").attr("href", "https://x"))
            .is_none());
    }

    #[test]
    fn test_first_pattern_wins() {
        let matcher = Matcher::list([Pattern::named("b"), Pattern::named("strong")]);
        let m = matcher.match_element(&ViewElement::new("strong")).unwrap();
        assert!(m.name);

        // Declaration order decides which pattern reports the match.
        let both = Matcher::list([
            Pattern::named("em"),
            Pattern::named("em").with_attribute("data-x", MatchValue::Any),
        ]);
        let el = ViewElement::new("em").attr("data-x", "1");
        let m = both.match_element(&el).unwrap();
        assert!(m.attributes.is_empty(), "first pattern tested no attributes");
    }
}
