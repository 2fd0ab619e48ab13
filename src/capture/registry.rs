//! Ordered pattern-to-agent bindings.

use std::fmt;
use std::sync::Arc;

use regex::Regex;

use super::agent::CaptureAgent;

/// A capture agent bound to the URL pattern that selects it.
#[derive(Clone)]
pub struct AgentBinding {
    name: String,
    pattern: Regex,
    agent: Arc<dyn CaptureAgent>,
}

impl AgentBinding {
    pub fn new(name: impl Into<String>, pattern: Regex, agent: Arc<dyn CaptureAgent>) -> Self {
        Self {
            name: name.into(),
            pattern,
            agent,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn pattern(&self) -> &Regex {
        &self.pattern
    }

    pub fn agent(&self) -> &Arc<dyn CaptureAgent> {
        &self.agent
    }

    /// Unanchored pattern match against the raw URL.
    pub fn matches(&self, url: &str) -> bool {
        self.pattern.is_match(url)
    }
}

impl fmt::Debug for AgentBinding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AgentBinding")
            .field("name", &self.name)
            .field("pattern", &self.pattern.as_str())
            .finish()
    }
}

/// Capture agents in configuration order.
///
/// Order is part of the configuration contract: [`AgentRegistry::select`]
/// returns the first binding that matches and never looks further.
#[derive(Debug, Clone, Default)]
pub struct AgentRegistry {
    bindings: Vec<AgentBinding>,
}

impl AgentRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a binding after all existing ones.
    pub fn push(&mut self, binding: AgentBinding) {
        self.bindings.push(binding);
    }

    /// First binding whose pattern matches `url`.
    pub fn select(&self, url: &str) -> Option<&AgentBinding> {
        self.bindings.iter().find(|b| b.matches(url))
    }

    pub fn iter(&self) -> impl Iterator<Item = &AgentBinding> {
        self.bindings.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::ScriptAgent;

    fn binding(name: &str, pattern: &str) -> AgentBinding {
        AgentBinding::new(
            name,
            Regex::new(pattern).unwrap(),
            Arc::new(ScriptAgent::new(name, "/bin/true")),
        )
    }

    #[test]
    fn test_first_match_wins() {
        let mut registry = AgentRegistry::new();
        registry.push(binding("specific", r"^https://example\.com/video/"));
        registry.push(binding("site", r"^https://example\.com/"));
        registry.push(binding("fallback", r".*"));

        assert_eq!(
            registry.select("https://example.com/video/1").unwrap().name(),
            "specific"
        );
        assert_eq!(
            registry.select("https://example.com/a").unwrap().name(),
            "site"
        );
        assert_eq!(
            registry.select("gopher://elsewhere").unwrap().name(),
            "fallback"
        );
    }

    #[test]
    fn test_order_is_not_rearranged() {
        let mut registry = AgentRegistry::new();
        registry.push(binding("fallback", r".*"));
        registry.push(binding("specific", r"^https://example\.com/video/"));

        assert_eq!(
            registry.select("https://example.com/video/1").unwrap().name(),
            "fallback"
        );
    }

    #[test]
    fn test_patterns_are_unanchored() {
        let mut registry = AgentRegistry::new();
        registry.push(binding("youtube", r"youtube\.com/watch"));

        assert!(registry
            .select("https://www.youtube.com/watch?v=abc")
            .is_some());
    }

    #[test]
    fn test_no_match() {
        let mut registry = AgentRegistry::new();
        registry.push(binding("site", r"^https://example\.com/"));

        assert!(registry.select("https://other.org/").is_none());
        assert!(AgentRegistry::new().select("https://example.com/").is_none());
    }
}
