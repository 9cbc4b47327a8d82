//! Tool catalog and search-tool selection.
//!
//! The catalog preserves the order in which the remote advertised its tools.
//! Selection applies an explicit, ordered rule list so the pick is
//! deterministic and independently testable; it is a convenience for
//! exploratory callers; production handlers always address tools by exact
//! name.

use crate::types::ToolInfo;

/// Ordered collection of the tools a remote endpoint advertises.
#[derive(Debug, Clone, Default)]
pub struct ToolCatalog {
    tools: Vec<ToolInfo>,
}

/// A single selection rule, applied to tool names.
#[derive(Debug, Clone, Copy)]
enum SelectionRule {
    Exact(&'static str),
    ContainsAll(&'static [&'static str]),
}

impl SelectionRule {
    fn matches(&self, name: &str) -> bool {
        match self {
            SelectionRule::Exact(expected) => name == *expected,
            SelectionRule::ContainsAll(parts) => parts.iter().all(|part| name.contains(part)),
        }
    }
}

/// Precedence for picking a generic web-search tool when the caller names
/// none. Rules are tried in order; the first rule with any match wins, and
/// within a rule the first matching tool in catalog order wins.
const SEARCH_RULES: &[SelectionRule] = &[
    SelectionRule::Exact("search"),
    SelectionRule::ContainsAll(&["tavily", "search"]),
    SelectionRule::ContainsAll(&["brave", "web"]),
];

impl ToolCatalog {
    pub fn new(tools: Vec<ToolInfo>) -> Self {
        Self { tools }
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ToolInfo> {
        self.tools.iter()
    }

    /// Advertised tool names, in catalog order.
    pub fn names(&self) -> Vec<&str> {
        self.tools.iter().map(|t| t.name.as_str()).collect()
    }

    /// Exact-name lookup.
    pub fn get(&self, name: &str) -> Option<&ToolInfo> {
        self.tools.iter().find(|t| t.name == name)
    }

    /// Pick a tool for an exploratory query.
    ///
    /// A caller-preferred name short-circuits with an exact match. Otherwise
    /// the ordered [`SEARCH_RULES`] apply, falling back to the first
    /// advertised tool. Returns `None` only for an empty catalog.
    pub fn select(&self, preferred: Option<&str>) -> Option<&ToolInfo> {
        if let Some(name) = preferred {
            if let Some(tool) = self.get(name) {
                return Some(tool);
            }
            tracing::warn!(name, "preferred tool not advertised; applying selection rules");
        }

        for rule in SEARCH_RULES {
            if let Some(tool) = self.tools.iter().find(|t| rule.matches(&t.name)) {
                return Some(tool);
            }
        }
        self.tools.first()
    }
}
