use compact_str::CompactString;
use rustc_hash::FxBuildHasher;
use smallvec::SmallVec;
use std::collections::HashMap;

pub const APEX_LABEL: &str = "@";
const WILDCARD: &str = "*";

/// How a query name relates to the stored locations of a zone, in
/// precedence order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchClass {
    ExactMatch,
    WildCardMatch,
    /// An ancestor holds a location but nothing matches below it: a
    /// candidate delegation point.
    CeMatch,
    /// The name exists only as an interior node with no location attached.
    EmptyNonTerminalMatch,
    NoMatch,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocationMatch {
    pub label: String,
    pub class: MatchClass,
}

impl LocationMatch {
    fn new(label: impl Into<String>, class: MatchClass) -> Self {
        Self {
            label: label.into(),
            class,
        }
    }
}

#[derive(Debug, Default, Clone)]
struct MatcherNode {
    children: HashMap<CompactString, MatcherNode, FxBuildHasher>,
    /// Stored location label ending at this node, e.g. `www.sub`.
    label: Option<CompactString>,
}

/// Prefix tree over reversed labels of the locations stored in one zone.
///
/// `www.sub` is stored along the path `sub → www`, so names sharing a
/// parent share a prefix. The apex `@` is the root and always exists.
#[derive(Debug, Clone)]
pub struct LocationMatcher {
    root: MatcherNode,
    len: usize,
}

impl LocationMatcher {
    pub fn new() -> Self {
        Self {
            root: MatcherNode {
                children: HashMap::with_hasher(FxBuildHasher),
                label: Some(CompactString::const_new(APEX_LABEL)),
            },
            len: 0,
        }
    }

    pub fn from_labels<I, S>(labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut matcher = Self::new();
        for label in labels {
            matcher.insert(label.as_ref());
        }
        matcher
    }

    /// Insert a location label relative to the zone apex.
    pub fn insert(&mut self, label: &str) {
        let label = label.trim_end_matches('.').to_ascii_lowercase();
        if label.is_empty() || label == APEX_LABEL {
            return;
        }
        let mut node = &mut self.root;
        for part in label.split('.').rev() {
            node = node.children.entry(CompactString::new(part)).or_default();
        }
        if node.label.is_none() {
            self.len += 1;
        }
        node.label = Some(CompactString::new(&label));
    }

    /// Number of stored labels, not counting the implicit apex.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Classify `relative`, a query name with the zone suffix stripped
    /// (empty or `@` for the apex).
    pub fn find_location(&self, relative: &str) -> LocationMatch {
        let relative = relative.trim_end_matches('.').to_ascii_lowercase();
        if relative.is_empty() || relative == APEX_LABEL {
            return LocationMatch::new(APEX_LABEL, MatchClass::ExactMatch);
        }

        let labels: SmallVec<[&str; 8]> = relative.split('.').rev().collect();
        let mut node = &self.root;
        let mut depth = 0;
        // Deepest non-apex ancestor carrying a location.
        let mut encloser: Option<&CompactString> = None;

        for label in &labels {
            match node.children.get(*label) {
                Some(child) => {
                    node = child;
                    depth += 1;
                    if depth < labels.len() {
                        if let Some(l) = &child.label {
                            encloser = Some(l);
                        }
                    }
                }
                None => break,
            }
        }

        if depth == labels.len() {
            return match &node.label {
                Some(label) => LocationMatch::new(label.as_str(), MatchClass::ExactMatch),
                None => LocationMatch::new(relative.as_str(), MatchClass::EmptyNonTerminalMatch),
            };
        }

        if let Some(wildcard) = node.children.get(WILDCARD) {
            if let Some(label) = &wildcard.label {
                return LocationMatch::new(label.as_str(), MatchClass::WildCardMatch);
            }
        }

        match encloser {
            Some(label) => LocationMatch::new(label.as_str(), MatchClass::CeMatch),
            None => LocationMatch::new("", MatchClass::NoMatch),
        }
    }
}

impl Default for LocationMatcher {
    fn default() -> Self {
        Self::new()
    }
}
