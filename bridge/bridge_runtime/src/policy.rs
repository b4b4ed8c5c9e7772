use serde::Deserialize;
use std::collections::{HashMap, HashSet};

/// Component types that always behave as if they asked to fill the space
/// available to them, whatever flex weight they declare.
///
/// Built from the host's `expandedComponentsMap`. Only `true` entries are kept
/// and names are folded to lowercase.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(from = "HashMap<String, bool>")]
pub struct ExpansionPolicy {
    expanded: HashSet<String>,
}

impl ExpansionPolicy {
    pub fn always_expands(&self, component: &str) -> bool {
        self.expanded.contains(&component.to_ascii_lowercase())
    }

    pub fn is_empty(&self) -> bool {
        self.expanded.is_empty()
    }
}

impl<K: AsRef<str>> FromIterator<(K, bool)> for ExpansionPolicy {
    fn from_iter<I: IntoIterator<Item = (K, bool)>>(entries: I) -> Self {
        let expanded = entries
            .into_iter()
            .filter(|(_, expands)| *expands)
            .map(|(component, _)| component.as_ref().to_ascii_lowercase())
            .collect();
        Self { expanded }
    }
}

impl From<HashMap<String, bool>> for ExpansionPolicy {
    fn from(map: HashMap<String, bool>) -> Self {
        map.into_iter().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookups_ignore_case() {
        let policy: ExpansionPolicy = [("beagle:scrollview", true)].into_iter().collect();
        assert!(policy.always_expands("beagle:scrollView"));
        assert!(policy.always_expands("BEAGLE:SCROLLVIEW"));
        assert!(!policy.always_expands("beagle:container"));
    }

    #[test]
    fn false_entries_are_ignored() {
        let policy: ExpansionPolicy =
            serde_json::from_str(r#"{"beagle:listView":false,"Beagle:PageView":true}"#)
                .expect("decode policy");
        assert!(!policy.always_expands("beagle:listview"));
        assert!(policy.always_expands("beagle:pageview"));
    }

    #[test]
    fn empty_policy_expands_nothing() {
        let policy = ExpansionPolicy::default();
        assert!(policy.is_empty());
        assert!(!policy.always_expands("beagle:scrollview"));
    }
}
