//! Tag filtering for schemas shared between several games
//!
//! Classes name the games they exist in with an `appliesto(...)` helper and
//! members carry tag lists such as `[since_ep1, !tf2]`. An export picks a
//! set of search tags (usually one game), expands it with [`TagRules`] and
//! keeps only what matches.
//!
//! ```
//! use entforge_core::TagRules;
//!
//! let search = TagRules::default().expand(["EP1"]);
//! assert!(search.contains("SINCE_HL2"));
//! assert!(search.contains("UNTIL_TF2"));
//! assert!(search.matches(&["SINCE_EP1".to_string()]));
//! assert!(!search.matches(&["SINCE_EP2".to_string()]));
//! ```

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Canonical form of a tag: trimmed and upper case
pub fn normalize_tag(tag: &str) -> String {
    tag.trim().to_ascii_uppercase()
}

/// Game order and feature table used to expand search tags
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TagRules {
    /// Games in release order. `SINCE_<game>` holds for that game and every
    /// later one, `UNTIL_<game>` for every earlier one.
    pub game_order: Vec<String>,
    /// Features backported to a game, keyed by game tag
    pub features: IndexMap<String, Vec<String>>,
}

impl TagRules {
    /// Expand search tags with their features and `SINCE_`/`UNTIL_` tags
    pub fn expand<I, S>(&self, tags: I) -> TagSet
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut expanded = BTreeSet::new();
        for tag in tags {
            let tag = normalize_tag(tag.as_ref());
            if let Some(features) = self.features.get(&tag) {
                expanded.extend(features.iter().map(|f| normalize_tag(f)));
            }
            let position = self
                .game_order
                .iter()
                .position(|game| game.eq_ignore_ascii_case(&tag));
            if let Some(pos) = position {
                let (upto, after) = self.game_order.split_at(pos + 1);
                expanded.extend(upto.iter().map(|g| format!("SINCE_{}", normalize_tag(g))));
                expanded.extend(after.iter().map(|g| format!("UNTIL_{}", normalize_tag(g))));
            }
            expanded.insert(tag);
        }
        TagSet(expanded)
    }
}

impl Default for TagRules {
    /// Source engine games and their backported features
    fn default() -> Self {
        let game_order = [
            "HLS", "DODS", "CSS", "HL2", "EP1", "EP2", "TF2", "P1", "L4D", "L4D2", "ASW", "P2",
            "CSGO", "SFM", "DOTA2", "PUNT", "P2DES",
        ]
        .iter()
        .map(|g| g.to_string())
        .collect();

        let features = [
            ("L4D", &["INSTANCING"][..]),
            ("TF2", &["INSTANCING", "PROP_SCALING"][..]),
            ("ASW", &["INSTANCING", "VSCRIPT"][..]),
            ("P2", &["INSTANCING", "VSCRIPT"][..]),
            ("CSGO", &["INSTANCING", "PROP_SCALING", "VSCRIPT"][..]),
            ("P2DES", &["INSTANCING", "PROP_SCALING", "VSCRIPT"][..]),
        ]
        .iter()
        .map(|(game, list)| {
            (
                game.to_string(),
                list.iter().map(|f| f.to_string()).collect(),
            )
        })
        .collect();

        Self {
            game_order,
            features,
        }
    }
}

/// An expanded set of search tags
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TagSet(BTreeSet<String>);

impl TagSet {
    /// Whether the set holds `tag`, compared case-insensitively
    pub fn contains(&self, tag: &str) -> bool {
        self.0.contains(&normalize_tag(tag))
    }

    /// Whether the set holds no tags
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Tags in sorted order
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    /// Whether a tag list admits this search set
    ///
    /// An empty list always matches. `!TAG` and `-TAG` exclude, `+TAG` is
    /// required, and when plain tags are present at least one must be in
    /// the set.
    pub fn matches(&self, tags: &[String]) -> bool {
        let mut plain_seen = false;
        let mut plain_hit = false;
        for tag in tags {
            let tag = normalize_tag(tag);
            if let Some(excluded) = tag.strip_prefix('!').or_else(|| tag.strip_prefix('-')) {
                if self.0.contains(excluded) {
                    return false;
                }
            } else if let Some(required) = tag.strip_prefix('+') {
                if !self.0.contains(required) {
                    return false;
                }
            } else {
                plain_seen = true;
                plain_hit |= self.0.contains(&tag);
            }
        }
        !plain_seen || plain_hit
    }
}

impl<S: AsRef<str>> FromIterator<S> for TagSet {
    /// Collect tags as given, without expansion
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        TagSet(iter.into_iter().map(|t| normalize_tag(t.as_ref())).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tags(list: &[&str]) -> Vec<String> {
        list.iter().map(|t| t.to_string()).collect()
    }

    #[test]
    fn test_since_until_expansion() {
        let search = TagRules::default().expand(["hl2"]);
        assert!(search.contains("HL2"));
        assert!(search.contains("SINCE_HLS"));
        assert!(search.contains("SINCE_HL2"));
        assert!(!search.contains("SINCE_EP1"));
        assert!(search.contains("UNTIL_EP1"));
        assert!(search.contains("UNTIL_P2DES"));
        assert!(!search.contains("UNTIL_HL2"));
    }

    #[test]
    fn test_feature_expansion() {
        let search = TagRules::default().expand(["TF2"]);
        assert!(search.contains("INSTANCING"));
        assert!(search.contains("PROP_SCALING"));
        assert!(!search.contains("VSCRIPT"));
    }

    #[test]
    fn test_unknown_tags_are_kept() {
        let search = TagRules::default().expand(["srctools", "Engine"]);
        let all: Vec<_> = search.iter().collect();
        assert_eq!(all, vec!["ENGINE", "SRCTOOLS"]);
    }

    #[test]
    fn test_custom_game_order() {
        let rules = TagRules {
            game_order: tags(&["alpha", "beta", "gamma"]),
            features: IndexMap::new(),
        };
        let search = rules.expand(["BETA"]);
        assert!(search.contains("SINCE_ALPHA"));
        assert!(search.contains("SINCE_BETA"));
        assert!(search.contains("UNTIL_GAMMA"));
        assert!(!search.contains("UNTIL_BETA"));
    }

    #[test]
    fn test_matching() {
        let search = TagRules::default().expand(["EP2"]);
        assert!(search.matches(&[]));
        assert!(search.matches(&tags(&["HL2", "EP2"])));
        assert!(!search.matches(&tags(&["TF2", "P2"])));
        assert!(search.matches(&tags(&["since_ep1"])));
        assert!(!search.matches(&tags(&["until_ep2"])));
        assert!(!search.matches(&tags(&["!EP2"])));
        assert!(!search.matches(&tags(&["-SINCE_HL2"])));
        assert!(search.matches(&tags(&["!TF2"])));
        assert!(!search.matches(&tags(&["+INSTANCING"])));
        assert!(TagRules::default().expand(["L4D"]).matches(&tags(&["+INSTANCING"])));
    }

    #[test]
    fn test_rules_from_ron() {
        let rules: TagRules = ron::from_str(r#"(game_order: ["A", "B"])"#).unwrap();
        assert_eq!(rules.game_order, tags(&["A", "B"]));
        assert_eq!(rules.features, TagRules::default().features);
    }
}
