//! Builtin Category Definitions
//!
//! The fixed label vocabulary, the oracle-text rule table, and the curated
//! staples table. Everything here is plain data; evaluation lives in
//! `classifier`.

use std::collections::{BTreeSet, HashMap};
use std::fmt;
use std::str::FromStr;

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

use crate::error::DeckscopeError;

/// Weight given to patterns added through configuration
pub const DEFAULT_PATTERN_WEIGHT: f32 = 1.0;

/// Functional role of a card.
///
/// Declaration order is the storage order of label lists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Ramp,
    Draw,
    Removal,
    BoardWipe,
    Counterspell,
    Tutor,
    Protection,
    Recursion,
    Land,
    Other,
}

impl Category {
    pub const ALL: [Category; 10] = [
        Category::Ramp,
        Category::Draw,
        Category::Removal,
        Category::BoardWipe,
        Category::Counterspell,
        Category::Tutor,
        Category::Protection,
        Category::Recursion,
        Category::Land,
        Category::Other,
    ];

    /// Order used to pick the single display bucket of a multi-label card.
    pub const PRIMARY_PRIORITY: [Category; 10] = [
        Category::Land,
        Category::Ramp,
        Category::Draw,
        Category::Removal,
        Category::BoardWipe,
        Category::Counterspell,
        Category::Tutor,
        Category::Protection,
        Category::Recursion,
        Category::Other,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Ramp => "ramp",
            Self::Draw => "draw",
            Self::Removal => "removal",
            Self::BoardWipe => "board_wipe",
            Self::Counterspell => "counterspell",
            Self::Tutor => "tutor",
            Self::Protection => "protection",
            Self::Recursion => "recursion",
            Self::Land => "land",
            Self::Other => "other",
        }
    }

    /// Description handed to the external classifier.
    pub fn description(self) -> &'static str {
        match self {
            Self::Ramp => "Produces mana, fetches lands, mana rocks/dorks",
            Self::Draw => "Card draw, card selection, impulse draw",
            Self::Removal => "Targeted removal (destroy/exile/bounce single targets)",
            Self::BoardWipe => "Mass removal (destroys/exiles all or most creatures/permanents)",
            Self::Counterspell => "Counters spells",
            Self::Tutor => "Searches library for specific cards",
            Self::Protection => "Grants hexproof/indestructible/phasing/shroud/ward",
            Self::Recursion => "Returns cards from graveyard",
            Self::Land => "It's a land",
            Self::Other => {
                "Doesn't fit above categories (creatures, synergy pieces, win conditions, etc.)"
            }
        }
    }

    fn priority_rank(self) -> usize {
        Self::PRIMARY_PRIORITY
            .iter()
            .position(|c| *c == self)
            .unwrap_or(Self::PRIMARY_PRIORITY.len())
    }

    pub fn valid_names() -> String {
        Self::ALL
            .iter()
            .map(|c| c.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = DeckscopeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace([' ', '-'], "_");
        Self::ALL
            .into_iter()
            .find(|c| c.as_str() == normalized)
            .ok_or_else(|| DeckscopeError::UnknownCategory {
                name: s.to_string(),
                valid: Self::valid_names(),
            })
    }
}

/// Non-empty set of category labels.
///
/// An empty input collapses to `{other}`, so every card always carries at
/// least one label. `other` never sits next to a functional label.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "Vec<Category>", into = "Vec<Category>")]
pub struct CategorySet(BTreeSet<Category>);

impl CategorySet {
    pub fn new<I: IntoIterator<Item = Category>>(labels: I) -> Self {
        let mut set: BTreeSet<Category> = labels.into_iter().collect();
        if set.len() > 1 {
            set.remove(&Category::Other);
        }
        if set.is_empty() {
            Self::other()
        } else {
            Self(set)
        }
    }

    pub fn other() -> Self {
        Self(BTreeSet::from([Category::Other]))
    }

    pub fn land() -> Self {
        Self(BTreeSet::from([Category::Land]))
    }

    pub fn contains(&self, category: Category) -> bool {
        self.0.contains(&category)
    }

    pub fn iter(&self) -> impl Iterator<Item = Category> + '_ {
        self.0.iter().copied()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Never true; provided for API symmetry with `len`.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// True when the only label is `other`.
    pub fn is_other_only(&self) -> bool {
        self.0.len() == 1 && self.contains(Category::Other)
    }

    /// Display bucket: first label in `Category::PRIMARY_PRIORITY`.
    pub fn primary(&self) -> Category {
        self.iter()
            .min_by_key(|c| c.priority_rank())
            .unwrap_or(Category::Other)
    }

    /// Parse comma-separated user input such as `"ramp, draw"`.
    pub fn parse_list(input: &str) -> Result<Self, DeckscopeError> {
        let labels = input
            .split(',')
            .filter(|s| !s.trim().is_empty())
            .map(Category::from_str)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self::new(labels))
    }
}

impl Default for CategorySet {
    fn default() -> Self {
        Self::other()
    }
}

impl From<Vec<Category>> for CategorySet {
    fn from(labels: Vec<Category>) -> Self {
        Self::new(labels)
    }
}

impl From<CategorySet> for Vec<Category> {
    fn from(set: CategorySet) -> Self {
        set.0.into_iter().collect()
    }
}

impl fmt::Display for CategorySet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = self.iter().map(Category::as_str).collect();
        write!(f, "[{}]", names.join(", "))
    }
}

/// Oracle-text rules for one category, in evaluation order
#[derive(Debug, Clone)]
pub struct BuiltinRule {
    pub category: Category,
    /// (regex, weight); weight is kept for confidence scoring and not consulted yet
    pub patterns: &'static [(&'static str, f32)],
}

/// Builtin rule table, evaluated top to bottom.
pub const BUILTIN_RULES: &[BuiltinRule] = &[
    BuiltinRule {
        category: Category::Ramp,
        patterns: &[
            (r"add\b.{0,30}\bmana\b", 1.0),
            (
                r"search your library for.{0,30}\bland\b.{0,30}\bonto the battlefield\b",
                1.0,
            ),
            (r"put.{0,30}\bland.{0,30}\bonto the battlefield\b", 1.0),
            (r"add \{[WUBRGC]\}", 0.9),
            (r"add .{0,15}one mana of any", 1.0),
            (r"mana of any color", 0.7),
            (r"Treasure token", 0.6),
        ],
    },
    BuiltinRule {
        category: Category::Draw,
        patterns: &[
            (r"draw.{0,15}\bcards?\b", 1.0),
            (r"\bdraw a card\b", 1.0),
            (r"\bscry \d", 0.5),
            (r"look at the top.{0,20}cards? of your library", 0.6),
            (r"whenever.{0,40}draw", 0.8),
            (r"impulse draw", 0.8),
            (r"exile the top.{0,30}you may (play|cast)", 0.8),
        ],
    },
    BuiltinRule {
        category: Category::Removal,
        patterns: &[
            (
                r"destroy target.{0,30}(creature|artifact|enchantment|planeswalker|permanent|nonland)",
                1.0,
            ),
            (
                r"exile target.{0,30}(creature|artifact|enchantment|planeswalker|permanent|nonland)",
                1.0,
            ),
            (r"target.{0,20}gets? -\d+/-\d+", 0.9),
            (r"deals? \d+ damage to (target|any target)", 0.7),
            (r"return target.{0,20}to (its owner's hand|the top)", 0.7),
            (r"sacrifice.{0,15}(creature|permanent)", 0.6),
            (r"fight", 0.5),
        ],
    },
    BuiltinRule {
        category: Category::BoardWipe,
        patterns: &[
            (
                r"destroy all.{0,20}(creature|nonland|permanent|artifact|enchantment)",
                1.0,
            ),
            (
                r"exile all.{0,20}(creature|nonland|permanent|artifact|enchantment)",
                1.0,
            ),
            (r"all creatures get -\d+/-\d+", 1.0),
            (r"each (creature|player).{0,20}sacrifice", 0.7),
            (r"deals? \d+ damage to each creature", 0.8),
        ],
    },
    BuiltinRule {
        category: Category::Counterspell,
        patterns: &[
            (r"counter target spell", 1.0),
            (
                r"counter target.{0,30}(instant|sorcery|creature|artifact|enchantment|activated)",
                0.9,
            ),
            (r"counter it\b", 0.8),
        ],
    },
    BuiltinRule {
        category: Category::Tutor,
        patterns: &[
            (
                r"search your library for.{0,30}(card|creature|instant|sorcery|artifact|enchantment)",
                1.0,
            ),
            (r"search your library.{0,40}(put it|reveal)", 1.0),
        ],
    },
    BuiltinRule {
        category: Category::Protection,
        patterns: &[
            (r"\b(hexproof|shroud|indestructible|ward)\b", 0.8),
            (r"(gain|have|gets?) protection from", 0.8),
            (r"can't be (countered|the target)", 0.7),
            (r"phase out", 0.6),
        ],
    },
    BuiltinRule {
        category: Category::Recursion,
        patterns: &[
            (r"return.{0,30}from.{0,15}graveyard.{0,20}(to|onto)", 1.0),
            (
                r"put.{0,30}from.{0,15}graveyard.{0,20}(onto|into your hand)",
                1.0,
            ),
            (r"cast.{0,20}from.{0,10}graveyard", 0.9),
            (r"reanimate", 0.9),
            (r"flashback", 0.7),
        ],
    },
];

/// Heavily played cards whose text the rules miss or under-label.
pub const KNOWN_STAPLES: &[(Category, &[&str])] = &[
    (
        Category::Ramp,
        &[
            "Sol Ring",
            "Arcane Signet",
            "Commander's Sphere",
            "Mind Stone",
            "Fellwar Stone",
            "Thought Vessel",
            "Wayfarer's Bauble",
            "Burnished Hart",
            "Solemn Simulacrum",
            "Azorius Signet",
            "Dimir Signet",
            "Rakdos Signet",
            "Gruul Signet",
            "Selesnya Signet",
            "Orzhov Signet",
            "Izzet Signet",
            "Golgari Signet",
            "Boros Signet",
            "Simic Signet",
            "Talisman of Progress",
            "Talisman of Dominance",
            "Talisman of Indulgence",
            "Talisman of Impulse",
            "Talisman of Unity",
            "Talisman of Hierarchy",
            "Talisman of Creativity",
            "Talisman of Resilience",
            "Talisman of Conviction",
            "Talisman of Curiosity",
            "Rampant Growth",
            "Cultivate",
            "Kodama's Reach",
            "Farseek",
            "Nature's Lore",
            "Three Visits",
            "Sakura-Tribe Elder",
            "Birds of Paradise",
            "Llanowar Elves",
            "Elvish Mystic",
        ],
    ),
    (
        Category::Draw,
        &[
            "Rhystic Study",
            "Mystic Remora",
            "Sylvan Library",
            "Brainstorm",
            "Ponder",
            "Preordain",
            "Phyrexian Arena",
            "Beast Whisperer",
            "Harmonize",
            "Night's Whisper",
            "Sign in Blood",
            "Read the Bones",
            "Painful Truths",
        ],
    ),
    (
        Category::Removal,
        &[
            "Swords to Plowshares",
            "Path to Exile",
            "Generous Gift",
            "Beast Within",
            "Chaos Warp",
            "Reality Shift",
            "Abrupt Decay",
            "Assassin's Trophy",
            "Anguished Unmaking",
            "Despark",
            "Vindicate",
            "Cyclonic Rift",
            "Feed the Swarm",
            "Ravenform",
        ],
    ),
    (
        Category::BoardWipe,
        &[
            "Wrath of God",
            "Damnation",
            "Supreme Verdict",
            "Blasphemous Act",
            "Vanquish the Horde",
            "Farewell",
            "Toxic Deluge",
            "Austere Command",
            "Merciless Eviction",
            // overload side is a wipe
            "Cyclonic Rift",
        ],
    ),
    (
        Category::Counterspell,
        &[
            "Counterspell",
            "Swan Song",
            "Negate",
            "Arcane Denial",
            "Dovin's Veto",
            "Fierce Guardianship",
            "Force of Will",
            "Force of Negation",
            "Mana Drain",
            "An Offer You Can't Refuse",
        ],
    ),
    (
        Category::Tutor,
        &[
            "Demonic Tutor",
            "Vampiric Tutor",
            "Enlightened Tutor",
            "Mystical Tutor",
            "Worldly Tutor",
            "Gamble",
            "Diabolic Intent",
            "Imperial Seal",
        ],
    ),
];

static STAPLE_INDEX: Lazy<HashMap<&'static str, Vec<Category>>> = Lazy::new(|| {
    let mut index: HashMap<&'static str, Vec<Category>> = HashMap::new();
    for (category, names) in KNOWN_STAPLES {
        for name in names.iter() {
            index.entry(*name).or_default().push(*category);
        }
    }
    index
});

/// Curated labels for a card name, if it is a known staple.
pub fn staple_categories(name: &str) -> Option<&'static [Category]> {
    STAPLE_INDEX.get(name).map(|v| v.as_slice())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_rule_category_is_functional() {
        for rule in BUILTIN_RULES {
            assert!(!rule.patterns.is_empty());
            assert_ne!(rule.category, Category::Land);
            assert_ne!(rule.category, Category::Other);
        }
    }

    #[test]
    fn test_staple_lookup_multiple_categories() {
        let cats = staple_categories("Cyclonic Rift").unwrap();
        assert!(cats.contains(&Category::Removal));
        assert!(cats.contains(&Category::BoardWipe));
        assert!(staple_categories("Grizzly Bears").is_none());
    }

    #[test]
    fn test_category_parse() {
        assert_eq!("board_wipe".parse::<Category>().unwrap(), Category::BoardWipe);
        assert_eq!("Board Wipe".parse::<Category>().unwrap(), Category::BoardWipe);
        assert!("lifegain".parse::<Category>().is_err());
    }

    #[test]
    fn test_empty_set_becomes_other() {
        let set = CategorySet::new(Vec::new());
        assert!(set.is_other_only());
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn test_primary_follows_priority() {
        let set = CategorySet::new([Category::Recursion, Category::Draw]);
        assert_eq!(set.primary(), Category::Draw);
        let land_ramp = CategorySet::new([Category::Ramp, Category::Land]);
        assert_eq!(land_ramp.primary(), Category::Land);
    }

    #[test]
    fn test_set_serializes_as_sorted_list() {
        let set = CategorySet::new([Category::Removal, Category::Ramp]);
        assert_eq!(serde_json::to_string(&set).unwrap(), r#"["ramp","removal"]"#);
        let empty: CategorySet = serde_json::from_str("[]").unwrap();
        assert!(empty.is_other_only());
    }

    #[test]
    fn test_parse_list() {
        let set = CategorySet::parse_list("ramp, Draw").unwrap();
        assert!(set.contains(Category::Ramp));
        assert!(set.contains(Category::Draw));
        assert!(CategorySet::parse_list("ramp,bogus").is_err());
    }

    #[test]
    fn test_other_dropped_beside_functional_label() {
        let set = CategorySet::parse_list("other,ramp").unwrap();
        assert!(!set.contains(Category::Other));
        assert_eq!(set.len(), 1);

        let answer: CategorySet = serde_json::from_str(r#"["other","draw"]"#).unwrap();
        assert_eq!(answer, CategorySet::new([Category::Draw]));

        assert!(CategorySet::new([Category::Other, Category::Other]).is_other_only());
    }
}
