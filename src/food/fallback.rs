use crate::food::model::{FoodRecord, Nutrients};

/// Keyword predicate evaluated against the lower-cased query.
#[derive(Debug, Clone)]
pub enum KeywordRule {
    AllOf(Vec<&'static str>),
    AnyOf(Vec<&'static str>),
}

impl KeywordRule {
    fn matches(&self, term: &str) -> bool {
        match self {
            KeywordRule::AllOf(words) => words.iter().all(|w| term.contains(w)),
            KeywordRule::AnyOf(words) => words.iter().any(|w| term.contains(w)),
        }
    }
}

#[derive(Debug, Clone)]
struct FallbackEntry {
    rule: KeywordRule,
    items: Vec<FoodRecord>,
}

/// Last-resort constant data. Rules are checked in insertion order and the
/// first match wins; `default_bucket` answers when nothing matches.
#[derive(Debug, Clone)]
pub struct StaticFallbackTable {
    entries: Vec<FallbackEntry>,
    default_bucket: Vec<FoodRecord>,
}

impl StaticFallbackTable {
    pub fn new(default_bucket: Vec<FoodRecord>) -> Self {
        Self {
            entries: Vec::new(),
            default_bucket,
        }
    }

    pub fn with_rule(mut self, rule: KeywordRule, items: Vec<FoodRecord>) -> Self {
        self.entries.push(FallbackEntry { rule, items });
        self
    }

    pub fn lookup(&self, term: &str) -> Option<&[FoodRecord]> {
        let term = term.to_lowercase();
        self.entries
            .iter()
            .find(|e| e.rule.matches(&term))
            .map(|e| e.items.as_slice())
    }

    pub fn default_bucket(&self) -> &[FoodRecord] {
        &self.default_bucket
    }

    /// The built-in table: chicken dishes, pizza slices and a burger.
    pub fn canonical() -> Self {
        let chicken = chicken_bucket();
        StaticFallbackTable::new(chicken.clone())
            .with_rule(KeywordRule::AllOf(vec!["chicken", "curry"]), chicken.clone())
            .with_rule(KeywordRule::AllOf(vec!["butter", "chicken"]), chicken)
            .with_rule(KeywordRule::AnyOf(vec!["pizza"]), pizza_bucket())
            .with_rule(KeywordRule::AnyOf(vec!["burger", "whopper"]), burger_bucket())
    }
}

impl Default for StaticFallbackTable {
    fn default() -> Self {
        Self::canonical()
    }
}

fn record(
    name: &str,
    common_names: &str,
    unique_id: &str,
    serving: &str,
    grams: f64,
    (calories, protein, carbs, fat): (f64, f64, f64, f64),
) -> FoodRecord {
    FoodRecord {
        name: name.into(),
        common_names: common_names.into(),
        unique_id: unique_id.into(),
        serving_description: serving.into(),
        serving_mass_grams: grams,
        nutrients: Nutrients {
            calories_kcal: calories,
            protein_grams: protein,
            carbs_grams: carbs,
            fat_grams: fat,
        },
    }
}

fn chicken_bucket() -> Vec<FoodRecord> {
    vec![
        record(
            "Chicken Curry",
            "Chicken curry",
            "chicken-curry-123",
            "1/2 chicken breast with sauce",
            138.5,
            (160.0, 14.8, 6.11, 8.6),
        ),
        record(
            "Butter Chicken",
            "Murgh Makhani",
            "butter-chicken-456",
            "1 serving",
            220.0,
            (250.0, 22.3, 8.5, 14.2),
        ),
        record(
            "Chicken Tikka Masala",
            "Chicken Tikka",
            "chicken-tikka-789",
            "1 cup",
            185.0,
            (235.0, 19.5, 10.2, 12.8),
        ),
    ]
}

fn pizza_bucket() -> Vec<FoodRecord> {
    vec![
        record(
            "Cheese Pizza (Slice)",
            "Pizza",
            "pizza-cheese-123",
            "slice",
            107.0,
            (285.0, 12.3, 33.6, 10.4),
        ),
        record(
            "Pepperoni Pizza (Slice)",
            "Pepperoni Pizza",
            "pizza-pep-456",
            "slice",
            113.0,
            (298.0, 13.2, 33.3, 12.1),
        ),
    ]
}

fn burger_bucket() -> Vec<FoodRecord> {
    vec![record(
        "Chicken Masala Whopper burger (Burger king)",
        "Chicken Masala Whopper",
        "burger-masala-123",
        "1 burger",
        296.0,
        (691.0, 28.0, 62.0, 37.0),
    )]
}
