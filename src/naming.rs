//! Table name derivation
//!
//! Turns a Rust type name into a plural, lower snake_case table name:
//! `Person` → `people`, `OrderLine` → `order_lines`.

use std::sync::LazyLock;

use regex::Regex;

static FIRST_CAP: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(.)([A-Z][a-z]+)").expect("valid regex"));
static ALL_CAP: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"([a-z0-9])([A-Z])").expect("valid regex"));

const IRREGULAR: &[(&str, &str)] = &[
    ("person", "people"),
    ("child", "children"),
    ("man", "men"),
    ("woman", "women"),
    ("mouse", "mice"),
    ("goose", "geese"),
    ("foot", "feet"),
    ("tooth", "teeth"),
    ("ox", "oxen"),
    ("datum", "data"),
    ("medium", "media"),
    ("index", "indices"),
    ("criterion", "criteria"),
];

const UNCOUNTABLE: &[&str] = &[
    "data",
    "info",
    "information",
    "metadata",
    "equipment",
    "series",
    "species",
    "news",
    "sheep",
    "fish",
    "deer",
    "money",
    "rice",
];

const F_TO_VES: &[&str] = &[
    "leaf", "life", "knife", "wife", "half", "shelf", "wolf", "calf", "thief", "loaf",
];

/// Derive the table name for a type name
///
/// Any module qualifier and generic arguments are dropped first.
///
/// ```
/// use tableio::naming::table_name;
///
/// assert_eq!(table_name("Shape"), "shapes");
/// assert_eq!(table_name("crate::models::Person"), "people");
/// assert_eq!(table_name("OrderLine"), "order_lines");
/// ```
pub fn table_name(type_name: &str) -> String {
    let bare = type_name.split('<').next().unwrap_or(type_name);
    let bare = bare
        .rsplit(|c| c == ':' || c == '.')
        .next()
        .unwrap_or(bare)
        .trim();

    let snake = to_snake_case(bare);
    match snake.rsplit_once('_') {
        Some((head, last)) => format!("{}_{}", head, pluralize(last)),
        None => pluralize(&snake),
    }
}

/// Convert CamelCase to snake_case
///
/// ```
/// use tableio::naming::to_snake_case;
///
/// assert_eq!(to_snake_case("HTTPRequest"), "http_request");
/// assert_eq!(to_snake_case("userID"), "user_id");
/// ```
pub fn to_snake_case(s: &str) -> String {
    let snake = FIRST_CAP.replace_all(s, "${1}_${2}");
    let snake = ALL_CAP.replace_all(&snake, "${1}_${2}");
    snake.to_lowercase().replace("__", "_")
}

/// Pluralize a single lowercase English word (best effort)
pub fn pluralize(word: &str) -> String {
    if word.is_empty() {
        return String::new();
    }

    let lower = word.to_lowercase();

    if UNCOUNTABLE.contains(&lower.as_str()) {
        return lower;
    }
    if let Some((_, plural)) = IRREGULAR.iter().find(|(singular, _)| *singular == lower) {
        return plural.to_string();
    }
    if IRREGULAR.iter().any(|(_, plural)| *plural == lower) {
        return lower;
    }

    if lower.ends_with("is") && lower.len() > 3 {
        return format!("{}es", &lower[..lower.len() - 2]);
    }
    if lower.ends_with("ss")
        || lower.ends_with("us")
        || lower.ends_with('x')
        || lower.ends_with('z')
        || lower.ends_with("ch")
        || lower.ends_with("sh")
    {
        return format!("{}es", lower);
    }
    // Already plural
    if lower.ends_with('s') {
        return lower;
    }
    if F_TO_VES.contains(&lower.as_str()) {
        let stem = lower
            .strip_suffix("fe")
            .or_else(|| lower.strip_suffix('f'))
            .unwrap_or(&lower);
        return format!("{}ves", stem);
    }
    if let Some(stem) = lower.strip_suffix('y') {
        if !stem.ends_with(['a', 'e', 'i', 'o', 'u']) && !stem.is_empty() {
            return format!("{}ies", stem);
        }
    }

    format!("{}s", lower)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_regular_nouns() {
        assert_eq!(table_name("Shape"), "shapes");
        assert_eq!(table_name("Hello"), "hellos");
        assert_eq!(table_name("Product"), "products");
    }

    #[test]
    fn test_qualified_names() {
        assert_eq!(table_name("main.Shape"), "shapes");
        assert_eq!(table_name("app::models::Shape"), "shapes");
        assert_eq!(table_name("Wrapper<Inner>"), "wrappers");
    }

    #[test]
    fn test_compound_names_pluralize_last_word() {
        assert_eq!(table_name("OrderLine"), "order_lines");
        assert_eq!(table_name("SalesPerson"), "sales_people");
        assert_eq!(table_name("UserCategory"), "user_categories");
    }

    #[test]
    fn test_sibilant_endings() {
        assert_eq!(pluralize("class"), "classes");
        assert_eq!(pluralize("box"), "boxes");
        assert_eq!(pluralize("match"), "matches");
        assert_eq!(pluralize("status"), "statuses");
        assert_eq!(pluralize("analysis"), "analyses");
    }

    #[test]
    fn test_y_endings() {
        assert_eq!(pluralize("city"), "cities");
        assert_eq!(pluralize("day"), "days");
        assert_eq!(pluralize("key"), "keys");
    }

    #[test]
    fn test_irregular_and_uncountable() {
        assert_eq!(pluralize("person"), "people");
        assert_eq!(pluralize("child"), "children");
        assert_eq!(pluralize("people"), "people");
        assert_eq!(pluralize("data"), "data");
        assert_eq!(pluralize("metadata"), "metadata");
        assert_eq!(pluralize("leaf"), "leaves");
        assert_eq!(pluralize("knife"), "knives");
    }

    #[test]
    fn test_already_plural_and_acronyms() {
        assert_eq!(table_name("Users"), "users");
        assert_eq!(table_name("HTTPRequest"), "http_requests");
        assert_eq!(table_name("URL"), "urls");
        assert_eq!(table_name("ID"), "ids");
    }

    #[test]
    fn test_deterministic() {
        for name in ["Person", "OrderLine", "HTTPRequest", "Status", ""] {
            assert_eq!(table_name(name), table_name(name));
        }
        assert_eq!(table_name(""), "");
    }

    #[test]
    fn test_snake_case() {
        assert_eq!(to_snake_case("FullName"), "full_name");
        assert_eq!(to_snake_case("already_snake"), "already_snake");
        assert_eq!(to_snake_case("A"), "a");
    }
}
