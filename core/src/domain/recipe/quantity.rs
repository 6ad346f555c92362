//! Best-effort reading of ingredient amounts.
//!
//! "200g flour", "1 1/2 cups milk" and "2-3 cloves garlic" are split into
//! quantity, unit and name. Anything else ("a pinch of salt", "salt to taste")
//! keeps the full text as the name with no quantity or unit.

use std::sync::LazyLock;

use regex::Regex;

use crate::domain::recipe::entities::{Ingredient, Quantity};

/// Digit groups ("1,000", "1.000") come before plain decimals so they are
/// read whole.
const AMOUNT: &str = r"\d+\s*[½¼¾⅓⅔⅛⅜⅝⅞]|\d+\s+\d+/\d+|\d+/\d+|\d{1,3}(?:,\d{3})+(?:\.\d+)?|[1-9]\d{0,2}(?:\.\d{3})+(?:,\d+)?|\d+(?:\.\d+|,\d{1,2})?|[½¼¾⅓⅔⅛⅜⅝⅞]";

static COMMA_GROUPS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d{1,3}(?:,\d{3})+(?:\.\d+)?$").expect("static regex"));

/// "1.000" is a thousand in some locales and one in others.
static DOT_GROUPS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[1-9]\d{0,2}(?:\.\d{3})+(?:,\d+)?$").expect("static regex"));

static LEADING_AMOUNT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(
        r"^(?P<amount>{AMOUNT})(?:\s*(?:-|–|to)\s*(?P<upper>{AMOUNT}))?(?P<rest>.*)$"
    ))
    .expect("static regex")
});

/// Sorted longest first so "tablespoons" wins over "tb".
static UNITS_SORTED: LazyLock<Vec<&'static str>> = LazyLock::new(|| {
    let mut units = UNITS_RAW.to_vec();
    units.sort_by(|a, b| b.len().cmp(&a.len()));
    units
});

const UNITS_RAW: &[&str] = &[
    // volume
    "fluid ounces",
    "fluid ounce",
    "tablespoons",
    "tablespoon",
    "teaspoons",
    "teaspoon",
    "quarts",
    "quart",
    "pints",
    "pint",
    "cups",
    "cup",
    "tbsp",
    "tsp",
    "fl oz",
    "qt",
    "pt",
    "c",
    "milliliters",
    "milliliter",
    "millilitres",
    "millilitre",
    "liters",
    "liter",
    "litres",
    "litre",
    "ml",
    "dl",
    "cl",
    "l",
    // weight
    "ounces",
    "ounce",
    "pounds",
    "pound",
    "lbs",
    "lb",
    "oz",
    "kilograms",
    "kilogram",
    "grams",
    "gram",
    "kg",
    "mg",
    "g",
    // count
    "packages",
    "package",
    "handfuls",
    "handful",
    "bunches",
    "bunch",
    "pinches",
    "pinch",
    "slices",
    "slice",
    "sprigs",
    "sprig",
    "stalks",
    "stalk",
    "pieces",
    "piece",
    "cloves",
    "clove",
    "dashes",
    "dash",
    "cans",
    "can",
    "jars",
    "jar",
    "sticks",
    "stick",
    "heads",
    "head",
];

/// Split an ingredient line into quantity, unit and name.
pub fn parse_ingredient(text: &str) -> Ingredient {
    let text = text.trim();
    match split_quantity(text) {
        Some((quantity, unit, name)) => Ingredient {
            text: text.to_string(),
            quantity: Some(quantity),
            unit,
            name,
        },
        None => {
            tracing::debug!(ingredient = %text, "no numeric quantity, keeping ingredient text as name");
            Ingredient::unparsed(text)
        }
    }
}

fn split_quantity(text: &str) -> Option<(Quantity, Option<String>, String)> {
    let caps = LEADING_AMOUNT.captures(text)?;
    let value = parse_amount(caps.name("amount")?.as_str())?;
    let upper = match caps.name("upper") {
        Some(m) => Some(parse_amount(m.as_str())?),
        None => None,
    };
    let rest = caps.name("rest").map_or("", |m| m.as_str());

    // "12oz" is fine, "12abc" is not an amount followed by a name
    if rest.chars().next().is_some_and(char::is_alphanumeric) && !starts_with_unit(rest) {
        return None;
    }

    let (unit, name) = split_unit(rest.trim_start());
    let name = strip_of(name).trim().trim_start_matches(',').trim();
    if name.is_empty() {
        return None;
    }

    Some((Quantity { value, upper }, unit, name.to_string()))
}

fn split_unit(rest: &str) -> (Option<String>, &str) {
    for unit in UNITS_SORTED.iter() {
        let Some(prefix) = rest.get(..unit.len()) else {
            continue;
        };
        if !prefix.eq_ignore_ascii_case(unit) {
            continue;
        }
        let after = &rest[unit.len()..];
        match after.chars().next() {
            None => return (Some(prefix.to_string()), ""),
            Some('.') => return (Some(prefix.to_string()), &after[1..]),
            Some(c) if c.is_whitespace() || c == ',' || c == ')' => {
                return (Some(prefix.to_string()), after);
            }
            _ => {}
        }
    }
    (None, rest)
}

fn starts_with_unit(rest: &str) -> bool {
    split_unit(rest).0.is_some()
}

fn strip_of(name: &str) -> &str {
    let trimmed = name.trim_start();
    match trimmed.get(..3) {
        Some(prefix) if prefix.eq_ignore_ascii_case("of ") => &trimmed[3..],
        _ => trimmed,
    }
}

/// Parse "2", "1.5", "1,5", "1,000", "1/2", "1 1/2", "½" or "1½".
/// Dot-grouped amounts like "1.000" are ambiguous and yield `None`.
pub fn parse_amount(raw: &str) -> Option<f64> {
    let raw = raw.trim();
    let last = raw.chars().last()?;
    if let Some(fraction) = unicode_fraction(last) {
        let whole = raw[..raw.len() - last.len_utf8()].trim();
        let whole: f64 = if whole.is_empty() { 0.0 } else { whole.parse().ok()? };
        return Some(whole + fraction);
    }

    if let Some((whole, fraction)) = raw.split_once(char::is_whitespace) {
        return Some(whole.parse::<f64>().ok()? + parse_fraction(fraction.trim())?);
    }

    if raw.contains('/') {
        return parse_fraction(raw);
    }

    if COMMA_GROUPS.is_match(raw) {
        return raw.replace(',', "").parse().ok();
    }
    if DOT_GROUPS.is_match(raw) {
        return None;
    }

    raw.replace(',', ".").parse().ok()
}

fn parse_fraction(raw: &str) -> Option<f64> {
    let (num, den) = raw.split_once('/')?;
    let num: f64 = num.trim().parse().ok()?;
    let den: f64 = den.trim().parse().ok()?;
    if den == 0.0 { None } else { Some(num / den) }
}

fn unicode_fraction(c: char) -> Option<f64> {
    Some(match c {
        '½' => 0.5,
        '¼' => 0.25,
        '¾' => 0.75,
        '⅓' => 1.0 / 3.0,
        '⅔' => 2.0 / 3.0,
        '⅛' => 0.125,
        '⅜' => 0.375,
        '⅝' => 0.625,
        '⅞' => 0.875,
        _ => return None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_attached_metric_unit() {
        let ingredient = parse_ingredient("200g flour");
        assert_eq!(ingredient.quantity, Some(Quantity { value: 200.0, upper: None }));
        assert_eq!(ingredient.unit.as_deref(), Some("g"));
        assert_eq!(ingredient.name, "flour");
        assert_eq!(ingredient.text, "200g flour");
    }

    #[test]
    fn test_fraction_and_of() {
        let ingredient = parse_ingredient("1/2 cup of sugar");
        assert_eq!(ingredient.quantity.map(|q| q.value), Some(0.5));
        assert_eq!(ingredient.unit.as_deref(), Some("cup"));
        assert_eq!(ingredient.name, "sugar");
    }

    #[test]
    fn test_mixed_number() {
        let ingredient = parse_ingredient("1 1/2 Tablespoons olive oil");
        assert_eq!(ingredient.quantity.map(|q| q.value), Some(1.5));
        assert_eq!(ingredient.unit.as_deref(), Some("Tablespoons"));
        assert_eq!(ingredient.name, "olive oil");
    }

    #[test]
    fn test_range() {
        let ingredient = parse_ingredient("2-3 cloves garlic, minced");
        assert_eq!(
            ingredient.quantity,
            Some(Quantity { value: 2.0, upper: Some(3.0) })
        );
        assert_eq!(ingredient.unit.as_deref(), Some("cloves"));
        assert_eq!(ingredient.name, "garlic, minced");
    }

    #[test]
    fn test_count_without_unit() {
        let ingredient = parse_ingredient("3 large eggs");
        assert_eq!(ingredient.quantity.map(|q| q.value), Some(3.0));
        assert_eq!(ingredient.unit, None);
        assert_eq!(ingredient.name, "large eggs");
    }

    #[test]
    fn test_abbreviated_unit_with_period() {
        let ingredient = parse_ingredient("2 tsp. baking powder");
        assert_eq!(ingredient.unit.as_deref(), Some("tsp"));
        assert_eq!(ingredient.name, "baking powder");
    }

    #[test]
    fn test_unicode_fraction() {
        let ingredient = parse_ingredient("½ lemon");
        assert_eq!(ingredient.quantity.map(|q| q.value), Some(0.5));
        assert_eq!(ingredient.name, "lemon");
    }

    #[test]
    fn test_non_numeric_keeps_full_text() {
        let ingredient = parse_ingredient("a pinch of salt");
        assert_eq!(ingredient.name, "a pinch of salt");
        assert_eq!(ingredient.quantity, None);
        assert_eq!(ingredient.unit, None);
    }

    #[test]
    fn test_amount_without_name_degrades() {
        let ingredient = parse_ingredient("3 cups");
        assert_eq!(ingredient.name, "3 cups");
        assert_eq!(ingredient.quantity, None);
    }

    #[test]
    fn test_amount_glued_to_word_degrades() {
        let ingredient = parse_ingredient("7up soda");
        assert_eq!(ingredient.name, "7up soda");
        assert_eq!(ingredient.quantity, None);
    }

    #[test]
    fn test_parse_amount_variants() {
        assert_eq!(parse_amount("2"), Some(2.0));
        assert_eq!(parse_amount("1,5"), Some(1.5));
        assert_eq!(parse_amount("3/4"), Some(0.75));
        assert_eq!(parse_amount("1½"), Some(1.5));
        assert_eq!(parse_amount("1/0"), None);
    }

    #[test]
    fn test_thousands_separator() {
        let ingredient = parse_ingredient("1,000 g flour");
        assert_eq!(ingredient.quantity, Some(Quantity { value: 1000.0, upper: None }));
        assert_eq!(ingredient.unit.as_deref(), Some("g"));
        assert_eq!(ingredient.name, "flour");
    }

    #[test]
    fn test_decimal_comma() {
        let ingredient = parse_ingredient("1,5 l milk");
        assert_eq!(ingredient.quantity.map(|q| q.value), Some(1.5));
        assert_eq!(ingredient.unit.as_deref(), Some("l"));
        assert_eq!(ingredient.name, "milk");
    }

    #[test]
    fn test_dot_grouped_amount_degrades() {
        let ingredient = parse_ingredient("1.000 g flour");
        assert_eq!(ingredient.quantity, None);
        assert_eq!(ingredient.name, "1.000 g flour");
    }

    #[test]
    fn test_parse_amount_digit_groups() {
        assert_eq!(parse_amount("1,000"), Some(1000.0));
        assert_eq!(parse_amount("12,500.5"), Some(12500.5));
        assert_eq!(parse_amount("1,25"), Some(1.25));
        assert_eq!(parse_amount("1.000"), None);
        assert_eq!(parse_amount("0.125"), Some(0.125));
    }
}
