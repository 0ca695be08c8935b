// record.rs — Raw CSV rows and their normalized recipe form.
//
// Recipe datasets disagree on column names, so each logical field resolves
// through an ordered alias list. The table is data, not branching code:
// adding an alias is a one-line change.

use std::collections::HashMap;

use crate::corpus::literal::try_parse_list;
use crate::corpus::text_prep::prepare_recipe_text;

/// Logical recipe fields read from a raw row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Title,
    Ingredients,
    Instructions,
    Cuisine,
}

/// Column aliases per field, first present non-empty value wins.
pub const FIELD_ALIASES: &[(Field, &[&str])] = &[
    (Field::Title, &["recipe_name", "Name", "title", "Title"]),
    (Field::Ingredients, &["ingredients", "Ingredients", "ingredient"]),
    (Field::Instructions, &["directions", "Directions", "instructions", "Instructions"]),
    (Field::Cuisine, &["cuisine_path", "cuisine", "Cuisine", "source"]),
];

/// One row of the source dataset, keyed by column name.
#[derive(Debug, Clone, Default)]
pub struct RawRecord {
    fields: HashMap<String, String>,
}

impl RawRecord {
    pub fn from_pairs<K, V, I>(pairs: I) -> Self
    where
        K: Into<String>,
        V: Into<String>,
        I: IntoIterator<Item = (K, V)>,
    {
        Self {
            fields: pairs.into_iter().map(|(k, v)| (k.into(), v.into())).collect(),
        }
    }

    pub fn from_csv(headers: &csv::StringRecord, row: &csv::StringRecord) -> Self {
        Self::from_pairs(headers.iter().zip(row.iter()))
    }

    pub fn get(&self, column: &str) -> Option<&str> {
        self.fields.get(column).map(String::as_str)
    }

    /// Resolve a logical field through its alias list.
    pub fn resolve(&self, field: Field) -> Option<&str> {
        aliases_for(field)
            .iter()
            .filter_map(|col| self.get(col))
            .find(|v| !v.trim().is_empty())
    }
}

fn aliases_for(field: Field) -> &'static [&'static str] {
    FIELD_ALIASES
        .iter()
        .find(|(f, _)| *f == field)
        .map(|(_, aliases)| *aliases)
        .unwrap_or(&[])
}

/// Canonical recipe used for pairing and as training text.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedRecipe {
    pub title: String,
    pub ingredients: String,
    pub instructions: String,
    pub cuisine: String,
    pub descriptive_text: String,
    pub ingredients_lower: String,
    pub title_lower: String,
}

/// Normalize a raw row. Pure; never fails.
pub fn normalize(raw: &RawRecord) -> NormalizedRecipe {
    let title = raw.resolve(Field::Title).unwrap_or_default().to_string();
    let ingredients = flatten_list_field(raw.resolve(Field::Ingredients).unwrap_or_default(), ", ");
    let instructions = flatten_list_field(raw.resolve(Field::Instructions).unwrap_or_default(), " ");
    let cuisine = raw.resolve(Field::Cuisine).unwrap_or_default().to_string();

    let descriptive_text = prepare_recipe_text(&title, &ingredients, &instructions);

    NormalizedRecipe {
        ingredients_lower: ingredients.to_lowercase(),
        title_lower: title.to_lowercase(),
        title,
        ingredients,
        instructions,
        cuisine,
        descriptive_text,
    }
}

/// Join a list literal with `sep`, or keep the raw text when it is not one.
///
/// Parse errors are intentionally swallowed: many rows carry free text in
/// these columns and the raw string is the correct training text for them.
fn flatten_list_field(raw: &str, sep: &str) -> String {
    match try_parse_list(raw) {
        Ok(items) => items.join(sep),
        Err(_) => raw.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(pairs: &[(&str, &str)]) -> RawRecord {
        RawRecord::from_pairs(pairs.iter().copied())
    }

    #[test]
    fn resolves_aliases_in_order() {
        let r = raw(&[("title", "second"), ("recipe_name", "first")]);
        assert_eq!(r.resolve(Field::Title), Some("first"));

        let r = raw(&[("Title", "only")]);
        assert_eq!(r.resolve(Field::Title), Some("only"));
    }

    #[test]
    fn empty_values_fall_through_to_next_alias() {
        let r = raw(&[("cuisine_path", "  "), ("source", "Gathered")]);
        assert_eq!(r.resolve(Field::Cuisine), Some("Gathered"));
    }

    #[test]
    fn missing_fields_default_to_empty() {
        let n = normalize(&RawRecord::default());
        assert_eq!(n.title, "");
        assert_eq!(n.ingredients, "");
        assert_eq!(n.cuisine, "");
        assert_eq!(n.descriptive_text, "Ingredients: \nInstructions:");
    }

    #[test]
    fn list_literals_are_flattened() {
        let r = raw(&[
            ("title", "Soup"),
            ("ingredients", "['2 Carrots', 'Salt']"),
            ("directions", "[\"Chop.\", \"Boil.\"]"),
        ]);
        let n = normalize(&r);
        assert_eq!(n.ingredients, "2 Carrots, Salt");
        assert_eq!(n.instructions, "Chop. Boil.");
        assert_eq!(n.ingredients_lower, "2 carrots, salt");
        assert_eq!(n.title_lower, "soup");
        assert_eq!(n.descriptive_text, "Soup\nIngredients: 2 Carrots, Salt\nInstructions: Chop. Boil.");
    }

    #[test]
    fn unparseable_list_text_is_kept_verbatim() {
        for text in ["['unterminated", "[['nested']]", "flour; sugar", "[1 2]"] {
            let r = raw(&[("ingredients", text), ("instructions", text)]);
            let n = normalize(&r);
            assert_eq!(n.ingredients, text);
            assert_eq!(n.instructions, text);
        }
    }

    #[test]
    fn unquoted_words_keep_the_brackets() {
        let r = raw(&[("ingredients", "[flour, sugar]"), ("directions", "[c(1), x]")]);
        let n = normalize(&r);
        assert_eq!(n.ingredients, "[flour, sugar]");
        assert_eq!(n.ingredients_lower, "[flour, sugar]");
        assert_eq!(n.instructions, "[c(1), x]");
    }
}
