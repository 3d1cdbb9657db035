//! Query normalization: diacritic stripping, typo and alias correction,
//! singularization, variant expansion, and fuzzy distance.
//!
//! Everything in this module is a pure function over strings — no I/O,
//! no shared state — so it is safe to call from any stage or task.

use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

/// Common misspellings of food words, applied token-by-token.
const TYPO_TABLE: &[(&str, &str)] = &[
    ("chikcen", "chicken"),
    ("chiken", "chicken"),
    ("chicen", "chicken"),
    ("chckn", "chicken"),
    ("brocolli", "broccoli"),
    ("broccolli", "broccoli"),
    ("brocoli", "broccoli"),
    ("bannana", "banana"),
    ("banna", "banana"),
    ("tomatoe", "tomato"),
    ("potatoe", "potato"),
    ("avacado", "avocado"),
    ("avocodo", "avocado"),
    ("yoghurt", "yogurt"),
    ("yogart", "yogurt"),
    ("sandwhich", "sandwich"),
    ("sandwitch", "sandwich"),
    ("spagetti", "spaghetti"),
    ("spagheti", "spaghetti"),
    ("cofee", "coffee"),
    ("coffe", "coffee"),
    ("omlette", "omelette"),
    ("omlet", "omelet"),
    ("ceasar", "caesar"),
    ("quinao", "quinoa"),
    ("salmom", "salmon"),
    ("letuce", "lettuce"),
    ("zuchini", "zucchini"),
    ("zucchinni", "zucchini"),
    ("mozarella", "mozzarella"),
    ("mozzarela", "mozzarella"),
    ("parmesean", "parmesan"),
    ("humus", "hummus"),
    ("expresso", "espresso"),
];

/// Cross-language aliases mapped to their common English search term,
/// applied token-by-token like typos.
const ALIAS_TABLE: &[(&str, &str)] = &[
    ("poulet", "chicken"),
    ("pollo", "chicken"),
    ("frango", "chicken"),
    ("huhn", "chicken"),
    ("riz", "rice"),
    ("arroz", "rice"),
    ("reis", "rice"),
    ("pomme", "apple"),
    ("manzana", "apple"),
    ("fromage", "cheese"),
    ("queso", "cheese"),
    ("poisson", "fish"),
    ("pescado", "fish"),
    ("boeuf", "beef"),
    ("carne", "beef"),
    ("pain", "bread"),
    ("pan", "bread"),
    ("lait", "milk"),
    ("leche", "milk"),
    ("oeuf", "egg"),
    ("huevo", "egg"),
];

/// Dish synonyms keyed by the whole normalized (or typo-fixed) query.
const DISH_SYNONYMS: &[(&str, &[&str])] = &[
    ("butter chicken", &["murgh makhani", "chicken makhani"]),
    ("murgh makhani", &["butter chicken"]),
    ("chickpeas", &["garbanzo beans", "chana"]),
    ("garbanzo beans", &["chickpeas"]),
    ("eggplant", &["aubergine", "brinjal"]),
    ("aubergine", &["eggplant"]),
    ("cilantro", &["coriander"]),
    ("coriander", &["cilantro"]),
    ("gyro", &["doner kebab", "shawarma"]),
    ("doner kebab", &["gyro", "shawarma"]),
    ("prawns", &["shrimp"]),
    ("shrimp", &["prawns"]),
    ("courgette", &["zucchini"]),
    ("zucchini", &["courgette"]),
    ("pad thai", &["phat thai", "thai stir fried noodles"]),
    ("spring roll", &["egg roll"]),
    ("corn", &["maize"]),
    ("rocket", &["arugula"]),
    ("arugula", &["rocket"]),
];

/// Irregular plural forms checked before the suffix rules.
const IRREGULAR_PLURALS: &[(&str, &str)] = &[
    ("berries", "berry"),
    ("strawberries", "strawberry"),
    ("blueberries", "blueberry"),
    ("raspberries", "raspberry"),
    ("cherries", "cherry"),
    ("potatoes", "potato"),
    ("tomatoes", "tomato"),
    ("mangoes", "mango"),
    ("leaves", "leaf"),
    ("loaves", "loaf"),
    ("halves", "half"),
    ("fish", "fish"),
    ("shrimp", "shrimp"),
    ("rice", "rice"),
    ("oats", "oats"),
    ("grits", "grits"),
];

/// Normalize a raw query string into its canonical form.
///
/// Lowercases, strips diacritics (NFD decomposition followed by
/// combining-mark removal), removes punctuation except hyphen and
/// apostrophe, collapses whitespace, and trims.
///
/// Idempotent: `normalize_query(normalize_query(s)) == normalize_query(s)`.
pub fn normalize_query(raw: &str) -> String {
    let stripped: String = raw
        .to_lowercase()
        .nfd()
        .filter(|c| !is_combining_mark(*c))
        .map(|c| {
            if c.is_alphanumeric() || c == '-' || c == '\'' {
                c
            } else {
                ' '
            }
        })
        .collect();

    stripped.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Split a normalized string into tokens on whitespace and hyphens,
/// dropping empties.
pub fn tokenize(s: &str) -> Vec<String> {
    s.split(|c: char| c.is_whitespace() || c == '-')
        .filter(|t| !t.is_empty())
        .map(|t| t.to_string())
        .collect()
}

/// Reduce a word to its singular form.
///
/// Irregular lookup first, then suffix rules: `-ies` → `-y`;
/// `-shes`/`-ches`/`-xes`/`-sses`/`-zes` → drop `es`; trailing `-s`
/// (but not `-ss`) dropped. Case-insensitive; always returns lowercase.
pub fn singularize(word: &str) -> String {
    let lower = word.to_lowercase();

    for (plural, singular) in IRREGULAR_PLURALS {
        if lower == *plural {
            return (*singular).to_string();
        }
    }

    if let Some(stem) = lower.strip_suffix("ies") {
        if !stem.is_empty() {
            return format!("{stem}y");
        }
    }
    for suffix in ["shes", "ches", "xes", "sses", "zes"] {
        if let Some(stem) = lower.strip_suffix("es") {
            if lower.ends_with(suffix) {
                return stem.to_string();
            }
        }
    }
    if lower.ends_with('s') && !lower.ends_with("ss") && lower.len() > 1 {
        return lower[..lower.len() - 1].to_string();
    }

    lower
}

/// Replace known typos and cross-language aliases token-by-token.
///
/// The input is normalized first, so callers can pass raw user text.
/// Tokens are rejoined with single spaces.
pub fn fix_common_typos(query: &str) -> String {
    let normalized = normalize_query(query);
    tokenize(&normalized)
        .iter()
        .map(|token| fix_token(token))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Typo-table then alias-table lookup for a single token.
fn fix_token(token: &str) -> String {
    for (typo, fixed) in TYPO_TABLE {
        if token == *typo {
            return (*fixed).to_string();
        }
    }
    for (alias, english) in ALIAS_TABLE {
        if token == *alias {
            return (*english).to_string();
        }
    }
    token.to_string()
}

/// Expand a query into an ordered, de-duplicated set of search variants.
///
/// Always includes the normalized form and the typo-fixed form; adds the
/// all-tokens-singularized form, per-token typo/alias substitutions, and
/// any dish synonyms keyed by the whole normalized or typo-fixed string.
/// Only non-empty strings are returned; the normalized form comes first.
pub fn query_variants(query: &str) -> Vec<String> {
    let normalized = normalize_query(query);
    let typo_fixed = fix_common_typos(query);

    let mut variants: Vec<String> = Vec::new();
    let mut push = |s: String| {
        if !s.is_empty() && !variants_contains(&variants, &s) {
            variants.push(s);
        }
    };

    push(normalized.clone());
    push(typo_fixed.clone());

    let tokens = tokenize(&typo_fixed);
    if !tokens.is_empty() {
        let singularized = tokens
            .iter()
            .map(|t| singularize(t))
            .collect::<Vec<_>>()
            .join(" ");
        push(singularized);
    }

    // Per-token substitutions: swap each individually-matching token in
    // place, leaving the rest of the query untouched.
    let normalized_tokens = tokenize(&normalized);
    for (i, token) in normalized_tokens.iter().enumerate() {
        let fixed = fix_token(token);
        if fixed != *token {
            let mut swapped = normalized_tokens.clone();
            swapped[i] = fixed;
            push(swapped.join(" "));
        }
    }

    for key in [normalized.as_str(), typo_fixed.as_str()] {
        for (dish, synonyms) in DISH_SYNONYMS {
            if key == *dish {
                for synonym in *synonyms {
                    push((*synonym).to_string());
                }
            }
        }
    }

    variants
}

fn variants_contains(variants: &[String], candidate: &str) -> bool {
    variants.iter().any(|v| v == candidate)
}

/// Classic Levenshtein edit distance via dynamic programming over a
/// `(|b|+1) x (|a|+1)` table.
pub fn levenshtein(a: &str, b: &str) -> usize {
    let a_chars: Vec<char> = a.chars().collect();
    let b_chars: Vec<char> = b.chars().collect();

    let mut table: Vec<Vec<usize>> = vec![vec![0; a_chars.len() + 1]; b_chars.len() + 1];
    for (j, row) in table.iter_mut().enumerate() {
        row[0] = j;
    }
    for i in 0..=a_chars.len() {
        table[0][i] = i;
    }

    for j in 1..=b_chars.len() {
        for i in 1..=a_chars.len() {
            let cost = usize::from(a_chars[i - 1] != b_chars[j - 1]);
            table[j][i] = (table[j - 1][i] + 1)
                .min(table[j][i - 1] + 1)
                .min(table[j - 1][i - 1] + cost);
        }
    }

    table[b_chars.len()][a_chars.len()]
}

/// True when the normalized forms of `query` and `target` are within
/// `max_distance` edits of each other.
pub fn is_fuzzy_match(query: &str, target: &str, max_distance: usize) -> bool {
    levenshtein(&normalize_query(query), &normalize_query(target)) <= max_distance
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_lowercases_and_trims() {
        assert_eq!(normalize_query("  Chicken  Breast  "), "chicken breast");
    }

    #[test]
    fn normalize_strips_diacritics() {
        assert_eq!(normalize_query("café crème"), "cafe creme");
        assert_eq!(normalize_query("jalapeño"), "jalapeno");
    }

    #[test]
    fn normalize_output_has_no_combining_marks() {
        let out = normalize_query("crème brûlée açaí");
        assert!(out.chars().all(|c| !('\u{0300}'..='\u{036f}').contains(&c)));
        assert!(out.chars().all(|c| !is_combining_mark(c)));
    }

    #[test]
    fn normalize_keeps_hyphen_and_apostrophe() {
        assert_eq!(normalize_query("stir-fry"), "stir-fry");
        assert_eq!(normalize_query("shepherd's pie!"), "shepherd's pie");
    }

    #[test]
    fn normalize_removes_other_punctuation() {
        assert_eq!(normalize_query("rice, (cooked)"), "rice cooked");
    }

    #[test]
    fn normalize_is_idempotent() {
        for input in ["  Crème Brûlée!! ", "stir-fry", "a  b   c", "Pâté & toast"] {
            let once = normalize_query(input);
            assert_eq!(normalize_query(&once), once, "not idempotent for {input:?}");
        }
    }

    #[test]
    fn tokenize_splits_on_whitespace_and_hyphen() {
        assert_eq!(tokenize("stir-fry with rice"), vec!["stir", "fry", "with", "rice"]);
    }

    #[test]
    fn tokenize_drops_empty_tokens() {
        assert_eq!(tokenize("a --  b"), vec!["a", "b"]);
        assert!(tokenize("").is_empty());
    }

    #[test]
    fn singularize_irregulars_first() {
        assert_eq!(singularize("berries"), "berry");
        assert_eq!(singularize("potatoes"), "potato");
        assert_eq!(singularize("fish"), "fish");
        assert_eq!(singularize("Leaves"), "leaf");
    }

    #[test]
    fn singularize_suffix_rules() {
        assert_eq!(singularize("fries"), "fry");
        assert_eq!(singularize("dishes"), "dish");
        assert_eq!(singularize("peaches"), "peach");
        assert_eq!(singularize("boxes"), "box");
        assert_eq!(singularize("eggs"), "egg");
    }

    #[test]
    fn singularize_leaves_double_s_alone() {
        assert_eq!(singularize("swiss"), "swiss");
        assert_eq!(singularize("bass"), "bass");
    }

    #[test]
    fn fix_typos_multi_token_case_insensitive() {
        assert_eq!(fix_common_typos("Chikcen Tikka"), "chicken tikka");
    }

    #[test]
    fn fix_typos_applies_aliases() {
        assert_eq!(fix_common_typos("poulet roti"), "chicken roti");
        assert_eq!(fix_common_typos("arroz con pollo"), "rice con chicken");
    }

    #[test]
    fn fix_typos_passes_clean_queries_through() {
        assert_eq!(fix_common_typos("chicken biryani"), "chicken biryani");
    }

    #[test]
    fn variants_include_normalized_and_typo_fixed() {
        let variants = query_variants("Chikcen Biryani");
        assert!(variants.contains(&"chikcen biryani".to_string()));
        assert!(variants.contains(&"chicken biryani".to_string()));
    }

    #[test]
    fn variants_include_dish_synonyms() {
        let variants = query_variants("butter chicken");
        assert!(variants.contains(&"butter chicken".to_string()));
        assert!(
            variants.contains(&"murgh makhani".to_string())
                || variants.contains(&"chicken makhani".to_string())
        );
    }

    #[test]
    fn variants_include_singularized_form() {
        let variants = query_variants("scrambled eggs");
        assert!(variants.contains(&"scrambled egg".to_string()));
    }

    #[test]
    fn variants_are_deduplicated_and_non_empty() {
        let variants = query_variants("chicken");
        let mut seen = std::collections::HashSet::new();
        for v in &variants {
            assert!(!v.is_empty());
            assert!(seen.insert(v.clone()), "duplicate variant {v:?}");
        }
    }

    #[test]
    fn variants_normalized_form_comes_first() {
        let variants = query_variants("Chikcen Biryani");
        assert_eq!(variants[0], "chikcen biryani");
    }

    #[test]
    fn levenshtein_basic_cases() {
        assert_eq!(levenshtein("", ""), 0);
        assert_eq!(levenshtein("abc", ""), 3);
        assert_eq!(levenshtein("", "abc"), 3);
        assert_eq!(levenshtein("chicken", "chicken"), 0);
        assert_eq!(levenshtein("kitten", "sitting"), 3);
        assert_eq!(levenshtein("chikcen", "chicken"), 2);
    }

    #[test]
    fn fuzzy_match_within_distance() {
        assert!(is_fuzzy_match("chikcen", "Chicken", 2));
        assert!(!is_fuzzy_match("chikcen", "broccoli", 2));
    }

    #[test]
    fn fuzzy_match_normalizes_before_comparing() {
        assert!(is_fuzzy_match("CRÈME", "creme", 0));
    }
}
