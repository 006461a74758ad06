//! Text normalization ahead of rule matching

/// Token-level synonyms for code-mixed (Hinglish) phrasing, number words and
/// spelling variants. A replacement may expand to several words.
///
/// Extend this table rather than the rules when a new phrasing shows up.
const SYNONYMS: &[(&str, &str)] = &[
    // quantity questions
    ("kitne", "how many"),
    ("kitna", "how many"),
    ("kitni", "how many"),
    ("kitney", "how many"),
    ("kul", "total"),
    // measures
    ("bikri", "sales"),
    ("kamai", "revenue"),
    ("aamdani", "revenue"),
    // time
    ("mahina", "monthly"),
    ("mahine", "monthly"),
    ("mahinewar", "monthly"),
    ("saal", "yearly"),
    ("saalana", "yearly"),
    ("rozana", "daily"),
    ("hafta", "weekly"),
    // ranking
    ("sabse", "most"),
    ("zyada", "most"),
    ("jyada", "most"),
    // entities
    ("grahak", "customers"),
    ("vikreta", "sellers"),
    ("samaan", "products"),
    ("saaman", "products"),
    ("shreni", "category"),
    ("samiksha", "reviews"),
    ("bhugtan", "payment"),
    ("rajya", "state"),
    ("shehar", "city"),
    // number words
    ("one", "1"),
    ("ek", "1"),
    ("two", "2"),
    ("three", "3"),
    ("teen", "3"),
    ("four", "4"),
    ("five", "5"),
    ("paanch", "5"),
    ("six", "6"),
    ("seven", "7"),
    ("eight", "8"),
    ("nine", "9"),
    ("ten", "10"),
    ("das", "10"),
    ("fifteen", "15"),
    ("twenty", "20"),
    ("bees", "20"),
    ("fifty", "50"),
    // spelling
    ("cancelled", "canceled"),
    ("cancellations", "canceled"),
];

fn synonym(token: &str) -> Option<&'static str> {
    SYNONYMS
        .iter()
        .find(|(word, _)| *word == token)
        .map(|(_, replacement)| *replacement)
}

/// Lowercase, drop apostrophes, turn every other punctuation character into
/// a space, map synonyms and collapse whitespace.
///
/// The output is a single-space separated token string; `normalize` is
/// idempotent.
pub fn normalize(raw: &str) -> String {
    let cleaned: String = raw
        .chars()
        .filter(|c| *c != '\'' && *c != '’')
        .map(|c| {
            if c.is_alphanumeric() {
                c.to_lowercase().next().unwrap_or(c)
            } else {
                ' '
            }
        })
        .collect();

    let mut out = String::with_capacity(cleaned.len());
    for token in cleaned.split_whitespace() {
        if !out.is_empty() {
            out.push(' ');
        }
        out.push_str(synonym(token).unwrap_or(token));
    }
    out
}
