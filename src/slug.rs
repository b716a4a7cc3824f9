//! URL slugs derived from display names.

/// Lowercases `text` and folds accented Latin letters to ASCII. Whitespace,
/// dashes and underscores separate words; any other punctuation is dropped,
/// so `Men's` becomes `mens`. Words are joined with single dashes.
///
/// ```
/// assert_eq!(catalog_admin::slug::slugify("Red Shoes"), "red-shoes");
/// assert_eq!(catalog_admin::slug::slugify("Crème Brûlée"), "creme-brulee");
/// assert_eq!(catalog_admin::slug::slugify("Men's Shoes"), "mens-shoes");
/// ```
pub fn slugify(text: &str) -> String {
    let mut spaced = String::with_capacity(text.len());

    for c in text.chars().flat_map(char::to_lowercase) {
        if c.is_ascii_alphanumeric() {
            spaced.push(c);
        } else if c.is_whitespace() || c == '-' || c == '_' {
            spaced.push(' ');
        } else if c == '@' {
            spaced.push_str(" at ");
        } else if let Some(ascii) = fold(c) {
            spaced.push_str(ascii);
        }
    }

    spaced.split_whitespace().collect::<Vec<_>>().join("-")
}

fn fold(c: char) -> Option<&'static str> {
    let ascii = match c {
        'à' | 'á' | 'â' | 'ã' | 'ä' | 'å' => "a",
        'æ' => "ae",
        'ç' => "c",
        'è' | 'é' | 'ê' | 'ë' => "e",
        'ì' | 'í' | 'î' | 'ï' => "i",
        'ð' => "d",
        'ñ' => "n",
        'ò' | 'ó' | 'ô' | 'õ' | 'ö' | 'ø' => "o",
        'œ' => "oe",
        'ù' | 'ú' | 'û' | 'ü' => "u",
        'ý' | 'ÿ' => "y",
        'þ' => "th",
        'ß' => "ss",
        _ => return None,
    };
    Some(ascii)
}
