use super::HighlightRange;

/// Keywords whose occurrences get highlighted automatically.
///
/// Each keyword is scanned for independently. Generated ranges carry no
/// note.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct KeywordSearch {
    pub keywords: Vec<String>,
}

impl KeywordSearch {
    pub fn new(keyword: impl Into<String>) -> Self {
        Self {
            keywords: vec![keyword.into()],
        }
    }

    pub fn with_keyword(mut self, keyword: impl Into<String>) -> Self {
        self.keywords.push(keyword.into());
        self
    }

    pub fn is_empty(&self) -> bool {
        self.keywords.iter().all(|keyword| keyword.is_empty())
    }

    /// Ranges for every keyword, keyword by keyword, each left to right.
    pub fn ranges(&self, text: &str, color_token: &str) -> Vec<HighlightRange> {
        self.keywords
            .iter()
            .flat_map(|keyword| keyword_ranges(text, keyword, color_token))
            .collect()
    }
}

/// Case-insensitive, non-overlapping, left-to-right occurrences of
/// `keyword` in `text`.
///
/// Characters are compared one by one after lowercasing, so a match always
/// spans exactly as many characters as the keyword and offsets stay aligned
/// with the flattened text.
pub fn keyword_ranges(text: &str, keyword: &str, color_token: &str) -> Vec<HighlightRange> {
    let needle: Vec<char> = keyword.chars().collect();
    if needle.is_empty() {
        return Vec::new();
    }
    let haystack: Vec<char> = text.chars().collect();

    let mut ranges = Vec::new();
    let mut idx = 0;
    while idx + needle.len() <= haystack.len() {
        let window = &haystack[idx..idx + needle.len()];
        if window
            .iter()
            .zip(&needle)
            .all(|(a, b)| chars_match(*a, *b))
        {
            let end = idx + needle.len();
            ranges.push(HighlightRange::new(
                idx as i64,
                end as i64,
                color_token,
                window.iter().collect::<String>(),
            ));
            idx = end;
        } else {
            idx += 1;
        }
    }
    ranges
}

fn chars_match(a: char, b: char) -> bool {
    a == b || a.to_lowercase().eq(b.to_lowercase())
}
