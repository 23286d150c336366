//! Keyword-based category detection for channels

use crate::models::Category;

/// Ordered keyword table; the first category with any match wins.
///
/// Order matters where keywords overlap ("disney" is claimed by Movies before
/// Kids, "mtv" by Entertainment before Music).
pub const CATEGORY_KEYWORDS: &[(Category, &[&str])] = &[
    (
        Category::News,
        &["news", "noticias", "info", "current", "cnn", "fox", "bbc", "msnbc", "cnbc"],
    ),
    (
        Category::Sports,
        &[
            "sport", "football", "soccer", "basketball", "tennis", "racing", "espn", "fight",
            "ufc", "wwe", "olympic",
        ],
    ),
    (
        Category::Movies,
        &[
            "movie", "film", "cinema", "paramount", "mgm", "warner", "disney", "marvel", "star",
        ],
    ),
    (
        Category::Entertainment,
        &[
            "entertainment", "mtv", "vh1", "comedy", "lifestyle", "reality", "gameshow", "talent",
        ],
    ),
    (
        Category::Kids,
        &["kids", "children", "cartoon", "disney", "nickelodeon", "nick", "toon", "anime"],
    ),
    (
        Category::Music,
        &["music", "mtv", "vh1", "vevo", "hit", "rock", "jazz", "concert"],
    ),
    (
        Category::Documentary,
        &[
            "documentary", "discovery", "history", "science", "nature", "animal", "planet", "geo",
            "learn",
        ],
    ),
    (
        Category::Series,
        &["series", "drama", "sitcom", "show", "episode"],
    ),
    (
        Category::Lifestyle,
        &["lifestyle", "food", "cooking", "travel", "home", "garden", "fashion", "design"],
    ),
    (
        Category::Religious,
        &["religious", "religion", "christian", "islamic", "jewish", "hindu", "spiritual"],
    ),
    (
        Category::Business,
        &["business", "finance", "market", "stock", "economy", "bloomberg", "reuters"],
    ),
    (Category::Weather, &["weather", "climate", "forecast"]),
];

pub fn classify(title: &str, group: &str) -> Category {
    let text = format!("{title} {group}").to_lowercase();

    CATEGORY_KEYWORDS
        .iter()
        .find(|(_, keywords)| keywords.iter().any(|keyword| text.contains(keyword)))
        .map(|(category, _)| *category)
        .unwrap_or(Category::General)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("CNN HD", "", Category::News)]
    #[case("ESPN 2", "", Category::Sports)]
    #[case("Disney Channel", "", Category::Movies)]
    #[case("MTV Hits", "", Category::Entertainment)]
    #[case("Cartoon Network", "", Category::Kids)]
    #[case("Jazz FM", "", Category::Music)]
    #[case("Discovery", "", Category::Documentary)]
    #[case("Local 12", "Religious", Category::Religious)]
    #[case("Bloomberg TV", "", Category::Business)]
    #[case("Local 12", "Weather", Category::Weather)]
    #[case("Local 12", "", Category::General)]
    #[case("", "", Category::General)]
    fn test_classify(#[case] title: &str, #[case] group: &str, #[case] expected: Category) {
        assert_eq!(classify(title, group), expected);
    }

    #[test]
    fn test_group_is_matched_case_insensitively() {
        assert_eq!(classify("Channel 4", "SPORTS"), Category::Sports);
    }

    #[test]
    fn test_earlier_category_wins_on_overlap() {
        // "fox" (News) precedes "sport" (Sports)
        assert_eq!(classify("Fox Sports 1", ""), Category::News);
    }

    #[test]
    fn test_table_order_is_stable() {
        let order: Vec<Category> = CATEGORY_KEYWORDS.iter().map(|(c, _)| *c).collect();
        assert_eq!(order.first(), Some(&Category::News));
        assert_eq!(order.last(), Some(&Category::Weather));
        assert_eq!(order.len(), 12);
    }
}
