//! Keyword-driven severity scoring and category assignment.
//!
//! Both passes are case-insensitive substring scans over the content.
//! Categories are assigned first and then feed their modifiers into the
//! score, so a keyword like "ransomware" counts twice: once through the
//! keyword table, once through the category it triggers.

/// Lowest and highest criticality score.
pub const MIN_SCORE: u8 = 1;
pub const MAX_SCORE: u8 = 10;

/// Score when no keyword matches.
pub const DEFAULT_SCORE: i32 = 3;

/// Category assigned when no indicator group matches.
pub const DEFAULT_CATEGORY: &str = "vulnerability";

const KEYWORD_SEVERITY: [(&str, i32); 22] = [
    ("ransomware", 10),
    ("zero-day", 10),
    ("zero day", 10),
    ("data breach", 9),
    ("apt", 9),
    ("advanced persistent threat", 9),
    ("exploit", 8),
    ("remote code execution", 8),
    ("rce", 8),
    ("backdoor", 8),
    ("credential", 7),
    ("stolen data", 7),
    ("vulnerability", 6),
    ("malware", 6),
    ("trojan", 6),
    ("phishing", 5),
    ("botnet", 5),
    ("suspicious", 4),
    ("attack", 4),
    ("compromise", 4),
    ("threat", 3),
    ("risk", 3),
];

const CATEGORY_MODIFIERS: [(&str, i32); 6] = [
    ("ransomware", 2),
    ("data-leak", 2),
    ("exploit", 1),
    ("malware", 1),
    ("vulnerability", 0),
    ("phishing", -1),
];

/// Indicator substrings per category, in assignment order.
const CATEGORY_INDICATORS: [(&str, &[&str]); 6] = [
    ("ransomware", &["ransomware", "ransom", "encrypt"]),
    (
        "data-leak",
        &["data breach", "leak", "stolen data", "database dump"],
    ),
    ("malware", &["malware", "trojan", "virus", "backdoor"]),
    ("vulnerability", &["vulnerability", "cve", "zero-day", "zero day"]),
    ("exploit", &["exploit", "rce", "remote code execution"]),
    ("phishing", &["phishing", "phish", "social engineering"]),
];

/// Category names recognized by the scorer.
pub fn known_categories() -> impl Iterator<Item = &'static str> {
    CATEGORY_INDICATORS.iter().map(|(name, _)| *name)
}

/// Assign categories to content. Never returns an empty list.
pub fn categorize(content: &str) -> Vec<String> {
    let lower = content.to_lowercase();
    let mut categories: Vec<String> = CATEGORY_INDICATORS
        .iter()
        .filter(|(_, indicators)| indicators.iter().any(|i| lower.contains(i)))
        .map(|(name, _)| name.to_string())
        .collect();

    if categories.is_empty() {
        categories.push(DEFAULT_CATEGORY.to_string());
    }
    categories
}

/// Score content from 1 to 10: the highest matched keyword severity, plus
/// the modifier of every given category, clamped.
pub fn score(content: &str, categories: &[String]) -> u8 {
    let lower = content.to_lowercase();
    let base = KEYWORD_SEVERITY
        .iter()
        .filter(|(keyword, _)| lower.contains(keyword))
        .map(|(_, severity)| *severity)
        .max()
        .unwrap_or(DEFAULT_SCORE);

    let modifier: i32 = categories
        .iter()
        .filter_map(|c| {
            CATEGORY_MODIFIERS
                .iter()
                .find(|(name, _)| name == c)
                .map(|(_, m)| *m)
        })
        .sum();

    (base + modifier).clamp(i32::from(MIN_SCORE), i32::from(MAX_SCORE)) as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cats(names: &[&str]) -> Vec<String> {
        names.iter().map(|n| n.to_string()).collect()
    }

    #[test]
    fn score_is_max_not_sum() {
        assert_eq!(score("a threat and a risk of attack", &[]), 4);
        assert_eq!(score("Botnet spreading MALWARE", &[]), 6);
    }

    #[test]
    fn unmatched_content_scores_default() {
        assert_eq!(score("Quarterly newsletter", &[]), 3);
    }

    #[test]
    fn modifiers_are_additive_and_clamped() {
        assert_eq!(score("ransomware", &cats(&["ransomware"])), 10);
        assert_eq!(score("exploit", &cats(&["exploit", "malware"])), 10);
        assert_eq!(score("phishing", &cats(&["phishing"])), 4);
        assert_eq!(score("risk", &cats(&["unknown"])), 3);
    }

    #[test]
    fn score_stays_in_range() {
        let many = cats(&["phishing"; 20]);
        assert_eq!(score("nothing here", &many), MIN_SCORE);
        let all = cats(&["ransomware", "data-leak", "exploit", "malware"]);
        assert_eq!(score("zero-day", &all), MAX_SCORE);
    }

    #[test]
    fn categorize_matches_indicator_groups_in_order() {
        assert_eq!(
            categorize("Stolen data from the breach includes a database dump; attackers demand ransom"),
            cats(&["ransomware", "data-leak"])
        );
        assert_eq!(
            categorize("Phishing kit drops a trojan exploiting CVE-2024-1234"),
            cats(&["malware", "vulnerability", "exploit", "phishing"])
        );
    }

    #[test]
    fn brief_note_gets_default_score_and_category() {
        let content = "This is a brief note";
        let categories = categorize(content);
        assert_eq!(categories, cats(&["vulnerability"]));
        assert_eq!(score(content, &categories), 3);
    }

    #[test]
    fn categorize_defaults_to_vulnerability() {
        assert_eq!(categorize("Quarterly newsletter"), cats(&[DEFAULT_CATEGORY]));
    }

    #[test]
    fn categories_feed_scoring_twice() {
        let content = "New ransomware family observed";
        let categories = categorize(content);
        assert_eq!(categories, cats(&["ransomware"]));
        assert_eq!(score(content, &categories), 10);

        let content = "Credential phishing campaign";
        let categories = categorize(content);
        assert_eq!(categories, cats(&["phishing"]));
        assert_eq!(score(content, &categories), 6);
    }

    #[test]
    fn known_categories_lists_all_groups() {
        assert_eq!(known_categories().count(), 6);
    }
}
