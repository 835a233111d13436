//! Word-frequency analytics for uploaded documents.

use crate::types::WordCount;
use std::collections::HashMap;

/// Number of words reported by [`top_words`] by default.
pub const TOP_WORDS: usize = 20;

/// English stop words (NLTK list).
const STOP_WORDS: &[&str] = &[
    "i", "me", "my", "myself", "we", "our", "ours", "ourselves", "you", "you're", "you've",
    "you'll", "you'd", "your", "yours", "yourself", "yourselves", "he", "him", "his", "himself",
    "she", "she's", "her", "hers", "herself", "it", "it's", "its", "itself", "they", "them",
    "their", "theirs", "themselves", "what", "which", "who", "whom", "this", "that", "that'll",
    "these", "those", "am", "is", "are", "was", "were", "be", "been", "being", "have", "has",
    "had", "having", "do", "does", "did", "doing", "a", "an", "the", "and", "but", "if", "or",
    "because", "as", "until", "while", "of", "at", "by", "for", "with", "about", "against",
    "between", "into", "through", "during", "before", "after", "above", "below", "to", "from",
    "up", "down", "in", "out", "on", "off", "over", "under", "again", "further", "then", "once",
    "here", "there", "when", "where", "why", "how", "all", "any", "both", "each", "few", "more",
    "most", "other", "some", "such", "no", "nor", "not", "only", "own", "same", "so", "than",
    "too", "very", "s", "t", "can", "will", "just", "don", "don't", "should", "should've", "now",
    "d", "ll", "m", "o", "re", "ve", "y", "ain", "aren", "aren't", "couldn", "couldn't", "didn",
    "didn't", "doesn", "doesn't", "hadn", "hadn't", "hasn", "hasn't", "haven", "haven't", "isn",
    "isn't", "ma", "mightn", "mightn't", "mustn", "mustn't", "needn", "needn't", "shan",
    "shan't", "shouldn", "shouldn't", "wasn", "wasn't", "weren", "weren't", "won", "won't",
    "wouldn", "wouldn't",
];

fn is_stop_word(word: &str) -> bool {
    STOP_WORDS.contains(&word)
}

/// Most frequent content words across `pages`, at most `limit` of them.
///
/// Text is lower-cased and stripped of ASCII punctuation before splitting on
/// whitespace. Stop words and words of two characters or fewer are ignored.
/// Ties keep the order in which words first appear.
pub fn top_words(pages: &[String], limit: usize) -> Vec<WordCount> {
    let text = pages.join(" ").to_lowercase();
    let cleaned: String = text.chars().filter(|c| !c.is_ascii_punctuation()).collect();

    // word -> (count, first occurrence)
    let mut counts: HashMap<&str, (usize, usize)> = HashMap::new();
    for word in cleaned.split_whitespace() {
        if word.chars().count() <= 2 || is_stop_word(word) {
            continue;
        }
        let next = counts.len();
        counts.entry(word).or_insert((0, next)).0 += 1;
    }

    let mut ranked: Vec<(&str, usize, usize)> = counts
        .into_iter()
        .map(|(word, (count, first))| (word, count, first))
        .collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1).then(a.2.cmp(&b.2)));
    ranked.truncate(limit);

    ranked
        .into_iter()
        .map(|(word, count, _)| WordCount {
            word: word.to_string(),
            count,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pairs(words: &[WordCount]) -> Vec<(&str, usize)> {
        words.iter().map(|w| (w.word.as_str(), w.count)).collect()
    }

    #[test]
    fn test_counts_and_filters() {
        let pages = vec![
            "The Refund policy: refunds are processed within 30 days.".to_string(),
            "Refunds! Policy, policy.".to_string(),
        ];
        let top = top_words(&pages, TOP_WORDS);

        assert_eq!(
            pairs(&top),
            vec![
                ("policy", 3),
                ("refunds", 2),
                ("refund", 1),
                ("processed", 1),
                ("within", 1),
                ("days", 1),
            ]
        );
    }

    #[test]
    fn test_ties_keep_first_occurrence_order() {
        let pages = vec!["zebra apple mango apple zebra mango".to_string()];
        let top = top_words(&pages, TOP_WORDS);
        assert_eq!(
            pairs(&top),
            vec![("zebra", 2), ("apple", 2), ("mango", 2)]
        );
    }

    #[test]
    fn test_limit_and_empty_input() {
        let pages = vec!["alpha beta gamma delta".to_string()];
        assert_eq!(top_words(&pages, 2).len(), 2);
        assert!(top_words(&[], TOP_WORDS).is_empty());
    }

    #[test]
    fn test_pages_are_joined_with_space() {
        let pages = vec!["hello".to_string(), "world".to_string()];
        assert_eq!(pairs(&top_words(&pages, TOP_WORDS)), vec![("hello", 1), ("world", 1)]);
    }
}
