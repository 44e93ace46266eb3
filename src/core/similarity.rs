use std::collections::HashMap;

/// Vocabulary cap; terms beyond the most frequent are ignored.
const MAX_FEATURES: usize = 1000;

const STOP_WORDS: &[&str] = &[
    "about", "above", "after", "again", "all", "am", "an", "and", "any", "are", "as", "at", "be",
    "because", "been", "before", "being", "below", "between", "both", "but", "by", "can", "did",
    "do", "does", "doing", "down", "during", "each", "few", "for", "from", "further", "had",
    "has", "have", "having", "he", "her", "here", "hers", "him", "his", "how", "if", "in", "into",
    "is", "it", "its", "itself", "just", "me", "more", "most", "my", "myself", "no", "nor", "not",
    "now", "of", "off", "on", "once", "only", "or", "other", "our", "ours", "out", "over", "own",
    "same", "she", "should", "so", "some", "such", "than", "that", "the", "their", "theirs",
    "them", "then", "there", "these", "they", "this", "those", "through", "to", "too", "under",
    "until", "up", "very", "was", "we", "were", "what", "when", "where", "which", "while", "who",
    "whom", "why", "will", "with", "you", "your", "yours", "yourself",
];

/// Maximum pairwise cosine similarity between `candidate` and each text
/// in `prior`, over tf-idf weighted unigram+bigram counts with English
/// stop words removed. Scores live in [0, 1]; an empty `prior` scores 0.
pub fn max_similarity(candidate: &str, prior: &[&str]) -> f64 {
    if prior.is_empty() {
        return 0.0;
    }

    let docs: Vec<Vec<String>> = std::iter::once(candidate)
        .chain(prior.iter().copied())
        .map(tokenize)
        .collect();
    let counts: Vec<HashMap<&str, f64>> = docs.iter().map(|doc| term_counts(doc)).collect();

    let mut corpus_freq: HashMap<&str, f64> = HashMap::new();
    let mut doc_freq: HashMap<&str, usize> = HashMap::new();
    for doc in &counts {
        for (&term, &count) in doc {
            *corpus_freq.entry(term).or_insert(0.0) += count;
            *doc_freq.entry(term).or_insert(0) += 1;
        }
    }

    // Most frequent terms first, ties broken lexically so the cut is stable.
    let mut vocab: Vec<&str> = corpus_freq.keys().copied().collect();
    vocab.sort_unstable_by(|a, b| {
        corpus_freq[b]
            .total_cmp(&corpus_freq[a])
            .then_with(|| a.cmp(b))
    });
    vocab.truncate(MAX_FEATURES);

    // Smoothed idf, as if every term appeared in one extra document.
    let doc_count = counts.len() as f64;
    let idf: HashMap<&str, f64> = vocab
        .iter()
        .map(|&term| {
            let df = doc_freq[term] as f64;
            (term, ((1.0 + doc_count) / (1.0 + df)).ln() + 1.0)
        })
        .collect();

    let target = weigh(&counts[0], &vocab, &idf);
    counts[1..]
        .iter()
        .map(|doc| cosine(&target, &weigh(doc, &vocab, &idf)))
        .fold(0.0, f64::max)
}

fn tokenize(text: &str) -> Vec<String> {
    let lowered = text.to_lowercase();
    let words: Vec<&str> = lowered
        .split(|c: char| !c.is_alphanumeric())
        .filter(|word| word.len() >= 2 && !STOP_WORDS.contains(word))
        .collect();

    let mut terms: Vec<String> = words.iter().map(|word| (*word).to_string()).collect();
    terms.extend(words.windows(2).map(|pair| format!("{} {}", pair[0], pair[1])));
    terms
}

fn term_counts(terms: &[String]) -> HashMap<&str, f64> {
    let mut counts = HashMap::new();
    for term in terms {
        *counts.entry(term.as_str()).or_insert(0.0) += 1.0;
    }
    counts
}

fn weigh(counts: &HashMap<&str, f64>, vocab: &[&str], idf: &HashMap<&str, f64>) -> Vec<f64> {
    vocab
        .iter()
        .map(|&term| counts.get(term).copied().unwrap_or(0.0) * idf[term])
        .collect()
}

fn cosine(a: &[f64], b: &[f64]) -> f64 {
    let norm_a: f64 = a.iter().map(|w| w * w).sum::<f64>().sqrt();
    let norm_b: f64 = b.iter().map(|w| w * w).sum::<f64>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    if a == b {
        return 1.0;
    }
    let dot: f64 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    dot / (norm_a * norm_b)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identical_texts_score_one() {
        let text = "just beat the final boss in Hollow Knight and I am shaking";
        let score = max_similarity(text, &[text]);
        assert!((score - 1.0).abs() < 1e-9);
        assert!(score >= 1.0);
    }

    #[test]
    fn empty_prior_set_scores_zero() {
        assert_eq!(max_similarity("anything at all", &[]), 0.0);
    }

    #[test]
    fn unrelated_texts_score_low() {
        let score = max_similarity(
            "spent the whole weekend farming parsnips in Stardew Valley",
            &["my cat knocked a glass of water onto the keyboard again"],
        );
        assert!(score < 0.5, "score was {score}");
    }

    #[test]
    fn max_is_taken_over_all_prior_texts() {
        let candidate = "finally finished Celeste, the b sides destroyed me";
        let near = "finally finished Celeste, the b sides destroyed me completely";
        let far = "thinking about what to cook for dinner tonight";
        let score = max_similarity(candidate, &[far, near]);
        assert!(score > 0.8, "score was {score}");
    }

    #[test]
    fn stop_words_and_short_tokens_are_dropped() {
        let terms = tokenize("I am so into the Hades run, it is a joy");
        assert!(terms.iter().any(|t| t == "hades"));
        assert!(!terms.iter().any(|t| t == "the" || t == "is" || t == "a"));
    }
}
