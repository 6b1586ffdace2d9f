//! Text normalization for intent matching.
//!
//! Lower-cases, strips punctuation (accented Latin letters survive because the
//! word class is Unicode-aware), drops French and English function words and
//! every token of two characters or fewer.

use regex::Regex;
use std::collections::HashSet;
use std::sync::LazyLock;

/// Tokens with this many characters or fewer are discarded.
pub const MAX_DISCARDED_LEN: usize = 2;

/// French function words. Content words such as "mal" or "bien" are kept on
/// purpose: they carry symptom meaning in this domain.
const STOPWORDS_FR: &[&str] = &[
    "les", "une", "des", "aux", "est", "sont", "était", "être", "avoir", "ont", "avons", "avez",
    "avait", "mais", "donc", "car", "que", "qui", "quoi", "dont", "quel", "quelle", "quels",
    "quelles", "lequel", "laquelle", "mon", "ton", "son", "mes", "tes", "ses", "notre", "votre",
    "nos", "vos", "leur", "leurs", "elle", "elles", "nous", "vous", "ils", "lui", "moi", "toi",
    "ces", "cet", "cette", "ceci", "cela", "dans", "sur", "sous", "avec", "sans", "pour", "par",
    "entre", "vers", "chez", "comme", "alors", "ainsi", "aussi", "encore", "déjà", "très",
    "trop", "peu", "tout", "tous", "toute", "toutes", "même", "mêmes", "autre", "autres",
    "quand", "comment", "pourquoi", "combien", "parce", "puisque", "lorsque", "oui", "non",
    "fait", "fais", "faire", "font", "peut", "peux", "veux", "veut", "dois", "doit", "suis",
    "sera", "été", "faut", "cest", "estce", "voici", "voilà", "ici",
];

/// English function words.
const STOPWORDS_EN: &[&str] = &[
    "the", "and", "but", "nor", "for", "yet", "you", "she", "they", "him", "her", "them", "his",
    "its", "our", "their", "this", "that", "these", "those", "who", "whom", "which", "what",
    "whose", "are", "was", "were", "been", "being", "have", "has", "had", "having", "does",
    "did", "doing", "will", "would", "shall", "should", "can", "could", "may", "might", "must",
    "from", "with", "about", "into", "through", "during", "before", "after", "over", "under",
    "again", "here", "there", "where", "when", "why", "how", "all", "each", "every", "both",
    "few", "more", "most", "other", "some", "any", "not", "only", "own", "same", "than", "too",
    "very", "just", "also", "now", "then", "once", "because", "until", "while", "yes",
];

static NON_WORD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^\w\s]|_").expect("Invalid regex: non-word characters"));

static STOPWORDS: LazyLock<HashSet<&'static str>> = LazyLock::new(|| {
    STOPWORDS_FR
        .iter()
        .chain(STOPWORDS_EN.iter())
        .copied()
        .collect()
});

/// Returns true for words that never take part in matching.
pub fn is_stopword(word: &str) -> bool {
    STOPWORDS.contains(word)
}

/// Splits text into normalized matching tokens, in input order.
pub fn tokenize(text: &str) -> Vec<String> {
    let lowered = text.trim().to_lowercase();
    NON_WORD
        .replace_all(&lowered, " ")
        .split_whitespace()
        .filter(|token| token.chars().count() > MAX_DISCARDED_LEN && !is_stopword(token))
        .map(str::to_string)
        .collect()
}

/// Normalized form of `text`: its tokens joined by single spaces.
pub fn normalize(text: &str) -> String {
    tokenize(text).join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stopwords_and_short_tokens_removed() {
        assert_eq!(tokenize("j'ai mal au ventre"), vec!["mal", "ventre"]);
    }

    #[test]
    fn test_accents_are_kept() {
        assert_eq!(
            tokenize("J'ai des nausées le matin, est-ce normal ?"),
            vec!["nausées", "matin", "normal"]
        );
        assert_eq!(normalize("Fièvre chez BÉBÉ!!"), "fièvre bébé");
    }

    #[test]
    fn test_whitespace_collapsed() {
        assert_eq!(normalize("  vaccin \t\n   rougeole  "), "vaccin rougeole");
        assert_eq!(normalize("vaccin_rougeole"), "vaccin rougeole");
    }

    #[test]
    fn test_deterministic() {
        let text = "Quels vaccins pour mon bébé de 2 mois ?";
        assert_eq!(tokenize(text), tokenize(text));
        assert_eq!(normalize(text), normalize(&normalize(text)));
    }

    #[test]
    fn test_empty_text() {
        assert!(tokenize("").is_empty());
        assert!(tokenize("   ?! ").is_empty());
        assert_eq!(normalize("a b c"), "");
    }

    #[test]
    fn test_english_stopwords() {
        assert_eq!(tokenize("What should the baby eat?"), vec!["baby", "eat"]);
    }
}
