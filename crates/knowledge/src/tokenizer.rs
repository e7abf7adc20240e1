//! Text normalization and vocabulary construction.
//!
//! Terms are lower-cased runs of ASCII alphanumerics and Vietnamese
//! letters. Single-character runs and bilingual stop words are dropped.
//!
//! The vocabulary assigns each distinct term a dense index in the order
//! terms are first encountered across the corpus, so a given corpus always
//! produces the same mapping.

use std::collections::{HashMap, HashSet};
use std::sync::LazyLock;

use moneyrag_core::error::KnowledgeError;
use moneyrag_core::knowledge::Language;
use tracing::debug;

/// Lower-case Vietnamese letters accepted inside a term.
pub const VIETNAMESE_LETTERS: &str =
    "àáảãạăằắẳẵặâầấẩẫậèéẻẽẹêềếểễệìíỉĩịòóỏõọôồốổỗộơờớởỡợùúủũụưừứửữựỳýỷỹỵđ";

const STOP_WORDS: &[&str] = &[
    // Vietnamese
    "và", "của", "là", "cho", "với", "có", "được", "này", "đó", "để", "trong", "những", "các",
    "một", "về", "từ", "như", "khi", "thì", "bạn", "không", "nếu", "nhưng", "cũng", "hoặc",
    "hay", "đã", "sẽ", "đang",
    // English
    "the", "a", "an", "and", "or", "but", "in", "on", "at", "to", "for", "of", "with", "by",
    "from", "is", "are", "was", "were", "be", "been", "being", "have", "has", "had", "do",
    "does", "did", "will", "would", "could", "should", "may", "might", "must", "shall", "can",
    "this", "that", "these", "those", "it", "its", "you", "your", "we", "our", "they", "their",
    "he", "she", "him", "her", "his",
];

static STOP_WORD_SET: LazyLock<HashSet<&'static str>> =
    LazyLock::new(|| STOP_WORDS.iter().copied().collect());

fn is_term_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || VIETNAMESE_LETTERS.contains(c)
}

/// Whether `word` is in the built-in stop-word list.
pub fn is_stop_word(word: &str) -> bool {
    STOP_WORD_SET.contains(word)
}

/// Normalized terms of `text` in order of appearance, duplicates kept.
pub fn terms(text: &str) -> Vec<String> {
    text.to_lowercase()
        .split(|c: char| !is_term_char(c))
        .filter(|token| token.chars().count() > 1)
        .filter(|token| !is_stop_word(token))
        .map(str::to_string)
        .collect()
}

/// The set of distinct normalized terms in `text`.
pub fn tokenize(text: &str) -> HashSet<String> {
    terms(text).into_iter().collect()
}

/// `Vietnamese` if the text contains any Vietnamese letter, else `English`.
pub fn detect_language(text: &str) -> Language {
    let has_vietnamese = text
        .to_lowercase()
        .chars()
        .any(|c| VIETNAMESE_LETTERS.contains(c));
    if has_vietnamese {
        Language::Vietnamese
    } else {
        Language::English
    }
}

/// Term → index mapping plus inverse document frequencies.
#[derive(Debug, Clone, Default)]
pub struct Vocabulary {
    index: HashMap<String, usize>,
    /// IDF weight per index
    idf: Vec<f32>,
    documents: usize,
}

impl Vocabulary {
    /// Build from a corpus of documents.
    ///
    /// `idf(t) = ln(N / (1 + df(t)))`. Terms present in (almost) every
    /// document get a zero or negative weight; that is kept as is.
    pub fn build<S: AsRef<str>>(corpus: &[S]) -> Result<Self, KnowledgeError> {
        if corpus.is_empty() {
            return Err(KnowledgeError::EmptyCorpus);
        }

        let mut index: HashMap<String, usize> = HashMap::new();
        let mut doc_freq: Vec<usize> = Vec::new();

        for doc in corpus {
            let mut seen: HashSet<String> = HashSet::new();
            for term in terms(doc.as_ref()) {
                if !seen.insert(term.clone()) {
                    continue;
                }
                let next = index.len();
                let idx = *index.entry(term).or_insert_with(|| {
                    doc_freq.push(0);
                    next
                });
                doc_freq[idx] += 1;
            }
        }

        let n = corpus.len() as f64;
        let idf = doc_freq
            .iter()
            .map(|&df| (n / (1.0 + df as f64)).ln() as f32)
            .collect();

        debug!(
            documents = corpus.len(),
            terms = index.len(),
            "Vocabulary built"
        );

        Ok(Self {
            index,
            idf,
            documents: corpus.len(),
        })
    }

    /// Number of distinct terms (the embedding dimension).
    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// Number of documents the vocabulary was built from.
    pub fn document_count(&self) -> usize {
        self.documents
    }

    pub fn index_of(&self, term: &str) -> Option<usize> {
        self.index.get(term).copied()
    }

    pub fn idf(&self, term: &str) -> Option<f32> {
        self.index_of(term).map(|idx| self.idf[idx])
    }

    pub fn idf_at(&self, index: usize) -> Option<f32> {
        self.idf.get(index).copied()
    }

    pub fn contains(&self, term: &str) -> bool {
        self.index.contains_key(term)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tokenize_lowercases_and_splits() {
        let terms = tokenize("Track YOUR spending, weekly!");
        assert!(terms.contains("track"));
        assert!(terms.contains("spending"));
        assert!(terms.contains("weekly"));
        assert!(!terms.contains("your")); // stop word
    }

    #[test]
    fn tokenize_keeps_vietnamese_letters() {
        let terms = tokenize("Tiết kiệm 20% thu nhập mỗi tháng");
        assert!(terms.contains("tiết"));
        assert!(terms.contains("kiệm"));
        assert!(terms.contains("20"));
        assert!(terms.contains("tháng"));
    }

    #[test]
    fn tokenize_drops_short_tokens_and_stop_words() {
        let terms = tokenize("a b c và của budget x");
        assert_eq!(terms.len(), 1);
        assert!(terms.contains("budget"));
    }

    #[test]
    fn tokenize_collapses_duplicates() {
        let set = tokenize("save save save money");
        assert_eq!(set.len(), 2);
        assert_eq!(terms("save save save money").len(), 4);
    }

    #[test]
    fn uppercase_vietnamese_is_normalized() {
        let terms = tokenize("NGÂN SÁCH");
        assert!(terms.contains("ngân"));
        assert!(terms.contains("sách"));
    }

    #[test]
    fn detect_language_by_diacritics() {
        assert_eq!(detect_language("Tôi nên tiết kiệm thế nào?"), Language::Vietnamese);
        assert_eq!(detect_language("How should I save?"), Language::English);
        assert_eq!(detect_language("ĐI CHỢ"), Language::Vietnamese);
    }

    #[test]
    fn vocabulary_size_matches_distinct_terms() {
        let corpus = ["budget weekly budget", "saving weekly", "debt payoff"];
        let vocab = Vocabulary::build(&corpus).unwrap();
        assert_eq!(vocab.len(), 5);
        assert_eq!(vocab.document_count(), 3);
    }

    #[test]
    fn vocabulary_indexes_in_encounter_order() {
        let corpus = ["alpha beta", "beta gamma"];
        let vocab = Vocabulary::build(&corpus).unwrap();
        assert_eq!(vocab.index_of("alpha"), Some(0));
        assert_eq!(vocab.index_of("beta"), Some(1));
        assert_eq!(vocab.index_of("gamma"), Some(2));
    }

    #[test]
    fn idf_follows_smoothed_formula() {
        let corpus = ["alpha beta", "beta gamma", "beta delta", "epsilon"];
        let vocab = Vocabulary::build(&corpus).unwrap();
        // alpha: df = 1 → ln(4 / 2)
        assert!((vocab.idf("alpha").unwrap() - 2.0f32.ln()).abs() < 1e-6);
        // beta: df = 3 → ln(4 / 4) = 0
        assert!(vocab.idf("beta").unwrap().abs() < 1e-6);
    }

    #[test]
    fn idf_may_be_negative() {
        let corpus = ["shared term", "shared other"];
        let vocab = Vocabulary::build(&corpus).unwrap();
        // df = 2, N = 2 → ln(2 / 3) < 0
        assert!(vocab.idf("shared").unwrap() < 0.0);
    }

    #[test]
    fn empty_corpus_is_an_error() {
        let corpus: [&str; 0] = [];
        assert!(matches!(
            Vocabulary::build(&corpus),
            Err(KnowledgeError::EmptyCorpus)
        ));
    }

    #[test]
    fn corpus_of_stop_words_yields_empty_vocabulary() {
        let vocab = Vocabulary::build(&["the and of", "và của"]).unwrap();
        assert!(vocab.is_empty());
    }
}
