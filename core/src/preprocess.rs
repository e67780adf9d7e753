use lazy_static::lazy_static;
use regex::Regex;
use rust_stemmers::{Algorithm, Stemmer};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;
use unicode_normalization::UnicodeNormalization;

use crate::error::{Error, Result};

lazy_static! {
    static ref PUNCT: Regex = Regex::new(r"[^\p{L}\p{N}\s]+").expect("valid regex");
    static ref STEMMER: Stemmer = Stemmer::create(Algorithm::English);
    static ref STOPWORDS: HashSet<&'static str> = {
        let words: &[&str] = &[
            "a","about","above","after","again","against","all","am","an","and","any","are","aren't","as","at",
            "be","because","been","before","being","below","between","both","but","by",
            "can","can't","cannot","could","couldn't",
            "did","didn't","do","does","doesn't","doing","don't","down","during",
            "each","few","for","from","further",
            "had","hadn't","has","hasn't","have","haven't","having","he","he'd","he'll","he's","her","here","here's","hers","herself","him","himself","his","how","how's",
            "i","i'd","i'll","i'm","i've","if","in","into","is","isn't","it","it's","its","itself",
            "let's","me","more","most","mustn't","my","myself",
            "no","nor","not","of","off","on","once","only","or","other","ought","our","ours","ourselves","out","over","own",
            "same","she","she'd","she'll","she's","should","shouldn't","so","some","such",
            "than","that","that's","the","their","theirs","them","themselves","then","there","there's","these","they","they'd","they'll","they're","they've","this","those","through","to","too",
            "under","until","up","very",
            "was","wasn't","we","we'd","we'll","we're","we've","were","weren't","what","what's","when","when's","where","where's","which","while","who","who's","whom","why","why's","with","won't","would","wouldn't",
            "you","you'd","you'll","you're","you've","your","yours","yourself","yourselves"
        ];
        words.iter().copied().collect()
    };
}

/// Default pipeline used when no methods are configured explicitly.
pub const DEFAULT_METHODS: &[&str] =
    &["lowercase", "normalize_spaces", "strip_punctuation", "remove_stopwords", "lemmatize"];

/// One named text transformation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Method {
    Lowercase,
    NormalizeSpaces,
    StripPunctuation,
    RemoveStopwords,
    Lemmatize,
    Nfkc,
}

impl Method {
    /// Canonical name; this is what enters the cache key.
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Lowercase => "lowercase",
            Method::NormalizeSpaces => "normalize_spaces",
            Method::StripPunctuation => "strip_punctuation",
            Method::RemoveStopwords => "remove_stopwords",
            Method::Lemmatize => "lemmatize",
            Method::Nfkc => "nfkc",
        }
    }

    pub fn apply(&self, text: &str) -> String {
        match self {
            Method::Lowercase => text.to_lowercase(),
            Method::NormalizeSpaces => text.split_whitespace().collect::<Vec<_>>().join(" "),
            Method::StripPunctuation => PUNCT.replace_all(text, " ").into_owned(),
            Method::RemoveStopwords => text
                .split_whitespace()
                .filter(|w| !is_stopword(w))
                .collect::<Vec<_>>()
                .join(" "),
            Method::Lemmatize => text
                .split_whitespace()
                .map(|w| STEMMER.stem(w).into_owned())
                .collect::<Vec<_>>()
                .join(" "),
            Method::Nfkc => text.nfkc().collect(),
        }
    }
}

impl FromStr for Method {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "lowercase" | "lowcase" => Ok(Method::Lowercase),
            "normalize_spaces" => Ok(Method::NormalizeSpaces),
            "strip_punctuation" | "special_chars" => Ok(Method::StripPunctuation),
            "remove_stopwords" => Ok(Method::RemoveStopwords),
            "lemmatize" | "lemmatize_text" => Ok(Method::Lemmatize),
            "nfkc" => Ok(Method::Nfkc),
            _ => Err(Error::UnknownMethod(s.to_string())),
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

fn is_stopword(token: &str) -> bool {
    STOPWORDS.contains(token.to_lowercase().as_str())
}

/// Deterministic text normalisation shared by indexing and querying.
pub trait TextProcessor: Send + Sync {
    fn process(&self, text: &str) -> String;

    /// Canonical names of the applied methods, in order.
    fn method_names(&self) -> Vec<String>;
}

/// Applies a fixed list of [`Method`]s in the given order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Preprocessor {
    methods: Vec<Method>,
}

impl Preprocessor {
    /// Fails on the first unknown name.
    pub fn from_names<S: AsRef<str>>(names: &[S]) -> Result<Self> {
        let methods = names
            .iter()
            .map(|n| n.as_ref().parse())
            .collect::<Result<Vec<Method>>>()?;
        Ok(Self { methods })
    }
}

impl TextProcessor for Preprocessor {
    fn process(&self, text: &str) -> String {
        self.methods
            .iter()
            .fold(text.to_string(), |acc, m| m.apply(&acc))
    }

    fn method_names(&self) -> Vec<String> {
        self.methods.iter().map(|m| m.as_str().to_string()).collect()
    }
}

/// Whitespace tokens of already processed text.
pub fn tokens(processed: &str) -> impl Iterator<Item = &str> {
    processed.split_whitespace()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_method_fails_fast() {
        let err = Preprocessor::from_names(&["lowercase", "stem_everything"]).unwrap_err();
        assert!(matches!(err, Error::UnknownMethod(name) if name == "stem_everything"));
    }

    #[test]
    fn aliases_resolve_to_canonical_names() {
        let p = Preprocessor::from_names(&["lowcase", "special_chars", "lemmatize_text"]).unwrap();
        assert_eq!(p.method_names(), vec!["lowercase", "strip_punctuation", "lemmatize"]);
    }

    #[test]
    fn default_pipeline() {
        let p = Preprocessor::from_names(DEFAULT_METHODS).unwrap();
        assert_eq!(p.process("  The Runners,   were RUNNING! "), "runner run");
    }

    #[test]
    fn methods_run_in_given_order() {
        let strip_first = Preprocessor::from_names(&["strip_punctuation", "normalize_spaces"]).unwrap();
        assert_eq!(strip_first.process("cat's toy"), "cat s toy");
        let normalize_first = Preprocessor::from_names(&["normalize_spaces", "strip_punctuation"]).unwrap();
        assert_eq!(normalize_first.process("cat's toy!"), "cat s toy ");
    }

    #[test]
    fn nfkc_folds_compatibility_forms() {
        assert_eq!(Method::Nfkc.apply("ﬁle"), "file");
    }

    #[test]
    fn empty_pipeline_is_identity() {
        let p = Preprocessor::default();
        assert_eq!(p.process("As Is"), "As Is");
    }
}
