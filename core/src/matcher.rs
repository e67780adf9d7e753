//! Literal verification of candidate documents.

/// Exact substring search.
pub trait Matcher: Send + Sync {
    /// Byte offset of the first occurrence of `needle` in `haystack`.
    fn find(&self, haystack: &str, needle: &str) -> Option<usize>;

    fn contains(&self, haystack: &str, needle: &str) -> bool {
        self.find(haystack, needle).is_some()
    }
}

/// Boyer-Moore-Horspool over UTF-8 bytes.
#[derive(Debug, Clone, Copy, Default)]
pub struct HorspoolMatcher;

impl Matcher for HorspoolMatcher {
    fn find(&self, haystack: &str, needle: &str) -> Option<usize> {
        let h = haystack.as_bytes();
        let n = needle.as_bytes();
        if n.is_empty() {
            return Some(0);
        }
        if n.len() > h.len() {
            return None;
        }

        let last = n.len() - 1;
        let mut shift = [n.len(); 256];
        for (i, &b) in n[..last].iter().enumerate() {
            shift[b as usize] = last - i;
        }

        let mut pos = 0;
        while pos + n.len() <= h.len() {
            let window = &h[pos..pos + n.len()];
            if window[last] == n[last] && window == n {
                return Some(pos);
            }
            pos += shift[window[last] as usize];
        }
        None
    }
}

/// True when the tokens of `query` appear consecutively among the tokens of `document`.
///
/// Both sides are re-joined with single spaces and padded, so a phrase never
/// matches inside a longer token ("cat" does not match "cats").
pub fn contains_phrase(matcher: &dyn Matcher, document: &str, query: &str) -> bool {
    let query = query.split_whitespace().collect::<Vec<_>>().join(" ");
    if query.is_empty() {
        return false;
    }
    let document = document.split_whitespace().collect::<Vec<_>>().join(" ");
    matcher.contains(&format!(" {document} "), &format!(" {query} "))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finds_like_std() {
        let m = HorspoolMatcher;
        let hay = "the quick brown fox jumps over the lazy dog";
        for needle in ["the", "fox", "lazy dog", "dog", "over the", "cat", "g", "the quick brown fox jumps over the lazy dog!"] {
            assert_eq!(m.find(hay, needle), hay.find(needle), "{needle}");
        }
    }

    #[test]
    fn handles_repeats_and_multibyte() {
        let m = HorspoolMatcher;
        assert_eq!(m.find("aaaaab", "aab"), Some(3));
        assert_eq!(m.find("größer größte", "größte"), "größer größte".find("größte"));
        assert_eq!(m.find("", "a"), None);
        assert_eq!(m.find("abc", ""), Some(0));
    }

    #[test]
    fn phrase_respects_token_boundaries() {
        let m = HorspoolMatcher;
        assert!(contains_phrase(&m, "the cat sat", "the cat"));
        assert!(contains_phrase(&m, "the  cat\tsat", "cat sat"));
        assert!(!contains_phrase(&m, "cats and dogs", "cat"));
        assert!(!contains_phrase(&m, "the dog ran", "the cat"));
        assert!(!contains_phrase(&m, "the cat sat", "   "));
    }
}
