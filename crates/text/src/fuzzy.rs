//! Fuzzy matching over Indian names in Roman script.
//!
//! The scoring pipeline is a chain of increasingly lenient comparisons, each
//! cheaper than the last to rule out before reaching for edit distance — the
//! same "fast exact check before falling back to the corrector" shape as the
//! teacher's `grammar/edit_distance.rs`.

use std::collections::HashMap;

/// How a match was produced, most exact first.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchType {
    Exact,
    HonorificStripped,
    Nickname,
    Phonetic,
    Typo,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NameMatch {
    pub score: f64,
    pub matched: String,
    pub match_type: MatchType,
}

/// Bidirectional nickname table plus the honorific strip-list, shop-editable
/// via [`crate::ShopVocabulary`]-style configuration owned by the caller.
pub struct FuzzyMatcher {
    honorifics: Vec<String>,
    /// canonical (lowercase) -> nicknames (lowercase), both directions are
    /// checked at lookup time so entries need only be listed once.
    nicknames: HashMap<String, Vec<String>>,
}

impl FuzzyMatcher {
    #[must_use]
    pub fn new(honorifics: Vec<String>, nicknames: HashMap<String, Vec<String>>) -> Self {
        Self {
            honorifics: honorifics.into_iter().map(|h| h.to_lowercase()).collect(),
            nicknames,
        }
    }

    /// Scores `query` against `candidate`, returning `None` if below
    /// `threshold`. Mirrors spec's `matchIndianName`.
    #[must_use]
    pub fn match_name(&self, query: &str, candidate: &str, threshold: f64) -> Option<NameMatch> {
        let q = normalize_case(query);
        let c = normalize_case(candidate);
        if q.is_empty() || c.is_empty() {
            return None;
        }

        let best = self.score_pipeline(&q, &c);
        if best.score < threshold {
            return None;
        }

        Some(NameMatch {
            score: best.score,
            matched: candidate.to_string(),
            match_type: best.match_type,
        })
    }

    fn score_pipeline(&self, q: &str, c: &str) -> NameMatch {
        // 1. exact match on normalised case
        if q == c {
            return NameMatch { score: 1.0, matched: c.to_string(), match_type: MatchType::Exact };
        }

        // 2. strip honorifics from either side and re-compare
        let q_stripped = self.strip_honorifics(q);
        let c_stripped = self.strip_honorifics(c);
        let mut best_score = 0.0;
        let mut best_type = MatchType::Phonetic;

        if q_stripped == c_stripped && !q_stripped.is_empty() {
            best_score = 1.0;
            best_type = MatchType::HonorificStripped;
        }

        // 3. nickname table lookup (bidirectional)
        if self.are_nickname_linked(&q_stripped, &c_stripped) && best_score < 0.92 {
            best_score = 0.92;
            best_type = MatchType::Nickname;
        }

        // 4. phonetic normalisation + scaled Levenshtein
        let q_phon = phonetic_normalize(&q_stripped);
        let c_phon = phonetic_normalize(&c_stripped);
        let dist = levenshtein(&q_phon, &c_phon);
        let max_len = q_phon.chars().count().max(c_phon.chars().count()).max(1);
        let phon_score = 1.0 - (dist as f64 / max_len as f64);
        if phon_score > best_score {
            best_score = phon_score;
            best_type = MatchType::Phonetic;
        }

        // 5. transposition/typo tolerance, capped at edit distance 1 on the
        // normalised form (dist already counts an adjacent swap as one edit,
        // not two) — a distance-1 typo always scores at least 0.9.
        if dist <= 1 && !q_phon.is_empty() && best_score < 0.9 {
            best_score = 0.9;
            best_type = MatchType::Typo;
        }

        NameMatch {
            score: best_score.clamp(0.0, 1.0),
            matched: c.to_string(),
            match_type: best_type,
        }
    }

    fn strip_honorifics(&self, name: &str) -> String {
        let words: Vec<&str> = name
            .split_whitespace()
            .filter(|w| !self.honorifics.iter().any(|h| h == w))
            .collect();
        words.join(" ")
    }

    fn are_nickname_linked(&self, a: &str, b: &str) -> bool {
        if a == b {
            return false;
        }
        for (canonical, nicks) in &self.nicknames {
            let canonical = canonical.to_lowercase();
            let nicks_lower: Vec<String> = nicks.iter().map(|n| n.to_lowercase()).collect();
            let a_in = a == canonical || nicks_lower.iter().any(|n| n == a);
            let b_in = b == canonical || nicks_lower.iter().any(|n| n == b);
            if a_in && b_in {
                return true;
            }
        }
        false
    }

    /// Highest-scoring candidate at or above `threshold`, `None` if none qualify.
    #[must_use]
    pub fn find_best_match<'a>(
        &self,
        query: &str,
        candidates: &'a [String],
        threshold: f64,
    ) -> Option<(NameMatch, &'a str)> {
        self.find_all_matches(query, candidates, threshold).into_iter().next()
    }

    /// All candidates at or above `threshold`, descending by score.
    #[must_use]
    pub fn find_all_matches<'a>(
        &self,
        query: &str,
        candidates: &'a [String],
        threshold: f64,
    ) -> Vec<(NameMatch, &'a str)> {
        let mut matches: Vec<(NameMatch, &str)> = candidates
            .iter()
            .filter_map(|cand| {
                self.match_name(query, cand, threshold)
                    .map(|m| (m, cand.as_str()))
            })
            .collect();
        matches.sort_by(|a, b| b.0.score.partial_cmp(&a.0.score).unwrap_or(std::cmp::Ordering::Equal));
        matches
    }

    /// Whether `a` and `b` denote the same person at the default threshold (0.7).
    #[must_use]
    pub fn is_same_person(&self, a: &str, b: &str) -> bool {
        self.match_name(a, b, 0.7).is_some()
    }
}

fn normalize_case(s: &str) -> String {
    s.trim().to_lowercase()
}

/// Collapses vowel runs, drops trailing h/a, unaspirates consonant
/// digraphs, folds sibilants, and normalises a handful of digraph
/// ambiguities that Roman transliteration of Devanagari leaves behind.
fn phonetic_normalize(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut chars = s.chars().peekable();
    while let Some(c) = chars.next() {
        out.push(c);
        while matches!(chars.peek(), Some(&n) if n == c && is_vowel(c)) {
            chars.next();
        }
    }

    let mut s = out;
    for (from, to) in [
        ("bh", "b"), ("dh", "d"), ("th", "t"), ("ph", "p"),
        ("gh", "g"), ("kh", "k"), ("ch", "c"), ("sh", "s"),
        ("ksh", "x"), ("jn", "gy"),
    ] {
        s = s.replace(from, to);
    }
    s = s.replace('w', "v");

    if s.ends_with('h') {
        s.pop();
    }
    if s.ends_with('a') && s.len() > 1 {
        s.pop();
    }

    s
}

fn is_vowel(c: char) -> bool {
    matches!(c, 'a' | 'e' | 'i' | 'o' | 'u')
}

/// Damerau-Levenshtein distance (optimal string alignment variant): insert,
/// delete, substitute, or swap one adjacent pair, each cost 1. The
/// transposition term is what lets step 5 of the pipeline recognise
/// "Nraesh" as a one-edit typo of "Naresh" rather than scoring it as two
/// substitutions.
fn levenshtein(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    let (alen, blen) = (a.len(), b.len());
    if alen == 0 {
        return blen;
    }
    if blen == 0 {
        return alen;
    }

    let mut d = vec![vec![0usize; blen + 1]; alen + 1];
    for (i, row) in d.iter_mut().enumerate() {
        row[0] = i;
    }
    for j in 0..=blen {
        d[0][j] = j;
    }

    for i in 1..=alen {
        for j in 1..=blen {
            let cost = if a[i - 1] == b[j - 1] { 0 } else { 1 };
            d[i][j] = (d[i - 1][j] + 1)
                .min(d[i][j - 1] + 1)
                .min(d[i - 1][j - 1] + cost);
            if i > 1 && j > 1 && a[i - 1] == b[j - 2] && a[i - 2] == b[j - 1] {
                d[i][j] = d[i][j].min(d[i - 2][j - 2] + 1);
            }
        }
    }

    d[alen][blen]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn default_matcher() -> FuzzyMatcher {
        let honorifics = vec![
            "ji", "bhai", "bhaiya", "bhaisahab", "sa", "saab", "sahib", "didi", "bhayya", "anna",
            "akka",
        ]
        .into_iter()
        .map(String::from)
        .collect();

        let mut nicknames = HashMap::new();
        nicknames.insert("rahul".to_string(), vec!["raju".to_string(), "rahu".to_string()]);
        nicknames.insert("deepak".to_string(), vec!["dipak".to_string(), "deepu".to_string()]);
        nicknames.insert("sandeep".to_string(), vec!["sandy".to_string(), "sandi".to_string()]);
        nicknames.insert("pradeep".to_string(), vec!["pradip".to_string(), "prads".to_string()]);

        FuzzyMatcher::new(honorifics, nicknames)
    }

    #[test]
    fn exact_match_scores_one() {
        let m = default_matcher();
        let r = m.match_name("Bharat", "Bharat", 0.7).unwrap();
        assert_eq!(r.score, 1.0);
        assert_eq!(r.match_type, MatchType::Exact);
    }

    #[test]
    fn honorific_is_stripped() {
        let m = default_matcher();
        let r = m.match_name("Bharat bhai", "Bharat", 0.7).unwrap();
        assert_eq!(r.score, 1.0);
        assert_eq!(r.match_type, MatchType::HonorificStripped);
    }

    #[test]
    fn nickname_links_score_above_threshold() {
        let m = default_matcher();
        let r = m.match_name("Dipak", "Deepak", 0.7).unwrap();
        assert!(r.score >= 0.9);
    }

    #[test]
    fn phonetic_variant_bharath_matches_bharat() {
        let m = default_matcher();
        let r = m.match_name("Bharath", "Bharat", 0.7);
        assert!(r.is_some());
    }

    #[test]
    fn unrelated_names_do_not_match() {
        let m = default_matcher();
        assert!(m.match_name("Rahul", "Priya", 0.7).is_none());
    }

    #[test]
    fn scoring_is_symmetric() {
        let m = default_matcher();
        let forward = m.match_name("Bharath", "Bharat", 0.0).unwrap().score;
        let backward = m.match_name("Bharat", "Bharath", 0.0).unwrap().score;
        assert!((forward - backward).abs() < 1e-9);
    }

    #[test]
    fn score_never_exceeds_bounds() {
        let m = default_matcher();
        for (a, b) in [("Rahul", "Raju"), ("X", "Y"), ("", "Rahul")] {
            if let Some(r) = m.match_name(a, b, 0.0) {
                assert!((0.0..=1.0).contains(&r.score));
            }
        }
    }

    #[test]
    fn find_all_matches_sorts_descending() {
        let m = default_matcher();
        let candidates = vec!["Deepak".to_string(), "Sandeep".to_string(), "Pradeep".to_string()];
        let matches = m.find_all_matches("Dipak", &candidates, 0.7);
        assert_eq!(matches[0].1, "Deepak");
    }

    #[test]
    fn is_same_person_dedupes_variants() {
        let m = default_matcher();
        assert!(m.is_same_person("Bharat", "Bharath"));
    }

    #[test]
    fn levenshtein_is_zero_for_equal_strings() {
        assert_eq!(levenshtein("ram", "ram"), 0);
    }

    #[test]
    fn levenshtein_single_substitution_is_one() {
        assert_eq!(levenshtein("ram", "rav"), 1);
    }

    #[test]
    fn levenshtein_adjacent_transposition_is_one() {
        assert_eq!(levenshtein("nares", "nraes"), 1);
    }

    #[test]
    fn transposed_name_matches_as_typo() {
        let m = default_matcher();
        let r = m.match_name("Naresh", "Nraesh", 0.7).unwrap();
        assert!(r.score >= 0.9);
        assert_eq!(r.match_type, MatchType::Typo);
    }
}
