// Target struct lookup with "did you mean" suggestions

use crate::error::CompileError;
use crate::schema::Struct;

pub fn find_struct<'a>(structs: &'a [Struct], name: &str) -> Result<&'a Struct, CompileError> {
    if let Some(found) = structs.iter().find(|s| s.name == name) {
        return Ok(found);
    }

    let suggestion = fuzzy_match(name, structs.iter().map(|s| s.name.as_str())).map(str::to_string);
    log::debug!("struct {} not found, closest match {:?}", name, suggestion);
    Err(CompileError::NotFound {
        name: name.to_string(),
        suggestion,
    })
}

/// Closest candidate by edit distance; ties go to the earliest candidate.
pub fn fuzzy_match<'c>(name: &str, candidates: impl IntoIterator<Item = &'c str>) -> Option<&'c str> {
    let mut best: Option<(&str, usize)> = None;
    for candidate in candidates {
        let distance = levenshtein(name, candidate);
        if best.is_none_or(|(_, best_distance)| distance < best_distance) {
            best = Some((candidate, distance));
        }
    }
    best.map(|(candidate, _)| candidate)
}

// Two-row Wagner-Fischer over chars
pub fn levenshtein(a: &str, b: &str) -> usize {
    let (long, short): (Vec<char>, Vec<char>) = if a.chars().count() >= b.chars().count() {
        (a.chars().collect(), b.chars().collect())
    } else {
        (b.chars().collect(), a.chars().collect())
    };

    if short.is_empty() {
        return long.len();
    }

    let mut previous: Vec<usize> = (0..=short.len()).collect();
    let mut current = Vec::with_capacity(short.len() + 1);
    for (i, c1) in long.iter().enumerate() {
        current.clear();
        current.push(i + 1);
        for (j, c2) in short.iter().enumerate() {
            let insertion = previous[j + 1] + 1;
            let deletion = current[j] + 1;
            let substitution = previous[j] + usize::from(c1 != c2);
            current.push(insertion.min(deletion).min(substitution));
        }
        std::mem::swap(&mut previous, &mut current);
    }

    previous[short.len()]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn named(names: &[&str]) -> Vec<Struct> {
        names.iter().map(|n| Struct::new(n)).collect()
    }

    #[test]
    fn exact_lookup() {
        let structs = named(&["Player", "Enemy"]);
        assert_eq!(find_struct(&structs, "Enemy").unwrap().name, "Enemy");
    }

    #[test]
    fn typo_suggests_closest() {
        let structs = named(&["Player", "Enemy"]);
        match find_struct(&structs, "Plyer") {
            Err(CompileError::NotFound { name, suggestion }) => {
                assert_eq!(name, "Plyer");
                assert_eq!(suggestion.as_deref(), Some("Player"));
            }
            other => panic!("expected NotFound, got {:?}", other),
        }
    }

    #[test]
    fn no_structs_means_no_suggestion() {
        match find_struct(&[], "Player") {
            Err(CompileError::NotFound { suggestion, .. }) => assert_eq!(suggestion, None),
            other => panic!("expected NotFound, got {:?}", other),
        }
    }

    #[test]
    fn ties_go_to_first_candidate() {
        assert_eq!(fuzzy_match("ab", ["ax", "ay", "ab1"]), Some("ax"));
        assert_eq!(fuzzy_match("ab", ["ay", "ax"]), Some("ay"));
    }

    #[test]
    fn levenshtein_distances() {
        assert_eq!(levenshtein("", ""), 0);
        assert_eq!(levenshtein("abc", ""), 3);
        assert_eq!(levenshtein("", "abc"), 3);
        assert_eq!(levenshtein("kitten", "sitting"), 3);
        assert_eq!(levenshtein("sitting", "kitten"), 3);
        assert_eq!(levenshtein("Plyer", "Player"), 1);
        assert_eq!(levenshtein("Plyer", "Enemy"), 5);
    }
}
