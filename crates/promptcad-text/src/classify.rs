use std::sync::LazyLock;

use promptcad_core::ShapeTag;
use regex::Regex;
use serde::Serialize;

static SHAPE_KEYWORDS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\b(?:toy[\s_-]+cars?|cars?|box(?:es)?|spheres?|cylinders?|cones?|pyramids?|torus(?:es)?|tori)\b",
    )
    .expect("valid shape keyword pattern")
});

static WORDS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\p{Alphabetic}+").expect("valid word pattern"));

const SUGGESTIONS: [&str; 7] = ["box", "sphere", "cylinder", "cone", "pyramid", "torus", "car"];

/// The shape keyword that decided a classification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ShapeMatch {
    pub shape: ShapeTag,
    pub keyword: String,
    /// Byte offset of the keyword in the input.
    pub offset: usize,
}

/// Finds the leftmost shape keyword, matched case-insensitively on word
/// boundaries. Plurals count; `car` inside `carpet` does not.
pub fn find_shape(text: &str) -> Option<ShapeMatch> {
    let found = SHAPE_KEYWORDS.find(text)?;
    let keyword = found.as_str().to_lowercase();
    let shape = shape_for_keyword(&keyword)?;
    Some(ShapeMatch {
        shape,
        keyword,
        offset: found.start(),
    })
}

/// Shape class of the first keyword in `text`, or `None` when nothing in the
/// text names a supported shape.
pub fn classify(text: &str) -> Option<ShapeTag> {
    find_shape(text).map(|found| found.shape)
}

/// Closest shape keyword to a misspelled word, e.g. `sphree` -> `sphere`.
///
/// Only words sharing the keyword's first letter and within two edits are
/// considered, so ordinary prose does not produce suggestions.
pub fn suggest_shape(text: &str) -> Option<&'static str> {
    let mut best: Option<(&'static str, usize)> = None;

    for word in WORDS.find_iter(text) {
        let word = word.as_str().to_lowercase();
        if word.chars().count() < 4 {
            continue;
        }
        for candidate in SUGGESTIONS {
            if word.chars().next() != candidate.chars().next() {
                continue;
            }
            let distance = levenshtein(&word, candidate);
            if distance == 0 || distance > 2 || distance * 2 >= candidate.len() {
                continue;
            }
            match best {
                Some((_, best_distance)) if distance >= best_distance => {}
                _ => best = Some((candidate, distance)),
            }
        }
    }

    best.map(|(candidate, _)| candidate)
}

fn shape_for_keyword(keyword: &str) -> Option<ShapeTag> {
    let shape = if keyword.starts_with("toy") || keyword.starts_with("car") {
        ShapeTag::Composite
    } else if keyword.starts_with("box") {
        ShapeTag::Box
    } else if keyword.starts_with("sphere") {
        ShapeTag::Sphere
    } else if keyword.starts_with("cylinder") {
        ShapeTag::Cylinder
    } else if keyword.starts_with("cone") {
        ShapeTag::Cone
    } else if keyword.starts_with("pyramid") {
        ShapeTag::Pyramid
    } else if keyword.starts_with("tor") {
        ShapeTag::Torus
    } else {
        return None;
    };
    Some(shape)
}

fn levenshtein(a: &str, b: &str) -> usize {
    let b_len = b.chars().count();
    let mut prev: Vec<usize> = (0..=b_len).collect();
    let mut curr = vec![0usize; b_len + 1];

    for (i, ca) in a.chars().enumerate() {
        curr[0] = i + 1;
        for (j, cb) in b.chars().enumerate() {
            let deletion = prev[j + 1] + 1;
            let insertion = curr[j] + 1;
            let substitution = prev[j] + usize::from(ca != cb);
            curr[j + 1] = deletion.min(insertion).min(substitution);
        }
        std::mem::swap(&mut prev, &mut curr);
    }

    prev[b_len]
}

#[cfg(test)]
mod tests {
    use promptcad_core::ShapeTag;

    use super::{classify, find_shape, suggest_shape};

    #[test]
    fn classifies_keyword_in_prompt() {
        assert_eq!(
            classify("Create a cylinder with radius 5mm"),
            Some(ShapeTag::Cylinder)
        );
        assert_eq!(classify("A TORUS please"), Some(ShapeTag::Torus));
        assert_eq!(classify("two boxes stacked"), Some(ShapeTag::Box));
        assert_eq!(classify("Make me a toy car"), Some(ShapeTag::Composite));
    }

    #[test]
    fn unclassified_text_is_a_normal_outcome() {
        assert_eq!(classify("no shape words here"), None);
        assert_eq!(classify("asdfasdf"), None);
        assert_eq!(classify(""), None);
    }

    #[test]
    fn leftmost_keyword_wins() {
        assert_eq!(
            classify("a cone sitting on top of a box"),
            Some(ShapeTag::Cone)
        );
        assert_eq!(
            classify("a box with a cone on top"),
            Some(ShapeTag::Box)
        );
        let found = find_shape("put a sphere inside the torus").expect("sphere is named");
        assert_eq!(found.keyword, "sphere");
        assert_eq!(found.offset, 6);
    }

    #[test]
    fn keywords_match_whole_words_only() {
        assert_eq!(classify("a carpet sample"), None);
        assert_eq!(classify("conical shapes and boxy things"), None);
        assert_eq!(classify("scary"), None);
    }

    #[test]
    fn suggests_close_misspellings() {
        assert_eq!(suggest_shape("make a sphree of 5mm"), Some("sphere"));
        assert_eq!(suggest_shape("a cylnder"), Some("cylinder"));
        assert_eq!(suggest_shape("asdfasdf"), None);
        assert_eq!(suggest_shape("no shape words here"), None);
    }
}
