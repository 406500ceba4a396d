//! intent.rs — keyword heuristic deciding between the text and image paths.
//!
//! Known limitation: no negation handling ("şəkil çəkmə" still matches) and
//! no disambiguation for mixed-language input. False positives and negatives
//! are accepted.
//!
//! Unicode note: a dotted capital İ (U+0130) lowercases to "i" plus the
//! combining dot U+0307, not to plain "i", so "ŞƏKİL" becomes "şəki̇l". The
//! subject list carries that combining-dot stem alongside the plain one.

/// Action verbs that suggest the user wants something produced.
const ACTION_VERBS: &[&str] = &[
    "çək", "yarat", "düzəlt", "hazırla",
    "draw", "generate", "create", "make", "paint",
    "нарисуй", "создай", "сделай",
    "çiz", "oluştur",
];

/// Subjects that suggest the produced thing is an image. Stems are used so
/// inflected forms match ("şəklini" contains "şəkl").
const IMAGE_SUBJECTS: &[&str] = &[
    "şəkil", "şəki\u{307}l", "şəkl", "rəsm", "foto",
    "image", "picture", "photo", "drawing",
    "картин", "изображени", "рисун",
    "resim", "görsel",
];

/// True iff the text contains at least one action verb AND at least one
/// image subject, case-insensitively. Pure function, no confidence score.
pub fn is_image_request(text: &str) -> bool {
    let lowered = text.to_lowercase();
    let has_verb = ACTION_VERBS.iter().any(|verb| lowered.contains(verb));
    let has_subject = IMAGE_SUBJECTS.iter().any(|subject| lowered.contains(subject));
    has_verb && has_subject
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn azerbaijani_draw_request_matches() {
        assert!(is_image_request("mənə Bakının şəklini çək"));
    }

    #[test]
    fn plain_question_does_not_match() {
        assert!(!is_image_request("necəsən"));
    }

    #[test]
    fn verb_without_subject_does_not_match() {
        assert!(!is_image_request("mənə plan çək"));
    }

    #[test]
    fn subject_without_verb_does_not_match() {
        assert!(!is_image_request("bu şəkil gözəldir"));
    }

    #[test]
    fn english_and_russian_requests_match() {
        assert!(is_image_request("draw me a picture of a cat"));
        assert!(is_image_request("нарисуй картину заката"));
    }

    #[test]
    fn casing_is_irrelevant() {
        let samples = [
            "DRAW ME A PICTURE",
            "draw me a picture",
            "Mənə şəkil çək",
            "necəsən",
        ];
        for s in samples {
            assert_eq!(is_image_request(s), is_image_request(&s.to_uppercase()));
        }
    }

    #[test]
    fn dotted_capital_i_input_still_matches() {
        // U+0130 lowercases to "i" + combining U+0307.
        let shouted = "Ş\u{018F}K\u{0130}L Ç\u{018F}K";
        assert!(is_image_request(shouted));
    }

    #[test]
    fn negated_request_still_matches_by_design_limitation() {
        // Documented false positive: the heuristic has no negation handling.
        assert!(is_image_request("don't draw a picture"));
    }
}
