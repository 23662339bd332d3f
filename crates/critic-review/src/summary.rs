//! Rendering of per-file reviews into the single comment posted on the PR.

use std::fmt::Write;

use critic_core::FileReview;

const HEADING: &str = "# Pull Request Review Summary";
const EMPTY_REVIEW: &str = "No review generated";
const RECOMMENDATIONS: &[&str] = &[
    "- Keep code consistent with project standards",
    "- Address any security concerns highlighted above",
    "- Consider performance implications of changes",
    "- Ensure proper error handling is in place",
];
const CLOSING: &str = "Please review and address the feedback above.";

/// Compose the Markdown summary for an ordered sequence of reviews.
///
/// Each review gets a numbered section (1-based, input order). The
/// recommendations block at the end is the same for every call.
///
/// # Examples
///
/// ```
/// use critic_core::FileReview;
/// use critic_review::summary::compose;
///
/// let reviews = vec![FileReview {
///     filename: "src/lib.rs".into(),
///     review_text: "Looks fine.".into(),
///     model_identifier: "gpt-4".into(),
///     tokens_used: 10,
/// }];
/// let summary = compose(&reviews);
/// assert!(summary.starts_with("# Pull Request Review Summary"));
/// assert!(summary.contains("## File 1: src/lib.rs\nLooks fine."));
/// assert!(summary.contains("## Overall Recommendations"));
/// ```
pub fn compose(reviews: &[FileReview]) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{HEADING}\n");

    for (idx, review) in reviews.iter().enumerate() {
        let text = if review.review_text.trim().is_empty() {
            EMPTY_REVIEW
        } else {
            review.review_text.as_str()
        };
        let _ = writeln!(out, "## File {}: {}", idx + 1, review.filename);
        let _ = writeln!(out, "{text}\n");
    }

    out.push_str(&recommendations());
    out
}

fn recommendations() -> String {
    let mut out = String::from("\n## Overall Recommendations\n### Key Points:\n");
    for point in RECOMMENDATIONS {
        out.push_str(point);
        out.push('\n');
    }
    out.push('\n');
    out.push_str(CLOSING);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn review(name: &str, text: &str) -> FileReview {
        FileReview {
            filename: name.into(),
            review_text: text.into(),
            model_identifier: "gpt-4".into(),
            tokens_used: 1,
        }
    }

    #[test]
    fn empty_input_has_only_heading_and_recommendations() {
        let summary = compose(&[]);
        assert!(summary.starts_with(HEADING));
        assert!(!summary.contains("## File"));
        assert!(summary.contains("## Overall Recommendations"));
        assert!(summary.ends_with(CLOSING));
    }

    #[test]
    fn sections_are_numbered_in_input_order() {
        let reviews = vec![
            review("z/last.rs", "z"),
            review("a/first.rs", "a"),
            review("m/middle.rs", "m"),
        ];
        let summary = compose(&reviews);
        assert_eq!(summary.matches("## File ").count(), 3);

        let positions: Vec<usize> = ["## File 1: z/last.rs", "## File 2: a/first.rs", "## File 3: m/middle.rs"]
            .iter()
            .map(|h| summary.find(h).expect("section present"))
            .collect();
        assert!(positions.windows(2).all(|w| w[0] < w[1]));
        assert!(positions[2] < summary.find("## Overall Recommendations").unwrap());
    }

    #[test]
    fn filenames_are_verbatim() {
        let odd = "src/weird name [v2] *.rs";
        let summary = compose(&[review(odd, "text")]);
        assert!(summary.contains(&format!("## File 1: {odd}\n")));
    }

    #[test]
    fn empty_review_text_uses_placeholder() {
        let summary = compose(&[review("a.rs", ""), review("b.rs", "  \n")]);
        assert_eq!(summary.matches(EMPTY_REVIEW).count(), 2);
    }

    #[test]
    fn recommendations_are_static() {
        let a = compose(&[review("a.rs", "one")]);
        let b = compose(&[review("b.rs", "two"), review("c.rs", "three")]);
        let tail_a = &a[a.find("## Overall Recommendations").unwrap()..];
        let tail_b = &b[b.find("## Overall Recommendations").unwrap()..];
        assert_eq!(tail_a, tail_b);
        for point in RECOMMENDATIONS {
            assert!(tail_a.contains(point));
        }
    }

    #[test]
    fn exact_layout() {
        let summary = compose(&[review("a.rs", "Fix the loop.")]);
        let expected = "# Pull Request Review Summary\n\n\
                        ## File 1: a.rs\n\
                        Fix the loop.\n\n\
                        \n## Overall Recommendations\n\
                        ### Key Points:\n\
                        - Keep code consistent with project standards\n\
                        - Address any security concerns highlighted above\n\
                        - Consider performance implications of changes\n\
                        - Ensure proper error handling is in place\n\
                        \n\
                        Please review and address the feedback above.";
        assert_eq!(summary, expected);
    }
}
