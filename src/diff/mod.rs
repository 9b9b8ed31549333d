//! Line-level diff records for previewing proposed file changes.
//!
//! Rendering is pure and deterministic: the same `(before, after)` pair
//! always yields the same record sequence, and concatenating one side of the
//! records reproduces that side's input byte for byte.

use similar::{ChangeTag, TextDiff};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiffKind {
    Added,
    Removed,
    Context,
}

/// One line of a rendered diff. `text` keeps the source line verbatim,
/// trailing newline included when the input had one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiffLine {
    pub kind: DiffKind,
    pub text: String,
}

/// Line diff from `before` to `after`. An empty `before` (file creation)
/// renders as all-added lines.
pub fn render(before: &str, after: &str) -> Vec<DiffLine> {
    let diff = TextDiff::from_lines(before, after);

    diff.iter_all_changes()
        .map(|change| {
            let kind = match change.tag() {
                ChangeTag::Delete => DiffKind::Removed,
                ChangeTag::Insert => DiffKind::Added,
                ChangeTag::Equal => DiffKind::Context,
            };
            DiffLine {
                kind,
                text: change.value().to_string(),
            }
        })
        .collect()
}

/// Reassemble the post-change side (added + context lines).
pub fn reconstruct_after(lines: &[DiffLine]) -> String {
    reconstruct(lines, DiffKind::Added)
}

/// Reassemble the pre-change side (removed + context lines).
pub fn reconstruct_before(lines: &[DiffLine]) -> String {
    reconstruct(lines, DiffKind::Removed)
}

fn reconstruct(lines: &[DiffLine], keep: DiffKind) -> String {
    lines
        .iter()
        .filter(|line| line.kind == keep || line.kind == DiffKind::Context)
        .map(|line| line.text.as_str())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_creation_renders_all_added() {
        let lines = render("", "fn main() {}\n");
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].kind, DiffKind::Added);
        assert_eq!(lines[0].text, "fn main() {}\n");
    }

    #[test]
    fn identical_inputs_render_all_context() {
        let content = "a\nb\nc\n";
        let lines = render(content, content);
        assert!(lines.iter().all(|l| l.kind == DiffKind::Context));
    }

    #[test]
    fn both_sides_reconstruct_exactly() {
        let cases = [
            ("", "new file\n"),
            ("a\nb\nc\n", "a\nx\nc\n"),
            ("one\ntwo\n", "one\ntwo\nthree\n"),
            ("keep\ndrop\n", "keep\n"),
            ("no trailing newline", "still no trailing newline"),
            ("mixed\nend", "mixed\nend\nmore"),
        ];

        for (before, after) in cases {
            let lines = render(before, after);
            assert_eq!(reconstruct_after(&lines), after, "after side for {before:?}");
            assert_eq!(
                reconstruct_before(&lines),
                before,
                "before side for {after:?}"
            );
        }
    }

    #[test]
    fn rendering_is_deterministic() {
        let before = "alpha\nbeta\ngamma\n";
        let after = "alpha\nBETA\ngamma\ndelta\n";
        assert_eq!(render(before, after), render(before, after));
    }

    #[test]
    fn single_line_substitution_is_remove_then_add() {
        let lines = render("let x = 1;\n", "let x = 2;\n");
        let kinds: Vec<DiffKind> = lines.iter().map(|l| l.kind).collect();
        assert_eq!(kinds, vec![DiffKind::Removed, DiffKind::Added]);
    }
}
