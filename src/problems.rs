use std::fs;
use std::path::Path;

use include_dir::{include_dir, Dir};

use crate::error::StoreResult;
use crate::prompt::Problem;
use crate::store::RecordStore;

static PROBLEM_DIR: Dir = include_dir!("$CARGO_MANIFEST_DIR/problems");

/// Supplies problems to the app; the engine itself never reads them from here.
pub trait ProblemSource {
    fn problems(&self) -> Vec<Problem>;
}

/// Problems compiled into the binary from `problems/*.txt`.
///
/// The file stem is the id, the first line the title, the rest the text
/// (minus the single trailing newline editors add).
#[derive(Debug, Clone, Copy, Default)]
pub struct BuiltinProblems;

impl ProblemSource for BuiltinProblems {
    fn problems(&self) -> Vec<Problem> {
        let mut problems: Vec<Problem> = PROBLEM_DIR
            .files()
            .filter(|f| f.path().extension().is_some_and(|ext| ext == "txt"))
            .filter_map(|f| {
                let id = f.path().file_stem()?.to_str()?;
                let contents = f.contents_utf8()?;
                Some(parse_problem(id, contents))
            })
            .collect();
        problems.sort_by(|a, b| a.id.cmp(&b.id));
        problems
    }
}

impl ProblemSource for RecordStore {
    fn problems(&self) -> Vec<Problem> {
        RecordStore::problems(self).to_vec()
    }
}

pub fn parse_problem(id: &str, contents: &str) -> Problem {
    let (title, text) = contents.split_once('\n').unwrap_or((contents, ""));
    let text = text.strip_suffix('\n').unwrap_or(text);
    Problem::new(id, title.trim(), text)
}

/// Reads a JSON array of problems.
pub fn load_problems_file(path: &Path) -> StoreResult<Vec<Problem>> {
    let bytes = fs::read(path)?;
    Ok(serde_json::from_slice(&bytes)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_builtin_problems_are_sorted_and_nonempty() {
        let problems = BuiltinProblems.problems();
        assert!(problems.len() >= 3);
        assert!(problems.windows(2).all(|w| w[0].id < w[1].id));
        assert!(problems.iter().all(|p| !p.title.is_empty() && !p.text.is_empty()));
    }

    #[test]
    fn test_builtin_code_problem_keeps_indentation() {
        let problems = BuiltinProblems.problems();
        let fizz = problems.iter().find(|p| p.id == "03-fizzbuzz").unwrap();
        assert!(fizz.text.contains("\n    match"));
        assert!(!fizz.text.ends_with('\n'));
    }

    #[test]
    fn test_parse_problem() {
        let p = parse_problem("x", "Title\nline one\n  line two\n");
        assert_eq!(p.title, "Title");
        assert_eq!(p.text, "line one\n  line two");

        let only_title = parse_problem("y", "Just a title");
        assert_eq!(only_title.text, "");
    }

    #[test]
    fn test_load_problems_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("problems.json");
        fs::write(&path, r#"[{"id":"a","title":"A","text":"alpha"}]"#).unwrap();
        let problems = load_problems_file(&path).unwrap();
        assert_eq!(problems, vec![Problem::new("a", "A", "alpha")]);
    }

    #[test]
    fn test_load_missing_problems_file_errors() {
        let dir = tempdir().unwrap();
        assert!(load_problems_file(&dir.path().join("nope.json")).is_err());
    }
}
