//! Relocation of source paths recorded at compile time.
//!
//! Debug symbols embed the source path as it was when the binary was compiled. By the time
//! the binary runs, the checkout may have moved, the build output may have been copied
//! elsewhere, or the compiler may have recorded a relative path. [`relocate`] suggests where
//! the file may live now, lazily and in order of preference, so the caller can stop at the
//! first candidate that exists.
//!
//! # Candidate Order
//!
//! For a rooted original path:
//! 1. the original path unchanged
//! 2. for every directory name shared by the base path (position `i`) and the original path
//!    (position `j`), the base path up to `i` followed by the original path from `j` on
//!
//! For a relative original path (after stripping a leading `./` and separator): the path
//! below the directory of the base path, below its parent and below its grandparent.
//!
//! Paths are split on both `\` and `/`, so symbols produced on Windows relocate onto Unix
//! style base paths and vice versa. Joined paths use the separator found in the base path.
//!
//! # Examples
//!
//! ```rust
//! use pdbscope::symbols::relocate::relocate;
//!
//! let candidates: Vec<String> = relocate(
//!     r"D:\checkout\App\bin\Debug\App.exe",
//!     r"C:\build\agent\App\Program.cs",
//! )
//! .collect();
//!
//! assert_eq!(candidates[0], r"C:\build\agent\App\Program.cs");
//! assert!(candidates.contains(&r"D:\checkout\App\Program.cs".to_string()));
//! ```

use std::collections::HashSet;

use crate::file::SourceFiles;

/// Parent levels tried for relative paths unless configured otherwise.
pub const DEFAULT_RELOCATION_DEPTH: usize = 2;

fn is_separator(c: char) -> bool {
    c == '\\' || c == '/'
}

/// `true` if `path` starts at a root: a leading separator or a drive prefix such as `C:`.
#[must_use]
pub fn is_rooted(path: &str) -> bool {
    let bytes = path.as_bytes();
    match bytes {
        [first, ..] if is_separator(char::from(*first)) => true,
        [drive, b':', ..] => drive.is_ascii_alphabetic(),
        _ => false,
    }
}

/// The final component of `path`, split on either separator.
#[must_use]
pub fn file_name(path: &str) -> &str {
    path.rsplit(is_separator).next().unwrap_or(path)
}

/// Unicode-aware case-insensitive comparison of two path strings.
#[must_use]
pub fn eq_ignore_case(left: &str, right: &str) -> bool {
    left.chars()
        .flat_map(char::to_lowercase)
        .eq(right.chars().flat_map(char::to_lowercase))
}

/// The directory part of `path`, keeping the separator of a bare root (`/`, `C:\`).
///
/// Returns `None` if `path` has no directory part or is a root itself.
fn parent_dir(path: &str) -> Option<&str> {
    let index = path.rfind(is_separator)?;
    let head = &path[..index];

    if head.is_empty() || (head.len() == 2 && head.ends_with(':')) {
        if index + 1 == path.len() {
            return None;
        }
        return Some(&path[..=index]);
    }

    Some(head)
}

fn separator_of(path: &str) -> char {
    path.chars()
        .find(|&c| is_separator(c))
        .unwrap_or(std::path::MAIN_SEPARATOR)
}

fn join_parts(base: &[&str], original: &[&str], separator: char) -> String {
    let mut joined = String::new();
    for (index, part) in base.iter().chain(original.iter()).enumerate() {
        if index > 0 {
            joined.push(separator);
        }
        joined.push_str(part);
    }
    joined
}

fn join(directory: &str, relative: &str, separator: char) -> String {
    let mut joined = String::with_capacity(directory.len() + relative.len() + 1);
    joined.push_str(directory);
    if !directory.ends_with(is_separator) {
        joined.push(separator);
    }
    joined.push_str(relative);
    joined
}

/// Suggests possible current locations of `original_path`.
///
/// `base_path` is the path of the binary the symbols belong to. See the module documentation
/// for the order of candidates. The iterator may yield duplicates.
#[must_use]
pub fn relocate<'a>(base_path: &'a str, original_path: &'a str) -> RelocatedPaths<'a> {
    relocate_with_depth(base_path, original_path, DEFAULT_RELOCATION_DEPTH)
}

/// Like [`relocate`], trying `depth` parent directories above the base directory for relative
/// paths instead of [`DEFAULT_RELOCATION_DEPTH`].
#[must_use]
pub fn relocate_with_depth<'a>(
    base_path: &'a str,
    original_path: &'a str,
    depth: usize,
) -> RelocatedPaths<'a> {
    let separator = separator_of(base_path);

    let state = if original_path.is_empty() {
        State::Done
    } else if is_rooted(original_path) {
        State::Original
    } else {
        let relative = original_path
            .strip_prefix("./")
            .or_else(|| original_path.strip_prefix(".\\"))
            .unwrap_or(original_path);
        let relative = relative.strip_prefix(is_separator).unwrap_or(relative);

        State::Parents {
            directory: Some(base_path),
            relative,
            remaining: depth + 1,
        }
    };

    RelocatedPaths {
        base_path,
        original_path,
        separator,
        state,
    }
}

enum State<'a> {
    Original,
    Joined {
        base: Vec<&'a str>,
        original: Vec<&'a str>,
        i: usize,
        j: usize,
    },
    Parents {
        directory: Option<&'a str>,
        relative: &'a str,
        remaining: usize,
    },
    Done,
}

/// Lazy sequence of relocation candidates, see [`relocate`].
pub struct RelocatedPaths<'a> {
    base_path: &'a str,
    original_path: &'a str,
    separator: char,
    state: State<'a>,
}

impl Iterator for RelocatedPaths<'_> {
    type Item = String;

    fn next(&mut self) -> Option<String> {
        loop {
            match &mut self.state {
                State::Done => return None,
                State::Original => {
                    self.state = State::Joined {
                        base: self.base_path.split(is_separator).collect(),
                        original: self.original_path.split(is_separator).collect(),
                        i: 0,
                        j: 0,
                    };
                    return Some(self.original_path.to_string());
                }
                State::Joined {
                    base,
                    original,
                    i,
                    j,
                } => {
                    if *i >= base.len() {
                        self.state = State::Done;
                        continue;
                    }
                    if *j >= original.len() {
                        *i += 1;
                        *j = 0;
                        continue;
                    }

                    let (bi, oj) = (*i, *j);
                    *j += 1;

                    let base_part = base[bi];
                    if !base_part.is_empty() && eq_ignore_case(base_part, original[oj]) {
                        return Some(join_parts(&base[..bi], &original[oj..], self.separator));
                    }
                }
                State::Parents {
                    directory,
                    relative,
                    remaining,
                } => {
                    if *remaining == 0 {
                        self.state = State::Done;
                        continue;
                    }
                    *remaining -= 1;

                    let parent = directory.and_then(parent_dir);
                    *directory = parent;
                    match parent {
                        Some(dir) if !dir.is_empty() => {
                            return Some(join(dir, relative, self.separator));
                        }
                        Some(_) => {}
                        None => self.state = State::Done,
                    }
                }
            }
        }
    }
}

/// Returns the first relocation candidate that exists in `files` and passes `accept`.
///
/// Candidates are deduplicated; each is checked at most once.
pub fn source_code_path<F>(
    files: &dyn SourceFiles,
    base_path: &str,
    original_path: &str,
    depth: usize,
    accept: F,
) -> Option<String>
where
    F: Fn(&str) -> bool,
{
    let mut seen = HashSet::new();

    for candidate in relocate_with_depth(base_path, original_path, depth) {
        if !seen.insert(candidate.clone()) {
            continue;
        }

        if files.exists(&candidate) {
            if accept(&candidate) {
                log::debug!("Relocated {} to {}", original_path, candidate);
                return Some(candidate);
            }
            log::debug!("Rejected relocation candidate {}", candidate);
        }
    }

    log::debug!(
        "No relocation candidate found for {} below {}",
        original_path,
        base_path
    );
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::file::MemoryFiles;

    #[test]
    fn rooted_detection() {
        assert!(is_rooted("/usr/src/a.cs"));
        assert!(is_rooted(r"\share\a.cs"));
        assert!(is_rooted(r"C:\src\a.cs"));
        assert!(is_rooted("c:a.cs"));
        assert!(!is_rooted("src/a.cs"));
        assert!(!is_rooted(r".\a.cs"));
        assert!(!is_rooted(""));
        assert!(!is_rooted("1:x"));
    }

    #[test]
    fn file_names() {
        assert_eq!(file_name(r"C:\src\App\Program.cs"), "Program.cs");
        assert_eq!(file_name("/src/App/Program.cs"), "Program.cs");
        assert_eq!(file_name("Program.cs"), "Program.cs");
        assert_eq!(file_name("/src/"), "");
    }

    #[test]
    fn case_insensitive_compare() {
        assert!(eq_ignore_case("Program.CS", "program.cs"));
        assert!(eq_ignore_case("ÄPFEL", "äpfel"));
        assert!(!eq_ignore_case("Program.cs", "Program.vb"));
    }

    #[test]
    fn parent_directories() {
        assert_eq!(parent_dir("/a/b/app.exe"), Some("/a/b"));
        assert_eq!(parent_dir("/app.exe"), Some("/"));
        assert_eq!(parent_dir("/"), None);
        assert_eq!(parent_dir(r"C:\app.exe"), Some(r"C:\"));
        assert_eq!(parent_dir(r"C:\"), None);
        assert_eq!(parent_dir("app.exe"), None);
    }

    #[test]
    fn empty_original_yields_nothing() {
        assert_eq!(relocate("/bin/app.exe", "").count(), 0);
    }

    #[test]
    fn absolute_original_first() {
        let candidates: Vec<_> =
            relocate("/home/dev/App/bin/App.dll", "/build/App/src/Program.cs").collect();

        assert_eq!(candidates[0], "/build/App/src/Program.cs");
        assert_eq!(candidates[1], "/home/dev/App/src/Program.cs");
        assert_eq!(candidates.len(), 2);
    }

    #[test]
    fn absolute_joins_every_shared_segment() {
        let candidates: Vec<_> = relocate(
            r"D:\work\App\bin\App.exe",
            r"C:\agent\App\App\Program.cs",
        )
        .collect();

        assert_eq!(
            candidates,
            vec![
                r"C:\agent\App\App\Program.cs".to_string(),
                r"D:\work\App\App\Program.cs".to_string(),
                r"D:\work\App\Program.cs".to_string(),
            ]
        );
    }

    #[test]
    fn absolute_matches_ignore_case() {
        let candidates: Vec<_> =
            relocate(r"D:\Work\APP\bin\App.exe", r"C:\src\app\Program.cs").collect();
        assert_eq!(candidates[1], r"D:\Work\app\Program.cs");
    }

    #[test]
    fn windows_symbols_on_unix_base() {
        let candidates: Vec<_> =
            relocate("/srv/checkout/App/bin/App.dll", r"C:\ci\App\Program.cs").collect();
        assert_eq!(candidates[1], "/srv/checkout/App/Program.cs");
    }

    #[test]
    fn relative_three_levels() {
        let candidates: Vec<_> = relocate("/a/b/c/bin/App.dll", "./src/Program.cs").collect();

        assert_eq!(
            candidates,
            vec![
                "/a/b/c/bin/src/Program.cs".to_string(),
                "/a/b/c/src/Program.cs".to_string(),
                "/a/b/src/Program.cs".to_string(),
            ]
        );
    }

    #[test]
    fn relative_windows_prefix_stripped() {
        let candidates: Vec<_> = relocate(r"C:\a\b\App.exe", r".\Program.cs").collect();

        assert_eq!(candidates.len(), 3);
        assert_eq!(candidates[0], r"C:\a\b\Program.cs");
        assert_eq!(candidates[2], r"C:\Program.cs");
        assert!(candidates.iter().all(|c| c.ends_with(r"\Program.cs")));
    }

    #[test]
    fn relative_shallow_base_stops_early() {
        let candidates: Vec<_> = relocate("/App.dll", "Program.cs").collect();
        assert_eq!(candidates, vec!["/Program.cs".to_string()]);

        assert_eq!(relocate("App.dll", "Program.cs").count(), 0);
    }

    #[test]
    fn relative_custom_depth() {
        assert_eq!(
            relocate_with_depth("/a/b/c/d/App.dll", "x.cs", 0).collect::<Vec<_>>(),
            vec!["/a/b/c/d/x.cs".to_string()]
        );
        assert_eq!(relocate_with_depth("/a/b/c/d/App.dll", "x.cs", 3).count(), 4);
    }

    #[test]
    fn lazy_iteration() {
        let mut candidates = relocate(r"D:\a\b\c\d\App.exe", r"C:\a\b\c\d\Program.cs");
        assert_eq!(candidates.next().as_deref(), Some(r"C:\a\b\c\d\Program.cs"));
        assert_eq!(candidates.next().as_deref(), Some(r"D:\a\b\c\d\Program.cs"));
    }

    #[test]
    fn first_existing_candidate() {
        let files = MemoryFiles::new();
        files.insert("/home/dev/App/src/Program.cs", Vec::new());

        let found = source_code_path(
            &files,
            "/home/dev/App/bin/App.dll",
            "/build/App/src/Program.cs",
            DEFAULT_RELOCATION_DEPTH,
            |_| true,
        );
        assert_eq!(found.as_deref(), Some("/home/dev/App/src/Program.cs"));

        files.insert("/build/App/src/Program.cs", Vec::new());
        let found = source_code_path(
            &files,
            "/home/dev/App/bin/App.dll",
            "/build/App/src/Program.cs",
            DEFAULT_RELOCATION_DEPTH,
            |_| true,
        );
        assert_eq!(found.as_deref(), Some("/build/App/src/Program.cs"));
    }

    #[test]
    fn rejected_candidates_are_skipped() {
        let files = MemoryFiles::new();
        files.insert("/build/App/src/Program.cs", Vec::new());
        files.insert("/home/dev/App/src/Program.cs", Vec::new());

        let found = source_code_path(
            &files,
            "/home/dev/App/bin/App.dll",
            "/build/App/src/Program.cs",
            DEFAULT_RELOCATION_DEPTH,
            |candidate| candidate.starts_with("/home"),
        );
        assert_eq!(found.as_deref(), Some("/home/dev/App/src/Program.cs"));

        let missing = source_code_path(
            &files,
            "/home/dev/App/bin/App.dll",
            "/elsewhere/Other.cs",
            DEFAULT_RELOCATION_DEPTH,
            |_| true,
        );
        assert!(missing.is_none());
    }
}
