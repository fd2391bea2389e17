//! Input file resolution and output path layout.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use globset::GlobBuilder;
use lacquer_core::{normalize, relative_path};
use walkdir::WalkDir;

/// Expand file paths and glob patterns (relative to `cwd`) into a sorted,
/// deduplicated list of absolute file paths.
pub fn resolve_patterns(patterns: &[String], cwd: &Path) -> Result<Vec<PathBuf>> {
    let mut files = BTreeSet::new();

    for pattern in patterns {
        let pattern = pattern.strip_prefix("./").unwrap_or(pattern);
        let before = files.len();

        if is_glob(pattern) {
            let matcher = GlobBuilder::new(pattern)
                .literal_separator(true)
                .build()
                .with_context(|| format!("Invalid glob pattern: {}", pattern))?
                .compile_matcher();
            let absolute = Path::new(pattern).is_absolute();

            for entry in WalkDir::new(cwd.join(glob_root(pattern)))
                .follow_links(true)
                .into_iter()
                .filter_map(|e| e.ok())
                .filter(|e| e.file_type().is_file())
            {
                let path = entry.path();
                let candidate = if absolute {
                    path
                } else {
                    path.strip_prefix(cwd).unwrap_or(path)
                };

                if matcher.is_match(candidate) {
                    files.insert(normalize(path));
                }
            }
        } else {
            let path = cwd.join(pattern);
            if path.is_file() {
                files.insert(normalize(&path));
            }
        }

        if files.len() == before {
            tracing::warn!("No files match {}", pattern);
        }
    }

    Ok(files.into_iter().collect())
}

fn is_glob(pattern: &str) -> bool {
    pattern.contains(['*', '?', '[', '{'])
}

/// Directory a glob walk starts from: everything before the first segment
/// containing a glob metacharacter.
fn glob_root(pattern: &str) -> PathBuf {
    let Some(first_meta) = pattern.find(['*', '?', '[', '{']) else {
        return PathBuf::from(pattern);
    };

    match pattern[..first_meta].rfind('/') {
        Some(0) => PathBuf::from("/"),
        Some(idx) => PathBuf::from(&pattern[..idx]),
        None => PathBuf::from("."),
    }
}

/// Where the stylesheet for `input` is written: the input's directory
/// relative to `cwd`, mirrored under `out_dir`, with a `.css` extension.
pub fn output_filename(input: &Path, out_dir: &Path, cwd: &Path) -> PathBuf {
    let input_dir = normalize(input.parent().unwrap_or(Path::new("")));
    let folder = relative_path(&normalize(cwd), &input_dir).unwrap_or_else(|| ".".to_string());

    let mut css_name = input.file_stem().unwrap_or_default().to_os_string();
    css_name.push(".css");

    normalize(&cwd.join(out_dir).join(folder).join(css_name))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::fs;
    use tempfile::TempDir;

    fn touch(root: &Path, relative: &str) {
        let path = root.join(relative);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, "").unwrap();
    }

    fn project() -> TempDir {
        let dir = TempDir::new().unwrap();
        touch(dir.path(), "src/a.js");
        touch(dir.path(), "src/nested/b.tsx");
        touch(dir.path(), "src/c.css");
        touch(dir.path(), "lib/d.js");
        dir
    }

    fn names(files: &[PathBuf], root: &Path) -> Vec<String> {
        files
            .iter()
            .map(|f| f.strip_prefix(root).unwrap().to_string_lossy().replace('\\', "/"))
            .collect()
    }

    #[test]
    fn finds_glob_root() {
        assert_eq!(glob_root("src/**/*.js"), PathBuf::from("src"));
        assert_eq!(glob_root("src/components/*.tsx"), PathBuf::from("src/components"));
        assert_eq!(glob_root("*.js"), PathBuf::from("."));
        assert_eq!(glob_root("/abs/**/*.js"), PathBuf::from("/abs"));
        assert_eq!(glob_root("src/a.js"), PathBuf::from("src/a.js"));
    }

    #[test]
    fn expands_globs() {
        let dir = project();

        let files = resolve_patterns(&["src/**/*.{js,tsx}".to_string()], dir.path()).unwrap();

        assert_eq!(names(&files, dir.path()), vec!["src/a.js", "src/nested/b.tsx"]);
    }

    #[test]
    fn keeps_star_within_one_directory() {
        let dir = project();

        let files = resolve_patterns(&["./src/*".to_string()], dir.path()).unwrap();

        assert_eq!(names(&files, dir.path()), vec!["src/a.js", "src/c.css"]);
    }

    #[test]
    fn deduplicates_and_sorts_across_patterns() {
        let dir = project();
        let patterns = vec![
            "src/a.js".to_string(),
            "**/*.js".to_string(),
            "missing.js".to_string(),
        ];

        let files = resolve_patterns(&patterns, dir.path()).unwrap();

        assert_eq!(names(&files, dir.path()), vec!["lib/d.js", "src/a.js"]);
        assert!(files.iter().all(|f| f.is_absolute()));
    }

    #[test]
    fn rejects_invalid_globs() {
        let dir = project();

        assert!(resolve_patterns(&["src/[a.js".to_string()], dir.path()).is_err());
    }

    #[test]
    fn mirrors_source_tree_under_out_dir() {
        let cwd = Path::new("/proj");

        assert_eq!(
            output_filename(Path::new("/proj/src/ui/title.js"), Path::new("dist"), cwd),
            PathBuf::from("/proj/dist/src/ui/title.css")
        );
        assert_eq!(
            output_filename(Path::new("/proj/src/title.tsx"), Path::new("."), cwd),
            PathBuf::from("/proj/src/title.css")
        );
        assert_eq!(
            output_filename(Path::new("/proj/title.js"), Path::new("/out"), cwd),
            PathBuf::from("/out/title.css")
        );
    }

    #[test]
    fn keeps_files_outside_cwd_relative() {
        assert_eq!(
            output_filename(
                Path::new("/shared/title.js"),
                Path::new("dist"),
                Path::new("/proj")
            ),
            PathBuf::from("/proj/shared/title.css")
        );
    }
}
