//! Relative asset path rewriting for extracted CSS.
//!
//! Extracted CSS is written next to the output stylesheet, not next to the
//! source file it was authored in, so relative `url(...)` references have to be
//! re-expressed from the stylesheet's directory.

use std::borrow::Cow;
use std::path::{Component, Path, PathBuf};

use regex::{Captures, Regex};
use std::sync::LazyLock;

static RELATIVE_URL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"\burl\(\s*(['"]?)(\.{1,2}/[^'")]*)(['"]?)\s*\)"#).expect("Invalid url regex")
});

/// Rewrites relative `url(...)` references from one directory to another.
#[derive(Debug, Clone)]
pub struct AssetRewriter {
    input_dir: PathBuf,
    output_dir: PathBuf,
}

impl AssetRewriter {
    /// Create a rewriter for CSS authored in `input_filename` and written to `output_filename`.
    pub fn new(input_filename: &Path, output_filename: &Path) -> Self {
        Self {
            input_dir: parent_dir(input_filename),
            output_dir: parent_dir(output_filename),
        }
    }

    /// Rewrite every relative `url(...)` in a declaration.
    ///
    /// References that are not `./` or `../` relative, or that cannot be
    /// related to the output directory, are returned untouched.
    pub fn rewrite<'a>(&self, declaration: &'a str) -> Cow<'a, str> {
        if !declaration.contains("url(") {
            return Cow::Borrowed(declaration);
        }

        RELATIVE_URL_RE.replace_all(declaration, |caps: &Captures| {
            let whole = caps.get(0).map_or("", |m| m.as_str());
            let (open, path, close) = (&caps[1], &caps[2], &caps[3]);

            if open != close {
                return whole.to_string();
            }

            let target = normalize(&self.input_dir.join(path));
            match relative_path(&self.output_dir, &target) {
                Some(rewritten) => format!("url({open}{rewritten}{close})"),
                None => {
                    tracing::warn!(
                        "Cannot express {} relative to {}, leaving url untouched",
                        target.display(),
                        self.output_dir.display()
                    );
                    whole.to_string()
                }
            }
        })
    }
}

/// Rewrite relative `url(...)` references in `declaration` so they resolve from
/// the directory of `output_filename` to the same target they resolved to from
/// the directory of `input_filename`.
///
/// Without an output filename the declaration is returned unchanged.
pub fn rewrite_urls<'a>(
    declaration: &'a str,
    input_filename: &Path,
    output_filename: Option<&Path>,
) -> Cow<'a, str> {
    match output_filename {
        Some(output) => AssetRewriter::new(input_filename, output).rewrite(declaration),
        None => Cow::Borrowed(declaration),
    }
}

fn parent_dir(path: &Path) -> PathBuf {
    normalize(path.parent().unwrap_or(Path::new("")))
}

/// Lexically resolve `.` and `..` components.
pub fn normalize(path: &Path) -> PathBuf {
    let mut parts: Vec<Component> = Vec::new();

    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => match parts.last() {
                Some(Component::Normal(_)) => {
                    parts.pop();
                }
                Some(Component::RootDir) | Some(Component::Prefix(_)) => {}
                _ => parts.push(component),
            },
            other => parts.push(other),
        }
    }

    parts.iter().collect()
}

/// Express `target` relative to `base_dir`, both already normalized.
pub fn relative_path(base_dir: &Path, target: &Path) -> Option<String> {
    if base_dir.is_absolute() != target.is_absolute() {
        return None;
    }

    let base: Vec<Component> = base_dir.components().collect();
    let target: Vec<Component> = target.components().collect();

    let common = base
        .iter()
        .zip(target.iter())
        .take_while(|(a, b)| a == b)
        .count();

    // Climbing out of a `..` in the base would need knowledge of the cwd.
    if base[common..].iter().any(|c| !matches!(c, Component::Normal(_))) {
        return None;
    }

    let mut segments: Vec<String> = vec!["..".to_string(); base.len() - common];
    segments.extend(
        target[common..]
            .iter()
            .map(|c| c.as_os_str().to_string_lossy().into_owned()),
    );

    if segments.is_empty() {
        return Some(".".to_string());
    }

    Some(segments.join("/"))
}
