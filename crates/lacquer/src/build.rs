//! Stylesheet extraction over a set of source files.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::{Context, Result};
use lacquer_core::{relative_path, transform, PluginOptions, TransformOptions};
use lacquer_extract::TaggedTemplateExtractor;
use rayon::prelude::*;

use crate::files::output_filename;

/// Resolved build settings (config file merged with command-line flags).
#[derive(Debug, Clone)]
pub struct BuildOptions {
    pub out_dir: PathBuf,
    pub source_maps: bool,
    pub require_css: bool,
    pub plugin_options: PluginOptions,
}

/// Summary of a build.
#[derive(Debug)]
pub struct BuildResult {
    pub files: usize,
    pub stylesheets: Vec<PathBuf>,
    pub duration_ms: u64,
}

/// Extract stylesheets from `files`, writing artifacts relative to `cwd`.
///
/// Every file is attempted; the build fails afterwards if any of them did.
pub fn run(files: &[PathBuf], options: &BuildOptions, cwd: &Path) -> Result<BuildResult> {
    let start = Instant::now();
    let extractor = TaggedTemplateExtractor::new();

    let results: Vec<Result<Option<PathBuf>>> = files
        .par_iter()
        .map(|file| process_file(file, options, cwd, &extractor))
        .collect();

    let mut stylesheets = Vec::new();
    let mut failures = 0;

    for result in results {
        match result {
            Ok(Some(stylesheet)) => stylesheets.push(stylesheet),
            Ok(None) => {}
            Err(e) => {
                tracing::error!("{:#}", e);
                failures += 1;
            }
        }
    }

    if failures > 0 {
        anyhow::bail!("{} of {} files failed", failures, files.len());
    }

    Ok(BuildResult {
        files: files.len(),
        stylesheets,
        duration_ms: start.elapsed().as_millis() as u64,
    })
}

/// Transform one file; returns the stylesheet path when one was written.
fn process_file(
    filename: &Path,
    options: &BuildOptions,
    cwd: &Path,
    extractor: &TaggedTemplateExtractor,
) -> Result<Option<PathBuf>> {
    let source = fs::read_to_string(filename)
        .with_context(|| format!("Failed to read {}", filename.display()))?;
    let output = output_filename(filename, &options.out_dir, cwd);

    let transform_options = TransformOptions::new(filename)
        .with_output_filename(output.clone())
        .with_plugin_options(options.plugin_options.clone());
    let result = transform(&source, &transform_options, extractor)?;

    let Some(css_text) = result.css_text.as_deref() else {
        tracing::debug!("No styles in {}", filename.display());
        return Ok(None);
    };

    tracing::info!("Writing {}", output.display());
    let source_map = options
        .source_maps
        .then(|| result.css_source_map_text())
        .filter(|map| !map.is_empty());
    write_stylesheet(&output, css_text, source_map)?;

    if options.require_css {
        require_css(filename, &output)?;
    }

    Ok(Some(output))
}

/// Write the stylesheet, plus a sibling `.map` file when a source map is given.
fn write_stylesheet(output: &Path, css_text: &str, source_map: Option<&str>) -> Result<()> {
    if let Some(parent) = output.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }

    let Some(source_map) = source_map else {
        return fs::write(output, css_text)
            .with_context(|| format!("Failed to write {}", output.display()));
    };

    let mut map_path = output.as_os_str().to_os_string();
    map_path.push(".map");
    let map_path = PathBuf::from(map_path);
    let map_name = map_path.file_name().unwrap_or_default().to_string_lossy();

    let content = format!("{}/*# sourceMappingURL={} */\n", css_text, map_name);
    fs::write(output, content).with_context(|| format!("Failed to write {}", output.display()))?;
    fs::write(&map_path, source_map)
        .with_context(|| format!("Failed to write {}", map_path.display()))
}

/// Append a `require` of the stylesheet to the source file, unless present.
///
/// Returns whether the file was changed.
fn require_css(filename: &Path, stylesheet: &Path) -> Result<bool> {
    let source_dir = filename.parent().unwrap_or(Path::new(""));
    let mut relative = relative_path(source_dir, stylesheet)
        .unwrap_or_else(|| stylesheet.to_string_lossy().into_owned());
    if !relative.starts_with('.') && !relative.starts_with('/') {
        relative = format!("./{}", relative);
    }
    let statement = format!("require('{}');", relative);

    let mut source = fs::read_to_string(filename)
        .with_context(|| format!("Failed to read {}", filename.display()))?;
    if source.lines().any(|line| line.trim() == statement) {
        return Ok(false);
    }

    if !source.is_empty() && !source.ends_with('\n') {
        source.push('\n');
    }
    source.push_str(&statement);
    source.push('\n');

    fs::write(filename, source).with_context(|| format!("Failed to write {}", filename.display()))?;
    Ok(true)
}
