use std::{
    fs::File,
    io::{self, BufRead, BufReader, Write},
    path::{Path, PathBuf},
};

use anyhow::Context;

use crate::shader::{Extractor, ShaderValidator, Validation};

/// A shader that did not validate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Failure {
    pub name: String,
    pub diagnostic: String,
}

/// Outcome of checking every shader in one file.
#[derive(Debug)]
pub struct FileReport {
    pub path: PathBuf,
    pub checked: usize,
    pub failures: Vec<Failure>,
}

impl FileReport {
    pub fn has_errors(&self) -> bool {
        !self.failures.is_empty()
    }
}

/// Validates every shader found in `lines`, one at a time.
///
/// Each failure is written to `errors` as `Shader <name> has errors:` followed
/// by the validator's output. Failures do not stop the scan, but read errors,
/// undecodable escapes and validator crashes do.
pub fn check_lines<I, V, W>(
    path: &Path,
    lines: I,
    validator: &V,
    errors: &mut W,
) -> anyhow::Result<FileReport>
where
    I: Iterator<Item = io::Result<String>>,
    V: ShaderValidator + ?Sized,
    W: Write,
{
    let mut report = FileReport {
        path: path.to_owned(),
        checked: 0,
        failures: Vec::new(),
    };

    for shader in Extractor::new(lines) {
        let shader = shader.with_context(|| format!("could not extract shaders from {path:?}"))?;

        debug!(name = %shader.name, kind = %shader.kind, line = shader.line, "validating");
        let validation = validator
            .validate(&shader)
            .with_context(|| format!("could not validate {}", shader.name))?;
        report.checked += 1;

        if let Validation::Failed { diagnostic } = validation {
            let failure = Failure {
                name: shader.name,
                diagnostic,
            };
            writeln!(errors, "Shader {} has errors:", failure.name)?;
            writeln!(errors, "{}", failure.diagnostic)?;
            report.failures.push(failure);
        }
    }

    info!(
        path = %report.path.display(),
        checked = report.checked,
        failed = report.failures.len(),
        "checked file"
    );

    Ok(report)
}

pub fn check_file<V, W>(path: &Path, validator: &V, errors: &mut W) -> anyhow::Result<FileReport>
where
    V: ShaderValidator + ?Sized,
    W: Write,
{
    let file = File::open(path).with_context(|| format!("could not open {path:?}"))?;
    check_lines(path, BufReader::new(file).lines(), validator, errors)
}

/// Checks every file in order. Returns `true` if any shader failed.
pub fn run<V, W>(paths: &[PathBuf], validator: &V, errors: &mut W) -> anyhow::Result<bool>
where
    V: ShaderValidator + ?Sized,
    W: Write,
{
    let mut has_errors = false;
    for path in paths {
        has_errors |= check_file(path, validator, errors)?.has_errors();
    }
    Ok(has_errors)
}

/// Prints the shaders that would be validated, one per line, without running
/// the validator.
pub fn list<W: Write>(paths: &[PathBuf], out: &mut W) -> anyhow::Result<usize> {
    let mut count = 0;
    for path in paths {
        let file = File::open(path).with_context(|| format!("could not open {path:?}"))?;
        for shader in Extractor::new(BufReader::new(file).lines()) {
            let shader =
                shader.with_context(|| format!("could not extract shaders from {path:?}"))?;
            writeln!(
                out,
                "{}:{} {} {}",
                path.display(),
                shader.line,
                shader.name,
                shader.kind
            )?;
            count += 1;
        }
    }
    Ok(count)
}

/// Expands directories into the files below them whose extension is one of
/// `extensions`. Other paths are kept as given, in order.
pub fn resolve_paths(paths: &[PathBuf], extensions: &[String]) -> anyhow::Result<Vec<PathBuf>> {
    let mut resolved = Vec::new();

    for path in paths {
        if !path.is_dir() {
            resolved.push(path.clone());
            continue;
        }

        for entry in walkdir::WalkDir::new(path).sort_by_file_name() {
            let entry = entry.with_context(|| format!("could not walk {path:?}"))?;
            if !entry.file_type().is_file() {
                continue;
            }

            let matches = entry
                .path()
                .extension()
                .and_then(|ext| ext.to_str())
                .map_or(false, |ext| extensions.iter().any(|wanted| wanted == ext));

            if matches {
                resolved.push(entry.into_path());
            }
        }
    }

    Ok(resolved)
}
