//! Class metadata loader.
//!
//! Turns compiled-class byte streams into [`ClassDescriptor`]s. Parsing runs in
//! parallel; the output is always sorted by class name so later stages never
//! see completion order. Inputs that fail to parse are excluded and reported
//! as [`Diagnostic::MalformedClass`].

use crate::error::{Diagnostic, MalformedClassError};
use crate::types::{access, ClassDescriptor, ClassInput};
use anyhow::{Context, Result};
use rayon::prelude::*;
use std::fs;
use std::path::Path;
use tracing::{debug, warn};

mod helpers;
mod parsing;


/// Output of the loader stage.
#[derive(Debug, Default)]
pub struct LoadedClasses {
    /// Sorted by class name, one descriptor per name
    pub classes: Vec<ClassDescriptor>,
    pub diagnostics: Vec<Diagnostic>,
}

/// Parse a single class input.
pub fn parse_class(input: &ClassInput) -> std::result::Result<ClassDescriptor, MalformedClassError> {
    parsing::parse_class_file(&input.bytes)
        .map(|mut descriptor| {
            descriptor.origin = input.origin.clone();
            descriptor
        })
        .map_err(|err| MalformedClassError {
            origin: input.origin.clone(),
            reason: format!("{:#}", err),
        })
}

/// Parse every input and merge the results into a deterministic order.
pub fn load_classes(inputs: &[ClassInput]) -> LoadedClasses {
    let _span = tracing::info_span!("load_classes", inputs = inputs.len()).entered();

    let results: Vec<_> = inputs.par_iter().map(parse_class).collect();

    let mut loaded = LoadedClasses::default();
    let mut parsed = Vec::with_capacity(results.len());
    for result in results {
        match result {
            Ok(descriptor) if descriptor.access & access::ACC_MODULE != 0 => {
                debug!("Skipping module descriptor {}", descriptor.origin);
            }
            Ok(descriptor) => parsed.push(descriptor),
            Err(err) => {
                warn!("{}", err);
                loaded.diagnostics.push(Diagnostic::MalformedClass(err));
            }
        }
    }

    // Duplicates keep the input whose origin sorts first.
    parsed.sort_by(|a, b| a.name.cmp(&b.name).then_with(|| a.origin.cmp(&b.origin)));
    let mut iter = parsed.into_iter().peekable();
    while let Some(kept) = iter.next() {
        let mut ignored = Vec::new();
        while let Some(next) = iter.next_if(|next| next.name == kept.name) {
            ignored.push(next.origin);
        }
        if !ignored.is_empty() {
            warn!("Class {} declared by several inputs, keeping {}", kept.name, kept.origin);
            loaded.diagnostics.push(Diagnostic::DuplicateClass {
                name: kept.name.clone(),
                kept: kept.origin.clone(),
                ignored,
            });
        }
        loaded.classes.push(kept);
    }

    loaded.diagnostics.sort_by_key(diagnostic_sort_key);

    tracing::info!(
        "Loaded {} classes ({} diagnostics)",
        loaded.classes.len(),
        loaded.diagnostics.len()
    );
    loaded
}

fn diagnostic_sort_key(diagnostic: &Diagnostic) -> String {
    match diagnostic {
        Diagnostic::MalformedClass(err) => err.origin.clone(),
        Diagnostic::DuplicateClass { kept, .. } => kept.clone(),
        Diagnostic::Violation(violation) => violation.class.clone(),
    }
}

/// Read every `*.class` file below `root`.
///
/// Files that cannot be read or exceed `max_class_size` are returned as
/// diagnostics rather than failing the whole read.
pub fn read_class_directory(root: &Path, max_class_size: u64) -> Result<(Vec<ClassInput>, Vec<Diagnostic>)> {
    if !root.is_dir() {
        anyhow::bail!("Class directory does not exist: {}", root.display());
    }

    let mut paths: Vec<_> = walkdir::WalkDir::new(root)
        .follow_links(false)
        .into_iter()
        .filter_map(std::result::Result::ok)
        .filter(|entry| entry.file_type().is_file())
        .filter(|entry| {
            entry
                .file_name()
                .to_str()
                .is_some_and(helpers::is_class_file_name)
        })
        .map(|entry| entry.into_path())
        .collect();
    paths.sort();
    debug!("Found {} class files under {}", paths.len(), root.display());

    let results: Vec<_> = paths
        .par_iter()
        .map(|path| {
            let origin = path
                .strip_prefix(root)
                .unwrap_or(path)
                .to_string_lossy()
                .replace('\\', "/");
            read_class_file(path, max_class_size)
                .map(|bytes| ClassInput::new(origin.clone(), bytes))
                .map_err(|err| MalformedClassError {
                    origin,
                    reason: format!("{:#}", err),
                })
        })
        .collect();

    let mut inputs = Vec::with_capacity(results.len());
    let mut diagnostics = Vec::new();
    for result in results {
        match result {
            Ok(input) => inputs.push(input),
            Err(err) => {
                warn!("{}", err);
                diagnostics.push(Diagnostic::MalformedClass(err));
            }
        }
    }
    Ok((inputs, diagnostics))
}

fn read_class_file(path: &Path, max_class_size: u64) -> Result<Vec<u8>> {
    let size = fs::metadata(path)
        .with_context(|| format!("Failed to stat {}", path.display()))?
        .len();
    if size > max_class_size {
        anyhow::bail!("File too large: {} bytes exceeds limit of {} bytes", size, max_class_size);
    }
    fs::read(path).with_context(|| format!("Failed to read {}", path.display()))
}
