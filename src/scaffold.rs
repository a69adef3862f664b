//! Packaging scaffolding and filesystem plumbing around the
//! synthesizers: destination validation, package `__init__` files, the
//! dependency manifest, the ignore list and the additional-source
//! overlay.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::config::RunConfig;
use crate::error::GenError;
use crate::ir::SchemaTable;
use crate::render::{self, INDENT};

/// Destination layout of a generated SDK.
#[derive(Debug)]
pub struct Layout {
    pub package_dir: PathBuf,
    pub models_dir: PathBuf,
    pub exceptions_dir: PathBuf,
    pub tests_dir: PathBuf,
}

impl Layout {
    #[must_use]
    pub fn new(dest: &Path, package_name: &str) -> Self {
        let package_dir = dest.join(package_name);
        Self {
            models_dir: package_dir.join("models"),
            exceptions_dir: package_dir.join("exceptions"),
            tests_dir: dest.join("tests"),
            package_dir,
        }
    }
}

/// Check the destination before any generation work: it must not exist,
/// or exist as an empty directory. Generation never touches a non-empty
/// destination.
pub fn verify_destination(dest: &Path) -> Result<(), GenError> {
    if !dest.exists() {
        return Ok(());
    }
    if !dest.is_dir() {
        return Err(GenError::DestinationNotEmpty(dest.to_path_buf()));
    }
    let mut entries = fs::read_dir(dest)?;
    if entries.next().is_some() {
        return Err(GenError::DestinationNotEmpty(dest.to_path_buf()));
    }
    Ok(())
}

/// Emit the package root `__init__.py`: docstring, version, author and
/// one import per configured export, resolved against the generated
/// classes, models and exceptions.
pub fn write_package_init<W: Write>(
    config: &RunConfig,
    table: &SchemaTable,
    writer: &mut W,
) -> std::io::Result<()> {
    if !config.package.description.is_empty() {
        write!(
            writer,
            "{}",
            render::docstring("", &render::description_lines(&config.package.description))
        )?;
        writeln!(writer)?;
    }
    writeln!(writer, "__version__ = \"{}\"", config.package.version)?;
    if config.package.author_comment.is_empty() {
        writeln!(writer, "__author__ = \"{}\"", config.package.author)?;
    } else {
        writeln!(
            writer,
            "__author__ = \"{}\"  # {}",
            config.package.author, config.package.author_comment
        )?;
    }
    writeln!(writer)?;

    let sync_name = config.sync_name();
    let base_exception = config.base_exception();
    let mut exported = Vec::new();
    for export in &config.package.all_exports {
        if *export == config.name || *export == sync_name {
            writeln!(writer, "from .{export} import {export}")?;
        } else if *export == base_exception
            || table.exceptions().any(|schema| schema.name == *export)
        {
            writeln!(writer, "from .exceptions.{export} import {export}")?;
        } else if table.models().any(|schema| schema.name == *export) {
            writeln!(writer, "from .models.{export} import {export}")?;
        } else {
            eprintln!("[Warning] Unknown export {export:?} skipped from __init__.py");
            continue;
        }
        exported.push(export.clone());
    }
    writeln!(writer)?;
    writeln!(writer, "__all__ = [")?;
    let names: Vec<String> = exported
        .iter()
        .map(|name| format!("{INDENT}\"{name}\""))
        .collect();
    writeln!(writer, "{}", names.join(",\n"))?;
    writeln!(writer, "]")?;
    Ok(())
}

/// Runtime and test dependencies of the generated SDK.
pub fn write_requirements<W: Write>(writer: &mut W) -> std::io::Result<()> {
    writeln!(writer, "aiohttp")?;
    writeln!(writer, "requests")?;
    writeln!(writer, "pytest")?;
    writeln!(writer, "pytest-asyncio")?;
    Ok(())
}

/// Ignore list shipped with the generated SDK; keeps local secrets out
/// of version control.
pub fn write_gitignore<W: Write>(writer: &mut W) -> std::io::Result<()> {
    writeln!(writer, "secret_*")?;
    writeln!(writer, ".env")?;
    writeln!(writer, "__pycache__")?;
    writeln!(writer, "venv")?;
    writeln!(writer, ".venv")?;
    Ok(())
}

/// Append the additional-source overlay onto the generated output.
///
/// Files are appended to same-named generated files (or created); the
/// top-level `tests` subtree merges into the generated test directory
/// instead of the package directory. A missing overlay directory is only
/// a warning, matching the original tool.
pub fn append_additional(additional: &Path, layout: &Layout) -> Result<(), GenError> {
    if !additional.is_dir() {
        eprintln!(
            "[Warning] The given path: {} is not a folder",
            additional.display()
        );
        return Ok(());
    }
    for entry in sorted_entries(additional)? {
        let name = entry.file_name();
        let target_root = if name == "tests" {
            layout.tests_dir.clone()
        } else {
            layout.package_dir.join(&name)
        };
        if name == "tests" {
            append_tree(&entry.path(), &target_root)?;
        } else {
            append_path(&entry.path(), &target_root)?;
        }
    }
    Ok(())
}

fn sorted_entries(dir: &Path) -> Result<Vec<fs::DirEntry>, GenError> {
    let mut entries: Vec<fs::DirEntry> = fs::read_dir(dir)?.collect::<Result<_, _>>()?;
    entries.sort_by_key(fs::DirEntry::file_name);
    Ok(entries)
}

fn append_tree(source_dir: &Path, target_dir: &Path) -> Result<(), GenError> {
    for entry in sorted_entries(source_dir)? {
        append_path(&entry.path(), &target_dir.join(entry.file_name()))?;
    }
    Ok(())
}

fn append_path(source: &Path, target: &Path) -> Result<(), GenError> {
    if source.is_dir() {
        if !target.exists() {
            fs::create_dir_all(target)?;
        }
        append_tree(source, target)?;
    } else {
        let content = fs::read(source)?;
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent)?;
        }
        let mut file = fs::OpenOptions::new().create(true).append(true).open(target)?;
        file.write_all(&content)?;
    }
    Ok(())
}
