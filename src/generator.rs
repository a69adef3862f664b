//! Orchestrator: drives the synthesizers in dependency order.
//!
//! Every artifact is rendered into memory first; the filesystem is only
//! touched once the whole package rendered successfully. A schema-shape
//! error found halfway through rendering therefore leaves the
//! destination exactly as it was.

use std::fs;
use std::path::{Path, PathBuf};

use crate::client::{self, ClientContext, Flavor};
use crate::config::RunConfig;
use crate::document::ApiDocument;
use crate::error::GenError;
use crate::exceptions;
use crate::ir::{self, OperationDef, SchemaTable};
use crate::model;
use crate::scaffold::{self, Layout};
use crate::testgen;

/// The resolved command-line arguments of one generation run.
#[derive(Debug, Clone)]
pub struct GeneratorArgs {
    /// The OpenAPI-style interface document.
    pub file: PathBuf,
    /// The YAML run configuration.
    pub config: PathBuf,
    /// The additional-source overlay directory.
    pub additional: PathBuf,
    /// The destination folder (must not exist or be empty).
    pub dest: PathBuf,
}

/// One generated file, rendered in memory before anything is written.
struct Artifact {
    path: PathBuf,
    content: Vec<u8>,
}

/// Generates a Python client SDK from an OpenAPI document.
pub struct ClientGenerator {
    args: GeneratorArgs,
}

impl ClientGenerator {
    #[must_use]
    pub fn new(args: GeneratorArgs) -> Self {
        Self { args }
    }

    /// Run the whole generation pass.
    pub fn create_client(&self) -> Result<(), GenError> {
        self.verify_args()?;

        let config = RunConfig::load(&self.args.config)?;
        let json = fs::read_to_string(&self.args.file)?;
        let document = ApiDocument::from_json(&json)?;
        let table = SchemaTable::from_document(&document)?;
        let operations = ir::build_operations(&document, &table)?;

        let layout = Layout::new(&self.args.dest, &config.package.name);
        let artifacts = render_artifacts(&config, &document, &table, &operations, &layout)?;

        for artifact in &artifacts {
            if let Some(parent) = artifact.path.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::write(&artifact.path, &artifact.content)?;
        }

        scaffold::append_additional(&self.args.additional, &layout)?;
        Ok(())
    }

    /// Verify the arguments before any generation work begins.
    ///
    /// Correct arguments currently means: the interface document exists,
    /// the configuration file exists, and the destination does not exist
    /// or is an empty folder.
    fn verify_args(&self) -> Result<(), GenError> {
        if !self.args.file.is_file() {
            return Err(GenError::DocumentNotFound(self.args.file.clone()));
        }
        if !self.args.config.is_file() {
            return Err(GenError::ConfigNotFound(self.args.config.clone()));
        }
        scaffold::verify_destination(&self.args.dest)
    }
}

fn render_into(
    path: &Path,
    artifacts: &mut Vec<Artifact>,
    render: impl FnOnce(&mut Vec<u8>) -> Result<(), GenError>,
) -> Result<(), GenError> {
    let mut content = Vec::new();
    render(&mut content)?;
    artifacts.push(Artifact {
        path: path.to_path_buf(),
        content,
    });
    Ok(())
}

fn render_artifacts(
    config: &RunConfig,
    document: &ApiDocument,
    table: &SchemaTable,
    operations: &[OperationDef],
    layout: &Layout,
) -> Result<Vec<Artifact>, GenError> {
    let mut artifacts = Vec::new();
    let dest = layout
        .package_dir
        .parent()
        .unwrap_or(&layout.package_dir)
        .to_path_buf();

    // Models and exceptions first: the clients import them.
    let models: Vec<_> = table.models().collect();
    for schema in &models {
        render_into(
            &layout.models_dir.join(format!("{}.py", schema.name)),
            &mut artifacts,
            |writer| Ok(model::write_model(schema, writer)?),
        )?;
    }
    render_into(&layout.models_dir.join("__init__.py"), &mut artifacts, |writer| {
        Ok(model::write_models_init(
            &models,
            &config.model_module_description,
            writer,
        )?)
    })?;

    let base_exception = config.base_exception();
    render_into(
        &layout.exceptions_dir.join(format!("{base_exception}.py")),
        &mut artifacts,
        |writer| Ok(exceptions::write_base_exception(&base_exception, writer)?),
    )?;
    let errors: Vec<_> = table.exceptions().collect();
    for schema in &errors {
        render_into(
            &layout.exceptions_dir.join(format!("{}.py", schema.name)),
            &mut artifacts,
            |writer| Ok(exceptions::write_exception(schema, &base_exception, writer)?),
        )?;
    }
    render_into(
        &layout.exceptions_dir.join("__init__.py"),
        &mut artifacts,
        |writer| {
            Ok(exceptions::write_exceptions_init(
                &errors,
                &base_exception,
                &config.exception_module_description,
                writer,
            )?)
        },
    )?;

    let ctx = ClientContext {
        config,
        info: &document.info,
        table,
        operations,
    };
    render_into(
        &layout.package_dir.join(format!("{}.py", config.name)),
        &mut artifacts,
        |writer| client::write_client(&ctx, Flavor::Async, writer),
    )?;
    render_into(
        &layout.package_dir.join(format!("{}.py", config.sync_name())),
        &mut artifacts,
        |writer| client::write_client(&ctx, Flavor::Sync, writer),
    )?;
    render_into(&layout.package_dir.join("__init__.py"), &mut artifacts, |writer| {
        Ok(scaffold::write_package_init(config, table, writer)?)
    })?;

    render_into(&dest.join("requirements.txt"), &mut artifacts, |writer| {
        Ok(scaffold::write_requirements(writer)?)
    })?;
    render_into(&dest.join(".gitignore"), &mut artifacts, |writer| {
        Ok(scaffold::write_gitignore(writer)?)
    })?;

    render_into(&layout.tests_dir.join("conftest.py"), &mut artifacts, |writer| {
        Ok(testgen::write_conftest(config, writer)?)
    })?;
    render_into(
        &layout.tests_dir.join("secret_config.py"),
        &mut artifacts,
        |writer| Ok(testgen::write_secret_config(writer)?),
    )?;
    for operation in operations {
        render_into(
            &layout
                .tests_dir
                .join(format!("test_{}.py", operation.method_name)),
            &mut artifacts,
            |writer| testgen::write_operation_tests(operation, table, config, writer),
        )?;
    }

    Ok(artifacts)
}
