/*!
# Converter

Per-unit and batch drivers for the conversion pipeline:

classify -> extract -> partition -> resolve identity/parent -> alias rewrite -> emit

[`Converter::convert_source`] never writes; it only consults the filesystem
to reconcile a unit path and module root spelled from different bases.
[`Converter::convert_batch`] computes every output first and only then
commits writes, so a failure while computing leaves every file untouched and
a failed write only affects its own unit.
*/

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use rayon::prelude::*;
use tracing::{debug, info, instrument, warn};

use crate::alias::AliasTable;
use crate::emit::{emit_class, ClassDescriptor, EmitOptions, ImportLine};
use crate::error::ConvertError;
use crate::legacy::{
    classify::classify,
    extract::extract_first_call,
    members::partition_members,
    ItemKind,
};
use crate::resolve::{
    import_path::relative_import, resolve_identity, resolve_parent, DottedIdentifier,
    ResolvedIdentity,
};
use crate::ConvertConfig;

pub mod summary;

use summary::BatchSummary;

/// A source file's path and text
#[derive(Debug, Clone)]
pub struct SourceUnit {
    pub path: PathBuf,
    pub text: String,
}

impl SourceUnit {
    pub fn new(path: impl Into<PathBuf>, text: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            text: text.into(),
        }
    }

    pub fn read(path: &Path) -> Result<Self, ConvertError> {
        let text = fs::read_to_string(path).map_err(|err| ConvertError::io(path, err))?;
        Ok(Self::new(path, text))
    }
}

/// Result of converting one unit
#[derive(Debug, Clone)]
pub enum Conversion {
    /// No legacy definition; the unit stays byte-for-byte unchanged
    NotApplicable,
    Converted(ConvertedUnit),
}

#[derive(Debug, Clone)]
pub struct ConvertedUnit {
    pub kind: ItemKind,
    pub identity: ResolvedIdentity,
    pub parent: ResolvedIdentity,
    pub text: String,
}

/// How a batch commits its outputs
#[derive(Debug, Clone, Default)]
pub struct BatchOptions {
    /// Compute and report, write nothing
    pub dry_run: bool,
    /// Copy `<file>.<ext>` to `<file>.<ext>.backup` before overwriting
    pub backup_originals: bool,
}

/// Converts units living below one module root
pub struct Converter {
    module_root: PathBuf,
    aliases: Arc<AliasTable>,
    default_parent_package: String,
    emit: EmitOptions,
}

impl Converter {
    pub fn new(module_root: impl Into<PathBuf>) -> Self {
        Self {
            module_root: module_root.into(),
            aliases: Arc::new(AliasTable::empty()),
            default_parent_package: "ngs".to_string(),
            emit: EmitOptions::default(),
        }
    }

    pub fn from_config(module_root: impl Into<PathBuf>, config: &ConvertConfig, aliases: Arc<AliasTable>) -> Self {
        Self::new(module_root)
            .with_aliases(aliases)
            .with_default_parent_package(config.default_parent_package.clone())
            .with_emit_options(config.emit_options())
    }

    pub fn with_aliases(mut self, aliases: Arc<AliasTable>) -> Self {
        self.aliases = aliases;
        self
    }

    pub fn with_default_parent_package(mut self, package: impl Into<String>) -> Self {
        self.default_parent_package = package.into();
        self
    }

    pub fn with_emit_options(mut self, options: EmitOptions) -> Self {
        self.emit = options;
        self
    }

    pub fn module_root(&self) -> &Path {
        &self.module_root
    }

    pub fn aliases(&self) -> &AliasTable {
        &self.aliases
    }

    /// Convert one unit's text without touching the filesystem
    #[instrument(level = "debug", skip_all, fields(path = %unit.path.display()))]
    pub fn convert_source(&self, unit: &SourceUnit) -> Result<Conversion, ConvertError> {
        let path = unit.path.as_path();
        let source = unit.text.as_str();

        if classify(source).is_none() {
            return Ok(Conversion::NotApplicable);
        }
        let Some(call) = extract_first_call(source).map_err(|err| ConvertError::syntax(path, source, err))? else {
            debug!("factory only mentioned in comments or strings");
            return Ok(Conversion::NotApplicable);
        };
        let kind = call.kind;
        if call.stray_tokens > 0 {
            warn!(tokens = call.stray_tokens, "code outside the factory call is dropped");
        }

        let members = partition_members(source, &call.body).map_err(|err| ConvertError::syntax(path, source, err))?;

        let identity = call
            .name
            .parse::<DottedIdentifier>()
            .and_then(|identifier| resolve_identity(&identifier, kind))
            .map_err(|err| ConvertError::identity(path, source, call.name_offset, err))?;
        let parent = resolve_parent(call.parent.as_deref(), kind, &self.default_parent_package).map_err(|err| {
            ConvertError::identity(path, source, call.parent_offset.unwrap_or(call.literal.end), err)
        })?;
        let parent_specifier = self.import_specifier(path, &parent.module_path)?;

        let mut rewriter = self.aliases.rewriter();
        let members: Vec<_> = members
            .into_iter()
            .map(|member| member.map_text(|text| rewriter.rewrite(text)))
            .collect();

        let mut imports = Vec::new();
        for entry in rewriter.into_imports() {
            if entry.name == parent.class_name || entry.name == identity.class_name {
                debug!(alias = %entry.name, "alias already bound in this module, no import added");
                continue;
            }
            imports.push(ImportLine {
                name: entry.name.clone(),
                specifier: self.import_specifier(path, &entry.path)?,
            });
        }

        let class = ClassDescriptor {
            kind,
            identity,
            parent,
            parent_specifier,
            members,
            imports,
        };
        let text = emit_class(&class, &self.emit);

        info!(
            %kind,
            class = %class.identity.class_name,
            parent = %class.parent.class_name,
            members = class.members.len(),
            "converted legacy definition"
        );

        Ok(Conversion::Converted(ConvertedUnit {
            kind,
            identity: class.identity,
            parent: class.parent,
            text,
        }))
    }

    /// Read, convert and overwrite a single file
    pub fn convert_file(&self, path: &Path) -> Result<Conversion, ConvertError> {
        let unit = SourceUnit::read(path)?;
        let conversion = self.convert_source(&unit)?;
        if let Conversion::Converted(converted) = &conversion {
            write_output(path, &converted.text, false)?;
        }
        Ok(conversion)
    }

    /// Convert many units: compute everything, then commit the writes.
    ///
    /// Failures are collected per unit and never stop the batch.
    pub fn convert_batch<I, P>(&self, paths: I, options: &BatchOptions) -> BatchSummary
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        let paths: Vec<PathBuf> = paths.into_iter().map(Into::into).collect();
        info!(
            units = paths.len(),
            root = %self.module_root.display(),
            dry_run = options.dry_run,
            "starting batch conversion"
        );

        let computed: Vec<(PathBuf, Result<Conversion, ConvertError>)> = paths
            .into_par_iter()
            .map(|path| {
                let result = SourceUnit::read(&path).and_then(|unit| self.convert_source(&unit));
                (path, result)
            })
            .collect();

        let mut summary = BatchSummary::new();
        for (path, result) in computed {
            match result {
                Ok(Conversion::NotApplicable) => summary.record_skipped(path),
                Ok(Conversion::Converted(converted)) => {
                    if options.dry_run {
                        summary.record_converted(path);
                        continue;
                    }
                    match write_output(&path, &converted.text, options.backup_originals) {
                        Ok(()) => summary.record_converted(path),
                        Err(err) => {
                            warn!(error = %err, "write failed");
                            summary.record_failure(err);
                        }
                    }
                }
                Err(err) => {
                    warn!(error = %err, "conversion failed");
                    summary.record_failure(err);
                }
            }
        }

        info!(
            converted = summary.converted_count(),
            skipped = summary.skipped_count(),
            errored = summary.errored_count(),
            "batch conversion finished"
        );
        summary
    }

    fn import_specifier(&self, path: &Path, target: &str) -> Result<String, ConvertError> {
        relative_import(path, &self.module_root, target)
            .or_else(|| {
                let (source, root) = self.canonical_locations(path)?;
                relative_import(&source, &root, target)
            })
            .ok_or_else(|| ConvertError::OutsideModuleRoot {
                path: path.to_path_buf(),
                root: self.module_root.clone(),
            })
    }

    /// Unit path and module root with their directories resolved on disk,
    /// for units named relative to a different base than the root
    fn canonical_locations(&self, path: &Path) -> Option<(PathBuf, PathBuf)> {
        let file_name = path.file_name()?;
        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        let source = fs::canonicalize(dir).ok()?.join(file_name);
        let root = fs::canonicalize(&self.module_root).ok()?;
        debug!(source = %source.display(), root = %root.display(), "resolved unit against canonical module root");
        Some((source, root))
    }
}

/// Replace the file behind `path` atomically, keeping its permissions.
///
/// Symlinks are resolved first so the link stays in place and its target
/// receives the new text.
fn write_output(path: &Path, text: &str, backup: bool) -> Result<(), ConvertError> {
    let io_err = |err| ConvertError::io(path, err);

    if backup {
        fs::copy(path, backup_path(path)).map_err(io_err)?;
    }

    let target = fs::canonicalize(path).map_err(io_err)?;
    let dir = target.parent().unwrap_or_else(|| Path::new("/"));
    let permissions = fs::metadata(&target).map_err(io_err)?.permissions();

    let mut tmp = tempfile::NamedTempFile::new_in(dir).map_err(io_err)?;
    tmp.write_all(text.as_bytes()).map_err(io_err)?;
    tmp.as_file().set_permissions(permissions).map_err(io_err)?;
    tmp.persist(&target).map_err(|err| io_err(err.error))?;
    Ok(())
}

fn backup_path(path: &Path) -> PathBuf {
    path.with_extension(format!(
        "{}.backup",
        path.extension().unwrap_or_default().to_string_lossy()
    ))
}
