//! # NGS Core
//!
//! Converter for legacy NGS request handlers. Rewrites
//! `NGS.createLoad("pkg.name", { ... }, "pkg.parent")` and
//! `NGS.createAction(...)` registrations into ES class modules:
//! - Token scanner for JavaScript source
//! - Legacy call extraction and property-bag partitioning
//! - Class identity, parent and import path resolution
//! - Alias rewriting for deprecated identifiers
//! - Class emission plus per-file and batch conversion drivers
//!
//! The crate performs no directory traversal of its own; callers hand it
//! candidate paths (see [`Converter::convert_batch`]) or raw text
//! (see [`Converter::convert_source`]).

#![warn(clippy::all)]

use std::path::PathBuf;

pub mod alias;
pub mod converter;
pub mod emit;
pub mod error;
pub mod layout;
pub mod legacy;
pub mod resolve;
pub mod scanner;
pub mod session;

// Re-export commonly used types
pub use alias::{AliasEntry, AliasRewriter, AliasTable};
pub use converter::{
    summary::BatchSummary, BatchOptions, Conversion, ConvertedUnit, Converter, SourceUnit,
};
pub use emit::{emit_class, ClassDescriptor, EmitOptions, ImportLine};
pub use error::{ConfigError, ConvertError};
pub use layout::ModuleLayout;
pub use legacy::{
    classify::classify,
    extract::{extract_call, extract_first_call, LegacyCall},
    members::{partition_members, KeyForm, MemberEntry, MemberKind, MethodParts, PropertyKey},
    ItemKind,
};
pub use resolve::{
    import_path::{nesting_depth, relative_import},
    resolve_identity, resolve_parent, DottedIdentifier, IdentityError, ResolvedIdentity,
};
pub use scanner::{Scanner, SyntaxError, Token, TokenKind};
pub use session::ConvertSession;

/// Converter version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Alias table file looked up in the project root when none is configured
pub const DEFAULT_ALIAS_FILE: &str = "convert.config.json";

/// Directory below a module's JS root that holds legacy registrations
pub const DEFAULT_SCAN_DIR: &str = "loads/registration";

/// Initialize tracing for converter components
pub fn init_tracing() -> Result<(), tracing_subscriber::util::TryInitError> {
    init_tracing_with_filter("ngs_core=info")
}

/// Initialize tracing with an explicit fallback filter.
///
/// `RUST_LOG` still takes precedence when it is set.
pub fn init_tracing_with_filter(default_filter: &str) -> Result<(), tracing_subscriber::util::TryInitError> {
    use tracing_subscriber::util::SubscriberInitExt;

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_filter));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .finish()
        .try_init()
}

/// Converter run configuration
#[derive(Debug, Clone)]
pub struct ConvertConfig {
    /// Project directory holding `config/`, `modules/` and `vendor/`
    pub project_root: PathBuf,
    /// Alias table location; relative paths resolve against `project_root`
    pub alias_file: Option<PathBuf>,
    /// Directory below the module JS root that gets scanned
    pub scan_dir: PathBuf,
    /// Package holding `AbstractLoad` / `AbstractAction`
    pub default_parent_package: String,
    /// Extension appended to emitted import specifiers
    pub import_extension: String,
    /// Indentation unit of emitted class bodies
    pub indent: String,
}

impl ConvertConfig {
    /// Location of the alias table for this run
    pub fn alias_path(&self) -> PathBuf {
        let file = self
            .alias_file
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_ALIAS_FILE));
        self.project_root.join(file)
    }

    pub fn emit_options(&self) -> EmitOptions {
        EmitOptions {
            import_extension: self.import_extension.clone(),
            indent: self.indent.clone(),
        }
    }
}

impl Default for ConvertConfig {
    fn default() -> Self {
        Self {
            project_root: ".".into(),
            alias_file: None,
            scan_dir: DEFAULT_SCAN_DIR.into(),
            default_parent_package: "ngs".to_string(),
            import_extension: ".js".to_string(),
            indent: "  ".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_second_tracing_init_reports_error() {
        let _ = init_tracing();
        assert!(init_tracing_with_filter("ngs_core=debug").is_err());
    }

    #[test]
    fn test_alias_path_defaults_to_project_root() {
        let config = ConvertConfig {
            project_root: "/srv/site".into(),
            ..Default::default()
        };
        assert_eq!(config.alias_path(), PathBuf::from("/srv/site/convert.config.json"));
    }

    #[test]
    fn test_alias_path_keeps_absolute_override() {
        let config = ConvertConfig {
            project_root: "/srv/site".into(),
            alias_file: Some("/etc/ngs/aliases.json".into()),
            ..Default::default()
        };
        assert_eq!(config.alias_path(), PathBuf::from("/etc/ngs/aliases.json"));
    }
}
