/*!
# Conversion Session

Owns everything shared by the units of one run: the configuration, the
project layout, the alias table (loaded once, on first use) and one
[`Converter`] per module, created on first request and reused afterwards.
*/

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use tracing::debug;

use crate::alias::AliasTable;
use crate::converter::Converter;
use crate::error::ConfigError;
use crate::layout::ModuleLayout;
use crate::ConvertConfig;

pub struct ConvertSession {
    config: ConvertConfig,
    layout: ModuleLayout,
    aliases: Option<Arc<AliasTable>>,
    converters: HashMap<String, Arc<Converter>>,
}

impl ConvertSession {
    pub fn new(config: ConvertConfig) -> Self {
        let layout = ModuleLayout::load(config.project_root.clone());
        Self::with_layout(config, layout)
    }

    pub fn with_layout(config: ConvertConfig, layout: ModuleLayout) -> Self {
        Self {
            config,
            layout,
            aliases: None,
            converters: HashMap::new(),
        }
    }

    pub fn config(&self) -> &ConvertConfig {
        &self.config
    }

    pub fn layout(&self) -> &ModuleLayout {
        &self.layout
    }

    /// The run's alias table; read from disk only the first time
    pub fn aliases(&mut self) -> Result<Arc<AliasTable>, ConfigError> {
        if let Some(table) = &self.aliases {
            return Ok(Arc::clone(table));
        }
        let table = Arc::new(AliasTable::load(&self.config.alias_path())?);
        self.aliases = Some(Arc::clone(&table));
        Ok(table)
    }

    /// Converter for `module`, built once per session
    pub fn converter(&mut self, module: &str) -> Result<Arc<Converter>, ConfigError> {
        if let Some(converter) = self.converters.get(module) {
            return Ok(Arc::clone(converter));
        }

        let aliases = self.aliases()?;
        let root = self.layout.js_root(module);
        debug!(module, root = %root.display(), "creating module converter");
        let converter = Arc::new(Converter::from_config(root, &self.config, aliases));
        self.converters.insert(module.to_string(), Arc::clone(&converter));
        Ok(converter)
    }

    /// Directory scanned for legacy registrations of `module`
    pub fn scan_root(&self, module: &str) -> PathBuf {
        self.layout.js_root(module).join(&self.config.scan_dir)
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::*;

    fn session(root: &std::path::Path) -> ConvertSession {
        ConvertSession::new(ConvertConfig {
            project_root: root.to_path_buf(),
            ..Default::default()
        })
    }

    #[test]
    fn test_converter_memoized_per_module() {
        let dir = tempfile::tempdir().unwrap();
        let mut session = session(dir.path());

        let first = session.converter("admin").unwrap();
        let again = session.converter("admin").unwrap();
        let other = session.converter("").unwrap();

        assert!(Arc::ptr_eq(&first, &again));
        assert!(!Arc::ptr_eq(&first, &other));
        assert_eq!(first.module_root(), dir.path().join("modules/admin/web/js"));
        assert_eq!(other.module_root(), dir.path().join("web/js"));
    }

    #[test]
    fn test_aliases_loaded_once() {
        let dir = tempfile::tempdir().unwrap();
        let alias_file = dir.path().join("convert.config.json");
        fs::write(
            &alias_file,
            r#"[{"old_name": "NGS.Dialog", "name": "Dialog", "path": "ngs/util/Dialog"}]"#,
        )
        .unwrap();

        let mut session = session(dir.path());
        let table = session.aliases().unwrap();
        assert_eq!(table.entries().len(), 1);

        // Later edits are not picked up within the same run
        fs::write(&alias_file, "[]").unwrap();
        assert!(Arc::ptr_eq(&table, &session.aliases().unwrap()));
    }

    #[test]
    fn test_malformed_aliases_fail_converter_creation() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("convert.config.json"), "{").unwrap();

        let mut session = session(dir.path());
        assert!(matches!(session.converter(""), Err(ConfigError::Json { .. })));
    }

    #[test]
    fn test_scan_root() {
        let session = ConvertSession::with_layout(
            ConvertConfig {
                project_root: "/srv/site".into(),
                ..Default::default()
            },
            ModuleLayout::new("/srv/site", ""),
        );
        assert_eq!(
            session.scan_root("ngs"),
            PathBuf::from("/srv/site/vendor/naghashyan/ngs-php-framework/src/web/js/loads/registration")
        );
    }
}
