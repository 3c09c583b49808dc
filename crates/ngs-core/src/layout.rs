//! Project module layout: where each NGS module keeps its JavaScript.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::debug;

const MODULES_CONFIG: &str = "config/modules.json";
const NGS_FRAMEWORK_JS: &str = "vendor/naghashyan/ngs-php-framework/src/web/js";
const NGS_CMS_JS: &str = "vendor/naghashyan/ngs-php-cms/src/web/js";

#[derive(Debug, Deserialize)]
struct ModulesConfig {
    default: Option<DefaultSection>,
}

#[derive(Debug, Deserialize)]
struct DefaultSection {
    default: Option<DefaultModule>,
}

#[derive(Debug, Deserialize)]
struct DefaultModule {
    dir: Option<String>,
}

#[derive(Debug, Clone)]
pub struct ModuleLayout {
    project_root: PathBuf,
    /// Name of the module served from `<project>/web/js`, when configured
    default_module: String,
}

impl ModuleLayout {
    pub fn new(project_root: impl Into<PathBuf>, default_module: impl Into<String>) -> Self {
        Self {
            project_root: project_root.into(),
            default_module: default_module.into(),
        }
    }

    /// Read the default module name from `config/modules.json`.
    ///
    /// A missing or unreadable file leaves no named default module.
    pub fn load(project_root: impl Into<PathBuf>) -> Self {
        let project_root = project_root.into();
        let default_module = read_default_module(&project_root.join(MODULES_CONFIG)).unwrap_or_default();
        Self::new(project_root, default_module)
    }

    pub fn project_root(&self) -> &Path {
        &self.project_root
    }

    pub fn default_module(&self) -> &str {
        &self.default_module
    }

    pub fn is_default(&self, module: &str) -> bool {
        module.is_empty() || module == "default" || (!self.default_module.is_empty() && module == self.default_module)
    }

    /// Module directory relative to the project root
    pub fn module_path(&self, module: &str) -> PathBuf {
        if self.is_default(module) {
            return PathBuf::from("web/js");
        }
        match module {
            "ngs" => PathBuf::from(NGS_FRAMEWORK_JS),
            "ngs-cms" => PathBuf::from(NGS_CMS_JS),
            name => Path::new("modules").join(name).join("web/js"),
        }
    }

    /// Absolute JS root of a module
    pub fn js_root(&self, module: &str) -> PathBuf {
        self.project_root.join(self.module_path(module))
    }
}

fn read_default_module(path: &Path) -> Option<String> {
    let text = match fs::read_to_string(path) {
        Ok(text) => text,
        Err(err) => {
            debug!(path = %path.display(), error = %err, "no modules config");
            return None;
        }
    };
    match serde_json::from_str::<ModulesConfig>(&text) {
        Ok(config) => config.default?.default?.dir,
        Err(err) => {
            debug!(path = %path.display(), error = %err, "ignoring malformed modules config");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_module_paths() {
        let layout = ModuleLayout::new("/srv/site", "");
        assert_eq!(layout.js_root(""), PathBuf::from("/srv/site/web/js"));
        assert_eq!(layout.js_root("default"), PathBuf::from("/srv/site/web/js"));
        assert_eq!(
            layout.js_root("ngs"),
            PathBuf::from("/srv/site/vendor/naghashyan/ngs-php-framework/src/web/js")
        );
        assert_eq!(
            layout.js_root("ngs-cms"),
            PathBuf::from("/srv/site/vendor/naghashyan/ngs-php-cms/src/web/js")
        );
        assert_eq!(layout.js_root("admin"), PathBuf::from("/srv/site/modules/admin/web/js"));
    }

    #[test]
    fn test_named_default_module() {
        let layout = ModuleLayout::new("/srv/site", "shop");
        assert_eq!(layout.js_root("shop"), PathBuf::from("/srv/site/web/js"));
        assert_eq!(layout.js_root("admin"), PathBuf::from("/srv/site/modules/admin/web/js"));
    }

    #[test]
    fn test_load_modules_config() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir(dir.path().join("config")).unwrap();
        fs::write(
            dir.path().join(MODULES_CONFIG),
            r#"{"default": {"default": {"dir": "shop"}, "domain": "example.com"}}"#,
        )
        .unwrap();

        let layout = ModuleLayout::load(dir.path());
        assert_eq!(layout.default_module(), "shop");
        assert!(layout.is_default("shop"));
    }

    #[test]
    fn test_load_tolerates_missing_and_malformed_config() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(ModuleLayout::load(dir.path()).default_module(), "");

        fs::create_dir(dir.path().join("config")).unwrap();
        fs::write(dir.path().join(MODULES_CONFIG), "{not json").unwrap();
        assert_eq!(ModuleLayout::load(dir.path()).default_module(), "");
    }
}
