use std::path::{Component, Path, PathBuf};

/// Number of directories between `module_root` and the file at `source`.
///
/// Both paths are compared after lexical normalisation, so `./web/js` and
/// `web/js` name the same root. `None` when `source` does not live under
/// `module_root`.
pub fn nesting_depth(source: &Path, module_root: &Path) -> Option<usize> {
    let source = normalize(source);
    let relative = source.strip_prefix(normalize(module_root)).ok()?;
    let segments = relative
        .components()
        .filter(|component| matches!(component, Component::Normal(_)))
        .count();
    Some(segments.saturating_sub(1))
}

/// Drop `.` components and fold `name/..` pairs without touching the filesystem
fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => match out.components().next_back() {
                Some(Component::Normal(_)) => {
                    out.pop();
                }
                Some(Component::RootDir | Component::Prefix(_)) => {}
                _ => out.push(".."),
            },
            other => out.push(other),
        }
    }
    out
}

/// Import specifier reaching `target` (a module path under `module_root`) from `source`
pub fn relative_import(source: &Path, module_root: &Path, target: &str) -> Option<String> {
    let depth = nesting_depth(source, module_root)?;
    let target = target.trim_start_matches('/');
    Some(if depth == 0 {
        format!("./{target}")
    } else {
        format!("{}{target}", "../".repeat(depth))
    })
}
