/*!
# Identity Resolution

Maps legacy dotted identifiers (`orders.view_item`) onto class names and
module paths (`ViewItemLoad`, `orders/ViewItemLoad`), and decides which
class a converted definition extends.
*/

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

use crate::legacy::ItemKind;
use crate::scanner::is_identifier;

pub mod import_path;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum IdentityError {
    #[error("empty identifier")]
    Empty,

    #[error("identifier '{0}' has an empty segment")]
    EmptySegment(String),

    #[error("identifier '{name}' does not produce a valid class name ('{class_name}')")]
    InvalidClassName { name: String, class_name: String },
}

/// A dot-separated legacy name: package segments plus a leaf token
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DottedIdentifier {
    pub packages: Vec<String>,
    pub leaf: String,
}

impl FromStr for DottedIdentifier {
    type Err = IdentityError;

    fn from_str(name: &str) -> Result<Self, Self::Err> {
        let name = name.trim();
        if name.is_empty() {
            return Err(IdentityError::Empty);
        }

        let mut segments: Vec<String> = name.split('.').map(str::to_string).collect();
        if segments.iter().any(|segment| segment.trim().is_empty()) {
            return Err(IdentityError::EmptySegment(name.to_string()));
        }
        let leaf = segments.pop().ok_or(IdentityError::Empty)?;

        Ok(Self {
            packages: segments,
            leaf,
        })
    }
}

impl fmt::Display for DottedIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for package in &self.packages {
            write!(f, "{package}.")?;
        }
        write!(f, "{}", self.leaf)
    }
}

/// Target class of a conversion or of an inheritance edge
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedIdentity {
    /// `/`-separated, extension-less, relative to the module root
    pub module_path: String,
    pub class_name: String,
}

/// Class name and module path for `identifier` converted as `kind`
pub fn resolve_identity(
    identifier: &DottedIdentifier,
    kind: ItemKind,
) -> Result<ResolvedIdentity, IdentityError> {
    let class_name = format!("{}{}", pascal_case(&identifier.leaf), kind.suffix());
    if !is_identifier(&class_name) || class_name == kind.suffix() {
        return Err(IdentityError::InvalidClassName {
            name: identifier.to_string(),
            class_name,
        });
    }

    let module_path = identifier
        .packages
        .iter()
        .map(String::as_str)
        .chain(std::iter::once(class_name.as_str()))
        .collect::<Vec<_>>()
        .join("/");

    Ok(ResolvedIdentity {
        module_path,
        class_name,
    })
}

/// The abstract base of `kind` inside `root_package`
pub fn default_parent(kind: ItemKind, root_package: &str) -> ResolvedIdentity {
    let class_name = kind.default_parent().to_string();
    let module_path = if root_package.is_empty() {
        class_name.clone()
    } else {
        format!("{}/{class_name}", root_package.trim_end_matches('/'))
    };
    ResolvedIdentity {
        module_path,
        class_name,
    }
}

/// Parent of a definition: the explicit dotted name when given, else the kind's base
pub fn resolve_parent(
    explicit: Option<&str>,
    kind: ItemKind,
    root_package: &str,
) -> Result<ResolvedIdentity, IdentityError> {
    match explicit {
        Some(name) => resolve_identity(&name.parse()?, kind),
        None => Ok(default_parent(kind, root_package)),
    }
}

/// `view_item` -> `ViewItem`; characters after the first of each segment are kept
fn pascal_case(leaf: &str) -> String {
    leaf.split('_')
        .filter(|segment| !segment.is_empty())
        .map(|segment| {
            let mut chars = segment.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn resolve(name: &str, kind: ItemKind) -> ResolvedIdentity {
        resolve_identity(&name.parse().unwrap(), kind).unwrap()
    }

    #[test]
    fn test_view_item_load() {
        let identity = resolve("orders.view_item", ItemKind::Load);
        assert_eq!(identity.class_name, "ViewItemLoad");
        assert_eq!(identity.module_path, "orders/ViewItemLoad");
    }

    #[test]
    fn test_nested_packages_action() {
        let identity = resolve("admin.users.save_user_role", ItemKind::Action);
        assert_eq!(identity.class_name, "SaveUserRoleAction");
        assert_eq!(identity.module_path, "admin/users/SaveUserRoleAction");
    }

    #[test]
    fn test_camel_case_leaf_is_kept() {
        let identity = resolve("main.itemList", ItemKind::Load);
        assert_eq!(identity.class_name, "ItemListLoad");
    }

    #[test]
    fn test_repeated_underscores_collapse() {
        let identity = resolve("main.list__all_", ItemKind::Load);
        assert_eq!(identity.class_name, "ListAllLoad");
    }

    #[test]
    fn test_name_without_package() {
        let identity = resolve("home", ItemKind::Load);
        assert_eq!(identity.class_name, "HomeLoad");
        assert_eq!(identity.module_path, "HomeLoad");
    }

    #[test]
    fn test_invalid_identifiers() {
        assert_eq!("".parse::<DottedIdentifier>(), Err(IdentityError::Empty));
        assert!(matches!(
            "orders..view".parse::<DottedIdentifier>(),
            Err(IdentityError::EmptySegment(_))
        ));
        assert!(matches!(
            "orders.".parse::<DottedIdentifier>(),
            Err(IdentityError::EmptySegment(_))
        ));

        let err = resolve_identity(&"orders.2fa".parse().unwrap(), ItemKind::Load).unwrap_err();
        assert!(matches!(err, IdentityError::InvalidClassName { .. }));
        let err = resolve_identity(&"orders.___".parse().unwrap(), ItemKind::Load).unwrap_err();
        assert!(matches!(err, IdentityError::InvalidClassName { .. }));
    }

    #[test]
    fn test_display_round_trip() {
        let identifier: DottedIdentifier = "shop.cart_item".parse().unwrap();
        assert_eq!(identifier.packages, vec!["shop".to_string()]);
        assert_eq!(identifier.leaf, "cart_item");
        assert_eq!(identifier.to_string(), "shop.cart_item");
    }

    #[test]
    fn test_explicit_parent_uses_same_kind() {
        let parent = resolve_parent(Some("shop.abstract_item"), ItemKind::Load, "ngs").unwrap();
        assert_eq!(parent.class_name, "AbstractItemLoad");
        assert_eq!(parent.module_path, "shop/AbstractItemLoad");
    }

    #[test]
    fn test_default_parents() {
        let load = resolve_parent(None, ItemKind::Load, "ngs").unwrap();
        assert_eq!(load.class_name, "AbstractLoad");
        assert_eq!(load.module_path, "ngs/AbstractLoad");

        let action = resolve_parent(None, ItemKind::Action, "").unwrap();
        assert_eq!(action.class_name, "AbstractAction");
        assert_eq!(action.module_path, "AbstractAction");
    }
}
