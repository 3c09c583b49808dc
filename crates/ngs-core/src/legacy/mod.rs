/*!
# Legacy Definitions

Recognition and parsing of legacy `NGS.createLoad` / `NGS.createAction`
registrations.

- `classify`: cheap substring check deciding whether a unit is a candidate
- `extract`: locates the factory call and bounds its property literal
- `members`: splits the literal into data fields and methods
*/

use std::fmt;

pub mod classify;
pub mod extract;
pub mod members;

/// Kind of legacy request handler
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ItemKind {
    /// Data-fetching handler
    Load,
    /// State-mutating handler
    Action,
}

impl ItemKind {
    /// Detection order; a unit mentioning both factories is a load
    pub const ALL: [ItemKind; 2] = [ItemKind::Load, ItemKind::Action];

    /// Full factory expression as written in legacy sources
    pub fn factory_token(self) -> &'static str {
        match self {
            ItemKind::Load => "NGS.createLoad",
            ItemKind::Action => "NGS.createAction",
        }
    }

    /// Member name of the factory on the `NGS` namespace
    pub fn factory_method(self) -> &'static str {
        match self {
            ItemKind::Load => "createLoad",
            ItemKind::Action => "createAction",
        }
    }

    /// Title-cased suffix appended to every generated class name
    pub fn suffix(self) -> &'static str {
        match self {
            ItemKind::Load => "Load",
            ItemKind::Action => "Action",
        }
    }

    /// Base class used when a definition names no parent
    pub fn default_parent(self) -> &'static str {
        match self {
            ItemKind::Load => "AbstractLoad",
            ItemKind::Action => "AbstractAction",
        }
    }
}

impl fmt::Display for ItemKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ItemKind::Load => write!(f, "load"),
            ItemKind::Action => write!(f, "action"),
        }
    }
}
