// Class emission
// Assembles the final ES module text for one converted definition.

use crate::legacy::{
    members::{MemberEntry, MemberKind, MethodParts},
    ItemKind,
};
use crate::resolve::ResolvedIdentity;

/// `import <name> from '<specifier><ext>';`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportLine {
    pub name: String,
    /// Extension-less specifier relative to the converted file
    pub specifier: String,
}

/// Everything needed to print one converted class
#[derive(Debug, Clone)]
pub struct ClassDescriptor {
    pub kind: ItemKind,
    pub identity: ResolvedIdentity,
    pub parent: ResolvedIdentity,
    /// Relative specifier of the parent module
    pub parent_specifier: String,
    /// Members in source order
    pub members: Vec<MemberEntry>,
    /// Alias imports in table order
    pub imports: Vec<ImportLine>,
}

#[derive(Debug, Clone)]
pub struct EmitOptions {
    pub import_extension: String,
    pub indent: String,
}

impl Default for EmitOptions {
    fn default() -> Self {
        Self {
            import_extension: ".js".to_string(),
            indent: "  ".to_string(),
        }
    }
}

pub fn emit_class(class: &ClassDescriptor, options: &EmitOptions) -> String {
    let mut out = String::new();

    push_import(&mut out, &class.parent.class_name, &class.parent_specifier, options);
    for import in &class.imports {
        push_import(&mut out, &import.name, &import.specifier, options);
    }
    out.push('\n');

    out.push_str(&format!(
        "export default class {} extends {} {{\n",
        class.identity.class_name, class.parent.class_name
    ));

    let mut blocks = Vec::new();
    if let Some(constructor) = constructor_block(&class.members, &options.indent) {
        blocks.push(constructor);
    }
    for member in &class.members {
        if let MemberKind::Method(parts) = &member.kind {
            blocks.push(method_block(member, parts));
        }
    }

    for (idx, block) in blocks.iter().enumerate() {
        if idx > 0 {
            out.push('\n');
        }
        out.push_str(&options.indent);
        out.push_str(block);
        out.push('\n');
    }

    out.push_str("}\n");
    out
}

fn push_import(out: &mut String, name: &str, specifier: &str, options: &EmitOptions) {
    out.push_str(&format!(
        "import {name} from '{specifier}{}';\n",
        options.import_extension
    ));
}

/// Constructor assigning every value member, or `None` when there are none
fn constructor_block(members: &[MemberEntry], indent: &str) -> Option<String> {
    let values: Vec<_> = members
        .iter()
        .filter(|member| member.kind == MemberKind::Value)
        .collect();
    if values.is_empty() {
        return None;
    }

    let mut block = String::from("constructor() {\n");
    block.push_str(&format!("{indent}{indent}super();\n"));
    for member in values {
        block.push_str(&format!(
            "{indent}{indent}{} = {};\n",
            member.key.field_target(),
            member.text
        ));
    }
    block.push_str(&format!("{indent}}}"));
    Some(block)
}

fn method_block(member: &MemberEntry, parts: &MethodParts) -> String {
    let name = member.key.method_name();
    if parts.expression_body {
        format!(
            "{}{name}{} {{ return {}; }}",
            parts.modifiers, parts.params, parts.body
        )
    } else {
        format!("{}{name}{} {}", parts.modifiers, parts.params, parts.body)
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::legacy::members::{KeyForm, PropertyKey};

    fn key(name: &str) -> PropertyKey {
        PropertyKey {
            raw: name.to_string(),
            name: name.to_string(),
            form: KeyForm::Ident,
        }
    }

    fn value(name: &str, text: &str) -> MemberEntry {
        MemberEntry {
            key: key(name),
            kind: MemberKind::Value,
            text: text.to_string(),
            offset: 0,
        }
    }

    fn method(name: &str, params: &str, body: &str) -> MemberEntry {
        MemberEntry {
            key: key(name),
            kind: MemberKind::Method(MethodParts {
                modifiers: String::new(),
                params: params.to_string(),
                body: body.to_string(),
                expression_body: false,
            }),
            text: format!("function{params}{body}"),
            offset: 0,
        }
    }

    fn descriptor(members: Vec<MemberEntry>, imports: Vec<ImportLine>) -> ClassDescriptor {
        ClassDescriptor {
            kind: ItemKind::Load,
            identity: ResolvedIdentity {
                module_path: "shop/CartItemLoad".to_string(),
                class_name: "CartItemLoad".to_string(),
            },
            parent: ResolvedIdentity {
                module_path: "shop/AbstractItemLoad".to_string(),
                class_name: "AbstractItemLoad".to_string(),
            },
            parent_specifier: "../shop/AbstractItemLoad".to_string(),
            members,
            imports,
        }
    }

    #[test]
    fn test_full_class() {
        let class = descriptor(
            vec![
                value("id", "1"),
                method("getId", "()", "{return this.id;}"),
                value("name", "'cart'"),
            ],
            vec![ImportLine {
                name: "Dialog".to_string(),
                specifier: "../ngs/util/Dialog".to_string(),
            }],
        );

        let expected = "\
import AbstractItemLoad from '../shop/AbstractItemLoad.js';
import Dialog from '../ngs/util/Dialog.js';

export default class CartItemLoad extends AbstractItemLoad {
  constructor() {
    super();
    this.id = 1;
    this.name = 'cart';
  }

  getId() {return this.id;}
}
";
        assert_eq!(emit_class(&class, &EmitOptions::default()), expected);
    }

    #[test]
    fn test_no_constructor_without_values() {
        let class = descriptor(vec![method("run", "(a)", "{ a(); }")], Vec::new());
        let out = emit_class(&class, &EmitOptions::default());
        assert!(!out.contains("constructor"));
        assert!(out.contains("  run(a) { a(); }\n"));
    }

    #[test]
    fn test_empty_class() {
        let out = emit_class(&descriptor(Vec::new(), Vec::new()), &EmitOptions::default());
        assert!(out.ends_with("export default class CartItemLoad extends AbstractItemLoad {\n}\n"));
    }

    #[test]
    fn test_expression_bodied_arrow() {
        let mut member = method("double", "(v)", "v * 2");
        if let MemberKind::Method(parts) = &mut member.kind {
            parts.expression_body = true;
            parts.modifiers = "async ".to_string();
        }
        let out = emit_class(&descriptor(vec![member], Vec::new()), &EmitOptions::default());
        assert!(out.contains("  async double(v) { return v * 2; }\n"));
    }

    #[test]
    fn test_custom_options() {
        let options = EmitOptions {
            import_extension: String::new(),
            indent: "\t".to_string(),
        };
        let out = emit_class(&descriptor(vec![value("id", "1")], Vec::new()), &options);
        assert!(out.starts_with("import AbstractItemLoad from '../shop/AbstractItemLoad';\n"));
        assert!(out.contains("\tconstructor() {\n\t\tsuper();\n\t\tthis.id = 1;\n\t}\n"));
    }
}
