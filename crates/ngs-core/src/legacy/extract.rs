use std::ops::Range;

use crate::scanner::{find_matching, Scanner, SyntaxError, Token, TokenKind};

use super::ItemKind;

/// A located `NGS.createX("name", { ... }, "parent")` call
#[derive(Debug, Clone)]
pub struct LegacyCall {
    pub kind: ItemKind,
    /// Dotted identifier passed as the first argument
    pub name: String,
    pub name_offset: usize,
    /// Byte span of the property literal, braces included
    pub literal: Range<usize>,
    /// Tokens strictly inside the literal braces
    pub body: Vec<Token>,
    /// Dotted parent identifier passed after the literal, if any
    pub parent: Option<String>,
    pub parent_offset: Option<usize>,
    /// Code tokens outside the call other than `;`
    pub stray_tokens: usize,
}

impl LegacyCall {
    pub fn literal_text<'src>(&self, source: &'src str) -> &'src str {
        &source[self.literal.clone()]
    }
}

/// Find the first code-level factory call of `kind` and bound its literal.
///
/// Returns `Ok(None)` when the factory only appears inside comments or
/// string literals. The literal is bounded by balanced delimiter matching
/// over scanner tokens, so nested literals and trailing code are handled.
pub fn extract_call(source: &str, kind: ItemKind) -> Result<Option<LegacyCall>, SyntaxError> {
    extract_earliest(source, &[kind])
}

/// Find the earliest code-level factory call of either kind.
///
/// The earliest call is the outermost one, so a factory call made from
/// inside a method body stays part of that body.
pub fn extract_first_call(source: &str) -> Result<Option<LegacyCall>, SyntaxError> {
    extract_earliest(source, &ItemKind::ALL)
}

fn extract_earliest(source: &str, kinds: &[ItemKind]) -> Result<Option<LegacyCall>, SyntaxError> {
    let tokens = Scanner::tokenize(source)?;

    let Some((start, kind)) = find_factory(&tokens, source, kinds) else {
        return Ok(None);
    };
    let mut cursor = Cursor {
        tokens: &tokens,
        source,
        idx: start + 4,
    };

    let name_token = cursor.next(&format!("expected the {kind} name after '{}('", kind.factory_token()))?;
    let name = name_token.string_value(source).ok_or_else(|| {
        SyntaxError::new(
            format!("{kind} name must be a string literal, found '{}'", name_token.text(source)),
            name_token.start,
        )
    })?;
    cursor.expect_punct(",", "expected ',' after the name")?;

    let open = cursor.idx;
    let open_token = cursor.next("expected the property literal")?;
    if !open_token.is_punct(source, "{") {
        return Err(SyntaxError::new(
            format!("expected '{{' to open the property literal, found '{}'", open_token.text(source)),
            open_token.start,
        ));
    }
    let close = find_matching(&tokens, open, source)?;
    cursor.idx = close + 1;

    let (parent, parent_offset) = parse_parent(&mut cursor)?;
    let call_end = cursor.idx - 1;

    let stray_tokens = tokens[..start]
        .iter()
        .chain(&tokens[call_end + 1..])
        .filter(|token| !token.is_punct(source, ";"))
        .count();

    Ok(Some(LegacyCall {
        kind,
        name,
        name_offset: name_token.start,
        literal: tokens[open].start..tokens[close].end,
        body: tokens[open + 1..close].to_vec(),
        parent,
        parent_offset,
        stray_tokens,
    }))
}

/// Index of the first `NGS` token opening `NGS.createX(` for one of `kinds`
fn find_factory(tokens: &[Token], source: &str, kinds: &[ItemKind]) -> Option<(usize, ItemKind)> {
    tokens.windows(4).enumerate().find_map(|(idx, window)| {
        if !(window[0].is_ident(source, "NGS")
            && window[1].is_punct(source, ".")
            && window[3].is_punct(source, "("))
        {
            return None;
        }
        kinds
            .iter()
            .find(|kind| window[2].is_ident(source, kind.factory_method()))
            .map(|&kind| (idx, kind))
    })
}

/// Parse `)` | `, )` | `, "parent" )` | `, "parent", )` after the literal
fn parse_parent(cursor: &mut Cursor<'_>) -> Result<(Option<String>, Option<usize>), SyntaxError> {
    let source = cursor.source;
    let after = cursor.next("unterminated factory call")?;
    if after.is_punct(source, ")") {
        return Ok((None, None));
    }
    if !after.is_punct(source, ",") {
        return Err(SyntaxError::new(
            format!("expected ',' or ')' after the property literal, found '{}'", after.text(source)),
            after.start,
        ));
    }

    let parent_token = cursor.next("unterminated factory call")?;
    if parent_token.is_punct(source, ")") {
        return Ok((None, None));
    }
    let parent = parent_token.string_value(source).ok_or_else(|| {
        SyntaxError::new(
            format!("parent must be a string literal, found '{}'", parent_token.text(source)),
            parent_token.start,
        )
    })?;

    let mut closing = cursor.next("unterminated factory call")?;
    if closing.is_punct(source, ",") {
        closing = cursor.next("unterminated factory call")?;
    }
    if !closing.is_punct(source, ")") {
        return Err(SyntaxError::new(
            format!("unexpected argument '{}' after the parent name", closing.text(source)),
            closing.start,
        ));
    }
    Ok((Some(parent), Some(parent_token.start)))
}

struct Cursor<'a> {
    tokens: &'a [Token],
    source: &'a str,
    idx: usize,
}

impl Cursor<'_> {
    fn next(&mut self, message: &str) -> Result<Token, SyntaxError> {
        let token = self
            .tokens
            .get(self.idx)
            .copied()
            .ok_or_else(|| SyntaxError::new(message, self.source.len()))?;
        self.idx += 1;
        Ok(token)
    }

    fn expect_punct(&mut self, punct: &str, message: &str) -> Result<Token, SyntaxError> {
        let token = self.next(message)?;
        if token.kind == TokenKind::Punct && token.text(self.source) == punct {
            Ok(token)
        } else {
            Err(SyntaxError::new(
                format!("{message}, found '{}'", token.text(self.source)),
                token.start,
            ))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_call_is_outermost() {
        let source = r#"NGS.createAction("orders.save", {
  run: function () { NGS.createLoad("x.inner", {}); }
});"#;
        let call = extract_first_call(source).unwrap().unwrap();
        assert_eq!(call.kind, ItemKind::Action);
        assert_eq!(call.name, "orders.save");
        assert_eq!(call.stray_tokens, 0);

        let commented = "// NGS.createAction(\"a.b\", {})\nNGS.createLoad(\"c.d\", {});";
        let call = extract_first_call(commented).unwrap().unwrap();
        assert_eq!(call.kind, ItemKind::Load);
        assert_eq!(call.name, "c.d");
    }

    #[test]
    fn test_extract_with_parent() {
        let source = r#"NGS.createLoad("shop.cart_item", {
    id: 1,
    getId: function(){return this.id;}
}, "shop.abstract_item");
"#;
        let call = extract_call(source, ItemKind::Load).unwrap().unwrap();
        assert_eq!(call.name, "shop.cart_item");
        assert_eq!(call.parent.as_deref(), Some("shop.abstract_item"));
        assert!(call.literal_text(source).starts_with('{'));
        assert!(call.literal_text(source).ends_with('}'));
        assert!(call.literal_text(source).contains("return this.id;"));
        assert_eq!(call.stray_tokens, 0);
    }

    #[test]
    fn test_extract_without_parent() {
        let source = "NGS.createAction('orders.save', { a: 1 });";
        let call = extract_call(source, ItemKind::Action).unwrap().unwrap();
        assert_eq!(call.name, "orders.save");
        assert_eq!(call.parent, None);
        assert_eq!(call.literal_text(source), "{ a: 1 }");
    }

    #[test]
    fn test_trailing_comma_without_parent() {
        let source = "NGS.createLoad(\"a.b\", { a: 1 },\n);";
        let call = extract_call(source, ItemKind::Load).unwrap().unwrap();
        assert_eq!(call.parent, None);
    }

    #[test]
    fn test_literal_bounded_despite_trailing_braces() {
        let source = r#"NGS.createLoad("a.b", { s: "}", nested: { deep: {} } }, "a.base");
if (window.debug) { console.log("loaded"); }
"#;
        let call = extract_call(source, ItemKind::Load).unwrap().unwrap();
        assert_eq!(
            call.literal_text(source),
            r#"{ s: "}", nested: { deep: {} } }"#
        );
        assert_eq!(call.parent.as_deref(), Some("a.base"));
        assert!(call.stray_tokens > 0);
    }

    #[test]
    fn test_call_only_in_comment_is_not_a_call() {
        let source = "// NGS.createLoad(\"a.b\", {})\nconst x = 1;";
        assert!(extract_call(source, ItemKind::Load).unwrap().is_none());
    }

    #[test]
    fn test_name_must_be_string() {
        let source = "NGS.createLoad(name, {});";
        let err = extract_call(source, ItemKind::Load).unwrap_err();
        assert!(err.message.contains("string literal"), "{err}");
        assert_eq!(err.offset, source.find("name").unwrap());
    }

    #[test]
    fn test_parent_must_be_string() {
        let source = r#"NGS.createLoad("a.b", {}, Base);"#;
        let err = extract_call(source, ItemKind::Load).unwrap_err();
        assert!(err.message.contains("parent must be a string literal"), "{err}");
    }

    #[test]
    fn test_unbalanced_literal() {
        let source = r#"NGS.createLoad("a.b", { a: [1, 2 });"#;
        let err = extract_call(source, ItemKind::Load).unwrap_err();
        assert!(err.message.contains("mismatched"), "{err}");
    }

    #[test]
    fn test_template_name_without_substitution() {
        let source = "NGS.createLoad(`a.b`, {});";
        let call = extract_call(source, ItemKind::Load).unwrap().unwrap();
        assert_eq!(call.name, "a.b");
    }
}
