/*!
# Member Partitioner

Parses the members of a property literal straight from scanner tokens and
splits them into data fields ([`MemberKind::Value`]) and behavior
([`MemberKind::Method`]). Nothing is evaluated: value texts are kept as
written and method bodies are sliced verbatim from the source.
*/

use std::collections::HashMap;

use tracing::warn;

use crate::scanner::{find_matching, is_identifier, SyntaxError, Token, TokenKind};

/// How a property key was written
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyForm {
    Ident,
    Str,
    Number,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PropertyKey {
    /// Key as written, quotes included
    pub raw: String,
    /// Property name the key denotes
    pub name: String,
    pub form: KeyForm,
}

impl PropertyKey {
    /// Assignment target inside the generated constructor
    pub fn field_target(&self) -> String {
        match self.form {
            KeyForm::Ident => format!("this.{}", self.raw),
            KeyForm::Str if is_identifier(&self.name) => format!("this.{}", self.name),
            KeyForm::Str | KeyForm::Number => format!("this[{}]", self.raw),
        }
    }

    /// Name used in a class method declaration
    pub fn method_name(&self) -> &str {
        match self.form {
            KeyForm::Str if is_identifier(&self.name) => &self.name,
            _ => &self.raw,
        }
    }
}

/// Pieces of a method member needed to redeclare it in class form
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodParts {
    /// Declaration prefix: `""`, `"async "`, `"*"`, `"async *"`, `"get "` or `"set "`
    pub modifiers: String,
    /// Parameter list, parentheses included
    pub params: String,
    /// Block body with braces, or the expression of a concise arrow body
    pub body: String,
    pub expression_body: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MemberKind {
    Value,
    Method(MethodParts),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemberEntry {
    pub key: PropertyKey,
    pub kind: MemberKind,
    /// Original text of the member's value (for shorthand methods, the whole member)
    pub text: String,
    /// Byte offset of the member's key
    pub offset: usize,
}

impl MemberEntry {
    pub fn is_method(&self) -> bool {
        matches!(self.kind, MemberKind::Method(_))
    }

    /// `"get "` or `"set "` for accessors
    fn accessor(&self) -> Option<&str> {
        match &self.kind {
            MemberKind::Method(parts) if matches!(parts.modifiers.as_str(), "get " | "set ") => {
                Some(parts.modifiers.as_str())
            }
            _ => None,
        }
    }

    /// Slot this member occupies; a getter and a setter may share a key
    fn slot_name(&self) -> String {
        match self.accessor() {
            Some(accessor) => format!("{accessor}{}", self.key.name),
            None => self.key.name.clone(),
        }
    }

    /// Slots an earlier definition must hold for this one to replace it.
    ///
    /// A plain member replaces both accessors; an accessor replaces a plain
    /// member and its own kind of accessor.
    fn replaced_slots(&self) -> Vec<String> {
        let name = &self.key.name;
        match self.accessor() {
            Some(accessor) => vec![name.clone(), format!("{accessor}{name}")],
            None => vec![name.clone(), format!("get {name}"), format!("set {name}")],
        }
    }

    /// Apply a text rewrite to everything but the key
    pub fn map_text(mut self, mut rewrite: impl FnMut(&str) -> String) -> Self {
        self.text = rewrite(&self.text);
        if let MemberKind::Method(parts) = &mut self.kind {
            parts.params = rewrite(&parts.params);
            parts.body = rewrite(&parts.body);
        }
        self
    }
}

/// Split the tokens inside a property literal into members.
///
/// Duplicate keys keep the position of their first occurrence and the
/// contents of their last one, matching how an object literal evaluates.
/// A plain member and an accessor with the same key replace each other.
pub fn partition_members(source: &str, body: &[Token]) -> Result<Vec<MemberEntry>, SyntaxError> {
    let mut members: Vec<Option<MemberEntry>> = Vec::new();
    let mut positions: HashMap<String, usize> = HashMap::new();

    let mut idx = 0;
    while idx < body.len() {
        let end = member_end(source, body, idx);
        let member = &body[idx..end];
        if member.is_empty() {
            return Err(SyntaxError::new("unexpected ','", body[idx].start));
        }
        let entry = parse_member(source, member)?;

        if entry.key.name == "constructor" && entry.is_method() {
            return Err(SyntaxError::new(
                "a 'constructor' method collides with the generated constructor",
                entry.offset,
            ));
        }

        let replaced: Vec<usize> = entry
            .replaced_slots()
            .iter()
            .filter_map(|slot| positions.remove(slot))
            .collect();
        let slot = entry.slot_name();
        match replaced.iter().min() {
            Some(&first) => {
                warn!(member = %entry.key.name, "duplicate property key, last occurrence wins");
                for &idx in &replaced {
                    members[idx] = None;
                }
                members[first] = Some(entry);
                positions.insert(slot, first);
            }
            None => {
                positions.insert(slot, members.len());
                members.push(Some(entry));
            }
        }
        idx = end + 1;
    }

    Ok(members.into_iter().flatten().collect())
}

/// Index of the comma ending the member starting at `start`, or `body.len()`
fn member_end(source: &str, body: &[Token], start: usize) -> usize {
    let mut depth = 0usize;
    for (idx, token) in body.iter().enumerate().skip(start) {
        if token.kind != TokenKind::Punct {
            continue;
        }
        match token.text(source) {
            "(" | "[" | "{" => depth += 1,
            ")" | "]" | "}" => depth = depth.saturating_sub(1),
            "," if depth == 0 => return idx,
            _ => {}
        }
    }
    body.len()
}

fn parse_member(source: &str, tokens: &[Token]) -> Result<MemberEntry, SyntaxError> {
    let first = tokens[0];

    if first.is_punct(source, "...") {
        return Err(SyntaxError::new("spread members are not supported", first.start));
    }
    if first.is_punct(source, "[") {
        return Err(SyntaxError::new("computed property keys are not supported", first.start));
    }
    if first.is_punct(source, "*") {
        return shorthand_method(source, tokens, 1, "*");
    }
    if first.kind == TokenKind::Ident && tokens.len() > 2 && is_key_token(&tokens[1]) {
        match first.text(source) {
            "get" => return shorthand_method(source, tokens, 1, "get "),
            "set" => return shorthand_method(source, tokens, 1, "set "),
            "async" => return shorthand_method(source, tokens, 1, "async "),
            _ => {}
        }
    }
    if first.is_ident(source, "async") && tokens.get(1).is_some_and(|t| t.is_punct(source, "*")) {
        return shorthand_method(source, tokens, 2, "async *");
    }

    let key = parse_key(source, &first)?;
    match tokens.get(1) {
        None if key.form == KeyForm::Ident => Ok(MemberEntry {
            text: key.raw.clone(),
            key,
            kind: MemberKind::Value,
            offset: first.start,
        }),
        None => Err(SyntaxError::new(
            format!("missing value for property {}", key.raw),
            first.end,
        )),
        Some(token) if token.is_punct(source, ":") => {
            let value = &tokens[2..];
            let (Some(head), Some(tail)) = (value.first(), value.last()) else {
                return Err(SyntaxError::new(
                    format!("missing value for property {}", key.raw),
                    token.end,
                ));
            };
            Ok(MemberEntry {
                kind: classify_value(source, value)?,
                text: source[head.start..tail.end].to_string(),
                key,
                offset: first.start,
            })
        }
        Some(token) if token.is_punct(source, "(") => shorthand_method(source, tokens, 0, ""),
        Some(token) => Err(SyntaxError::new(
            format!("expected ':' after property key {}, found '{}'", key.raw, token.text(source)),
            token.start,
        )),
    }
}

fn is_key_token(token: &Token) -> bool {
    matches!(token.kind, TokenKind::Ident | TokenKind::Str | TokenKind::Number)
}

fn parse_key(source: &str, token: &Token) -> Result<PropertyKey, SyntaxError> {
    let raw = token.text(source).to_string();
    let (name, form) = match token.kind {
        TokenKind::Ident => (raw.clone(), KeyForm::Ident),
        TokenKind::Number => (raw.clone(), KeyForm::Number),
        TokenKind::Str => (token.string_value(source).unwrap_or_default(), KeyForm::Str),
        _ => {
            return Err(SyntaxError::new(
                format!("unexpected '{raw}' where a property key was expected"),
                token.start,
            ))
        }
    };
    Ok(PropertyKey { raw, name, form })
}

/// `key(params) { body }` with `modifiers` consumed from `tokens[..key_idx]`
fn shorthand_method(
    source: &str,
    tokens: &[Token],
    key_idx: usize,
    modifiers: &str,
) -> Result<MemberEntry, SyntaxError> {
    let key_token = tokens.get(key_idx).ok_or_else(|| {
        SyntaxError::new("expected a method name", tokens[tokens.len() - 1].end)
    })?;
    let key = parse_key(source, key_token)?;
    let (params, body, body_end) = params_and_block(source, tokens, key_idx + 1)?;
    if body_end != tokens.len() - 1 {
        return Err(SyntaxError::new(
            format!("unexpected tokens after method {}", key.raw),
            tokens[body_end + 1].start,
        ));
    }

    Ok(MemberEntry {
        key,
        kind: MemberKind::Method(MethodParts {
            modifiers: modifiers.to_string(),
            params,
            body,
            expression_body: false,
        }),
        text: source[tokens[0].start..tokens[tokens.len() - 1].end].to_string(),
        offset: key_token.start,
    })
}

/// Slice `( ... ) { ... }` starting at `tokens[open]`; returns the index of the closing brace
fn params_and_block(
    source: &str,
    tokens: &[Token],
    open: usize,
) -> Result<(String, String, usize), SyntaxError> {
    let at = |idx: usize| tokens.get(idx).map_or(tokens[tokens.len() - 1].end, |t| t.start);

    if !tokens.get(open).is_some_and(|t| t.is_punct(source, "(")) {
        return Err(SyntaxError::new("expected '(' to open a parameter list", at(open)));
    }
    let params_close = find_matching(tokens, open, source)?;
    let body_open = params_close + 1;
    if !tokens.get(body_open).is_some_and(|t| t.is_punct(source, "{")) {
        return Err(SyntaxError::new("expected '{' to open a method body", at(body_open)));
    }
    let body_close = find_matching(tokens, body_open, source)?;

    Ok((
        source[tokens[open].start..tokens[params_close].end].to_string(),
        source[tokens[body_open].start..tokens[body_close].end].to_string(),
        body_close,
    ))
}

/// Decide whether a `key: <value>` member is a method
fn classify_value(source: &str, value: &[Token]) -> Result<MemberKind, SyntaxError> {
    if let Some(parts) = function_expression(source, value)? {
        return Ok(MemberKind::Method(parts));
    }
    if let Some(parts) = arrow_function(source, value)? {
        return Ok(MemberKind::Method(parts));
    }
    Ok(MemberKind::Value)
}

/// `[async] function [*] [name] (params) { body }` spanning the whole value
fn function_expression(source: &str, value: &[Token]) -> Result<Option<MethodParts>, SyntaxError> {
    let mut idx = 0;
    let mut modifiers = String::new();
    if value[0].is_ident(source, "async") && value.get(1).is_some_and(|t| t.is_ident(source, "function")) {
        modifiers.push_str("async ");
        idx = 1;
    }
    if !value[idx].is_ident(source, "function") {
        return Ok(None);
    }
    idx += 1;
    if value.get(idx).is_some_and(|t| t.is_punct(source, "*")) {
        modifiers.push('*');
        idx += 1;
    }
    if value.get(idx).is_some_and(|t| t.kind == TokenKind::Ident) {
        idx += 1;
    }

    let (params, body, body_end) = params_and_block(source, value, idx)?;
    if body_end != value.len() - 1 {
        // `function () {}.bind(this)` and friends evaluate to something else
        return Ok(None);
    }
    Ok(Some(MethodParts {
        modifiers,
        params,
        body,
        expression_body: false,
    }))
}

/// `[async] (params) => body` or `[async] param => body`
fn arrow_function(source: &str, value: &[Token]) -> Result<Option<MethodParts>, SyntaxError> {
    let mut idx = 0;
    let mut modifiers = String::new();
    if value[0].is_ident(source, "async") && value.len() > 2 {
        modifiers.push_str("async ");
        idx = 1;
    }

    let params_token = value[idx];
    let (params, arrow) = if params_token.is_punct(source, "(") {
        let close = find_matching(value, idx, source)?;
        (source[params_token.start..value[close].end].to_string(), close + 1)
    } else if params_token.kind == TokenKind::Ident {
        (format!("({})", params_token.text(source)), idx + 1)
    } else {
        return Ok(None);
    };
    if !value.get(arrow).is_some_and(|t| t.is_punct(source, "=>")) {
        return Ok(None);
    }

    let body = &value[arrow + 1..];
    let Some(head) = body.first() else {
        return Err(SyntaxError::new("missing arrow function body", value[arrow].end));
    };
    let tail = body[body.len() - 1];
    let block = head.is_punct(source, "{") && find_matching(body, 0, source)? == body.len() - 1;

    Ok(Some(MethodParts {
        modifiers,
        params,
        body: source[head.start..tail.end].to_string(),
        expression_body: !block,
    }))
}
