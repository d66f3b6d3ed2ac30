//! Tolerant reader for OFX markup.
//!
//! OFX 1.x is SGML: leaf elements carry a value and usually have no closing
//! tag, aggregates are always closed. OFX 2.x is XML and closes everything.
//! Both reduce to the same element tree here. The header block (either
//! `KEY:VALUE` lines or an XML prolog) ends at the `<OFX>` tag and is skipped.

use std::path::Path;

use crate::{ClientError, ClientResult};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OfxElement {
    pub name: String,
    pub text: Option<String>,
    pub children: Vec<OfxElement>,
}

impl OfxElement {
    fn named(name: &str) -> Self {
        Self {
            name: name.to_string(),
            text: None,
            children: Vec::new(),
        }
    }

    fn is_leaf(&self) -> bool {
        self.text.is_some()
    }

    pub fn child(&self, name: &str) -> Option<&OfxElement> {
        self.children.iter().find(|child| child.name == name)
    }

    pub fn children_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a OfxElement> {
        self.children.iter().filter(move |child| child.name == name)
    }

    /// Text of the element reached by following `path` through direct children.
    pub fn text_at(&self, path: &[&str]) -> Option<&str> {
        let mut current = self;
        for name in path {
            current = current.child(name)?;
        }
        current.text.as_deref()
    }

    /// Every descendant whose name is in `names`, in document order. Matches
    /// are not searched for nested matches.
    pub fn find_all<'a>(&'a self, names: &[&str]) -> Vec<&'a OfxElement> {
        let mut found = Vec::new();
        for child in &self.children {
            if names.contains(&child.name.as_str()) {
                found.push(child);
            } else {
                found.extend(child.find_all(names));
            }
        }
        found
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Token {
    Open(String),
    Close(String),
    Text(String),
}

/// Parses `content` and returns its `<OFX>` element.
pub fn parse_document(file: &Path, content: &str) -> ClientResult<OfxElement> {
    let body_start = find_ofx_start(content).ok_or_else(|| {
        ClientError::parse_failure(file, "no <OFX> element was found; is this an OFX/QFX file?")
    })?;
    let tokens = tokenize(&content[body_start..])
        .map_err(|detail| ClientError::parse_failure(file, &detail))?;
    let mut document =
        build_tree(tokens).map_err(|detail| ClientError::parse_failure(file, &detail))?;

    let position = document
        .children
        .iter()
        .position(|child| child.name == "OFX")
        .ok_or_else(|| ClientError::parse_failure(file, "the <OFX> element is empty"))?;
    Ok(document.children.swap_remove(position))
}

fn find_ofx_start(content: &str) -> Option<usize> {
    let upper = content.to_ascii_uppercase();
    let mut offset = 0;
    while let Some(found) = upper[offset..].find("<OFX") {
        let start = offset + found;
        let next = upper[start + 4..].chars().next();
        if matches!(next, Some('>') | Some(' ') | Some('\t') | Some('\r') | Some('\n')) {
            return Some(start);
        }
        offset = start + 4;
    }
    None
}

fn tokenize(body: &str) -> Result<Vec<Token>, String> {
    let mut tokens = Vec::new();
    let mut rest = body;

    while !rest.is_empty() {
        let Some(open) = rest.find('<') else {
            push_text(&mut tokens, rest);
            break;
        };
        push_text(&mut tokens, &rest[..open]);

        let after = &rest[open + 1..];
        let Some(close) = after.find('>') else {
            return Err("a tag is missing its closing `>`".to_string());
        };
        let tag = after[..close].trim();
        rest = &after[close + 1..];

        if tag.starts_with('?') || tag.starts_with('!') {
            continue;
        }
        if let Some(name) = tag.strip_prefix('/') {
            tokens.push(Token::Close(tag_name(name)?));
        } else if let Some(name) = tag.strip_suffix('/') {
            let name = tag_name(name)?;
            tokens.push(Token::Open(name.clone()));
            tokens.push(Token::Close(name));
        } else {
            tokens.push(Token::Open(tag_name(tag)?));
        }
    }

    Ok(tokens)
}

fn tag_name(raw: &str) -> Result<String, String> {
    let name = raw.split_whitespace().next().unwrap_or_default();
    if name.is_empty() {
        return Err("found an empty tag `<>`".to_string());
    }
    Ok(name.to_ascii_uppercase())
}

fn push_text(tokens: &mut Vec<Token>, raw: &str) {
    let trimmed = raw.trim();
    if !trimmed.is_empty() {
        tokens.push(Token::Text(decode_entities(trimmed)));
    }
}

fn build_tree(tokens: Vec<Token>) -> Result<OfxElement, String> {
    let mut stack = vec![OfxElement::named("")];

    for token in tokens {
        match token {
            Token::Open(name) => {
                close_open_leaf(&mut stack, None);
                stack.push(OfxElement::named(&name));
            }
            Token::Text(text) => {
                let depth = stack.len();
                let Some(top) = stack.last_mut() else {
                    return Err("text found outside of any element".to_string());
                };
                if top.children.is_empty() && top.text.is_none() && depth > 1 {
                    top.text = Some(text);
                }
            }
            Token::Close(name) => {
                close_open_leaf(&mut stack, Some(&name));
                let Some(depth) = stack.iter().skip(1).rposition(|element| element.name == name)
                else {
                    return Err(format!("found </{name}> without a matching <{name}>"));
                };
                // Unclosed SGML elements between here and the match are closed implicitly.
                while stack.len() > depth + 1 {
                    pop_into_parent(&mut stack);
                }
            }
        }
    }

    close_open_leaf(&mut stack, None);
    if stack.len() > 1 {
        let unclosed = stack
            .iter()
            .skip(1)
            .map(|element| element.name.as_str())
            .collect::<Vec<&str>>()
            .join(" > ");
        return Err(format!("the document ends inside <{unclosed}>"));
    }

    stack.pop().ok_or_else(|| "the document is empty".to_string())
}

/// An SGML leaf ends at the next tag unless that tag is its own closing tag.
fn close_open_leaf(stack: &mut Vec<OfxElement>, closing: Option<&str>) {
    let Some(top) = stack.last() else {
        return;
    };
    if stack.len() > 1 && top.is_leaf() && closing != Some(top.name.as_str()) {
        pop_into_parent(stack);
    }
}

fn pop_into_parent(stack: &mut Vec<OfxElement>) {
    if stack.len() < 2 {
        return;
    }
    if let Some(element) = stack.pop()
        && let Some(parent) = stack.last_mut()
    {
        parent.children.push(element);
    }
}

fn decode_entities(raw: &str) -> String {
    if !raw.contains('&') {
        return raw.to_string();
    }

    let mut decoded = String::with_capacity(raw.len());
    let mut rest = raw;
    while let Some(start) = rest.find('&') {
        decoded.push_str(&rest[..start]);
        let candidate = &rest[start..];
        let replacement = candidate
            .find(';')
            .filter(|end| *end <= 10)
            .and_then(|end| entity_value(&candidate[1..end]).map(|value| (value, end)));
        match replacement {
            Some((value, end)) => {
                decoded.push(value);
                rest = &candidate[end + 1..];
            }
            None => {
                decoded.push('&');
                rest = &candidate[1..];
            }
        }
    }
    decoded.push_str(rest);
    decoded
}

fn entity_value(entity: &str) -> Option<char> {
    match entity {
        "amp" => Some('&'),
        "lt" => Some('<'),
        "gt" => Some('>'),
        "quot" => Some('"'),
        "apos" => Some('\''),
        "nbsp" => Some(' '),
        _ => {
            let number = entity.strip_prefix('#')?;
            let code = match number.strip_prefix(['x', 'X']) {
                Some(hex) => u32::from_str_radix(hex, 16).ok()?,
                None => number.parse::<u32>().ok()?,
            };
            char::from_u32(code)
        }
    }
}
