//! Restores enum labels that openapi-generator drops from TypeScript output.
//!
//! The generator emits `*-enum.ts` files whose members carry only raw values
//! (`NUMBER_1 = 1`). The patcher looks the enum up in the specification and
//! re-emits each member with its description as a doc comment, renaming the
//! member when `x-enum-varnames` is supplied. Raw values and their order are
//! never changed.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use inflections::case::to_pascal_case;
use regex::Regex;
use walkdir::WalkDir;

use crate::error::{GenerateError, Result};
use crate::spec_doc::{EnumLookup, SpecDocument, SpecEnumMetadata};

static DECLARATION_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(concat!(
        r"(?m)^[ \t]*export[ \t]+(?:(?:declare|const)[ \t]+)*",
        r"(enum|const)[ \t]+([A-Za-z_$][\w$]*)[ \t]*(=[ \t]*)?\{",
    ))
    .expect("bad regex")
});
static ANY_CAST_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^<\s*any\s*>\s*").expect("bad regex"));
static IDENTIFIER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z_$][\w$]*$").expect("bad regex"));

/// A generated file believed to define one enum type.
#[derive(Debug, Clone)]
pub struct EnumFileDescriptor {
    pub path: PathBuf,
    pub type_name: String,
    pub content: String,
}

/// Discovers enum files by a case-insensitive file name suffix and patches
/// them against the specification.
#[derive(Debug, Clone)]
pub struct EnumPatcher {
    suffix: &'static str,
}

impl EnumPatcher {
    /// typescript-axios naming: `payment-status-enum.ts`.
    pub fn typescript() -> Self {
        Self { suffix: "-enum.ts" }
    }

    /// Logical type name for `file_name`, or `None` if it is not an enum file.
    pub fn derive_type_name(&self, file_name: &str) -> Option<String> {
        let lower = file_name.to_ascii_lowercase();
        if !lower.ends_with(self.suffix) {
            return None;
        }
        let stem = &file_name[..file_name.len() - self.suffix.len()];
        if stem.is_empty() {
            return None;
        }
        Some(to_pascal_case(stem))
    }

    pub fn discover(&self, output_dir: &Path) -> Result<Vec<EnumFileDescriptor>> {
        let mut files = Vec::new();
        for entry in WalkDir::new(output_dir).sort_by_file_name() {
            let entry = entry.map_err(|err| {
                let path = err.path().unwrap_or(output_dir).to_path_buf();
                GenerateError::fs(path, err.into())
            })?;
            if !entry.file_type().is_file() {
                continue;
            }
            let Some(type_name) = entry
                .file_name()
                .to_str()
                .and_then(|name| self.derive_type_name(name))
            else {
                continue;
            };
            let path = entry.path().to_path_buf();
            let content = fs::read_to_string(&path).map_err(|err| GenerateError::fs(&path, err))?;
            files.push(EnumFileDescriptor {
                path,
                type_name,
                content,
            });
        }
        Ok(files)
    }

    /// Patches every enum file below `output_dir`.
    ///
    /// All files are checked against the specification before any is
    /// written, so a mismatch leaves the whole tree as generated.
    pub fn patch_tree(&self, output_dir: &Path, spec_path: &Path) -> Result<Vec<PathBuf>> {
        let files = self.discover(output_dir)?;
        if files.is_empty() {
            tracing::info!(dir = %output_dir.display(), "no enum files to patch");
            return Ok(Vec::new());
        }

        let mut spec = SpecDocument::open(spec_path)?;
        let mut rewrites = Vec::with_capacity(files.len());
        for file in &files {
            let candidates = vec![file.type_name.clone(), format!("{}Enum", file.type_name)];
            let metadata = match spec.find_enum(&candidates)? {
                EnumLookup::Found(metadata) => metadata,
                EnumLookup::NotEnum(message) => {
                    return Err(GenerateError::mismatch(&file.path, message));
                }
                EnumLookup::Missing => {
                    return Err(GenerateError::mismatch(
                        &file.path,
                        format!(
                            "no schema named {} in {}",
                            file.type_name,
                            spec.root().display()
                        ),
                    ));
                }
            };
            let patched = patch_enum_source(&file.content, &metadata)
                .map_err(|message| GenerateError::mismatch(&file.path, message))?;
            rewrites.push((file, patched));
        }

        let mut changed = Vec::new();
        for (file, patched) in rewrites {
            tracing::info!(file = %file.path.display(), type_name = %file.type_name, "patch enum");
            if patched == file.content {
                continue;
            }
            fs::write(&file.path, &patched).map_err(|err| GenerateError::fs(&file.path, err))?;
            changed.push(file.path.clone());
        }
        Ok(changed)
    }
}

/// One member of a generated enum body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnumMember {
    pub key: String,
    pub separator: char,
    /// Value text exactly as generated, e.g. `'active'` or `<any> 1`.
    pub literal: String,
    /// The value with quotes and casts removed.
    pub raw: String,
}

struct Declaration {
    /// Byte offset just past the opening `{`.
    body_start: usize,
    /// Byte offset of the closing `}`.
    body_end: usize,
}

/// Raw values of the first enum declaration in `source`, in order.
pub fn enum_raw_values(source: &str) -> std::result::Result<Vec<String>, String> {
    let declaration = find_declaration(source)?;
    let members = parse_members(&source[declaration.body_start..declaration.body_end])?;
    Ok(members.into_iter().map(|member| member.raw).collect())
}

/// Rewrites the enum body in `source` with labels from `metadata`.
///
/// Fails without producing output when a generated value is not declared by
/// the schema or a declared value is missing from the generated file.
pub fn patch_enum_source(
    source: &str,
    metadata: &SpecEnumMetadata,
) -> std::result::Result<String, String> {
    let declaration = find_declaration(source)?;
    let body = &source[declaration.body_start..declaration.body_end];
    let members = parse_members(body)?;

    for member in &members {
        if metadata.get(&member.raw).is_none() {
            return Err(format!(
                "value {:?} is not declared by schema {}",
                member.raw, metadata.type_name
            ));
        }
    }
    let missing: Vec<&str> = metadata
        .entries
        .iter()
        .filter(|entry| !members.iter().any(|member| member.raw == entry.raw))
        .map(|entry| entry.raw.as_str())
        .collect();
    if !missing.is_empty() {
        return Err(format!(
            "schema {} declares values missing from the generated enum: {}",
            metadata.type_name,
            missing.join(", ")
        ));
    }

    let indent = member_indent(body);
    let trailing_comma = has_trailing_comma(body);
    let mut rendered = String::from("\n");
    for (index, member) in members.iter().enumerate() {
        let entry = metadata
            .get(&member.raw)
            .ok_or_else(|| format!("value {:?} vanished during patching", member.raw))?;
        rendered.push_str(&doc_comment(&entry.label, &indent));
        let key = entry
            .name
            .as_deref()
            .map(member_key)
            .unwrap_or_else(|| member.key.clone());
        let spacing = if member.separator == '=' { " " } else { "" };
        rendered.push_str(&format!(
            "{indent}{key}{spacing}{} {}",
            member.separator, member.literal
        ));
        if index + 1 < members.len() || trailing_comma {
            rendered.push(',');
        }
        rendered.push('\n');
    }

    let closing_indent = closing_indent(source, declaration.body_end);
    let patched = format!(
        "{}{rendered}{closing_indent}{}",
        &source[..declaration.body_start],
        &source[declaration.body_end..]
    );

    let before: Vec<String> = members.into_iter().map(|member| member.raw).collect();
    let after = enum_raw_values(&patched)?;
    if before != after {
        return Err(format!(
            "patching would change the values of {}",
            metadata.type_name
        ));
    }
    Ok(patched)
}

fn find_declaration(source: &str) -> std::result::Result<Declaration, String> {
    let captures = DECLARATION_RE
        .captures(source)
        .ok_or_else(|| "no enum declaration found".to_string())?;
    let whole = captures.get(0).ok_or_else(|| "no enum declaration found".to_string())?;
    let is_const = captures.get(1).is_some_and(|kind| kind.as_str() == "const");
    if is_const != captures.get(3).is_some() {
        return Err("malformed enum declaration".to_string());
    }
    let body_start = whole.end();
    let body_end = find_closing_brace(source, body_start)
        .ok_or_else(|| "unterminated enum declaration".to_string())?;
    Ok(Declaration {
        body_start,
        body_end,
    })
}

/// Offset of the `}` closing the block that starts at `start`, skipping
/// strings and comments.
fn find_closing_brace(source: &str, start: usize) -> Option<usize> {
    let bytes = source.as_bytes();
    let mut depth = 0usize;
    let mut index = start;
    while index < bytes.len() {
        match bytes[index] {
            b'\'' | b'"' | b'`' => index = skip_string(bytes, index),
            b'/' if bytes.get(index + 1) == Some(&b'/') => index = skip_line_comment(bytes, index),
            b'/' if bytes.get(index + 1) == Some(&b'*') => index = skip_block_comment(bytes, index),
            b'{' => {
                depth += 1;
                index += 1;
            }
            b'}' => {
                if depth == 0 {
                    return Some(index);
                }
                depth -= 1;
                index += 1;
            }
            _ => index += 1,
        }
    }
    None
}

fn skip_string(bytes: &[u8], start: usize) -> usize {
    let quote = bytes[start];
    let mut index = start + 1;
    while index < bytes.len() {
        match bytes[index] {
            b'\\' => index += 2,
            byte if byte == quote => return index + 1,
            _ => index += 1,
        }
    }
    bytes.len()
}

fn skip_line_comment(bytes: &[u8], start: usize) -> usize {
    bytes[start..]
        .iter()
        .position(|byte| *byte == b'\n')
        .map_or(bytes.len(), |offset| start + offset)
}

fn skip_block_comment(bytes: &[u8], start: usize) -> usize {
    bytes[start + 2..]
        .windows(2)
        .position(|pair| pair == b"*/")
        .map_or(bytes.len(), |offset| start + 2 + offset + 2)
}

/// Splits an enum body into members, dropping comments.
fn parse_members(body: &str) -> std::result::Result<Vec<EnumMember>, String> {
    let bytes = body.as_bytes();
    let mut pieces: Vec<String> = Vec::new();
    let mut current = String::new();
    let mut index = 0;
    while index < bytes.len() {
        match bytes[index] {
            b'\'' | b'"' | b'`' => {
                let end = skip_string(bytes, index);
                current.push_str(&body[index..end]);
                index = end;
            }
            b'/' if bytes.get(index + 1) == Some(&b'/') => index = skip_line_comment(bytes, index),
            b'/' if bytes.get(index + 1) == Some(&b'*') => index = skip_block_comment(bytes, index),
            b',' => {
                pieces.push(std::mem::take(&mut current));
                index += 1;
            }
            _ => {
                let ch_len = body[index..].chars().next().map_or(1, char::len_utf8);
                current.push_str(&body[index..index + ch_len]);
                index += ch_len;
            }
        }
    }
    pieces.push(current);

    pieces
        .iter()
        .map(|piece| piece.trim())
        .filter(|piece| !piece.is_empty())
        .map(parse_member)
        .collect()
}

fn parse_member(text: &str) -> std::result::Result<EnumMember, String> {
    let bytes = text.as_bytes();
    let mut index = 0;
    let mut separator = None;
    while index < bytes.len() {
        match bytes[index] {
            b'\'' | b'"' | b'`' => index = skip_string(bytes, index),
            b'=' | b':' => {
                separator = Some(index);
                break;
            }
            _ => index += 1,
        }
    }
    let split = separator.ok_or_else(|| format!("enum member without a value: {text}"))?;
    let key = text[..split].trim().to_string();
    let literal = text[split + 1..].trim().to_string();
    if key.is_empty() || literal.is_empty() {
        return Err(format!("malformed enum member: {text}"));
    }
    let raw = literal_raw_value(&literal);
    Ok(EnumMember {
        key,
        separator: char::from(bytes[split]),
        literal,
        raw,
    })
}

fn literal_raw_value(literal: &str) -> String {
    let value = ANY_CAST_RE.replace(literal, "");
    let value = value.trim();
    let quoted = value.len() >= 2
        && matches!(value.as_bytes()[0], b'\'' | b'"' | b'`')
        && value.as_bytes()[value.len() - 1] == value.as_bytes()[0];
    if !quoted {
        return value.to_string();
    }

    let mut raw = String::new();
    let mut chars = value[1..value.len() - 1].chars();
    while let Some(ch) = chars.next() {
        if ch == '\\' {
            match chars.next() {
                Some('n') => raw.push('\n'),
                Some('t') => raw.push('\t'),
                Some(other) => raw.push(other),
                None => {}
            }
        } else {
            raw.push(ch);
        }
    }
    raw
}

fn member_key(name: &str) -> String {
    if IDENTIFIER_RE.is_match(name) {
        name.to_string()
    } else {
        format!("'{}'", name.replace('\\', "\\\\").replace('\'', "\\'"))
    }
}

fn doc_comment(label: &str, indent: &str) -> String {
    let mut out = format!("{indent}/**\n");
    for line in label.replace("*/", "*\\/").lines() {
        if line.trim().is_empty() {
            out.push_str(&format!("{indent} *\n"));
        } else {
            out.push_str(&format!("{indent} * {}\n", line.trim_end()));
        }
    }
    out.push_str(&format!("{indent} */\n"));
    out
}

fn member_indent(body: &str) -> String {
    body.lines()
        .map(|line| (line, line.trim_start()))
        .find(|(_, trimmed)| {
            !trimmed.is_empty()
                && !trimmed.starts_with("/*")
                && !trimmed.starts_with('*')
                && !trimmed.starts_with("//")
        })
        .map(|(line, trimmed)| line[..line.len() - trimmed.len()].to_string())
        .unwrap_or_else(|| "    ".to_string())
}

fn has_trailing_comma(body: &str) -> bool {
    let bytes = body.as_bytes();
    let mut last = None;
    let mut index = 0;
    while index < bytes.len() {
        match bytes[index] {
            b'\'' | b'"' | b'`' => {
                last = Some(b'\'');
                index = skip_string(bytes, index);
            }
            b'/' if bytes.get(index + 1) == Some(&b'/') => index = skip_line_comment(bytes, index),
            b'/' if bytes.get(index + 1) == Some(&b'*') => index = skip_block_comment(bytes, index),
            byte if byte.is_ascii_whitespace() => index += 1,
            byte => {
                last = Some(byte);
                index += 1;
            }
        }
    }
    last == Some(b',')
}

/// Whitespace preceding the closing brace on its own line, if any.
fn closing_indent(source: &str, body_end: usize) -> &str {
    let line_start = source[..body_end].rfind('\n').map_or(0, |idx| idx + 1);
    let prefix = &source[line_start..body_end];
    if prefix.trim().is_empty() { prefix } else { "" }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_cast_and_quoted_members() {
        let members = parse_members("\n    Active = <any> 'active',\n    Odd = \"a,b\"\n").unwrap();
        assert_eq!(members.len(), 2);
        assert_eq!(members[0].raw, "active");
        assert_eq!(members[0].literal, "<any> 'active'");
        assert_eq!(members[1].raw, "a,b");
    }

    #[test]
    fn detects_trailing_comma() {
        assert!(has_trailing_comma("\n A: 1,\n B: 2, // two\n"));
        assert!(!has_trailing_comma("\n A: 1,\n B: 2\n"));
    }

    #[test]
    fn escapes_comment_terminators_in_labels() {
        let comment = doc_comment("ends */ here", "  ");
        assert_eq!(comment, "  /**\n   * ends *\\/ here\n   */\n");
    }
}
