//! YAML front matter between `---` fences.

use serde::de::DeserializeOwned;
use thiserror::Error;

/// A document split into typed front matter and its Markdown body.
#[derive(Debug, Clone, PartialEq)]
pub struct FrontMatter<'a, T> {
    /// Deserialized front matter.
    pub data: T,
    /// Everything after the closing fence.
    pub body: &'a str,
}

/// Errors emitted while extracting or parsing front matter.
#[derive(Debug, Error)]
pub enum FrontMatterError {
    /// Opening `---` without a closing one.
    #[error("Unterminated YAML front matter block: expected closing '---'")]
    Unterminated,
    /// YAML failed to parse or did not fit the expected shape.
    #[error("Front matter parse error: {0}")]
    Parse(String),
    /// Top-level YAML node was not a mapping.
    #[error("Front matter must be a YAML mapping at the top level")]
    InvalidRootType,
}

/// Split `input` into front matter of type `T` and the Markdown body.
///
/// A document without front matter deserializes `T` from an empty mapping,
/// so it succeeds only when every field of `T` has a default.
pub fn parse_front_matter<T: DeserializeOwned>(
    input: &str,
) -> Result<FrontMatter<'_, T>, FrontMatterError> {
    let (block, body_start) = find_yaml_block(input)?.unwrap_or(("", 0));
    let data = parse_yaml_block(block)?;
    Ok(FrontMatter {
        data,
        body: &input[body_start..],
    })
}

fn parse_yaml_block<T: DeserializeOwned>(block: &str) -> Result<T, FrontMatterError> {
    let value: serde_yaml::Value = if block.trim().is_empty() {
        serde_yaml::Value::Null
    } else {
        serde_yaml::from_str(block).map_err(|err| FrontMatterError::Parse(err.to_string()))?
    };

    let mapping = match value {
        serde_yaml::Value::Null => serde_yaml::Value::Mapping(Default::default()),
        serde_yaml::Value::Mapping(_) => value,
        _ => return Err(FrontMatterError::InvalidRootType),
    };
    serde_yaml::from_value(mapping).map_err(|err| FrontMatterError::Parse(err.to_string()))
}

/// The YAML text between the fences and the byte offset of the body.
///
/// Leading blank lines and a byte-order mark may precede the opening fence.
fn find_yaml_block(input: &str) -> Result<Option<(&str, usize)>, FrontMatterError> {
    let bom_len = if input.starts_with('\u{feff}') {
        '\u{feff}'.len_utf8()
    } else {
        0
    };

    let mut lines = LineCursor::new(input, bom_len);
    let block_start = loop {
        match lines.next() {
            Some((line, _)) if line.trim().is_empty() => continue,
            Some((line, next)) if is_yaml_fence(line) => break next,
            _ => return Ok(None),
        }
    };

    let mut block_end = block_start;
    for (line, next) in lines {
        if is_yaml_fence(line) {
            let block = input[block_start..block_end].trim_end_matches(['\r', '\n']);
            return Ok(Some((block, next)));
        }
        block_end = next;
    }
    Err(FrontMatterError::Unterminated)
}

fn is_yaml_fence(line: &str) -> bool {
    line.trim_end_matches('\r') == "---"
}

/// Lines of `input` from a byte offset, each with the offset after it.
struct LineCursor<'a> {
    input: &'a str,
    pos: usize,
}

impl<'a> LineCursor<'a> {
    fn new(input: &'a str, pos: usize) -> Self {
        Self { input, pos }
    }
}

impl<'a> Iterator for LineCursor<'a> {
    type Item = (&'a str, usize);

    fn next(&mut self) -> Option<Self::Item> {
        if self.pos >= self.input.len() {
            return None;
        }
        let rest = &self.input[self.pos..];
        let (line, consumed) = match rest.find('\n') {
            Some(idx) => (&rest[..idx], idx + 1),
            None => (rest, rest.len()),
        };
        self.pos += consumed;
        Some((line, self.pos))
    }
}
