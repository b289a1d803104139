//! Doc string signature parsing
//!
//! The first non-empty line of a doc string is read as a call signature
//! (`name(a: int, b) -> bool`), the remaining lines as prose. Parsing never
//! fails: malformed documentation degrades to the sentinel values.

use super::entry::{ParamMap, ANY_TYPE, NO_DESCRIPTION, UNKNOWN_TYPE};

/// Result of parsing one doc string
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedDoc {
    pub description: String,
    pub parameters: ParamMap,
    pub return_type: String,
}

impl ParsedDoc {
    fn empty() -> Self {
        Self {
            description: NO_DESCRIPTION.to_string(),
            parameters: ParamMap::new(),
            return_type: UNKNOWN_TYPE.to_string(),
        }
    }

    /// False when the description is blank or the placeholder sentinel
    pub fn has_description(&self) -> bool {
        let description = self.description.trim();
        !description.is_empty() && !description.eq_ignore_ascii_case(NO_DESCRIPTION)
    }
}

/// Parser for signature-style doc strings
pub struct SignatureParser;

impl SignatureParser {
    /// Parse a doc string into description, parameters and return type
    pub fn parse(doc: Option<&str>) -> ParsedDoc {
        let Some(doc) = doc else {
            return ParsedDoc::empty();
        };

        let lines: Vec<&str> = doc
            .split(['\n', '\r'])
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .collect();

        let Some((signature, prose)) = lines.split_first() else {
            return ParsedDoc::empty();
        };

        let description = if prose.is_empty() {
            NO_DESCRIPTION.to_string()
        } else {
            prose.join(" ")
        };

        let (parameters, return_type) = parse_signature_line(signature);

        ParsedDoc {
            description,
            parameters,
            return_type,
        }
    }
}

/// Extract parameters and return type from a signature line
///
/// The parameter list runs from the first `(` to its balanced `)`, so
/// nested types like `List[Tuple[int, int]]` stay whole.
fn parse_signature_line(line: &str) -> (ParamMap, String) {
    let mut parameters = ParamMap::new();

    let Some(open) = line.find('(') else {
        return (parameters, UNKNOWN_TYPE.to_string());
    };
    let Some(close) = matching_paren(line, open) else {
        return (parameters, UNKNOWN_TYPE.to_string());
    };

    for token in split_top_level(&line[open + 1..close]) {
        let token = token.trim();
        if token.is_empty() || token == "self" {
            continue;
        }
        match token.split_once(':') {
            Some((name, ty)) => {
                let name = name.trim();
                if name.is_empty() || name == "self" {
                    continue;
                }
                parameters.insert(name.to_string(), ty.trim().to_string());
            }
            None => {
                parameters.insert(token.to_string(), ANY_TYPE.to_string());
            }
        }
    }

    let return_type = line[close + 1..]
        .trim_start()
        .strip_prefix("->")
        .map(str::trim)
        .filter(|ty| !ty.is_empty())
        .unwrap_or(UNKNOWN_TYPE)
        .to_string();

    (parameters, return_type)
}

/// Byte index of the `)` closing the `(` at `open`
fn matching_paren(line: &str, open: usize) -> Option<usize> {
    let mut depth = 0usize;
    for (idx, ch) in line[open..].char_indices() {
        match ch {
            '(' => depth += 1,
            ')' => {
                depth -= 1;
                if depth == 0 {
                    return Some(open + idx);
                }
            }
            _ => {}
        }
    }
    None
}

/// Split on commas that are not nested inside brackets
fn split_top_level(params: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut start = 0;

    for (idx, ch) in params.char_indices() {
        match ch {
            '(' | '[' | '{' => depth += 1,
            ')' | ']' | '}' => depth = depth.saturating_sub(1),
            ',' if depth == 0 => {
                parts.push(&params[start..idx]);
                start = idx + 1;
            }
            _ => {}
        }
    }
    parts.push(&params[start..]);
    parts
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_empty(parsed: &ParsedDoc) {
        assert_eq!(parsed.description, "No description");
        assert!(parsed.parameters.is_empty());
        assert_eq!(parsed.return_type, "Unknown");
    }

    #[test]
    fn test_missing_and_blank_docs() {
        assert_empty(&SignatureParser::parse(None));
        assert_empty(&SignatureParser::parse(Some("")));
        assert_empty(&SignatureParser::parse(Some("   \n\t\n  ")));
    }

    #[test]
    fn test_typed_and_untyped_parameters() {
        let parsed = SignatureParser::parse(Some("f(a: int, b) -> bool\nDoes a thing."));
        assert_eq!(parsed.description, "Does a thing.");
        assert_eq!(parsed.parameters.get("a").map(String::as_str), Some("int"));
        assert_eq!(parsed.parameters.get("b").map(String::as_str), Some("Any"));
        assert_eq!(parsed.parameters.len(), 2);
        assert_eq!(parsed.return_type, "bool");
    }

    #[test]
    fn test_description_lines_joined() {
        let doc = "
            add_cube(self, pos: Vec3) -> Entity

            Add a cube to the scene
              at the given position.
        ";
        let parsed = SignatureParser::parse(Some(doc));
        assert_eq!(
            parsed.description,
            "Add a cube to the scene at the given position."
        );
        assert_eq!(parsed.return_type, "Entity");
    }

    #[test]
    fn test_signature_without_parentheses() {
        let parsed = SignatureParser::parse(Some("render -> None\nDraw the frame."));
        assert!(parsed.parameters.is_empty());
        assert_eq!(parsed.return_type, "Unknown");
        assert_eq!(parsed.description, "Draw the frame.");
    }

    #[test]
    fn test_self_is_never_a_parameter() {
        let parsed = SignatureParser::parse(Some("m(self, x: int, self: Foo)\nText"));
        assert!(!parsed.parameters.contains_key("self"));
        assert_eq!(parsed.parameters.len(), 1);
    }

    #[test]
    fn test_signature_only_has_no_description() {
        let parsed = SignatureParser::parse(Some("clear(self) -> None"));
        assert_eq!(parsed.description, "No description");
        assert!(!parsed.has_description());
        assert_eq!(parsed.return_type, "None");
    }

    #[test]
    fn test_nested_brackets_stay_whole() {
        let parsed = SignatureParser::parse(Some(
            "f(x: List[Tuple[int,int]], cb: Callable[[int], None]) -> None\nNested.",
        ));
        assert_eq!(parsed.parameters.get("x").map(String::as_str), Some("List[Tuple[int,int]]"));
        assert_eq!(parsed.parameters.get("cb").map(String::as_str), Some("Callable[[int], None]"));
        assert_eq!(parsed.return_type, "None");
    }

    #[test]
    fn test_type_split_on_first_colon_only() {
        let parsed = SignatureParser::parse(Some("f(x: a:b)\nText"));
        assert_eq!(parsed.parameters.get("x").map(String::as_str), Some("a:b"));
    }

    #[test]
    fn test_unbalanced_parentheses_degrade() {
        let parsed = SignatureParser::parse(Some("f(a: int -> bool\nText"));
        assert!(parsed.parameters.is_empty());
        assert_eq!(parsed.return_type, "Unknown");
    }

    #[test]
    fn test_trailing_text_without_arrow() {
        let parsed = SignatureParser::parse(Some("f(a) returns nothing\nText"));
        assert_eq!(parsed.parameters.get("a").map(String::as_str), Some("Any"));
        assert_eq!(parsed.return_type, "Unknown");
    }

    #[test]
    fn test_carriage_returns_separate_lines() {
        let parsed = SignatureParser::parse(Some("f(a)\rDoes a thing."));
        assert_eq!(parsed.description, "Does a thing.");
        assert_eq!(parsed.parameters.get("a").map(String::as_str), Some("Any"));

        let parsed = SignatureParser::parse(Some("f(a) -> int\r\nFirst.\r\nSecond."));
        assert_eq!(parsed.description, "First. Second.");
        assert_eq!(parsed.return_type, "int");
    }

    #[test]
    fn test_sentinel_description_is_case_insensitive() {
        let parsed = SignatureParser::parse(Some("f()\n  NO DESCRIPTION  "));
        assert!(!parsed.has_description());
    }
}
