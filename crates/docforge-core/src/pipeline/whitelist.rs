//! Advisory check that generated code only calls available functions
//!
//! Nothing is rejected: callers log what this reports.

use std::collections::HashSet;

use regex::Regex;

use super::prompts::CODE_TEMPLATE;

/// Names that may be called without appearing in the available block
const BUILTINS: &[&str] = &[
    "print", "range", "len", "int", "float", "str", "bool", "list", "dict", "tuple", "set",
    "abs", "min", "max", "round", "sum", "enumerate", "zip", "isinstance", "sin", "cos", "sqrt",
    "if", "elif", "while", "for", "and", "or", "not", "in", "return",
];

/// Called identifiers in `response` that the available block does not document
///
/// Calls are identifiers directly followed by `(`. Both class and member
/// names from `Function: Class.member` lines count as documented, as does
/// anything the code template itself calls.
pub fn find_unlisted_calls(response: &str, available: &str) -> Vec<String> {
    let Ok(call_pattern) = Regex::new(r"([A-Za-z_][A-Za-z0-9_]*)\s*\(") else {
        return Vec::new();
    };

    let mut allowed: HashSet<String> = BUILTINS.iter().map(|s| s.to_string()).collect();
    allowed.extend(called_names(&call_pattern, CODE_TEMPLATE));
    for line in available.lines() {
        if let Some(function) = line.trim().strip_prefix("Function:") {
            allowed.extend(function.trim().split('.').map(str::to_string));
        }
    }

    let mut unlisted = Vec::new();
    for name in called_names(&call_pattern, extract_code(response)) {
        if !allowed.contains(&name) && !unlisted.contains(&name) {
            unlisted.push(name);
        }
    }
    unlisted
}

fn called_names(pattern: &Regex, code: &str) -> Vec<String> {
    code.lines()
        .map(|line| line.split('#').next().unwrap_or(""))
        .flat_map(|line| {
            pattern
                .captures_iter(line)
                .map(|caps| caps[1].to_string())
                .collect::<Vec<_>>()
        })
        .collect()
}

/// Body of the first fenced code block, or the whole text when there is none
pub fn extract_code(response: &str) -> &str {
    let Some(start) = response.find("```") else {
        return response;
    };
    let after_fence = &response[start + 3..];
    let body_start = after_fence.find('\n').map(|i| i + 1).unwrap_or(after_fence.len());
    let body = &after_fence[body_start..];
    match body.find("```") {
        Some(end) => &body[..end],
        None => body,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const AVAILABLE: &str = "Function: ConceptForge.add_cube\nDescription: Add a cube\nParameters: {}\nReturns: Entity\n\
                             Function: Vec3.__add__\nDescription: Sum\nParameters: {}\nReturns: Vec3";

    #[test]
    fn test_extract_code() {
        assert_eq!(extract_code("```python\nx = 1\n```\ntrailing"), "x = 1\n");
        assert_eq!(extract_code("no fences"), "no fences");
        assert_eq!(extract_code("```\nunterminated"), "unterminated");
    }

    #[test]
    fn test_documented_and_template_calls_pass() {
        let response = "```python\nforge = cf.ConceptForge()\ncube = forge.add_cube(Vec3(0, 0, 0), Vec3(0, 0, 0), Vec3(1, 1, 1))\nwhile not forge.window_should_close():\n    forge.render()\n    print(sin(1.0))\n```";
        assert!(find_unlisted_calls(response, AVAILABLE).is_empty());
    }

    #[test]
    fn test_undocumented_calls_are_reported_once() {
        let response = "```python\nforge.spawn_dragon(1)\nforge.spawn_dragon(2)  # again\nforge.add_cube(a, b, c)\n# forge.commented_out()\n```";
        assert_eq!(find_unlisted_calls(response, AVAILABLE), vec!["spawn_dragon"]);
    }

    #[test]
    fn test_refusal_has_no_calls() {
        assert!(find_unlisted_calls("no", "").is_empty());
    }
}
