//! Prompt construction for the two synthesis stages

use crate::index::Document;

/// Program skeleton the generated code must fill in. Only the two marked
/// regions are meant to change.
pub const CODE_TEMPLATE: &str = r#"```python
# Import the necessary libraries
import concept_forge as cf
from math import sin

from concept_forge import Entity
from concept_forge import Vec3

# Initialize the ConceptForge instance
forge = cf.ConceptForge()
forge.entities.clear()

# INITIALIZATION CODE
# Replace this block with code that initializes things
# like creating entities, setting starting parameters, etc.

while not forge.window_should_close():
    forge.calc_delta_time()
    forge.calc_projection()

    # UPDATION CODE HERE
    # Replace this with all the things that should update in the loop
    # like positions, rotations, scales, etc.

    forge.gui_management()
    forge.process_input()
    forge.render()
```"#;

/// Response that signals no implementation is possible
pub const REFUSAL_TOKEN: &str = "no";

/// Stage 1: ask for the signatures relevant to `query`
pub fn analysis_prompt(query: &str) -> String {
    format!(
        "Analyze this query and list all relevant functions that might be needed to implement it: {query}
List ONLY the function signatures that might be relevant, one per line.
Each function should contain the function name, its parameters (with type) and its return type, in the following format:
function_name(parameter_name: parameter_type) -> return_type

For example:
add_cube(pos: Vec3, rot: Vec3, scale: Vec3) -> None

Do not include any other text."
    )
}

/// Raw text of the retrieved documents, in retrieval order
pub fn available_functions(documents: &[Document]) -> String {
    documents
        .iter()
        .map(|d| d.content())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Stage 2: constrained synthesis against the available functions block
pub fn final_prompt(query: &str, available: &str) -> String {
    format!(
        "Based on the following function information, provide ONLY the code implementation for: {query}

Available functions are:
---
{available}
---

IMPORTANT: Respond ONLY with the code implementation inside a code block. If you cannot implement the solution, respond with '{REFUSAL_TOKEN}'.
Do not include any explanations or text outside the code block.

The template for the code block is:
{CODE_TEMPLATE}

Only write extra code in the INITIALIZATION CODE and UPDATION CODE sections and remove these comments after filling these sections.
Keep the rest of the code as it is.

DO NOT use any functions that are not in the available functions list.
"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_analysis_prompt_restates_query_and_format() {
        let prompt = analysis_prompt("create a cube");
        assert!(prompt.contains("implement it: create a cube\n"));
        assert!(prompt.contains("function_name(parameter_name: parameter_type) -> return_type"));
        assert!(prompt.ends_with("Do not include any other text."));
    }

    #[test]
    fn test_available_functions_keeps_order() {
        let docs = vec![Document::new("Function: B.b"), Document::new("Function: A.a")];
        assert_eq!(available_functions(&docs), "Function: B.b\nFunction: A.a");
        assert_eq!(available_functions(&[]), "");
    }

    #[test]
    fn test_final_prompt_contract() {
        let prompt = final_prompt("spin a cube", "Function: ConceptForge.add_cube");
        assert!(prompt.contains("code implementation for: spin a cube\n"));
        assert!(prompt.contains("---\nFunction: ConceptForge.add_cube\n---"));
        assert!(prompt.contains("respond with 'no'"));
        assert!(prompt.contains("# INITIALIZATION CODE"));
        assert!(prompt.contains("# UPDATION CODE HERE"));
        assert!(prompt.contains("while not forge.window_should_close():"));
        assert!(prompt.contains(
            "DO NOT use any functions that are not in the available functions list."
        ));
    }

    #[test]
    fn test_final_prompt_with_empty_block() {
        let prompt = final_prompt("anything", "");
        assert!(prompt.contains("Available functions are:\n---\n\n---"));
    }
}
