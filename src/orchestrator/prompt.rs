//! Prompt construction for per-file review.

use crate::diff::LineMap;
use crate::models::FilePatch;

/// System prompt sent with every file.
pub const SYSTEM_PROMPT: &str = "You are an expert code reviewer. \
    You reply with JSON only and propose concrete replacement code for every issue you report.";

/// Build the user prompt for a single file.
///
/// The added-line listing gives the model the new-file numbering so it can
/// report line numbers that anchor correctly.
pub fn build_prompt(file: &FilePatch, line_map: &LineMap) -> String {
    let path = file.path.as_str();
    let mut prompt = format!("## Changes in `{path}`\n\n");

    if file.is_new {
        prompt.push_str("This file is new; every line below was added.\n\n");
    } else if file.is_rename && file.old_path != file.path {
        prompt.push_str(&format!("This file was renamed from `{}`.\n\n", file.old_path));
    }

    prompt.push_str(&format!("```diff\n{}\n```\n\n", file.patch.trim_end()));

    if !line_map.is_empty() {
        prompt.push_str("## Added lines (new-file line numbers)\n\n```\n");
        for (line, content) in line_map.iter() {
            prompt.push_str(&format!("{line}: {content}\n"));
        }
        prompt.push_str("```\n\n");
    }

    prompt.push_str(&format!(
        "## Instructions\n\n\
        Review the changes to `{path}` and identify:\n\
        1. Potential bugs or errors\n\
        2. Security vulnerabilities\n\
        3. Performance issues\n\
        4. Code style improvements\n\n\
        Respond with a JSON object of this shape:\n\n\
        {{\"issues\": [{{\"line\": <int>, \"start_line\": <int>, \"end_line\": <int>, \
        \"severity\": \"high|medium|low\", \"message\": \"<description>\", \
        \"suggestion\": \"<replacement code>\"}}]}}\n\n\
        - Line numbers refer to the new version of the file, as listed above.\n\
        - Use \"line\" for a single-line issue. Use \"start_line\" and \"end_line\" when the \
        suggestion replaces several consecutive lines.\n\
        - \"suggestion\" must be the complete replacement code for exactly those lines, \
        not a description of the fix.\n\
        - Omit issues you cannot express as a code replacement.\n\n\
        If there are no issues, return {{\"issues\": []}}\n"
    ));

    prompt
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prompt_contains_patch_numbering_and_shape() {
        let file = FilePatch::modified("app.py", "@@ -1,2 +1,3 @@\n line1\n+added line\n line2\n");
        let prompt = build_prompt(&file, &LineMap::from_patch(&file.patch));
        assert!(prompt.contains("```diff\n@@ -1,2 +1,3 @@"));
        assert!(prompt.contains("2: added line\n"));
        assert!(prompt.contains("`app.py`"));
        assert!(prompt.contains("{\"issues\": []}"));
    }

    #[test]
    fn prompt_without_added_lines_skips_listing() {
        let file = FilePatch::modified("a.ts", "@@ -1,2 +1,1 @@\n keep\n-gone\n");
        let prompt = build_prompt(&file, &LineMap::from_patch(&file.patch));
        assert!(!prompt.contains("## Added lines"));
        assert!(!prompt.contains("This file"));
    }

    #[test]
    fn new_and_renamed_files_are_called_out() {
        let mut file = FilePatch::modified("src/new.rs", "@@ -0,0 +1 @@\n+fn a() {}\n");
        file.is_new = true;
        let prompt = build_prompt(&file, &LineMap::from_patch(&file.patch));
        assert!(prompt.contains("This file is new"));

        let mut file = FilePatch::modified("src/b.rs", "@@ -1 +1 @@\n-x\n+y\n");
        file.old_path = "src/a.rs".into();
        file.is_rename = true;
        let prompt = build_prompt(&file, &LineMap::from_patch(&file.patch));
        assert!(prompt.contains("renamed from `src/a.rs`"));
    }
}
