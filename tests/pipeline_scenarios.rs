//! End-to-end scenarios for the pure pipeline: patch text and model text
//! in, scheduled review batches out. No provider is involved.

use pretty_assertions::assert_eq;
use suggestbot::anchor;
use suggestbot::annotations::{self, ExtractionStrategy, ResponseSource};
use suggestbot::batch::{BatchTitles, schedule};
use suggestbot::diff::LineMap;
use suggestbot::diff::parser::split_unified_diff;
use suggestbot::models::{Anchor, Side, ValidatedAnnotation};
use suggestbot::orchestrator::{ReviewOutcome, analyze_patch};

const PATCH: &str = "@@ -1,2 +1,3 @@\n line1\n+added line\n line2";

#[test]
fn single_issue_becomes_one_unlabeled_review() {
    let file = analyze_patch(
        "app.py",
        PATCH,
        Some(r#"{"issues":[{"line":2,"severity":"high","message":"x","suggestion":"fixed"}]}"#),
    );

    assert_eq!(
        file.annotations,
        vec![ValidatedAnnotation {
            start_line: 2,
            end_line: 2,
            severity: "high".into(),
            message: "x".into(),
            suggestion: "fixed".into(),
        }]
    );
    assert_eq!(file.comments.len(), 1);
    assert_eq!(file.comments[0].anchor, Anchor::Line { line: 2, side: Side::Right });
    assert_eq!(
        file.comments[0].body,
        "**HIGH**: x\n\n```suggestion\nfixed\n```"
    );

    let outcome = ReviewOutcome::from_comments(file.comments, &BatchTitles::default());
    let batches = outcome.batches();
    assert_eq!(batches.len(), 1);
    assert_eq!(batches[0].len(), 1);
    assert_eq!(batches[0].title, "AI Code Review Complete");
}

#[test]
fn forty_five_annotations_split_into_thirty_and_fifteen() {
    let hunk: String = (1..=45).map(|n| format!("+line {n}\n")).collect();
    let patch = format!("@@ -0,0 +1,45 @@\n{hunk}");
    let records: Vec<String> = (1..=45)
        .map(|n| format!(r#"{{"line":{n},"message":"m{n}","suggestion":"s{n}"}}"#))
        .collect();
    let response = format!(r#"{{"issues":[{}]}}"#, records.join(","));

    let file = analyze_patch("big.py", &patch, Some(&response));
    assert_eq!(file.annotations.len(), 45);
    assert_eq!(file.stats.off_map, 0);

    let titles = BatchTitles::default();
    let batches = schedule(file.comments, &titles);
    assert_eq!(batches.len(), 2);
    assert_eq!((batches[0].len(), batches[1].len()), (30, 15));
    assert_eq!(batches[0].title, "AI Code Review (Part 1)");
    assert_eq!(batches[1].title, "AI Code Review (Part 2)");
    assert_eq!(batches[1].comments[0].anchor.start(), 31);
}

#[test]
fn prose_wrapped_and_fenced_responses_agree() {
    let map = LineMap::from_patch(PATCH);
    let object = r#"{"issues":[{"start_line":2,"end_line":2,"severity":"low","message":"tidy","suggestion":"added_line"}]}"#;

    let prose = format!("Sure! Here is my review: {object} Let me know if you need more.");
    let fenced = format!("```json\n{object}\n```");

    let from_prose = annotations::normalize_response(Some(&prose), &map);
    let from_fence = annotations::normalize_response(Some(&fenced), &map);

    assert_eq!(from_prose.annotations, from_fence.annotations);
    assert_eq!(from_prose.annotations.len(), 1);
    assert_eq!(
        from_prose.stats.source,
        ResponseSource::Extracted(ExtractionStrategy::Braces)
    );
    assert_eq!(
        from_fence.stats.source,
        ResponseSource::Extracted(ExtractionStrategy::Fenced)
    );
}

#[test]
fn garbage_response_yields_no_issues() {
    let file = analyze_patch("app.py", PATCH, Some("I could not review this file."));
    assert!(file.annotations.is_empty());
    assert_eq!(file.stats.source, ResponseSource::Unparseable);

    let outcome = ReviewOutcome::from_comments(file.comments, &BatchTitles::default());
    assert_eq!(outcome, ReviewOutcome::NoIssues);
}

#[test]
fn multi_file_diff_keeps_file_order_and_numbering() {
    let diff = "diff --git a/app.py b/app.py
index 1111111..2222222 100644
--- a/app.py
+++ b/app.py
@@ -1,2 +1,3 @@
 import os
+import sys
 print(os.name)
diff --git a/lib/util.py b/lib/util.py
index 3333333..4444444 100644
--- a/lib/util.py
+++ b/lib/util.py
@@ -10,3 +10,4 @@ def helper():
     a = 1
-    b = 2
+    b = 3
+    c = 4
     return a
";
    let files = split_unified_diff(diff);
    assert_eq!(files.len(), 2);

    let app = LineMap::from_patch(&files[0].patch);
    assert_eq!(app.iter().collect::<Vec<_>>(), vec![(2, "import sys")]);

    let util = LineMap::from_patch(&files[1].patch);
    assert_eq!(
        util.iter().collect::<Vec<_>>(),
        vec![(11, "    b = 3"), (12, "    c = 4")]
    );

    let util_report = analyze_patch(
        &files[1].path,
        &files[1].patch,
        Some(r#"[{"start_line":12,"end_line":11,"suggestion":"    b = 3\n    c = 5"}]"#),
    );
    let comment = &util_report.comments[0];
    assert_eq!(comment.path, "lib/util.py");
    assert_eq!(
        comment.anchor,
        Anchor::Range {
            start_line: 11,
            start_side: Side::Right,
            line: 12,
            side: Side::Right,
        }
    );
    assert!(comment.body.starts_with("**INFO**: Suggestion\n\n"));
}

#[test]
fn renormalizing_validated_annotations_is_a_fixed_point() {
    let map = LineMap::from_patch(PATCH);
    let first = annotations::normalize_response(
        Some(r#"[{"line":"2","suggestion":"a"},{"start_line":5,"end_line":3,"suggestion":"b"},{"line":0,"suggestion":"c"}]"#),
        &map,
    );
    assert_eq!(first.stats.received, 3);
    assert_eq!(first.stats.kept, 2);
    assert_eq!(first.stats.dropped, 1);
    assert_eq!(first.stats.off_map, 1);

    let again = annotations::normalize_records(first.annotations.iter().map(Into::into));
    assert_eq!(again, first.annotations);

    let comments = anchor::resolve_all(&again, "app.py");
    assert_eq!(comments[1].anchor.start(), 3);
    assert_eq!(comments[1].anchor.end(), 5);
}
