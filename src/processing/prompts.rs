//! Prompt templates for the map-reduce pipeline.
//!
//! Pure functions of their inputs; no I/O.

/// Section headings the final report must contain, in order.
pub const REPORT_SECTIONS: [&str; 3] = [
    "Root Cause Analysis",
    "Developer Learnings & Action Items",
    "QA Learnings & Action Items",
];

/// Map stage: summarize one chunk of the conversation.
/// `index` is 1-based.
pub fn map_prompt(chunk: &str, index: usize, total: usize) -> String {
    format!(
        r#"You are an incident analyst reviewing a Slack conversation about a production incident.
This is part {index} of {total} of the conversation, in chronological order. Threads appear directly after the message that started them.

Summarize this part. Capture:
- symptoms, timeline and impact
- suspected and confirmed causes
- fixes, workarounds and decisions
- follow-ups and who owns them

Keep concrete details (services, error messages, issue keys, timestamps). Do not invent facts that are not in the text.

## Conversation (part {index}/{total})
{chunk}"#
    )
}

/// Batch reduce: merge a group of partial summaries into one.
pub fn batch_reduce_prompt(summaries: &[&str], level: u32) -> String {
    format!(
        r#"You are consolidating partial incident summaries (merge level {level}).
Merge the {count} summaries below into a single summary. Remove duplicates, keep chronological order, and preserve every distinct fact, cause, decision and follow-up.

{listing}"#,
        count = summaries.len(),
        listing = numbered(summaries),
    )
}

/// Final reduce: one deduplicated report with the fixed sections.
pub fn final_reduce_prompt(summaries: &[&str]) -> String {
    format!(
        r#"You are writing the final incident report from the partial summaries below.
Produce a single deduplicated report with exactly these sections:

## {rca}
What happened, the timeline, and the root cause (distinguish confirmed from suspected).

## {dev}
What developers should learn and the concrete action items.

## {qa}
What QA should learn and the concrete action items (tests, monitoring, release checks).

Use bullet points. Do not repeat the same item in several sections.

{listing}"#,
        rca = REPORT_SECTIONS[0],
        dev = REPORT_SECTIONS[1],
        qa = REPORT_SECTIONS[2],
        listing = numbered(summaries),
    )
}

/// Final reduce, structured mode: the answer must be a single JSON object.
pub fn structured_final_prompt(summaries: &[&str]) -> String {
    format!(
        r#"You are writing the final incident report from the partial summaries below.
Return JSON only, no markdown, no explanation, matching:
{{"summary":"...","action_items":[{{"title":"...","description":"...","assignee":null,"priority":"high|medium|low","category":"dev|qa|ops","confidence":0.0-1.0}}],"categories":["..."],"confidence":0.0-1.0}}

Rules:
- "summary" covers the root cause analysis in a few sentences.
- One action item per distinct follow-up; no duplicates.
- "assignee" is a person named in the summaries, or null.
- "confidence" reflects how well the conversation supports the item.

{listing}"#,
        listing = numbered(summaries),
    )
}

fn numbered(summaries: &[&str]) -> String {
    summaries
        .iter()
        .enumerate()
        .map(|(i, s)| format!("### Summary {}\n{}", i + 1, s.trim()))
        .collect::<Vec<_>>()
        .join("\n\n")
}
