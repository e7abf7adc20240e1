//! Prompt rendering — pure string assembly over a [`RagContext`].
//!
//! The system prompt carries the persona, the retrieved knowledge and the
//! answering rules; the user prompt carries the financial blocks and the
//! literal question. Neither touches any state.

use std::fmt::Write;

use crate::context::RagContext;
use crate::format::labels;

/// Persona, knowledge digest and behavioral rules.
pub fn build_system_prompt(ctx: &RagContext) -> String {
    let l = labels(ctx.output_language);
    let mut prompt = String::new();

    let _ = write!(prompt, "{}\n\n", l.persona);

    if !ctx.documents.is_empty() {
        let _ = writeln!(prompt, "{}", l.knowledge_header);
        for scored in &ctx.documents {
            let doc = &scored.document;
            let _ = writeln!(prompt, "• {}: {}", doc.topic, doc.content(ctx.prefer_secondary));
        }
        prompt.push('\n');
    }

    let _ = writeln!(prompt, "{}", l.rules_header);
    for (i, rule) in l.rules.iter().enumerate() {
        let _ = writeln!(prompt, "{}. {}", i + 1, rule);
    }

    prompt
}

/// Financial blocks followed by the question.
pub fn build_user_prompt(ctx: &RagContext, user_query: &str) -> String {
    let l = labels(ctx.output_language);
    let mut prompt = String::new();

    if !ctx.financial_summary.is_empty() {
        let _ = writeln!(prompt, "{}", l.financial_data_header);
        let _ = writeln!(prompt, "{}", ctx.financial_summary);
    }

    for block in [&ctx.budget_status, &ctx.spending_pattern, &ctx.comparison, &ctx.trend] {
        if !block.is_empty() {
            let _ = writeln!(prompt, "{block}");
        }
    }

    let _ = write!(prompt, "{}\n{}", l.question_header, user_query);
    prompt
}

/// Canned answer for when the language model cannot be reached.
///
/// The financial summary (if any) followed by three generic tips picked
/// by whether the question is about spending, saving, or neither.
pub fn fallback_response(ctx: &RagContext, user_query: &str) -> String {
    let l = labels(ctx.output_language);
    let mut response = String::new();

    if !ctx.financial_summary.is_empty() {
        let _ = writeln!(response, "{}", ctx.financial_summary);
    }

    let _ = writeln!(response, "\n{}", l.advice_header);

    let query = user_query.to_lowercase();
    let tips = if ["chi tiêu", "tiêu", "spend"].iter().any(|k| query.contains(k)) {
        l.spending_advice
    } else if ["tiết kiệm", "save", "saving"].iter().any(|k| query.contains(k)) {
        l.saving_advice
    } else {
        l.general_advice
    };

    let lines: Vec<String> = tips.iter().map(|tip| format!("• {tip}")).collect();
    response.push_str(&lines.join("\n"));
    response
}
