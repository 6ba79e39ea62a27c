//! Plain-text report rendering for the CLI.
//!
//! Every failed slot renders a distinct, human-readable placeholder per
//! failure kind.

use dyemind_aggregator::{AggregateResult, ProviderResult};
use dyemind_common::FailureKind;

pub fn placeholder(kind: FailureKind) -> &'static str {
    match kind {
        FailureKind::Timeout     => "service timed out, try again",
        FailureKind::NotFound    => "no results found",
        FailureKind::RateLimited => "service is throttling requests, try again shortly",
        FailureKind::Transport   => "could not reach the service",
        FailureKind::Unknown     => "service returned an unexpected response",
    }
}

fn slot_failure_line<T>(result: &ProviderResult<T>) -> String {
    match result.failure_kind() {
        Some(kind) => format!("[{}]", placeholder(kind)),
        None => String::new(),
    }
}

pub fn render(result: &AggregateResult) -> String {
    let mut out = String::new();

    out.push_str(&format!("# DyeMind report: {}\n", result.query));
    out.push_str(&format!("Fetched at {}\n\n", result.fetched_at.to_rfc3339()));

    out.push_str("## Structure\n");
    match &result.structure {
        ProviderResult::Success(record) => {
            out.push_str(&format!("CID: {}\n", record.cid));
            if let Some(ref smiles) = record.smiles {
                out.push_str(&format!("SMILES: {}\n", smiles));
            }
            if let Some(ref formula) = record.molecular_formula {
                out.push_str(&format!("Formula: {}\n", formula));
            }
            if let Some(weight) = record.molecular_weight {
                out.push_str(&format!("Weight: {} g/mol\n", weight));
            }
            out.push_str(&format!("Record: {}\n", record.record_url));
        }
        failure => out.push_str(&format!("{}\n", slot_failure_line(failure))),
    }

    out.push_str("\n## AI summary\n");
    match &result.summary {
        ProviderResult::Success(text) => out.push_str(&format!("{}\n", text)),
        failure => out.push_str(&format!("{}\n", slot_failure_line(failure))),
    }

    out.push_str("\n## Encyclopedia\n");
    match &result.encyclopedia {
        ProviderResult::Success(intro) => {
            out.push_str(&format!("{}\n", intro.extract));
            if let Some(ref url) = intro.page_url {
                out.push_str(&format!("Source: {}\n", url));
            }
        }
        failure => out.push_str(&format!("{}\n", slot_failure_line(failure))),
    }

    out.push_str("\n## Key literature\n");
    match &result.literature {
        ProviderResult::Success(articles) => {
            for article in articles {
                out.push_str(&format!("- {}", article.title));
                if let Some(ref pmid) = article.pmid {
                    out.push_str(&format!(" (PMID {})", pmid));
                }
                out.push('\n');
            }
        }
        failure => out.push_str(&format!("{}\n", slot_failure_line(failure))),
    }

    if let ProviderResult::Success(answer) = &result.qa {
        out.push_str("\n## Q&A\n");
        out.push_str(&format!("{}\n", answer));
    }

    out
}

/// Context handed to `ask()`: the generated summary plus the
/// encyclopedia intro, whichever of the two settled successfully.
pub fn answer_context(result: &AggregateResult) -> String {
    let mut parts = Vec::new();
    if let Some(summary) = result.summary.success() {
        parts.push(summary.clone());
    }
    if let Some(intro) = result.encyclopedia.success() {
        parts.push(intro.extract.clone());
    }
    parts.join("\n\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use dyemind_providers::models::PageIntro;
    use uuid::Uuid;

    fn sample() -> AggregateResult {
        AggregateResult {
            query: "Fluorescein".to_string(),
            query_id: Uuid::new_v4(),
            fetched_at: Utc::now(),
            structure: ProviderResult::failure(FailureKind::Timeout, "slot timed out"),
            literature: ProviderResult::failure(FailureKind::NotFound, "nothing"),
            summary: ProviderResult::Success("A dye summary.".to_string()),
            encyclopedia: ProviderResult::Success(PageIntro {
                title: "Fluorescein".to_string(),
                extract: "Fluorescein is an organic compound.".to_string(),
                page_url: None,
            }),
            qa: ProviderResult::failure(FailureKind::NotFound, "no question submitted"),
        }
    }

    #[test]
    fn test_placeholders_are_distinct() {
        let kinds = [
            FailureKind::Timeout,
            FailureKind::NotFound,
            FailureKind::RateLimited,
            FailureKind::Transport,
            FailureKind::Unknown,
        ];
        let texts: std::collections::HashSet<&str> =
            kinds.iter().map(|k| placeholder(*k)).collect();
        assert_eq!(texts.len(), kinds.len());
    }

    #[test]
    fn test_render_uses_per_kind_placeholders() {
        let report = render(&sample());
        assert!(report.contains("service timed out, try again"));
        assert!(report.contains("no results found"));
        assert!(report.contains("A dye summary."));
        // No question was asked, so no Q&A section.
        assert!(!report.contains("## Q&A"));
    }

    #[test]
    fn test_answer_context_combines_summary_and_intro() {
        let context = answer_context(&sample());
        assert!(context.contains("A dye summary."));
        assert!(context.contains("Fluorescein is an organic compound."));
    }

    #[test]
    fn test_answer_context_empty_when_nothing_settled() {
        let mut result = sample();
        result.summary = ProviderResult::failure(FailureKind::NotFound, "n/a");
        result.encyclopedia = ProviderResult::failure(FailureKind::NotFound, "n/a");
        assert!(answer_context(&result).is_empty());
    }
}
