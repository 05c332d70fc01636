//! Integration tests exercising the full pipeline across module boundaries:
//! detect → weigh → decay → conflicts → assemble.

use approx::assert_relative_eq;
use caas_core::{
    Candidate, CandidateId, ContentBonus, ContextRequest, ConversationWindow, Document,
    DocumentType, EngineConfig, Section, SourceAuthority, assemble, build_context,
    compute_weight, decay, detect_document_type,
};
use proptest::prelude::*;

const DAY: u64 = 86_400;

/// Repeat `sentence` and cut to exactly `len` ASCII characters.
fn sized(sentence: &str, len: usize) -> String {
    let mut s = sentence.repeat(len / sentence.len() + 1);
    s.truncate(len);
    s
}

fn legal_contract() -> Document {
    let mut doc = Document::new("msa", "Master Services Agreement")
        .with_type(DocumentType::LegalContract)
        .with_updated_at(1_700_000_000);
    doc.push_section(
        "Definitions",
        &sized("Capitalised terms have the meanings set out here. ", 600),
    );
    doc.push_section(
        "Termination",
        &sized("Either party must give ninety days written notice. ", 400),
    );
    doc
}

/// Definitions: 2.0 (title) × 1.10 (long body) × 1.15 (first).
/// Termination: 1.5 (title) × 1.15 (must) × 1.10 (last) × 1.5 (query).
#[test]
fn query_and_importance_marker_compound_past_definitions() {
    let doc = legal_contract();
    assert_eq!(doc.sections[0].char_len(), 600);
    assert_eq!(doc.sections[1].char_len(), 400);

    let config = EngineConfig::from_toml_str("half_life_days = 365\nwindow_capacity = 10\n")
        .expect("config");
    let request = ContextRequest::new(1_000_000, doc.updated_at).with_query("termination");
    let resp = build_context(&[doc], &[], &request, &config).expect("build");

    let defs = &resp.weights_applied[0];
    let term = &resp.weights_applied[1];
    assert_eq!(defs.title, "Definitions");
    assert_eq!(term.title, "Termination");

    assert_eq!(defs.breakdown.content_bonuses, vec![ContentBonus::LongBody]);
    assert_eq!(defs.breakdown.query_bonus, 0.0);
    assert_relative_eq!(defs.weight, 2.53, epsilon = 1e-12);

    assert_eq!(
        term.breakdown.content_bonuses,
        vec![ContentBonus::ImportanceMarker]
    );
    assert_eq!(term.breakdown.position_bonus, 0.10);
    assert_eq!(term.breakdown.query_bonus, 0.50);
    assert_eq!(term.breakdown.matched_query_term.as_deref(), Some("termination"));
    assert_relative_eq!(term.weight, 2.84625, epsilon = 1e-12);

    assert_eq!(defs.decay_factor, 1.0);
    assert_eq!(term.decay_factor, 1.0);
    assert!(term.weight > defs.weight);

    assert_eq!(resp.sections_used, vec!["Termination", "Definitions"]);
    assert_eq!(
        resp.used_ids,
        vec![CandidateId::section("msa", 1), CandidateId::section("msa", 0)]
    );
    assert!(resp.context.starts_with("## Termination\n"));
    assert_eq!(resp.excluded_count, 0);
    assert!(resp.conflicts.is_empty());
}

#[test]
fn definitions_outweighs_miscellaneous_in_contracts() {
    let body = "Each clause applies to both sides equally.";
    let defs = Section::new("Definitions", body, 1);
    let misc = Section::new("Miscellaneous", body, 1);
    let t = DocumentType::LegalContract;
    assert!(compute_weight(&defs, 3, t, None) > compute_weight(&misc, 3, t, None));
}

#[test]
fn detection_feeds_weighting() {
    let mut doc = Document::new("nda", "NDA");
    doc.push_section(
        "Recitals",
        "WHEREAS the parties wish to exchange information, the parties hereby agree.",
    );
    doc.push_section("Confidentiality", "Each party shall keep information secret.");
    assert_eq!(detect_document_type(&doc), DocumentType::LegalContract);

    let config = EngineConfig::new(30.0, 4);
    let resp = build_context(&[doc], &[], &ContextRequest::new(500, 0), &config).unwrap();
    assert_eq!(resp.documents[0].detected_type, DocumentType::LegalContract);
    // "confidential" ×1.4 × last 1.10 beats "recitals" ×0.8 × first 1.15
    assert_eq!(resp.sections_used[0], "Confidentiality");
}

#[test]
fn empty_assembly_is_valid() {
    let ctx = assemble(&[], 100, &[]).expect("empty assemble");
    assert!(ctx.is_empty());
    assert_eq!(ctx.total_tokens(), 0);
    assert!(ctx.used_ids().is_empty());
}

#[test]
fn custom_detection_rules_from_config() {
    let config = EngineConfig::from_toml_str(
        r#"
half_life_days = 7
window_capacity = 3

[document_type_rules]
tutorial = ["recipe"]
"#,
    )
    .unwrap();
    let mut doc = Document::new("pasta", "Pasta");
    doc.push_section("Recipe", "This recipe serves four.");
    let resp = build_context(&[doc], &[], &ContextRequest::new(100, 0), &config).unwrap();
    assert_eq!(resp.documents[0].detected_type, DocumentType::Tutorial);
}

#[test]
fn window_snapshot_feeds_assembly() {
    let config = EngineConfig::new(1.0, 2);
    let mut window = config.new_window().unwrap();
    window.append("first question about invoices", 0);
    window.append("second question about invoices", DAY);
    window.append("third question about refunds", 2 * DAY);

    let turns = window.snapshot();
    assert_eq!(turns.len(), 2);

    let request = ContextRequest::new(1000, 2 * DAY).with_query("refunds");
    let resp = build_context(&[], &turns, &request, &config).unwrap();
    // turn 3 is fresh and matches the query, turn 2 is one half-life old
    assert_eq!(resp.used_ids, vec![CandidateId::turn(3), CandidateId::turn(2)]);
    assert_eq!(resp.weights_applied[0].weight, 0.5);
    assert_eq!(resp.weights_applied[1].weight, 1.5);
    assert!(resp.sections_used.is_empty());
}

#[test]
fn conflicts_only_reported_for_selected_pairs() {
    let mut official = Document::new("handbook", "Handbook");
    official
        .push_section("Expense claims", "Expense claims require manager approval within 30 days.")
        .authority = SourceAuthority::Official;
    let mut informal = Document::new("wiki", "Team wiki");
    informal
        .push_section(
            "Expense claims",
            &format!(
                "Expense claims approval by the manager is no longer needed. {}",
                "padding ".repeat(80)
            ),
        )
        .authority = SourceAuthority::Informal;

    let config = EngineConfig::new(90.0, 5);
    let docs = [official, informal];

    let roomy = build_context(&docs, &[], &ContextRequest::new(10_000, 0), &config).unwrap();
    assert_eq!(roomy.conflicts.len(), 1);
    assert_eq!(roomy.conflicts[0].marker, "no longer");

    // the padded informal section no longer fits
    let tight = build_context(&docs, &[], &ContextRequest::new(30, 0), &config).unwrap();
    assert_eq!(tight.used_ids, vec![CandidateId::section("handbook", 0)]);
    assert!(tight.conflicts.is_empty());
}

#[test]
fn old_documents_rank_below_fresh_ones() {
    let mut old = Document::new("old", "Old").with_updated_at(0);
    old.push_section("Notes", "The same content.");
    let mut fresh = Document::new("fresh", "Fresh").with_updated_at(100 * DAY);
    fresh.push_section("Notes", "The same content.");

    let config = EngineConfig::new(30.0, 5);
    let resp =
        build_context(&[old, fresh], &[], &ContextRequest::new(100, 100 * DAY), &config).unwrap();
    assert_eq!(resp.used_ids[0], CandidateId::section("fresh", 0));
}

fn arb_candidates() -> impl Strategy<Value = Vec<Candidate>> {
    prop::collection::vec((0.0f64..10.0, 0usize..400, 0usize..20), 0..40).prop_map(|specs| {
        specs
            .into_iter()
            .enumerate()
            .map(|(i, (weight, chars, position))| {
                Candidate::new(
                    CandidateId::section(&format!("d{i}"), position),
                    "t",
                    "",
                    "x".repeat(chars),
                    position,
                    weight,
                    SourceAuthority::Unknown,
                )
            })
            .collect()
    })
}

proptest! {
    #[test]
    fn decay_is_monotonic(
        weight in 0.0f64..1000.0,
        age in 0.0f64..1e9,
        delta in 0.0f64..1e9,
        half_life in 1.0f64..1e9,
    ) {
        let earlier = decay(weight, age, half_life).unwrap();
        let later = decay(weight, age + delta, half_life).unwrap();
        prop_assert!(later <= earlier, "{later} > {earlier}");
        prop_assert_eq!(decay(weight, 0.0, half_life).unwrap(), weight);
    }

    #[test]
    fn assembly_respects_budget(candidates in arb_candidates(), budget in 1i64..500) {
        let ctx = assemble(&candidates, budget, &[]).unwrap();
        prop_assert!(ctx.total_tokens() as i64 <= budget);
        let summed: usize = ctx.entries().iter().map(|e| e.tokens).sum();
        prop_assert_eq!(summed, ctx.total_tokens());
        prop_assert_eq!(ctx.entries().len() + ctx.excluded_count(), candidates.len());
    }

    #[test]
    fn skipped_candidates_never_fit_leftover(candidates in arb_candidates(), budget in 1i64..500) {
        let ctx = assemble(&candidates, budget, &[]).unwrap();
        let used = ctx.used_ids();
        for c in candidates.iter().filter(|c| !used.contains(&c.id)) {
            prop_assert!(ctx.total_tokens() + c.tokens > budget as usize);
        }
    }

    #[test]
    fn selection_is_weight_ordered(candidates in arb_candidates()) {
        let ctx = assemble(&candidates, 1_000_000, &[]).unwrap();
        for pair in ctx.entries().windows(2) {
            prop_assert!(pair[0].weight >= pair[1].weight);
        }
    }

    #[test]
    fn window_keeps_most_recent_in_order(capacity in 1usize..20, n in 0usize..50) {
        let mut window = ConversationWindow::new(capacity).unwrap();
        for i in 0..n {
            window.append(&format!("turn {i}"), i as u64);
        }
        let kept: Vec<String> = window.snapshot().into_iter().map(|t| t.text).collect();
        let expected: Vec<String> = (n.saturating_sub(capacity)..n)
            .map(|i| format!("turn {i}"))
            .collect();
        prop_assert_eq!(kept, expected);
    }

    #[test]
    fn weights_are_deterministic(
        title in "[A-Za-z ]{0,20}",
        body in "[A-Za-z .]{0,600}",
        position in 0usize..5,
        query in "[a-z ]{0,12}",
        age in 0.0f64..1e8,
    ) {
        let section = Section::new(&title, &body, position);
        let q = caas_core::QueryTerms::new(&query);
        let t = DocumentType::LegalContract;
        let a = decay(compute_weight(&section, 5, t, Some(&q)), age, 3.0e7).unwrap();
        let b = decay(compute_weight(&section, 5, t, Some(&q)), age, 3.0e7).unwrap();
        prop_assert_eq!(a.to_bits(), b.to_bits());
        prop_assert!(a >= 0.0);
    }
}
