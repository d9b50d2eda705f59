//! Tests for fallback chain ordering and failure absorption.

use super::doubles::{CompositeScript, GeneratorScript, Harness, RetrieverScript};
use crate::rag::{AnswerOrigin, Strategy, APOLOGY};
use kbchat_core::AppError;

const QUESTION: &str = "What is the refund window?";
const KB: &str = "KB12345";

#[tokio::test]
async fn test_grounded_answer_wins() {
    let harness = Harness::new(
        RetrieverScript::Passages(vec!["alpha", "beta"]),
        CompositeScript::Text("composite"),
        vec![GeneratorScript::blocks("X")],
    );

    let answer = harness.orchestrator.answer(QUESTION, KB).await.unwrap();

    assert_eq!(answer, "X");
    assert_eq!(harness.retriever.calls(), 1);
    assert_eq!(harness.generator.calls(), 1);
    assert_eq!(harness.composite.calls(), 0);
}

#[tokio::test]
async fn test_grounded_prompt_embeds_citations() {
    let harness = Harness::new(
        RetrieverScript::Passages(vec!["alpha", "beta"]),
        CompositeScript::Fail,
        vec![GeneratorScript::completion("Y")],
    );

    let answer = harness.orchestrator.answer(QUESTION, KB).await.unwrap();
    assert_eq!(answer, "Y");

    let prompts = harness.generator.prompts();
    assert_eq!(prompts.len(), 1);
    assert!(prompts[0].contains(&format!("\"{}\"", QUESTION)));
    assert!(prompts[0].ends_with("Citation 1: alpha\n\nCitation 2: beta\n\n"));
}

#[tokio::test]
async fn test_grounded_answer_reports_sources() {
    let harness = Harness::new(
        RetrieverScript::Passages(vec!["alpha", "beta"]),
        CompositeScript::Fail,
        vec![GeneratorScript::blocks("X")],
    );

    let detailed = harness
        .orchestrator
        .answer_detailed(QUESTION, KB, &Default::default())
        .await
        .unwrap();

    assert_eq!(detailed.strategy, AnswerOrigin::Grounded);
    assert_eq!(detailed.sources.len(), 2);
    assert_eq!(detailed.sources[1].text, "beta");
    assert!(detailed.failures.is_empty());
}

#[tokio::test]
async fn test_retriever_failure_falls_to_composite() {
    let harness = Harness::new(
        RetrieverScript::Fail,
        CompositeScript::Text("From the composite call"),
        vec![GeneratorScript::blocks("unused")],
    );

    let detailed = harness
        .orchestrator
        .answer_detailed(QUESTION, KB, &Default::default())
        .await
        .unwrap();

    assert_eq!(detailed.answer, "From the composite call");
    assert_eq!(detailed.strategy, AnswerOrigin::Composite);
    assert!(detailed.sources.is_empty());
    assert_eq!(harness.generator.calls(), 0);

    assert_eq!(detailed.failures.len(), 1);
    assert_eq!(detailed.failures[0].strategy, Strategy::RetrieveThenGenerate);
    assert!(detailed.failures[0].error.contains("ServiceUnavailableException"));
}

#[tokio::test]
async fn test_empty_retrieval_falls_to_composite() {
    let harness = Harness::new(
        RetrieverScript::Passages(vec![]),
        CompositeScript::Text("Z"),
        vec![],
    );

    let detailed = harness
        .orchestrator
        .answer_detailed(QUESTION, KB, &Default::default())
        .await
        .unwrap();

    assert_eq!(detailed.answer, "Z");
    assert_eq!(harness.generator.calls(), 0);
    assert_eq!(detailed.failures[0].kind, "retrieval");
}

#[tokio::test]
async fn test_grounded_generation_failure_falls_to_composite() {
    let harness = Harness::new(
        RetrieverScript::Passages(vec!["alpha"]),
        CompositeScript::Text("Z"),
        vec![GeneratorScript::Fail],
    );

    let detailed = harness
        .orchestrator
        .answer_detailed(QUESTION, KB, &Default::default())
        .await
        .unwrap();

    assert_eq!(detailed.answer, "Z");
    assert_eq!(harness.generator.calls(), 1);
    assert_eq!(harness.composite.calls(), 1);
    assert_eq!(detailed.failures[0].kind, "generation");

    // Passages from the abandoned grounded attempt are not cited
    assert!(detailed.sources.is_empty());
}

#[tokio::test]
async fn test_malformed_grounded_response_falls_through() {
    let harness = Harness::new(
        RetrieverScript::Passages(vec!["alpha"]),
        CompositeScript::Text("Z"),
        vec![GeneratorScript::malformed()],
    );

    let detailed = harness
        .orchestrator
        .answer_detailed(QUESTION, KB, &Default::default())
        .await
        .unwrap();

    assert_eq!(detailed.answer, "Z");
    assert_eq!(detailed.failures[0].kind, "malformed_response");
}

#[tokio::test]
async fn test_direct_generation_after_retrieval_paths_fail() {
    let harness = Harness::new(
        RetrieverScript::Fail,
        CompositeScript::Fail,
        vec![GeneratorScript::completion("Direct answer")],
    );

    let detailed = harness
        .orchestrator
        .answer_detailed(QUESTION, KB, &Default::default())
        .await
        .unwrap();

    assert_eq!(detailed.answer, "Direct answer");
    assert_eq!(detailed.strategy, AnswerOrigin::Direct);
    assert_eq!(
        detailed
            .failures
            .iter()
            .map(|f| f.strategy)
            .collect::<Vec<_>>(),
        vec![Strategy::RetrieveThenGenerate, Strategy::RetrieveAndGenerate]
    );

    let prompts = harness.generator.prompts();
    assert_eq!(prompts.len(), 1);
    assert!(prompts[0].starts_with(&format!("Please answer this question: {}", QUESTION)));
    assert!(prompts[0].contains("don't have enough information"));
    assert!(!prompts[0].contains("Citation"));
}

#[tokio::test]
async fn test_composite_without_output_falls_to_direct() {
    let harness = Harness::new(
        RetrieverScript::Fail,
        CompositeScript::NoOutput,
        vec![GeneratorScript::blocks("D")],
    );

    let answer = harness.orchestrator.answer(QUESTION, KB).await.unwrap();
    assert_eq!(answer, "D");
    assert_eq!(harness.composite.calls(), 1);
}

#[tokio::test]
async fn test_missing_composite_counts_as_failure() {
    let harness = Harness::without_composite(
        RetrieverScript::Passages(vec![]),
        vec![GeneratorScript::blocks("D")],
    );

    let detailed = harness
        .orchestrator
        .answer_detailed(QUESTION, KB, &Default::default())
        .await
        .unwrap();

    assert_eq!(detailed.answer, "D");
    assert_eq!(harness.composite.calls(), 0);
    assert_eq!(detailed.failures[1].strategy, Strategy::RetrieveAndGenerate);
    assert!(detailed.failures[1].error.contains("not available"));
}

#[tokio::test]
async fn test_all_strategies_fail_returns_apology() {
    let harness = Harness::new(
        RetrieverScript::Fail,
        CompositeScript::Fail,
        vec![GeneratorScript::Fail],
    );

    let detailed = harness
        .orchestrator
        .answer_detailed(QUESTION, KB, &Default::default())
        .await
        .unwrap();

    assert_eq!(detailed.answer, APOLOGY);
    assert!(detailed.is_apology());
    assert_eq!(detailed.failures.len(), 3);
    assert_eq!(detailed.failures[2].strategy, Strategy::DirectGeneration);
}

#[tokio::test]
async fn test_unparsable_direct_output_returns_apology() {
    let harness = Harness::new(
        RetrieverScript::Fail,
        CompositeScript::Fail,
        vec![GeneratorScript::malformed()],
    );

    let answer = harness.orchestrator.answer(QUESTION, KB).await.unwrap();
    assert_eq!(answer, APOLOGY);
}

#[tokio::test]
async fn test_each_strategy_attempted_once() {
    let harness = Harness::new(
        RetrieverScript::Passages(vec!["alpha"]),
        CompositeScript::Fail,
        vec![GeneratorScript::Fail, GeneratorScript::Fail],
    );

    let answer = harness.orchestrator.answer(QUESTION, KB).await.unwrap();

    assert_eq!(answer, APOLOGY);
    assert_eq!(harness.retriever.calls(), 1);
    assert_eq!(harness.composite.calls(), 1);
    assert_eq!(harness.generator.calls(), 2);
}

#[tokio::test]
async fn test_empty_question_rejected_without_calls() {
    let harness = Harness::new(
        RetrieverScript::Passages(vec!["alpha"]),
        CompositeScript::Text("Z"),
        vec![GeneratorScript::blocks("X")],
    );

    let err = harness.orchestrator.answer("", "kb1").await.unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));

    let err = harness.orchestrator.answer("q", "").await.unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));

    let err = harness.orchestrator.answer("  ", "kb1").await.unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));

    assert_eq!(harness.total_calls(), 0);
}

#[tokio::test]
async fn test_valid_input_never_errors() {
    let retrievers = || {
        vec![
            RetrieverScript::Passages(vec!["alpha"]),
            RetrieverScript::Passages(vec![]),
            RetrieverScript::Fail,
        ]
    };
    let composites = || {
        vec![
            CompositeScript::Text("Z"),
            CompositeScript::NoOutput,
            CompositeScript::Fail,
        ]
    };
    let generators = || {
        vec![
            vec![GeneratorScript::blocks("X")],
            vec![GeneratorScript::malformed(), GeneratorScript::completion("Y")],
            vec![GeneratorScript::Fail, GeneratorScript::Fail],
        ]
    };

    for ri in 0..3 {
        for ci in 0..3 {
            for gi in 0..3 {
                let harness = Harness::new(
                    retrievers().swap_remove(ri),
                    composites().swap_remove(ci),
                    generators().swap_remove(gi),
                );

                let answer = harness.orchestrator.answer(QUESTION, KB).await;
                let answer = answer.unwrap_or_else(|e| {
                    panic!("case ({}, {}, {}) returned error: {}", ri, ci, gi, e)
                });
                assert!(!answer.is_empty());
            }
        }
    }
}
