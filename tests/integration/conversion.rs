//! Integration tests for the conversion pipeline.

use std::sync::Arc;
use std::time::Duration;

use urlcat::config::RenderOptions;
use urlcat::convert::{AssemblyMode, ConversionRequest, Orchestrator};
use urlcat::render::ScriptedRenderer;
use urlcat::testing::page_markers;
use urlcat::UrlCatError;

use crate::common::{files_in, url, urls};

fn markers(specs: &[(&str, u32)]) -> Vec<String> {
    specs
        .iter()
        .flat_map(|(label, pages)| (1..=*pages).map(move |n| format!("{label}-{n}")))
        .collect()
}

#[tokio::test]
async fn test_pages_follow_request_order_when_all_succeed() {
    let dir = tempfile::TempDir::new().unwrap();
    let specs = [("A", 2), ("B", 1), ("C", 3), ("D", 1)];
    let mut renderer = ScriptedRenderer::new();
    // Earlier URLs finish later
    for (position, (label, pages)) in specs.iter().enumerate() {
        let delay = Duration::from_millis(15 * (specs.len() - position) as u64);
        renderer = renderer
            .with_pages(&url(label), label, *pages)
            .with_delay(&url(label), delay);
    }
    let renderer = Arc::new(renderer);

    let report = Orchestrator::new(renderer.clone())
        .convert(ConversionRequest::new(urls(&["A", "B", "C", "D"]), dir.path()))
        .await
        .unwrap();

    assert_eq!(renderer.completion_order(), urls(&["D", "C", "B", "A"]));
    assert_eq!(report.total_pages, 7);
    assert_eq!(report.rendered, 4);
    assert!(!report.is_partial());
    assert_eq!(page_markers(&report.merged_path), markers(&specs));
}

#[tokio::test]
async fn test_failure_that_settles_last_is_skipped() {
    let dir = tempfile::TempDir::new().unwrap();
    let renderer = Arc::new(
        ScriptedRenderer::new()
            .with_pages(&url("A"), "A", 2)
            .with_failure(&url("B"), "Failed loading page")
            .with_delay(&url("B"), Duration::from_millis(80))
            .with_pages(&url("C"), "C", 1),
    );

    let report = Orchestrator::new(renderer.clone())
        .convert(ConversionRequest::new(urls(&["A", "B", "C"]), dir.path()))
        .await
        .unwrap();

    assert_eq!(renderer.completion_order().last(), Some(&url("B")));
    assert_eq!(page_markers(&report.merged_path), vec!["A-1", "A-2", "C-1"]);
    assert!(report.is_partial());
    assert_eq!(report.failures.len(), 1);
    match &report.failures[0] {
        UrlCatError::Render { index, url: failed, .. } => {
            assert_eq!(*index, 1);
            assert_eq!(failed, &url("B"));
        }
        other => panic!("unexpected failure: {other}"),
    }

    // Only the merged document remains
    let files = files_in(dir.path());
    assert_eq!(files.len(), 1);
    assert!(files[0].ends_with("_merged.pdf"));
}

#[tokio::test]
async fn test_all_failures_produce_no_document() {
    let dir = tempfile::TempDir::new().unwrap();
    let renderer = Arc::new(
        ScriptedRenderer::new()
            .with_failure(&url("A"), "boom")
            .with_failure(&url("B"), "boom"),
    );

    let err = Orchestrator::new(renderer)
        .convert(ConversionRequest::new(urls(&["A", "B"]), dir.path()))
        .await
        .unwrap_err();

    assert!(matches!(err, UrlCatError::TotalFailure { attempted: 2 }));
    assert!(files_in(dir.path()).iter().all(|name| !name.ends_with("_merged.pdf")));
}

#[tokio::test]
async fn test_single_url_is_passed_through_byte_identical() {
    let rendered_dir = tempfile::TempDir::new().unwrap();
    let converted_dir = tempfile::TempDir::new().unwrap();
    let renderer = Arc::new(ScriptedRenderer::new().with_pages(&url("A"), "A", 3));

    // What the renderer writes for this URL
    let reference = rendered_dir.path().join("reference.pdf");
    urlcat::render::Renderer::render(
        renderer.as_ref(),
        &url("A"),
        &reference,
        &RenderOptions::default(),
    )
    .await
    .unwrap();

    let report = Orchestrator::new(renderer)
        .convert(ConversionRequest::new(urls(&["A"]), converted_dir.path()))
        .await
        .unwrap();

    assert_eq!(report.mode, AssemblyMode::Passthrough);
    assert_eq!(
        std::fs::read(&report.merged_path).unwrap(),
        std::fs::read(&reference).unwrap()
    );
    assert_eq!(files_in(converted_dir.path()).len(), 1);
}

#[tokio::test]
async fn test_repeated_conversion_is_idempotent() {
    let dir = tempfile::TempDir::new().unwrap();
    let renderer = Arc::new(
        ScriptedRenderer::new()
            .with_pages(&url("A"), "A", 1)
            .with_pages(&url("B"), "B", 2),
    );
    let orchestrator = Orchestrator::new(renderer);
    let request = ConversionRequest::new(urls(&["A", "B"]), dir.path());

    let first = orchestrator.convert(request.clone()).await.unwrap();
    let second = orchestrator.convert(request).await.unwrap();

    assert_ne!(first.merged_path, second.merged_path);
    assert_eq!(first.total_pages, second.total_pages);
    assert_eq!(
        page_markers(&first.merged_path),
        page_markers(&second.merged_path)
    );
    assert_eq!(files_in(dir.path()).len(), 2);
}

#[tokio::test]
async fn test_concurrent_requests_do_not_collide() {
    let dir = tempfile::TempDir::new().unwrap();
    let renderer = Arc::new(
        ScriptedRenderer::new()
            .with_pages(&url("A"), "A", 1)
            .with_pages(&url("B"), "B", 1),
    );
    let orchestrator = Orchestrator::new(renderer);

    let (first, second) = tokio::join!(
        orchestrator.convert(ConversionRequest::new(urls(&["A", "B"]), dir.path())),
        orchestrator.convert(ConversionRequest::new(urls(&["B", "A"]), dir.path())),
    );
    let (first, second) = (first.unwrap(), second.unwrap());

    assert_ne!(first.merged_path, second.merged_path);
    assert_eq!(page_markers(&first.merged_path), vec!["A-1", "B-1"]);
    assert_eq!(page_markers(&second.merged_path), vec!["B-1", "A-1"]);
}

#[tokio::test]
async fn test_missing_parameters_have_no_side_effects() {
    let dir = tempfile::TempDir::new().unwrap();
    let target = dir.path().join("out");
    let orchestrator = Orchestrator::new(Arc::new(
        ScriptedRenderer::new().with_pages(&url("A"), "A", 1),
    ));

    let no_urls = orchestrator
        .convert(ConversionRequest::new(Vec::new(), &target))
        .await
        .unwrap_err();
    let no_dir = orchestrator
        .convert(ConversionRequest {
            urls: urls(&["A"]),
            pdf_dir: None,
            options: RenderOptions::default(),
        })
        .await
        .unwrap_err();

    assert_eq!(no_urls.kind(), "validation");
    assert_eq!(no_dir.kind(), "validation");
    assert!(!target.exists());
    assert!(files_in(dir.path()).is_empty());
}

#[tokio::test]
async fn test_request_options_reach_renderer() {
    let dir = tempfile::TempDir::new().unwrap();
    let renderer = Arc::new(ScriptedRenderer::new().with_pages(&url("A"), "A", 1));
    let mut options = RenderOptions::default();
    options.insert("dpi", serde_json::json!(96));

    Orchestrator::new(renderer.clone())
        .convert(ConversionRequest::new(urls(&["A"]), dir.path()).with_options(options))
        .await
        .unwrap();

    let seen = renderer.seen_options();
    assert_eq!(seen.len(), 1);
    assert_eq!(seen[0].get("dpi"), Some(&serde_json::json!(96)));
    assert_eq!(seen[0].get("pageSize"), Some(&serde_json::json!("A4")));
}
