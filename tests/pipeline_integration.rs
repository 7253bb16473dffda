use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use civic_digest::agenda::{AgendaSynthesizer, AgendaVocabulary};
use civic_digest::config::SummaryMethod;
use civic_digest::extraction::{PdfSource, ReaderLimits, SourceReader};
use civic_digest::nlp::{LanguageToolkit, RuleToolkit, StopWords};
use civic_digest::summarization::{
    ModelError, ModelHandle, ModelRequest, OllamaSummarizationModel, SummarizationModel,
};
use civic_digest::{DocumentPipeline, PipelineSettings, SummaryRequest, SummaryResult};
use httpmock::{
    Method::{GET, POST},
    MockServer,
};
use lopdf::content::{Content, Operation};
use lopdf::{Document, Object, Stream, dictionary};
use serde_json::json;

const COUNCIL_PAGE: &str = "<html><head><title>City Council</title>\
    <script>analytics()</script></head><body>\
    <nav>Home | Meetings | Contact</nav>\
    <main><h1>Regular Session</h1>\
    <p>The council approved $2.5 million for water main replacement on Elm Street.</p>\
    <p>Residents opposed the zoning amendment for the harbor district.</p>\
    <p>The water main replacement begins in March.</p></main>\
    <footer>City Hall, 100 Main Street</footer></body></html>";

/// Records every request and answers with a fixed summary.
struct RecordingModel {
    reply: &'static str,
    requests: Mutex<Vec<ModelRequest>>,
}

#[async_trait]
impl SummarizationModel for RecordingModel {
    async fn summarize(&self, request: ModelRequest) -> Result<String, ModelError> {
        self.requests.lock().unwrap().push(request);
        Ok(self.reply.to_string())
    }
}

fn pipeline_with(model: ModelHandle) -> DocumentPipeline {
    let reader =
        SourceReader::new(ReaderLimits::default(), Duration::from_secs(5)).expect("reader");
    let toolkit: Arc<dyn LanguageToolkit> =
        Arc::new(RuleToolkit::with_stop_words(StopWords::basic()));
    DocumentPipeline::new(
        reader,
        Arc::new(model),
        Some(toolkit),
        PipelineSettings::default(),
    )
}

/// Single-page PDF whose text layer holds `lines`, one text object per line.
fn pdf_bytes(lines: &[&str]) -> Vec<u8> {
    let mut operations = Vec::new();
    for (index, line) in lines.iter().enumerate() {
        operations.push(Operation::new("BT", vec![]));
        operations.push(Operation::new("Tf", vec!["F1".into(), 10.into()]));
        operations.push(Operation::new(
            "Td",
            vec![50.into(), (780 - 14 * index as i64).into()],
        ));
        operations.push(Operation::new("Tj", vec![Object::string_literal(*line)]));
        operations.push(Operation::new("ET", vec![]));
    }
    single_page_pdf(operations)
}

/// Single-page PDF whose `lines` share one text object, advanced with `T*`.
fn pdf_with_text_block(lines: &[&str]) -> Vec<u8> {
    let mut operations = vec![
        Operation::new("BT", vec![]),
        Operation::new("Tf", vec!["F1".into(), 10.into()]),
        Operation::new("TL", vec![14.into()]),
        Operation::new("Td", vec![50.into(), 780.into()]),
    ];
    for (index, line) in lines.iter().enumerate() {
        if index > 0 {
            operations.push(Operation::new("T*", vec![]));
        }
        operations.push(Operation::new("Tj", vec![Object::string_literal(*line)]));
    }
    operations.push(Operation::new("ET", vec![]));
    single_page_pdf(operations)
}

fn single_page_pdf(operations: Vec<Operation>) -> Vec<u8> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Courier",
    });
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! { "F1" => font_id },
    });

    let content = Content { operations };
    let content_id = doc.add_object(Stream::new(
        dictionary! {},
        content.encode().expect("encode content"),
    ));
    let page_id = doc.add_object(dictionary! {
        "Type" => "Page",
        "Parent" => pages_id,
        "Contents" => content_id,
    });
    let pages = dictionary! {
        "Type" => "Pages",
        "Kids" => vec![page_id.into()],
        "Count" => 1,
        "Resources" => resources_id,
        "MediaBox" => vec![0.into(), 0.into(), 595.into(), 842.into()],
    };
    doc.objects.insert(pages_id, Object::Dictionary(pages));
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let mut bytes = Vec::new();
    doc.save_to(&mut bytes).expect("save pdf");
    bytes
}

#[tokio::test]
async fn web_page_is_summarized_by_the_model() {
    let server = MockServer::start_async().await;
    let page = server
        .mock_async(|when, then| {
            when.method(GET).path("/meetings/regular");
            then.status(200)
                .header("content-type", "text/html")
                .body(COUNCIL_PAGE);
        })
        .await;

    let model = Arc::new(RecordingModel {
        reply: "Council funds water main work.",
        requests: Mutex::new(Vec::new()),
    });
    let pipeline = pipeline_with(ModelHandle::new(model.clone()));

    let request = SummaryRequest {
        web_url: Some(server.url("/meetings/regular")),
        method: Some(SummaryMethod::Abstractive),
        ..SummaryRequest::default()
    };
    let result = pipeline.extract_and_summarize(&request).await;

    page.assert_async().await;
    assert_eq!(result.summary, "Council funds water main work.");
    assert!(result.full_text.contains("approved $2.5 million"));
    assert!(!result.full_text.contains("Meetings | Contact"));
    assert!(!result.full_text.contains("analytics"));
    assert!(result.summary.len() <= result.full_text.len());
    assert!(result.key_phrases.len() <= 10);
    assert!(
        result
            .key_phrases
            .iter()
            .any(|phrase| phrase.contains("water main replacement"))
    );

    let requests = model.requests.lock().unwrap();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].max_tokens, 500);
    assert_eq!(requests[0].min_tokens, 100);
    assert_eq!(pipeline.metrics().documents_summarized, 1);
}

#[tokio::test]
async fn ollama_backed_pipeline_round_trip() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/agenda");
            then.status(200).body(COUNCIL_PAGE);
        })
        .await;
    let generate = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/api/generate")
                .body_contains("\"model\":\"llama3.2\"");
            then.status(200).json_body(json!({
                "response": "The council approved water main funding.",
                "done": true
            }));
        })
        .await;

    let model = OllamaSummarizationModel::new(server.base_url(), "llama3.2".into());
    let pipeline = pipeline_with(ModelHandle::new(Arc::new(model)));
    let result = pipeline
        .extract_and_summarize(&SummaryRequest {
            web_url: Some(server.url("/agenda")),
            ..SummaryRequest::default()
        })
        .await;

    generate.assert_async().await;
    assert_eq!(result.summary, "The council approved water main funding.");
}

#[tokio::test]
async fn unreachable_sources_produce_an_empty_result() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/gone");
            then.status(404);
        })
        .await;

    let model = Arc::new(RecordingModel {
        reply: "unused",
        requests: Mutex::new(Vec::new()),
    });
    let pipeline = pipeline_with(ModelHandle::new(model.clone()));
    let result = pipeline
        .extract_and_summarize(&SummaryRequest {
            pdf: Some(PdfSource::Url(server.url("/gone"))),
            web_url: Some(server.url("/gone")),
            ..SummaryRequest::default()
        })
        .await;

    assert_eq!(result, SummaryResult::empty());
    assert!(model.requests.lock().unwrap().is_empty());
    let metrics = pipeline.metrics();
    assert_eq!(metrics.fetch_failures, 2);
    assert_eq!(metrics.empty_inputs, 1);
}

#[tokio::test]
async fn failing_model_falls_back_to_extractive_summary() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/page");
            then.status(200).body(COUNCIL_PAGE);
        })
        .await;
    server
        .mock_async(|when, then| {
            when.method(POST).path("/api/generate");
            then.status(503).body("overloaded");
        })
        .await;

    let model = OllamaSummarizationModel::new(server.base_url(), "llama3.2".into());
    let pipeline = pipeline_with(ModelHandle::new(Arc::new(model)));
    let result = pipeline
        .extract_and_summarize(&SummaryRequest {
            web_url: Some(server.url("/page")),
            ..SummaryRequest::default()
        })
        .await;

    assert!(!result.summary.is_empty());
    assert!(result.full_text.contains(result.summary.split(' ').next().unwrap()));
    assert!(result.summary.len() <= result.full_text.len());
    let metrics = pipeline.metrics();
    assert_eq!(metrics.model_fallbacks, 1);
}

#[tokio::test]
async fn summaries_never_exceed_their_source() {
    let pipeline = pipeline_with(ModelHandle::unavailable());
    let inputs = [
        "Short",
        "One sentence without an ending",
        "A. B. C. D.",
        "The board approved the contract. The vote was unanimous. Staff will report back.",
    ];
    for input in inputs {
        for method in [
            SummaryMethod::Abstractive,
            SummaryMethod::ExtractiveWeighted,
            SummaryMethod::ExtractiveBasic,
        ] {
            let result = pipeline.summarize_text(input, 2, method).await;
            assert!(
                result.summary.len() <= result.full_text.len(),
                "{method:?} expanded {input:?} into {:?}",
                result.summary
            );
        }
    }
    let basic = pipeline
        .summarize_text("A. B. C. D.", 2, SummaryMethod::ExtractiveBasic)
        .await;
    assert_eq!(basic.summary, "A. B.");
}

#[tokio::test]
async fn local_pdf_text_is_extracted() {
    let dir = tempfile::tempdir().expect("temp dir");
    let path = dir.path().join("minutes.pdf");
    std::fs::write(
        &path,
        pdf_bytes(&["Budget hearing minutes.", "The board adopted the budget."]),
    )
    .expect("write pdf");

    let pipeline = pipeline_with(ModelHandle::unavailable());
    let result = pipeline
        .extract_and_summarize(&SummaryRequest {
            pdf: Some(PdfSource::Path(path)),
            method: Some(SummaryMethod::ExtractiveBasic),
            ..SummaryRequest::default()
        })
        .await;

    assert!(result.full_text.contains("Budget hearing minutes"));
    assert!(result.full_text.contains("adopted the budget"));
    assert!(!result.summary.is_empty());
    assert_eq!(result.content_hash().len(), 64);
}

#[tokio::test]
async fn agenda_pdf_gets_structured_meeting_summary() {
    let dir = tempfile::tempdir().expect("temp dir");
    let agenda = dir.path().join("agenda.pdf");
    std::fs::write(
        &agenda,
        pdf_bytes(&[
            "AB-25-001 - Public Works - Infrastructure - Water main replacement $2,500,000",
        ]),
    )
    .expect("write pdf");

    let pipeline = pipeline_with(ModelHandle::unavailable());
    let meeting = pipeline
        .summarize_meeting(
            &[
                PdfSource::Path(dir.path().join("missing.pdf")),
                PdfSource::Path(agenda.clone()),
            ],
            "January 15, 2025",
            &[],
        )
        .await;

    assert!(
        meeting
            .summary
            .starts_with("Board of Estimates meeting on January 15, 2025 reviews 1 agenda item.")
    );
    assert!(meeting.summary.contains("($2,500,000)"));
    assert_eq!(
        meeting.topics,
        vec![
            "Infrastructure Projects",
            "Water And Sewer Projects",
            "Public Works"
        ]
    );
    assert_eq!(meeting.source, Some(agenda.display().to_string()));
    assert_eq!(pipeline.metrics().fetch_failures, 1);
}

#[tokio::test]
async fn agenda_lines_sharing_one_text_block_are_all_parsed() {
    let dir = tempfile::tempdir().expect("temp dir");
    let agenda = dir.path().join("agenda.pdf");
    std::fs::write(
        &agenda,
        pdf_with_text_block(&[
            "AB-25-001 - Public Works - Infrastructure - Water main replacement $2,500,000",
            "AB-25-002 - Transportation - Traffic - Signal upgrade $1,800,000",
            "AB-25-003 - Recreation - Parks - Playground resurfacing $400,000",
        ]),
    )
    .expect("write pdf");

    let pipeline = pipeline_with(ModelHandle::unavailable());
    let meeting = pipeline
        .summarize_meeting(&[PdfSource::Path(agenda)], "March 5, 2025", &[])
        .await;

    assert_eq!(
        meeting.full_text.lines().count(),
        3,
        "{:?}",
        meeting.full_text
    );
    assert!(
        meeting
            .summary
            .starts_with("Board of Estimates meeting on March 5, 2025 reviews 3 agenda items.")
    );
    for presenter in ["Public Works", "Transportation", "Recreation"] {
        assert!(meeting.summary.contains(presenter), "{}", meeting.summary);
    }
    let larger = meeting.summary.find("$2,500,000").expect("larger amount");
    let smaller = meeting.summary.find("$1,800,000").expect("smaller amount");
    assert!(larger < smaller);
}

#[tokio::test]
async fn injected_agenda_vocabulary_shapes_the_narrative() {
    let dir = tempfile::tempdir().expect("temp dir");
    let agenda = dir.path().join("parks.pdf");
    std::fs::write(
        &agenda,
        pdf_bytes(&["PB-25-001 - Recreation - Parks - Playground resurfacing $400,000"]),
    )
    .expect("write pdf");

    let vocabulary = AgendaVocabulary {
        themes: vec![("playground".into(), "playground upgrades".into())],
        meeting_label: "Parks Board meeting".into(),
        ..AgendaVocabulary::default()
    };
    let pipeline = pipeline_with(ModelHandle::unavailable())
        .with_agenda_synthesizer(AgendaSynthesizer::with_vocabulary(vocabulary));
    let meeting = pipeline
        .summarize_meeting(&[PdfSource::Path(agenda)], "June 2, 2025", &[])
        .await;

    assert!(
        meeting
            .summary
            .starts_with("Parks Board meeting on June 2, 2025 reviews 1 agenda item.")
    );
    assert_eq!(meeting.topics, vec!["Playground Upgrades", "Recreation"]);
}
