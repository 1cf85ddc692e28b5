//! Deck integration tests: canned model replies through to `.pptx` bytes.
//!
//! No PDF engine and no network: the model is replaced by a canned
//! [`InsightBackend`] and the deck is opened with `zip` + `quick-xml` to
//! check what a presentation reader would see.

use edgequake_deckgen::{
    analyse_text, render_analysis, AnalysisError, AnalysisResult, Completion, DeckConfig,
    DeckError, DeckProgressCallback, InsightBackend, Stage, DECK_MIME,
};
use futures::future::BoxFuture;
use quick_xml::events::Event;
use quick_xml::Reader;
use std::io::{Cursor, Read};
use std::sync::{Arc, Mutex};

// ── Test helpers ─────────────────────────────────────────────────────────────

/// Returns the same reply for every prompt.
struct CannedBackend(String);

impl InsightBackend for CannedBackend {
    fn name(&self) -> &str {
        "canned"
    }

    fn complete<'a>(&'a self, _prompt: &'a str) -> BoxFuture<'a, Result<Completion, AnalysisError>> {
        let text = self.0.clone();
        Box::pin(async move {
            Ok(Completion {
                text,
                input_tokens: 1200,
                output_tokens: 450,
            })
        })
    }
}

fn config_with_reply(reply: &str) -> DeckConfig {
    DeckConfig::builder()
        .backend(Arc::new(CannedBackend(reply.to_string())))
        .build()
        .unwrap()
}

const FULL_REPLY: &str = r#"```json
{
    "company_name": "Tata Motors Ltd",
    "current_fy": "2025",
    "exec_summary_intro": "Record revenue & a return to net profit on the back of JLR's recovery.",
    "kpis": {"ebitda_margin": "14.1%", "roe": "38%", "leverage": "0.3x"},
    "highlights": [
        "Revenue grew 26.6% to ₹4.38 lakh crore.",
        "Launched 6 new EVs including the Punch.ev."
    ],
    "financials": [
        {"year": "2024", "revenue": 437928, "net_profit": 31399},
        {"year": "2023", "revenue": 345967, "net_profit": 2414},
        {"year": "2022", "revenue": 278454, "net_profit": -11441}
    ],
    "financial_insights": ["Volume-led growth <not> price-led."],
    "risks": [
        {"type": "Operational", "risk": "Chip shortage", "mitigation": "Dual sourcing"},
        {"type": "Regulatory"}
    ]
}
```"#;

fn zip_entries(bytes: &[u8]) -> Vec<String> {
    let mut archive = zip::ZipArchive::new(Cursor::new(bytes)).unwrap();
    (0..archive.len())
        .map(|i| archive.by_index(i).unwrap().name().to_string())
        .collect()
}

fn zip_text(bytes: &[u8], name: &str) -> String {
    let mut archive = zip::ZipArchive::new(Cursor::new(bytes)).unwrap();
    let mut file = archive.by_name(name).unwrap();
    let mut s = String::new();
    file.read_to_string(&mut s).unwrap();
    s
}

/// Paragraph texts of a slide part, as a reader would show them.
/// Line breaks inside a paragraph come back as `'\n'`.
fn slide_paragraphs(xml: &str) -> Vec<String> {
    let mut reader = Reader::from_str(xml);
    let mut paragraphs = Vec::new();
    let mut current: Option<String> = None;
    let mut in_text = false;

    loop {
        match reader.read_event() {
            Ok(Event::Start(ref e)) => match e.name().as_ref() {
                b"a:p" => current = Some(String::new()),
                b"a:t" => in_text = true,
                b"a:br" => {
                    if let Some(ref mut p) = current {
                        p.push('\n');
                    }
                }
                _ => {}
            },
            Ok(Event::Text(ref t)) if in_text => {
                if let Some(ref mut p) = current {
                    p.push_str(&t.unescape().unwrap());
                }
            }
            Ok(Event::End(ref e)) => match e.name().as_ref() {
                b"a:t" => in_text = false,
                b"a:p" => paragraphs.extend(current.take()),
                _ => {}
            },
            Ok(Event::Eof) => break,
            Err(e) => panic!("slide XML is not well-formed: {e}"),
            _ => {}
        }
    }
    paragraphs
}

fn slide(bytes: &[u8], n: usize) -> Vec<String> {
    slide_paragraphs(&zip_text(bytes, &format!("ppt/slides/slide{n}.xml")))
}

fn non_empty(paragraphs: Vec<String>) -> Vec<String> {
    paragraphs.into_iter().filter(|p| !p.is_empty()).collect()
}

async fn deck_for(reply: &str) -> (AnalysisResult, Vec<u8>) {
    let insights = analyse_text("annual report text", &config_with_reply(reply))
        .await
        .unwrap();
    let deck = render_analysis(&insights.analysis).unwrap();
    (insights.analysis, deck.bytes)
}

// ── Package structure ────────────────────────────────────────────────────────

#[tokio::test]
async fn test_package_has_four_slides_and_one_image() {
    let (_, bytes) = deck_for(FULL_REPLY).await;
    let entries = zip_entries(&bytes);

    assert_eq!(entries[0], "[Content_Types].xml");
    let slides: Vec<&String> = entries
        .iter()
        .filter(|e| e.starts_with("ppt/slides/slide") && e.ends_with(".xml"))
        .collect();
    assert_eq!(slides.len(), 4);
    let media: Vec<&String> = entries.iter().filter(|e| e.starts_with("ppt/media/")).collect();
    assert_eq!(media, vec!["ppt/media/image1.png"]);

    for part in [
        "_rels/.rels",
        "ppt/presentation.xml",
        "ppt/slideMasters/slideMaster1.xml",
        "ppt/slideLayouts/slideLayout1.xml",
        "ppt/theme/theme1.xml",
        "docProps/core.xml",
        "docProps/app.xml",
    ] {
        assert!(entries.iter().any(|e| e == part), "missing part {part}");
    }
}

#[tokio::test]
async fn test_every_xml_part_is_well_formed() {
    let (_, bytes) = deck_for(FULL_REPLY).await;
    for name in zip_entries(&bytes).iter().filter(|n| n.ends_with(".xml") || n.ends_with(".rels")) {
        let xml = zip_text(&bytes, name);
        let mut reader = Reader::from_str(&xml);
        loop {
            match reader.read_event() {
                Ok(Event::Eof) => break,
                Err(e) => panic!("{name} is not well-formed: {e}"),
                _ => {}
            }
        }
    }
}

#[test]
fn test_mime_type() {
    assert_eq!(
        DECK_MIME,
        "application/vnd.openxmlformats-officedocument.presentationml.presentation"
    );
}

// ── Slide content ────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_full_reply_renders_every_section() {
    let (analysis, bytes) = deck_for(FULL_REPLY).await;
    assert_eq!(analysis.deck_file_name(), "Tata_Motors_Ltd_Strategy_Deck.pptx");

    assert_eq!(
        non_empty(slide(&bytes, 1)),
        vec![
            "Strategic Due Diligence: Tata Motors Ltd",
            "FY2025 Deep Dive Analysis",
            "Strictly Confidential"
        ]
    );

    let summary = slide(&bytes, 2);
    assert!(summary.contains(&"Record revenue & a return to net profit on the back of JLR's recovery.".to_string()));
    assert!(summary.contains(&"• Revenue grew 26.6% to ₹4.38 lakh crore.".to_string()));
    assert!(summary.contains(&"\n14.1%".to_string()));
    assert!(summary.contains(&"Net Debt/EBITDA".to_string()));

    let financial = slide(&bytes, 3);
    assert!(financial.contains(&"• Volume-led growth <not> price-led.".to_string()));
    let year_cells: Vec<&String> = financial
        .iter()
        .filter(|p| ["2024", "2023", "2022"].contains(&p.as_str()))
        .collect();
    assert_eq!(year_cells, vec!["2024", "2023", "2022"], "table keeps model order");
    assert!(financial.contains(&"-11441".to_string()));

    assert_eq!(
        non_empty(slide(&bytes, 4)),
        vec![
            "Risk Matrix & Mitigation Strategies",
            "⚠️ Operational: Chip shortage",
            "   Mitigation/Impact: Dual sourcing",
            "⚠️ Regulatory: Risk description unavailable",
            "   Mitigation/Impact: Mitigation strategy not explicitly stated in report."
        ]
    );
}

#[tokio::test]
async fn test_empty_reply_renders_placeholders() {
    let (analysis, bytes) = deck_for("{}").await;
    assert_eq!(analysis.deck_file_name(), "Strategy_Strategy_Deck.pptx");

    assert_eq!(
        non_empty(slide(&bytes, 1))[0],
        "Strategic Due Diligence: Unknown Company"
    );
    let summary = slide(&bytes, 2);
    assert!(summary.contains(&"Summary not available.".to_string()));
    assert_eq!(summary.iter().filter(|p| *p == "\nN/A").count(), 3);

    let financial = non_empty(slide(&bytes, 3));
    assert_eq!(
        financial,
        vec![
            "Financial Performance Trajectory",
            "Year",
            "Revenue (Cr)",
            "PAT (Cr)",
            "Analyst Commentary:"
        ]
    );
}

const REPLY_KEYS: [&str; 8] = [
    "company_name",
    "current_fy",
    "exec_summary_intro",
    "kpis",
    "highlights",
    "financials",
    "financial_insights",
    "risks",
];

fn full_reply_object() -> serde_json::Map<String, serde_json::Value> {
    let body = FULL_REPLY
        .trim_start_matches("```json")
        .trim_end_matches("```");
    match serde_json::from_str(body).unwrap() {
        serde_json::Value::Object(map) => map,
        other => panic!("expected an object, got {other}"),
    }
}

/// Renders `reply` and checks each section shows either the model's text
/// or its placeholder, depending on whether the key is present.
fn assert_sections_match(reply: &serde_json::Map<String, serde_json::Value>, context: &str) {
    let analysis: AnalysisResult =
        serde_json::from_value(serde_json::Value::Object(reply.clone())).unwrap();
    let deck = render_analysis(&analysis).unwrap();
    let bytes = deck.bytes;
    let has = |key: &str| reply.contains_key(key);

    assert_eq!(zip_entries(&bytes).iter().filter(|e| e.starts_with("ppt/slides/slide")).count(), 4);

    let title = slide(&bytes, 1);
    let company = if has("company_name") { "Tata Motors Ltd" } else { "Unknown Company" };
    assert_eq!(title[0], format!("Strategic Due Diligence: {company}"), "[{context}]");
    let fy = if has("current_fy") { "2025" } else { "2024" };
    assert!(title.contains(&format!("FY{fy} Deep Dive Analysis")), "[{context}]");
    let file_name = if has("company_name") {
        "Tata_Motors_Ltd_Strategy_Deck.pptx"
    } else {
        "Strategy_Strategy_Deck.pptx"
    };
    assert_eq!(deck.file_name, file_name, "[{context}]");

    let summary = slide(&bytes, 2);
    assert_eq!(
        summary.contains(&"Summary not available.".to_string()),
        !has("exec_summary_intro"),
        "[{context}] summary placeholder"
    );
    let kpi_placeholders = summary.iter().filter(|p| *p == "\nN/A").count();
    assert_eq!(kpi_placeholders, if has("kpis") { 0 } else { 3 }, "[{context}]");
    let highlight_bullets = summary.iter().filter(|p| p.starts_with("• ")).count();
    assert_eq!(highlight_bullets, if has("highlights") { 2 } else { 0 }, "[{context}]");

    let financial = slide(&bytes, 3);
    let year_cells = financial.iter().filter(|p| p.as_str() == "2024").count();
    assert_eq!(year_cells, usize::from(has("financials")), "[{context}] table rows");
    let insight_bullets = financial.iter().filter(|p| p.starts_with("• ")).count();
    assert_eq!(insight_bullets, usize::from(has("financial_insights")), "[{context}]");

    let risk_lines = non_empty(slide(&bytes, 4)).len() - 1;
    assert_eq!(risk_lines, if has("risks") { 4 } else { 0 }, "[{context}] risk lines");
}

#[test]
fn test_any_missing_section_gets_its_placeholder() {
    let full = full_reply_object();
    assert_eq!(full.len(), REPLY_KEYS.len());

    for key in REPLY_KEYS {
        let mut without = full.clone();
        without.remove(key);
        assert_sections_match(&without, &format!("without {key}"));

        let only: serde_json::Map<String, serde_json::Value> = full
            .iter()
            .filter(|(k, _)| k.as_str() == key)
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        assert_sections_match(&only, &format!("only {key}"));
    }
}

#[tokio::test]
async fn test_zero_risks_gives_title_only() {
    let (_, bytes) = deck_for(r#"{"company_name": "Acme", "risks": []}"#).await;
    assert_eq!(
        non_empty(slide(&bytes, 4)),
        vec!["Risk Matrix & Mitigation Strategies"]
    );
}

#[tokio::test]
async fn test_special_characters_are_escaped() {
    let reply = r#"{"company_name": "AT&T <Holdings> \"Inc\"", "highlights": ["R&D up\u0001 5%"]}"#;
    let (_, bytes) = deck_for(reply).await;

    let raw = zip_text(&bytes, "ppt/slides/slide1.xml");
    assert!(raw.contains("AT&amp;T &lt;Holdings&gt; &quot;Inc&quot;"));
    assert_eq!(
        non_empty(slide(&bytes, 1))[0],
        "Strategic Due Diligence: AT&T <Holdings> \"Inc\""
    );
    assert!(slide(&bytes, 2).contains(&"• R&D up 5%".to_string()));
}

// ── Analysis stage ───────────────────────────────────────────────────────────

#[tokio::test]
async fn test_token_counts_are_reported() {
    let insights = analyse_text("text", &config_with_reply("{}")).await.unwrap();
    assert_eq!(insights.input_tokens, 1200);
    assert_eq!(insights.output_tokens, 450);
    assert_eq!(insights.backend, "canned");
}

#[tokio::test]
async fn test_unusable_reply_is_an_analysis_error() {
    let err = analyse_text("text", &config_with_reply("The report could not be parsed."))
        .await
        .unwrap_err();
    assert!(matches!(err, DeckError::Analysis(AnalysisError::MalformedReply { .. })));
    assert!(err.to_string().starts_with("AI analysis failed:"));
}

#[tokio::test]
async fn test_analyse_stage_reports_progress() {
    #[derive(Default)]
    struct Stages(Mutex<Vec<(Stage, bool)>>);
    impl DeckProgressCallback for Stages {
        fn on_stage_start(&self, stage: Stage) {
            self.0.lock().unwrap().push((stage, false));
        }
        fn on_stage_complete(&self, stage: Stage, _elapsed_ms: u64) {
            self.0.lock().unwrap().push((stage, true));
        }
    }

    let stages = Arc::new(Stages::default());
    let config = DeckConfig::builder()
        .backend(Arc::new(CannedBackend("{}".into())))
        .progress_callback(Arc::clone(&stages) as Arc<dyn DeckProgressCallback>)
        .build()
        .unwrap();
    analyse_text("text", &config).await.unwrap();

    assert_eq!(
        *stages.0.lock().unwrap(),
        vec![(Stage::Analyse, false), (Stage::Analyse, true)]
    );
}

#[test]
fn test_config_is_send_sync() {
    fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<DeckConfig>();
    assert_send_sync::<AnalysisResult>();
}
