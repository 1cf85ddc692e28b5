//! Deck rendering: four fixed-layout slides built from an [`AnalysisResult`].
//!
//! | # | Slide | Content |
//! |---|-------|---------|
//! | 1 | Title | company name, fiscal year, confidentiality line |
//! | 2 | Executive summary | intro, highlight bullets, navy KPI sidebar |
//! | 3 | Financial trajectory | chart, data table, analyst commentary |
//! | 4 | Risk matrix | one red headline and one italic mitigation per risk |
//!
//! Every position, size, font, and colour is a constant in this module.
//! Missing analysis fields render as their placeholders (see
//! [`crate::model`]); nothing in here can fail except packaging.

pub mod package;
pub mod shapes;

use crate::error::DeckError;
use crate::model::AnalysisResult;
use shapes::{Anchor, Color, Frame, Paragraph, Picture, Shape, Slide, Table, TableRow, TextBox};

pub use package::{write_package, DECK_MIME};

/// Number of slides in every deck.
pub const SLIDE_COUNT: usize = 4;

/// Relationship id of the chart image inside the financial slide.
pub(crate) const CHART_REL_ID: &str = "rId2";

// ── Palette ──────────────────────────────────────────────────────────────

pub const NAVY: Color = Color(0, 51, 102);
pub const YELLOW: Color = Color(255, 255, 0);
pub const WHITE: Color = Color(255, 255, 255);
pub const LABEL_GREY: Color = Color(200, 200, 200);
pub const HEADER_GREY: Color = Color(220, 220, 220);
pub const RISK_RED: Color = Color(192, 0, 0);
const SUBTITLE_GREY: Color = Color(89, 89, 89);
const BLACK: Color = Color(0, 0, 0);

// ── Fixed text ───────────────────────────────────────────────────────────

pub const EXEC_SUMMARY_TITLE: &str = "Executive Summary: Strategic Posture & Key Metrics";
pub const FINANCIAL_TITLE: &str = "Financial Performance Trajectory";
pub const RISK_TITLE: &str = "Risk Matrix & Mitigation Strategies";
pub const SIDEBAR_HEADING: &str = "KEY METRICS";
pub const COMMENTARY_HEADING: &str = "Analyst Commentary:";
pub const TABLE_HEADERS: [&str; 3] = ["Year", "Revenue (Cr)", "PAT (Cr)"];
pub const CONFIDENTIAL: &str = "Strictly Confidential";

/// Title text of slide 1.
pub fn deck_title(analysis: &AnalysisResult) -> String {
    format!("Strategic Due Diligence: {}", analysis.company_name())
}

fn section_title(text: &str) -> Shape {
    Shape::Text(TextBox::new(
        "Title",
        Frame::inches(0.5, 0.2, 9.0, 1.0),
        vec![Paragraph::new(text).size(24).bold().color(NAVY)],
    ))
}

/// Slide 1: company and fiscal year.
pub fn title_slide(analysis: &AnalysisResult) -> Slide {
    let mut slide = Slide::default();
    slide.push(Shape::Text(
        TextBox::new(
            "Title",
            Frame::inches(0.75, 2.33, 8.5, 1.6),
            vec![Paragraph::new(deck_title(analysis))
                .size(40)
                .bold()
                .color(NAVY)
                .centered()],
        )
        .anchored(Anchor::Middle),
    ));
    slide.push(Shape::Text(TextBox::new(
        "Subtitle",
        Frame::inches(1.5, 4.25, 7.0, 1.75),
        vec![
            Paragraph::new(format!("FY{} Deep Dive Analysis", analysis.current_fy()))
                .size(24)
                .color(SUBTITLE_GREY)
                .centered(),
            Paragraph::new(CONFIDENTIAL)
                .size(24)
                .color(SUBTITLE_GREY)
                .centered(),
        ],
    )));
    slide
}

/// Slide 2: summary, highlights, and the KPI sidebar.
pub fn executive_summary_slide(analysis: &AnalysisResult) -> Slide {
    let mut slide = Slide::default();
    slide.push(section_title(EXEC_SUMMARY_TITLE));

    let mut body = vec![Paragraph::new(analysis.exec_summary_intro())
        .size(14)
        .bold()
        .space_after(14)];
    body.extend(
        analysis
            .highlights
            .iter()
            .map(|h| Paragraph::new(format!("• {}", h)).size(12).space_after(10)),
    );
    slide.push(Shape::Text(TextBox::new(
        "Summary",
        Frame::inches(0.5, 1.5, 6.5, 5.0),
        body,
    )));

    let mut sidebar = vec![Paragraph::new(SIDEBAR_HEADING).bold().color(WHITE).centered()];
    for (label, value) in analysis.kpis.metrics() {
        sidebar.push(
            Paragraph::new(format!("\n{}", value))
                .size(24)
                .bold()
                .color(YELLOW)
                .centered(),
        );
        sidebar.push(Paragraph::new(label).size(10).color(LABEL_GREY).centered());
    }
    slide.push(Shape::Text(
        TextBox::new("KPI Sidebar", Frame::inches(7.2, 1.5, 2.3, 5.0), sidebar)
            .filled(NAVY)
            .anchored(Anchor::Middle),
    ));
    slide
}

/// Slide 3: chart, table, and commentary.
///
/// The chart lists years oldest-first; the table keeps the model's order.
pub fn financial_slide(analysis: &AnalysisResult) -> Slide {
    let mut slide = Slide::default();
    slide.push(section_title(FINANCIAL_TITLE));

    slide.push(Shape::Picture(Picture {
        name: "Financial Chart".to_string(),
        frame: Frame::inches(0.5, 1.2, 5.5, 3.5),
        rel_id: CHART_REL_ID.to_string(),
    }));

    let mut rows = vec![TableRow {
        cells: TABLE_HEADERS
            .iter()
            .map(|h| Paragraph::new(*h).size(11).bold().color(BLACK))
            .collect(),
        fill: Some(HEADER_GREY),
    }];
    rows.extend(analysis.financials.iter().map(|f| TableRow {
        cells: f
            .table_cells()
            .into_iter()
            .map(|c| Paragraph::new(c).size(11))
            .collect(),
        fill: None,
    }));
    slide.push(Shape::Table(Table {
        name: "Financial Table".to_string(),
        frame: Frame::inches(0.5, 5.0, 5.5, 1.5),
        columns: TABLE_HEADERS.len(),
        rows,
    }));

    let mut commentary = vec![Paragraph::new(COMMENTARY_HEADING)
        .size(14)
        .bold()
        .color(NAVY)
        .space_after(12)];
    commentary.extend(
        analysis
            .financial_insights
            .iter()
            .map(|i| Paragraph::new(format!("• {}", i)).size(11).space_after(10)),
    );
    slide.push(Shape::Text(TextBox::new(
        "Commentary",
        Frame::inches(6.1, 1.2, 3.4, 5.0),
        commentary,
    )));
    slide
}

/// Slide 4: the risk matrix. No risks leaves the body empty.
pub fn risk_slide(analysis: &AnalysisResult) -> Slide {
    let mut slide = Slide::default();
    slide.push(Shape::Text(TextBox::new(
        "Title",
        Frame::inches(0.5, 0.3, 9.0, 1.25),
        vec![Paragraph::new(RISK_TITLE).size(32).bold().color(NAVY)],
    )));

    let body = analysis
        .risks
        .iter()
        .flat_map(|r| {
            [
                Paragraph::new(format!("⚠️ {}: {}", r.risk_type(), r.risk()))
                    .size(14)
                    .bold()
                    .color(RISK_RED),
                Paragraph::new(format!("   Mitigation/Impact: {}", r.mitigation()))
                    .size(12)
                    .italic()
                    .space_after(10),
            ]
        })
        .collect();
    slide.push(Shape::Text(TextBox::new(
        "Risks",
        Frame::inches(0.5, 1.75, 9.0, 4.95),
        body,
    )));
    slide
}

/// All four slides in order.
pub fn build_slides(analysis: &AnalysisResult) -> [Slide; SLIDE_COUNT] {
    [
        title_slide(analysis),
        executive_summary_slide(analysis),
        financial_slide(analysis),
        risk_slide(analysis),
    ]
}

/// Render the deck to `.pptx` bytes.
pub fn render_deck(analysis: &AnalysisResult, chart_png: &[u8]) -> Result<Vec<u8>, DeckError> {
    let slides = build_slides(analysis);
    write_package(&slides, chart_png, &deck_title(analysis))
}
