//! The analysis record produced by the model and consumed by the renderer.
//!
//! Every field is optional on the wire. The model is asked for a fixed JSON
//! schema but routinely drops keys, returns `2024` instead of `"2024"`, or
//! quotes a revenue figure as `"1,234"`. Decoding is therefore lenient
//! (see [`lenient`]) and every read goes through an accessor that returns a
//! placeholder when the value is missing. Rendering never fails because of
//! the shape of the analysis.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Title-slide company name when the model did not identify one.
pub const UNKNOWN_COMPANY: &str = "Unknown Company";
/// Company name used for the output file name when none was identified.
pub const FILE_STEM_FALLBACK: &str = "Strategy";
/// Suffix appended to the file stem.
pub const FILE_STEM_SUFFIX: &str = "_Strategy_Deck";
/// Fiscal year shown when the model did not report one.
pub const DEFAULT_FY: &str = "2024";
/// Executive-summary intro placeholder.
pub const MISSING_SUMMARY: &str = "Summary not available.";
/// Placeholder for any missing KPI.
pub const MISSING_KPI: &str = "N/A";
/// Chart category label for a financial entry without a year.
pub const MISSING_YEAR_LABEL: &str = "N/A";
/// Table cell text for any missing financial value.
pub const MISSING_CELL: &str = "-";
pub const DEFAULT_RISK_TYPE: &str = "General Risk";
pub const MISSING_RISK: &str = "Risk description unavailable";
pub const MISSING_MITIGATION: &str = "Mitigation strategy not explicitly stated in report.";

/// Structured financial analysis of one annual report.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    #[serde(default, deserialize_with = "lenient::text", skip_serializing_if = "Option::is_none")]
    pub company_name: Option<String>,

    #[serde(default, deserialize_with = "lenient::text", skip_serializing_if = "Option::is_none")]
    pub current_fy: Option<String>,

    #[serde(default, deserialize_with = "lenient::text", skip_serializing_if = "Option::is_none")]
    pub exec_summary_intro: Option<String>,

    #[serde(default, deserialize_with = "lenient::text_list")]
    pub highlights: Vec<String>,

    #[serde(default, deserialize_with = "lenient::kpis")]
    pub kpis: Kpis,

    /// Newest-first, as the model reports them.
    #[serde(default, deserialize_with = "lenient::financials")]
    pub financials: Vec<FinancialYear>,

    #[serde(default, deserialize_with = "lenient::text_list")]
    pub financial_insights: Vec<String>,

    #[serde(default, deserialize_with = "lenient::risks")]
    pub risks: Vec<RiskEntry>,
}

impl AnalysisResult {
    pub fn company_name(&self) -> &str {
        self.company_name.as_deref().unwrap_or(UNKNOWN_COMPANY)
    }

    pub fn current_fy(&self) -> &str {
        self.current_fy.as_deref().unwrap_or(DEFAULT_FY)
    }

    pub fn exec_summary_intro(&self) -> &str {
        self.exec_summary_intro.as_deref().unwrap_or(MISSING_SUMMARY)
    }

    /// File stem for the generated deck: the company name with every space
    /// replaced by `_`, followed by `_Strategy_Deck`.
    pub fn file_stem(&self) -> String {
        let name = self.company_name.as_deref().unwrap_or(FILE_STEM_FALLBACK);
        format!("{}{}", name.replace(' ', "_"), FILE_STEM_SUFFIX)
    }

    /// Suggested download name, e.g. `Acme_Motors_Strategy_Deck.pptx`.
    pub fn deck_file_name(&self) -> String {
        format!("{}.pptx", self.file_stem())
    }
}

/// The three headline ratios shown in the KPI sidebar.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Kpis {
    #[serde(default, deserialize_with = "lenient::text", skip_serializing_if = "Option::is_none")]
    pub ebitda_margin: Option<String>,
    #[serde(default, deserialize_with = "lenient::text", skip_serializing_if = "Option::is_none")]
    pub roe: Option<String>,
    #[serde(default, deserialize_with = "lenient::text", skip_serializing_if = "Option::is_none")]
    pub leverage: Option<String>,
}

impl Kpis {
    pub fn ebitda_margin(&self) -> &str {
        self.ebitda_margin.as_deref().unwrap_or(MISSING_KPI)
    }

    pub fn roe(&self) -> &str {
        self.roe.as_deref().unwrap_or(MISSING_KPI)
    }

    pub fn leverage(&self) -> &str {
        self.leverage.as_deref().unwrap_or(MISSING_KPI)
    }

    /// `(label, value)` pairs in sidebar order.
    pub fn metrics(&self) -> [(&'static str, &str); 3] {
        [
            ("EBITDA Margin", self.ebitda_margin()),
            ("ROE", self.roe()),
            ("Net Debt/EBITDA", self.leverage()),
        ]
    }
}

/// One fiscal year of headline financials.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FinancialYear {
    #[serde(default, deserialize_with = "lenient::text", skip_serializing_if = "Option::is_none")]
    pub year: Option<String>,
    #[serde(default, deserialize_with = "lenient::figure", skip_serializing_if = "Option::is_none")]
    pub revenue: Option<Figure>,
    #[serde(default, deserialize_with = "lenient::figure", skip_serializing_if = "Option::is_none")]
    pub net_profit: Option<Figure>,
}

impl FinancialYear {
    /// Category label used on the chart axis.
    pub fn year_label(&self) -> &str {
        self.year.as_deref().unwrap_or(MISSING_YEAR_LABEL)
    }

    pub fn revenue_value(&self) -> f64 {
        self.revenue.as_ref().map_or(0.0, Figure::value)
    }

    pub fn net_profit_value(&self) -> f64 {
        self.net_profit.as_ref().map_or(0.0, Figure::value)
    }

    /// `[year, revenue, net profit]` as printed in the data table.
    pub fn table_cells(&self) -> [String; 3] {
        let cell = |f: &Option<Figure>| {
            f.as_ref()
                .map_or_else(|| MISSING_CELL.to_string(), Figure::to_string)
        };
        [
            self.year.clone().unwrap_or_else(|| MISSING_CELL.to_string()),
            cell(&self.revenue),
            cell(&self.net_profit),
        ]
    }
}

/// A financial amount exactly as the model wrote it.
///
/// Numbers keep their original JSON spelling (`1000` stays `1000`, not
/// `1000.0`) so the table prints what the model said.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Figure {
    Number(serde_json::Number),
    Text(String),
}

impl Figure {
    /// Numeric value for charting. Text that reads as a number (`"1,234.5"`)
    /// counts as that number; anything else, and any non-finite value, is 0.
    pub fn value(&self) -> f64 {
        let v = match self {
            Figure::Number(n) => n.as_f64().unwrap_or(0.0),
            Figure::Text(s) => s
                .trim()
                .replace([',', ' '], "")
                .parse::<f64>()
                .unwrap_or(0.0),
        };
        if v.is_finite() {
            v
        } else {
            0.0
        }
    }
}

impl fmt::Display for Figure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Figure::Number(n) => write!(f, "{n}"),
            Figure::Text(s) => f.write_str(s),
        }
    }
}

/// One row of the risk matrix.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RiskEntry {
    #[serde(
        rename = "type",
        default,
        deserialize_with = "lenient::text",
        skip_serializing_if = "Option::is_none"
    )]
    pub risk_type: Option<String>,
    #[serde(default, deserialize_with = "lenient::text", skip_serializing_if = "Option::is_none")]
    pub risk: Option<String>,
    #[serde(default, deserialize_with = "lenient::text", skip_serializing_if = "Option::is_none")]
    pub mitigation: Option<String>,
}

impl RiskEntry {
    pub fn risk_type(&self) -> &str {
        self.risk_type.as_deref().unwrap_or(DEFAULT_RISK_TYPE)
    }

    pub fn risk(&self) -> &str {
        self.risk.as_deref().unwrap_or(MISSING_RISK)
    }

    pub fn mitigation(&self) -> &str {
        self.mitigation.as_deref().unwrap_or(MISSING_MITIGATION)
    }
}

/// Field decoders that accept whatever shape the model produced.
///
/// Each function is used with `#[serde(default, deserialize_with = …)]`, so
/// an absent key never reaches it; a present key is read as a raw
/// [`serde_json::Value`] and coerced. None of them ever return an error.
mod lenient {
    use super::{FinancialYear, Figure, Kpis, RiskEntry};
    use serde::{Deserialize, Deserializer};
    use serde_json::Value;

    fn scalar_text(value: Value) -> Option<String> {
        match value {
            Value::Null => None,
            Value::String(s) => Some(s),
            Value::Number(n) => Some(n.to_string()),
            Value::Bool(b) => Some(b.to_string()),
            other => Some(other.to_string()),
        }
    }

    pub fn text<'de, D: Deserializer<'de>>(d: D) -> Result<Option<String>, D::Error> {
        Ok(scalar_text(Value::deserialize(d)?))
    }

    pub fn text_list<'de, D: Deserializer<'de>>(d: D) -> Result<Vec<String>, D::Error> {
        let items = match Value::deserialize(d)? {
            Value::Array(items) => items,
            Value::Null | Value::Object(_) => Vec::new(),
            scalar => vec![scalar],
        };
        Ok(items
            .into_iter()
            .filter(|v| !matches!(v, Value::Null | Value::Array(_) | Value::Object(_)))
            .filter_map(scalar_text)
            .collect())
    }

    pub fn figure<'de, D: Deserializer<'de>>(d: D) -> Result<Option<Figure>, D::Error> {
        Ok(match Value::deserialize(d)? {
            Value::Null => None,
            Value::Number(n) => Some(Figure::Number(n)),
            other => scalar_text(other).map(Figure::Text),
        })
    }

    pub fn kpis<'de, D: Deserializer<'de>>(d: D) -> Result<Kpis, D::Error> {
        Ok(match Value::deserialize(d)? {
            obj @ Value::Object(_) => serde_json::from_value(obj).unwrap_or_default(),
            _ => Kpis::default(),
        })
    }

    pub fn financials<'de, D: Deserializer<'de>>(d: D) -> Result<Vec<FinancialYear>, D::Error> {
        Ok(match Value::deserialize(d)? {
            Value::Array(items) => items
                .into_iter()
                .filter(Value::is_object)
                .filter_map(|v| serde_json::from_value(v).ok())
                .collect(),
            _ => Vec::new(),
        })
    }

    pub fn risks<'de, D: Deserializer<'de>>(d: D) -> Result<Vec<RiskEntry>, D::Error> {
        let items = match Value::deserialize(d)? {
            Value::Array(items) => items,
            Value::Null => Vec::new(),
            single => vec![single],
        };
        Ok(items
            .into_iter()
            .filter_map(|v| match v {
                Value::Null | Value::Array(_) => None,
                obj @ Value::Object(_) => serde_json::from_value(obj).ok(),
                scalar => Some(RiskEntry {
                    risk: scalar_text(scalar),
                    ..RiskEntry::default()
                }),
            })
            .collect())
    }
}
