use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

/// Locale used for every user-facing number rendering.
pub const DISPLAY_LOCALE: &str = "fr-FR";

/// Visual severity of a user notice, mirroring the Bootstrap contextual names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    #[default]
    Info,
    Success,
    Warning,
    Danger,
}

impl Severity {
    /// Suffix for the Bootstrap background class (`bg-{suffix}`).
    pub fn css_class(&self) -> &'static str {
        match self {
            Severity::Info => "info",
            Severity::Success => "success",
            Severity::Warning => "warning",
            Severity::Danger => "danger",
        }
    }

    /// Parse a severity name as used in page markup; unknown names read as Info.
    pub fn from_name(name: &str) -> Self {
        match name {
            "success" => Severity::Success,
            "warning" => Severity::Warning,
            "danger" => Severity::Danger,
            _ => Severity::Info,
        }
    }
}

/// A user-visible message destined for the toast area.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notice {
    pub severity: Severity,
    pub message: String,
}

impl Notice {
    pub fn new(severity: Severity, message: impl Into<String>) -> Self {
        Self {
            severity,
            message: message.into(),
        }
    }

    pub fn info(message: impl Into<String>) -> Self {
        Self::new(Severity::Info, message)
    }

    pub fn success(message: impl Into<String>) -> Self {
        Self::new(Severity::Success, message)
    }

    pub fn danger(message: impl Into<String>) -> Self {
        Self::new(Severity::Danger, message)
    }
}

/// Failure kinds of the browser-facing flows.
#[derive(Debug, Error)]
pub enum UiError {
    #[error("échec de la requête (HTTP {status})")]
    RequestFailed { status: u16 },
    #[error("erreur réseau: {0}")]
    Network(String),
    #[error("réponse illisible: {0}")]
    Decode(String),
    #[error("aucune donnée à exporter")]
    MissingData,
    #[error("section inconnue: {0}")]
    UnknownSection(String),
    #[error("navigateur indisponible: {0}")]
    Browser(String),
}

impl UiError {
    /// Single presentation mapping: every failure becomes one danger notice.
    pub fn notice(&self) -> Notice {
        Notice::danger(format!("Erreur: {self}"))
    }
}

// ---------- CSV conversion ---------------------------------------------------

/// Quote a field when it carries a comma, a double quote, or a line break.
pub fn escape_csv(value: &str) -> String {
    let needs_quotes =
        value.contains(',') || value.contains('"') || value.contains('\n') || value.contains('\r');
    if needs_quotes {
        let escaped = value.replace('"', "\"\"");
        format!("\"{escaped}\"")
    } else {
        value.to_string()
    }
}

/// Render one JSON value as a CSV field.
///
/// Null becomes an empty field. Nested arrays and objects are embedded as
/// compact JSON; everything else keeps its canonical text, escaped as needed.
pub fn csv_field(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::String(s) => escape_csv(s),
        other => serde_json::to_string(other)
            .map(|json| escape_csv(&json))
            .unwrap_or_default(),
    }
}

/// Convert uniform JSON records to CSV text.
///
/// The header row is the key set of the first record, in insertion order, and
/// every record is read through that same key set; a record missing a key
/// yields an empty field, while divergent schemas produce misaligned columns
/// rather than an error. Empty input yields an empty string.
pub fn records_to_csv(records: &[Map<String, Value>]) -> String {
    if records.is_empty() {
        return String::new();
    }
    let headers: Vec<&str> = records[0].keys().map(String::as_str).collect();

    let mut lines = Vec::with_capacity(records.len() + 1);
    lines.push(
        headers
            .iter()
            .map(|h| escape_csv(h))
            .collect::<Vec<_>>()
            .join(","),
    );
    for record in records {
        let line = headers
            .iter()
            .map(|h| record.get(*h).map(csv_field).unwrap_or_default())
            .collect::<Vec<_>>()
            .join(",");
        lines.push(line);
    }
    lines.join("\n")
}

// ---------- Display formatting -----------------------------------------------

/// Compact axis-tick rendering: thousands as "1.5K", millions as "2.5M".
pub fn format_axis(value: f64) -> String {
    if value >= 1_000_000.0 {
        format!("{:.1}M", value / 1_000_000.0)
    } else if value >= 1_000.0 {
        format!("{:.1}K", value / 1_000.0)
    } else {
        format!("{value}")
    }
}

/// Parse the leading integer of a text fragment: optional sign after leading
/// whitespace, then decimal digits up to the first non-digit. Returns None
/// when no digit is present or the value overflows.
pub fn parse_leading_int(text: &str) -> Option<i64> {
    let trimmed = text.trim_start();
    let (negative, digits) = match trimmed.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, trimmed.strip_prefix('+').unwrap_or(trimmed)),
    };
    let mut value: i64 = 0;
    let mut seen = false;
    for c in digits.chars() {
        match c.to_digit(10) {
            Some(d) => {
                seen = true;
                value = value.checked_mul(10)?.checked_add(i64::from(d))?;
            }
            None => break,
        }
    }
    if seen {
        Some(if negative { -value } else { value })
    } else {
        None
    }
}

// ---------- Cookies ----------------------------------------------------------

/// Look up a named cookie in a raw cookie string.
///
/// The first matching `name=value` pair wins; the value is percent-decoded,
/// falling back to the raw text when the escape sequence is malformed.
pub fn cookie_value(cookies: &str, name: &str) -> Option<String> {
    for part in cookies.split(';') {
        let part = part.trim();
        if let Some((key, raw)) = part.split_once('=') {
            if key == name {
                return Some(match urlencoding::decode(raw) {
                    Ok(decoded) => decoded.into_owned(),
                    Err(_) => raw.to_string(),
                });
            }
        }
    }
    None
}

// ---------- Chart theme ------------------------------------------------------

/// Tooltip styling pushed into the charting library defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TooltipStyle {
    pub background_color: String,
    pub padding: u32,
    pub corner_radius: u32,
}

/// Named role colors aligned with the page's Bootstrap styling.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoleColors {
    pub primary: String,
    pub secondary: String,
    pub success: String,
    pub warning: String,
    pub danger: String,
    pub info: String,
    pub light: String,
    pub dark: String,
}

/// Chart styling defaults: font, legend markers, tooltip, colors.
///
/// Constructed once at startup and injected where needed; serializes to JSON
/// for page-side chart code.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartTheme {
    pub font_family: String,
    pub use_point_style: bool,
    pub tooltip: TooltipStyle,
    pub roles: RoleColors,
    /// Ordered palette for multi-series charts.
    pub series: Vec<String>,
}

impl Default for ChartTheme {
    fn default() -> Self {
        Self {
            font_family: "'Segoe UI', 'Helvetica Neue', Arial, sans-serif".to_string(),
            use_point_style: true,
            tooltip: TooltipStyle {
                background_color: "rgba(0,0,0,0.8)".to_string(),
                padding: 12,
                corner_radius: 8,
            },
            roles: RoleColors {
                primary: "#FF6B00".to_string(),
                secondary: "#0d6efd".to_string(),
                success: "#198754".to_string(),
                warning: "#ffc107".to_string(),
                danger: "#dc3545".to_string(),
                info: "#0dcaf0".to_string(),
                light: "#f8f9fa".to_string(),
                dark: "#212529".to_string(),
            },
            series: [
                "#FF6B00", "#0d6efd", "#198754", "#ffc107", "#dc3545", "#6c757d", "#0dcaf0",
                "#6610f2", "#fd7e14", "#20c997", "#e83e8c", "#17a2b8",
            ]
            .iter()
            .map(|c| c.to_string())
            .collect(),
        }
    }
}

impl ChartTheme {
    /// Series color for an index, cycling past the palette end.
    pub fn series_color(&self, index: usize) -> &str {
        if self.series.is_empty() {
            return &self.roles.primary;
        }
        &self.series[index % self.series.len()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(pairs: &[(&str, Value)]) -> Map<String, Value> {
        let mut map = Map::new();
        for (key, value) in pairs {
            map.insert((*key).to_string(), value.clone());
        }
        map
    }

    #[test]
    fn csv_has_header_plus_one_line_per_record() {
        let records = vec![
            record(&[("region", json!("Abidjan")), ("menages", json!(1250))]),
            record(&[("region", json!("Bouake")), ("menages", json!(830))]),
        ];
        let csv = records_to_csv(&records);
        let lines: Vec<&str> = csv.split('\n').collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], "region,menages");
        assert_eq!(lines[1], "Abidjan,1250");
        assert_eq!(lines[2], "Bouake,830");
    }

    #[test]
    fn csv_of_no_records_is_empty() {
        assert_eq!(records_to_csv(&[]), "");
    }

    #[test]
    fn csv_keeps_insertion_order_of_keys() {
        let records = vec![record(&[
            ("zone", json!("nord")),
            ("annee", json!(2022)),
            ("taux", json!(12.4)),
        ])];
        assert!(records_to_csv(&records).starts_with("zone,annee,taux"));
    }

    #[test]
    fn csv_quotes_fields_containing_commas() {
        let records = vec![record(&[
            ("commune", json!("Abidjan, Plateau")),
            ("autre", json!("Bouake")),
        ])];
        let csv = records_to_csv(&records);
        assert!(csv.contains("\"Abidjan, Plateau\""));
        assert!(csv.contains("Bouake"));
        assert!(!csv.contains("\"Bouake\""));
    }

    #[test]
    fn csv_doubles_embedded_quotes() {
        assert_eq!(escape_csv("dit \"oui\""), "\"dit \"\"oui\"\"\"");
    }

    #[test]
    fn csv_quotes_line_breaks() {
        assert_eq!(escape_csv("ligne 1\nligne 2"), "\"ligne 1\nligne 2\"");
    }

    #[test]
    fn csv_renders_scalars_and_null() {
        assert_eq!(csv_field(&Value::Null), "");
        assert_eq!(csv_field(&json!(42)), "42");
        assert_eq!(csv_field(&json!(3.5)), "3.5");
        assert_eq!(csv_field(&json!(true)), "true");
    }

    #[test]
    fn csv_embeds_nested_values_as_json() {
        assert_eq!(csv_field(&json!({"a": 1})), "\"{\"\"a\"\":1}\"");
        assert_eq!(csv_field(&json!([1, 2])), "\"[1,2]\"");
    }

    #[test]
    fn csv_missing_key_renders_empty_field() {
        let records = vec![
            record(&[("a", json!(1)), ("b", json!(2))]),
            record(&[("a", json!(3))]),
        ];
        let csv = records_to_csv(&records);
        assert!(csv.ends_with("3,"));
    }

    #[test]
    fn axis_below_one_thousand_is_verbatim() {
        assert_eq!(format_axis(500.0), "500");
        assert_eq!(format_axis(0.0), "0");
        assert_eq!(format_axis(999.5), "999.5");
        assert_eq!(format_axis(-1200.0), "-1200");
    }

    #[test]
    fn axis_scales_thousands_and_millions() {
        assert_eq!(format_axis(1500.0), "1.5K");
        assert_eq!(format_axis(1000.0), "1.0K");
        assert_eq!(format_axis(999_999.0), "1000.0K");
        assert_eq!(format_axis(2_500_000.0), "2.5M");
    }

    #[test]
    fn leading_int_stops_at_first_non_digit() {
        assert_eq!(parse_leading_int("12 345 habitants"), Some(12));
        assert_eq!(parse_leading_int(" 42"), Some(42));
        assert_eq!(parse_leading_int("-7px"), Some(-7));
        assert_eq!(parse_leading_int("+8"), Some(8));
    }

    #[test]
    fn leading_int_requires_a_digit() {
        assert_eq!(parse_leading_int("abc"), None);
        assert_eq!(parse_leading_int(""), None);
        assert_eq!(parse_leading_int("-"), None);
    }

    #[test]
    fn cookie_lookup_finds_named_value() {
        let cookies = "sessionid=abc123; csrftoken=XyZ987; theme=dark";
        assert_eq!(cookie_value(cookies, "csrftoken").as_deref(), Some("XyZ987"));
        assert_eq!(cookie_value(cookies, "theme").as_deref(), Some("dark"));
    }

    #[test]
    fn cookie_lookup_misses_cleanly() {
        assert_eq!(cookie_value("a=1; b=2", "missing"), None);
        assert_eq!(cookie_value("", "any"), None);
        assert_eq!(cookie_value("noequals; a=1", "noequals"), None);
    }

    #[test]
    fn cookie_first_match_wins() {
        assert_eq!(cookie_value("dup=first; dup=second", "dup").as_deref(), Some("first"));
    }

    #[test]
    fn cookie_value_is_percent_decoded() {
        assert_eq!(cookie_value("note=un%20deux", "note").as_deref(), Some("un deux"));
        // Malformed escapes keep the raw text.
        assert_eq!(cookie_value("raw=%FF", "raw").as_deref(), Some("%FF"));
    }

    #[test]
    fn cookie_name_is_not_a_prefix_match() {
        let cookies = "csrftoken2=no; csrftoken=yes";
        assert_eq!(cookie_value(cookies, "csrftoken").as_deref(), Some("yes"));
    }

    #[test]
    fn severity_names_round_trip_with_info_fallback() {
        assert_eq!(Severity::from_name("success"), Severity::Success);
        assert_eq!(Severity::from_name("warning"), Severity::Warning);
        assert_eq!(Severity::from_name("danger"), Severity::Danger);
        assert_eq!(Severity::from_name("info"), Severity::Info);
        assert_eq!(Severity::from_name("weird"), Severity::Info);
        assert_eq!(Severity::Success.css_class(), "success");
        assert_eq!(Notice::info("x").severity, Severity::Info);
    }

    #[test]
    fn every_error_maps_to_one_danger_notice() {
        let notice = UiError::RequestFailed { status: 502 }.notice();
        assert_eq!(notice.severity, Severity::Danger);
        assert_eq!(notice.message, "Erreur: échec de la requête (HTTP 502)");

        let notice = UiError::MissingData.notice();
        assert_eq!(notice.severity, Severity::Danger);
        assert_eq!(notice.message, "Erreur: aucune donnée à exporter");
    }

    #[test]
    fn default_theme_matches_dashboard_styling() {
        let theme = ChartTheme::default();
        assert_eq!(theme.series.len(), 12);
        assert_eq!(theme.roles.primary, "#FF6B00");
        assert_eq!(theme.series_color(0), "#FF6B00");
        assert_eq!(theme.series_color(12), "#FF6B00");
        assert_eq!(theme.series_color(5), "#6c757d");
        assert_eq!(theme.tooltip.padding, 12);
        assert!(theme.use_point_style);
    }

    #[test]
    fn theme_serializes_with_camel_case_keys() {
        let value = serde_json::to_value(ChartTheme::default()).unwrap();
        assert_eq!(
            value["fontFamily"],
            json!("'Segoe UI', 'Helvetica Neue', Arial, sans-serif")
        );
        assert_eq!(value["tooltip"]["backgroundColor"], json!("rgba(0,0,0,0.8)"));
        assert_eq!(value["tooltip"]["cornerRadius"], json!(8));
        assert_eq!(value["roles"]["danger"], json!("#dc3545"));
        assert_eq!(value["series"].as_array().map(Vec::len), Some(12));
    }
}
