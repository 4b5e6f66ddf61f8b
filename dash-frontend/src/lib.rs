use dash_core::{UiError, parse_leading_int};
use serde::Deserialize;
use serde_json::{Map, Value};

#[cfg(target_arch = "wasm32")]
use dash_core::{ChartTheme, DISPLAY_LOCALE, Notice, Severity, cookie_value, records_to_csv};

#[cfg(target_arch = "wasm32")]
use gloo_timers::future::TimeoutFuture;
#[cfg(target_arch = "wasm32")]
use js_sys::Reflect;
#[cfg(target_arch = "wasm32")]
use wasm_bindgen::JsCast;
#[cfg(target_arch = "wasm32")]
use wasm_bindgen::closure::Closure;
#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;
#[cfg(target_arch = "wasm32")]
use wasm_bindgen_futures::spawn_local;
#[cfg(target_arch = "wasm32")]
use web_sys::{
    window, Document, Element, HtmlAnchorElement, HtmlButtonElement, HtmlDocument, HtmlElement,
};

const DEFAULT_API_BASE: &str = "/api";

/// Page global consulted for an alternate API base path.
pub const API_BASE_GLOBAL: &str = "MOBIDASH_API_BASE";

/// Row cap requested from the dataset export endpoint.
pub const EXPORT_ROW_LIMIT: u32 = 100_000;

/// MIME type of the exported CSV file.
pub const CSV_MIME: &str = "text/csv;charset=utf-8;";

/// Where the dashboard API lives.
#[derive(Debug, Clone, PartialEq)]
pub struct DashboardConfig {
    pub api_base: String,
}

impl DashboardConfig {
    pub fn new(api_base: impl Into<String>) -> Self {
        Self {
            api_base: api_base.into(),
        }
    }

    /// Build from the page global `MOBIDASH_API_BASE`, defaulting to `/api`.
    pub fn from_globals() -> Self {
        #[cfg(target_arch = "wasm32")]
        {
            Self {
                api_base: read_global(API_BASE_GLOBAL)
                    .unwrap_or_else(|| DEFAULT_API_BASE.to_string()),
            }
        }
        #[cfg(not(target_arch = "wasm32"))]
        {
            Self::default()
        }
    }

    fn base(&self) -> &str {
        self.api_base.trim_end_matches('/')
    }

    pub fn refresh_url(&self) -> String {
        format!("{}/refresh/", self.base())
    }

    pub fn dataset_url(&self, dataset: &str) -> String {
        format!("{}/dataset/{}/?limit={}", self.base(), dataset, EXPORT_ROW_LIMIT)
    }

    pub fn stats_url(&self, section: StatsSection) -> String {
        format!("{}/{}/", self.base(), section.path())
    }
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            api_base: DEFAULT_API_BASE.to_string(),
        }
    }
}

/// The dashboard's read-only statistics endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatsSection {
    Overview,
    Poverty,
    Migration,
    Mobility,
    Map,
}

impl StatsSection {
    /// URL path segment of the endpoint.
    pub fn path(&self) -> &'static str {
        match self {
            StatsSection::Overview => "overview",
            StatsSection::Poverty => "poverty",
            StatsSection::Migration => "migration",
            StatsSection::Mobility => "mobility",
            StatsSection::Map => "map",
        }
    }

    /// Parse a section name as used in page markup.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "overview" => Some(StatsSection::Overview),
            "poverty" => Some(StatsSection::Poverty),
            "migration" => Some(StatsSection::Migration),
            "mobility" => Some(StatsSection::Mobility),
            "map" => Some(StatsSection::Map),
            _ => None,
        }
    }
}

/// Envelope returned by the dataset export endpoint. Fields other than `data`
/// are informational; absent ones decode to their defaults.
#[derive(Debug, Clone, Deserialize)]
pub struct DatasetPayload {
    #[serde(default)]
    pub dataset: String,
    #[serde(default)]
    pub total_rows: u64,
    #[serde(default)]
    pub returned_rows: u64,
    #[serde(default)]
    pub columns: Vec<String>,
    #[serde(default)]
    pub data: Option<Vec<Map<String, Value>>>,
}

impl DatasetPayload {
    /// Rows to export. A payload whose `data` field is absent yields
    /// `UiError::MissingData`; an empty list is still exportable.
    pub fn records(&self) -> Result<&[Map<String, Value>], UiError> {
        self.data.as_deref().ok_or(UiError::MissingData)
    }
}

/// Download name for a dataset export.
pub fn export_filename(dataset: &str) -> String {
    format!("{dataset}_export.csv")
}

/// Attribute a formatting pass stamps with the counter's raw value, so a
/// later pass rereads that instead of the grouped rendering.
pub const RAW_VALUE_ATTR: &str = "data-format-raw";

/// Numeric value of a marked counter. A stamp left by an earlier pass wins
/// over the visible text, which may already be grouped.
pub fn counter_value(stamped: Option<&str>, text: &str) -> Option<i64> {
    match stamped {
        Some(raw) => parse_leading_int(raw),
        None => parse_leading_int(text),
    }
}

// ---------- Platform helpers -------------------------------------------------

#[cfg(target_arch = "wasm32")]
fn document() -> Result<Document, JsValue> {
    window()
        .and_then(|w| w.document())
        .ok_or_else(|| JsValue::from_str("no document"))
}

#[cfg(target_arch = "wasm32")]
fn read_global(key: &str) -> Option<String> {
    Reflect::get(&js_sys::global(), &JsValue::from_str(key))
        .ok()
        .and_then(|v| v.as_string())
}

#[cfg(target_arch = "wasm32")]
fn browser_error(value: JsValue) -> UiError {
    UiError::Browser(value.as_string().unwrap_or_else(|| format!("{value:?}")))
}

#[cfg(target_arch = "wasm32")]
const CSRF_COOKIE: &str = "csrftoken";

/// CSRF token from the session cookie, if present.
#[cfg(target_arch = "wasm32")]
fn read_csrf_token() -> Option<String> {
    let doc = document().ok()?;
    let cookies = doc.dyn_ref::<HtmlDocument>()?.cookie().ok()?;
    cookie_value(&cookies, CSRF_COOKIE)
}

// ---------- HTTP client ------------------------------------------------------

#[cfg(target_arch = "wasm32")]
async fn post_refresh(config: &DashboardConfig, csrf_token: Option<&str>) -> Result<(), UiError> {
    use gloo_net::http::Request;

    let mut req = Request::post(&config.refresh_url()).header("Content-Type", "application/json");
    if let Some(token) = csrf_token {
        req = req.header("X-CSRFToken", token);
    }
    let resp = req.send().await.map_err(|e| UiError::Network(e.to_string()))?;
    if !resp.ok() {
        return Err(UiError::RequestFailed {
            status: resp.status(),
        });
    }
    Ok(())
}

#[cfg(target_arch = "wasm32")]
async fn fetch_dataset(
    config: &DashboardConfig,
    dataset: &str,
) -> Result<DatasetPayload, UiError> {
    use gloo_net::http::Request;

    let resp = Request::get(&config.dataset_url(dataset))
        .send()
        .await
        .map_err(|e| UiError::Network(e.to_string()))?;
    if !resp.ok() {
        return Err(UiError::RequestFailed {
            status: resp.status(),
        });
    }
    resp.json::<DatasetPayload>()
        .await
        .map_err(|e| UiError::Decode(e.to_string()))
}

/// GET one read-only stats payload; its shape belongs to the page charts.
#[cfg(target_arch = "wasm32")]
pub async fn fetch_stats(
    config: &DashboardConfig,
    section: StatsSection,
) -> Result<Value, UiError> {
    use gloo_net::http::Request;

    let resp = Request::get(&config.stats_url(section))
        .send()
        .await
        .map_err(|e| UiError::Network(e.to_string()))?;
    if !resp.ok() {
        return Err(UiError::RequestFailed {
            status: resp.status(),
        });
    }
    resp.json::<Value>()
        .await
        .map_err(|e| UiError::Decode(e.to_string()))
}

// ---------- Toasts -----------------------------------------------------------

#[cfg(target_arch = "wasm32")]
const TOAST_CONTAINER_ID: &str = "toast-container";
#[cfg(target_arch = "wasm32")]
const TOAST_DISMISS_MS: u32 = 3_000;

#[cfg(target_arch = "wasm32")]
fn toast_container(doc: &Document) -> Result<Element, JsValue> {
    if let Some(existing) = doc.get_element_by_id(TOAST_CONTAINER_ID) {
        return Ok(existing);
    }
    let container = doc.create_element("div")?;
    container.set_id(TOAST_CONTAINER_ID);
    container.set_class_name("position-fixed bottom-0 end-0 p-3");
    container
        .dyn_ref::<HtmlElement>()
        .ok_or_else(|| JsValue::from_str("container is not an HTMLElement"))?
        .style()
        .set_property("z-index", "1100")?;
    doc.body()
        .ok_or_else(|| JsValue::from_str("no body"))?
        .append_child(&container)?;
    Ok(container)
}

/// Append a dismissible toast to the shared container.
///
/// The close button and a timer both remove the element from the document;
/// whichever fires first wins.
#[cfg(target_arch = "wasm32")]
pub fn show_toast(notice: &Notice) -> Result<(), JsValue> {
    let doc = document()?;
    let container = toast_container(&doc)?;

    let toast = doc.create_element("div")?;
    // Bootstrap only reveals a toast carrying the "show" class.
    toast.set_class_name(&format!(
        "toast align-items-center text-white bg-{} border-0 show",
        notice.severity.css_class()
    ));
    toast.set_attribute("role", "alert")?;

    let flex = doc.create_element("div")?;
    flex.set_class_name("d-flex");
    let body = doc.create_element("div")?;
    body.set_class_name("toast-body");
    body.set_text_content(Some(&notice.message));
    let close = doc.create_element("button")?;
    close.set_attribute("type", "button")?;
    close.set_class_name("btn-close btn-close-white me-2 m-auto");
    flex.append_child(&body)?;
    flex.append_child(&close)?;
    toast.append_child(&flex)?;
    container.append_child(&toast)?;

    {
        let toast = toast.clone();
        let closure = Closure::<dyn FnMut()>::wrap(Box::new(move || {
            toast.remove();
        }));
        close.add_event_listener_with_callback("click", closure.as_ref().unchecked_ref())?;
        closure.forget();
    }

    spawn_local(async move {
        TimeoutFuture::new(TOAST_DISMISS_MS).await;
        if toast.is_connected() {
            toast.remove();
        }
    });

    Ok(())
}

/// Route a failure to the toast area and the console.
#[cfg(target_arch = "wasm32")]
fn report_error(err: &UiError) {
    web_sys::console::error_1(&JsValue::from_str(&err.to_string()));
    if let Err(js) = show_toast(&err.notice()) {
        web_sys::console::error_1(&js);
    }
}

// ---------- Page bindings ----------------------------------------------------

#[cfg(target_arch = "wasm32")]
const SIDEBAR_TOGGLE_ID: &str = "sidebarCollapse";
#[cfg(target_arch = "wasm32")]
const SIDEBAR_ID: &str = "sidebar";
#[cfg(target_arch = "wasm32")]
const SIDEBAR_COLLAPSED_CLASS: &str = "collapsed";

/// Wire the sidebar collapse button. Pages without a sidebar are left as-is.
#[cfg(target_arch = "wasm32")]
pub fn bind_sidebar_toggle(doc: &Document) -> Result<(), JsValue> {
    let trigger = match doc.get_element_by_id(SIDEBAR_TOGGLE_ID) {
        Some(el) => el,
        None => return Ok(()),
    };
    let sidebar = match doc.get_element_by_id(SIDEBAR_ID) {
        Some(el) => el,
        None => return Ok(()),
    };
    let closure = Closure::<dyn FnMut()>::wrap(Box::new(move || {
        let _ = sidebar.class_list().toggle(SIDEBAR_COLLAPSED_CLASS);
    }));
    trigger.add_event_listener_with_callback("click", closure.as_ref().unchecked_ref())?;
    closure.forget();
    Ok(())
}

/// Rewrite every `[data-format="number"]` element with a locale rendering of
/// its leading integer. Unparseable text is left alone. Formatted elements
/// are stamped with their raw value; repeat passes reread the stamp instead
/// of the grouped text.
#[cfg(target_arch = "wasm32")]
pub fn format_marked_numbers(doc: &Document) -> Result<(), JsValue> {
    let nodes = doc.query_selector_all("[data-format=\"number\"]")?;
    for i in 0..nodes.length() {
        let node = match nodes.item(i) {
            Some(node) => node,
            None => continue,
        };
        let el = match node.dyn_into::<Element>() {
            Ok(el) => el,
            Err(_) => continue,
        };
        let text = el.text_content().unwrap_or_default();
        let stamped = el.get_attribute(RAW_VALUE_ATTR);
        if let Some(value) = counter_value(stamped.as_deref(), &text) {
            el.set_attribute(RAW_VALUE_ATTR, &value.to_string())?;
            let formatted = js_sys::Number::from(value as f64).to_locale_string(DISPLAY_LOCALE);
            el.set_text_content(Some(&String::from(formatted)));
        }
    }
    Ok(())
}

// ---------- Refresh and export flows -----------------------------------------

#[cfg(target_arch = "wasm32")]
const LOADING_LABEL: &str = "<i class=\"bi bi-hourglass-split\"></i> Chargement...";
#[cfg(target_arch = "wasm32")]
const RELOAD_DELAY_MS: u32 = 1_000;

/// Reload the page after a short pause so the success toast stays readable.
#[cfg(target_arch = "wasm32")]
fn schedule_reload(delay_ms: u32) {
    spawn_local(async move {
        TimeoutFuture::new(delay_ms).await;
        if let Some(win) = window() {
            let _ = win.location().reload();
        }
    });
}

/// POST a refresh request and announce the outcome.
///
/// `button` is the control that triggered the call. It is disabled and
/// relabelled for the duration, and restored on every path before the outcome
/// reaches the toast area or the delayed reload fires.
#[cfg(target_arch = "wasm32")]
pub async fn run_refresh(
    config: &DashboardConfig,
    button: &HtmlButtonElement,
) -> Result<(), JsValue> {
    let original = button.inner_html();
    button.set_inner_html(LOADING_LABEL);
    button.set_disabled(true);

    let csrf = read_csrf_token();
    let outcome = post_refresh(config, csrf.as_deref()).await;

    button.set_inner_html(&original);
    button.set_disabled(false);

    match outcome {
        Ok(()) => {
            show_toast(&Notice::success("Données actualisées avec succès"))?;
            schedule_reload(RELOAD_DELAY_MS);
        }
        Err(err) => report_error(&err),
    }
    Ok(())
}

#[cfg(target_arch = "wasm32")]
fn export_dataset_csv(payload: &DatasetPayload, dataset: &str) -> Result<u64, UiError> {
    let csv = records_to_csv(payload.records()?);
    download_text(&csv, CSV_MIME, &export_filename(dataset)).map_err(browser_error)?;
    Ok(payload.returned_rows)
}

/// Fetch a dataset and hand it to the user as a CSV download.
#[cfg(target_arch = "wasm32")]
pub async fn run_download(config: &DashboardConfig, dataset: &str) -> Result<(), JsValue> {
    let outcome = fetch_dataset(config, dataset)
        .await
        .and_then(|payload| export_dataset_csv(&payload, dataset));
    match outcome {
        Ok(rows) => show_toast(&Notice::success(format!("Export de {rows} lignes réussi")))?,
        Err(err) => report_error(&err),
    }
    Ok(())
}

/// Push a text file at the user through a synthetic anchor click.
#[cfg(target_arch = "wasm32")]
fn download_text(text: &str, mime: &str, filename: &str) -> Result<(), JsValue> {
    let doc = document()?;
    let parts = js_sys::Array::new();
    parts.push(&JsValue::from_str(text));
    let opts = web_sys::BlobPropertyBag::new();
    opts.set_type(mime);
    let blob = web_sys::Blob::new_with_str_sequence_and_options(&parts, &opts)?;
    let url = web_sys::Url::create_object_url_with_blob(&blob)?;

    let anchor: HtmlAnchorElement = doc
        .create_element("a")?
        .dyn_into::<HtmlAnchorElement>()
        .map_err(|_| JsValue::from_str("not an anchor"))?;
    anchor.set_href(&url);
    anchor.set_download(filename);
    anchor.style().set_property("visibility", "hidden")?;
    doc.body()
        .ok_or_else(|| JsValue::from_str("no body"))?
        .append_child(&anchor)?;
    anchor.click();
    anchor.remove();
    web_sys::Url::revoke_object_url(&url)?;
    Ok(())
}

// ---------- Chart defaults ---------------------------------------------------

/// Set a nested property, creating intermediate objects as needed.
#[cfg(target_arch = "wasm32")]
fn set_path(root: &JsValue, path: &[&str], value: &JsValue) -> Result<(), JsValue> {
    let mut current = root.clone();
    for key in &path[..path.len() - 1] {
        let key = JsValue::from_str(key);
        let mut next = Reflect::get(&current, &key)?;
        if next.is_undefined() || next.is_null() {
            next = js_sys::Object::new().into();
            Reflect::set(&current, &key, &next)?;
        }
        current = next;
    }
    Reflect::set(&current, &JsValue::from_str(path[path.len() - 1]), value)?;
    Ok(())
}

/// Apply the theme to the page charting library's global defaults.
///
/// Returns false when no `Chart` global is present; the page then keeps the
/// library's own defaults.
#[cfg(target_arch = "wasm32")]
pub fn apply_chart_defaults(theme: &ChartTheme) -> Result<bool, JsValue> {
    let chart = Reflect::get(&js_sys::global(), &JsValue::from_str("Chart"))?;
    if chart.is_undefined() || chart.is_null() {
        return Ok(false);
    }
    let defaults = Reflect::get(&chart, &JsValue::from_str("defaults"))?;
    if defaults.is_undefined() || defaults.is_null() {
        return Ok(false);
    }

    set_path(
        &defaults,
        &["font", "family"],
        &JsValue::from_str(&theme.font_family),
    )?;
    set_path(
        &defaults,
        &["plugins", "legend", "labels", "usePointStyle"],
        &JsValue::from_bool(theme.use_point_style),
    )?;
    set_path(
        &defaults,
        &["plugins", "tooltip", "backgroundColor"],
        &JsValue::from_str(&theme.tooltip.background_color),
    )?;
    set_path(
        &defaults,
        &["plugins", "tooltip", "padding"],
        &JsValue::from_f64(f64::from(theme.tooltip.padding)),
    )?;
    set_path(
        &defaults,
        &["plugins", "tooltip", "cornerRadius"],
        &JsValue::from_f64(f64::from(theme.tooltip.corner_radius)),
    )?;
    Ok(true)
}

// ---------- JS facade --------------------------------------------------------

/// Entry object the host page constructs once on DOMContentLoaded.
#[cfg(target_arch = "wasm32")]
#[wasm_bindgen]
pub struct Dashboard {
    config: DashboardConfig,
    theme: ChartTheme,
}

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen]
impl Dashboard {
    /// One-time page setup: sidebar toggle, number formatting, chart defaults.
    #[wasm_bindgen(constructor)]
    pub fn new() -> Result<Dashboard, JsValue> {
        console_error_panic_hook::set_once();
        let config = DashboardConfig::from_globals();
        let theme = ChartTheme::default();

        let doc = document()?;
        bind_sidebar_toggle(&doc)?;
        format_marked_numbers(&doc)?;
        apply_chart_defaults(&theme)?;

        Ok(Dashboard { config, theme })
    }

    /// Refresh server data; `button` is the control that triggered it.
    #[wasm_bindgen]
    pub fn refresh_data(&self, button: HtmlButtonElement) {
        let config = self.config.clone();
        spawn_local(async move {
            if let Err(err) = run_refresh(&config, &button).await {
                web_sys::console::error_1(&err);
            }
        });
    }

    /// Export a dataset as a CSV download.
    #[wasm_bindgen]
    pub fn download_dataset(&self, dataset: String) {
        let config = self.config.clone();
        spawn_local(async move {
            if let Err(err) = run_download(&config, &dataset).await {
                web_sys::console::error_1(&err);
            }
        });
    }

    /// Show a toast; `severity` is one of info/success/warning/danger.
    #[wasm_bindgen]
    pub fn show_toast(&self, message: String, severity: String) {
        let notice = Notice::new(Severity::from_name(&severity), message);
        if let Err(err) = show_toast(&notice) {
            web_sys::console::error_1(&err);
        }
    }

    /// Fetch one stats section and pass its JSON text to `callback`.
    #[wasm_bindgen]
    pub fn load_stats(&self, section: String, callback: js_sys::Function) {
        let config = self.config.clone();
        spawn_local(async move {
            let parsed = match StatsSection::from_name(&section) {
                Some(parsed) => parsed,
                None => {
                    report_error(&UiError::UnknownSection(section));
                    return;
                }
            };
            match fetch_stats(&config, parsed).await {
                Ok(value) => {
                    let json = value.to_string();
                    let _ = callback.call1(&JsValue::NULL, &JsValue::from_str(&json));
                }
                Err(err) => report_error(&err),
            }
        });
    }

    /// Re-run number formatting after the page injects new values.
    #[wasm_bindgen]
    pub fn format_numbers(&self) -> Result<(), JsValue> {
        format_marked_numbers(&document()?)
    }

    /// Theme colors and chart defaults as JSON for page-side chart code.
    #[wasm_bindgen]
    pub fn theme_json(&self) -> Result<String, JsValue> {
        serde_json::to_string(&self.theme).map_err(|e| JsValue::from_str(&e.to_string()))
    }

    /// Axis tick label with K/M scaling.
    #[wasm_bindgen]
    pub fn format_axis(&self, value: f64) -> String {
        dash_core::format_axis(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dash_core::records_to_csv;

    #[test]
    fn default_config_points_at_api() {
        assert_eq!(DashboardConfig::default().api_base, "/api");
        assert_eq!(DashboardConfig::from_globals().api_base, "/api");
    }

    #[test]
    fn url_builders_compose_base_and_paths() {
        let config = DashboardConfig::new("/api");
        assert_eq!(config.refresh_url(), "/api/refresh/");
        assert_eq!(
            config.dataset_url("menages"),
            "/api/dataset/menages/?limit=100000"
        );
        assert_eq!(config.stats_url(StatsSection::Poverty), "/api/poverty/");
    }

    #[test]
    fn trailing_slash_on_base_is_tolerated() {
        let config = DashboardConfig::new("https://example.test/api/");
        assert_eq!(config.refresh_url(), "https://example.test/api/refresh/");
    }

    #[test]
    fn sections_map_to_paths_and_back() {
        let sections = [
            (StatsSection::Overview, "overview"),
            (StatsSection::Poverty, "poverty"),
            (StatsSection::Migration, "migration"),
            (StatsSection::Mobility, "mobility"),
            (StatsSection::Map, "map"),
        ];
        for (section, path) in sections {
            assert_eq!(section.path(), path);
            assert_eq!(StatsSection::from_name(path), Some(section));
        }
        assert_eq!(StatsSection::from_name("unknown"), None);
    }

    #[test]
    fn dataset_payload_decodes_full_envelope() {
        let json = r#"{
            "dataset": "menages",
            "total_rows": 5000,
            "returned_rows": 2,
            "columns": ["region", "taille"],
            "data": [
                {"region": "Abidjan", "taille": 4},
                {"region": "Bouake", "taille": 6}
            ]
        }"#;
        let payload: DatasetPayload = serde_json::from_str(json).unwrap();
        assert_eq!(payload.dataset, "menages");
        assert_eq!(payload.total_rows, 5000);
        assert_eq!(payload.returned_rows, 2);
        assert_eq!(payload.columns, ["region", "taille"]);
        assert_eq!(payload.data.as_ref().map(Vec::len), Some(2));
    }

    #[test]
    fn dataset_payload_tolerates_missing_fields() {
        let payload: DatasetPayload = serde_json::from_str(r#"{"dataset": "x"}"#).unwrap();
        assert!(payload.data.is_none());
        assert_eq!(payload.returned_rows, 0);
        assert!(payload.columns.is_empty());
    }

    #[test]
    fn payload_without_data_reports_missing_data() {
        let bare: DatasetPayload = serde_json::from_str(r#"{"dataset": "menages"}"#).unwrap();
        assert!(matches!(bare.records(), Err(UiError::MissingData)));

        let empty: DatasetPayload = serde_json::from_str(r#"{"data": []}"#).unwrap();
        assert_eq!(empty.records().unwrap().len(), 0);
    }

    #[test]
    fn payload_rows_convert_in_column_order() {
        let json = r#"{
            "dataset": "pauvrete",
            "returned_rows": 1,
            "data": [{"region": "Nord", "taux": 38.2, "annee": 2021}]
        }"#;
        let payload: DatasetPayload = serde_json::from_str(json).unwrap();
        let csv = records_to_csv(payload.records().unwrap());
        assert_eq!(csv, "region,taux,annee\nNord,38.2,2021");
    }

    #[test]
    fn export_filename_matches_convention() {
        assert_eq!(export_filename("menages"), "menages_export.csv");
        assert_eq!(export_filename("flux_migration"), "flux_migration_export.csv");
    }

    #[test]
    fn stamped_counters_survive_reformatting() {
        // fr-FR grouping inserts no-break spaces, so reparsing a rendered
        // counter would stop at the first group.
        assert_eq!(parse_leading_int("1\u{202f}234\u{202f}567"), Some(1));
        assert_eq!(parse_leading_int("1\u{a0}234\u{a0}567"), Some(1));

        assert_eq!(counter_value(None, "1234567"), Some(1_234_567));
        let second_pass = counter_value(Some("1234567"), "1\u{202f}234\u{202f}567");
        assert_eq!(second_pass, Some(1_234_567));
    }
}
