//! Server-side HTML rendering for the planner pages

use super::PresentationAdapter;
use crate::geocode::GeocodeStatus;
use crate::models::{Bucket, PlotRecord, PreferenceSurvey, Rating, SurveyAnswer};
use crate::workflow::SessionWorkflow;
use hplan_common::config::ModelConfig;
use std::fmt::Write;
use uuid::Uuid;

/// Half the map bounding box edge, in degrees (roughly street level)
const MAP_SPAN_DEGREES: f64 = 0.005;

const PAGE_STYLE: &str = r#"
    * { margin: 0; padding: 0; box-sizing: border-box; }
    body {
        font-family: 'Segoe UI', Tahoma, Geneva, Verdana, sans-serif;
        background-color: #1a1a1a;
        color: #e0e0e0;
        line-height: 1.6;
        display: flex;
    }
    main { flex: 1; padding: 20px 30px; max-width: 960px; }
    aside {
        width: 280px;
        background-color: #2a2a2a;
        border-right: 1px solid #3a3a3a;
        padding: 20px;
        font-size: 14px;
    }
    h1 { font-size: 26px; color: #4a9eff; margin-bottom: 10px; }
    h2 { font-size: 20px; color: #4a9eff; margin: 25px 0 10px; }
    h3 { font-size: 16px; margin: 15px 0 5px; }
    hr { border: none; border-top: 1px solid #3a3a3a; margin: 20px 0; }
    label { display: block; margin-bottom: 4px; }
    input[type=text], input[type=number] {
        width: 100%; padding: 8px; background: #2a2a2a; color: #e0e0e0;
        border: 1px solid #3a3a3a; border-radius: 4px; margin-bottom: 12px;
    }
    .columns { display: flex; gap: 20px; }
    .columns > div { flex: 1; }
    .ratings label { display: inline-block; margin-right: 14px; }
    button {
        background-color: #4a9eff; color: #fff; border: none; border-radius: 4px;
        padding: 8px 18px; font-size: 15px; cursor: pointer; margin-right: 8px;
    }
    button.secondary { background-color: #3a3a3a; }
    .banner { padding: 10px 14px; border-radius: 4px; margin: 8px 0; }
    .banner.success { background-color: #1e4620; }
    .banner.info { background-color: #1e3a5f; }
    .banner.warning { background-color: #5f4b1e; }
    .banner.error { background-color: #5f1e1e; }
    iframe { border: 1px solid #3a3a3a; border-radius: 4px; }
    footer { margin-top: 30px; color: #888; font-style: italic; font-size: 13px; }
"#;

const SIDEBAR: &str = r#"
    <h3>About this application</h3>
    <p>This app helps you capture and organise your preferences for your dream house.</p>
    <h3>Features</h3>
    <ul>
        <li>Record plot data</li>
        <li>Show the location on a map</li>
        <li>Rate your preferences</li>
        <li>Create a summary</li>
    </ul>
    <h3>Notes</h3>
    <ul>
        <li>The map requires an internet connection</li>
        <li>Your inputs are kept only for this session</li>
    </ul>
"#;

/// Escape text for use in HTML element content and quoted attributes
pub fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

fn bucket_class(bucket: Bucket) -> &'static str {
    match bucket {
        Bucket::High => "success",
        Bucket::Neutral => "info",
        Bucket::Low => "warning",
    }
}

/// HTML renderer bound to one session's action URLs
pub struct HtmlRenderer<'a> {
    session_id: Uuid,
    model: &'a ModelConfig,
}

impl<'a> HtmlRenderer<'a> {
    pub fn new(session_id: Uuid, model: &'a ModelConfig) -> Self {
        Self { session_id, model }
    }

    fn action_url(&self, action: &str) -> String {
        format!("/session/{}/{}", self.session_id, action)
    }

    /// Full page for the session's current state, with an optional warning
    pub fn render_page(&self, session: &SessionWorkflow, notice: Option<&str>) -> String {
        let mut body = String::new();
        if let Some(notice) = notice {
            let _ = write!(
                body,
                r#"<div class="banner warning">{}</div>"#,
                escape_html(notice)
            );
        }
        body.push_str(&self.render_session(session));
        self.page("House planner - plot &amp; preferences", &body)
    }

    /// Static purchase confirmation (no payment processing)
    pub fn render_purchase_page(&self) -> String {
        let body = format!(
            r#"<h2>Thank you for your interest!</h2>
<div class="banner success">Your purchase request for "{title}" has been noted. A consultant will contact you to discuss the next steps.</div>
<p><a href="/session/{id}">Back to your plan</a></p>"#,
            title = escape_html(&self.model.title),
            id = self.session_id,
        );
        self.page("House planner - purchase", &body)
    }

    fn page(&self, title: &str, body: &str) -> String {
        format!(
            r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>{title}</title>
    <style>{style}</style>
</head>
<body>
<aside>{sidebar}</aside>
<main>
    <h1>House planner - your plot &amp; preferences</h1>
    <hr>
    {body}
    <hr>
    <footer>Built for house planning - all data is processed locally.</footer>
</main>
</body>
</html>"#,
            title = title,
            style = PAGE_STYLE,
            sidebar = SIDEBAR,
            body = body,
        )
    }
}

impl PresentationAdapter for HtmlRenderer<'_> {
    fn render_entry_form(&self, plot: &PlotRecord, survey: &PreferenceSurvey) -> String {
        let mut out = String::new();
        let _ = write!(
            out,
            r#"<form method="post" action="{action}">
<h2>Plot information</h2>
<div class="columns">
    <div>
        <label for="size">Size of the building plot (in m²)</label>
        <input type="number" id="size" name="size" min="0" step="1" value="{size}">
    </div>
    <div>
        <label for="address">Address of the plot</label>
        <input type="text" id="address" name="address" placeholder="e.g. Musterstraße 1, 12345 Musterstadt" value="{address}">
    </div>
</div>"#,
            action = self.action_url("inputs"),
            size = plot.size_square_meters,
            address = escape_html(&plot.address_text),
        );

        out.push_str(&self.render_location(plot));

        out.push_str(
            r#"<h2>Preferences for your dream house</h2>
<p>Please rate the following aspects by how important they are to you (1 = unimportant, 5 = very important)</p>"#,
        );

        for question in survey.questions() {
            let current = survey.answer(question.id).map(|a| a.rating);
            let _ = write!(
                out,
                r#"<h3>Question {id}</h3><p>{text}</p><div class="ratings">"#,
                id = question.id,
                text = escape_html(question.text),
            );
            for rating in Rating::all() {
                let _ = write!(
                    out,
                    r#"<label><input type="radio" name="q{id}" value="{value}"{checked}> {display}</label>"#,
                    id = question.id,
                    value = rating.value(),
                    checked = if current == Some(rating) { " checked" } else { "" },
                    display = escape_html(&rating.to_string()),
                );
            }
            out.push_str("</div>");
        }

        out.push_str(
            r#"<hr>
<button type="submit" name="then" value="save" class="secondary">Save inputs</button>
<button type="submit" name="then" value="summary">Show summary</button>
</form>"#,
        );
        out
    }

    fn render_summary(&self, plot: &PlotRecord, ranked_answers: &[SurveyAnswer]) -> String {
        let address = if plot.address_text.trim().is_empty() {
            "Not specified".to_string()
        } else {
            escape_html(&plot.address_text)
        };

        let mut out = String::new();
        let _ = write!(
            out,
            r#"<h2>Summary of your inputs</h2>
<h3>Plot data</h3>
<p><strong>Size:</strong> {size} m²</p>
<p><strong>Address:</strong> {address}</p>
<h3>Your preferences</h3>"#,
            size = plot.size_square_meters,
            address = address,
        );

        if ranked_answers.is_empty() {
            out.push_str(r#"<div class="banner info">No preferences rated yet.</div>"#);
        }
        for answer in ranked_answers {
            let _ = write!(
                out,
                r#"<div class="banner {class}"><strong>{rating}:</strong> {text}</div>"#,
                class = bucket_class(answer.rating.bucket()),
                rating = escape_html(&answer.rating.to_string()),
                text = escape_html(answer.question.text),
            );
        }

        let _ = write!(
            out,
            r#"<form method="post" action="{confirm}"><button type="submit">Confirm</button></form>"#,
            confirm = self.action_url("confirm"),
        );
        out
    }

    fn render_model_view(&self) -> String {
        let viewer = match &self.model.embed_url {
            Some(url) => format!(
                r#"<iframe title="{title}" width="700" height="450" src="{url}" allow="autoplay; fullscreen; xr-spatial-tracking" allowfullscreen></iframe>"#,
                title = escape_html(&self.model.title),
                url = escape_html(url),
            ),
            None => r#"<div class="banner info">The 3D model viewer has not been configured.</div>"#
                .to_string(),
        };

        format!(
            r#"<h2>{title}</h2>
{viewer}
<p>
<a href="{buy}"><button type="button">Buy this house</button></a>
</p>
<form method="post" action="{reset}"><button type="submit" class="secondary">Start over</button></form>"#,
            title = escape_html(&self.model.title),
            viewer = viewer,
            buy = self.action_url("buy"),
            reset = self.action_url("reset"),
        )
    }

    fn render_location(&self, plot: &PlotRecord) -> String {
        let Some(geocode) = plot.geocode.as_ref() else {
            return String::new();
        };

        let mut out = String::from("<h2>Plot location</h2>");
        match geocode.status() {
            GeocodeStatus::Resolved => {
                let (lat, lon) = (geocode.latitude, geocode.longitude);
                let _ = write!(
                    out,
                    r#"<iframe title="Plot: {address}" width="700" height="400" src="https://www.openstreetmap.org/export/embed.html?bbox={west:.6}%2C{south:.6}%2C{east:.6}%2C{north:.6}&amp;layer=mapnik&amp;marker={lat:.6}%2C{lon:.6}"></iframe>
<div class="banner info">Coordinates: {lat:.6}, {lon:.6}</div>"#,
                    address = escape_html(&plot.address_text),
                    west = lon - MAP_SPAN_DEGREES,
                    south = lat - MAP_SPAN_DEGREES,
                    east = lon + MAP_SPAN_DEGREES,
                    north = lat + MAP_SPAN_DEGREES,
                    lat = lat,
                    lon = lon,
                );
            }
            GeocodeStatus::NotFound => {
                out.push_str(
                    r#"<div class="banner warning">Address could not be found. Please check your input.</div>"#,
                );
            }
            GeocodeStatus::Unavailable => {
                let _ = write!(
                    out,
                    r#"<div class="banner error">Error loading the map: {}</div>"#,
                    escape_html(geocode.error_message.as_deref().unwrap_or_default())
                );
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geocode::{GeocodeHit, GeocodeResult};

    fn model() -> ModelConfig {
        ModelConfig {
            embed_url: Some("https://models.example.org/house/embed".to_string()),
            title: "Family house".to_string(),
        }
    }

    #[test]
    fn test_escape_html() {
        assert_eq!(
            escape_html(r#"<a href="x">Tom & 'Jerry'</a>"#),
            "&lt;a href=&quot;x&quot;&gt;Tom &amp; &#39;Jerry&#39;&lt;/a&gt;"
        );
    }

    #[test]
    fn test_entry_form_lists_all_questions_without_default_rating() {
        let model = model();
        let renderer = HtmlRenderer::new(Uuid::nil(), &model);
        let html = renderer.render_entry_form(&PlotRecord::new(), &PreferenceSurvey::new());

        for id in 1..=10 {
            assert!(html.contains(&format!("Question {}", id)));
        }
        assert!(!html.contains(" checked"));
        assert!(html.contains("1 - Unimportant"));
        assert!(html.contains("5 - Very important"));
    }

    #[test]
    fn test_entry_form_escapes_address() {
        let model = model();
        let renderer = HtmlRenderer::new(Uuid::nil(), &model);
        let mut plot = PlotRecord::new();
        plot.set_address("<script>alert(1)</script>");

        let html = renderer.render_entry_form(&plot, &PreferenceSurvey::new());
        assert!(!html.contains("<script>"));
        assert!(html.contains("&lt;script&gt;"));
    }

    #[test]
    fn test_summary_orders_and_colours_by_bucket() {
        let model = model();
        let renderer = HtmlRenderer::new(Uuid::nil(), &model);
        let mut survey = PreferenceSurvey::new();
        survey.set_rating(1, 2).unwrap();
        survey.set_rating(2, 5).unwrap();
        survey.set_rating(3, 3).unwrap();

        let html = renderer.render_summary(&PlotRecord::new(), &survey.ranked_answers());

        let high = html.find("5 - Very important").unwrap();
        let neutral = html.find("3 - Neutral").unwrap();
        let low = html.find("2 - Slightly important").unwrap();
        assert!(high < neutral && neutral < low);
        assert!(html.contains(r#"class="banner success""#));
        assert!(html.contains(r#"class="banner warning""#));
        assert!(html.contains("Not specified"));
    }

    #[test]
    fn test_location_panel_variants() {
        let model = model();
        let renderer = HtmlRenderer::new(Uuid::nil(), &model);
        let mut plot = PlotRecord::new();
        assert!(renderer.render_location(&plot).is_empty());

        plot.set_address("Musterstraße 1");
        plot.set_geocode(GeocodeResult::resolved(GeocodeHit {
            latitude: 52.52,
            longitude: 13.4,
            display_name: "Musterstraße 1".to_string(),
        }));
        let html = renderer.render_location(&plot);
        assert!(html.contains("Coordinates: 52.520000, 13.400000"));
        assert!(html.contains("openstreetmap.org"));

        plot.set_geocode(GeocodeResult::not_found());
        assert!(renderer
            .render_location(&plot)
            .contains("Address could not be found"));

        plot.set_geocode(GeocodeResult::unavailable("timeout"));
        assert!(renderer.render_location(&plot).contains("Error loading the map: timeout"));
    }

    #[test]
    fn test_model_view_placeholder_when_unconfigured() {
        let model = ModelConfig::default();
        let renderer = HtmlRenderer::new(Uuid::nil(), &model);
        let html = renderer.render_model_view();
        assert!(html.contains("has not been configured"));
        assert!(html.contains("Buy this house"));
    }

    #[test]
    fn test_session_views_follow_state() {
        let model = model();
        let mut session = SessionWorkflow::new();
        let renderer = HtmlRenderer::new(session.session_id(), &model);

        let entering = renderer.render_page(&session, None);
        assert!(entering.contains("Plot information"));
        assert!(!entering.contains("Summary of your inputs"));

        session.request_summary().unwrap();
        let summarized = renderer.render_page(&session, Some("careful"));
        assert!(summarized.contains("Plot information"));
        assert!(summarized.contains("Summary of your inputs"));
        assert!(summarized.contains("careful"));
        assert!(!summarized.contains("Buy this house"));
    }
}
