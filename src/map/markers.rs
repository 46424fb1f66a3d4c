use serde::Serialize;
use serde_json::Value;

use crate::pipeline::processing::geo::{geolocated, value_number, LatLng};
use crate::snapshot::format::thousands;

/// Circle-marker styling, in the names the map library takes
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MarkerStyle {
    pub radius: f64,
    pub color: String,
    pub fill_color: String,
    pub fill_opacity: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub weight: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dash_array: Option<String>,
}

impl MarkerStyle {
    pub fn filled(radius: f64, color: &str, fill_opacity: f64) -> Self {
        Self {
            radius,
            color: color.to_string(),
            fill_color: color.to_string(),
            fill_opacity,
            weight: None,
            dash_array: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Marker {
    pub position: LatLng,
    pub style: MarkerStyle,
    /// Popup HTML; every interpolated value is escaped
    pub popup: String,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct LayerGroup {
    pub markers: Vec<Marker>,
}

impl LayerGroup {
    pub fn len(&self) -> usize {
        self.markers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.markers.is_empty()
    }
}

pub fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

fn text_field<'a>(item: &'a Value, key: &str) -> &'a str {
    item.get(key).and_then(Value::as_str).unwrap_or("")
}

/// `city, state`, with the separator only when both are present
fn place_line(city: &str, state: &str) -> String {
    let sep = if !city.is_empty() && !state.is_empty() { ", " } else { "" };
    format!("{}{}{}", escape_html(city), sep, escape_html(state))
}

/// Blue markers for each geolocated site of a `superfund.json` document
pub fn superfund_layer(sites: &[Value]) -> LayerGroup {
    let markers = sites
        .iter()
        .filter_map(|site| {
            let position = geolocated(site)?;
            let name = match text_field(site, "site_name") {
                "" => "Superfund Site",
                name => name,
            };
            let status = text_field(site, "npl_status");
            let mut popup = format!(
                "<strong>{}</strong><br>{}<br>",
                escape_html(name),
                place_line(text_field(site, "city"), text_field(site, "state"))
            );
            if !status.is_empty() {
                popup.push_str(&format!("NPL Status: {}", escape_html(status)));
            }
            Some(Marker {
                position,
                style: MarkerStyle::filled(5.0, "blue", 0.6),
                popup,
            })
        })
        .collect();
    LayerGroup { markers }
}

/// Release buckets, largest first: (lower bound in lbs, color)
const RELEASE_BUCKETS: &[(f64, &str)] = &[
    (1_000_000.0, "#b30000"),
    (100_000.0, "#e34a33"),
    (10_000.0, "#fc8d59"),
    (0.0, "#fdcc8a"),
];

pub fn release_color(release_lbs: f64) -> &'static str {
    RELEASE_BUCKETS
        .iter()
        .find(|(floor, _)| release_lbs >= *floor)
        .map(|(_, color)| *color)
        .unwrap_or(RELEASE_BUCKETS[RELEASE_BUCKETS.len() - 1].1)
}

/// TRI facility markers colored by reported release
pub fn tri_layer(items: &[Value]) -> LayerGroup {
    let markers = items
        .iter()
        .filter_map(|item| {
            let position = geolocated(item)?;
            let release = crate::snapshot::release_of(item).max(0.0);
            let year = item
                .get("year")
                .and_then(value_number)
                .map(|y| format!(" ({})", y as i64))
                .unwrap_or_default();
            let popup = format!(
                "<strong>{}</strong><br>{}<br>{} lbs released{}",
                escape_html(text_field(item, "facility")),
                escape_html(text_field(item, "chemical")),
                thousands(release),
                year
            );
            Some(Marker {
                position,
                style: MarkerStyle::filled(4.0, release_color(release), 0.7),
                popup,
            })
        })
        .collect();
    LayerGroup { markers }
}

pub fn violations_layer(items: &[Value]) -> LayerGroup {
    let markers = items
        .iter()
        .filter_map(|item| {
            let position = geolocated(item)?;
            let kind = ["type", "violation"]
                .iter()
                .map(|key| text_field(item, key))
                .find(|s| !s.is_empty())
                .unwrap_or("");
            let count = item.get("count").and_then(value_number).unwrap_or(0.0);
            let penalty = item.get("penalty").and_then(value_number).unwrap_or(0.0);
            let popup = format!(
                "<strong>{}</strong><br>{}<br>{}<br>{} violations, ${}",
                escape_html(text_field(item, "facility")),
                place_line(text_field(item, "city"), text_field(item, "state")),
                escape_html(kind),
                thousands(count),
                thousands(penalty)
            );
            Some(Marker {
                position,
                style: MarkerStyle::filled(5.0, "#7b3294", 0.6),
                popup,
            })
        })
        .collect();
    LayerGroup { markers }
}

/// Dashed white marker used for search results
pub fn temporary_marker(position: LatLng, label: &str) -> Marker {
    let label = if label.is_empty() { "Location" } else { label };
    Marker {
        position,
        style: MarkerStyle {
            radius: 8.0,
            color: "#1C2A39".to_string(),
            fill_color: "#fff".to_string(),
            fill_opacity: 1.0,
            weight: Some(2.0),
            dash_array: Some("2,2".to_string()),
        },
        popup: format!("<strong>{}</strong>", escape_html(label)),
    }
}
