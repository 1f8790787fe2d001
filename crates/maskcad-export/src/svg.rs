//! SVG preview of a [`Document`].
//!
//! Uses the [`svg`] crate for document construction, XML escaping, and
//! path data formatting. Each polyline becomes one closed `<path>` and
//! each label a `<text>`, grouped per layer and stroked with the layer's
//! ACI color. CAD
//! coordinates are Y-up, so they are flipped into the SVG's Y-down
//! `viewBox`.
//!
//! This is a pure function with no I/O -- it returns a `String`.

use svg::Document as SvgDocument;
use svg::node::element::path::Data;
use svg::node::element::{self, Description, Group, Path, Title};
use svg::node::{Text, Value};

use maskcad_pipeline::{Bounds, Point};

use crate::document::{Document, Polyline};

/// Fraction of the larger extent added as margin on every side.
const MARGIN_FRACTION: f64 = 0.02;

/// RGB hex color for an AutoCAD Color Index value.
///
/// The nine standard colors map exactly; the rest of the palette is
/// previewed as gray. ACI 7 is drawn black on a white page.
#[must_use]
pub const fn aci_to_rgb(color: u8) -> &'static str {
    match color {
        1 => "#FF0000",
        2 => "#FFFF00",
        3 => "#00FF00",
        4 => "#00FFFF",
        5 => "#0000FF",
        6 => "#FF00FF",
        7 => "#000000",
        9 => "#C0C0C0",
        _ => "#808080",
    }
}

/// Build the SVG path `d` attribute for a closed polyline, mapping each
/// point through `map`. Returns an empty string for fewer than 2 points.
fn path_data(polyline: &Polyline, map: impl Fn(Point) -> (f64, f64)) -> String {
    let Some((first, rest)) = polyline.points.split_first() else {
        return String::new();
    };
    if rest.is_empty() {
        return String::new();
    }
    let mut data = Data::new().move_to(map(*first));
    for p in rest {
        data = data.line_to(map(*p));
    }
    String::from(Value::from(data.close()))
}

/// Render a document as an SVG preview.
///
/// The `viewBox` covers the document's extents plus a small margin;
/// an empty document produces a 1x1 page with no paths. The document's
/// title and subject become `<title>` and `<desc>`.
///
/// # Examples
///
/// ```
/// use maskcad_export::{Document, DxfVersion, Units, to_svg};
///
/// let svg = to_svg(&Document::new(DxfVersion::R2018, Units::Millimeters));
/// assert!(svg.starts_with("<?xml"));
/// assert!(!svg.contains("<path"));
/// ```
#[must_use]
pub fn to_svg(document: &Document) -> String {
    let extents = document.extents().unwrap_or(Bounds {
        min_x: 0.0,
        min_y: 0.0,
        max_x: 1.0,
        max_y: 1.0,
    });
    let margin = extents.width().max(extents.height()) * MARGIN_FRACTION;
    let width = 2.0f64.mul_add(margin, extents.width());
    let height = 2.0f64.mul_add(margin, extents.height());

    let map = |p: Point| (p.x - extents.min_x + margin, extents.max_y - p.y + margin);

    let mut doc = SvgDocument::new()
        .set("width", width.to_string())
        .set("height", height.to_string())
        .set("viewBox", format!("0 0 {width} {height}"));

    let metadata = document.metadata();
    if let Some(title) = &metadata.title {
        doc = doc.add(Title::new(title.as_str()));
    }
    if let Some(subject) = &metadata.subject {
        doc = doc.add(Description::new().add(Text::new(subject.as_str())));
    }

    for (index, layer) in document.layers().iter().enumerate() {
        let mut group = Group::new()
            .set("id", format!("layer-{index}"))
            .set("data-layer", layer.name.as_str())
            .set("fill", "none")
            .set("stroke", aci_to_rgb(layer.color))
            .set("stroke-width", (margin / 4.0).to_string());
        for entity in document.entities().iter().filter(|e| e.layer == index) {
            let d = path_data(entity, map);
            if d.is_empty() {
                continue;
            }
            group = group.add(Path::new().set("d", d));
        }
        for label in document.labels().iter().filter(|l| l.layer == index) {
            let (x, y) = map(label.position);
            group = group.add(
                element::Text::new(label.text.as_str())
                    .set("x", x.to_string())
                    .set("y", y.to_string())
                    .set("font-size", label.height.to_string())
                    .set("text-anchor", "middle")
                    .set("fill", aci_to_rgb(layer.color))
                    .set("stroke", "none"),
            );
        }
        doc = doc.add(group);
    }

    // The svg crate omits the XML declaration, so we prepend it.
    format!("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n{doc}\n")
}
