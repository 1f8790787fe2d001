//! In-memory CAD document: layers, closed polylines and text labels,
//! ready for serialization.
//!
//! A [`Document`] starts empty, is populated by appending classified
//! regions in input order, and is consumed by [`Document::serialize`].
//! Layers are created on first use, in encounter order, with the
//! attributes of the rule that produced them. Layer names are matched
//! ignoring ASCII case, as CAD programs do.

use std::fmt;
use std::io::Write;
use std::str::FromStr;

use maskcad_pipeline::{Bounds, ClassifiedRegion, LineType, Point};
use serde::{Deserialize, Serialize};

use crate::dxf;
use crate::error::SerializationError;

/// Supported DXF releases.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum DxfVersion {
    /// AutoCAD R12 (`AC1009`).
    R12,
    /// AutoCAD 2000 (`AC1015`).
    R2000,
    /// AutoCAD 2010 (`AC1024`).
    R2010,
    /// AutoCAD 2018 (`AC1032`).
    R2018,
}

impl DxfVersion {
    /// Every supported release, oldest first.
    pub const ALL: [Self; 4] = [Self::R12, Self::R2000, Self::R2010, Self::R2018];

    /// Release name, e.g. `R2018`.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::R12 => "R12",
            Self::R2000 => "R2000",
            Self::R2010 => "R2010",
            Self::R2018 => "R2018",
        }
    }

    /// Value of the `$ACADVER` header variable.
    #[must_use]
    pub const fn acadver(self) -> &'static str {
        match self {
            Self::R12 => "AC1009",
            Self::R2000 => "AC1015",
            Self::R2010 => "AC1024",
            Self::R2018 => "AC1032",
        }
    }

    /// Whether entities and table records carry handles.
    #[must_use]
    pub const fn has_handles(self) -> bool {
        !matches!(self, Self::R12)
    }

    /// Releases before 2007 store text in a code page, so anything
    /// outside ASCII is written as `\U+XXXX`.
    #[must_use]
    pub const fn escapes_unicode(self) -> bool {
        matches!(self, Self::R12 | Self::R2000)
    }
}

impl fmt::Display for DxfVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for DxfVersion {
    type Err = SerializationError;

    /// Accepts release names (`R2018`) and `$ACADVER` codes (`AC1032`),
    /// ignoring ASCII case and surrounding whitespace.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Self::ALL
            .into_iter()
            .find(|v| {
                v.name().eq_ignore_ascii_case(wanted) || v.acadver().eq_ignore_ascii_case(wanted)
            })
            .ok_or_else(|| SerializationError::UnsupportedVersion(s.to_owned()))
    }
}

/// Drawing units, written to `$INSUNITS` for R2000 and later.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Units {
    /// No units.
    #[serde(rename = "unitless", alias = "none")]
    Unitless,
    /// Inches.
    #[serde(rename = "in", alias = "inch", alias = "inches")]
    Inches,
    /// Feet.
    #[serde(rename = "ft", alias = "feet")]
    Feet,
    /// Millimeters.
    #[default]
    #[serde(rename = "mm", alias = "millimeters")]
    Millimeters,
    /// Centimeters.
    #[serde(rename = "cm", alias = "centimeters")]
    Centimeters,
    /// Meters.
    #[serde(rename = "m", alias = "meters")]
    Meters,
}

impl Units {
    /// Every supported unit.
    pub const ALL: [Self; 6] = [
        Self::Unitless,
        Self::Inches,
        Self::Feet,
        Self::Millimeters,
        Self::Centimeters,
        Self::Meters,
    ];

    /// Short name, e.g. `mm`.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Unitless => "unitless",
            Self::Inches => "in",
            Self::Feet => "ft",
            Self::Millimeters => "mm",
            Self::Centimeters => "cm",
            Self::Meters => "m",
        }
    }

    /// `$INSUNITS` code.
    #[must_use]
    pub const fn insunits(self) -> u8 {
        match self {
            Self::Unitless => 0,
            Self::Inches => 1,
            Self::Feet => 2,
            Self::Millimeters => 4,
            Self::Centimeters => 5,
            Self::Meters => 6,
        }
    }

    /// `$MEASUREMENT` code: 0 imperial, 1 metric.
    #[must_use]
    pub const fn measurement(self) -> u8 {
        match self {
            Self::Inches | Self::Feet => 0,
            Self::Unitless | Self::Millimeters | Self::Centimeters | Self::Meters => 1,
        }
    }
}

impl fmt::Display for Units {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Units {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "unitless" | "none" => Ok(Self::Unitless),
            "in" | "inch" | "inches" => Ok(Self::Inches),
            "ft" | "feet" => Ok(Self::Feet),
            "mm" | "millimeters" => Ok(Self::Millimeters),
            "cm" | "centimeters" => Ok(Self::Centimeters),
            "m" | "meters" => Ok(Self::Meters),
            other => Err(format!(
                "unknown unit {other:?} (expected unitless, in, ft, mm, cm or m)"
            )),
        }
    }
}

/// Drawing properties, written as the `$DWGTITLE`, `$DWGAUTHOR` and
/// `$DWGSUBJECT` header variables.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Metadata {
    /// Drawing title, typically the source image name.
    pub title: Option<String>,

    /// Who or what produced the drawing.
    pub author: Option<String>,

    /// What the drawing shows, e.g. the export parameters.
    #[serde(alias = "description")]
    pub subject: Option<String>,
}

/// Layer that holds mask labels.
pub const TEXT_LAYER: &str = "MASKCAD_TEXT";

/// ACI color of [`TEXT_LAYER`] (white on dark backgrounds, black on light).
pub const TEXT_COLOR: u8 = 7;

/// Default label height in drawing units.
pub const DEFAULT_TEXT_HEIGHT: f64 = 2.5;

/// A single-line text entity.
#[derive(Debug, Clone, PartialEq)]
pub struct Label {
    /// Index into [`Document::layers`].
    pub layer: usize,
    /// Insertion point in CAD space.
    pub position: Point,
    /// Character height in drawing units.
    pub height: f64,
    /// The text.
    pub text: String,
}

/// A layer table entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Layer {
    /// Unique layer name.
    pub name: String,
    /// ACI color, 1..=255.
    pub color: u8,
    /// Line type.
    pub line_type: LineType,
}

/// Which ring of its region a polyline came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RingRole {
    /// Outer boundary.
    Outer,
    /// Hole boundary.
    Hole,
}

/// A closed polyline on one layer.
#[derive(Debug, Clone, PartialEq)]
pub struct Polyline {
    /// Index into [`Document::layers`].
    pub layer: usize,
    /// Outer ring or hole.
    pub role: RingRole,
    /// Vertices in CAD space, implicitly closed.
    pub points: Vec<Point>,
}

/// Lifecycle of a [`Document`]; the serialized state is represented by
/// the document having been consumed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentState {
    /// No entities yet.
    Empty,
    /// At least one entity has been appended.
    Populated,
}

/// A CAD document under construction.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    version: DxfVersion,
    units: Units,
    metadata: Metadata,
    layers: Vec<Layer>,
    entities: Vec<Polyline>,
    labels: Vec<Label>,
}

impl Document {
    /// An empty document.
    #[must_use]
    pub const fn new(version: DxfVersion, units: Units) -> Self {
        Self {
            version,
            units,
            metadata: Metadata {
                title: None,
                author: None,
                subject: None,
            },
            layers: Vec::new(),
            entities: Vec::new(),
            labels: Vec::new(),
        }
    }

    /// Attach metadata.
    #[must_use]
    pub fn with_metadata(mut self, metadata: Metadata) -> Self {
        self.metadata = metadata;
        self
    }

    /// Target DXF release.
    #[must_use]
    pub const fn version(&self) -> DxfVersion {
        self.version
    }

    /// Drawing units.
    #[must_use]
    pub const fn units(&self) -> Units {
        self.units
    }

    /// Embedded metadata.
    #[must_use]
    pub const fn metadata(&self) -> &Metadata {
        &self.metadata
    }

    /// Layers in first-encounter order.
    #[must_use]
    pub fn layers(&self) -> &[Layer] {
        &self.layers
    }

    /// Polylines in append order.
    #[must_use]
    pub fn entities(&self) -> &[Polyline] {
        &self.entities
    }

    /// Text labels in append order.
    #[must_use]
    pub fn labels(&self) -> &[Label] {
        &self.labels
    }

    /// Current lifecycle state.
    #[must_use]
    pub fn state(&self) -> DocumentState {
        if self.entities.is_empty() {
            DocumentState::Empty
        } else {
            DocumentState::Populated
        }
    }

    /// Append one region: its outer ring, then each hole, all on the
    /// region's layer.
    pub fn append(&mut self, region: &ClassifiedRegion) {
        let layer = self.layer_index(
            &region.layer.name,
            region.layer.color,
            region.layer.line_type,
        );
        let region = &region.region;
        self.entities.push(Polyline {
            layer,
            role: RingRole::Outer,
            points: region.outer().points().to_vec(),
        });
        for hole in region.holes() {
            self.entities.push(Polyline {
                layer,
                role: RingRole::Hole,
                points: hole.points().to_vec(),
            });
        }
    }

    /// Label a region with its mask label, placed inside the region on
    /// [`TEXT_LAYER`]. Regions without a label are left alone; returns
    /// whether a label was added.
    pub fn annotate(&mut self, region: &ClassifiedRegion, height: f64) -> bool {
        let Some(text) = region.attributes.label.as_deref() else {
            return false;
        };
        let layer = self.layer_index(TEXT_LAYER, TEXT_COLOR, LineType::Continuous);
        self.labels.push(Label {
            layer,
            position: region.region.label_point(),
            height,
            text: text.to_owned(),
        });
        true
    }

    /// Bounding box over every entity, or `None` when empty.
    #[must_use]
    pub fn extents(&self) -> Option<Bounds> {
        self.entities
            .iter()
            .flat_map(|e| e.points.iter())
            .fold(None, |acc: Option<Bounds>, p| {
                let b = Bounds {
                    min_x: p.x,
                    min_y: p.y,
                    max_x: p.x,
                    max_y: p.y,
                };
                Some(acc.map_or(b, |a| a.union(&b)))
            })
    }

    /// Serialize into DXF bytes, consuming the document.
    ///
    /// # Errors
    ///
    /// Returns [`SerializationError::Io`] if writing fails.
    pub fn serialize(self) -> Result<Vec<u8>, SerializationError> {
        let mut out = Vec::new();
        self.serialize_to(&mut out)?;
        Ok(out)
    }

    /// Serialize into a writer, consuming the document.
    ///
    /// # Errors
    ///
    /// Returns [`SerializationError::Io`] if the writer fails.
    pub fn serialize_to<W: Write>(self, mut out: W) -> Result<(), SerializationError> {
        let text = dxf::to_dxf(&self);
        out.write_all(text.as_bytes())?;
        out.flush()?;
        tracing::debug!(
            version = %self.version,
            layers = self.layers.len(),
            entities = self.entities.len(),
            labels = self.labels.len(),
            bytes = text.len(),
            "document serialized"
        );
        Ok(())
    }

    fn layer_index(&mut self, name: &str, color: u8, line_type: LineType) -> usize {
        if let Some(i) = self
            .layers
            .iter()
            .position(|l| l.name.eq_ignore_ascii_case(name))
        {
            return i;
        }
        self.layers.push(Layer {
            name: name.to_owned(),
            color,
            line_type,
        });
        self.layers.len() - 1
    }
}

/// Parse `version` and assemble a document from classified regions.
///
/// # Errors
///
/// Returns [`SerializationError::UnsupportedVersion`] before any entity
/// is created if `version` is not a supported release.
pub fn build(
    classified: &[ClassifiedRegion],
    version: &str,
    units: Units,
) -> Result<Document, SerializationError> {
    let version: DxfVersion = version.parse()?;
    let mut document = Document::new(version, units);
    for region in classified {
        document.append(region);
    }
    Ok(document)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use maskcad_pipeline::{CoordinateSpace, LayerAssignment, Region, RegionAttributes, Ring};

    use super::*;

    fn square(x0: f64, y0: f64, size: f64) -> Ring {
        Ring::new(vec![
            Point::new(x0, y0 + size),
            Point::new(x0 + size, y0 + size),
            Point::new(x0 + size, y0),
            Point::new(x0, y0),
        ])
        .unwrap()
    }

    fn classified(layer: &str, color: u8, holes: Vec<Ring>) -> ClassifiedRegion {
        labelled(layer, color, holes, None)
    }

    fn labelled(
        layer: &str,
        color: u8,
        holes: Vec<Ring>,
        label: Option<&str>,
    ) -> ClassifiedRegion {
        let region = Region::new(square(0.0, 0.0, 10.0), holes, CoordinateSpace::Cad).unwrap();
        ClassifiedRegion {
            attributes: RegionAttributes::measure(&region, 0.5, label),
            region,
            layer: LayerAssignment {
                name: layer.into(),
                color,
                line_type: LineType::Continuous,
            },
        }
    }

    #[test]
    fn version_parses_names_and_codes() {
        assert_eq!("R2018".parse::<DxfVersion>().unwrap(), DxfVersion::R2018);
        assert_eq!("r12".parse::<DxfVersion>().unwrap(), DxfVersion::R12);
        assert_eq!("AC1015".parse::<DxfVersion>().unwrap(), DxfVersion::R2000);
        assert!(matches!(
            "R14".parse::<DxfVersion>(),
            Err(SerializationError::UnsupportedVersion(v)) if v == "R14"
        ));
    }

    #[test]
    fn units_parse_and_codes() {
        assert_eq!("mm".parse::<Units>().unwrap(), Units::Millimeters);
        assert_eq!("Inch".parse::<Units>().unwrap(), Units::Inches);
        assert!("furlong".parse::<Units>().is_err());
        assert_eq!(Units::Meters.insunits(), 6);
        assert_eq!(Units::Feet.measurement(), 0);
    }

    #[test]
    fn units_deserialize_aliases() {
        let u: Units = serde_json::from_str("\"inch\"").unwrap();
        assert_eq!(u, Units::Inches);
    }

    #[test]
    fn build_rejects_version_before_entities() {
        let regions = vec![classified("A", 1, vec![])];
        assert!(matches!(
            build(&regions, "R13", Units::Millimeters),
            Err(SerializationError::UnsupportedVersion(_))
        ));
    }

    #[test]
    fn layers_are_unique_in_first_encounter_order() {
        let regions = vec![
            classified("B", 2, vec![]),
            classified("A", 1, vec![]),
            classified("B", 2, vec![]),
        ];
        let doc = build(&regions, "R2018", Units::Millimeters).unwrap();
        let names: Vec<&str> = doc.layers().iter().map(|l| l.name.as_str()).collect();
        assert_eq!(names, ["B", "A"]);
        assert_eq!(doc.entities().len(), 3);
        assert_eq!(doc.entities()[1].layer, 1);
    }

    #[test]
    fn layer_names_match_ignoring_case() {
        let regions = vec![
            classified("Wall", 2, vec![]),
            classified("WALL", 5, vec![]),
            classified("wall", 5, vec![]),
        ];
        let doc = build(&regions, "R2018", Units::Millimeters).unwrap();
        assert_eq!(doc.layers().len(), 1);
        assert_eq!(doc.layers()[0].name, "Wall");
        assert_eq!(doc.layers()[0].color, 2);
        assert!(doc.entities().iter().all(|e| e.layer == 0));
    }

    #[test]
    fn annotate_places_label_inside_region_on_text_layer() {
        let mut doc = Document::new(DxfVersion::R2018, Units::Millimeters);
        let hole = square(1.0, 1.0, 3.0);
        let region = labelled("WALL", 3, vec![hole], Some("wall"));
        doc.append(&region);
        assert!(doc.annotate(&region, 2.5));
        assert!(!doc.annotate(&classified("WALL", 3, vec![]), 2.5));

        let names: Vec<&str> = doc.layers().iter().map(|l| l.name.as_str()).collect();
        assert_eq!(names, ["WALL", TEXT_LAYER]);
        assert_eq!(doc.layers()[1].color, TEXT_COLOR);
        assert_eq!(doc.labels().len(), 1);
        let label = &doc.labels()[0];
        assert_eq!(label.text, "wall");
        assert_eq!(label.layer, 1);
        assert!((label.height - 2.5).abs() < f64::EPSILON);
        let p = label.position;
        assert!(p.x > 0.0 && p.x < 10.0 && p.y > 0.0 && p.y < 10.0);
        assert!(!(p.x > 1.0 && p.x < 4.0 && p.y > 1.0 && p.y < 4.0), "{p:?} is in the hole");
    }

    #[test]
    fn metadata_accepts_description_as_subject() {
        let metadata: Metadata =
            serde_json::from_str(r#"{"title": "plan", "description": "walls"}"#).unwrap();
        assert_eq!(metadata.subject.as_deref(), Some("walls"));
        assert_eq!(metadata.author, None);
    }

    #[test]
    fn holes_become_polylines_on_the_same_layer() {
        let regions = vec![classified("WALL", 3, vec![square(2.0, 2.0, 4.0)])];
        let doc = build(&regions, "R2000", Units::Millimeters).unwrap();
        assert_eq!(doc.entities().len(), 2);
        assert_eq!(doc.entities()[0].role, RingRole::Outer);
        assert_eq!(doc.entities()[1].role, RingRole::Hole);
        assert_eq!(doc.entities()[0].layer, doc.entities()[1].layer);
    }

    #[test]
    fn vertex_order_is_preserved() {
        let region = classified("A", 1, vec![]);
        let expected = region.region.outer().points().to_vec();
        let doc = build(&[region], "R12", Units::Unitless).unwrap();
        assert_eq!(doc.entities()[0].points, expected);
    }

    #[test]
    fn state_moves_from_empty_to_populated() {
        let mut doc = Document::new(DxfVersion::R2018, Units::Millimeters);
        assert_eq!(doc.state(), DocumentState::Empty);
        assert!(doc.extents().is_none());
        doc.append(&classified("A", 1, vec![]));
        assert_eq!(doc.state(), DocumentState::Populated);
        let ext = doc.extents().unwrap();
        assert!((ext.max_x - 10.0).abs() < f64::EPSILON);
    }
}
