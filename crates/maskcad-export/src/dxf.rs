//! DXF text serializer.
//!
//! Writes a [`Document`] as ASCII DXF. Every value is preceded by its
//! group code, right-aligned to three columns:
//!
//! ```text
//!   0
//! SECTION
//!   2
//! HEADER
//! ```
//!
//! Polylines come first in the entity section, then text labels. R12
//! output uses `POLYLINE`/`VERTEX`/`SEQEND` entities and has no
//! handles. R2000 and later use `LWPOLYLINE`, carry the full set of
//! symbol tables, model and paper space blocks and a root dictionary,
//! and give every object a handle. Handles are allocated sequentially
//! in write order, so identical documents serialize to identical bytes.
//!
//! This is a pure function with no I/O -- it returns a `String`.

use std::borrow::Cow;
use std::fmt::{self, Write};

use maskcad_pipeline::{Bounds, DEFAULT_COLOR, LineType, Point};

use crate::document::{DEFAULT_TEXT_HEIGHT, Document, DxfVersion, Label, Layer, Polyline};

/// Name of the layer every DXF file must contain.
pub const LAYER_ZERO: &str = "0";

/// Serialize a document into DXF text.
///
/// # Examples
///
/// ```
/// use maskcad_export::{Document, DxfVersion, Units, to_dxf};
///
/// let doc = Document::new(DxfVersion::R12, Units::Millimeters);
/// let dxf = to_dxf(&doc);
/// assert!(dxf.contains("AC1009"));
/// assert!(dxf.ends_with("  0\nEOF\n"));
/// ```
#[must_use]
pub fn to_dxf(document: &Document) -> String {
    let mut body = Writer::new(document.version());
    // Handle 0 is reserved; the header needs the final seed, so
    // everything after it is written first.
    if document.version().has_handles() {
        body.modern_body(document);
    } else {
        body.r12_body(document);
    }

    let mut out = Writer::new(document.version());
    out.header(document, body.next_handle);
    out.out.push_str(&body.out);
    out.pair(0, "EOF");
    out.out
}

/// Format a real value: shortest round-trip representation, always with
/// a decimal point, and no negative zero.
#[must_use]
pub fn real(value: f64) -> String {
    let value = if value == 0.0 { 0.0 } else { value };
    let s = value.to_string();
    if s.contains('.') || s.contains("inf") || s.contains("NaN") {
        s
    } else {
        format!("{s}.0")
    }
}

/// Escape text for the given version: before R2007 every character
/// outside ASCII becomes `\U+XXXX` (UTF-16 code units).
#[must_use]
pub fn escape_text(text: &str, version: DxfVersion) -> Cow<'_, str> {
    if !version.escapes_unicode() || text.is_ascii() {
        return Cow::Borrowed(text);
    }
    let mut out = String::with_capacity(text.len() + 8);
    for ch in text.chars() {
        if ch.is_ascii() {
            out.push(ch);
        } else {
            let mut units = [0u16; 2];
            for unit in ch.encode_utf16(&mut units) {
                let _ = write!(out, "\\U+{unit:04X}");
            }
        }
    }
    Cow::Owned(out)
}

/// A handle as written to DXF (upper-case hex).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Handle(u32);

impl fmt::Display for Handle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:X}", self.0)
    }
}

/// Owner pointer for objects owned by nothing.
const NO_OWNER: Handle = Handle(0);

struct Writer {
    version: DxfVersion,
    out: String,
    next_handle: u32,
}

/// Layer and line type tables as they will be written.
struct Tables {
    layers: Vec<Layer>,
    line_types: Vec<LineType>,
}

impl Tables {
    /// Layer `0` first (unless the document defines it), then the
    /// document's layers; every line type any layer uses.
    fn new(document: &Document) -> Self {
        let mut layers = Vec::with_capacity(document.layers().len() + 1);
        if !document.layers().iter().any(|l| l.name == LAYER_ZERO) {
            layers.push(Layer {
                name: LAYER_ZERO.to_owned(),
                color: DEFAULT_COLOR,
                line_type: LineType::Continuous,
            });
        }
        layers.extend(document.layers().iter().cloned());

        let line_types = LineType::ALL
            .into_iter()
            .filter(|lt| *lt == LineType::Continuous || layers.iter().any(|l| l.line_type == *lt))
            .collect();

        Self { layers, line_types }
    }
}

impl Writer {
    const fn new(version: DxfVersion) -> Self {
        Self {
            version,
            out: String::new(),
            next_handle: 1,
        }
    }

    fn pair(&mut self, code: u16, value: impl fmt::Display) {
        let _ = writeln!(self.out, "{code:>3}\n{value}");
    }

    fn real(&mut self, code: u16, value: f64) {
        self.pair(code, real(value));
    }

    fn text(&mut self, code: u16, value: &str) {
        let escaped = escape_text(value, self.version);
        self.pair(code, escaped);
    }

    fn point(&mut self, code: u16, p: Point) {
        self.real(code, p.x);
        self.real(code + 10, p.y);
    }

    fn point3(&mut self, code: u16, p: Point) {
        self.point(code, p);
        self.real(code + 20, 0.0);
    }

    fn handle(&mut self) -> Handle {
        let h = Handle(self.next_handle);
        self.next_handle += 1;
        h
    }

    fn begin_section(&mut self, name: &str) {
        self.pair(0, "SECTION");
        self.pair(2, name);
    }

    fn end_section(&mut self) {
        self.pair(0, "ENDSEC");
    }

    // --- Header ---

    fn header(&mut self, document: &Document, handseed: u32) {
        let extents = document.extents().unwrap_or(Bounds {
            min_x: 0.0,
            min_y: 0.0,
            max_x: 0.0,
            max_y: 0.0,
        });

        self.begin_section("HEADER");
        self.pair(9, "$ACADVER");
        self.pair(1, self.version.acadver());
        if self.version.has_handles() {
            self.pair(9, "$DWGCODEPAGE");
            self.pair(3, "ANSI_1252");
        }
        self.pair(9, "$INSBASE");
        self.point3(10, Point::new(0.0, 0.0));
        self.pair(9, "$EXTMIN");
        self.point3(10, Point::new(extents.min_x, extents.min_y));
        self.pair(9, "$EXTMAX");
        self.point3(10, Point::new(extents.max_x, extents.max_y));
        if self.version.has_handles() {
            self.pair(9, "$HANDSEED");
            self.pair(5, Handle(handseed));
            self.pair(9, "$INSUNITS");
            self.pair(70, document.units().insunits());
            self.pair(9, "$MEASUREMENT");
            self.pair(70, document.units().measurement());
        }
        let metadata = document.metadata();
        for (name, value) in [
            ("$DWGTITLE", &metadata.title),
            ("$DWGAUTHOR", &metadata.author),
            ("$DWGSUBJECT", &metadata.subject),
        ] {
            if let Some(value) = value {
                self.pair(9, name);
                // Header strings are a single line.
                self.text(1, &value.lines().collect::<Vec<_>>().join(" "));
            }
        }
        self.end_section();
    }

    // --- R12 ---

    fn r12_body(&mut self, document: &Document) {
        let tables = Tables::new(document);

        self.begin_section("TABLES");
        self.pair(0, "TABLE");
        self.pair(2, "LTYPE");
        self.pair(70, tables.line_types.len());
        for lt in &tables.line_types {
            self.pair(0, "LTYPE");
            self.line_type_body(*lt);
        }
        self.pair(0, "ENDTAB");

        self.pair(0, "TABLE");
        self.pair(2, "LAYER");
        self.pair(70, tables.layers.len());
        for layer in &tables.layers {
            self.pair(0, "LAYER");
            self.layer_body(layer);
        }
        self.pair(0, "ENDTAB");

        self.pair(0, "TABLE");
        self.pair(2, "STYLE");
        self.pair(70, 1);
        self.pair(0, "STYLE");
        self.style_body();
        self.pair(0, "ENDTAB");
        self.end_section();

        self.begin_section("BLOCKS");
        self.end_section();

        self.begin_section("ENTITIES");
        for entity in document.entities() {
            let layer = &document.layers()[entity.layer].name;
            self.r12_polyline(entity, layer);
        }
        for label in document.labels() {
            let layer = &document.layers()[label.layer].name;
            self.pair(0, "TEXT");
            self.text(8, layer);
            self.text_body(label);
        }
        self.end_section();
    }

    fn r12_polyline(&mut self, entity: &Polyline, layer: &str) {
        self.pair(0, "POLYLINE");
        self.text(8, layer);
        self.pair(66, 1);
        self.point3(10, Point::new(0.0, 0.0));
        self.pair(70, 1);
        for p in &entity.points {
            self.pair(0, "VERTEX");
            self.text(8, layer);
            self.point3(10, *p);
        }
        self.pair(0, "SEQEND");
        self.text(8, layer);
    }

    // --- R2000 and later ---

    fn modern_body(&mut self, document: &Document) {
        let tables = Tables::new(document);

        self.begin_section("CLASSES");
        self.end_section();

        self.begin_section("TABLES");
        self.table("VPORT", 1, |w, owner| {
            w.record("VPORT", owner, "AcDbViewportTableRecord");
            w.pair(2, "*ACTIVE");
            w.pair(70, 0);
            w.point(10, Point::new(0.0, 0.0));
            w.point(11, Point::new(1.0, 1.0));
            w.real(40, 1.0);
            w.real(41, 1.0);
        });
        self.table("LTYPE", tables.line_types.len() + 2, |w, owner| {
            for name in ["ByBlock", "ByLayer"] {
                w.record("LTYPE", owner, "AcDbLinetypeTableRecord");
                w.pair(2, name);
                w.pair(70, 0);
                w.pair(3, "");
                w.pair(72, 65);
                w.pair(73, 0);
                w.real(40, 0.0);
            }
            for lt in &tables.line_types {
                w.record("LTYPE", owner, "AcDbLinetypeTableRecord");
                w.line_type_body(*lt);
            }
        });
        self.table("LAYER", tables.layers.len(), |w, owner| {
            for layer in &tables.layers {
                w.record("LAYER", owner, "AcDbLayerTableRecord");
                w.layer_body(layer);
            }
        });
        self.table("STYLE", 1, |w, owner| {
            w.record("STYLE", owner, "AcDbTextStyleTableRecord");
            w.style_body();
        });
        self.table("VIEW", 0, |_, _| {});
        self.table("UCS", 0, |_, _| {});
        self.table("APPID", 1, |w, owner| {
            w.record("APPID", owner, "AcDbRegAppTableRecord");
            w.pair(2, "ACAD");
            w.pair(70, 0);
        });
        self.table("DIMSTYLE", 1, |w, owner| {
            w.pair(0, "DIMSTYLE");
            let h = w.handle();
            w.pair(105, h);
            w.pair(330, owner);
            w.pair(100, "AcDbSymbolTableRecord");
            w.pair(100, "AcDbDimStyleTableRecord");
            w.pair(2, "Standard");
            w.pair(70, 0);
        });
        let mut spaces = [NO_OWNER; 2];
        self.table("BLOCK_RECORD", 2, |w, owner| {
            for (slot, name) in spaces.iter_mut().zip(["*Model_Space", "*Paper_Space"]) {
                *slot = w.record("BLOCK_RECORD", owner, "AcDbBlockTableRecord");
                w.pair(2, name);
            }
        });
        self.end_section();
        let [model_space, paper_space] = spaces;

        self.begin_section("BLOCKS");
        self.block("*Model_Space", model_space, false);
        self.block("*Paper_Space", paper_space, true);
        self.end_section();

        self.begin_section("ENTITIES");
        for entity in document.entities() {
            let layer = &document.layers()[entity.layer].name;
            self.lwpolyline(entity, layer, model_space);
        }
        for label in document.labels() {
            let layer = &document.layers()[label.layer].name;
            self.pair(0, "TEXT");
            let handle = self.handle();
            self.pair(5, handle);
            self.pair(330, model_space);
            self.pair(100, "AcDbEntity");
            self.text(8, layer);
            self.pair(100, "AcDbText");
            self.text_body(label);
            self.pair(100, "AcDbText");
        }
        self.end_section();

        self.objects();
    }

    /// Write a symbol table; `body` receives the table's handle as owner.
    fn table(&mut self, name: &str, count: usize, body: impl FnOnce(&mut Self, Handle)) {
        self.pair(0, "TABLE");
        self.pair(2, name);
        let handle = self.handle();
        self.pair(5, handle);
        self.pair(330, NO_OWNER);
        self.pair(100, "AcDbSymbolTable");
        self.pair(70, count);
        if name == "DIMSTYLE" {
            self.pair(100, "AcDbDimStyleTable");
        }
        body(self, handle);
        self.pair(0, "ENDTAB");
    }

    /// Common prefix of a table record; returns its handle.
    fn record(&mut self, kind: &str, owner: Handle, subclass: &str) -> Handle {
        self.pair(0, kind);
        let handle = self.handle();
        self.pair(5, handle);
        self.pair(330, owner);
        self.pair(100, "AcDbSymbolTableRecord");
        self.pair(100, subclass);
        handle
    }

    fn line_type_body(&mut self, lt: LineType) {
        let pattern = lt.pattern();
        self.pair(2, lt.as_str());
        self.pair(70, 0);
        self.pair(3, lt.description());
        self.pair(72, 65);
        self.pair(73, pattern.len());
        self.real(40, pattern.iter().map(|d| d.abs()).sum());
        for dash in pattern {
            self.real(49, *dash);
            if self.version.has_handles() {
                self.pair(74, 0);
            }
        }
    }

    fn style_body(&mut self) {
        self.pair(2, if self.version.has_handles() { "Standard" } else { "STANDARD" });
        self.pair(70, 0);
        self.real(40, 0.0);
        self.real(41, 1.0);
        self.real(50, 0.0);
        self.pair(71, 0);
        self.real(42, DEFAULT_TEXT_HEIGHT);
        self.pair(3, "txt");
        self.pair(4, "");
    }

    /// Insertion point, height and value of a `TEXT` entity.
    fn text_body(&mut self, label: &Label) {
        self.point3(10, label.position);
        self.real(40, label.height);
        self.text(1, &label.text);
    }

    fn layer_body(&mut self, layer: &Layer) {
        self.text(2, &layer.name);
        self.pair(70, 0);
        self.pair(62, layer.color);
        self.pair(6, layer.line_type.as_str());
    }

    fn block(&mut self, name: &str, record: Handle, paper: bool) {
        self.pair(0, "BLOCK");
        let begin = self.handle();
        self.pair(5, begin);
        self.pair(330, record);
        self.pair(100, "AcDbEntity");
        if paper {
            self.pair(67, 1);
        }
        self.pair(8, LAYER_ZERO);
        self.pair(100, "AcDbBlockBegin");
        self.pair(2, name);
        self.pair(70, 0);
        self.point3(10, Point::new(0.0, 0.0));
        self.pair(3, name);
        self.pair(1, "");

        self.pair(0, "ENDBLK");
        let end = self.handle();
        self.pair(5, end);
        self.pair(330, record);
        self.pair(100, "AcDbEntity");
        if paper {
            self.pair(67, 1);
        }
        self.pair(8, LAYER_ZERO);
        self.pair(100, "AcDbBlockEnd");
    }

    fn lwpolyline(&mut self, entity: &Polyline, layer: &str, owner: Handle) {
        self.pair(0, "LWPOLYLINE");
        let handle = self.handle();
        self.pair(5, handle);
        self.pair(330, owner);
        self.pair(100, "AcDbEntity");
        self.text(8, layer);
        self.pair(100, "AcDbPolyline");
        self.pair(90, entity.points.len());
        self.pair(70, 1);
        self.real(43, 0.0);
        for p in &entity.points {
            self.point(10, *p);
        }
    }

    fn objects(&mut self) {
        let root = self.handle();
        let groups = self.handle();

        self.begin_section("OBJECTS");
        self.pair(0, "DICTIONARY");
        self.pair(5, root);
        self.pair(330, NO_OWNER);
        self.pair(100, "AcDbDictionary");
        self.pair(281, 1);
        self.pair(3, "ACAD_GROUP");
        self.pair(350, groups);

        self.pair(0, "DICTIONARY");
        self.pair(5, groups);
        self.pair(330, root);
        self.pair(100, "AcDbDictionary");
        self.pair(281, 1);
        self.end_section();
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use maskcad_pipeline::{
        ClassifiedRegion, CoordinateSpace, LayerAssignment, Region, RegionAttributes, Ring,
    };

    use super::*;
    use crate::document::{Metadata, Units};

    fn region(layer: &str, line_type: LineType) -> ClassifiedRegion {
        let outer = Ring::new(vec![
            Point::new(10.0, 90.0),
            Point::new(50.0, 90.0),
            Point::new(50.0, 50.0),
            Point::new(10.0, 50.0),
        ])
        .unwrap();
        let region = Region::new(outer, vec![], CoordinateSpace::Cad).unwrap();
        ClassifiedRegion {
            attributes: RegionAttributes::measure(&region, 1.0, None),
            region,
            layer: LayerAssignment {
                name: layer.into(),
                color: 3,
                line_type,
            },
        }
    }

    fn document(version: DxfVersion, regions: &[ClassifiedRegion]) -> Document {
        let mut doc = Document::new(version, Units::Millimeters);
        for r in regions {
            doc.append(r);
        }
        doc
    }

    /// Group code / value pairs, trimmed.
    fn pairs(dxf: &str) -> Vec<(u16, &str)> {
        let lines: Vec<&str> = dxf.lines().collect();
        lines
            .chunks(2)
            .map(|c| (c[0].trim().parse().unwrap(), c[1]))
            .collect()
    }

    #[test]
    fn real_always_has_a_decimal_point() {
        assert_eq!(real(10.0), "10.0");
        assert_eq!(real(-0.0), "0.0");
        assert_eq!(real(0.25), "0.25");
        assert_eq!(real(-3.5), "-3.5");
    }

    #[test]
    fn group_codes_are_right_aligned() {
        let dxf = to_dxf(&document(DxfVersion::R12, &[]));
        assert!(dxf.starts_with("  0\nSECTION\n  2\nHEADER\n"));
        assert!(dxf.lines().count() % 2 == 0);
    }

    #[test]
    fn escape_before_r2007_only() {
        assert_eq!(escape_text("벽", DxfVersion::R2000), "\\U+BCBD");
        assert_eq!(escape_text("WALL", DxfVersion::R12), "WALL");
        assert_eq!(escape_text("벽", DxfVersion::R2018), "벽");
    }

    #[test]
    fn r12_uses_polyline_vertex_seqend() {
        let dxf = to_dxf(&document(DxfVersion::R12, &[region("WALL", LineType::Continuous)]));
        let p = pairs(&dxf);
        assert_eq!(p.iter().filter(|(c, v)| *c == 0 && *v == "POLYLINE").count(), 1);
        assert_eq!(p.iter().filter(|(c, v)| *c == 0 && *v == "VERTEX").count(), 4);
        assert_eq!(p.iter().filter(|(c, v)| *c == 0 && *v == "SEQEND").count(), 1);
        assert!(!dxf.contains("LWPOLYLINE"));
        assert!(!dxf.contains("$HANDSEED"));
        assert!(!dxf.contains("$INSUNITS"));
        assert!(!p.iter().any(|(c, _)| *c == 5));
    }

    #[test]
    fn modern_versions_use_lwpolyline_and_units() {
        for version in [DxfVersion::R2000, DxfVersion::R2010, DxfVersion::R2018] {
            let dxf = to_dxf(&document(version, &[region("WALL", LineType::Continuous)]));
            assert!(dxf.contains(version.acadver()));
            assert!(dxf.contains("LWPOLYLINE"));
            assert!(dxf.contains("$HANDSEED"));
            assert!(dxf.contains("  9\n$INSUNITS\n 70\n4\n"));
            assert!(dxf.contains("  9\n$MEASUREMENT\n 70\n1\n"));
            for section in ["CLASSES", "TABLES", "BLOCKS", "ENTITIES", "OBJECTS"] {
                assert!(dxf.contains(&format!("  2\n{section}\n")), "{section}");
            }
            assert!(dxf.contains(" 90\n4\n 70\n1\n"));
        }
    }

    #[test]
    fn handles_are_unique_and_below_seed() {
        let dxf = to_dxf(&document(
            DxfVersion::R2018,
            &[region("A", LineType::Dashed), region("B", LineType::Continuous)],
        ));
        let p = pairs(&dxf);
        let seed_at = p.iter().position(|(_, v)| *v == "$HANDSEED").unwrap();
        let seed = u32::from_str_radix(p[seed_at + 1].1, 16).unwrap();
        let mut handles: Vec<u32> = p
            .iter()
            .filter(|(c, _)| *c == 5 || *c == 105)
            .skip(1) // the $HANDSEED value itself
            .map(|(_, v)| u32::from_str_radix(v, 16).unwrap())
            .collect();
        let n = handles.len();
        handles.sort_unstable();
        handles.dedup();
        assert_eq!(handles.len(), n);
        assert!(handles.iter().all(|h| *h > 0 && *h < seed));
    }

    #[test]
    fn layer_zero_always_present() {
        let dxf = to_dxf(&document(DxfVersion::R2018, &[]));
        assert!(dxf.contains("  0\nLAYER\n"));
        assert!(dxf.contains("AcDbLayerTableRecord\n  2\n0\n"));
    }

    #[test]
    fn used_line_types_are_declared() {
        let dxf = to_dxf(&document(DxfVersion::R12, &[region("A", LineType::Hidden)]));
        assert!(dxf.contains("  2\nHIDDEN\n"));
        assert!(dxf.contains("  2\nCONTINUOUS\n"));
        assert!(!dxf.contains("  2\nDASHED\n"));
        assert!(dxf.contains("  6\nHIDDEN\n"));
    }

    #[test]
    fn metadata_becomes_header_variables() {
        let doc = document(DxfVersion::R2000, &[]).with_metadata(Metadata {
            title: Some("floor plan".into()),
            author: Some("maskcad".into()),
            subject: Some("scale=1\nunits=mm".into()),
        });
        let dxf = to_dxf(&doc);
        assert!(dxf.starts_with("  0\nSECTION\n"));
        assert!(!dxf.contains("999\n"));
        let header_end = dxf.find("ENDSEC").unwrap();
        let header = &dxf[..header_end];
        assert!(header.contains("  9\n$DWGTITLE\n  1\nfloor plan\n"));
        assert!(header.contains("  9\n$DWGAUTHOR\n  1\nmaskcad\n"));
        assert!(header.contains("  9\n$DWGSUBJECT\n  1\nscale=1 units=mm\n"));
    }

    #[test]
    fn absent_metadata_writes_no_header_variables() {
        let dxf = to_dxf(&document(DxfVersion::R12, &[]));
        assert!(!dxf.contains("$DWG"));
    }

    #[test]
    fn labels_become_text_entities() {
        let mut labelled = region("WALL", LineType::Continuous);
        labelled.attributes.label = Some("벽".into());
        for version in DxfVersion::ALL {
            let mut doc = document(version, &[labelled.clone()]);
            assert!(doc.annotate(&labelled, 2.5));
            let dxf = to_dxf(&doc);
            let p = pairs(&dxf);
            let at = p.iter().position(|(c, v)| *c == 0 && *v == "TEXT").unwrap();
            let polyline = if version == DxfVersion::R12 { "POLYLINE" } else { "LWPOLYLINE" };
            assert!(p.iter().position(|(_, v)| *v == polyline).unwrap() < at);

            let entity: Vec<(u16, &str)> = p[at + 1..]
                .iter()
                .take_while(|(c, _)| *c != 0)
                .copied()
                .collect();
            assert!(entity.contains(&(8, crate::document::TEXT_LAYER)));
            assert!(entity.contains(&(10, "30.0")));
            assert!(entity.contains(&(20, "70.0")));
            assert!(entity.contains(&(40, "2.5")));
            let text = if version.escapes_unicode() { "\\U+BCBD" } else { "벽" };
            assert!(entity.contains(&(1, text)), "{version}: {entity:?}");
            assert_eq!(entity.iter().any(|(c, _)| *c == 5), version.has_handles());
            assert!(dxf.contains("  2\nMASKCAD_TEXT\n 70\n0\n 62\n7\n"));
        }
    }

    #[test]
    fn non_ascii_layer_names_are_escaped_for_r2000() {
        let dxf = to_dxf(&document(DxfVersion::R2000, &[region("벽", LineType::Continuous)]));
        assert!(dxf.contains("\\U+BCBD"));
        assert!(dxf.is_ascii());
    }

    #[test]
    fn identical_documents_serialize_identically() {
        let regions = [region("A", LineType::Center), region("B", LineType::Dot)];
        let a = to_dxf(&document(DxfVersion::R2018, &regions));
        let b = to_dxf(&document(DxfVersion::R2018, &regions));
        assert_eq!(a, b);
    }

    #[test]
    fn vertices_are_written_in_order() {
        let dxf = to_dxf(&document(DxfVersion::R2018, &[region("A", LineType::Continuous)]));
        let p = pairs(&dxf);
        let start = p.iter().position(|(_, v)| *v == "LWPOLYLINE").unwrap();
        let xs: Vec<&str> = p[start..]
            .iter()
            .filter(|(c, _)| *c == 10)
            .map(|(_, v)| *v)
            .collect();
        assert_eq!(xs, ["10.0", "50.0", "50.0", "10.0"]);
    }
}
