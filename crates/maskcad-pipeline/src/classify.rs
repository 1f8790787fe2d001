//! Layer classification: assign each region to a CAD layer by rule.
//!
//! Rules are evaluated in order and the first whose conditions all hold
//! wins. A default rule with no conditions always closes the list, so
//! classification never fails once a [`RuleSet`] has been built.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::LayerRuleError;
use crate::types::Region;

/// Name of the fallback layer.
pub const DEFAULT_LAYER: &str = "DEFAULT";

/// Color index used when a rule does not set one (white/black).
pub const DEFAULT_COLOR: u8 = 7;

/// Longest layer name accepted.
pub const MAX_LAYER_NAME_LEN: usize = 255;

const RESERVED_CHARS: &[char] = &['<', '>', '/', '\\', '"', ':', ';', '?', '*', '|', '=', ',', '`'];

/// Region property a condition tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Attribute {
    /// Outer area minus hole areas, in CAD units squared.
    Area,
    /// Model confidence of the source mask.
    Score,
    /// Bounding-box width in CAD units.
    BboxWidth,
    /// Bounding-box height in CAD units.
    BboxHeight,
    /// Class label of the source mask.
    Label,
}

impl Attribute {
    /// Name as written in configuration.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Area => "area",
            Self::Score => "score",
            Self::BboxWidth => "bbox_width",
            Self::BboxHeight => "bbox_height",
            Self::Label => "label",
        }
    }

    const fn is_numeric(self) -> bool {
        !matches!(self, Self::Label)
    }
}

/// Comparison operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Comparison {
    /// `<`
    #[serde(rename = "<")]
    Less,
    /// `<=`
    #[serde(rename = "<=")]
    LessOrEqual,
    /// `>`
    #[serde(rename = ">")]
    Greater,
    /// `>=`
    #[serde(rename = ">=")]
    GreaterOrEqual,
    /// `==`
    #[serde(rename = "==")]
    Equal,
}

impl Comparison {
    /// Operator symbol.
    #[must_use]
    pub const fn symbol(self) -> &'static str {
        match self {
            Self::Less => "<",
            Self::LessOrEqual => "<=",
            Self::Greater => ">",
            Self::GreaterOrEqual => ">=",
            Self::Equal => "==",
        }
    }

    #[allow(clippy::float_cmp)]
    fn holds(self, lhs: f64, rhs: f64) -> bool {
        match self {
            Self::Less => lhs < rhs,
            Self::LessOrEqual => lhs <= rhs,
            Self::Greater => lhs > rhs,
            Self::GreaterOrEqual => lhs >= rhs,
            Self::Equal => lhs == rhs,
        }
    }
}

/// Right-hand side of a condition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Operand {
    /// Numeric threshold.
    Number(f64),
    /// Label text.
    Text(String),
}

impl Operand {
    const fn kind(&self) -> &'static str {
        match self {
            Self::Number(_) => "a number",
            Self::Text(_) => "text",
        }
    }
}

/// One `attribute op value` test.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Condition {
    /// Property to test.
    pub attribute: Attribute,
    /// Operator.
    pub op: Comparison,
    /// Threshold or label.
    pub value: Operand,
}

impl Condition {
    /// Shorthand constructor for numeric conditions.
    #[must_use]
    pub const fn numeric(attribute: Attribute, op: Comparison, value: f64) -> Self {
        Self {
            attribute,
            op,
            value: Operand::Number(value),
        }
    }

    /// `label == text`.
    #[must_use]
    pub fn label_is(text: impl Into<String>) -> Self {
        Self {
            attribute: Attribute::Label,
            op: Comparison::Equal,
            value: Operand::Text(text.into()),
        }
    }

    fn matches(&self, attrs: &RegionAttributes) -> bool {
        match (&self.value, self.attribute) {
            (Operand::Text(text), Attribute::Label) => attrs.label.as_deref() == Some(text.as_str()),
            (Operand::Number(n), attribute) => attrs
                .numeric(attribute)
                .is_some_and(|v| self.op.holds(v, *n)),
            (Operand::Text(_), _) => false,
        }
    }
}

/// DXF line type names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LineType {
    /// Solid line.
    #[default]
    Continuous,
    /// Dashed line.
    Dashed,
    /// Short dashes.
    Hidden,
    /// Long-short dash.
    Center,
    /// Dotted line.
    Dot,
}

impl LineType {
    /// Table name as written to DXF.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Continuous => "CONTINUOUS",
            Self::Dashed => "DASHED",
            Self::Hidden => "HIDDEN",
            Self::Center => "CENTER",
            Self::Dot => "DOT",
        }
    }

    /// Human-readable description for the LTYPE table.
    #[must_use]
    pub const fn description(self) -> &'static str {
        match self {
            Self::Continuous => "Solid line",
            Self::Dashed => "Dashed __ __ __ __",
            Self::Hidden => "Hidden _ _ _ _ _",
            Self::Center => "Center ____ _ ____ _",
            Self::Dot => "Dot . . . . . .",
        }
    }

    /// Dash pattern: positive = dash, negative = gap, zero = dot.
    #[must_use]
    pub const fn pattern(self) -> &'static [f64] {
        match self {
            Self::Continuous => &[],
            Self::Dashed => &[0.5, -0.25],
            Self::Hidden => &[0.25, -0.125],
            Self::Center => &[1.25, -0.25, 0.25, -0.25],
            Self::Dot => &[0.0, -0.25],
        }
    }

    /// Every supported line type.
    pub const ALL: [Self; 5] = [
        Self::Continuous,
        Self::Dashed,
        Self::Hidden,
        Self::Center,
        Self::Dot,
    ];
}

impl fmt::Display for LineType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Route matching regions to a layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayerRule {
    /// Target layer name.
    pub layer: String,
    /// All must hold; empty always matches.
    #[serde(default)]
    pub when: Vec<Condition>,
    /// ACI color, 1..=255.
    #[serde(default)]
    pub color: Option<u16>,
    /// Line type for the layer.
    #[serde(default)]
    pub line_type: Option<LineType>,
}

impl LayerRule {
    /// Unconditional rule.
    #[must_use]
    pub fn always(layer: impl Into<String>) -> Self {
        Self {
            layer: layer.into(),
            when: Vec::new(),
            color: None,
            line_type: None,
        }
    }

    /// The built-in fallback rule.
    #[must_use]
    pub fn default_rule() -> Self {
        Self {
            color: Some(u16::from(DEFAULT_COLOR)),
            line_type: Some(LineType::Continuous),
            ..Self::always(DEFAULT_LAYER)
        }
    }

    fn matches(&self, attrs: &RegionAttributes) -> bool {
        self.when.iter().all(|c| c.matches(attrs))
    }

    fn validate(&self, rule: usize) -> Result<(), LayerRuleError> {
        if !is_valid_layer_name(&self.layer) {
            return Err(LayerRuleError::InvalidLayerName {
                rule,
                name: self.layer.clone(),
            });
        }
        if let Some(color) = self.color
            && !(1..=255).contains(&color)
        {
            return Err(LayerRuleError::InvalidColor {
                rule,
                layer: self.layer.clone(),
                color,
            });
        }
        for condition in &self.when {
            let type_ok = match &condition.value {
                Operand::Number(_) => condition.attribute.is_numeric(),
                Operand::Text(_) => {
                    condition.attribute == Attribute::Label && condition.op == Comparison::Equal
                }
            };
            if !type_ok {
                return Err(LayerRuleError::TypeMismatch {
                    rule,
                    layer: self.layer.clone(),
                    attribute: condition.attribute.as_str(),
                    op: condition.op.symbol(),
                    operand: condition.value.kind(),
                });
            }
            if let Operand::Number(value) = condition.value
                && !value.is_finite()
            {
                return Err(LayerRuleError::NonFiniteThreshold {
                    rule,
                    layer: self.layer.clone(),
                    value,
                });
            }
        }
        Ok(())
    }
}

fn is_valid_layer_name(name: &str) -> bool {
    !name.is_empty()
        && name.chars().count() <= MAX_LAYER_NAME_LEN
        && !name.chars().any(|c| RESERVED_CHARS.contains(&c) || c.is_control())
}

/// Layer rules and the default rule as they appear in configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayerConfig {
    /// Ordered rules.
    pub rules: Vec<LayerRule>,
    /// Fallback for regions no rule matches. Must have no conditions.
    pub default_layer: LayerRule,
}

impl Default for LayerConfig {
    fn default() -> Self {
        Self {
            rules: Vec::new(),
            default_layer: LayerRule::default_rule(),
        }
    }
}

/// The resolved layer for one region.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct LayerAssignment {
    /// Layer name.
    pub name: String,
    /// ACI color.
    pub color: u8,
    /// Line type.
    pub line_type: LineType,
}

/// Validated, ordered rules ending in an unconditional default.
#[derive(Debug, Clone, PartialEq)]
pub struct RuleSet {
    rules: Vec<LayerRule>,
    default: LayerRule,
}

impl RuleSet {
    /// Validate rules and the default.
    ///
    /// # Errors
    ///
    /// Returns a [`LayerRuleError`] for the first malformed rule,
    /// [`LayerRuleError::ConditionalDefault`] if the default rule has
    /// conditions, or [`LayerRuleError::CaseConflict`] if two layer names
    /// differ only in ASCII case (CAD layer names are case-insensitive).
    pub fn new(config: &LayerConfig) -> Result<Self, LayerRuleError> {
        if !config.default_layer.when.is_empty() {
            return Err(LayerRuleError::ConditionalDefault {
                layer: config.default_layer.layer.clone(),
            });
        }
        for (i, rule) in config.rules.iter().enumerate() {
            rule.validate(i)?;
        }
        config.default_layer.validate(config.rules.len())?;

        let layers: Vec<&str> = config
            .rules
            .iter()
            .chain(std::iter::once(&config.default_layer))
            .map(|rule| rule.layer.as_str())
            .collect();
        for (rule, layer) in layers.iter().enumerate() {
            if let Some(existing) = layers[..rule]
                .iter()
                .find(|other| *other != layer && other.eq_ignore_ascii_case(layer))
            {
                return Err(LayerRuleError::CaseConflict {
                    rule,
                    layer: (*layer).to_owned(),
                    existing: (*existing).to_owned(),
                });
            }
        }
        Ok(Self {
            rules: config.rules.clone(),
            default: config.default_layer.clone(),
        })
    }

    /// Conditional rules in evaluation order.
    #[must_use]
    pub fn rules(&self) -> &[LayerRule] {
        &self.rules
    }

    /// The rule that catches everything else.
    #[must_use]
    pub const fn default_rule(&self) -> &LayerRule {
        &self.default
    }

    /// First rule whose conditions all hold, else the default.
    #[must_use]
    pub fn matching(&self, attrs: &RegionAttributes) -> &LayerRule {
        self.rules
            .iter()
            .find(|rule| rule.matches(attrs))
            .unwrap_or(&self.default)
    }

    /// Resolve the layer for a region.
    #[must_use]
    pub fn assign(&self, attrs: &RegionAttributes) -> LayerAssignment {
        let rule = self.matching(attrs);
        LayerAssignment {
            name: rule.layer.clone(),
            color: rule
                .color
                .and_then(|c| u8::try_from(c).ok())
                .unwrap_or(DEFAULT_COLOR),
            line_type: rule.line_type.unwrap_or_default(),
        }
    }
}

/// Properties a rule can test, measured on a CAD-space region.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RegionAttributes {
    /// Outer area minus holes.
    pub area: f64,
    /// Source mask confidence.
    pub score: f64,
    /// Bounding-box width.
    pub bbox_width: f64,
    /// Bounding-box height.
    pub bbox_height: f64,
    /// Source mask label.
    pub label: Option<String>,
}

impl RegionAttributes {
    /// Measure a region.
    #[must_use]
    pub fn measure(region: &Region, score: f64, label: Option<&str>) -> Self {
        let bounds = region.bounds();
        Self {
            area: region.area(),
            score,
            bbox_width: bounds.width(),
            bbox_height: bounds.height(),
            label: label.map(str::to_owned),
        }
    }

    const fn numeric(&self, attribute: Attribute) -> Option<f64> {
        match attribute {
            Attribute::Area => Some(self.area),
            Attribute::Score => Some(self.score),
            Attribute::BboxWidth => Some(self.bbox_width),
            Attribute::BboxHeight => Some(self.bbox_height),
            Attribute::Label => None,
        }
    }
}

/// A CAD-space region with its layer.
#[derive(Debug, Clone, PartialEq)]
pub struct ClassifiedRegion {
    /// Geometry in CAD space.
    pub region: Region,
    /// Measured attributes.
    pub attributes: RegionAttributes,
    /// Resolved layer.
    pub layer: LayerAssignment,
}

/// Name the layer a region belongs on.
#[must_use]
pub fn classify<'r>(
    region: &Region,
    score: f64,
    label: Option<&str>,
    rules: &'r RuleSet,
) -> &'r str {
    let attrs = RegionAttributes::measure(region, score, label);
    &rules.matching(&attrs).layer
}

/// Measure and classify a region in one step.
#[must_use]
pub fn classify_region(
    region: Region,
    score: f64,
    label: Option<&str>,
    rules: &RuleSet,
) -> ClassifiedRegion {
    let attributes = RegionAttributes::measure(&region, score, label);
    let layer = rules.assign(&attributes);
    ClassifiedRegion {
        region,
        attributes,
        layer,
    }
}

/// Area bands in CAD units squared: `_SMALL` (< 1000, blue),
/// `_MEDIUM` (< 10 000, green), `_LARGE` (< 100 000, yellow) and
/// `_XLARGE` (red).
#[must_use]
pub fn area_bands(prefix: &str) -> Vec<LayerRule> {
    let band = |suffix: &str, below: Option<f64>, color: u16| LayerRule {
        layer: format!("{prefix}_{suffix}"),
        when: below
            .map(|limit| vec![Condition::numeric(Attribute::Area, Comparison::Less, limit)])
            .unwrap_or_default(),
        color: Some(color),
        line_type: Some(LineType::Continuous),
    };
    vec![
        band("SMALL", Some(1_000.0), 5),
        band("MEDIUM", Some(10_000.0), 3),
        band("LARGE", Some(100_000.0), 2),
        band("XLARGE", None, 1),
    ]
}

/// Confidence bands: `_HIGH` (> 0.9), `_MED` (> 0.7) and `_LOW`.
#[must_use]
pub fn score_bands(prefix: &str) -> Vec<LayerRule> {
    let band = |suffix: &str, above: Option<f64>, color: u16| LayerRule {
        layer: format!("{prefix}_{suffix}"),
        when: above
            .map(|limit| vec![Condition::numeric(Attribute::Score, Comparison::Greater, limit)])
            .unwrap_or_default(),
        color: Some(color),
        line_type: Some(LineType::Continuous),
    };
    vec![
        band("HIGH", Some(0.9), 3),
        band("MED", Some(0.7), 2),
        band("LOW", None, 1),
    ]
}
