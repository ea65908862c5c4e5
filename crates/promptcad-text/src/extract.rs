//! Dimension extraction.
//!
//! Two grammars read numbers out of prompt text:
//!
//! * **keyword**: a field name followed by its value (`radius: 5mm`,
//!   `height of 2 in`) or a value followed by an adjective (`10mm long`).
//!   Clause order does not matter.
//! * **positional**: every number in reading order, assigned to the shape's
//!   fields in declaration order (box: length, width, height). Wording is
//!   ignored, so `"10 by 5, 15 tall"` and `"15 tall, 10 by 5"` differ.
//!
//! Untagged numbers take the unit of the first number that carries one, or
//! millimeters when none does.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use promptcad_core::{CompositeBody, Field, ShapeParameters, ShapeTag, Unit, to_millimeters};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::scan::{Quantity, Scanner, Token, UnsupportedSuffix};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Grammar {
    /// Keyword grammar when it finds every field, positional otherwise.
    #[default]
    Auto,
    Keyword,
    Positional,
}

impl fmt::Display for Grammar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Grammar::Auto => "auto",
            Grammar::Keyword => "keyword",
            Grammar::Positional => "positional",
        })
    }
}

impl FromStr for Grammar {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "auto" => Ok(Grammar::Auto),
            "keyword" | "keywords" => Ok(Grammar::Keyword),
            "positional" | "generic" => Ok(Grammar::Positional),
            other => Err(format!(
                "unknown grammar '{other}' (expected auto, keyword or positional)"
            )),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ExtractOptions {
    pub grammar: Grammar,
    /// Unit for numbers written without one. Numbers with their own unit
    /// keep it.
    pub unit_override: Option<Unit>,
}

/// A value filled in without the prompt asking for it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AppliedDefault {
    pub name: String,
    pub value: f64,
}

/// Fallback dimensions (mm) used by [`PartialParameters::with_defaults`].
#[derive(Debug, Clone, PartialEq)]
pub struct ShapeDefaults {
    pub values: BTreeMap<Field, f64>,
}

impl Default for ShapeDefaults {
    fn default() -> Self {
        let values = [
            (Field::Length, 20.0),
            (Field::Width, 20.0),
            (Field::Height, 20.0),
            (Field::Radius, 10.0),
            (Field::Base, 20.0),
            (Field::OuterRadius, 15.0),
            (Field::TubeRadius, 4.0),
            (Field::WheelRadius, 5.0),
            (Field::WheelHeight, 3.0),
        ];
        Self {
            values: values.into_iter().collect(),
        }
    }
}

/// Dimensions found so far for one shape, in millimeters.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PartialParameters {
    pub shape: ShapeTag,
    pub values: BTreeMap<Field, f64>,
    pub wheel_count: Option<u32>,
    /// Unit applied to numbers written without one.
    pub unit: Unit,
    pub grammar: Grammar,
    pub defaults_applied: Vec<AppliedDefault>,
}

impl PartialParameters {
    pub fn new(shape: ShapeTag, unit: Unit, grammar: Grammar) -> Self {
        Self {
            shape,
            values: BTreeMap::new(),
            wheel_count: None,
            unit,
            grammar,
            defaults_applied: Vec::new(),
        }
    }

    /// Declared fields that are absent or zero.
    pub fn missing(&self) -> Vec<Field> {
        self.shape
            .fields()
            .iter()
            .copied()
            .filter(|field| self.values.get(field).is_none_or(|value| *value == 0.0))
            .collect()
    }

    pub fn is_complete(&self) -> bool {
        self.missing().is_empty()
    }

    /// Number of declared fields with a usable value.
    pub fn found(&self) -> usize {
        self.shape.fields().len() - self.missing().len()
    }

    /// Sets a field explicitly, replacing anything extracted or defaulted.
    pub fn set(&mut self, field: Field, millimeters: f64) -> Result<&mut Self, ExtractError> {
        if !self.shape.fields().contains(&field) {
            return Err(ExtractError::FieldNotApplicable {
                field,
                shape: self.shape,
            });
        }
        self.values.insert(field, millimeters);
        self.defaults_applied.retain(|applied| applied.name != field.name());
        Ok(self)
    }

    /// Fills every missing field from `defaults`, recording each one.
    pub fn with_defaults(mut self, defaults: &ShapeDefaults) -> Self {
        for field in self.missing() {
            if let Some(&value) = defaults.values.get(&field) {
                self.values.insert(field, value);
                self.defaults_applied.push(AppliedDefault {
                    name: field.name().to_string(),
                    value,
                });
            }
        }
        self
    }

    /// Builds the typed parameters, or hands `self` back inside
    /// [`ExtractError::Incomplete`] when a field is still missing.
    pub fn complete(mut self) -> Result<Extraction, ExtractError> {
        if !self.is_complete() {
            return Err(ExtractError::Incomplete(Box::new(self)));
        }

        let wheel_count = match (self.shape, self.wheel_count) {
            (_, Some(count)) => count,
            (ShapeTag::Composite, None) => {
                let count = CompositeBody::DEFAULT_WHEEL_COUNT;
                self.defaults_applied.push(AppliedDefault {
                    name: "wheel_count".to_string(),
                    value: f64::from(count),
                });
                count
            }
            (_, None) => 0,
        };

        let values = &self.values;
        let parameters =
            ShapeParameters::from_fields(self.shape, wheel_count, |field| values.get(&field).copied())
                .ok_or_else(|| ExtractError::Incomplete(Box::new(self.clone())))?;

        Ok(Extraction {
            shape: self.shape,
            parameters,
            grammar: self.grammar,
            unit: self.unit,
            defaults_applied: self.defaults_applied,
        })
    }
}

/// Complete parameters for one shape, all lengths in millimeters.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Extraction {
    pub shape: ShapeTag,
    pub parameters: ShapeParameters,
    /// Grammar that produced the values; never [`Grammar::Auto`].
    pub grammar: Grammar,
    pub unit: Unit,
    pub defaults_applied: Vec<AppliedDefault>,
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ExtractError {
    #[error("not enough dimensions for {}: missing {}", .0.shape, field_list(&.0.missing()))]
    Incomplete(Box<PartialParameters>),
    #[error("unsupported unit '{token}' (expected mm, cm, m, in, ft or yd)")]
    UnsupportedUnit { token: String },
    #[error("{field} is not a dimension of a {shape}")]
    FieldNotApplicable { field: Field, shape: ShapeTag },
}

impl ExtractError {
    pub fn partial(&self) -> Option<&PartialParameters> {
        match self {
            ExtractError::Incomplete(partial) => Some(partial),
            _ => None,
        }
    }
}

fn field_list(fields: &[Field]) -> String {
    fields
        .iter()
        .map(|field| field.name())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Extracts complete parameters for `shape` from `text`.
pub fn extract(
    text: &str,
    shape: ShapeTag,
    options: &ExtractOptions,
) -> Result<Extraction, ExtractError> {
    extract_partial(text, shape, options)?.complete()
}

/// Runs the selected grammar and returns whatever it found, complete or not.
pub fn extract_partial(
    text: &str,
    shape: ShapeTag,
    options: &ExtractOptions,
) -> Result<PartialParameters, ExtractError> {
    let tokens = Scanner::new(text)
        .tokenize()
        .map_err(|UnsupportedSuffix(token)| ExtractError::UnsupportedUnit { token })?;
    let (tokens, wheel_count) = take_wheel_count(tokens);

    let shared = tokens
        .iter()
        .find_map(|token| match token {
            Token::Number(Quantity { unit: Some(unit), .. }) => Some(*unit),
            _ => None,
        })
        .unwrap_or_default();
    let unit = options.unit_override.unwrap_or(shared);

    let mut partial = match options.grammar {
        Grammar::Keyword => keyword_grammar(&tokens, shape, unit),
        Grammar::Positional => positional_grammar(&tokens, shape, unit),
        Grammar::Auto => {
            let keyword = keyword_grammar(&tokens, shape, unit);
            if keyword.is_complete() {
                keyword
            } else {
                let positional = positional_grammar(&tokens, shape, unit);
                if positional.is_complete() || positional.found() > keyword.found() {
                    positional
                } else {
                    keyword
                }
            }
        }
    };
    partial.wheel_count = wheel_count;

    debug!(
        shape = %shape,
        grammar = %partial.grammar,
        unit = %unit,
        found = ?partial.values,
        missing = ?partial.missing(),
        "extracted dimensions"
    );
    Ok(partial)
}

/// Removes `<n> wheels` counts from the token stream; `no wheels` and
/// `without wheels` count as zero. A counted `wheels` ends the clause, so
/// `4 wheels length 60` still describes the body.
fn take_wheel_count(tokens: Vec<Token>) -> (Vec<Token>, Option<u32>) {
    let mut count = None;
    let mut kept = Vec::with_capacity(tokens.len());
    let mut iter = tokens.into_iter().peekable();

    while let Some(token) = iter.next() {
        let before_wheels = iter.peek().is_some_and(|next| next.is_word("wheels"));
        match &token {
            Token::Number(Quantity { value, unit: None })
                if before_wheels && value.fract() == 0.0 && *value >= 0.0 =>
            {
                count.get_or_insert(*value as u32);
                iter.next();
                kept.push(Token::Break);
                continue;
            }
            Token::Word(word) if before_wheels && (word == "no" || word == "without") => {
                count.get_or_insert(0);
                iter.next();
                kept.push(token);
                kept.push(Token::Break);
                continue;
            }
            _ => {}
        }
        kept.push(token);
    }

    (kept, count)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Placement {
    /// `radius 5`
    Before,
    /// `5 long`
    After,
}

struct Keyword {
    words: &'static [&'static str],
    field: Field,
    scale: f64,
    placement: Placement,
}

const fn before(words: &'static [&'static str], field: Field) -> Keyword {
    Keyword {
        words,
        field,
        scale: 1.0,
        placement: Placement::Before,
    }
}

const fn diameter(words: &'static [&'static str], field: Field) -> Keyword {
    Keyword {
        words,
        field,
        scale: 0.5,
        placement: Placement::Before,
    }
}

const fn after(word: &'static [&'static str], field: Field) -> Keyword {
    Keyword {
        words: word,
        field,
        scale: 1.0,
        placement: Placement::After,
    }
}

// Longer phrases first so `wheel radius` is never read as `radius`.
// `wheel` also matches `wheels`.
const KEYWORDS: &[Keyword] = &[
    before(&["wheel", "radius"], Field::WheelRadius),
    diameter(&["wheel", "diameter"], Field::WheelRadius),
    before(&["wheel", "width"], Field::WheelHeight),
    before(&["wheel", "height"], Field::WheelHeight),
    before(&["wheel", "thickness"], Field::WheelHeight),
    before(&["outer", "radius"], Field::OuterRadius),
    before(&["major", "radius"], Field::OuterRadius),
    before(&["tube", "radius"], Field::TubeRadius),
    before(&["minor", "radius"], Field::TubeRadius),
    before(&["inner", "radius"], Field::TubeRadius),
    before(&["length"], Field::Length),
    before(&["width"], Field::Width),
    before(&["height"], Field::Height),
    before(&["radius"], Field::Radius),
    diameter(&["diameter"], Field::Radius),
    before(&["base"], Field::Base),
    before(&["side"], Field::Base),
    after(&["long"], Field::Length),
    after(&["wide"], Field::Width),
    after(&["tall"], Field::Height),
    after(&["high"], Field::Height),
];

/// Words allowed between a keyword and its value (`length of 10`).
const LINKING_WORDS: [&str; 3] = ["of", "is", "at"];

fn keyword_grammar(tokens: &[Token], shape: ShapeTag, unit: Unit) -> PartialParameters {
    let mut found: BTreeMap<Field, f64> = BTreeMap::new();
    let mut record = |field: Field, quantity: &Quantity, scale: f64| {
        found
            .entry(field)
            .or_insert_with(|| to_millimeters(quantity.value, quantity.unit.unwrap_or(unit)) * scale);
    };

    let mut i = 0;
    while i < tokens.len() {
        if let Some(keyword) = leading_keyword(tokens, i, Placement::Before) {
            // `wheel length 9` describes the wheels, never the body.
            if !keyword.field.is_wheel_field() && i > 0 && is_wheel_word(&tokens[i - 1]) {
                i += keyword.words.len();
                continue;
            }
            let mut j = i + keyword.words.len();
            while tokens.get(j).is_some_and(|token| {
                matches!(token, Token::Connector)
                    || LINKING_WORDS.iter().any(|word| token.is_word(word))
            }) {
                j += 1;
            }
            if let Some(Token::Number(quantity)) = tokens.get(j) {
                record(keyword.field, quantity, keyword.scale);
                i = j + 1;
            } else {
                i += keyword.words.len();
            }
            continue;
        }

        if let Token::Number(quantity) = &tokens[i]
            && let Some(keyword) = leading_keyword(tokens, i + 1, Placement::After)
        {
            record(keyword.field, quantity, keyword.scale);
            i += 1 + keyword.words.len();
            continue;
        }

        i += 1;
    }

    // A torus described by plain `radius` means the major radius.
    if shape == ShapeTag::Torus
        && !found.contains_key(&Field::OuterRadius)
        && let Some(radius) = found.remove(&Field::Radius)
    {
        found.insert(Field::OuterRadius, radius);
    }

    let mut partial = PartialParameters::new(shape, unit, Grammar::Keyword);
    partial.values = found
        .into_iter()
        .filter(|(field, _)| shape.fields().contains(field))
        .collect();
    partial
}

fn leading_keyword(tokens: &[Token], at: usize, placement: Placement) -> Option<&'static Keyword> {
    KEYWORDS.iter().find(|keyword| {
        keyword.placement == placement
            && keyword
                .words
                .iter()
                .enumerate()
                .all(|(offset, word)| {
                    tokens.get(at + offset).is_some_and(|t| {
                        if *word == "wheel" {
                            is_wheel_word(t)
                        } else {
                            t.is_word(word)
                        }
                    })
                })
    })
}

fn is_wheel_word(token: &Token) -> bool {
    token.is_word("wheel") || token.is_word("wheels")
}

fn positional_grammar(tokens: &[Token], shape: ShapeTag, unit: Unit) -> PartialParameters {
    let numbers = tokens.iter().filter_map(|token| match token {
        Token::Number(quantity) => Some(quantity),
        _ => None,
    });

    let mut partial = PartialParameters::new(shape, unit, Grammar::Positional);
    partial.values = shape
        .fields()
        .iter()
        .copied()
        .zip(numbers)
        .map(|(field, quantity)| {
            (
                field,
                to_millimeters(quantity.value, quantity.unit.unwrap_or(unit)),
            )
        })
        .collect();
    partial
}

#[cfg(test)]
mod tests {
    use promptcad_core::{BoxParams, CompositeBody, Field, ShapeParameters, ShapeTag, Unit};
    use proptest::prelude::*;

    use super::{
        ExtractError, ExtractOptions, Grammar, PartialParameters, ShapeDefaults, extract,
        extract_partial,
    };

    fn assert_approx(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() < 1e-9,
            "expected {expected}, got {actual}"
        );
    }

    fn keyword() -> ExtractOptions {
        ExtractOptions {
            grammar: Grammar::Keyword,
            ..ExtractOptions::default()
        }
    }

    fn positional() -> ExtractOptions {
        ExtractOptions {
            grammar: Grammar::Positional,
            ..ExtractOptions::default()
        }
    }

    fn boxed(length: f64, width: f64, height: f64) -> ShapeParameters {
        ShapeParameters::Box(BoxParams {
            length,
            width,
            height,
        })
    }

    #[test]
    fn keyword_grammar_reads_labelled_box() {
        let extraction = extract(
            "Create a box with length 10mm, width 5mm, and height 15mm.",
            ShapeTag::Box,
            &keyword(),
        )
        .expect("box dimensions should extract");
        assert_eq!(extraction.parameters, boxed(10.0, 5.0, 15.0));
        assert_eq!(extraction.unit, Unit::Mm);
        assert_eq!(extraction.grammar, Grammar::Keyword);
        assert!(extraction.defaults_applied.is_empty());
    }

    #[test]
    fn positional_grammar_assigns_in_declared_order() {
        let extraction =
            extract("10 5 15", ShapeTag::Box, &positional()).expect("numbers should extract");
        assert_eq!(extraction.parameters, boxed(10.0, 5.0, 15.0));

        // Wording is ignored: the first number is always the length.
        let swapped = extract("height 15, length 10, width 5", ShapeTag::Box, &positional())
            .expect("numbers should extract");
        assert_eq!(swapped.parameters, boxed(15.0, 10.0, 5.0));
    }

    #[test]
    fn auto_prefers_keywords_and_falls_back_to_positions() {
        let labelled = extract(
            "height 15, length 10, width 5",
            ShapeTag::Box,
            &ExtractOptions::default(),
        )
        .expect("labelled box should extract");
        assert_eq!(labelled.parameters, boxed(10.0, 5.0, 15.0));
        assert_eq!(labelled.grammar, Grammar::Keyword);

        let bare = extract("a 40 x 20 x 10 box", ShapeTag::Box, &ExtractOptions::default())
            .expect("bare numbers should extract");
        assert_eq!(bare.parameters, boxed(40.0, 20.0, 10.0));
        assert_eq!(bare.grammar, Grammar::Positional);
    }

    #[test]
    fn adjectives_after_values_are_keywords() {
        let extraction = extract(
            "a box 15mm tall, 10mm long and 5mm wide",
            ShapeTag::Box,
            &keyword(),
        )
        .expect("adjective form should extract");
        assert_eq!(extraction.parameters, boxed(10.0, 5.0, 15.0));
    }

    #[test]
    fn connectors_and_linking_words_are_skipped() {
        let extraction = extract(
            "cylinder radius: 2cm, height = 4 cm",
            ShapeTag::Cylinder,
            &keyword(),
        )
        .expect("cylinder should extract");
        assert_eq!(
            extraction.parameters,
            ShapeParameters::Cylinder {
                radius: 20.0,
                height: 40.0
            }
        );

        let cone = extract(
            "a cone with a radius of 3 and a height of 9",
            ShapeTag::Cone,
            &keyword(),
        )
        .expect("cone should extract");
        assert_eq!(
            cone.parameters,
            ShapeParameters::Cone {
                radius: 3.0,
                height: 9.0
            }
        );
    }

    #[test]
    fn shared_unit_comes_from_first_tagged_value() {
        let extraction = extract("a box 2 by 3 by 4 inches", ShapeTag::Box, &positional())
            .expect("box should extract");
        assert_eq!(extraction.unit, Unit::In);
        match extraction.parameters {
            ShapeParameters::Box(b) => {
                assert_approx(b.length, 50.8);
                assert_approx(b.width, 76.2);
                assert_approx(b.height, 101.6);
            }
            other => panic!("expected box, got {other:?}"),
        }
    }

    #[test]
    fn own_unit_beats_shared_unit() {
        let extraction = extract(
            "length 1m width 20cm height 5",
            ShapeTag::Box,
            &keyword(),
        )
        .expect("box should extract");
        // 5 has no unit; the first tagged value is meters.
        assert_eq!(extraction.parameters, boxed(1000.0, 200.0, 5000.0));
    }

    #[test]
    fn unit_override_applies_to_untagged_values_only() {
        let options = ExtractOptions {
            grammar: Grammar::Keyword,
            unit_override: Some(Unit::Cm),
        };
        let extraction = extract("length 10 width 5mm height 2", ShapeTag::Box, &options)
            .expect("box should extract");
        assert_eq!(extraction.parameters, boxed(100.0, 5.0, 20.0));
        assert_eq!(extraction.unit, Unit::Cm);
    }

    #[test]
    fn diameter_is_halved() {
        let extraction = extract("a sphere with diameter 30mm", ShapeTag::Sphere, &keyword())
            .expect("sphere should extract");
        assert_eq!(extraction.parameters, ShapeParameters::Sphere { radius: 15.0 });
    }

    #[test]
    fn torus_radius_means_major_radius() {
        let extraction = extract(
            "a torus with radius 20 and tube radius 5",
            ShapeTag::Torus,
            &keyword(),
        )
        .expect("torus should extract");
        assert_eq!(
            extraction.parameters,
            ShapeParameters::Torus {
                outer_radius: 20.0,
                tube_radius: 5.0
            }
        );
    }

    #[test]
    fn toy_car_reads_body_wheels_and_count() {
        let extraction = extract(
            "toy car with length 60 width 30 height 15, 4 wheels, wheel radius 8 and wheel width 4",
            ShapeTag::Composite,
            &ExtractOptions::default(),
        )
        .expect("car should extract");
        assert_eq!(
            extraction.parameters,
            ShapeParameters::Composite(CompositeBody {
                body: BoxParams {
                    length: 60.0,
                    width: 30.0,
                    height: 15.0
                },
                wheel_radius: 8.0,
                wheel_height: 4.0,
                wheel_count: 4,
            })
        );
        assert!(extraction.defaults_applied.is_empty());
    }

    #[test]
    fn wheel_phrases_never_fill_body_fields() {
        let extraction = extract(
            "toy car, wheels height 4, wheel length 9, length 60 width 30 height 15, wheel radius 8",
            ShapeTag::Composite,
            &keyword(),
        )
        .expect("car should extract");
        assert_eq!(
            extraction.parameters,
            ShapeParameters::Composite(CompositeBody {
                body: BoxParams {
                    length: 60.0,
                    width: 30.0,
                    height: 15.0
                },
                wheel_radius: 8.0,
                wheel_height: 4.0,
                wheel_count: 4,
            })
        );

        let counted = extract(
            "toy car with 4 wheels length 60 width 30 height 15 wheel radius 8 wheel width 4",
            ShapeTag::Composite,
            &keyword(),
        )
        .expect("counted wheels should not hide the body length");
        assert!(extraction.defaults_applied.iter().any(|d| d.name == "wheel_count"));
        assert!(counted.defaults_applied.is_empty());

        let partial = extract_partial(
            "car with wheels diameter 10 and wheels thickness 2",
            ShapeTag::Composite,
            &keyword(),
        )
        .expect("tokens should scan");
        assert_eq!(partial.values.get(&Field::WheelRadius), Some(&5.0));
        assert_eq!(partial.values.get(&Field::WheelHeight), Some(&2.0));
        assert_eq!(
            partial.missing(),
            vec![Field::Length, Field::Width, Field::Height]
        );
    }

    #[test]
    fn missing_wheel_count_defaults_visibly() {
        let extraction = extract(
            "car length 60 width 30 height 15 wheel radius 8 wheel width 4",
            ShapeTag::Composite,
            &keyword(),
        )
        .expect("car should extract");
        assert_eq!(extraction.defaults_applied.len(), 1);
        assert_eq!(extraction.defaults_applied[0].name, "wheel_count");

        let bare = extract_partial(
            "car without wheels, length 60 width 30 height 15",
            ShapeTag::Composite,
            &keyword(),
        )
        .expect("tokens should scan");
        assert_eq!(bare.wheel_count, Some(0));
    }

    #[test]
    fn insufficient_values_report_partial_set() {
        let err = extract("a box that is 10mm long", ShapeTag::Box, &ExtractOptions::default())
            .expect_err("box needs three values");
        let partial = err.partial().expect("incomplete error carries partial set");
        assert_eq!(partial.values.get(&Field::Length), Some(&10.0));
        assert_eq!(partial.missing(), vec![Field::Width, Field::Height]);
        assert!(err.to_string().contains("missing width, height"));
    }

    #[test]
    fn zero_counts_as_missing() {
        let err = extract("length 10 width 0 height 3", ShapeTag::Box, &keyword())
            .expect_err("zero width is not a dimension");
        assert_eq!(
            err.partial().map(PartialParameters::missing),
            Some(vec![Field::Width])
        );
    }

    #[test]
    fn negative_values_pass_through_to_validation() {
        let extraction = extract("sphere radius -4", ShapeTag::Sphere, &keyword())
            .expect("negative radius still extracts");
        assert_eq!(extraction.parameters, ShapeParameters::Sphere { radius: -4.0 });
        assert!(extraction.parameters.validate().is_err());
    }

    #[test]
    fn unsupported_units_are_rejected() {
        assert_eq!(
            extract("a sphere of radius 2km", ShapeTag::Sphere, &ExtractOptions::default()),
            Err(ExtractError::UnsupportedUnit {
                token: "km".to_string()
            })
        );
    }

    #[test]
    fn overrides_and_defaults_complete_a_partial_set() {
        let mut partial = extract_partial("cylinder radius 5", ShapeTag::Cylinder, &keyword())
            .expect("tokens should scan");
        assert_eq!(partial.missing(), vec![Field::Height]);

        assert!(partial.clone().set(Field::Length, 3.0).is_err());
        partial.set(Field::Height, 12.0).expect("height applies to cylinders");
        let explicit = partial.complete().expect("overrides complete the set");
        assert!(explicit.defaults_applied.is_empty());

        let defaulted = extract_partial("cone radius 5", ShapeTag::Cone, &keyword())
            .expect("tokens should scan")
            .with_defaults(&ShapeDefaults::default())
            .complete()
            .expect("defaults complete the set");
        assert_eq!(defaulted.defaults_applied.len(), 1);
        assert_eq!(defaulted.defaults_applied[0].name, "height");
    }

    #[test]
    fn grammar_parses_from_names() {
        assert_eq!("Keyword".parse(), Ok(Grammar::Keyword));
        assert_eq!("generic".parse(), Ok(Grammar::Positional));
        assert!("fuzzy".parse::<Grammar>().is_err());
    }

    #[test]
    fn extraction_serializes_for_boundaries() {
        let extraction = extract("10 5 15", ShapeTag::Box, &positional())
            .expect("numbers should extract");
        let json = serde_json::to_value(&extraction).expect("extraction should serialize");
        assert_eq!(json["shape"], "box");
        assert_eq!(json["grammar"], "positional");
        assert_eq!(json["parameters"]["length"], 10.0);
    }

    proptest! {
        #[test]
        fn keyword_grammar_ignores_clause_order(order in Just(vec![0usize, 1, 2]).prop_shuffle()) {
            let clauses = ["length 10mm", "width 5mm", "height 15mm"];
            let text = order.iter().map(|&i| clauses[i]).collect::<Vec<_>>().join(" ");
            let extraction = extract(&text, ShapeTag::Box, &keyword()).expect("box should extract");
            prop_assert_eq!(extraction.parameters, boxed(10.0, 5.0, 15.0));
            prop_assert_eq!(extraction.unit, Unit::Mm);
        }
    }
}
