use crate::fluid::FluidExpression;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CssValue {
    Px(f64),
    Vw(f64),
    Fluid(FluidExpression),
    Number(f64),
}

impl CssValue {
    pub fn negated(self) -> Self {
        match self {
            CssValue::Px(value) => CssValue::Px(-value),
            CssValue::Vw(value) => CssValue::Vw(-value),
            CssValue::Fluid(expr) => CssValue::Fluid(expr.negated()),
            CssValue::Number(value) => CssValue::Number(-value),
        }
    }
}

impl fmt::Display for CssValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CssValue::Px(value) => write!(f, "{}px", format_number(*value)),
            CssValue::Vw(value) => write!(f, "{}vw", format_number(*value)),
            CssValue::Fluid(expr) => write!(f, "{}", expr),
            CssValue::Number(value) => f.write_str(&format_number(*value)),
        }
    }
}

/// Formats a number the way the host framework's script runtime prints it:
/// shortest round-trip digits, no trailing `.0`, `-0` folded into `0`, and
/// exponent notation below `1e-6` or from `1e21` up.
pub fn format_number(value: f64) -> String {
    if value.is_nan() {
        return "NaN".to_string();
    }
    if value.is_infinite() {
        return if value > 0.0 { "Infinity" } else { "-Infinity" }.to_string();
    }
    if value == 0.0 {
        return "0".to_string();
    }
    let magnitude = value.abs();
    if !(1e-6..1e21).contains(&magnitude) {
        return exponent_form(value);
    }
    value.to_string()
}

// `1e21` -> `1e+21`, `1.5e-7` stays as is.
fn exponent_form(value: f64) -> String {
    let formatted = format!("{:e}", value);
    match formatted.split_once('e') {
        Some((mantissa, exponent)) if !exponent.starts_with('-') => {
            format!("{}e+{}", mantissa, exponent)
        }
        _ => formatted,
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MediaQuery {
    pub min_width: f64,
}

impl MediaQuery {
    pub fn min_width(min_width: f64) -> Self {
        Self { min_width }
    }
}

impl fmt::Display for MediaQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "only screen and (min-width: {}px)",
            format_number(self.min_width)
        )
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Declaration {
    pub property: String,
    pub value: CssValue,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MediaBlock {
    pub query: MediaQuery,
    pub declarations: Vec<Declaration>,
}

impl MediaBlock {
    pub fn set(&mut self, property: &str, value: CssValue) {
        set_declaration(&mut self.declarations, property, value);
    }

    pub fn get(&self, property: &str) -> Option<&CssValue> {
        get_declaration(&self.declarations, property)
    }
}

/// Declarations for one selector. Properties and media queries behave like
/// object keys: setting an existing one replaces it in place.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RuleBlock {
    pub declarations: Vec<Declaration>,
    pub media: Vec<MediaBlock>,
}

impl RuleBlock {
    pub fn set(&mut self, property: &str, value: CssValue) {
        set_declaration(&mut self.declarations, property, value);
    }

    pub fn get(&self, property: &str) -> Option<&CssValue> {
        get_declaration(&self.declarations, property)
    }

    pub fn media(&self, query: MediaQuery) -> Option<&MediaBlock> {
        self.media.iter().find(|block| block.query == query)
    }

    pub fn media_mut(&mut self, query: MediaQuery) -> &mut MediaBlock {
        let idx = match self.media.iter().position(|block| block.query == query) {
            Some(idx) => idx,
            None => {
                self.media.push(MediaBlock {
                    query,
                    declarations: Vec::new(),
                });
                self.media.len() - 1
            }
        };
        &mut self.media[idx]
    }

    pub fn negated(&self) -> Self {
        Self {
            declarations: negate_all(&self.declarations),
            media: self
                .media
                .iter()
                .map(|block| MediaBlock {
                    query: block.query,
                    declarations: negate_all(&block.declarations),
                })
                .collect(),
        }
    }
}

fn set_declaration(declarations: &mut Vec<Declaration>, property: &str, value: CssValue) {
    if let Some(existing) = declarations
        .iter_mut()
        .find(|declaration| declaration.property == property)
    {
        existing.value = value;
        return;
    }
    declarations.push(Declaration {
        property: property.to_string(),
        value,
    });
}

fn get_declaration<'a>(declarations: &'a [Declaration], property: &str) -> Option<&'a CssValue> {
    declarations
        .iter()
        .find(|declaration| declaration.property == property)
        .map(|declaration| &declaration.value)
}

fn negate_all(declarations: &[Declaration]) -> Vec<Declaration> {
    declarations
        .iter()
        .map(|declaration| Declaration {
            property: declaration.property.clone(),
            value: declaration.value.negated(),
        })
        .collect()
}
