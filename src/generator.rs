use crate::config::FluidOptions;
use crate::fluid::{Direction, fluid_rule};
use crate::properties::PROPERTY_GROUPS;
use crate::rule::{CssValue, Declaration, MediaQuery, RuleBlock};
use std::collections::BTreeSet;
use std::fmt::{self, Write as _};
use std::ops::Deref;
use tracing::debug;

const FONT_SIZE_TOKEN: &str = "text";
const WORD_NEGATION: &str = "neg-";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GeneratorConfig {
    pub minify: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationResult {
    pub css: CssOutput,
    pub rule_count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CssOutput(String);

impl CssOutput {
    pub fn new(css: String) -> Self {
        Self(css)
    }
}

impl Deref for CssOutput {
    type Target = str;

    fn deref(&self) -> &Self::Target {
        self.0.as_str()
    }
}

impl fmt::Display for CssOutput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Negation {
    None,
    /// `.-mt-xs1`
    Hyphen,
    /// `.neg-mt-xs1`, usable behind responsive variants where the hyphen
    /// form fails to combine in the host framework.
    Word,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassSelector {
    pub class: String,
    pub negation: Negation,
}

impl ClassSelector {
    pub fn positive(class: String) -> Self {
        Self {
            class,
            negation: Negation::None,
        }
    }

    pub fn negative(class: String, negation: Negation) -> Self {
        Self { class, negation }
    }

    /// The class as written in markup, without escaping.
    pub fn class_name(&self) -> String {
        format!("{}{}", self.negation_marker(), self.class)
    }

    fn negation_marker(&self) -> &'static str {
        match self.negation {
            Negation::None => "",
            Negation::Hyphen => "-",
            Negation::Word => WORD_NEGATION,
        }
    }
}

impl fmt::Display for ClassSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            ".{}{}",
            self.negation_marker(),
            escape_selector(&self.class)
        )
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Utility {
    pub selector: ClassSelector,
    pub rule: RuleBlock,
}

/// Every utility generated from one named size entry.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DeclarationSet {
    pub utilities: Vec<Utility>,
}

impl DeclarationSet {
    fn push(&mut self, selector: ClassSelector, rule: RuleBlock) {
        self.utilities.push(Utility { selector, rule });
    }

    pub fn get(&self, class_name: &str) -> Option<&RuleBlock> {
        self.utilities
            .iter()
            .find(|utility| utility.selector.class_name() == class_name)
            .map(|utility| &utility.rule)
    }

    pub fn len(&self) -> usize {
        self.utilities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.utilities.is_empty()
    }
}

pub fn utility_class(token: &str, prefix: &str, name: &str) -> String {
    if prefix.is_empty() {
        format!("{}-{}", token, name)
    } else {
        format!("{}-{}-{}", token, prefix, name)
    }
}

pub fn expand_font_sizes(options: &FluidOptions) -> Vec<DeclarationSet> {
    let view = options.viewport();
    let keep = options.font_keep();

    options
        .font_sizes
        .iter()
        .map(|(name, font)| {
            let size = font.range().scaled(options.font_min, options.font_max);
            debug!(name = %name, min = size.min, max = size.max, "expanding font size");

            let mut rule = fluid_rule(&["font-size"], &size, &view, keep, Direction::Positive);
            if let Some(line_height) = font.line_height {
                rule.set("line-height", CssValue::Number(line_height));
            }

            let mut set = DeclarationSet::default();
            set.push(
                ClassSelector::positive(utility_class(FONT_SIZE_TOKEN, &options.prefix, name)),
                rule,
            );
            set
        })
        .collect()
}

pub fn expand_space_sizes(options: &FluidOptions) -> Vec<DeclarationSet> {
    let view = options.viewport();
    let keep = options.space_keep();

    options
        .space_sizes
        .iter()
        .map(|(name, size)| {
            debug!(name = %name, min = size.min, max = size.max, "expanding space size");
            let mut set = DeclarationSet::default();

            for group in PROPERTY_GROUPS {
                let class = utility_class(group.prefix, &options.prefix, name);
                let rule = fluid_rule(group.properties, size, &view, keep, Direction::Positive);
                set.push(ClassSelector::positive(class.clone()), rule);

                if group.negatable {
                    let negative =
                        fluid_rule(group.properties, size, &view, keep, Direction::Negative);
                    set.push(
                        ClassSelector::negative(class.clone(), Negation::Hyphen),
                        negative.clone(),
                    );
                    set.push(ClassSelector::negative(class, Negation::Word), negative);
                }
            }

            set
        })
        .collect()
}

/// Drops utilities whose class never appears in `used`, then empty sets.
pub fn retain_used(sets: Vec<DeclarationSet>, used: &BTreeSet<String>) -> Vec<DeclarationSet> {
    sets.into_iter()
        .filter_map(|mut set| {
            set.utilities
                .retain(|utility| used.contains(&utility.selector.class_name()));
            if set.is_empty() { None } else { Some(set) }
        })
        .collect()
}

pub fn generate(sets: &[DeclarationSet], config: &GeneratorConfig) -> GenerationResult {
    let mut rules = Vec::new();
    for set in sets {
        for utility in &set.utilities {
            rules.push(render_utility(utility, config.minify));
        }
    }

    let rule_count = rules.len();
    let css = if config.minify {
        rules.join("")
    } else {
        rules.join("\n")
    };

    GenerationResult {
        css: CssOutput::new(css),
        rule_count,
    }
}

pub fn emit_css(result: &GenerationResult) -> String {
    result.css.to_string()
}

fn render_utility(utility: &Utility, minify: bool) -> String {
    let selector = utility.selector.to_string();
    let mut parts = Vec::new();

    if !utility.rule.declarations.is_empty() {
        parts.push(render_rule(&selector, &utility.rule.declarations, minify));
    }
    for block in &utility.rule.media {
        if block.declarations.is_empty() {
            continue;
        }
        let rule = render_rule(&selector, &block.declarations, minify);
        parts.push(wrap_media(block.query, &rule, minify));
    }

    if minify {
        parts.join("")
    } else {
        parts.join("\n")
    }
}

fn render_rule(selector: &str, declarations: &[Declaration], minify: bool) -> String {
    if minify {
        let body = declarations
            .iter()
            .map(|declaration| format!("{}:{}", declaration.property, declaration.value))
            .collect::<Vec<_>>()
            .join(";");
        format!("{}{{{}}}", selector, body)
    } else {
        let body = declarations
            .iter()
            .map(|declaration| format!("  {}: {};", declaration.property, declaration.value))
            .collect::<Vec<_>>()
            .join("\n");
        format!("{} {{\n{}\n}}", selector, body)
    }
}

fn wrap_media(query: MediaQuery, rule: &str, minify: bool) -> String {
    if minify {
        format!("@media {}{{{}}}", query, rule)
    } else {
        format!("@media {} {{\n{}\n}}", query, indent_css_block(rule, 2))
    }
}

fn indent_css_block(css: &str, spaces: usize) -> String {
    let padding = " ".repeat(spaces);
    css.lines()
        .map(|line| {
            if line.is_empty() {
                String::new()
            } else {
                format!("{}{}", padding, line)
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Backslash-escapes everything outside `[A-Za-z0-9_-]` and non-ASCII;
/// control characters use hex escapes.
pub fn escape_selector(class: &str) -> String {
    let mut escaped = String::with_capacity(class.len() * 2);

    for ch in class.chars() {
        if ch.is_ascii_alphanumeric() || matches!(ch, '-' | '_') || !ch.is_ascii() {
            escaped.push(ch);
        } else if ch.is_ascii_control() {
            let _ = write!(escaped, "\\{:x} ", u32::from(ch));
        } else {
            escaped.push('\\');
            escaped.push(ch);
        }
    }

    escaped
}
