use crate::config::FluidOptions;
use crate::generator::{
    DeclarationSet, GenerationResult, GeneratorConfig, expand_font_sizes, expand_space_sizes,
    generate, retain_used,
};
use std::collections::BTreeSet;
use tracing::warn;

/// Receives the finished declaration sets, the way a host framework's
/// `addUtilities` callback would.
pub trait UtilityRegistrar {
    fn add_utilities(&mut self, sets: Vec<DeclarationSet>);
}

#[derive(Debug, Clone, PartialEq)]
pub struct FluidSizePlugin {
    options: FluidOptions,
}

impl FluidSizePlugin {
    pub fn new(options: FluidOptions) -> Self {
        Self { options }
    }

    /// Font-size sets first, then space-size sets, each ordered by name.
    pub fn declaration_sets(&self) -> Vec<DeclarationSet> {
        let view = self.options.viewport();
        if view.is_degenerate() {
            warn!(
                view_min = view.min,
                view_max = view.max,
                "viewport bounds are equal; fluid calc() expressions divide by zero"
            );
        }

        let mut sets = expand_font_sizes(&self.options);
        sets.extend(expand_space_sizes(&self.options));
        sets
    }

    pub fn register<R>(&self, registrar: &mut R)
    where
        R: UtilityRegistrar + ?Sized,
    {
        registrar.add_utilities(self.declaration_sets());
    }
}

/// Registrar that renders registered utilities as stylesheet text.
#[derive(Debug, Clone, Default)]
pub struct StylesheetRegistrar {
    minify: bool,
    used: Option<BTreeSet<String>>,
    sets: Vec<DeclarationSet>,
}

impl StylesheetRegistrar {
    pub fn new(minify: bool) -> Self {
        Self {
            minify,
            ..Self::default()
        }
    }

    /// Only keep utilities whose class name is in `used`.
    pub fn with_used_classes(mut self, used: BTreeSet<String>) -> Self {
        self.used = Some(used);
        self
    }

    pub fn sets(&self) -> &[DeclarationSet] {
        &self.sets
    }

    /// Registered class names as written in markup, unescaped.
    pub fn class_names(&self) -> Vec<String> {
        self.sets
            .iter()
            .flat_map(|set| set.utilities.iter())
            .map(|utility| utility.selector.class_name())
            .collect()
    }

    pub fn finish(&self) -> GenerationResult {
        generate(
            &self.sets,
            &GeneratorConfig {
                minify: self.minify,
            },
        )
    }
}

impl UtilityRegistrar for StylesheetRegistrar {
    fn add_utilities(&mut self, sets: Vec<DeclarationSet>) {
        let sets = match &self.used {
            Some(used) => retain_used(sets, used),
            None => sets,
        };
        self.sets.extend(sets);
    }
}
