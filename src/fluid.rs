use crate::rule::{CssValue, MediaQuery, RuleBlock, format_number};
use serde::Deserialize;
use std::fmt;

/// Value at the minimum and maximum viewport. Pixels for space sizes,
/// multipliers of the base font size for font sizes.
#[derive(Debug, Clone, Copy, PartialEq, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SizeRange {
    pub min: f64,
    pub max: f64,
    #[serde(default)]
    pub min_keep: Option<bool>,
    #[serde(default)]
    pub max_keep: Option<bool>,
}

impl SizeRange {
    pub fn new(min: f64, max: f64) -> Self {
        Self {
            min,
            max,
            min_keep: None,
            max_keep: None,
        }
    }

    pub fn negated(self) -> Self {
        Self {
            min: -self.min,
            max: -self.max,
            ..self
        }
    }

    pub fn scaled(self, min_factor: f64, max_factor: f64) -> Self {
        Self {
            min: self.min * min_factor,
            max: self.max * max_factor,
            ..self
        }
    }

    // A per-entry flag can only veto the global one, never enable it.
    fn keeps_min(&self, keep: bool) -> bool {
        keep && self.min_keep != Some(false)
    }

    fn keeps_max(&self, keep: bool) -> bool {
        keep && self.max_keep != Some(false)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FontSizeRange {
    pub min: f64,
    pub max: f64,
    #[serde(default)]
    pub min_keep: Option<bool>,
    #[serde(default)]
    pub max_keep: Option<bool>,
    #[serde(default, alias = "lh")]
    pub line_height: Option<f64>,
}

impl FontSizeRange {
    pub fn range(&self) -> SizeRange {
        SizeRange {
            min: self.min,
            max: self.max,
            min_keep: self.min_keep,
            max_keep: self.max_keep,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewportRange {
    pub min: f64,
    pub max: f64,
}

impl ViewportRange {
    pub fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    pub fn is_degenerate(&self) -> bool {
        self.min == self.max
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Keep {
    pub min: bool,
    pub max: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Direction {
    #[default]
    Positive,
    Negative,
}

/// Linear interpolation between two sizes across the viewport range.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FluidExpression {
    pub min: f64,
    pub max: f64,
    pub view_min: f64,
    pub view_max: f64,
}

impl FluidExpression {
    pub fn new(size: &SizeRange, view: &ViewportRange) -> Self {
        Self {
            min: size.min,
            max: size.max,
            view_min: view.min,
            view_max: view.max,
        }
    }

    /// Value in pixels at the given viewport width, evaluated in the same
    /// order as the rendered `calc()`.
    pub fn evaluate(&self, viewport_width: f64) -> f64 {
        self.min
            + (self.max - self.min) * (viewport_width - self.view_min)
                / (self.view_max - self.view_min)
    }

    pub fn negated(self) -> Self {
        Self {
            min: -self.min,
            max: -self.max,
            ..self
        }
    }
}

impl fmt::Display for FluidExpression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let min = format_number(self.min);
        let max = format_number(self.max);
        let view_min = format_number(self.view_min);
        let view_max = format_number(self.view_max);
        write!(
            f,
            "calc({min}px + ({max} - {min}) * (100vw - {view_min}px) / ({view_max} - {view_min}))"
        )
    }
}

/// Builds the three-stage rule for `properties`: a base value below
/// `view.min`, the interpolating `calc()` from `view.min`, and the clamped
/// or proportional value from `view.max`.
///
/// `view.max == view.min` is a caller error. Both media blocks then share one
/// key and the above-max values replace the interpolation.
pub fn fluid_rule(
    properties: &[&str],
    size: &SizeRange,
    view: &ViewportRange,
    keep: Keep,
    direction: Direction,
) -> RuleBlock {
    let size = match direction {
        Direction::Positive => *size,
        Direction::Negative => size.negated(),
    };

    let below = if size.keeps_min(keep.min) {
        CssValue::Vw((size.min / view.min) * 100.0)
    } else {
        CssValue::Px(size.min)
    };
    let fluid = CssValue::Fluid(FluidExpression::new(&size, view));
    let above = if size.keeps_max(keep.max) {
        CssValue::Vw((size.max / view.max) * 100.0)
    } else {
        CssValue::Px(size.max)
    };

    let query_min = MediaQuery::min_width(view.min);
    let query_max = MediaQuery::min_width(view.max);
    let mut rule = RuleBlock::default();

    for property in properties {
        rule.set(property, below);
    }

    rule.media_mut(query_min);
    rule.media_mut(query_max);

    for property in properties {
        rule.media_mut(query_min).set(property, fluid);
        rule.media_mut(query_max).set(property, above);
    }

    rule
}

#[cfg(test)]
mod tests {
    use super::{Direction, FluidExpression, Keep, SizeRange, ViewportRange, fluid_rule};
    use crate::rule::{CssValue, MediaQuery};
    use proptest::prelude::*;

    fn default_view() -> ViewportRange {
        ViewportRange::new(320.0, 1920.0)
    }

    #[test]
    fn builds_clamped_rule_for_single_property() {
        let rule = fluid_rule(
            &["padding"],
            &SizeRange::new(100.0, 200.0),
            &default_view(),
            Keep::default(),
            Direction::Positive,
        );

        assert_eq!(rule.get("padding"), Some(&CssValue::Px(100.0)));
        let mid = rule
            .media(MediaQuery::min_width(320.0))
            .and_then(|block| block.get("padding"))
            .expect("min query present");
        assert_eq!(
            mid.to_string(),
            "calc(100px + (200 - 100) * (100vw - 320px) / (1920 - 320))"
        );
        assert_eq!(
            rule.media(MediaQuery::min_width(1920.0))
                .and_then(|block| block.get("padding")),
            Some(&CssValue::Px(200.0))
        );
        assert_eq!(rule.media[0].query, MediaQuery::min_width(320.0));
        assert_eq!(rule.media[1].query, MediaQuery::min_width(1920.0));
    }

    #[test]
    fn paired_properties_share_values() {
        let rule = fluid_rule(
            &["padding-top", "padding-bottom"],
            &SizeRange::new(8.0, 24.0),
            &default_view(),
            Keep::default(),
            Direction::Positive,
        );

        assert_eq!(rule.get("padding-top"), rule.get("padding-bottom"));
        for block in &rule.media {
            assert_eq!(block.declarations.len(), 2);
            assert_eq!(block.get("padding-top"), block.get("padding-bottom"));
        }
    }

    #[test]
    fn negative_direction_flips_both_bounds() {
        let rule = fluid_rule(
            &["margin-top"],
            &SizeRange::new(100.0, 200.0),
            &default_view(),
            Keep::default(),
            Direction::Negative,
        );

        assert_eq!(rule.get("margin-top"), Some(&CssValue::Px(-100.0)));
        let mid = rule
            .media(MediaQuery::min_width(320.0))
            .and_then(|block| block.get("margin-top"))
            .expect("min query present");
        assert_eq!(
            mid.to_string(),
            "calc(-100px + (-200 - -100) * (100vw - 320px) / (1920 - 320))"
        );
    }

    #[test]
    fn keep_flags_switch_to_viewport_units() {
        let rule = fluid_rule(
            &["gap"],
            &SizeRange::new(16.0, 96.0),
            &default_view(),
            Keep {
                min: true,
                max: true,
            },
            Direction::Positive,
        );

        assert_eq!(rule.get("gap"), Some(&CssValue::Vw(16.0 / 320.0 * 100.0)));
        assert_eq!(rule.get("gap").map(ToString::to_string).as_deref(), Some("5vw"));
        assert_eq!(
            rule.media(MediaQuery::min_width(1920.0))
                .and_then(|block| block.get("gap")),
            Some(&CssValue::Vw(96.0 / 1920.0 * 100.0))
        );
    }

    #[test]
    fn entry_flags_veto_global_keep() {
        let size = SizeRange {
            min_keep: Some(false),
            max_keep: Some(true),
            ..SizeRange::new(16.0, 96.0)
        };
        let rule = fluid_rule(
            &["gap"],
            &size,
            &default_view(),
            Keep {
                min: true,
                max: true,
            },
            Direction::Positive,
        );

        assert_eq!(rule.get("gap"), Some(&CssValue::Px(16.0)));
        assert_eq!(
            rule.media(MediaQuery::min_width(1920.0))
                .and_then(|block| block.get("gap")),
            Some(&CssValue::Vw(5.0))
        );
    }

    #[test]
    fn entry_flags_cannot_enable_keep() {
        let size = SizeRange {
            min_keep: Some(true),
            max_keep: Some(true),
            ..SizeRange::new(16.0, 96.0)
        };
        let rule = fluid_rule(
            &["gap"],
            &size,
            &default_view(),
            Keep::default(),
            Direction::Positive,
        );

        assert_eq!(rule.get("gap"), Some(&CssValue::Px(16.0)));
        assert_eq!(
            rule.media(MediaQuery::min_width(1920.0))
                .and_then(|block| block.get("gap")),
            Some(&CssValue::Px(96.0))
        );
    }

    #[test]
    fn descending_range_shrinks() {
        let expr = FluidExpression::new(&SizeRange::new(48.0, 16.0), &default_view());
        assert_eq!(expr.evaluate(320.0), 48.0);
        assert_eq!(expr.evaluate(1120.0), 32.0);
        assert_eq!(expr.evaluate(1920.0), 16.0);
    }

    #[test]
    fn equal_viewport_bounds_collapse_media_blocks() {
        let rule = fluid_rule(
            &["width"],
            &SizeRange::new(10.0, 20.0),
            &ViewportRange::new(800.0, 800.0),
            Keep::default(),
            Direction::Positive,
        );

        assert_eq!(rule.media.len(), 1);
        assert_eq!(rule.media[0].get("width"), Some(&CssValue::Px(20.0)));
    }

    proptest! {
        #[test]
        fn expression_hits_both_endpoints(
            min in -10_000i32..10_000,
            max in -10_000i32..10_000,
            view_min in 0i32..4_000,
            span in 1i32..4_000,
        ) {
            let size = SizeRange::new(f64::from(min), f64::from(max));
            let view = ViewportRange::new(f64::from(view_min), f64::from(view_min + span));
            let expr = FluidExpression::new(&size, &view);

            prop_assert_eq!(expr.evaluate(view.min), size.min);
            prop_assert_eq!(expr.evaluate(view.max), size.max);
        }

        #[test]
        fn negative_rule_is_sign_flipped_positive_rule(
            min in -500.0f64..500.0,
            max in -500.0f64..500.0,
            keep_min in any::<bool>(),
            keep_max in any::<bool>(),
        ) {
            let size = SizeRange::new(min, max);
            let keep = Keep { min: keep_min, max: keep_max };
            let properties = ["top", "bottom"];
            let positive = fluid_rule(&properties, &size, &default_view(), keep, Direction::Positive);
            let negative = fluid_rule(&properties, &size, &default_view(), keep, Direction::Negative);

            prop_assert_eq!(negative, positive.negated());
        }
    }
}
