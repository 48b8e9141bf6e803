#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PropertyGroup {
    pub prefix: &'static str,
    pub properties: &'static [&'static str],
    pub negatable: bool,
}

const fn group(
    prefix: &'static str,
    properties: &'static [&'static str],
    negatable: bool,
) -> PropertyGroup {
    PropertyGroup {
        prefix,
        properties,
        negatable,
    }
}

/// Utility prefixes that accept a fluid space size, in emission order.
pub const PROPERTY_GROUPS: &[PropertyGroup] = &[
    group("p", &["padding"], false),
    group("pt", &["padding-top"], false),
    group("pb", &["padding-bottom"], false),
    group("pl", &["padding-left"], false),
    group("pr", &["padding-right"], false),
    group("py", &["padding-top", "padding-bottom"], false),
    group("px", &["padding-left", "padding-right"], false),
    group("m", &["margin"], true),
    group("mt", &["margin-top"], true),
    group("mb", &["margin-bottom"], true),
    group("ml", &["margin-left"], true),
    group("mr", &["margin-right"], true),
    group("my", &["margin-top", "margin-bottom"], true),
    group("mx", &["margin-left", "margin-right"], true),
    group("max-w", &["max-width"], false),
    group("min-w", &["min-width"], false),
    group("min-h", &["min-height"], false),
    group("max-h", &["max-height"], false),
    group("leading", &["line-height"], false),
    group("tracking", &["letter-spacing"], true),
    group("opacity", &["opacity"], false),
    group("h", &["height"], false),
    group("w", &["width"], false),
    group("gap", &["gap"], false),
    group("gap-x", &["column-gap"], true),
    group("gap-y", &["row-gap"], true),
    group("inset", &["top", "right", "bottom", "left"], true),
    group("inset-x", &["left", "right"], true),
    group("inset-y", &["top", "bottom"], true),
    group("left", &["left"], true),
    group("right", &["right"], true),
    group("bottom", &["bottom"], true),
    group("top", &["top"], true),
];

#[cfg(test)]
mod tests {
    use super::{PROPERTY_GROUPS, PropertyGroup};
    use std::collections::BTreeSet;

    fn lookup(prefix: &str) -> Option<&'static PropertyGroup> {
        PROPERTY_GROUPS.iter().find(|group| group.prefix == prefix)
    }

    #[test]
    fn prefixes_are_unique() {
        let prefixes = PROPERTY_GROUPS
            .iter()
            .map(|group| group.prefix)
            .collect::<BTreeSet<_>>();
        assert_eq!(prefixes.len(), PROPERTY_GROUPS.len());
    }

    #[test]
    fn margins_negate_and_paddings_do_not() {
        for prefix in ["m", "mt", "mb", "ml", "mr", "mx", "my"] {
            assert!(lookup(prefix).is_some_and(|group| group.negatable), "{prefix}");
        }
        for prefix in ["p", "pt", "pb", "pl", "pr", "px", "py"] {
            assert!(lookup(prefix).is_some_and(|group| !group.negatable), "{prefix}");
        }
    }

    #[test]
    fn axis_groups_expand_to_pairs() {
        assert_eq!(
            lookup("mx").map(|group| group.properties),
            Some(&["margin-left", "margin-right"][..])
        );
        assert_eq!(
            lookup("inset-y").map(|group| group.properties),
            Some(&["top", "bottom"][..])
        );
        assert_eq!(
            lookup("inset").map(|group| group.properties),
            Some(&["top", "right", "bottom", "left"][..])
        );
    }

    #[test]
    fn sizing_prefixes_map_to_matching_properties() {
        assert_eq!(lookup("max-w").map(|g| g.properties), Some(&["max-width"][..]));
        assert_eq!(lookup("min-w").map(|g| g.properties), Some(&["min-width"][..]));
        assert_eq!(lookup("max-h").map(|g| g.properties), Some(&["max-height"][..]));
        assert_eq!(lookup("min-h").map(|g| g.properties), Some(&["min-height"][..]));
    }

    #[test]
    fn unknown_prefix_is_absent() {
        assert!(lookup("text").is_none());
    }
}
