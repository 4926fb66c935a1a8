use serde::{Deserialize, Serialize};

/// Light/dark flavour of a map style. Governs marker colours and the page
/// theme preference.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

impl Theme {
    pub fn as_str(self) -> &'static str {
        match self {
            Theme::Light => "light",
            Theme::Dark => "dark",
        }
    }

    pub fn parse(raw: &str) -> Option<Theme> {
        match raw.trim() {
            "light" => Some(Theme::Light),
            "dark" => Some(Theme::Dark),
            _ => None,
        }
    }

    pub fn is_dark(self) -> bool {
        self == Theme::Dark
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct MapStyle {
    pub name: &'static str,
    pub url: &'static str,
    pub theme: Theme,
}

pub const MAP_STYLES: [MapStyle; 8] = [
    MapStyle {
        name: "Streets",
        url: "mapbox://styles/mapbox/streets-v12",
        theme: Theme::Light,
    },
    MapStyle {
        name: "Outdoors",
        url: "mapbox://styles/mapbox/outdoors-v12",
        theme: Theme::Light,
    },
    MapStyle {
        name: "Light",
        url: "mapbox://styles/mapbox/light-v11",
        theme: Theme::Light,
    },
    MapStyle {
        name: "Dark",
        url: "mapbox://styles/mapbox/dark-v11",
        theme: Theme::Dark,
    },
    MapStyle {
        name: "Satellite",
        url: "mapbox://styles/mapbox/satellite-v9",
        theme: Theme::Dark,
    },
    MapStyle {
        name: "Satellite Streets",
        url: "mapbox://styles/mapbox/satellite-streets-v12",
        theme: Theme::Dark,
    },
    MapStyle {
        name: "Navigation Day",
        url: "mapbox://styles/mapbox/navigation-day-v1",
        theme: Theme::Light,
    },
    MapStyle {
        name: "Navigation Night",
        url: "mapbox://styles/mapbox/navigation-night-v1",
        theme: Theme::Dark,
    },
];

pub fn default_style() -> MapStyle {
    MAP_STYLES[0]
}

/// Looks a style up by name, ignoring ASCII case.
pub fn find_style(name: &str) -> Option<MapStyle> {
    let name = name.trim();
    MAP_STYLES
        .iter()
        .find(|s| s.name.eq_ignore_ascii_case(name))
        .copied()
}

#[cfg(test)]
mod tests {
    use super::{MAP_STYLES, Theme, default_style, find_style};

    #[test]
    fn lookup_ignores_case() {
        let s = find_style("navigation night").unwrap();
        assert_eq!(s.theme, Theme::Dark);
        assert!(find_style("Watercolor").is_none());
    }

    #[test]
    fn default_is_light_streets() {
        assert_eq!(default_style().name, "Streets");
        assert_eq!(default_style().theme, Theme::Light);
    }

    #[test]
    fn style_names_are_unique() {
        for (i, a) in MAP_STYLES.iter().enumerate() {
            for b in &MAP_STYLES[i + 1..] {
                assert_ne!(a.name, b.name);
            }
        }
    }

    #[test]
    fn theme_parse_matches_storage_values() {
        assert_eq!(Theme::parse("dark"), Some(Theme::Dark));
        assert_eq!(Theme::parse(Theme::Light.as_str()), Some(Theme::Light));
        assert_eq!(Theme::parse("sepia"), None);
    }
}
