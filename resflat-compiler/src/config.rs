// Copyright 2024 Google LLC
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

// Configuration qualifiers appear after the first dash of a resource
// directory name, in a fixed canonical order (language before density,
// density before version, ...). The parser walks the dash-separated parts
// with one matcher per qualifier position; a part no matcher accepts fails
// the whole segment.

/// Screen density in dpi. Named buckets map onto fixed values, `anydpi` and
/// `nodpi` use reserved markers the way the platform does.
pub const DENSITY_ANY: u16 = 0xFFFE;
pub const DENSITY_NONE: u16 = 0xFFFF;

const NAMED_DENSITIES: &[(&str, u16)] = &[
    ("ldpi", 120),
    ("mdpi", 160),
    ("tvdpi", 213),
    ("hdpi", 240),
    ("xhdpi", 320),
    ("xxhdpi", 480),
    ("xxxhdpi", 640),
    ("anydpi", DENSITY_ANY),
    ("nodpi", DENSITY_NONE)
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LayoutDirection {
    Ltr,
    Rtl
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScreenSize {
    Small,
    Normal,
    Large,
    Xlarge
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Orientation {
    Port,
    Land,
    Square
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NightMode {
    Night,
    NotNight
}

/// Parsed form of a directory qualifier segment such as `en-rUS-hdpi-v21`.
///
/// The default value (all fields unset) is the default configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct ConfigDescription {
    pub language: Option<String>,
    pub region: Option<String>,
    pub layout_direction: Option<LayoutDirection>,
    pub smallest_width_dp: Option<u16>,
    pub screen_size: Option<ScreenSize>,
    pub orientation: Option<Orientation>,
    pub night_mode: Option<NightMode>,
    pub density: Option<u16>,
    pub sdk_version: Option<u16>
}

impl ConfigDescription {
    /// Parses a qualifier segment. Returns `None` when any part is not a
    /// recognised qualifier or parts appear out of canonical order.
    pub fn parse(config_str: &str) -> Option<ConfigDescription> {
        let mut config = ConfigDescription::default();
        let mut parts = config_str.split('-').peekable();

        if let Some(part) = parts.peek() {
            if is_language(part) {
                config.language = Some(parts.next().unwrap().to_string());
            }
        }
        if config.language.is_some() {
            if let Some(part) = parts.peek() {
                if let Some(region) = parse_region(part) {
                    config.region = Some(region);
                    parts.next();
                }
            }
        }
        if let Some(part) = parts.peek() {
            config.layout_direction = match *part {
                "ldltr" => Some(LayoutDirection::Ltr),
                "ldrtl" => Some(LayoutDirection::Rtl),
                _ => None
            };
            if config.layout_direction.is_some() {
                parts.next();
            }
        }
        if let Some(part) = parts.peek() {
            if let Some(width) = parse_smallest_width(part) {
                config.smallest_width_dp = Some(width);
                parts.next();
            }
        }
        if let Some(part) = parts.peek() {
            config.screen_size = match *part {
                "small" => Some(ScreenSize::Small),
                "normal" => Some(ScreenSize::Normal),
                "large" => Some(ScreenSize::Large),
                "xlarge" => Some(ScreenSize::Xlarge),
                _ => None
            };
            if config.screen_size.is_some() {
                parts.next();
            }
        }
        if let Some(part) = parts.peek() {
            config.orientation = match *part {
                "port" => Some(Orientation::Port),
                "land" => Some(Orientation::Land),
                "square" => Some(Orientation::Square),
                _ => None
            };
            if config.orientation.is_some() {
                parts.next();
            }
        }
        if let Some(part) = parts.peek() {
            config.night_mode = match *part {
                "night" => Some(NightMode::Night),
                "notnight" => Some(NightMode::NotNight),
                _ => None
            };
            if config.night_mode.is_some() {
                parts.next();
            }
        }
        if let Some(part) = parts.peek() {
            if let Some(density) = parse_density(part) {
                config.density = Some(density);
                parts.next();
            }
        }
        if let Some(part) = parts.peek() {
            if let Some(version) = parse_version(part) {
                config.sdk_version = Some(version);
                parts.next();
            }
        }

        // Every part must have been consumed by some matcher.
        if parts.next().is_some() {
            return None;
        }
        Some(config)
    }

    pub fn is_default(&self) -> bool {
        *self == ConfigDescription::default()
    }

    /// Canonical dash-joined qualifier string; empty for the default config.
    pub fn to_qualifier_string(&self) -> String {
        let mut parts: Vec<String> = vec![];
        if let Some(language) = &self.language {
            parts.push(language.clone());
        }
        if let Some(region) = &self.region {
            parts.push(format!("r{}", region));
        }
        if let Some(dir) = self.layout_direction {
            parts.push(
                match dir {
                    LayoutDirection::Ltr => "ldltr",
                    LayoutDirection::Rtl => "ldrtl"
                }
                .to_string()
            );
        }
        if let Some(width) = self.smallest_width_dp {
            parts.push(format!("sw{}dp", width));
        }
        if let Some(size) = self.screen_size {
            parts.push(
                match size {
                    ScreenSize::Small => "small",
                    ScreenSize::Normal => "normal",
                    ScreenSize::Large => "large",
                    ScreenSize::Xlarge => "xlarge"
                }
                .to_string()
            );
        }
        if let Some(orientation) = self.orientation {
            parts.push(
                match orientation {
                    Orientation::Port => "port",
                    Orientation::Land => "land",
                    Orientation::Square => "square"
                }
                .to_string()
            );
        }
        if let Some(night) = self.night_mode {
            parts.push(
                match night {
                    NightMode::Night => "night",
                    NightMode::NotNight => "notnight"
                }
                .to_string()
            );
        }
        if let Some(density) = self.density {
            let named = NAMED_DENSITIES
                .iter()
                .find(|(_, value)| *value == density)
                .map(|(name, _)| name.to_string());
            parts.push(named.unwrap_or_else(|| format!("{}dpi", density)));
        }
        if let Some(version) = self.sdk_version {
            parts.push(format!("v{}", version));
        }
        parts.join("-")
    }
}

fn is_language(part: &str) -> bool {
    (part.len() == 2 || part.len() == 3)
        && part.chars().all(|c| c.is_ascii_lowercase())
        // Qualifier keywords that would otherwise look like languages.
        && part != "car"
}

fn parse_region(part: &str) -> Option<String> {
    let rest = part.strip_prefix('r')?;
    if rest.len() == 2 && rest.chars().all(|c| c.is_ascii_alphanumeric()) {
        Some(rest.to_uppercase())
    } else {
        None
    }
}

fn parse_smallest_width(part: &str) -> Option<u16> {
    part.strip_prefix("sw")?.strip_suffix("dp")?.parse().ok()
}

fn parse_density(part: &str) -> Option<u16> {
    if let Some((_, value)) = NAMED_DENSITIES.iter().find(|(name, _)| *name == part) {
        return Some(*value);
    }
    part.strip_suffix("dpi")?.parse().ok()
}

fn parse_version(part: &str) -> Option<u16> {
    part.strip_prefix('v')?.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_locale_qualifiers() {
        let config = ConfigDescription::parse("en").unwrap();
        assert_eq!(config.language.as_deref(), Some("en"));
        assert_eq!(config.region, None);

        let config = ConfigDescription::parse("fr-rCA").unwrap();
        assert_eq!(config.language.as_deref(), Some("fr"));
        assert_eq!(config.region.as_deref(), Some("CA"));
    }

    #[test]
    fn parses_density_and_version() {
        let config = ConfigDescription::parse("hdpi").unwrap();
        assert_eq!(config.density, Some(240));

        let config = ConfigDescription::parse("480dpi-v21").unwrap();
        assert_eq!(config.density, Some(480));
        assert_eq!(config.sdk_version, Some(21));

        let config = ConfigDescription::parse("anydpi").unwrap();
        assert_eq!(config.density, Some(DENSITY_ANY));
    }

    #[test]
    fn parses_combined_qualifiers_in_order() {
        let config = ConfigDescription::parse("en-rUS-sw600dp-land-night-xhdpi-v19").unwrap();
        assert_eq!(config.language.as_deref(), Some("en"));
        assert_eq!(config.region.as_deref(), Some("US"));
        assert_eq!(config.smallest_width_dp, Some(600));
        assert_eq!(config.orientation, Some(Orientation::Land));
        assert_eq!(config.night_mode, Some(NightMode::Night));
        assert_eq!(config.density, Some(320));
        assert_eq!(config.sdk_version, Some(19));
    }

    #[test]
    fn rejects_unknown_and_misordered_parts() {
        assert!(ConfigDescription::parse("bogusqualifier").is_none());
        assert!(ConfigDescription::parse("hdpi-en").is_none());
        assert!(ConfigDescription::parse("en-hdpi-extra").is_none());
    }

    #[test]
    fn qualifier_string_round_trips() {
        for segment in ["en-rUS", "sw600dp-port-hdpi", "ldrtl-night-v26", "ar-rXB"] {
            let config = ConfigDescription::parse(segment).unwrap();
            assert_eq!(config.to_qualifier_string(), segment);
        }
        assert_eq!(ConfigDescription::default().to_qualifier_string(), "");
    }
}
