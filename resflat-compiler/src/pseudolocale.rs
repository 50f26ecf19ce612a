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

// Pseudo-localisation fabricates two locales from the default strings:
// en-XA reshapes text with accented letters and expansion padding, ar-XB
// wraps words in right-to-left controls. Both exist purely to stress-test
// layouts. Generated entries are weak so an explicit translation for either
// locale always wins.

use crate::config::ConfigDescription;
use crate::resource_types::ResourceType;
use crate::table::{PluralCase, ResourceTable, ResourceValue};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PseudoMethod {
    /// `en-XA`: accented characters, ~50% expansion, bracket markers.
    Accent,
    /// `ar-XB`: every word wrapped in RLO/PDF bidi controls.
    Bidi
}

impl PseudoMethod {
    fn config(&self) -> ConfigDescription {
        let mut config = ConfigDescription::default();
        match self {
            PseudoMethod::Accent => {
                config.language = Some("en".into());
                config.region = Some("XA".into());
            }
            PseudoMethod::Bidi => {
                config.language = Some("ar".into());
                config.region = Some("XB".into());
            }
        }
        config
    }

    fn transform(&self, text: &str) -> String {
        match self {
            PseudoMethod::Accent => accent_string(text),
            PseudoMethod::Bidi => bidi_string(text)
        }
    }
}

/// Adds weak `en-XA` and `ar-XB` variants for every translatable string and
/// plural defined under the default configuration.
pub fn pseudolocalize(table: &mut ResourceTable) {
    for method in [PseudoMethod::Accent, PseudoMethod::Bidi] {
        let pseudo_config = method.config();
        let mut generated: Vec<(ResourceType, String, ResourceValue)> = vec![];

        for package in &table.packages {
            for group in &package.groups {
                if group.res_type != ResourceType::String
                    && group.res_type != ResourceType::Plurals
                {
                    continue;
                }
                for entry in &group.entries {
                    for config_value in &entry.values {
                        if !config_value.config.is_default() || config_value.weak {
                            continue;
                        }
                        match &config_value.value {
                            ResourceValue::String {
                                value,
                                translatable
                            } if *translatable => {
                                generated.push((
                                    group.res_type,
                                    entry.name.clone(),
                                    ResourceValue::String {
                                        value: method.transform(value),
                                        translatable: true
                                    }
                                ));
                            }
                            ResourceValue::Plurals(cases) => {
                                let cases = cases
                                    .iter()
                                    .map(|case| PluralCase {
                                        quantity: case.quantity,
                                        value: method.transform(&case.value)
                                    })
                                    .collect();
                                generated.push((
                                    group.res_type,
                                    entry.name.clone(),
                                    ResourceValue::Plurals(cases)
                                ));
                            }
                            _ => {}
                        }
                    }
                }
            }
        }

        for (res_type, name, value) in generated {
            // Weak insertion: an existing entry for this key always wins.
            table.add_resource("", res_type, &name, &pseudo_config, true, value);
        }
    }
}

const EXPANSION_WORDS: &[&str] = &["one", "two", "three", "four", "five", "six"];

// U+200F RIGHT-TO-LEFT MARK, U+202E RIGHT-TO-LEFT OVERRIDE,
// U+202C POP DIRECTIONAL FORMATTING.
const RLM: char = '\u{200F}';
const RLO: char = '\u{202E}';
const PDF: char = '\u{202C}';

/// Splits `text` into literal runs and printf-style placeholders.
/// Placeholders pass through every pseudo transformation untouched.
fn split_placeholders(text: &str) -> Vec<(bool, String)> {
    let mut segments: Vec<(bool, String)> = vec![];
    let mut literal = String::new();
    let chars: Vec<char> = text.chars().collect();
    let mut i = 0;
    while i < chars.len() {
        if chars[i] != '%' || i + 1 == chars.len() {
            literal.push(chars[i]);
            i += 1;
            continue;
        }
        if chars[i + 1] == '%' {
            literal.push_str("%%");
            i += 2;
            continue;
        }
        // Placeholder: %[argument$][flags][width][.precision]conversion.
        let start = i;
        i += 1;
        while i < chars.len() && !chars[i].is_ascii_alphabetic() {
            i += 1;
        }
        if i < chars.len() {
            i += 1;
        }
        if !literal.is_empty() {
            segments.push((false, std::mem::take(&mut literal)));
        }
        segments.push((true, chars[start..i].iter().collect()));
    }
    if !literal.is_empty() {
        segments.push((false, literal));
    }
    segments
}

fn accent_char(c: char) -> char {
    match c {
        'a' => 'à',
        'b' => 'ḅ',
        'c' => 'ç',
        'd' => 'ḓ',
        'e' => 'é',
        'f' => 'ƒ',
        'g' => 'ĝ',
        'h' => 'ĥ',
        'i' => 'í',
        'j' => 'ĵ',
        'k' => 'ķ',
        'l' => 'ļ',
        'm' => 'ɱ',
        'n' => 'ñ',
        'o' => 'ó',
        'p' => 'þ',
        'q' => 'ɋ',
        'r' => 'ŕ',
        's' => 'š',
        't' => 'ţ',
        'u' => 'û',
        'v' => 'ṽ',
        'w' => 'ŵ',
        'x' => 'ẋ',
        'y' => 'ý',
        'z' => 'ž',
        'A' => 'À',
        'B' => 'Ɓ',
        'C' => 'Ç',
        'D' => 'Ð',
        'E' => 'É',
        'F' => 'Ƒ',
        'G' => 'Ĝ',
        'H' => 'Ĥ',
        'I' => 'Í',
        'J' => 'Ĵ',
        'K' => 'Ķ',
        'L' => 'Ļ',
        'M' => 'Ṁ',
        'N' => 'Ñ',
        'O' => 'Ó',
        'P' => 'Þ',
        'Q' => 'Ǫ',
        'R' => 'Ŕ',
        'S' => 'Š',
        'T' => 'Ţ',
        'U' => 'Û',
        'V' => 'Ṽ',
        'W' => 'Ŵ',
        'X' => 'Ẋ',
        'Y' => 'Ý',
        'Z' => 'Ž',
        other => other
    }
}

fn accent_string(text: &str) -> String {
    let mut out = String::from("[");
    let mut visible = 0usize;
    for (is_placeholder, segment) in split_placeholders(text) {
        if is_placeholder {
            out.push_str(&segment);
        } else {
            visible += segment.chars().count();
            out.extend(segment.chars().map(accent_char));
        }
    }

    // Pad by roughly half the visible length so expanded UI text gets
    // exercised.
    let mut padding = visible.div_ceil(2);
    let mut word = 0;
    while padding > 0 {
        let expansion = EXPANSION_WORDS[word % EXPANSION_WORDS.len()];
        out.push(' ');
        out.push_str(expansion);
        padding = padding.saturating_sub(expansion.len() + 1);
        word += 1;
    }
    out.push(']');
    out
}

fn bidi_string(text: &str) -> String {
    let mut out = String::new();
    for (is_placeholder, segment) in split_placeholders(text) {
        if is_placeholder {
            out.push(RLM);
            out.push(RLO);
            out.push_str(&segment);
            out.push(PDF);
            out.push(RLM);
            continue;
        }
        let mut in_word = false;
        for c in segment.chars() {
            if c.is_whitespace() {
                if in_word {
                    out.push(PDF);
                    out.push(RLM);
                    in_word = false;
                }
                out.push(c);
            } else {
                if !in_word {
                    out.push(RLM);
                    out.push(RLO);
                    in_word = true;
                }
                out.push(c);
            }
        }
        if in_word {
            out.push(PDF);
            out.push(RLM);
        }
    }
    out
}
