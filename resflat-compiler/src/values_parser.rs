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

// Values documents (`res/values*/...`) are parsed straight into a
// ResourceTable rather than flattened like other XML. The grammar is a
// `<resources>` root whose children each define one entry; nested markup
// inside string values is reduced to its text content.

use std::io::Read;

use resflat_common::{Diagnostics, ResError, Result};
use xml::common::Position;
use xml::{attribute::OwnedAttribute, name::OwnedName, reader::XmlEvent, EventReader};

use crate::config::ConfigDescription;
use crate::resource_types::ResourceType;
use crate::table::{AddResult, PluralCase, PluralQuantity, ResourceTable, ResourceValue};

pub struct ResourceParserOptions {
    /// Strings with several substitutions but no positional indices are an
    /// error unless legacy mode downgrades them to warnings.
    pub error_on_positional_arguments: bool,
    /// Default for entries that carry no `translatable` attribute.
    pub translatable: bool
}

impl Default for ResourceParserOptions {
    fn default() -> Self {
        ResourceParserOptions {
            error_on_positional_arguments: true,
            translatable: true
        }
    }
}

/// Parses one values document into `table`, keyed by `config`.
pub struct ResourceParser<'a> {
    diag: &'a dyn Diagnostics,
    table: &'a mut ResourceTable,
    source: &'a str,
    config: ConfigDescription,
    options: ResourceParserOptions
}

impl<'a> ResourceParser<'a> {
    pub fn new(
        diag: &'a dyn Diagnostics,
        table: &'a mut ResourceTable,
        source: &'a str,
        config: ConfigDescription,
        options: ResourceParserOptions
    ) -> Self {
        ResourceParser {
            diag,
            table,
            source,
            config,
            options
        }
    }

    pub fn parse<R: Read>(&mut self, input: R) -> Result<()> {
        let mut reader = EventReader::new(input);

        // Find the document root.
        loop {
            match reader.next()? {
                XmlEvent::StartElement { name, .. } => {
                    if name.local_name != "resources" {
                        let message = self.located(&reader, "root element must be <resources>");
                        self.diag.error(Some(self.source), &message);
                        return Err(ResError::ValuesParsingFailed(message));
                    }
                    break;
                }
                XmlEvent::EndDocument => {
                    let message = "no <resources> root element".to_string();
                    self.diag.error(Some(self.source), &message);
                    return Err(ResError::ValuesParsingFailed(message));
                }
                _ => {}
            }
        }

        let mut had_error = false;
        loop {
            match reader.next()? {
                XmlEvent::StartElement {
                    name, attributes, ..
                } => {
                    if let Err(message) = self.parse_resource(&mut reader, &name, &attributes) {
                        self.diag.error(Some(self.source), &message);
                        had_error = true;
                    }
                }
                XmlEvent::EndElement { .. } | XmlEvent::EndDocument => break,
                _ => {}
            }
        }

        if had_error {
            return Err(ResError::ValuesParsingFailed(
                "failed to parse values document".into()
            ));
        }
        Ok(())
    }

    fn parse_resource<R: Read>(
        &mut self,
        reader: &mut EventReader<R>,
        name: &OwnedName,
        attributes: &[OwnedAttribute]
    ) -> std::result::Result<(), String> {
        match name.local_name.as_str() {
            "string" => self.parse_string(reader, attributes),
            "plurals" => self.parse_plurals(reader, attributes),
            "bool" | "integer" | "color" | "dimen" | "fraction" => {
                let res_type = ResourceType::parse(&name.local_name).unwrap();
                let text = collect_text(reader)?;
                let entry_name = required_name(reader, attributes)?;
                self.add(res_type, &entry_name, false, ResourceValue::Raw(text))
            }
            "id" => {
                skip_element(reader)?;
                let entry_name = required_name(reader, attributes)?;
                self.add(ResourceType::Id, &entry_name, false, ResourceValue::Id)
            }
            "item" => self.parse_item(reader, attributes),
            other => {
                let message = format!("unknown resource type '{}'", other);
                skip_element(reader)?;
                Err(located_at(reader, &message))
            }
        }
    }

    fn parse_string<R: Read>(
        &mut self,
        reader: &mut EventReader<R>,
        attributes: &[OwnedAttribute]
    ) -> std::result::Result<(), String> {
        let translatable = match plain_attribute(attributes, "translatable") {
            Some(value) => parse_bool(reader, value, "translatable")?,
            None => self.options.translatable
        };
        let formatted = match plain_attribute(attributes, "formatted") {
            Some(value) => parse_bool(reader, value, "formatted")?,
            None => true
        };

        let value = collect_text(reader)?;
        let entry_name = required_name(reader, attributes)?;

        if formatted && multiple_nonpositional_args(&value) {
            let message = located_at(
                reader,
                "multiple substitutions specified in non-positional format; \
                 did you mean to add the formatted=\"false\" attribute?"
            );
            if self.options.error_on_positional_arguments {
                return Err(message);
            }
            self.diag.warn(Some(self.source), &message);
        }

        self.add(
            ResourceType::String,
            &entry_name,
            false,
            ResourceValue::String {
                value,
                translatable
            }
        )
    }

    fn parse_plurals<R: Read>(
        &mut self,
        reader: &mut EventReader<R>,
        attributes: &[OwnedAttribute]
    ) -> std::result::Result<(), String> {
        let mut cases: Vec<PluralCase> = vec![];
        let mut inner_error: Option<String> = None;
        loop {
            match reader.next().map_err(|e| e.to_string())? {
                XmlEvent::StartElement {
                    name, attributes, ..
                } => {
                    if name.local_name != "item" {
                        inner_error = Some(located_at(
                            reader,
                            &format!("unexpected <{}> in <plurals>", name.local_name)
                        ));
                        skip_element(reader)?;
                        continue;
                    }
                    let quantity_str = plain_attribute(&attributes, "quantity")
                        .map(str::to_string)
                        .unwrap_or_default();
                    let value = collect_text(reader)?;
                    match PluralQuantity::parse(&quantity_str) {
                        Some(quantity) => cases.push(PluralCase { quantity, value }),
                        None => {
                            inner_error = Some(located_at(
                                reader,
                                &format!("invalid plural quantity '{}'", quantity_str)
                            ))
                        }
                    }
                }
                XmlEvent::EndElement { .. } => break,
                XmlEvent::EndDocument => break,
                _ => {}
            }
        }
        let entry_name = required_name(reader, attributes)?;
        if let Some(message) = inner_error {
            return Err(message);
        }
        self.add(
            ResourceType::Plurals,
            &entry_name,
            false,
            ResourceValue::Plurals(cases)
        )
    }

    fn parse_item<R: Read>(
        &mut self,
        reader: &mut EventReader<R>,
        attributes: &[OwnedAttribute]
    ) -> std::result::Result<(), String> {
        let type_str = plain_attribute(attributes, "type")
            .map(str::to_string)
            .unwrap_or_default();
        let res_type = match ResourceType::parse(&type_str) {
            Some(res_type) => res_type,
            None => {
                let message = format!("<item> has invalid type '{}'", type_str);
                skip_element(reader)?;
                return Err(located_at(reader, &message));
            }
        };
        let text = collect_text(reader)?;
        let entry_name = required_name(reader, attributes)?;
        let value = match res_type {
            ResourceType::Id => ResourceValue::Id,
            ResourceType::String => ResourceValue::String {
                value: text,
                translatable: self.options.translatable
            },
            _ => ResourceValue::Raw(text)
        };
        self.add(res_type, &entry_name, false, value)
    }

    fn add(
        &mut self,
        res_type: ResourceType,
        name: &str,
        weak: bool,
        value: ResourceValue
    ) -> std::result::Result<(), String> {
        match self
            .table
            .add_resource("", res_type, name, &self.config, weak, value)
        {
            AddResult::Duplicate => Err(format!(
                "duplicate value for resource {}/{}",
                res_type.as_str(),
                name
            )),
            _ => Ok(())
        }
    }

    fn located<R: Read>(&self, reader: &EventReader<R>, message: &str) -> String {
        located_at(reader, message)
    }
}

fn located_at<R: Read>(reader: &EventReader<R>, message: &str) -> String {
    format!("line {}: {}", reader.position().row + 1, message)
}

fn plain_attribute<'a>(attributes: &'a [OwnedAttribute], name: &str) -> Option<&'a str> {
    attributes
        .iter()
        .find(|attr| attr.name.local_name == name && attr.name.prefix.is_none())
        .map(|attr| attr.value.as_str())
}

fn required_name<R: Read>(
    reader: &EventReader<R>,
    attributes: &[OwnedAttribute]
) -> std::result::Result<String, String> {
    plain_attribute(attributes, "name")
        .map(str::to_string)
        .ok_or_else(|| located_at(reader, "resource is missing the 'name' attribute"))
}

fn parse_bool<R: Read>(
    reader: &EventReader<R>,
    value: &str,
    attribute: &str
) -> std::result::Result<bool, String> {
    match value {
        "true" => Ok(true),
        "false" => Ok(false),
        other => Err(located_at(
            reader,
            &format!("invalid value '{}' for attribute '{}'", other, attribute)
        ))
    }
}

/// Consumes events up to the end of the current element, returning the
/// concatenated text content. Markup spans inside string values are reduced
/// to their text.
fn collect_text<R: Read>(reader: &mut EventReader<R>) -> std::result::Result<String, String> {
    let mut text = String::new();
    let mut depth = 0usize;
    loop {
        match reader.next().map_err(|e| e.to_string())? {
            XmlEvent::StartElement { .. } => depth += 1,
            XmlEvent::EndElement { .. } => {
                if depth == 0 {
                    return Ok(text);
                }
                depth -= 1;
            }
            XmlEvent::Characters(chars) | XmlEvent::CData(chars) => text.push_str(&chars),
            XmlEvent::EndDocument => return Err("unexpected end of document".into()),
            _ => {}
        }
    }
}

/// Consumes events up to the end of the current element, discarding them.
fn skip_element<R: Read>(reader: &mut EventReader<R>) -> std::result::Result<(), String> {
    let mut depth = 0usize;
    loop {
        match reader.next().map_err(|e| e.to_string())? {
            XmlEvent::StartElement { .. } => depth += 1,
            XmlEvent::EndElement { .. } => {
                if depth == 0 {
                    return Ok(());
                }
                depth -= 1;
            }
            XmlEvent::EndDocument => return Err("unexpected end of document".into()),
            _ => {}
        }
    }
}

/// True when a format string has several substitutions and none of them are
/// positional, eg. `"%s eats %d"` but not `"%1$s eats %2$d"`.
fn multiple_nonpositional_args(value: &str) -> bool {
    let mut nonpositional = 0;
    let mut chars = value.chars().peekable();
    while let Some(c) = chars.next() {
        if c != '%' {
            continue;
        }
        match chars.peek() {
            // Literal percent.
            Some('%') => {
                chars.next();
            }
            Some(d) if d.is_ascii_digit() => {
                // Positional only if the digits are followed by '$'.
                let mut lookahead = chars.clone();
                while matches!(lookahead.peek(), Some(d) if d.is_ascii_digit()) {
                    lookahead.next();
                }
                if lookahead.peek() != Some(&'$') {
                    nonpositional += 1;
                }
            }
            Some(_) => nonpositional += 1,
            None => {}
        }
    }
    nonpositional > 1
}

#[cfg(test)]
mod tests {
    use super::*;
    use resflat_common::NullDiagnostics;
    use std::io::Cursor;

    fn parse_with(
        input: &str,
        config: &str,
        options: ResourceParserOptions
    ) -> Result<ResourceTable> {
        let mut table = ResourceTable::default();
        let config = if config.is_empty() {
            ConfigDescription::default()
        } else {
            ConfigDescription::parse(config).unwrap()
        };
        let diag = NullDiagnostics;
        let mut parser = ResourceParser::new(&diag, &mut table, "test.xml", config, options);
        parser.parse(Cursor::new(input.as_bytes()))?;
        Ok(table)
    }

    fn parse(input: &str) -> Result<ResourceTable> {
        parse_with(input, "", ResourceParserOptions::default())
    }

    #[test]
    fn parses_strings_and_plurals() {
        let table = parse(
            r#"<resources>
                 <string name="hi">Hi</string>
                 <plurals name="apples">
                   <item quantity="one">an apple</item>
                   <item quantity="other">%1$d apples</item>
                 </plurals>
               </resources>"#
        )
        .unwrap();

        let package = &table.packages[0];
        let strings = &package.groups[0];
        assert_eq!(strings.res_type, ResourceType::String);
        match &strings.entries[0].values[0].value {
            ResourceValue::String {
                value,
                translatable
            } => {
                assert_eq!(value, "Hi");
                assert!(*translatable);
            }
            other => panic!("expected string, got {:?}", other)
        }

        let plurals = &package.groups[1];
        assert_eq!(plurals.res_type, ResourceType::Plurals);
        match &plurals.entries[0].values[0].value {
            ResourceValue::Plurals(cases) => {
                assert_eq!(cases.len(), 2);
                assert_eq!(cases[0].quantity, PluralQuantity::One);
                assert_eq!(cases[1].value, "%1$d apples");
            }
            other => panic!("expected plurals, got {:?}", other)
        }
    }

    #[test]
    fn parses_simple_items_and_ids() {
        let table = parse(
            r#"<resources>
                 <bool name="flag">true</bool>
                 <color name="red">#ff0000</color>
                 <id name="widget"/>
                 <item type="dimen" name="gap">4dp</item>
               </resources>"#
        )
        .unwrap();
        let package = &table.packages[0];
        assert_eq!(package.groups.len(), 4);
        assert!(matches!(
            package.groups[2].entries[0].values[0].value,
            ResourceValue::Id
        ));
    }

    #[test]
    fn default_translatable_can_be_disabled() {
        let options = ResourceParserOptions {
            error_on_positional_arguments: true,
            translatable: false
        };
        let table = parse_with(
            r#"<resources><string name="key">fixed</string></resources>"#,
            "fr",
            options
        )
        .unwrap();
        match &table.packages[0].groups[0].entries[0].values[0].value {
            ResourceValue::String { translatable, .. } => assert!(!translatable),
            other => panic!("expected string, got {:?}", other)
        }
    }

    #[test]
    fn positional_argument_misuse_is_an_error_outside_legacy_mode() {
        let doc = r#"<resources><string name="x">%s eats %d</string></resources>"#;
        assert!(parse(doc).is_err());

        let legacy = ResourceParserOptions {
            error_on_positional_arguments: false,
            translatable: true
        };
        assert!(parse_with(doc, "", legacy).is_ok());

        // Positional forms and formatted="false" are always fine.
        let positional =
            r#"<resources><string name="x">%1$s eats %2$d</string></resources>"#;
        assert!(parse(positional).is_ok());
        let unformatted =
            r#"<resources><string name="x" formatted="false">%s %s</string></resources>"#;
        assert!(parse(unformatted).is_ok());
    }

    #[test]
    fn rejects_unknown_elements_and_missing_names() {
        assert!(parse(r#"<resources><gizmo name="x">1</gizmo></resources>"#).is_err());
        assert!(parse(r#"<resources><string>anonymous</string></resources>"#).is_err());
        assert!(parse(r#"<not-resources/>"#).is_err());
    }

    #[test]
    fn duplicate_entries_are_an_error() {
        assert!(parse(
            r#"<resources>
                 <string name="x">a</string>
                 <string name="x">b</string>
               </resources>"#
        )
        .is_err());
    }

    #[test]
    fn format_argument_detection() {
        assert!(!multiple_nonpositional_args("no args"));
        assert!(!multiple_nonpositional_args("one %s arg"));
        assert!(!multiple_nonpositional_args("escaped %% and %s"));
        assert!(!multiple_nonpositional_args("%1$s and %2$d"));
        assert!(multiple_nonpositional_args("%s and %d"));
        assert!(multiple_nonpositional_args("%s %s"));
    }
}
