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

use crate::config::ConfigDescription;
use crate::resource_types::ResourceType;

/// In-memory model of a compiled values document: packages holding typed,
/// named entries with one value per configuration.
///
/// Vectors rather than maps throughout; documents are small and insertion
/// order is what the serialised output must preserve (pseudo-localised
/// values follow the entries they were derived from).
#[derive(Debug, Default)]
pub struct ResourceTable {
    pub packages: Vec<ResourcePackage>
}

#[derive(Debug)]
pub struct ResourcePackage {
    /// 8-bit package ID, if one was established during parsing. Unset IDs
    /// are assigned the context default after the whole document is parsed.
    pub id: Option<u8>,
    pub name: String,
    pub groups: Vec<ResourceGroup>
}

/// All entries of one resource type within a package.
#[derive(Debug)]
pub struct ResourceGroup {
    pub res_type: ResourceType,
    pub entries: Vec<ResourceEntry>
}

#[derive(Debug)]
pub struct ResourceEntry {
    pub name: String,
    pub values: Vec<ResourceConfigValue>
}

#[derive(Debug)]
pub struct ResourceConfigValue {
    pub config: ConfigDescription,
    /// Weak values may be overridden by an explicit definition later;
    /// pseudo-localisation emits weak values only.
    pub weak: bool,
    pub value: ResourceValue
}

#[derive(Debug, Clone)]
pub enum ResourceValue {
    String {
        value: String,
        translatable: bool
    },
    Plurals(Vec<PluralCase>),
    /// Unparsed text of a simple item (bool, integer, color, dimen,
    /// fraction, or a generic `<item type="...">`). The linker gives it a
    /// binary type; compilation keeps the raw form.
    Raw(String),
    Id
}

#[derive(Debug, Clone)]
pub struct PluralCase {
    pub quantity: PluralQuantity,
    pub value: String
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PluralQuantity {
    Zero,
    One,
    Two,
    Few,
    Many,
    Other
}

impl PluralQuantity {
    pub fn parse(name: &str) -> Option<PluralQuantity> {
        match name {
            "zero" => Some(PluralQuantity::Zero),
            "one" => Some(PluralQuantity::One),
            "two" => Some(PluralQuantity::Two),
            "few" => Some(PluralQuantity::Few),
            "many" => Some(PluralQuantity::Many),
            "other" => Some(PluralQuantity::Other),
            _ => None
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PluralQuantity::Zero => "zero",
            PluralQuantity::One => "one",
            PluralQuantity::Two => "two",
            PluralQuantity::Few => "few",
            PluralQuantity::Many => "many",
            PluralQuantity::Other => "other"
        }
    }
}

/// Outcome of trying to add a value to the table.
#[derive(Debug, PartialEq, Eq)]
pub enum AddResult {
    Added,
    /// A weak value lost against an existing definition and was dropped.
    Skipped,
    /// A strong value collided with an existing strong definition under the
    /// same configuration.
    Duplicate
}

impl ResourceTable {
    /// Makes sure a package with this name exists, returning its index.
    pub fn create_package(&mut self, name: &str) -> usize {
        if let Some(idx) = self.packages.iter().position(|p| p.name == name) {
            return idx;
        }
        self.packages.push(ResourcePackage {
            id: None,
            name: name.into(),
            groups: vec![]
        });
        self.packages.len() - 1
    }

    /// Inserts a value under `(package, type, name, config)`.
    ///
    /// A weak value never replaces anything; a strong value replaces a weak
    /// one; two strong values for the same key are a duplicate.
    pub fn add_resource(
        &mut self,
        package: &str,
        res_type: ResourceType,
        name: &str,
        config: &ConfigDescription,
        weak: bool,
        value: ResourceValue
    ) -> AddResult {
        let package_idx = self.create_package(package);
        let package = &mut self.packages[package_idx];

        let group = match package.groups.iter().position(|g| g.res_type == res_type) {
            Some(idx) => &mut package.groups[idx],
            None => {
                package.groups.push(ResourceGroup {
                    res_type,
                    entries: vec![]
                });
                package.groups.last_mut().unwrap()
            }
        };

        let entry = match group.entries.iter().position(|e| e.name == name) {
            Some(idx) => &mut group.entries[idx],
            None => {
                group.entries.push(ResourceEntry {
                    name: name.into(),
                    values: vec![]
                });
                group.entries.last_mut().unwrap()
            }
        };

        match entry.values.iter_mut().find(|v| &v.config == config) {
            Some(existing) => {
                if weak {
                    AddResult::Skipped
                } else if existing.weak {
                    existing.weak = false;
                    existing.value = value;
                    AddResult::Added
                } else {
                    AddResult::Duplicate
                }
            }
            None => {
                entry.values.push(ResourceConfigValue {
                    config: config.clone(),
                    weak,
                    value
                });
                AddResult::Added
            }
        }
    }
}
