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

// Protobuf is the canonical serialisation for resource tables and for the
// per-file descriptor records inside compiled envelopes. The messages are
// small enough that they are written out by hand instead of generated from
// a .proto file; wire compatibility only has to hold between the compile
// and link phases of this toolchain.

use crate::config::ConfigDescription;
use crate::resource_types::ResourceFile;
use crate::table::{ResourceTable, ResourceValue};

pub mod pb {
    /// Top-level output of a compiled values document.
    #[derive(Clone, PartialEq, ::prost::Message)]
    pub struct ResourceTable {
        #[prost(message, repeated, tag = "1")]
        pub packages: ::prost::alloc::vec::Vec<Package>
    }

    #[derive(Clone, PartialEq, ::prost::Message)]
    pub struct Package {
        /// 8-bit package id in the low byte, when assigned.
        #[prost(uint32, optional, tag = "1")]
        pub package_id: ::core::option::Option<u32>,
        #[prost(string, tag = "2")]
        pub package_name: ::prost::alloc::string::String,
        #[prost(message, repeated, tag = "3")]
        pub types: ::prost::alloc::vec::Vec<Type>
    }

    #[derive(Clone, PartialEq, ::prost::Message)]
    pub struct Type {
        #[prost(string, tag = "1")]
        pub name: ::prost::alloc::string::String,
        #[prost(message, repeated, tag = "2")]
        pub entries: ::prost::alloc::vec::Vec<Entry>
    }

    #[derive(Clone, PartialEq, ::prost::Message)]
    pub struct Entry {
        #[prost(string, tag = "1")]
        pub name: ::prost::alloc::string::String,
        #[prost(message, repeated, tag = "2")]
        pub config_values: ::prost::alloc::vec::Vec<ConfigValue>
    }

    #[derive(Clone, PartialEq, ::prost::Message)]
    pub struct ConfigValue {
        #[prost(message, optional, tag = "1")]
        pub config: ::core::option::Option<Configuration>,
        /// Weak values lose against any explicit definition at link time.
        #[prost(bool, tag = "2")]
        pub weak: bool,
        #[prost(oneof = "Value", tags = "3, 4, 5, 6")]
        pub value: ::core::option::Option<Value>
    }

    #[derive(Clone, PartialEq, ::prost::Oneof)]
    pub enum Value {
        #[prost(message, tag = "3")]
        Str(StringValue),
        #[prost(message, tag = "4")]
        Plurals(Plurals),
        #[prost(message, tag = "5")]
        Raw(RawValue),
        #[prost(message, tag = "6")]
        Id(Id)
    }

    #[derive(Clone, PartialEq, ::prost::Message)]
    pub struct StringValue {
        #[prost(string, tag = "1")]
        pub value: ::prost::alloc::string::String,
        #[prost(bool, tag = "2")]
        pub translatable: bool
    }

    #[derive(Clone, PartialEq, ::prost::Message)]
    pub struct Plurals {
        #[prost(message, repeated, tag = "1")]
        pub cases: ::prost::alloc::vec::Vec<PluralCase>
    }

    #[derive(Clone, PartialEq, ::prost::Message)]
    pub struct PluralCase {
        #[prost(string, tag = "1")]
        pub quantity: ::prost::alloc::string::String,
        #[prost(string, tag = "2")]
        pub value: ::prost::alloc::string::String
    }

    #[derive(Clone, PartialEq, ::prost::Message)]
    pub struct RawValue {
        #[prost(string, tag = "1")]
        pub value: ::prost::alloc::string::String
    }

    #[derive(Clone, PartialEq, ::prost::Message)]
    pub struct Id {}

    /// Dash-joined qualifier form of a configuration; empty means default.
    #[derive(Clone, PartialEq, ::prost::Message)]
    pub struct Configuration {
        #[prost(string, tag = "1")]
        pub qualifiers: ::prost::alloc::string::String
    }

    /// Descriptor preceding each payload inside a compiled envelope.
    #[derive(Clone, PartialEq, ::prost::Message)]
    pub struct CompiledFile {
        /// `[package:]type/entry`
        #[prost(string, tag = "1")]
        pub resource_name: ::prost::alloc::string::String,
        #[prost(message, optional, tag = "2")]
        pub config: ::core::option::Option<Configuration>,
        #[prost(string, tag = "3")]
        pub source_path: ::prost::alloc::string::String,
        /// Ids the file defines via `@+id/name`.
        #[prost(string, repeated, tag = "4")]
        pub exported_ids: ::prost::alloc::vec::Vec<::prost::alloc::string::String>
    }
}

fn serialize_config(config: &ConfigDescription) -> pb::Configuration {
    pb::Configuration {
        qualifiers: config.to_qualifier_string()
    }
}

/// Converts the in-memory table into its protobuf form, preserving package,
/// type, entry, and value order.
pub fn serialize_table_to_pb(table: &ResourceTable) -> pb::ResourceTable {
    let mut pb_table = pb::ResourceTable::default();
    for package in &table.packages {
        let mut pb_package = pb::Package {
            package_id: package.id.map(u32::from),
            package_name: package.name.clone(),
            types: vec![]
        };
        for group in &package.groups {
            let mut pb_type = pb::Type {
                name: group.res_type.as_str().to_string(),
                entries: vec![]
            };
            for entry in &group.entries {
                let mut pb_entry = pb::Entry {
                    name: entry.name.clone(),
                    config_values: vec![]
                };
                for config_value in &entry.values {
                    let value = match &config_value.value {
                        ResourceValue::String {
                            value,
                            translatable
                        } => pb::Value::Str(pb::StringValue {
                            value: value.clone(),
                            translatable: *translatable
                        }),
                        ResourceValue::Plurals(cases) => pb::Value::Plurals(pb::Plurals {
                            cases: cases
                                .iter()
                                .map(|case| pb::PluralCase {
                                    quantity: case.quantity.as_str().to_string(),
                                    value: case.value.clone()
                                })
                                .collect()
                        }),
                        ResourceValue::Raw(raw) => pb::Value::Raw(pb::RawValue {
                            value: raw.clone()
                        }),
                        ResourceValue::Id => pb::Value::Id(pb::Id {})
                    };
                    pb_entry.config_values.push(pb::ConfigValue {
                        config: Some(serialize_config(&config_value.config)),
                        weak: config_value.weak,
                        value: Some(value)
                    });
                }
                pb_type.entries.push(pb_entry);
            }
            pb_package.types.push(pb_type);
        }
        pb_table.packages.push(pb_package);
    }
    pb_table
}

pub fn serialize_compiled_file_to_pb(file: &ResourceFile) -> pb::CompiledFile {
    pb::CompiledFile {
        resource_name: file.name.to_string(),
        config: Some(serialize_config(&file.config)),
        source_path: file.source.clone(),
        exported_ids: file.exported_ids.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resource_types::{ResourceName, ResourceType};
    use prost::Message;

    #[test]
    fn table_round_trips_through_the_wire_format() {
        let mut table = ResourceTable::default();
        table.add_resource(
            "",
            ResourceType::String,
            "hi",
            &ConfigDescription::default(),
            false,
            ResourceValue::String {
                value: "Hi".into(),
                translatable: true
            }
        );
        table.packages[0].id = Some(0x7F);

        let pb_table = serialize_table_to_pb(&table);
        let bytes = pb_table.encode_to_vec();
        let decoded = pb::ResourceTable::decode(bytes.as_slice()).unwrap();
        assert_eq!(decoded, pb_table);
        assert_eq!(decoded.packages[0].package_id, Some(0x7F));
        assert_eq!(decoded.packages[0].types[0].name, "string");
        let config_value = &decoded.packages[0].types[0].entries[0].config_values[0];
        assert!(matches!(
            &config_value.value,
            Some(pb::Value::Str(s)) if s.value == "Hi"
        ));
    }

    #[test]
    fn compiled_file_descriptor_carries_name_config_and_ids() {
        let mut file = ResourceFile::new(
            ResourceName::new(ResourceType::Layout, "main"),
            ConfigDescription::parse("land").unwrap(),
            "res/layout-land/main.xml"
        );
        file.exported_ids.push("title".into());

        let descriptor = serialize_compiled_file_to_pb(&file);
        assert_eq!(descriptor.resource_name, "layout/main");
        assert_eq!(descriptor.config.as_ref().unwrap().qualifiers, "land");
        assert_eq!(descriptor.source_path, "res/layout-land/main.xml");
        assert_eq!(descriptor.exported_ids, vec!["title"]);
    }
}
