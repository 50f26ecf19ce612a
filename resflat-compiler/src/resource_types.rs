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

// Names that identify resources across the toolchain. A resource type is
// either the directory kind of a file resource (layout, drawable, raw, ...)
// or the element kind of a value resource (string, plurals, bool, ...);
// both come out of the same table so `<item type="...">` and directory
// tokens share one parser.

use std::fmt;

use crate::config::ConfigDescription;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceType {
    Anim,
    Animator,
    Bool,
    Color,
    Dimen,
    Drawable,
    Font,
    Fraction,
    Id,
    Integer,
    Interpolator,
    Layout,
    Menu,
    Mipmap,
    Navigation,
    Plurals,
    Raw,
    String,
    Transition,
    Xml
}

impl ResourceType {
    pub fn parse(name: &str) -> Option<ResourceType> {
        match name {
            "anim" => Some(ResourceType::Anim),
            "animator" => Some(ResourceType::Animator),
            "bool" => Some(ResourceType::Bool),
            "color" => Some(ResourceType::Color),
            "dimen" => Some(ResourceType::Dimen),
            "drawable" => Some(ResourceType::Drawable),
            "font" => Some(ResourceType::Font),
            "fraction" => Some(ResourceType::Fraction),
            "id" => Some(ResourceType::Id),
            "integer" => Some(ResourceType::Integer),
            "interpolator" => Some(ResourceType::Interpolator),
            "layout" => Some(ResourceType::Layout),
            "menu" => Some(ResourceType::Menu),
            "mipmap" => Some(ResourceType::Mipmap),
            "navigation" => Some(ResourceType::Navigation),
            "plurals" => Some(ResourceType::Plurals),
            "raw" => Some(ResourceType::Raw),
            "string" => Some(ResourceType::String),
            "transition" => Some(ResourceType::Transition),
            "xml" => Some(ResourceType::Xml),
            _ => None
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceType::Anim => "anim",
            ResourceType::Animator => "animator",
            ResourceType::Bool => "bool",
            ResourceType::Color => "color",
            ResourceType::Dimen => "dimen",
            ResourceType::Drawable => "drawable",
            ResourceType::Font => "font",
            ResourceType::Fraction => "fraction",
            ResourceType::Id => "id",
            ResourceType::Integer => "integer",
            ResourceType::Interpolator => "interpolator",
            ResourceType::Layout => "layout",
            ResourceType::Menu => "menu",
            ResourceType::Mipmap => "mipmap",
            ResourceType::Navigation => "navigation",
            ResourceType::Plurals => "plurals",
            ResourceType::Raw => "raw",
            ResourceType::String => "string",
            ResourceType::Transition => "transition",
            ResourceType::Xml => "xml"
        }
    }
}

/// Fully qualified resource name: `[package:]type/entry`. The package is
/// empty during compilation; the linker fills it in.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ResourceName {
    pub package: String,
    pub res_type: ResourceType,
    pub entry: String
}

impl ResourceName {
    pub fn new(res_type: ResourceType, entry: &str) -> ResourceName {
        ResourceName {
            package: String::new(),
            res_type,
            entry: entry.into()
        }
    }
}

impl fmt::Display for ResourceName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !self.package.is_empty() {
            write!(f, "{}:", self.package)?;
        }
        write!(f, "{}/{}", self.res_type.as_str(), self.entry)
    }
}

/// Metadata attached to every non-values artifact: which resource the file
/// defines, under which configuration, and where it came from.
#[derive(Debug, Clone)]
pub struct ResourceFile {
    pub name: ResourceName,
    pub config: ConfigDescription,
    pub source: String,
    /// Ids defined inline via `@+id/name` attribute values.
    pub exported_ids: Vec<String>
}

impl ResourceFile {
    pub fn new(name: ResourceName, config: ConfigDescription, source: &str) -> ResourceFile {
        ResourceFile {
            name,
            config,
            source: source.into(),
            exported_ids: vec![]
        }
    }
}
