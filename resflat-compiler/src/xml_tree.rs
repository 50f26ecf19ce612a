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

// Layout/drawable XML is inflated into an owned tree before flattening so
// that inline `<aapt:attr>` fragments can be cut out and re-rooted as
// documents of their own. Namespace scoping is preserved on the elements
// that declared it.

use std::collections::HashSet;
use std::io::Read;

use resflat_common::{ResError, Result};
use xml::{reader::XmlEvent, EventReader};

use crate::resource_types::{ResourceFile, ResourceName};

/// Namespace URI that marks compiler-directive elements such as
/// `<aapt:attr>`.
pub const AAPT_NAMESPACE: &str = "http://schemas.android.com/aapt";

/// An XML document plus the resource it defines.
#[derive(Debug)]
pub struct XmlResource {
    pub file: ResourceFile,
    pub root: XmlElement
}

#[derive(Debug, Clone)]
pub struct XmlElement {
    pub namespace_uri: Option<String>,
    pub prefix: Option<String>,
    pub name: String,
    /// Namespaces first declared on this element, in document order.
    pub namespace_decls: Vec<XmlNamespaceDecl>,
    pub attributes: Vec<XmlAttribute>,
    pub children: Vec<XmlNode>
}

#[derive(Debug, Clone)]
pub enum XmlNode {
    Element(XmlElement),
    Text(String)
}

#[derive(Debug, Clone)]
pub struct XmlNamespaceDecl {
    pub prefix: String,
    pub uri: String
}

#[derive(Debug, Clone)]
pub struct XmlAttribute {
    pub namespace_uri: Option<String>,
    pub prefix: Option<String>,
    pub name: String,
    pub value: String
}

/// Inflates a whole document into a tree, returning its root element.
pub fn inflate<R: Read>(input: R) -> Result<XmlElement> {
    let mut reader = EventReader::new(input);
    let mut stack: Vec<XmlElement> = vec![];
    let mut seen_namespaces: HashSet<String> = HashSet::new();

    loop {
        match reader.next()? {
            XmlEvent::StartElement {
                name,
                attributes,
                namespace
            } => {
                let mut namespace_decls = vec![];
                for ns in namespace.iter() {
                    // The reader reports the full in-scope set; only record
                    // each namespace on the first element that brought it
                    // into scope. The xml/xmlns pseudo-namespaces never
                    // reach the output.
                    if ns.0.is_empty() || ns.0 == "xml" || ns.0 == "xmlns" {
                        continue;
                    }
                    if seen_namespaces.contains(ns.0) {
                        continue;
                    }
                    seen_namespaces.insert(ns.0.to_string());
                    namespace_decls.push(XmlNamespaceDecl {
                        prefix: ns.0.to_string(),
                        uri: ns.1.to_string()
                    });
                }

                stack.push(XmlElement {
                    namespace_uri: name.namespace,
                    prefix: name.prefix,
                    name: name.local_name,
                    namespace_decls,
                    attributes: attributes
                        .into_iter()
                        .map(|attr| XmlAttribute {
                            namespace_uri: attr.name.namespace,
                            prefix: attr.name.prefix,
                            name: attr.name.local_name,
                            value: attr.value
                        })
                        .collect(),
                    children: vec![]
                });
            }
            XmlEvent::EndElement { .. } => {
                let element = stack.pop().expect("well-formed document");
                match stack.last_mut() {
                    Some(parent) => parent.children.push(XmlNode::Element(element)),
                    None => return Ok(element)
                }
            }
            XmlEvent::Characters(text) | XmlEvent::CData(text) => {
                if let Some(parent) = stack.last_mut() {
                    parent.children.push(XmlNode::Text(text));
                }
            }
            XmlEvent::EndDocument => {
                return Err(ResError::ValuesParsingFailed(
                    "document has no root element".into()
                ))
            }
            _ => {}
        }
    }
}

/// Registers every `@+id/name` attribute value as an id this document
/// defines.
pub fn collect_ids(res: &mut XmlResource) {
    fn walk(element: &XmlElement, ids: &mut Vec<String>) {
        for attr in &element.attributes {
            if let Some(id) = attr.value.strip_prefix("@+id/") {
                if !id.is_empty() && !ids.iter().any(|existing| existing == id) {
                    ids.push(id.to_string());
                }
            }
        }
        for child in &element.children {
            if let XmlNode::Element(child) = child {
                walk(child, ids);
            }
        }
    }
    let mut ids = vec![];
    walk(&res.root, &mut ids);
    res.file.exported_ids = ids;
}

/// Cuts `<aapt:attr name="...">` children out of the document.
///
/// Each becomes a document of its own, rooted at the single element child
/// of the directive; the parent gets the named attribute back as a
/// reference to the synthesized resource. Fragments nested inside extracted
/// fragments are processed too. Returned documents are in document order.
pub fn extract_inline_xml(res: &mut XmlResource) -> Result<Vec<XmlResource>> {
    let mut extracted = vec![];
    let mut sequence = 1u32;
    let file = res.file.clone();
    extract_from_element(&mut res.root, &file, &mut sequence, &mut vec![], &mut extracted)?;
    Ok(extracted)
}

fn extract_from_element(
    element: &mut XmlElement,
    parent_file: &ResourceFile,
    sequence: &mut u32,
    scope: &mut Vec<XmlNamespaceDecl>,
    out: &mut Vec<XmlResource>
) -> Result<()> {
    let scope_depth = scope.len();
    scope.extend(element.namespace_decls.iter().cloned());

    let mut index = 0;
    while index < element.children.len() {
        let is_directive = match &element.children[index] {
            XmlNode::Element(child) => {
                child.namespace_uri.as_deref() == Some(AAPT_NAMESPACE) && child.name == "attr"
            }
            XmlNode::Text(_) => false
        };
        if !is_directive {
            if let XmlNode::Element(child) = &mut element.children[index] {
                extract_from_element(child, parent_file, sequence, scope, out)?;
            }
            index += 1;
            continue;
        }

        let XmlNode::Element(directive) = element.children.remove(index) else {
            unreachable!()
        };
        let target = directive.attributes.iter().find(|a| a.name == "name").cloned();
        let Some(target) = target else {
            return Err(inline_error(parent_file, "<aapt:attr> is missing the 'name' attribute"));
        };

        let mut roots: Vec<XmlElement> = directive
            .children
            .into_iter()
            .filter_map(|node| match node {
                XmlNode::Element(child) => Some(child),
                XmlNode::Text(_) => None
            })
            .collect();
        if roots.len() != 1 {
            return Err(inline_error(
                parent_file,
                "<aapt:attr> must contain exactly one child element"
            ));
        }
        let mut sub_root = roots.pop().unwrap();

        // The attribute name is written as it would appear inline, eg.
        // `android:drawable`; resolve its prefix against the scope here.
        let (attr_prefix, attr_namespace, attr_name) = match target.value.split_once(':') {
            Some((prefix, local)) => {
                let uri = scope
                    .iter()
                    .rev()
                    .find(|decl| decl.prefix == prefix)
                    .map(|decl| decl.uri.clone())
                    .ok_or_else(|| {
                        inline_error(
                            parent_file,
                            &format!("unknown namespace prefix '{}' in <aapt:attr>", prefix)
                        )
                    })?;
                (Some(prefix.to_string()), Some(uri), local.to_string())
            }
            None => (None, None, target.value.clone())
        };

        if element
            .attributes
            .iter()
            .any(|a| a.name == attr_name && a.namespace_uri == attr_namespace)
        {
            return Err(inline_error(
                parent_file,
                &format!("parent already defines attribute '{}'", target.value)
            ));
        }

        let sub_name = ResourceName {
            package: parent_file.name.package.clone(),
            res_type: parent_file.name.res_type,
            entry: format!("{}_{}", parent_file.name.entry, sequence)
        };
        *sequence += 1;

        element.attributes.push(XmlAttribute {
            namespace_uri: attr_namespace,
            prefix: attr_prefix,
            name: attr_name,
            value: format!("@{}/{}", sub_name.res_type.as_str(), sub_name.entry)
        });

        // A fragment may use namespaces declared on its former ancestors;
        // re-declare the in-scope set on the new root.
        let mut decls: Vec<XmlNamespaceDecl> = vec![];
        for decl in scope.iter() {
            if decl.uri == AAPT_NAMESPACE {
                continue;
            }
            if !decls.iter().any(|d: &XmlNamespaceDecl| d.prefix == decl.prefix) {
                decls.push(decl.clone());
            }
        }
        decls.extend(
            sub_root
                .namespace_decls
                .drain(..)
                .filter(|d| d.uri != AAPT_NAMESPACE)
        );
        sub_root.namespace_decls = decls;

        let mut sub_resource = XmlResource {
            file: ResourceFile::new(sub_name, parent_file.config.clone(), &parent_file.source),
            root: sub_root
        };
        collect_ids(&mut sub_resource);

        // Recurse into the fragment before appending so nested fragments
        // land right after their parent, keeping document order.
        let mut nested = extract_inline_xml(&mut sub_resource)?;
        out.push(sub_resource);
        out.append(&mut nested);
        // The directive's slot was removed; do not advance.
    }

    scope.truncate(scope_depth);
    Ok(())
}

fn inline_error(file: &ResourceFile, message: &str) -> ResError {
    ResError::ValuesParsingFailed(format!("{}: {}", file.source, message))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ConfigDescription;
    use crate::resource_types::ResourceType;
    use std::io::Cursor;

    fn layout_resource(input: &str) -> XmlResource {
        let root = inflate(Cursor::new(input.as_bytes())).unwrap();
        XmlResource {
            file: ResourceFile::new(
                ResourceName::new(ResourceType::Layout, "main"),
                ConfigDescription::default(),
                "res/layout/main.xml"
            ),
            root
        }
    }

    #[test]
    fn inflates_nested_elements_with_namespaces() {
        let root = inflate(Cursor::new(
            br#"<LinearLayout xmlns:android="http://schemas.android.com/apk/res/android"
                              android:orientation="vertical">
                  <TextView android:text="hi"/>
                </LinearLayout>"# as &[u8]
        ))
        .unwrap();
        assert_eq!(root.name, "LinearLayout");
        assert_eq!(root.namespace_decls.len(), 1);
        assert_eq!(root.namespace_decls[0].prefix, "android");
        assert_eq!(root.attributes[0].prefix.as_deref(), Some("android"));
        assert_eq!(root.children.len(), 1);
    }

    #[test]
    fn collects_defined_ids_once() {
        let mut res = layout_resource(
            r#"<LinearLayout xmlns:android="http://schemas.android.com/apk/res/android">
                 <View android:id="@+id/first"/>
                 <View android:id="@+id/second"/>
                 <View android:id="@+id/first"/>
                 <View android:id="@id/referenced_not_defined"/>
               </LinearLayout>"#
        );
        collect_ids(&mut res);
        assert_eq!(res.file.exported_ids, vec!["first", "second"]);
    }

    #[test]
    fn extracts_inline_fragment_and_rewrites_parent() {
        let mut res = layout_resource(
            r#"<View xmlns:aapt="http://schemas.android.com/aapt">
                 <aapt:attr name="background">
                   <shape/>
                 </aapt:attr>
               </View>"#
        );
        let extracted = extract_inline_xml(&mut res).unwrap();
        assert_eq!(extracted.len(), 1);
        assert_eq!(extracted[0].root.name, "shape");
        assert_eq!(extracted[0].file.name.entry, "main_1");

        // The directive is gone and the parent got the attribute back as a
        // reference.
        assert!(res.root.children.is_empty());
        let attr = &res.root.attributes[0];
        assert_eq!(attr.name, "background");
        assert_eq!(attr.value, "@layout/main_1");
    }

    #[test]
    fn nested_fragments_extract_recursively_in_document_order() {
        let mut res = layout_resource(
            r#"<View xmlns:aapt="http://schemas.android.com/aapt">
                 <aapt:attr name="background">
                   <shape>
                     <aapt:attr name="inner">
                       <color/>
                     </aapt:attr>
                   </shape>
                 </aapt:attr>
                 <aapt:attr name="foreground">
                   <ripple/>
                 </aapt:attr>
               </View>"#
        );
        let extracted = extract_inline_xml(&mut res).unwrap();
        let entries: Vec<&str> = extracted
            .iter()
            .map(|doc| doc.root.name.as_str())
            .collect();
        assert_eq!(entries, vec!["shape", "color", "ripple"]);
        assert_eq!(res.root.attributes.len(), 2);
    }

    #[test]
    fn prefixed_attr_names_resolve_against_scope() {
        let mut res = layout_resource(
            r#"<View xmlns:android="http://schemas.android.com/apk/res/android"
                     xmlns:aapt="http://schemas.android.com/aapt">
                 <aapt:attr name="android:background">
                   <shape/>
                 </aapt:attr>
               </View>"#
        );
        extract_inline_xml(&mut res).unwrap();
        let attr = &res.root.attributes[0];
        assert_eq!(attr.prefix.as_deref(), Some("android"));
        assert_eq!(
            attr.namespace_uri.as_deref(),
            Some("http://schemas.android.com/apk/res/android")
        );
    }

    #[test]
    fn malformed_directives_are_rejected() {
        let mut empty = layout_resource(
            r#"<View xmlns:aapt="http://schemas.android.com/aapt">
                 <aapt:attr name="background"></aapt:attr>
               </View>"#
        );
        assert!(extract_inline_xml(&mut empty).is_err());

        let mut duplicate = layout_resource(
            r#"<View xmlns:aapt="http://schemas.android.com/aapt" background="red">
                 <aapt:attr name="background">
                   <shape/>
                 </aapt:attr>
               </View>"#
        );
        assert!(extract_inline_xml(&mut duplicate).is_err());
    }
}
