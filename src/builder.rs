// Copyright 2025-present Harīṣh Tummalachērla
// SPDX-License-Identifier: Apache-2.0

//! The definition builder: the statement-stream processor that turns one
//! parsed definition into a composite type.
//!
//! The builder keeps one section per message, two per service, and a queued
//! attribute slot. Attributes are queued rather than committed immediately
//! so that a trailing comment block can still become their documentation;
//! the queue is flushed whenever the next comment block (possibly empty)
//! arrives, which also makes freshly declared constants visible to the very
//! next expression.
//!
//! Cross-file references recurse through [`SchemaFile::read`], with the
//! visitor observing each dependency before descent; that is how the
//! namespace reader discovers the transitive closure without walking
//! anything twice.

use std::sync::Arc;

use num_traits::ToPrimitive;
use tracing::{debug, info};

use crate::definition::{DefinitionVisitor, PrintOutputHandler, SchemaFile};
use crate::error::{error, ErrorKind, FrontendError, Result};
use crate::expression::{rational_as_integer, Value, ValueSet};
use crate::grammar::{StatementStreamProcessor, VersionSpec};
use crate::port_id::{is_valid_regulated_service_id, is_valid_regulated_subject_id};
use crate::schema::{SectionBuilder, SerializationMode};
use crate::types::{
    CompositeInfo, CompositeType, Constant, Field, SerializableType, VoidType,
    NAME_COMPONENT_SEPARATOR,
};

pub(crate) struct DefinitionBuilder<'a> {
    definition: &'a SchemaFile,
    lookup_definitions: &'a [Arc<SchemaFile>],
    visitor: Option<&'a dyn DefinitionVisitor>,
    print_handler: Option<&'a PrintOutputHandler>,
    allow_unregulated_fixed_port_id: bool,
    sections: Vec<SectionBuilder>,
    deprecated: bool,
    queued: Option<QueuedAttribute>,
}

enum QueuedAttribute {
    Field { data_type: SerializableType, name: String },
    Padding { void: VoidType },
    Constant { data_type: SerializableType, name: String, value: Value },
}

impl<'a> DefinitionBuilder<'a> {
    pub fn new(
        definition: &'a SchemaFile,
        lookup_definitions: &'a [Arc<SchemaFile>],
        visitor: Option<&'a dyn DefinitionVisitor>,
        print_handler: Option<&'a PrintOutputHandler>,
        allow_unregulated_fixed_port_id: bool,
    ) -> Self {
        DefinitionBuilder {
            definition,
            lookup_definitions,
            visitor,
            print_handler,
            allow_unregulated_fixed_port_id,
            sections: vec![SectionBuilder::new()],
            deprecated: false,
            queued: None,
        }
    }

    /// Assembles the finished composite once the statement stream has ended.
    pub fn finalize(mut self) -> Result<CompositeType> {
        self.flush_queued("")?;
        let full_name = self.definition.full_name().to_string();
        let version = self.definition.version();
        let out = if self.sections.len() == 1 {
            let section = self.sections.pop().expect("exactly one section");
            make_composite(
                section,
                CompositeInfo {
                    full_name,
                    version,
                    deprecated: self.deprecated,
                    fixed_port_id: self.definition.fixed_port_id(),
                    source_file_path: self.definition.file_path().to_path_buf(),
                    has_parent_service: false,
                    doc: String::new(),
                },
            )?
        } else {
            debug_assert_eq!(self.sections.len(), 2);
            let response_section = self.sections.pop().expect("response section");
            let request_section = self.sections.pop().expect("request section");
            let half_info = |suffix: &str, doc: String| CompositeInfo {
                full_name: format!("{}{}{}", full_name, NAME_COMPONENT_SEPARATOR, suffix),
                version,
                deprecated: self.deprecated,
                fixed_port_id: None,
                source_file_path: self.definition.file_path().to_path_buf(),
                has_parent_service: true,
                doc,
            };
            let request_doc = request_section.doc().to_string();
            let response_doc = response_section.doc().to_string();
            let request = make_composite(request_section, half_info("Request", request_doc))?;
            let response = make_composite(response_section, half_info("Response", response_doc))?;
            CompositeType::new_service(
                Arc::new(request),
                Arc::new(response),
                self.definition.fixed_port_id(),
            )?
        };

        if !self.allow_unregulated_fixed_port_id {
            if let Some(port_id) = out.fixed_port_id() {
                let valid = if out.is_service() {
                    is_valid_regulated_service_id(port_id, out.root_namespace())
                } else {
                    is_valid_regulated_subject_id(port_id, out.root_namespace())
                };
                if !valid {
                    return Err(error(
                        ErrorKind::UnregulatedFixedPortId,
                        format!(
                            "regulated port ID {} for {} type '{}' is not valid; \
                             consider using allow_unregulated_fixed_port_id",
                            port_id,
                            if out.is_service() { "service" } else { "message" },
                            out.full_name()
                        ),
                    ));
                }
            }
        }
        Ok(out)
    }

    fn section(&mut self) -> &mut SectionBuilder {
        self.sections.last_mut().expect("at least one section")
    }

    /// Commits the queued attribute, giving it the supplied documentation.
    fn flush_queued(&mut self, doc: &str) -> Result<()> {
        match self.queued.take() {
            None => Ok(()),
            Some(QueuedAttribute::Field { data_type, name }) => {
                let field = Field::new(data_type, &name, doc)?;
                self.section().add_field(field)
            }
            Some(QueuedAttribute::Padding { void }) => {
                self.section().add_field(Field::new_padding(void, doc))
            }
            Some(QueuedAttribute::Constant { data_type, name, value }) => {
                let primitive = match data_type {
                    SerializableType::Primitive(p) => p,
                    other => {
                        return Err(error(
                            ErrorKind::InvalidType,
                            format!("invalid constant type: {}; constants must be primitive", other),
                        ));
                    }
                };
                let constant = Constant::new(primitive, &name, value, doc)?;
                self.section().add_constant(constant);
                Ok(())
            }
        }
    }

    fn queue(&mut self, attribute: QueuedAttribute) -> Result<()> {
        // Past an extent directive the layout is closed; new attributes
        // could invalidate the declared extent.
        if matches!(
            self.section().serialization_mode(),
            Some(SerializationMode::Delimited { .. })
        ) {
            return Err(error(
                ErrorKind::InvalidDirective,
                "the extent directive can only be placed after the last attribute definition",
            ));
        }
        self.flush_queued("")?;
        self.queued = Some(attribute);
        Ok(())
    }

    fn on_print_directive(&mut self, line_number: u32, value: Option<&Value>) {
        let text = value.map(Value::to_string).unwrap_or_default();
        info!(
            "print directive at {}:{}{}",
            self.definition.file_path().display(),
            line_number,
            if text.is_empty() { String::new() } else { format!(": {}", text) },
        );
        if let Some(handler) = self.print_handler {
            handler(self.definition.file_path(), line_number, &text);
        }
    }

    fn on_assert_directive(&mut self, line_number: u32, value: Option<&Value>) -> Result<()> {
        match value {
            Some(Value::Boolean(true)) => {
                debug!(
                    "assertion check successful at {}:{}",
                    self.definition.file_path().display(),
                    line_number,
                );
                Ok(())
            }
            Some(Value::Boolean(false)) => Err(error(
                ErrorKind::AssertionCheckFailure,
                "assertion check has failed",
            )
            .with_line(line_number)),
            Some(other) => Err(error(
                ErrorKind::InvalidDirective,
                format!(
                    "the assertion check expression must yield a boolean, not {}",
                    other.type_name()
                ),
            )),
            None => Err(error(
                ErrorKind::InvalidDirective,
                "the assert directive requires an expression",
            )),
        }
    }

    fn on_extent_directive(&mut self, line_number: u32, value: Option<&Value>) -> Result<()> {
        if let Some(mode) = self.section().serialization_mode() {
            return Err(error(
                ErrorKind::InvalidDirective,
                format!("misplaced extent directive; the serialization mode is already set to {}", mode),
            ));
        }
        match value {
            Some(Value::Rational(r)) => {
                let bits = rational_as_integer(r)?.to_u64().ok_or_else(|| {
                    error(
                        ErrorKind::InvalidExtent,
                        format!("the extent must be a non-negative integer, not {}", r),
                    )
                })?;
                self.section()
                    .set_serialization_mode(SerializationMode::Delimited { extent_bits: bits });
                debug!(
                    "extent set to {} bits at {}:{}",
                    bits,
                    self.definition.file_path().display(),
                    line_number,
                );
                Ok(())
            }
            Some(other) => Err(error(
                ErrorKind::InvalidDirective,
                format!("the extent directive expects a rational, not {}", other.type_name()),
            )),
            None => Err(error(
                ErrorKind::InvalidDirective,
                "the extent directive requires an expression",
            )),
        }
    }

    fn on_sealed_directive(&mut self, value: Option<&Value>) -> Result<()> {
        if let Some(mode) = self.section().serialization_mode() {
            return Err(error(
                ErrorKind::InvalidDirective,
                format!("misplaced sealing directive; the serialization mode is already set to {}", mode),
            ));
        }
        if value.is_some() {
            return Err(error(
                ErrorKind::InvalidDirective,
                "the sealed directive does not expect an expression",
            ));
        }
        self.section().set_serialization_mode(SerializationMode::Sealed);
        Ok(())
    }

    fn on_union_directive(&mut self, value: Option<&Value>) -> Result<()> {
        if value.is_some() {
            return Err(error(
                ErrorKind::InvalidDirective,
                "the union directive does not expect an expression",
            ));
        }
        if self.section().is_union() {
            return Err(error(ErrorKind::InvalidDirective, "duplicated union directive"));
        }
        if self.section().has_attributes() {
            return Err(error(
                ErrorKind::InvalidDirective,
                "the union directive must be placed before the first attribute definition",
            ));
        }
        self.section().make_union();
        Ok(())
    }

    fn on_deprecated_directive(&mut self, value: Option<&Value>) -> Result<()> {
        if value.is_some() {
            return Err(error(
                ErrorKind::InvalidDirective,
                "the deprecated directive does not expect an expression",
            ));
        }
        if self.deprecated {
            return Err(error(ErrorKind::InvalidDirective, "duplicated deprecated directive"));
        }
        if self.sections.len() > 1 {
            return Err(error(
                ErrorKind::InvalidDirective,
                "the deprecated directive cannot be placed in the response section",
            ));
        }
        if self.section().has_attributes() {
            return Err(error(
                ErrorKind::InvalidDirective,
                "the deprecated directive must be placed before the first attribute definition",
            ));
        }
        self.deprecated = true;
        Ok(())
    }
}

impl StatementStreamProcessor for DefinitionBuilder<'_> {
    fn on_header_comment(&mut self, comment: &str) -> Result<()> {
        self.section().set_comment(comment);
        Ok(())
    }

    fn on_attribute_comment(&mut self, comment: &str) -> Result<()> {
        self.flush_queued(comment)
    }

    fn on_constant(&mut self, constant_type: SerializableType, name: &str, value: Value) -> Result<()> {
        self.queue(QueuedAttribute::Constant {
            data_type: constant_type,
            name: name.to_string(),
            value,
        })
    }

    fn on_field(&mut self, field_type: SerializableType, name: &str) -> Result<()> {
        self.queue(QueuedAttribute::Field {
            data_type: field_type,
            name: name.to_string(),
        })
    }

    fn on_padding_field(&mut self, void_type: VoidType) -> Result<()> {
        self.queue(QueuedAttribute::Padding { void: void_type })
    }

    fn on_directive(&mut self, line_number: u32, name: &str, value: Option<Value>) -> Result<()> {
        match name {
            "print" => {
                self.on_print_directive(line_number, value.as_ref());
                Ok(())
            }
            "assert" => self.on_assert_directive(line_number, value.as_ref()),
            "extent" => self.on_extent_directive(line_number, value.as_ref()),
            "sealed" => self.on_sealed_directive(value.as_ref()),
            "union" => self.on_union_directive(value.as_ref()),
            "deprecated" => self.on_deprecated_directive(value.as_ref()),
            _ => Err(error(
                ErrorKind::InvalidDirective,
                format!("unknown directive: '@{}'", name),
            )),
        }
    }

    fn on_service_response_marker(&mut self) -> Result<()> {
        self.flush_queued("")?;
        if self.sections.len() > 1 {
            return Err(error(ErrorKind::DsdlSyntax, "duplicated service response marker"));
        }
        self.sections.push(SectionBuilder::new());
        Ok(())
    }

    fn resolve_top_level_identifier(&mut self, name: &str) -> Result<Value> {
        // Only the current section is visible; lookups never cross the
        // service request/response boundary.
        for constant in self.section().constants() {
            if constant.name() == name {
                return Ok(constant.value().clone());
            }
        }
        if name == "_offset_" {
            let offsets = self.section().offset();
            return Ok(Value::Set(ValueSet::new(offsets.iter().map(Value::integer))?));
        }
        Err(error(
            ErrorKind::UndefinedIdentifier,
            format!("undefined identifier: '{}'", name),
        ))
    }

    fn resolve_versioned_data_type(
        &mut self,
        name: &str,
        version: VersionSpec,
    ) -> Result<Arc<CompositeType>> {
        let full_name = if name.contains(NAME_COMPONENT_SEPARATOR) {
            name.to_string()
        } else {
            let reconstructed = format!(
                "{}{}{}",
                self.definition.full_namespace(),
                NAME_COMPONENT_SEPARATOR,
                name
            );
            debug!("relatively referred type '{}' reconstructed as '{}'", name, reconstructed);
            reconstructed
        };

        let mut matching: Vec<&Arc<SchemaFile>> = self
            .lookup_definitions
            .iter()
            .filter(|d| d.full_name() == full_name && d.version().major == version.major)
            .filter(|d| version.minor.map_or(true, |m| d.version().minor == m))
            .collect();
        // Newest minor wins when the reference does not pin one.
        matching.sort_by_key(|d| std::cmp::Reverse(d.version().minor));

        let target = match matching.as_slice() {
            [] => return Err(self.undefined_data_type(&full_name, version)),
            [single] => *single,
            [first, second, ..] => {
                if first.version() == second.version() {
                    return Err(FrontendError::internal(format!(
                        "conflicting definitions of {}.{}",
                        full_name,
                        first.version()
                    )));
                }
                *first
            }
        };

        if let Some(visitor) = self.visitor {
            visitor.on_dependency(self.definition, target)?;
        }
        target.read(
            self.lookup_definitions,
            self.visitor,
            self.print_handler,
            self.allow_unregulated_fixed_port_id,
        )
    }
}

impl DefinitionBuilder<'_> {
    fn undefined_data_type(&self, full_name: &str, version: VersionSpec) -> FrontendError {
        let mut lookup_namespaces: Vec<&str> = self
            .lookup_definitions
            .iter()
            .map(|d| d.root_namespace())
            .collect();
        lookup_namespaces.sort_unstable();
        lookup_namespaces.dedup();

        let version_text = match version.minor {
            Some(minor) => format!("{}.{}", version.major, minor),
            None => format!("{}", version.major),
        };
        let mut message = format!(
            "data type {}.{} could not be found in the following root namespaces: {}.",
            full_name,
            version_text,
            if lookup_namespaces.is_empty() {
                "(empty set)".to_string()
            } else {
                lookup_namespaces.join(", ")
            },
        );

        // A common mistake is pointing the root at the parent directory of
        // the intended namespace; detect it and suggest the fix.
        let requested_root = full_name
            .split(NAME_COMPONENT_SEPARATOR)
            .next()
            .unwrap_or_default();
        let own_components = self.definition.name_components();
        let sub_root = (own_components.len() > 2).then(|| own_components[1]);
        if !lookup_namespaces.contains(&requested_root) && sub_root == Some(requested_root) {
            message += &format!(
                " Did you mean to use the directory {} instead of {}?",
                self.definition.root_namespace_path().join(requested_root).display(),
                self.definition.root_namespace_path().display(),
            );
        } else {
            message += " Please make sure that you specified the directories correctly.";
        }
        error(ErrorKind::UndefinedDataType, message)
    }
}

/// Builds the composite of one section, applying the serialization mode.
fn make_composite(section: SectionBuilder, mut info: CompositeInfo) -> Result<CompositeType> {
    let mode = section.serialization_mode();
    let is_union = section.is_union();
    if info.doc.is_empty() {
        info.doc = section.doc().to_string();
    }
    let inner = if is_union {
        CompositeType::new_union(info, section.into_attributes())?
    } else {
        CompositeType::new_structure(info, section.into_attributes())?
    };
    match mode {
        Some(SerializationMode::Delimited { extent_bits }) => {
            let out = CompositeType::new_delimited(Arc::new(inner), extent_bits)?;
            debug!("{} wrapped into a delimited container with extent {} bits", out, extent_bits);
            Ok(out)
        }
        Some(SerializationMode::Sealed) => Ok(inner),
        None => Err(error(
            ErrorKind::MissingSerializationMode,
            format!(
                "{}: either @sealed or @extent is required; the smallest valid extent for this \
                 type (i.e. its max bit length) is {} bits ({} bytes); if you are not sure what \
                 this means, add the following line near the end of this definition: @extent {} * 8",
                inner.short_name(),
                inner.extent(),
                inner.extent() / 8,
                suggest_extent_in_bytes(&inner),
            ),
        )),
    }
}

/// A heuristic intended to lower the entry barrier for newcomers; the
/// numbers may change between releases.
fn suggest_extent_in_bytes(model: &CompositeType) -> u64 {
    (model.extent() * 2 / 8).max(64)
}
