// Copyright 2025-present Harīṣh Tummalachērla
// SPDX-License-Identifier: Apache-2.0

//! Composite types: structures, unions, delimited containers, and services.
//!
//! A composite is what one definition file produces. All four kinds share
//! the same metadata (name, version, attributes, deprecation, port ID) and
//! differ in layout:
//!
//! - a structure concatenates its fields, padding each to its alignment;
//! - a union holds exactly one variant behind an implicit tag, so its length
//!   set is the union of the variants' sets plus the tag;
//! - a delimited container wraps a non-sealed composite in an opaque
//!   length-prefixed envelope, deliberately forgetting the inner layout so
//!   that future minor versions can change it without breaking containing
//!   types;
//! - a service is a pair of composites (request and response) and has no
//!   serialized representation of its own.
//!
//! Field offsets come out of the same algebra that produces the length sets,
//! which is what lets code generators prove byte alignment of nested fields
//! without runtime bit-shifting.

use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::bit_length_set::BitLengthSet;
use crate::error::{error, ErrorKind, FrontendError, Result};
use crate::port_id::{MAX_SERVICE_ID, MAX_SUBJECT_ID};
use crate::types::attribute::{Attribute, Constant, Field};
use crate::types::check_name;
use crate::types::primitive::{CastMode, PrimitiveType};
use crate::types::{SerializableType, BITS_PER_BYTE};

/// Maximum length of a full type name, in characters.
pub const MAX_NAME_LENGTH: usize = 255;

/// Separator of name components, as in `uavcan.node.Heartbeat`.
pub const NAME_COMPONENT_SEPARATOR: char = '.';

const DELIMITER_HEADER_BIT_LENGTH: u64 = 32;

/// A data type version number pair. The zero-zero version is invalid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Version {
    pub major: u8,
    pub minor: u8,
}

impl Version {
    pub fn new(major: u8, minor: u8) -> Self {
        Version { major, minor }
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)
    }
}

/// The metadata shared by every composite kind, fixed before the attributes
/// are interpreted.
#[derive(Debug, Clone)]
pub struct CompositeInfo {
    pub full_name: String,
    pub version: Version,
    pub deprecated: bool,
    pub fixed_port_id: Option<u32>,
    pub source_file_path: PathBuf,
    pub has_parent_service: bool,
    pub doc: String,
}

/// Distinguishes the four composite kinds and carries kind-specific layout.
#[derive(Debug, Clone, PartialEq)]
pub enum CompositeKind {
    Structure,
    Union {
        /// The unsigned integer type of the implicit union tag. The set of
        /// valid tag values is a subset of that of this type.
        tag_field_type: PrimitiveType,
    },
    Delimited {
        /// The wrapped appendable composite; its layout entities are
        /// computed as if it were sealed.
        inner: Arc<CompositeType>,
        /// Explicit extent from `@extent`, in bits; a multiple of the
        /// alignment requirement and at least the inner extent.
        extent: u64,
        /// The integer prefix encoding the size of the serialized inner
        /// representation.
        delimiter_header_type: PrimitiveType,
    },
    Service {
        request: Arc<CompositeType>,
        response: Arc<CompositeType>,
    },
}

/// A composite data type produced from one definition.
#[derive(Debug, Clone, PartialEq)]
pub struct CompositeType {
    full_name: String,
    version: Version,
    attributes: Vec<Attribute>,
    deprecated: bool,
    fixed_port_id: Option<u32>,
    source_file_path: PathBuf,
    has_parent_service: bool,
    doc: String,
    kind: CompositeKind,
    alignment_requirement: u64,
    // For services this holds a placeholder; is_service() guards every use.
    bit_length_set: BitLengthSet,
}

impl CompositeType {
    /// A message type that is not marked `@union`.
    pub fn new_structure(info: CompositeInfo, attributes: Vec<Attribute>) -> Result<Self> {
        let alignment = alignment_over_fields(&attributes);
        let field_types = field_data_types(&attributes);
        let bit_length_set =
            aggregate_structure_bit_length_sets(&field_types).pad_to_alignment(alignment);
        let out = CompositeType {
            kind: CompositeKind::Structure,
            alignment_requirement: alignment,
            bit_length_set,
            full_name: info.full_name,
            version: info.version,
            attributes,
            deprecated: info.deprecated,
            fixed_port_id: info.fixed_port_id,
            source_file_path: info.source_file_path,
            has_parent_service: info.has_parent_service,
            doc: info.doc,
        };
        out.validate_common(false)?;
        debug_assert!(out.bit_length_set.is_aligned_at(out.alignment_requirement));
        Ok(out)
    }

    /// A message type marked `@union`.
    pub fn new_union(info: CompositeInfo, attributes: Vec<Attribute>) -> Result<Self> {
        let fields: Vec<&Field> = attributes.iter().filter_map(Attribute::as_field).collect();
        if fields.len() < 2 {
            return Err(error(
                ErrorKind::MalformedUnion,
                "a tagged union cannot contain fewer than 2 variants",
            ));
        }
        if fields.iter().any(|f| f.is_padding()) {
            return Err(error(
                ErrorKind::MalformedUnion,
                "padding fields are not allowed in unions",
            ));
        }
        let alignment = alignment_over_fields(&attributes);
        let field_types = field_data_types(&attributes);
        let tag_bits = union_tag_bit_length(&field_types);
        let tag_field_type = PrimitiveType::unsigned_integer(tag_bits as u8, CastMode::Truncated)
            .expect("tag width is always a valid unsigned integer width");
        let bit_length_set =
            aggregate_union_bit_length_sets(&field_types).pad_to_alignment(alignment);
        let out = CompositeType {
            kind: CompositeKind::Union { tag_field_type },
            alignment_requirement: alignment,
            bit_length_set,
            full_name: info.full_name,
            version: info.version,
            attributes,
            deprecated: info.deprecated,
            fixed_port_id: info.fixed_port_id,
            source_file_path: info.source_file_path,
            has_parent_service: info.has_parent_service,
            doc: info.doc,
        };
        out.validate_common(false)?;
        debug_assert!(out.bit_length_set.is_aligned_at(out.alignment_requirement));
        Ok(out)
    }

    /// Wraps a non-sealed composite in the delimited envelope. Most metadata
    /// is copied from the wrapped type; only the layout-related entities are
    /// replaced.
    pub fn new_delimited(inner: Arc<CompositeType>, extent: u64) -> Result<Self> {
        let alignment = inner.alignment_requirement;
        if extent % alignment != 0 {
            return Err(error(
                ErrorKind::InvalidExtent,
                format!("the specified extent of {} bits is not a multiple of {} bits", extent, alignment),
            ));
        }
        if extent < inner.extent() {
            return Err(error(
                ErrorKind::InvalidExtent,
                format!(
                    "the specified extent of {} bits is too small for this data type; \
                     either compactify the data type or increase the extent at least to {} bits \
                     (beware that the latter option may break wire compatibility)",
                    extent,
                    inner.extent()
                ),
            ));
        }

        // Widened so that the header never breaks the alignment of the
        // composite that follows it.
        let header_bits = DELIMITER_HEADER_BIT_LENGTH.max(alignment);
        let delimiter_header_type =
            PrimitiveType::unsigned_integer(header_bits as u8, CastMode::Truncated)
                .expect("header width is always a valid unsigned integer width");

        // Nothing can be assumed about future minor revisions of the inner
        // type except the extent bound, so the length set is synthetic:
        // the header plus every aligned length up to the extent.
        let bit_length_set =
            header_bits + &BitLengthSet::single(alignment).repeat_range(extent / alignment);

        let out = CompositeType {
            full_name: inner.full_name.clone(),
            version: inner.version,
            attributes: inner.attributes.clone(),
            deprecated: inner.deprecated,
            fixed_port_id: inner.fixed_port_id,
            source_file_path: inner.source_file_path.clone(),
            has_parent_service: inner.has_parent_service,
            doc: inner.doc.clone(),
            kind: CompositeKind::Delimited {
                inner,
                extent,
                delimiter_header_type,
            },
            alignment_requirement: alignment,
            bit_length_set,
        };
        out.validate_common(false)?;
        debug_assert!(out.extent() % BITS_PER_BYTE == 0);
        debug_assert!(out.bit_length_set.is_aligned_at(alignment));
        debug_assert!(out.extent() >= out.inner_type().extent());
        Ok(out)
    }

    /// A service type: a pair of message composites named `Request` and
    /// `Response` under the service's name. Not serializable itself.
    pub fn new_service(
        request: Arc<CompositeType>,
        response: Arc<CompositeType>,
        fixed_port_id: Option<u32>,
    ) -> Result<Self> {
        let name = request.full_namespace().to_string();
        let consistent = request.full_name.starts_with(&name)
            && response.full_name.starts_with(&name)
            && request.version == response.version
            && !request.is_service()
            && !response.is_service()
            && request.deprecated == response.deprecated
            && request.source_file_path == response.source_file_path
            && request.fixed_port_id.is_none()
            && response.fixed_port_id.is_none()
            && request.has_parent_service
            && response.has_parent_service;
        if !consistent {
            return Err(FrontendError::internal(
                "service request/response type consistency error",
            ));
        }

        let doc = request.doc.clone();
        let version = request.version;
        let deprecated = request.deprecated;
        let source_file_path = request.source_file_path.clone();
        let attributes = vec![
            Attribute::Field(Field::new(
                SerializableType::Composite(Arc::clone(&request)),
                "request",
                "",
            )?),
            Attribute::Field(Field::new(
                SerializableType::Composite(Arc::clone(&response)),
                "response",
                "",
            )?),
        ];
        let alignment = alignment_over_fields(&attributes);
        let out = CompositeType {
            full_name: name,
            version,
            attributes,
            deprecated,
            fixed_port_id,
            source_file_path,
            has_parent_service: false,
            doc,
            kind: CompositeKind::Service { request, response },
            alignment_requirement: alignment,
            bit_length_set: BitLengthSet::single(0),
        };
        out.validate_common(true)?;
        Ok(out)
    }

    fn validate_common(&self, is_service: bool) -> Result<()> {
        let name = self.full_name.trim();
        if name.is_empty() {
            return Err(error(ErrorKind::InvalidName, "composite type name cannot be empty"));
        }
        if !name.contains(NAME_COMPONENT_SEPARATOR) {
            return Err(error(ErrorKind::InvalidName, "root namespace is not specified"));
        }
        if name.len() > MAX_NAME_LENGTH {
            return Err(error(
                ErrorKind::InvalidName,
                format!("name is too long: '{}' is longer than {} characters", name, MAX_NAME_LENGTH),
            ));
        }
        for component in name.split(NAME_COMPONENT_SEPARATOR) {
            check_name(component)?;
        }

        if u16::from(self.version.major) + u16::from(self.version.minor) == 0 {
            return Err(error(
                ErrorKind::InvalidVersion,
                format!("invalid version numbers: {}", self.version),
            ));
        }

        let mut used_names: std::collections::HashSet<&str> = std::collections::HashSet::new();
        for a in &self.attributes {
            if !a.name().is_empty() && !used_names.insert(a.name()) {
                return Err(error(
                    ErrorKind::AttributeNameCollision,
                    format!("multiple attributes under the same name: '{}'", a.name()),
                ));
            }
        }

        if let Some(port_id) = self.fixed_port_id {
            let max = if is_service { MAX_SERVICE_ID } else { MAX_SUBJECT_ID };
            if port_id > max {
                return Err(error(
                    ErrorKind::InvalidFixedPortId,
                    format!(
                        "fixed {} ID {} is not valid",
                        if is_service { "service" } else { "subject" },
                        port_id
                    ),
                ));
            }
        }

        // A non-deprecated type cannot depend on deprecated types;
        // a deprecated type can depend on anything.
        if !self.deprecated {
            for a in &self.attributes {
                if let SerializableType::Composite(c) = a.data_type() {
                    if c.deprecated {
                        return Err(error(
                            ErrorKind::DeprecatedDependency,
                            "a type cannot depend on deprecated types unless it is also deprecated",
                        ));
                    }
                }
            }
        }
        Ok(())
    }

    /// The full name, e.g. `uavcan.node.Heartbeat`.
    pub fn full_name(&self) -> &str {
        &self.full_name
    }

    /// Components of the full name, e.g. `["uavcan", "node", "Heartbeat"]`.
    pub fn name_components(&self) -> Vec<&str> {
        self.full_name.split(NAME_COMPONENT_SEPARATOR).collect()
    }

    /// The last name component, e.g. `Heartbeat`.
    pub fn short_name(&self) -> &str {
        self.full_name
            .rsplit(NAME_COMPONENT_SEPARATOR)
            .next()
            .expect("name is never empty")
    }

    /// The full name without the short name, e.g. `uavcan.node`.
    pub fn full_namespace(&self) -> &str {
        self.full_name
            .rsplit_once(NAME_COMPONENT_SEPARATOR)
            .map(|(ns, _)| ns)
            .unwrap_or("")
    }

    /// The first name component, e.g. `uavcan`.
    pub fn root_namespace(&self) -> &str {
        self.full_name
            .split(NAME_COMPONENT_SEPARATOR)
            .next()
            .expect("name is never empty")
    }

    pub fn version(&self) -> Version {
        self.version
    }

    /// The header comment of the definition, without the leading `#`.
    pub fn doc(&self) -> &str {
        &self.doc
    }

    pub fn deprecated(&self) -> bool {
        self.deprecated
    }

    pub fn fixed_port_id(&self) -> Option<u32> {
        self.fixed_port_id
    }

    pub fn has_fixed_port_id(&self) -> bool {
        self.fixed_port_id.is_some()
    }

    /// Empty for synthesized types such as service request/response
    /// sections read from memory.
    pub fn source_file_path(&self) -> &std::path::Path {
        &self.source_file_path
    }

    /// True for the request/response halves of a service; their version and
    /// deprecation are shared with the parent, whose name equals their full
    /// namespace.
    pub fn has_parent_service(&self) -> bool {
        self.has_parent_service
    }

    pub fn kind(&self) -> &CompositeKind {
        &self.kind
    }

    pub fn is_service(&self) -> bool {
        matches!(self.kind, CompositeKind::Service { .. })
    }

    pub fn is_delimited(&self) -> bool {
        matches!(self.kind, CompositeKind::Delimited { .. })
    }

    /// Whether the wire length is exactly the current bit length set, with
    /// no delimiter envelope. Meaningless for services.
    pub fn is_sealed(&self) -> bool {
        !self.is_delimited()
    }

    /// The request half of a service.
    ///
    /// # Panics
    /// If the type is not a service.
    pub fn request_type(&self) -> &Arc<CompositeType> {
        match &self.kind {
            CompositeKind::Service { request, .. } => request,
            _ => panic!("not a service type: {}", self),
        }
    }

    /// The response half of a service.
    ///
    /// # Panics
    /// If the type is not a service.
    pub fn response_type(&self) -> &Arc<CompositeType> {
        match &self.kind {
            CompositeKind::Service { response, .. } => response,
            _ => panic!("not a service type: {}", self),
        }
    }

    /// For a delimited container, the wrapped composite; otherwise self.
    pub fn inner_type(&self) -> &CompositeType {
        match &self.kind {
            CompositeKind::Delimited { inner, .. } => inner,
            _ => self,
        }
    }

    /// All attributes in declaration order.
    pub fn attributes(&self) -> &[Attribute] {
        &self.attributes
    }

    /// All fields, padding included, in declaration order.
    pub fn fields(&self) -> impl Iterator<Item = &Field> {
        self.attributes.iter().filter_map(Attribute::as_field)
    }

    pub fn fields_except_padding(&self) -> impl Iterator<Item = &Field> {
        self.fields().filter(|f| !f.is_padding())
    }

    pub fn constants(&self) -> impl Iterator<Item = &Constant> {
        self.attributes.iter().filter_map(Attribute::as_constant)
    }

    /// Attribute lookup by name. Padding fields are unnamed and therefore
    /// not reachable through this accessor.
    pub fn attribute_by_name(&self, name: &str) -> Option<&Attribute> {
        if name.is_empty() {
            return None;
        }
        self.attributes.iter().find(|a| a.name() == name)
    }

    /// Alignment requirement in bits: the maximum over the fields, never
    /// finer than a byte.
    pub fn alignment_requirement(&self) -> u64 {
        self.alignment_requirement
    }

    /// The set of possible serialized lengths; always aligned to
    /// [`Self::alignment_requirement`].
    ///
    /// # Panics
    /// If the type is a service; use the request or response type instead.
    pub fn bit_length_set(&self) -> &BitLengthSet {
        assert!(
            !self.is_service(),
            "service types are not directly serializable; use either request or response"
        );
        &self.bit_length_set
    }

    /// The number of bits that must be allocated to hold a serialized
    /// representation of this type or any of its minor versions: the
    /// explicit `@extent` value for delimited types, the largest possible
    /// length for sealed ones.
    ///
    /// # Panics
    /// If the type is a service.
    pub fn extent(&self) -> u64 {
        match &self.kind {
            CompositeKind::Delimited { extent, .. } => *extent,
            _ => self.bit_length_set().max(),
        }
    }

    /// The implicit union tag type.
    ///
    /// # Panics
    /// If the type is not a union.
    pub fn tag_field_type(&self) -> &PrimitiveType {
        match &self.kind {
            CompositeKind::Union { tag_field_type } => tag_field_type,
            _ => panic!("not a union type: {}", self),
        }
    }

    /// The length prefix type of a delimited container.
    ///
    /// # Panics
    /// If the type is not delimited.
    pub fn delimiter_header_type(&self) -> &PrimitiveType {
        match &self.kind {
            CompositeKind::Delimited { delimiter_header_type, .. } => delimiter_header_type,
            _ => panic!("not a delimited type: {}", self),
        }
    }

    pub fn number_of_variants(&self) -> usize {
        self.fields().count()
    }

    /// Every field (constants excluded) together with its offset set,
    /// starting from the given base offset. The base is implicitly padded
    /// to the alignment requirement of this type.
    ///
    /// For a structure the offsets accumulate; for a union every variant
    /// shares the same offset behind the tag; for a delimited container the
    /// iteration is delegated to the inner type past the header.
    ///
    /// # Panics
    /// If the type is a service, which has no serializable fields.
    pub fn iterate_fields_with_offsets(
        &self,
        base_offset: &BitLengthSet,
    ) -> Vec<(&Field, BitLengthSet)> {
        match &self.kind {
            CompositeKind::Service { .. } => {
                panic!("service types do not have serializable fields; use either request or response")
            }
            CompositeKind::Delimited { inner, delimiter_header_type, .. } => {
                let base = base_offset + &delimiter_header_type.bit_length_set();
                inner.iterate_fields_with_offsets(&base)
            }
            CompositeKind::Union { tag_field_type } => {
                let offset = &base_offset.pad_to_alignment(self.alignment_requirement)
                    + u64::from(tag_field_type.bit_length());
                self.fields()
                    .map(|f| {
                        debug_assert!(offset.is_aligned_at(f.data_type().alignment_requirement()));
                        (f, offset.clone())
                    })
                    .collect()
            }
            CompositeKind::Structure => {
                let mut offset = base_offset.pad_to_alignment(self.alignment_requirement);
                let mut out = Vec::new();
                for f in self.fields() {
                    offset = offset.pad_to_alignment(f.data_type().alignment_requirement());
                    out.push((f, offset.clone()));
                    let field_bls = f
                        .data_type()
                        .bit_length_set()
                        .expect("field types are always serializable");
                    offset = &offset + &field_bls;
                }
                out
            }
        }
    }
}

impl fmt::Display for CompositeType {
    /// E.g. `uavcan.node.Heartbeat.1.0`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.full_name, self.version)
    }
}

fn field_data_types(attributes: &[Attribute]) -> Vec<SerializableType> {
    attributes
        .iter()
        .filter_map(Attribute::as_field)
        .map(|f| f.data_type().clone())
        .collect()
}

fn alignment_over_fields(attributes: &[Attribute]) -> u64 {
    attributes
        .iter()
        .filter_map(Attribute::as_field)
        .map(|f| f.data_type().alignment_requirement())
        .fold(BITS_PER_BYTE, u64::max)
}

/// The bit length set of a structure given its field types, before the
/// final padding: fold left, padding each field to its own alignment and
/// adding its length set.
pub(crate) fn aggregate_structure_bit_length_sets(
    field_types: &[SerializableType],
) -> BitLengthSet {
    let mut field_types = field_types.iter();
    let mut bls = match field_types.next() {
        None => BitLengthSet::single(0),
        Some(t) => t.bit_length_set().expect("field types are always serializable"),
    };
    for t in field_types {
        bls = &bls.pad_to_alignment(t.alignment_requirement())
            + &t.bit_length_set().expect("field types are always serializable");
    }
    bls
}

/// The bit length set of a tagged union given its variant types, before the
/// final padding: the tag followed by exactly one of the variants.
///
/// Unions of fewer than two variants are not permitted by the language, but
/// this function is also used for cumulative offset queries over incomplete
/// sections, so the degenerate cases are defined: zero variants yield `{0}`
/// and a single variant yields its own set.
pub(crate) fn aggregate_union_bit_length_sets(field_types: &[SerializableType]) -> BitLengthSet {
    match field_types {
        [] => BitLengthSet::single(0),
        [only] => only.bit_length_set().expect("field types are always serializable"),
        _ => {
            let tag_bits = union_tag_bit_length(field_types);
            let united = field_types
                .iter()
                .map(|t| t.bit_length_set().expect("field types are always serializable"))
                .reduce(|a, b| a.unite(&b))
                .expect("at least two variants");
            tag_bits + &united
        }
    }
}

/// Width of the implicit union tag in bits: the smallest standard integer
/// that can index the variants, never narrower than a byte and never
/// narrower than the coarsest variant alignment (otherwise the tag would
/// misalign the variant that follows it).
pub(crate) fn union_tag_bit_length(field_types: &[SerializableType]) -> u64 {
    debug_assert!(field_types.len() > 1, "internal API misuse");
    let index_bits = u64::from(64 - ((field_types.len() - 1) as u64).leading_zeros());
    let tag = index_bits.max(BITS_PER_BYTE).next_power_of_two();
    let tag = field_types
        .iter()
        .map(|t| t.alignment_requirement())
        .fold(tag, u64::max);
    debug_assert!(matches!(tag, 8 | 16 | 32 | 64));
    tag
}
