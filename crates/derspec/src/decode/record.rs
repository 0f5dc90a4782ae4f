//! SEQUENCE/SET record walking and CHOICE dispatch.
//!
//! Record and tagged-union targets are bound through the [`DerRecord`] and
//! [`DerChoice`] traits, normally implemented with the [`der_record!`] and
//! [`der_choice!`] macros. The walkers here drive those traits field by
//! field while enforcing ordering, uniqueness and required-member rules.
//!
//! [`der_record!`]: crate::der_record
//! [`der_choice!`]: crate::der_choice

use crate::cursor::Cursor;
use crate::error::{DecodeError, ErrorKind};
use crate::schema::{for_each_effective_tag, Node, Schema};
use crate::tlv;

use super::{binding_mismatch, can_decode, DecodeMode, DerDecode};

/// A fixed-arity product target for SEQUENCE and SET schemas. The field
/// order must match the schema's member order.
pub trait DerRecord<'a>: Default {
    fn field_count() -> usize;

    /// Decodes the field at `index` in the given mode.
    fn decode_field(
        &mut self,
        index: usize,
        schema: &'static Schema,
        mode: DecodeMode,
        cur: &mut Cursor<'a>,
    ) -> Result<(), DecodeError>;

    /// Assigns the declared default to the field at `index`. Called only
    /// for members the schema marks as OPTIONAL-DEFAULT.
    fn assign_field_default(&mut self, index: usize);
}

/// A tagged-union target for CHOICE schemas. The alternative order must
/// match the schema's alternative order.
pub trait DerChoice<'a>: Sized {
    fn alternative_count() -> usize;

    /// Replaces `self` with the alternative at `index` decoded from the
    /// already-read TLV header.
    fn decode_alternative(
        &mut self,
        index: usize,
        schema: &'static Schema,
        tag: u8,
        len: usize,
        cur: &mut Cursor<'a>,
    ) -> Result<(), DecodeError>;
}

/// Decodes the content of a SEQUENCE or SET into a record target.
/// Generated [`DerDecode`] impls call this from `decode_value_implicit`.
pub fn decode_record_value<'a, R: DerRecord<'a>>(
    record: &mut R,
    schema: &'static Schema,
    len: usize,
    cur: &mut Cursor<'a>,
) -> Result<(), DecodeError> {
    match &schema.node {
        Node::Sequence { fields } => decode_sequence_fields(record, fields, len, cur),
        Node::Set { fields } => decode_set_fields(record, fields, len, cur),
        _ => binding_mismatch(schema, "a record"),
    }
}

fn check_field_count<'a, R: DerRecord<'a>>(fields: &[&Schema]) {
    assert_eq!(
        R::field_count(),
        fields.len(),
        "record binding has {} fields but the schema declares {} members",
        R::field_count(),
        fields.len()
    );
}

/// Walks SEQUENCE members in declaration order. Optional members are
/// skipped when the next tag does not match; absent OPTIONAL-DEFAULT
/// members receive their default; an extension marker swallows whatever
/// trails.
fn decode_sequence_fields<'a, R: DerRecord<'a>>(
    record: &mut R,
    fields: &'static [&'static Schema],
    mut len: usize,
    cur: &mut Cursor<'a>,
) -> Result<(), DecodeError> {
    check_field_count::<R>(fields);
    for (index, &field) in fields.iter().enumerate() {
        if len == 0 {
            if field.is_extension_marker() {
                record.decode_field(index, field, DecodeMode::Explicit { max_len: 0 }, cur)?;
            } else if !field.is_optional() {
                return Err(cur
                    .error(
                        ErrorKind::MissingField,
                        "no data left for required SEQUENCE member",
                    )
                    .with_context(field.context_entry()));
            } else if field.has_default() {
                record.assign_field_default(index);
            }
            continue;
        }

        let tag = cur
            .peek()
            .ok_or_else(|| cur.error(ErrorKind::Truncated, "unexpected end of input"))?;
        if can_decode(field, tag) {
            let before = cur.position();
            record.decode_field(index, field, DecodeMode::Explicit { max_len: len }, cur)?;
            len = len.checked_sub(cur.position() - before).ok_or_else(|| {
                cur.error(
                    ErrorKind::InvalidLength,
                    "SEQUENCE member overruns its container",
                )
            })?;
        } else if !field.is_optional() {
            return Err(cur
                .error(
                    ErrorKind::UnexpectedTag,
                    "tag does not match required SEQUENCE member",
                )
                .with_context(field.context_entry()));
        } else if field.has_default() {
            record.assign_field_default(index);
        }
    }
    if len != 0 {
        return Err(cur.error(
            ErrorKind::TrailingBytes,
            "SEQUENCE data is not fully consumed",
        ));
    }
    Ok(())
}

/// Duplicate detection for SET members: one bit per possible tag octet.
#[derive(Default)]
struct MarkedTags {
    words: [u64; 4],
}

impl MarkedTags {
    /// Marks a tag, returning false if it was already marked.
    fn mark(&mut self, tag: u8) -> bool {
        let word = &mut self.words[tag as usize / 64];
        let bit = 1u64 << (tag % 64);
        if *word & bit != 0 {
            return false;
        }
        *word |= bit;
        true
    }

    fn is_marked(&self, tag: u8) -> bool {
        self.words[tag as usize / 64] & (1u64 << (tag % 64)) != 0
    }
}

/// Walks SET members in wire order, matching each TLV to the unique member
/// that accepts its tag. Members may arrive in any order; duplicates and
/// unknown tags fail unless a trailing extension marker is declared.
fn decode_set_fields<'a, R: DerRecord<'a>>(
    record: &mut R,
    fields: &'static [&'static Schema],
    mut len: usize,
    cur: &mut Cursor<'a>,
) -> Result<(), DecodeError> {
    check_field_count::<R>(fields);
    let mut marked = MarkedTags::default();
    let mut required_seen = 0usize;

    while len > 0 {
        let before = cur.position();
        let (tag, child_len) = tlv::read_header(cur)?;
        let header_len = cur.position() - before;
        if header_len > len || child_len > len - header_len {
            return Err(cur.error(ErrorKind::InvalidLength, "invalid SET element length"));
        }

        match fields.iter().position(|f| can_decode(f, tag)) {
            None => {
                return Err(
                    cur.error(ErrorKind::UnexpectedTag, "unable to decode SET element")
                )
            }
            Some(index) => {
                let field = fields[index];
                if field.is_extension_marker() {
                    // Unknown trailing TLV tolerated by the marker.
                    cur.advance(child_len)?;
                } else {
                    if !field.is_optional() {
                        required_seen += 1;
                    }
                    if field.is_choice() {
                        let mut duplicate = false;
                        for_each_effective_tag(field, &mut |t| {
                            duplicate |= !marked.mark(t);
                        });
                        if duplicate {
                            return Err(cur
                                .error(
                                    ErrorKind::DuplicateSetElement,
                                    "encountered duplicate SET elements",
                                )
                                .with_context(field.context_entry()));
                        }
                        record.decode_field(
                            index,
                            field,
                            DecodeMode::KnownTag {
                                tag,
                                len: child_len,
                            },
                            cur,
                        )?;
                    } else {
                        if !marked.mark(tag) {
                            return Err(cur
                                .error(
                                    ErrorKind::DuplicateSetElement,
                                    "encountered duplicate SET elements",
                                )
                                .with_context(field.context_entry()));
                        }
                        record.decode_field(
                            index,
                            field,
                            DecodeMode::Implicit { len: child_len },
                            cur,
                        )?;
                    }
                }
            }
        }
        len -= cur.position() - before;
    }

    let required_total = fields
        .iter()
        .filter(|f| !f.is_optional() && !f.is_extension_marker())
        .count();
    if required_seen != required_total {
        return Err(cur.error(ErrorKind::MissingField, "missing required SET elements"));
    }

    for (index, &field) in fields.iter().enumerate() {
        if field.has_default() && !set_member_seen(field, &marked) {
            record.assign_field_default(index);
        }
    }
    Ok(())
}

fn set_member_seen(field: &Schema, marked: &MarkedTags) -> bool {
    let mut seen = false;
    let mut first = true;
    for_each_effective_tag(field, &mut |t| {
        if first {
            seen = marked.is_marked(t);
            first = false;
        }
    });
    seen
}

/// CHOICE read from the tag octet: the header selects the alternative.
pub fn decode_choice_value_explicit<'a, C>(
    choice: &mut C,
    schema: &'static Schema,
    cur: &mut Cursor<'a>,
    max_len: usize,
) -> Result<(), DecodeError>
where
    C: DerChoice<'a>,
{
    let (tag, len) = tlv::read_header(cur)?;
    if len > max_len {
        return Err(cur.error(ErrorKind::InvalidLength, "invalid CHOICE element length"));
    }
    if len > cur.remaining() {
        return Err(cur.error(ErrorKind::Truncated, "length exceeds available input"));
    }
    decode_choice_value_known_tag(choice, schema, tag, len, cur)
}

/// CHOICE dispatch with an already-read header: looks up the alternative
/// accepting `tag` and emplaces it in the target.
pub fn decode_choice_value_known_tag<'a, C>(
    choice: &mut C,
    schema: &'static Schema,
    tag: u8,
    len: usize,
    cur: &mut Cursor<'a>,
) -> Result<(), DecodeError>
where
    C: DerChoice<'a>,
{
    let alternatives = match &schema.node {
        Node::Choice { alternatives } => *alternatives,
        _ => binding_mismatch(schema, "a tagged union"),
    };
    assert_eq!(
        C::alternative_count(),
        alternatives.len(),
        "choice binding has {} alternatives but the schema declares {}",
        C::alternative_count(),
        alternatives.len()
    );
    let index = alternatives
        .iter()
        .position(|alt| can_decode(alt, tag))
        .ok_or_else(|| cur.error(ErrorKind::NoMatchingAlternative, "unable to decode CHOICE"))?;
    choice.decode_alternative(index, alternatives[index], tag, len, cur)
}

/// Decodes one CHOICE alternative: nested choices continue by tag, anything
/// else decodes its content implicitly.
pub fn decode_alternative_value<'a, T: DerDecode<'a>>(
    target: &mut T,
    schema: &'static Schema,
    tag: u8,
    len: usize,
    cur: &mut Cursor<'a>,
) -> Result<(), DecodeError> {
    if schema.is_choice() {
        target.decode_known_tag(schema, tag, len, cur)
    } else {
        target.decode_implicit(schema, len, cur)
    }
}
