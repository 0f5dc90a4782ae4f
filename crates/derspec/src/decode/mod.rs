//! The schema-driven decode engine.
//!
//! Decoding is a cooperation between the schema tree and the target value:
//! the engine peels the schema wrappers that are target-agnostic (optional
//! markers, tagged frames, recursive references) and hands concrete nodes to
//! the target's [`DerDecode`] implementation, which knows how to populate
//! itself from the content octets.

mod composite;
mod primitive;
mod record;

pub use record::{DerChoice, DerRecord};

use crate::cursor::Cursor;
use crate::error::{DecodeError, ErrorKind};
use crate::schema::{Node, Schema, TagEncoding};
use crate::tlv;

#[doc(hidden)]
pub use record::{
    decode_alternative_value, decode_choice_value_explicit, decode_choice_value_known_tag,
    decode_record_value,
};

/// A value that can be populated from DER input driven by a schema.
///
/// Targets are `Default`-constructed and filled in place. The three entry
/// points mirror the three ways a schema can meet the input: `decode_explicit`
/// starts at a tag octet, `decode_implicit` starts at the content octets of a
/// TLV whose header was already consumed, and `decode_known_tag` is the
/// CHOICE path where the header was read to select an alternative.
///
/// Implementations normally provide only [`decode_value_implicit`]; the
/// entry points have default bodies that run the engine dispatch. The
/// offset-recording and validating wrappers override the entry points to
/// observe the cursor around the nested decode.
///
/// [`decode_value_implicit`]: Self::decode_value_implicit
pub trait DerDecode<'a>: Sized {
    /// Decodes one complete TLV matching `schema`, starting at its tag octet.
    fn decode_explicit(
        &mut self,
        schema: &'static Schema,
        cur: &mut Cursor<'a>,
        max_len: usize,
    ) -> Result<(), DecodeError> {
        dispatch_explicit(self, schema, cur, max_len)
    }

    /// Decodes the value of a TLV whose header was already consumed.
    fn decode_implicit(
        &mut self,
        schema: &'static Schema,
        len: usize,
        cur: &mut Cursor<'a>,
    ) -> Result<(), DecodeError> {
        dispatch_implicit(self, schema, len, cur)
    }

    /// Decodes a CHOICE value whose tag and length were already read.
    fn decode_known_tag(
        &mut self,
        schema: &'static Schema,
        tag: u8,
        len: usize,
        cur: &mut Cursor<'a>,
    ) -> Result<(), DecodeError> {
        dispatch_known_tag(self, schema, tag, len, cur)
    }

    /// Target-specific explicit decoding of a concrete schema node. The
    /// default reads and checks the TLV header, then decodes the content.
    /// Overridden where the wire format demands it (ANY, CHOICE, extension
    /// markers).
    fn decode_value_explicit(
        &mut self,
        schema: &'static Schema,
        cur: &mut Cursor<'a>,
        max_len: usize,
    ) -> Result<(), DecodeError> {
        let len = decode_header_checked(schema, cur, max_len)?;
        self.decode_value_implicit(schema, len, cur)
    }

    /// Target-specific decoding of `len` content octets for a concrete
    /// schema node.
    fn decode_value_implicit(
        &mut self,
        schema: &'static Schema,
        len: usize,
        cur: &mut Cursor<'a>,
    ) -> Result<(), DecodeError>;

    /// Target-specific CHOICE decoding. Only tagged-union targets (and the
    /// transparent wrappers) support this.
    fn decode_value_known_tag(
        &mut self,
        schema: &'static Schema,
        tag: u8,
        len: usize,
        cur: &mut Cursor<'a>,
    ) -> Result<(), DecodeError> {
        let _ = (tag, len, cur);
        panic!(
            "{} target cannot decode a {} schema by tag",
            std::any::type_name::<Self>(),
            schema.type_name()
        );
    }
}

/// True if a TLV starting with `tag` can be decoded by `schema`: the
/// declared tag octet for single-tag schemas, membership in the alternative
/// set for CHOICE, anything for ANY and extension markers.
pub fn can_decode(schema: &Schema, tag: u8) -> bool {
    match &schema.node {
        Node::Any | Node::ExtensionMarker => true,
        Node::Choice { alternatives } => alternatives.iter().any(|alt| can_decode(alt, tag)),
        Node::Optional { inner, .. } => can_decode(inner, tag),
        Node::Recursive(resolve) => can_decode(resolve(), tag),
        _ => schema.tag_octet() == Some(tag),
    }
}

/// How a record member meets the input; see the [`DerDecode`] entry points.
#[derive(Debug, Clone, Copy)]
pub enum DecodeMode {
    Explicit { max_len: usize },
    Implicit { len: usize },
    KnownTag { tag: u8, len: usize },
}

/// Drives one field decode in the given mode. Called from generated
/// record and choice bindings.
pub fn decode_in_mode<'a, T: DerDecode<'a>>(
    target: &mut T,
    schema: &'static Schema,
    mode: DecodeMode,
    cur: &mut Cursor<'a>,
) -> Result<(), DecodeError> {
    match mode {
        DecodeMode::Explicit { max_len } => target.decode_explicit(schema, cur, max_len),
        DecodeMode::Implicit { len } => target.decode_implicit(schema, len, cur),
        DecodeMode::KnownTag { tag, len } => target.decode_known_tag(schema, tag, len, cur),
    }
}

fn dispatch_explicit<'a, T: DerDecode<'a>>(
    target: &mut T,
    schema: &'static Schema,
    cur: &mut Cursor<'a>,
    max_len: usize,
) -> Result<(), DecodeError> {
    match &schema.node {
        Node::Optional { inner, .. } => target.decode_explicit(inner, cur, max_len),
        Node::Recursive(resolve) => {
            with_recursion(cur, resolve(), |cur| {
                target.decode_explicit(resolve(), cur, max_len)
            })
        }
        Node::Tagged { encoding, inner, .. } => {
            let result = decode_header_checked(schema, cur, max_len).and_then(|len| {
                match encoding {
                    TagEncoding::Explicit => target.decode_explicit(inner, cur, len),
                    TagEncoding::Implicit => target.decode_implicit(inner, len, cur),
                }
            });
            result.map_err(|e| e.with_context(schema.context_entry()))
        }
        _ => target
            .decode_value_explicit(schema, cur, max_len)
            .map_err(|e| e.with_context(schema.context_entry())),
    }
}

fn dispatch_implicit<'a, T: DerDecode<'a>>(
    target: &mut T,
    schema: &'static Schema,
    len: usize,
    cur: &mut Cursor<'a>,
) -> Result<(), DecodeError> {
    match &schema.node {
        Node::Optional { inner, .. } => target.decode_implicit(inner, len, cur),
        Node::Recursive(resolve) => with_recursion(cur, resolve(), |cur| {
            target.decode_implicit(resolve(), len, cur)
        }),
        Node::Tagged { encoding, inner, .. } => {
            let result = match encoding {
                TagEncoding::Explicit => target.decode_explicit(inner, cur, len),
                TagEncoding::Implicit => target.decode_implicit(inner, len, cur),
            };
            result.map_err(|e| e.with_context(schema.context_entry()))
        }
        _ => target
            .decode_value_implicit(schema, len, cur)
            .map_err(|e| e.with_context(schema.context_entry())),
    }
}

fn dispatch_known_tag<'a, T: DerDecode<'a>>(
    target: &mut T,
    schema: &'static Schema,
    tag: u8,
    len: usize,
    cur: &mut Cursor<'a>,
) -> Result<(), DecodeError> {
    match &schema.node {
        Node::Optional { inner, .. } => target.decode_known_tag(inner, tag, len, cur),
        Node::Recursive(resolve) => with_recursion(cur, resolve(), |cur| {
            target.decode_known_tag(resolve(), tag, len, cur)
        }),
        _ => target
            .decode_value_known_tag(schema, tag, len, cur)
            .map_err(|e| e.with_context(schema.context_entry())),
    }
}

/// Runs `body` with one unit of recursion budget taken. Errors crossing the
/// recursion point seal their context path so repeated traversals collapse
/// to a single entry under the root.
fn with_recursion<'a, R>(
    cur: &mut Cursor<'a>,
    resolved: &'static Schema,
    body: impl FnOnce(&mut Cursor<'a>) -> Result<R, DecodeError>,
) -> Result<R, DecodeError> {
    if let Err(e) = cur.enter_recursion() {
        return Err(e.with_context(resolved.context_entry()).sealed());
    }
    let result = body(cur);
    cur.exit_recursion();
    result.map_err(|e| e.sealed())
}

/// A schema/target pairing the binding rules do not support. This is a
/// programming error in the caller, never a property of the input, so it
/// panics with an explanation instead of returning a decode error.
pub(crate) fn binding_mismatch(schema: &Schema, target: &str) -> ! {
    panic!(
        "{} schema cannot decode into {} target",
        schema.type_name(),
        target
    )
}

/// Reads a TLV header and checks it against the schema and the enclosing
/// region: the tag must be acceptable, and the length must fit both the
/// enclosing value and the remaining input.
pub(crate) fn decode_header_checked<'a>(
    schema: &'static Schema,
    cur: &mut Cursor<'a>,
    max_len: usize,
) -> Result<usize, DecodeError> {
    let (tag, len) = tlv::read_header(cur)?;
    if !can_decode(schema, tag) {
        return Err(cur.error(ErrorKind::UnexpectedTag, schema.expected_message()));
    }
    if len > max_len {
        return Err(cur.error(
            ErrorKind::InvalidLength,
            "length overruns the enclosing value",
        ));
    }
    if len > cur.remaining() {
        return Err(cur.error(ErrorKind::Truncated, "length exceeds available input"));
    }
    Ok(len)
}
