#![forbid(unsafe_code)]
//! Declarative, schema-driven ASN.1 DER decoding.
//!
//! A schema, a constant tree of [`Schema`] values, describes an ASN.1 type; a
//! target, any type implementing [`DerDecode`], describes the value shape to
//! populate. [`decode_to`] walks both together over a DER byte stream,
//! enforcing the X.690 distinguished encoding rules: canonical lengths,
//! `0x00`/`0xFF` booleans, SET uniqueness, trailing-zero-free time fractions
//! and the rest.
//!
//! ```
//! use derspec::{der_record, Oid, Schema};
//!
//! #[derive(Debug, Default, PartialEq)]
//! struct AlgorithmIdentifier {
//!     algorithm: Oid,
//!     parameters: Option<()>,
//! }
//! der_record!(AlgorithmIdentifier { algorithm, parameters });
//!
//! static ALGORITHM: Schema = Schema::object_identifier().named("algorithm");
//! static PARAMS: Schema = Schema::null().named("parameters");
//! static OPT_PARAMS: Schema = Schema::optional(&PARAMS);
//! static ALGORITHM_IDENTIFIER: Schema =
//!     Schema::sequence(&[&ALGORITHM, &OPT_PARAMS]).named("AlgorithmIdentifier");
//!
//! // sha256WithRSAEncryption with NULL parameters.
//! let der = [
//!     0x30, 0x0D, 0x06, 0x09, 0x2A, 0x86, 0x48, 0x86, 0xF7, 0x0D, 0x01, 0x01, 0x0B,
//!     0x05, 0x00,
//! ];
//! let alg: AlgorithmIdentifier = derspec::decode_to(&ALGORITHM_IDENTIFIER, &der).unwrap();
//! assert_eq!(alg.algorithm.to_string(), "1.2.840.113549.1.1.11");
//! assert_eq!(alg.parameters, Some(()));
//! ```
//!
//! Failures carry the schema path from the root to the failing node, subject
//! to the [`ContextPolicy`] selected through [`DecodeOptions`].
//!
//! Only decoding is provided, and only DER: indefinite lengths and other
//! BER-only freedoms are rejected.

mod cursor;
mod error;
mod macros;
mod schema;
mod tag;
mod tlv;
mod value;

pub mod decode;

pub use cursor::{Cursor, DecodeOptions};
pub use decode::{can_decode, DerDecode};
pub use error::{ContextEntry, ContextPolicy, DecodeError, ErrorKind};
pub use schema::{Schema, StrKind, TagEncoding};
pub use tag::{tags, TagClass, CONSTRUCTED};
pub use value::{
    BitStringValue, BmpString, ExtensionSentinel, GeneralizedTime, Oid, OwnedBytes, RawBytes,
    UniversalString, UtcTime, Validate, Validated, WithOffsets, WithRawData, WithSlice,
};

/// Decodes exactly one TLV matching `schema` from the cursor into `target`,
/// leaving the cursor positioned past the consumed encoding.
pub fn decode_into<'a, T: DerDecode<'a>>(
    schema: &'static Schema,
    cursor: &mut Cursor<'a>,
    target: &mut T,
) -> Result<(), DecodeError> {
    tracing::trace!(
        schema = schema.type_name(),
        remaining = cursor.remaining(),
        "decoding DER value"
    );
    let max_len = cursor.remaining();
    target
        .decode_explicit(schema, cursor, max_len)
        .map_err(|e| {
            // A path sealed at a recursion point still reports the root.
            let e = if e.is_sealed() {
                e.with_root_context(schema.context_entry())
            } else {
                e
            };
            tracing::debug!(error = %e, "DER decode failed");
            e
        })
}

/// Decodes `input` as one TLV matching `schema` and returns the populated
/// target. Fails with [`ErrorKind::TrailingBytes`] unless the whole input
/// is consumed.
pub fn decode_to<'a, T: DerDecode<'a> + Default>(
    schema: &'static Schema,
    input: &'a [u8],
) -> Result<T, DecodeError> {
    decode_to_with_options(schema, input, DecodeOptions::default())
}

/// [`decode_to`] with a bound on recursive-schema nesting.
pub fn decode_to_with_depth<'a, T: DerDecode<'a> + Default>(
    schema: &'static Schema,
    input: &'a [u8],
    max_recursion_depth: usize,
) -> Result<T, DecodeError> {
    decode_to_with_options(
        schema,
        input,
        DecodeOptions {
            max_recursion_depth: Some(max_recursion_depth),
            ..DecodeOptions::default()
        },
    )
}

/// [`decode_to`] with explicit [`DecodeOptions`].
pub fn decode_to_with_options<'a, T: DerDecode<'a> + Default>(
    schema: &'static Schema,
    input: &'a [u8],
    options: DecodeOptions,
) -> Result<T, DecodeError> {
    let mut cursor = Cursor::with_options(input, options);
    let mut value = T::default();
    decode_into(schema, &mut cursor, &mut value)?;
    if !cursor.is_empty() {
        return Err(DecodeError::new(
            ErrorKind::TrailingBytes,
            "not all input was consumed",
            options.context_policy,
        ));
    }
    Ok(value)
}
