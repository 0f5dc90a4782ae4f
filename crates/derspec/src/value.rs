//! Target value shapes the decoder populates.

use std::fmt;
use std::marker::PhantomData;

/// A carrier for the raw content bytes of a TLV: either a borrowed view into
/// the input or an owned copy.
pub trait RawBytes<'a>: Default {
    fn capture(bytes: &'a [u8]) -> Self;
    fn as_bytes(&self) -> &[u8];
}

impl<'a> RawBytes<'a> for &'a [u8] {
    fn capture(bytes: &'a [u8]) -> Self {
        bytes
    }

    fn as_bytes(&self) -> &[u8] {
        self
    }
}

impl<'a> RawBytes<'a> for Vec<u8> {
    fn capture(bytes: &'a [u8]) -> Self {
        bytes.to_vec()
    }

    fn as_bytes(&self) -> &[u8] {
        self
    }
}

/// An owned byte buffer target for OCTET STRING-like values.
///
/// `Vec<u8>` itself cannot be a decode target because `Vec<T>` is reserved
/// for SEQUENCE OF / SET OF bindings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OwnedBytes(pub Vec<u8>);

impl<'a> RawBytes<'a> for OwnedBytes {
    fn capture(bytes: &'a [u8]) -> Self {
        Self(bytes.to_vec())
    }

    fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl std::ops::Deref for OwnedBytes {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        &self.0
    }
}

impl AsRef<[u8]> for OwnedBytes {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

/// A decoded BIT STRING: content bytes plus the number of meaningful bits.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BitStringValue<B> {
    pub bits: B,
    pub bit_count: usize,
}

impl<B: AsRef<[u8]>> BitStringValue<B> {
    /// Tests the bit at `index`, counting from the most significant bit of
    /// the first octet. Out-of-range indexes read as unset.
    pub fn is_set(&self, index: usize) -> bool {
        if index >= self.bit_count {
            return false;
        }
        let byte = self.bits.as_ref()[index / 8];
        byte & (0x80 >> (index % 8)) != 0
    }
}

/// A decoded OBJECT IDENTIFIER or RELATIVE-OID as a sequence of arc values.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Oid {
    pub(crate) arcs: Vec<u32>,
}

impl Oid {
    /// Create an OID from a slice of arc values.
    pub fn new(arcs: &[u32]) -> Self {
        Self {
            arcs: arcs.to_vec(),
        }
    }

    /// Return the arc values.
    pub fn arcs(&self) -> &[u32] {
        &self.arcs
    }

    /// Return the dotted-string representation (e.g., "1.2.840.113549.1.1.11").
    pub fn to_dot_string(&self) -> String {
        self.arcs
            .iter()
            .map(|a| a.to_string())
            .collect::<Vec<_>>()
            .join(".")
    }
}

impl fmt::Display for Oid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_dot_string())
    }
}

/// A decoded UTCTime with the two-digit year as encoded.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UtcTime {
    pub year: u8,
    pub month: u8,
    pub day: u8,
    pub hour: u8,
    pub minute: u8,
    pub second: u8,
}

/// A decoded GeneralizedTime with a four-digit year and optional fraction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GeneralizedTime {
    pub year: u16,
    pub month: u8,
    pub day: u8,
    pub hour: u8,
    pub minute: u8,
    pub second: u8,
    pub seconds_fraction: u64,
}

/// A BMPString as big-endian 16-bit code units.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BmpString(pub Vec<u16>);

/// A UniversalString as big-endian 32-bit code units.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UniversalString(pub Vec<u32>);

/// Unit target for extension-marker slots.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExtensionSentinel;

/// Wraps a target and records the byte range of its TLV in the input as
/// `start..end` offsets. Transparent to schema matching.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WithOffsets<T> {
    pub start: usize,
    pub end: usize,
    pub value: T,
}

/// Wraps a target and records its TLV as a borrowed subslice of the input.
/// Transparent to schema matching.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WithSlice<'a, T> {
    pub raw: &'a [u8],
    pub value: T,
}

/// Wraps a target and records an owned copy of its TLV bytes.
/// Transparent to schema matching.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WithRawData<T> {
    pub raw: Vec<u8>,
    pub value: T,
}

/// A predicate applied to a decoded value before it becomes visible to the
/// enclosing decoder. Failures surface as `ValidationFailed` with the user
/// error chained underneath.
pub trait Validate<T> {
    fn validate(value: &T) -> Result<(), Box<dyn std::error::Error + Send + Sync>>;
}

/// Wraps a target with a validator `V` that runs after each decode.
pub struct Validated<T, V> {
    pub value: T,
    validator: PhantomData<fn() -> V>,
}

impl<T, V> Validated<T, V> {
    pub fn new(value: T) -> Self {
        Self {
            value,
            validator: PhantomData,
        }
    }

    pub fn into_inner(self) -> T {
        self.value
    }
}

impl<T: Default, V> Default for Validated<T, V> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

impl<T: fmt::Debug, V> fmt::Debug for Validated<T, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Validated").field(&self.value).finish()
    }
}

impl<T: Clone, V> Clone for Validated<T, V> {
    fn clone(&self) -> Self {
        Self::new(self.value.clone())
    }
}

impl<T: PartialEq, V> PartialEq for Validated<T, V> {
    fn eq(&self, other: &Self) -> bool {
        self.value == other.value
    }
}
