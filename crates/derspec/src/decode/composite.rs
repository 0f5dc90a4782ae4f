//! Bindings for container targets and the transparent wrappers: repeated
//! elements, optional cells, owning pointers, offset recorders and
//! validators.

use std::rc::Rc;
use std::sync::Arc;

use crate::cursor::Cursor;
use crate::error::{DecodeError, ErrorKind};
use crate::schema::{Node, Schema};
use crate::tlv;
use crate::value::{ExtensionSentinel, Validate, Validated, WithOffsets, WithRawData, WithSlice};

use super::{binding_mismatch, DerDecode};

// ---------------------------------------------------------------------------
// SEQUENCE OF / SET OF
// ---------------------------------------------------------------------------

impl<'a, T: DerDecode<'a> + Default> DerDecode<'a> for Vec<T> {
    fn decode_value_implicit(
        &mut self,
        schema: &'static Schema,
        mut len: usize,
        cur: &mut Cursor<'a>,
    ) -> Result<(), DecodeError> {
        let (element, bounds) = match &schema.node {
            Node::SequenceOf { element, bounds } | Node::SetOf { element, bounds } => {
                (*element, *bounds)
            }
            _ => binding_mismatch(schema, "Vec"),
        };
        let mut count = 0usize;
        while len > 0 {
            if let Some((_, max)) = bounds {
                if count + 1 > max {
                    return Err(cur.error(ErrorKind::TooManyElements, "too many elements"));
                }
            }
            let before = cur.position();
            let mut item = T::default();
            item.decode_explicit(element, cur, len)?;
            self.push(item);
            count += 1;
            len = len.checked_sub(cur.position() - before).ok_or_else(|| {
                cur.error(
                    ErrorKind::InvalidLength,
                    "element overruns its container",
                )
            })?;
        }
        if let Some((min, _)) = bounds {
            if count < min {
                return Err(cur.error(ErrorKind::TooFewElements, "too few elements"));
            }
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Optional cells and owning pointers
// ---------------------------------------------------------------------------

// The enclosing SEQUENCE/SET walker decides presence; by the time one of
// these is invoked the value is known to be present, so the inner target is
// materialized and decoding delegates to it.

impl<'a, T: DerDecode<'a> + Default> DerDecode<'a> for Option<T> {
    fn decode_explicit(
        &mut self,
        schema: &'static Schema,
        cur: &mut Cursor<'a>,
        max_len: usize,
    ) -> Result<(), DecodeError> {
        self.insert(T::default()).decode_explicit(schema, cur, max_len)
    }

    fn decode_implicit(
        &mut self,
        schema: &'static Schema,
        len: usize,
        cur: &mut Cursor<'a>,
    ) -> Result<(), DecodeError> {
        self.insert(T::default()).decode_implicit(schema, len, cur)
    }

    fn decode_known_tag(
        &mut self,
        schema: &'static Schema,
        tag: u8,
        len: usize,
        cur: &mut Cursor<'a>,
    ) -> Result<(), DecodeError> {
        self.insert(T::default()).decode_known_tag(schema, tag, len, cur)
    }

    fn decode_value_implicit(
        &mut self,
        schema: &'static Schema,
        len: usize,
        cur: &mut Cursor<'a>,
    ) -> Result<(), DecodeError> {
        self.insert(T::default()).decode_value_implicit(schema, len, cur)
    }
}

impl<'a, T: DerDecode<'a>> DerDecode<'a> for Box<T> {
    fn decode_explicit(
        &mut self,
        schema: &'static Schema,
        cur: &mut Cursor<'a>,
        max_len: usize,
    ) -> Result<(), DecodeError> {
        (**self).decode_explicit(schema, cur, max_len)
    }

    fn decode_implicit(
        &mut self,
        schema: &'static Schema,
        len: usize,
        cur: &mut Cursor<'a>,
    ) -> Result<(), DecodeError> {
        (**self).decode_implicit(schema, len, cur)
    }

    fn decode_known_tag(
        &mut self,
        schema: &'static Schema,
        tag: u8,
        len: usize,
        cur: &mut Cursor<'a>,
    ) -> Result<(), DecodeError> {
        (**self).decode_known_tag(schema, tag, len, cur)
    }

    fn decode_value_implicit(
        &mut self,
        schema: &'static Schema,
        len: usize,
        cur: &mut Cursor<'a>,
    ) -> Result<(), DecodeError> {
        (**self).decode_value_implicit(schema, len, cur)
    }
}

macro_rules! impl_shared_pointer_target {
    ($($ptr:ident),+ $(,)?) => {$(
        impl<'a, T: DerDecode<'a> + Default> DerDecode<'a> for $ptr<T> {
            fn decode_explicit(
                &mut self,
                schema: &'static Schema,
                cur: &mut Cursor<'a>,
                max_len: usize,
            ) -> Result<(), DecodeError> {
                let mut value = T::default();
                value.decode_explicit(schema, cur, max_len)?;
                *self = $ptr::new(value);
                Ok(())
            }

            fn decode_implicit(
                &mut self,
                schema: &'static Schema,
                len: usize,
                cur: &mut Cursor<'a>,
            ) -> Result<(), DecodeError> {
                let mut value = T::default();
                value.decode_implicit(schema, len, cur)?;
                *self = $ptr::new(value);
                Ok(())
            }

            fn decode_known_tag(
                &mut self,
                schema: &'static Schema,
                tag: u8,
                len: usize,
                cur: &mut Cursor<'a>,
            ) -> Result<(), DecodeError> {
                let mut value = T::default();
                value.decode_known_tag(schema, tag, len, cur)?;
                *self = $ptr::new(value);
                Ok(())
            }

            fn decode_value_implicit(
                &mut self,
                schema: &'static Schema,
                len: usize,
                cur: &mut Cursor<'a>,
            ) -> Result<(), DecodeError> {
                let mut value = T::default();
                value.decode_value_implicit(schema, len, cur)?;
                *self = $ptr::new(value);
                Ok(())
            }
        }
    )+};
}

impl_shared_pointer_target!(Rc, Arc);

// ---------------------------------------------------------------------------
// Offset-decorated wrappers
// ---------------------------------------------------------------------------

// These bracket the nested decode with cursor-position snapshots, so the
// recorded range covers the complete encoding the inner decode consumed
// (header included on the explicit path).

impl<'a, T: DerDecode<'a>> DerDecode<'a> for WithOffsets<T> {
    fn decode_explicit(
        &mut self,
        schema: &'static Schema,
        cur: &mut Cursor<'a>,
        max_len: usize,
    ) -> Result<(), DecodeError> {
        self.start = cur.position();
        self.value.decode_explicit(schema, cur, max_len)?;
        self.end = cur.position();
        Ok(())
    }

    fn decode_implicit(
        &mut self,
        schema: &'static Schema,
        len: usize,
        cur: &mut Cursor<'a>,
    ) -> Result<(), DecodeError> {
        self.start = cur.position();
        self.value.decode_implicit(schema, len, cur)?;
        self.end = cur.position();
        Ok(())
    }

    fn decode_known_tag(
        &mut self,
        schema: &'static Schema,
        tag: u8,
        len: usize,
        cur: &mut Cursor<'a>,
    ) -> Result<(), DecodeError> {
        self.start = cur.position();
        self.value.decode_known_tag(schema, tag, len, cur)?;
        self.end = cur.position();
        Ok(())
    }

    fn decode_value_implicit(
        &mut self,
        schema: &'static Schema,
        len: usize,
        cur: &mut Cursor<'a>,
    ) -> Result<(), DecodeError> {
        self.start = cur.position();
        self.value.decode_value_implicit(schema, len, cur)?;
        self.end = cur.position();
        Ok(())
    }
}

impl<'a, T: DerDecode<'a>> DerDecode<'a> for WithSlice<'a, T> {
    fn decode_explicit(
        &mut self,
        schema: &'static Schema,
        cur: &mut Cursor<'a>,
        max_len: usize,
    ) -> Result<(), DecodeError> {
        let start = cur.position();
        self.value.decode_explicit(schema, cur, max_len)?;
        self.raw = &cur.data()[start..cur.position()];
        Ok(())
    }

    fn decode_implicit(
        &mut self,
        schema: &'static Schema,
        len: usize,
        cur: &mut Cursor<'a>,
    ) -> Result<(), DecodeError> {
        let start = cur.position();
        self.value.decode_implicit(schema, len, cur)?;
        self.raw = &cur.data()[start..cur.position()];
        Ok(())
    }

    fn decode_known_tag(
        &mut self,
        schema: &'static Schema,
        tag: u8,
        len: usize,
        cur: &mut Cursor<'a>,
    ) -> Result<(), DecodeError> {
        let start = cur.position();
        self.value.decode_known_tag(schema, tag, len, cur)?;
        self.raw = &cur.data()[start..cur.position()];
        Ok(())
    }

    fn decode_value_implicit(
        &mut self,
        schema: &'static Schema,
        len: usize,
        cur: &mut Cursor<'a>,
    ) -> Result<(), DecodeError> {
        let start = cur.position();
        self.value.decode_value_implicit(schema, len, cur)?;
        self.raw = &cur.data()[start..cur.position()];
        Ok(())
    }
}

impl<'a, T: DerDecode<'a>> DerDecode<'a> for WithRawData<T> {
    fn decode_explicit(
        &mut self,
        schema: &'static Schema,
        cur: &mut Cursor<'a>,
        max_len: usize,
    ) -> Result<(), DecodeError> {
        let start = cur.position();
        self.value.decode_explicit(schema, cur, max_len)?;
        self.raw = cur.data()[start..cur.position()].to_vec();
        Ok(())
    }

    fn decode_implicit(
        &mut self,
        schema: &'static Schema,
        len: usize,
        cur: &mut Cursor<'a>,
    ) -> Result<(), DecodeError> {
        let start = cur.position();
        self.value.decode_implicit(schema, len, cur)?;
        self.raw = cur.data()[start..cur.position()].to_vec();
        Ok(())
    }

    fn decode_known_tag(
        &mut self,
        schema: &'static Schema,
        tag: u8,
        len: usize,
        cur: &mut Cursor<'a>,
    ) -> Result<(), DecodeError> {
        let start = cur.position();
        self.value.decode_known_tag(schema, tag, len, cur)?;
        self.raw = cur.data()[start..cur.position()].to_vec();
        Ok(())
    }

    fn decode_value_implicit(
        &mut self,
        schema: &'static Schema,
        len: usize,
        cur: &mut Cursor<'a>,
    ) -> Result<(), DecodeError> {
        let start = cur.position();
        self.value.decode_value_implicit(schema, len, cur)?;
        self.raw = cur.data()[start..cur.position()].to_vec();
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Validators
// ---------------------------------------------------------------------------

impl<T, V> Validated<T, V> {
    fn check(
        &self,
        schema: &'static Schema,
        cur: &Cursor<'_>,
    ) -> Result<(), DecodeError>
    where
        V: Validate<T>,
    {
        V::validate(&self.value).map_err(|source| {
            cur.error(ErrorKind::ValidationFailed, "value validation error")
                .with_source(source)
                .with_context(schema.context_entry())
        })
    }
}

impl<'a, T: DerDecode<'a>, V: Validate<T>> DerDecode<'a> for Validated<T, V> {
    fn decode_explicit(
        &mut self,
        schema: &'static Schema,
        cur: &mut Cursor<'a>,
        max_len: usize,
    ) -> Result<(), DecodeError> {
        self.value.decode_explicit(schema, cur, max_len)?;
        self.check(schema, cur)
    }

    fn decode_implicit(
        &mut self,
        schema: &'static Schema,
        len: usize,
        cur: &mut Cursor<'a>,
    ) -> Result<(), DecodeError> {
        self.value.decode_implicit(schema, len, cur)?;
        self.check(schema, cur)
    }

    fn decode_known_tag(
        &mut self,
        schema: &'static Schema,
        tag: u8,
        len: usize,
        cur: &mut Cursor<'a>,
    ) -> Result<(), DecodeError> {
        self.value.decode_known_tag(schema, tag, len, cur)?;
        self.check(schema, cur)
    }

    fn decode_value_implicit(
        &mut self,
        schema: &'static Schema,
        len: usize,
        cur: &mut Cursor<'a>,
    ) -> Result<(), DecodeError> {
        self.value.decode_value_implicit(schema, len, cur)?;
        self.check(schema, cur)
    }
}

// ---------------------------------------------------------------------------
// Extension marker
// ---------------------------------------------------------------------------

impl<'a> DerDecode<'a> for ExtensionSentinel {
    fn decode_value_explicit(
        &mut self,
        schema: &'static Schema,
        cur: &mut Cursor<'a>,
        mut max_len: usize,
    ) -> Result<(), DecodeError> {
        if !matches!(schema.node, Node::ExtensionMarker) {
            binding_mismatch(schema, "ExtensionSentinel");
        }
        while max_len > 0 {
            let before = cur.position();
            let (_tag, len) = tlv::read_header(cur)?;
            let header_len = cur.position() - before;
            if header_len + len > max_len {
                return Err(cur.error(
                    ErrorKind::InvalidLength,
                    "length overruns the enclosing value",
                ));
            }
            cur.advance(len)?;
            max_len -= header_len + len;
        }
        Ok(())
    }

    fn decode_value_implicit(
        &mut self,
        _schema: &'static Schema,
        _len: usize,
        _cur: &mut Cursor<'a>,
    ) -> Result<(), DecodeError> {
        panic!("an extension marker cannot be decoded implicitly");
    }
}
