//! Declarative bindings from existing structs and enums to SEQUENCE/SET and
//! CHOICE schemas.

/// Binds an existing struct to SEQUENCE/SET schemas by listing its fields in
/// schema member order. A field written as `name = expr` declares the
/// default assigned when the schema marks that member OPTIONAL-DEFAULT and
/// the input omits it.
///
/// ```
/// use derspec::{der_record, Schema};
///
/// #[derive(Debug, Default, PartialEq)]
/// struct Measurement {
///     channel: i8,
///     scale: i16,
///     enabled: bool,
/// }
/// der_record!(Measurement { channel, scale = 100, enabled });
///
/// static CHANNEL: Schema = Schema::integer().named("channel");
/// static SCALE: Schema = Schema::integer().named("scale");
/// static SCALE_DEFAULT: Schema = Schema::optional_default(&SCALE);
/// static ENABLED: Schema = Schema::boolean().named("enabled");
/// static MEASUREMENT: Schema =
///     Schema::sequence(&[&CHANNEL, &SCALE_DEFAULT, &ENABLED]).named("measurement");
///
/// let input = [0x30, 0x06, 0x02, 0x01, 0x07, 0x01, 0x01, 0xFF];
/// let m: Measurement = derspec::decode_to(&MEASUREMENT, &input).unwrap();
/// assert_eq!(
///     m,
///     Measurement { channel: 7, scale: 100, enabled: true }
/// );
/// ```
#[macro_export]
macro_rules! der_record {
    ($name:ident { $($field:ident $(= $default:expr)?),+ $(,)? }) => {
        $crate::der_record!(@impl ($name) ('derspec_input) { $($field $(= $default)?),+ });
    };
    ($name:ident<$lt:lifetime> { $($field:ident $(= $default:expr)?),+ $(,)? }) => {
        $crate::der_record!(@impl ($name<$lt>) ($lt) { $($field $(= $default)?),+ });
    };
    (@impl ($($target:tt)+) ($lt:lifetime) { $($field:ident $(= $default:expr)?),+ }) => {
        impl<$lt> $crate::decode::DerRecord<$lt> for $($target)+ {
            fn field_count() -> usize {
                0usize $(+ {
                    let _ = stringify!($field);
                    1usize
                })+
            }

            fn decode_field(
                &mut self,
                index: usize,
                schema: &'static $crate::Schema,
                mode: $crate::decode::DecodeMode,
                cur: &mut $crate::Cursor<$lt>,
            ) -> ::core::result::Result<(), $crate::DecodeError> {
                let mut current = 0usize;
                $(
                    if index == current {
                        return $crate::decode::decode_in_mode(
                            &mut self.$field,
                            schema,
                            mode,
                            cur,
                        );
                    }
                    current += 1;
                )+
                let _ = current;
                ::core::panic!("record field index {} out of range", index);
            }

            fn assign_field_default(&mut self, index: usize) {
                let mut current = 0usize;
                $(
                    $(
                        if index == current {
                            self.$field = $default;
                            return;
                        }
                    )?
                    current += 1;
                )+
                let _ = current;
                ::core::panic!("record field {} has no default value", index);
            }
        }

        impl<$lt> $crate::DerDecode<$lt> for $($target)+ {
            fn decode_value_implicit(
                &mut self,
                schema: &'static $crate::Schema,
                len: usize,
                cur: &mut $crate::Cursor<$lt>,
            ) -> ::core::result::Result<(), $crate::DecodeError> {
                $crate::decode::decode_record_value(self, schema, len, cur)
            }
        }
    };
}

/// Binds an existing single-field-variant enum to a CHOICE schema by
/// listing its variants in schema alternative order.
///
/// ```
/// use derspec::{der_choice, Schema};
///
/// #[derive(Debug, Default, PartialEq)]
/// enum Reading {
///     #[default]
///     Unknown,
///     Flag(bool),
///     Count(i64),
/// }
/// der_choice!(Reading { Flag(bool), Count(i64) });
///
/// static FLAG: Schema = Schema::boolean().named("flag");
/// static COUNT: Schema = Schema::integer().named("count");
/// static READING: Schema = Schema::choice(&[&FLAG, &COUNT]).named("reading");
///
/// let r: Reading = derspec::decode_to(&READING, &[0x02, 0x01, 0x05]).unwrap();
/// assert_eq!(r, Reading::Count(5));
/// let r: Reading = derspec::decode_to(&READING, &[0x01, 0x01, 0xFF]).unwrap();
/// assert_eq!(r, Reading::Flag(true));
/// ```
#[macro_export]
macro_rules! der_choice {
    ($name:ident { $($variant:ident($ty:ty)),+ $(,)? }) => {
        $crate::der_choice!(@impl ($name) ('derspec_input) $name { $($variant($ty)),+ });
    };
    ($name:ident<$lt:lifetime> { $($variant:ident($ty:ty)),+ $(,)? }) => {
        $crate::der_choice!(@impl ($name<$lt>) ($lt) $name { $($variant($ty)),+ });
    };
    (@impl ($($target:tt)+) ($lt:lifetime) $enum_name:ident { $($variant:ident($ty:ty)),+ }) => {
        impl<$lt> $crate::decode::DerChoice<$lt> for $($target)+ {
            fn alternative_count() -> usize {
                0usize $(+ {
                    let _ = stringify!($variant);
                    1usize
                })+
            }

            fn decode_alternative(
                &mut self,
                index: usize,
                schema: &'static $crate::Schema,
                tag: u8,
                len: usize,
                cur: &mut $crate::Cursor<$lt>,
            ) -> ::core::result::Result<(), $crate::DecodeError> {
                let mut current = 0usize;
                $(
                    if index == current {
                        let mut value: $ty = ::core::default::Default::default();
                        $crate::decode::decode_alternative_value(
                            &mut value, schema, tag, len, cur,
                        )?;
                        *self = $enum_name::$variant(value);
                        return ::core::result::Result::Ok(());
                    }
                    current += 1;
                )+
                let _ = current;
                ::core::panic!("choice alternative index {} out of range", index);
            }
        }

        impl<$lt> $crate::DerDecode<$lt> for $($target)+ {
            fn decode_value_explicit(
                &mut self,
                schema: &'static $crate::Schema,
                cur: &mut $crate::Cursor<$lt>,
                max_len: usize,
            ) -> ::core::result::Result<(), $crate::DecodeError> {
                $crate::decode::decode_choice_value_explicit(self, schema, cur, max_len)
            }

            fn decode_value_implicit(
                &mut self,
                _schema: &'static $crate::Schema,
                _len: usize,
                _cur: &mut $crate::Cursor<$lt>,
            ) -> ::core::result::Result<(), $crate::DecodeError> {
                ::core::panic!("CHOICE cannot be decoded implicitly");
            }

            fn decode_value_known_tag(
                &mut self,
                schema: &'static $crate::Schema,
                tag: u8,
                len: usize,
                cur: &mut $crate::Cursor<$lt>,
            ) -> ::core::result::Result<(), $crate::DecodeError> {
                $crate::decode::decode_choice_value_known_tag(self, schema, tag, len, cur)
            }
        }
    };
}
