#![no_main]
use derspec::{der_record, BitStringValue, GeneralizedTime, Oid, Schema, UtcTime};
use libfuzzer_sys::fuzz_target;

#[derive(Debug, Default)]
struct Record<'a> {
    version: i32,
    serial: &'a [u8],
    oid: Oid,
    bits: Option<BitStringValue<Vec<u8>>>,
    issued: Option<UtcTime>,
    expires: Option<GeneralizedTime>,
    names: Vec<String>,
}
der_record!(Record<'a> {
    version = 0,
    serial,
    oid,
    bits,
    issued,
    expires,
    names
});

static VERSION_INT: Schema = Schema::integer().named("version");
static VERSION_TAGGED: Schema = Schema::explicit_context(0, &VERSION_INT);
static VERSION: Schema = Schema::optional_default(&VERSION_TAGGED);
static SERIAL: Schema = Schema::integer().named("serial");
static OID: Schema = Schema::object_identifier().named("oid");
static BITS_INNER: Schema = Schema::bit_string().named("bits");
static BITS: Schema = Schema::optional(&BITS_INNER);
static ISSUED_INNER: Schema = Schema::utc_time().named("issued");
static ISSUED: Schema = Schema::optional(&ISSUED_INNER);
static EXPIRES_INNER: Schema = Schema::generalized_time().named("expires");
static EXPIRES: Schema = Schema::optional(&EXPIRES_INNER);
static NAME: Schema = Schema::utf8_string().named("name");
static NAMES: Schema = Schema::sequence_of(&NAME).named("names");
static RECORD: Schema = Schema::sequence(&[
    &VERSION, &SERIAL, &OID, &BITS, &ISSUED, &EXPIRES, &NAMES,
])
.named("record");
static ANY: Schema = Schema::any();

fuzz_target!(|data: &[u8]| {
    // Decoding arbitrary bytes must fail cleanly, never panic.
    let _ = derspec::decode_to::<Record<'_>>(&RECORD, data);
    let _ = derspec::decode_to::<&[u8]>(&ANY, data);
});
