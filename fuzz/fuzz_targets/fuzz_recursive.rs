#![no_main]
use derspec::{der_record, Schema};
use libfuzzer_sys::fuzz_target;

#[derive(Debug, Default)]
struct Node {
    value: i64,
    next: Option<Box<Node>>,
}
der_record!(Node { value, next });

fn node_schema() -> &'static Schema {
    &NODE
}

static VALUE: Schema = Schema::integer();
static NEXT_REC: Schema = Schema::recursive(node_schema);
static NEXT: Schema = Schema::optional(&NEXT_REC);
static NODE: Schema = Schema::sequence(&[&VALUE, &NEXT]).named("node");

fuzz_target!(|data: &[u8]| {
    // The depth budget keeps adversarial nesting from exhausting the stack.
    let _ = derspec::decode_to_with_depth::<Node>(&NODE, data, 64);
});
