#![no_main]

use avl_arena::model::CursorEquivalenceInput;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|input: CursorEquivalenceInput| {
    avl_arena::model::run_cursor_equivalence(input.values, input.ops);
});
