#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use policy_gate::glob_match;

#[derive(Arbitrary, Debug)]
struct GlobInput {
    target: String,
    pattern: String,
}

fuzz_target!(|input: GlobInput| {
    let matched = glob_match(&input.target, &input.pattern);

    if !input.pattern.contains('*') && !input.pattern.contains('?') {
        assert_eq!(matched, input.target == input.pattern);
    }

    assert!(glob_match(&input.target, "*"));
    assert_eq!(
        glob_match("", &input.pattern),
        input.pattern.chars().all(|c| c == '*')
    );
});
