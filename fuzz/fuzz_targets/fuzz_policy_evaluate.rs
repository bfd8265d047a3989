#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use policy_gate::{Attributes, AuthorizationPolicy, PolicyEngine, StaticPolicyStore};

#[derive(Arbitrary, Debug)]
struct EvaluateInput {
    policy: String,
    target: String,
    attributes: Vec<(String, String)>,
}

// Arbitrary documents must either fail to parse or evaluate without panicking
fuzz_target!(|input: EvaluateInput| {
    let Ok(policy) = AuthorizationPolicy::from_json(&input.policy) else {
        return;
    };

    let engine = PolicyEngine::with_defaults("roles", StaticPolicyStore::new(policy));
    let attributes: Attributes = input.attributes.into_iter().collect();
    let _ = engine.evaluate(&input.target, &attributes);
});
