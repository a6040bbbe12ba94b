use proptest::prelude::*;
use redraft_patch::{apply_ops, diff, Op};
use serde_json::{Map, Value};

fn json_value() -> impl Strategy<Value = Value> {
    let leaf = prop_oneof![
        Just(Value::Null),
        any::<bool>().prop_map(Value::Bool),
        (-5i64..5).prop_map(Value::from),
        "[ab ]{0,3}".prop_map(Value::String),
    ];
    leaf.prop_recursive(3, 32, 4, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..5).prop_map(Value::Array),
            prop::collection::btree_map("[abc]", inner, 0..4)
                .prop_map(|entries| Value::Object(entries.into_iter().collect::<Map<_, _>>())),
        ]
    })
}

proptest! {
    #[test]
    fn applying_the_diff_reaches_the_destination(src in json_value(), dst in json_value()) {
        let ops = diff(&src, &dst);
        let mut doc = src.clone();
        apply_ops(&mut doc, &ops).unwrap();
        prop_assert_eq!(doc, dst);
    }

    #[test]
    fn patches_survive_their_json_form(src in json_value(), dst in json_value()) {
        let ops = diff(&src, &dst);
        let parsed: Vec<Op> = ops.iter().map(|op| Op::from_json(&op.to_json()).unwrap()).collect();
        prop_assert_eq!(parsed, ops);
    }
}
