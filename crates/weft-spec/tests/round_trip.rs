//! Property tests for the slice/merge round trip.
//!
//! For any state tree and any set of READ declarations whose paths all
//! exist, slicing yields exactly those paths with unmodified values, and
//! merging the slice back through matching WRITE declarations reproduces
//! the original values.

use proptest::collection::vec;
use proptest::prelude::*;
use serde_json::{json, Map, Value};
use weft_spec::{merge, slice, AccessCode, AccessNode, Path, Sliced};

/// Scalar leaf values for generated state trees.
fn leaf_value() -> impl Strategy<Value = Value> {
    prop_oneof![
        any::<i64>().prop_map(|n| json!(n)),
        any::<bool>().prop_map(|b| json!(b)),
        "[a-z]{0,8}".prop_map(|s| json!(s)),
    ]
}

/// A two-level state tree: top-level keys hold either a scalar or a
/// nested mapping of scalars. Key sets are disjoint per level by
/// construction (distinct prefixes).
fn state_tree() -> impl Strategy<Value = Value> {
    let scalar_entry = ("s[a-d]", leaf_value());
    let nested_entry = (
        "n[a-d]",
        vec(("k[a-d]", leaf_value()), 1..4).prop_map(|entries| {
            let mut map = Map::new();
            for (k, v) in entries {
                map.insert(k, v);
            }
            Value::Object(map)
        }),
    );
    (vec(scalar_entry, 0..4), vec(nested_entry, 0..4)).prop_map(|(scalars, nests)| {
        let mut map = Map::new();
        for (k, v) in scalars.into_iter().chain(nests) {
            map.insert(k, v);
        }
        Value::Object(map)
    })
}

/// Every concrete path through a two-level tree, as key sequences.
fn all_paths(state: &Value) -> Vec<Vec<String>> {
    let mut paths = Vec::new();
    if let Value::Object(map) = state {
        for (key, value) in map {
            match value {
                Value::Object(sub) => {
                    for sub_key in sub.keys() {
                        paths.push(vec![key.clone(), sub_key.clone()]);
                    }
                }
                _ => paths.push(vec![key.clone()]),
            }
        }
    }
    paths
}

fn spec_for(paths: &[Vec<String>], code: AccessCode) -> AccessNode {
    let mut spec = AccessNode::branch();
    for path in paths {
        spec.declare(&Path::from(path.clone()), code);
    }
    spec
}

fn value_at<'a>(state: &'a Value, path: &[String]) -> Option<&'a Value> {
    let mut node = state;
    for key in path {
        node = node.as_object()?.get(key)?;
    }
    Some(node)
}

proptest! {
    #[test]
    fn read_slice_then_write_merge_reproduces_values(state in state_tree()) {
        let paths = all_paths(&state);
        prop_assume!(!paths.is_empty());

        let reads = spec_for(&paths, AccessCode::Read);
        let view = match slice(&state, &reads).unwrap() {
            Sliced::Ready(view) => view,
            Sliced::Unsatisfied => panic!("all declared paths exist"),
        };

        // The slice holds exactly the declared paths, values unmodified.
        for path in &paths {
            prop_assert_eq!(value_at(&view, path), value_at(&state, path));
        }

        // Merging the slice back over the original reproduces it.
        let writes = spec_for(&paths, AccessCode::Write);
        let mut merged = state.clone();
        let Value::Object(output) = view else {
            panic!("slice of a branch spec is a mapping");
        };
        merge(&mut merged, &output, &writes).unwrap();
        prop_assert_eq!(merged, state);
    }

    #[test]
    fn slice_never_invents_keys(state in state_tree()) {
        let paths = all_paths(&state);
        prop_assume!(!paths.is_empty());

        let reads = spec_for(&paths, AccessCode::Read);
        let Sliced::Ready(view) = slice(&state, &reads).unwrap() else {
            panic!("all declared paths exist");
        };
        for path in all_paths(&view) {
            prop_assert!(value_at(&state, &path).is_some());
        }
    }

    #[test]
    fn merge_into_empty_state_carries_only_declared_paths(state in state_tree()) {
        let paths = all_paths(&state);
        prop_assume!(!paths.is_empty());

        let reads = spec_for(&paths, AccessCode::Read);
        let Sliced::Ready(view) = slice(&state, &reads).unwrap() else {
            panic!("all declared paths exist");
        };
        let writes = spec_for(&paths, AccessCode::Write);
        let mut rebuilt = json!({});
        let Value::Object(output) = view else {
            panic!("slice of a branch spec is a mapping");
        };
        merge(&mut rebuilt, &output, &writes).unwrap();
        for path in &paths {
            prop_assert_eq!(value_at(&rebuilt, path), value_at(&state, path));
        }
    }
}
