//! Decision tree descent.

use std::collections::BTreeMap;

use crate::repr::DecisionTree;
use crate::vector::FieldValueMap;

use super::ClassPrediction;

/// Evaluate a decision tree against a processed field map.
///
/// Children are tried in document order. A predicate that is TRUE selects
/// its child; UNKNOWN (a missing field value) diverts to the node's
/// declared default child; if both children are FALSE the current node's
/// own score is the prediction (`returnLastPrediction`).
pub fn evaluate_tree(tree: &DecisionTree, map: &FieldValueMap, debug: bool) -> ClassPrediction {
    let mut node = 0;

    loop {
        if tree.is_leaf(node) {
            return prediction(tree.score(node), debug);
        }

        match tree.left_predicate(node).evaluate(map) {
            Some(true) => {
                node = tree.left_child(node);
                continue;
            }
            None => {
                node = tree.default_child(node);
                continue;
            }
            Some(false) => {}
        }

        match tree.right_predicate(node).evaluate(map) {
            Some(true) => {
                node = tree.right_child(node);
            }
            None => {
                node = tree.default_child(node);
            }
            Some(false) => {
                // No true child: the node's own prediction stands.
                return prediction(tree.score(node), debug);
            }
        }
    }
}

fn prediction(label: &str, debug: bool) -> ClassPrediction {
    ClassPrediction {
        label: label.to_owned(),
        scores: debug.then(|| BTreeMap::from([(label.to_owned(), 1.0)])),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::ProcessedValue;
    use crate::repr::{ComparisonOp, Predicate};
    use std::collections::BTreeSet;

    fn lt(field: &str, threshold: f64) -> Predicate {
        Predicate::Simple {
            field: field.into(),
            op: ComparisonOp::LessThan,
            value: ProcessedValue::Num(threshold),
        }
    }

    fn ge(field: &str, threshold: f64) -> Predicate {
        Predicate::Simple {
            field: field.into(),
            op: ComparisonOp::GreaterOrEqual,
            value: ProcessedValue::Num(threshold),
        }
    }

    /// Root splits on `age < 40` / `age >= 40`; the left branch splits
    /// again on `age < 20`. Default children lean left.
    fn age_tree() -> DecisionTree {
        let tree = DecisionTree::new(
            vec![
                "root".into(),
                "young".into(),
                "old".into(),
                "child".into(),
                "adult".into(),
            ],
            vec![false, false, true, true, true],
            vec![1, 3, 0, 0, 0],
            vec![2, 4, 0, 0, 0],
            vec![
                lt("age", 40.0),
                lt("age", 20.0),
                Predicate::True,
                Predicate::True,
                Predicate::True,
            ],
            vec![
                ge("age", 40.0),
                ge("age", 20.0),
                Predicate::True,
                Predicate::True,
                Predicate::True,
            ],
            vec![1, 3, 0, 0, 0],
        );
        tree.validate().unwrap();
        tree
    }

    fn map_with(field: &str, value: ProcessedValue) -> FieldValueMap {
        let mut map = FieldValueMap::new();
        map.insert(field.to_owned(), BTreeSet::from([value]));
        map
    }

    #[test]
    fn descends_to_matching_leaf() {
        let tree = age_tree();
        let child = map_with("age", ProcessedValue::Num(7.0));
        assert_eq!(evaluate_tree(&tree, &child, false).label, "child");

        let adult = map_with("age", ProcessedValue::Num(30.0));
        assert_eq!(evaluate_tree(&tree, &adult, false).label, "adult");

        let old = map_with("age", ProcessedValue::Num(64.0));
        assert_eq!(evaluate_tree(&tree, &old, false).label, "old");
    }

    #[test]
    fn missing_value_follows_default_child() {
        let tree = age_tree();
        let missing = map_with("age", ProcessedValue::Missing);
        // Root defaults to "young", which defaults to "child".
        assert_eq!(evaluate_tree(&tree, &missing, false).label, "child");
    }

    #[test]
    fn no_true_child_returns_current_node_score() {
        // Both children guarded by predicates a NaN-free value can fail.
        let tree = DecisionTree::new(
            vec!["stem".into(), "l".into(), "r".into()],
            vec![false, true, true],
            vec![1, 0, 0],
            vec![2, 0, 0],
            vec![lt("x", 0.0), Predicate::True, Predicate::True],
            vec![lt("x", -1.0), Predicate::True, Predicate::True],
            vec![1, 0, 0],
        );
        tree.validate().unwrap();

        let map = map_with("x", ProcessedValue::Num(5.0));
        let prediction = evaluate_tree(&tree, &map, false);
        assert_eq!(prediction.label, "stem");
    }

    #[test]
    fn debug_mode_reports_the_winning_label() {
        let tree = age_tree();
        let map = map_with("age", ProcessedValue::Num(50.0));
        let prediction = evaluate_tree(&tree, &map, true);
        assert_eq!(prediction.scores.unwrap()["old"], 1.0);
    }
}
