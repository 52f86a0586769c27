//! Log-space naive Bayes evaluation over mixed inputs.

use std::collections::BTreeMap;

use crate::data::ProcessedValue;
use crate::repr::NaiveBayesModel;
use crate::vector::FieldValueMap;

use super::ClassPrediction;

/// Evaluate a naive Bayes model against a processed field map.
///
/// For each class: `log(prior) + Σ f_i(x_i)` over the inputs in declared
/// order. The per-field function reads the raw categorical value or the
/// numeric continuous value itself; absence arrives as the `Missing`
/// variant and is scored by the function's floor policy, never an error.
pub fn evaluate_naive_bayes(
    model: &NaiveBayesModel,
    map: &FieldValueMap,
    debug: bool,
) -> ClassPrediction {
    let missing = ProcessedValue::Missing;
    let threshold = model.threshold();

    let mut totals: Vec<f64> = (0..model.classes().len())
        .map(|c| model.log_prior(c))
        .collect();

    for input in model.inputs() {
        // First non-missing value in set order; multi-valued fields stay
        // deterministic because the map holds BTreeSets.
        let value = map
            .get(&input.field)
            .and_then(|set| set.iter().find(|v| !v.is_missing()))
            .unwrap_or(&missing);

        for (class, total) in totals.iter_mut().enumerate() {
            *total += input.log_likelihood(value, class, threshold);
        }
    }

    // First-declared class wins ties.
    let mut winner = 0;
    for (i, total) in totals.iter().enumerate().skip(1) {
        if *total > totals[winner] {
            winner = i;
        }
    }

    ClassPrediction {
        label: model.classes()[winner].clone(),
        scores: debug.then(|| {
            model
                .classes()
                .iter()
                .cloned()
                .zip(totals)
                .collect::<BTreeMap<_, _>>()
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repr::{BayesInput, BayesInputKind, DiscreteCounts, GaussianParams};
    use approx::assert_relative_eq;
    use std::collections::{BTreeSet, HashMap};

    const THRESHOLD: f64 = 1e-4;

    /// Two classes ("good", "bad"), one categorical field with counts
    /// {A:3, B:1} under "good" and {A:1, B:3} under "bad".
    fn categorical_model() -> NaiveBayesModel {
        NaiveBayesModel::new(
            vec!["good".into(), "bad".into()],
            vec![0.5f64.ln(), 0.5f64.ln()],
            vec![BayesInput {
                field: "cat".into(),
                kind: BayesInputKind::Categorical(vec![
                    DiscreteCounts::new(HashMap::from([
                        ("A".to_owned(), 3.0),
                        ("B".to_owned(), 1.0),
                    ])),
                    DiscreteCounts::new(HashMap::from([
                        ("A".to_owned(), 1.0),
                        ("B".to_owned(), 3.0),
                    ])),
                ]),
            }],
            THRESHOLD,
        )
    }

    fn map_with(field: &str, value: ProcessedValue) -> FieldValueMap {
        let mut map = FieldValueMap::new();
        map.insert(field.to_owned(), BTreeSet::from([value]));
        map
    }

    #[test]
    fn argmax_matches_manual_computation() {
        let model = categorical_model();
        let map = map_with("cat", ProcessedValue::Str("A".into()));

        let prediction = evaluate_naive_bayes(&model, &map, true);
        assert_eq!(prediction.label, "good");

        let scores = prediction.scores.unwrap();
        assert_relative_eq!(scores["good"], 0.5f64.ln() + 0.75f64.ln(), epsilon = 1e-12);
        assert_relative_eq!(scores["bad"], 0.5f64.ln() + 0.25f64.ln(), epsilon = 1e-12);
    }

    #[test]
    fn category_b_flips_the_decision() {
        let model = categorical_model();
        let map = map_with("cat", ProcessedValue::Str("B".into()));
        assert_eq!(evaluate_naive_bayes(&model, &map, false).label, "bad");
    }

    #[test]
    fn missing_categorical_uses_floor_and_does_not_throw() {
        let model = categorical_model();

        let explicit = map_with("cat", ProcessedValue::Missing);
        let prediction = evaluate_naive_bayes(&model, &explicit, true);
        let scores = prediction.scores.unwrap();
        // Both classes get the same floor; priors tie, argmax takes the first.
        assert_relative_eq!(scores["good"], scores["bad"], epsilon = 1e-12);
        assert_eq!(prediction.label, "good");

        // Absent from the map entirely behaves the same.
        let absent = evaluate_naive_bayes(&model, &FieldValueMap::new(), true);
        assert_eq!(absent.scores.unwrap()["good"], scores["good"]);
    }

    #[test]
    fn unseen_category_scores_floor_probability() {
        let model = categorical_model();
        let map = map_with("cat", ProcessedValue::Str("Z".into()));
        let scores = evaluate_naive_bayes(&model, &map, true).scores.unwrap();
        assert_relative_eq!(
            scores["good"],
            0.5f64.ln() + THRESHOLD.ln(),
            epsilon = 1e-12
        );
    }

    #[test]
    fn mixed_continuous_and_categorical_inputs() {
        let model = NaiveBayesModel::new(
            vec!["good".into(), "bad".into()],
            vec![0.6f64.ln(), 0.4f64.ln()],
            vec![
                BayesInput {
                    field: "age".into(),
                    kind: BayesInputKind::Continuous(vec![
                        GaussianParams {
                            mean: 30.0,
                            variance: 4.0,
                        },
                        GaussianParams {
                            mean: 60.0,
                            variance: 4.0,
                        },
                    ]),
                },
                BayesInput {
                    field: "cat".into(),
                    kind: BayesInputKind::Categorical(vec![
                        DiscreteCounts::new(HashMap::from([("A".to_owned(), 1.0)])),
                        DiscreteCounts::new(HashMap::from([("A".to_owned(), 1.0)])),
                    ]),
                },
            ],
            THRESHOLD,
        );

        let mut map = map_with("age", ProcessedValue::Num(31.0));
        map.insert(
            "cat".into(),
            BTreeSet::from([ProcessedValue::Str("A".into())]),
        );
        assert_eq!(evaluate_naive_bayes(&model, &map, false).label, "good");

        let mut map = map_with("age", ProcessedValue::Num(59.0));
        map.insert(
            "cat".into(),
            BTreeSet::from([ProcessedValue::Str("A".into())]),
        );
        assert_eq!(evaluate_naive_bayes(&model, &map, false).label, "bad");
    }
}
