//! Conversion of `GeneralRegressionModel` (multinomial logistic).
//!
//! Slot order comes from the `ParameterList`: each parameter with a
//! `PPMatrix` cell claims the next slot(s); the intercept parameter (no
//! cell) is appended after all field ranges. `ParamMatrix` betas then fill
//! the coefficient matrix against exactly that slot assignment.

use std::collections::HashMap;

use ndarray::{Array1, Array2};
use roxmltree::Node;

use crate::inference::Evaluator;
use crate::repr::{GeneralizedLinearModel, LinkFunction};
use crate::vector::{
    CategoricalEntries, ContinuousEntry, InputForm, InterceptEntry, TermWeight, VectorRange,
    Vectorizer,
};

use super::dict::{DataDictionary, DerivedFields};
use super::fields::resolve;
use super::xml::{element_children, find_child, require_attr, require_child, require_f64};
use super::{PmmlError, PmmlPipeline};

#[derive(Debug, Clone)]
struct PpCell {
    predictor: String,
    /// Category for a one-hot parameter; `None` marks a continuous one.
    value: Option<String>,
}

pub(super) fn build(
    node: Node<'_, '_>,
    data_dict: &DataDictionary,
    derived: &DerivedFields,
) -> Result<PmmlPipeline, PmmlError> {
    let function = require_attr(node, "functionName")?;
    if function != "classification" {
        return Err(PmmlError::Unsupported {
            construct: "GeneralRegressionModel functionName",
            detail: format!("`{function}`"),
        });
    }
    let model_type = require_attr(node, "modelType")?;
    if model_type != "multinomialLogistic" {
        return Err(PmmlError::Unsupported {
            construct: "GeneralRegressionModel modelType",
            detail: format!("`{model_type}`"),
        });
    }

    // ParameterList order is the slot assignment order.
    let parameter_list = require_child(node, "ParameterList")?;
    let parameters: Vec<String> = element_children(parameter_list)
        .filter(|n| n.tag_name().name() == "Parameter")
        .map(|n| require_attr(n, "name").map(str::to_owned))
        .collect::<Result<_, _>>()?;

    // PPMatrix cells grouped per parameter.
    let mut cells: HashMap<String, Vec<PpCell>> = HashMap::new();
    if let Some(pp_matrix) = find_child(node, "PPMatrix") {
        for cell in element_children(pp_matrix).filter(|n| n.tag_name().name() == "PPCell") {
            let parameter = require_attr(cell, "parameterName")?.to_owned();
            cells.entry(parameter).or_default().push(PpCell {
                predictor: require_attr(cell, "predictorName")?.to_owned(),
                value: cell.attribute("value").map(str::to_owned),
            });
        }
    }

    let (ranges, slots, intercept_param) =
        build_ranges(&parameters, &cells, data_dict, derived)?;
    let n_slots = slots.len() + usize::from(intercept_param.is_some());

    // Append the intercept slot after all field ranges.
    let mut ranges = ranges;
    let mut slot_of: HashMap<String, usize> = slots
        .iter()
        .enumerate()
        .map(|(i, name)| (name.clone(), i))
        .collect();
    if let Some(name) = &intercept_param {
        ranges.push(VectorRange::Intercept(InterceptEntry {
            offset: n_slots - 1,
        }));
        slot_of.insert(name.clone(), n_slots - 1);
    }

    // Target categories: an explicit Targets element wins, otherwise the
    // ParamMatrix order of first appearance.
    let param_matrix = require_child(node, "ParamMatrix")?;
    let mut classes: Vec<String> = Vec::new();
    if let Some(targets) = find_child(node, "Targets") {
        for target in element_children(targets).filter(|n| n.tag_name().name() == "Target") {
            for value in element_children(target).filter(|n| n.tag_name().name() == "TargetValue") {
                classes.push(require_attr(value, "value")?.to_owned());
            }
        }
    }
    let explicit_targets = !classes.is_empty();
    for cell in element_children(param_matrix).filter(|n| n.tag_name().name() == "PCell") {
        let category = require_attr(cell, "targetCategory")?.to_owned();
        if !classes.contains(&category) {
            if explicit_targets {
                return Err(PmmlError::UnknownReference {
                    element: "PCell",
                    kind: "target category",
                    name: category,
                });
            }
            classes.push(category);
        }
    }
    if classes.len() < 2 {
        return Err(PmmlError::Unsupported {
            construct: "GeneralRegressionModel",
            detail: format!("{} target categories, need at least two", classes.len()),
        });
    }

    let mut coefficients = Array2::<f64>::zeros((n_slots, classes.len()));
    for cell in element_children(param_matrix).filter(|n| n.tag_name().name() == "PCell") {
        let category = require_attr(cell, "targetCategory")?;
        let parameter = require_attr(cell, "parameterName")?;
        let beta = require_f64(cell, "beta")?;

        let class = classes.iter().position(|c| c == category).expect("checked above");
        let slot = slot_of
            .get(parameter)
            .copied()
            .ok_or_else(|| PmmlError::UnknownReference {
                element: "PCell",
                kind: "parameter",
                name: parameter.to_owned(),
            })?;
        coefficients[[slot, class]] = beta;
    }

    let vectorizer = Vectorizer::new(ranges, InputForm::Sparse);
    let model = GeneralizedLinearModel::new(
        coefficients,
        Array1::zeros(classes.len()),
        classes,
        LinkFunction::Softmax,
    );
    assert_eq!(
        vectorizer.length(),
        model.n_slots(),
        "vector slots don't match the coefficient table"
    );

    Ok(PmmlPipeline {
        vectorizer,
        evaluator: Evaluator::GeneralizedLinear(model),
    })
}

/// Field ranges in parameter order; returns `(ranges, slot parameter
/// names, intercept parameter)`.
fn build_ranges(
    parameters: &[String],
    cells: &HashMap<String, Vec<PpCell>>,
    data_dict: &DataDictionary,
    derived: &DerivedFields,
) -> Result<(Vec<VectorRange>, Vec<String>, Option<String>), PmmlError> {
    let mut ranges: Vec<VectorRange> = Vec::new();
    let mut slots: Vec<String> = Vec::new();
    let mut intercept_param: Option<String> = None;

    for name in parameters {
        let Some(param_cells) = cells.get(name) else {
            // No predictor behind it: the intercept parameter.
            if intercept_param.is_some() {
                return Err(PmmlError::Unsupported {
                    construct: "ParameterList",
                    detail: format!(
                        "parameters `{}` and `{name}` both lack PPMatrix cells",
                        intercept_param.as_deref().unwrap_or_default()
                    ),
                });
            }
            intercept_param = Some(name.clone());
            continue;
        };
        if param_cells.len() != 1 {
            return Err(PmmlError::Unsupported {
                construct: "PPMatrix",
                detail: format!(
                    "parameter `{name}` spans {} predictors (interaction terms)",
                    param_cells.len()
                ),
            });
        }

        let cell = &param_cells[0];
        let resolved = resolve(&cell.predictor, derived)?;
        data_dict.require(&resolved.raw_field)?;
        let offset = slots.len();

        match &cell.value {
            None => {
                ranges.push(VectorRange::Continuous(ContinuousEntry {
                    field: resolved.raw_field,
                    offset,
                    steps: resolved.steps,
                }));
            }
            Some(category) => {
                // Fold into the previous range when it one-hots the same
                // predictor; slot order is still parameter order.
                if let Some(VectorRange::Categorical(prev)) = ranges.last_mut() {
                    let contiguous = prev.offset + prev.categories.len() == offset;
                    if prev.field == resolved.raw_field && contiguous {
                        prev.categories.push(category.clone());
                        slots.push(name.clone());
                        continue;
                    }
                }
                ranges.push(VectorRange::Categorical(CategoricalEntries {
                    field: resolved.raw_field,
                    offset,
                    categories: vec![category.clone()],
                    weight: TermWeight::Occurrence,
                    steps: resolved.steps,
                }));
            }
        }
        slots.push(name.clone());
    }

    Ok((ranges, slots, intercept_param))
}

#[cfg(test)]
mod tests {
    use super::super::parse;
    use super::*;
    use crate::data::MapDataSource;

    const IRIS_LIKE: &str = r#"<PMML version="4.2">
        <DataDictionary>
            <DataField name="petal_len" optype="continuous" dataType="double"/>
            <DataField name="color" optype="categorical" dataType="string">
                <Value value="red"/><Value value="blue"/>
            </DataField>
        </DataDictionary>
        <GeneralRegressionModel functionName="classification" modelType="multinomialLogistic">
            <ParameterList>
                <Parameter name="p0" label="Intercept"/>
                <Parameter name="p1" label="petal_len"/>
                <Parameter name="p2" label="color: red"/>
                <Parameter name="p3" label="color: blue"/>
            </ParameterList>
            <PPMatrix>
                <PPCell predictorName="petal_len" parameterName="p1"/>
                <PPCell value="red" predictorName="color" parameterName="p2"/>
                <PPCell value="blue" predictorName="color" parameterName="p3"/>
            </PPMatrix>
            <ParamMatrix>
                <PCell targetCategory="setosa" parameterName="p0" beta="1.0"/>
                <PCell targetCategory="setosa" parameterName="p1" beta="-2.0"/>
                <PCell targetCategory="setosa" parameterName="p2" beta="0.5"/>
                <PCell targetCategory="virginica" parameterName="p0" beta="-1.0"/>
                <PCell targetCategory="virginica" parameterName="p1" beta="2.0"/>
                <PCell targetCategory="virginica" parameterName="p3" beta="0.25"/>
            </ParamMatrix>
        </GeneralRegressionModel>
    </PMML>"#;

    #[test]
    fn intercept_slot_is_appended_after_field_ranges() {
        let pipeline = parse(IRIS_LIKE).unwrap();
        // petal_len + red + blue + intercept
        assert_eq!(pipeline.vectorizer.length(), 4);

        let ranges = pipeline.vectorizer.ranges();
        assert!(matches!(&ranges[0], VectorRange::Continuous(c) if c.offset == 0));
        assert!(matches!(
            &ranges[1],
            VectorRange::Categorical(c) if c.offset == 1 && c.categories == vec!["red", "blue"]
        ));
        assert!(matches!(&ranges[2], VectorRange::Intercept(i) if i.offset == 3));
    }

    #[test]
    fn softmax_argmax_picks_the_category() {
        let pipeline = parse(IRIS_LIKE).unwrap();

        // Short petal, red: setosa scores 1.0 - 2.0*1.0 + 0.5 = -0.5,
        // virginica scores -1.0 + 2.0*1.0 = 1.0.
        let source = MapDataSource::new()
            .with_field("petal_len", [1.0])
            .with_field("color", ["red"]);
        let input = pipeline.vectorizer.convert(&source).unwrap();
        let prediction = pipeline.evaluator.evaluate(&input, true);
        assert_eq!(prediction.label, "virginica");

        let scores = prediction.scores.unwrap();
        assert!((scores["setosa"] + scores["virginica"] - 1.0).abs() < 1e-9);
    }

    #[test]
    fn unknown_parameter_in_param_matrix_is_rejected() {
        let xml = IRIS_LIKE.replace("parameterName=\"p3\"", "parameterName=\"p9\"");
        let err = parse(&xml).unwrap_err();
        assert!(matches!(
            err,
            PmmlError::UnknownReference { kind: "parameter", ref name, .. } if name == "p9"
        ));
    }

    #[test]
    fn non_multinomial_model_type_is_unsupported() {
        let xml = IRIS_LIKE.replace("multinomialLogistic", "regression");
        let err = parse(&xml).unwrap_err();
        assert!(err.to_string().contains("modelType"));
    }

    #[test]
    fn interaction_parameters_are_unsupported() {
        let xml = IRIS_LIKE.replace(
            r#"<PPCell predictorName="petal_len" parameterName="p1"/>"#,
            r#"<PPCell predictorName="petal_len" parameterName="p1"/>
               <PPCell value="red" predictorName="color" parameterName="p1"/>"#,
        );
        let err = parse(&xml).unwrap_err();
        assert!(err.to_string().contains("interaction"));
    }
}
