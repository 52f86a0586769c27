//! Conversion of `RegressionModel` (binary two-table classification).

use ndarray::{Array1, Array2};
use roxmltree::Node;

use crate::inference::Evaluator;
use crate::repr::{GeneralizedLinearModel, LinkFunction};
use crate::vector::{
    CategoricalEntries, ContinuousEntry, InputForm, TermWeight, VectorRange, Vectorizer,
};

use super::dict::{DataDictionary, DerivedFields};
use super::fields::resolve;
use super::xml::{element_children, opt_f64, require_attr, require_f64};
use super::{PmmlError, PmmlPipeline};

/// One predictor of a regression table, in document order.
#[derive(Debug, Clone, PartialEq)]
enum Predictor {
    Numeric { name: String, coefficient: f64 },
    Categorical {
        name: String,
        value: String,
        coefficient: f64,
    },
}

impl Predictor {
    fn name(&self) -> &str {
        match self {
            Predictor::Numeric { name, .. } => name,
            Predictor::Categorical { name, .. } => name,
        }
    }
}

#[derive(Debug)]
struct RegressionTable {
    target_category: String,
    intercept: f64,
    predictors: Vec<Predictor>,
}

/// Slot key: which (field[, category]) a vector index belongs to, used to
/// line the second table's coefficients up with the first table's slots.
#[derive(Debug, Clone, PartialEq)]
enum SlotKey {
    Numeric(String),
    Categorical(String, String),
}

pub(super) fn build(
    node: Node<'_, '_>,
    data_dict: &DataDictionary,
    derived: &DerivedFields,
) -> Result<PmmlPipeline, PmmlError> {
    let function = require_attr(node, "functionName")?;
    if function != "classification" {
        return Err(PmmlError::Unsupported {
            construct: "RegressionModel functionName",
            detail: format!("`{function}`"),
        });
    }

    let link = match node.attribute("normalizationMethod").unwrap_or("none") {
        "logit" => LinkFunction::Logit,
        "none" => LinkFunction::None,
        other => {
            return Err(PmmlError::Unsupported {
                construct: "normalization method",
                detail: format!("`{other}`"),
            })
        }
    };

    let tables: Vec<RegressionTable> = element_children(node)
        .filter(|n| n.tag_name().name() == "RegressionTable")
        .map(parse_table)
        .collect::<Result<_, _>>()?;
    if tables.len() != 2 {
        return Err(PmmlError::Unsupported {
            construct: "RegressionModel",
            detail: format!(
                "{} regression tables, only binary two-table classification is supported",
                tables.len()
            ),
        });
    }

    // The first table's predictor order pins down the slot assignment.
    let (ranges, keys) = build_ranges(&tables[0].predictors, data_dict, derived)?;
    let n_slots = keys.len();

    let mut coefficients = Array2::<f64>::zeros((n_slots, 2));
    for (slot, predictor) in tables[0].predictors.iter().enumerate() {
        coefficients[[slot, 0]] = match predictor {
            Predictor::Numeric { coefficient, .. } => *coefficient,
            Predictor::Categorical { coefficient, .. } => *coefficient,
        };
    }
    for predictor in &tables[1].predictors {
        let key = slot_key(predictor);
        let slot = keys.iter().position(|k| *k == key).ok_or_else(|| {
            PmmlError::Unsupported {
                construct: "RegressionTable",
                detail: format!(
                    "second table predictor `{}` has no counterpart in the first table",
                    predictor.name()
                ),
            }
        })?;
        coefficients[[slot, 1]] = match predictor {
            Predictor::Numeric { coefficient, .. } => *coefficient,
            Predictor::Categorical { coefficient, .. } => *coefficient,
        };
    }

    let vectorizer = Vectorizer::new(ranges, InputForm::Sparse);
    let model = GeneralizedLinearModel::new(
        coefficients,
        Array1::from_vec(vec![tables[0].intercept, tables[1].intercept]),
        vec![
            tables[0].target_category.clone(),
            tables[1].target_category.clone(),
        ],
        link,
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

fn parse_table(node: Node<'_, '_>) -> Result<RegressionTable, PmmlError> {
    let target_category = require_attr(node, "targetCategory")?.to_owned();
    let intercept = opt_f64(node, "intercept")?.unwrap_or(0.0);

    let mut predictors = Vec::new();
    for child in element_children(node) {
        match child.tag_name().name() {
            "NumericPredictor" => {
                let exponent = opt_f64(child, "exponent")?.unwrap_or(1.0);
                if exponent != 1.0 {
                    return Err(PmmlError::Unsupported {
                        construct: "NumericPredictor",
                        detail: format!("exponent {exponent}"),
                    });
                }
                predictors.push(Predictor::Numeric {
                    name: require_attr(child, "name")?.to_owned(),
                    coefficient: require_f64(child, "coefficient")?,
                });
            }
            "CategoricalPredictor" => predictors.push(Predictor::Categorical {
                name: require_attr(child, "name")?.to_owned(),
                value: require_attr(child, "value")?.to_owned(),
                coefficient: require_f64(child, "coefficient")?,
            }),
            "Extension" => {}
            other => {
                return Err(PmmlError::Unsupported {
                    construct: "regression table entry",
                    detail: format!("<{other}>"),
                })
            }
        }
    }

    Ok(RegressionTable {
        target_category,
        intercept,
        predictors,
    })
}

fn slot_key(predictor: &Predictor) -> SlotKey {
    match predictor {
        Predictor::Numeric { name, .. } => SlotKey::Numeric(name.clone()),
        Predictor::Categorical { name, value, .. } => {
            SlotKey::Categorical(name.clone(), value.clone())
        }
    }
}

/// Build ranges in predictor document order; consecutive categorical
/// predictors of one field fold into a single 1-of-K range so the slot
/// indices stay aligned with the coefficient order.
fn build_ranges(
    predictors: &[Predictor],
    data_dict: &DataDictionary,
    derived: &DerivedFields,
) -> Result<(Vec<VectorRange>, Vec<SlotKey>), PmmlError> {
    let mut ranges = Vec::new();
    let mut keys = Vec::new();
    let mut offset = 0;
    let mut i = 0;

    while i < predictors.len() {
        match &predictors[i] {
            Predictor::Numeric { name, .. } => {
                let resolved = resolve(name, derived)?;
                data_dict.require(&resolved.raw_field)?;
                ranges.push(VectorRange::Continuous(ContinuousEntry {
                    field: resolved.raw_field,
                    offset,
                    steps: resolved.steps,
                }));
                keys.push(SlotKey::Numeric(name.clone()));
                offset += 1;
                i += 1;
            }
            Predictor::Categorical { name, .. } => {
                let field_name = name.clone();
                let mut categories = Vec::new();
                while let Some(Predictor::Categorical { name, value, .. }) = predictors.get(i) {
                    if *name != field_name {
                        break;
                    }
                    categories.push(value.clone());
                    keys.push(SlotKey::Categorical(name.clone(), value.clone()));
                    i += 1;
                }

                let resolved = resolve(&field_name, derived)?;
                data_dict.require(&resolved.raw_field)?;
                let size = categories.len();
                ranges.push(VectorRange::Categorical(CategoricalEntries {
                    field: resolved.raw_field,
                    offset,
                    categories,
                    weight: TermWeight::Occurrence,
                    steps: resolved.steps,
                }));
                offset += size;
            }
        }
    }

    Ok((ranges, keys))
}

#[cfg(test)]
mod tests {
    use super::super::parse;
    use super::*;
    use crate::data::MapDataSource;

    const LOGISTIC: &str = r#"<PMML version="4.2">
        <DataDictionary>
            <DataField name="age" optype="continuous" dataType="double"/>
            <DataField name="color" optype="categorical" dataType="string">
                <Value value="red"/><Value value="blue"/>
            </DataField>
        </DataDictionary>
        <RegressionModel functionName="classification" normalizationMethod="logit">
            <RegressionTable intercept="-1.0" targetCategory="yes">
                <NumericPredictor name="age" coefficient="0.05"/>
                <CategoricalPredictor name="color" value="red" coefficient="1.5"/>
                <CategoricalPredictor name="color" value="blue" coefficient="-0.5"/>
            </RegressionTable>
            <RegressionTable intercept="0" targetCategory="no"/>
        </RegressionModel>
    </PMML>"#;

    #[test]
    fn builds_slots_in_table_order() {
        let pipeline = parse(LOGISTIC).unwrap();
        assert_eq!(pipeline.vectorizer.length(), 3);

        let ranges = pipeline.vectorizer.ranges();
        assert!(matches!(&ranges[0], VectorRange::Continuous(c) if c.offset == 0));
        assert!(matches!(
            &ranges[1],
            VectorRange::Categorical(c) if c.offset == 1 && c.categories == vec!["red", "blue"]
        ));
    }

    #[test]
    fn evaluates_logistic_prediction() {
        let pipeline = parse(LOGISTIC).unwrap();

        // score = -1.0 + 0.05*30 + 1.5 = 2.0 -> sigmoid > 0.5 -> "yes"
        let source = MapDataSource::new()
            .with_field("age", [30.0])
            .with_field("color", ["red"]);
        let input = pipeline.vectorizer.convert(&source).unwrap();
        assert_eq!(pipeline.evaluator.evaluate(&input, false).label, "yes");

        // score = -1.0 + 0.05*4 - 0.5 = -1.3 -> "no"
        let source = MapDataSource::new()
            .with_field("age", [4.0])
            .with_field("color", ["blue"]);
        let input = pipeline.vectorizer.convert(&source).unwrap();
        assert_eq!(pipeline.evaluator.evaluate(&input, false).label, "no");
    }

    #[test]
    fn three_tables_are_unsupported() {
        let err = parse(
            r#"<PMML version="4.2">
                <DataDictionary/>
                <RegressionModel functionName="classification" normalizationMethod="logit">
                    <RegressionTable intercept="0" targetCategory="a"/>
                    <RegressionTable intercept="0" targetCategory="b"/>
                    <RegressionTable intercept="0" targetCategory="c"/>
                </RegressionModel>
            </PMML>"#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("3 regression tables"));
    }

    #[test]
    fn softmax_normalization_is_unsupported() {
        let err = parse(
            r#"<PMML version="4.2">
                <DataDictionary/>
                <RegressionModel functionName="classification" normalizationMethod="softmax">
                    <RegressionTable intercept="0" targetCategory="a"/>
                    <RegressionTable intercept="0" targetCategory="b"/>
                </RegressionModel>
            </PMML>"#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("softmax"));
    }

    #[test]
    fn regression_function_is_unsupported() {
        let err = parse(
            r#"<PMML version="4.2">
                <DataDictionary/>
                <RegressionModel functionName="regression">
                    <RegressionTable intercept="0"/>
                </RegressionModel>
            </PMML>"#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("functionName"));
    }

    #[test]
    fn undeclared_predictor_field_is_rejected() {
        let err = parse(
            r#"<PMML version="4.2">
                <DataDictionary/>
                <RegressionModel functionName="classification" normalizationMethod="logit">
                    <RegressionTable intercept="0" targetCategory="a">
                        <NumericPredictor name="ghost" coefficient="1"/>
                    </RegressionTable>
                    <RegressionTable intercept="0" targetCategory="b"/>
                </RegressionModel>
            </PMML>"#,
        )
        .unwrap_err();
        assert!(matches!(err, PmmlError::UndefinedField(ref f) if f == "ghost"));
    }

    #[test]
    fn missing_value_substitution_feeds_the_slot() {
        let xml = r#"<PMML version="4.2">
            <DataDictionary>
                <DataField name="age" optype="continuous" dataType="double"/>
            </DataDictionary>
            <TransformationDictionary>
                <DerivedField name="age_mis" optype="continuous" dataType="double">
                    <Apply function="if">
                        <Apply function="isMissing"><FieldRef field="age"/></Apply>
                        <Constant dataType="double">40</Constant>
                        <FieldRef field="age"/>
                    </Apply>
                </DerivedField>
            </TransformationDictionary>
            <RegressionModel functionName="classification" normalizationMethod="logit">
                <RegressionTable intercept="-1.0" targetCategory="yes">
                    <NumericPredictor name="age_mis" coefficient="0.05"/>
                </RegressionTable>
                <RegressionTable intercept="0" targetCategory="no"/>
            </RegressionModel>
        </PMML>"#;
        let pipeline = parse(xml).unwrap();

        // Absent age substitutes 40: score = -1.0 + 0.05*40 = 1.0 -> "yes".
        let input = pipeline.vectorizer.convert(&MapDataSource::new()).unwrap();
        let prediction = pipeline.evaluator.evaluate(&input, true);
        assert_eq!(prediction.label, "yes");
    }
}
