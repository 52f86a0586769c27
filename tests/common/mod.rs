//! Shared fixtures for the integration suites.

#![allow(dead_code)]

use scorers::MapDataSource;

/// The scenario document used throughout: term counts the=1, quick=2,
/// fox=1, brown=1, is=1.
pub fn quick_fox_source() -> MapDataSource {
    MapDataSource::new().with_text("text", "the quick brown fox is quick")
}

/// Binary logistic RegressionModel over four numeric fields.
///
/// `coefficients` and field names line up: `f0..f3`; the first table
/// carries the parameters, the second is the empty reference table.
pub fn logistic_pmml(coefficients: [f64; 4], intercept: f64) -> String {
    let [c0, c1, c2, c3] = coefficients;
    format!(
        r#"<PMML version="4.2">
    <DataDictionary numberOfFields="4">
        <DataField name="f0" optype="continuous" dataType="double"/>
        <DataField name="f1" optype="continuous" dataType="double"/>
        <DataField name="f2" optype="continuous" dataType="double"/>
        <DataField name="f3" optype="continuous" dataType="double"/>
    </DataDictionary>
    <RegressionModel functionName="classification" normalizationMethod="logit">
        <RegressionTable intercept="{intercept}" targetCategory="1">
            <NumericPredictor name="f0" coefficient="{c0}"/>
            <NumericPredictor name="f1" coefficient="{c1}"/>
            <NumericPredictor name="f2" coefficient="{c2}"/>
            <NumericPredictor name="f3" coefficient="{c3}"/>
        </RegressionTable>
        <RegressionTable intercept="0" targetCategory="0"/>
    </RegressionModel>
</PMML>"#
    )
}

/// A record assigning `values` to fields `f0..f3`.
pub fn four_field_source(values: [f64; 4]) -> MapDataSource {
    let mut source = MapDataSource::new();
    for (i, value) in values.into_iter().enumerate() {
        source = source.with_field(&format!("f{i}"), [value]);
    }
    source
}
