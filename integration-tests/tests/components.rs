use approx::assert_relative_eq;
use integration_tests::aircraft_fixture;
use ndarray::array;
use sortie_components::{CargoMass, TaxiFuel};
use sortie_core::{TaggedValue, Unit, Values, Variable, VariableRegistry};
use sortie_solve::{Evaluator, check::Config, check_partials};

fn taxi(nodes: usize) -> Evaluator<TaxiFuel> {
    Evaluator::configure(nodes, &VariableRegistry::standard(), &aircraft_fixture()).unwrap()
}

fn cargo() -> Evaluator<CargoMass> {
    Evaluator::configure(1, &VariableRegistry::standard(), &aircraft_fixture()).unwrap()
}

#[test]
fn taxi_burns_fuel_from_tagged_inputs() {
    let taxi = taxi(3);
    let flow = TaggedValue::array(vec![-10.0; 3], Unit::PoundMassPerSecond);
    let gross = TaggedValue::scalar(175_400.0, Unit::PoundMass);

    let outputs = taxi
        .evaluate_tagged([
            (Variable::FuelFlowRateNegativeTotal, &flow),
            (Variable::GrossMass, &gross),
        ])
        .unwrap();

    for &consumed in outputs.get(Variable::TaxiFuelConsumed).unwrap() {
        assert_relative_eq!(consumed, 6_000.0);
    }
    for &mass in outputs.get(Variable::Mass).unwrap() {
        assert_relative_eq!(mass, 169_400.0);
    }
}

#[test]
fn taxi_accepts_metric_inputs() {
    let taxi = taxi(2);
    let flow = TaggedValue::scalar(-4.535_923_7, Unit::KilogramPerSecond);
    let gross = TaggedValue::scalar(79_560.5, Unit::Kilogram);

    let outputs = taxi
        .evaluate_tagged([
            (Variable::FuelFlowRateNegativeTotal, &flow),
            (Variable::GrossMass, &gross),
        ])
        .unwrap();

    let consumed = outputs.get(Variable::TaxiFuelConsumed).unwrap();
    assert_eq!(consumed.len(), 2);
    assert_relative_eq!(consumed[1], 6_000.0, max_relative = 1e-9);
}

#[test]
fn taxi_sparse_jacobian() {
    let taxi = taxi(3);
    let inputs = Values::new()
        .with(Variable::FuelFlowRateNegativeTotal, array![-10.0, -12.0, -8.0])
        .with_scalar(Variable::GrossMass, 175_400.0);

    let pattern = taxi.pattern();
    assert_eq!(pattern.shape, (6, 4));
    assert_eq!(pattern.nnz(), 9);

    let jacobian = taxi.sparse_jacobian(&inputs).unwrap();
    assert_eq!(jacobian.rows, pattern.rows);
    assert_eq!(jacobian.cols, pattern.cols);

    let dense = jacobian.to_dense();
    for node in 0..3 {
        assert_relative_eq!(dense[[node, node]], -600.0);
        assert_relative_eq!(dense[[3 + node, node]], 600.0);
        assert_relative_eq!(dense[[3 + node, 3]], 1.0);
        assert_relative_eq!(dense[[node, 3]], 0.0);
    }
}

#[test]
fn taxi_partials_match_central_differences() {
    let taxi = taxi(4);
    let inputs = Values::new()
        .with(Variable::FuelFlowRateNegativeTotal, array![-10.0, -9.5, -3.25, -0.5])
        .with_scalar(Variable::GrossMass, 175_400.0);

    let report = check_partials(&taxi, &inputs, &Config::default()).unwrap();
    assert!(report.is_consistent(), "{report:?}");
    assert_eq!(report.blocks.len(), 3);
}

#[test]
fn cargo_builds_payload_from_the_store() {
    let cargo = cargo();
    let inputs = Values::new()
        .with_scalar(Variable::WingCargo, 500.0)
        .with_scalar(Variable::MiscCargo, 200.0);

    let outputs = cargo.evaluate(&inputs).unwrap();
    let scalar = |variable| outputs.get(variable).unwrap()[0];
    assert_relative_eq!(scalar(Variable::PassengerMass), 27_000.0);
    assert_relative_eq!(scalar(Variable::BaggageMass), 5_250.0);
    assert_relative_eq!(scalar(Variable::CargoMass), 700.0);
    assert_relative_eq!(scalar(Variable::TotalPayloadMass), 32_950.0);

    let report = check_partials(&cargo, &inputs, &Config::default()).unwrap();
    assert!(report.is_consistent(), "{report:?}");
}

#[test]
fn empty_wing_cargo_is_checked_one_sided() {
    let cargo = cargo();
    let inputs = Values::new()
        .with_scalar(Variable::WingCargo, 0.0)
        .with_scalar(Variable::MiscCargo, 200.0);

    let report = check_partials(&cargo, &inputs, &Config::default()).unwrap();
    assert!(report.is_consistent(), "{report:?}");
    assert_eq!(report.one_sided, [(Variable::WingCargo, 0)]);
}

#[test]
fn cargo_jacobian_is_served_from_constants() {
    let cargo = cargo();
    let inputs = Values::new()
        .with_scalar(Variable::WingCargo, 0.0)
        .with_scalar(Variable::MiscCargo, 0.0);

    let jacobian = cargo.sparse_jacobian(&inputs).unwrap();
    assert_eq!(jacobian.nnz(), 4);
    assert!(jacobian.values.iter().all(|&v| v == 1.0));
}

#[test]
fn domain_errors_surface_through_the_evaluator() {
    let taxi = taxi(2);
    let inputs = Values::new()
        .with(Variable::FuelFlowRateNegativeTotal, array![-10.0, f64::NAN])
        .with_scalar(Variable::GrossMass, 175_400.0);
    assert!(taxi.evaluate(&inputs).is_err());

    let cargo = cargo();
    let inputs = Values::new()
        .with_scalar(Variable::WingCargo, -1.0)
        .with_scalar(Variable::MiscCargo, 0.0);
    assert!(cargo.evaluate(&inputs).is_err());
}
