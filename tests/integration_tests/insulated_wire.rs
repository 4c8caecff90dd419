//! Steady heat conduction in an insulated wire with internal heat generation and convective
//! cooling at the outer surface (Carslaw & Jaeger, 1959, §7.2.V).
use formwork::assembly::{BilinearForm, Coefficient, FormParameters, LinearForm};
use formwork::basis::{FacetBasis, GlobalBasis, InteriorBasis};
use formwork::element::ElementTriP1;
use formwork::field::{dot, DiscreteField};
use formwork::mesh::procedural::create_concentric_disk_mesh;
use formwork::models::Mass;
use nalgebra::DVector;
use ndarray::ArrayD;
use util::conjugate_gradient;

const WIRE_RADIUS: f64 = 2.0;
const INSULATION_RADIUS: f64 = 3.0;
const WIRE_CONDUCTIVITY: f64 = 101.0;
const INSULATION_CONDUCTIVITY: f64 = 11.0;
const GENERATION: f64 = 5.0;
const HEAT_TRANSFER_COEFFICIENT: f64 = 7.0;

fn conduction(u: &DiscreteField, v: &DiscreteField, w: &FormParameters) -> eyre::Result<ArrayD<f64>> {
    Ok(w.w()? * &dot(u.try_df()?, v.try_df()?)?)
}

fn generation(v: &DiscreteField, w: &FormParameters) -> eyre::Result<ArrayD<f64>> {
    Ok(w.w()? * v.try_f()? * GENERATION)
}

fn exact_central_temperature() -> f64 {
    let (a, b) = (WIRE_RADIUS, INSULATION_RADIUS);
    let (k0, k1) = (WIRE_CONDUCTIVITY, INSULATION_CONDUCTIVITY);
    let h = HEAT_TRANSFER_COEFFICIENT;
    GENERATION * a * a / (4.0 * k0) * (2.0 * k0 / (h * b) + 2.0 * k0 / k1 * (b / a).ln() + 1.0)
}

/// Solves for the temperature and returns its value at the center of the wire.
fn central_temperature(spacing: f64) -> eyre::Result<f64> {
    let mesh = create_concentric_disk_mesh(
        &[("wire", WIRE_RADIUS), ("insulation", INSULATION_RADIUS)],
        spacing,
        "convection",
    )?;
    let basis = InteriorBasis::new(&mesh, &ElementTriP1)?;
    let surface = FacetBasis::new(&mesh, &ElementTriP1, "convection")?;

    let in_wire = mesh.subdomain_indicator("wire")?;
    let conductivity = Coefficient::elemental(basis.cells().iter().map(|&c| {
        if in_wire[c] {
            WIRE_CONDUCTIVITY
        } else {
            INSULATION_CONDUCTIVITY
        }
    }));
    let source = Coefficient::elemental(basis.cells().iter().map(|&c| f64::from(u8::from(in_wire[c]))));

    let stiffness = BilinearForm::new(conduction).assemble(&basis, None, &[conductivity], 2)?;
    let convection = BilinearForm::from_integrand(Mass).assemble(&surface, None, &[], 2)? * HEAT_TRANSFER_COEFFICIENT;
    let system = &stiffness + &convection;
    let rhs = LinearForm::new(generation).assemble(&basis, &[source], 2)?;

    let (temperature, _) = conjugate_gradient(&system, &rhs, 1e-10, 10 * basis.num_dofs())
        .ok_or_else(|| eyre::eyre!("conjugate gradient did not converge"))?;
    let center = basis.probe(&temperature, &DVector::zeros(2))?;
    Ok(center[0])
}

#[test]
fn central_temperature_matches_closed_form() {
    let exact = exact_central_temperature();
    assert!((exact - 0.8943).abs() < 1e-3);

    let relative_error = |spacing: f64| (central_temperature(spacing).unwrap() - exact).abs() / exact;
    let coarse = relative_error(0.5);
    let fine = relative_error(0.125);
    assert!(relative_error(0.25) < 0.03);
    assert!(fine < 0.03);
    assert!(fine < coarse, "error {} at fine resolution, {} at coarse", fine, coarse);
}
