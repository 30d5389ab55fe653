use std::collections::BTreeMap;

use super::config::Catalog;
use super::factors::{hazard_fraction, sub_score, CurveKind};
use crate::series::EnvironmentalVariable;

#[derive(Debug, Clone, PartialEq)]
pub struct FamilyHazard {
    pub family: String,
    /// Worst member hazard, 0 when no member was supplied
    pub hazard: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PollenScore {
    /// Probabilistic OR of the family hazards, in [0, 1]
    pub fraction: f64,
    pub score: u8,
    pub families: Vec<FamilyHazard>,
}

/// Combine pollen readings into a single score.
///
/// Members of a cross-reactive family are not added up: the worst member
/// stands for the family. Families are then combined as independent risk
/// sources, `1 - prod(1 - family_hazard)`, which saturates toward 1 and
/// never exceeds it. Non-pollen entries in `values` are ignored.
pub fn aggregate_pollen(values: &BTreeMap<EnvironmentalVariable, f64>, catalog: &Catalog) -> PollenScore {
    let families: Vec<FamilyHazard> = catalog
        .pollen_families
        .iter()
        .map(|family| {
            let hazard = family
                .members
                .iter()
                .filter_map(|member| {
                    let value = values.get(member)?;
                    let spec = catalog.threshold(*member)?;
                    Some(hazard_fraction(*value, spec.safe, spec.danger))
                })
                .fold(0.0, f64::max);
            FamilyHazard {
                family: family.name.clone(),
                hazard,
            }
        })
        .collect();

    let fraction = 1.0 - families.iter().map(|f| 1.0 - f.hazard).product::<f64>();
    let fraction = fraction.clamp(0.0, 1.0);

    PollenScore {
        fraction,
        score: sub_score(fraction, CurveKind::Linear, 1.0),
        families,
    }
}
