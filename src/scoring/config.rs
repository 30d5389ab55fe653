use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;

use super::factors::{AggregationWindow, CurveKind};
use super::profile::HealthProfile;
use crate::series::EnvironmentalVariable;

/// Safe/danger bounds for one variable.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct ThresholdSpec {
    /// At or below this value the hazard fraction is 0
    pub safe: f64,

    /// At or above this value the hazard fraction is 1
    pub danger: f64,

    pub unit: String,

    /// Averaging window the bounds refer to ("instant", "1h", "8h", "24h")
    pub window: AggregationWindow,

    /// Curve used to turn the hazard fraction into a sub-score (default: linear)
    #[serde(default)]
    pub curve: CurveKind,
}

/// Sustained-exposure alerting for one variable.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct AlertSpec {
    pub window: AggregationWindow,

    /// Risk windows open while the (windowed) value is strictly above this
    pub alert_threshold: f64,

    /// Profiles for which these windows matter most (informational)
    #[serde(default)]
    pub relevant_profiles: Vec<HealthProfile>,
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct VariableWeight {
    pub variable: EnvironmentalVariable,
    pub weight: f64,
}

/// Weighted view of the environment for one health profile.
///
/// Weight order matters: it is the order sub-scores are computed in and
/// breaks ties when picking the top contributor.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct ProfileSpec {
    pub description: String,

    pub weights: Vec<VariableWeight>,

    /// Multiplier applied to non-pollen hazard fractions before curve shaping
    #[serde(default = "default_hazard_multiplier")]
    pub hazard_multiplier: f64,
}

fn default_hazard_multiplier() -> f64 {
    1.0
}

impl ProfileSpec {
    pub fn variables(&self) -> impl Iterator<Item = EnvironmentalVariable> + '_ {
        self.weights.iter().map(|w| w.variable)
    }

    pub fn weight(&self, variable: EnvironmentalVariable) -> Option<f64> {
        self.weights
            .iter()
            .find(|w| w.variable == variable)
            .map(|w| w.weight)
    }
}

/// Cross-reactive pollen taxa scored as one hazard source.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct PollenFamily {
    pub name: String,
    pub members: Vec<EnvironmentalVariable>,
}

/// Partial catalog read from the config file. Each entry present replaces
/// the built-in entry for that key wholesale.
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct CatalogOverrides {
    #[serde(default)]
    pub thresholds: Option<BTreeMap<EnvironmentalVariable, ThresholdSpec>>,

    #[serde(default)]
    pub alerts: Option<BTreeMap<EnvironmentalVariable, AlertSpec>>,

    #[serde(default)]
    pub profiles: Option<BTreeMap<HealthProfile, ProfileSpec>>,
}

/// Every static table the engine reads. Built once, validated, then shared
/// read-only for the life of the process.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct Catalog {
    pub thresholds: BTreeMap<EnvironmentalVariable, ThresholdSpec>,
    pub alerts: BTreeMap<EnvironmentalVariable, AlertSpec>,
    pub profiles: BTreeMap<HealthProfile, ProfileSpec>,
    pub pollen_families: Vec<PollenFamily>,
}

impl Catalog {
    pub fn threshold(&self, variable: EnvironmentalVariable) -> Option<&ThresholdSpec> {
        self.thresholds.get(&variable)
    }

    pub fn alert(&self, variable: EnvironmentalVariable) -> Option<&AlertSpec> {
        self.alerts.get(&variable)
    }

    pub fn profile(&self, profile: HealthProfile) -> Option<&ProfileSpec> {
        self.profiles.get(&profile)
    }

    /// The pollen family a variable belongs to, if any.
    pub fn family_of(&self, variable: EnvironmentalVariable) -> Option<&PollenFamily> {
        self.pollen_families
            .iter()
            .find(|f| f.members.contains(&variable))
    }

    /// Apply config-file overrides on top of this catalog.
    pub fn with_overrides(mut self, overrides: &CatalogOverrides) -> Self {
        if let Some(ref thresholds) = overrides.thresholds {
            for (var, spec) in thresholds {
                self.thresholds.insert(*var, spec.clone());
            }
        }
        if let Some(ref alerts) = overrides.alerts {
            for (var, spec) in alerts {
                self.alerts.insert(*var, spec.clone());
            }
        }
        if let Some(ref profiles) = overrides.profiles {
            for (profile, spec) in profiles {
                self.profiles.insert(*profile, spec.clone());
            }
        }
        self
    }
}

fn hours(h: u64) -> AggregationWindow {
    AggregationWindow::Rolling(Duration::from_secs(h * 3600))
}

fn threshold(safe: f64, danger: f64, unit: &str, window: AggregationWindow) -> ThresholdSpec {
    ThresholdSpec {
        safe,
        danger,
        unit: unit.to_string(),
        window,
        curve: CurveKind::Linear,
    }
}

fn alert(window: AggregationWindow, alert_threshold: f64, relevant: &[HealthProfile]) -> AlertSpec {
    AlertSpec {
        window,
        alert_threshold,
        relevant_profiles: relevant.to_vec(),
    }
}

fn profile(description: &str, weights: &[(EnvironmentalVariable, f64)]) -> ProfileSpec {
    ProfileSpec {
        description: description.to_string(),
        weights: weights
            .iter()
            .map(|(variable, weight)| VariableWeight {
                variable: *variable,
                weight: *weight,
            })
            .collect(),
        hazard_multiplier: 1.0,
    }
}

impl Default for Catalog {
    fn default() -> Self {
        use EnvironmentalVariable::*;
        use HealthProfile as P;

        const MASS: &str = "µg m⁻³";
        const GRAINS: &str = "grains m⁻³";

        let thresholds = BTreeMap::from([
            (Pm2p5, threshold(15.0, 75.0, MASS, hours(24))),
            (Pm10, threshold(45.0, 150.0, MASS, hours(24))),
            (No2, threshold(50.0, 340.0, MASS, hours(1))),
            (Ozone, threshold(60.0, 240.0, MASS, hours(8))),
            (So2, threshold(40.0, 500.0, MASS, hours(1))),
            (BirchPollen, threshold(10.0, 1000.0, GRAINS, hours(24))),
            (GrassPollen, threshold(10.0, 250.0, GRAINS, hours(24))),
            (OlivePollen, threshold(10.0, 150.0, GRAINS, hours(24))),
            (MugwortPollen, threshold(10.0, 150.0, GRAINS, hours(24))),
            (RagweedPollen, threshold(10.0, 150.0, GRAINS, hours(24))),
            (AlderPollen, threshold(10.0, 150.0, GRAINS, hours(24))),
            (Uv, threshold(2.0, 11.0, "index", AggregationWindow::Instant)),
        ]);

        let alerts = BTreeMap::from([
            (
                Uv,
                alert(
                    AggregationWindow::Instant,
                    3.0,
                    &[P::SkinCancerSurvivor, P::Vitiligo, P::Lupus],
                ),
            ),
            (
                Ozone,
                alert(
                    hours(8),
                    120.0,
                    &[P::AllergicAsthma, P::Copd, P::Pregnancy, P::AtopicDermatitis],
                ),
            ),
            (
                No2,
                alert(
                    hours(1),
                    100.0,
                    &[
                        P::AllergicAsthma,
                        P::Copd,
                        P::IschaemicHeartDisease,
                        P::Type2Diabetes,
                        P::AllergicConjunctivitis,
                    ],
                ),
            ),
            (
                Pm2p5,
                alert(
                    hours(24),
                    35.0,
                    &[
                        P::AllergicAsthma,
                        P::Copd,
                        P::IschaemicHeartDisease,
                        P::Type2Diabetes,
                        P::Pregnancy,
                        P::AllergicConjunctivitis,
                        P::AtopicDermatitis,
                    ],
                ),
            ),
            (Pm10, alert(hours(24), 35.0, &[P::AllergicConjunctivitis])),
            (So2, alert(hours(1), 125.0, &[P::AllergicAsthma, P::Copd])),
        ]);

        let mut asthma_child = profile(
            "Child with asthma requiring careful monitoring",
            &[(Pm2p5, 0.3), (Pm10, 0.2), (Ozone, 0.2), (No2, 0.2), (So2, 0.1)],
        );
        // Children get a 20% hazard boost
        asthma_child.hazard_multiplier = 1.2;

        let profiles = BTreeMap::from([
            (
                P::HealthyAdult,
                profile(
                    "Healthy adult seeking general environmental overview",
                    &[(Pm2p5, 0.2), (Pm10, 0.2), (Ozone, 0.2), (No2, 0.2), (So2, 0.1), (Uv, 0.1)],
                ),
            ),
            (P::AsthmaChild, asthma_child),
            (
                P::SeasonalAllergicRhinitis,
                profile(
                    "Seasonal allergic rhinitis (hay-fever)",
                    &[(BirchPollen, 0.4), (GrassPollen, 0.4), (Pm2p5, 0.2)],
                ),
            ),
            (
                P::AllergicAsthma,
                profile(
                    "Allergic (extrinsic) asthma",
                    &[(Ozone, 0.4), (Pm2p5, 0.3), (BirchPollen, 0.15), (GrassPollen, 0.15)],
                ),
            ),
            (
                P::Copd,
                profile(
                    "Chronic Obstructive Pulmonary Disease (COPD)",
                    &[(Pm2p5, 0.5), (No2, 0.3), (Ozone, 0.2)],
                ),
            ),
            (
                P::IschaemicHeartDisease,
                profile(
                    "Ischaemic heart disease / heart-failure",
                    &[(Pm2p5, 0.7), (No2, 0.3)],
                ),
            ),
            (
                P::Type2Diabetes,
                profile(
                    "Type-2 diabetes with cardio-metabolic risk",
                    &[(Pm2p5, 0.6), (No2, 0.4)],
                ),
            ),
            (
                P::Pregnancy,
                profile(
                    "Pregnancy (pre-eclampsia / pre-term risk)",
                    &[(Ozone, 0.6), (Pm2p5, 0.4)],
                ),
            ),
            (
                P::SkinCancerSurvivor,
                profile(
                    "Skin-cancer survivors & high-UV phenotypes (Fitzpatrick I–II)",
                    &[(Uv, 1.0)],
                ),
            ),
            (
                P::Vitiligo,
                profile("Vitiligo / albinism (pigment-loss disorders)", &[(Uv, 1.0)]),
            ),
            (
                P::Lupus,
                profile(
                    "Systemic lupus erythematosus (photosensitive)",
                    &[(Uv, 0.8), (Pm2p5, 0.2)],
                ),
            ),
            (
                P::AllergicConjunctivitis,
                profile(
                    "Allergic conjunctivitis & other ocular allergies",
                    &[(Pm10, 0.4), (No2, 0.3), (BirchPollen, 0.15), (GrassPollen, 0.15)],
                ),
            ),
            (
                P::AtopicDermatitis,
                profile("Atopic dermatitis (eczema)", &[(Pm2p5, 0.7), (Ozone, 0.3)]),
            ),
        ]);

        let pollen_families = vec![
            PollenFamily {
                name: "BETULACEAE".to_string(),
                members: vec![BirchPollen, AlderPollen],
            },
            PollenFamily {
                name: "ASTERACEAE".to_string(),
                members: vec![MugwortPollen, RagweedPollen],
            },
            PollenFamily {
                name: "GRASS".to_string(),
                members: vec![GrassPollen],
            },
            PollenFamily {
                name: "OLIVE".to_string(),
                members: vec![OlivePollen],
            },
        ];

        Self {
            thresholds,
            alerts,
            profiles,
            pollen_families,
        }
    }
}
