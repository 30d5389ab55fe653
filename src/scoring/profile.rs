use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Supported health profiles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HealthProfile {
    HealthyAdult,
    AsthmaChild,
    SeasonalAllergicRhinitis,
    AllergicAsthma,
    Copd,
    IschaemicHeartDisease,
    #[serde(rename = "type2_diabetes")]
    Type2Diabetes,
    Pregnancy,
    SkinCancerSurvivor,
    Vitiligo,
    Lupus,
    AllergicConjunctivitis,
    AtopicDermatitis,
}

impl HealthProfile {
    pub const ALL: [HealthProfile; 13] = [
        HealthProfile::HealthyAdult,
        HealthProfile::AsthmaChild,
        HealthProfile::SeasonalAllergicRhinitis,
        HealthProfile::AllergicAsthma,
        HealthProfile::Copd,
        HealthProfile::IschaemicHeartDisease,
        HealthProfile::Type2Diabetes,
        HealthProfile::Pregnancy,
        HealthProfile::SkinCancerSurvivor,
        HealthProfile::Vitiligo,
        HealthProfile::Lupus,
        HealthProfile::AllergicConjunctivitis,
        HealthProfile::AtopicDermatitis,
    ];

    pub fn id(self) -> &'static str {
        match self {
            HealthProfile::HealthyAdult => "healthy_adult",
            HealthProfile::AsthmaChild => "asthma_child",
            HealthProfile::SeasonalAllergicRhinitis => "seasonal_allergic_rhinitis",
            HealthProfile::AllergicAsthma => "allergic_asthma",
            HealthProfile::Copd => "copd",
            HealthProfile::IschaemicHeartDisease => "ischaemic_heart_disease",
            HealthProfile::Type2Diabetes => "type2_diabetes",
            HealthProfile::Pregnancy => "pregnancy",
            HealthProfile::SkinCancerSurvivor => "skin_cancer_survivor",
            HealthProfile::Vitiligo => "vitiligo",
            HealthProfile::Lupus => "lupus",
            HealthProfile::AllergicConjunctivitis => "allergic_conjunctivitis",
            HealthProfile::AtopicDermatitis => "atopic_dermatitis",
        }
    }

    /// Human-readable name shown in reports
    pub fn label(self) -> &'static str {
        match self {
            HealthProfile::HealthyAdult => "Healthy adult (general overview)",
            HealthProfile::AsthmaChild => "Child with asthma (high risk)",
            HealthProfile::SeasonalAllergicRhinitis => "Seasonal allergic rhinitis (hay-fever)",
            HealthProfile::AllergicAsthma => "Allergic (extrinsic) asthma",
            HealthProfile::Copd => "Chronic Obstructive Pulmonary Disease (COPD)",
            HealthProfile::IschaemicHeartDisease => "Ischaemic heart disease / heart-failure",
            HealthProfile::Type2Diabetes => "Type-2 diabetes with cardio-metabolic risk",
            HealthProfile::Pregnancy => "Pregnancy (pre-eclampsia / pre-term risk)",
            HealthProfile::SkinCancerSurvivor => {
                "Skin-cancer survivors & high-UV phenotypes (Fitzpatrick I–II)"
            }
            HealthProfile::Vitiligo => "Vitiligo / albinism (pigment-loss disorders)",
            HealthProfile::Lupus => "Systemic lupus erythematosus (photosensitive)",
            HealthProfile::AllergicConjunctivitis => {
                "Allergic conjunctivitis & other ocular allergies"
            }
            HealthProfile::AtopicDermatitis => "Atopic dermatitis (eczema)",
        }
    }

    pub fn parse(s: &str) -> Result<Self> {
        let normalized = s.trim().to_ascii_lowercase().replace('-', "_");
        match Self::ALL.iter().find(|p| p.id() == normalized) {
            Some(p) => Ok(*p),
            None => bail!("Unknown health profile: {}", s),
        }
    }
}

impl fmt::Display for HealthProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_accepts_dashes_and_case() {
        assert_eq!(HealthProfile::parse("Asthma-Child").unwrap(), HealthProfile::AsthmaChild);
        assert_eq!(HealthProfile::parse("copd").unwrap(), HealthProfile::Copd);
        assert!(HealthProfile::parse("athlete").is_err());
    }

    #[test]
    fn test_serde_ids_match_display() {
        for profile in HealthProfile::ALL {
            let json = serde_json::to_string(&profile).unwrap();
            assert_eq!(json, format!("\"{}\"", profile.id()));
        }
    }
}
