use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Every environmental variable the engine tracks.
///
/// The serialized identifiers are stable: they are used as map keys in
/// JSON reports, YAML overrides and data file names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum EnvironmentalVariable {
    #[serde(rename = "birch_pollen")]
    BirchPollen,
    #[serde(rename = "grass_pollen")]
    GrassPollen,
    #[serde(rename = "olive_pollen")]
    OlivePollen,
    #[serde(rename = "mugwort_pollen")]
    MugwortPollen,
    #[serde(rename = "ragweed_pollen")]
    RagweedPollen,
    #[serde(rename = "alder_pollen")]
    AlderPollen,
    #[serde(rename = "pm2p5_conc")]
    Pm2p5,
    #[serde(rename = "pm10_conc")]
    Pm10,
    #[serde(rename = "o3_conc")]
    Ozone,
    #[serde(rename = "no2_conc")]
    No2,
    #[serde(rename = "so2_conc")]
    So2,
    #[serde(rename = "uv_biologically_effective_dose")]
    Uv,
}

impl EnvironmentalVariable {
    pub const ALL: [EnvironmentalVariable; 12] = [
        EnvironmentalVariable::BirchPollen,
        EnvironmentalVariable::GrassPollen,
        EnvironmentalVariable::OlivePollen,
        EnvironmentalVariable::MugwortPollen,
        EnvironmentalVariable::RagweedPollen,
        EnvironmentalVariable::AlderPollen,
        EnvironmentalVariable::Pm2p5,
        EnvironmentalVariable::Pm10,
        EnvironmentalVariable::Ozone,
        EnvironmentalVariable::No2,
        EnvironmentalVariable::So2,
        EnvironmentalVariable::Uv,
    ];

    /// Stable lowercase identifier (e.g. `pm2p5_conc`)
    pub fn id(self) -> &'static str {
        match self {
            EnvironmentalVariable::BirchPollen => "birch_pollen",
            EnvironmentalVariable::GrassPollen => "grass_pollen",
            EnvironmentalVariable::OlivePollen => "olive_pollen",
            EnvironmentalVariable::MugwortPollen => "mugwort_pollen",
            EnvironmentalVariable::RagweedPollen => "ragweed_pollen",
            EnvironmentalVariable::AlderPollen => "alder_pollen",
            EnvironmentalVariable::Pm2p5 => "pm2p5_conc",
            EnvironmentalVariable::Pm10 => "pm10_conc",
            EnvironmentalVariable::Ozone => "o3_conc",
            EnvironmentalVariable::No2 => "no2_conc",
            EnvironmentalVariable::So2 => "so2_conc",
            EnvironmentalVariable::Uv => "uv_biologically_effective_dose",
        }
    }

    pub fn parse(s: &str) -> Result<Self> {
        let s = s.trim();
        match Self::ALL.iter().find(|v| v.id() == s) {
            Some(v) => Ok(*v),
            None => bail!("Unknown environmental variable: {}", s),
        }
    }

    pub fn is_pollen(self) -> bool {
        matches!(
            self,
            EnvironmentalVariable::BirchPollen
                | EnvironmentalVariable::GrassPollen
                | EnvironmentalVariable::OlivePollen
                | EnvironmentalVariable::MugwortPollen
                | EnvironmentalVariable::RagweedPollen
                | EnvironmentalVariable::AlderPollen
        )
    }

    /// Variables whose extreme readings are flagged by the data validator.
    pub fn is_safety_critical(self) -> bool {
        matches!(
            self,
            EnvironmentalVariable::Uv | EnvironmentalVariable::Pm2p5 | EnvironmentalVariable::Pm10
        )
    }
}

impl fmt::Display for EnvironmentalVariable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}
