//! Seed blocks: which CIDRs get split, and at what length.
//!
//! The built-in list can be replaced by a TOML file:
//!
//! ```toml
//! [[seed]]
//! cidr = "10.0.0.0/8"
//! target = 8
//! ```

use crate::errors::CliError;
use serde::Deserialize;
use std::fs;
use std::path::Path;
use std::str::FromStr;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Seed {
    pub cidr: String,
    pub target: u8,
}

impl Seed {
    pub fn new(cidr: &str, target: u8) -> Self {
        Seed {
            cidr: cidr.to_string(),
            target,
        }
    }
}

/// `CIDR@LEN`, e.g. `192.168.0.0/16@24`.
impl FromStr for Seed {
    type Err = CliError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (cidr, target) = s.rsplit_once('@').ok_or_else(|| CliError::Seed(s.to_string()))?;
        let target = target
            .trim()
            .parse()
            .map_err(|_| CliError::Seed(s.to_string()))?;
        Ok(Seed::new(cidr.trim(), target))
    }
}

#[derive(Debug, Deserialize)]
struct SeedFile {
    #[serde(default, rename = "seed")]
    seeds: Vec<Seed>,
}

/// Private ranges at their natural length, then a handful of public blocks
/// broken down to /24.
pub fn default_seeds() -> Vec<Seed> {
    let mut seeds = vec![
        Seed::new("10.0.0.0/8", 8),
        Seed::new("172.16.0.0/12", 12),
        Seed::new("192.168.0.0/16", 16),
    ];
    seeds.extend(
        [
            "200.99.0.0/16",
            "200.162.0.0/17",
            "200.198.64.0/18",
            "200.202.112.0/20",
            "201.84.0.0/15",
        ]
        .into_iter()
        .map(|cidr| Seed::new(cidr, 24)),
    );
    seeds
}

pub fn parse_seeds(text: &str, path: &str) -> Result<Vec<Seed>, CliError> {
    let file: SeedFile = toml::from_str(text).map_err(|source| CliError::Config {
        path: path.to_string(),
        source,
    })?;
    Ok(file.seeds)
}

pub fn load_seeds(path: &Path) -> Result<Vec<Seed>, CliError> {
    let text = fs::read_to_string(path)?;
    parse_seeds(&text, &path.display().to_string())
}
