use crate::domain::contract::Contract;
use crate::domain::job::Job;
use crate::domain::ports::Ledger;
use crate::domain::profile::Profile;
use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// A complete marketplace dataset, loaded into a ledger before processing.
///
/// Profiles, contracts and jobs are created externally to the payment core;
/// this is the file format they arrive in.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct Dataset {
    #[serde(default)]
    pub profiles: Vec<Profile>,
    #[serde(default)]
    pub contracts: Vec<Contract>,
    #[serde(default)]
    pub jobs: Vec<Job>,
}

impl Dataset {
    pub fn from_file(path: &Path) -> Result<Self> {
        let file = std::fs::File::open(path)?;
        Ok(serde_json::from_reader(std::io::BufReader::new(file))?)
    }

    pub async fn load_into(self, ledger: &dyn Ledger) -> Result<()> {
        for profile in self.profiles {
            ledger.put_profile(profile).await?;
        }
        for contract in self.contracts {
            ledger.put_contract(contract).await?;
        }
        for job in self.jobs {
            ledger.put_job(job).await?;
        }
        Ok(())
    }
}
