use crate::domain::profile::Profile;
use crate::error::Result;
use std::io::Write;

/// Writes final profile balances as CSV.
pub struct BalanceWriter<W: Write> {
    writer: csv::Writer<W>,
}

impl<W: Write> BalanceWriter<W> {
    pub fn new(target: W) -> Self {
        Self {
            writer: csv::Writer::from_writer(target),
        }
    }

    pub fn write_profiles(&mut self, profiles: Vec<Profile>) -> Result<()> {
        self.writer
            .write_record(["id", "kind", "profession", "balance"])?;
        for profile in profiles {
            self.writer.write_record([
                profile.id.to_string(),
                profile.kind.as_str().to_string(),
                profile.profession.clone(),
                profile.balance.to_string(),
            ])?;
        }
        self.writer.flush()?;
        Ok(())
    }
}
