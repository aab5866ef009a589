use thiserror::Error;
use trustvote_interface::{AccountAddress, AddressParseError};

/// Why an address was not added to the whitelist.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WhitelistError {
    /// Nothing was entered.
    #[error("address is empty")]
    EmptyInput,
    /// The input is not `0x` followed by 40 hex characters.
    #[error("invalid address {input:?}: {reason}")]
    InvalidFormat {
        /// The rejected input.
        input: String,
        /// Parser error.
        reason: AddressParseError,
    },
    /// The address is already on the list.
    #[error("address {0} is already whitelisted")]
    Duplicate(AccountAddress),
    /// The dialog cannot be saved with an empty list.
    #[error("the whitelist needs at least one address")]
    EmptyList,
}

/// Parses a whitelist entry.
pub fn parse_whitelist_entry(input: &str) -> Result<AccountAddress, WhitelistError> {
    let input = input.trim();
    if input.is_empty() {
        return Err(WhitelistError::EmptyInput);
    }
    input
        .parse()
        .map_err(|reason| WhitelistError::InvalidFormat {
            input: input.to_string(),
            reason,
        })
}

/// The whitelist dialog: a working copy of the list, committed to the form on save.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WhitelistDialog {
    entries: Vec<String>,
}

impl WhitelistDialog {
    /// Opens the dialog on the form's current list.
    pub fn open(entries: &[String]) -> Self {
        Self {
            entries: entries.to_vec(),
        }
    }

    /// The working list.
    pub fn entries(&self) -> &[String] {
        &self.entries
    }

    /// Adds an address. Rejected input leaves the list unchanged.
    ///
    /// Duplicates are detected on the parsed address, so the same account in a
    /// different letter case is rejected too.
    pub fn add(&mut self, input: &str) -> Result<AccountAddress, WhitelistError> {
        let address = parse_whitelist_entry(input)?;
        let duplicate = self
            .entries
            .iter()
            .any(|entry| entry.parse::<AccountAddress>().ok() == Some(address));
        if duplicate {
            return Err(WhitelistError::Duplicate(address));
        }
        self.entries.push(input.trim().to_string());
        Ok(address)
    }

    /// Removes an address. Returns whether it was on the list.
    pub fn remove(&mut self, address: &AccountAddress) -> bool {
        let before = self.entries.len();
        self.entries
            .retain(|entry| entry.parse::<AccountAddress>().ok() != Some(*address));
        self.entries.len() != before
    }

    /// Closes the dialog, returning the list to store in the form.
    pub fn save(self) -> Result<Vec<String>, WhitelistError> {
        if self.entries.is_empty() {
            return Err(WhitelistError::EmptyList);
        }
        Ok(self.entries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALICE: &str = "0x70997970c51812dc3a010c7d01b50e0d17dc79c8";

    #[test]
    fn rejects_bad_input_and_keeps_the_list() {
        let mut dialog = WhitelistDialog::default();
        dialog.add(ALICE).unwrap();

        assert_eq!(dialog.add("   "), Err(WhitelistError::EmptyInput));
        assert!(matches!(
            dialog.add("0xzz997970c51812dc3a010c7d01b50e0d17dc79c8"),
            Err(WhitelistError::InvalidFormat { .. })
        ));
        assert!(matches!(
            dialog.add(&ALICE[..41]),
            Err(WhitelistError::InvalidFormat { .. })
        ));
        assert!(matches!(
            dialog.add(&ALICE[2..]),
            Err(WhitelistError::InvalidFormat { .. })
        ));
        assert!(matches!(dialog.add(ALICE), Err(WhitelistError::Duplicate(_))));
        assert!(matches!(
            dialog.add(&ALICE.to_uppercase().replacen("0X", "0x", 1)),
            Err(WhitelistError::Duplicate(_))
        ));
        assert_eq!(dialog.entries(), [ALICE.to_string()]);
    }

    #[test]
    fn remove_and_save() {
        let mut dialog = WhitelistDialog::open(&[ALICE.to_string()]);
        let alice: AccountAddress = ALICE.parse().unwrap();
        assert!(dialog.remove(&alice));
        assert!(!dialog.remove(&alice));
        assert_eq!(dialog.clone().save(), Err(WhitelistError::EmptyList));

        dialog.add(ALICE).unwrap();
        assert_eq!(dialog.save().unwrap(), vec![ALICE.to_string()]);
    }
}
