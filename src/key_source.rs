//! Key Source Selector
//!
//! Process-wide switch between the factory-provisioned (`original`) keys and
//! the possibly rotated (`internal`) keys. The mode persists until changed
//! and applies to every request that follows.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::PoisonError;

use crate::error::KmsError;
use crate::kms::MockKms;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KeySourceMode {
    /// Serve from the store loaded at startup
    Original,
    /// Serve from the store the rotation API writes to
    #[default]
    Internal,
}

impl fmt::Display for KeySourceMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KeySourceMode::Original => write!(f, "original"),
            KeySourceMode::Internal => write!(f, "internal"),
        }
    }
}

impl FromStr for KeySourceMode {
    type Err = KmsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "original" => Ok(KeySourceMode::Original),
            "internal" => Ok(KeySourceMode::Internal),
            other => Err(KmsError::invalid_parameter(
                "key_source",
                "original or internal",
                other,
            )),
        }
    }
}

impl MockKms {
    pub fn set_key_source(&self, mode: KeySourceMode) {
        let mut current = self
            .key_source_lock()
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        if *current != mode {
            log::info!("Key source switched from {} to {}", *current, mode);
        }
        *current = mode;
    }

    /// Set the mode by name. Anything other than `original` or `internal`
    /// leaves the current mode in place.
    pub fn set_key_source_by_name(&self, name: &str) {
        match name.parse::<KeySourceMode>() {
            Ok(mode) => self.set_key_source(mode),
            Err(_) => log::debug!("Ignoring unknown key source '{}'", name),
        }
    }

    pub fn key_source(&self) -> KeySourceMode {
        *self
            .key_source_lock()
            .read()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::key_management::KeyStore;
    use proptest::prelude::*;

    #[test]
    fn test_default_is_internal() {
        let kms = MockKms::new(KeyStore::new());
        assert_eq!(kms.key_source(), KeySourceMode::Internal);
    }

    #[test]
    fn test_set_by_name() {
        let kms = MockKms::new(KeyStore::new());
        kms.set_key_source_by_name("original");
        assert_eq!(kms.key_source(), KeySourceMode::Original);

        kms.set_key_source_by_name("ORIGINAL");
        assert_eq!(kms.key_source(), KeySourceMode::Original);

        kms.set_key_source_by_name("internal");
        assert_eq!(kms.key_source(), KeySourceMode::Internal);
    }

    proptest! {
        #[test]
        fn test_unknown_names_never_change_mode(name in "\\PC*", start_original in any::<bool>()) {
            prop_assume!(name != "original" && name != "internal");

            let kms = MockKms::new(KeyStore::new());
            let start = if start_original { KeySourceMode::Original } else { KeySourceMode::Internal };
            kms.set_key_source(start);
            kms.set_key_source_by_name(&name);
            prop_assert_eq!(kms.key_source(), start);
        }
    }
}
