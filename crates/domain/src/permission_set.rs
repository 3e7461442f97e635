use std::collections::BTreeMap;

use fieldcrew_core::AppResult;
use serde::{Deserialize, Serialize};

use crate::Capability;

/// Full capability → flag mapping carried by every role.
///
/// A set is always complete: every known capability has an explicit value, so a
/// stored set is never a diff against some other role.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(
    from = "BTreeMap<Capability, bool>",
    into = "BTreeMap<Capability, bool>"
)]
pub struct PermissionSet {
    flags: BTreeMap<Capability, bool>,
}

impl PermissionSet {
    /// Creates a set with every capability denied.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            flags: Capability::all()
                .iter()
                .map(|capability| (*capability, false))
                .collect(),
        }
    }

    /// Creates a set granting exactly the listed capabilities.
    #[must_use]
    pub fn from_granted(granted: impl IntoIterator<Item = Capability>) -> Self {
        let mut set = Self::empty();
        for capability in granted {
            set.flags.insert(capability, true);
        }
        set
    }

    /// Parses transport flags. Unknown capability names are rejected; omitted
    /// capabilities are denied.
    pub fn from_flags<'a>(flags: impl IntoIterator<Item = (&'a str, bool)>) -> AppResult<Self> {
        let mut set = Self::empty();
        for (name, allowed) in flags {
            let capability = Capability::from_transport(name)?;
            set.flags.insert(capability, allowed);
        }
        Ok(set)
    }

    /// Returns a copy with one capability set to the given value.
    #[must_use]
    pub fn with(mut self, capability: Capability, allowed: bool) -> Self {
        self.flags.insert(capability, allowed);
        self
    }

    /// Returns whether the capability is granted. Absent entries are denied.
    #[must_use]
    pub fn allows(&self, capability: Capability) -> bool {
        self.flags.get(&capability).copied().unwrap_or(false)
    }

    /// Iterates granted capabilities in stable order.
    pub fn granted(&self) -> impl Iterator<Item = Capability> + '_ {
        self.flags
            .iter()
            .filter_map(|(capability, allowed)| allowed.then_some(*capability))
    }

    /// Returns whether no capability is granted.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.granted().next().is_none()
    }

    /// Returns the transport representation keyed by capability name.
    #[must_use]
    pub fn to_flags(&self) -> BTreeMap<String, bool> {
        self.flags
            .iter()
            .map(|(capability, allowed)| (capability.as_str().to_owned(), *allowed))
            .collect()
    }
}

impl Default for PermissionSet {
    fn default() -> Self {
        Self::empty()
    }
}

impl From<BTreeMap<Capability, bool>> for PermissionSet {
    fn from(value: BTreeMap<Capability, bool>) -> Self {
        let mut set = Self::empty();
        set.flags.extend(value);
        set
    }
}

impl From<PermissionSet> for BTreeMap<Capability, bool> {
    fn from(value: PermissionSet) -> Self {
        value.flags
    }
}
