use crate::ids::{OrganizationID, OwnerID};

/// The `(owner, organization?)` pair that bounds slug uniqueness and every
/// listing query.
///
/// The organization is a grouping key only: writes are always authorized by
/// `owner_id`, and a record created under `organization(owner, org)` is still
/// owned by `owner`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct OwnershipScope {
    pub owner_id: OwnerID,
    pub organization_id: Option<OrganizationID>,
}

impl OwnershipScope {
    /// Scope for records that belong to the owner personally.
    pub fn personal(owner_id: OwnerID) -> Self {
        Self {
            owner_id,
            organization_id: None,
        }
    }

    /// Scope for records the owner files under an organization.
    pub fn organization(
        owner_id: OwnerID,
        organization_id: OrganizationID,
    ) -> Self {
        Self {
            owner_id,
            organization_id: Some(organization_id),
        }
    }

    pub fn owner(&self) -> OwnerID {
        self.owner_id
    }

    pub fn is_personal(&self) -> bool {
        self.organization_id.is_none()
    }

    /// True when a record with the given keys lives inside this scope.
    pub fn contains(
        &self,
        owner_id: OwnerID,
        organization_id: Option<OrganizationID>,
    ) -> bool {
        self.owner_id == owner_id && self.organization_id == organization_id
    }
}

impl From<OwnerID> for OwnershipScope {
    fn from(owner_id: OwnerID) -> Self {
        Self::personal(owner_id)
    }
}
