//! Closed role enumeration and the one-or-set required-role container.

// std
use std::slice::Iter;
// self
use crate::_prelude::*;

/// Error returned when a wire role string falls outside the closed set.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, ThisError)]
#[error("Unknown role: {role}.")]
pub struct RoleParseError {
	/// The offending role string.
	pub role: String,
}

/// Closed set of roles recognized by the portals.
///
/// Roles are immutable for the lifetime of a session; a role change requires a
/// fresh login. Unknown wire strings fail parsing instead of passing through.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Role {
	/// Administrative users with full portal access.
	Admin,
	/// Lawyers of a law firm.
	Lawyer,
	/// Law-firm secretaries.
	Secretary,
	/// End clients of a firm.
	Client,
	/// Rental-agency managers.
	Manager,
	/// Rental-agency agents.
	Agent,
}
impl Role {
	/// Returns a stable label matching the wire representation.
	pub const fn as_str(self) -> &'static str {
		match self {
			Role::Admin => "Admin",
			Role::Lawyer => "Lawyer",
			Role::Secretary => "Secretary",
			Role::Client => "Client",
			Role::Manager => "Manager",
			Role::Agent => "Agent",
		}
	}
}
impl Display for Role {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}
impl FromStr for Role {
	type Err = RoleParseError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s {
			"Admin" => Ok(Role::Admin),
			"Lawyer" => Ok(Role::Lawyer),
			"Secretary" => Ok(Role::Secretary),
			"Client" => Ok(Role::Client),
			"Manager" => Ok(Role::Manager),
			"Agent" => Ok(Role::Agent),
			_ => Err(RoleParseError { role: s.to_owned() }),
		}
	}
}

/// Deduplicated, ordered set of acceptable roles.
///
/// Every required-role parameter in the crate accepts `impl Into<RoleSet>`, so a
/// single [`Role`], an array, or a `Vec` all work, mirroring the portals' dual
/// single-role/role-list usage.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<Role>", into = "Vec<Role>")]
pub struct RoleSet(Vec<Role>);
impl RoleSet {
	/// Creates a normalized role set from any iterator.
	pub fn new<I>(roles: I) -> Self
	where
		I: IntoIterator<Item = Role>,
	{
		let mut roles: Vec<Role> = roles.into_iter().collect();

		roles.sort_unstable();
		roles.dedup();

		Self(roles)
	}

	/// Number of distinct roles.
	pub fn len(&self) -> usize {
		self.0.len()
	}

	/// Returns true if no roles are accepted.
	pub fn is_empty(&self) -> bool {
		self.0.is_empty()
	}

	/// Returns true if the set contains the provided role.
	pub fn contains(&self, role: Role) -> bool {
		self.0.binary_search(&role).is_ok()
	}

	/// Iterator over the contained roles.
	pub fn iter(&self) -> Iter<'_, Role> {
		self.0.iter()
	}

	/// Returns the underlying slice of roles.
	pub fn as_slice(&self) -> &[Role] {
		&self.0
	}
}
impl From<Role> for RoleSet {
	fn from(role: Role) -> Self {
		Self(vec![role])
	}
}
impl<const N: usize> From<[Role; N]> for RoleSet {
	fn from(roles: [Role; N]) -> Self {
		Self::new(roles)
	}
}
impl From<&[Role]> for RoleSet {
	fn from(roles: &[Role]) -> Self {
		Self::new(roles.iter().copied())
	}
}
impl From<Vec<Role>> for RoleSet {
	fn from(roles: Vec<Role>) -> Self {
		Self::new(roles)
	}
}
impl From<RoleSet> for Vec<Role> {
	fn from(set: RoleSet) -> Self {
		set.0
	}
}
impl FromIterator<Role> for RoleSet {
	fn from_iter<I: IntoIterator<Item = Role>>(iter: I) -> Self {
		Self::new(iter)
	}
}
impl Display for RoleSet {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		let mut first = true;

		for role in &self.0 {
			if !first {
				f.write_str(", ")?;
			}

			f.write_str(role.as_str())?;

			first = false;
		}

		Ok(())
	}
}
