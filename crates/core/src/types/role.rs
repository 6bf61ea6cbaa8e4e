//! User roles and the dashboard each one lands on after login.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Route every unrecognized role is sent to after login.
pub const DEFAULT_DESTINATION: &str = "/";

/// School section managed by a section administrator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Section {
    Nursery,
    Primary,
    Secondary,
}

impl Section {
    /// Lowercase name used in role strings and routes.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Nursery => "nursery",
            Self::Primary => "primary",
            Self::Secondary => "secondary",
        }
    }
}

/// Role attached to an authenticated user.
///
/// Role strings come from the backend and are not under our control, so an
/// unrecognized value is kept verbatim in [`UserRole::Other`] rather than
/// failing deserialization.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum UserRole {
    Student,
    Teacher,
    Parent,
    Admin,
    SuperAdmin,
    /// Administrator scoped to a single school section.
    SectionAdmin(Section),
    /// A role string this client does not know about.
    Other(String),
}

impl UserRole {
    /// Parse a backend role string.
    ///
    /// Matching ignores ASCII case and treats `-` and spaces like `_`, so
    /// `"Super-Admin"` and `"superadmin"` are the same role.
    #[must_use]
    pub fn parse(raw: &str) -> Self {
        let normalized: String = raw
            .trim()
            .chars()
            .map(|c| match c {
                '-' | ' ' => '_',
                c => c.to_ascii_lowercase(),
            })
            .collect();

        match normalized.as_str() {
            "student" => Self::Student,
            "teacher" => Self::Teacher,
            "parent" => Self::Parent,
            "admin" => Self::Admin,
            "superadmin" | "super_admin" => Self::SuperAdmin,
            "nursery_admin" => Self::SectionAdmin(Section::Nursery),
            "primary_admin" => Self::SectionAdmin(Section::Primary),
            "secondary_admin" => Self::SectionAdmin(Section::Secondary),
            _ => Self::Other(raw.trim().to_owned()),
        }
    }

    /// Whether this role is one the client recognizes.
    #[must_use]
    pub const fn is_known(&self) -> bool {
        !matches!(self, Self::Other(_))
    }

    /// Whether the role has access to the admin settings form.
    #[must_use]
    pub const fn is_administrator(&self) -> bool {
        matches!(
            self,
            Self::Admin | Self::SuperAdmin | Self::SectionAdmin(_)
        )
    }

    /// Route the user lands on after a successful login.
    ///
    /// Unrecognized roles go to [`DEFAULT_DESTINATION`].
    #[must_use]
    pub const fn destination(&self) -> &'static str {
        match self {
            Self::Student => "/student/dashboard",
            Self::Teacher => "/teacher/dashboard",
            Self::Parent => "/parent/dashboard",
            Self::Admin => "/admin/dashboard",
            Self::SuperAdmin => "/superadmin/dashboard",
            Self::SectionAdmin(Section::Nursery) => "/section-admin/nursery/dashboard",
            Self::SectionAdmin(Section::Primary) => "/section-admin/primary/dashboard",
            Self::SectionAdmin(Section::Secondary) => "/section-admin/secondary/dashboard",
            Self::Other(_) => DEFAULT_DESTINATION,
        }
    }
}

/// Resolve the post-login destination for a raw role string.
#[must_use]
pub fn destination_for(raw_role: &str) -> &'static str {
    UserRole::parse(raw_role).destination()
}

impl fmt::Display for UserRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Student => write!(f, "student"),
            Self::Teacher => write!(f, "teacher"),
            Self::Parent => write!(f, "parent"),
            Self::Admin => write!(f, "admin"),
            Self::SuperAdmin => write!(f, "superadmin"),
            Self::SectionAdmin(section) => write!(f, "{}_admin", section.as_str()),
            Self::Other(raw) => write!(f, "{raw}"),
        }
    }
}

impl std::str::FromStr for UserRole {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::parse(s))
    }
}

impl From<String> for UserRole {
    fn from(raw: String) -> Self {
        Self::parse(&raw)
    }
}

impl From<UserRole> for String {
    fn from(role: UserRole) -> Self {
        role.to_string()
    }
}
