/// Principal model
///
/// Students and instructors live in unrelated collections. They share an
/// account record and are handled through one closed tagged union so the
/// session code never needs to know which collection a principal came from.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Closed set of principal kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Student,
    Instructor,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Student => "student",
            Role::Instructor => "instructor",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "student" => Ok(Role::Student),
            "instructor" => Ok(Role::Instructor),
            other => Err(format!("unknown role: {}", other)),
        }
    }
}

/// Email verification state, owned by the verification flow.
/// Session code reads `verified` for projections and never writes any of it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EmailVerification {
    pub verified: bool,
    pub token: Option<String>,
    pub expires_at: Option<DateTime<Utc>>,
}

/// Fields common to every principal kind
#[derive(Debug, Clone, PartialEq)]
pub struct Account {
    pub id: String,
    pub email: String,
    pub password_hash: String,
    pub first_name: String,
    pub last_name: String,
    /// SHA-256 fingerprint of the single currently valid refresh token
    pub refresh_token_hash: Option<String>,
    pub verification: EmailVerification,
    pub created_at: DateTime<Utc>,
}

impl Account {
    pub fn new(
        id: impl Into<String>,
        email: impl Into<String>,
        first_name: impl Into<String>,
        last_name: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            email: email.into(),
            password_hash: String::new(),
            first_name: first_name.into(),
            last_name: last_name.into(),
            refresh_token_hash: None,
            verification: EmailVerification::default(),
            created_at: Utc::now(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Student {
    pub account: Account,
    pub enrolled_courses: Vec<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Instructor {
    pub account: Account,
    pub bio: Option<String>,
    pub expertise: Vec<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Principal {
    Student(Student),
    Instructor(Instructor),
}

impl Principal {
    pub fn role(&self) -> Role {
        match self {
            Principal::Student(_) => Role::Student,
            Principal::Instructor(_) => Role::Instructor,
        }
    }

    pub fn account(&self) -> &Account {
        match self {
            Principal::Student(s) => &s.account,
            Principal::Instructor(i) => &i.account,
        }
    }

    pub fn account_mut(&mut self) -> &mut Account {
        match self {
            Principal::Student(s) => &mut s.account,
            Principal::Instructor(i) => &mut i.account,
        }
    }

    pub fn id(&self) -> &str {
        &self.account().id
    }

    /// Projection safe to cache and hand to clients.
    ///
    /// Drops the password hash, the refresh token fingerprint and the
    /// verification secrets.
    pub fn sanitize(&self) -> SessionProfile {
        let account = self.account();
        let public = PublicAccount {
            id: account.id.clone(),
            email: account.email.clone(),
            first_name: account.first_name.clone(),
            last_name: account.last_name.clone(),
            email_verified: account.verification.verified,
            created_at: account.created_at,
        };

        match self {
            Principal::Student(s) => SessionProfile::Student {
                account: public,
                enrolled_courses: s.enrolled_courses.clone(),
            },
            Principal::Instructor(i) => SessionProfile::Instructor {
                account: public,
                bio: i.bio.clone(),
                expertise: i.expertise.clone(),
            },
        }
    }
}

impl From<Student> for Principal {
    fn from(student: Student) -> Self {
        Principal::Student(student)
    }
}

impl From<Instructor> for Principal {
    fn from(instructor: Instructor) -> Self {
        Principal::Instructor(instructor)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicAccount {
    pub id: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub email_verified: bool,
    pub created_at: DateTime<Utc>,
}

/// Sanitized principal projection served by the session-read call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "role", rename_all = "lowercase")]
pub enum SessionProfile {
    #[serde(rename_all = "camelCase")]
    Student {
        #[serde(flatten)]
        account: PublicAccount,
        enrolled_courses: Vec<String>,
    },
    #[serde(rename_all = "camelCase")]
    Instructor {
        #[serde(flatten)]
        account: PublicAccount,
        bio: Option<String>,
        expertise: Vec<String>,
    },
}

impl SessionProfile {
    pub fn id(&self) -> &str {
        match self {
            SessionProfile::Student { account, .. } => &account.id,
            SessionProfile::Instructor { account, .. } => &account.id,
        }
    }

    pub fn role(&self) -> Role {
        match self {
            SessionProfile::Student { .. } => Role::Student,
            SessionProfile::Instructor { .. } => Role::Instructor,
        }
    }
}
