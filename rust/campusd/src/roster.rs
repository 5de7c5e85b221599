use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Teacher,
    Student,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Teacher => "teacher",
            Role::Student => "student",
        }
    }

    /// Admins and teachers share the management dashboard.
    pub fn is_staff(self) -> bool {
        !matches!(self, Role::Student)
    }
}

/// One login on the roster. The persisted session form is this exact shape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Identity {
    pub id: String,
    pub username: String,
    pub password: String,
    pub full_name: String,
    pub role: Role,
}

struct RosterEntry {
    id: &'static str,
    username: &'static str,
    password: &'static str,
    full_name: &'static str,
    role: Role,
}

impl RosterEntry {
    fn to_identity(&self) -> Identity {
        Identity {
            id: self.id.to_string(),
            username: self.username.to_string(),
            password: self.password.to_string(),
            full_name: self.full_name.to_string(),
            role: self.role,
        }
    }
}

static ROSTER: [RosterEntry; 3] = [
    RosterEntry {
        id: "1",
        username: "admin",
        password: "password",
        full_name: "Admin User",
        role: Role::Admin,
    },
    RosterEntry {
        id: "2",
        username: "teacher",
        password: "password",
        full_name: "Teacher User",
        role: Role::Teacher,
    },
    RosterEntry {
        id: "3",
        username: "student",
        password: "student123",
        full_name: "Student User",
        role: Role::Student,
    },
];

#[cfg(test)]
pub fn roster() -> Vec<Identity> {
    ROSTER.iter().map(RosterEntry::to_identity).collect()
}

/// First roster entry whose username and password both match exactly.
pub fn find_by_credentials(username: &str, password: &str) -> Option<Identity> {
    ROSTER
        .iter()
        .find(|e| e.username == username && e.password == password)
        .map(RosterEntry::to_identity)
}

/// True when `identity` names a roster entry with the same id, username and role.
pub fn is_known(identity: &Identity) -> bool {
    ROSTER.iter().any(|e| {
        e.id == identity.id && e.username == identity.username && e.role == identity.role
    })
}
