//! Authoring session facts and attribute references.

use std::fmt;

/// Environment variables consulted for the machine name, in order.
const MACHINE_NAME_VARS: [&str; 2] = ["COMPUTERNAME", "HOSTNAME"];

/// Facts about the current authoring session supplied by the host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionContext {
    /// Name of the machine running the authoring tool.
    pub machine_name: String,
    /// Full path of the open model; empty for unsaved models.
    pub file_path: String,
}

impl SessionContext {
    /// Creates a session context.
    pub fn new(machine_name: impl Into<String>, file_path: impl Into<String>) -> Self {
        Self {
            machine_name: machine_name.into(),
            file_path: file_path.into(),
        }
    }

    /// Creates a session context using the local machine name.
    pub fn from_env(file_path: impl Into<String>) -> Self {
        Self::new(local_machine_name(), file_path)
    }
}

fn local_machine_name() -> String {
    MACHINE_NAME_VARS
        .iter()
        .filter_map(|var| std::env::var(var).ok())
        .find(|name| !name.is_empty())
        .unwrap_or_else(|| "localhost".to_string())
}

/// Shared parameter group holding the fire rating definition.
pub const FIRE_RATING_GROUP: &str = "API Parameters";

/// Shared parameter name of the fire rating attribute.
pub const FIRE_RATING_NAME: &str = "API FireRating";

/// Opaque host handle locating a numeric attribute on an entity.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AttributeRef {
    group: String,
    name: String,
}

impl AttributeRef {
    /// Creates a reference to a parameter in a definition group.
    pub fn new(group: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            group: group.into(),
            name: name.into(),
        }
    }

    /// The shared fire rating parameter.
    pub fn fire_rating() -> Self {
        Self::new(FIRE_RATING_GROUP, FIRE_RATING_NAME)
    }

    /// Returns the definition group.
    pub fn group(&self) -> &str {
        &self.group
    }

    /// Returns the parameter name.
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl Default for AttributeRef {
    fn default() -> Self {
        Self::fire_rating()
    }
}

impl fmt::Display for AttributeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}
