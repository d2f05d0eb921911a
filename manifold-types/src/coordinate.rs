use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// `group:artifact`, the identity a dependency keeps across versions.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ModuleId {
    pub group: String,
    pub artifact: String,
}

/// A dependency coordinate, `group:artifact[:version]`.
///
/// A coordinate without a version is *managed*: the resolver looks its version
/// up in the descriptor's dependency-management table.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Coordinate {
    pub group: String,
    pub artifact: String,
    pub version: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoordinateError {
    #[error("invalid coordinate '{input}': expected group:artifact[:version]")]
    Shape { input: String },

    #[error("invalid coordinate '{input}': {part} is empty")]
    EmptyPart { input: String, part: &'static str },

    #[error("invalid coordinate '{input}': {part} contains whitespace")]
    Whitespace { input: String, part: &'static str },
}

fn check_part(input: &str, part: &'static str, value: &str) -> Result<(), CoordinateError> {
    if value.is_empty() {
        return Err(CoordinateError::EmptyPart {
            input: input.to_string(),
            part,
        });
    }
    if value.chars().any(char::is_whitespace) {
        return Err(CoordinateError::Whitespace {
            input: input.to_string(),
            part,
        });
    }
    Ok(())
}

impl Coordinate {
    pub fn new(group: &str, artifact: &str, version: Option<&str>) -> Self {
        Self {
            group: group.to_string(),
            artifact: artifact.to_string(),
            version: version.map(str::to_string),
        }
    }

    pub fn module(&self) -> ModuleId {
        ModuleId {
            group: self.group.clone(),
            artifact: self.artifact.clone(),
        }
    }

    pub fn is_managed(&self) -> bool {
        self.version.is_none()
    }

    /// Same module, pinned to `version`.
    pub fn with_version(&self, version: &str) -> Self {
        Self {
            group: self.group.clone(),
            artifact: self.artifact.clone(),
            version: Some(version.to_string()),
        }
    }
}

impl ModuleId {
    pub fn new(group: &str, artifact: &str) -> Self {
        Self {
            group: group.to_string(),
            artifact: artifact.to_string(),
        }
    }

    pub fn at(&self, version: &str) -> Coordinate {
        Coordinate {
            group: self.group.clone(),
            artifact: self.artifact.clone(),
            version: Some(version.to_string()),
        }
    }
}

impl FromStr for Coordinate {
    type Err = CoordinateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.split(':').collect();
        let (group, artifact, version) = match parts.as_slice() {
            [g, a] => (*g, *a, None),
            [g, a, v] => (*g, *a, Some(*v)),
            _ => {
                return Err(CoordinateError::Shape {
                    input: s.to_string(),
                });
            }
        };
        check_part(s, "group", group)?;
        check_part(s, "artifact", artifact)?;
        if let Some(v) = version {
            check_part(s, "version", v)?;
        }
        Ok(Coordinate::new(group, artifact, version))
    }
}

impl FromStr for ModuleId {
    type Err = CoordinateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let c: Coordinate = s.parse()?;
        if c.version.is_some() {
            return Err(CoordinateError::Shape {
                input: s.to_string(),
            });
        }
        Ok(c.module())
    }
}

impl fmt::Display for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.version {
            Some(v) => write!(f, "{}:{}:{}", self.group, self.artifact, v),
            None => write!(f, "{}:{}", self.group, self.artifact),
        }
    }
}

impl fmt::Display for ModuleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.group, self.artifact)
    }
}

impl TryFrom<String> for Coordinate {
    type Error = CoordinateError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Coordinate> for String {
    fn from(value: Coordinate) -> Self {
        value.to_string()
    }
}

impl TryFrom<String> for ModuleId {
    type Error = CoordinateError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<ModuleId> for String {
    fn from(value: ModuleId) -> Self {
        value.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_managed_coordinate() {
        let c: Coordinate = "org.projectlombok:lombok".parse().unwrap();
        assert_eq!(c.group, "org.projectlombok");
        assert_eq!(c.artifact, "lombok");
        assert!(c.is_managed());
        assert_eq!(c.to_string(), "org.projectlombok:lombok");
    }

    #[test]
    fn parses_versioned_coordinate() {
        let c: Coordinate = "org.junit.platform:junit-platform-launcher:6.0.2"
            .parse()
            .unwrap();
        assert_eq!(c.version.as_deref(), Some("6.0.2"));
        assert_eq!(c.module().to_string(), "org.junit.platform:junit-platform-launcher");
    }

    #[test]
    fn rejects_bad_shapes() {
        assert!(matches!(
            "lombok".parse::<Coordinate>(),
            Err(CoordinateError::Shape { .. })
        ));
        assert!(matches!(
            "a:b:c:d".parse::<Coordinate>(),
            Err(CoordinateError::Shape { .. })
        ));
        assert!(matches!(
            ":lombok".parse::<Coordinate>(),
            Err(CoordinateError::EmptyPart { part: "group", .. })
        ));
        assert!(matches!(
            "g:a:".parse::<Coordinate>(),
            Err(CoordinateError::EmptyPart { part: "version", .. })
        ));
        assert!(matches!(
            "g:a b".parse::<Coordinate>(),
            Err(CoordinateError::Whitespace { part: "artifact", .. })
        ));
    }

    #[test]
    fn module_id_rejects_version() {
        assert!("g:a".parse::<ModuleId>().is_ok());
        assert!("g:a:1".parse::<ModuleId>().is_err());
    }

    #[test]
    fn serializes_as_string() {
        let c = Coordinate::new("g", "a", Some("1.0"));
        let json = serde_json::to_string(&c).unwrap();
        assert_eq!(json, "\"g:a:1.0\"");
        let back: Coordinate = serde_json::from_str(&json).unwrap();
        assert_eq!(back, c);
    }
}
