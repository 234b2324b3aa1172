use std::fmt;

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("invalid identity name {raw:?}: {reason}")]
pub struct InvalidName {
    pub raw: String,
    pub reason: &'static str,
}

/// An identity name that is safe to use as a gallery key and a single path
/// component inside the reference corpus.
///
/// New names are built with [`sanitize`](Self::sanitize). Names that refer to
/// existing corpus entries are taken verbatim with [`existing`](Self::existing)
/// so they match exactly what the corpus lists.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct IdentityName(String);

impl IdentityName {
    /// Keeps only letters, digits, space, underscore and hyphen, then trims
    /// surrounding whitespace.
    pub fn sanitize(raw: &str) -> Result<Self, InvalidName> {
        let kept: String = raw
            .chars()
            .filter(|c| c.is_alphanumeric() || matches!(c, ' ' | '_' | '-'))
            .collect();
        let trimmed = kept.trim();
        if trimmed.is_empty() {
            return Err(InvalidName {
                raw: raw.to_string(),
                reason: "nothing left after removing unsupported characters",
            });
        }
        Ok(Self(trimmed.to_string()))
    }

    /// Accepts `raw` unchanged as long as it names one path component.
    pub fn existing(raw: &str) -> Result<Self, InvalidName> {
        let reason = if raw.is_empty() {
            Some("name is empty")
        } else if raw == "." || raw == ".." {
            Some("name is a relative path component")
        } else if raw.contains(['/', '\\', '\0']) {
            Some("name contains a path separator")
        } else {
            None
        };
        match reason {
            Some(reason) => Err(InvalidName {
                raw: raw.to_string(),
                reason,
            }),
            None => Ok(Self(raw.to_string())),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for IdentityName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
