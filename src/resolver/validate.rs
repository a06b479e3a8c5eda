//! Cache path validation
//!
//! Some names a provider can resolve cannot be represented as files in the
//! cache on every OS. Such names are treated as not found.

/// Characters rejected by [`PathPolicy::Restrictive`] besides control characters
const RESTRICTED_CHARS: &[char] = &['"', '*', ':', '<', '>', '?', '|'];

/// Per-character rule deciding whether a logical name may become a cache path
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathPolicy {
    /// Windows-style: no control characters, spaces or `" * : < > ? |`
    Restrictive,
    /// POSIX-style: anything but NUL
    Permissive,
}

impl PathPolicy {
    /// Policy matching the host OS
    pub fn for_host() -> Self {
        if cfg!(windows) {
            Self::Restrictive
        } else {
            Self::Permissive
        }
    }

    /// Whether every character of `name` is allowed
    pub fn is_valid(&self, name: &str) -> bool {
        name.chars().all(|c| self.allows(c))
    }

    fn allows(&self, c: char) -> bool {
        match self {
            Self::Restrictive => (c as u32) >= 33 && !RESTRICTED_CHARS.contains(&c),
            Self::Permissive => c != '\0',
        }
    }
}

impl Default for PathPolicy {
    fn default() -> Self {
        Self::for_host()
    }
}
