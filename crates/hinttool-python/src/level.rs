//! Python language-level queries.
//!
//! Annotation synthesis needs exactly two answers from the target language
//! version: whether syntactic variable annotations are available (3.6+), and
//! whether syntactic function annotations are available (3.x). Everything
//! older falls back to `# type:` comments.

use std::fmt;

/// A Python language level (major.minor).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PythonLevel {
    pub major: u8,
    pub minor: u8,
}

impl PythonLevel {
    /// Python 2.7, the last level without syntactic annotations.
    pub const PY27: PythonLevel = PythonLevel { major: 2, minor: 7 };
    /// Python 3.0, first level with function annotations.
    pub const PY30: PythonLevel = PythonLevel { major: 3, minor: 0 };
    /// Python 3.6, first level with variable annotations (PEP 526).
    pub const PY36: PythonLevel = PythonLevel { major: 3, minor: 6 };

    pub fn new(major: u8, minor: u8) -> Self {
        PythonLevel { major, minor }
    }

    /// Parse `"3"`, `"3.6"`, or `"2.7"`.
    pub fn parse(text: &str) -> Option<Self> {
        let mut parts = text.split('.');
        let major: u8 = parts.next()?.trim().parse().ok()?;
        let minor: u8 = match parts.next() {
            Some(m) => m.trim().parse().ok()?,
            None => 0,
        };
        if parts.next().is_some() {
            return None;
        }
        Some(PythonLevel { major, minor })
    }

    /// Whether `x: int = ...` syntax is available.
    pub fn supports_variable_annotations(&self) -> bool {
        *self >= Self::PY36
    }

    /// Whether `def f(x: int) -> str:` syntax is available.
    pub fn supports_function_annotations(&self) -> bool {
        self.major >= 3
    }
}

impl Default for PythonLevel {
    fn default() -> Self {
        PythonLevel { major: 3, minor: 8 }
    }
}

impl fmt::Display for PythonLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_levels() {
        assert_eq!(PythonLevel::parse("2.7"), Some(PythonLevel::PY27));
        assert_eq!(PythonLevel::parse("3.6"), Some(PythonLevel::PY36));
        assert_eq!(PythonLevel::parse("3"), Some(PythonLevel::new(3, 0)));
        assert_eq!(PythonLevel::parse("3.6.1"), None);
        assert_eq!(PythonLevel::parse("abc"), None);
    }

    #[test]
    fn annotation_support() {
        assert!(!PythonLevel::PY27.supports_variable_annotations());
        assert!(!PythonLevel::PY27.supports_function_annotations());
        assert!(!PythonLevel::new(3, 5).supports_variable_annotations());
        assert!(PythonLevel::new(3, 5).supports_function_annotations());
        assert!(PythonLevel::PY36.supports_variable_annotations());
        assert!(PythonLevel::default().supports_variable_annotations());
    }
}
