//! Normalization of role/permission name arguments.
//!
//! Callers may pass a single name, a delimiter-separated string (`"a|b|c"`),
//! or a list. Everything downstream works on [`Names`].

/// Separator understood by [`Names::parse`].
pub const DELIMITER: char = '|';

/// Separators understood by `ability` (`"admin,owner"` as well as `"admin|owner"`).
pub const ABILITY_DELIMITERS: [char; 2] = [',', DELIMITER];

/// A normalized name argument.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Names {
    /// One name; checked on its own.
    Single(String),
    /// An ordered list of names; checked under an any/all policy.
    List(Vec<String>),
}

impl Names {
    /// Split on [`DELIMITER`] if present; a lone token stays single.
    pub fn parse(raw: &str) -> Self {
        if raw.contains(DELIMITER) {
            Self::List(split(raw, &[DELIMITER]))
        } else {
            Self::Single(raw.to_string())
        }
    }

    /// Like [`Names::parse`], but always yields the list form.
    pub fn parse_list(raw: &str) -> Self {
        Self::List(split(raw, &[DELIMITER]))
    }

    /// Flatten into a list, splitting a single value on `delimiters`.
    pub fn into_list_with(self, delimiters: &[char]) -> Vec<String> {
        match self {
            Self::Single(raw) => split(&raw, delimiters),
            Self::List(names) => names,
        }
    }

    pub fn into_vec(self) -> Vec<String> {
        match self {
            Self::Single(name) => vec![name],
            Self::List(names) => names,
        }
    }

    pub fn is_list(&self) -> bool {
        matches!(self, Self::List(_))
    }

    pub fn len(&self) -> usize {
        match self {
            Self::Single(_) => 1,
            Self::List(names) => names.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn split(raw: &str, delimiters: &[char]) -> Vec<String> {
    raw.split(|c| delimiters.contains(&c))
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

impl From<&str> for Names {
    fn from(value: &str) -> Self {
        Self::parse(value)
    }
}

impl From<String> for Names {
    fn from(value: String) -> Self {
        Self::parse(&value)
    }
}

impl From<&String> for Names {
    fn from(value: &String) -> Self {
        Self::parse(value)
    }
}

impl From<Vec<String>> for Names {
    fn from(value: Vec<String>) -> Self {
        Self::List(value)
    }
}

impl From<Vec<&str>> for Names {
    fn from(value: Vec<&str>) -> Self {
        Self::List(value.into_iter().map(str::to_string).collect())
    }
}

impl From<&[&str]> for Names {
    fn from(value: &[&str]) -> Self {
        Self::List(value.iter().map(|s| s.to_string()).collect())
    }
}

impl From<&[String]> for Names {
    fn from(value: &[String]) -> Self {
        Self::List(value.to_vec())
    }
}

impl<const N: usize> From<[&str; N]> for Names {
    fn from(value: [&str; N]) -> Self {
        Self::List(value.iter().map(|s| s.to_string()).collect())
    }
}
