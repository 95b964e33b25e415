//! Ref selectors pinning which version of a repository a site serves.

use std::fmt;

/// The branch or tag a site tracks.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub enum RefSelector {
    /// A branch reference (e.g., "main", "gh-pages").
    Branch(String),

    /// A tag reference (e.g., "v1.0.0").
    Tag(String),

    /// Whatever the remote's HEAD points at.
    #[default]
    Default,
}

impl RefSelector {
    /// Creates a branch selector.
    pub fn branch(name: impl Into<String>) -> Self {
        Self::Branch(name.into())
    }

    /// Creates a tag selector.
    pub fn tag(name: impl Into<String>) -> Self {
        Self::Tag(name.into())
    }

    /// Builds a selector from the optional branch and tag of a site
    /// configuration. A tag wins over a branch; blank values are ignored.
    pub fn from_parts(branch: Option<&str>, tag: Option<&str>) -> Self {
        fn clean(v: Option<&str>) -> Option<&str> {
            v.map(str::trim).filter(|v| !v.is_empty())
        }

        match (clean(branch), clean(tag)) {
            (_, Some(tag)) => Self::Tag(tag.to_string()),
            (Some(branch), None) => Self::Branch(branch.to_string()),
            (None, None) => Self::Default,
        }
    }

    /// Returns the reference name without prefix, if any.
    pub fn name(&self) -> Option<&str> {
        match self {
            Self::Branch(name) | Self::Tag(name) => Some(name),
            Self::Default => None,
        }
    }

    /// Returns the full Git reference path.
    pub fn full_ref(&self) -> Option<String> {
        match self {
            Self::Branch(name) => Some(format!("refs/heads/{}", name)),
            Self::Tag(name) => Some(format!("refs/tags/{}", name)),
            Self::Default => None,
        }
    }

    /// Returns the refspec that force-updates a tag on fetch.
    ///
    /// The remote's default refspecs never move an existing tag, so a
    /// re-pointed tag has to be requested explicitly.
    pub fn fetch_refspec(&self) -> Option<String> {
        match self {
            Self::Tag(name) => Some(format!("+refs/tags/{0}:refs/tags/{0}", name)),
            Self::Branch(_) | Self::Default => None,
        }
    }

    /// Returns the reference the remote-tracking state is stored under
    /// after a fetch.
    pub fn tracking_ref(&self) -> String {
        match self {
            Self::Branch(name) => format!("refs/remotes/origin/{}", name),
            Self::Tag(name) => format!("refs/tags/{}", name),
            Self::Default => "refs/remotes/origin/HEAD".to_string(),
        }
    }

    /// Returns true if this is a tag selector.
    pub fn is_tag(&self) -> bool {
        matches!(self, Self::Tag(_))
    }

    /// Validates the reference name.
    ///
    /// Returns an error message if the name is invalid.
    pub fn validate(&self) -> Result<(), &'static str> {
        let Some(name) = self.name() else {
            return Ok(());
        };

        if name.is_empty() {
            return Err("reference name cannot be empty");
        }

        if name.starts_with('/') || name.ends_with('/') {
            return Err("reference name cannot start or end with '/'");
        }

        if name.contains("..") {
            return Err("reference name cannot contain '..'");
        }

        if name.contains("//") {
            return Err("reference name cannot contain '//'");
        }

        for c in name.chars() {
            if c.is_control()
                || c == ' '
                || c == '~'
                || c == '^'
                || c == ':'
                || c == '?'
                || c == '*'
                || c == '['
            {
                return Err("reference name contains invalid characters");
            }
        }

        Ok(())
    }
}

impl fmt::Display for RefSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Branch(name) => write!(f, "{}", name),
            Self::Tag(name) => write!(f, "tags/{}", name),
            Self::Default => write!(f, "HEAD"),
        }
    }
}
