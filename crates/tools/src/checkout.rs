//! Checkout confinement: tool paths stay inside the repository root.

use std::path::{Component, Path, PathBuf};

use prbot_core::error::ToolError;

/// The local repository checkout the tools operate on.
#[derive(Debug, Clone)]
pub struct Checkout {
    root: PathBuf,
}

impl Checkout {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Join a model-supplied relative path onto the root.
    ///
    /// Absolute paths and any `..` component are rejected. An empty path or
    /// `.` resolves to the root itself.
    pub fn resolve(&self, relative: &str) -> Result<PathBuf, ToolError> {
        let trimmed = relative.trim();
        let candidate = Path::new(trimmed);

        if candidate.is_absolute() || trimmed.starts_with('/') || trimmed.starts_with('\\') {
            return Err(ToolError::PathOutsideCheckout(relative.to_string()));
        }

        let mut resolved = self.root.clone();
        for component in candidate.components() {
            match component {
                Component::Normal(part) => resolved.push(part),
                Component::CurDir => {}
                Component::ParentDir | Component::RootDir | Component::Prefix(_) => {
                    return Err(ToolError::PathOutsideCheckout(relative.to_string()));
                }
            }
        }
        Ok(resolved)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn relative_paths_join_root() {
        let checkout = Checkout::new("/work/repo");
        assert_eq!(
            checkout.resolve("src/lib.rs").unwrap(),
            PathBuf::from("/work/repo/src/lib.rs")
        );
        assert_eq!(
            checkout.resolve("./src").unwrap(),
            PathBuf::from("/work/repo/src")
        );
        assert_eq!(checkout.resolve("").unwrap(), PathBuf::from("/work/repo"));
    }

    #[test]
    fn traversal_is_rejected() {
        let checkout = Checkout::new("/work/repo");
        for bad in ["../secret", "src/../../etc/passwd", "..", "/etc/passwd"] {
            assert!(
                matches!(checkout.resolve(bad), Err(ToolError::PathOutsideCheckout(_))),
                "{bad} should be rejected"
            );
        }
    }
}
