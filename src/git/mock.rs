use crate::domain::TaggedVersion;
use crate::error::{PipelineError, Result};
use crate::git::{Repository, TagHistory};
use std::collections::HashMap;

/// Mock repository for testing without actual git operations
pub struct MockRepository {
    head: String,
    head_message: String,
    tags_at_head: Vec<String>,
    merged_tags: Vec<String>,
    history: TagHistory,
    remotes: HashMap<String, String>,
}

impl MockRepository {
    /// Create a new mock repository with an untagged HEAD
    pub fn new(head: impl Into<String>) -> Self {
        MockRepository {
            head: head.into(),
            head_message: String::new(),
            tags_at_head: Vec::new(),
            merged_tags: Vec::new(),
            history: TagHistory::default(),
            remotes: HashMap::new(),
        }
    }

    /// Set the HEAD commit message
    pub fn with_head_message(mut self, message: impl Into<String>) -> Self {
        self.head_message = message.into();
        self
    }

    /// Tag HEAD directly
    pub fn with_tag_at_head(mut self, name: impl Into<String>) -> Self {
        let name = name.into();
        self.tags_at_head.push(name.clone());
        self.tags_at_head.sort();
        self.history.tagged.push(TaggedVersion {
            tag: name.clone(),
            height: 0,
        });
        self.add_merged(name);
        self
    }

    /// Add a tag reachable from HEAD at the given height
    pub fn with_tag(mut self, name: impl Into<String>, height: u32) -> Self {
        let name = name.into();
        self.history.tagged.push(TaggedVersion {
            tag: name.clone(),
            height,
        });
        self.add_merged(name);
        self
    }

    /// Set the height reported for the root commit
    pub fn with_root_height(mut self, height: u32) -> Self {
        self.history.root_height = height;
        self
    }

    /// Configure a remote
    pub fn with_remote(mut self, name: impl Into<String>, url: impl Into<String>) -> Self {
        self.remotes.insert(name.into(), url.into());
        self
    }

    fn add_merged(&mut self, name: String) {
        self.merged_tags.push(name);
        self.merged_tags.sort();
    }
}

impl Default for MockRepository {
    fn default() -> Self {
        Self::new("0000000000000000000000000000000000000000")
    }
}

impl Repository for MockRepository {
    fn head_commit(&self) -> Result<String> {
        Ok(self.head.clone())
    }

    fn tags_at_head(&self) -> Result<Vec<String>> {
        Ok(self.tags_at_head.clone())
    }

    fn merged_tags(&self) -> Result<Vec<String>> {
        Ok(self.merged_tags.clone())
    }

    fn tag_history(&self) -> Result<TagHistory> {
        Ok(self.history.clone())
    }

    fn head_message(&self) -> Result<String> {
        Ok(self.head_message.clone())
    }

    fn remote_url(&self, remote: &str) -> Result<String> {
        self.remotes
            .get(remote)
            .cloned()
            .ok_or_else(|| PipelineError::remote(format!("Cannot find remote '{}'", remote)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mock_repository_tags() {
        let repo = MockRepository::new("abc123")
            .with_tag("v1.1.0", 3)
            .with_tag("v1.0.0", 8);

        assert_eq!(repo.head_commit().unwrap(), "abc123");
        assert!(repo.tags_at_head().unwrap().is_empty());
        assert_eq!(repo.merged_tags().unwrap(), vec!["v1.0.0", "v1.1.0"]);
        assert_eq!(repo.tag_history().unwrap().tagged.len(), 2);
    }

    #[test]
    fn test_mock_repository_tag_at_head() {
        let repo = MockRepository::default().with_tag_at_head("v2.0.0");

        assert_eq!(repo.tags_at_head().unwrap(), vec!["v2.0.0"]);
        assert_eq!(repo.merged_tags().unwrap(), vec!["v2.0.0"]);
        assert_eq!(repo.tag_history().unwrap().tagged[0].height, 0);
    }

    #[test]
    fn test_mock_repository_remotes() {
        let repo = MockRepository::default().with_remote("origin", "git@github.com:a/b.git");

        assert_eq!(repo.remote_url("origin").unwrap(), "git@github.com:a/b.git");
        assert!(repo.remote_url("upstream").is_err());
    }
}
