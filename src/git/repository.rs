use crate::domain::TaggedVersion;
use crate::error::{PipelineError, Result};
use crate::git::TagHistory;
use git2::{Oid, Repository as Git2Repo};
use std::collections::{HashMap, HashSet, VecDeque};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

/// Wrapper around git2::Repository with our trait interface
pub struct Git2Repository {
    repo: Mutex<Git2Repo>,
}

impl Git2Repository {
    /// Open or discover a git repository
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let repo = Git2Repo::discover(path)?;

        Ok(Git2Repository::from_git2(repo))
    }

    /// Create from existing git2::Repository
    pub fn from_git2(repo: Git2Repo) -> Self {
        Git2Repository {
            repo: Mutex::new(repo),
        }
    }

    fn lock(&self) -> Result<MutexGuard<'_, Git2Repo>> {
        self.repo
            .lock()
            .map_err(|_| PipelineError::tag("Repository lock poisoned"))
    }

    fn head_oid(repo: &Git2Repo) -> Result<Oid> {
        let commit = repo.head()?.peel_to_commit()?;
        Ok(commit.id())
    }

    /// Map each tagged commit to the tag names pointing at it
    ///
    /// Handles both lightweight and annotated tags. Tags that do not
    /// resolve to a commit are skipped.
    fn tags_by_commit(repo: &Git2Repo) -> Result<HashMap<Oid, Vec<String>>> {
        let mut tags_by_commit: HashMap<Oid, Vec<String>> = HashMap::new();

        for tag_name in repo.tag_names(None)?.iter().flatten() {
            let Ok(reference) = repo.find_reference(&format!("refs/tags/{}", tag_name)) else {
                continue;
            };
            if let Ok(commit) = reference.peel_to_commit() {
                tags_by_commit
                    .entry(commit.id())
                    .or_default()
                    .push(tag_name.to_string());
            }
        }

        for names in tags_by_commit.values_mut() {
            names.sort();
        }

        Ok(tags_by_commit)
    }
}

impl super::Repository for Git2Repository {
    fn head_commit(&self) -> Result<String> {
        let repo = self.lock()?;
        Ok(Self::head_oid(&repo)?.to_string())
    }

    fn tags_at_head(&self) -> Result<Vec<String>> {
        let repo = self.lock()?;
        let head = Self::head_oid(&repo)?;
        let mut tags = Self::tags_by_commit(&repo)?;

        Ok(tags.remove(&head).unwrap_or_default())
    }

    fn merged_tags(&self) -> Result<Vec<String>> {
        let repo = self.lock()?;
        let head = Self::head_oid(&repo)?;

        let mut merged = Vec::new();
        for (oid, names) in Self::tags_by_commit(&repo)? {
            if oid == head || repo.graph_descendant_of(head, oid)? {
                merged.extend(names);
            }
        }

        merged.sort();
        Ok(merged)
    }

    fn tag_history(&self) -> Result<TagHistory> {
        let repo = self.lock()?;
        let head = Self::head_oid(&repo)?;
        let tags_by_commit = Self::tags_by_commit(&repo)?;

        let mut history = TagHistory::default();
        let mut visited = HashSet::new();
        let mut queue = VecDeque::from([(head, 0u32)]);

        // Breadth-first, so the first visit of a commit carries its shortest height.
        while let Some((oid, height)) = queue.pop_front() {
            if !visited.insert(oid) {
                continue;
            }

            if let Some(names) = tags_by_commit.get(&oid) {
                history
                    .tagged
                    .extend(names.iter().map(|tag| TaggedVersion {
                        tag: tag.clone(),
                        height,
                    }));
                continue;
            }

            let commit = repo.find_commit(oid)?;
            if commit.parent_count() == 0 {
                history.root_height = history.root_height.max(height);
            }
            for parent in commit.parent_ids() {
                queue.push_back((parent, height + 1));
            }
        }

        Ok(history)
    }

    fn head_message(&self) -> Result<String> {
        let repo = self.lock()?;
        let commit = repo.head()?.peel_to_commit()?;

        Ok(commit.message().unwrap_or_default().trim_end().to_string())
    }

    fn remote_url(&self, remote: &str) -> Result<String> {
        let repo = self.lock()?;
        let remote_handle = repo
            .find_remote(remote)
            .map_err(|e| PipelineError::remote(format!("Cannot find remote '{}': {}", remote, e)))?;

        let url = remote_handle
            .url()
            .map(str::to_string)
            .ok_or_else(|| PipelineError::remote(format!("Remote '{}' has no URL", remote)))?;
        Ok(url)
    }
}
