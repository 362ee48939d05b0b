//! FIFO crawl frontier with O(1) membership checks

use std::collections::{HashSet, VecDeque};

/// Breadth-first work queue of canonical page URLs
///
/// The queue never holds the same URL twice; `members` mirrors the queue
/// contents exactly.
#[derive(Debug, Clone, Default)]
pub struct Frontier {
    queue: VecDeque<String>,
    members: HashSet<String>,
}

impl Frontier {
    /// Creates an empty frontier
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a URL at the back unless it is already queued
    ///
    /// Returns true if the URL was added.
    pub fn push_back(&mut self, url: String) -> bool {
        if self.members.contains(&url) {
            return false;
        }
        self.members.insert(url.clone());
        self.queue.push_back(url);
        true
    }

    /// Inserts a URL at the front unless it is already queued
    ///
    /// Returns true if the URL was added.
    pub fn push_front(&mut self, url: String) -> bool {
        if self.members.contains(&url) {
            return false;
        }
        self.members.insert(url.clone());
        self.queue.push_front(url);
        true
    }

    /// Removes and returns the oldest URL
    pub fn pop_front(&mut self) -> Option<String> {
        let url = self.queue.pop_front()?;
        self.members.remove(&url);
        Some(url)
    }

    /// Returns whether the URL is currently queued
    pub fn contains(&self, url: &str) -> bool {
        self.members.contains(url)
    }

    /// Returns the number of queued URLs
    pub fn len(&self) -> usize {
        self.queue.len()
    }

    /// Returns whether the frontier is empty
    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    /// Iterates queued URLs in dequeue order
    pub fn iter(&self) -> impl Iterator<Item = &String> {
        self.queue.iter()
    }

    /// Drops every queued URL
    pub fn clear(&mut self) {
        self.queue.clear();
        self.members.clear();
    }

    /// Keeps only the URLs matching the predicate, preserving order
    pub fn retain<F>(&mut self, mut keep: F)
    where
        F: FnMut(&str) -> bool,
    {
        let members = &mut self.members;
        self.queue.retain(|url| {
            let kept = keep(url);
            if !kept {
                members.remove(url);
            }
            kept
        });
    }
}

impl FromIterator<String> for Frontier {
    fn from_iter<I: IntoIterator<Item = String>>(iter: I) -> Self {
        let mut frontier = Frontier::new();
        for url in iter {
            frontier.push_back(url);
        }
        frontier
    }
}
