/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

//! In-memory [`ViewTree`] used by the CLI and by tests.

use std::collections::BTreeMap;

use super::{FragmentId, PageMarkup, ViewTree};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeadlessFragment {
    pub slot: usize,
    pub url: String,
    pub page: PageMarkup,
    pub visible: bool,
}

#[derive(Debug, Default)]
pub struct HeadlessViewTree {
    container_present: bool,
    fragments: BTreeMap<FragmentId, HeadlessFragment>,
    next_fragment: u64,
    mount_count: usize,
}

impl HeadlessViewTree {
    /// A tree whose container is already rendered.
    pub fn new() -> Self {
        Self {
            container_present: true,
            ..Self::default()
        }
    }

    /// A tree whose container has not been rendered yet.
    pub fn without_container() -> Self {
        Self::default()
    }

    pub fn attach_container(&mut self) {
        self.container_present = true;
    }

    pub fn detach_container(&mut self) {
        self.container_present = false;
        self.fragments.clear();
    }

    pub fn fragment(&self, id: FragmentId) -> Option<&HeadlessFragment> {
        self.fragments.get(&id)
    }

    pub fn fragments(&self) -> impl Iterator<Item = (FragmentId, &HeadlessFragment)> {
        self.fragments.iter().map(|(id, fragment)| (*id, fragment))
    }

    pub fn fragment_count(&self) -> usize {
        self.fragments.len()
    }

    pub fn visible_fragments(&self) -> Vec<FragmentId> {
        self.fragments
            .iter()
            .filter(|(_, fragment)| fragment.visible)
            .map(|(id, _)| *id)
            .collect()
    }

    pub fn fragments_for_url(&self, url: &str) -> usize {
        self.fragments.values().filter(|f| f.url == url).count()
    }

    /// Total number of mounts since creation; restores do not add to it.
    pub fn mount_count(&self) -> usize {
        self.mount_count
    }
}

impl ViewTree for HeadlessViewTree {
    fn has_container(&self) -> bool {
        self.container_present
    }

    fn mount(&mut self, slot: usize, url: &str, page: &PageMarkup) -> FragmentId {
        self.next_fragment += 1;
        self.mount_count += 1;
        let id = FragmentId::from_raw(self.next_fragment);
        self.fragments.insert(
            id,
            HeadlessFragment {
                slot,
                url: url.to_string(),
                page: page.clone(),
                visible: false,
            },
        );
        id
    }

    fn show(&mut self, fragment: FragmentId) {
        if let Some(entry) = self.fragments.get_mut(&fragment) {
            entry.visible = true;
        }
    }

    fn hide(&mut self, fragment: FragmentId) {
        if let Some(entry) = self.fragments.get_mut(&fragment) {
            entry.visible = false;
        }
    }

    fn destroy(&mut self, fragment: FragmentId) {
        self.fragments.remove(&fragment);
    }

    fn clear(&mut self) {
        self.fragments.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mounted_fragments_start_hidden_and_toggle() {
        let mut tree = HeadlessViewTree::new();
        let page = PageMarkup::parse("<div></div>");
        let id = tree.mount(0, "/home.html", &page);

        assert_eq!(tree.fragment(id).map(|f| f.visible), Some(false));
        tree.show(id);
        assert_eq!(tree.visible_fragments(), vec![id]);
        tree.hide(id);
        assert!(tree.visible_fragments().is_empty());
    }

    #[test]
    fn destroy_and_clear_release_fragments() {
        let mut tree = HeadlessViewTree::new();
        let page = PageMarkup::default();
        let a = tree.mount(0, "/a", &page);
        let _b = tree.mount(1, "/b", &page);

        tree.destroy(a);
        assert_eq!(tree.fragment_count(), 1);
        tree.clear();
        assert_eq!(tree.fragment_count(), 0);
        assert_eq!(tree.mount_count(), 2);
    }

    #[test]
    fn container_presence_is_explicit() {
        let mut tree = HeadlessViewTree::without_container();
        assert!(!tree.has_container());
        tree.attach_container();
        assert!(tree.has_container());
    }
}
