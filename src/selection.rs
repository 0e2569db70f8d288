//! Shared entity selection
//!
//! One optional selected entity id, shared by the graph, the entity list and
//! the timeline. Changes are broadcast synchronously to subscribed
//! listeners, each registered under a [`ListenerId`] that its owner uses to
//! unsubscribe.

use std::fmt;

use tracing::debug;

use crate::config::SelectionConfig;
use crate::model::Node;
use crate::records::{EntityRecord, TimelineEvent};

/// Notification delivered to selection listeners
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SelectionNotice<'a> {
    /// The selected entity changed; `None` means cleared
    Changed(Option<&'a str>),
    /// A timeline or swimlane event was clicked
    EventClicked(&'a str),
}

/// Handle returned by [`SelectionCoordinator::subscribe`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

type Listener = Box<dyn FnMut(SelectionNotice<'_>)>;

/// Single selected entity plus its listeners
pub struct SelectionCoordinator {
    selected: Option<String>,
    listeners: Vec<(ListenerId, Listener)>,
    next_listener: u64,
    dimmed_opacity: f64,
}

impl Default for SelectionCoordinator {
    fn default() -> Self {
        Self::new(&SelectionConfig::default())
    }
}

impl fmt::Debug for SelectionCoordinator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SelectionCoordinator")
            .field("selected", &self.selected)
            .field("listeners", &self.listeners.len())
            .field("dimmed_opacity", &self.dimmed_opacity)
            .finish()
    }
}

impl SelectionCoordinator {
    pub fn new(config: &SelectionConfig) -> Self {
        Self {
            selected: None,
            listeners: Vec::new(),
            next_listener: 0,
            dimmed_opacity: config.dimmed_opacity,
        }
    }

    pub fn selected(&self) -> Option<&str> {
        self.selected.as_deref()
    }

    pub fn is_selected(&self, id: &str) -> bool {
        self.selected.as_deref() == Some(id)
    }

    /// Select `id`, or clear the selection if `id` is already selected
    pub fn select(&mut self, id: &str) {
        if self.is_selected(id) {
            debug!(entity = id, "selection toggled off");
            self.selected = None;
        } else {
            debug!(entity = id, "entity selected");
            self.selected = Some(id.to_string());
        }
        self.broadcast_selection();
    }

    pub fn clear(&mut self) {
        if self.selected.take().is_some() {
            debug!("selection cleared");
        }
        self.broadcast_selection();
    }

    /// Drop the selection when the graph is replaced
    ///
    /// Listeners hear about it only if something was selected.
    pub fn reset(&mut self) {
        if self.selected.take().is_some() {
            debug!("selection reset for new graph");
            self.broadcast_selection();
        }
    }

    /// Forward an event click to every listener
    pub fn event_clicked(&mut self, event_id: &str) {
        for (_, listener) in &mut self.listeners {
            listener(SelectionNotice::EventClicked(event_id));
        }
    }

    pub fn subscribe<F>(&mut self, listener: F) -> ListenerId
    where
        F: FnMut(SelectionNotice<'_>) + 'static,
    {
        let id = ListenerId(self.next_listener);
        self.next_listener += 1;
        self.listeners.push((id, Box::new(listener)));
        id
    }

    /// Remove a listener; returns false if the handle was not registered
    pub fn unsubscribe(&mut self, id: ListenerId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(listener, _)| *listener != id);
        self.listeners.len() != before
    }

    /// Opacity for a node: full when nothing or this node is selected
    ///
    /// Unselected nodes are dimmed, never hidden.
    pub fn node_opacity(&self, id: &str) -> f64 {
        match self.selected.as_deref() {
            Some(selected) if selected != id => self.dimmed_opacity,
            _ => 1.0,
        }
    }

    fn broadcast_selection(&mut self) {
        let selected = self.selected.as_deref();
        for (_, listener) in &mut self.listeners {
            listener(SelectionNotice::Changed(selected));
        }
    }
}

/// Identity of an entity for matching against timeline events
#[derive(Debug, Clone, PartialEq)]
pub struct EntityMatcher {
    pub id: String,
    /// Lowercased display name followed by lowercased aliases
    names: Vec<String>,
}

impl EntityMatcher {
    pub fn new(id: &str, name: &str, aliases: &[String]) -> Self {
        let names = std::iter::once(name)
            .chain(aliases.iter().map(String::as_str))
            .map(|s| s.trim().to_lowercase())
            .filter(|s| !s.is_empty())
            .collect();
        Self {
            id: id.to_string(),
            names,
        }
    }

    pub fn from_node(node: &Node) -> Self {
        Self::new(&node.id, &node.display_name, &node.aliases)
    }

    pub fn from_record(record: &EntityRecord) -> Self {
        Self::new(&record.id, &record.name, &record.aliases)
    }

    /// Whether `event` belongs to this entity
    ///
    /// Explicit associations decide when the event has any. Otherwise the
    /// name or an alias must appear, ignoring case, in the title or
    /// description.
    pub fn matches(&self, event: &TimelineEvent) -> bool {
        if !event.entities.is_empty() {
            return event.entities.iter().any(|e| e.id == self.id);
        }

        let mut haystack = event.title.to_lowercase();
        if let Some(description) = &event.description {
            haystack.push('\n');
            haystack.push_str(&description.to_lowercase());
        }
        self.names.iter().any(|name| haystack.contains(name))
    }
}

/// Events shown for the selected entity, in input order
pub fn filter_timeline_events<'a>(
    events: &'a [TimelineEvent],
    entity: &EntityMatcher,
) -> Vec<&'a TimelineEvent> {
    events.iter().filter(|event| entity.matches(event)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::records::TimelineEntity;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn event(id: &str, title: &str, description: Option<&str>, entities: &[&str]) -> TimelineEvent {
        TimelineEvent {
            id: id.to_string(),
            title: title.to_string(),
            description: description.map(str::to_string),
            date_text: None,
            entities: entities
                .iter()
                .map(|id| TimelineEntity {
                    id: id.to_string(),
                    ..TimelineEntity::default()
                })
                .collect(),
        }
    }

    #[test]
    fn selecting_twice_toggles_off() {
        let mut selection = SelectionCoordinator::default();
        selection.select("x");
        assert_eq!(selection.selected(), Some("x"));
        selection.select("x");
        assert_eq!(selection.selected(), None);
    }

    #[test]
    fn selecting_another_replaces() {
        let mut selection = SelectionCoordinator::default();
        selection.select("x");
        selection.select("y");
        assert_eq!(selection.selected(), Some("y"));
        selection.clear();
        assert_eq!(selection.selected(), None);
    }

    #[test]
    fn listeners_receive_changes_until_unsubscribed() {
        let seen: Rc<RefCell<Vec<Option<String>>>> = Rc::default();
        let mut selection = SelectionCoordinator::default();

        let sink = Rc::clone(&seen);
        let handle = selection.subscribe(move |notice| {
            if let SelectionNotice::Changed(id) = notice {
                sink.borrow_mut().push(id.map(str::to_string));
            }
        });

        selection.select("x");
        selection.select("x");
        assert!(selection.unsubscribe(handle));
        selection.select("y");

        assert_eq!(*seen.borrow(), vec![Some("x".to_string()), None]);
        assert!(!selection.unsubscribe(handle));
    }

    #[test]
    fn reset_notifies_only_when_something_was_selected() {
        let seen: Rc<RefCell<Vec<Option<String>>>> = Rc::default();
        let mut selection = SelectionCoordinator::default();
        let sink = Rc::clone(&seen);
        selection.subscribe(move |notice| {
            if let SelectionNotice::Changed(id) = notice {
                sink.borrow_mut().push(id.map(str::to_string));
            }
        });

        selection.reset();
        selection.select("x");
        selection.reset();

        assert_eq!(*seen.borrow(), vec![Some("x".to_string()), None]);
        assert_eq!(selection.selected(), None);
    }

    #[test]
    fn event_clicks_are_forwarded() {
        let clicked: Rc<RefCell<Vec<String>>> = Rc::default();
        let mut selection = SelectionCoordinator::default();
        let sink = Rc::clone(&clicked);
        selection.subscribe(move |notice| {
            if let SelectionNotice::EventClicked(id) = notice {
                sink.borrow_mut().push(id.to_string());
            }
        });

        selection.event_clicked("ev-1");
        assert_eq!(*clicked.borrow(), vec!["ev-1"]);
        assert_eq!(selection.selected(), None);
    }

    #[test]
    fn unselected_nodes_are_dimmed_not_hidden() {
        let mut selection = SelectionCoordinator::new(&SelectionConfig::default());
        assert_eq!(selection.node_opacity("a"), 1.0);

        selection.select("a");
        assert_eq!(selection.node_opacity("a"), 1.0);
        assert_eq!(selection.node_opacity("b"), 0.35);
        assert!(selection.node_opacity("b") > 0.0);
    }

    #[test]
    fn alias_matches_events_without_explicit_entities() {
        let x = EntityMatcher::new("x", "Robert", &["Bob".to_string()]);
        let y = EntityMatcher::new("y", "Yvonne", &[]);
        let events = vec![event("trip", "Travel", Some("Planning bob's trip"), &[])];

        assert_eq!(filter_timeline_events(&events, &x).len(), 1);
        assert!(filter_timeline_events(&events, &y).is_empty());
    }

    #[test]
    fn explicit_entities_disable_text_fallback() {
        let x = EntityMatcher::new("x", "Bob", &[]);
        let events = vec![
            event("e1", "Bob arrives", None, &["y"]),
            event("e2", "Quiet day", None, &["x"]),
        ];

        let ids: Vec<&str> = filter_timeline_events(&events, &x)
            .iter()
            .map(|e| e.id.as_str())
            .collect();
        assert_eq!(ids, vec!["e2"]);
    }

    #[test]
    fn blank_aliases_never_match_everything() {
        let x = EntityMatcher::new("x", "Bob", &["  ".to_string()]);
        let events = vec![event("e", "Storm", Some("A storm"), &[])];
        assert!(filter_timeline_events(&events, &x).is_empty());
    }

    #[test]
    fn matcher_from_record_uses_aliases() {
        let record = EntityRecord {
            id: "n".to_string(),
            name: "Natasha Rostova".to_string(),
            aliases: vec!["Natalya".to_string()],
            ..EntityRecord::default()
        };
        let matcher = EntityMatcher::from_record(&record);
        assert!(matcher.matches(&event("ball", "NATALYA at the ball", None, &[])));
    }
}
