// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! DOI Lifecycle Transition Table
//!
//! The external lifecycle state of an object is never stored. It is derived
//! from the incoming event, the object's `draft` flag and whether a DOI has
//! been stored yet. The mapping is kept as data so it can be inspected and
//! tested apart from the synchronizer's control flow.
//!
//! | Event | Draft | DOI | Outcome |
//! |-------|-------|-----|---------|
//! | object-published | false | any | publish |
//! | object-published | true | any | reject |
//! | object-unpublished | any | any | register |
//! | object-created | true | absent | register |
//! | object-created | any | any | no action |
//! | metadata-updated, command-doi-sync | any | present | update |
//! | metadata-updated, command-doi-sync | any | absent | register |
//!
//! Rules are evaluated top to bottom and the first match wins. Anything the
//! table does not cover is "no action".

use crate::domain::events::EventName;
use crate::domain::object::ObjectFields;
use std::fmt;

/// Action requested from the registrar
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DoiAction {
    /// Make the DOI findable
    Publish,
    /// Reserve (or downgrade to) a non-public DOI
    Register,
    /// Refresh metadata without a lifecycle change
    Update,
}

impl DoiAction {
    /// Registrar `event` attribute; `None` leaves the lifecycle state untouched
    pub fn event_tag(&self) -> Option<&'static str> {
        match self {
            DoiAction::Publish => Some("publish"),
            DoiAction::Register => Some("register"),
            DoiAction::Update => None,
        }
    }
}

impl fmt::Display for DoiAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DoiAction::Publish => f.write_str("publish"),
            DoiAction::Register => f.write_str("register"),
            DoiAction::Update => f.write_str("update"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DraftCondition {
    Any,
    Draft,
    Final,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DoiCondition {
    Any,
    Present,
    Absent,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RuleOutcome {
    Act(DoiAction),
    /// Illegal state for this event; logged and dropped
    Reject(String),
    NoAction,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransitionRule {
    pub event: EventName,
    pub draft: DraftCondition,
    pub doi: DoiCondition,
    pub outcome: RuleOutcome,
}

impl TransitionRule {
    pub fn new(event: EventName, draft: DraftCondition, doi: DoiCondition, outcome: RuleOutcome) -> Self {
        Self { event, draft, doi, outcome }
    }

    fn matches(&self, event: &EventName, state: &DoiState) -> bool {
        let draft_ok = match self.draft {
            DraftCondition::Any => true,
            DraftCondition::Draft => state.draft == Some(true),
            DraftCondition::Final => state.draft == Some(false),
        };
        let doi_ok = match self.doi {
            DoiCondition::Any => true,
            DoiCondition::Present => state.has_doi,
            DoiCondition::Absent => !state.has_doi,
        };
        &self.event == event && draft_ok && doi_ok
    }
}

/// The slice of object state the lifecycle depends on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DoiState {
    pub draft: Option<bool>,
    pub has_doi: bool,
}

impl DoiState {
    pub fn from_fields(fields: &ObjectFields) -> Self {
        Self {
            draft: fields.draft(),
            has_doi: fields.doi().is_some(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct DoiLifecycle {
    rules: Vec<TransitionRule>,
}

impl DoiLifecycle {
    pub fn new(rules: Vec<TransitionRule>) -> Self {
        Self { rules }
    }

    /// The transition table used in production
    pub fn standard() -> Self {
        use DoiCondition as Doi;
        use DraftCondition as Draft;
        use EventName as Ev;
        use RuleOutcome::*;

        let mut rules = vec![
            TransitionRule::new(Ev::ObjectPublished, Draft::Final, Doi::Any, Act(DoiAction::Publish)),
            TransitionRule::new(
                Ev::ObjectPublished,
                Draft::Draft,
                Doi::Any,
                Reject("publish event received for a draft object".to_string()),
            ),
            TransitionRule::new(Ev::ObjectUnpublished, Draft::Any, Doi::Any, Act(DoiAction::Register)),
            TransitionRule::new(Ev::ObjectCreated, Draft::Draft, Doi::Absent, Act(DoiAction::Register)),
            TransitionRule::new(Ev::ObjectCreated, Draft::Any, Doi::Any, NoAction),
        ];
        for event in [Ev::MetadataUpdated, Ev::CommandDoiSync] {
            rules.push(TransitionRule::new(event.clone(), Draft::Any, Doi::Present, Act(DoiAction::Update)));
            rules.push(TransitionRule::new(event, Draft::Any, Doi::Absent, Act(DoiAction::Register)));
        }
        Self::new(rules)
    }

    pub fn decide(&self, event: &EventName, state: &DoiState) -> RuleOutcome {
        self.rules
            .iter()
            .find(|rule| rule.matches(event, state))
            .map(|rule| rule.outcome.clone())
            .unwrap_or(RuleOutcome::NoAction)
    }

    /// True when at least one rule mentions `event`
    pub fn handles(&self, event: &EventName) -> bool {
        self.rules.iter().any(|rule| &rule.event == event)
    }

    pub fn rules(&self) -> &[TransitionRule] {
        &self.rules
    }
}

impl Default for DoiLifecycle {
    fn default() -> Self {
        Self::standard()
    }
}
