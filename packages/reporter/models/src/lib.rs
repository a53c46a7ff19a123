#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Records scraped from the Judge Center investigations panel.
//!
//! An [`Investigation`] owns its [`Witness`] and [`Statement`] lists. The
//! association between a witness and the statement they gave is a pair of
//! optional indices into those lists, so neither side owns the other.
//! [`InvestigationSet`] is the ordered result of one scrape run together with
//! the display name of the user who was logged in.

use std::ops::Index;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Value stored in a numeric field when the page text held no number.
pub const UNKNOWN_NUMBER: i64 = -1;

/// A single investigation report as shown on the list `select` tab and the
/// investigation `view` tab.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Investigation {
    /// Investigation identifier.
    pub id: i64,
    /// When the incident happened.
    pub incident_date: Option<NaiveDate>,
    /// When the investigation was entered.
    pub entered_date: Option<NaiveDate>,
    /// Sanctioning number of the event.
    pub sanctioning_number: String,
    /// Name of the user who entered the investigation.
    pub entered_by: String,
    /// DCI number of the user who entered the investigation.
    pub entered_by_dci_number: i64,
    /// Name of the person under investigation.
    pub subject: String,
    /// DCI number of the person under investigation.
    pub subject_dci_number: i64,
    /// Role of the subject at the event.
    pub subject_role: String,
    /// Rules enforcement level of the event.
    pub event_rel: String,
    /// Type of the event.
    pub event_type: String,
    /// City where the event took place.
    pub city: String,
    /// Country where the event took place.
    pub country: String,
    /// Investigation status.
    pub status: String,
    /// Investigation resolution.
    pub resolution: String,
    /// Infraction labels in the order first seen, without duplicates.
    pub infractions: Vec<String>,
    /// Witnesses in page order.
    pub witnesses: Vec<Witness>,
    /// Witness statements in page order.
    pub statements: Vec<Statement>,
}

impl Default for Investigation {
    fn default() -> Self {
        Self {
            id: UNKNOWN_NUMBER,
            incident_date: None,
            entered_date: None,
            sanctioning_number: String::new(),
            entered_by: String::new(),
            entered_by_dci_number: UNKNOWN_NUMBER,
            subject: String::new(),
            subject_dci_number: UNKNOWN_NUMBER,
            subject_role: String::new(),
            event_rel: String::new(),
            event_type: String::new(),
            city: String::new(),
            country: String::new(),
            status: String::new(),
            resolution: String::new(),
            infractions: Vec::new(),
            witnesses: Vec::new(),
            statements: Vec::new(),
        }
    }
}

impl Investigation {
    /// Adds an infraction label unless it is already present.
    ///
    /// Returns `true` when the label was new.
    pub fn add_infraction(&mut self, label: impl Into<String>) -> bool {
        let label = label.into();
        if self.infractions.contains(&label) {
            return false;
        }
        self.infractions.push(label);
        true
    }

    /// Appends a statement and links it to the first witness whose name is
    /// exactly the statement's witness name.
    ///
    /// On a match the witness's DCI number is copied into the statement and
    /// both sides record each other's index. Returns the index of the linked
    /// witness, if any.
    pub fn add_statement(&mut self, mut statement: Statement) -> Option<usize> {
        let statement_index = self.statements.len();
        let witness_index = self
            .witnesses
            .iter()
            .position(|w| w.name == statement.witness_name);

        if let Some(index) = witness_index {
            let witness = &mut self.witnesses[index];
            statement.witness_dci_number = witness.dci_number;
            statement.witness = Some(index);
            witness.statement = Some(statement_index);
        }

        self.statements.push(statement);
        witness_index
    }

    /// Returns the statement given by `witness`, if one was matched.
    #[must_use]
    pub fn statement_of(&self, witness: &Witness) -> Option<&Statement> {
        witness.statement.and_then(|i| self.statements.get(i))
    }

    /// Returns the witness who gave `statement`, if one was matched.
    #[must_use]
    pub fn witness_of(&self, statement: &Statement) -> Option<&Witness> {
        statement.witness.and_then(|i| self.witnesses.get(i))
    }
}

/// A witness to an investigated incident.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Witness {
    /// Witness name.
    pub name: String,
    /// Witness DCI number.
    pub dci_number: i64,
    /// Role of the witness at the event.
    pub role: String,
    /// Index of this witness's statement in [`Investigation::statements`].
    pub statement: Option<usize>,
}

impl Witness {
    /// Creates a witness with no linked statement.
    #[must_use]
    pub fn new(name: impl Into<String>, dci_number: i64, role: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            dci_number,
            role: role.into(),
            statement: None,
        }
    }
}

/// A statement entered for an investigation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Statement {
    /// Witness name as printed above the statement.
    pub witness_name: String,
    /// DCI number of the witness, copied from the matched witness.
    pub witness_dci_number: i64,
    /// When the statement was entered.
    pub entered_date: Option<NaiveDate>,
    /// Name of the user who entered the statement.
    pub entered_by: String,
    /// Statement body.
    pub statement: String,
    /// Index of the matched witness in [`Investigation::witnesses`].
    pub witness: Option<usize>,
}

impl Default for Statement {
    fn default() -> Self {
        Self {
            witness_name: String::new(),
            witness_dci_number: UNKNOWN_NUMBER,
            entered_date: None,
            entered_by: String::new(),
            statement: String::new(),
            witness: None,
        }
    }
}

/// The investigations visible to one logged-in user, in list order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvestigationSet {
    name: String,
    investigations: Vec<Investigation>,
}

impl InvestigationSet {
    /// Creates a set for the user called `name`.
    #[must_use]
    pub fn new(name: impl Into<String>, investigations: Vec<Investigation>) -> Self {
        Self {
            name: name.into(),
            investigations,
        }
    }

    /// Display name of the logged-in user.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Number of investigations.
    #[must_use]
    pub fn len(&self) -> usize {
        self.investigations.len()
    }

    /// Whether the set holds no investigations.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.investigations.is_empty()
    }

    /// Returns the investigation at `index`.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&Investigation> {
        self.investigations.get(index)
    }

    /// Iterates the investigations in list order.
    pub fn iter(&self) -> std::slice::Iter<'_, Investigation> {
        self.investigations.iter()
    }

    /// Consumes the set, returning the investigations.
    #[must_use]
    pub fn into_investigations(self) -> Vec<Investigation> {
        self.investigations
    }
}

impl Index<usize> for InvestigationSet {
    type Output = Investigation;

    fn index(&self, index: usize) -> &Self::Output {
        &self.investigations[index]
    }
}

impl<'a> IntoIterator for &'a InvestigationSet {
    type Item = &'a Investigation;
    type IntoIter = std::slice::Iter<'a, Investigation>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl IntoIterator for InvestigationSet {
    type Item = Investigation;
    type IntoIter = std::vec::IntoIter<Investigation>;

    fn into_iter(self) -> Self::IntoIter {
        self.investigations.into_iter()
    }
}
