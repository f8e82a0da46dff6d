//! Next-instance expansion for recurring tasks.
//!
//! Expansion is a collaborator on top of the store, not part of it: when a
//! recurring task is completed, the caller asks the expander for the next
//! instance and creates it as a fresh task. Simple kinds advance the due
//! date directly; `custom` evaluates an RFC 5545 RRULE.

use crate::error::CoreError;
use crate::models::{NewTaskData, Recurrence, Task};
use chrono::{Months, NaiveDateTime, TimeZone};
use rrule::{RRuleSet, Tz as RRuleTz};

#[derive(Debug, Default)]
pub struct RecurrenceExpander;

impl RecurrenceExpander {
    pub fn new() -> Self {
        Self
    }

    /// Validate a custom RRULE string without anchoring it to a task.
    pub fn validate_rule(rule: &str) -> Result<(), CoreError> {
        let rrule_string = if rule.contains("DTSTART") {
            rule.to_string()
        } else {
            format!("DTSTART:19700101T000000Z\nRRULE:{rule}")
        };
        rrule_string
            .parse::<RRuleSet>()
            .map(|_| ())
            .map_err(|e| CoreError::InvalidRecurrence(e.to_string()))
    }

    /// The template for the follow-up task a completion should create, or
    /// `None` for non-recurring tasks and exhausted rules.
    pub fn next_instance(&self, task: &Task) -> Result<Option<NewTaskData>, CoreError> {
        let Some(anchor) = task.due_date.or(task.completed_at) else {
            return Ok(None);
        };

        let Some(next_due) = self.next_due(task, anchor)? else {
            return Ok(None);
        };

        // keep the reminder the same distance ahead of the due date
        let reminder_at = task
            .reminder_at
            .zip(task.due_date)
            .map(|(reminder, due)| next_due - (due - reminder));

        Ok(Some(NewTaskData {
            title: task.title.clone(),
            description: task.description.clone(),
            priority: Some(task.priority),
            due_date: Some(next_due),
            reminder_at,
            recurrence: Some(task.recurrence),
            recurrence_rule: task.recurrence_rule.clone(),
            tags: task.tags.clone(),
            context: task.context.clone(),
            parent_id: task.parent_id,
            source: Some(task.source.clone()),
            external_id: task.external_id.clone(),
        }))
    }

    fn next_due(
        &self,
        task: &Task,
        anchor: NaiveDateTime,
    ) -> Result<Option<NaiveDateTime>, CoreError> {
        match task.recurrence {
            Recurrence::None => Ok(None),
            Recurrence::Daily => Ok(Some(anchor + chrono::Duration::days(1))),
            Recurrence::Weekly => Ok(Some(anchor + chrono::Duration::days(7))),
            Recurrence::Monthly => Ok(anchor.checked_add_months(Months::new(1))),
            Recurrence::Custom => self.next_from_rule(task, anchor),
        }
    }

    fn next_from_rule(
        &self,
        task: &Task,
        anchor: NaiveDateTime,
    ) -> Result<Option<NaiveDateTime>, CoreError> {
        let rule = task.recurrence_rule.as_deref().ok_or_else(|| {
            CoreError::InvalidRecurrence("custom recurrence requires a rule".into())
        })?;

        let rrule_string = if rule.contains("DTSTART") {
            rule.to_string()
        } else {
            format!(
                "DTSTART:{}\nRRULE:{}",
                anchor.format("%Y%m%dT%H%M%SZ"),
                rule
            )
        };
        let set: RRuleSet = rrule_string
            .parse()
            .map_err(|e: rrule::RRuleError| CoreError::InvalidRecurrence(e.to_string()))?;

        // the local-naive domain maps onto the rule engine's UTC
        let after = RRuleTz::UTC.from_utc_datetime(&anchor);
        let (dates, _) = set.after(after).all(4);
        Ok(dates
            .into_iter()
            .map(|d| d.naive_utc())
            .find(|d| *d > anchor))
    }
}
