//! Calendar invitation (RFC 5545) attached to assignment mails.

use icalendar::{Calendar, Component, Event as IcalEvent, EventLike, Property};

use super::{AssignmentNotice, NotifyError};
use crate::progress::dates::parse_sheet_date;

pub const ATTACHMENT_NAME: &str = "invitacion.ics";

/// All-day event on the notice's due date.
pub fn assignment_event(notice: &AssignmentNotice) -> Result<IcalEvent, NotifyError> {
    let date = parse_sheet_date(&notice.due_date)
        .ok_or_else(|| NotifyError::Calendar(format!("Invalid due date: {}", notice.due_date)))?;

    let mut event = IcalEvent::new();
    event.summary(&format!("Tarea: {}", notice.description));
    event.all_day(date);
    event.description(&format!(
        "Proyecto: {}\nÁrea: {}\nAsignado por: {}",
        notice.project, notice.area, notice.assigned_by
    ));
    event.add_property("ATTENDEE", &format!("mailto:{}", notice.assigned_to));
    Ok(event.done())
}

pub fn assignment_invite(notice: &AssignmentNotice) -> Result<String, NotifyError> {
    let mut calendar = Calendar::new();
    calendar.name("Tablero");
    calendar.append_property(Property::new("PRODID", "-//Tablero//Asignaciones//ES"));
    calendar.push(assignment_event(notice)?);
    Ok(calendar.done().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn notice(due: &str) -> AssignmentNotice {
        AssignmentNotice {
            description: "Draft report".into(),
            due_date: due.into(),
            assigned_to: "alice@x.com".into(),
            assigned_by: "bob@x.com".into(),
            area: "Ops".into(),
            project: "Alpha".into(),
        }
    }

    #[test]
    fn test_invite_is_all_day_on_due_date() {
        let ics = assignment_invite(&notice("01/05/2024")).unwrap();
        assert!(ics.contains("BEGIN:VCALENDAR"));
        assert!(ics.contains("SUMMARY:Tarea: Draft report"));
        assert!(ics.contains("DTSTART;VALUE=DATE:20240501"));
    }

    #[test]
    fn test_invalid_due_date_is_rejected() {
        assert!(matches!(
            assignment_invite(&notice("pronto")),
            Err(NotifyError::Calendar(_))
        ));
    }
}
