use serde::{Deserialize, Deserializer, Serialize};

use crate::mapping::{ColumnMap, FieldSpec, RowRecord};
use crate::store::{ColumnSpan, Row, TableRow};

pub const AGENDA_SPAN: ColumnSpan = ColumnSpan::new(1, 5);

pub const AGENDA_FIELDS: &[FieldSpec] = &[
    FieldSpec::new("date", "Fecha", &["fecha"], Some(0)),
    FieldSpec::new("moderator", "Moderador", &["moderador"], Some(1)),
    FieldSpec::new("topics", "Temas", &["temas"], Some(2)),
    FieldSpec::new("attendees", "Asistentes", &["asistentes"], Some(3)),
    FieldSpec::new("conclusions", "Conclusiones", &["conclusiones"], Some(4)),
];

/// Meeting notes for one day, keyed by date.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgendaEntry {
    pub date: String,
    #[serde(default)]
    pub moderator: String,
    #[serde(default)]
    pub topics: String,
    #[serde(default, deserialize_with = "attendee_list")]
    pub attendees: String,
    #[serde(default)]
    pub conclusions: String,
}

impl RowRecord for AgendaEntry {
    const FIELDS: &'static [FieldSpec] = AGENDA_FIELDS;

    fn from_row(map: &ColumnMap, row: &TableRow) -> Self {
        Self {
            date: map.read(row, "date").trim().to_string(),
            moderator: map.read(row, "moderator").to_string(),
            topics: map.read(row, "topics").to_string(),
            attendees: map.read(row, "attendees").to_string(),
            conclusions: map.read(row, "conclusions").to_string(),
        }
    }

    fn write_into(&self, map: &ColumnMap, cells: &mut Row) {
        map.write(cells, "date", &self.date);
        map.write(cells, "moderator", &self.moderator);
        map.write(cells, "topics", &self.topics);
        map.write(cells, "attendees", &self.attendees);
        map.write(cells, "conclusions", &self.conclusions);
    }
}

/// Attendees arrive either as a list or as one comma-joined string.
fn attendee_list<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Attendees {
        List(Vec<String>),
        Joined(String),
        Nothing(()),
    }

    Ok(match Attendees::deserialize(deserializer)? {
        Attendees::List(names) => names
            .iter()
            .map(|n| n.trim())
            .filter(|n| !n.is_empty())
            .collect::<Vec<_>>()
            .join(", "),
        Attendees::Joined(joined) => joined,
        Attendees::Nothing(()) => String::new(),
    })
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AgendaQuery {
    pub date: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_attendees_list_or_string() {
        let entry: AgendaEntry = serde_json::from_str(
            r#"{"date":"2024-05-15","attendees":["ana@x.com"," bob@x.com ",""]}"#,
        )
        .unwrap();
        assert_eq!(entry.attendees, "ana@x.com, bob@x.com");
        assert_eq!(entry.moderator, "");

        let entry: AgendaEntry =
            serde_json::from_str(r#"{"date":"2024-05-15","attendees":"ana, bob"}"#).unwrap();
        assert_eq!(entry.attendees, "ana, bob");

        let entry: AgendaEntry =
            serde_json::from_str(r#"{"date":"2024-05-15","attendees":null}"#).unwrap();
        assert_eq!(entry.attendees, "");
    }
}
