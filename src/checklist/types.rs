use serde::{Deserialize, Deserializer, Serialize};

use crate::mapping::{ColumnMap, FieldSpec, RowRecord};
use crate::store::{index::lenient_string, ColumnSpan, Row, TableRow};

/// Activities use A:D plus one marker column per person.
pub const ACTIVITY_SPAN: ColumnSpan = ColumnSpan::new(1, 26);
pub const LOG_SPAN: ColumnSpan = ColumnSpan::new(1, 5);

pub const ACTIVITY_FIELDS: &[FieldSpec] = &[
    FieldSpec::new("id", "ID", &["id"], Some(0)),
    FieldSpec::new("description", "Actividad", &["actividad", "descripcion"], Some(1)),
    FieldSpec::new("block", "Bloque", &["bloque"], Some(2)),
    FieldSpec::new("frequency", "Frecuencia", &["frecuencia"], Some(3)),
];

pub const LOG_FIELDS: &[FieldSpec] = &[
    FieldSpec::new("dateId", "Fecha", &["fecha", "date"], Some(0)),
    FieldSpec::new("email", "Email", &["email"], Some(1)),
    FieldSpec::new("activityId", "Actividad ID", &["actividad id", "actividad"], Some(2)),
    FieldSpec::new("isPlanned", "Planeada", &["planeada", "planned"], Some(3)),
    FieldSpec::new("isCompleted", "Completada", &["completada", "completed"], Some(4)),
];

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChecklistActivity {
    pub id: String,
    pub description: String,
    pub block: String,
    pub frequency: String,
}

impl RowRecord for ChecklistActivity {
    const FIELDS: &'static [FieldSpec] = ACTIVITY_FIELDS;

    fn from_row(map: &ColumnMap, row: &TableRow) -> Self {
        Self {
            id: map.read(row, "id").to_string(),
            description: map.read(row, "description").to_string(),
            block: map.read(row, "block").to_string(),
            frequency: map.read(row, "frequency").to_string(),
        }
    }

    fn write_into(&self, map: &ColumnMap, cells: &mut Row) {
        map.write(cells, "id", &self.id);
        map.write(cells, "description", &self.description);
        map.write(cells, "block", &self.block);
        map.write(cells, "frequency", &self.frequency);
    }

    fn record_id(&self) -> Option<&str> {
        Some(&self.id)
    }
}

pub fn format_flag(value: bool) -> &'static str {
    if value {
        "TRUE"
    } else {
        "FALSE"
    }
}

pub fn parse_flag(raw: &str) -> bool {
    raw.trim().eq_ignore_ascii_case("true")
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChecklistLogEntry {
    pub date_id: String,
    pub email: String,
    pub activity_id: String,
    pub is_planned: bool,
    pub is_completed: bool,
}

impl RowRecord for ChecklistLogEntry {
    const FIELDS: &'static [FieldSpec] = LOG_FIELDS;

    fn from_row(map: &ColumnMap, row: &TableRow) -> Self {
        Self {
            date_id: map.read(row, "dateId").trim().to_string(),
            email: map.read(row, "email").trim().to_string(),
            activity_id: map.read(row, "activityId").trim().to_string(),
            is_planned: parse_flag(map.read(row, "isPlanned")),
            is_completed: parse_flag(map.read(row, "isCompleted")),
        }
    }

    fn write_into(&self, map: &ColumnMap, cells: &mut Row) {
        map.write(cells, "dateId", &self.date_id);
        map.write(cells, "email", &self.email);
        map.write(cells, "activityId", &self.activity_id);
        map.write(cells, "isPlanned", format_flag(self.is_planned));
        map.write(cells, "isCompleted", format_flag(self.is_completed));
    }
}

/// An assigned activity merged with the caller's progress for the day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChecklistItem {
    #[serde(flatten)]
    pub activity: ChecklistActivity,
    pub is_planned: bool,
    pub is_completed: bool,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChecklistQuery {
    pub email: Option<String>,
    pub date_id: Option<String>,
}

/// Accepts `true`, `"TRUE"` or `"true"`; anything else is false.
fn lenient_flag<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::Bool(b) => b,
        serde_json::Value::String(s) => parse_flag(&s),
        _ => false,
    })
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressItem {
    #[serde(default, deserialize_with = "lenient_string")]
    pub activity_id: Option<String>,
    #[serde(default, deserialize_with = "lenient_flag")]
    pub is_planned: bool,
    #[serde(default, deserialize_with = "lenient_flag")]
    pub is_completed: bool,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveChecklistRequest {
    pub email: String,
    pub date_id: String,
    #[serde(default)]
    pub progress: Vec<ProgressItem>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mapping::ColumnLayout;

    #[test]
    fn test_log_entry_flags() {
        let map = ColumnMap::resolve("ChecklistLog", LOG_FIELDS, ColumnLayout::LegacyFixedOffset, &[], 5);
        let row = TableRow {
            number: 2,
            cells: ["2024-05-15", "ana@x.com", "A1", "true", "FALSE"]
                .iter()
                .map(|c| c.to_string())
                .collect(),
        };
        let entry = ChecklistLogEntry::from_row(&map, &row);
        assert!(entry.is_planned);
        assert!(!entry.is_completed);
        assert_eq!(entry.to_row(&map)[3], "TRUE");
    }

    #[test]
    fn test_progress_item_accepts_strings_and_numbers() {
        let req: SaveChecklistRequest = serde_json::from_str(
            r#"{"email":"a@x.com","dateId":"2024-05-15","progress":[
                {"activityId":7,"isPlanned":"TRUE","isCompleted":false},
                {"activityId":"A2","isPlanned":true}
            ]}"#,
        )
        .unwrap();
        assert_eq!(req.progress[0].activity_id.as_deref(), Some("7"));
        assert!(req.progress[0].is_planned);
        assert!(req.progress[1].is_planned);
        assert!(!req.progress[1].is_completed);
    }
}
