//! Types for the tasks module
use serde::{Deserialize, Serialize};

use crate::mapping::{ColumnMap, FieldSpec, RowRecord};
use crate::scope::Owned;
use crate::store::{index::lenient_string, ColumnSpan, Row, RowRef, TableRow};

pub const TASK_SPAN: ColumnSpan = ColumnSpan::new(1, 11);

pub const STATUS_PENDING: &str = "Pendiente";
pub const STATUS_DONE: &str = "Cumplida";

pub const TASK_FIELDS: &[FieldSpec] = &[
    FieldSpec::new("id", "ID", &["id"], Some(0)),
    FieldSpec::new("description", "Descripcion", &["descripcion", "description", "tarea"], Some(1)),
    FieldSpec::new("assignedTo", "Asignado A", &["asignado a", "assigned to", "email"], Some(2)),
    FieldSpec::new("startDate", "Fecha Inicio", &["fecha inicio", "inicio"], None),
    FieldSpec::new("dueDate", "Fecha Limite", &["fecha limite", "vencimiento", "due date", "limite"], Some(3)),
    FieldSpec::new("status", "Estado", &["estado", "status"], Some(4)),
    FieldSpec::new("hitoId", "Hito ID", &["hito id", "hito"], None),
    FieldSpec::new("area", "Area", &["area"], None),
    FieldSpec::new("proyecto", "Proyecto", &["proyecto", "project"], None),
    FieldSpec::new("asignadoPor", "Asignado Por", &["asignado por", "assigned by"], None),
    FieldSpec::new("rescheduledDate", "Fecha Reprogramada", &["fecha reprogramada", "reprogramada"], None),
];

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: String,
    pub description: String,
    pub assigned_to: String,
    pub start_date: String,
    pub due_date: String,
    pub status: String,
    pub hito_id: Option<String>,
    pub area: String,
    pub proyecto: String,
    pub asignado_por: String,
    pub rescheduled_date: Option<String>,
}

impl Task {
    /// The date the task is actually due: the rescheduled one when set.
    pub fn effective_due_date(&self) -> &str {
        self.rescheduled_date
            .as_deref()
            .filter(|d| !d.trim().is_empty())
            .unwrap_or(&self.due_date)
    }

    pub fn is_done(&self) -> bool {
        self.status.trim().eq_ignore_ascii_case(STATUS_DONE)
    }

    pub fn is_pending(&self) -> bool {
        self.status.trim().eq_ignore_ascii_case(STATUS_PENDING)
    }

    pub fn belongs_to(&self, hito_id: &str) -> bool {
        let hito_id = hito_id.trim();
        !hito_id.is_empty() && self.hito_id.as_deref().map(str::trim) == Some(hito_id)
    }
}

fn optional(value: &str) -> Option<String> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

impl RowRecord for Task {
    const FIELDS: &'static [FieldSpec] = TASK_FIELDS;

    fn from_row(map: &ColumnMap, row: &TableRow) -> Self {
        Self {
            id: map.read(row, "id").to_string(),
            description: map.read(row, "description").to_string(),
            assigned_to: map.read(row, "assignedTo").to_string(),
            start_date: map.read(row, "startDate").to_string(),
            due_date: map.read(row, "dueDate").to_string(),
            status: map.read(row, "status").to_string(),
            hito_id: optional(map.read(row, "hitoId")),
            area: map.read(row, "area").to_string(),
            proyecto: map.read(row, "proyecto").to_string(),
            asignado_por: map.read(row, "asignadoPor").to_string(),
            rescheduled_date: optional(map.read(row, "rescheduledDate")),
        }
    }

    fn write_into(&self, map: &ColumnMap, cells: &mut Row) {
        map.write(cells, "id", &self.id);
        map.write(cells, "description", &self.description);
        map.write(cells, "assignedTo", &self.assigned_to);
        map.write(cells, "startDate", &self.start_date);
        map.write(cells, "dueDate", &self.due_date);
        map.write(cells, "status", &self.status);
        map.write(cells, "hitoId", self.hito_id.as_deref().unwrap_or(""));
        map.write(cells, "area", &self.area);
        map.write(cells, "proyecto", &self.proyecto);
        map.write(cells, "asignadoPor", &self.asignado_por);
        map.write(cells, "rescheduledDate", self.rescheduled_date.as_deref().unwrap_or(""));
    }

    fn record_id(&self) -> Option<&str> {
        Some(&self.id)
    }
}

impl Owned for Task {
    fn owner(&self) -> &str {
        &self.assigned_to
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TaskQuery {
    pub email: Option<String>,
    pub scope: Option<String>,
    pub role: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTaskRequest {
    pub description: String,
    pub assigned_to: String,
    #[serde(default)]
    pub due_date: String,
    #[serde(default)]
    pub start_date: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub hito_id: Option<String>,
    #[serde(default)]
    pub area: Option<String>,
    #[serde(default)]
    pub proyecto: Option<String>,
    #[serde(default)]
    pub asignado_por: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateStatusRequest {
    #[serde(flatten)]
    pub target: RowRef,
    #[serde(alias = "status")]
    pub new_status: String,
}

/// Full-record update: fields left out keep their stored value.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTaskRequest {
    #[serde(flatten)]
    pub target: RowRef,
    pub description: Option<String>,
    pub assigned_to: Option<String>,
    pub start_date: Option<String>,
    pub due_date: Option<String>,
    pub status: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub hito_id: Option<String>,
    pub area: Option<String>,
    pub proyecto: Option<String>,
    pub asignado_por: Option<String>,
    #[serde(alias = "fechaReprogramada")]
    pub rescheduled_date: Option<String>,
}

impl UpdateTaskRequest {
    pub fn apply(self, task: &mut Task) {
        let set = |slot: &mut String, value: Option<String>| {
            if let Some(v) = value {
                *slot = v;
            }
        };
        set(&mut task.description, self.description);
        set(&mut task.assigned_to, self.assigned_to);
        set(&mut task.start_date, self.start_date);
        set(&mut task.due_date, self.due_date);
        set(&mut task.status, self.status);
        set(&mut task.area, self.area);
        set(&mut task.proyecto, self.proyecto);
        set(&mut task.asignado_por, self.asignado_por);
        if let Some(hito) = self.hito_id {
            task.hito_id = optional(&hito);
        }
        if let Some(date) = self.rescheduled_date {
            task.rescheduled_date = optional(&date);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mapping::ColumnLayout;

    fn header() -> Vec<String> {
        TASK_FIELDS.iter().map(|f| f.header.to_string()).collect()
    }

    #[test]
    fn test_effective_due_date_prefers_rescheduled() {
        let mut task = Task {
            due_date: "2024-05-01".into(),
            ..Default::default()
        };
        assert_eq!(task.effective_due_date(), "2024-05-01");
        task.rescheduled_date = Some("2024-05-10".into());
        assert_eq!(task.effective_due_date(), "2024-05-10");
    }

    #[test]
    fn test_legacy_layout_reads_five_columns() {
        let map = ColumnMap::resolve("Tareas", TASK_FIELDS, ColumnLayout::LegacyFixedOffset, &[], 11);
        let row = TableRow {
            number: 2,
            cells: ["1", "Draft", "ana@x.com", "2024-05-01", "Pendiente"]
                .iter()
                .map(|c| c.to_string())
                .chain(std::iter::repeat(String::new()).take(6))
                .collect(),
        };
        let task = Task::from_row(&map, &row);
        assert_eq!(task.due_date, "2024-05-01");
        assert_eq!(task.status, "Pendiente");
        assert_eq!(task.hito_id, None);
        assert_eq!(task.to_row(&map), row.cells);
    }

    #[test]
    fn test_header_layout_round_trip() {
        let map = ColumnMap::resolve("Tareas", TASK_FIELDS, ColumnLayout::HeaderMatched, &header(), 11);
        let task = Task {
            id: "1714560000000".into(),
            description: "Draft report".into(),
            assigned_to: "alice@x.com".into(),
            start_date: "2024-04-20".into(),
            due_date: "2024-05-01".into(),
            status: STATUS_PENDING.into(),
            hito_id: Some("H-1234".into()),
            area: "Ops".into(),
            proyecto: "Alpha".into(),
            asignado_por: "bob@x.com".into(),
            rescheduled_date: None,
        };
        let row = TableRow {
            number: 5,
            cells: task.to_row(&map),
        };
        assert_eq!(Task::from_row(&map, &row), task);
    }

    #[test]
    fn test_update_request_patches_only_given_fields() {
        let mut task = Task {
            description: "Old".into(),
            area: "Ops".into(),
            hito_id: Some("H-1".into()),
            ..Default::default()
        };
        let req: UpdateTaskRequest =
            serde_json::from_str(r#"{"rowNumber":"4","description":"New","hitoId":""}"#).unwrap();
        assert_eq!(req.target.row_number, Some(4));
        req.apply(&mut task);
        assert_eq!(task.description, "New");
        assert_eq!(task.area, "Ops");
        assert_eq!(task.hito_id, None);
    }
}
