use serde::{Deserialize, Serialize};

use crate::mapping::{ColumnMap, FieldSpec, RowRecord};
use crate::scope::Owned;
use crate::store::{index::row_number, ColumnSpan, Row, TableRow};

pub const RESULT_SPAN: ColumnSpan = ColumnSpan::new(1, 4);

pub const EVALUATIONS: [&str; 3] = ["Verde", "Amarillo", "Rojo"];

pub const RESULT_FIELDS: &[FieldSpec] = &[
    FieldSpec::new("weekId", "Semana", &["semana", "week"], Some(0)),
    FieldSpec::new("assignedTo", "Email", &["email", "asignado a"], Some(1)),
    FieldSpec::new(
        "expectedResult",
        "Resultado Esperado",
        &["resultado esperado", "resultado"],
        Some(2),
    ),
    FieldSpec::new("evaluation", "Evaluacion", &["evaluacion"], Some(3)),
];

/// The result a person commits to for one week, and how it went.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeeklyResult {
    pub week_id: String,
    pub assigned_to: String,
    pub expected_result: String,
    pub evaluation: String,
}

impl RowRecord for WeeklyResult {
    const FIELDS: &'static [FieldSpec] = RESULT_FIELDS;

    fn from_row(map: &ColumnMap, row: &TableRow) -> Self {
        Self {
            week_id: map.read(row, "weekId").trim().to_string(),
            assigned_to: map.read(row, "assignedTo").to_string(),
            expected_result: map.read(row, "expectedResult").to_string(),
            evaluation: map.read(row, "evaluation").to_string(),
        }
    }

    fn write_into(&self, map: &ColumnMap, cells: &mut Row) {
        map.write(cells, "weekId", &self.week_id);
        map.write(cells, "assignedTo", &self.assigned_to);
        map.write(cells, "expectedResult", &self.expected_result);
        map.write(cells, "evaluation", &self.evaluation);
    }
}

impl Owned for WeeklyResult {
    fn owner(&self) -> &str {
        &self.assigned_to
    }
}

/// Canonical spelling of an evaluation; blank clears it.
pub fn normalize_evaluation(raw: &str) -> Option<&'static str> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Some("");
    }
    EVALUATIONS.into_iter().find(|e| e.eq_ignore_ascii_case(raw))
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResultQuery {
    pub email: Option<String>,
    pub week_id: Option<String>,
    pub scope: Option<String>,
    pub role: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveResultRequest {
    /// Older clients send `email` instead.
    pub user_email: Option<String>,
    pub email: Option<String>,
    #[serde(default)]
    pub week_id: String,
    #[serde(default)]
    pub expected_result: String,
}

impl SaveResultRequest {
    pub fn owner(&self) -> Option<&str> {
        [self.user_email.as_deref(), self.email.as_deref()]
            .into_iter()
            .flatten()
            .map(str::trim)
            .find(|e| !e.is_empty())
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveEvaluationRequest {
    #[serde(default, deserialize_with = "row_number")]
    pub row_number: Option<u32>,
    #[serde(default)]
    pub evaluation: String,
}
