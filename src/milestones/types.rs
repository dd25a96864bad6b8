use serde::{Deserialize, Serialize};

use crate::mapping::{ColumnMap, FieldSpec, RowRecord};
use crate::scope::Owned;
use crate::store::{ColumnSpan, Row, RowRef, TableRow};

pub const MILESTONE_SPAN: ColumnSpan = ColumnSpan::new(1, 8);

pub const ESTADO_IN_PROGRESS: &str = "En Proceso";

pub const MILESTONE_FIELDS: &[FieldSpec] = &[
    FieldSpec::new("id", "ID", &["id"], Some(0)),
    FieldSpec::new("nombre", "Nombre", &["nombre", "name", "hito"], Some(1)),
    FieldSpec::new("responsable", "Responsable", &["responsable", "owner"], Some(2)),
    FieldSpec::new("fechaInicio", "Fecha Inicio", &["fecha inicio", "inicio"], Some(3)),
    FieldSpec::new("fechaFin", "Fecha Fin", &["fecha fin", "fin"], Some(4)),
    FieldSpec::new("estado", "Estado", &["estado", "status"], Some(5)),
    FieldSpec::new("area", "Area", &["area"], Some(6)),
    FieldSpec::new("proyecto", "Proyecto", &["proyecto", "project"], Some(7)),
];

/// A strategic deliverable (hito) that tasks link to by id.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Milestone {
    pub id: String,
    pub nombre: String,
    pub responsable: String,
    pub fecha_inicio: String,
    pub fecha_fin: String,
    pub estado: String,
    pub area: String,
    pub proyecto: String,
}

impl RowRecord for Milestone {
    const FIELDS: &'static [FieldSpec] = MILESTONE_FIELDS;

    fn from_row(map: &ColumnMap, row: &TableRow) -> Self {
        Self {
            id: map.read(row, "id").to_string(),
            nombre: map.read(row, "nombre").to_string(),
            responsable: map.read(row, "responsable").to_string(),
            fecha_inicio: map.read(row, "fechaInicio").to_string(),
            fecha_fin: map.read(row, "fechaFin").to_string(),
            estado: map.read(row, "estado").to_string(),
            area: map.read(row, "area").to_string(),
            proyecto: map.read(row, "proyecto").to_string(),
        }
    }

    fn write_into(&self, map: &ColumnMap, cells: &mut Row) {
        map.write(cells, "id", &self.id);
        map.write(cells, "nombre", &self.nombre);
        map.write(cells, "responsable", &self.responsable);
        map.write(cells, "fechaInicio", &self.fecha_inicio);
        map.write(cells, "fechaFin", &self.fecha_fin);
        map.write(cells, "estado", &self.estado);
        map.write(cells, "area", &self.area);
        map.write(cells, "proyecto", &self.proyecto);
    }

    fn record_id(&self) -> Option<&str> {
        Some(&self.id)
    }
}

impl Owned for Milestone {
    fn owner(&self) -> &str {
        &self.responsable
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct MilestoneQuery {
    pub email: Option<String>,
    pub scope: Option<String>,
    pub role: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateMilestoneRequest {
    #[serde(alias = "name")]
    pub nombre: String,
    #[serde(default)]
    pub responsable: String,
    #[serde(default)]
    pub fecha_inicio: Option<String>,
    #[serde(default)]
    pub fecha_fin: String,
    #[serde(default)]
    pub area: Option<String>,
    #[serde(default)]
    pub proyecto: Option<String>,
}

/// Opens a project by creating its `INICIO:` milestone.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateProjectRequest {
    #[serde(alias = "project")]
    pub proyecto: String,
    #[serde(default)]
    pub area: String,
    #[serde(alias = "email")]
    pub responsable: String,
}

impl CreateProjectRequest {
    pub fn into_milestone_request(self, today: String) -> CreateMilestoneRequest {
        CreateMilestoneRequest {
            nombre: format!("INICIO: {}", self.proyecto.trim()),
            responsable: self.responsable,
            fecha_inicio: Some(today.clone()),
            fecha_fin: today,
            area: Some(self.area),
            proyecto: Some(self.proyecto.trim().to_string()),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateEstadoRequest {
    #[serde(flatten)]
    pub target: RowRef,
    #[serde(alias = "status", alias = "newStatus")]
    pub estado: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateMilestoneRequest {
    #[serde(flatten)]
    pub target: RowRef,
    pub nombre: Option<String>,
    pub responsable: Option<String>,
    pub fecha_inicio: Option<String>,
    pub fecha_fin: Option<String>,
    pub estado: Option<String>,
    pub area: Option<String>,
    pub proyecto: Option<String>,
}

impl UpdateMilestoneRequest {
    pub fn apply(self, milestone: &mut Milestone) {
        let fields = [
            (&mut milestone.nombre, self.nombre),
            (&mut milestone.responsable, self.responsable),
            (&mut milestone.fecha_inicio, self.fecha_inicio),
            (&mut milestone.fecha_fin, self.fecha_fin),
            (&mut milestone.estado, self.estado),
            (&mut milestone.area, self.area),
            (&mut milestone.proyecto, self.proyecto),
        ];
        for (slot, value) in fields {
            if let Some(v) = value {
                *slot = v;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mapping::ColumnLayout;

    #[test]
    fn test_header_with_extra_columns() {
        let header: Vec<String> = [
            "ID",
            "Nombre del Hito",
            "Responsable",
            "Notas",
            "Fecha Inicio",
            "Fecha Fin",
            "Estado",
            "Área",
            "Proyecto",
        ]
        .iter()
        .map(|h| h.to_string())
        .collect();
        let map = ColumnMap::resolve("Cronograma", MILESTONE_FIELDS, ColumnLayout::HeaderMatched, &header, 8);
        assert_eq!(map.column("nombre"), Some(1));
        assert_eq!(map.column("fechaInicio"), Some(4));
        assert_eq!(map.column("area"), Some(7));
        // Proyecto sits past H and is not read.
        assert_eq!(map.column("proyecto"), None);
    }

    #[test]
    fn test_create_project_builds_opening_milestone() {
        let req: CreateProjectRequest =
            serde_json::from_str(r#"{"proyecto":" Alpha ","area":"Ops","email":"ana@x.com"}"#).unwrap();
        let milestone = req.into_milestone_request("2024-05-15".into());
        assert_eq!(milestone.nombre, "INICIO: Alpha");
        assert_eq!(milestone.fecha_fin, "2024-05-15");
        assert_eq!(milestone.proyecto.as_deref(), Some("Alpha"));
        assert_eq!(milestone.responsable, "ana@x.com");
    }

    #[test]
    fn test_update_request_accepts_string_row_number() {
        let req: UpdateMilestoneRequest =
            serde_json::from_str(r#"{"rowNumber":"3","estado":"Completado"}"#).unwrap();
        assert_eq!(req.target.row_number, Some(3));
        let mut milestone = Milestone {
            nombre: "Launch".into(),
            ..Default::default()
        };
        req.apply(&mut milestone);
        assert_eq!(milestone.estado, "Completado");
        assert_eq!(milestone.nombre, "Launch");
    }
}
