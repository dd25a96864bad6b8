//! Directory of people, roles and areas.
//!
//! Read-only: the `Usuarios` and `Areas` tables are maintained by hand.

use axum::{extract::State, routing::get, Json, Router};
use log::debug;
use serde::Serialize;
use std::collections::BTreeSet;
use std::sync::Arc;

use crate::core::urls::ApiUrls;
use crate::mapping::{ColumnMap, FieldSpec, Repository, RowRecord};
use crate::scope::Role;
use crate::shared::error::ApiError;
use crate::shared::state::AppState;
use crate::store::{ColumnSpan, Row, Table, TableRow};

pub const USER_SPAN: ColumnSpan = ColumnSpan::new(1, 4);
pub const AREA_SPAN: ColumnSpan = ColumnSpan::new(1, 1);
pub const DEFAULT_AREA: &str = "General";

pub const USER_FIELDS: &[FieldSpec] = &[
    FieldSpec::new("name", "Nombre", &["nombre", "name"], Some(0)),
    FieldSpec::new("email", "Email", &["email", "correo"], Some(1)),
    FieldSpec::new("role", "Rol", &["rol", "role"], Some(2)),
    FieldSpec::new("area", "Area", &["area"], Some(3)),
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct User {
    #[serde(skip_serializing_if = "String::is_empty")]
    pub name: String,
    pub email: String,
    pub role: Role,
    pub area: String,
}

impl RowRecord for User {
    const FIELDS: &'static [FieldSpec] = USER_FIELDS;

    fn from_row(map: &ColumnMap, row: &TableRow) -> Self {
        let area = map.read(row, "area").trim();
        Self {
            name: map.read(row, "name").trim().to_string(),
            email: map.read(row, "email").trim().to_lowercase(),
            role: Role::parse(Some(map.read(row, "role"))),
            area: if area.is_empty() { DEFAULT_AREA } else { area }.to_string(),
        }
    }

    fn write_into(&self, map: &ColumnMap, cells: &mut Row) {
        map.write(cells, "name", &self.name);
        map.write(cells, "email", &self.email);
        map.write(cells, "role", self.role.as_str());
        map.write(cells, "area", &self.area);
    }

    fn record_id(&self) -> Option<&str> {
        Some(&self.email)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Directory {
    pub users: Vec<User>,
    pub areas: Vec<String>,
}

/// Users with an email address, in table order.
pub async fn list_users(state: &AppState) -> Result<Vec<User>, ApiError> {
    let users = Repository::<User>::new(state.store(), &state.tables().users, USER_SPAN)
        .list()
        .await?;
    Ok(users
        .into_iter()
        .map(|u| u.record)
        .filter(|u| !u.email.is_empty())
        .collect())
}

/// Areas from the `Areas` table, or the sorted distinct areas of `users`
/// when that table is missing or empty.
pub async fn list_areas(state: &AppState, users: &[User]) -> Result<Vec<String>, ApiError> {
    let table = Table::load(state.store(), &state.tables().areas.name, AREA_SPAN).await?;
    let mut seen = BTreeSet::new();
    let areas: Vec<String> = table
        .data_rows()
        .map(|row| row.cell(0).trim().to_string())
        .filter(|a| !a.is_empty() && seen.insert(a.clone()))
        .collect();
    if !areas.is_empty() {
        return Ok(areas);
    }
    debug!("No areas table, deriving areas from users");
    Ok(users
        .iter()
        .map(|u| u.area.clone())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect())
}

pub async fn handle_users_list(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Directory>, ApiError> {
    let users = list_users(&state).await?;
    let areas = list_areas(&state, &users).await?;
    Ok(Json(Directory { users, areas }))
}

pub fn configure_user_routes() -> Router<Arc<AppState>> {
    Router::new().route(ApiUrls::USERS, get(handle_users_list))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::test_utils::test_context;
    use crate::store::MemoryTableStore;

    fn directory() -> MemoryTableStore {
        MemoryTableStore::new().with_table(
            "Usuarios",
            vec![
                vec!["Nombre", "Email", "Rol", "Area"],
                vec!["Ana", "Ana@X.com", "Admin", "Ventas"],
                vec!["Sin correo", "", "Usuario", "Ops"],
                vec!["Bob", "bob@x.com"],
                vec!["Caro", "caro@x.com", "admin ", "Compras"],
            ],
        )
    }

    #[tokio::test]
    async fn test_users_are_normalized() {
        let ctx = test_context(directory());
        let users = list_users(&ctx.state).await.unwrap();
        assert_eq!(users.len(), 3);
        assert_eq!(users[0].email, "ana@x.com");
        assert_eq!(users[1].role, Role::Usuario);
        assert_eq!(users[1].area, DEFAULT_AREA);
        assert_eq!(users[2].role, Role::Admin);
    }

    #[tokio::test]
    async fn test_areas_fall_back_to_user_areas() {
        let ctx = test_context(directory());
        let users = list_users(&ctx.state).await.unwrap();
        let areas = list_areas(&ctx.state, &users).await.unwrap();
        assert_eq!(areas, ["Compras", "General", "Ventas"]);
    }

    #[tokio::test]
    async fn test_areas_table_wins() {
        let store = directory().with_table(
            "Areas",
            vec![vec!["Area"], vec!["Ops"], vec!["Ventas"], vec!["Ops"]],
        );
        let ctx = test_context(store);
        let areas = list_areas(&ctx.state, &[]).await.unwrap();
        assert_eq!(areas, ["Ops", "Ventas"]);
    }
}
