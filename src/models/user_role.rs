use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "user_roles")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub user_id: Uuid,
    pub role: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::profile::Entity",
        from = "Column::UserId",
        to = "super::profile::Column::Id",
        on_delete = "Cascade"
    )]
    Profile,
}

impl Related<super::profile::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Profile.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

/// Portal roles
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum AppRole {
    Admin,
    Doctor,
    Nurse,
    Patient,
}

impl AppRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            AppRole::Admin => "admin",
            AppRole::Doctor => "doctor",
            AppRole::Nurse => "nurse",
            AppRole::Patient => "patient",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "admin" => Some(AppRole::Admin),
            "doctor" => Some(AppRole::Doctor),
            "nurse" => Some(AppRole::Nurse),
            "patient" => Some(AppRole::Patient),
            _ => None,
        }
    }

    /// Permission strings granted by this role
    pub fn permissions(&self) -> &'static [&'static str] {
        match self {
            AppRole::Admin => &[
                "notifications.send",
                "notifications.view",
                "notifications.manage",
                "reminders.run",
            ],
            AppRole::Doctor | AppRole::Nurse | AppRole::Patient => &[],
        }
    }
}

impl std::fmt::Display for AppRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
