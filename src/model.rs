//! The four-entity REURB hierarchy: project → quadra → property → survey.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Table the exported dump targets.
pub const PROPERTY_TABLE: &str = "reurb_properties";

/// Columns of [`PROPERTY_TABLE`], in dump order. Every tuple must have
/// exactly this many fields.
pub const PROPERTY_COLUMNS: [&str; 24] = [
    "id",
    "quadra_id",
    "name",
    "area",
    "description",
    "latitude",
    "longitude",
    "status",
    "images",
    "created_at",
    "updated_at",
    "address",
    "tipo_posse",
    "situacao_fundiaria",
    "documentos_comprobatorios",
    "historico_ocupacao",
    "restricoes_ambientais",
    "situacao_cadastral",
    "area_terreno",
    "area_construida",
    "matricula_imovel",
    "data_ocupacao",
    "possui_conflito",
    "descricao_conflito",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Entity {
    Project,
    Quadra,
    Property,
    Survey,
}

impl Entity {
    /// Root first, in the order the seed files populate them.
    pub const ALL: [Entity; 4] = [
        Entity::Project,
        Entity::Quadra,
        Entity::Property,
        Entity::Survey,
    ];

    pub fn table(&self) -> &'static str {
        match self {
            Entity::Project => "reurb_projects",
            Entity::Quadra => "reurb_quadras",
            Entity::Property => PROPERTY_TABLE,
            Entity::Survey => "reurb_surveys",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Entity::Project => "Projects",
            Entity::Quadra => "Quadras",
            Entity::Property => "Properties (lots)",
            Entity::Survey => "Surveys",
        }
    }

    /// The parent this entity references, with the referencing column.
    pub fn parent(&self) -> Option<(Entity, &'static str)> {
        match self {
            Entity::Project => None,
            Entity::Quadra => Some((Entity::Project, "project_id")),
            Entity::Property => Some((Entity::Quadra, "quadra_id")),
            Entity::Survey => Some((Entity::Property, "property_id")),
        }
    }
}

impl fmt::Display for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.table())
    }
}

/// Synchronization state of a field survey.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncStatus {
    Draft,
    PendingSync,
    Synced,
}

impl SyncStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SyncStatus::Draft => "draft",
            SyncStatus::PendingSync => "pending_sync",
            SyncStatus::Synced => "synced",
        }
    }
}

impl FromStr for SyncStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "draft" => Ok(SyncStatus::Draft),
            "pending_sync" => Ok(SyncStatus::PendingSync),
            "synced" => Ok(SyncStatus::Synced),
            _ => Err(format!(
                "Unknown survey status: {}. Valid options: draft, pending_sync, synced",
                s
            )),
        }
    }
}

impl fmt::Display for SyncStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
