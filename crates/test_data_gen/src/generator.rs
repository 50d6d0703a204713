//! Data generator for the REURB hierarchy.
//!
//! Produces deterministic projects, quadras, properties and surveys, and
//! renders them either as a Supabase-style export dump of `reurb_properties`
//! or as plain seed SQL for the other three tables.

use crate::fake::FakeData;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

/// Column order of the exported `reurb_properties` table.
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

/// Generation scale presets
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Scale {
    /// 2 projects, 6 quadras, 48 properties
    Small,
    /// 2 projects, 20 quadras, 500 properties
    Medium,
    /// 4 projects, 100 quadras, 5,000 properties
    Large,
}

impl Scale {
    pub fn projects(&self) -> usize {
        match self {
            Scale::Small => 2,
            Scale::Medium => 2,
            Scale::Large => 4,
        }
    }

    pub fn quadras_per_project(&self) -> usize {
        match self {
            Scale::Small => 3,
            Scale::Medium => 10,
            Scale::Large => 25,
        }
    }

    pub fn properties_per_quadra(&self) -> usize {
        match self {
            Scale::Small => 8,
            Scale::Medium => 25,
            Scale::Large => 50,
        }
    }

    /// One survey for every `n` properties
    pub fn survey_every(&self) -> usize {
        4
    }
}

impl std::str::FromStr for Scale {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "small" | "s" => Ok(Scale::Small),
            "medium" | "m" => Ok(Scale::Medium),
            "large" | "l" => Ok(Scale::Large),
            _ => Err(format!(
                "Unknown scale: {}. Use small, medium, or large",
                s
            )),
        }
    }
}

/// How string items inside `ARRAY[...]` literals are quoted in the dump
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ArrayQuoting {
    /// `ARRAY['a', 'b']` (valid PostgreSQL)
    #[default]
    Single,
    /// `ARRAY["a", "b"]` (what some row exporters emit)
    Double,
}

/// SQL value representation
#[derive(Debug, Clone)]
pub enum SqlValue {
    Null,
    Int(i64),
    Float(f64),
    Text(String),
    /// Rendered as the quoted `'true'`/`'false'` the export uses
    Bool(bool),
    TextArray(Vec<String>),
}

impl SqlValue {
    fn text(s: impl Into<String>) -> Self {
        SqlValue::Text(s.into())
    }

    fn opt_text(s: Option<String>) -> Self {
        s.map(SqlValue::Text).unwrap_or(SqlValue::Null)
    }

    /// Format as a PostgreSQL export literal
    pub fn to_dump(&self, arrays: ArrayQuoting) -> String {
        match self {
            SqlValue::Null => "NULL".to_string(),
            SqlValue::Int(n) => n.to_string(),
            SqlValue::Float(n) => format!("{}", n),
            SqlValue::Text(s) => format!("'{}'", escape_sql_string(s)),
            SqlValue::Bool(b) => if *b { "'true'" } else { "'false'" }.to_string(),
            SqlValue::TextArray(items) => {
                let rendered: Vec<String> = items
                    .iter()
                    .map(|item| match arrays {
                        ArrayQuoting::Single => format!("'{}'", escape_sql_string(item)),
                        ArrayQuoting::Double => format!("\"{}\"", item.replace('"', "\\\"")),
                    })
                    .collect();
                format!("ARRAY[{}]", rendered.join(", "))
            }
        }
    }

    /// Format for a plain seed INSERT (booleans as integers)
    pub fn to_seed(&self) -> String {
        match self {
            SqlValue::Bool(b) => if *b { "1" } else { "0" }.to_string(),
            SqlValue::TextArray(items) => {
                let quoted: Vec<String> = items.iter().map(|i| format!("\"{}\"", i)).collect();
                format!("'[{}]'", escape_sql_string(&quoted.join(",")))
            }
            other => other.to_dump(ArrayQuoting::Single),
        }
    }
}

fn escape_sql_string(s: &str) -> String {
    s.replace('\'', "''")
}

#[derive(Debug, Clone)]
pub struct ProjectRow {
    pub id: String,
    pub name: String,
    pub status: String,
    pub latitude: f64,
    pub longitude: f64,
    pub city: String,
    pub state: String,
}

#[derive(Debug, Clone)]
pub struct QuadraRow {
    pub id: String,
    pub project_id: String,
    pub name: String,
}

/// One exported property row, in [`PROPERTY_COLUMNS`] order
#[derive(Debug, Clone)]
pub struct PropertyRow {
    pub values: Vec<SqlValue>,
}

impl PropertyRow {
    pub fn id(&self) -> &str {
        match &self.values[0] {
            SqlValue::Text(s) => s,
            _ => "",
        }
    }

    pub fn status(&self) -> Option<&str> {
        match &self.values[7] {
            SqlValue::Text(s) => Some(s),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct SurveyRow {
    pub id: String,
    pub property_id: String,
    pub applicant_name: String,
    pub status: &'static str,
    pub is_dirty: bool,
    pub last_sync: Option<String>,
    pub created_at: String,
}

/// Which foreign-key edge an injected orphan breaks
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrphanEdge {
    QuadraProject,
    PropertyQuadra,
    SurveyProperty,
}

/// Rendering options for the export dump
#[derive(Debug, Clone, Default)]
pub struct DumpOptions {
    pub arrays: ArrayQuoting,
    /// Put each tuple on its own line instead of one long line
    pub row_per_line: bool,
    /// Use text containing `(`, `)`, `,`, `;` and apostrophes in descriptions
    pub tricky_text: bool,
}

/// All generated data
#[derive(Debug, Clone, Default)]
pub struct GeneratedData {
    pub projects: Vec<ProjectRow>,
    pub quadras: Vec<QuadraRow>,
    pub properties: Vec<PropertyRow>,
    pub surveys: Vec<SurveyRow>,
}

impl GeneratedData {
    /// Render the `reurb_properties` export dump
    pub fn render_dump(&self, options: &DumpOptions) -> String {
        let mut out = String::new();
        out.push_str("INSERT INTO \"public\".\"reurb_properties\" (");
        let cols: Vec<String> = PROPERTY_COLUMNS.iter().map(|c| format!("\"{}\"", c)).collect();
        out.push_str(&cols.join(", "));
        out.push_str(") VALUES ");

        let separator = if options.row_per_line { ",\n" } else { ", " };
        let tuples: Vec<String> = self
            .properties
            .iter()
            .map(|row| {
                let values: Vec<String> =
                    row.values.iter().map(|v| v.to_dump(options.arrays)).collect();
                format!("({})", values.join(", "))
            })
            .collect();
        out.push_str(&tuples.join(separator));
        out.push_str(";\n");
        out
    }

    /// Render seed SQL for projects, quadras and surveys
    pub fn render_seed(&self) -> String {
        let mut out = String::new();
        out.push_str("-- REURB projects, quadras and surveys\n\n");

        if !self.projects.is_empty() {
            out.push_str(
                "INSERT INTO reurb_projects (id, name, status, latitude, longitude, city, state) VALUES\n",
            );
            let rows: Vec<String> = self
                .projects
                .iter()
                .map(|p| {
                    format!(
                        "('{}', '{}', '{}', {}, {}, '{}', '{}')",
                        p.id,
                        escape_sql_string(&p.name),
                        p.status,
                        p.latitude,
                        p.longitude,
                        escape_sql_string(&p.city),
                        p.state
                    )
                })
                .collect();
            out.push_str(&rows.join(",\n"));
            out.push_str(";\n\n");
        }

        if !self.quadras.is_empty() {
            out.push_str("-- Quadras\n");
            out.push_str("INSERT INTO reurb_quadras (id, project_id, name) VALUES\n");
            let rows: Vec<String> = self
                .quadras
                .iter()
                .map(|q| format!("('{}', '{}', '{}')", q.id, q.project_id, q.name))
                .collect();
            out.push_str(&rows.join(",\n"));
            out.push_str(";\n\n");
        }

        if !self.surveys.is_empty() {
            out.push_str("-- Surveys captured in the field\n");
            out.push_str(
                "INSERT INTO reurb_surveys (id, property_id, applicant_name, status, is_dirty, last_sync, created_at) VALUES\n",
            );
            let rows: Vec<String> = self
                .surveys
                .iter()
                .map(|s| {
                    format!(
                        "('{}', '{}', '{}', '{}', {}, {}, '{}')",
                        s.id,
                        s.property_id,
                        escape_sql_string(&s.applicant_name),
                        s.status,
                        if s.is_dirty { 1 } else { 0 },
                        s.last_sync
                            .as_ref()
                            .map(|t| format!("'{}'", t))
                            .unwrap_or_else(|| "NULL".to_string()),
                        s.created_at
                    )
                })
                .collect();
            out.push_str(&rows.join(",\n"));
            out.push_str(";\n");
        }

        out
    }

    /// Number of lots per status, as the verifier should report them
    pub fn status_counts(&self) -> Vec<(String, usize)> {
        let mut counts: Vec<(String, usize)> = Vec::new();
        for row in &self.properties {
            let status = row.status().unwrap_or("(none)").to_string();
            match counts.iter_mut().find(|(s, _)| *s == status) {
                Some((_, n)) => *n += 1,
                None => counts.push((status, 1)),
            }
        }
        counts
    }
}

/// Main data generator
pub struct Generator {
    scale: Scale,
    fake: FakeData<ChaCha8Rng>,
    tricky_text: bool,
}

impl Generator {
    pub fn new(seed: u64, scale: Scale) -> Self {
        Self {
            scale,
            fake: FakeData::new(ChaCha8Rng::seed_from_u64(seed)),
            tricky_text: false,
        }
    }

    /// Use descriptions containing parentheses, separators and apostrophes
    pub fn with_tricky_text(mut self, tricky: bool) -> Self {
        self.tricky_text = tricky;
        self
    }

    /// Generate a consistent hierarchy with no dangling references
    pub fn generate(&mut self) -> GeneratedData {
        let mut data = GeneratedData::default();

        let project_names = ["Marabaixo 1", "Oiapoque", "Infraero II", "Buritizal"];
        for p in 0..self.scale.projects() {
            let project = ProjectRow {
                id: self.fake.uuid(),
                name: project_names[p % project_names.len()].to_string(),
                status: "active".to_string(),
                latitude: self.fake.coordinate(0.03, 0.05),
                longitude: self.fake.coordinate(-51.07, 0.05),
                city: if p % 2 == 0 { "Macapá" } else { "Oiapoque" }.to_string(),
                state: "AP".to_string(),
            };

            for q in 0..self.scale.quadras_per_project() {
                let quadra = QuadraRow {
                    id: self.fake.uuid(),
                    project_id: project.id.clone(),
                    name: format!("{}", q + 1),
                };

                for l in 0..self.scale.properties_per_quadra() {
                    let property = self.property(&quadra.id, l + 1);
                    data.properties.push(property);
                }
                data.quadras.push(quadra);
            }
            data.projects.push(project);
        }

        let every = self.scale.survey_every();
        let survey_targets: Vec<String> = data
            .properties
            .iter()
            .step_by(every)
            .map(|p| p.id().to_string())
            .collect();
        for property_id in survey_targets {
            let survey = self.survey(&property_id);
            data.surveys.push(survey);
        }

        data
    }

    /// Append one row whose foreign key resolves to nothing
    pub fn inject_orphan(&mut self, data: &mut GeneratedData, edge: OrphanEdge) {
        let dangling = self.fake.uuid();
        match edge {
            OrphanEdge::QuadraProject => data.quadras.push(QuadraRow {
                id: self.fake.uuid(),
                project_id: dangling,
                name: "orphan".to_string(),
            }),
            OrphanEdge::PropertyQuadra => {
                let property = self.property(&dangling, 999);
                data.properties.push(property);
            }
            OrphanEdge::SurveyProperty => {
                let survey = self.survey(&dangling);
                data.surveys.push(survey);
            }
        }
    }

    fn property(&mut self, quadra_id: &str, lot_number: usize) -> PropertyRow {
        let description = if self.tricky_text {
            format!(
                "Casa (fundos); muro, portão d'água - {}",
                self.fake.sentence(4)
            )
        } else {
            self.fake.sentence(6)
        };
        let images: Vec<String> = (0..self.fake.int_range(0, 2))
            .map(|i| {
                format!(
                    "https://storage.example.org/reurb/lotes/{}-{}.jpg",
                    lot_number, i
                )
            })
            .collect();
        let has_conflict = self.fake.bool_with_probability(0.15);
        let built_area = if self.fake.bool_with_probability(0.7) {
            SqlValue::Float(self.fake.area(30.0, 180.0))
        } else {
            SqlValue::Null
        };
        let created_at = self.fake.timestamp(2023, 2024);

        let values = vec![
            SqlValue::text(self.fake.uuid()),
            SqlValue::text(quadra_id),
            SqlValue::text(format!("Lote {}", lot_number)),
            SqlValue::text(format!("{:.2}", self.fake.area(120.0, 600.0))),
            SqlValue::text(description),
            SqlValue::Float(self.fake.coordinate(0.03, 0.05)),
            SqlValue::Float(self.fake.coordinate(-51.07, 0.05)),
            SqlValue::text(self.fake.property_status()),
            SqlValue::TextArray(images),
            SqlValue::text(created_at.clone()),
            SqlValue::text(created_at),
            SqlValue::text(self.fake.address()),
            SqlValue::text(self.fake.tenure_type()),
            SqlValue::text(self.fake.land_situation()),
            SqlValue::TextArray(
                self.fake
                    .documents()
                    .into_iter()
                    .map(String::from)
                    .collect(),
            ),
            SqlValue::opt_text(
                self.fake
                    .bool_with_probability(0.5)
                    .then(|| format!("Ocupado desde {}", self.fake.int_range(1985, 2020))),
            ),
            SqlValue::Null,
            SqlValue::text(self.fake.cadastral_situation()),
            SqlValue::Float(self.fake.area(120.0, 600.0)),
            built_area,
            SqlValue::opt_text(
                self.fake
                    .bool_with_probability(0.6)
                    .then(|| self.fake.registration_number()),
            ),
            SqlValue::opt_text(
                self.fake
                    .bool_with_probability(0.8)
                    .then(|| self.fake.date(1985, 2022)),
            ),
            SqlValue::Bool(has_conflict),
            SqlValue::opt_text(has_conflict.then(|| "Disputa de limite com vizinho".to_string())),
        ];

        PropertyRow { values }
    }

    fn survey(&mut self, property_id: &str) -> SurveyRow {
        let statuses = ["draft", "pending_sync", "synced"];
        let status = statuses[self.fake.int_range(0, 2) as usize];
        let synced = status == "synced";
        SurveyRow {
            id: self.fake.uuid(),
            property_id: property_id.to_string(),
            applicant_name: self.fake.full_name(),
            status,
            is_dirty: !synced,
            last_sync: synced.then(|| self.fake.timestamp(2024, 2025)),
            created_at: self.fake.timestamp(2024, 2024),
        }
    }
}
