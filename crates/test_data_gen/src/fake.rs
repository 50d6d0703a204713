//! Fake data generation helpers.
//!
//! Provides deterministic fake data for people, addresses, land-tenure
//! attributes and coordinates around the Macapá/Oiapoque region.

use rand::Rng;

const FIRST_NAMES: &[&str] = &[
    "Ana", "Bruno", "Carla", "Diego", "Elaine", "Fábio", "Gabriela", "Hugo", "Iara", "João",
    "Kátia", "Lucas", "Marta", "Nilson", "Otávio", "Paula", "Raimundo", "Sônia", "Tiago",
    "Vera", "Wagner", "Yasmin",
];

const LAST_NAMES: &[&str] = &[
    "Silva", "Santos", "Oliveira", "Souza", "Pereira", "Costa", "Ferreira", "Almeida",
    "Nascimento", "Lima", "Araújo", "Barbosa", "Cardoso", "Ribeiro", "Martins", "Rocha",
];

const STREETS: &[&str] = &[
    "Rua das Palmeiras",
    "Avenida FAB",
    "Rua Jovino Dinoá",
    "Travessa do Igarapé",
    "Rua Leopoldo Machado",
    "Passagem São José",
    "Avenida Mendonça Júnior",
    "Rua Hamilton Silva",
];

const NEIGHBOURHOODS: &[&str] = &[
    "Marabaixo",
    "Novo Horizonte",
    "Infraero",
    "Buritizal",
    "Jardim Felicidade",
];

/// Lot statuses as they appear in the exported table.
pub const PROPERTY_STATUSES: &[&str] = &["pending", "in_analysis", "approved", "rejected"];

const TENURE_TYPES: &[&str] = &["posse", "propriedade", "ocupacao", "cessao"];

const LAND_SITUATIONS: &[&str] = &["regular", "irregular", "em_regularizacao"];

const CADASTRAL_SITUATIONS: &[&str] = &["cadastrado", "pendente", "atualizado"];

const DOCUMENTS: &[&str] = &[
    "RG",
    "CPF",
    "Comprovante de residência",
    "Contrato de compra e venda",
    "Declaração de posse",
];

const LOREM_WORDS: &[&str] = &[
    "lote", "ocupado", "desde", "familia", "residencia", "muro", "alvenaria", "madeira",
    "quintal", "area", "frente", "fundos", "vizinho", "igarape", "rua", "acesso", "energia",
    "agua", "construcao", "reforma",
];

/// Fake data generator with deterministic RNG
pub struct FakeData<R: Rng> {
    rng: R,
}

impl<R: Rng> FakeData<R> {
    pub fn new(rng: R) -> Self {
        Self { rng }
    }

    fn pick<T: Copy>(&mut self, items: &[T]) -> T {
        items[self.rng.gen_range(0..items.len())]
    }

    /// Generate a full name
    pub fn full_name(&mut self) -> String {
        format!("{} {}", self.pick(FIRST_NAMES), self.pick(LAST_NAMES))
    }

    /// Generate a street address
    pub fn address(&mut self) -> String {
        let number: u32 = self.rng.gen_range(1..2000);
        format!(
            "{}, {} - {}",
            self.pick(STREETS),
            number,
            self.pick(NEIGHBOURHOODS)
        )
    }

    /// Generate a random v4-shaped UUID string
    pub fn uuid(&mut self) -> String {
        let a: u32 = self.rng.gen();
        let b: u16 = self.rng.gen();
        let c: u16 = (self.rng.gen::<u16>() & 0x0fff) | 0x4000;
        let d: u16 = (self.rng.gen::<u16>() & 0x3fff) | 0x8000;
        let e: u64 = self.rng.gen::<u64>() & 0xffff_ffff_ffff;
        format!("{:08x}-{:04x}-{:04x}-{:04x}-{:012x}", a, b, c, d, e)
    }

    pub fn property_status(&mut self) -> &'static str {
        self.pick(PROPERTY_STATUSES)
    }

    pub fn tenure_type(&mut self) -> &'static str {
        self.pick(TENURE_TYPES)
    }

    pub fn land_situation(&mut self) -> &'static str {
        self.pick(LAND_SITUATIONS)
    }

    pub fn cadastral_situation(&mut self) -> &'static str {
        self.pick(CADASTRAL_SITUATIONS)
    }

    /// Pick between one and three supporting documents
    pub fn documents(&mut self) -> Vec<&'static str> {
        let count = self.rng.gen_range(1..=3);
        (0..count).map(|_| self.pick(DOCUMENTS)).collect()
    }

    /// Coordinate jittered around a centre point
    pub fn coordinate(&mut self, centre: f64, spread: f64) -> f64 {
        let value = centre + self.rng.gen_range(-spread..spread);
        (value * 1_000_000.0).round() / 1_000_000.0
    }

    /// Area in square metres with two decimals
    pub fn area(&mut self, min: f64, max: f64) -> f64 {
        let value = self.rng.gen_range(min..max);
        (value * 100.0).round() / 100.0
    }

    /// Generate a random integer in range
    pub fn int_range(&mut self, min: i64, max: i64) -> i64 {
        self.rng.gen_range(min..=max)
    }

    /// Generate a boolean with given probability of true
    pub fn bool_with_probability(&mut self, probability: f64) -> bool {
        self.rng.gen::<f64>() < probability
    }

    /// Generate a sentence (capitalized, with period)
    pub fn sentence(&mut self, word_count: usize) -> String {
        let mut text = (0..word_count)
            .map(|_| self.pick(LOREM_WORDS))
            .collect::<Vec<_>>()
            .join(" ");
        if let Some(first) = text.get_mut(0..1) {
            first.make_ascii_uppercase();
        }
        text.push('.');
        text
    }

    /// Generate a timestamp string in the export's `+00` offset style
    pub fn timestamp(&mut self, year_start: i32, year_end: i32) -> String {
        let year = self.rng.gen_range(year_start..=year_end);
        let month: u32 = self.rng.gen_range(1..=12);
        let day: u32 = self.rng.gen_range(1..=28);
        let hour: u32 = self.rng.gen_range(0..24);
        let minute: u32 = self.rng.gen_range(0..60);
        let second: u32 = self.rng.gen_range(0..60);
        format!(
            "{:04}-{:02}-{:02} {:02}:{:02}:{:02}.{:06}+00",
            year,
            month,
            day,
            hour,
            minute,
            second,
            self.rng.gen_range(0..1_000_000)
        )
    }

    /// Generate a date string
    pub fn date(&mut self, year_start: i32, year_end: i32) -> String {
        let year = self.rng.gen_range(year_start..=year_end);
        let month: u32 = self.rng.gen_range(1..=12);
        let day: u32 = self.rng.gen_range(1..=28);
        format!("{:04}-{:02}-{:02}", year, month, day)
    }

    /// Registry number in the `MAT-000000` style
    pub fn registration_number(&mut self) -> String {
        format!("MAT-{:06}", self.rng.gen_range(0..1_000_000))
    }
}
