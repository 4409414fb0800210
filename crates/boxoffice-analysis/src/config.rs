//! Preprocessing configuration
//!
//! Column labels and policy constants are passed into the pipeline explicitly
//! instead of being module-level constants, so synthetic schemas can be tested
//! in isolation. Every field has a default matching the box-office export, and
//! a JSON configuration file only needs to list the fields it overrides.
//!
//! ```
//! use boxoffice_analysis::config::PipelineConfig;
//!
//! let config: PipelineConfig =
//!     serde_json::from_str(r#"{ "price_fill_value": 5.0 }"#).unwrap();
//! assert_eq!(config.price_fill_value, 5.0);
//! assert_eq!(config.columns.tickets_sold, "Quantidade de ingressos vendidos");
//! ```

use serde::{Deserialize, Serialize};

use crate::csv_io::CsvFormat;

/// Labels of the columns in the raw export
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RawColumns {
    pub venue_space: String,
    pub event_name: String,
    pub event_type: String,
    pub age_rating: String,
    pub session_type: String,
    pub session_datetime: String,
    pub exhibition_start: String,
    pub exhibition_end: String,
    pub ticket_price: String,
    pub tickets_sold: String,
    pub total_sales: String,
}

impl Default for RawColumns {
    fn default() -> Self {
        Self {
            venue_space: "Espaço".to_owned(),
            event_name: "Evento".to_owned(),
            event_type: "Tipo de Evento".to_owned(),
            age_rating: "Classificação Etária".to_owned(),
            session_type: "Tipo da Sessão".to_owned(),
            session_datetime: "Data da Sessão".to_owned(),
            exhibition_start: "Período do Cartaz - Data Início".to_owned(),
            exhibition_end: "Período do Cartaz - Data Fim".to_owned(),
            ticket_price: "Valor do Ingresso".to_owned(),
            tickets_sold: "Quantidade de ingressos vendidos".to_owned(),
            total_sales: "Total de Vendas".to_owned(),
        }
    }
}

/// Labels given to the derived calendar columns
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DerivedColumns {
    pub hour: String,
    pub day_of_week: String,
    pub day_of_month: String,
    pub days_in_theaters: String,
}

impl Default for DerivedColumns {
    fn default() -> Self {
        Self {
            hour: "Hora".to_owned(),
            day_of_week: "Dia da Semana".to_owned(),
            day_of_month: "Dia do Mês".to_owned(),
            days_in_theaters: "Dias em Cartaz".to_owned(),
        }
    }
}

/// Full preprocessing configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Format of the raw input file
    pub input_format: CsvFormat,
    pub columns: RawColumns,
    pub derived: DerivedColumns,
    /// Columns expanded into indicator columns
    pub categorical: Vec<String>,
    /// Value used for tickets without a recorded price
    pub price_fill_value: f64,
    /// Output folder name handed to the visualization sink
    pub heatmap_folder: String,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        let columns = RawColumns::default();
        let categorical = vec![
            columns.venue_space.clone(),
            columns.event_type.clone(),
            columns.age_rating.clone(),
            columns.session_type.clone(),
        ];
        Self {
            input_format: CsvFormat::default(),
            columns,
            derived: DerivedColumns::default(),
            categorical,
            price_fill_value: 0.0,
            heatmap_folder: "preprocessing".to_owned(),
        }
    }
}
