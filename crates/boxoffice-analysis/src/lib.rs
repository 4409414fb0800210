//! Feature engineering for box-office ticket-sales exports.
//!
//! This crate turns the raw semicolon-separated export of a cinema's sales
//! system into a dense, numeric, model-ready table.
//!
//! # Overview
//!
//! - [`frame`]: typed column access over polars data frames
//! - [`csv_io`]: loading raw exports and persisting processed tables
//! - [`column_name`]: canonical identifiers for free-text column labels
//! - [`temporal`]: hour, day of week, day of month and days in theaters
//! - [`encoder`]: one-hot encoding with a reusable vocabulary
//! - [`policy`]: leakage and missing-data policies
//! - [`pipeline`]: the ordered preprocessing stages
//! - [`exploration`]: summaries used to inspect a raw export
//! - [`visualization`]: correlation heatmap and exploratory chart sinks
//!
//! # Example
//!
//! ```
//! use std::io::Cursor;
//!
//! use boxoffice_analysis::{
//!     csv_io::{CsvFormat, read_table},
//!     frame,
//!     pipeline::PreprocessingPipeline,
//! };
//!
//! let raw = "\
//! Relatório
//! Espaço;Evento;Tipo de Evento;Classificação Etária;Tipo da Sessão;Data da Sessão;\
//! Período do Cartaz - Data Início;Período do Cartaz - Data Fim;Valor do Ingresso;\
//! Quantidade de ingressos vendidos
//! Sala 1;Filme;Filme;14;Regular;25/12/2023 - 20:30;01/12/2023;31/12/2023;20;35
//! ";
//! let table = read_table(Cursor::new(raw), &CsvFormat::default())?;
//! let processed = PreprocessingPipeline::default().process(table)?;
//!
//! assert!(processed.table.column("dia_da_semana").is_ok());
//! assert_eq!(frame::numbers(&processed.table, "hora")?, vec![Some(20.0)]);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod column_name;
pub mod config;
pub mod csv_io;
pub mod encoder;
pub mod exploration;
pub mod frame;
pub mod pipeline;
pub mod policy;
pub mod temporal;
pub mod visualization;
