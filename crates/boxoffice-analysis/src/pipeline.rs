//! Preprocessing pipeline from raw export to model-ready table
//!
//! The pipeline is a fixed sequence of [`Stage`]s. Each stage depends on the
//! previous one and any failure aborts the run. Nothing is written until every
//! transformation has succeeded, and the processed file itself is persisted
//! atomically, so an aborted run never leaves a partial output behind.
//!
//! | stage                      | effect                                            |
//! |----------------------------|---------------------------------------------------|
//! | load                       | read raw export (banner skipped)                  |
//! | drop leakage               | remove total sales if present                     |
//! | drop empty trailing column | remove last column when fully null                |
//! | fill price                 | null ticket price becomes the fill value          |
//! | drop missing target        | remove rows without tickets sold                  |
//! | hour .. days in theaters   | calendar features                                 |
//! | drop session datetime      | once day of week exists                           |
//! | partition                  | categorical set vs numeric passthrough            |
//! | encode                     | one-hot indicators after passthrough columns      |
//! | normalize names            | canonical identifiers                             |
//! | persist                    | comma-separated, header row, no index             |
//!
//! The correlation heatmap is rendered after persisting through a
//! [`VisualizationSink`]; its failures are logged and never abort the run.

use std::path::Path;

use polars::prelude::DataFrame;

use crate::{
    column_name::{ColumnNameCollision, normalize_labels},
    config::PipelineConfig,
    csv_io::{self, ReadError, WriteError},
    encoder::{CategoricalEncoder, one_hot_encode},
    frame::{self, FrameError},
    policy,
    temporal::{self, TemporalError},
    visualization::VisualizationSink,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, derive_more::Display)]
pub enum Stage {
    #[display("load")]
    Load,
    #[display("drop leakage column")]
    DropLeakage,
    #[display("drop empty trailing column")]
    DropEmptyTrailingColumn,
    #[display("fill missing price")]
    FillPrice,
    #[display("drop rows missing target")]
    DropMissingTarget,
    #[display("extract hour")]
    Hour,
    #[display("extract day of week")]
    DayOfWeek,
    #[display("extract day of month")]
    DayOfMonth,
    #[display("extract days in theaters")]
    DaysInTheaters,
    #[display("drop session datetime")]
    DropSessionDatetime,
    #[display("partition columns")]
    Partition,
    #[display("encode categories")]
    Encode,
    #[display("normalize column names")]
    NormalizeNames,
    #[display("persist")]
    Persist,
}

#[derive(Debug, derive_more::Display, derive_more::Error)]
pub enum PipelineError {
    #[display("failed to load raw table")]
    Read(ReadError),
    #[display("stage '{stage}' failed")]
    Frame { stage: Stage, source: FrameError },
    #[display("stage '{stage}' failed")]
    Temporal { stage: Stage, source: TemporalError },
    #[display("column names collide after normalization")]
    ColumnNames(ColumnNameCollision),
    #[display("failed to persist processed table")]
    Write(WriteError),
}

impl PipelineError {
    /// Stage the run was aborted in
    #[must_use]
    pub fn stage(&self) -> Stage {
        match self {
            Self::Read(_) => Stage::Load,
            Self::Frame { stage, .. } | Self::Temporal { stage, .. } => *stage,
            Self::ColumnNames(_) => Stage::NormalizeNames,
            Self::Write(_) => Stage::Persist,
        }
    }
}

trait StageContext<T> {
    fn at(self, stage: Stage) -> Result<T, PipelineError>;
}

impl<T> StageContext<T> for Result<T, FrameError> {
    fn at(self, stage: Stage) -> Result<T, PipelineError> {
        self.map_err(|source| PipelineError::Frame { stage, source })
    }
}

impl<T> StageContext<T> for Result<T, TemporalError> {
    fn at(self, stage: Stage) -> Result<T, PipelineError> {
        self.map_err(|source| PipelineError::Temporal { stage, source })
    }
}

/// Counters collected while processing
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PipelineReport {
    pub raw_rows: usize,
    pub raw_columns: usize,
    pub dropped_leakage: bool,
    pub dropped_trailing_column: Option<String>,
    pub filled_prices: usize,
    pub dropped_rows: usize,
    pub processed_rows: usize,
    pub processed_columns: usize,
}

/// Output of a successful run
#[derive(Debug, Clone)]
pub struct ProcessedTable {
    /// Numeric table with normalized column names
    pub table: DataFrame,
    /// Vocabulary fitted on the categorical columns (labels before normalization)
    pub encoder: CategoricalEncoder,
    pub report: PipelineReport,
}

#[derive(Debug, Clone, Default)]
pub struct PreprocessingPipeline {
    config: PipelineConfig,
}

impl PreprocessingPipeline {
    #[must_use]
    pub fn new(config: PipelineConfig) -> Self {
        Self { config }
    }

    #[must_use]
    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Label of the target column after name normalization
    #[must_use]
    pub fn target_name(&self) -> String {
        crate::column_name::normalize_label(&self.config.columns.tickets_sold)
    }

    /// Loads the raw table with the configured format
    pub fn load<P>(&self, input: P) -> Result<DataFrame, PipelineError>
    where
        P: AsRef<Path>,
    {
        let table = csv_io::read_table_file(input.as_ref(), &self.config.input_format)
            .map_err(PipelineError::Read)?;
        tracing::info!(
            path = %input.as_ref().display(),
            rows = table.height(),
            columns = table.width(),
            "loaded raw table"
        );
        Ok(table)
    }

    /// Runs every in-memory stage over an already loaded raw table
    pub fn process(&self, mut table: DataFrame) -> Result<ProcessedTable, PipelineError> {
        let config = &self.config;
        let columns = &config.columns;
        let derived = &config.derived;
        let mut report = PipelineReport {
            raw_rows: table.height(),
            raw_columns: table.width(),
            ..PipelineReport::default()
        };

        report.dropped_leakage = policy::drop_leakage_column(&mut table, &columns.total_sales);
        log_stage(Stage::DropLeakage, &table);

        report.dropped_trailing_column = policy::drop_trailing_empty_column(&mut table);
        if let Some(name) = &report.dropped_trailing_column {
            tracing::debug!(column = %name, "dropped empty trailing column");
        }
        log_stage(Stage::DropEmptyTrailingColumn, &table);

        report.filled_prices =
            policy::fill_missing_price(&mut table, &columns.ticket_price, config.price_fill_value)
                .at(Stage::FillPrice)?;
        log_stage(Stage::FillPrice, &table);

        report.dropped_rows =
            policy::drop_rows_missing_target(&mut table, &columns.tickets_sold)
                .at(Stage::DropMissingTarget)?;
        log_stage(Stage::DropMissingTarget, &table);

        temporal::extract_hour(&mut table, &columns.session_datetime, &derived.hour)
            .at(Stage::Hour)?;
        log_stage(Stage::Hour, &table);
        temporal::extract_day_of_week(&mut table, &columns.session_datetime, &derived.day_of_week)
            .at(Stage::DayOfWeek)?;
        log_stage(Stage::DayOfWeek, &table);
        temporal::extract_day_of_month(
            &mut table,
            &columns.session_datetime,
            &derived.day_of_month,
        )
        .at(Stage::DayOfMonth)?;
        log_stage(Stage::DayOfMonth, &table);
        temporal::extract_days_in_theaters(
            &mut table,
            &columns.exhibition_start,
            &columns.exhibition_end,
            &derived.days_in_theaters,
        )
        .at(Stage::DaysInTheaters)?;
        log_stage(Stage::DaysInTheaters, &table);

        if table.column(&derived.day_of_week).is_ok() {
            let _ = table.drop_in_place(&columns.session_datetime);
        }
        log_stage(Stage::DropSessionDatetime, &table);

        let passthrough = self.partition(&mut table)?;
        log_stage(Stage::Partition, &table);

        let (table, encoder) =
            one_hot_encode(&table, &config.categorical, &passthrough).at(Stage::Encode)?;
        log_stage(Stage::Encode, &table);

        let table = normalize_names(table)?;
        log_stage(Stage::NormalizeNames, &table);

        report.processed_rows = table.height();
        report.processed_columns = table.width();
        Ok(ProcessedTable {
            table,
            encoder,
            report,
        })
    }

    /// Splits columns into categorical and passthrough, coercing passthrough to numbers
    ///
    /// Every column that is neither categorical nor the event name passes
    /// through and must be numeric.
    fn partition(&self, table: &mut DataFrame) -> Result<Vec<String>, PipelineError> {
        let config = &self.config;
        for name in &config.categorical {
            frame::require(table, name).at(Stage::Partition)?;
        }
        let passthrough = frame::column_names(table)
            .into_iter()
            .filter(|name| *name != config.columns.event_name && !config.categorical.contains(name))
            .collect::<Vec<_>>();
        for name in &passthrough {
            let values = frame::float_column(table, name).at(Stage::Partition)?;
            table
                .with_column(values)
                .map_err(frame::layout_error)
                .at(Stage::Partition)?;
        }
        Ok(passthrough)
    }

    /// Loads, processes and persists, then renders the correlation heatmap
    ///
    /// A failure in any of the first three steps is logged with its stage
    /// before being returned.
    pub fn run<P, Q, V>(
        &self,
        input: P,
        output: Q,
        sink: &V,
    ) -> Result<ProcessedTable, PipelineError>
    where
        P: AsRef<Path>,
        Q: AsRef<Path>,
        V: VisualizationSink + ?Sized,
    {
        let output = output.as_ref();
        let processed = self
            .load(input)
            .and_then(|raw| self.process(raw))
            .and_then(|processed| {
                csv_io::persist_table(&processed.table, output).map_err(PipelineError::Write)?;
                Ok(processed)
            })
            .inspect_err(|err| {
                tracing::error!(stage = %err.stage(), error = %err, "preprocessing aborted");
            })?;
        tracing::info!(
            path = %output.display(),
            rows = processed.table.height(),
            columns = processed.table.width(),
            "persisted processed table"
        );

        match sink.correlation_heatmap(&processed.table, &self.config.heatmap_folder) {
            Ok(paths) => {
                for path in paths {
                    tracing::info!(path = %path.display(), "wrote heatmap artifact");
                }
            }
            Err(err) => tracing::warn!(error = %err, "correlation heatmap skipped"),
        }
        Ok(processed)
    }
}

/// Renames every column to its canonical identifier
fn normalize_names(table: DataFrame) -> Result<DataFrame, PipelineError> {
    let names = normalize_labels(&frame::column_names(&table)).map_err(PipelineError::ColumnNames)?;
    let columns = table
        .take_columns()
        .into_iter()
        .zip(names)
        .map(|(mut column, name)| {
            column.rename(name.into());
            column
        })
        .collect();
    DataFrame::new(columns)
        .map_err(frame::layout_error)
        .at(Stage::NormalizeNames)
}

fn log_stage(stage: Stage, table: &DataFrame) {
    tracing::info!(
        %stage,
        rows = table.height(),
        columns = table.width(),
        "stage done"
    );
}

#[cfg(test)]
mod tests {
    use std::{io::Cursor, path::PathBuf};

    use super::*;
    use crate::{
        csv_io::{CsvFormat, read_table, write_table},
        visualization::{NoopSink, VisualizationError},
    };

    const HEADER: &str = "Espaço;Evento;Tipo de Evento;Classificação Etária;Tipo da Sessão;\
        Data da Sessão;Período do Cartaz - Data Início;Período do Cartaz - Data Fim;\
        Valor do Ingresso;Quantidade de ingressos vendidos;Total de Vendas;";

    fn raw_csv(rows: &[&str]) -> String {
        let mut csv = format!("Relatório de vendas\n{HEADER}\n");
        for row in rows {
            csv.push_str(row);
            csv.push('\n');
        }
        csv
    }

    fn sample_rows() -> Vec<&'static str> {
        vec![
            "Sala 1;Filme A;Filme;14;Regular;25/12/2023 - 20:30;01/12/2023;31/12/2023;20;35;700;",
            "Sala 2;Filme B;Filme;Livre;Matinê;26/12/2023 - 14:00;15/12/2023 - 00:00;\
             14/01/2024;;12;0;",
            "Sala 1;Filme A;Filme;14;Regular;27/12/2023 - 18:15;01/12/2023;31/12/2023;20;;0;",
            "Sala 3;Show C;Show;18;;31/12/2023 - 23:00;31/12/2023;31/12/2023;50;80;4000;",
        ]
    }

    fn process(csv: &str) -> Result<ProcessedTable, PipelineError> {
        let raw = read_table(Cursor::new(csv.to_owned()), &CsvFormat::default()).unwrap();
        PreprocessingPipeline::default().process(raw)
    }

    #[test]
    fn test_end_to_end() {
        let processed = process(&raw_csv(&sample_rows())).unwrap();
        let table = &processed.table;

        assert_eq!(processed.report.raw_rows, 4);
        assert!(processed.report.dropped_leakage);
        assert!(processed.report.dropped_trailing_column.is_some());
        assert_eq!(processed.report.filled_prices, 1);
        assert_eq!(processed.report.dropped_rows, 1);
        assert_eq!(table.height(), 3);

        assert_eq!(
            frame::column_names(table),
            [
                "valor_do_ingresso",
                "quantidade_de_ingressos_vendidos",
                "hora",
                "dia_da_semana",
                "dia_do_mes",
                "dias_em_cartaz",
                "espaco_sala_1",
                "espaco_sala_2",
                "espaco_sala_3",
                "tipo_de_evento_filme",
                "tipo_de_evento_show",
                "classificacao_etaria_14",
                "classificacao_etaria_18",
                "classificacao_etaria_livre",
                "tipo_da_sessao_matine",
                "tipo_da_sessao_regular",
                "tipo_da_sessao_nan",
            ]
        );
        assert_eq!(
            frame::numbers(table, "valor_do_ingresso").unwrap(),
            vec![Some(20.0), Some(0.0), Some(50.0)]
        );
        assert_eq!(
            frame::numbers(table, "hora").unwrap(),
            vec![Some(20.0), Some(14.0), Some(23.0)]
        );
        assert_eq!(
            frame::numbers(table, "dia_da_semana").unwrap(),
            vec![Some(0.0), Some(1.0), Some(6.0)]
        );
        assert_eq!(
            frame::numbers(table, "dias_em_cartaz").unwrap(),
            vec![Some(30.0), Some(30.0), Some(0.0)]
        );
        assert_eq!(
            frame::numbers(table, "tipo_da_sessao_nan").unwrap(),
            vec![Some(0.0), Some(0.0), Some(1.0)]
        );
    }

    #[test]
    fn test_processed_output_is_numeric_and_binary_indicators() {
        let processed = process(&raw_csv(&sample_rows())).unwrap();
        let indicators = processed.encoder.output_names().len();
        assert_eq!(indicators, 11);
        let first_indicator = processed.table.width() - indicators;
        for (i, column) in processed.table.get_columns().iter().enumerate() {
            let name = column.name().as_str();
            let values = frame::numbers(&processed.table, name)
                .unwrap_or_else(|err| panic!("{name} is not numeric: {err}"));
            if i >= first_indicator {
                assert!(
                    values
                        .iter()
                        .all(|v| matches!(v, Some(x) if *x == 0.0 || *x == 1.0)),
                    "{name}"
                );
            }
        }
    }

    #[test]
    fn test_output_is_deterministic() {
        let csv = raw_csv(&sample_rows());
        let render = || {
            let mut out = Vec::new();
            write_table(&process(&csv).unwrap().table, &mut out).unwrap();
            out
        };
        assert_eq!(render(), render());
    }

    #[test]
    fn test_bad_weekday_aborts() {
        let mut rows = sample_rows();
        rows.push(
            "Sala 1;Filme A;Filme;14;Regular;2023-12-28 - 20:00;01/12/2023;31/12/2023;20;5;100;",
        );
        let err = process(&raw_csv(&rows)).unwrap_err();
        assert_eq!(err.stage(), Stage::DayOfWeek);
    }

    #[test]
    fn test_missing_categorical_column_aborts() {
        let csv = raw_csv(&sample_rows()).replace("Tipo da Sessão", "Sessão");
        let err = process(&csv).unwrap_err();
        assert_eq!(err.stage(), Stage::Partition);
        assert!(matches!(
            err,
            PipelineError::Frame {
                source: FrameError::MissingColumn { .. },
                ..
            }
        ));
    }

    struct FailingSink;

    impl VisualizationSink for FailingSink {
        fn correlation_heatmap(
            &self,
            _table: &DataFrame,
            _folder: &str,
        ) -> Result<Vec<PathBuf>, VisualizationError> {
            Err(VisualizationError::NoNumericColumns)
        }
    }

    fn scratch_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!(
            "boxoffice-pipeline-{name}-{}",
            std::process::id()
        ));
        let _ = std::fs::remove_dir_all(&dir);
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn test_run_survives_visualization_failure() {
        let dir = scratch_dir("sink");
        let input = dir.join("raw.csv");
        let output = dir.join("out/processed.csv");
        std::fs::write(&input, raw_csv(&sample_rows())).unwrap();

        let pipeline = PreprocessingPipeline::default();
        pipeline.run(&input, &output, &FailingSink).unwrap();

        let written = csv_io::read_table_file(&output, &CsvFormat::processed()).unwrap();
        assert_eq!(written.height(), 3);
        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_failed_run_writes_nothing() {
        let dir = scratch_dir("abort");
        let input = dir.join("raw.csv");
        let output = dir.join("processed.csv");
        let csv = raw_csv(&sample_rows()).replace("Valor do Ingresso", "Preço");
        std::fs::write(&input, csv).unwrap();

        let err = PreprocessingPipeline::default()
            .run(&input, &output, &NoopSink)
            .unwrap_err();
        assert_eq!(err.stage(), Stage::FillPrice);
        assert!(!output.exists());
        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_missing_input_fails_at_load() {
        let dir = scratch_dir("load");
        let output = dir.join("processed.csv");
        let err = PreprocessingPipeline::default()
            .run(dir.join("absent.csv"), &output, &NoopSink)
            .unwrap_err();
        assert_eq!(err.stage(), Stage::Load);
        assert!(matches!(err, PipelineError::Read(ReadError::Open { .. })));
        assert!(!output.exists());
        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_unwritable_output_fails_at_persist() {
        let dir = scratch_dir("persist");
        let input = dir.join("raw.csv");
        std::fs::write(&input, raw_csv(&sample_rows())).unwrap();
        // a regular file where the output directory should be
        let blocker = dir.join("blocker");
        std::fs::write(&blocker, "").unwrap();

        let err = PreprocessingPipeline::default()
            .run(&input, blocker.join("processed.csv"), &NoopSink)
            .unwrap_err();
        assert_eq!(err.stage(), Stage::Persist);
        std::fs::remove_dir_all(&dir).unwrap();
    }
}
