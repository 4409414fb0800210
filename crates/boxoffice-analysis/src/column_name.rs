//! Canonical identifiers for human-readable column labels
//!
//! Raw exports label columns in free text (`"Classificação Etária"`,
//! `"Período do Cartaz - Data Início"`). Downstream consumers need stable
//! machine-safe identifiers, produced by:
//!
//! 1. Unicode compatibility decomposition (NFKD), dropping every non-ASCII
//!    character (this strips diacritics)
//! 2. Lowercasing
//! 3. Removing every character that is neither alphanumeric, `_`, nor whitespace
//! 4. Joining the remaining words with single underscores
//!
//! The result contains only `[a-z0-9_]`, never starts or ends with `_`, and
//! never contains `__`. Normalization is idempotent.
//!
//! ```
//! use boxoffice_analysis::column_name::normalize_label;
//!
//! assert_eq!(
//!     normalize_label("Período do Cartaz - Data Início"),
//!     "periodo_do_cartaz_data_inicio"
//! );
//! ```

use unicode_normalization::UnicodeNormalization as _;

/// Two distinct labels that normalize to the same identifier
#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display, derive_more::Error)]
#[display("columns '{first}' and '{second}' both normalize to '{normalized}'")]
pub struct ColumnNameCollision {
    pub first: String,
    pub second: String,
    pub normalized: String,
}

/// Normalizes a single label
#[must_use]
pub fn normalize_label(label: &str) -> String {
    let kept = label
        .nfkd()
        .filter(char::is_ascii)
        .map(|c| c.to_ascii_lowercase())
        .filter(|c| c.is_ascii_alphanumeric() || *c == '_' || c.is_whitespace())
        .collect::<String>();
    kept.split(|c: char| c == '_' || c.is_whitespace())
        .filter(|word| !word.is_empty())
        .collect::<Vec<_>>()
        .join("_")
}

/// Normalizes an ordered list of labels, preserving order
///
/// Fails when two labels collapse onto the same identifier instead of
/// silently producing duplicate columns.
pub fn normalize_labels<S>(labels: &[S]) -> Result<Vec<String>, ColumnNameCollision>
where
    S: AsRef<str>,
{
    let mut normalized: Vec<String> = Vec::with_capacity(labels.len());
    for label in labels {
        let label = label.as_ref();
        let name = normalize_label(label);
        if let Some(i) = normalized.iter().position(|n| *n == name) {
            return Err(ColumnNameCollision {
                first: labels[i].as_ref().to_owned(),
                second: label.to_owned(),
                normalized: name,
            });
        }
        normalized.push(name);
    }
    Ok(normalized)
}

#[cfg(test)]
mod tests {
    use super::*;

    const RAW_LABELS: &[&str] = &[
        "Espaço",
        "Tipo de Evento",
        "Classificação Etária",
        "Tipo da Sessão",
        "Valor do Ingresso",
        "Quantidade de ingressos vendidos",
        "Dia do Mês",
        "Espaço_Sala 1 - Térreo",
        "Classificação Etária_Livre",
        "  Leading and   trailing  ",
        "Tipo de Evento_Show (ao vivo)!",
    ];

    #[test]
    fn test_known_labels() {
        assert_eq!(normalize_label("Espaço"), "espaco");
        assert_eq!(
            normalize_label("Quantidade de ingressos vendidos"),
            "quantidade_de_ingressos_vendidos"
        );
        assert_eq!(normalize_label("Dia do Mês"), "dia_do_mes");
        assert_eq!(
            normalize_label("Espaço_Sala 1 - Térreo"),
            "espaco_sala_1_terreo"
        );
        assert_eq!(
            normalize_label("Tipo de Evento_Show (ao vivo)!"),
            "tipo_de_evento_show_ao_vivo"
        );
        assert_eq!(
            normalize_label("  Leading and   trailing  "),
            "leading_and_trailing"
        );
    }

    #[test]
    fn test_punctuation_is_removed_not_replaced() {
        assert_eq!(normalize_label("Sala-1"), "sala1");
    }

    #[test]
    fn test_idempotent() {
        for label in RAW_LABELS {
            let once = normalize_label(label);
            assert_eq!(normalize_label(&once), once, "label: {label}");
        }
    }

    #[test]
    fn test_identifier_shape() {
        for label in RAW_LABELS {
            let name = normalize_label(label);
            assert!(
                name.chars()
                    .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_')
            );
            assert!(!name.starts_with('_') && !name.ends_with('_'));
            assert!(!name.contains("__"));
        }
    }

    #[test]
    fn test_order_preserved() {
        let names = normalize_labels(&["B", "A", "Ç"]).unwrap();
        assert_eq!(names, ["b", "a", "c"]);
    }

    #[test]
    fn test_collision_detected() {
        let err = normalize_labels(&["Preço", "preco", "Outro"]).unwrap_err();
        assert_eq!(err.first, "Preço");
        assert_eq!(err.second, "preco");
        assert_eq!(err.normalized, "preco");
    }
}
