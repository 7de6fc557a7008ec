use serde::{Deserialize, Serialize};

use crate::error::ReconError;
use crate::model::CanonicalField;
use crate::text::header_key;

// ---------------------------------------------------------------------------
// Top-level config
// ---------------------------------------------------------------------------

/// Loader settings: header aliases, the official report layout and blank-row
/// handling. Every field has a default, so an empty TOML document is valid.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct LoaderConfig {
    /// Drop rows whose six canonical values are all empty.
    pub skip_blank_rows: bool,
    pub aliases: AliasTable,
    pub official: OfficialLayout,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            skip_blank_rows: true,
            aliases: AliasTable::default(),
            official: OfficialLayout::default(),
        }
    }
}

// ---------------------------------------------------------------------------
// Aliases
// ---------------------------------------------------------------------------

/// Header synonyms per canonical field, in priority order.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct AliasTable {
    pub gaveta: Vec<String>,
    pub cod: Vec<String>,
    pub produto: Vec<String>,
    pub lote: Vec<String>,
    pub quantidade: Vec<String>,
    pub observacao: Vec<String>,
}

fn strings(v: &[&str]) -> Vec<String> {
    v.iter().map(|s| s.to_string()).collect()
}

impl Default for AliasTable {
    fn default() -> Self {
        Self {
            gaveta: strings(&[
                "gaveta",
                "posicao",
                "posicao_estoque",
                "ocupacao",
                "ocupacao_estoque",
            ]),
            cod: strings(&["cod", "codigo", "material", "sku"]),
            produto: strings(&["produto", "descricao", "descrição", "nome"]),
            lote: strings(&["lote", "batch", "lote_id"]),
            quantidade: strings(&["quantidade", "qtd", "qtd_gaveta", "qtd.gaveta"]),
            observacao: strings(&["observacao", "observação", "obs", "nota"]),
        }
    }
}

impl AliasTable {
    pub fn for_field(&self, field: CanonicalField) -> &[String] {
        match field {
            CanonicalField::Gaveta => &self.gaveta,
            CanonicalField::Cod => &self.cod,
            CanonicalField::Produto => &self.produto,
            CanonicalField::Lote => &self.lote,
            CanonicalField::Quantidade => &self.quantidade,
            CanonicalField::Observacao => &self.observacao,
        }
    }
}

// ---------------------------------------------------------------------------
// Official report layout
// ---------------------------------------------------------------------------

/// Fixed-position WMS report: title lines above a header at `header_row`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct OfficialLayout {
    pub enabled: bool,
    /// 0-based row index of the header; data starts on the next row.
    pub header_row: usize,
    /// Header names that must all be present for the layout to be detected.
    /// Compared raw (trimmed) and after diacritic-stripping + uppercasing.
    pub required_headers: Vec<String>,
    pub columns: OfficialColumns,
}

impl Default for OfficialLayout {
    fn default() -> Self {
        Self {
            enabled: true,
            header_row: 2,
            required_headers: strings(&["DESCRICAO", "QTD.GAVETA"]),
            columns: OfficialColumns::default(),
        }
    }
}

/// Exact source column names of the official report.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct OfficialColumns {
    /// Occupation string (`"2ZG-G61b"`) from which `gaveta` is derived.
    pub ocupacao: String,
    pub cod: String,
    pub produto: String,
    pub lote: String,
    pub quantidade: String,
    /// The report has no note column by default.
    pub observacao: Option<String>,
}

impl Default for OfficialColumns {
    fn default() -> Self {
        Self {
            ocupacao: "GAVETA (YX-Desc.)".into(),
            cod: "MATERIAL".into(),
            produto: "DESCRIÇÃO".into(),
            lote: "LOTE".into(),
            quantidade: "QTD.GAVETA".into(),
            observacao: None,
        }
    }
}

impl OfficialColumns {
    /// Source column for a canonical field. `gaveta` reads the occupation column.
    pub fn for_field(&self, field: CanonicalField) -> Option<&str> {
        match field {
            CanonicalField::Gaveta => Some(&self.ocupacao),
            CanonicalField::Cod => Some(&self.cod),
            CanonicalField::Produto => Some(&self.produto),
            CanonicalField::Lote => Some(&self.lote),
            CanonicalField::Quantidade => Some(&self.quantidade),
            CanonicalField::Observacao => self.observacao.as_deref(),
        }
    }
}

// ---------------------------------------------------------------------------
// Parse + Validate
// ---------------------------------------------------------------------------

impl LoaderConfig {
    pub fn from_toml(input: &str) -> Result<Self, ReconError> {
        let config: LoaderConfig =
            toml::from_str(input).map_err(|e| ReconError::ConfigParse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ReconError> {
        for field in CanonicalField::ALL {
            let aliases = self.aliases.for_field(field);
            if aliases.is_empty() {
                return Err(ReconError::ConfigValidation(format!(
                    "aliases.{field} must list at least one header name"
                )));
            }
            if let Some(blank) = aliases.iter().position(|a| header_key(a).is_empty()) {
                return Err(ReconError::ConfigValidation(format!(
                    "aliases.{field}[{blank}] is blank"
                )));
            }
        }

        if self.official.enabled {
            if self.official.required_headers.is_empty() {
                return Err(ReconError::ConfigValidation(
                    "official.required_headers must not be empty when the official layout is enabled"
                        .into(),
                ));
            }
            for field in CanonicalField::ALL {
                if let Some(name) = self.official.columns.for_field(field) {
                    if name.trim().is_empty() {
                        return Err(ReconError::ConfigValidation(format!(
                            "official.columns for '{field}' is blank"
                        )));
                    }
                }
            }
        }

        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
