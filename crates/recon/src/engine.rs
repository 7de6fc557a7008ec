use crate::bin_key::TolerantBinKey;
use crate::config::LoaderConfig;
use crate::error::ReconError;
use crate::loader::Loader;
use crate::model::{RawTable, ReconReport, Table};
use crate::reconcile::Reconciler;
use crate::template;

/// Normalizer, comparator and template builders sharing one configuration.
///
/// Built once (regexes compiled, aliases normalized) and then used read-only;
/// it is `Send + Sync` and can sit behind an `Arc` in a server.
#[derive(Debug)]
pub struct Auditor {
    loader: Loader,
    reconciler: Reconciler,
    bins: TolerantBinKey,
}

impl Auditor {
    pub fn new(config: &LoaderConfig) -> Result<Self, ReconError> {
        config.validate()?;
        Ok(Self {
            loader: Loader::new(config),
            reconciler: Reconciler::new(),
            bins: TolerantBinKey::new(),
        })
    }

    /// Raw grid → canonical six-column table.
    pub fn normalize(&self, raw: &RawTable) -> Result<Table, ReconError> {
        self.loader.normalize(raw)
    }

    /// Two canonical tables → classified, sorted report.
    pub fn reconcile(&self, official: &Table, physical: &Table) -> ReconReport {
        self.reconciler.reconcile(official, physical)
    }

    /// Normalize both raw grids and reconcile them.
    pub fn compare(&self, official: &RawTable, physical: &RawTable) -> Result<ReconReport, ReconError> {
        let official = self.normalize(official)?;
        let physical = self.normalize(physical)?;
        Ok(self.reconcile(&official, &physical))
    }

    /// Normalize a raw official grid and blank its quantities.
    pub fn blind_template(&self, official: &RawTable) -> Result<Table, ReconError> {
        Ok(template::blind_template(&self.normalize(official)?))
    }

    /// Normalize a raw official grid and list its distinct bins.
    pub fn bin_template(&self, official: &RawTable) -> Result<Table, ReconError> {
        Ok(template::bin_template(&self.normalize(official)?, &self.bins))
    }
}

impl Default for Auditor {
    fn default() -> Self {
        let config = LoaderConfig::default();
        Self {
            loader: Loader::new(&config),
            reconciler: Reconciler::new(),
            bins: TolerantBinKey::new(),
        }
    }
}

/// Normalize with the default loader configuration.
pub fn normalize(raw: &RawTable) -> Result<Table, ReconError> {
    Auditor::default().normalize(raw)
}

/// Reconcile two canonical tables.
pub fn reconcile(official: &Table, physical: &Table) -> ReconReport {
    Reconciler::new().reconcile(official, physical)
}
