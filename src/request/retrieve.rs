//! Result retrieval: positions, source lists and product archives.

use crate::error::{Error, Result, StateError};
use crate::results::{self, DownloadOptions, DownloadReport, PositionResult, SourceList};
use crate::types::{JobId, ProductKind, Selection};
use crate::utils::{archive_file_name, download_target};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use super::ProductRequest;

impl ProductRequest {
    /// Position from the standard position product
    ///
    /// # Errors
    ///
    /// As for [`retrieve_position`](Self::retrieve_position).
    pub async fn retrieve_standard_pos(&self) -> Result<PositionResult> {
        self.retrieve_position(ProductKind::StandardPos).await
    }

    /// Position from the enhanced position product
    ///
    /// # Errors
    ///
    /// As for [`retrieve_position`](Self::retrieve_position).
    pub async fn retrieve_enhanced_pos(&self) -> Result<PositionResult> {
        self.retrieve_position(ProductKind::EnhancedPos).await
    }

    /// Position from the astrometric position product
    ///
    /// # Errors
    ///
    /// As for [`retrieve_position`](Self::retrieve_position).
    pub async fn retrieve_astrom_pos(&self) -> Result<PositionResult> {
        self.retrieve_position(ProductKind::AstromPos).await
    }

    /// Position from one of the position products
    ///
    /// # Errors
    ///
    /// - [`StateError::NotSubmitted`] before acceptance
    /// - `NotFound` if the product was not requested, or `kind` is not a position product
    /// - [`Error::Protocol`] for a malformed reply
    pub async fn retrieve_position(&self, kind: ProductKind) -> Result<PositionResult> {
        let job_id = self.ensure_submitted("retrieve a position")?;
        if !kind.is_position() {
            return Err(Error::NotFound(format!("{} does not produce a position", kind)));
        }
        self.existing_product(kind)?;

        let reply = self.gateway.position(job_id, kind).await?;
        let result = results::parse_position(kind, &reply)?;
        debug!(job_id = %job_id, product = %kind, found = result.position().is_some(), "retrieved position");
        Ok(result)
    }

    /// Sources found by source detection, per energy band
    ///
    /// # Errors
    ///
    /// [`StateError::NotSubmitted`] before acceptance, `NotFound` if source detection was
    /// not requested, [`StateError::NotComplete`] until it has completed, and
    /// [`Error::Protocol`] for a malformed reply.
    pub async fn retrieve_source_list(&self) -> Result<SourceList> {
        let job_id = self.ensure_submitted("retrieve the source list")?;
        let product = self.existing_product(ProductKind::SourceDet)?;
        if !product.is_complete() {
            return Err(StateError::NotComplete {
                what: ProductKind::SourceDet.to_string(),
            }
            .into());
        }

        let reply = self.gateway.source_list(job_id).await?;
        let list = results::parse_source_list(&reply)?;
        debug!(job_id = %job_id, bands = list.len(), "retrieved source list");
        Ok(list)
    }

    /// Download product archives into `dir`
    ///
    /// With [`Selection::All`], incomplete products are skipped. With an explicit list,
    /// every named product must be complete or the call fails before writing anything.
    /// The directory is created if needed. Each attempted product gets its own entry in
    /// the report, so one failure never hides the others.
    ///
    /// # Errors
    ///
    /// - [`StateError::NotSubmitted`] before acceptance
    /// - `NotFound` for a named product not in the request
    /// - [`StateError::NotComplete`] naming every incomplete product in an explicit list
    /// - I/O errors creating `dir`
    pub async fn download_products(
        &self,
        dir: impl AsRef<Path>,
        what: impl Into<Selection>,
        options: &DownloadOptions,
    ) -> Result<DownloadReport> {
        let job_id = self.ensure_submitted("download products")?;
        let dir = dir.as_ref();
        let what = what.into();
        let kinds = self.selected_kinds(&what)?;

        let targets: Vec<ProductKind> = if what.is_all() {
            kinds
                .into_iter()
                .filter(|kind| {
                    let complete = self.products.get(kind).is_some_and(|p| p.is_complete());
                    if !complete {
                        debug!(job_id = %job_id, product = %kind, "skipping incomplete product");
                    }
                    complete
                })
                .collect()
        } else {
            let incomplete: Vec<String> = kinds
                .iter()
                .filter(|kind| !self.products.get(*kind).is_some_and(|p| p.is_complete()))
                .map(ToString::to_string)
                .collect();
            if !incomplete.is_empty() {
                return Err(StateError::NotComplete {
                    what: incomplete.join(", "),
                }
                .into());
            }
            kinds
        };

        tokio::fs::create_dir_all(dir).await?;

        let mut report = DownloadReport::default();
        for kind in targets {
            let name = archive_file_name(options.stem.as_deref(), kind, options.format);
            let outcome = self.download_one(job_id, kind, &dir.join(name), options).await;
            if let Err(e) = &outcome {
                warn!(job_id = %job_id, product = %kind, error = %e, "download failed");
            }
            report.results.insert(kind, outcome);
        }

        info!(
            job_id = %job_id,
            saved = report.saved().count(),
            failed = report.failed().count(),
            "downloads finished"
        );
        Ok(report)
    }

    async fn download_one(
        &self,
        job_id: JobId,
        kind: ProductKind,
        path: &Path,
        options: &DownloadOptions,
    ) -> std::result::Result<PathBuf, String> {
        let path = download_target(path, options.clobber)?;
        let bytes = self
            .gateway
            .fetch_archive(job_id, kind, options.format)
            .await
            .map_err(|e| e.to_string())?;
        tokio::fs::write(&path, &bytes)
            .await
            .map_err(|e| format!("cannot write {}: {}", path.display(), e))?;
        debug!(job_id = %job_id, product = %kind, path = %path.display(), bytes = bytes.len(), "saved archive");
        Ok(path)
    }
}
