//! Modelfile directive rewriting.
//!
//! A modelfile is a line-oriented script. Two directives may reference local
//! files: `FROM` (base weights) and `ADAPTER` (fine-tune adapters). Before a
//! create request can be submitted, those references must be replaced with
//! content-addressed blob digests the backend can resolve. Every other line
//! is opaque and passes through untouched.

use crate::blob::BlobStore;
use crate::error::Result;
use crate::image::file_exists;
use crate::paths::resolve_path;
use std::path::Path;
use tracing::debug;

/// Rewrites FROM/ADAPTER directives against a blob store.
pub struct ModelfileRewriter<'a> {
    blobs: &'a BlobStore,
}

impl<'a> ModelfileRewriter<'a> {
    pub fn new(blobs: &'a BlobStore) -> Self {
        Self { blobs }
    }

    /// Rewrite local-file directives to `@sha256:<hex>` blob references.
    ///
    /// The output has exactly the input's line count and order. Directive
    /// arguments that do not resolve to an existing local file are taken to
    /// be remote model references and left exactly as written. Lines are
    /// processed sequentially in document order; the first blob failure
    /// aborts the whole rewrite.
    pub async fn rewrite(&self, modelfile: &str, base_dir: &Path) -> Result<String> {
        let mut out = Vec::new();
        for line in modelfile.split('\n') {
            out.push(self.rewrite_line(line, base_dir).await?);
        }
        Ok(out.join("\n"))
    }

    async fn rewrite_line(&self, line: &str, base_dir: &Path) -> Result<String> {
        let Some((command, args)) = line.split_once(char::is_whitespace) else {
            return Ok(line.to_string());
        };

        let is_file_directive = command.eq_ignore_ascii_case("FROM")
            || command.eq_ignore_ascii_case("ADAPTER");
        if !is_file_directive {
            return Ok(line.to_string());
        }

        let arg = args.trim();
        if arg.is_empty() {
            return Ok(line.to_string());
        }

        let path = resolve_path(arg, base_dir);
        if !file_exists(&path).await {
            // Not a local file: a registry model name or remote reference.
            debug!("Passing through {} {} (no local file)", command, arg);
            return Ok(line.to_string());
        }

        let digest = self.blobs.ensure_uploaded(&path).await?;
        Ok(format!("{} @{}", command, digest))
    }
}
