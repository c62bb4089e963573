//! Core orchestration layer for docmerge.

pub mod error;

use chrono::{SecondsFormat, Utc};
use docmerge_config::Config;
use docmerge_engine::{
    document_structure, merge_document, Dimensions, PlaceholderMatcher, Replacer, StructureEntry,
};
use docmerge_format::{
    pdf_base64, template_doc_id, CreateDocRequest, DocType, MergeDocRequest, Operation, Request,
    Response, ResponseBody, ResponseType,
};
use docmerge_model::Document;
use docmerge_store::DocumentStore;
use log::{info, warn};

pub use error::{CoreError, CoreResult};

/// Entry point for higher-level consumers (CLI, HTTP adapters).
pub struct DocMerge<S: DocumentStore> {
    config: Config,
    store: S,
    matcher: PlaceholderMatcher,
    replacer: Replacer,
}

impl<S: DocumentStore> DocMerge<S> {
    /// Bootstrap the composition engine from configuration and a store.
    pub fn bootstrap(config: Config, store: S) -> CoreResult<Self> {
        let matcher = PlaceholderMatcher::new(&config.placeholder.pattern)
            .map_err(|err| CoreError::InvalidPattern(err.to_string()))?;
        let replacer = Replacer::new(Dimensions::new(
            config.images.default_height,
            config.images.default_width,
        ));
        Ok(Self {
            config,
            store,
            matcher,
            replacer,
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Index, type and markers of every element in the template.
    pub fn structure(&self, template_id: &str) -> CoreResult<Vec<StructureEntry>> {
        let template = self.store.open(template_id)?;
        Ok(document_structure(&template, &self.matcher))
    }

    /// Copies the template and applies the replacements to the copy's body.
    ///
    /// The copy is filed into the requested folder before it is filled, so a
    /// failing replacement leaves an unfilled copy behind.
    pub fn create_from_template(&mut self, request: &CreateDocRequest) -> CoreResult<String> {
        let template = self.store.open(&request.template_doc_id)?;
        let title = match request.title.as_deref().map(str::trim) {
            Some(title) if !title.is_empty() => title.to_string(),
            _ => default_title(&template),
        };

        let id = self.store.make_copy(&request.template_doc_id, &title)?;
        self.store
            .move_to_folder(&id, request.folder_id.as_deref().unwrap_or_default())?;

        let mut document = self.store.open(&id)?;
        let summary = self
            .replacer
            .apply(&mut document.body, &request.replacements)?;
        self.store.save(&id, &document)?;

        info!(
            "created {id} from template {}: {} text occurrence(s), {} image(s)",
            request.template_doc_id, summary.text_occurrences, summary.images_inserted
        );
        Ok(id)
    }

    /// Builds a new document from selected template elements.
    ///
    /// The document is assembled in memory and only persisted once every
    /// directive has succeeded.
    pub fn merge_from_template(&mut self, request: &MergeDocRequest) -> CoreResult<String> {
        let template = self.store.open(&request.template_doc_id)?;
        let mut document = Document::blank(default_title(&template));
        let report = merge_document(&mut document, &template, &request.plan(), &self.replacer)?;

        let id = self.store.create(&document.title, &document)?;
        self.store
            .move_to_folder(&id, request.folder_id.as_deref().unwrap_or_default())?;

        info!(
            "merged {id} from template {}: {} paragraph(s), {} table(s), {} continued row(s), {} skipped",
            request.template_doc_id,
            report.paragraphs,
            report.tables,
            report.continued_rows,
            report.skipped
        );
        Ok(id)
    }

    /// Answers a structure query for `templateDocId`.
    pub fn handle_get(&self, template_id: Option<&str>) -> Response {
        match self.get_structure(template_id) {
            Ok(data) => ResponseBody::new(200, data).encode(ResponseType::Http),
            Err(err) => reject(err, ResponseType::Http),
        }
    }

    /// Parses and executes a create or merge request.
    pub fn handle_post(&mut self, body: &str) -> Response {
        let request = match Request::parse(body) {
            Ok(request) => request,
            Err(err) => return reject(err.into(), ResponseType::Http),
        };

        match self.execute(&request) {
            Ok(data) => ResponseBody::new(200, data).encode(request.response_type),
            Err(err) => reject(err, request.response_type),
        }
    }

    fn get_structure(&self, template_id: Option<&str>) -> CoreResult<serde_json::Value> {
        let template_id = template_doc_id(template_id)?;
        Ok(serde_json::to_value(self.structure(template_id)?)?)
    }

    fn execute(&mut self, request: &Request) -> CoreResult<String> {
        let id = match request.operation()? {
            Operation::Create(create) => self.create_from_template(&create)?,
            Operation::Merge(merge) => self.merge_from_template(&merge)?,
        };

        match request.doc_type {
            DocType::Id => Ok(id),
            DocType::Pdf => {
                let document = self.store.open(&id)?;
                Ok(pdf_base64(&document, &self.config.export)?)
            }
        }
    }
}

fn reject(err: CoreError, response_type: ResponseType) -> Response {
    let status = err.status();
    warn!("request rejected ({status}): {err}");
    ResponseBody::new(status, err.to_string()).encode(response_type)
}

/// `"<template title> <UTC timestamp>"`
fn default_title(template: &Document) -> String {
    format!(
        "{} {}",
        template.title,
        Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
    )
}
