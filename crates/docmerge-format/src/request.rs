use docmerge_engine::{MergeDirective, MergePlan, ReplacementRule};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{Map, Value};

use crate::response::ResponseType;
use crate::{FormatError, FormatResult};

pub const CREATE_DOC_FROM_TEMPLATE: &str = "createDocFromTemplate";
pub const MERGE_DOC_FROM_TEMPLATE: &str = "mergeDocFromTemplate";

/// What `data` carries on success.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum DocType {
    #[default]
    Id,
    Pdf,
}

impl DocType {
    pub fn from_wire(value: Option<&str>) -> Self {
        match value {
            Some("PDF") => DocType::Pdf,
            _ => DocType::Id,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateDocRequest {
    pub template_doc_id: String,
    #[serde(default)]
    pub folder_id: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub replacements: Vec<ReplacementRule>,
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MergeDocRequest {
    pub template_doc_id: String,
    #[serde(default)]
    pub folder_id: Option<String>,
    #[serde(default)]
    pub merge_parameters: Vec<MergeDirective>,
    #[serde(default)]
    pub merge_parameters_header: Vec<MergeDirective>,
    #[serde(default)]
    pub merge_parameters_footer: Vec<MergeDirective>,
}

impl MergeDocRequest {
    pub fn plan(&self) -> MergePlan {
        MergePlan {
            body: self.merge_parameters.clone(),
            header: self.merge_parameters_header.clone(),
            footer: self.merge_parameters_footer.clone(),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum Operation {
    Create(CreateDocRequest),
    Merge(MergeDocRequest),
}

impl Operation {
    pub fn template_doc_id(&self) -> &str {
        match self {
            Operation::Create(request) => &request.template_doc_id,
            Operation::Merge(request) => &request.template_doc_id,
        }
    }
}

/// A POST body that is known to be a JSON object.
///
/// The envelope fields are read eagerly so that later rejections can still be
/// encoded the way the caller asked for.
#[derive(Clone, Debug)]
pub struct Request {
    pub response_type: ResponseType,
    pub doc_type: DocType,
    fields: Map<String, Value>,
}

impl Request {
    pub fn parse(body: &str) -> FormatResult<Self> {
        let value: Value = serde_json::from_str(body).map_err(|_| FormatError::InvalidJson)?;
        let Value::Object(fields) = value else {
            return Err(FormatError::InvalidJson);
        };

        Ok(Self {
            response_type: ResponseType::from_wire(string_field(&fields, "responseType")),
            doc_type: DocType::from_wire(string_field(&fields, "responseDocType")),
            fields,
        })
    }

    pub fn kind(&self) -> Option<&str> {
        string_field(&self.fields, "type")
    }

    /// Decodes the operation selected by `type`.
    pub fn operation(&self) -> FormatResult<Operation> {
        let operation = match self.kind() {
            Some(CREATE_DOC_FROM_TEMPLATE) => Operation::Create(self.decode()?),
            Some(MERGE_DOC_FROM_TEMPLATE) => Operation::Merge(self.decode()?),
            _ => return Err(FormatError::UnknownType),
        };
        template_doc_id(Some(operation.template_doc_id()))?;
        Ok(operation)
    }

    fn decode<T: DeserializeOwned>(&self) -> FormatResult<T> {
        match self.fields.get("templateDocId") {
            Some(Value::String(_)) => {}
            _ => return Err(FormatError::BadTemplateDocId),
        }
        serde_json::from_value(Value::Object(self.fields.clone()))
            .map_err(|err| FormatError::InvalidField(err.to_string()))
    }
}

/// Validates a template id taken from a query string or request body.
pub fn template_doc_id(value: Option<&str>) -> FormatResult<&str> {
    match value.map(str::trim) {
        Some(id) if !id.is_empty() => Ok(id),
        _ => Err(FormatError::BadTemplateDocId),
    }
}

fn string_field<'a>(fields: &'a Map<String, Value>, key: &str) -> Option<&'a str> {
    fields.get(key).and_then(Value::as_str)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn rejects_non_json_and_non_objects() {
        assert!(matches!(Request::parse("{oops"), Err(FormatError::InvalidJson)));
        assert!(matches!(Request::parse("[1, 2]"), Err(FormatError::InvalidJson)));
    }

    #[test]
    fn envelope_fields_default_when_absent() {
        let request = Request::parse(r#"{"type": "nope"}"#).unwrap();
        assert_eq!(request.response_type, ResponseType::Http);
        assert_eq!(request.doc_type, DocType::Id);
        assert!(matches!(request.operation(), Err(FormatError::UnknownType)));
    }

    #[test]
    fn unknown_type_keeps_requested_encoding() {
        let request = Request::parse(r#"{"type": "deleteDoc", "responseType": "toAPI"}"#).unwrap();
        assert_eq!(request.response_type, ResponseType::Api);
        assert!(matches!(request.operation(), Err(FormatError::UnknownType)));
    }

    #[test]
    fn template_id_must_be_non_blank_string() {
        for body in [
            r#"{"type": "createDocFromTemplate"}"#,
            r#"{"type": "createDocFromTemplate", "templateDocId": ""}"#,
            r#"{"type": "createDocFromTemplate", "templateDocId": "   "}"#,
            r#"{"type": "mergeDocFromTemplate", "templateDocId": 12}"#,
        ] {
            let request = Request::parse(body).unwrap();
            assert!(
                matches!(request.operation(), Err(FormatError::BadTemplateDocId)),
                "{body}"
            );
        }
    }

    #[test]
    fn decodes_create_request() {
        let request = Request::parse(
            r#"{
                "type": "createDocFromTemplate",
                "templateDocId": "tpl",
                "folderId": "clients",
                "responseDocType": "PDF",
                "replacements": [{"type": "text", "searchPattern": "{v8 name}", "text": "Bob"}]
            }"#,
        )
        .unwrap();

        assert_eq!(request.doc_type, DocType::Pdf);
        let Operation::Create(create) = request.operation().unwrap() else {
            panic!("expected create");
        };
        assert_eq!(create.template_doc_id, "tpl");
        assert_eq!(create.folder_id.as_deref(), Some("clients"));
        assert_eq!(create.title, None);
        assert_eq!(
            create.replacements,
            vec![ReplacementRule::text("{v8 name}", "Bob")]
        );
    }

    #[test]
    fn decodes_merge_request_into_plan() {
        let request = Request::parse(
            r#"{
                "type": "mergeDocFromTemplate",
                "templateDocId": "tpl",
                "mergeParameters": [{"index": 0}, {"index": 2, "replacements": []}],
                "mergeParametersFooter": [{"index": 0}]
            }"#,
        )
        .unwrap();

        let Operation::Merge(merge) = request.operation().unwrap() else {
            panic!("expected merge");
        };
        let plan = merge.plan();
        assert_eq!(plan.body.len(), 2);
        assert_eq!(plan.body[1].index, 2);
        assert!(plan.header.is_empty());
        assert_eq!(plan.footer.len(), 1);
    }

    #[test]
    fn malformed_rules_are_field_errors() {
        let request = Request::parse(
            r#"{"type": "createDocFromTemplate", "templateDocId": "tpl", "replacements": [{"type": "video"}]}"#,
        )
        .unwrap();
        assert!(matches!(request.operation(), Err(FormatError::InvalidField(_))));
    }
}
