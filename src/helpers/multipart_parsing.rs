use std::collections::HashMap;

use actix_multipart::Multipart;
use futures::{StreamExt, TryStreamExt};

use crate::errors::ApiError;

pub struct UploadedFile {
    pub filename: String,
    pub content_type: String,
    pub data: Vec<u8>,
}

/// A fully drained multipart payload: plain parts keyed by field name,
/// file parts buffered in memory. Payloads are relayed straight to the
/// object store, so nothing touches disk here.
pub struct ParsedMultipart {
    pub fields: HashMap<String, String>,
    pub files: HashMap<String, UploadedFile>,
}

impl ParsedMultipart {
    pub fn text(&self, name: &str) -> Option<&String> {
        self.fields.get(name)
    }

    pub fn file(&self, name: &str) -> Option<&UploadedFile> {
        self.files.get(name)
    }
}

pub async fn parse_multipart(mut payload: Multipart) -> Result<ParsedMultipart, ApiError> {
    let mut fields: HashMap<String, String> = HashMap::new();
    let mut files: HashMap<String, UploadedFile> = HashMap::new();

    while let Ok(Some(mut field)) = payload.try_next().await {
        let disposition = field
            .content_disposition()
            .ok_or_else(|| ApiError::invalid("Malformed multipart field"))?;

        let name = disposition
            .get_name()
            .ok_or_else(|| ApiError::invalid("Multipart field is missing a name"))?
            .to_string();
        let filename = disposition.get_filename().map(|f| f.to_string());
        let content_type = field.content_type().to_string();

        let mut data: Vec<u8> = Vec::new();

        while let Some(chunk) = field.next().await {
            let bytes =
                chunk.map_err(|_| ApiError::invalid("Couldn't read a multipart field"))?;
            data.extend_from_slice(&bytes);
        }

        match filename {
            Some(filename) => {
                files.insert(
                    name,
                    UploadedFile {
                        filename,
                        content_type,
                        data,
                    },
                );
            }
            None => {
                let value = String::from_utf8(data)
                    .map_err(|_| ApiError::invalid("Multipart field is not valid UTF-8"))?;
                fields.insert(name, value);
            }
        }
    }

    Ok(ParsedMultipart { fields, files })
}
