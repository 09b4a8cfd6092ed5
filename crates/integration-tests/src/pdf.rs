//! PDF fixtures generated with `lopdf`.

use lopdf::content::{Content, Operation};
use lopdf::{Dictionary, Document, Object, Stream, dictionary};

/// One-page PDF showing `text`, with optional form fields and padding.
#[derive(Debug, Default)]
pub struct PdfBuilder {
    text: String,
    fields: Vec<Dictionary>,
    loose_signature: bool,
    padding: usize,
}

impl PdfBuilder {
    #[must_use]
    pub fn new(text: &str) -> Self {
        Self {
            text: text.to_owned(),
            ..Self::default()
        }
    }

    /// Add a plain text field named `name`.
    #[must_use]
    pub fn text_field(mut self, name: &str) -> Self {
        self.fields.push(dictionary! {
            "FT" => "Tx",
            "T" => Object::string_literal(name),
        });
        self
    }

    /// Add a signature field carrying a signature dictionary.
    #[must_use]
    pub fn signed_field(mut self, name: &str) -> Self {
        self.fields.push(dictionary! {
            "FT" => "Sig",
            "T" => Object::string_literal(name),
            "V" => dictionary! {
                "Type" => "Sig",
                "Filter" => "Adobe.PPKLite",
                "SubFilter" => "adbe.pkcs7.detached",
                "ByteRange" => vec![0.into(), 840.into(), 960.into(), 240.into()],
            },
        });
        self
    }

    /// Add a signature dictionary that no form field references.
    #[must_use]
    pub const fn loose_signature(mut self) -> Self {
        self.loose_signature = true;
        self
    }

    /// Add an unreferenced stream of `bytes` spaces.
    #[must_use]
    pub const fn padded(mut self, bytes: usize) -> Self {
        self.padding = bytes;
        self
    }

    /// Serialize the document.
    #[must_use]
    pub fn build(self) -> Vec<u8> {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        let font_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Courier",
        });
        let resources_id = doc.add_object(dictionary! {
            "Font" => dictionary! {
                "F1" => font_id,
            },
        });
        let content = Content {
            operations: vec![
                Operation::new("BT", vec![]),
                Operation::new("Tf", vec!["F1".into(), 24.into()]),
                Operation::new("Td", vec![100.into(), 600.into()]),
                Operation::new("Tj", vec![Object::string_literal(self.text)]),
                Operation::new("ET", vec![]),
            ],
        };
        let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode().unwrap()));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
        });
        let pages = dictionary! {
            "Type" => "Pages",
            "Kids" => vec![page_id.into()],
            "Count" => 1,
            "Resources" => resources_id,
            "MediaBox" => vec![0.into(), 0.into(), 595.into(), 842.into()],
        };
        doc.objects.insert(pages_id, Object::Dictionary(pages));

        if self.loose_signature {
            doc.add_object(dictionary! {
                "Type" => "Sig",
                "ByteRange" => vec![0.into(), 1024.into(), 2048.into(), 512.into()],
            });
        }
        if self.padding > 0 {
            doc.add_object(Stream::new(dictionary! {}, vec![b' '; self.padding]));
        }

        let mut catalog = dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        };
        if !self.fields.is_empty() {
            let field_ids: Vec<Object> = self
                .fields
                .into_iter()
                .map(|field| doc.add_object(field).into())
                .collect();
            catalog.set(
                "AcroForm",
                dictionary! {
                    "Fields" => field_ids,
                },
            );
        }
        let catalog_id = doc.add_object(catalog);
        doc.trailer.set("Root", catalog_id);

        let mut bytes = Vec::new();
        doc.save_to(&mut bytes).unwrap();
        bytes
    }
}
