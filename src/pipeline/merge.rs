//! PDF merging: append whole page-level documents to one output document.
//!
//! [`MergedDocument`] owns an accumulating `lopdf::Document` with a single
//! flat page tree. Each appended source is renumbered above the current
//! highest object id, its objects are moved over, and its pages are attached
//! to the output page tree in their original order. The source's own
//! catalog and page-tree nodes are dropped; attributes that pages inherited
//! from those nodes are copied onto the pages first.
//!
//! Pages are only ever appended, never removed or reordered.

use lopdf::{dictionary, Dictionary, Document, Object, ObjectId, StringFormat};
use std::path::Path;
use tracing::debug;

/// Page attributes a page may inherit from its ancestors in the page tree.
const INHERITABLE: [&[u8]; 4] = [b"Resources", b"MediaBox", b"CropBox", b"Rotate"];

/// Object types that belong to a source document's structure, not its pages.
const STRUCTURAL_TYPES: [&[u8]; 4] = [b"Catalog", b"Pages", b"ObjStm", b"XRef"];

/// Guard against malformed, cyclic page trees.
const MAX_TREE_DEPTH: usize = 64;

/// The accumulating output document.
pub struct MergedDocument {
    document: Document,
    pages_id: ObjectId,
    kids: Vec<Object>,
    title: Option<String>,
}

impl Default for MergedDocument {
    fn default() -> Self {
        Self::new()
    }
}

impl MergedDocument {
    /// Create an empty output document.
    pub fn new() -> Self {
        let mut document = Document::with_version("1.5");
        let pages_id = document.new_object_id();
        Self {
            document,
            pages_id,
            kids: Vec::new(),
            title: None,
        }
    }

    /// Number of pages appended so far.
    pub fn page_count(&self) -> usize {
        self.kids.len()
    }

    /// Set the document title written to the information dictionary.
    pub fn set_title(&mut self, title: impl Into<String>) {
        self.title = Some(title.into());
    }

    /// Load the PDF at `path` and append all of its pages.
    ///
    /// Returns the number of pages appended.
    pub fn append_file(&mut self, path: &Path) -> Result<usize, lopdf::Error> {
        let source = Document::load(path)?;
        Ok(self.append(source))
    }

    /// Append all pages of `source`, in order, after the current last page.
    ///
    /// Returns the number of pages appended.
    pub fn append(&mut self, mut source: Document) -> usize {
        source.renumber_objects_with(self.document.max_id + 1);

        let page_ids: Vec<ObjectId> = source.get_pages().into_values().collect();
        for &page_id in &page_ids {
            inherit_attributes(&mut source, page_id);
        }

        self.document.max_id = self.document.max_id.max(source.max_id);
        for (id, object) in source.objects {
            if is_structural(&object) {
                continue;
            }
            self.document.objects.insert(id, object);
        }

        for &page_id in &page_ids {
            if let Ok(page) = self
                .document
                .get_object_mut(page_id)
                .and_then(Object::as_dict_mut)
            {
                page.set("Parent", self.pages_id);
            }
            self.kids.push(Object::Reference(page_id));
        }

        debug!(
            "Appended {} pages (output now {} pages)",
            page_ids.len(),
            self.kids.len()
        );
        page_ids.len()
    }

    /// Finalise the page tree and catalog and return the output document.
    pub fn into_document(mut self) -> Document {
        let count = self.kids.len() as i64;
        let pages = dictionary! {
            "Type" => Object::Name(b"Pages".to_vec()),
            "Kids" => Object::Array(self.kids),
            "Count" => Object::Integer(count),
        };
        self.document
            .objects
            .insert(self.pages_id, Object::Dictionary(pages));

        let catalog_id = self.document.add_object(dictionary! {
            "Type" => Object::Name(b"Catalog".to_vec()),
            "Pages" => self.pages_id,
        });
        self.document.trailer.set("Root", catalog_id);

        let mut info = dictionary! {
            "Producer" => text_string(concat!("edgequake-docs2pdf ", env!("CARGO_PKG_VERSION"))),
        };
        if let Some(title) = self.title {
            info.set("Title", text_string(&title));
        }
        let info_id = self.document.add_object(info);
        self.document.trailer.set("Info", info_id);

        self.document.prune_objects();
        self.document
    }

    /// Finalise and serialise the output document.
    pub fn to_bytes(self) -> Result<Vec<u8>, lopdf::Error> {
        let mut document = self.into_document();
        let mut bytes = Vec::new();
        document.save_to(&mut bytes)?;
        Ok(bytes)
    }
}

fn is_structural(object: &Object) -> bool {
    object
        .as_dict()
        .and_then(|d| d.get(b"Type"))
        .and_then(Object::as_name)
        .map(|name| STRUCTURAL_TYPES.iter().any(|t| *t == name))
        .unwrap_or(false)
}

/// Copy inheritable attributes from the page's ancestors onto the page itself.
fn inherit_attributes(document: &mut Document, page_id: ObjectId) {
    let Ok(page) = document.get_dictionary(page_id) else {
        return;
    };

    let mut missing: Vec<&[u8]> = INHERITABLE
        .iter()
        .copied()
        .filter(|key| !page.has(key))
        .collect();
    let mut inherited: Vec<(&[u8], Object)> = Vec::new();
    let mut parent = parent_of(page);
    let mut depth = 0;

    while let Some(parent_id) = parent {
        if missing.is_empty() || depth >= MAX_TREE_DEPTH {
            break;
        }
        let Ok(node) = document.get_dictionary(parent_id) else {
            break;
        };
        missing.retain(|key| match node.get(key) {
            Ok(value) => {
                inherited.push((*key, value.clone()));
                false
            }
            Err(_) => true,
        });
        parent = parent_of(node);
        depth += 1;
    }

    if inherited.is_empty() {
        return;
    }
    if let Ok(page) = document
        .get_object_mut(page_id)
        .and_then(Object::as_dict_mut)
    {
        for (key, value) in inherited {
            page.set(key, value);
        }
    }
}

fn parent_of(node: &Dictionary) -> Option<ObjectId> {
    node.get(b"Parent").and_then(Object::as_reference).ok()
}

/// Encode a PDF text string: literal for ASCII, UTF-16BE with BOM otherwise.
fn text_string(s: &str) -> Object {
    if s.is_ascii() {
        return Object::string_literal(s);
    }
    let mut bytes = vec![0xFE, 0xFF];
    for unit in s.encode_utf16() {
        bytes.extend_from_slice(&unit.to_be_bytes());
    }
    Object::String(bytes, StringFormat::Hexadecimal)
}

#[cfg(test)]
mod tests {
    use super::*;
    use lopdf::Stream;

    /// Build a PDF whose pages are identified by their MediaBox width.
    ///
    /// With `inherit_media_box` the MediaBox lives on the page-tree node
    /// (width of the first entry) instead of on each page.
    fn fixture(widths: &[i64], inherit_media_box: bool) -> Document {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        let font_id = doc.add_object(dictionary! {
            "Type" => Object::Name(b"Font".to_vec()),
            "Subtype" => Object::Name(b"Type1".to_vec()),
            "BaseFont" => Object::Name(b"Helvetica".to_vec()),
        });
        let resources_id = doc.add_object(dictionary! {
            "Font" => dictionary! { "F1" => font_id },
        });

        let mut kids = Vec::new();
        for &width in widths {
            let content_id = doc.add_object(Stream::new(dictionary! {}, b"BT ET".to_vec()));
            let mut page = dictionary! {
                "Type" => Object::Name(b"Page".to_vec()),
                "Parent" => pages_id,
                "Contents" => content_id,
            };
            if !inherit_media_box {
                page.set("MediaBox", media_box(width));
            }
            kids.push(Object::Reference(doc.add_object(page)));
        }

        let mut pages = dictionary! {
            "Type" => Object::Name(b"Pages".to_vec()),
            "Kids" => Object::Array(kids),
            "Count" => Object::Integer(widths.len() as i64),
            "Resources" => resources_id,
        };
        if inherit_media_box {
            pages.set("MediaBox", media_box(widths[0]));
        }
        doc.objects.insert(pages_id, Object::Dictionary(pages));

        let catalog_id = doc.add_object(dictionary! {
            "Type" => Object::Name(b"Catalog".to_vec()),
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);
        doc
    }

    fn media_box(width: i64) -> Object {
        Object::Array(vec![
            Object::Integer(0),
            Object::Integer(0),
            Object::Integer(width),
            Object::Integer(100),
        ])
    }

    fn page_widths(doc: &Document) -> Vec<i64> {
        doc.get_pages()
            .values()
            .map(|id| {
                let page = doc.get_dictionary(*id).unwrap();
                let mb = page.get(b"MediaBox").unwrap().as_array().unwrap();
                mb[2].as_i64().unwrap()
            })
            .collect()
    }

    fn reload(merged: MergedDocument) -> Document {
        let bytes = merged.to_bytes().unwrap();
        Document::load_mem(&bytes).unwrap()
    }

    #[test]
    fn two_plus_one_pages_in_order() {
        let mut merged = MergedDocument::new();
        assert_eq!(merged.append(fixture(&[101, 102], false)), 2);
        assert_eq!(merged.append(fixture(&[201], false)), 1);
        assert_eq!(merged.page_count(), 3);

        let out = reload(merged);
        assert_eq!(page_widths(&out), vec![101, 102, 201]);
    }

    #[test]
    fn page_count_is_sum_of_sources() {
        let sources: Vec<Vec<i64>> = vec![vec![1, 2, 3], vec![4], vec![5, 6], vec![7]];
        let mut merged = MergedDocument::new();
        for widths in &sources {
            merged.append(fixture(widths, false));
        }
        let out = reload(merged);
        assert_eq!(page_widths(&out), (1..=7).collect::<Vec<_>>());
    }

    #[test]
    fn appending_the_same_source_twice_keeps_both() {
        let source = fixture(&[10, 20], false);
        let mut merged = MergedDocument::new();
        merged.append(source.clone());
        merged.append(source);
        let out = reload(merged);
        assert_eq!(page_widths(&out), vec![10, 20, 10, 20]);
    }

    #[test]
    fn inherited_attributes_copied_to_pages() {
        let mut merged = MergedDocument::new();
        merged.append(fixture(&[300, 300], true));
        let out = reload(merged);

        assert_eq!(page_widths(&out), vec![300, 300]);
        for id in out.get_pages().values() {
            let page = out.get_dictionary(*id).unwrap();
            assert!(page.has(b"Resources"), "page lost its inherited resources");
        }
    }

    #[test]
    fn pages_point_at_the_output_tree() {
        let mut merged = MergedDocument::new();
        merged.append(fixture(&[1], false));
        merged.append(fixture(&[2], false));
        let out = reload(merged);

        let catalog = out.catalog().unwrap();
        let root_pages = catalog.get(b"Pages").unwrap().as_reference().unwrap();
        for id in out.get_pages().values() {
            let page = out.get_dictionary(*id).unwrap();
            assert_eq!(parent_of(page), Some(root_pages));
        }
    }

    #[test]
    fn append_file_loads_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("page.pdf");
        fixture(&[42, 43], false).save(&path).unwrap();

        let mut merged = MergedDocument::new();
        assert_eq!(merged.append_file(&path).unwrap(), 2);
        assert!(merged.append_file(&dir.path().join("absent.pdf")).is_err());
        assert_eq!(page_widths(&reload(merged)), vec![42, 43]);
    }

    #[test]
    fn title_written_to_info_dictionary() {
        let mut merged = MergedDocument::new();
        merged.append(fixture(&[1], false));
        merged.set_title("User Manual");
        let out = reload(merged);

        let info_id = out.trailer.get(b"Info").unwrap().as_reference().unwrap();
        let info = out.get_dictionary(info_id).unwrap();
        assert_eq!(info.get(b"Title").unwrap().as_str().unwrap(), b"User Manual");
    }

    #[test]
    fn producer_written_without_title() {
        let mut merged = MergedDocument::new();
        merged.append(fixture(&[1], false));
        let out = reload(merged);

        let info_id = out.trailer.get(b"Info").unwrap().as_reference().unwrap();
        let info = out.get_dictionary(info_id).unwrap();
        assert!(info.get(b"Title").is_err());
        let producer = info.get(b"Producer").unwrap().as_str().unwrap();
        assert!(producer.starts_with(b"edgequake-docs2pdf "));
    }

    #[test]
    fn non_ascii_title_is_utf16() {
        match text_string("Résumé") {
            Object::String(bytes, _) => assert_eq!(&bytes[..2], &[0xFE, 0xFF]),
            other => panic!("unexpected object: {other:?}"),
        }
    }
}
