//! Dependency index
//!
//! Head pointers re-expressed as an index -> children adjacency list,
//! built once per document.

use trex_core::{AnnotatedDocument, Token};

/// Read-only children lookup over an annotated document
#[derive(Debug, Clone)]
pub struct DependencyIndex<'a> {
    doc: &'a AnnotatedDocument,
    children: Vec<Vec<usize>>,
}

impl<'a> DependencyIndex<'a> {
    /// Build the index. Roots are never listed as their own child.
    pub fn new(doc: &'a AnnotatedDocument) -> Self {
        let mut children = vec![Vec::new(); doc.len()];
        for token in doc {
            if !token.is_root() {
                children[token.head_index].push(token.index);
            }
        }

        Self { doc, children }
    }

    pub fn document(&self) -> &'a AnnotatedDocument {
        self.doc
    }

    /// Indices of the direct children of `index`, ascending
    pub fn children(&self, index: usize) -> &[usize] {
        self.children
            .get(index)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Direct children of `index` carrying dependency label `label`
    pub fn children_with_label<'s>(
        &'s self,
        index: usize,
        label: &'s str,
    ) -> impl Iterator<Item = &'a Token> + 's {
        let doc = self.doc;
        self.children(index)
            .iter()
            .map(move |&child| &doc[child])
            .filter(move |token| token.dep_label == label)
    }

    /// The governing token of `index`
    pub fn head(&self, index: usize) -> &'a Token {
        self.doc.head_of(&self.doc[index])
    }
}
