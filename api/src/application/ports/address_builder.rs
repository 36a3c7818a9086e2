/// Builds the public address of a document page.
pub trait AddressBuilder: Send + Sync {
    fn document_address(&self, book_identifier: &str, document: &str) -> String;
}
