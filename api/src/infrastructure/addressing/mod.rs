use crate::application::ports::address_builder::AddressBuilder;

/// Addresses of the form `<base><prefix>/<book>/<document>`. Without a base
/// the address is root-relative.
#[derive(Debug, Clone)]
pub struct RouteAddressBuilder {
    pub base_url: Option<String>,
    pub prefix: String,
}

impl RouteAddressBuilder {
    pub fn new(base_url: Option<String>, prefix: &str) -> Self {
        let prefix = format!("/{}", prefix.trim_matches('/'));
        Self {
            base_url: base_url.map(|b| b.trim_end_matches('/').to_string()),
            prefix: if prefix == "/" { String::new() } else { prefix },
        }
    }
}

impl AddressBuilder for RouteAddressBuilder {
    fn document_address(&self, book_identifier: &str, document: &str) -> String {
        format!(
            "{}{}/{}/{}",
            self.base_url.as_deref().unwrap_or_default(),
            self.prefix,
            urlencoding::encode(book_identifier),
            urlencoding::encode(document)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_document_addresses() {
        let rel = RouteAddressBuilder::new(None, "docs/");
        assert_eq!(rel.document_address("guide", "intro"), "/docs/guide/intro");

        let abs = RouteAddressBuilder::new(Some("https://wiki.example.com/".into()), "/");
        assert_eq!(
            abs.document_address("guide", "setup.md"),
            "https://wiki.example.com/guide/setup.md"
        );
    }
}
